//! OpenAI-compatible chat-completions client.
//!
//! Works against any endpoint exposing `POST {base_url}/chat/completions`
//! (Groq, OpenAI, local gateways). Each invocation sends the role's system
//! prompt and the instruction as a single user message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::client::GenerationClient;
use super::error::GenerationError;
use super::roles::RoleSpec;

/// Default endpoint: Groq's OpenAI-compatible API.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default model served by [`DEFAULT_BASE_URL`].
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Settings for [`ChatCompletionsClient`].
#[derive(Clone)]
pub struct ChatClientConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    /// Whole-request timeout enforced by the HTTP client.
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl std::fmt::Debug for ChatClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClientConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

/// Generation client backed by a chat-completions HTTP API.
pub struct ChatCompletionsClient {
    config: ChatClientConfig,
    http: Client,
}

impl ChatCompletionsClient {
    pub fn new(config: ChatClientConfig) -> Result<Self, GenerationError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Build the JSON request body for one invocation.
    fn build_request_body(&self, role: &RoleSpec, instruction: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [
                { "role": "system", "content": role.system_prompt() },
                { "role": "user", "content": instruction },
            ],
        })
    }
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Pull the first choice's text out of a decoded response.
fn first_choice_text(response: ChatResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| GenerationError::InvalidResponse("response contained no message content".into()))
}

#[async_trait]
impl GenerationClient for ChatCompletionsClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, role: &RoleSpec, instruction: &str) -> Result<String, GenerationError> {
        let url = self.endpoint();
        debug!(
            %url,
            model = %self.config.model,
            role = %role.key,
            instruction_len = instruction.len(),
            "invoke: sending chat completion"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.build_request_body(role, instruction))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;
        let text = first_choice_text(body)?;
        debug!(role = %role.key, output_len = text.len(), "invoke: completed");
        Ok(text)
    }
}
