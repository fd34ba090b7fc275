//! Generation client error types.

use thiserror::Error;

/// Errors raised while invoking the text-generation service.
///
/// Any of these aborts plan generation. Output that arrives but is not
/// usable JSON is not an error at this layer; see [`crate::extract`].
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API key not found; set the {env_var} environment variable")]
    MissingApiKey { env_var: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
