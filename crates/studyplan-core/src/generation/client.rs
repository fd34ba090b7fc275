//! The [`GenerationClient`] trait.

use async_trait::async_trait;

use super::error::GenerationError;
use super::roles::RoleSpec;

/// A text-generation capability: given a persona and an instruction,
/// return the model's free-text answer.
///
/// Calls are independent; no conversation state is kept between them.
/// Implementations impose their own timeouts. The pipeline does not retry.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Model identifier reported by the health endpoint.
    fn model(&self) -> &str;

    /// Run one generation call and return the raw text output.
    async fn invoke(&self, role: &RoleSpec, instruction: &str) -> Result<String, GenerationError>;
}

// Compile-time assertion: GenerationClient must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn GenerationClient) {}
};
