//! Text-generation collaborator.
//!
//! The pipeline talks to a language model through the [`GenerationClient`]
//! trait. The three personas it uses are plain data in a [`RoleTable`];
//! [`ChatCompletionsClient`] is the production implementation.
//!
//! ```text
//! PlanOrchestrator
//!     |
//!     |  RoleTable::get(RoleKey) --> &RoleSpec
//!     |  RoleSpec::render_instruction(vars) --> instruction
//!     v
//! GenerationClient::invoke(&RoleSpec, instruction) --> raw text
//! ```

pub mod chat;
pub mod client;
pub mod error;
pub mod roles;

pub use chat::{ChatClientConfig, ChatCompletionsClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use client::GenerationClient;
pub use error::GenerationError;
pub use roles::{RoleKey, RoleSpec, RoleTable, RoleTableError};
