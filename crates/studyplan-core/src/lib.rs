//! Core library for the study plan generator.
//!
//! A plan is produced by [`plan::PlanOrchestrator`], which classifies the
//! learner's preferences locally, asks a language model for a syllabus
//! analysis, a schedule and resource recommendations, and adds review
//! checkpoints. Finished records are kept in a [`store::PlanStore`] and can
//! be rendered to PDF with [`render::PdfRenderer`].

pub mod extract;
pub mod generation;
pub mod learning;
pub mod plan;
pub mod progress;
pub mod render;
pub mod store;

pub use generation::{ChatClientConfig, ChatCompletionsClient, GenerationClient, GenerationError};
pub use plan::{PlanError, PlanOrchestrator, PlanRecord, PlanRequest, PlanRequestError};
pub use render::{DocumentRenderer, PdfRenderer, RenderError};
pub use store::{PlanId, PlanStore};
