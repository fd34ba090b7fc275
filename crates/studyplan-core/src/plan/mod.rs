//! Study plans: record types, request validation, and the orchestrator.

pub mod orchestrator;
pub mod request;
pub mod types;

pub use orchestrator::{PlanError, PlanOrchestrator};
pub use request::{DEFAULT_DURATION_DAYS, PlanRequest, PlanRequestError};
pub use types::{
    Chapter, PlanRecord, PlanSummary, Resource, ResourceRecommendations, ScheduleDay, Session,
    StudySchedule, Subject, SyllabusAnalysis, TopicResources,
};
