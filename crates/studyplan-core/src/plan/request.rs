//! Validated plan-generation input.

use std::num::NonZeroU32;

use thiserror::Error;

/// Study duration used when the caller does not supply one.
pub const DEFAULT_DURATION_DAYS: u32 = 30;

/// Reasons a plan request is rejected before generation starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanRequestError {
    #[error("Syllabus text is required")]
    MissingSyllabus,

    #[error("Learning preferences are required")]
    MissingPreferences,

    #[error("Study duration must be a positive number of days (got {0})")]
    InvalidDuration(i64),
}

/// Input to the plan orchestrator. Construction enforces non-empty text
/// fields and a positive duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    syllabus_text: String,
    learning_preferences: String,
    duration_days: NonZeroU32,
}

impl PlanRequest {
    /// Validate raw input. Text fields are trimmed before the emptiness
    /// check; the syllabus is checked first.
    pub fn new(
        syllabus_text: &str,
        learning_preferences: &str,
        duration_days: i64,
    ) -> Result<Self, PlanRequestError> {
        let syllabus_text = syllabus_text.trim();
        if syllabus_text.is_empty() {
            return Err(PlanRequestError::MissingSyllabus);
        }

        let learning_preferences = learning_preferences.trim();
        if learning_preferences.is_empty() {
            return Err(PlanRequestError::MissingPreferences);
        }

        let duration_days = u32::try_from(duration_days)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or(PlanRequestError::InvalidDuration(duration_days))?;

        Ok(Self {
            syllabus_text: syllabus_text.to_string(),
            learning_preferences: learning_preferences.to_string(),
            duration_days,
        })
    }

    pub fn syllabus_text(&self) -> &str {
        &self.syllabus_text
    }

    pub fn learning_preferences(&self) -> &str {
        &self.learning_preferences
    }

    pub fn duration_days(&self) -> NonZeroU32 {
        self.duration_days
    }
}
