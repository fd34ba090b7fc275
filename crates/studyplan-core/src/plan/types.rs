//! Plan record data model.
//!
//! Field names match the JSON returned by the HTTP API. Sections sourced
//! from the language model are wrapped in [`Section`] so that each one is
//! either fully well-formed or the `{"error": ...}` marker.

use std::num::NonZeroU32;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::extract::Section;
use crate::learning::{LearningAnalysis, LearningStyle};
use crate::progress::ProgressTracking;

// ---------------------------------------------------------------------------
// Syllabus analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub name: String,
    pub estimated_hours: Number,
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub chapters: Vec<Chapter>,
}

/// Output of the syllabus analyzer role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyllabusAnalysis {
    pub subjects: Vec<Subject>,
    pub total_estimated_hours: Number,
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Time slot, e.g. `09:00-11:00`.
    pub time: String,
    pub topic: String,
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub day: u32,
    pub date: String,
    pub sessions: Vec<Session>,
}

/// Output of the schedule architect role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySchedule {
    pub schedule: Vec<ScheduleDay>,
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Medium, e.g. `video`, `book`, `course`.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicResources {
    pub topic: String,
    pub resources: Vec<Resource>,
}

/// Output of the resource recommender role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecommendations {
    pub resource_recommendations: Vec<TopicResources>,
}

// ---------------------------------------------------------------------------
// Plan record
// ---------------------------------------------------------------------------

/// The complete result of one plan generation.
///
/// Built once by the orchestrator and never modified afterwards; the store
/// hands out shared read-only references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub created_at: DateTime<Utc>,
    pub duration_days: NonZeroU32,
    pub syllabus_analysis: Section<SyllabusAnalysis>,
    pub learning_analysis: LearningAnalysis,
    pub schedule: Section<StudySchedule>,
    pub resources: Section<ResourceRecommendations>,
    pub progress_tracking: ProgressTracking,
}

impl PlanRecord {
    /// Subjects from the syllabus analysis; empty when that section failed.
    pub fn subjects(&self) -> &[Subject] {
        match self.syllabus_analysis.ready() {
            Some(analysis) => &analysis.subjects,
            None => &[],
        }
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            created_at: self.created_at,
            duration_days: self.duration_days.get(),
            total_estimated_hours: self
                .syllabus_analysis
                .ready()
                .map_or_else(|| Value::from("N/A"), |s| {
                    Value::Number(s.total_estimated_hours.clone())
                }),
            primary_learning_style: self.learning_analysis.primary_learning_style,
        }
    }
}

/// Short description of a plan returned when it is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub created_at: DateTime<Utc>,
    pub duration_days: u32,
    /// Total hours from the syllabus analysis, or `"N/A"` if it failed.
    pub total_estimated_hours: Value,
    pub primary_learning_style: LearningStyle,
}
