//! Plan orchestrator: runs the generation pipeline for one request.
//!
//! Steps run strictly in order, because the schedule and resource prompts
//! are built from the syllabus analysis:
//!
//! 1. classify learning preferences (local)
//! 2. syllabus analyzer (model)
//! 3. schedule architect (model)
//! 4. resource recommender (model)
//! 5. review checkpoints (local)
//!
//! A failed model *call* aborts the whole plan. Model *output* that cannot
//! be parsed only degrades its own section to the error marker.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{error, info};

use crate::extract::{Section, extract_section};
use crate::generation::{GenerationClient, GenerationError, RoleKey, RoleTable};
use crate::learning::classify_preferences;
use crate::progress::schedule_checkpoints;

use super::request::PlanRequest;
use super::types::{PlanRecord, ResourceRecommendations, StudySchedule, Subject, SyllabusAnalysis};

/// Maximum number of syllabus characters embedded in the analyzer prompt.
pub const SYLLABUS_PROMPT_CHARS: usize = 2000;

/// Number of subjects passed to the schedule architect.
pub const SCHEDULE_SUBJECT_LIMIT: usize = 2;

/// Number of subject names passed to the resource recommender.
pub const RESOURCE_TOPIC_LIMIT: usize = 3;

/// Errors that abort plan generation.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("{role} generation call failed: {source}")]
    Generation {
        role: RoleKey,
        #[source]
        source: GenerationError,
    },
}

/// Runs the plan pipeline against a generation client.
#[derive(Clone)]
pub struct PlanOrchestrator {
    client: Arc<dyn GenerationClient>,
    roles: Arc<RoleTable>,
}

impl std::fmt::Debug for PlanOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanOrchestrator")
            .field("model", &self.client.model())
            .finish_non_exhaustive()
    }
}

impl PlanOrchestrator {
    /// Create an orchestrator using the built-in role table.
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self::with_roles(client, RoleTable::builtin())
    }

    pub fn with_roles(client: Arc<dyn GenerationClient>, roles: RoleTable) -> Self {
        Self {
            client,
            roles: Arc::new(roles),
        }
    }

    /// Model identifier of the underlying client.
    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Render a role's instruction, invoke the model, and extract its section.
    async fn run_role<T: DeserializeOwned>(
        &self,
        key: RoleKey,
        vars: &[(&str, &str)],
    ) -> Result<Section<T>, PlanError> {
        let role = self.roles.get(key);
        let instruction = role.render_instruction(vars);

        let raw = self
            .client
            .invoke(role, &instruction)
            .await
            .map_err(|source| PlanError::Generation { role: key, source })?;

        let section = extract_section::<T>(&raw);
        if section.is_failed() {
            info!(role = %key, "section degraded to error marker");
        }
        Ok(section)
    }

    /// Generate a complete plan record.
    ///
    /// Returns `Err` only when a generation call itself fails; in that case
    /// no record is produced.
    pub async fn generate(&self, request: &PlanRequest) -> Result<PlanRecord, PlanError> {
        info!(
            syllabus_chars = request.syllabus_text().chars().count(),
            duration_days = request.duration_days().get(),
            "generating study plan"
        );

        let result = self.run_pipeline(request).await;
        match &result {
            Ok(_) => info!("study plan complete"),
            Err(e) => error!(error = %e, "study plan generation aborted"),
        }
        result
    }

    async fn run_pipeline(&self, request: &PlanRequest) -> Result<PlanRecord, PlanError> {
        info!("[1/4] analyzing learning preferences");
        let learning_analysis = classify_preferences(request.learning_preferences());
        let style = learning_analysis.primary_learning_style.as_str();

        info!("[2/4] analyzing syllabus");
        let syllabus_excerpt: String = request
            .syllabus_text()
            .chars()
            .take(SYLLABUS_PROMPT_CHARS)
            .collect();
        let syllabus_analysis: Section<SyllabusAnalysis> = self
            .run_role(RoleKey::SyllabusAnalyzer, &[("syllabus", syllabus_excerpt.as_str())])
            .await?;

        let subjects: &[Subject] = match syllabus_analysis.ready() {
            Some(analysis) => &analysis.subjects,
            None => &[],
        };

        info!("[3/4] creating study schedule");
        let duration = request.duration_days().get().to_string();
        let schedule_subjects = subjects_json(&subjects[..subjects.len().min(SCHEDULE_SUBJECT_LIMIT)]);
        let schedule: Section<StudySchedule> = self
            .run_role(
                RoleKey::ScheduleArchitect,
                &[
                    ("duration_days", duration.as_str()),
                    ("subjects", schedule_subjects.as_str()),
                    ("learning_style", style),
                ],
            )
            .await?;

        info!("[4/4] recommending resources");
        let topics = subjects
            .iter()
            .take(RESOURCE_TOPIC_LIMIT)
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let resources: Section<ResourceRecommendations> = self
            .run_role(
                RoleKey::ResourceRecommender,
                &[("topics", topics.as_str()), ("learning_style", style)],
            )
            .await?;

        let progress_tracking = schedule_checkpoints(request.duration_days());

        Ok(PlanRecord {
            created_at: Utc::now(),
            duration_days: request.duration_days(),
            syllabus_analysis,
            learning_analysis,
            schedule,
            resources,
            progress_tracking,
        })
    }
}

/// Serialize subjects for embedding in a prompt.
fn subjects_json(subjects: &[Subject]) -> String {
    serde_json::to_string(subjects).unwrap_or_else(|_| "[]".to_string())
}
