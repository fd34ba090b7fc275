//! Review checkpoint scheduling.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Number of checkpoints in every schedule.
pub const CHECKPOINT_COUNT: u32 = 4;

/// Minimum spacing between checkpoints, in days.
pub const MIN_INTERVAL_DAYS: u32 = 7;

const ASSESSMENT: &str = "Quiz + practical exercise";

const TRACKING_METRICS: [&str; 3] = [
    "Daily session completion",
    "Topic understanding scores",
    "Practice problem accuracy",
];

/// A single review milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub day: u32,
    pub checkpoint: String,
    pub assessment: String,
}

/// Checkpoints plus the metrics the learner should track between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressTracking {
    pub checkpoint_schedule: Vec<Checkpoint>,
    pub tracking_metrics: Vec<String>,
}

/// Spacing between checkpoints: a quarter of the duration, but never less
/// than a week.
pub fn checkpoint_interval(duration_days: NonZeroU32) -> u32 {
    (duration_days.get() / CHECKPOINT_COUNT).max(MIN_INTERVAL_DAYS)
}

/// Build the four review checkpoints for a study period.
///
/// Checkpoint `i` falls on `min(duration, i * interval)`. For short
/// durations several checkpoints clamp onto the final day; those duplicates
/// are kept.
pub fn schedule_checkpoints(duration_days: NonZeroU32) -> ProgressTracking {
    let interval = checkpoint_interval(duration_days);

    let checkpoint_schedule = (1..=CHECKPOINT_COUNT)
        .map(|i| Checkpoint {
            day: duration_days.get().min(i.saturating_mul(interval)),
            checkpoint: format!("Review Week {i}"),
            assessment: ASSESSMENT.to_string(),
        })
        .collect();

    ProgressTracking {
        checkpoint_schedule,
        tracking_metrics: TRACKING_METRICS.iter().map(|m| (*m).to_string()).collect(),
    }
}
