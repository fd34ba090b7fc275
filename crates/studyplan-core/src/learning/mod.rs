//! Learning-style classification.
//!
//! Maps a learner's free-text preferences onto one of four fixed learning
//! styles using keyword matching, and attaches the study methods associated
//! with that style. Pure logic, no I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Study tip attached to every classification. The same text is used for
/// all four styles.
pub const PERSONALIZED_TIPS: &str =
    "Use 45-90 minute focused sessions with breaks. Apply active recall and spaced repetition.";

/// One of the four supported learning styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LearningStyle {
    Visual,
    Auditory,
    Kinesthetic,
    ReadingWriting,
}

impl LearningStyle {
    /// Wire name of the style (e.g. `reading-writing`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Auditory => "auditory",
            Self::Kinesthetic => "kinesthetic",
            Self::ReadingWriting => "reading-writing",
        }
    }

    /// The four recommended study methods for this style, in display order.
    pub fn study_methods(self) -> [&'static str; 4] {
        match self {
            Self::Visual => ["video lectures", "diagrams", "mind maps", "flashcards"],
            Self::Auditory => ["podcasts", "audio books", "group discussions", "lectures"],
            Self::Kinesthetic => ["hands-on practice", "labs", "projects", "simulations"],
            Self::ReadingWriting => ["textbooks", "note-taking", "written summaries", "articles"],
        }
    }
}

impl fmt::Display for LearningStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a learner's preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningAnalysis {
    pub primary_learning_style: LearningStyle,
    pub recommended_study_methods: Vec<String>,
    pub personalized_tips: String,
}

/// Keyword sets checked in priority order. The first set with any keyword
/// present in the lower-cased text wins.
const KEYWORDS: &[(LearningStyle, &[&str])] = &[
    (LearningStyle::Visual, &["visual"]),
    (LearningStyle::Auditory, &["audio", "auditory"]),
    (LearningStyle::Kinesthetic, &["kinesthetic", "hands"]),
];

/// Classify free-text learning preferences.
///
/// Matching is case-insensitive substring search; priority is
/// visual > auditory > kinesthetic, with reading-writing as the fallback
/// (including for empty input). Never fails.
pub fn classify_preferences(preferences: &str) -> LearningAnalysis {
    let lowered = preferences.to_lowercase();

    let style = KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lowered.contains(w)))
        .map_or(LearningStyle::ReadingWriting, |(style, _)| *style);

    LearningAnalysis {
        primary_learning_style: style,
        recommended_study_methods: style
            .study_methods()
            .iter()
            .map(|m| (*m).to_string())
            .collect(),
        personalized_tips: PERSONALIZED_TIPS.to_string(),
    }
}
