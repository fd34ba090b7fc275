//! Best-effort extraction of JSON from free-text model output.
//!
//! Model responses are untrusted: they may wrap the JSON in a Markdown code
//! fence, add commentary, or not contain JSON at all. Extraction never
//! fails outright. Unparseable text produces a tagged [`Extraction::Unparseable`]
//! result, and the typed [`extract_section`] helper turns that into the
//! fixed error marker stored in the plan record.

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Error message stored in place of any section that could not be parsed.
pub const PARSE_FAILURE_MESSAGE: &str = "Failed to parse JSON response";

/// Maximum number of characters of the offending text kept for diagnostics.
pub const SNIPPET_CHARS: usize = 200;

const FENCE: &str = "```";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of scraping JSON from a model response.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The (possibly de-fenced) text parsed as JSON.
    Parsed(Value),
    /// The text was not valid JSON. `snippet` holds its first
    /// [`SNIPPET_CHARS`] characters.
    Unparseable { snippet: String },
}

/// The two-field marker that replaces a section which failed extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMarker {
    pub error: String,
}

impl ErrorMarker {
    /// The standard parse-failure marker.
    pub fn parse_failure() -> Self {
        Self {
            error: PARSE_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// A model-sourced plan section: either a well-formed value or the error
/// marker. Serializes as the bare object in both cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Section<T> {
    Ready(T),
    Failed(ErrorMarker),
}

impl<T> Section<T> {
    /// The parsed value, if extraction succeeded.
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Remove a surrounding code fence, if the text starts with one.
///
/// The body is everything strictly between the first fence line and the
/// next fence line, trimmed. A language tag on the opening fence is
/// discarded with the fence line. When no closing fence exists the input
/// is returned unchanged (opening fence included).
pub fn strip_code_fence(text: &str) -> Cow<'_, str> {
    if !text.starts_with(FENCE) {
        return Cow::Borrowed(text);
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let mut start = None;
    let mut end = None;

    for (i, line) in lines.iter().enumerate() {
        if line.trim().starts_with(FENCE) {
            if start.is_none() {
                start = Some(i + 1);
            } else {
                end = Some(i);
                break;
            }
        }
    }

    match (start, end) {
        (Some(start), Some(end)) => Cow::Owned(lines[start..end].join("\n").trim().to_string()),
        _ => Cow::Borrowed(text),
    }
}

/// Scrape a JSON value out of raw model output.
pub fn extract_json(raw: &str) -> Extraction {
    let text = strip_code_fence(raw.trim());

    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Extraction::Parsed(value),
        Err(e) => {
            let snippet: String = text.chars().take(SNIPPET_CHARS).collect();
            warn!(error = %e, snippet = %snippet, "model response is not valid JSON");
            Extraction::Unparseable { snippet }
        }
    }
}

/// Scrape and type-check a plan section.
///
/// Both unparseable text and JSON that does not match `T` yield
/// [`Section::Failed`] with the standard parse-failure marker, so a stored
/// section is never partially formed.
pub fn extract_section<T: DeserializeOwned>(raw: &str) -> Section<T> {
    match extract_json(raw) {
        Extraction::Parsed(value) => match serde_json::from_value::<T>(value) {
            Ok(parsed) => Section::Ready(parsed),
            Err(e) => {
                warn!(
                    error = %e,
                    expected = std::any::type_name::<T>(),
                    "model response JSON does not match the expected shape"
                );
                Section::Failed(ErrorMarker::parse_failure())
            }
        },
        Extraction::Unparseable { .. } => Section::Failed(ErrorMarker::parse_failure()),
    }
}
