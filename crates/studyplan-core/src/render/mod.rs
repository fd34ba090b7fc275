//! Printable rendering of plan records.
//!
//! [`PdfRenderer`] lays a plan out as a short A4 summary using the PDF base
//! fonts, so no font files are embedded. Layout happens in two passes:
//! the record is flattened into styled [`Line`]s, then the lines are
//! wrapped and placed on pages top to bottom.

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use thiserror::Error;
use tracing::debug;

use crate::plan::PlanRecord;

/// A4 portrait, in points.
pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
pub const MARGIN: f32 = 50.0;

/// Upper bound on the number of pages one plan may produce.
pub const MAX_PAGES: usize = 50;

/// Average Helvetica glyph width as a fraction of the font size. Used to
/// estimate line widths for wrapping and centering.
const AVG_GLYPH_WIDTH: f32 = 0.5;

const LINE_SPACING: f32 = 1.4;

const SCHEDULE_DAYS_SHOWN: usize = 3;
const SESSIONS_PER_DAY_SHOWN: usize = 2;
const SUBJECTS_SHOWN: usize = 3;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("document would need {pages} pages (max {max})")]
    TooManyPages { pages: usize, max: usize },
}

/// Turns a plan record into a downloadable document.
pub trait DocumentRenderer: Send + Sync {
    /// MIME type of the rendered bytes.
    fn content_type(&self) -> &'static str;

    /// File extension without the dot.
    fn file_extension(&self) -> &'static str;

    /// Render `plan`. Output is identical for identical records.
    fn render(&self, plan: &PlanRecord) -> Result<Vec<u8>, RenderError>;
}

// Compile-time check that DocumentRenderer is object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn DocumentRenderer) {}
};

// ---------------------------------------------------------------------------
// Layout model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Title,
    Heading,
    Body,
}

impl Style {
    fn font(self) -> Name<'static> {
        match self {
            Self::Title | Self::Heading => Name(b"F2"),
            Self::Body => Name(b"F1"),
        }
    }

    fn size(self) -> f32 {
        match self {
            Self::Title => 16.0,
            Self::Heading => 12.0,
            Self::Body => 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Text {
        style: Style,
        text: String,
        indent: f32,
        centered: bool,
    },
    Gap(f32),
}

impl Line {
    fn title(text: &str) -> Self {
        Self::Text {
            style: Style::Title,
            text: text.to_string(),
            indent: 0.0,
            centered: true,
        }
    }

    fn heading(text: &str) -> Self {
        Self::Text {
            style: Style::Heading,
            text: text.to_string(),
            indent: 0.0,
            centered: false,
        }
    }

    fn body(text: impl Into<String>) -> Self {
        Self::Text {
            style: Style::Body,
            text: text.into(),
            indent: 0.0,
            centered: false,
        }
    }

    fn item(text: impl Into<String>) -> Self {
        Self::Text {
            style: Style::Body,
            text: text.into(),
            indent: 15.0,
            centered: false,
        }
    }
}

/// A line of text fixed at an absolute position on a page.
#[derive(Debug, Clone, PartialEq)]
struct Placed {
    style: Style,
    text: String,
    x: f32,
    y: f32,
}

type Page = Vec<Placed>;

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

fn plan_lines(plan: &PlanRecord) -> Vec<Line> {
    let mut lines = vec![
        Line::title("Personalized Study Plan"),
        Line::Gap(10.0),
        Line::body(format!("Created: {}", plan.created_at.format("%Y-%m-%d"))),
        Line::body(format!("Duration: {} days", plan.duration_days)),
        Line::Gap(12.0),
    ];

    lines.push(Line::heading("1. Syllabus Overview"));
    match plan.syllabus_analysis.ready() {
        Some(analysis) => {
            lines.push(Line::body(format!(
                "Total Hours: {}",
                analysis.total_estimated_hours
            )));
            for subject in analysis.subjects.iter().take(SUBJECTS_SHOWN) {
                lines.push(Line::item(format!(
                    "- {} ({} chapters)",
                    subject.name,
                    subject.chapters.len()
                )));
            }
        }
        None => lines.push(Line::body("Syllabus analysis unavailable.")),
    }
    lines.push(Line::Gap(12.0));

    let learning = &plan.learning_analysis;
    lines.push(Line::heading("2. Learning Approach"));
    lines.push(Line::body(format!("Style: {}", learning.primary_learning_style)));
    lines.push(Line::body(format!(
        "Methods: {}",
        learning.recommended_study_methods.join(", ")
    )));
    lines.push(Line::Gap(12.0));

    lines.push(Line::heading("3. Schedule (First 3 Days)"));
    match plan.schedule.ready() {
        Some(schedule) if !schedule.schedule.is_empty() => {
            for day in schedule.schedule.iter().take(SCHEDULE_DAYS_SHOWN) {
                lines.push(Line::body(format!("Day {}: {}", day.day, day.date)));
                for session in day.sessions.iter().take(SESSIONS_PER_DAY_SHOWN) {
                    lines.push(Line::item(format!("- {}: {}", session.time, session.topic)));
                }
            }
        }
        _ => lines.push(Line::body("Schedule unavailable.")),
    }
    lines.push(Line::Gap(12.0));

    lines.push(Line::heading("4. Review Checkpoints"));
    for checkpoint in &plan.progress_tracking.checkpoint_schedule {
        lines.push(Line::body(format!(
            "Day {}: {}",
            checkpoint.day, checkpoint.checkpoint
        )));
    }

    lines
}

// ---------------------------------------------------------------------------
// Text handling
// ---------------------------------------------------------------------------

/// Replace anything the base fonts cannot show with `?`. Whitespace
/// control characters become spaces.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c,
            '\t' | '\n' | '\r' => ' ',
            _ => '?',
        })
        .collect()
}

fn text_width(text: &str, size: f32) -> f32 {
    text.len() as f32 * size * AVG_GLYPH_WIDTH
}

/// Greedy word wrap to at most `max_chars` per line. Words longer than a
/// line are split.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut out = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.len() > max_chars {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            let (head, tail) = word.split_at(max_chars);
            out.push(head.to_string());
            word = tail;
        }
        if word.is_empty() {
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            out.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

/// Wrap and place lines, starting a new page whenever the next line would
/// cross the bottom margin.
fn paginate(lines: &[Line]) -> Vec<Page> {
    let top = PAGE_HEIGHT - MARGIN;
    let mut pages: Vec<Page> = vec![Vec::new()];
    let mut y = top;

    for line in lines {
        match line {
            Line::Gap(height) => {
                // Gaps never open a page on their own.
                y -= height;
            }
            Line::Text {
                style,
                text,
                indent,
                centered,
            } => {
                let size = style.size();
                let leading = size * LINE_SPACING;
                let usable = PAGE_WIDTH - 2.0 * MARGIN - indent;
                let max_chars = (usable / (size * AVG_GLYPH_WIDTH)) as usize;

                for piece in wrap(&sanitize(text), max_chars) {
                    if y - leading < MARGIN {
                        pages.push(Vec::new());
                        y = top;
                    }
                    y -= leading;

                    let x = if *centered {
                        ((PAGE_WIDTH - text_width(&piece, size)) / 2.0).max(MARGIN)
                    } else {
                        MARGIN + indent
                    };
                    if let Some(page) = pages.last_mut() {
                        page.push(Placed {
                            style: *style,
                            text: piece,
                            x,
                            y,
                        });
                    }
                }
            }
        }
    }

    pages
}

// ---------------------------------------------------------------------------
// PDF output
// ---------------------------------------------------------------------------

/// Renders plans as PDF documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer;

impl PdfRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentRenderer for PdfRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn file_extension(&self) -> &'static str {
        "pdf"
    }

    fn render(&self, plan: &PlanRecord) -> Result<Vec<u8>, RenderError> {
        let pages = paginate(&plan_lines(plan));
        if pages.len() > MAX_PAGES {
            return Err(RenderError::TooManyPages {
                pages: pages.len(),
                max: MAX_PAGES,
            });
        }

        let bytes = write_pdf(&pages);
        debug!(pages = pages.len(), bytes = bytes.len(), "rendered plan pdf");
        Ok(bytes)
    }
}

fn write_pdf(pages: &[Page]) -> Vec<u8> {
    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let tree_id = alloc.bump();
    let regular_id = alloc.bump();
    let bold_id = alloc.bump();
    let info_id = alloc.bump();
    let page_ids: Vec<(Ref, Ref)> = pages
        .iter()
        .map(|_| (alloc.bump(), alloc.bump()))
        .collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().map(|(page, _)| *page))
        .count(page_ids.len() as i32);

    pdf.type1_font(regular_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(bold_id)
        .base_font(Name(b"Helvetica-Bold"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    for (placed, (page_id, content_id)) in pages.iter().zip(&page_ids) {
        let mut page = pdf.page(*page_id);
        page.parent(tree_id)
            .media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT))
            .contents(*content_id);
        page.resources()
            .fonts()
            .pair(Name(b"F1"), regular_id)
            .pair(Name(b"F2"), bold_id);
        page.finish();

        let stream = page_content(placed);
        pdf.stream(*content_id, &stream);
    }

    pdf.document_info(info_id)
        .title(TextStr("Personalized Study Plan"))
        .creator(TextStr("studyplan"));

    pdf.finish()
}

fn page_content(placed: &[Placed]) -> Vec<u8> {
    let mut content = Content::new();
    for line in placed {
        content
            .begin_text()
            .set_font(line.style.font(), line.style.size())
            .next_line(line.x, line.y)
            .show(Str(line.text.as_bytes()))
            .end_text();
    }
    content.finish()
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use chrono::{DateTime, Utc};
    use serde_json::json;

    use super::*;
    use crate::extract::{ErrorMarker, Section};
    use crate::learning::classify_preferences;
    use crate::plan::{StudySchedule, SyllabusAnalysis};
    use crate::progress::schedule_checkpoints;

    fn created() -> DateTime<Utc> {
        DateTime::from_timestamp(1_718_000_000, 0).unwrap()
    }

    fn full_plan() -> PlanRecord {
        let days = NonZeroU32::new(30).unwrap();
        let syllabus: SyllabusAnalysis = serde_json::from_value(json!({
            "subjects": [
                {"name": "Calculus", "chapters": [
                    {"name": "Limits", "estimated_hours": 4, "difficulty": "easy"},
                    {"name": "Derivatives", "estimated_hours": 6, "difficulty": "medium"}
                ]},
                {"name": "Linear Algebra", "chapters": []},
                {"name": "Statistics", "chapters": []},
                {"name": "Topology", "chapters": []}
            ],
            "total_estimated_hours": 10
        }))
        .unwrap();
        let schedule: StudySchedule = serde_json::from_value(json!({
            "schedule": [
                {"day": 1, "date": "Day 1", "sessions": [
                    {"time": "09:00-11:00", "topic": "Limits", "activities": ["read"]},
                    {"time": "14:00-16:00", "topic": "Continuity", "activities": []},
                    {"time": "19:00-20:00", "topic": "Hidden", "activities": []}
                ]},
                {"day": 2, "date": "Day 2", "sessions": []},
                {"day": 3, "date": "Day 3", "sessions": []},
                {"day": 4, "date": "Day 4", "sessions": []}
            ]
        }))
        .unwrap();
        PlanRecord {
            created_at: created(),
            duration_days: days,
            syllabus_analysis: Section::Ready(syllabus),
            learning_analysis: classify_preferences("I like visual diagrams"),
            schedule: Section::Ready(schedule),
            resources: Section::Failed(ErrorMarker::parse_failure()),
            progress_tracking: schedule_checkpoints(days),
        }
    }

    fn degraded_plan() -> PlanRecord {
        let days = NonZeroU32::new(5).unwrap();
        PlanRecord {
            created_at: created(),
            duration_days: days,
            syllabus_analysis: Section::Failed(ErrorMarker::parse_failure()),
            learning_analysis: classify_preferences(""),
            schedule: Section::Failed(ErrorMarker::parse_failure()),
            resources: Section::Failed(ErrorMarker::parse_failure()),
            progress_tracking: schedule_checkpoints(days),
        }
    }

    fn texts(lines: &[Line]) -> Vec<&str> {
        lines
            .iter()
            .filter_map(|l| match l {
                Line::Text { text, .. } => Some(text.as_str()),
                Line::Gap(_) => None,
            })
            .collect()
    }

    #[test]
    fn output_is_a_pdf() {
        let bytes = PdfRenderer::new().render(&full_plan()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.ends_with(b"%%EOF"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let plan = full_plan();
        let renderer = PdfRenderer::new();
        assert_eq!(renderer.render(&plan).unwrap(), renderer.render(&plan).unwrap());
    }

    #[test]
    fn document_contains_title_and_sections() {
        let bytes = PdfRenderer::new().render(&full_plan()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        for needle in [
            "Personalized Study Plan",
            "Created: 2024-06-10",
            "Duration: 30 days",
            "1. Syllabus Overview",
            "2. Learning Approach",
            "3. Schedule ",
            "4. Review Checkpoints",
        ] {
            assert!(text.contains(needle), "missing {needle:?}");
        }
    }

    #[test]
    fn overview_lists_first_three_subjects() {
        let lines = plan_lines(&full_plan());
        let texts = texts(&lines);
        assert!(texts.contains(&"Total Hours: 10"));
        assert!(texts.contains(&"- Calculus (2 chapters)"));
        assert!(texts.contains(&"- Statistics (0 chapters)"));
        assert!(!texts.iter().any(|t| t.contains("Topology")));
    }

    #[test]
    fn schedule_shows_three_days_two_sessions() {
        let lines = plan_lines(&full_plan());
        let texts = texts(&lines);
        assert!(texts.contains(&"Day 3: Day 3"));
        assert!(!texts.contains(&"Day 4: Day 4"));
        assert!(texts.contains(&"- 14:00-16:00: Continuity"));
        assert!(!texts.iter().any(|t| t.contains("Hidden")));
    }

    #[test]
    fn all_checkpoints_are_listed() {
        let lines = plan_lines(&full_plan());
        let texts = texts(&lines);
        assert!(texts.contains(&"Day 7: Review Week 1"));
        assert!(texts.contains(&"Day 28: Review Week 4"));
    }

    #[test]
    fn failed_sections_still_render() {
        let plan = degraded_plan();
        let lines = plan_lines(&plan);
        let texts = texts(&lines);
        assert!(texts.contains(&"Syllabus analysis unavailable."));
        assert!(texts.contains(&"Schedule unavailable."));
        assert!(texts.contains(&"Style: reading-writing"));

        let bytes = PdfRenderer::new().render(&plan).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn non_ascii_is_replaced() {
        assert_eq!(sanitize("Análisis\tdé"), "An?lisis d?");
        assert_eq!(sanitize("日本"), "??");
    }

    #[test]
    fn wrap_breaks_on_words_and_splits_long_words() {
        assert_eq!(wrap("aaa bbb ccc", 7), vec!["aaa bbb", "ccc"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 10), vec![""]);
    }

    #[test]
    fn long_content_spills_onto_more_pages() {
        let mut plan = full_plan();
        if let Section::Ready(schedule) = &mut plan.schedule {
            schedule.schedule[0].sessions[0].topic = "word ".repeat(3000);
        }
        let pages = paginate(&plan_lines(&plan));
        assert!(pages.len() > 1, "expected several pages, got {}", pages.len());
        for page in &pages {
            assert!(page.iter().all(|p| p.y >= MARGIN && p.y <= PAGE_HEIGHT - MARGIN));
        }

        let bytes = PdfRenderer::new().render(&plan).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains(&format!("/Count {}", pages.len())));
    }

    #[test]
    fn oversized_plan_is_rejected() {
        let mut plan = full_plan();
        if let Section::Ready(schedule) = &mut plan.schedule {
            schedule.schedule[0].sessions[0].topic = "x".repeat(1_000_000);
        }
        let err = PdfRenderer::new().render(&plan).unwrap_err();
        assert!(matches!(err, RenderError::TooManyPages { max: MAX_PAGES, .. }));
    }
}
