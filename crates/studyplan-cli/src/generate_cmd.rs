//! `studyplan generate`: run the plan pipeline once from the command line.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use studyplan_core::plan::{PlanOrchestrator, PlanRecord, PlanRequest};
use studyplan_core::render::{DocumentRenderer, PdfRenderer};

#[derive(Debug)]
pub struct GenerateOptions {
    /// Syllabus file, or `-` for stdin.
    pub syllabus: PathBuf,
    pub preferences: String,
    pub days: u32,
    /// Write the full plan record as pretty JSON here.
    pub output: Option<PathBuf>,
    /// Write the rendered PDF here.
    pub pdf: Option<PathBuf>,
}

pub async fn run_generate(orchestrator: &PlanOrchestrator, options: &GenerateOptions) -> Result<()> {
    let syllabus = read_syllabus(&options.syllabus)?;
    let request = PlanRequest::new(&syllabus, &options.preferences, i64::from(options.days))?;

    let record = orchestrator
        .generate(&request)
        .await
        .context("failed to generate study plan")?;

    let summary = serde_json::to_string_pretty(&record.summary())?;
    println!("{summary}");

    write_outputs(&record, options)
}

fn read_syllabus(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read syllabus from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read syllabus from {}", path.display()))
}

fn write_outputs(record: &PlanRecord, options: &GenerateOptions) -> Result<()> {
    if let Some(path) = &options.output {
        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write plan to {}", path.display()))?;
        println!("Plan written to {}", path.display());
    }

    if let Some(path) = &options.pdf {
        let bytes = PdfRenderer::new().render(record)?;
        std::fs::write(path, bytes)
            .with_context(|| format!("failed to write PDF to {}", path.display()))?;
        println!("PDF written to {}", path.display());
    }

    Ok(())
}
