//! Export orchestrator for artifacts and reports.

use anyhow::Result;
use chrono::DateTime;
use chrono_tz::Tz;
use std::path::Path;

use crate::config::ExportConfig;
use crate::pipeline::PipelineOutput;
use crate::reporting::artifacts::{ArtifactManager, ArtifactPaths};
use crate::reporting::reports::{
    write_analysis_json, write_analysis_markdown, AnalysisRecord, NarrativeGenerator,
    TrailingWindow,
};

/// Write every artifact of a run and, when a generator is given, the analysis
/// report. `now` dates the files and must already be in the report timezone.
///
/// A failing generator does not fail the export: the data artifacts are
/// already on disk, and the report is skipped with a warning.
pub fn export_run_with_report(
    output_dir: impl AsRef<Path>,
    output: &PipelineOutput,
    config: &ExportConfig,
    now: DateTime<Tz>,
    generator: Option<&dyn NarrativeGenerator>,
) -> Result<ArtifactPaths> {
    let report_date = now.date_naive();
    let manager = ArtifactManager::new(output_dir)?;
    let mut paths = manager.save_run(output, report_date)?;

    let Some(generator) = generator else {
        return Ok(paths);
    };
    let analysis = match generator.generate(&output.snapshot) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(generator = generator.name(), error = %e, "analysis generation failed, report skipped");
            return Ok(paths);
        }
    };

    let json_path = manager.output_dir().join("market_analysis.json");
    write_analysis_json(
        &json_path,
        &AnalysisRecord {
            date: report_date,
            analysis: analysis.clone(),
            timestamp: now.to_rfc3339(),
        },
    )?;
    paths.analysis_json = Some(json_path);

    let window =
        TrailingWindow::from_panel(&output.panel, config.trailing_months, &config.priority_columns);
    let md_path = manager
        .output_dir()
        .join(format!("market_analysis_{}.md", report_date.format("%Y-%m-%d")));
    write_analysis_markdown(&md_path, &analysis, &window, config.trailing_months)?;
    paths.analysis_markdown = Some(md_path);

    tracing::info!(generator = generator.name(), rows = window.rows.len(), "analysis report written");
    Ok(paths)
}
