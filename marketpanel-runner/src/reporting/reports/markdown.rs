//! Analysis report writers (JSON record and Markdown document).

use super::TrailingWindow;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Persisted analysis: the text plus when it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub date: NaiveDate,
    pub analysis: String,
    /// RFC 3339 timestamp in the report timezone.
    pub timestamp: String,
}

pub fn write_analysis_json(path: &Path, record: &AnalysisRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record).context("Failed to serialize analysis")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write analysis {}", path.display()))?;
    Ok(())
}

/// Analysis text, a rule, then the trailing-window data table.
pub fn render_analysis_markdown(analysis: &str, window: &TrailingWindow, months: u32) -> String {
    let mut doc = String::with_capacity(analysis.len() + 4096);
    doc.push_str(analysis.trim_end());
    doc.push_str("\n\n---\n\n");
    let unit = if months == 1 { "month" } else { "months" };
    doc.push_str(&format!("## Market data, last {months} {unit}\n\n"));
    if window.is_empty() {
        doc.push_str("_No rows in window._\n");
    } else {
        doc.push_str(&window.to_markdown());
    }
    doc
}

pub fn write_analysis_markdown(
    path: &Path,
    analysis: &str,
    window: &TrailingWindow,
    months: u32,
) -> Result<()> {
    std::fs::write(path, render_analysis_markdown(analysis, window, months))
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    Ok(())
}
