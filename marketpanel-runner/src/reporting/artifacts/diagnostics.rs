//! Diagnostics export (JSON).

use crate::pipeline::PipelineOutput;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use marketpanel_core::PanelWarning;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What degraded during a run, and the identity of the panel it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub latest_date: NaiveDate,
    pub rows: usize,
    pub columns: Vec<String>,
    pub dropped_columns: Vec<String>,
    pub failed_fetches: Vec<FailedFetch>,
    pub warnings: Vec<PanelWarning>,
    /// BLAKE3 fingerprint of the panel.
    pub panel_fingerprint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedFetch {
    pub ticker: String,
    pub error: String,
}

impl RunDiagnostics {
    pub fn from_output(output: &PipelineOutput) -> Self {
        Self {
            latest_date: output.snapshot.latest_date,
            rows: output.panel.len(),
            columns: output.panel.column_names().into_iter().map(String::from).collect(),
            dropped_columns: output.dropped.clone(),
            failed_fetches: output
                .failed
                .iter()
                .map(|(ticker, error)| FailedFetch {
                    ticker: ticker.clone(),
                    error: error.clone(),
                })
                .collect(),
            warnings: output.diagnostics.warnings().to_vec(),
            panel_fingerprint: output.panel.fingerprint(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize diagnostics")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write diagnostics {}", path.display()))?;
        Ok(())
    }
}
