//! Artifact manager for persisting run outputs.

mod diagnostics;
mod panel;
mod snapshot;

use crate::pipeline::PipelineOutput;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

pub use diagnostics::RunDiagnostics;
pub use panel::{write_panel_csv, write_panel_parquet};
pub use snapshot::write_snapshot_json;

/// Artifact paths returned after export.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub panel_csv: PathBuf,
    pub panel_parquet: PathBuf,
    pub snapshot_latest: PathBuf,
    pub snapshot_dated: PathBuf,
    pub diagnostics_json: PathBuf,
    pub buffett_csv: Option<PathBuf>,
    pub spread_csv: Option<PathBuf>,
    pub analysis_json: Option<PathBuf>,
    pub analysis_markdown: Option<PathBuf>,
}

impl ArtifactPaths {
    /// Every written file, in write order.
    pub fn all(&self) -> Vec<&Path> {
        let mut out = vec![
            self.panel_csv.as_path(),
            self.panel_parquet.as_path(),
            self.snapshot_latest.as_path(),
            self.snapshot_dated.as_path(),
            self.diagnostics_json.as_path(),
        ];
        for p in [
            &self.buffett_csv,
            &self.spread_csv,
            &self.analysis_json,
            &self.analysis_markdown,
        ]
        .into_iter()
        .flatten()
        {
            out.push(p.as_path());
        }
        out
    }
}

/// Manages writing all artifacts for a run.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    output_dir: PathBuf,
}

impl ArtifactManager {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save the panel, snapshot, derived tables and diagnostics.
    ///
    /// `report_date` is today's date in the report timezone and names the
    /// dated snapshot file.
    pub fn save_run(&self, output: &PipelineOutput, report_date: NaiveDate) -> Result<ArtifactPaths> {
        let panel_csv = self.output_dir.join("global_market_data.csv");
        let panel_parquet = self.output_dir.join("global_market_data.parquet");
        write_panel_csv(&panel_csv, &output.panel)?;
        write_panel_parquet(&panel_parquet, &output.panel)?;

        let snapshot_latest = self.output_dir.join("global_market_data_latest.json");
        let snapshot_dated = self
            .output_dir
            .join(format!("global_market_data_{}.json", report_date.format("%Y-%m-%d")));
        write_snapshot_json(&snapshot_latest, &output.snapshot)?;
        write_snapshot_json(&snapshot_dated, &output.snapshot)?;

        let buffett_csv = match &output.buffett {
            Some(table) => {
                let path = self.output_dir.join("buffett_indicator_derived.csv");
                write_panel_csv(&path, table)?;
                Some(path)
            }
            None => None,
        };
        let spread_csv = match &output.spread {
            Some(table) => {
                let path = self.output_dir.join("equity_bond_spread_derived.csv");
                write_panel_csv(&path, table)?;
                Some(path)
            }
            None => None,
        };

        let diagnostics_json = self.output_dir.join("diagnostics.json");
        RunDiagnostics::from_output(output).write(&diagnostics_json)?;

        tracing::info!(dir = %self.output_dir.display(), "artifacts written");
        Ok(ArtifactPaths {
            panel_csv,
            panel_parquet,
            snapshot_latest,
            snapshot_dated,
            diagnostics_json,
            buffett_csv,
            spread_csv,
            analysis_json: None,
            analysis_markdown: None,
        })
    }
}
