//! Reporting and artifact export.
//!
//! Artifacts are the machine-readable outputs of a run (panel CSV/Parquet,
//! snapshot JSON, derived valuation tables, diagnostics). Reports are the
//! human-readable ones: analysis text plus the trailing-window table.

pub mod artifacts;
pub mod export;
pub mod reports;

pub use artifacts::{ArtifactManager, ArtifactPaths, RunDiagnostics};
pub use export::export_run_with_report;
pub use reports::{AnalysisRecord, NarrativeGenerator, SnapshotDigest, TrailingWindow};
