//! Market panel runner: configuration, data sources, pipeline, export.
//!
//! This crate builds on `marketpanel-core` to provide:
//! - TOML pipeline configuration with production defaults
//! - Raw series sources (Yahoo chart API, offline CSV directory)
//! - Auxiliary table storage (bond yield, valuation tables)
//! - The end-to-end pipeline producing a panel, derived tables and a snapshot
//! - Artifact export and the analysis report

pub mod config;
pub mod pipeline;
pub mod reporting;
pub mod source;
pub mod storage;

pub use config::{
    BasisConfig, BondYieldConfig, ConfigError, ExportConfig, Instrument, PipelineConfig,
    ValuationConfig,
};
pub use pipeline::{fetch_window, run_pipeline, PipelineError, PipelineOutput};
pub use reporting::{
    export_run_with_report, ArtifactManager, ArtifactPaths, NarrativeGenerator, SnapshotDigest,
};
pub use source::{fetch_all, CsvDirSource, FetchReport, SeriesSource, SourceError, YahooSource};
pub use storage::{load_series, load_table, write_table, IndicatorTable, StorageError};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
    }

    #[test]
    fn pipeline_output_is_send_sync() {
        assert_send::<PipelineOutput>();
        assert_sync::<PipelineOutput>();
    }

    #[test]
    fn sources_are_send_sync() {
        assert_send::<YahooSource>();
        assert_sync::<YahooSource>();
        assert_send::<CsvDirSource>();
        assert_sync::<CsvDirSource>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<PipelineError>();
        assert_sync::<PipelineError>();
    }
}
