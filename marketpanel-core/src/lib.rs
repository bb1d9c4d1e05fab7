//! MarketPanel Core: calendar alignment and indicator engine.
//!
//! This crate turns independently sampled market series into one aligned
//! daily panel and derives valuation/risk indicators from it:
//! - Calendar Aligner: union date index, forward-fill then back-fill
//! - Auxiliary Series Reconciler: clip, daily resample, constant fallback
//! - Indicator Engine: basis, ratio, rolling mean/std, sigma bands
//! - Snapshot Extractor: latest-value projection for reporting
//!
//! The crate performs no I/O. Fetching, storage and export live in
//! `marketpanel-runner`.

pub mod data;
pub mod error;
pub mod indicators;
pub mod snapshot;

pub use data::{align, reconcile, reconcile_into, Alignment, Panel, RawSeries, ReconcileConfig};
pub use error::{Diagnostics, PanelError, PanelWarning};
pub use indicators::{IndicatorEngine, IndicatorSpec};
pub use snapshot::{extract, Snapshot, SnapshotTables, TableSnapshot};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: panel types can cross threads.
    ///
    /// The runner fetches on a rayon pool and hands results back; these must
    /// stay Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Panel>();
        require_sync::<Panel>();
        require_send::<RawSeries>();
        require_sync::<RawSeries>();
        require_send::<Snapshot>();
        require_sync::<Snapshot>();
        require_send::<Diagnostics>();
        require_sync::<Diagnostics>();
        require_send::<IndicatorEngine>();
        require_sync::<IndicatorEngine>();
    }
}
