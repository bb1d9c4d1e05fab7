//! Pipeline driver: fetch, align, derive, reconcile, snapshot.
//!
//! One call builds everything a run produces in memory. No artifacts are
//! written here; [`crate::reporting`] takes a [`PipelineOutput`] and writes
//! files. Only an empty panel aborts the run.

use crate::config::PipelineConfig;
use crate::source::{fetch_all, SeriesSource};
use crate::storage::{self, IndicatorTable};
use chrono::NaiveDate;
use marketpanel_core::data::{align, reconcile_into, RawSeries};
use marketpanel_core::indicators::{buffett_specs, spread_specs, IndicatorEngine, IndicatorSpec};
use marketpanel_core::snapshot::{extract, Snapshot, SnapshotTables};
use marketpanel_core::{Diagnostics, Panel, PanelError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no data: every source series was empty, nothing to align")]
    NoData,

    #[error("panel error: {0}")]
    Panel(PanelError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Source(#[from] crate::source::SourceError),
}

impl From<PanelError> for PipelineError {
    fn from(e: PanelError) -> Self {
        match e {
            PanelError::NoData => PipelineError::NoData,
            other => PipelineError::Panel(other),
        }
    }
}

/// Everything a run computes.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Aligned market panel with basis, bond yield and pct-change columns.
    pub panel: Panel,
    /// Instrument columns dropped for having no data.
    pub dropped: Vec<String>,
    /// `(ticker, error)` for instruments whose fetch failed.
    pub failed: Vec<(String, String)>,
    /// Buffett indicator table after clipping and deriving, if available.
    pub buffett: Option<IndicatorTable>,
    /// Equity-bond spread table after clipping and deriving, if available.
    pub spread: Option<IndicatorTable>,
    pub snapshot: Snapshot,
    pub diagnostics: Diagnostics,
}

/// Fetch window `[today - 365 * years days, today]`.
pub fn fetch_window(today: NaiveDate, lookback_years: u32) -> (NaiveDate, NaiveDate) {
    let start = today - chrono::Duration::days(365 * i64::from(lookback_years));
    (start, today)
}

/// Run the full pipeline with `today` as the end of the fetch window.
pub fn run_pipeline(
    config: &PipelineConfig,
    source: &dyn SeriesSource,
    today: NaiveDate,
) -> Result<PipelineOutput, PipelineError> {
    config.validate()?;
    let mut diagnostics = Diagnostics::new();

    let (start, end) = fetch_window(today, config.lookback_years);
    tracing::info!(source = source.name(), %start, %end, instruments = config.instruments.len(), "fetching");
    let fetched = fetch_all(source, &config.instruments, start, end);

    let alignment = align(fetched.series)?;
    diagnostics.extend(alignment.warnings);
    let mut panel = alignment.panel;
    tracing::info!(rows = panel.len(), columns = panel.columns().len(), "aligned panel");

    if let Some(basis) = &config.basis {
        let engine = IndicatorEngine::new(vec![IndicatorSpec::basis(
            &basis.name,
            &basis.minuend,
            &basis.subtrahend,
        )]);
        diagnostics.extend(engine.apply(&mut panel)?);
    }

    let bond_path = config.data_path(&config.bond_yield.path);
    let bond = match storage::load_series(&bond_path, &config.bond_yield.column) {
        Ok(Some(series)) => series,
        Ok(None) => RawSeries::empty(config.bond_yield.column.clone()),
        Err(e) => {
            tracing::warn!(path = %bond_path.display(), error = %e, "unreadable bond yield file, treated as absent");
            RawSeries::empty(config.bond_yield.column.clone())
        }
    };
    let rec = reconcile_into(&mut panel, &bond, &config.bond_yield.reconcile_config())?;
    tracing::info!(column = %bond.name, attempt = ?rec.attempt, "reconciled bond yield");
    if let Some(w) = rec.warning {
        diagnostics.record(w);
    }

    if !config.pct_change_columns.is_empty() {
        let engine = IndicatorEngine::new(
            config
                .pct_change_columns
                .iter()
                .map(|c| IndicatorSpec::pct_change(c))
                .collect(),
        );
        diagnostics.extend(engine.apply(&mut panel)?);
    }

    let valuation = &config.valuation;
    let buffett = derive_table(
        config.data_path(&valuation.buffett_path),
        valuation.history_start,
        IndicatorEngine::new(buffett_specs()),
        &mut diagnostics,
    )?;
    let spread = derive_table(
        config.data_path(&valuation.spread_path),
        valuation.history_start,
        IndicatorEngine::new(spread_specs(
            valuation.window(),
            valuation.min_periods,
            &valuation.band_multipliers,
        )),
        &mut diagnostics,
    )?;

    let snapshot = extract(
        &panel,
        SnapshotTables {
            buffett: buffett.as_ref(),
            spread: spread.as_ref(),
        },
    )
    .ok_or(PipelineError::NoData)?;

    tracing::info!(
        latest = %snapshot.latest_date,
        warnings = diagnostics.len(),
        fingerprint = %panel.fingerprint(),
        "pipeline complete"
    );

    Ok(PipelineOutput {
        panel,
        dropped: alignment.dropped,
        failed: fetched.failed,
        buffett,
        spread,
        snapshot,
        diagnostics,
    })
}

/// Load an auxiliary table, clip it to `history_start`, and derive its indicators.
fn derive_table(
    path: std::path::PathBuf,
    history_start: NaiveDate,
    engine: IndicatorEngine,
    diagnostics: &mut Diagnostics,
) -> Result<Option<IndicatorTable>, PipelineError> {
    let table = match storage::load_table(&path) {
        Ok(Some(table)) => table,
        Ok(None) => return Ok(None),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable auxiliary table, treated as absent");
            return Ok(None);
        }
    };
    let mut table = table.rows_since(history_start);
    diagnostics.extend(engine.apply(&mut table)?);
    Ok(Some(table))
}
