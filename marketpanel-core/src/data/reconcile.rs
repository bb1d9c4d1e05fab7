//! Auxiliary series reconciliation.
//!
//! An auxiliary series (e.g. a government bond yield) has its own provenance
//! and calendar and may not overlap the panel at all. Reconciliation tries
//! three attempts in a fixed order and the first one that produces data wins:
//!
//! 1. [`ReconcileAttempt::Clip`]: keep observations inside the panel's date range.
//! 2. [`ReconcileAttempt::ResampleDaily`]: forward-fill the series to daily
//!    frequency, then clip again.
//! 3. [`ReconcileAttempt::ConstantDefault`]: a constant column of the configured
//!    fallback value, with a warning.
//!
//! A successful clip is reindexed onto the panel's exact index with
//! forward-fill. Panel dates before the first clipped observation stay
//! undefined; no back-fill is applied here.

use super::panel::Panel;
use super::series::RawSeries;
use crate::error::{PanelError, PanelWarning};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default used when the 10-year government bond yield cannot be reconciled.
pub const DEFAULT_BOND_YIELD_FALLBACK: f64 = 2.5;

/// Reconciler configuration. The fallback is explicit so tests can override it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    pub fallback_value: f64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            fallback_value: DEFAULT_BOND_YIELD_FALLBACK,
        }
    }
}

/// The attempts of the fallback chain, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAttempt {
    Clip,
    ResampleDaily,
    ConstantDefault,
}

impl ReconcileAttempt {
    pub const ORDER: [ReconcileAttempt; 3] = [
        ReconcileAttempt::Clip,
        ReconcileAttempt::ResampleDaily,
        ReconcileAttempt::ConstantDefault,
    ];
}

/// Outcome of reconciling one auxiliary series onto a panel index.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// One value per panel date.
    pub values: Vec<Option<f64>>,
    /// The attempt that produced `values`.
    pub attempt: ReconcileAttempt,
    pub warning: Option<PanelWarning>,
}

/// Reconcile `aux` onto `index`. Never fails: the last attempt always succeeds.
pub fn reconcile(index: &[NaiveDate], aux: &RawSeries, config: &ReconcileConfig) -> Reconciliation {
    let points = aux.defined_points();
    let range = index.first().copied().zip(index.last().copied());

    for attempt in ReconcileAttempt::ORDER {
        let aligned = match (attempt, range) {
            (ReconcileAttempt::Clip, Some((lo, hi))) => clip(&points, lo, hi),
            (ReconcileAttempt::ResampleDaily, Some((lo, hi))) => {
                clip(&resample_daily(&points), lo, hi)
            }
            (ReconcileAttempt::ConstantDefault, _) => break,
            (_, None) => continue,
        };

        if !aligned.is_empty() {
            tracing::debug!(column = %aux.name, ?attempt, points = aligned.len(), "reconciled auxiliary series");
            return Reconciliation {
                values: reindex_forward(index, &aligned),
                attempt,
                warning: None,
            };
        }
    }

    tracing::debug!(
        column = %aux.name,
        fallback = config.fallback_value,
        "auxiliary series unavailable for panel range, using default"
    );
    Reconciliation {
        values: vec![Some(config.fallback_value); index.len()],
        attempt: ReconcileAttempt::ConstantDefault,
        warning: Some(PanelWarning::AuxiliaryUnavailable {
            column: aux.name.clone(),
            fallback: config.fallback_value,
        }),
    }
}

/// Reconcile `aux` and store it in `panel` under `aux.name`.
pub fn reconcile_into(
    panel: &mut Panel,
    aux: &RawSeries,
    config: &ReconcileConfig,
) -> Result<Reconciliation, PanelError> {
    let rec = reconcile(panel.dates(), aux, config);
    panel.insert_column(aux.name.clone(), rec.values.clone())?;
    Ok(rec)
}

/// Observations inside the closed interval `[lo, hi]`. Input must be sorted.
fn clip(points: &[(NaiveDate, f64)], lo: NaiveDate, hi: NaiveDate) -> Vec<(NaiveDate, f64)> {
    points
        .iter()
        .filter(|(d, _)| *d >= lo && *d <= hi)
        .copied()
        .collect()
}

/// Expand sorted observations to one per calendar day between the first and
/// last observation, carrying each value forward.
fn resample_daily(points: &[(NaiveDate, f64)]) -> Vec<(NaiveDate, f64)> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut next = 0;
    let mut current = first.1;
    for day in first.0.iter_days().take_while(|d| *d <= last.0) {
        while next < points.len() && points[next].0 <= day {
            current = points[next].1;
            next += 1;
        }
        out.push((day, current));
    }
    out
}

/// Value on each index date = latest observation dated on or before it.
fn reindex_forward(index: &[NaiveDate], points: &[(NaiveDate, f64)]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(index.len());
    let mut next = 0;
    let mut current = None;
    for date in index {
        while next < points.len() && points[next].0 <= *date {
            current = Some(points[next].1);
            next += 1;
        }
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn index(ds: &[&str]) -> Vec<NaiveDate> {
        ds.iter().map(|s| d(s)).collect()
    }

    fn aux(pts: &[(&str, f64)]) -> RawSeries {
        RawSeries::new(
            "China_10Y_Treasury_Yield",
            pts.iter().map(|(s, v)| (d(s), Some(*v))).collect(),
        )
    }

    #[test]
    fn overlapping_series_is_clipped_and_forward_filled() {
        let idx = index(&["2024-01-02", "2024-01-03", "2024-01-04", "2024-01-05"]);
        let a = aux(&[("2023-12-29", 2.6), ("2024-01-03", 2.5), ("2024-01-05", 2.4)]);
        let rec = reconcile(&idx, &a, &ReconcileConfig::default());
        assert_eq!(rec.attempt, ReconcileAttempt::Clip);
        // 2024-01-02 predates the first clipped point: stays undefined.
        assert_eq!(rec.values, vec![None, Some(2.5), Some(2.5), Some(2.4)]);
        assert!(rec.warning.is_none());
    }

    #[test]
    fn sparse_series_is_resampled_daily() {
        // Monthly observations straddle a short panel with no point inside it.
        let idx = index(&["2024-01-10", "2024-01-11", "2024-01-12"]);
        let a = aux(&[("2024-01-01", 2.3), ("2024-02-01", 2.2)]);
        let rec = reconcile(&idx, &a, &ReconcileConfig::default());
        assert_eq!(rec.attempt, ReconcileAttempt::ResampleDaily);
        assert_eq!(rec.values, vec![Some(2.3), Some(2.3), Some(2.3)]);
    }

    #[test]
    fn post_dated_series_falls_back_to_constant() {
        let idx = index(&["2024-01-02", "2024-01-03"]);
        let a = aux(&[("2025-01-02", 1.8)]);
        let cfg = ReconcileConfig { fallback_value: 3.1 };
        let rec = reconcile(&idx, &a, &cfg);
        assert_eq!(rec.attempt, ReconcileAttempt::ConstantDefault);
        assert_eq!(rec.values, vec![Some(3.1), Some(3.1)]);
        assert_eq!(
            rec.warning,
            Some(PanelWarning::AuxiliaryUnavailable {
                column: "China_10Y_Treasury_Yield".into(),
                fallback: 3.1
            })
        );
    }

    #[test]
    fn pre_dated_series_falls_back_to_constant() {
        let idx = index(&["2024-01-02"]);
        let a = aux(&[("2023-01-02", 2.9), ("2023-06-01", 2.7)]);
        let rec = reconcile(&idx, &a, &ReconcileConfig::default());
        assert_eq!(rec.attempt, ReconcileAttempt::ConstantDefault);
        assert_eq!(rec.values, vec![Some(DEFAULT_BOND_YIELD_FALLBACK)]);
    }

    #[test]
    fn empty_series_falls_back_to_constant() {
        let idx = index(&["2024-01-02"]);
        let a = RawSeries::new("China_10Y_Treasury_Yield", vec![(d("2024-01-02"), None)]);
        let rec = reconcile(&idx, &a, &ReconcileConfig::default());
        assert_eq!(rec.attempt, ReconcileAttempt::ConstantDefault);
    }

    #[test]
    fn reconcile_into_inserts_column() {
        let mut panel = Panel::new(index(&["2024-01-02", "2024-01-03"])).unwrap();
        let a = aux(&[("2024-01-02", 2.5)]);
        let rec = reconcile_into(&mut panel, &a, &ReconcileConfig::default()).unwrap();
        assert_eq!(rec.attempt, ReconcileAttempt::Clip);
        assert_eq!(
            panel.column("China_10Y_Treasury_Yield").unwrap(),
            &[Some(2.5), Some(2.5)]
        );
    }

    #[test]
    fn resample_daily_carries_values() {
        let pts = vec![(d("2024-01-01"), 1.0), (d("2024-01-03"), 3.0)];
        assert_eq!(
            resample_daily(&pts),
            vec![(d("2024-01-01"), 1.0), (d("2024-01-02"), 1.0), (d("2024-01-03"), 3.0)]
        );
    }
}
