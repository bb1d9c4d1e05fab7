//! Multi-series calendar alignment.
//!
//! Given independently dated series (different exchanges, holiday calendars,
//! 24/7 crypto markets), build one panel on the union of all their dates.
//! Missing cells carry the last traded value forward; cells before a series'
//! first observation are back-filled from its first value. Columns with no
//! observation at all are dropped and reported.

use super::panel::Panel;
use super::series::RawSeries;
use crate::error::{PanelError, PanelWarning};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Result of aligning a set of raw series.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// Fully defined panel on the union index.
    pub panel: Panel,
    /// Names of columns removed because they had no defined value.
    pub dropped: Vec<String>,
    pub warnings: Vec<PanelWarning>,
}

/// Merge `series` onto the union of their dates.
///
/// Columns keep the order of `series`. A name appearing more than once is
/// merged into its first occurrence, with earlier observations winning.
/// Returns [`PanelError::NoData`] when no series contributes a single date.
pub fn align(series: Vec<RawSeries>) -> Result<Alignment, PanelError> {
    let merged = merge_duplicate_names(series);

    // Union of all dates (BTreeSet gives sorted + unique).
    let mut all_dates = BTreeSet::new();
    for s in &merged {
        for (date, _) in &s.points {
            all_dates.insert(*date);
        }
    }
    if all_dates.is_empty() {
        return Err(PanelError::NoData);
    }
    let dates: Vec<NaiveDate> = all_dates.into_iter().collect();
    let mut panel = Panel::new(dates)?;

    let mut dropped = Vec::new();
    for s in &merged {
        let date_map: HashMap<NaiveDate, Option<f64>> = s.sorted_deduped().into_iter().collect();
        let values: Vec<Option<f64>> = panel
            .dates()
            .iter()
            .map(|d| date_map.get(d).copied().flatten())
            .collect();

        if values.iter().all(|v| v.is_none()) {
            dropped.push(s.name.clone());
            continue;
        }
        panel.insert_column(s.name.clone(), values)?;
    }

    if panel.columns().is_empty() {
        // Dates existed but every value was undefined.
        return Err(PanelError::NoData);
    }

    panel.forward_fill();
    panel.back_fill();

    let mut warnings = Vec::new();
    if !dropped.is_empty() {
        warnings.push(PanelWarning::EmptyColumn {
            columns: dropped.clone(),
        });
    }

    tracing::debug!(
        rows = panel.len(),
        columns = panel.columns().len(),
        dropped = dropped.len(),
        "aligned raw series"
    );

    Ok(Alignment {
        panel,
        dropped,
        warnings,
    })
}

fn merge_duplicate_names(series: Vec<RawSeries>) -> Vec<RawSeries> {
    let mut out: Vec<RawSeries> = Vec::with_capacity(series.len());
    for s in series {
        match out.iter_mut().find(|o| o.name == s.name) {
            Some(existing) => existing.points.extend(s.points),
            None => out.push(s),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn series(name: &str, pts: &[(&str, f64)]) -> RawSeries {
        RawSeries::new(name, pts.iter().map(|(s, v)| (d(s), Some(*v))).collect())
    }

    #[test]
    fn union_index_is_sorted() {
        let aligned = align(vec![
            series("SP500_close", &[("2024-01-04", 3.0), ("2024-01-02", 1.0)]),
            series("CSI_300_Index", &[("2024-01-03", 20.0)]),
        ])
        .unwrap();
        assert_eq!(
            aligned.panel.dates(),
            &[d("2024-01-02"), d("2024-01-03"), d("2024-01-04")]
        );
        assert_eq!(aligned.panel.column_names(), vec!["SP500_close", "CSI_300_Index"]);
    }

    #[test]
    fn gaps_are_forward_filled() {
        // Shanghai closed on 2024-01-03 while New York traded.
        let aligned = align(vec![
            series(
                "SP500_close",
                &[("2024-01-02", 1.0), ("2024-01-03", 2.0), ("2024-01-04", 3.0)],
            ),
            series("Shanghai_Composite_Index", &[("2024-01-02", 10.0), ("2024-01-04", 12.0)]),
        ])
        .unwrap();
        assert_eq!(
            aligned.panel.column("Shanghai_Composite_Index").unwrap(),
            &[Some(10.0), Some(10.0), Some(12.0)]
        );
    }

    #[test]
    fn leading_gap_is_back_filled() {
        let aligned = align(vec![
            series("BTC_price", &[("2024-01-01", 1.0), ("2024-01-02", 2.0)]),
            series("SP500_close", &[("2024-01-02", 5.0)]),
        ])
        .unwrap();
        assert_eq!(
            aligned.panel.column("SP500_close").unwrap(),
            &[Some(5.0), Some(5.0)]
        );
        assert_eq!(aligned.panel.undefined_cells(), 0);
    }

    #[test]
    fn empty_columns_are_dropped_and_reported() {
        let aligned = align(vec![
            series("GOLD_spot_price", &[("2024-01-02", 1.0)]),
            RawSeries::new("ALUMINUM_future", vec![(d("2024-01-02"), None)]),
            RawSeries::empty("LEAN_HOGS_future"),
        ])
        .unwrap();
        assert_eq!(aligned.dropped, vec!["ALUMINUM_future", "LEAN_HOGS_future"]);
        assert!(!aligned.panel.contains("ALUMINUM_future"));
        assert_eq!(
            aligned.warnings,
            vec![PanelWarning::EmptyColumn {
                columns: vec!["ALUMINUM_future".into(), "LEAN_HOGS_future".into()]
            }]
        );
    }

    #[test]
    fn no_series_is_no_data() {
        assert_eq!(align(vec![]).unwrap_err(), PanelError::NoData);
        assert_eq!(
            align(vec![RawSeries::empty("a"), RawSeries::empty("b")]).unwrap_err(),
            PanelError::NoData
        );
    }

    #[test]
    fn all_undefined_values_is_no_data() {
        let s = RawSeries::new("a", vec![(d("2024-01-02"), None)]);
        assert_eq!(align(vec![s]).unwrap_err(), PanelError::NoData);
    }

    #[test]
    fn duplicate_names_merge_first_wins() {
        let aligned = align(vec![
            series("OIL_price", &[("2024-01-02", 70.0)]),
            series("OIL_price", &[("2024-01-02", 99.0), ("2024-01-03", 71.0)]),
        ])
        .unwrap();
        assert_eq!(aligned.panel.columns().len(), 1);
        assert_eq!(
            aligned.panel.column("OIL_price").unwrap(),
            &[Some(70.0), Some(71.0)]
        );
    }
}
