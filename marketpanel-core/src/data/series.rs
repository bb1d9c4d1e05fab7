//! Raw per-symbol time series as delivered by a source adapter.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single dated observation. `None` marks a date the source reported
/// without a usable value.
pub type Observation = (NaiveDate, Option<f64>);

/// Ordered (date, value) pairs for one column.
///
/// Dates are not guaranteed to be sorted, unique, or aligned with any other
/// series. The aligner and reconciler normalise them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSeries {
    pub name: String,
    pub points: Vec<Observation>,
}

impl RawSeries {
    pub fn new(name: impl Into<String>, points: Vec<Observation>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// A series with no observations at all.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    /// Build from fully-defined values.
    pub fn from_values(name: impl Into<String>, points: &[(NaiveDate, f64)]) -> Self {
        Self::new(name, points.iter().map(|&(d, v)| (d, Some(v))).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sorted ascending by date; for duplicate dates the first observation wins.
    /// Non-finite values are normalised to `None`.
    pub fn sorted_deduped(&self) -> Vec<Observation> {
        let mut pts: Vec<Observation> = self
            .points
            .iter()
            .map(|&(d, v)| (d, v.filter(|x| x.is_finite())))
            .collect();
        // Stable sort keeps the original order among equal dates.
        pts.sort_by_key(|(d, _)| *d);
        pts.dedup_by_key(|(d, _)| *d);
        pts
    }

    /// Sorted, deduplicated, and with undefined observations removed.
    pub fn defined_points(&self) -> Vec<(NaiveDate, f64)> {
        self.sorted_deduped()
            .into_iter()
            .filter_map(|(d, v)| v.map(|x| (d, x)))
            .collect()
    }

    /// Earliest and latest date carrying a defined value.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let defined = self.defined_points();
        match (defined.first(), defined.last()) {
            (Some(first), Some(last)) => Some((first.0, last.0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn sorted_deduped_keeps_first_duplicate() {
        let s = RawSeries::new(
            "GOLD_spot_price",
            vec![
                (d("2024-01-03"), Some(2.0)),
                (d("2024-01-02"), Some(1.0)),
                (d("2024-01-03"), Some(99.0)),
            ],
        );
        let pts = s.sorted_deduped();
        assert_eq!(pts, vec![(d("2024-01-02"), Some(1.0)), (d("2024-01-03"), Some(2.0))]);
    }

    #[test]
    fn nan_becomes_undefined() {
        let s = RawSeries::new("VIX_close", vec![(d("2024-01-02"), Some(f64::NAN))]);
        assert_eq!(s.sorted_deduped(), vec![(d("2024-01-02"), None)]);
        assert!(s.defined_points().is_empty());
        assert_eq!(s.date_range(), None);
    }

    #[test]
    fn date_range_ignores_undefined_edges() {
        let s = RawSeries::new(
            "BTC_price",
            vec![
                (d("2024-01-01"), None),
                (d("2024-01-02"), Some(1.0)),
                (d("2024-01-05"), Some(2.0)),
                (d("2024-01-06"), None),
            ],
        );
        assert_eq!(s.date_range(), Some((d("2024-01-02"), d("2024-01-05"))));
    }
}
