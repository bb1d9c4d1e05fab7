//! The aligned, date-indexed table holding raw and derived columns.
//!
//! A `Panel` is an ordered date index plus named columns of nullable values.
//! Column order is insertion order and is preserved through every operation,
//! so exports and snapshots list columns the way the pipeline produced them.

use crate::error::PanelError;
use chrono::NaiveDate;
use polars::prelude as pl;
use serde::{Deserialize, Serialize};

/// One named column of a [`Panel`]. `None` is an undefined cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    /// Number of defined cells.
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_all_undefined(&self) -> bool {
        self.values.iter().all(|v| v.is_none())
    }
}

/// Date-indexed table with a strictly increasing, duplicate-free index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Panel {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl Panel {
    /// Create an empty-column panel over `dates`.
    ///
    /// Fails with [`PanelError::UnsortedIndex`] unless `dates` is strictly increasing.
    pub fn new(dates: Vec<NaiveDate>) -> Result<Self, PanelError> {
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PanelError::UnsortedIndex { date: w[1] });
        }
        Ok(Self {
            dates,
            columns: Vec::new(),
        })
    }

    /// Create a panel and insert `columns` in order. Duplicate names are rejected.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, PanelError> {
        let mut panel = Self::new(dates)?;
        for (name, values) in columns {
            if panel.contains(&name) {
                return Err(PanelError::DuplicateColumn(name));
            }
            panel.insert_column(name, values)?;
        }
        Ok(panel)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Append a column, or replace the values of an existing column in place.
    ///
    /// Non-finite values are stored as undefined.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), PanelError> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(PanelError::LengthMismatch {
                column: name,
                expected: self.dates.len(),
                actual: values.len(),
            });
        }
        let values: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Fill every row of a column with the same value.
    pub fn insert_constant(&mut self, name: impl Into<String>, value: f64) -> Result<(), PanelError> {
        let values = vec![Some(value); self.dates.len()];
        self.insert_column(name, values)
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Position of `date` in the index, if present.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn value_at(&self, name: &str, row: usize) -> Option<f64> {
        self.column(name).and_then(|c| c.get(row).copied().flatten())
    }

    /// The last-dated row, in column order.
    pub fn last_row(&self) -> Option<(NaiveDate, Vec<(&str, Option<f64>)>)> {
        let date = self.last_date()?;
        let row = self.dates.len() - 1;
        let values = self
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.values[row]))
            .collect();
        Some((date, values))
    }

    /// Sub-panel containing only rows dated on or after `cutoff`.
    pub fn rows_since(&self, cutoff: NaiveDate) -> Panel {
        let start = self.dates.partition_point(|d| *d < cutoff);
        self.slice_rows(start, self.dates.len())
    }

    /// Sub-panel for rows in the closed interval `[start, end]`.
    pub fn rows_between(&self, start: NaiveDate, end: NaiveDate) -> Panel {
        let lo = self.dates.partition_point(|d| *d < start);
        let hi = self.dates.partition_point(|d| *d <= end);
        self.slice_rows(lo, hi.max(lo))
    }

    fn slice_rows(&self, lo: usize, hi: usize) -> Panel {
        Panel {
            dates: self.dates[lo..hi].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: c.values[lo..hi].to_vec(),
                })
                .collect(),
        }
    }

    /// Carry the last defined value forward in every column.
    pub fn forward_fill(&mut self) {
        for c in &mut self.columns {
            forward_fill(&mut c.values);
        }
    }

    /// Fill leading undefined cells from the next defined value in every column.
    pub fn back_fill(&mut self) {
        for c in &mut self.columns {
            back_fill(&mut c.values);
        }
    }

    /// Count of undefined cells across all columns.
    pub fn undefined_cells(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.values.len() - c.defined_count())
            .sum()
    }

    /// Deterministic BLAKE3 digest of the index and every column, in order.
    ///
    /// Two panels with identical dates, column order and bit-identical values
    /// hash to the same string.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for date in &self.dates {
            hasher.update(date.to_string().as_bytes());
        }
        for column in &self.columns {
            hasher.update(column.name.as_bytes());
            hasher.update(&[0xff]);
            for v in &column.values {
                match v {
                    Some(x) => {
                        hasher.update(&[1]);
                        hasher.update(&x.to_le_bytes());
                    }
                    None => {
                        hasher.update(&[0]);
                    }
                }
            }
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Convert to a Polars DataFrame: a `date` column of `DataType::Date`
    /// followed by one nullable Float64 column per panel column.
    pub fn to_dataframe(&self) -> pl::PolarsResult<pl::DataFrame> {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
        let days: Vec<i32> = self
            .dates
            .iter()
            .map(|d| (*d - epoch).num_days() as i32)
            .collect();

        let mut cols = Vec::with_capacity(self.columns.len() + 1);
        cols.push(pl::Column::new("date".into(), days).cast(&pl::DataType::Date)?);
        for c in &self.columns {
            cols.push(pl::Column::new(c.name.as_str().into(), c.values.clone()));
        }
        pl::DataFrame::new(cols)
    }
}

/// Replace each undefined cell with the most recent prior defined value.
pub fn forward_fill(values: &mut [Option<f64>]) {
    let mut last = None;
    for v in values.iter_mut() {
        match v {
            Some(x) => last = Some(*x),
            None => *v = last,
        }
    }
}

/// Replace each undefined cell with the next defined value after it.
pub fn back_fill(values: &mut [Option<f64>]) {
    let mut next = None;
    for v in values.iter_mut().rev() {
        match v {
            Some(x) => next = Some(*x),
            None => *v = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| base + chrono::Duration::days(i as i64)).collect()
    }

    #[test]
    fn new_rejects_unsorted_index() {
        let mut d = dates(3);
        d.swap(1, 2);
        assert!(matches!(Panel::new(d), Err(PanelError::UnsortedIndex { .. })));
    }

    #[test]
    fn new_rejects_duplicate_dates() {
        let mut d = dates(3);
        d[2] = d[1];
        assert!(Panel::new(d).is_err());
    }

    #[test]
    fn insert_column_checks_length() {
        let mut p = Panel::new(dates(3)).unwrap();
        let err = p.insert_column("a", vec![Some(1.0)]).unwrap_err();
        assert_eq!(
            err,
            PanelError::LengthMismatch {
                column: "a".into(),
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn insert_column_replaces_in_place() {
        let mut p = Panel::new(dates(2)).unwrap();
        p.insert_column("a", vec![Some(1.0), Some(2.0)]).unwrap();
        p.insert_column("b", vec![None, None]).unwrap();
        p.insert_column("a", vec![Some(3.0), None]).unwrap();
        assert_eq!(p.column_names(), vec!["a", "b"]);
        assert_eq!(p.column("a").unwrap(), &[Some(3.0), None]);
    }

    #[test]
    fn from_columns_rejects_duplicates() {
        let err = Panel::from_columns(
            dates(1),
            vec![("a".into(), vec![Some(1.0)]), ("a".into(), vec![Some(2.0)])],
        )
        .unwrap_err();
        assert_eq!(err, PanelError::DuplicateColumn("a".into()));
    }

    #[test]
    fn nan_is_stored_as_undefined() {
        let mut p = Panel::new(dates(2)).unwrap();
        p.insert_column("a", vec![Some(f64::NAN), Some(1.0)]).unwrap();
        assert_eq!(p.column("a").unwrap()[0], None);
    }

    #[test]
    fn forward_then_back_fill() {
        let mut v = vec![None, Some(1.0), None, Some(3.0), None];
        forward_fill(&mut v);
        assert_eq!(v, vec![None, Some(1.0), Some(1.0), Some(3.0), Some(3.0)]);
        back_fill(&mut v);
        assert_eq!(v[0], Some(1.0));
    }

    #[test]
    fn rows_since_and_between() {
        let d = dates(5);
        let p = Panel::from_columns(
            d.clone(),
            vec![("a".into(), (0..5).map(|i| Some(i as f64)).collect())],
        )
        .unwrap();

        let tail = p.rows_since(d[3]);
        assert_eq!(tail.dates(), &d[3..]);
        assert_eq!(tail.column("a").unwrap(), &[Some(3.0), Some(4.0)]);

        let mid = p.rows_between(d[1], d[2]);
        assert_eq!(mid.len(), 2);

        let none = p.rows_between(d[4] + chrono::Duration::days(1), d[4] + chrono::Duration::days(9));
        assert!(none.is_empty());
    }

    #[test]
    fn last_row_in_column_order() {
        let d = dates(2);
        let p = Panel::from_columns(
            d.clone(),
            vec![
                ("z".into(), vec![Some(1.0), Some(2.0)]),
                ("a".into(), vec![Some(3.0), None]),
            ],
        )
        .unwrap();
        let (date, row) = p.last_row().unwrap();
        assert_eq!(date, d[1]);
        assert_eq!(row, vec![("z", Some(2.0)), ("a", None)]);
    }

    #[test]
    fn fingerprint_is_deterministic_and_sensitive() {
        let build = |x: f64| {
            Panel::from_columns(dates(2), vec![("a".into(), vec![Some(1.0), Some(x)])]).unwrap()
        };
        assert_eq!(build(2.0).fingerprint(), build(2.0).fingerprint());
        assert_ne!(build(2.0).fingerprint(), build(2.5).fingerprint());
    }

    #[test]
    fn to_dataframe_has_date_column_first() {
        let p = Panel::from_columns(
            dates(3),
            vec![("GOLD_spot_price".into(), vec![Some(1.0), None, Some(3.0)])],
        )
        .unwrap();
        let df = p.to_dataframe().unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.get_column_names()[0].as_str(), "date");
        assert_eq!(df.column("GOLD_spot_price").unwrap().null_count(), 1);
    }
}
