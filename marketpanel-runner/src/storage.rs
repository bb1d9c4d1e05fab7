//! Auxiliary indicator storage.
//!
//! Auxiliary tables are CSV files whose first column is a date and whose
//! remaining columns are numeric. They are produced elsewhere (the valuation
//! tables carry Chinese column labels) and may be written with a UTF-8 BOM,
//! unsorted, or with blank cells. A missing file is a valid "no auxiliary
//! data" state, not an error.

use chrono::NaiveDate;
use marketpanel_core::data::{Panel, RawSeries};
use marketpanel_core::PanelError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A date-indexed auxiliary table.
pub type IndicatorTable = Panel;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unparseable date '{value}' in {path}, row {row}")]
    BadDate {
        path: PathBuf,
        row: usize,
        value: String,
    },

    #[error("table {path} has no value columns")]
    NoValueColumns { path: PathBuf },

    #[error("table {path}: {source}")]
    Panel {
        path: PathBuf,
        #[source]
        source: PanelError,
    },
}

/// Load an auxiliary table. `Ok(None)` when the file does not exist or is empty.
///
/// Rows are sorted ascending by date; when a date repeats, the first row wins.
/// Blank or unparseable cells are undefined.
pub fn load_table(path: &Path) -> Result<Option<IndicatorTable>, StorageError> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "auxiliary table not found");
        return Ok(None);
    }
    let csv_err = |source: csv::Error| StorageError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_string()
        })
        .collect();
    if headers.is_empty() {
        tracing::info!(path = %path.display(), "auxiliary table is empty");
        return Ok(None);
    }
    let names = &headers[1..];

    let mut rows: Vec<(NaiveDate, Vec<Option<f64>>)> = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let raw = record.get(0).unwrap_or_default().trim();
        if raw.is_empty() {
            continue;
        }
        let date = parse_date(raw).ok_or_else(|| StorageError::BadDate {
            path: path.to_path_buf(),
            row: i + 1,
            value: raw.to_string(),
        })?;
        let values = (1..=names.len())
            .map(|c| record.get(c).and_then(parse_value))
            .collect();
        rows.push((date, values));
    }

    // Stable sort keeps file order among equal dates; dedup keeps the first.
    rows.sort_by_key(|(d, _)| *d);
    rows.dedup_by_key(|(d, _)| *d);

    let dates = rows.iter().map(|(d, _)| *d).collect();
    let columns = names
        .iter()
        .enumerate()
        .map(|(c, name)| (name.clone(), rows.iter().map(|(_, v)| v[c]).collect()))
        .collect();
    let table = Panel::from_columns(dates, columns).map_err(|source| StorageError::Panel {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(path = %path.display(), rows = table.len(), columns = names.len(), "loaded auxiliary table");
    Ok(Some(table))
}

/// Load a single auxiliary series.
///
/// Uses the column named `column` when the file has one, otherwise the first
/// value column (a plain `date,value` file). The series is named `column`.
pub fn load_series(path: &Path, column: &str) -> Result<Option<RawSeries>, StorageError> {
    let Some(table) = load_table(path)? else {
        return Ok(None);
    };
    let values = match table.column(column) {
        Some(v) => v,
        None => match table.columns().first() {
            Some(first) => first.values.as_slice(),
            None => {
                return Err(StorageError::NoValueColumns {
                    path: path.to_path_buf(),
                })
            }
        },
    };
    let points = table
        .dates()
        .iter()
        .copied()
        .zip(values.iter().copied())
        .collect();
    Ok(Some(RawSeries::new(column, points)))
}

/// Write a table as CSV: a `date` column followed by every column in order.
/// Undefined cells are written empty.
pub fn write_table(path: &Path, table: &IndicatorTable) -> Result<(), StorageError> {
    let csv_err = |source: csv::Error| StorageError::Csv {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    let mut header = vec!["date".to_string()];
    header.extend(table.column_names().into_iter().map(String::from));
    writer.write_record(&header).map_err(csv_err)?;

    for (row, date) in table.dates().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(date.to_string());
        for c in table.columns() {
            record.push(c.values[row].map(|v| v.to_string()).unwrap_or_default());
        }
        writer.write_record(&record).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// `%Y-%m-%d`, optionally followed by a time (`2024-01-02 00:00:00`,
/// `2024-01-02T00:00:00`), or `%Y/%m/%d`.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.split([' ', 'T']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%Y/%m/%d"))
        .ok()
}

fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
