//! Raw series sources.
//!
//! The [`SeriesSource`] trait abstracts over where daily closes come from
//! (Yahoo's chart API, a directory of CSV files) so the pipeline can run
//! offline and tests can inject fixtures. Sources deliver observations only;
//! alignment and gap handling belong to the core.

use crate::config::Instrument;
use chrono::NaiveDate;
use marketpanel_core::data::{Observation, RawSeries};
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider")]
    RateLimited,

    #[error("HTTP {status} for {ticker}")]
    Http { ticker: String, status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {ticker}")]
    SymbolNotFound { ticker: String },

    #[error("no local data for '{ticker}' at {path}")]
    NoLocalData { ticker: String, path: PathBuf },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad row in {path}: {reason}")]
    BadRow { path: PathBuf, reason: String },
}

/// Provider of daily closes for one ticker at a time.
pub trait SeriesSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Daily observations for `ticker` within `[start, end]`.
    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Observation>, SourceError>;
}

/// Outcome of fetching every configured instrument.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// One series per instrument, in configured order, named by panel column.
    /// A failed fetch yields an empty series.
    pub series: Vec<RawSeries>,
    /// `(ticker, error message)` for each failed fetch.
    pub failed: Vec<(String, String)>,
}

impl FetchReport {
    pub fn succeeded(&self) -> usize {
        self.series.len() - self.failed.len()
    }
}

/// Fetch all instruments in parallel, reassembling results in input order.
pub fn fetch_all(
    source: &dyn SeriesSource,
    instruments: &[Instrument],
    start: NaiveDate,
    end: NaiveDate,
) -> FetchReport {
    let results: Vec<(&Instrument, Result<Vec<Observation>, SourceError>)> = instruments
        .par_iter()
        .map(|inst| (inst, source.fetch(&inst.ticker, start, end)))
        .collect();

    let mut report = FetchReport::default();
    for (inst, result) in results {
        match result {
            Ok(points) => {
                tracing::info!(ticker = %inst.ticker, column = %inst.column, rows = points.len(), "fetched");
                report.series.push(RawSeries::new(inst.column.clone(), points));
            }
            Err(e) => {
                tracing::warn!(ticker = %inst.ticker, column = %inst.column, error = %e, "fetch failed");
                report.failed.push((inst.ticker.clone(), e.to_string()));
                report.series.push(RawSeries::empty(inst.column.clone()));
            }
        }
    }
    report
}

// ── Yahoo chart API ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

/// Daily closes from Yahoo Finance's v8 chart API.
///
/// One request per ticker. Failures surface as errors; retry and backoff are
/// left to the caller.
pub struct YahooSource {
    client: reqwest::blocking::Client,
}

impl YahooSource {
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| SourceError::NetworkUnreachable(format!("build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn chart_url(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = (end + chrono::Duration::days(1))
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp()
            - 1;
        let symbol = encode_symbol(ticker);
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    /// Parse a chart response into dated closes in the exchange's local calendar.
    fn parse_response(ticker: &str, resp: ChartResponse) -> Result<Vec<Observation>, SourceError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => SourceError::SymbolNotFound {
                ticker: ticker.to_string(),
            },
            Some(err) => SourceError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
            None => SourceError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| SourceError::ResponseFormatChanged("result array is empty".into()))?;

        let offset = data.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
        // A chart with no trading days in range has no timestamp array.
        let timestamps = data.timestamp.unwrap_or_default();
        let closes = data
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let mut points = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts + offset, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| SourceError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;
            points.push((date, closes.get(i).copied().flatten()));
        }
        Ok(points)
    }
}

impl SeriesSource for YahooSource {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Observation>, SourceError> {
        let url = Self::chart_url(ticker, start, end);
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| SourceError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::SymbolNotFound {
                ticker: ticker.to_string(),
            });
        }
        if !status.is_success() {
            return Err(SourceError::Http {
                ticker: ticker.to_string(),
                status: status.as_u16(),
            });
        }

        let chart: ChartResponse = resp.json().map_err(|e| {
            SourceError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
        })?;
        Self::parse_response(ticker, chart)
    }
}

/// Percent-encode the characters Yahoo tickers use that are not URL-safe.
fn encode_symbol(ticker: &str) -> String {
    let mut out = String::with_capacity(ticker.len());
    for c in ticker.chars() {
        match c {
            '^' => out.push_str("%5E"),
            '=' => out.push_str("%3D"),
            c => out.push(c),
        }
    }
    out
}

// ── CSV directory ────────────────────────────────────────────────────

/// Reads `<dir>/<ticker>.csv` files with a `date,close` layout.
///
/// Ticker characters outside `[A-Za-z0-9._-]` become `_` in the file name, so
/// `^GSPC` is read from `_GSPC.csv` and `GC=F` from `GC_F.csv`.
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, ticker: &str) -> PathBuf {
        series_path(&self.dir, ticker)
    }
}

impl SeriesSource for CsvDirSource {
    fn name(&self) -> &str {
        "csv_dir"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Observation>, SourceError> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(SourceError::NoLocalData {
                ticker: ticker.to_string(),
                path,
            });
        }
        let points = read_series_csv(&path)?;
        Ok(points
            .into_iter()
            .filter(|(d, _)| *d >= start && *d <= end)
            .collect())
    }
}

/// File a ticker is stored under inside `dir`.
pub fn series_path(dir: &Path, ticker: &str) -> PathBuf {
    let file: String = ticker
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{file}.csv"))
}

fn read_series_csv(path: &Path) -> Result<Vec<Observation>, SourceError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut points = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default().trim();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| SourceError::BadRow {
            path: path.to_path_buf(),
            reason: format!("row {}: date '{raw_date}': {e}", i + 1),
        })?;
        let value = record
            .get(1)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite());
        points.push((date, value));
    }
    Ok(points)
}

/// Persist fetched observations as `date,close` for later offline runs.
pub fn write_series_csv(dir: &Path, ticker: &str, points: &[Observation]) -> Result<PathBuf, SourceError> {
    std::fs::create_dir_all(dir)?;
    let path = series_path(dir, ticker);
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(["date", "close"])?;
    for (date, value) in points {
        let value = value.map(|v| v.to_string()).unwrap_or_default();
        writer.write_record([date.to_string(), value])?;
    }
    writer.flush()?;
    Ok(path)
}
