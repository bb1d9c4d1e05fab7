//! Serializable pipeline configuration.
//!
//! Stored as TOML. Every field has a default, so an empty file (or no file at
//! all) reproduces the production settings: 27 instruments, a one-year fetch
//! window, the gold spot/near-month basis, a 2.5 bond-yield fallback, and the
//! five-year valuation window.

use chrono::NaiveDate;
use chrono_tz::Tz;
use marketpanel_core::indicators::Rolling;
use marketpanel_core::ReconcileConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One fetched instrument: provider ticker and the panel column it becomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub ticker: String,
    pub column: String,
}

impl Instrument {
    pub fn new(ticker: &str, column: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            column: column.to_string(),
        }
    }
}

/// Spread between two related instruments, e.g. spot minus near-month future.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisConfig {
    pub name: String,
    pub minuend: String,
    pub subtrahend: String,
}

impl Default for BasisConfig {
    fn default() -> Self {
        Self {
            name: "GOLD_basis_spot_vs_near".into(),
            minuend: "GOLD_spot_price".into(),
            subtrahend: "GOLD_near_month_future".into(),
        }
    }
}

/// The government bond yield auxiliary series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BondYieldConfig {
    /// Panel column name of the reconciled series.
    pub column: String,
    /// Value used when the series cannot be reconciled onto the panel.
    pub fallback_value: f64,
    /// CSV file, relative to the data directory unless absolute.
    pub path: PathBuf,
}

impl Default for BondYieldConfig {
    fn default() -> Self {
        Self {
            column: "China_10Y_Treasury_Yield".into(),
            fallback_value: marketpanel_core::data::DEFAULT_BOND_YIELD_FALLBACK,
            path: PathBuf::from("china_10y_treasury_yield.csv"),
        }
    }
}

impl BondYieldConfig {
    pub fn reconcile_config(&self) -> ReconcileConfig {
        ReconcileConfig {
            fallback_value: self.fallback_value,
        }
    }
}

/// Valuation tables and their rolling statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationConfig {
    /// Rows before this date are dropped from both tables before deriving.
    pub history_start: NaiveDate,
    pub trading_days_per_year: usize,
    pub window_years: usize,
    pub min_periods: usize,
    pub band_multipliers: Vec<f64>,
    pub buffett_path: PathBuf,
    pub spread_path: PathBuf,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            history_start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
            trading_days_per_year: 252,
            window_years: 5,
            min_periods: 1,
            band_multipliers: vec![1.0, 2.0],
            buffett_path: PathBuf::from("buffett_indicator_data.csv"),
            spread_path: PathBuf::from("equity_bond_spread_data.csv"),
        }
    }
}

impl ValuationConfig {
    /// Rolling window in rows.
    pub fn window(&self) -> usize {
        Rolling::trading_years(self.window_years, self.trading_days_per_year)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    /// Length of the trailing table in the Markdown report, in calendar months.
    pub trailing_months: u32,
    /// Columns listed first in the trailing table, when present.
    pub priority_columns: Vec<String>,
    /// IANA timezone used to date report files.
    pub timezone: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            trailing_months: 1,
            priority_columns: [
                "China_10Y_Treasury_Yield",
                "US_10Y_Treasury_Yield",
                "Shanghai_Composite_Index",
                "CSI_300_Index",
                "Shenzhen_Component_Index",
                "GOLD_spot_price",
                "OIL_price",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            timezone: "Asia/Shanghai".into(),
        }
    }
}

impl ExportConfig {
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::Invalid(format!("unknown timezone '{}': {e}", self.timezone)))
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Fetch window is `[today - 365 * lookback_years days, today]`.
    pub lookback_years: u32,
    /// Raw series CSVs (offline mode) and auxiliary tables live here.
    pub data_dir: PathBuf,
    /// Read raw series from `data_dir` instead of the network.
    pub offline: bool,
    /// Columns that get a `<column>_pct_change` companion.
    pub pct_change_columns: Vec<String>,
    pub basis: Option<BasisConfig>,
    pub bond_yield: BondYieldConfig,
    pub valuation: ValuationConfig,
    pub export: ExportConfig,
    pub instruments: Vec<Instrument>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lookback_years: 1,
            data_dir: PathBuf::from("."),
            offline: false,
            pct_change_columns: Vec::new(),
            basis: Some(BasisConfig::default()),
            bond_yield: BondYieldConfig::default(),
            valuation: ValuationConfig::default(),
            export: ExportConfig::default(),
            instruments: default_instruments(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lookback_years == 0 {
            return Err(ConfigError::Invalid("lookback_years must be >= 1".into()));
        }
        if self.valuation.window() == 0 {
            return Err(ConfigError::Invalid("valuation window must be >= 1 row".into()));
        }
        if self.valuation.min_periods == 0 {
            return Err(ConfigError::Invalid("valuation.min_periods must be >= 1".into()));
        }
        if let Some(k) = self
            .valuation
            .band_multipliers
            .iter()
            .find(|k| !k.is_finite() || **k < 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "band multiplier {k} must be finite and >= 0"
            )));
        }
        if !self.bond_yield.fallback_value.is_finite() {
            return Err(ConfigError::Invalid("bond_yield.fallback_value must be finite".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for inst in &self.instruments {
            if !seen.insert(inst.column.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "column '{}' is mapped by more than one instrument",
                    inst.column
                )));
            }
        }
        self.export.tz()?;
        Ok(())
    }

    /// Resolve a configured path against the data directory.
    pub fn data_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}

/// The production instrument list, in panel column order.
pub fn default_instruments() -> Vec<Instrument> {
    [
        ("GC=F", "GOLD_spot_price"),
        ("MGC=F", "GOLD_near_month_future"),
        ("SI=F", "SILVER_future"),
        ("PL=F", "PLATINUM_future"),
        ("HG=F", "COPPER_future"),
        ("ALI=F", "ALUMINUM_future"),
        ("CL=F", "OIL_price"),
        ("NG=F", "NATURAL_GAS_future"),
        ("ZC=F", "CORN_future"),
        ("ZS=F", "SOYBEANS_future"),
        ("ZW=F", "WHEAT_future"),
        ("LE=F", "LIVE_CATTLE_future"),
        ("HE=F", "LEAN_HOGS_future"),
        ("BTC-USD", "BTC_price"),
        ("ETH-USD", "ETH_price"),
        ("^GSPC", "SP500_close"),
        ("^IXIC", "NASDAQ_close"),
        ("^VIX", "VIX_close"),
        ("000001.SS", "Shanghai_Composite_Index"),
        ("399001.SZ", "Shenzhen_Component_Index"),
        ("000300.SS", "CSI_300_Index"),
        ("DX-Y.NYB", "US_Dollar_Index"),
        ("CNY=X", "USD_CNY_exchange_rate"),
        ("^TNX", "US_10Y_Treasury_Yield"),
        ("TLT", "Long_Term_Treasury_ETF"),
        ("HYG", "High_Yield_Bond_ETF"),
        ("DBC", "Commodity_Index_ETF"),
    ]
    .into_iter()
    .map(|(t, c)| Instrument::new(t, c))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_settings() {
        let c = PipelineConfig::default();
        assert_eq!(c.instruments.len(), 27);
        assert_eq!(c.instruments[0], Instrument::new("GC=F", "GOLD_spot_price"));
        assert_eq!(c.bond_yield.fallback_value, 2.5);
        assert_eq!(c.valuation.window(), 1260);
        assert_eq!(c.export.priority_columns.len(), 7);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let c = PipelineConfig::from_toml("").unwrap();
        assert_eq!(c, PipelineConfig::default());
    }

    #[test]
    fn toml_roundtrip() {
        let c = PipelineConfig::default();
        let text = c.to_toml().unwrap();
        assert_eq!(PipelineConfig::from_toml(&text).unwrap(), c);
    }

    #[test]
    fn partial_override() {
        let c = PipelineConfig::from_toml(
            r#"
            lookback_years = 3
            pct_change_columns = ["OIL_price"]

            [bond_yield]
            fallback_value = 2.1

            [[instruments]]
            ticker = "^VIX"
            column = "VIX_close"
            "#,
        )
        .unwrap();
        assert_eq!(c.lookback_years, 3);
        assert_eq!(c.bond_yield.fallback_value, 2.1);
        assert_eq!(c.bond_yield.column, "China_10Y_Treasury_Yield");
        assert_eq!(c.instruments.len(), 1);
        assert_eq!(c.valuation.history_start, NaiveDate::from_ymd_opt(2010, 1, 1).unwrap());
    }

    #[test]
    fn rejects_bad_timezone() {
        let err = PipelineConfig::from_toml("[export]\ntimezone = \"Mars/Olympus\"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_duplicate_columns() {
        let mut c = PipelineConfig::default();
        c.instruments.push(Instrument::new("GLD", "GOLD_spot_price"));
        assert!(c.validate().is_err());
    }

    #[test]
    fn relative_paths_resolve_against_data_dir() {
        let c = PipelineConfig {
            data_dir: PathBuf::from("/srv/market"),
            ..PipelineConfig::default()
        };
        assert_eq!(
            c.data_path(&c.bond_yield.path),
            PathBuf::from("/srv/market/china_10y_treasury_yield.csv")
        );
        assert_eq!(c.data_path(Path::new("/abs/x.csv")), PathBuf::from("/abs/x.csv"));
    }
}
