//! Latest-observation snapshot of the panel and the auxiliary tables.
//!
//! The snapshot is a pure last-value projection: no interpolation, no
//! estimation. Every field has a fixed place in the output shape; a value
//! that is absent (missing column, undefined last cell) is an explicit
//! `null`, never a missing key.

use crate::data::Panel;
use crate::indicators::pct_change::PCT_CHANGE_SUFFIX;
use crate::indicators::valuation::{
    BUFFETT_INDICATOR, CLOSE_PRICE, CSI300_INDEX, EQUITY_BOND_SPREAD, GDP, SPREAD_MEAN,
    SPREAD_STD, TOTAL_MARKET_CAP, TOTAL_PERCENTILE,
};
use chrono::NaiveDate;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Snapshot field → source column, for the Buffett indicator table.
pub const BUFFETT_FIELDS: [(&str, &str); 5] = [
    ("indicator_value", BUFFETT_INDICATOR),
    ("total_market_cap", TOTAL_MARKET_CAP),
    ("gdp", GDP),
    ("total_percentile", TOTAL_PERCENTILE),
    ("close_price", CLOSE_PRICE),
];

/// Snapshot field → source column, for the equity-bond spread table.
pub const SPREAD_FIELDS: [(&str, &str); 8] = [
    ("spread_value", EQUITY_BOND_SPREAD),
    ("five_year_ma", SPREAD_MEAN),
    ("five_year_std", SPREAD_STD),
    ("plus_1_std", "+1 STD"),
    ("minus_1_std", "-1 STD"),
    ("plus_2_std", "+2 STD"),
    ("minus_2_std", "-2 STD"),
    ("csi300_index", CSI300_INDEX),
];

/// Ordered name → nullable value pairs, serialised as a JSON object in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues(pub Vec<(String, Option<f64>)>);

impl FieldValues {
    pub fn get(&self, name: &str) -> Option<Option<f64>> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for FieldValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Last row of one auxiliary table, tagged with that table's own last date.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub date: NaiveDate,
    pub fields: FieldValues,
}

impl TableSnapshot {
    /// Project the last row of `table` through `mapping`. `None` for an empty table.
    pub fn from_table(table: &Panel, mapping: &[(&str, &str)]) -> Option<Self> {
        let date = table.last_date()?;
        let row = table.len() - 1;
        let fields = mapping
            .iter()
            .map(|(field, column)| (field.to_string(), table.value_at(column, row)))
            .collect();
        Some(Self {
            date,
            fields: FieldValues(fields),
        })
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields.get(field).flatten()
    }
}

impl Serialize for TableSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("date", &self.date)?;
        for (name, value) in &self.fields.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// The auxiliary tables available to [`extract`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotTables<'a> {
    pub buffett: Option<&'a Panel>,
    pub spread: Option<&'a Panel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub latest_date: NaiveDate,
    pub latest_values: FieldValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffett_indicator: Option<TableSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity_bond_spread: Option<TableSnapshot>,
}

impl Snapshot {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Reduce `panel` and `tables` to their latest observations.
///
/// `latest_values` lists panel columns in panel order, excluding one-step
/// percentage-change columns. Returns `None` only when the panel has no rows.
pub fn extract(panel: &Panel, tables: SnapshotTables<'_>) -> Option<Snapshot> {
    let (latest_date, row) = panel.last_row()?;
    let latest_values = row
        .into_iter()
        .filter(|(name, _)| !name.ends_with(PCT_CHANGE_SUFFIX))
        .map(|(name, v)| (name.to_string(), v))
        .collect();

    Some(Snapshot {
        latest_date,
        latest_values: FieldValues(latest_values),
        buffett_indicator: tables
            .buffett
            .and_then(|t| TableSnapshot::from_table(t, &BUFFETT_FIELDS)),
        equity_bond_spread: tables
            .spread
            .and_then(|t| TableSnapshot::from_table(t, &SPREAD_FIELDS)),
    })
}
