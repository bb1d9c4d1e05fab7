//! Valuation indicator presets for the two auxiliary tables.
//!
//! The auxiliary tables keep the column labels they are published with, so
//! the derived columns use the same labels: downstream charts and the
//! snapshot read them by name.

use super::engine::IndicatorSpec;
use super::rolling::Aggregation;

// ── Buffett indicator table ──

pub const TOTAL_MARKET_CAP: &str = "总市值";
pub const GDP: &str = "GDP";
pub const BUFFETT_INDICATOR: &str = "巴菲特指标";
/// Historical percentile, published with the table and never recomputed.
pub const TOTAL_PERCENTILE: &str = "总历史分位数";
pub const CLOSE_PRICE: &str = "收盘价";

// ── Equity-bond spread table ──

pub const EQUITY_BOND_SPREAD: &str = "股债利差";
pub const SPREAD_MEAN: &str = "5年均线";
pub const SPREAD_STD: &str = "5年标准差";
pub const CSI300_INDEX: &str = "沪深300指数";

/// Buffett indicator: total market value over GDP.
pub fn buffett_specs() -> Vec<IndicatorSpec> {
    vec![IndicatorSpec::ratio(BUFFETT_INDICATOR, TOTAL_MARKET_CAP, GDP)]
}

/// Rolling mean and std of the equity-bond spread plus sigma bands.
///
/// `window` is in rows (trading days); the production setting is five years
/// of 252 days with `min_periods = 1`.
pub fn spread_specs(window: usize, min_periods: usize, multipliers: &[f64]) -> Vec<IndicatorSpec> {
    vec![
        IndicatorSpec::rolling(SPREAD_MEAN, EQUITY_BOND_SPREAD, window, min_periods, Aggregation::Mean),
        IndicatorSpec::rolling(SPREAD_STD, EQUITY_BOND_SPREAD, window, min_periods, Aggregation::Std),
        IndicatorSpec::bands(SPREAD_MEAN, SPREAD_STD, multipliers),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Panel;
    use crate::indicators::{assert_approx, defined, IndicatorEngine, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn buffett_ratio() {
        let mut table = Panel::from_columns(
            vec![day(1), day(2)],
            vec![
                (TOTAL_MARKET_CAP.into(), defined(&[90.0, 120.0])),
                (GDP.into(), defined(&[100.0, 100.0])),
            ],
        )
        .unwrap();
        let warnings = IndicatorEngine::new(buffett_specs()).apply(&mut table).unwrap();
        assert!(warnings.is_empty());
        assert_approx(table.value_at(BUFFETT_INDICATOR, 0).unwrap(), 0.9, DEFAULT_EPSILON);
        assert_approx(table.value_at(BUFFETT_INDICATOR, 1).unwrap(), 1.2, DEFAULT_EPSILON);
    }

    #[test]
    fn spread_columns_in_published_order() {
        let mut table = Panel::from_columns(
            vec![day(1), day(2), day(3)],
            vec![
                (CSI300_INDEX.into(), defined(&[3500.0, 3510.0, 3490.0])),
                (EQUITY_BOND_SPREAD.into(), defined(&[5.0, 5.5, 6.0])),
            ],
        )
        .unwrap();
        IndicatorEngine::new(spread_specs(1260, 1, &[1.0, 2.0]))
            .apply(&mut table)
            .unwrap();
        assert_eq!(
            table.column_names(),
            vec![
                CSI300_INDEX,
                EQUITY_BOND_SPREAD,
                SPREAD_MEAN,
                SPREAD_STD,
                "+1 STD",
                "-1 STD",
                "+2 STD",
                "-2 STD"
            ]
        );
        assert_approx(table.value_at(SPREAD_MEAN, 2).unwrap(), 5.5, DEFAULT_EPSILON);
        assert_approx(table.value_at(SPREAD_STD, 2).unwrap(), 0.5, DEFAULT_EPSILON);
        assert_approx(table.value_at("-2 STD", 2).unwrap(), 4.5, DEFAULT_EPSILON);
    }

    #[test]
    fn missing_gdp_omits_indicator() {
        let mut table = Panel::from_columns(
            vec![day(1)],
            vec![(TOTAL_MARKET_CAP.into(), defined(&[90.0]))],
        )
        .unwrap();
        let warnings = IndicatorEngine::new(buffett_specs()).apply(&mut table).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(!table.contains(BUFFETT_INDICATOR));
    }
}
