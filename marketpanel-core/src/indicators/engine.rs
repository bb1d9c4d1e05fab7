//! Ordered application of indicator specs to a panel.
//!
//! Specs run in list order, so a later spec may consume a column produced by
//! an earlier one (bands read the rolling mean and std). A spec whose source
//! column is absent is skipped with a [`PanelWarning::MissingColumn`]; it never
//! fails the run.

use super::bands::{BandSide, SigmaBand};
use super::pair::PairIndicator;
use super::pct_change::PctChange;
use super::rolling::{Aggregation, Rolling};
use super::Indicator;
use crate::data::Panel;
use crate::error::{PanelError, PanelWarning};
use serde::{Deserialize, Serialize};

/// One derived column (or band family) to append to a panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorSpec {
    Basis {
        name: String,
        minuend: String,
        subtrahend: String,
    },
    Ratio {
        name: String,
        numerator: String,
        denominator: String,
    },
    Rolling {
        name: String,
        source: String,
        window: usize,
        min_periods: usize,
        aggregation: Aggregation,
    },
    /// Upper and lower bands for each multiplier, named `+k STD` / `-k STD`.
    Bands {
        mean: String,
        std: String,
        multipliers: Vec<f64>,
    },
    PctChange { source: String },
}

impl IndicatorSpec {
    pub fn basis(name: &str, minuend: &str, subtrahend: &str) -> Self {
        IndicatorSpec::Basis {
            name: name.into(),
            minuend: minuend.into(),
            subtrahend: subtrahend.into(),
        }
    }

    pub fn ratio(name: &str, numerator: &str, denominator: &str) -> Self {
        IndicatorSpec::Ratio {
            name: name.into(),
            numerator: numerator.into(),
            denominator: denominator.into(),
        }
    }

    pub fn rolling(
        name: &str,
        source: &str,
        window: usize,
        min_periods: usize,
        aggregation: Aggregation,
    ) -> Self {
        IndicatorSpec::Rolling {
            name: name.into(),
            source: source.into(),
            window,
            min_periods,
            aggregation,
        }
    }

    pub fn bands(mean: &str, std: &str, multipliers: &[f64]) -> Self {
        IndicatorSpec::Bands {
            mean: mean.into(),
            std: std.into(),
            multipliers: multipliers.to_vec(),
        }
    }

    pub fn pct_change(source: &str) -> Self {
        IndicatorSpec::PctChange {
            source: source.into(),
        }
    }

    /// Label used in warnings.
    pub fn label(&self) -> String {
        match self {
            IndicatorSpec::Basis { name, .. }
            | IndicatorSpec::Ratio { name, .. }
            | IndicatorSpec::Rolling { name, .. } => name.clone(),
            IndicatorSpec::Bands { mean, .. } => format!("{mean} bands"),
            IndicatorSpec::PctChange { source } => PctChange::for_column(source).name().to_string(),
        }
    }

    /// Columns this spec reads.
    pub fn sources(&self) -> Vec<&str> {
        match self {
            IndicatorSpec::Basis {
                minuend, subtrahend, ..
            } => vec![minuend.as_str(), subtrahend.as_str()],
            IndicatorSpec::Ratio {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_str(), denominator.as_str()],
            IndicatorSpec::Rolling { source, .. } | IndicatorSpec::PctChange { source } => {
                vec![source.as_str()]
            }
            IndicatorSpec::Bands { mean, std, .. } => vec![mean.as_str(), std.as_str()],
        }
    }
}

/// Applies an ordered list of [`IndicatorSpec`]s to panels.
#[derive(Debug, Clone, Default)]
pub struct IndicatorEngine {
    specs: Vec<IndicatorSpec>,
}

impl IndicatorEngine {
    pub fn new(specs: Vec<IndicatorSpec>) -> Self {
        Self { specs }
    }

    pub fn specs(&self) -> &[IndicatorSpec] {
        &self.specs
    }

    pub fn push(&mut self, spec: IndicatorSpec) {
        self.specs.push(spec);
    }

    /// Append every derived column to `panel`, returning the warnings for
    /// specs that were skipped.
    pub fn apply(&self, panel: &mut Panel) -> Result<Vec<PanelWarning>, PanelError> {
        let mut warnings = Vec::new();
        for spec in &self.specs {
            let missing: Vec<String> = spec
                .sources()
                .into_iter()
                .filter(|c| !panel.contains(c))
                .map(String::from)
                .collect();
            if !missing.is_empty() {
                let warning = PanelWarning::MissingColumn {
                    indicator: spec.label(),
                    missing,
                };
                tracing::debug!(%warning, "indicator skipped");
                warnings.push(warning);
                continue;
            }
            apply_spec(spec, panel)?;
        }
        Ok(warnings)
    }
}

fn apply_spec(spec: &IndicatorSpec, panel: &mut Panel) -> Result<(), PanelError> {
    match spec {
        IndicatorSpec::Basis {
            name,
            minuend,
            subtrahend,
        } => {
            let pair = PairIndicator::basis(name.as_str(), minuend.as_str(), subtrahend.as_str());
            insert_pair(panel, &pair)
        }
        IndicatorSpec::Ratio {
            name,
            numerator,
            denominator,
        } => {
            let pair = PairIndicator::ratio(name.as_str(), numerator.as_str(), denominator.as_str());
            insert_pair(panel, &pair)
        }
        IndicatorSpec::Rolling {
            name,
            source,
            window,
            min_periods,
            aggregation,
        } => {
            if *window == 0 || *min_periods == 0 {
                return Err(PanelError::InvalidIndicator {
                    indicator: spec.label(),
                    reason: format!("window ({window}) and min_periods ({min_periods}) must be >= 1"),
                });
            }
            let rolling = Rolling::new(name.as_str(), *window, *min_periods, *aggregation);
            insert_single(panel, &rolling, source)
        }
        IndicatorSpec::Bands {
            mean,
            std,
            multipliers,
        } => {
            if let Some(k) = multipliers.iter().find(|k| !k.is_finite() || **k < 0.0) {
                return Err(PanelError::InvalidIndicator {
                    indicator: spec.label(),
                    reason: format!("sigma multiplier {k} must be finite and >= 0"),
                });
            }
            let (Some(m), Some(s)) = (panel.column(mean), panel.column(std)) else {
                return Ok(());
            };
            let mut computed = Vec::with_capacity(multipliers.len() * 2);
            for &k in multipliers {
                for side in [BandSide::Upper, BandSide::Lower] {
                    let band = SigmaBand::new(k, side);
                    computed.push((band.name().to_string(), band.compute(m, s)));
                }
            }
            for (name, values) in computed {
                panel.insert_column(name, values)?;
            }
            Ok(())
        }
        IndicatorSpec::PctChange { source } => insert_single(panel, &PctChange::for_column(source), source),
    }
}

fn insert_single(panel: &mut Panel, indicator: &dyn Indicator, source: &str) -> Result<(), PanelError> {
    let Some(values) = panel.column(source) else {
        return Ok(());
    };
    let out = indicator.compute(values);
    tracing::debug!(indicator = indicator.name(), source, "computed column");
    panel.insert_column(indicator.name(), out)
}

fn insert_pair(panel: &mut Panel, pair: &PairIndicator) -> Result<(), PanelError> {
    let (Some(left), Some(right)) = (panel.column(&pair.left), panel.column(&pair.right)) else {
        return Ok(());
    };
    let out = pair.compute(left, right);
    tracing::debug!(indicator = %pair.name, "computed column");
    panel.insert_column(pair.name.clone(), out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, defined, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + chrono::Duration::days(i as i64)).collect()
    }

    fn panel(columns: &[(&str, &[f64])]) -> Panel {
        let n = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        Panel::from_columns(
            dates(n),
            columns
                .iter()
                .map(|(name, v)| (name.to_string(), defined(v)))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn basis_appended_after_sources() {
        let mut p = panel(&[("spot", &[10.0, 11.0, 12.0]), ("future", &[9.0, 9.5, 10.0])]);
        let engine = IndicatorEngine::new(vec![IndicatorSpec::basis("basis", "spot", "future")]);
        let warnings = engine.apply(&mut p).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(p.column_names(), vec!["spot", "future", "basis"]);
        assert_eq!(p.column("basis").unwrap(), defined(&[1.0, 1.5, 2.0]).as_slice());
    }

    #[test]
    fn missing_source_is_warning_not_error() {
        let mut p = panel(&[("spot", &[10.0, 11.0])]);
        let engine = IndicatorEngine::new(vec![IndicatorSpec::basis("basis", "spot", "future")]);
        let warnings = engine.apply(&mut p).unwrap();
        assert_eq!(
            warnings,
            vec![PanelWarning::MissingColumn {
                indicator: "basis".into(),
                missing: vec!["future".into()],
            }]
        );
        assert!(!p.contains("basis"));
    }

    #[test]
    fn bands_consume_earlier_rolling_columns() {
        let mut p = panel(&[("x", &[1.0, 2.0, 3.0, 4.0])]);
        let engine = IndicatorEngine::new(vec![
            IndicatorSpec::rolling("ma", "x", 3, 1, Aggregation::Mean),
            IndicatorSpec::rolling("sd", "x", 3, 1, Aggregation::Std),
            IndicatorSpec::bands("ma", "sd", &[1.0, 2.0]),
        ]);
        engine.apply(&mut p).unwrap();
        assert_eq!(
            p.column_names(),
            vec!["x", "ma", "sd", "+1 STD", "-1 STD", "+2 STD", "-2 STD"]
        );
        // First row: std undefined with one sample, so bands are too.
        assert_eq!(p.value_at("+1 STD", 0), None);
        assert_approx(p.value_at("+2 STD", 3).unwrap(), 3.0 + 2.0, DEFAULT_EPSILON);
        assert_approx(p.value_at("-1 STD", 3).unwrap(), 3.0 - 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn bands_missing_std_warns() {
        let mut p = panel(&[("ma", &[1.0])]);
        let engine = IndicatorEngine::new(vec![IndicatorSpec::bands("ma", "sd", &[1.0])]);
        let warnings = engine.apply(&mut p).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(p.column_names(), vec!["ma"]);
    }

    #[test]
    fn pct_change_named_after_source() {
        let mut p = panel(&[("OIL_price", &[50.0, 55.0])]);
        IndicatorEngine::new(vec![IndicatorSpec::pct_change("OIL_price")])
            .apply(&mut p)
            .unwrap();
        assert_approx(p.value_at("OIL_price_pct_change", 1).unwrap(), 0.1, DEFAULT_EPSILON);
    }

    #[test]
    fn reapplying_replaces_in_place() {
        let mut p = panel(&[("a", &[4.0, 6.0]), ("b", &[2.0, 3.0])]);
        let engine = IndicatorEngine::new(vec![IndicatorSpec::ratio("r", "a", "b")]);
        engine.apply(&mut p).unwrap();
        engine.apply(&mut p).unwrap();
        assert_eq!(p.column_names(), vec!["a", "b", "r"]);
        assert_eq!(p.column("r").unwrap(), defined(&[2.0, 2.0]).as_slice());
    }

    #[test]
    fn deserialised_invalid_specs_are_errors() {
        let mut p = panel(&[("a", &[1.0, 2.0]), ("m", &[1.0, 2.0]), ("s", &[0.5, 0.5])]);

        let zero_window: IndicatorSpec = serde_json::from_str(
            r#"{"kind":"rolling","name":"ma","source":"a","window":0,"min_periods":1,"aggregation":"mean"}"#,
        )
        .unwrap();
        let err = IndicatorEngine::new(vec![zero_window]).apply(&mut p).unwrap_err();
        assert!(matches!(err, PanelError::InvalidIndicator { ref indicator, .. } if indicator == "ma"));

        let negative_k: IndicatorSpec =
            serde_json::from_str(r#"{"kind":"bands","mean":"m","std":"s","multipliers":[1.0,-2.0]}"#)
                .unwrap();
        let err = IndicatorEngine::new(vec![negative_k]).apply(&mut p).unwrap_err();
        assert!(matches!(err, PanelError::InvalidIndicator { .. }));
        assert_eq!(p.column_names(), vec!["a", "m", "s"]);
    }

    #[test]
    fn spec_serialises_with_kind_tag() {
        let spec = IndicatorSpec::pct_change("VIX_close");
        let json = serde_json::to_string(&spec).unwrap();
        assert_eq!(json, r#"{"kind":"pct_change","source":"VIX_close"}"#);
    }
}
