//! One-step percentage change: `v[t] / v[t-1] - 1`.
//!
//! Undefined on the first row, when either observation is undefined, or when
//! the previous value is zero. Output columns are named `<source>_pct_change`
//! and are excluded from snapshot `latest_values`.

use super::Indicator;

pub const PCT_CHANGE_SUFFIX: &str = "_pct_change";

#[derive(Debug, Clone)]
pub struct PctChange {
    name: String,
}

impl PctChange {
    pub fn for_column(source: &str) -> Self {
        Self {
            name: format!("{source}{PCT_CHANGE_SUFFIX}"),
        }
    }
}

impl Indicator for PctChange {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        let mut result = Vec::with_capacity(values.len());
        for i in 0..values.len() {
            let change = if i == 0 {
                None
            } else {
                match (values[i - 1], values[i]) {
                    (Some(prev), Some(cur)) if prev != 0.0 => Some(cur / prev - 1.0),
                    _ => None,
                }
            };
            result.push(change);
        }
        result
    }
}
