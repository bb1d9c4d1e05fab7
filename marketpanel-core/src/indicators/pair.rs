//! Two-column indicators: basis (difference) and ratio.
//!
//! Both are elementwise and defined only where both inputs are defined.
//! A ratio with a zero denominator is undefined.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairOp {
    /// `left - right`, e.g. spot minus near-month future.
    Difference,
    /// `left / right`, e.g. total market value over GDP.
    Ratio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairIndicator {
    pub name: String,
    pub left: String,
    pub right: String,
    pub op: PairOp,
}

impl PairIndicator {
    pub fn basis(name: impl Into<String>, minuend: impl Into<String>, subtrahend: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            left: minuend.into(),
            right: subtrahend.into(),
            op: PairOp::Difference,
        }
    }

    pub fn ratio(name: impl Into<String>, numerator: impl Into<String>, denominator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            left: numerator.into(),
            right: denominator.into(),
            op: PairOp::Ratio,
        }
    }

    pub fn compute(&self, left: &[Option<f64>], right: &[Option<f64>]) -> Vec<Option<f64>> {
        left.iter()
            .zip(right)
            .map(|(a, b)| match (a, b, self.op) {
                (Some(a), Some(b), PairOp::Difference) => Some(a - b),
                (Some(_), Some(b), PairOp::Ratio) if *b == 0.0 => None,
                (Some(a), Some(b), PairOp::Ratio) => Some(a / b),
                _ => None,
            })
            .collect()
    }
}
