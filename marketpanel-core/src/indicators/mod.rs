//! Derived-column indicators over an aligned panel.
//!
//! Every indicator here is causal: the output at row t depends only on rows
//! 0..=t of its inputs. Single-input indicators implement [`Indicator`];
//! two-input ones (basis, ratio, sigma bands) take both columns explicitly.
//! The [`IndicatorEngine`] applies an ordered list of specs to a panel.

pub mod bands;
pub mod engine;
pub mod pair;
pub mod pct_change;
pub mod rolling;
pub mod valuation;

pub use bands::{BandSide, SigmaBand};
pub use engine::{IndicatorEngine, IndicatorSpec};
pub use pair::{PairIndicator, PairOp};
pub use pct_change::PctChange;
pub use rolling::{Aggregation, Rolling};
pub use valuation::{buffett_specs, spread_specs};

/// Trait for single-series indicators.
///
/// Output has the same length as the input. `None` marks rows where the
/// indicator is undefined (warmup, or not enough defined samples).
///
/// # Look-ahead guard
/// No output at row t may depend on input rows after t. Computing over a
/// truncated series must reproduce the prefix of the full computation.
pub trait Indicator: Send + Sync {
    /// Name of the output column.
    fn name(&self) -> &str;

    /// Number of leading rows that may be undefined even for a fully defined input.
    fn lookback(&self) -> usize;

    fn compute(&self, values: &[Option<f64>]) -> Vec<Option<f64>>;
}

/// Assert two values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

/// Wrap plain values as a fully defined column.
#[cfg(test)]
pub fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().map(|v| Some(*v)).collect()
}
