//! Trailing-window mean and standard deviation.
//!
//! The window counts rows, not calendar days: a five-year window on daily
//! trading data is 5 × 252 = 1260 rows. At row t the statistic covers rows
//! `max(0, t - window + 1) ..= t`; undefined cells in that range are skipped,
//! and the output is defined once the window holds at least `min_periods`
//! defined samples.
//!
//! With `min_periods = 1` the first `window - 1` outputs are computed over a
//! growing, shorter-than-window sample. Those early values are noisier than
//! the steady-state ones; this is the intended behaviour and callers that
//! need full windows must raise `min_periods` themselves.
//!
//! Standard deviation is the sample estimator (n - 1 denominator), so it
//! needs two defined samples and is undefined for a single one.

use super::Indicator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Mean,
    Std,
}

#[derive(Debug, Clone)]
pub struct Rolling {
    window: usize,
    min_periods: usize,
    aggregation: Aggregation,
    name: String,
}

impl Rolling {
    pub fn new(
        name: impl Into<String>,
        window: usize,
        min_periods: usize,
        aggregation: Aggregation,
    ) -> Self {
        assert!(window >= 1, "rolling window must be >= 1");
        assert!(min_periods >= 1, "rolling min_periods must be >= 1");
        Self {
            window,
            min_periods,
            aggregation,
            name: name.into(),
        }
    }

    pub fn mean(name: impl Into<String>, window: usize, min_periods: usize) -> Self {
        Self::new(name, window, min_periods, Aggregation::Mean)
    }

    pub fn std(name: impl Into<String>, window: usize, min_periods: usize) -> Self {
        Self::new(name, window, min_periods, Aggregation::Std)
    }

    /// Window length in rows for `years` of `days_per_year` trading days.
    pub fn trading_years(years: usize, days_per_year: usize) -> usize {
        years * days_per_year
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn min_periods(&self) -> usize {
        self.min_periods
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }
}

impl Indicator for Rolling {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.aggregation {
            Aggregation::Mean => self.min_periods - 1,
            Aggregation::Std => self.min_periods.max(2) - 1,
        }
    }

    fn compute(&self, values: &[Option<f64>]) -> Vec<Option<f64>> {
        let mut result = Vec::with_capacity(values.len());
        let mut sample: Vec<f64> = Vec::with_capacity(self.window);

        for i in 0..values.len() {
            let start = (i + 1).saturating_sub(self.window);
            sample.clear();
            sample.extend(values[start..=i].iter().flatten().copied());

            if sample.len() < self.min_periods {
                result.push(None);
                continue;
            }

            let n = sample.len() as f64;
            let mean = sample.iter().sum::<f64>() / n;
            result.push(match self.aggregation {
                Aggregation::Mean => Some(mean),
                Aggregation::Std if sample.len() < 2 => None,
                Aggregation::Std => {
                    let ss: f64 = sample.iter().map(|x| (x - mean) * (x - mean)).sum();
                    Some((ss / (n - 1.0)).sqrt())
                }
            });
        }

        result
    }
}
