//! N-sigma bands around a rolling mean.
//!
//! Upper: mean + k × std. Lower: mean - k × std. A band is undefined
//! wherever either input is undefined.

use serde::{Deserialize, Serialize};

/// Which side of the mean a band sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandSide {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct SigmaBand {
    k: f64,
    side: BandSide,
    name: String,
}

impl SigmaBand {
    /// Band named by its offset, e.g. `+1 STD` / `-2 STD`.
    pub fn new(k: f64, side: BandSide) -> Self {
        Self::named(band_label(k, side), k, side)
    }

    pub fn named(name: impl Into<String>, k: f64, side: BandSide) -> Self {
        assert!(k.is_finite() && k >= 0.0, "sigma multiplier must be finite and >= 0");
        Self {
            k,
            side,
            name: name.into(),
        }
    }

    pub fn upper(k: f64) -> Self {
        Self::new(k, BandSide::Upper)
    }

    pub fn lower(k: f64) -> Self {
        Self::new(k, BandSide::Lower)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn side(&self) -> BandSide {
        self.side
    }

    pub fn compute(&self, mean: &[Option<f64>], std: &[Option<f64>]) -> Vec<Option<f64>> {
        let sign = match self.side {
            BandSide::Upper => 1.0,
            BandSide::Lower => -1.0,
        };
        mean.iter()
            .zip(std)
            .map(|(m, s)| match (m, s) {
                (Some(m), Some(s)) => Some(m + sign * self.k * s),
                _ => None,
            })
            .collect()
    }
}

/// Column label for a band: `+1 STD`, `-2 STD`, `+1.5 STD`.
pub fn band_label(k: f64, side: BandSide) -> String {
    let sign = match side {
        BandSide::Upper => '+',
        BandSide::Lower => '-',
    };
    if k.fract() == 0.0 {
        format!("{sign}{k:.0} STD")
    } else {
        format!("{sign}{k} STD")
    }
}
