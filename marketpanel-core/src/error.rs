//! Error and warning taxonomy for the panel engine.
//!
//! Only [`PanelError::NoData`] aborts a pipeline run. Everything else the
//! engine encounters while merging, reconciling or deriving columns degrades
//! gracefully: the offending column is dropped, omitted or defaulted, and a
//! [`PanelWarning`] is recorded so callers can surface it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal or structural errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PanelError {
    #[error("no data: the union of all raw series is empty")]
    NoData,

    #[error("column '{column}' has {actual} values but the index has {expected} dates")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("date index is not strictly increasing at {date}")]
    UnsortedIndex { date: NaiveDate },

    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("invalid indicator '{indicator}': {reason}")]
    InvalidIndicator { indicator: String, reason: String },
}

/// Non-fatal conditions recorded while building a panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelWarning {
    /// A derived indicator could not be computed because a source column is absent.
    MissingColumn {
        indicator: String,
        missing: Vec<String>,
    },
    /// An auxiliary series could not be reconciled and was replaced by a constant.
    AuxiliaryUnavailable { column: String, fallback: f64 },
    /// Columns that were undefined over the entire index and were dropped.
    EmptyColumn { columns: Vec<String> },
}

impl std::fmt::Display for PanelWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PanelWarning::MissingColumn { indicator, missing } => write!(
                f,
                "cannot compute '{indicator}': missing column(s) {}",
                missing.join(", ")
            ),
            PanelWarning::AuxiliaryUnavailable { column, fallback } => write!(
                f,
                "auxiliary series '{column}' has no usable overlap; filled with default {fallback}"
            ),
            PanelWarning::EmptyColumn { columns } => write!(
                f,
                "dropped completely empty column(s): {}",
                columns.join(", ")
            ),
        }
    }
}

/// Ordered collection of warnings accumulated over a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    warnings: Vec<PanelWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and emit it on the `warn` log level.
    pub fn record(&mut self, warning: PanelWarning) {
        tracing::warn!(%warning, "panel warning");
        self.warnings.push(warning);
    }

    pub fn extend(&mut self, warnings: impl IntoIterator<Item = PanelWarning>) {
        for w in warnings {
            self.record(w);
        }
    }

    pub fn warnings(&self) -> &[PanelWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}
