//! Panel construction: raw series, calendar alignment, auxiliary reconciliation.

pub mod align;
pub mod panel;
pub mod reconcile;
pub mod series;

pub use align::{align, Alignment};
pub use panel::{back_fill, forward_fill, Column, Panel};
pub use reconcile::{
    reconcile, reconcile_into, ReconcileAttempt, ReconcileConfig, Reconciliation,
    DEFAULT_BOND_YIELD_FALLBACK,
};
pub use series::{Observation, RawSeries};
