//! KPI derivation.
//!
//! - `calculator`: per-theme summary metrics over raw or aligned series
//! - `targets`: the static reference values each KPI is compared against

pub mod calculator;
pub mod targets;

pub use calculator::*;
pub use targets::*;
