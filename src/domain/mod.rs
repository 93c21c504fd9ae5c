//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw inputs (`DatedRecord`, `FieldValue`, `Group`, `DateRange`, `EntityRef`)
//! - display outputs (`ChartSeries`, `Dataset`, `Tab`, `LastRecord`, `Kpi`)
//! - the cached unit of work (`ThemeResult`, keyed by `ThemeKind`)

pub mod types;

pub use types::*;
