//! Text reports for assembled themes.

pub mod format;

pub use format::*;
