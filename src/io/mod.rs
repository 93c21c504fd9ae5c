//! Input/output helpers.
//!
//! - theme JSON export (`export`)

pub mod export;

pub use export::*;
