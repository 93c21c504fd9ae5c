//! `herd-themes` library crate.
//!
//! The binary (`herd`) is a thin wrapper around this library so that:
//!
//! - the theme pipeline is testable without spawning processes
//! - a dashboard backend can reuse the orchestrator directly

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod kpi;
pub mod plot;
pub mod report;
pub mod series;
pub mod theme;
