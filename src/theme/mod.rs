//! Theme assembly.
//!
//! Responsibilities:
//!
//! - declare which themes exist and which series each one needs (`registry`)
//! - turn fetched series into tabs + KPIs (`builders`)
//! - coordinate fetching, caching and cancellation per dashboard view (`orchestrator`)

pub mod builders;
pub mod cache;
pub mod orchestrator;
pub mod registry;
pub mod selection;

pub use builders::{ThemeContext, ThemeSettings, build_theme};
pub use cache::{CacheKey, ThemeCache};
pub use orchestrator::{OrchestratorConfig, ThemeOrchestrator};
pub use registry::{ThemeInputs, ThemeSpec, lookup, themes_for};
pub use selection::{Selection, SelectionState};
