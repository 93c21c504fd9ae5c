//! The data-source capability the theme pipeline consumes.
//!
//! Implementations return records already unwrapped into the canonical
//! `Vec<DatedRecord>` shape; the pipeline never sees transport envelopes.

use std::fmt;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{DateRange, DatedRecord, EntityKind, EntityRef, Group, VALUE_FIELD};
use crate::error::ThemeError;

/// Time-series metrics exposed by the statistics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    MilkLiters,
    Births,
    Deaths,
    /// Animals moved into the herd.
    Entries,
    /// Animals leaving the herd (sales).
    Exits,
    TotalAnimals,
}

impl Metric {
    /// Field carrying the metric in records returned for `kind`.
    ///
    /// Group production still comes from the older endpoint, which reports
    /// `milkLiters` instead of `value`.
    pub fn value_field(self, kind: EntityKind) -> &'static str {
        match (self, kind) {
            (Metric::MilkLiters, EntityKind::Group) => "milkLiters",
            _ => VALUE_FIELD,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::MilkLiters => "milkLiters",
            Metric::Births => "births",
            Metric::Deaths => "deaths",
            Metric::Entries => "entries",
            Metric::Exits => "exits",
            Metric::TotalAnimals => "totalAnimals",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The caller's cancellation token fired.
    Cancelled,
    /// Non-success HTTP status.
    Status(u16),
    Transport(String),
    Decode(String),
    /// The entity/metric combination has no endpoint.
    Unsupported(String),
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status(code) => *code == 429 || (500..=599).contains(code),
            _ => false,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Cancelled => write!(f, "FetchError::Cancelled"),
            FetchError::Status(code) => write!(f, "FetchError::Status: HTTP {code}"),
            FetchError::Transport(e) => write!(f, "FetchError::Transport: {e}"),
            FetchError::Decode(e) => write!(f, "FetchError::Decode: {e}"),
            FetchError::Unsupported(e) => write!(f, "FetchError::Unsupported: {e}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::Decode(e.to_string())
    }
}

impl From<FetchError> for ThemeError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Cancelled => ThemeError::Cancelled,
            other => ThemeError::Processing(other.to_string()),
        }
    }
}

/// Series fetch + group listing, keyed by entity and date range.
///
/// Every call observes `cancel` and returns `FetchError::Cancelled` once it fires.
#[async_trait]
pub trait SeriesFetcher: Send + Sync {
    async fn fetch_series(
        &self,
        entity: EntityRef,
        metric: Metric,
        range: &DateRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<DatedRecord>, FetchError>;

    async fn list_groups(&self, farm_id: u64, cancel: &CancellationToken) -> Result<Vec<Group>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_classification() {
        assert!(FetchError::Status(503).is_retryable());
        assert!(FetchError::Status(429).is_retryable());
        assert!(FetchError::Transport("reset".into()).is_retryable());
        assert!(!FetchError::Status(404).is_retryable());
        assert!(!FetchError::Cancelled.is_retryable());
        assert!(!FetchError::Decode("eof".into()).is_retryable());
    }

    #[test]
    fn cancellation_maps_to_theme_cancel() {
        assert_eq!(ThemeError::from(FetchError::Cancelled), ThemeError::Cancelled);
        assert!(matches!(
            ThemeError::from(FetchError::Status(500)),
            ThemeError::Processing(_)
        ));
    }

    #[test]
    fn group_milk_uses_legacy_field() {
        assert_eq!(Metric::MilkLiters.value_field(EntityKind::Group), "milkLiters");
        assert_eq!(Metric::MilkLiters.value_field(EntityKind::Farm), "value");
        assert_eq!(Metric::Births.value_field(EntityKind::Group), "value");
    }
}
