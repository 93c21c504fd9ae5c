//! A data source with no backend.
//!
//! Every series comes back empty, so the whole pipeline runs on synthetic
//! (clearly labelled) data. Useful for demos and for exercising the gap-fill
//! path without an API.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::data::fetcher::{FetchError, Metric, SeriesFetcher};
use crate::domain::{DateRange, DatedRecord, EntityRef, Group};

#[derive(Debug, Clone, Default)]
pub struct OfflineSource {
    groups: Vec<Group>,
}

impl OfflineSource {
    pub fn new(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// A small herd split across the two tracked production types.
    pub fn demo() -> Self {
        let group = |id: u64, name: &str, kind: &str| Group {
            id,
            name: name.to_string(),
            production_type: kind.to_string(),
        };
        Self::new(vec![
            group(1, "Lote 1", "estanque"),
            group(2, "Lote 2", "estanque"),
            group(3, "Lote 3", "descarte"),
        ])
    }
}

#[async_trait]
impl SeriesFetcher for OfflineSource {
    async fn fetch_series(
        &self,
        _entity: EntityRef,
        _metric: Metric,
        _range: &DateRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<DatedRecord>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        Ok(Vec::new())
    }

    async fn list_groups(&self, _farm_id: u64, cancel: &CancellationToken) -> Result<Vec<Group>, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        Ok(self.groups.clone())
    }
}
