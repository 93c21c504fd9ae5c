//! Request coordination for dashboard themes.
//!
//! One request = one (entity, date range) pair. A new request cancels the one
//! in flight; a cancelled request returns nothing and never reaches the cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::data::{MockGenerator, SeriesFetcher};
use crate::domain::{DateRange, EntityKind, EntityRef, ThemeKind, ThemeResult};
use crate::error::ThemeError;
use crate::kpi::KpiTargets;
use crate::theme::builders::{ThemeContext, ThemeSettings, build_theme};
use crate::theme::cache::{CacheKey, DEFAULT_TTL, ThemeCache};
use crate::theme::registry::{lookup, themes_for};
use crate::theme::selection::SelectionState;

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    pub cache_ttl: Duration,
    /// Pause before the first fetch, letting rapid selection changes settle.
    pub startup_delay: Duration,
    /// Makes generated data reproducible per request when set.
    pub seed: Option<u64>,
    pub settings: ThemeSettings,
    pub targets: KpiTargets,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            startup_delay: Duration::ZERO,
            seed: None,
            settings: ThemeSettings::default(),
            targets: KpiTargets::default(),
        }
    }
}

struct InFlight {
    id: u64,
    token: CancellationToken,
}

pub struct ThemeOrchestrator {
    fetcher: Arc<dyn SeriesFetcher>,
    selection: SelectionState,
    config: OrchestratorConfig,
    cache: Mutex<ThemeCache>,
    in_flight: Mutex<Option<InFlight>>,
    next_request: AtomicU64,
}

impl ThemeOrchestrator {
    pub fn new(fetcher: Arc<dyn SeriesFetcher>, selection: SelectionState, config: OrchestratorConfig) -> Self {
        let cache = ThemeCache::new(config.cache_ttl);
        Self {
            fetcher,
            selection,
            config,
            cache: Mutex::new(cache),
            in_flight: Mutex::new(None),
            next_request: AtomicU64::new(0),
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    fn cache(&self) -> MutexGuard<'_, ThemeCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn in_flight(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Themes for an entity over the currently selected date range.
    ///
    /// Never fails: per-theme errors become `error`-flagged results and a
    /// superseded request yields an empty list.
    pub async fn get_themes_data(&self, entity_id: u64, kind: EntityKind) -> Vec<ThemeResult> {
        let range = self.selection.date_range();
        let key = CacheKey::new(kind, entity_id, &range);

        let cached = self.cache().get(&key, Instant::now()).map(<[ThemeResult]>::to_vec);
        if let Some(hit) = cached {
            tracing::debug!(%kind, entity_id, %range, "theme cache hit");
            return hit;
        }

        let (request_id, token) = self.begin_request();
        let entity = EntityRef { kind, id: entity_id };

        if !self.config.startup_delay.is_zero() {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Vec::new(),
                _ = tokio::time::sleep(self.config.startup_delay) => {}
            }
        }

        let themes = themes_for(kind);
        let mut results = Vec::with_capacity(themes.len());
        for &theme in themes {
            let started = Instant::now();
            match self.run_theme(theme, entity, range, &token).await {
                Ok(result) => {
                    tracing::debug!(%theme, %entity, elapsed = ?started.elapsed(), "theme ready");
                    results.push(result);
                }
                Err(ThemeError::Cancelled) => {
                    tracing::debug!(%entity, %range, "request superseded");
                    return Vec::new();
                }
                Err(ThemeError::Processing(msg)) => {
                    tracing::warn!(%theme, %entity, error = %msg, "theme failed");
                    results.push(ThemeResult::failed(theme));
                }
            }
        }

        if token.is_cancelled() {
            return Vec::new();
        }
        self.cache().insert(key, results.clone(), Instant::now());
        self.finish_request(request_id);
        results
    }

    async fn run_theme(
        &self,
        theme: ThemeKind,
        entity: EntityRef,
        range: DateRange,
        token: &CancellationToken,
    ) -> Result<ThemeResult, ThemeError> {
        let generator = match self.config.seed {
            Some(seed) => MockGenerator::for_request(seed, (entity, theme, range)),
            None => MockGenerator::from_entropy(),
        };
        let mut ctx = ThemeContext {
            fetcher: self.fetcher.as_ref(),
            entity,
            range,
            cancel: token,
            targets: &self.config.targets,
            settings: &self.config.settings,
            generator,
            now: Utc::now(),
        };
        build_theme(lookup(theme), &mut ctx).await
    }

    /// Register a new request, cancelling whichever one was running.
    fn begin_request(&self) -> (u64, CancellationToken) {
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        let previous = self.in_flight().replace(InFlight {
            id,
            token: token.clone(),
        });
        if let Some(previous) = previous {
            previous.token.cancel();
        }
        (id, token)
    }

    fn finish_request(&self, id: u64) {
        let mut in_flight = self.in_flight();
        if in_flight.as_ref().is_some_and(|f| f.id == id) {
            *in_flight = None;
        }
    }

    /// Cancel the running request, if any, without starting a new one.
    pub fn cancel_in_flight(&self) {
        if let Some(current) = self.in_flight().take() {
            current.token.cancel();
        }
    }

    pub fn invalidate(&self) {
        self.cache().clear();
    }

    pub fn invalidate_entity(&self, kind: EntityKind, entity_id: u64) {
        self.cache().invalidate_entity(kind, entity_id);
    }
}
