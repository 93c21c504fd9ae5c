//! HTTP implementation of `SeriesFetcher` for the farm statistics API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::data::envelope::{unwrap_groups, unwrap_series};
use crate::data::fetcher::{FetchError, Metric, SeriesFetcher};
use crate::domain::{DateRange, DatedRecord, EntityKind, EntityRef, Group};
use crate::error::AppError;

const ENV_BASE_URL_V1: &str = "HERD_API_BASE_URL_V1";
const ENV_BASE_URL_V2: &str = "HERD_API_BASE_URL_V2";
const ENV_TOKEN: &str = "HERD_API_TOKEN";
const ENV_TIMEOUT: &str = "HERD_API_TIMEOUT_SECS";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Exponential backoff for transient failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt + 1` (attempts are 1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1) as i32;
        let secs = self.base_delay.as_secs_f64() * self.factor.max(1.0).powi(exp);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            factor: 2.0,
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Explicit client configuration; nothing is read from globals after construction.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url_v1: String,
    pub base_url_v2: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(base_url_v1: impl Into<String>, base_url_v2: impl Into<String>) -> Self {
        Self {
            base_url_v1: base_url_v1.into(),
            base_url_v2: base_url_v2.into(),
            auth_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }

    /// Load from the environment (after reading `.env` if present).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url_v1 = std::env::var(ENV_BASE_URL_V1)
            .map_err(|_| AppError::new(2, format!("Missing {ENV_BASE_URL_V1} in environment (.env).")))?;
        let base_url_v2 = std::env::var(ENV_BASE_URL_V2).unwrap_or_else(|_| base_url_v1.clone());
        let auth_token = std::env::var(ENV_TOKEN).ok().filter(|t| !t.trim().is_empty());
        let timeout_secs = match std::env::var(ENV_TIMEOUT) {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| AppError::new(2, format!("Invalid {ENV_TIMEOUT} '{raw}': {e}")))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            auth_token,
            timeout: Duration::from_secs(timeout_secs),
            ..Self::new(base_url_v1, base_url_v2)
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiVersion {
    V1,
    V2,
}

pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, version: ApiVersion, path: &str) -> String {
        let base = match version {
            ApiVersion::V1 => &self.config.base_url_v1,
            ApiVersion::V2 => &self.config.base_url_v2,
        };
        format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, FetchError> {
        let policy = &self.config.retry;
        let mut attempt = 1;
        loop {
            match self.get_once(url, query, cancel).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(%url, attempt, ?delay, error = %e, "request failed, retrying");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(
        &self,
        url: &str,
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, FetchError> {
        let mut req = self.client.get(url).query(query);
        if let Some(token) = &self.config.auth_token {
            req = req.bearer_auth(token);
        }

        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            resp = req.send() => resp?,
        };

        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            body = resp.bytes() => body?,
        };
        Ok(body.to_vec())
    }
}

fn endpoint(entity: EntityRef, metric: Metric) -> Result<(ApiVersion, String), FetchError> {
    let id = entity.id;
    match (entity.kind, metric) {
        (EntityKind::Company, _) => Err(FetchError::Unsupported(format!(
            "no {metric} series for {entity}"
        ))),
        (EntityKind::Farm, Metric::MilkLiters) => Ok((
            ApiVersion::V2,
            format!("statistics/farm/{id}/production/milkLiters"),
        )),
        (EntityKind::Group, Metric::MilkLiters) => {
            Ok((ApiVersion::V1, format!("statistics/group/{id}/production")))
        }
        (kind, metric) => {
            let leaf = inventory_leaf(metric)
                .ok_or_else(|| FetchError::Unsupported(format!("no inventory endpoint for {metric}")))?;
            Ok((ApiVersion::V2, format!("statistics/{kind}/{id}/inventory/{leaf}")))
        }
    }
}

fn inventory_leaf(metric: Metric) -> Option<&'static str> {
    match metric {
        Metric::Births => Some("births"),
        Metric::Deaths => Some("deaths"),
        Metric::Entries => Some("entries"),
        Metric::Exits => Some("sales"),
        Metric::TotalAnimals => Some("totalAnimals"),
        Metric::MilkLiters => None,
    }
}

#[async_trait]
impl SeriesFetcher for ApiClient {
    async fn fetch_series(
        &self,
        entity: EntityRef,
        metric: Metric,
        range: &DateRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<DatedRecord>, FetchError> {
        let (version, path) = endpoint(entity, metric)?;
        let url = self.url(version, &path);
        let query = [("from", range.from_param()), ("to", range.to_param())];

        tracing::debug!(%url, %range, "fetching series");
        let body = self.get(&url, &query, cancel).await?;
        unwrap_series(&body)
    }

    async fn list_groups(&self, farm_id: u64, cancel: &CancellationToken) -> Result<Vec<Group>, FetchError> {
        let url = self.url(ApiVersion::V1, "groups");
        let query = [("farmId", farm_id.to_string())];
        let body = self.get(&url, &query, cancel).await?;
        unwrap_groups(&body)
    }
}
