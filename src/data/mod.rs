//! Data acquisition: the fetch capability, its HTTP and offline
//! implementations, and the synthetic-series generator used to fill gaps.

pub mod client;
pub mod envelope;
pub mod fetcher;
pub mod mock;
pub mod offline;

pub use client::{ApiClient, ClientConfig, RetryPolicy};
pub use fetcher::{FetchError, Metric, SeriesFetcher};
pub use mock::{MOCK_SUFFIX, MockGenerator, ValueRanges, is_degenerate, mock_label};
pub use offline::OfflineSource;
