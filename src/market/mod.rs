//! Market data module - top-100 asset universe
//!
//! Fetches ranked market data from CoinGecko and caches it behind a
//! 5-minute freshness window with a stale-is-better-than-nothing policy.

mod cache;
mod coingecko;

pub use cache::{CacheEntry, MarketCache};
pub use coingecko::CoinGeckoClient;

use crate::types::AssetSnapshot;
use async_trait::async_trait;
use thiserror::Error;

/// Failure taxonomy for a market data fetch.
///
/// None of these are fatal: the cache absorbs them by serving stale data,
/// and the mock dataset is the last resort.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure, request timeout, or non-2xx status
    #[error("transport error: {0}")]
    Transport(String),
    /// Provider throttled the request (HTTP 429)
    #[error("rate limited by provider (retry-after: {retry_after_secs:?}s)")]
    RateLimit { retry_after_secs: Option<u64> },
    /// Response body malformed, empty, or missing a required field
    #[error("parse error: {0}")]
    Parse(String),
}

/// Trait for market data providers.
///
/// One outbound call per `fetch`; retry policy lives in the refresh loop
/// (the next tick is the retry).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Fetch the current top-ranked asset set, provider ranking order.
    async fn fetch(&self) -> Result<Vec<AssetSnapshot>, FetchError>;
}
