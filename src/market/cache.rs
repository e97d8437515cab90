//! Market cache - 5-minute freshness window
//!
//! Hard TTL, not sliding: a fetch failure never evicts a still-present
//! entry, it only fails to refresh it. The embedded mock dataset is the
//! final arm, so `get` always produces a well-formed asset set.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::market::MarketDataSource;
use crate::mock;
use crate::types::{AssetSnapshot, DataOrigin};

/// The last successful fetch, replaced wholesale on refresh.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub assets: Vec<AssetSnapshot>,
    pub fetched_at: DateTime<Utc>,
}

/// Single-writer cache in front of a [`MarketDataSource`].
///
/// Owned by the refresh loop; readers only ever see snapshots published
/// after a cycle completes, so no locking is needed here.
pub struct MarketCache {
    source: Arc<dyn MarketDataSource>,
    ttl: ChronoDuration,
    clock: Arc<dyn Clock>,
    entry: Option<CacheEntry>,
}

impl MarketCache {
    pub fn new(source: Arc<dyn MarketDataSource>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            ttl: ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::seconds(300)),
            clock,
            entry: None,
        }
    }

    /// Current asset set plus where it came from.
    ///
    /// Fresh entry → served without a network call. Expired or absent →
    /// one fetch; on failure the previous entry is served unchanged
    /// (stale), or the mock dataset if no fetch ever succeeded.
    pub async fn get(&mut self) -> (Vec<AssetSnapshot>, DataOrigin) {
        if let Some(entry) = &self.entry {
            if self.clock.now() - entry.fetched_at < self.ttl {
                return (entry.assets.clone(), DataOrigin::Live);
            }
        }

        match self.source.fetch().await {
            Ok(assets) => {
                let fetched_at = self.clock.now();
                self.entry = Some(CacheEntry {
                    assets: assets.clone(),
                    fetched_at,
                });
                (assets, DataOrigin::Live)
            }
            Err(err) => match &self.entry {
                Some(entry) => {
                    tracing::warn!(
                        source = %self.source.name(),
                        error = %err,
                        age_secs = (self.clock.now() - entry.fetched_at).num_seconds(),
                        "Fetch failed, serving stale cache entry"
                    );
                    (entry.assets.clone(), DataOrigin::Stale)
                }
                None => {
                    tracing::warn!(
                        source = %self.source.name(),
                        error = %err,
                        "Fetch failed with no cached data, serving mock dataset"
                    );
                    (mock::mock_assets(), DataOrigin::Mock)
                }
            },
        }
    }

    /// Drop the entry so the next `get` refetches immediately.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// When the current entry was fetched, if one exists.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.entry.as_ref().map(|e| e.fetched_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::market::{FetchError, MockMarketDataSource};
    use crate::types::AssetSnapshot;

    const TTL: Duration = Duration::from_secs(300);

    fn asset(id: &str, price: f64) -> AssetSnapshot {
        AssetSnapshot {
            id: id.to_string(),
            ticker: id.to_uppercase(),
            name: id.to_string(),
            price,
            change_24h_pct: 1.0,
            change_7d_pct: 2.0,
            volume: 1000.0,
            open_interest: None,
            funding_rate: None,
            rank: 1,
        }
    }

    fn manual_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc::now()))
    }

    #[tokio::test]
    async fn test_fresh_entry_served_without_second_fetch() {
        let mut source = MockMarketDataSource::new();
        source
            .expect_fetch()
            .times(1)
            .returning(|| Ok(vec![asset("bitcoin", 67000.0)]));

        let clock = manual_clock();
        let mut cache = MarketCache::new(Arc::new(source), TTL, clock.clone());

        let (first, origin) = cache.get().await;
        assert_eq!(origin, DataOrigin::Live);

        clock.advance_secs(60);
        let (second, origin) = cache.get().await;
        assert_eq!(origin, DataOrigin::Live);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_expired_entry_refetched_and_replaced() {
        let mut source = MockMarketDataSource::new();
        let mut prices = vec![68000.0, 67000.0];
        source
            .expect_fetch()
            .times(2)
            .returning(move || Ok(vec![asset("bitcoin", prices.pop().unwrap())]));

        let clock = manual_clock();
        let mut cache = MarketCache::new(Arc::new(source), TTL, clock.clone());

        let (first, _) = cache.get().await;
        assert_eq!(first[0].price, 67000.0);
        let first_fetched_at = cache.fetched_at().unwrap();

        clock.advance_secs(301);
        let (second, origin) = cache.get().await;
        assert_eq!(origin, DataOrigin::Live);
        assert_eq!(second[0].price, 68000.0);
        assert!(cache.fetched_at().unwrap() > first_fetched_at);
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_without_eviction() {
        let mut source = MockMarketDataSource::new();
        source.expect_name().return_const("CoinGecko");
        let mut fetches = 0;
        source.expect_fetch().times(2).returning(move || {
            fetches += 1;
            if fetches == 1 {
                Ok(vec![asset("bitcoin", 67000.0)])
            } else {
                Err(FetchError::Transport("connection refused".to_string()))
            }
        });

        let clock = manual_clock();
        let mut cache = MarketCache::new(Arc::new(source), TTL, clock.clone());

        let (first, _) = cache.get().await;
        let fetched_at = cache.fetched_at().unwrap();

        clock.advance_secs(301);
        let (second, origin) = cache.get().await;
        assert_eq!(origin, DataOrigin::Stale);
        assert_eq!(first, second);
        // the entry survives the failure untouched
        assert_eq!(cache.fetched_at().unwrap(), fetched_at);
    }

    #[tokio::test]
    async fn test_no_data_ever_falls_back_to_mock() {
        let mut source = MockMarketDataSource::new();
        source.expect_name().return_const("CoinGecko");
        source.expect_fetch().returning(|| {
            Err(FetchError::RateLimit {
                retry_after_secs: Some(60),
            })
        });

        let mut cache = MarketCache::new(Arc::new(source), TTL, manual_clock());

        let (assets, origin) = cache.get().await;
        assert_eq!(origin, DataOrigin::Mock);
        assert_eq!(assets, mock::mock_assets());
        assert!(cache.fetched_at().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let mut source = MockMarketDataSource::new();
        source
            .expect_fetch()
            .times(2)
            .returning(|| Ok(vec![asset("bitcoin", 67000.0)]));

        let mut cache = MarketCache::new(Arc::new(source), TTL, manual_clock());

        cache.get().await;
        cache.invalidate();
        assert!(cache.fetched_at().is_none());

        let (_, origin) = cache.get().await;
        assert_eq!(origin, DataOrigin::Live);
    }
}
