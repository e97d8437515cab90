//! CoinGecko REST client
//!
//! Single endpoint: `/coins/markets`, ordered by market cap descending.
//! Unauthenticated; the public API rate-limits aggressively, which is why
//! callers sit behind the market cache.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::config::MarketConfig;
use crate::market::{FetchError, MarketDataSource};
use crate::types::AssetSnapshot;

/// One row of the `/coins/markets` response.
///
/// Change percentages and rank can be null for freshly listed coins, so
/// everything beyond `id`/`symbol`/`name` is optional and validated when
/// the row is normalized.
#[derive(Debug, Deserialize)]
struct MarketRow {
    id: String,
    symbol: String,
    name: String,
    current_price: Option<f64>,
    total_volume: Option<f64>,
    market_cap_rank: Option<u32>,
    #[serde(rename = "price_change_percentage_24h_in_currency")]
    change_24h: Option<f64>,
    #[serde(rename = "price_change_percentage_7d_in_currency")]
    change_7d: Option<f64>,
    open_interest: Option<f64>,
    funding_rate: Option<f64>,
}

/// REST client for the CoinGecko markets endpoint.
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    client: Client,
    url: String,
    vs_currency: String,
    per_page: u32,
}

impl CoinGeckoClient {
    /// Create a new client. The request timeout bounds the refresh cycle.
    pub fn new(config: &MarketConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: config.api_url.trim_end_matches('/').to_string(),
            vs_currency: config.vs_currency.clone(),
            per_page: config.per_page.min(100),
        })
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoClient {
    fn name(&self) -> &'static str {
        "CoinGecko"
    }

    async fn fetch(&self) -> Result<Vec<AssetSnapshot>, FetchError> {
        tracing::debug!(
            source = %"CoinGecko",
            per_page = self.per_page,
            "📥 Fetching market data..."
        );

        let per_page = self.per_page.to_string();
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("vs_currency", self.vs_currency.as_str()),
                ("order", "market_cap_desc"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
                ("sparkline", "false"),
                ("price_change_percentage", "24h,7d"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(FetchError::RateLimit { retry_after_secs });
        }
        if !status.is_success() {
            return Err(FetchError::Transport(format!(
                "CoinGecko returned {}",
                status
            )));
        }

        let rows: Vec<MarketRow> = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        if rows.is_empty() {
            return Err(FetchError::Parse(
                "provider returned an empty market list".to_string(),
            ));
        }

        let assets = rows
            .into_iter()
            .map(normalize_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            source = %"CoinGecko",
            count = assets.len(),
            "✅ Market data fetched"
        );

        Ok(assets)
    }
}

/// Validate a provider row into an immutable snapshot.
///
/// Price, volume, and rank are required; change percentages default to 0
/// like the upstream dashboard did for freshly listed coins.
fn normalize_row(row: MarketRow) -> Result<AssetSnapshot, FetchError> {
    let price = row
        .current_price
        .filter(|p| p.is_finite())
        .ok_or_else(|| FetchError::Parse(format!("asset {} missing price", row.id)))?;
    let volume = row
        .total_volume
        .filter(|v| v.is_finite())
        .ok_or_else(|| FetchError::Parse(format!("asset {} missing volume", row.id)))?;
    let rank = row
        .market_cap_rank
        .ok_or_else(|| FetchError::Parse(format!("asset {} missing rank", row.id)))?;

    Ok(AssetSnapshot {
        ticker: row.symbol.to_uppercase(),
        id: row.id,
        name: row.name,
        price,
        change_24h_pct: row.change_24h.filter(|c| c.is_finite()).unwrap_or(0.0),
        change_7d_pct: row.change_7d.filter(|c| c.is_finite()).unwrap_or(0.0),
        volume,
        open_interest: row.open_interest,
        funding_rate: row.funding_rate,
        rank,
    })
}
