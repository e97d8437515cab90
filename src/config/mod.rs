//! Configuration management for Pulseboard
//!
//! Defaults cover everything; optional config files and environment
//! variables (PULSEBOARD_*) override them.

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::metrics::ScoreWeights;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub market: MarketConfig,
    pub cache: CacheConfig,
    pub refresh: RefreshConfig,
    pub scores: ScoreWeights,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// Markets endpoint URL
    pub api_url: String,
    /// Quote currency for prices and volumes
    pub vs_currency: String,
    /// How many top-ranked assets to request (provider caps pages at 100)
    pub per_page: u32,
    /// Outbound request timeout; bounds the refresh cycle
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Freshness window for a fetched asset set
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between refresh cycles
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Serve the HTTP/WebSocket API (requires the `dashboard` feature)
    pub enabled: bool,
    /// Listen address for the API server
    pub bind_addr: String,
}

impl AppConfig {
    /// Load configuration from defaults, optional files, and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Market defaults
            .set_default(
                "market.api_url",
                "https://api.coingecko.com/api/v3/coins/markets",
            )?
            .set_default("market.vs_currency", "usd")?
            .set_default("market.per_page", 100)?
            .set_default("market.request_timeout_secs", 15)?
            // Cache defaults
            .set_default("cache.ttl_secs", 300)?
            // Refresh defaults
            .set_default("refresh.interval_secs", 30)?
            // Score weight defaults
            .set_default("scores.rs_weight_24h", 0.4)?
            .set_default("scores.rs_weight_7d", 0.6)?
            .set_default("scores.composite_oi_weight", 0.5)?
            .set_default("scores.composite_price_weight", 0.5)?
            .set_default("scores.signal_threshold", 1.0)?
            // Dashboard defaults
            .set_default("dashboard.enabled", true)?
            .set_default("dashboard.bind_addr", "127.0.0.1:8080")?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PULSEBOARD_*)
            .add_source(Environment::with_prefix("PULSEBOARD").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<()> {
        if self.market.per_page == 0 || self.market.per_page > 100 {
            bail!("market.per_page must be between 1 and 100");
        }
        if self.refresh.interval_secs == 0 {
            bail!("refresh.interval_secs must be at least 1");
        }
        if self.cache.ttl_secs == 0 {
            bail!("cache.ttl_secs must be at least 1");
        }
        Ok(())
    }

    /// Generate a digest of the config for startup logging
    pub fn digest(&self) -> String {
        format!(
            "per_page={} vs={} refresh={}s ttl={}s dashboard={}",
            self.market.per_page,
            self.market.vs_currency,
            self.refresh.interval_secs,
            self.cache.ttl_secs,
            self.dashboard.enabled
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
