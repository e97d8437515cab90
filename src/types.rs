//! Core types used throughout Pulseboard
//!
//! Defines the raw market observations, the derived per-asset scores,
//! and the snapshot shape published to dashboard consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One cryptocurrency's raw observed attributes at a point in time.
///
/// Immutable once fetched; a refresh replaces the whole set rather than
/// mutating individual entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    /// Provider asset id (e.g. "bitcoin")
    pub id: String,
    /// Ticker symbol, uppercased (e.g. "BTC")
    pub ticker: String,
    /// Display name
    pub name: String,
    /// Spot price in the quote currency
    pub price: f64,
    /// 24h price change in percent
    pub change_24h_pct: f64,
    /// 7d price change in percent
    pub change_7d_pct: f64,
    /// 24h trading volume in the quote currency
    pub volume: f64,
    /// Open interest, when the provider reports it
    pub open_interest: Option<f64>,
    /// Funding rate, when the provider reports it
    pub funding_rate: Option<f64>,
    /// Market-cap rank (1 = largest)
    pub rank: u32,
}

/// Where a published dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    /// Fresh fetch, or a cache hit inside the freshness window
    Live,
    /// Cached data past its TTL that a failed refresh could not replace
    Stale,
    /// The embedded fallback dataset; no real fetch has ever succeeded
    Mock,
}

impl DataOrigin {
    pub fn is_mock(&self) -> bool {
        matches!(self, DataOrigin::Mock)
    }
}

impl fmt::Display for DataOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataOrigin::Live => write!(f, "live"),
            DataOrigin::Stale => write!(f, "stale"),
            DataOrigin::Mock => write!(f, "mock"),
        }
    }
}

/// Scatter-coloring flag: composite score above threshold or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakoutSignal {
    High,
    Normal,
}

impl fmt::Display for BreakoutSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreakoutSignal::High => write!(f, "HIGH"),
            BreakoutSignal::Normal => write!(f, "NORMAL"),
        }
    }
}

/// Derived scores for one asset, recomputed from scratch every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetScores {
    /// Z-score of 24h price change across the population
    pub price_z: f64,
    /// Z-score of 24h volume across the population
    pub volume_z: f64,
    /// Z-score of open interest (volume proxy when OI is unreported)
    pub oi_z: f64,
    /// Momentum blend of 24h and 7d change
    pub relative_strength: f64,
    /// Z-score of the relative-strength blend
    pub relative_strength_z: f64,
    /// Weighted combination of oi-z and price-z
    pub composite: f64,
    /// Absolute 24h change
    pub volatility: f64,
    /// Longer-horizon momentum proxy (7d change)
    pub htf_breakout: f64,
    /// Funding-rate z-score; 0 when no asset reports funding
    pub carry: f64,
    /// High when composite exceeds the signal threshold
    pub signal: BreakoutSignal,
}

/// Per-asset derived scores, keyed by provider asset id.
pub type DerivedMetrics = HashMap<String, AssetScores>;

/// The one value published to consumers per refresh cycle.
///
/// `metrics` covers exactly the assets in `assets`; consumers never see a
/// half-updated pairing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Raw observations, in provider ranking order
    pub assets: Vec<AssetSnapshot>,
    /// Derived scores, keyed by asset id
    pub metrics: DerivedMetrics,
    /// When this snapshot was assembled
    pub as_of: DateTime<Utc>,
    /// Real, stale, or mock data
    pub origin: DataOrigin,
    /// Refresh cycle counter, starting at 0 for the seed snapshot
    pub cycle: u64,
}

impl MarketSnapshot {
    pub fn is_mock(&self) -> bool {
        self.origin.is_mock()
    }
}
