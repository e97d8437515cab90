//! Dashboard API Types
//!
//! DTOs for HTTP/WebSocket communication with the chart frontend.

use serde::{Deserialize, Serialize};

use crate::types::{AssetSnapshot, DerivedMetrics, MarketSnapshot};

/// The published dataset as consumers see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotResponse {
    pub assets: Vec<AssetSnapshot>,
    pub metrics: DerivedMetrics,
    /// Milliseconds since epoch
    pub as_of: i64,
    pub origin: String,
    pub is_mock: bool,
    pub cycle: u64,
}

impl From<MarketSnapshot> for SnapshotResponse {
    fn from(snapshot: MarketSnapshot) -> Self {
        Self {
            as_of: snapshot.as_of.timestamp_millis(),
            origin: snapshot.origin.to_string(),
            is_mock: snapshot.is_mock(),
            cycle: snapshot.cycle,
            assets: snapshot.assets,
            metrics: snapshot.metrics,
        }
    }
}

/// One bar of a ranked score chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingEntryResponse {
    pub id: String,
    pub ticker: String,
    pub score: f64,
}

/// Pipeline liveness as exposed on /api/health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub origin: String,
    pub is_mock: bool,
    pub cycle: u64,
    pub asset_count: usize,
    /// When the served snapshot was assembled (ms since epoch)
    pub as_of: i64,
    /// Age of the served snapshot in milliseconds
    pub age_ms: i64,
}

// ─────────────────────────────────────────────────────────────────
// WebSocket Message Types
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// Latest snapshot (sent on connect and on every publish)
    Snapshot(SnapshotResponse),
    /// Heartbeat
    Heartbeat(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
