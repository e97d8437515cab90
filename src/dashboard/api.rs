//! Dashboard HTTP API
//!
//! REST endpoints plus the WebSocket upgrade for the chart frontend.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use super::types::*;
use super::DashboardContext;
use crate::types::{AssetScores, MarketSnapshot};

const DEFAULT_RANKING_LIMIT: usize = 30;
const MAX_RANKING_LIMIT: usize = 100;

/// Create the API router with all endpoints
pub fn create_router(ctx: DashboardContext) -> Router {
    Router::new()
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/rankings", get(get_rankings))
        .route("/api/health", get(get_health))
        .route("/api/refresh", post(post_refresh))
        // WebSocket
        .route("/ws", get(websocket_handler))
        // State
        .with_state(ctx)
        // CORS for frontend
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

// ─────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────

/// GET /api/snapshot - Latest published dataset
async fn get_snapshot(State(ctx): State<DashboardContext>) -> impl IntoResponse {
    let snapshot = ctx.snapshot_rx.borrow().clone();
    Json(ApiResponse::success(SnapshotResponse::from(snapshot)))
}

#[derive(Debug, Deserialize)]
struct RankingQuery {
    by: Option<String>,
    limit: Option<usize>,
}

/// GET /api/rankings?by=composite&limit=30 - Ranked score slice
async fn get_rankings(
    Query(query): Query<RankingQuery>,
    State(ctx): State<DashboardContext>,
) -> impl IntoResponse {
    let by = query.by.as_deref().unwrap_or("composite");
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RANKING_LIMIT)
        .clamp(1, MAX_RANKING_LIMIT);

    let snapshot = ctx.snapshot_rx.borrow().clone();
    match build_rankings(&snapshot, by, limit) {
        Some(entries) => Json(ApiResponse::success(entries)),
        None => Json(ApiResponse::<Vec<RankingEntryResponse>>::error(format!(
            "unknown score '{}'",
            by
        ))),
    }
}

/// GET /api/health - Pipeline liveness and data origin
async fn get_health(State(ctx): State<DashboardContext>) -> impl IntoResponse {
    let snapshot = ctx.snapshot_rx.borrow().clone();
    let as_of = snapshot.as_of.timestamp_millis();
    let health = HealthResponse {
        origin: snapshot.origin.to_string(),
        is_mock: snapshot.is_mock(),
        cycle: snapshot.cycle,
        asset_count: snapshot.assets.len(),
        as_of,
        age_ms: (chrono::Utc::now().timestamp_millis() - as_of).max(0),
    };
    Json(ApiResponse::success(health))
}

/// POST /api/refresh - Invalidate the cache and refresh immediately
async fn post_refresh(State(ctx): State<DashboardContext>) -> impl IntoResponse {
    if ctx.controller.force_refresh().await {
        Json(ApiResponse::success("refresh scheduled".to_string()))
    } else {
        Json(ApiResponse::<String>::error("refresh loop unavailable"))
    }
}

/// Pick a score off the per-asset record by its public name.
fn score_value(scores: &AssetScores, by: &str) -> Option<f64> {
    match by {
        "composite" => Some(scores.composite),
        "volatility" => Some(scores.volatility),
        "htf_breakout" => Some(scores.htf_breakout),
        "relative_strength" => Some(scores.relative_strength),
        "relative_strength_z" => Some(scores.relative_strength_z),
        "carry" => Some(scores.carry),
        "price_z" => Some(scores.price_z),
        "volume_z" => Some(scores.volume_z),
        "oi_z" => Some(scores.oi_z),
        _ => None,
    }
}

/// Top-N assets by the requested score, descending.
fn build_rankings(
    snapshot: &MarketSnapshot,
    by: &str,
    limit: usize,
) -> Option<Vec<RankingEntryResponse>> {
    let mut entries: Vec<RankingEntryResponse> = snapshot
        .assets
        .iter()
        .filter_map(|asset| {
            let scores = snapshot.metrics.get(&asset.id)?;
            Some(RankingEntryResponse {
                id: asset.id.clone(),
                ticker: asset.ticker.clone(),
                score: score_value(scores, by)?,
            })
        })
        .collect();

    if entries.is_empty() && !snapshot.assets.is_empty() {
        // every lookup failed on the score name, not on the metrics join
        return None;
    }

    entries.sort_by(|a, b| b.score.total_cmp(&a.score));
    entries.truncate(limit);
    Some(entries)
}

// ─────────────────────────────────────────────────────────────────
// WebSocket Handler
// ─────────────────────────────────────────────────────────────────

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;

/// WebSocket upgrade handler
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(ctx): State<DashboardContext>,
) -> Response {
    ws.on_upgrade(move |socket| handle_websocket(socket, ctx))
}

/// Outgoing message type for WebSocket
enum OutgoingMessage {
    Text(String),
    Pong(Vec<u8>),
}

/// Handle WebSocket connection
async fn handle_websocket(socket: WebSocket, ctx: DashboardContext) {
    use futures_util::{SinkExt, StreamExt};

    tracing::info!("🖥️ New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();

    // Send the current snapshot immediately
    let initial = SnapshotResponse::from(ctx.snapshot_rx.borrow().clone());
    let msg = WsMessage::Snapshot(initial);
    if let Ok(json) = serde_json::to_string(&msg) {
        if sender.send(Message::Text(json)).await.is_err() {
            return;
        }
    }

    // Subscribe to broadcasts
    let mut rx = ctx.broadcaster.subscribe();

    // Channel for outgoing messages
    let (out_tx, mut out_rx) = tokio::sync::mpsc::channel::<OutgoingMessage>(32);

    // Spawn task to send outgoing messages
    let send_task = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let result = match msg {
                OutgoingMessage::Text(text) => sender.send(Message::Text(text)).await,
                OutgoingMessage::Pong(data) => sender.send(Message::Pong(data)).await,
            };
            if result.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages (ping/pong) and broadcast updates
    loop {
        tokio::select! {
            // Broadcast updates
            broadcast_msg = rx.recv() => {
                if let Ok(msg) = broadcast_msg {
                    if out_tx.send(OutgoingMessage::Text(msg)).await.is_err() {
                        break;
                    }
                }
            }
            // Incoming messages
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Ping(data))) => {
                        if out_tx.send(OutgoingMessage::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received WebSocket message: {}", text);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    send_task.abort();
    tracing::info!("🖥️ WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{derive, ScoreWeights};
    use crate::types::{AssetSnapshot, DataOrigin};

    fn snapshot() -> MarketSnapshot {
        let mk = |id: &str, change: f64, volume: f64, rank: u32| AssetSnapshot {
            id: id.to_string(),
            ticker: id.to_uppercase(),
            name: id.to_string(),
            price: 100.0,
            change_24h_pct: change,
            change_7d_pct: change,
            volume,
            open_interest: None,
            funding_rate: None,
            rank,
        };
        let assets = vec![
            mk("bitcoin", 1.0, 10.0, 1),
            mk("ethereum", 5.0, 60.0, 2),
            mk("solana", -2.0, 20.0, 3),
        ];
        MarketSnapshot {
            metrics: derive(&assets, &ScoreWeights::default()),
            assets,
            as_of: chrono::Utc::now(),
            origin: DataOrigin::Live,
            cycle: 1,
        }
    }

    #[test]
    fn test_rankings_sorted_descending_and_limited() {
        let snap = snapshot();

        let all = build_rankings(&snap, "composite", 100).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].score >= all[1].score && all[1].score >= all[2].score);
        assert_eq!(all[0].id, "ethereum");

        let top1 = build_rankings(&snap, "composite", 1).unwrap();
        assert_eq!(top1.len(), 1);
        assert_eq!(top1[0].id, "ethereum");
    }

    #[test]
    fn test_rankings_by_volatility() {
        let snap = snapshot();
        let ranked = build_rankings(&snap, "volatility", 10).unwrap();
        // |5.0| > |-2.0| > |1.0|
        assert_eq!(ranked[0].id, "ethereum");
        assert_eq!(ranked[1].id, "solana");
        assert_eq!(ranked[2].id, "bitcoin");
    }

    #[test]
    fn test_rankings_unknown_score_rejected() {
        let snap = snapshot();
        assert!(build_rankings(&snap, "alpha_decay", 10).is_none());
    }

    #[test]
    fn test_rankings_empty_snapshot_is_empty() {
        let snap = MarketSnapshot {
            assets: Vec::new(),
            metrics: Default::default(),
            as_of: chrono::Utc::now(),
            origin: DataOrigin::Live,
            cycle: 0,
        };
        let ranked = build_rankings(&snap, "composite", 10).unwrap();
        assert!(ranked.is_empty());
    }
}
