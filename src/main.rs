//! Pulseboard binary
//!
//! Wires the fetch/derive/publish pipeline together and, with the
//! `dashboard` feature, serves the HTTP/WebSocket API for the charts.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use pulseboard::clock::SystemClock;
use pulseboard::config::AppConfig;
use pulseboard::market::{CoinGeckoClient, MarketCache};
use pulseboard::pipeline::RefreshLoop;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    tracing::info!(config = %config.digest(), "🚀 Starting pulseboard");

    let clock = Arc::new(SystemClock);
    let source = CoinGeckoClient::new(&config.market)?;
    let cache = MarketCache::new(
        Arc::new(source),
        Duration::from_secs(config.cache.ttl_secs),
        clock.clone(),
    );
    let (refresh_loop, snapshot_rx) = RefreshLoop::new(
        cache,
        config.scores.clone(),
        clock,
        Duration::from_secs(config.refresh.interval_secs),
    );
    let handle = refresh_loop.spawn();

    #[cfg(feature = "dashboard")]
    if config.dashboard.enabled {
        use pulseboard::dashboard::{self, DashboardContext, SnapshotBroadcaster};

        let broadcaster = SnapshotBroadcaster::default();
        dashboard::spawn_watch_bridge(broadcaster.clone(), snapshot_rx.clone());

        let heartbeat = broadcaster.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(15));
            loop {
                interval.tick().await;
                heartbeat.broadcast_heartbeat();
            }
        });

        let router = dashboard::create_router(DashboardContext {
            snapshot_rx: snapshot_rx.clone(),
            broadcaster,
            controller: handle.controller(),
        });

        let listener = tokio::net::TcpListener::bind(&config.dashboard.bind_addr).await?;
        tracing::info!(addr = %config.dashboard.bind_addr, "🖥️ Dashboard API listening");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Dashboard server exited");
            }
        });
    }

    // Log a one-line summary of every published snapshot
    let mut log_rx = snapshot_rx;
    tokio::spawn(async move {
        while log_rx.changed().await.is_ok() {
            let (cycle, count, origin) = {
                let snap = log_rx.borrow_and_update();
                (snap.cycle, snap.assets.len(), snap.origin)
            };
            tracing::info!(cycle, assets = count, origin = %origin, "Snapshot published");
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    handle.shutdown().await;

    Ok(())
}
