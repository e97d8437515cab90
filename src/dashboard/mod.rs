//! Dashboard Module
//!
//! HTTP/WebSocket API serving the latest published snapshot to chart
//! frontends. Only compiled when the `dashboard` feature is enabled.

mod api;
mod types;
mod websocket;

pub use api::create_router;
pub use types::*;
pub use websocket::{spawn_watch_bridge, SnapshotBroadcaster};

use crate::pipeline::RefreshController;
use crate::types::MarketSnapshot;
use tokio::sync::watch;

/// Shared state for the API handlers.
///
/// Handlers only read the latest published snapshot; the refresh loop
/// remains the single writer.
#[derive(Clone)]
pub struct DashboardContext {
    /// Latest published snapshot
    pub snapshot_rx: watch::Receiver<MarketSnapshot>,
    /// Fan-out of published snapshots to WebSocket clients
    pub broadcaster: SnapshotBroadcaster,
    /// Out-of-band refresh requests (the "refresh now" button)
    pub controller: RefreshController,
}
