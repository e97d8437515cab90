//! WebSocket Broadcaster
//!
//! Fans published snapshots out to all connected WebSocket clients.

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;

use super::types::{SnapshotResponse, WsMessage};
use crate::types::MarketSnapshot;

/// Channel for broadcasting updates to WebSocket clients
#[derive(Debug, Clone)]
pub struct SnapshotBroadcaster {
    tx: broadcast::Sender<String>,
}

impl SnapshotBroadcaster {
    /// Create a new broadcaster with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to receive broadcast messages
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Broadcast a message to all connected clients
    pub fn broadcast(&self, msg: &WsMessage) {
        if let Ok(json) = serde_json::to_string(msg) {
            // Ignore send errors (no receivers is fine)
            let _ = self.tx.send(json);
        }
    }

    /// Broadcast a published snapshot
    pub fn broadcast_snapshot(&self, snapshot: SnapshotResponse) {
        self.broadcast(&WsMessage::Snapshot(snapshot));
    }

    /// Broadcast heartbeat
    pub fn broadcast_heartbeat(&self) {
        self.broadcast(&WsMessage::Heartbeat(chrono::Utc::now().timestamp_millis()));
    }
}

impl Default for SnapshotBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Forward every value published on the pipeline's watch channel to the
/// WebSocket broadcaster. Ends when the pipeline drops its sender.
pub fn spawn_watch_bridge(
    broadcaster: SnapshotBroadcaster,
    rx: watch::Receiver<MarketSnapshot>,
) -> JoinHandle<()> {
    let mut stream = WatchStream::new(rx);
    tokio::spawn(async move {
        while let Some(snapshot) = stream.next().await {
            broadcaster.broadcast_snapshot(SnapshotResponse::from(snapshot));
        }
    })
}
