//! Refresh pipeline
//!
//! Timer-driven loop: pull the asset set through the market cache, derive
//! scores, publish one immutable snapshot per cycle on a watch channel.
//! Cycles run strictly sequentially; a slow fetch delays the next tick
//! rather than overlapping it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clock::Clock;
use crate::market::MarketCache;
use crate::metrics::{self, ScoreWeights};
use crate::mock;
use crate::types::{DataOrigin, MarketSnapshot};

/// Control messages accepted by a running refresh loop.
#[derive(Debug)]
enum PipelineCommand {
    /// Drop the cache entry and refresh immediately
    ForceRefresh,
}

/// Handle for requesting an out-of-band refresh (the dashboard's
/// "refresh now" button).
#[derive(Debug, Clone)]
pub struct RefreshController {
    tx: mpsc::Sender<PipelineCommand>,
}

impl RefreshController {
    /// Ask the loop to invalidate its cache and refresh now. Returns
    /// false if the loop has shut down.
    pub async fn force_refresh(&self) -> bool {
        self.tx.send(PipelineCommand::ForceRefresh).await.is_ok()
    }
}

/// Owned handle to the spawned refresh task.
pub struct PipelineHandle {
    shutdown: Option<oneshot::Sender<()>>,
    controller: RefreshController,
    join: JoinHandle<()>,
}

impl PipelineHandle {
    pub fn controller(&self) -> RefreshController {
        self.controller.clone()
    }

    /// Stop the loop after the in-flight cycle, if any, completes.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = self.join.await;
    }

    /// Hard-cancel the task. Safe: a snapshot is published atomically or
    /// not at all.
    pub fn abort(&self) {
        self.join.abort();
    }
}

/// The periodic fetch → derive → publish loop.
///
/// Owns the cache (single writer). Consumers subscribe to the watch
/// channel and always observe the latest fully-formed snapshot.
pub struct RefreshLoop {
    cache: MarketCache,
    weights: ScoreWeights,
    clock: Arc<dyn Clock>,
    interval: Duration,
    tx: watch::Sender<MarketSnapshot>,
    cycle: u64,
}

impl RefreshLoop {
    /// Build the loop and the receiver side of its channel.
    ///
    /// The channel is seeded with a mock snapshot so subscribers never
    /// observe "no data", even before the first cycle completes.
    pub fn new(
        cache: MarketCache,
        weights: ScoreWeights,
        clock: Arc<dyn Clock>,
        interval: Duration,
    ) -> (Self, watch::Receiver<MarketSnapshot>) {
        let assets = mock::mock_assets();
        let seed = MarketSnapshot {
            metrics: metrics::derive(&assets, &weights),
            assets,
            as_of: clock.now(),
            origin: DataOrigin::Mock,
            cycle: 0,
        };
        let (tx, rx) = watch::channel(seed);

        (
            Self {
                cache,
                weights,
                clock,
                interval,
                tx,
                cycle: 0,
            },
            rx,
        )
    }

    /// Run a single fetch → derive → publish cycle.
    ///
    /// Exposed so tests can drive the pipeline without a timer.
    pub async fn refresh_once(&mut self) -> MarketSnapshot {
        let (assets, origin) = self.cache.get().await;
        let metrics = metrics::derive(&assets, &self.weights);
        self.cycle += 1;

        let snapshot = MarketSnapshot {
            assets,
            metrics,
            as_of: self.clock.now(),
            origin,
            cycle: self.cycle,
        };

        match origin {
            DataOrigin::Mock => tracing::warn!(
                cycle = snapshot.cycle,
                "No market data available, publishing mock dataset"
            ),
            _ => tracing::debug!(
                cycle = snapshot.cycle,
                assets = snapshot.assets.len(),
                origin = %origin,
                "Published market snapshot"
            ),
        }

        // ignore send errors: no subscribers is fine
        let _ = self.tx.send(snapshot.clone());
        snapshot
    }

    /// Spawn the loop as an owned, cancellable task.
    ///
    /// First tick fires immediately; missed ticks are delayed so cycles
    /// never overlap.
    pub fn spawn(mut self) -> PipelineHandle {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let (cmd_tx, mut cmd_rx) = mpsc::channel(8);

        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.refresh_once().await;
                    }
                    Some(cmd) = cmd_rx.recv() => match cmd {
                        PipelineCommand::ForceRefresh => {
                            tracing::info!("Forced refresh requested, invalidating cache");
                            self.cache.invalidate();
                            self.refresh_once().await;
                        }
                    },
                    _ = &mut shutdown_rx => {
                        tracing::info!("Refresh loop stopped");
                        break;
                    }
                }
            }
        });

        PipelineHandle {
            shutdown: Some(shutdown_tx),
            controller: RefreshController { tx: cmd_tx },
            join,
        }
    }
}
