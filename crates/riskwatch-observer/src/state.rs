//! Shared application state for the dashboard API server.
//!
//! [`AppState`] holds a receiver on the poller's snapshot channel plus
//! the per-dashboard view state: the map renderer and the filter memo.
//! Reads of the published collection never block the poller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use riskwatch_core::render::MapDefaults;
use riskwatch_core::{FilterMemo, FilterParams, FilteredView, MapRenderer, PollSnapshot, PollState};
use riskwatch_feeds::EventProvider;
use riskwatch_types::{CycleId, RenderMode};
use serde::Serialize;
use tokio::sync::{Mutex, watch};

/// JSON-serializable summary of the poller, pushed over the `WebSocket`
/// and served by `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    /// Poller lifecycle state.
    pub state: PollState,
    /// Cycles currently in flight.
    pub in_flight: u32,
    /// Generation of the published collection.
    pub generation: u64,
    /// Events in the published collection.
    pub event_count: usize,
    /// Most recent cycle error, if the last cycle failed.
    pub last_error: Option<String>,
    /// When the published collection was fetched.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Start of the most recent cycle.
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Successful cycles so far.
    pub cycles_succeeded: u64,
    /// Failed cycles so far.
    pub cycles_failed: u64,
    /// Most recently started cycle.
    pub last_cycle: Option<CycleId>,
}

impl CycleSummary {
    /// Project a poller snapshot.
    pub fn from_snapshot(snap: &PollSnapshot) -> Self {
        Self {
            state: snap.state,
            in_flight: snap.in_flight,
            generation: snap.collection.generation(),
            event_count: snap.collection.len(),
            last_error: snap.last_error.clone(),
            fetched_at: snap.last_success_at,
            last_attempt_at: snap.last_attempt_at,
            cycles_succeeded: snap.cycles_succeeded,
            cycles_failed: snap.cycles_failed,
            last_cycle: snap.last_cycle,
        }
    }
}

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// Receiver on the poller's snapshot channel.
    pub snapshots: watch::Receiver<PollSnapshot>,
    /// Map surface state (mode, viewport, pending re-measure).
    pub renderer: Mutex<MapRenderer>,
    /// Cached filter result for the current collection.
    pub memo: Mutex<FilterMemo>,
    /// In-process provider backing `GET /events`, when configured.
    pub provider: Option<Arc<EventProvider>>,
    /// When this server started.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create application state reading from `snapshots`.
    pub fn new(snapshots: watch::Receiver<PollSnapshot>, map: MapDefaults) -> Self {
        Self {
            snapshots,
            renderer: Mutex::new(MapRenderer::new(map)),
            memo: Mutex::new(FilterMemo::new()),
            provider: None,
            started_at: Utc::now(),
        }
    }

    /// Attach the in-process provider served at `GET /events`.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<EventProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// A copy of the current poller snapshot.
    pub fn snapshot(&self) -> PollSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A fresh receiver for snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.snapshots.clone()
    }

    /// The filtered view of `snapshot`'s collection. Handlers pass the
    /// snapshot they already hold so one response never mixes two cycles.
    pub async fn filtered(&self, snapshot: &PollSnapshot, params: &FilterParams) -> FilteredView {
        self.memo.lock().await.view(&snapshot.collection, params)
    }

    /// The active render mode.
    pub async fn mode(&self) -> RenderMode {
        self.renderer.lock().await.mode()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use riskwatch_core::AggregatedCollection;

    use super::*;

    fn published(generation: u64) -> PollSnapshot {
        PollSnapshot {
            collection: Arc::new(AggregatedCollection::merge(
                generation,
                Utc::now(),
                Vec::new(),
                Vec::new(),
            )),
            ..PollSnapshot::default()
        }
    }

    #[tokio::test]
    async fn view_follows_the_snapshot_it_was_given() {
        let (tx, rx) = watch::channel(published(1));
        let state = AppState::new(rx, MapDefaults::default());

        let held = state.snapshot();
        tx.send_replace(published(2));

        let view = state.filtered(&held, &FilterParams::default()).await;
        assert_eq!(view.collection().generation(), 1);
        assert_eq!(state.snapshot().collection.generation(), 2);
    }
}
