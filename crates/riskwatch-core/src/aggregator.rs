//! The poller: periodic concurrent fetch, merge, and publication.
//!
//! A [`Poller`] owns the polling lifecycle. [`Poller::start`] spawns a
//! ticker whose first tick fires immediately; every tick spawns one poll
//! cycle as its own task, so a slow cycle never delays the next tick.
//! Each cycle fetches earthquakes and floods concurrently and either
//! publishes a new [`AggregatedCollection`] or records one error message,
//! leaving the previous collection in place.
//!
//! All state lives in a [`PollSnapshot`] behind a `tokio::sync::watch`
//! channel. The poller is its only writer. Every mutation happens inside
//! the channel's modify closure, which also checks for [`PollState::Stopped`],
//! so nothing changes once [`Poller::stop`] has returned. Overlapping
//! cycles resolve last-writer-wins by completion.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use riskwatch_feeds::{FeedError, FeedSource};
use riskwatch_types::{CycleId, Event, FeedQuery, HazardType};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::collection::AggregatedCollection;
use crate::config::PollerConfig;

/// Shortest accepted poll interval.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// A failed poll cycle.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// One of the per-hazard fetches failed.
    #[error("failed to load {hazard} events: {source}")]
    Fetch {
        /// The hazard whose fetch failed.
        hazard: HazardType,
        /// The underlying feed error.
        source: FeedError,
    },
}

/// Lifecycle state of the poller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    /// No cycle in flight.
    #[default]
    Idle,
    /// At least one cycle is awaiting its fetches.
    Fetching,
    /// Terminal. No further cycles run and no state changes.
    Stopped,
}

/// Everything consumers may observe about the poller.
#[derive(Debug, Clone)]
pub struct PollSnapshot {
    /// Current lifecycle state.
    pub state: PollState,
    /// Cycles started but not yet resolved.
    pub in_flight: u32,
    /// The currently published collection.
    pub collection: Arc<AggregatedCollection>,
    /// Message from the most recent failed cycle, cleared on success.
    pub last_error: Option<String>,
    /// Completion time of the most recent successful cycle.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Start time of the most recent cycle.
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Number of cycles that published a collection.
    pub cycles_succeeded: u64,
    /// Number of cycles that failed.
    pub cycles_failed: u64,
    /// Id of the most recently started cycle.
    pub last_cycle: Option<CycleId>,
}

impl Default for PollSnapshot {
    fn default() -> Self {
        Self {
            state: PollState::Idle,
            in_flight: 0,
            collection: Arc::new(AggregatedCollection::empty()),
            last_error: None,
            last_success_at: None,
            last_attempt_at: None,
            cycles_succeeded: 0,
            cycles_failed: 0,
            last_cycle: None,
        }
    }
}

/// How one poll cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A new collection was published.
    Published {
        /// Generation of the new collection.
        generation: u64,
        /// Number of events in it.
        count: usize,
    },
    /// The cycle failed; the previous collection is still published.
    Failed {
        /// The recorded error message.
        message: String,
    },
    /// The poller was stopped; results were discarded.
    Cancelled,
}

struct PollerShared<S> {
    source: S,
    earthquake: FeedQuery,
    flood: FeedQuery,
    interval: Duration,
    tx: watch::Sender<PollSnapshot>,
}

impl<S: FeedSource> PollerShared<S> {
    fn is_stopped(&self) -> bool {
        self.tx.borrow().state == PollState::Stopped
    }

    async fn run_cycle(&self) -> CycleOutcome {
        let cycle = CycleId::new();
        let started_at = Utc::now();

        let mut admitted = false;
        self.tx.send_if_modified(|snap| {
            if snap.state == PollState::Stopped {
                return false;
            }
            snap.state = PollState::Fetching;
            snap.in_flight = snap.in_flight.saturating_add(1);
            snap.last_attempt_at = Some(started_at);
            snap.last_cycle = Some(cycle);
            admitted = true;
            true
        });
        if !admitted {
            debug!(%cycle, "Poller stopped, cycle not started");
            return CycleOutcome::Cancelled;
        }

        debug!(%cycle, "Poll cycle started");
        let result = self.fetch_both().await;
        let completed_at = Utc::now();

        let mut outcome = CycleOutcome::Cancelled;
        self.tx.send_if_modified(|snap| {
            if snap.state == PollState::Stopped {
                return false;
            }
            snap.in_flight = snap.in_flight.saturating_sub(1);
            snap.state = if snap.in_flight == 0 {
                PollState::Idle
            } else {
                PollState::Fetching
            };
            match result {
                Ok((earthquakes, floods)) => {
                    let generation = snap.collection.generation().saturating_add(1);
                    let collection =
                        AggregatedCollection::merge(generation, completed_at, earthquakes, floods);
                    outcome = CycleOutcome::Published {
                        generation,
                        count: collection.len(),
                    };
                    snap.collection = Arc::new(collection);
                    snap.last_error = None;
                    snap.last_success_at = Some(completed_at);
                    snap.cycles_succeeded = snap.cycles_succeeded.saturating_add(1);
                }
                Err(err) => {
                    let message = err.to_string();
                    snap.last_error = Some(message.clone());
                    snap.cycles_failed = snap.cycles_failed.saturating_add(1);
                    outcome = CycleOutcome::Failed { message };
                }
            }
            true
        });

        match &outcome {
            CycleOutcome::Published { generation, count } => {
                info!(%cycle, generation, events = count, "Published event collection");
            }
            CycleOutcome::Failed { message } => {
                warn!(%cycle, error = %message, "Poll cycle failed, keeping previous collection");
            }
            CycleOutcome::Cancelled => {
                debug!(%cycle, "Poller stopped, discarding cycle results");
            }
        }
        outcome
    }

    async fn fetch_both(&self) -> Result<(Vec<Event>, Vec<Event>), PollError> {
        let earthquakes = async {
            self.source
                .fetch(&self.earthquake)
                .await
                .map_err(|source| PollError::Fetch {
                    hazard: HazardType::Earthquake,
                    source,
                })
        };
        let floods = async {
            self.source
                .fetch(&self.flood)
                .await
                .map_err(|source| PollError::Fetch {
                    hazard: HazardType::Flood,
                    source,
                })
        };
        let (earthquakes, floods) = tokio::try_join!(earthquakes, floods)?;
        Ok((earthquakes.events, floods.events))
    }
}

/// Owns the polling lifecycle and the published collection.
pub struct Poller<S> {
    shared: Arc<PollerShared<S>>,
    ticker: Option<JoinHandle<()>>,
}

impl<S: FeedSource + 'static> Poller<S> {
    /// Create a poller issuing the given per-hazard queries.
    pub fn new(source: S, earthquake: FeedQuery, flood: FeedQuery, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(PollSnapshot::default());
        Self {
            shared: Arc::new(PollerShared {
                source,
                earthquake,
                flood,
                interval: interval.max(MIN_INTERVAL),
                tx,
            }),
            ticker: None,
        }
    }

    /// Create a poller from the `poller` configuration section.
    pub fn from_config(source: S, config: &PollerConfig) -> Self {
        Self::new(
            source,
            config.earthquake.to_query(),
            config.flood.to_query(),
            config.interval(),
        )
    }

    /// Start periodic polling. The first cycle runs immediately.
    ///
    /// Has no effect if already started or stopped. Must be called from
    /// within a Tokio runtime.
    pub fn start(&mut self) {
        if self.ticker.is_some() || self.shared.is_stopped() {
            return;
        }
        info!(
            interval_secs = self.shared.interval.as_secs(),
            "Starting poller"
        );
        let shared = Arc::clone(&self.shared);
        self.ticker = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(shared.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if shared.is_stopped() {
                    break;
                }
                let cycle = Arc::clone(&shared);
                tokio::spawn(async move {
                    cycle.run_cycle().await;
                });
            }
        }));
    }

    /// Stop polling. Pending and future cycles are cancelled and the
    /// results of in-flight cycles are discarded. Terminal.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        self.shared.tx.send_if_modified(|snap| {
            if snap.state == PollState::Stopped {
                return false;
            }
            snap.state = PollState::Stopped;
            snap.in_flight = 0;
            true
        });
        info!("Poller stopped");
    }

    /// Run a single cycle now, without the timer.
    pub async fn poll_once(&self) -> CycleOutcome {
        self.shared.run_cycle().await
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.shared.tx.subscribe()
    }

    /// A copy of the current snapshot.
    pub fn snapshot(&self) -> PollSnapshot {
        self.shared.tx.borrow().clone()
    }

    /// The currently published collection.
    pub fn collection(&self) -> Arc<AggregatedCollection> {
        Arc::clone(&self.shared.tx.borrow().collection)
    }

    /// Whether the ticker is running.
    pub const fn is_running(&self) -> bool {
        self.ticker.is_some()
    }
}

impl<S> Drop for Poller<S> {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use riskwatch_types::EventsResponse;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::collection::fixtures::{flood, quake};

    /// Scripted feed source. The first `gated_calls` fetches wait on
    /// `gate` before reading their data.
    struct StubSource {
        earthquakes: Mutex<Vec<Event>>,
        floods: Mutex<Vec<Event>>,
        fail_floods: AtomicBool,
        gate: Arc<Semaphore>,
        gated_calls: usize,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(earthquakes: Vec<Event>, floods: Vec<Event>) -> Self {
            Self {
                earthquakes: Mutex::new(earthquakes),
                floods: Mutex::new(floods),
                fail_floods: AtomicBool::new(false),
                gate: Arc::new(Semaphore::new(0)),
                gated_calls: 0,
                calls: AtomicUsize::new(0),
            }
        }

        fn gated(mut self, gate: &Arc<Semaphore>, calls: usize) -> Self {
            self.gate = Arc::clone(gate);
            self.gated_calls = calls;
            self
        }
    }

    impl FeedSource for StubSource {
        async fn fetch(&self, query: &FeedQuery) -> Result<EventsResponse, FeedError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.gated_calls {
                self.gate.acquire().await.unwrap().forget();
            }
            match query.hazard {
                HazardType::Earthquake => {
                    let events = self.earthquakes.lock().unwrap().clone();
                    Ok(EventsResponse::new(Some(HazardType::Earthquake), events))
                }
                HazardType::Flood => {
                    if self.fail_floods.load(Ordering::SeqCst) {
                        return Err(FeedError::Status {
                            feed: "stub",
                            status: 503,
                            body: String::from("flood feed down"),
                        });
                    }
                    let events = self.floods.lock().unwrap().clone();
                    Ok(EventsResponse::new(Some(HazardType::Flood), events))
                }
            }
        }
    }

    fn poller(source: Arc<StubSource>) -> Poller<Arc<StubSource>> {
        Poller::new(
            source,
            FeedQuery::for_hazard(HazardType::Earthquake),
            FeedQuery::for_hazard(HazardType::Flood),
            Duration::from_secs(60),
        )
    }

    fn ids(collection: &AggregatedCollection) -> Vec<String> {
        collection
            .events()
            .iter()
            .map(|e| e.source_event_id.clone())
            .collect()
    }

    #[tokio::test]
    async fn successful_cycle_publishes_ranked_collection() {
        let source = Arc::new(StubSource::new(
            vec![quake("q1", Some(25.0), Some(4.1), None)],
            vec![flood("f1", Some(70.0), None)],
        ));
        let poller = poller(Arc::clone(&source));

        let outcome = poller.poll_once().await;
        assert_eq!(
            outcome,
            CycleOutcome::Published {
                generation: 1,
                count: 2
            }
        );

        let snap = poller.snapshot();
        assert_eq!(snap.state, PollState::Idle);
        assert_eq!(snap.in_flight, 0);
        assert_eq!(ids(&snap.collection), ["f1", "q1"]);
        assert!(snap.last_success_at.is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn flood_failure_keeps_previous_collection() {
        let source = Arc::new(StubSource::new(
            vec![quake("q1", Some(25.0), Some(4.1), None)],
            vec![flood("f1", Some(70.0), None)],
        ));
        let poller = poller(Arc::clone(&source));
        poller.poll_once().await;
        let before = poller.collection();

        *source.earthquakes.lock().unwrap() = vec![quake("q2", Some(90.0), Some(7.2), None)];
        source.fail_floods.store(true, Ordering::SeqCst);
        let outcome = poller.poll_once().await;

        let CycleOutcome::Failed { message } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert!(message.contains("flood"));
        assert!(message.contains("503"));

        let snap = poller.snapshot();
        assert!(Arc::ptr_eq(&before, &snap.collection));
        assert_eq!(ids(&snap.collection), ["f1", "q1"]);
        assert_eq!(snap.last_error.as_deref(), Some(message.as_str()));
        assert_eq!(snap.cycles_failed, 1);
        assert_eq!(snap.state, PollState::Idle);
    }

    #[tokio::test]
    async fn success_clears_last_error() {
        let source = Arc::new(StubSource::new(vec![], vec![]));
        source.fail_floods.store(true, Ordering::SeqCst);
        let poller = poller(Arc::clone(&source));
        poller.poll_once().await;
        assert!(poller.snapshot().last_error.is_some());

        source.fail_floods.store(false, Ordering::SeqCst);
        poller.poll_once().await;
        let snap = poller.snapshot();
        assert!(snap.last_error.is_none());
        assert_eq!(snap.collection.generation(), 1);
    }

    #[tokio::test]
    async fn stop_discards_in_flight_results() {
        let gate = Arc::new(Semaphore::new(0));
        let source = Arc::new(
            StubSource::new(vec![quake("q1", Some(25.0), Some(4.1), None)], vec![]).gated(&gate, 2),
        );
        let mut poller = poller(Arc::clone(&source));
        let shared = Arc::clone(&poller.shared);

        let in_flight = tokio::spawn(async move { shared.run_cycle().await });
        while poller.snapshot().in_flight == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(poller.snapshot().state, PollState::Fetching);

        poller.stop();
        gate.add_permits(2);
        let outcome = in_flight.await.unwrap();

        assert_eq!(outcome, CycleOutcome::Cancelled);
        let snap = poller.snapshot();
        assert_eq!(snap.state, PollState::Stopped);
        assert_eq!(snap.collection.generation(), 0);
        assert!(snap.collection.is_empty());
    }

    #[tokio::test]
    async fn stopped_poller_does_not_start_cycles() {
        let source = Arc::new(StubSource::new(vec![], vec![]));
        let mut poller = poller(Arc::clone(&source));
        poller.stop();
        assert_eq!(poller.poll_once().await, CycleOutcome::Cancelled);
        poller.start();
        assert!(!poller.is_running());
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn overlapping_cycles_resolve_last_writer_wins() {
        let gate = Arc::new(Semaphore::new(0));
        let source = Arc::new(
            StubSource::new(vec![quake("early", Some(10.0), Some(3.0), None)], vec![])
                .gated(&gate, 2),
        );
        let poller = poller(Arc::clone(&source));

        let shared = Arc::clone(&poller.shared);
        let slow = tokio::spawn(async move { shared.run_cycle().await });
        while source.calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }

        // Started second, completes first.
        let fast = poller.poll_once().await;
        assert_eq!(
            fast,
            CycleOutcome::Published {
                generation: 1,
                count: 1
            }
        );
        assert_eq!(poller.snapshot().in_flight, 1);
        assert_eq!(poller.snapshot().state, PollState::Fetching);

        *source.earthquakes.lock().unwrap() = vec![quake("late", Some(10.0), Some(3.0), None)];
        gate.add_permits(2);
        let slow = slow.await.unwrap();
        assert_eq!(
            slow,
            CycleOutcome::Published {
                generation: 2,
                count: 1
            }
        );

        let snap = poller.snapshot();
        assert_eq!(ids(&snap.collection), ["late"]);
        assert_eq!(snap.in_flight, 0);
        assert_eq!(snap.state, PollState::Idle);
        assert_eq!(snap.cycles_succeeded, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_fires_immediately_then_every_interval() {
        let source = Arc::new(StubSource::new(vec![], vec![]));
        let mut poller = poller(Arc::clone(&source));
        let mut rx = poller.subscribe();

        poller.start();
        assert!(poller.is_running());
        while rx.borrow_and_update().cycles_succeeded < 1 {
            rx.changed().await.unwrap();
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(poller.snapshot().cycles_succeeded, 1);

        while rx.borrow_and_update().cycles_succeeded < 2 {
            rx.changed().await.unwrap();
        }
        assert_eq!(poller.snapshot().collection.generation(), 2);

        poller.stop();
        tokio::time::sleep(Duration::from_secs(300)).await;
        let snap = poller.snapshot();
        assert_eq!(snap.state, PollState::Stopped);
        assert_eq!(snap.cycles_succeeded, 2);
    }
}
