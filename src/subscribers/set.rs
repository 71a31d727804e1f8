//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], which distributes events to multiple subscribers
//! concurrently without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event) ── Arc<Event> ──┬──► lane "LogWriter"      ──► on_event()
//!                              │    (bounded queue)          └─ panic → SubscriberPanicked
//!                              ├──► lane "EarningsLedger" ──► on_event()
//!                              └──► lane N                ──► on_event()
//!                                   full/closed → SubscriberOverflow (once per lane)
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: the ledger may process event N while the logger is at N+5
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Isolation**: a slow or panicking subscriber doesn't affect the others
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber panics while holding a lock.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::panic_message;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// One subscriber's queue and the worker draining it.
struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    worker: JoinHandle<()>,
}

/// Fan-out of bus events to the dispatcher's subscribers.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber.
    ///
    /// Queue size comes from [`Subscribe::queue_capacity`] (at least 1). Workers
    /// run until [`shutdown`](Self::shutdown) closes their queue.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let lanes = subs
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                Lane {
                    name: sub.name(),
                    tx,
                    worker: spawn_worker(sub, rx, bus.clone()),
                }
            })
            .collect();
        Self { lanes, bus }
    }

    /// Queues `event` for every subscriber without waiting.
    ///
    /// A full or closed lane loses the event and a `SubscriberOverflow` is
    /// published, except for overflow reports themselves.
    pub fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());
        let report = shared.kind != EventKind::SubscriberOverflow;

        for lane in &self.lanes {
            let reason = match lane.tx.try_send(Arc::clone(&shared)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            tracing::warn!(subscriber = lane.name, reason, seq = shared.seq, "subscriber dropped event");
            if report {
                self.bus.publish(Event::subscriber_overflow(lane.name, reason));
            }
        }
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Closes every lane, then waits for the workers to drain what was queued.
    pub async fn shutdown(self) {
        let workers: Vec<JoinHandle<()>> = self
            .lanes
            .into_iter()
            .map(|lane| {
                drop(lane.tx);
                lane.worker
            })
            .collect();
        for worker in workers {
            let _ = worker.await;
        }
    }
}

fn spawn_worker(
    sub: Arc<dyn Subscribe>,
    mut rx: mpsc::Receiver<Arc<Event>>,
    bus: Bus,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(ev) = rx.recv().await {
            let handled = std::panic::AssertUnwindSafe(sub.on_event(&ev))
                .catch_unwind()
                .await;
            if let Err(payload) = handled {
                let info = panic_message(&*payload);
                tracing::warn!(subscriber = sub.name(), %info, "subscriber panicked");
                bus.publish(Event::subscriber_panicked(sub.name(), info));
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter(AtomicUsize);

    #[async_trait]
    impl Subscribe for Counter {
        async fn on_event(&self, _ev: &Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
        fn name(&self) -> &'static str {
            "counter"
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_event(&self, _ev: &Event) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "panicky"
        }
    }

    #[tokio::test]
    async fn delivers_to_every_subscriber_and_survives_panics() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let subs: Vec<Arc<dyn Subscribe>> = vec![counter.clone(), Arc::new(Panicky)];
        let set = SubscriberSet::new(subs, bus);
        assert_eq!(set.len(), 2);

        set.emit(&Event::new(EventKind::OrderEmitted));
        set.emit(&Event::new(EventKind::OrderEmitted));
        set.shutdown().await;

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
        let ev = rx.recv().await.expect("panic report");
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert!(ev.reason.as_deref().unwrap_or_default().contains("boom"));
    }

    struct Stalled;

    #[async_trait]
    impl Subscribe for Stalled {
        async fn on_event(&self, _ev: &Event) {
            std::future::pending::<()>().await;
        }
        fn name(&self) -> &'static str {
            "stalled"
        }
        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn full_lane_reports_overflow_once_per_event() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Stalled)], bus);

        // first is picked up by the worker, second fills the lane
        set.emit(&Event::new(EventKind::OrderEmitted));
        tokio::task::yield_now().await;
        set.emit(&Event::new(EventKind::OrderEmitted));
        set.emit(&Event::new(EventKind::OrderEmitted));
        set.emit(&Event::subscriber_overflow("stalled", "full"));

        let ev = rx.try_recv().expect("overflow report");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert!(ev.reason.as_deref().unwrap_or_default().contains("full"));
        assert!(rx.try_recv().is_err());
    }
}
