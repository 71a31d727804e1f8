//! # Dispatcher: wires the offer pipeline and exposes the driver's actions.
//!
//! The [`Dispatcher`] owns one emitter, one notification queue, one order
//! registry, the event bus and the subscriber fan-out. Build it with
//! [`DispatcherBuilder`](crate::DispatcherBuilder).
//!
//! ## Architecture
//! ```text
//! OrderSource ──► Emitter ──listener──► NotificationQueue ──accept──► OrderRegistry
//!                    │                        │                          │
//!                    └──────── publish(Event) ┴──────────────────────────┘
//!                                     │
//!                                    Bus ──► listener task ──► SubscriberSet ──► subscribers
//!
//! run():
//!   start emission
//!   select! {
//!     OS signal           → ShutdownRequested
//!     request_shutdown()  → ShutdownRequested
//!     emitter.failed()    → error kept for the caller
//!   }
//!   (stop / start / pause_for while running only change emission)
//!   shutdown(): dispose emitter, queue, registry → drain listener → stop subscribers
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use orderfeed::{DispatchConfig, DispatcherBuilder, EarningsLedger, MockSource, Subscribe};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), orderfeed::FeedError> {
//!     let ledger = Arc::new(EarningsLedger::new());
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![ledger.clone()];
//!
//!     let dispatcher = DispatcherBuilder::new(DispatchConfig::default())
//!         .with_source(Arc::new(MockSource::randomized()))
//!         .with_subscribers(subs)
//!         .build();
//!
//!     dispatcher.start()?;
//!     // ... drive accept / reject from the UI ...
//!     dispatcher.shutdown().await?;
//!     println!("earned {:.0}", ledger.snapshot().total);
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::registry::OrderRegistry;
use crate::core::{DispatchConfig, shutdown};
use crate::error::FeedError;
use crate::events::{Bus, Event, EventKind};
use crate::notify::{
    Emitter, NotificationQueue, NotificationState, Subscription, SwipeGesture, SwipeOutcome,
};
use crate::orders::{ListSummary, Order, OrderSort, SourceRef, sorted, summary};
use crate::subscribers::SubscriberSet;

/// Runtime owner of the offer pipeline.
pub struct Dispatcher {
    cfg: DispatchConfig,
    bus: Bus,
    source: SourceRef,
    emitter: Arc<Emitter>,
    queue: Arc<NotificationQueue>,
    registry: Arc<OrderRegistry>,
    /// Emitter listener feeding the queue; released on shutdown.
    feed: Mutex<Option<Subscription>>,
    /// Stops the subscriber listener once teardown has published its last event.
    runtime_token: CancellationToken,
    /// Cancelled by [`request_shutdown`](Dispatcher::request_shutdown).
    halt: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    pub(crate) fn new_internal(
        cfg: DispatchConfig,
        bus: Bus,
        source: SourceRef,
        subs: SubscriberSet,
    ) -> Self {
        let emitter = Emitter::new(bus.clone(), cfg.emission_interval());
        let queue = NotificationQueue::new(&cfg, bus.clone());
        let registry = OrderRegistry::new(bus.clone(), cfg.eviction);

        let to_queue = Arc::clone(&queue);
        let feed = emitter.subscribe(move |order: &Order| {
            to_queue.add_to_queue(order.clone());
        });

        let runtime_token = CancellationToken::new();
        let listener = subscriber_listener(&bus, subs, runtime_token.clone());

        Self {
            cfg,
            bus,
            source,
            emitter,
            queue,
            registry,
            feed: Mutex::new(Some(feed)),
            runtime_token,
            halt: CancellationToken::new(),
            listener: Mutex::new(Some(listener)),
        }
    }

    /// Configuration this dispatcher was built with.
    pub fn config(&self) -> &DispatchConfig {
        &self.cfg
    }

    /// Receiver for every runtime event published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    // === Emission ===

    /// Starts (or restarts) random offer emission from the configured source.
    pub fn start(&self) -> Result<(), FeedError> {
        self.emitter
            .start_random_notifications(Arc::clone(&self.source))
    }

    /// Stops random offer emission. Offers already queued stay queued.
    pub fn stop(&self) {
        self.emitter.stop_random_notifications();
    }

    /// Pushes an offer through the emitter as if it had been generated.
    ///
    /// Returns `false` if it was dropped (emission paused or dispatcher shut down).
    pub fn offer(&self, order: Order) -> bool {
        self.emitter.emit(order)
    }

    /// Suppresses new offers until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.emitter.pause();
    }

    /// Re-enables new offers.
    pub fn resume(&self) {
        self.emitter.resume();
    }

    /// Suppresses new offers for `duration`, e.g. while the driver is on a delivery.
    pub fn pause_for(&self, duration: Duration) {
        self.emitter.pause_for_duration(duration);
    }

    /// True while new offers are suppressed.
    pub fn is_paused(&self) -> bool {
        self.emitter.is_paused()
    }

    // === Driver actions ===

    /// Accepts the offer on screen and adds it to the live order list.
    ///
    /// Returns `false` when `order` is not the offer on screen.
    pub fn accept(&self, order: &Order) -> bool {
        match self.queue.handle_accept(order) {
            Some(accepted) => {
                self.registry.add_order(accepted);
                true
            }
            None => false,
        }
    }

    /// Rejects the offer on screen. Returns `false` when nothing is on screen.
    pub fn reject(&self) -> bool {
        self.queue.handle_reject()
    }

    /// Reports that the on-screen countdown reached zero.
    pub fn dismiss_timeout(&self) -> bool {
        self.queue.dismiss_timeout()
    }

    /// Applies a finished drag gesture to the offer card.
    pub fn swipe(&self, gesture: SwipeGesture) -> SwipeOutcome {
        self.queue.handle_swipe(gesture)
    }

    /// Looks up an order for the details screen.
    ///
    /// Checks the offer on screen first, then the live list, and publishes
    /// `DetailsViewed` when found.
    pub fn view_details(&self, order_id: &str) -> Option<Order> {
        let found = self
            .queue
            .current()
            .filter(|o| &*o.id == order_id)
            .or_else(|| self.registry.get(order_id))?;

        self.bus
            .publish(Event::new(EventKind::DetailsViewed).with_order(&found));
        Some(found)
    }

    /// Removes an order from the live list.
    pub fn remove_order(&self, order_id: &str) -> Option<Order> {
        self.registry.remove_order(order_id)
    }

    /// Empties the live list. Returns the number of removed orders.
    pub fn clear_orders(&self) -> usize {
        self.registry.clear_orders()
    }

    // === Presentation ===

    /// Snapshot of the notification overlay.
    pub fn notification_state(&self) -> NotificationState {
        self.queue.state()
    }

    /// Receiver updated on every notification transition.
    pub fn watch_notifications(&self) -> watch::Receiver<NotificationState> {
        self.queue.watch()
    }

    /// Countdown left on the offer on screen.
    pub fn remaining(&self) -> Option<Duration> {
        self.queue.remaining()
    }

    /// Live orders, newest insertion first.
    pub fn orders(&self) -> Vec<Order> {
        self.registry.orders()
    }

    /// Live orders sorted for the list screen.
    pub fn sorted_orders(&self, sort: OrderSort) -> Vec<Order> {
        sorted(self.registry.orders(), sort)
    }

    /// Totals for the list header.
    pub fn summary(&self) -> ListSummary {
        summary(&self.registry.orders())
    }

    /// True if an order with `order_id` is in the live list.
    pub fn contains(&self, order_id: &str) -> bool {
        self.registry.contains(order_id)
    }

    /// Receiver updated on every live list mutation.
    pub fn watch_orders(&self) -> watch::Receiver<Vec<Order>> {
        self.registry.watch()
    }

    // === Lifecycle ===

    /// Starts emission and runs until an OS termination signal, a call to
    /// [`request_shutdown`](Self::request_shutdown) or a fatal source error, then
    /// shuts down.
    ///
    /// [`stop`](Self::stop), [`start`](Self::start) and [`pause_for`](Self::pause_for)
    /// may be called while this runs; they do not end it.
    ///
    /// Returns the source error if emission failed.
    pub async fn run(&self) -> Result<(), FeedError> {
        self.start()?;

        let outcome = tokio::select! {
            signal = shutdown::wait_for_shutdown_signal() => signal.map(|sig| {
                tracing::info!(signal = sig.as_str(), "shutdown signal received");
                self.bus.publish(
                    Event::new(EventKind::ShutdownRequested).with_reason(sig.as_str()),
                );
            }),
            _ = self.halt.cancelled() => Ok(()),
            _ = self.emitter.failed() => Ok(()),
        };

        let teardown = self.shutdown().await;
        outcome.and(teardown)
    }

    /// Asks a pending [`run`](Self::run) to shut down.
    pub fn request_shutdown(&self) {
        if !self.halt.is_cancelled() {
            self.bus
                .publish(Event::new(EventKind::ShutdownRequested).with_reason("requested"));
            self.halt.cancel();
        }
    }

    /// Disposes every component, then waits for subscribers to drain.
    ///
    /// Idempotent. Returns the emitter's source error, if it failed and nobody
    /// collected the error yet.
    pub async fn shutdown(&self) -> Result<(), FeedError> {
        let feed = self.feed.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(sub) = feed {
            sub.unsubscribe();
        }
        let emitted = self.emitter.shutdown().await;
        self.queue.dispose();
        self.registry.dispose();

        self.runtime_token.cancel();
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(h) = listener {
            let _ = h.await;
        }
        emitted
    }
}

/// Forwards bus events to the subscriber set until `token` is cancelled.
///
/// Events already in the channel are delivered before exiting.
fn subscriber_listener(bus: &Bus, set: SubscriberSet, token: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = token.cancelled() => break,
            }
        }
        set.shutdown().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DispatcherBuilder;
    use crate::orders::{FnSource, Platform};
    use crate::subscribers::{EarningsLedger, Subscribe};
    use tokio::time;

    fn order(id: &str, platform: Platform, pay: f64) -> Order {
        Order::new(id, platform)
            .with_distance_km(3.0)
            .with_pay(pay)
            .with_estimated_minutes(15)
    }

    fn fixed_source() -> SourceRef {
        FnSource::arc("fixed", || Ok::<_, FeedError>(order("o1", Platform::Swiggy, 50.0)))
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_offer_lives_for_the_eviction_window() {
        let d = DispatcherBuilder::new(DispatchConfig::default())
            .with_source(fixed_source())
            .build();

        let o1 = order("o1", Platform::Swiggy, 50.0);
        assert!(d.offer(o1.clone()));
        let st = d.notification_state();
        assert!(st.is_visible);
        assert_eq!(st.current.as_ref().map(|o| &*o.id), Some("o1"));

        assert!(d.accept(&o1));
        assert!(d.contains("o1"));

        time::sleep(Duration::from_millis(60_001)).await;
        assert!(!d.contains("o1"));
        d.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn random_emission_reaches_the_screen() {
        let d = DispatcherBuilder::new(DispatchConfig::default())
            .with_source(fixed_source())
            .build();
        d.start().unwrap();

        time::sleep(Duration::from_secs(15)).await;
        assert_eq!(
            d.notification_state().current.map(|o| o.id.to_string()).as_deref(),
            Some("o1")
        );
        d.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn paused_dispatcher_drops_offers() {
        let d = DispatcherBuilder::new(DispatchConfig::default()).build();
        d.pause_for(Duration::from_secs(30));
        assert!(!d.offer(order("o1", Platform::Zomato, 40.0)));
        assert!(!d.notification_state().is_visible);

        time::sleep(Duration::from_secs(31)).await;
        assert!(d.offer(order("o2", Platform::Zomato, 40.0)));
        d.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn details_come_from_screen_then_list() {
        let d = DispatcherBuilder::new(DispatchConfig::default()).build();
        let mut events = d.events();

        let a = order("a", Platform::Swiggy, 30.0);
        d.offer(a.clone());
        assert_eq!(d.view_details("a").map(|o| o.pay_amount), Some(30.0));

        d.accept(&a);
        assert!(d.view_details("a").is_some());
        assert!(d.view_details("missing").is_none());

        let mut viewed = 0;
        while let Ok(ev) = events.try_recv() {
            if ev.kind == EventKind::DetailsViewed {
                viewed += 1;
            }
        }
        assert_eq!(viewed, 2);
        d.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn earnings_follow_driver_actions() {
        let ledger = Arc::new(EarningsLedger::new());
        let subs: Vec<Arc<dyn Subscribe>> = vec![ledger.clone()];
        let d = DispatcherBuilder::new(DispatchConfig::default())
            .with_subscribers(subs)
            .build();

        let a = order("a", Platform::Swiggy, 60.0);
        let b = order("b", Platform::Zomato, 40.0);
        let c = order("c", Platform::EatSure, 25.0);
        d.offer(a.clone());
        d.offer(b.clone());
        d.offer(c);

        assert!(d.accept(&a));
        time::sleep(Duration::from_millis(301)).await;
        assert!(d.accept(&b));
        time::sleep(Duration::from_millis(301)).await;
        assert_eq!(d.swipe(SwipeGesture::new(150.0, 0.0, 200)), SwipeOutcome::Dismiss);

        let ids: Vec<String> = d
            .sorted_orders(OrderSort::HighestPay)
            .iter()
            .map(|o| o.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(d.summary().total_pay, 100.0);

        d.shutdown().await.unwrap();
        let snap = ledger.snapshot();
        assert_eq!(snap.accepted, 2);
        assert_eq!(snap.rejected, 1);
        assert_eq!(snap.total, 100.0);
        assert!((snap.share(Platform::Swiggy) - 60.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn run_surfaces_a_failing_source() {
        let broken: SourceRef = FnSource::arc("broken", || {
            Err::<Order, _>(FeedError::SourceFailed { error: "offline".into() })
        });
        let d = DispatcherBuilder::new(DispatchConfig::default())
            .with_source(broken)
            .build();

        let err = d.run().await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test(start_paused = true)]
    async fn run_returns_after_request_shutdown() {
        let d = DispatcherBuilder::new(DispatchConfig::default())
            .with_source(fixed_source())
            .build();

        let handle = Arc::clone(&d);
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(1)).await;
            handle.request_shutdown();
        });
        d.run().await.unwrap();
        assert!(matches!(d.start(), Err(FeedError::Disposed)));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_releases_the_queue_feed() {
        let d = DispatcherBuilder::new(DispatchConfig::default()).build();
        assert_eq!(d.emitter.listener_count(), 1);
        assert!(d.feed.lock().unwrap().is_some());

        d.shutdown().await.unwrap();
        assert!(d.feed.lock().unwrap().is_none());
        assert_eq!(d.emitter.listener_count(), 0);
        d.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_run_keeps_the_dispatcher_alive() {
        let d = DispatcherBuilder::new(DispatchConfig::default())
            .with_source(fixed_source())
            .build();
        let runner = Arc::clone(&d);
        let run = tokio::spawn(async move { runner.run().await });

        time::sleep(Duration::from_secs(1)).await;
        d.stop();
        time::sleep(Duration::from_secs(30)).await;
        assert!(!run.is_finished());
        assert!(!d.notification_state().is_visible);

        let o2 = order("o2", Platform::Zomato, 45.0);
        assert!(d.offer(o2.clone()));
        assert!(d.accept(&o2));
        assert!(d.contains("o2"));

        d.start().unwrap();
        time::sleep(Duration::from_secs(15)).await;
        assert_eq!(
            d.notification_state().current.map(|o| o.id.to_string()).as_deref(),
            Some("o1")
        );

        d.request_shutdown();
        run.await.unwrap().unwrap();
        assert!(!d.contains("o2"));
    }

    #[tokio::test(start_paused = true)]
    async fn restart_during_run_keeps_emitting() {
        let d = DispatcherBuilder::new(DispatchConfig::default())
            .with_source(fixed_source())
            .build();
        let runner = Arc::clone(&d);
        let run = tokio::spawn(async move { runner.run().await });

        time::sleep(Duration::from_secs(5)).await;
        d.start().unwrap();
        time::sleep(Duration::from_millis(9_999)).await;
        assert!(!run.is_finished());
        assert!(!d.notification_state().is_visible);

        // the restarted schedule fires in [15s, 20s)
        time::sleep(Duration::from_millis(5_001)).await;
        assert!(d.notification_state().is_visible);

        d.request_shutdown();
        run.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn pause_for_during_run_suppresses_then_resumes() {
        let d = DispatcherBuilder::new(DispatchConfig::default())
            .with_source(fixed_source())
            .build();
        let mut events = d.events();
        let runner = Arc::clone(&d);
        let run = tokio::spawn(async move { runner.run().await });

        time::sleep(Duration::from_secs(1)).await;
        d.pause_for(Duration::from_secs(20));
        time::sleep(Duration::from_secs(20)).await;
        assert!(!d.notification_state().is_visible);
        assert!(!run.is_finished());

        // ticks are under 15s apart, so one lands after the resume
        time::sleep(Duration::from_secs(15)).await;
        assert!(!d.is_paused());

        d.request_shutdown();
        run.await.unwrap().unwrap();
        let (mut dropped, mut shown) = (0, 0);
        while let Ok(ev) = events.try_recv() {
            match ev.kind {
                EventKind::EmissionDropped => dropped += 1,
                EventKind::NotificationShown => shown += 1,
                _ => {}
            }
        }
        assert!(dropped >= 1);
        assert!(shown >= 1);
    }
}
