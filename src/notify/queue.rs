//! # Notification presentation queue.
//!
//! Shows at most one offer at a time and keeps later arrivals in a FIFO backlog.
//!
//! ## State machine
//! ```text
//!            add_to_queue                accept / reject / swipe / timeout
//!   Idle ───────────────────► Showing ───────────────────────────────────► Advancing
//!    ▲                         ▲   │ auto-dismiss (15s) ───────────────────────┘ │
//!    │                         │   └─ add_to_queue → backlog.push_back           │
//!    │                         └──────── gap elapsed (300ms), backlog non-empty ─┤
//!    └────────────────────────────────── gap elapsed, backlog empty ─────────────┘
//! ```
//!
//! ## Rules
//! - Exactly one current offer at any instant; it is never duplicated in the backlog.
//! - The backlog keeps arrival order. Arrivals during the gap go to the backlog.
//! - The gap always elapses, even when the backlog is non-empty.
//! - Every shown offer gets its own auto-dismiss timer; leaving `Showing` cancels it.
//! - Every transition publishes a fresh [`NotificationState`] on the watch channel.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::{DispatchConfig, timer};
use crate::events::{Bus, Event, EventKind};
use crate::notify::gesture::{SwipeGesture, SwipeOutcome};
use crate::orders::Order;

/// Snapshot of what the notification overlay should render.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationState {
    /// Offer on screen, if any.
    pub current: Option<Order>,
    /// Offers waiting behind it, oldest first.
    pub backlog: Vec<Order>,
    /// True while an offer is on screen.
    pub is_visible: bool,
}

enum Presentation {
    Idle,
    Showing {
        order: Order,
        dismiss: CancellationToken,
        shown_at: Instant,
    },
    Advancing {
        gap: CancellationToken,
    },
}

struct QueueState {
    presentation: Presentation,
    backlog: VecDeque<Order>,
    disposed: bool,
}

impl QueueState {
    fn current(&self) -> Option<&Order> {
        match &self.presentation {
            Presentation::Showing { order, .. } => Some(order),
            _ => None,
        }
    }

    fn snapshot(&self) -> NotificationState {
        let current = self.current().cloned();
        NotificationState {
            is_visible: current.is_some(),
            current,
            backlog: self.backlog.iter().cloned().collect(),
        }
    }
}

/// Single-flight presenter of incoming offers.
pub struct NotificationQueue {
    state: Mutex<QueueState>,
    tx: watch::Sender<NotificationState>,
    bus: Bus,
    root: CancellationToken,
    auto_dismiss: Duration,
    advance_gap: Duration,
}

impl NotificationQueue {
    /// Creates an idle queue using the config's auto-dismiss and gap timings.
    pub fn new(cfg: &DispatchConfig, bus: Bus) -> Arc<Self> {
        let (tx, _rx) = watch::channel(NotificationState::default());
        Arc::new(Self {
            state: Mutex::new(QueueState {
                presentation: Presentation::Idle,
                backlog: VecDeque::new(),
                disposed: false,
            }),
            tx,
            bus,
            root: CancellationToken::new(),
            auto_dismiss: cfg.auto_dismiss,
            advance_gap: cfg.advance_gap,
        })
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Shows `order` right away when idle, otherwise appends it to the backlog.
    ///
    /// Returns `false` when the offer was dropped: the queue is disposed or the
    /// same id is already on screen.
    pub fn add_to_queue(self: &Arc<Self>, order: Order) -> bool {
        let mut st = self.lock();
        if st.disposed {
            return false;
        }
        if st.current().is_some_and(|cur| cur.id == order.id) {
            tracing::debug!(order = %order.id, "offer already on screen; dropped");
            return false;
        }

        if matches!(st.presentation, Presentation::Idle) {
            self.show(&mut st, order);
        } else {
            let queued = Event::new(EventKind::NotificationQueued)
                .with_order(&order)
                .with_backlog(st.backlog.len() + 1);
            st.backlog.push_back(order);
            self.bus.publish(queued);
        }
        self.tx.send_replace(st.snapshot());
        true
    }

    /// Accepts the current offer and hands it back for the registry.
    ///
    /// Returns `None` if `order` is not the one on screen.
    pub fn handle_accept(self: &Arc<Self>, order: &Order) -> Option<Order> {
        let mut st = self.lock();
        if st.current().is_none_or(|cur| cur.id != order.id) {
            tracing::debug!(order = %order.id, "accept for an offer that is not on screen; ignored");
            return None;
        }
        self.resolve(&mut st, EventKind::NotificationAccepted, None)
    }

    /// Rejects the current offer. Returns `false` when nothing is on screen.
    pub fn handle_reject(self: &Arc<Self>) -> bool {
        let mut st = self.lock();
        self.resolve(&mut st, EventKind::NotificationRejected, Some("button"))
            .is_some()
    }

    /// Times out the current offer (countdown reached zero on screen).
    ///
    /// Returns `false` when nothing is on screen.
    pub fn dismiss_timeout(self: &Arc<Self>) -> bool {
        let mut st = self.lock();
        self.resolve(&mut st, EventKind::NotificationTimedOut, None)
            .is_some()
    }

    /// Applies a finished drag gesture to the current card.
    ///
    /// A dismissing swipe rejects the offer. With nothing on screen every
    /// gesture is [`SwipeOutcome::Ignored`].
    pub fn handle_swipe(self: &Arc<Self>, gesture: SwipeGesture) -> SwipeOutcome {
        let mut st = self.lock();
        if st.current().is_none() {
            return SwipeOutcome::Ignored;
        }
        let outcome = gesture.classify();
        if outcome == SwipeOutcome::Dismiss {
            self.resolve(&mut st, EventKind::NotificationRejected, Some("swipe"));
        }
        outcome
    }

    /// Current snapshot.
    pub fn state(&self) -> NotificationState {
        self.lock().snapshot()
    }

    /// Receiver updated on every transition.
    pub fn watch(&self) -> watch::Receiver<NotificationState> {
        self.tx.subscribe()
    }

    /// The offer on screen, if any.
    pub fn current(&self) -> Option<Order> {
        self.lock().current().cloned()
    }

    /// Countdown left on the current offer; `None` when nothing is on screen.
    pub fn remaining(&self) -> Option<Duration> {
        match &self.lock().presentation {
            Presentation::Showing { shown_at, .. } => {
                Some(self.auto_dismiss.saturating_sub(shown_at.elapsed()))
            }
            _ => None,
        }
    }

    /// Cancels all timers, clears the queue and ignores further input. Idempotent.
    pub fn dispose(&self) {
        let mut st = self.lock();
        if st.disposed {
            return;
        }
        st.disposed = true;
        match std::mem::replace(&mut st.presentation, Presentation::Idle) {
            Presentation::Showing { dismiss, .. } => dismiss.cancel(),
            Presentation::Advancing { gap } => gap.cancel(),
            Presentation::Idle => {}
        }
        self.root.cancel();
        st.backlog.clear();
        self.tx.send_replace(st.snapshot());
    }

    /// Makes `order` current and arms its auto-dismiss timer.
    fn show(self: &Arc<Self>, st: &mut QueueState, order: Order) {
        st.backlog.retain(|o| o.id != order.id);

        let weak = Arc::downgrade(self);
        let dismiss = timer::schedule(&self.root, self.auto_dismiss, move |token| {
            if let Some(queue) = weak.upgrade() {
                queue.expire(token);
            }
        });

        tracing::debug!(order = %order.id, backlog = st.backlog.len(), "notification shown");
        self.bus.publish(
            Event::new(EventKind::NotificationShown)
                .with_order(&order)
                .with_delay(self.auto_dismiss),
        );
        st.presentation = Presentation::Showing {
            order,
            dismiss,
            shown_at: Instant::now(),
        };
    }

    /// Leaves `Showing` with the given outcome and starts the gap.
    fn resolve(
        self: &Arc<Self>,
        st: &mut QueueState,
        kind: EventKind,
        reason: Option<&'static str>,
    ) -> Option<Order> {
        match std::mem::replace(&mut st.presentation, Presentation::Idle) {
            Presentation::Showing { order, dismiss, .. } => {
                dismiss.cancel();

                let weak = Arc::downgrade(self);
                let gap = timer::schedule(&self.root, self.advance_gap, move |token| {
                    if let Some(queue) = weak.upgrade() {
                        queue.advance(token);
                    }
                });
                st.presentation = Presentation::Advancing { gap };

                tracing::debug!(order = %order.id, outcome = ?kind, "notification resolved");
                let mut ev = Event::new(kind).with_order(&order);
                if let Some(reason) = reason {
                    ev = ev.with_reason(reason);
                }
                self.bus.publish(ev);
                self.tx.send_replace(st.snapshot());
                Some(order)
            }
            other => {
                st.presentation = other;
                None
            }
        }
    }

    /// Auto-dismiss timer callback.
    fn expire(self: &Arc<Self>, token: &CancellationToken) {
        let mut st = self.lock();
        if token.is_cancelled() {
            return;
        }
        self.resolve(&mut st, EventKind::NotificationTimedOut, None);
    }

    /// Gap timer callback: show the next backlog entry or go idle.
    fn advance(self: &Arc<Self>, token: &CancellationToken) {
        let mut st = self.lock();
        if token.is_cancelled() || !matches!(st.presentation, Presentation::Advancing { .. }) {
            return;
        }
        match st.backlog.pop_front() {
            Some(next) => self.show(&mut st, next),
            None => st.presentation = Presentation::Idle,
        }
        self.tx.send_replace(st.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::Platform;
    use tokio::time;

    fn order(id: &str) -> Order {
        Order::new(id, Platform::Swiggy)
            .with_distance_km(3.0)
            .with_pay(50.0)
            .with_estimated_minutes(15)
    }

    fn queue() -> Arc<NotificationQueue> {
        NotificationQueue::new(&DispatchConfig::default(), Bus::new(64))
    }

    fn current_id(q: &NotificationQueue) -> Option<String> {
        q.current().map(|o| o.id.to_string())
    }

    fn backlog_ids(q: &NotificationQueue) -> Vec<String> {
        q.state().backlog.iter().map(|o| o.id.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn idle_queue_shows_immediately() {
        let q = queue();
        assert!(q.add_to_queue(order("o1")));

        let st = q.state();
        assert!(st.is_visible);
        assert_eq!(current_id(&q).as_deref(), Some("o1"));
        assert!(st.backlog.is_empty());
        assert_eq!(q.remaining(), Some(Duration::from_secs(15)));
    }

    #[tokio::test(start_paused = true)]
    async fn reject_then_next_after_gap() {
        let q = queue();
        q.add_to_queue(order("X"));
        q.add_to_queue(order("Y"));
        q.add_to_queue(order("Z"));

        assert!(q.handle_reject());
        assert!(!q.state().is_visible);

        time::sleep(Duration::from_millis(299)).await;
        assert_eq!(current_id(&q), None);

        time::sleep(Duration::from_millis(2)).await;
        assert_eq!(current_id(&q).as_deref(), Some("Y"));
        assert_eq!(backlog_ids(&q), vec!["Z"]);
    }

    #[tokio::test(start_paused = true)]
    async fn backlog_is_shown_in_arrival_order_with_gaps() {
        let q = queue();
        q.add_to_queue(order("X"));
        for id in ["A", "B", "C"] {
            q.add_to_queue(order(id));
        }

        let mut shown = Vec::new();
        q.handle_accept(&order("X")).expect("X is current");
        for _ in 0..3 {
            time::sleep(Duration::from_millis(150)).await;
            assert!(!q.state().is_visible, "gap must be invisible");
            time::sleep(Duration::from_millis(151)).await;
            let cur = q.current().expect("next shown after gap");
            shown.push(cur.id.to_string());
            assert!(q.dismiss_timeout());
        }
        assert_eq!(shown, vec!["A", "B", "C"]);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_dismiss_acts_like_reject() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let q = NotificationQueue::new(&DispatchConfig::default(), bus);
        q.add_to_queue(order("X"));
        q.add_to_queue(order("Y"));

        time::sleep(Duration::from_millis(15_001)).await;
        assert!(!q.state().is_visible);
        assert_eq!(q.handle_accept(&order("X")), None);

        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(current_id(&q).as_deref(), Some("Y"));

        let mut timed_out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::NotificationTimedOut {
                timed_out.push(ev.order_id.map(|id| id.to_string()));
            }
            assert_ne!(ev.kind, EventKind::NotificationAccepted);
        }
        assert_eq!(timed_out, vec![Some("X".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_offer_is_not_timed_out_later() {
        let q = queue();
        q.add_to_queue(order("X"));
        let accepted = q.handle_accept(&order("X"));
        assert_eq!(accepted.map(|o| o.id.to_string()).as_deref(), Some("X"));

        q.add_to_queue(order("Y"));
        time::sleep(Duration::from_millis(301)).await;
        assert_eq!(current_id(&q).as_deref(), Some("Y"));

        // X's dismiss timer would fire at 15s; Y must stay on screen until 15.3s
        time::sleep(Duration::from_millis(14_800)).await;
        assert_eq!(current_id(&q).as_deref(), Some("Y"));
    }

    #[tokio::test(start_paused = true)]
    async fn accept_of_a_stale_offer_is_ignored() {
        let q = queue();
        assert_eq!(q.handle_accept(&order("X")), None);

        q.add_to_queue(order("X"));
        assert_eq!(q.handle_accept(&order("other")), None);
        assert_eq!(current_id(&q).as_deref(), Some("X"));
        assert!(q.handle_reject());
        assert!(!q.handle_reject());
    }

    #[tokio::test(start_paused = true)]
    async fn current_id_never_repeats_in_backlog() {
        let q = queue();
        q.add_to_queue(order("X"));
        assert!(!q.add_to_queue(order("X")));

        q.add_to_queue(order("A"));
        q.add_to_queue(order("A"));
        q.add_to_queue(order("B"));
        assert_eq!(backlog_ids(&q), vec!["A", "A", "B"]);

        q.handle_reject();
        time::sleep(Duration::from_millis(301)).await;
        assert_eq!(current_id(&q).as_deref(), Some("A"));
        assert_eq!(backlog_ids(&q), vec!["B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn arrivals_during_the_gap_wait_for_it() {
        let q = queue();
        q.add_to_queue(order("X"));
        q.handle_reject();

        time::sleep(Duration::from_millis(100)).await;
        q.add_to_queue(order("Y"));
        assert_eq!(current_id(&q), None);
        assert_eq!(backlog_ids(&q), vec!["Y"]);

        time::sleep(Duration::from_millis(201)).await;
        assert_eq!(current_id(&q).as_deref(), Some("Y"));
    }

    #[tokio::test(start_paused = true)]
    async fn swipe_past_threshold_rejects() {
        let q = queue();
        assert_eq!(q.handle_swipe(SwipeGesture::new(200.0, 0.0, 300)), SwipeOutcome::Ignored);

        q.add_to_queue(order("X"));
        assert_eq!(q.handle_swipe(SwipeGesture::new(60.0, 0.0, 400)), SwipeOutcome::SnapBack);
        assert!(q.state().is_visible);

        assert_eq!(q.handle_swipe(SwipeGesture::new(-150.0, 10.0, 300)), SwipeOutcome::Dismiss);
        assert!(!q.state().is_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_counts_down() {
        let q = queue();
        assert_eq!(q.remaining(), None);
        q.add_to_queue(order("X"));
        time::sleep(Duration::from_secs(5)).await;
        let left = q.remaining().expect("still showing");
        assert!(left <= Duration::from_secs(10));
        assert!(left > Duration::from_millis(9_900));
    }

    #[tokio::test(start_paused = true)]
    async fn watch_sees_every_transition() {
        let q = queue();
        let mut rx = q.watch();
        assert!(!rx.borrow_and_update().is_visible);

        q.add_to_queue(order("X"));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_visible);

        q.handle_reject();
        assert!(!rx.borrow_and_update().is_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_cancels_pending_timers() {
        let q = queue();
        q.add_to_queue(order("X"));
        q.add_to_queue(order("Y"));
        q.dispose();
        q.dispose();

        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(q.state(), NotificationState::default());
        assert!(!q.add_to_queue(order("Z")));
    }
}
