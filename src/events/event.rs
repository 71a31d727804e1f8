//! # Runtime events emitted by the emitter, notification queue and registry.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Emitter events**: scheduling, pause/resume, emitted or dropped offers
//! - **Notification events**: queueing and the accept/reject/timeout outcome of a shown offer
//! - **Registry events**: insertion, removal, eviction of live orders
//! - **Infrastructure events**: subscriber health, shutdown
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the order
//! id, platform and pay, reasons and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use orderfeed::{Event, EventKind, Order, Platform};
//!
//! let order = Order::new("o1", Platform::Swiggy).with_distance_km(3.0).with_pay(50.0);
//! let ev = Event::new(EventKind::NotificationAccepted).with_order(&order);
//!
//! assert_eq!(ev.kind, EventKind::NotificationAccepted);
//! assert_eq!(ev.order_id.as_deref(), Some("o1"));
//! assert_eq!(ev.pay, Some(50.0));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::orders::{Order, Platform};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic info
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: subscriber name and cause ("full", "closed")
    SubscriberOverflow,

    // === Emitter events ===
    /// Random emission loop started.
    ///
    /// Sets:
    /// - `reason`: source name
    EmitterStarted,

    /// Random emission loop stopped (explicitly, by dispose, or after a source failure).
    EmitterStopped,

    /// Next emission scheduled.
    ///
    /// Sets:
    /// - `delay_ms`: delay before the tick
    EmissionScheduled,

    /// An offer was handed to emitter listeners.
    ///
    /// Sets:
    /// - `order_id`, `platform`, `pay`
    OrderEmitted,

    /// A tick happened while paused; the offer was discarded.
    ///
    /// Sets:
    /// - `order_id`, `platform`, `pay`
    EmissionDropped,

    /// Emission paused.
    ///
    /// Sets:
    /// - `delay_ms`: auto-resume delay (only for timed pauses)
    EmitterPaused,

    /// Emission resumed.
    EmitterResumed,

    /// The order source failed or produced a malformed order; emission stopped for good.
    ///
    /// Sets:
    /// - `reason`: error message
    SourceFailed,

    // === Notification events ===
    /// Offer appended to the backlog behind the current notification.
    ///
    /// Sets:
    /// - `order_id`, `platform`, `pay`
    /// - `backlog`: backlog length after the append
    NotificationQueued,

    /// Offer became the current notification.
    ///
    /// Sets:
    /// - `order_id`, `platform`, `pay`
    /// - `delay_ms`: auto-dismiss window
    NotificationShown,

    /// Driver accepted the current notification.
    ///
    /// Sets:
    /// - `order_id`, `platform`, `pay`
    NotificationAccepted,

    /// Driver rejected (or swiped away) the current notification.
    ///
    /// Sets:
    /// - `order_id`, `platform`, `pay`
    /// - `reason`: "button" or "swipe"
    NotificationRejected,

    /// Current notification expired without a driver action.
    ///
    /// Sets:
    /// - `order_id`, `platform`, `pay`
    NotificationTimedOut,

    /// Driver opened the details of an order.
    ///
    /// Sets:
    /// - `order_id`, `platform`, `pay`
    DetailsViewed,

    // === Registry events ===
    /// Order inserted into the registry; eviction timer armed.
    ///
    /// Sets:
    /// - `order_id`, `platform`, `pay`
    /// - `delay_ms`: eviction window
    OrderRegistered,

    /// Insert ignored because the id is already live.
    ///
    /// Sets:
    /// - `order_id`
    OrderDuplicate,

    /// Order removed by an explicit call.
    ///
    /// Sets:
    /// - `order_id`, `platform`, `pay`
    OrderRemoved,

    /// Order removed by its eviction timer.
    ///
    /// Sets:
    /// - `order_id`, `platform`, `pay`
    OrderEvicted,

    /// All orders removed.
    ///
    /// Sets:
    /// - `backlog`: number of removed orders
    RegistryCleared,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed or explicit call).
    ShutdownRequested,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Order the event is about, if any.
    pub order_id: Option<Arc<str>>,
    /// Platform of that order.
    pub platform: Option<Platform>,
    /// Payout of that order.
    pub pay: Option<f64>,
    /// Delay or window in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Backlog length / removed count, depending on the kind.
    pub backlog: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            order_id: None,
            platform: None,
            pay: None,
            delay_ms: None,
            backlog: None,
            reason: None,
        }
    }

    /// Attaches id, platform and pay of an order.
    #[inline]
    pub fn with_order(mut self, order: &Order) -> Self {
        self.order_id = Some(Arc::clone(&order.id));
        self.platform = Some(order.platform);
        self.pay = Some(order.pay_amount);
        self
    }

    /// Attaches only an order id.
    #[inline]
    pub fn with_order_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.order_id = Some(id.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a backlog length or count.
    #[inline]
    pub fn with_backlog(mut self, n: usize) -> Self {
        self.backlog = Some(n.min(u32::MAX as usize) as u32);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// True for the three ways a shown notification can end.
    #[inline]
    pub fn is_notification_outcome(&self) -> bool {
        matches!(
            self.kind,
            EventKind::NotificationAccepted
                | EventKind::NotificationRejected
                | EventKind::NotificationTimedOut
        )
    }
}
