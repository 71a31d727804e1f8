//! # orderfeed
//!
//! **orderfeed** is the order notification engine of a delivery-driver aggregator.
//!
//! It simulates delivery offers arriving from several platforms (Swiggy, Zomato,
//! EatSure), presents them to the driver one at a time with a countdown, lets the
//! driver accept, reject or swipe them away, and keeps the accepted orders in a
//! shared live list where each one expires after a fixed window.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────────────┐
//!     │     OrderSource      │  MockSource / FnSource / custom
//!     └──────────┬───────────┘
//!                ▼  next_candidate_order()   (every 10–15 s)
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Dispatcher (runtime owner)                                       │
//! │                                                                   │
//! │   Emitter ──listener──► NotificationQueue ──accept──► OrderRegistry│
//! │  (pause/resume)        (one card + backlog,        (de-duplicated, │
//! │                         15 s auto-dismiss,          60 s eviction) │
//! │                         300 ms gap)                                │
//! └──────┬──────────────────────────┬─────────────────────────┬───────┘
//!        │ Publishes                │ Publishes               │ Publishes
//!        │ - OrderEmitted           │ - NotificationShown     │ - OrderRegistered
//!        │ - EmissionDropped        │ - NotificationAccepted  │ - OrderEvicted
//!        │ - SourceFailed           │ - NotificationTimedOut  │ - OrderRemoved
//!        ▼                          ▼                         ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │              (capacity: DispatchConfig::bus_capacity)             │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       │    (in Dispatcher)     │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                            (per-sub queues)
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                   LogWriter  EarningsLedger  custom
//! ```
//!
//! ### Offer lifecycle
//! ```text
//! Source ──► Emitter ──► NotificationQueue
//!                          ├─ Idle      → shown immediately
//!                          └─ otherwise → backlog (FIFO)
//!
//! shown ──► accept  ──► OrderRegistry::add_order ──► evicted after 60 s unless removed
//!       ├─► reject / swipe ──► discarded
//!       └─► 15 s elapsed   ──► timed out (like reject)
//!       then 300 ms gap ──► next backlog entry
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                               |
//! |-------------------|----------------------------------------------------------|--------------------------------------------------|
//! | **Orders**        | Offer record, sources, list sorting and summaries.       | [`Order`], [`OrderSource`], [`OrderSort`]        |
//! | **Notifications** | Randomized emission and single-flight presentation.      | [`Emitter`], [`NotificationQueue`]               |
//! | **Live list**     | De-duplicated accepted orders with eviction.             | [`OrderRegistry`]                                |
//! | **Runtime**       | Wiring, driver actions, signals and teardown.            | [`Dispatcher`], [`DispatcherBuilder`]            |
//! | **Subscriber API**| Hook into runtime events (logging, earnings, analytics). | [`Subscribe`], [`EarningsLedger`]                |
//! | **Errors**        | Typed errors with stable labels.                         | [`FeedError`]                                    |
//! | **Configuration** | Timings and bus sizing.                                  | [`DispatchConfig`], [`EmissionInterval`]         |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in `LogWriter` _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use orderfeed::{DispatchConfig, DispatcherBuilder, MockSource, Order, Platform};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), orderfeed::FeedError> {
//!     let dispatcher = DispatcherBuilder::new(DispatchConfig::default())
//!         .with_source(Arc::new(MockSource::new()))
//!         .build();
//!
//!     let offer = Order::new("o1", Platform::Swiggy).with_distance_km(3.0).with_pay(50.0);
//!     dispatcher.offer(offer.clone());
//!     assert!(dispatcher.notification_state().is_visible);
//!
//!     assert!(dispatcher.accept(&offer));
//!     assert!(dispatcher.contains("o1"));
//!
//!     dispatcher.shutdown().await
//! }
//! ```
mod core;
mod error;
mod events;
mod notify;
mod orders;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    DispatchConfig, Dispatcher, DispatcherBuilder, OrderRegistry, ShutdownSignal,
    wait_for_shutdown_signal,
};
pub use error::FeedError;
pub use events::{Bus, Event, EventKind};
pub use notify::{
    DISMISS_DISTANCE_PX, Emitter, FLING_MIN_DISTANCE_PX, FLING_VELOCITY_PX_PER_MS, Listener,
    NotificationQueue, NotificationState, Subscription, SwipeGesture, SwipeOutcome,
};
pub use orders::{
    FnSource, ListSummary, MockSource, Order, OrderSort, OrderSource, Platform, SourceRef, sorted,
    summary,
};
pub use policies::EmissionInterval;
pub use subscribers::{EarningsLedger, EarningsSnapshot, Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
