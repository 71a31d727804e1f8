//! Feed events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Emitter`, `NotificationQueue`, `OrderRegistry`, `Dispatcher`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the dispatcher listener, which fans out to the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
