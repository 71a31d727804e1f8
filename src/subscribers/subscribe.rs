//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into the
//! feed (analytics, earnings, UI adapters). Each subscriber is driven by a dedicated
//! worker loop fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they do **not** block the publisher nor other subscribers.
//! - Each subscriber declares its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. On overflow, events for that subscriber are **dropped**.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use orderfeed::{Event, EventKind, Subscribe};
//!
//! struct TimeoutAudit;
//!
//! #[async_trait]
//! impl Subscribe for TimeoutAudit {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::NotificationTimedOut {
//!             // record a missed offer...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "timeout-audit" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated worker task. Implementations should avoid
/// blocking the async runtime.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
