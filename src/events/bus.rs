//! # Event bus for broadcasting feed events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. The emitter,
//! the notification queue and the registry publish to it; the dispatcher's
//! listener forwards everything to the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! Publishers (many):                 Listener (one):
//!   Emitter  ──┐
//!   Queue    ──┼──────► Bus ───────► dispatcher listener ────► SubscriberSet
//!   Registry ──┘  (broadcast chan)
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event is dropped.
//! - A single ring buffer of `capacity` events is shared by all receivers.
//! - Slow receivers get `RecvError::Lagged(n)` and skip the `n` oldest items.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for feed events.
///
/// Cheap to clone (internally an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers (fire-and-forget).
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_see_events_published_after_subscribe() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::OrderEmitted));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::EmitterPaused));

        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::EmitterPaused);
    }
}
