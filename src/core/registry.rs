//! # Active order registry - de-duplicated live orders with eviction timers.
//!
//! Holds the orders the driver has accepted. Each entry owns its own eviction
//! timer; when it fires the order leaves the list.
//!
//! ## Architecture
//! ```text
//! add_order(o)
//!     ├─► id already live → OrderDuplicate (no-op, timer untouched)
//!     └─► insert entry { order, evict = timer(60s) } → OrderRegistered
//!
//! remove_order(id) ──► entry.evict.cancel() → OrderRemoved
//! clear_orders()   ──► cancel every timer   → RegistryCleared
//! evict timer      ──► token live? remove   → OrderEvicted
//! ```
//!
//! ## Rules
//! - First writer wins: one entry and one active timer per id.
//! - Tokens are cancelled under the registry lock; an eviction that fires for a
//!   removed or replaced entry sees its own token cancelled and does nothing.
//! - Every mutation publishes the new order list (newest first) on the watch channel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::core::timer;
use crate::events::{Bus, Event, EventKind};
use crate::orders::Order;

/// Live entry of the registry.
struct Entry {
    order: Order,
    /// Eviction timer of this entry.
    evict: CancellationToken,
}

struct RegistryState {
    entries: HashMap<Arc<str>, Entry>,
    /// Ids by insertion, newest first.
    newest_first: Vec<Arc<str>>,
    disposed: bool,
}

impl RegistryState {
    fn orders(&self) -> Vec<Order> {
        self.newest_first
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(|e| e.order.clone())
            .collect()
    }

    fn take(&mut self, id: &str) -> Option<Entry> {
        let entry = self.entries.remove(id)?;
        self.newest_first.retain(|live| &**live != id);
        Some(entry)
    }
}

/// Shared registry of accepted, still-live orders.
pub struct OrderRegistry {
    state: Mutex<RegistryState>,
    tx: watch::Sender<Vec<Order>>,
    bus: Bus,
    root: CancellationToken,
    eviction: Duration,
}

impl OrderRegistry {
    /// Creates an empty registry whose entries expire after `eviction`.
    pub fn new(bus: Bus, eviction: Duration) -> Arc<Self> {
        let (tx, _rx) = watch::channel(Vec::new());
        Arc::new(Self {
            state: Mutex::new(RegistryState {
                entries: HashMap::new(),
                newest_first: Vec::new(),
                disposed: false,
            }),
            tx,
            bus,
            root: CancellationToken::new(),
            eviction,
        })
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_orders(&self, st: &RegistryState) {
        self.tx.send_replace(st.orders());
    }

    /// Inserts `order` unless its id is already live and arms its eviction timer.
    ///
    /// Returns `true` if inserted.
    pub fn add_order(self: &Arc<Self>, order: Order) -> bool {
        let mut st = self.lock();
        if st.disposed {
            return false;
        }
        if st.entries.contains_key(&order.id) {
            tracing::debug!(order = %order.id, "order already live; insert ignored");
            self.bus
                .publish(Event::new(EventKind::OrderDuplicate).with_order_id(Arc::clone(&order.id)));
            return false;
        }

        let weak = Arc::downgrade(self);
        let id = Arc::clone(&order.id);
        let evict = timer::schedule(&self.root, self.eviction, move |token| {
            if let Some(registry) = weak.upgrade() {
                registry.evict(&id, token);
            }
        });

        self.bus.publish(
            Event::new(EventKind::OrderRegistered)
                .with_order(&order)
                .with_delay(self.eviction),
        );
        st.newest_first.insert(0, Arc::clone(&order.id));
        st.entries.insert(Arc::clone(&order.id), Entry { order, evict });
        self.publish_orders(&st);
        true
    }

    /// Removes the order with `id` and cancels its timer. No-op for unknown ids.
    pub fn remove_order(&self, id: &str) -> Option<Order> {
        let mut st = self.lock();
        let entry = st.take(id)?;
        entry.evict.cancel();

        tracing::debug!(order = %id, "order removed");
        self.bus
            .publish(Event::new(EventKind::OrderRemoved).with_order(&entry.order));
        self.publish_orders(&st);
        Some(entry.order)
    }

    /// Removes every order and cancels every timer. Returns the number removed.
    pub fn clear_orders(&self) -> usize {
        let mut st = self.lock();
        let removed = st.entries.len();
        for (_, entry) in st.entries.drain() {
            entry.evict.cancel();
        }
        st.newest_first.clear();

        self.bus
            .publish(Event::new(EventKind::RegistryCleared).with_backlog(removed));
        self.publish_orders(&st);
        removed
    }

    /// Eviction timer callback.
    fn evict(&self, id: &str, token: &CancellationToken) {
        let mut st = self.lock();
        if token.is_cancelled() {
            return;
        }
        if let Some(entry) = st.take(id) {
            tracing::debug!(order = %id, "order evicted");
            self.bus
                .publish(Event::new(EventKind::OrderEvicted).with_order(&entry.order));
            self.publish_orders(&st);
        }
    }

    /// True if an order with `id` is live.
    pub fn contains(&self, id: &str) -> bool {
        self.lock().entries.contains_key(id)
    }

    /// Clone of the live order with `id`.
    pub fn get(&self, id: &str) -> Option<Order> {
        self.lock().entries.get(id).map(|e| e.order.clone())
    }

    /// Live orders, newest insertion first.
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders()
    }

    /// Number of live orders.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// True if no order is live.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Receiver updated on every mutation.
    pub fn watch(&self) -> watch::Receiver<Vec<Order>> {
        self.tx.subscribe()
    }

    /// Cancels every timer, drops all entries and ignores further inserts. Idempotent.
    pub fn dispose(&self) {
        let mut st = self.lock();
        if st.disposed {
            return;
        }
        st.disposed = true;
        self.root.cancel();
        st.entries.clear();
        st.newest_first.clear();
        self.publish_orders(&st);
    }
}
