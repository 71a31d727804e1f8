//! # EarningsLedger: mock earnings from accepted offers
//!
//! Tallies accepted offers per platform from `NotificationAccepted` events and
//! counts the offers the driver let slip (rejected or timed out). The snapshot
//! feeds the dashboard cards (totals, per-platform share).

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::Serialize;

use crate::events::{Event, EventKind};
use crate::orders::Platform;
use crate::subscribers::Subscribe;

/// Point-in-time copy of the ledger.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsSnapshot {
    /// Accepted offers.
    pub accepted: u32,
    /// Offers rejected by the driver (button or swipe).
    pub rejected: u32,
    /// Offers that expired on screen.
    pub timed_out: u32,
    /// Sum of accepted pay.
    pub total: f64,
    /// Accepted pay per platform.
    pub by_platform: BTreeMap<Platform, f64>,
}

impl EarningsSnapshot {
    /// Share of `platform` in the total, in percent (`0.0` when nothing was earned).
    pub fn share(&self, platform: Platform) -> f64 {
        if self.total <= 0.0 {
            return 0.0;
        }
        self.by_platform.get(&platform).copied().unwrap_or(0.0) / self.total * 100.0
    }

    /// Fraction of resolved offers that were accepted.
    pub fn acceptance_rate(&self) -> f64 {
        let resolved = self.accepted + self.rejected + self.timed_out;
        if resolved == 0 {
            0.0
        } else {
            f64::from(self.accepted) / f64::from(resolved)
        }
    }
}

/// Earnings tracking subscriber.
#[derive(Default)]
pub struct EarningsLedger {
    state: Mutex<EarningsSnapshot>,
}

impl EarningsLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current tallies.
    pub fn snapshot(&self) -> EarningsSnapshot {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, ev: &Event) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match ev.kind {
            EventKind::NotificationAccepted => {
                let pay = ev.pay.unwrap_or(0.0);
                state.accepted += 1;
                state.total += pay;
                if let Some(platform) = ev.platform {
                    *state.by_platform.entry(platform).or_insert(0.0) += pay;
                }
            }
            EventKind::NotificationRejected => state.rejected += 1,
            EventKind::NotificationTimedOut => state.timed_out += 1,
            _ => {}
        }
    }
}

#[async_trait]
impl Subscribe for EarningsLedger {
    async fn on_event(&self, ev: &Event) {
        if ev.is_notification_outcome() {
            self.record(ev);
        }
    }

    fn name(&self) -> &'static str {
        "EarningsLedger"
    }
}
