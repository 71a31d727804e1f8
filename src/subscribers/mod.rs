//! # Event subscribers for the order feed.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in implementations for events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Emitter / Queue / Registry ── publish(Event) ──► Bus ──► dispatcher listener
//!                                                               │
//!                                                        SubscriberSet::emit
//!                                                   ┌───────────┼───────────┐
//!                                                   ▼           ▼           ▼
//!                                              LogWriter  EarningsLedger  Custom
//! ```

mod embedded;
mod set;
mod subscribe;

pub use embedded::{EarningsLedger, EarningsSnapshot};
#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
