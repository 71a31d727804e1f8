//! # Built-in subscribers
//!
//! - [`EarningsLedger`]: mock earnings and acceptance tallies.
//! - [`LogWriter`]: renders events through `tracing` (demo/debug, `logging` feature).

mod earnings;
#[cfg(feature = "logging")]
mod log;

pub use earnings::{EarningsLedger, EarningsSnapshot};
#[cfg(feature = "logging")]
pub use log::LogWriter;
