//! Scheduling policies.
//!
//! ## Contents
//! - [`EmissionInterval`] how long the emitter waits before the next offer

mod interval;

pub use interval::EmissionInterval;
