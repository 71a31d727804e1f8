//! Runtime core: wiring, timers and lifecycle.
//!
//! The public API from this module is [`Dispatcher`] (built by
//! [`DispatcherBuilder`]), the shared [`OrderRegistry`] and [`DispatchConfig`].
//!
//! Internal modules:
//! - [`dispatcher`]: owns the pipeline and exposes driver actions;
//! - [`registry`]: live orders with per-entry eviction timers;
//! - [`timer`]: cancellable one-shot timers shared by every component;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod dispatcher;
mod registry;
mod shutdown;
pub(crate) mod timer;

pub use builder::DispatcherBuilder;
pub use config::DispatchConfig;
pub use dispatcher::Dispatcher;
pub use registry::OrderRegistry;
pub use shutdown::{ShutdownSignal, wait_for_shutdown_signal};
