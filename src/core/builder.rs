use std::sync::Arc;

use super::dispatcher::Dispatcher;
use crate::{
    core::DispatchConfig,
    events::Bus,
    orders::{MockSource, SourceRef},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Dispatcher`] with optional collaborators.
pub struct DispatcherBuilder {
    cfg: DispatchConfig,
    source: Option<SourceRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl DispatcherBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: DispatchConfig) -> Self {
        Self {
            cfg,
            source: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets the order source used by random emission.
    ///
    /// Defaults to the mock catalog ([`MockSource::new`]).
    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive runtime events (offers, driver actions, evictions)
    /// through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the dispatcher.
    ///
    /// Initializes the event bus, subscriber workers, emitter, notification queue
    /// and registry. Must be called inside a tokio runtime. Emission does not start
    /// until [`Dispatcher::start`] or [`Dispatcher::run`].
    pub fn build(self) -> Arc<Dispatcher> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        let source = self
            .source
            .unwrap_or_else(|| Arc::new(MockSource::new()));

        Arc::new(Dispatcher::new_internal(self.cfg, bus, source, subs))
    }
}
