//! # LogWriter: tracing-backed event printer
//!
//! A minimal subscriber that renders incoming [`Event`]s through `tracing`.
//! Use it for demos and debugging; install a `tracing` subscriber to see output.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO orderfeed: [emitted] order="7" platform=zomato pay=67
//! INFO orderfeed: [shown] order="7" window_ms=15000
//! INFO orderfeed: [queued] order="9" backlog=1
//! INFO orderfeed: [accepted] order="7" platform=zomato pay=67
//! INFO orderfeed: [registered] order="7" evict_ms=60000
//! INFO orderfeed: [evicted] order="7"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let order = e.order_id.as_deref().unwrap_or("-");
        let platform = e.platform.map(|p| p.as_str()).unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::EmitterStarted => tracing::info!(target: "orderfeed", "[emitter-started] source={reason}"),
            EventKind::EmitterStopped => tracing::info!(target: "orderfeed", "[emitter-stopped]"),
            EventKind::EmissionScheduled => {
                tracing::debug!(target: "orderfeed", "[scheduled] delay_ms={:?}", e.delay_ms)
            }
            EventKind::OrderEmitted => tracing::info!(
                target: "orderfeed",
                "[emitted] order={order:?} platform={platform} pay={:?}",
                e.pay
            ),
            EventKind::EmissionDropped => {
                tracing::info!(target: "orderfeed", "[dropped-while-paused] order={order:?}")
            }
            EventKind::EmitterPaused => {
                tracing::info!(target: "orderfeed", "[paused] resume_after_ms={:?}", e.delay_ms)
            }
            EventKind::EmitterResumed => tracing::info!(target: "orderfeed", "[resumed]"),
            EventKind::SourceFailed => {
                tracing::error!(target: "orderfeed", "[source-failed] err={reason}")
            }
            EventKind::NotificationQueued => tracing::info!(
                target: "orderfeed",
                "[queued] order={order:?} backlog={:?}",
                e.backlog
            ),
            EventKind::NotificationShown => tracing::info!(
                target: "orderfeed",
                "[shown] order={order:?} window_ms={:?}",
                e.delay_ms
            ),
            EventKind::NotificationAccepted => tracing::info!(
                target: "orderfeed",
                "[accepted] order={order:?} platform={platform} pay={:?}",
                e.pay
            ),
            EventKind::NotificationRejected => {
                tracing::info!(target: "orderfeed", "[rejected] order={order:?} via={reason}")
            }
            EventKind::NotificationTimedOut => {
                tracing::info!(target: "orderfeed", "[timed-out] order={order:?}")
            }
            EventKind::DetailsViewed => {
                tracing::info!(target: "orderfeed", "[details] order={order:?}")
            }
            EventKind::OrderRegistered => tracing::info!(
                target: "orderfeed",
                "[registered] order={order:?} evict_ms={:?}",
                e.delay_ms
            ),
            EventKind::OrderDuplicate => {
                tracing::debug!(target: "orderfeed", "[duplicate] order={order:?}")
            }
            EventKind::OrderRemoved => tracing::info!(target: "orderfeed", "[removed] order={order:?}"),
            EventKind::OrderEvicted => tracing::info!(target: "orderfeed", "[evicted] order={order:?}"),
            EventKind::RegistryCleared => {
                tracing::info!(target: "orderfeed", "[cleared] count={:?}", e.backlog)
            }
            EventKind::ShutdownRequested => tracing::info!(target: "orderfeed", "[shutdown-requested]"),
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "orderfeed", "[subscriber-overflow] {reason}")
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(target: "orderfeed", "[subscriber-panicked] {reason}")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
