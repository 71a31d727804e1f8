//! Error types used by the order feed.
//!
//! The core is in-memory bookkeeping, so the taxonomy is narrow:
//!
//! - [`FeedError::SourceFailed`] / [`FeedError::MalformedOrder`] - the injected
//!   order source misbehaved. Both are fatal configuration errors: the emitter
//!   stops and the error propagates to whoever drives it.
//! - [`FeedError::Disposed`] - a lifecycle call on a torn-down component.
//! - [`FeedError::EmissionAborted`] - the emission task was cancelled by the runtime.
//! - [`FeedError::Signal`] - OS signal registration failed in `Dispatcher::run`.
//!
//! Redundant calls (duplicate registry insert, removing an unknown id, releasing
//! an already released timer) are not errors; they are silent no-ops.

use thiserror::Error;

/// # Errors produced by the order feed.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FeedError {
    /// The order source could not produce a candidate order.
    #[error("order source failed: {error}")]
    SourceFailed {
        /// The underlying error message.
        error: String,
    },

    /// The order source produced an order that violates [`Order`](crate::Order) invariants.
    #[error("malformed order {id:?}: {reason}")]
    MalformedOrder {
        /// Id of the offending order (may be empty).
        id: String,
        /// Which invariant was violated.
        reason: &'static str,
    },

    /// The component was disposed and can no longer be started.
    #[error("component disposed")]
    Disposed,

    /// The emission task ended without returning (runtime shut down or task aborted).
    #[error("emission aborted: {reason}")]
    EmissionAborted {
        /// What the runtime reported.
        reason: String,
    },

    /// Registering OS signal handlers failed.
    #[error("signal registration failed: {0}")]
    Signal(#[from] std::io::Error),
}

impl FeedError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use orderfeed::FeedError;
    ///
    /// let err = FeedError::SourceFailed { error: "catalog empty".into() };
    /// assert_eq!(err.as_label(), "source_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FeedError::SourceFailed { .. } => "source_failed",
            FeedError::MalformedOrder { .. } => "malformed_order",
            FeedError::Disposed => "disposed",
            FeedError::EmissionAborted { .. } => "emission_aborted",
            FeedError::Signal(_) => "signal_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            FeedError::SourceFailed { error } => format!("source: {error}"),
            FeedError::MalformedOrder { id, reason } => format!("order {id:?}: {reason}"),
            FeedError::Disposed => "component disposed".to_string(),
            FeedError::EmissionAborted { reason } => format!("emission: {reason}"),
            FeedError::Signal(e) => format!("signal: {e}"),
        }
    }

    /// Indicates whether the error comes from a misconfigured order source.
    ///
    /// Such errors stop the emitter permanently; nothing retries them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FeedError::SourceFailed { .. } | FeedError::MalformedOrder { .. }
        )
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let malformed = FeedError::MalformedOrder {
            id: "o1".into(),
            reason: "distance must be positive",
        };
        assert_eq!(malformed.as_label(), "malformed_order");
        assert_eq!(FeedError::Disposed.as_label(), "disposed");
        assert!(malformed.as_message().contains("distance"));
    }

    #[test]
    fn only_source_errors_are_fatal() {
        assert!(FeedError::SourceFailed { error: "x".into() }.is_fatal());
        assert!(!FeedError::Disposed.is_fatal());
        let aborted = FeedError::EmissionAborted { reason: "task cancelled".into() };
        assert!(!aborted.is_fatal());
        assert_eq!(aborted.as_label(), "emission_aborted");
    }

    #[test]
    fn panic_payloads_become_text() {
        let payload = std::panic::catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(&*payload), "boom");
        let payload = std::panic::catch_unwind(|| panic!("bad {}", 7)).unwrap_err();
        assert_eq!(panic_message(&*payload), "bad 7");
    }
}
