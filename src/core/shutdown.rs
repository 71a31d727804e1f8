//! # Cross-platform OS signal handling.
//!
//! Provides [`wait_for_shutdown_signal`], an async helper that completes when the
//! process receives a termination signal and reports which one arrived.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use crate::error::FeedError;

/// Termination signal observed by [`wait_for_shutdown_signal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
    Quit,
}

impl ShutdownSignal {
    /// Conventional signal name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownSignal::Interrupt => "SIGINT",
            ShutdownSignal::Terminate => "SIGTERM",
            ShutdownSignal::Quit => "SIGQUIT",
        }
    }
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
/// Returns [`FeedError::Signal`] if registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> Result<ShutdownSignal, FeedError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let sig = tokio::select! {
        _ = sigint.recv()  => ShutdownSignal::Interrupt,
        _ = sigterm.recv() => ShutdownSignal::Terminate,
        _ = sigquit.recv() => ShutdownSignal::Quit,
    };
    Ok(sig)
}

/// Waits for a termination signal.
///
/// Each call creates an independent Ctrl-C listener.
/// Returns [`FeedError::Signal`] if registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> Result<ShutdownSignal, FeedError> {
    tokio::signal::ctrl_c().await?;
    Ok(ShutdownSignal::Interrupt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_names() {
        assert_eq!(ShutdownSignal::Interrupt.as_str(), "SIGINT");
        assert_eq!(ShutdownSignal::Terminate.as_str(), "SIGTERM");
        assert_eq!(ShutdownSignal::Quit.as_str(), "SIGQUIT");
    }
}
