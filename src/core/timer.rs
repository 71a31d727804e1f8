//! # Cancellable one-shot timers.
//!
//! Every deferred action in the feed (next emission, auto-dismiss, inter-notification
//! gap, eviction, timed resume) is a spawned task racing `tokio::time::sleep`
//! against a [`CancellationToken`].
//!
//! ```text
//! schedule(parent, delay, f)
//!     └─► token = parent.child_token()
//!         spawn: select! {
//!             token.cancelled() → exit (f never runs)
//!             sleep(delay)      → f(&token)
//!         }
//! ```
//!
//! ## Rules
//! - Cancelling the parent (component dispose) cancels every timer below it.
//! - `f` receives its own token. Owners cancel tokens **under their state lock**
//!   and `f` re-checks `token.is_cancelled()` under the same lock, so a timer that
//!   lost the race against a cancel is a no-op.
//! - Must be called from within a tokio runtime.

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

/// Schedules `f` to run once after `delay` unless the returned token is cancelled first.
pub(crate) fn schedule<F>(parent: &CancellationToken, delay: Duration, f: F) -> CancellationToken
where
    F: FnOnce(&CancellationToken) + Send + 'static,
{
    let token = parent.child_token();
    let timer_token = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = timer_token.cancelled() => {}
            _ = time::sleep(delay) => f(&timer_token),
        }
    });

    token
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let root = CancellationToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let _token = schedule(&root, Duration::from_millis(300), move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        time::sleep(Duration::from_millis(299)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        time::sleep(Duration::from_millis(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let root = CancellationToken::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        let own = schedule(&root, Duration::from_secs(1), move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        let h = Arc::clone(&hits);
        let _child = schedule(&root, Duration::from_secs(1), move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        own.cancel();
        root.cancel();
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
