//! # Emitter: randomized offer generator and listener bus.
//!
//! The [`Emitter`] pulls candidate orders from an [`OrderSource`] on a random
//! schedule and hands each one to every registered listener.
//!
//! ## Architecture
//! ```text
//! start_random_notifications(source)
//!     └─► cancel previous schedule (if any)
//!         spawn loop {
//!           ├─► delay = EmissionInterval::next()        (10s..15s)
//!           ├─► publish EmissionScheduled
//!           ├─► sleep(delay)  (cancellable)
//!           ├─► order = source.next_candidate_order()?  ── Err/panic ─► fail(), exit
//!           ├─► order.validate()?                       ── Err ─► fail(), exit
//!           └─► deliver(order)
//!                 ├─ paused → EmissionDropped (order discarded)
//!                 └─ else   → OrderEmitted, listener(&order) for each listener
//!                                 └─ panic → SubscriberPanicked, next listener
//!         }
//!
//! fail(): keep error ─► failed() wakes ─► join() returns the error
//! ```
//!
//! ## Rules
//! - At most **one** pending emission at a time; restarting cancels the old loop first.
//! - Pausing suppresses delivery, not scheduling: a tick during a pause is dropped, never queued.
//! - Listeners are called **outside** the state lock, so they may subscribe,
//!   unsubscribe or pause from inside the callback.
//! - A panicking listener is reported and skipped; it never stops the loop.
//! - A failing source is fatal: the loop exits, [`Emitter::failed`] completes and
//!   the error is returned by [`Emitter::join`]. Stopping or restarting is not a failure.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::timer;
use crate::error::{FeedError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::orders::{Order, SourceRef};
use crate::policies::EmissionInterval;

/// Callback invoked with every emitted order.
pub type Listener = Arc<dyn Fn(&Order) + Send + Sync>;

/// Handle returned by [`Emitter::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[must_use = "dropping a Subscription does not unsubscribe; keep it to unsubscribe later"]
pub struct Subscription {
    id: u64,
    emitter: Weak<Emitter>,
}

impl Subscription {
    /// Listener id, unique per emitter.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Removes exactly this listener. Other listeners are unaffected.
    ///
    /// Returns `false` if the listener was already gone (emitter disposed or dropped).
    pub fn unsubscribe(self) -> bool {
        match self.emitter.upgrade() {
            Some(emitter) => emitter.remove_listener(self.id),
            None => false,
        }
    }
}

/// Mutable emitter state (guarded by one mutex).
struct EmitterState {
    listeners: Vec<(u64, Listener)>,
    next_listener: u64,
    paused: bool,
    /// Token of the running emission loop.
    schedule: Option<CancellationToken>,
    /// Join handle of the latest emission loop.
    handle: Option<JoinHandle<()>>,
    /// Fatal source error not yet collected by `join`.
    failure: Option<FeedError>,
    /// Pending auto-resume of `pause_for_duration`.
    resume_timer: Option<CancellationToken>,
    disposed: bool,
}

/// Randomized order emitter with pause/resume and listener management.
pub struct Emitter {
    state: Mutex<EmitterState>,
    bus: Bus,
    interval: EmissionInterval,
    root: CancellationToken,
    /// `true` while an uncollected failure is stored.
    failed: watch::Sender<bool>,
}

impl Emitter {
    /// Creates a new emitter.
    pub fn new(bus: Bus, interval: EmissionInterval) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(EmitterState {
                listeners: Vec::new(),
                next_listener: 0,
                paused: false,
                schedule: None,
                handle: None,
                failure: None,
                resume_timer: None,
                disposed: false,
            }),
            bus,
            interval,
            root: CancellationToken::new(),
            failed: watch::Sender::new(false),
        })
    }

    fn lock(&self) -> MutexGuard<'_, EmitterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a listener and returns its subscription handle.
    pub fn subscribe<F>(self: &Arc<Self>, listener: F) -> Subscription
    where
        F: Fn(&Order) + Send + Sync + 'static,
    {
        let mut st = self.lock();
        let id = st.next_listener;
        st.next_listener += 1;
        if !st.disposed {
            st.listeners.push((id, Arc::new(listener)));
        }
        Subscription {
            id,
            emitter: Arc::downgrade(self),
        }
    }

    fn remove_listener(&self, id: u64) -> bool {
        let mut st = self.lock();
        let before = st.listeners.len();
        st.listeners.retain(|(lid, _)| *lid != id);
        st.listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Delivers `order` to all listeners unless paused.
    ///
    /// Returns `true` if the order was delivered, `false` if it was dropped.
    pub fn emit(&self, order: Order) -> bool {
        self.deliver(order, None)
    }

    /// Shared path of [`emit`](Self::emit) and the emission loop.
    ///
    /// `schedule` is the loop's token; a tick from a superseded loop is ignored.
    fn deliver(&self, order: Order, schedule: Option<&CancellationToken>) -> bool {
        let listeners: Vec<Listener> = {
            let st = self.lock();
            if st.disposed || schedule.is_some_and(CancellationToken::is_cancelled) {
                return false;
            }
            if st.paused {
                drop(st);
                tracing::debug!(order = %order.id, "emission dropped while paused");
                self.bus
                    .publish(Event::new(EventKind::EmissionDropped).with_order(&order));
                return false;
            }
            st.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        self.bus
            .publish(Event::new(EventKind::OrderEmitted).with_order(&order));
        for listener in listeners {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener(&order))) {
                let info = panic_message(&*payload);
                tracing::warn!(order = %order.id, %info, "emitter listener panicked");
                self.bus
                    .publish(Event::subscriber_panicked("emitter-listener", info));
            }
        }
        true
    }

    /// Starts the randomized emission loop, replacing any running one.
    ///
    /// Returns [`FeedError::Disposed`] after [`dispose`](Self::dispose).
    pub fn start_random_notifications(self: &Arc<Self>, source: SourceRef) -> Result<(), FeedError> {
        let mut st = self.lock();
        if st.disposed {
            return Err(FeedError::Disposed);
        }
        if let Some(prev) = st.schedule.take() {
            prev.cancel();
        }

        let token = self.root.child_token();
        st.schedule = Some(token.clone());
        let source_name = source.name().to_string();
        // A superseded loop exits at its next cancellation check; its handle is detached.
        st.handle = Some(tokio::spawn(run_schedule(
            Arc::downgrade(self),
            source,
            token,
            self.interval,
        )));
        drop(st);

        tracing::debug!(source = %source_name, "random notifications started");
        self.bus
            .publish(Event::new(EventKind::EmitterStarted).with_reason(source_name));
        Ok(())
    }

    /// Cancels the pending emission. No-op when nothing is scheduled.
    pub fn stop_random_notifications(&self) {
        let stopped = {
            let mut st = self.lock();
            st.schedule.take().map(|t| t.cancel()).is_some()
        };
        if stopped {
            self.bus.publish(Event::new(EventKind::EmitterStopped));
        }
    }

    /// True while an emission loop is scheduled.
    pub fn is_running(&self) -> bool {
        self.lock().schedule.is_some()
    }

    /// Suppresses delivery until [`resume`](Self::resume). Cancels a pending timed resume.
    pub fn pause(&self) {
        let mut st = self.lock();
        if let Some(t) = st.resume_timer.take() {
            t.cancel();
        }
        st.paused = true;
        drop(st);
        self.bus.publish(Event::new(EventKind::EmitterPaused));
    }

    /// Re-enables delivery. Cancels a pending timed resume.
    pub fn resume(&self) {
        let mut st = self.lock();
        if let Some(t) = st.resume_timer.take() {
            t.cancel();
        }
        let was_paused = std::mem::replace(&mut st.paused, false);
        drop(st);
        if was_paused {
            self.bus.publish(Event::new(EventKind::EmitterResumed));
        }
    }

    /// Pauses now and resumes automatically after `duration`.
    ///
    /// A later `pause`, `resume` or `pause_for_duration` supersedes the pending resume.
    pub fn pause_for_duration(self: &Arc<Self>, duration: Duration) {
        let mut st = self.lock();
        if st.disposed {
            return;
        }
        if let Some(t) = st.resume_timer.take() {
            t.cancel();
        }
        st.paused = true;

        let weak = Arc::downgrade(self);
        st.resume_timer = Some(timer::schedule(&self.root, duration, move |token| {
            if let Some(emitter) = weak.upgrade() {
                emitter.timed_resume(token);
            }
        }));
        drop(st);

        self.bus
            .publish(Event::new(EventKind::EmitterPaused).with_delay(duration));
    }

    fn timed_resume(&self, token: &CancellationToken) {
        let mut st = self.lock();
        if token.is_cancelled() {
            return;
        }
        st.resume_timer = None;
        st.paused = false;
        drop(st);
        self.bus.publish(Event::new(EventKind::EmitterResumed));
    }

    /// True while delivery is suppressed.
    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    /// Records a fatal source failure for the loop owning `token`.
    ///
    /// A loop that was already stopped or replaced only logs the error.
    fn fail(&self, token: &CancellationToken, err: FeedError) {
        let mut st = self.lock();
        if token.is_cancelled() {
            drop(st);
            tracing::debug!(error = %err, "source failed after its loop was stopped");
            return;
        }
        token.cancel();
        st.schedule = None;
        let reason = err.to_string();
        tracing::error!(error = %err, label = err.as_label(), "order source failed; emission stopped");
        if st.failure.is_none() {
            st.failure = Some(err);
        }
        drop(st);

        self.failed.send_replace(true);
        self.bus
            .publish(Event::new(EventKind::SourceFailed).with_reason(reason));
        self.bus.publish(Event::new(EventKind::EmitterStopped));
    }

    /// Completes once an emission loop has failed and the error is not yet collected.
    ///
    /// Stopping, restarting and disposing never complete it.
    pub async fn failed(&self) {
        let mut rx = self.failed.subscribe();
        let _ = rx.wait_for(|failed| *failed).await;
    }

    /// Waits for the latest emission loop to finish and returns its outcome.
    ///
    /// `Ok(())` when there is no loop or it was stopped; the source error when it failed.
    /// The loop keeps running until stopped, disposed or failed.
    pub async fn join(&self) -> Result<(), FeedError> {
        let handle = self.lock().handle.take();
        let joined = match handle {
            Some(h) => h.await.map_err(|je| FeedError::EmissionAborted {
                reason: je.to_string(),
            }),
            None => Ok(()),
        };

        let failure = self.lock().failure.take();
        match failure {
            Some(err) => {
                self.failed.send_replace(false);
                Err(err)
            }
            None => joined,
        }
    }

    /// Cancels every timer, drops all listeners and refuses further starts.
    ///
    /// Idempotent. Late timer callbacks become no-ops.
    pub fn dispose(&self) {
        let mut st = self.lock();
        if st.disposed {
            return;
        }
        st.disposed = true;
        self.root.cancel();
        let was_running = st.schedule.take().is_some();
        st.resume_timer = None;
        st.listeners.clear();
        drop(st);

        if was_running {
            self.bus.publish(Event::new(EventKind::EmitterStopped));
        }
    }

    /// [`dispose`](Self::dispose) followed by [`join`](Self::join).
    pub async fn shutdown(&self) -> Result<(), FeedError> {
        self.dispose();
        self.join().await
    }
}

/// Body of the emission loop.
async fn run_schedule(
    me: Weak<Emitter>,
    source: SourceRef,
    token: CancellationToken,
    interval: EmissionInterval,
) {
    loop {
        let delay = interval.next();
        match me.upgrade() {
            Some(emitter) => emitter
                .bus
                .publish(Event::new(EventKind::EmissionScheduled).with_delay(delay)),
            None => return,
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = time::sleep(delay) => {}
        }

        let Some(emitter) = me.upgrade() else {
            return;
        };
        if token.is_cancelled() {
            return;
        }

        let candidate = catch_unwind(AssertUnwindSafe(|| source.next_candidate_order()))
            .unwrap_or_else(|payload| {
                Err(FeedError::SourceFailed {
                    error: format!("source panicked: {}", panic_message(&*payload)),
                })
            })
            .and_then(|order| {
                order.validate()?;
                Ok(order)
            });
        match candidate {
            Ok(order) => {
                emitter.deliver(order, Some(&token));
            }
            Err(err) => {
                emitter.fail(&token, err);
                return;
            }
        }
    }
}
