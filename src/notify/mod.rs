//! # Offer notification pipeline.
//!
//! - [`Emitter`] produces offers on a randomized schedule and fans them out to listeners.
//! - [`NotificationQueue`] presents them one at a time with auto-dismiss and a gap between cards.
//! - [`SwipeGesture`] classifies drags on the card.

mod emitter;
mod gesture;
mod queue;

pub use emitter::{Emitter, Listener, Subscription};
pub use gesture::{
    DISMISS_DISTANCE_PX, FLING_MIN_DISTANCE_PX, FLING_VELOCITY_PX_PER_MS, SwipeGesture,
    SwipeOutcome,
};
pub use queue::{NotificationQueue, NotificationState};
