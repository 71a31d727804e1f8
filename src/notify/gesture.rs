//! # Swipe-to-dismiss gesture classification.
//!
//! A horizontal drag on the notification card either dismisses it (treated as
//! a reject) or snaps back.
//!
//! ```text
//! |dx| >= 120px                              → Dismiss
//! |dx| >= 40px  and |dx|/duration >= 0.5/ms  → Dismiss (fling)
//! mostly vertical drag                       → Ignored
//! otherwise                                  → SnapBack
//! ```

/// Drag distance that always dismisses, in pixels.
pub const DISMISS_DISTANCE_PX: f64 = 120.0;

/// Minimum distance for a fling to count, in pixels.
pub const FLING_MIN_DISTANCE_PX: f64 = 40.0;

/// Minimum fling velocity, in pixels per millisecond.
pub const FLING_VELOCITY_PX_PER_MS: f64 = 0.5;

/// A completed drag gesture on the notification card.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwipeGesture {
    /// Horizontal travel in pixels (sign gives direction).
    pub dx: f64,
    /// Vertical travel in pixels.
    pub dy: f64,
    /// Time from touch-down to release.
    pub duration_ms: u32,
}

/// What the card does at the end of a gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeOutcome {
    /// Card leaves the screen; the offer is rejected.
    Dismiss,
    /// Card returns to its resting position.
    SnapBack,
    /// Not a horizontal swipe.
    Ignored,
}

impl SwipeGesture {
    pub fn new(dx: f64, dy: f64, duration_ms: u32) -> Self {
        Self { dx, dy, duration_ms }
    }

    /// Horizontal velocity in px/ms. A zero duration counts as 1 ms.
    pub fn velocity(&self) -> f64 {
        self.dx.abs() / f64::from(self.duration_ms.max(1))
    }

    /// Classifies the gesture.
    pub fn classify(&self) -> SwipeOutcome {
        let dx = self.dx.abs();
        let dy = self.dy.abs();
        if !dx.is_finite() || !dy.is_finite() || dy > dx {
            return SwipeOutcome::Ignored;
        }

        if dx >= DISMISS_DISTANCE_PX
            || (dx >= FLING_MIN_DISTANCE_PX && self.velocity() >= FLING_VELOCITY_PX_PER_MS)
        {
            SwipeOutcome::Dismiss
        } else {
            SwipeOutcome::SnapBack
        }
    }
}
