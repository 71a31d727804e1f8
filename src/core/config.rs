//! # Feed timing and runtime configuration.
//!
//! Provides [`DispatchConfig`], the settings shared by the emitter, the
//! notification queue and the registry.
//!
//! The defaults are the reference behavior of the driver app (10–15 s between
//! offers, 15 s on screen, 300 ms between notifications, 60 s in the live list).
//! They are fixed in production; only tests and demos shorten them.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by the bus

use std::time::Duration;

use crate::policies::EmissionInterval;

/// Global configuration for the order feed.
///
/// The timing fields are product constants, not user settings. Production code
/// builds this with [`DispatchConfig::default`] and may only tune `bus_capacity`;
/// overriding a timing is meant for tests and demos that need a faster clock.
///
/// ## Field semantics
/// - `emission_min` / `emission_max`: random delay range between offers, `[min, max)`
/// - `auto_dismiss`: how long a notification stays on screen without a driver action
/// - `advance_gap`: hidden pause between one notification and the next
/// - `eviction`: how long an order stays in the registry without being removed
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct DispatchConfig {
    /// Shortest delay before the next random offer (inclusive). Fixed at 10 s outside tests and demos.
    pub emission_min: Duration,

    /// Upper bound of the delay before the next random offer (exclusive). Fixed at 15 s outside tests and demos.
    pub emission_max: Duration,

    /// Countdown after which a shown notification times out. Fixed at 15 s outside tests and demos.
    pub auto_dismiss: Duration,

    /// Invisible gap between resolving a notification and showing the next one.
    /// Fixed at 300 ms outside tests and demos.
    ///
    /// Always elapses, even with a non-empty backlog.
    pub advance_gap: Duration,

    /// Lifetime of an order in the registry. Fixed at 60 s outside tests and demos.
    pub eviction: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,
}

impl DispatchConfig {
    /// Returns the emission delay range as a policy.
    #[inline]
    pub fn emission_interval(&self) -> EmissionInterval {
        EmissionInterval::new(self.emission_min, self.emission_max)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for DispatchConfig {
    /// Default configuration:
    ///
    /// - `emission = [10s, 15s)`
    /// - `auto_dismiss = 15s`
    /// - `advance_gap = 300ms`
    /// - `eviction = 60s`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        let emission = EmissionInterval::default();
        Self {
            emission_min: emission.min,
            emission_max: emission.max,
            auto_dismiss: Duration::from_millis(15_000),
            advance_gap: Duration::from_millis(300),
            eviction: Duration::from_millis(60_000),
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_timings() {
        let cfg = DispatchConfig::default();
        assert_eq!(cfg.emission_interval(), EmissionInterval::default());
        assert_eq!(cfg.auto_dismiss, Duration::from_secs(15));
        assert_eq!(cfg.advance_gap, Duration::from_millis(300));
        assert_eq!(cfg.eviction, Duration::from_secs(60));
    }

    #[test]
    fn bus_capacity_is_clamped() {
        let cfg = DispatchConfig {
            bus_capacity: 0,
            ..DispatchConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
