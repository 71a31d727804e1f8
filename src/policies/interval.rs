//! # Randomized emission interval.
//!
//! [`EmissionInterval`] draws the delay before the next offer uniformly from the
//! half-open range `[min, max)`. With the defaults that is 10 s (inclusive) to
//! 15 s (exclusive), at millisecond granularity.

use std::time::Duration;

use rand::Rng;

/// Uniform random delay between emissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EmissionInterval {
    /// Shortest possible delay (inclusive).
    pub min: Duration,
    /// Upper bound (exclusive).
    pub max: Duration,
}

impl Default for EmissionInterval {
    /// `[10s, 15s)`.
    fn default() -> Self {
        Self {
            min: Duration::from_millis(10_000),
            max: Duration::from_millis(15_000),
        }
    }
}

impl EmissionInterval {
    /// Creates an interval; `max` below `min` collapses to a fixed `min` delay.
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Draws the next delay using the thread-local RNG.
    pub fn next(&self) -> Duration {
        self.next_with(&mut rand::rng())
    }

    /// Draws the next delay from `rng`.
    ///
    /// Degenerate ranges (`max <= min`) always return `min`.
    pub fn next_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min_ms = self.min.as_millis() as u64;
        let max_ms = self.max.as_millis() as u64;
        if max_ms <= min_ms {
            return self.min;
        }
        Duration::from_millis(rng.random_range(min_ms..max_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn default_range_is_ten_to_fifteen_seconds() {
        let interval = EmissionInterval::default();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            let d = interval.next_with(&mut rng);
            assert!(d >= Duration::from_secs(10), "{d:?} below range");
            assert!(d < Duration::from_secs(15), "{d:?} above range");
        }
    }

    #[test]
    fn degenerate_range_returns_min() {
        let fixed = EmissionInterval::new(Duration::from_secs(2), Duration::from_secs(2));
        assert_eq!(fixed.next(), Duration::from_secs(2));
        let inverted = EmissionInterval::new(Duration::from_secs(3), Duration::from_secs(1));
        assert_eq!(inverted.next(), Duration::from_secs(3));
    }
}
