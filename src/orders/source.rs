//! # Order sources.
//!
//! The emitter only needs one capability from the outside world: "give me a
//! candidate order". [`OrderSource`] is that seam.
//!
//! - [`FnSource`] wraps a closure (handy for tests and custom generators).
//! - [`MockSource`] serves the built-in mock catalog or fully random offers.
//!
//! A source is trusted: when it fails (or hands out a malformed order) the
//! emitter treats it as a fatal configuration error and stops.
//!
//! ## Example
//! ```rust
//! use orderfeed::{FeedError, FnSource, Order, OrderSource, Platform, SourceRef};
//!
//! let src: SourceRef = FnSource::arc("fixed", || {
//!     Ok::<_, FeedError>(Order::new("o1", Platform::Swiggy).with_distance_km(3.0).with_pay(50.0))
//! });
//! assert_eq!(src.name(), "fixed");
//! assert_eq!(&*src.next_candidate_order().unwrap().id, "o1");
//! ```

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::FeedError;
use crate::orders::order::{Order, Platform};

/// Shared handle to an order source.
pub type SourceRef = Arc<dyn OrderSource>;

/// Produces candidate orders for the emitter.
///
/// Implementations must not touch engine state; they only build values.
pub trait OrderSource: Send + Sync + 'static {
    /// Human-readable name (for logs/events).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Returns the next candidate order.
    fn next_candidate_order(&self) -> Result<Order, FeedError>;
}

/// Closure-backed order source.
#[derive(Debug)]
pub struct FnSource<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> FnSource<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the source and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> OrderSource for FnSource<F>
where
    F: Fn() -> Result<Order, FeedError> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn next_candidate_order(&self) -> Result<Order, FeedError> {
        (self.f)()
    }
}

/// How [`MockSource`] builds offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MockMode {
    /// Pick a random entry of the fixed catalog (ids repeat).
    Catalog,
    /// Generate random offers with fresh ids.
    Randomized,
}

/// Mock order generator used by demos and tests.
///
/// In catalog mode, ids repeat across calls; the registry's first-writer-wins
/// de-duplication is what keeps the live list clean.
pub struct MockSource {
    mode: MockMode,
    rng: Mutex<StdRng>,
    next_id: AtomicU64,
}

const PICKUPS: [&str; 6] = [
    "Burger King, Vastrapur",
    "Starbucks, Alpha One Mall",
    "Haldiram's, Drive-In Road",
    "La Pino'z Pizza, Navrangpura",
    "Honest Restaurant, Maninagar",
    "Subway, Satellite",
];

const DROPS: [&str; 6] = [
    "Royal Residency, Gurukul",
    "Pramukh Arcade, Kudasan",
    "Suryam Sky, Science City Road",
    "Ratnam Complex, Jodhpur",
    "Sun-West Heights, Satellite",
    "Green Meadows, Bopal",
];

impl MockSource {
    /// Catalog-backed source seeded from the OS.
    pub fn new() -> Self {
        Self::build(MockMode::Catalog, StdRng::from_rng(&mut rand::rng()))
    }

    /// Random-offer source seeded from the OS.
    pub fn randomized() -> Self {
        Self::build(MockMode::Randomized, StdRng::from_rng(&mut rand::rng()))
    }

    /// Catalog-backed source with a deterministic seed.
    pub fn seeded(seed: u64) -> Self {
        Self::build(MockMode::Catalog, StdRng::seed_from_u64(seed))
    }

    /// Random-offer source with a deterministic seed.
    pub fn randomized_seeded(seed: u64) -> Self {
        Self::build(MockMode::Randomized, StdRng::seed_from_u64(seed))
    }

    fn build(mode: MockMode, rng: StdRng) -> Self {
        Self {
            mode,
            rng: Mutex::new(rng),
            next_id: AtomicU64::new(1),
        }
    }

    /// The fixed catalog of offers, stamped `now`.
    pub fn catalog() -> Vec<Order> {
        vec![
            Order::new("6", Platform::Swiggy)
                .with_route("Burger King, Vastrapur", "Royal Residency, Gurukul")
                .with_distance_km(3.1)
                .with_estimated_minutes(17)
                .with_pay(45.0),
            Order::new("7", Platform::Zomato)
                .with_route("Starbucks, Alpha One Mall", "Pramukh Arcade, Kudasan")
                .with_distance_km(6.4)
                .with_estimated_minutes(28)
                .with_pay(67.0),
            Order::new("8", Platform::EatSure)
                .with_route("Haldiram's, Drive-In Road", "Suryam Sky, Science City Road")
                .with_distance_km(8.2)
                .with_estimated_minutes(34)
                .with_pay(76.0),
            Order::new("9", Platform::Swiggy)
                .with_route("La Pino'z Pizza, Navrangpura", "Ratnam Complex, Jodhpur")
                .with_distance_km(5.8)
                .with_estimated_minutes(25)
                .with_pay(60.0),
            Order::new("10", Platform::Zomato)
                .with_route("Honest Restaurant, Maninagar", "Sun-West Heights, Satellite")
                .with_distance_km(9.4)
                .with_estimated_minutes(40)
                .with_pay(80.0),
        ]
    }

    fn pick_from_catalog(&self, rng: &mut StdRng) -> Order {
        let mut catalog = Self::catalog();
        let idx = rng.random_range(0..catalog.len());
        catalog.swap_remove(idx)
    }

    fn generate(&self, rng: &mut StdRng) -> Order {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        let platform = Platform::ALL[rng.random_range(0..Platform::ALL.len())];
        let distance = (rng.random_range(10..=100) as f64) / 10.0;
        let pay = rng.random_range(30..=90) as f64;
        // roughly 4 minutes per km plus pickup time
        let eta = (distance * 4.0).round() as u32 + rng.random_range(3..=8);

        Order::new(format!("offer-{n}"), platform)
            .with_route(
                PICKUPS[rng.random_range(0..PICKUPS.len())],
                DROPS[rng.random_range(0..DROPS.len())],
            )
            .with_distance_km(distance)
            .with_pay(pay)
            .with_estimated_minutes(eta)
            .with_created_at(Utc::now())
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderSource for MockSource {
    fn name(&self) -> &str {
        match self.mode {
            MockMode::Catalog => "mock-catalog",
            MockMode::Randomized => "mock-random",
        }
    }

    fn next_candidate_order(&self) -> Result<Order, FeedError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(match self.mode {
            MockMode::Catalog => self.pick_from_catalog(&mut rng),
            MockMode::Randomized => self.generate(&mut rng),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_entries_are_valid() {
        for order in MockSource::catalog() {
            order.validate().expect("catalog order must be valid");
        }
    }

    #[test]
    fn catalog_source_only_returns_catalog_ids() {
        let src = MockSource::seeded(7);
        let ids: Vec<Arc<str>> = MockSource::catalog().into_iter().map(|o| o.id).collect();
        for _ in 0..50 {
            let order = src.next_candidate_order().unwrap();
            assert!(ids.contains(&order.id));
        }
    }

    #[test]
    fn randomized_source_yields_fresh_valid_offers() {
        let src = MockSource::randomized_seeded(42);
        let a = src.next_candidate_order().unwrap();
        let b = src.next_candidate_order().unwrap();
        assert_ne!(a.id, b.id);
        for o in [a, b] {
            o.validate().unwrap();
            assert!((1.0..=10.0).contains(&o.distance_km));
            assert!((30.0..=90.0).contains(&o.pay_amount));
        }
    }

    #[test]
    fn fn_source_propagates_errors() {
        let src = FnSource::new("broken", || {
            Err::<Order, _>(FeedError::SourceFailed { error: "offline".into() })
        });
        assert!(matches!(
            src.next_candidate_order(),
            Err(FeedError::SourceFailed { .. })
        ));
    }
}
