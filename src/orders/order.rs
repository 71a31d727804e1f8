//! # Order record and delivery platforms.
//!
//! [`Order`] is an immutable value describing one delivery-job offer. It is
//! created by an [`OrderSource`](crate::OrderSource) and cloned, never mutated,
//! as it flows emitter → notification queue → registry.
//!
//! ## Example
//! ```rust
//! use orderfeed::{Order, Platform};
//!
//! let order = Order::new("o1", Platform::Swiggy)
//!     .with_route("KFC, SG Highway", "Westside Apartments, Thaltej")
//!     .with_distance_km(2.5)
//!     .with_pay(38.0)
//!     .with_estimated_minutes(15);
//!
//! assert!(order.validate().is_ok());
//! assert_eq!(order.platform.as_str(), "swiggy");
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// Third-party delivery platform an offer originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Swiggy,
    Zomato,
    EatSure,
}

impl Platform {
    /// All platforms, in display order.
    pub const ALL: [Platform; 3] = [Platform::Swiggy, Platform::Zomato, Platform::EatSure];

    /// Stable lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Swiggy => "swiggy",
            Platform::Zomato => "zomato",
            Platform::EatSure => "eatsure",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A synthetic delivery-job offer.
///
/// ### Invariants (see [`Order::validate`])
/// - `id` is non-empty
/// - `distance_km` is finite and `> 0`
/// - `pay_amount` is finite and `>= 0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique offer id.
    pub id: Arc<str>,
    /// Platform that posted the offer.
    pub platform: Platform,
    pub pickup_location: String,
    pub drop_location: String,
    /// Route length in kilometres.
    pub distance_km: f64,
    /// Payout for the delivery.
    pub pay_amount: f64,
    /// Estimated delivery time in minutes.
    pub estimated_minutes: u32,
    /// When the offer was created.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Creates an order with the given id and platform, stamped `now`.
    ///
    /// Remaining attributes start empty/zero; fill them with the `with_*` helpers.
    pub fn new(id: impl Into<Arc<str>>, platform: Platform) -> Self {
        Self {
            id: id.into(),
            platform,
            pickup_location: String::new(),
            drop_location: String::new(),
            distance_km: 0.0,
            pay_amount: 0.0,
            estimated_minutes: 0,
            created_at: Utc::now(),
        }
    }

    #[inline]
    pub fn with_route(mut self, pickup: impl Into<String>, drop: impl Into<String>) -> Self {
        self.pickup_location = pickup.into();
        self.drop_location = drop.into();
        self
    }

    #[inline]
    pub fn with_distance_km(mut self, km: f64) -> Self {
        self.distance_km = km;
        self
    }

    #[inline]
    pub fn with_pay(mut self, amount: f64) -> Self {
        self.pay_amount = amount;
        self
    }

    #[inline]
    pub fn with_estimated_minutes(mut self, minutes: u32) -> Self {
        self.estimated_minutes = minutes;
        self
    }

    #[inline]
    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Checks the value invariants of an order.
    ///
    /// Returns [`FeedError::MalformedOrder`] naming the first violated invariant.
    pub fn validate(&self) -> Result<(), FeedError> {
        let reason = if self.id.is_empty() {
            Some("id must not be empty")
        } else if !self.distance_km.is_finite() || self.distance_km <= 0.0 {
            Some("distance must be positive")
        } else if !self.pay_amount.is_finite() || self.pay_amount < 0.0 {
            Some("pay must be non-negative")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(FeedError::MalformedOrder {
                id: self.id.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Pay per kilometre; `0.0` when the distance is not positive.
    pub fn pay_per_km(&self) -> f64 {
        if self.distance_km > 0.0 {
            self.pay_amount / self.distance_km
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Order {
        Order::new("o1", Platform::Zomato)
            .with_distance_km(3.0)
            .with_pay(50.0)
            .with_estimated_minutes(15)
    }

    #[test]
    fn valid_order_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn rejects_empty_id() {
        let mut o = sample();
        o.id = "".into();
        assert!(matches!(
            o.validate(),
            Err(FeedError::MalformedOrder { reason: "id must not be empty", .. })
        ));
    }

    #[test]
    fn rejects_non_positive_distance_and_negative_pay() {
        assert!(sample().with_distance_km(0.0).validate().is_err());
        assert!(sample().with_distance_km(f64::NAN).validate().is_err());
        assert!(sample().with_pay(-1.0).validate().is_err());
        assert!(sample().with_pay(0.0).validate().is_ok());
    }

    #[test]
    fn serializes_with_camel_case_and_lowercase_platform() {
        let json = serde_json::to_value(sample()).expect("serialize");
        assert_eq!(json["platform"], "zomato");
        assert_eq!(json["payAmount"], 50.0);
        assert_eq!(json["estimatedMinutes"], 15);
    }
}
