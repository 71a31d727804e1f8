//! Sorting and summaries for the live order list.
//!
//! Pure functions over registry snapshots; nothing here owns state.

use crate::orders::order::Order;

/// Sort key for the order list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Highest payout first.
    HighestPay,
    /// Shortest route first.
    Nearest,
    /// Smallest estimated delivery time first.
    QuickestEta,
}

/// Returns `orders` sorted by `sort`.
///
/// The sort is stable: orders that compare equal keep their incoming order
/// (which, for registry snapshots, is newest insertion first).
pub fn sorted(mut orders: Vec<Order>, sort: OrderSort) -> Vec<Order> {
    match sort {
        OrderSort::Newest => orders.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        OrderSort::HighestPay => orders.sort_by(|a, b| b.pay_amount.total_cmp(&a.pay_amount)),
        OrderSort::Nearest => orders.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km)),
        OrderSort::QuickestEta => orders.sort_by_key(|o| o.estimated_minutes),
    }
    orders
}

/// Aggregate figures shown above the order list.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ListSummary {
    pub count: usize,
    pub total_pay: f64,
    pub total_distance_km: f64,
}

impl ListSummary {
    /// Average pay per kilometre across the list (`0.0` for an empty list).
    pub fn pay_per_km(&self) -> f64 {
        if self.total_distance_km > 0.0 {
            self.total_pay / self.total_distance_km
        } else {
            0.0
        }
    }
}

/// Summarizes a list of orders.
pub fn summary(orders: &[Order]) -> ListSummary {
    orders.iter().fold(ListSummary::default(), |mut acc, o| {
        acc.count += 1;
        acc.total_pay += o.pay_amount;
        acc.total_distance_km += o.distance_km;
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::order::Platform;
    use chrono::{Duration, Utc};

    fn orders() -> Vec<Order> {
        let now = Utc::now();
        vec![
            Order::new("a", Platform::Swiggy)
                .with_distance_km(5.0)
                .with_pay(40.0)
                .with_estimated_minutes(20)
                .with_created_at(now - Duration::minutes(10)),
            Order::new("b", Platform::Zomato)
                .with_distance_km(2.0)
                .with_pay(80.0)
                .with_estimated_minutes(30)
                .with_created_at(now),
            Order::new("c", Platform::EatSure)
                .with_distance_km(9.0)
                .with_pay(60.0)
                .with_estimated_minutes(10)
                .with_created_at(now - Duration::minutes(5)),
        ]
    }

    fn ids(list: &[Order]) -> Vec<&str> {
        list.iter().map(|o| &*o.id).collect()
    }

    #[test]
    fn sorts_by_each_key() {
        assert_eq!(ids(&sorted(orders(), OrderSort::Newest)), ["b", "c", "a"]);
        assert_eq!(ids(&sorted(orders(), OrderSort::HighestPay)), ["b", "c", "a"]);
        assert_eq!(ids(&sorted(orders(), OrderSort::Nearest)), ["b", "a", "c"]);
        assert_eq!(ids(&sorted(orders(), OrderSort::QuickestEta)), ["c", "a", "b"]);
    }

    #[test]
    fn summary_totals() {
        let s = summary(&orders());
        assert_eq!(s.count, 3);
        assert_eq!(s.total_pay, 180.0);
        assert_eq!(s.pay_per_km(), 180.0 / 16.0);
        assert_eq!(summary(&[]).pay_per_km(), 0.0);
    }
}
