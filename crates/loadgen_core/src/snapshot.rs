//! Read-only view of the active orders for drivers and displays.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::orders::{OrderId, OrderKind, OrderLifecycleStore};
use crate::riders::RiderId;
use crate::spatial::Point;

/// Remaining lifetime in whole minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemainingLifetime {
    pub minutes: u64,
    pub seconds: u64,
}

impl RemainingLifetime {
    /// Floor `secs` to whole seconds; negative values clamp to zero.
    pub fn from_seconds(secs: f64) -> Self {
        let total = if secs.is_finite() && secs > 0.0 {
            secs.floor() as u64
        } else {
            0
        };
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }
}

impl fmt::Display for RemainingLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min {} sec", self.minutes, self.seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveOrderView {
    pub order_id: OrderId,
    pub kind: OrderKind,
    pub rider_id: RiderId,
    pub origin: Point,
    pub destination: Point,
    /// Creation time of day, `HH:MM:SS`.
    pub created_time_of_day: String,
    pub remaining: RemainingLifetime,
    pub remaining_text: String,
}

/// Rows for every order in `store` still alive at game time `now`, ordered by
/// creation time then order id.
///
/// Orders past their expiry are left out even before the next sweep removes
/// them from the store.
pub fn active_orders_view(store: &OrderLifecycleStore, now: NaiveDateTime) -> Vec<ActiveOrderView> {
    let mut orders: Vec<_> = store.iter().filter(|o| !o.is_expired_at(now)).collect();
    orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    orders
        .into_iter()
        .map(|order| {
            let remaining_secs = (order.expires_at - now)
                .num_microseconds()
                .map(|us| us as f64 / 1_000_000.0)
                .unwrap_or(0.0);
            let remaining = RemainingLifetime::from_seconds(remaining_secs);
            ActiveOrderView {
                order_id: order.id.clone(),
                kind: order.kind,
                rider_id: order.rider_id.clone(),
                origin: order.origin,
                destination: order.destination,
                created_time_of_day: order.created_at.format("%H:%M:%S").to_string(),
                remaining_text: remaining.to_string(),
                remaining,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::Order;
    use chrono::{Duration, NaiveDate};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .expect("time")
    }

    fn order(id: &str, created: NaiveDateTime, lifetime: Duration) -> Order {
        Order {
            id: OrderId::from(id),
            kind: OrderKind::Voting,
            rider_id: RiderId::from(id),
            origin: Point::new(30.38, -9.55),
            destination: Point::new(30.40, -9.52),
            created_at: created,
            expires_at: created + lifetime,
        }
    }

    #[test]
    fn remaining_is_floored_and_clamped() {
        assert_eq!(
            RemainingLifetime::from_seconds(125.9),
            RemainingLifetime { minutes: 2, seconds: 5 }
        );
        assert_eq!(RemainingLifetime::from_seconds(-3.0).to_string(), "0 min 0 sec");
        assert_eq!(RemainingLifetime::from_seconds(599.999).to_string(), "9 min 59 sec");
    }

    #[test]
    fn rows_follow_creation_order() {
        let mut store = OrderLifecycleStore::new();
        store.add(order("9", at(8, 5, 0), Duration::minutes(10))).expect("add");
        store.add(order("10", at(8, 1, 30), Duration::minutes(5))).expect("add");

        let rows = active_orders_view(&store, at(8, 3, 0));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].order_id, OrderId::from("10"));
        assert_eq!(rows[0].created_time_of_day, "08:01:30");
        assert_eq!(rows[0].remaining_text, "3 min 30 sec");
        assert_eq!(rows[1].remaining_text, "12 min 0 sec");
    }

    #[test]
    fn expired_orders_are_left_out() {
        let mut store = OrderLifecycleStore::new();
        store.add(order("1", at(8, 0, 0), Duration::minutes(5))).expect("add");
        store.add(order("2", at(8, 0, 0), Duration::minutes(6))).expect("add");

        let rows = active_orders_view(&store, at(8, 5, 0));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_id, OrderId::from("2"));
        assert_eq!(rows[0].remaining_text, "1 min 0 sec");
        assert!(active_orders_view(&store, at(8, 6, 0)).is_empty());
        assert_eq!(store.len(), 2, "the view never mutates the store");
    }

    #[test]
    fn view_serializes_to_json() {
        let mut store = OrderLifecycleStore::new();
        store.add(order("1", at(8, 0, 0), Duration::minutes(7))).expect("add");
        let rows = active_orders_view(&store, at(8, 0, 0));
        let json = serde_json::to_value(&rows).expect("serialize");
        assert_eq!(json[0]["kind"], "voting");
        assert_eq!(json[0]["remaining"]["minutes"], 7);
        assert_eq!(json[0]["origin"]["lat"], 30.38);
    }
}
