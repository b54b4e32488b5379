//! Active orders and their expiry.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::riders::RiderId;
use crate::spatial::Point;

/// Service tag the dispatch backend uses for the voting ride type.
pub const VOTING_SERVICE_TAG: &str = "5";

/// Backend-assigned order identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Regular,
    Voting,
}

impl OrderKind {
    pub fn service_tags(self) -> Vec<String> {
        match self {
            OrderKind::Regular => Vec::new(),
            OrderKind::Voting => vec![VOTING_SERVICE_TAG.to_string()],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderKind::Regular => "regular",
            OrderKind::Voting => "voting",
        }
    }
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub kind: OrderKind,
    pub rider_id: RiderId,
    pub origin: Point,
    pub destination: Point,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl Order {
    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        self.expires_at <= now
    }
}

/// Orders currently alive on the backend, keyed by backend id.
///
/// Iteration follows id order, so two snapshots of the same state enumerate
/// identically.
#[derive(Debug, Default)]
pub struct OrderLifecycleStore {
    active: BTreeMap<OrderId, Order>,
}

impl OrderLifecycleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a newly created order.
    ///
    /// The caller must have picked a free rider. A repeated backend id means
    /// local and remote state no longer agree and is reported as an error.
    pub fn add(&mut self, order: Order) -> Result<(), SimError> {
        debug_assert!(
            !self.is_rider_active(&order.rider_id),
            "rider already has an active order"
        );
        debug_assert!(order.expires_at > order.created_at, "order must expire after creation");
        if self.active.contains_key(&order.id) {
            return Err(SimError::DuplicateOrder(order.id));
        }
        self.active.insert(order.id.clone(), order);
        Ok(())
    }

    /// Riders from `all_rider_ids` without an active order, in the given order.
    pub fn free_rider_ids<'a, I>(&self, all_rider_ids: I) -> Vec<RiderId>
    where
        I: IntoIterator<Item = &'a RiderId>,
    {
        all_rider_ids
            .into_iter()
            .filter(|id| !self.is_rider_active(id))
            .cloned()
            .collect()
    }

    /// Remove and return every order with `expires_at <= now`.
    ///
    /// Removal is unconditional; whoever cancels the returned orders remotely
    /// must not put them back on failure.
    pub fn sweep_expired(&mut self, now: NaiveDateTime) -> Vec<Order> {
        let (expired, alive): (BTreeMap<_, _>, BTreeMap<_, _>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|(_, order)| order.is_expired_at(now));
        self.active = alive;
        expired.into_values().collect()
    }

    pub fn is_rider_active(&self, rider_id: &RiderId) -> bool {
        self.active.values().any(|o| &o.rider_id == rider_id)
    }

    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.active.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.active.values()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
