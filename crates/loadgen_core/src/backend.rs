//! Dispatch backend abstraction: the remote system riders and orders live in.
//!
//! Two implementations, mirroring how the engine is run:
//!
//! - **`InMemoryBackend`**: local id allocation and a call log. Dry runs and tests.
//! - **`HttpBackend`** (feature `http`): blocking JSON client for the real dispatch API.

use std::collections::HashMap;

use serde::Serialize;

use crate::orders::OrderId;
use crate::riders::{Rider, RiderId};
use crate::spatial::Point;

#[cfg(feature = "http")]
pub mod http;

/// Failures reported by a dispatch backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend answered but refused the request. `payload` is the full response body.
    #[error("{operation} rejected by backend: {payload}")]
    Rejected { operation: String, payload: String },

    /// The response could not be understood.
    #[error("malformed response to {operation}: {reason}")]
    Malformed { operation: String, reason: String },

    #[cfg(feature = "http")]
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Everything the backend needs to create one ride request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateOrderRequest {
    pub rider_id: RiderId,
    pub origin: Point,
    pub destination: Point,
    /// Local start time with UTC offset, e.g. `2024-05-01 08:00:00+03:00`.
    pub start_time: String,
    pub lifetime_secs: u64,
    pub passenger_count: u32,
    pub service_tags: Vec<String>,
}

/// Operations the simulation engine performs against the dispatch system.
///
/// Calls are synchronous. Creation failures are fatal to the caller;
/// cancellation is best effort.
pub trait DispatchBackend {
    /// Return the rider registered under `email`, registering it first if unknown.
    fn register_or_use_rider(
        &mut self,
        email: &str,
        display_name: &str,
    ) -> Result<Rider, BackendError>;

    fn create_order(&mut self, request: &CreateOrderRequest) -> Result<OrderId, BackendError>;

    fn cancel_order(&mut self, order_id: &OrderId, reason: &str) -> Result<(), BackendError>;
}

impl<B: DispatchBackend + ?Sized> DispatchBackend for Box<B> {
    fn register_or_use_rider(
        &mut self,
        email: &str,
        display_name: &str,
    ) -> Result<Rider, BackendError> {
        (**self).register_or_use_rider(email, display_name)
    }

    fn create_order(&mut self, request: &CreateOrderRequest) -> Result<OrderId, BackendError> {
        (**self).create_order(request)
    }

    fn cancel_order(&mut self, order_id: &OrderId, reason: &str) -> Result<(), BackendError> {
        (**self).cancel_order(order_id, reason)
    }
}

/// A cancellation as recorded by [`InMemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRecord {
    pub order_id: OrderId,
    pub reason: String,
}

/// Local stand-in for the dispatch system.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    riders_by_email: HashMap<String, Rider>,
    next_rider_id: u64,
    next_order_id: u64,
    created: Vec<(OrderId, CreateOrderRequest)>,
    cancelled: Vec<CancelRecord>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders created so far, oldest first.
    pub fn created(&self) -> &[(OrderId, CreateOrderRequest)] {
        &self.created
    }

    pub fn cancelled(&self) -> &[CancelRecord] {
        &self.cancelled
    }
}

impl DispatchBackend for InMemoryBackend {
    fn register_or_use_rider(
        &mut self,
        email: &str,
        display_name: &str,
    ) -> Result<Rider, BackendError> {
        if let Some(rider) = self.riders_by_email.get(email) {
            return Ok(rider.clone());
        }
        self.next_rider_id += 1;
        let rider = Rider {
            id: RiderId(self.next_rider_id.to_string()),
            display_name: display_name.to_string(),
            contact: email.to_string(),
        };
        self.riders_by_email.insert(email.to_string(), rider.clone());
        Ok(rider)
    }

    fn create_order(&mut self, request: &CreateOrderRequest) -> Result<OrderId, BackendError> {
        self.next_order_id += 1;
        let id = OrderId(self.next_order_id.to_string());
        self.created.push((id.clone(), request.clone()));
        Ok(id)
    }

    fn cancel_order(&mut self, order_id: &OrderId, reason: &str) -> Result<(), BackendError> {
        if !self.created.iter().any(|(id, _)| id == order_id) {
            return Err(BackendError::Rejected {
                operation: "cancel order".to_string(),
                payload: format!("unknown order {order_id}"),
            });
        }
        self.cancelled.push(CancelRecord {
            order_id: order_id.clone(),
            reason: reason.to_string(),
        });
        Ok(())
    }
}
