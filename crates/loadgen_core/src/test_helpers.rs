//! Test helpers for engine setup and backend failure injection.
//!
//! Shared by unit tests, integration tests and benches.

use chrono::NaiveDate;

use crate::backend::{BackendError, CancelRecord, CreateOrderRequest, DispatchBackend, InMemoryBackend};
use crate::clock::ManualTimeSource;
use crate::engine::SimulationEngine;
use crate::error::SimError;
use crate::orders::OrderId;
use crate::params::SimulationParams;
use crate::riders::{Rider, RiderPool};

/// Side length of [`square_region`] in degrees.
pub const SQUARE_SIDE: f64 = 0.1;

/// Axis-aligned 0.1 x 0.1 degree square near Agadir, as `[lat, lon]` pairs.
pub fn square_region() -> Vec<[f64; 2]> {
    let (lat, lon) = (30.35, -9.60);
    vec![
        [lat, lon],
        [lat, lon + SQUARE_SIDE],
        [lat + SQUARE_SIDE, lon + SQUARE_SIDE],
        [lat + SQUARE_SIDE, lon],
    ]
}

/// Fixed simulated date so game timestamps are reproducible.
///
/// # Panics
///
/// Never in practice; the date literal is valid.
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid test date")
}

/// Seeded params on [`square_region`] and [`test_date`].
pub fn test_params() -> SimulationParams {
    SimulationParams::default()
        .with_seed(42)
        .with_start_date(test_date())
        .with_region(square_region())
}

/// Backend with switchable failures, built on [`InMemoryBackend`].
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    inner: InMemoryBackend,
    creates_before_failure: Option<usize>,
    fail_cancels: bool,
    repeat_order_id: bool,
    cancel_attempts: Vec<CancelRecord>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `n` creations succeed, then reject every following one.
    pub fn fail_creates_after(mut self, n: usize) -> Self {
        self.creates_before_failure = Some(n);
        self
    }

    pub fn fail_cancels(mut self, fail: bool) -> Self {
        self.fail_cancels = fail;
        self
    }

    /// Answer every creation with the id of the first created order.
    pub fn repeat_order_id(mut self) -> Self {
        self.repeat_order_id = true;
        self
    }

    pub fn set_fail_cancels(&mut self, fail: bool) {
        self.fail_cancels = fail;
    }

    pub fn created(&self) -> &[(OrderId, CreateOrderRequest)] {
        self.inner.created()
    }

    /// Successful cancellations.
    pub fn cancelled(&self) -> &[CancelRecord] {
        self.inner.cancelled()
    }

    /// Every cancellation attempt, failed or not.
    pub fn cancel_attempts(&self) -> &[CancelRecord] {
        &self.cancel_attempts
    }
}

impl DispatchBackend for ScriptedBackend {
    fn register_or_use_rider(
        &mut self,
        email: &str,
        display_name: &str,
    ) -> Result<Rider, BackendError> {
        self.inner.register_or_use_rider(email, display_name)
    }

    fn create_order(&mut self, request: &CreateOrderRequest) -> Result<OrderId, BackendError> {
        if let Some(limit) = self.creates_before_failure {
            if self.inner.created().len() >= limit {
                return Err(BackendError::Rejected {
                    operation: "create order".to_string(),
                    payload: r#"{"status":"error","message":"scripted failure"}"#.to_string(),
                });
            }
        }
        let id = self.inner.create_order(request)?;
        if self.repeat_order_id {
            if let Some((first, _)) = self.inner.created().first() {
                return Ok(first.clone());
            }
        }
        Ok(id)
    }

    fn cancel_order(&mut self, order_id: &OrderId, reason: &str) -> Result<(), BackendError> {
        self.cancel_attempts.push(CancelRecord {
            order_id: order_id.clone(),
            reason: reason.to_string(),
        });
        if self.fail_cancels {
            return Err(BackendError::Rejected {
                operation: "cancel order".to_string(),
                payload: "scripted failure".to_string(),
            });
        }
        self.inner.cancel_order(order_id, reason)
    }
}

/// Sync riders on `backend` and build an engine on a manual clock.
///
/// Returns the engine and a handle to its clock.
pub fn manual_engine<B: DispatchBackend>(
    params: &SimulationParams,
    mut backend: B,
) -> Result<(SimulationEngine<B, ManualTimeSource>, ManualTimeSource), SimError> {
    let riders = RiderPool::sync(&mut backend, params.rider_count)?;
    let time = ManualTimeSource::new();
    let engine = SimulationEngine::new(params, riders, backend, time.clone())?;
    Ok((engine, time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Region;

    #[test]
    fn square_region_is_valid() {
        let region = Region::from_pairs(&square_region()).expect("region");
        assert!((region.area() - SQUARE_SIDE * SQUARE_SIDE).abs() < 1e-12);
    }

    #[test]
    fn scripted_backend_fails_after_limit() {
        let (mut engine, _time) =
            manual_engine(&test_params(), ScriptedBackend::new().fail_creates_after(1)).expect("engine");
        engine.start();
        let err = engine.update().expect_err("second creation fails");
        assert!(matches!(err, SimError::Backend(BackendError::Rejected { .. })));
        assert_eq!(engine.backend().created().len(), 1);
    }
}
