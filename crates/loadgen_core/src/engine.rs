//! Simulation engine: turns elapsed game time into order traffic.
//!
//! Each [`SimulationEngine::update`] call runs one step:
//!
//! 1. **Generation**: every due regular event, then every due voting event,
//!    picks a free rider, samples a trip and creates the order remotely.
//! 2. **Expiry sweep**: orders whose expiry is at or before the current game
//!    time are dropped locally and cancelled remotely (best effort).
//!
//! The engine is single-threaded and never sleeps; the caller decides how
//! often to step it.

use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{CreateOrderRequest, DispatchBackend};
use crate::clock::{format_start_time, virtual_day_start, GameClock, SystemTimeSource, TimeSource};
use crate::error::SimError;
use crate::orders::{Order, OrderId, OrderKind, OrderLifecycleStore};
use crate::params::SimulationParams;
use crate::riders::RiderPool;
use crate::sampling::RegionSampler;
use crate::schedule::Generator;
use crate::snapshot::{active_orders_view, ActiveOrderView};

/// Reason attached to every expiry cancellation.
pub const EXPIRED_REASON: &str = "Order expired";

/// Every synthetic order carries one passenger.
pub const PASSENGER_COUNT: u32 = 1;

/// Counters for one order kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    /// Generation events claimed from the schedule.
    pub fired: u64,
    pub created: u64,
    /// Events dropped because every rider already had an active order.
    pub skipped_no_rider: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub regular: GenerationStats,
    pub voting: GenerationStats,
    pub expired: u64,
    pub cancel_failures: u64,
}

impl EngineStats {
    pub fn for_kind(&self, kind: OrderKind) -> &GenerationStats {
        match kind {
            OrderKind::Regular => &self.regular,
            OrderKind::Voting => &self.voting,
        }
    }

    fn for_kind_mut(&mut self, kind: OrderKind) -> &mut GenerationStats {
        match kind {
            OrderKind::Regular => &mut self.regular,
            OrderKind::Voting => &mut self.voting,
        }
    }
}

/// What one [`SimulationEngine::update`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    /// Orders created in this step, in creation order.
    pub created: Vec<OrderId>,
    pub skipped_regular: u32,
    pub skipped_voting: u32,
    /// Orders removed by the expiry sweep, whether or not cancellation succeeded.
    pub expired: Vec<OrderId>,
    /// Subset of `expired` whose remote cancellation failed.
    pub failed_cancellations: Vec<OrderId>,
}

impl UpdateReport {
    pub fn is_idle(&self) -> bool {
        self.created.is_empty()
            && self.expired.is_empty()
            && self.skipped_regular == 0
            && self.skipped_voting == 0
    }

    fn record_skip(&mut self, kind: OrderKind) {
        match kind {
            OrderKind::Regular => self.skipped_regular += 1,
            OrderKind::Voting => self.skipped_voting += 1,
        }
    }
}

pub struct SimulationEngine<B: DispatchBackend, T: TimeSource = SystemTimeSource> {
    params: SimulationParams,
    sampler: RegionSampler,
    clock: GameClock<T>,
    riders: RiderPool,
    store: OrderLifecycleStore,
    backend: B,
    regular: Generator,
    voting: Generator,
    rng: StdRng,
    stats: EngineStats,
}

impl<B: DispatchBackend> SimulationEngine<B, SystemTimeSource> {
    /// Engine driven by the wall clock.
    pub fn with_system_clock(
        params: &SimulationParams,
        riders: RiderPool,
        backend: B,
    ) -> Result<Self, SimError> {
        Self::new(params, riders, backend, SystemTimeSource::new())
    }
}

impl<B: DispatchBackend, T: TimeSource> SimulationEngine<B, T> {
    /// Validate `params` and assemble an engine. The clock is not started.
    pub fn new(
        params: &SimulationParams,
        riders: RiderPool,
        backend: B,
        time: T,
    ) -> Result<Self, SimError> {
        params.validate()?;
        let region = params.build_region()?;
        let sampler = RegionSampler::new(region).with_max_attempts(params.max_sampling_attempts);
        let clock = GameClock::new(
            virtual_day_start(params.start_date, params.day_start),
            params.time_compression,
            time,
        );
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        if riders.is_empty() {
            warn!("rider pool is empty; every generation event will be skipped");
        }

        Ok(Self {
            params: params.clone(),
            sampler,
            clock,
            riders,
            store: OrderLifecycleStore::new(),
            backend,
            regular: Generator::from_rate_per_hour(params.regular_frequency_per_hour),
            voting: Generator::from_rate_per_hour(params.voting_frequency_per_hour),
            rng,
            stats: EngineStats::default(),
        })
    }

    /// Start the game clock. Generation schedules are measured from this instant.
    pub fn start(&mut self) {
        self.clock.start();
        info!(
            start = %self.clock.sim_start_game_time(),
            compression = self.clock.compression(),
            riders = self.riders.len(),
            "simulation started"
        );
    }

    /// Run one generation step followed by one expiry sweep.
    ///
    /// A no-op before [`start`](Self::start). Errors are fatal: the engine's
    /// view of the backend can no longer be trusted.
    pub fn update(&mut self) -> Result<UpdateReport, SimError> {
        let mut report = UpdateReport::default();
        if !self.clock.is_started() {
            return Ok(report);
        }

        let now_game_secs = self.clock.elapsed_game_seconds();
        while self.regular.poll_due(now_game_secs) {
            self.generate(OrderKind::Regular, &mut report)?;
        }
        while self.voting.poll_due(now_game_secs) {
            self.generate(OrderKind::Voting, &mut report)?;
        }

        self.sweep_expired(&mut report);
        Ok(report)
    }

    fn generate(&mut self, kind: OrderKind, report: &mut UpdateReport) -> Result<(), SimError> {
        self.stats.for_kind_mut(kind).fired += 1;

        let free = self.store.free_rider_ids(self.riders.ids());
        if free.is_empty() {
            debug!(%kind, "no free rider; generation event skipped");
            self.stats.for_kind_mut(kind).skipped_no_rider += 1;
            report.record_skip(kind);
            return Ok(());
        }
        let rider_id = free[self.rng.gen_range(0..free.len())].clone();

        let origin = self.sampler.sample_point(&mut self.rng)?;
        let destination = self.sampler.sample_destination(
            &mut self.rng,
            origin,
            self.params.distance_min,
            self.params.distance_max,
        )?;

        let lifetime_minutes = match kind {
            OrderKind::Regular => self.params.regular_lifetime_minutes,
            OrderKind::Voting => self.rng.gen_range(
                self.params.voting_lifetime_minutes_min..=self.params.voting_lifetime_minutes_max,
            ),
        };
        let created_at = self.clock.current_game_time();
        let expires_at = created_at + chrono::Duration::minutes(i64::from(lifetime_minutes));

        let request = CreateOrderRequest {
            rider_id: rider_id.clone(),
            origin,
            destination,
            start_time: format_start_time(created_at, self.params.utc_offset_minutes),
            lifetime_secs: u64::from(lifetime_minutes) * 60,
            passenger_count: PASSENGER_COUNT,
            service_tags: kind.service_tags(),
        };
        let order_id = self.backend.create_order(&request)?;
        info!(
            %order_id,
            %kind,
            %rider_id,
            start_time = %request.start_time,
            lifetime_minutes,
            "order created"
        );

        self.store.add(Order {
            id: order_id.clone(),
            kind,
            rider_id,
            origin,
            destination,
            created_at,
            expires_at,
        })?;
        self.stats.for_kind_mut(kind).created += 1;
        report.created.push(order_id);
        Ok(())
    }

    fn sweep_expired(&mut self, report: &mut UpdateReport) {
        let now = self.clock.current_game_time();
        for order in self.store.sweep_expired(now) {
            match self.backend.cancel_order(&order.id, EXPIRED_REASON) {
                Ok(()) => info!(order_id = %order.id, kind = %order.kind, "order expired and cancelled"),
                Err(err) => {
                    warn!(order_id = %order.id, error = %err, "cancelling expired order failed");
                    self.stats.cancel_failures += 1;
                    report.failed_cancellations.push(order.id.clone());
                }
            }
            self.stats.expired += 1;
            report.expired.push(order.id);
        }
    }

    /// Active orders as seen at the current game time.
    pub fn active_orders_view(&self) -> Vec<ActiveOrderView> {
        active_orders_view(&self.store, self.clock.current_game_time())
    }

    pub fn current_game_time(&self) -> NaiveDateTime {
        self.clock.current_game_time()
    }

    /// Game time at which the configured run length is reached.
    pub fn end_game_time(&self) -> NaiveDateTime {
        self.clock.end_game_time(self.params.simulation_hours)
    }

    /// Whether the configured run length has elapsed. Advisory: `update`
    /// keeps working past the end.
    pub fn is_past_end(&self) -> bool {
        self.clock.is_started() && self.current_game_time() >= self.end_game_time()
    }

    /// Real time the configured run length takes at the configured compression.
    pub fn real_duration(&self) -> std::time::Duration {
        self.clock.real_duration_for(self.params.simulation_hours)
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn clock(&self) -> &GameClock<T> {
        &self.clock
    }

    pub fn store(&self) -> &OrderLifecycleStore {
        &self.store
    }

    pub fn riders(&self) -> &RiderPool {
        &self.riders
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}
