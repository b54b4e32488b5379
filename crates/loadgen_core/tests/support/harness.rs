#![allow(dead_code)]

use loadgen_core::backend::DispatchBackend;
use loadgen_core::clock::ManualTimeSource;
use loadgen_core::engine::{SimulationEngine, UpdateReport};
use loadgen_core::error::SimError;
use loadgen_core::params::SimulationParams;
use loadgen_core::test_helpers::{manual_engine, test_params};

/// Engine on a manual clock plus the handle that drives it.
pub struct Harness<B: DispatchBackend> {
    pub engine: SimulationEngine<B, ManualTimeSource>,
    pub time: ManualTimeSource,
}

impl<B: DispatchBackend> Harness<B> {
    /// Build and start an engine; nothing is polled yet.
    pub fn started(params: &SimulationParams, backend: B) -> Self {
        let (mut engine, time) = manual_engine(params, backend).expect("engine");
        engine.start();
        Self { engine, time }
    }

    /// Advance real time by `secs` and run one update.
    pub fn step_real(&mut self, secs: f64) -> Result<UpdateReport, SimError> {
        self.time.advance_secs_f64(secs);
        self.engine.update()
    }

    /// Advance by `secs` of game time (at the configured compression) and run one update.
    pub fn step_game(&mut self, secs: f64) -> Result<UpdateReport, SimError> {
        let compression = self.engine.params().time_compression;
        self.step_real(secs / compression)
    }
}

/// Seeded params with only regular orders enabled.
pub fn regular_only(rate_per_hour: f64) -> SimulationParams {
    test_params().with_frequencies(rate_per_hour, 0.0)
}

/// Seeded params with only voting orders enabled.
pub fn voting_only(rate_per_hour: f64) -> SimulationParams {
    test_params().with_frequencies(0.0, rate_per_hour)
}
