//! Load generator entry point.
//!
//! Syncs the synthetic rider pool, then steps the simulation engine on a fixed
//! real-time poll interval until the configured run length has elapsed,
//! printing the active orders after every step.

mod cli;
mod report;

use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use loadgen_core::backend::http::{ApiCredentials, HttpBackend};
use loadgen_core::backend::{DispatchBackend, InMemoryBackend};
use loadgen_core::clock::format_start_time;
use loadgen_core::engine::SimulationEngine;
use loadgen_core::orders::OrderKind;
use loadgen_core::riders::RiderPool;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{BackendTarget, Cli};

fn build_backend(target: BackendTarget) -> Result<Box<dyn DispatchBackend>> {
    Ok(match target {
        BackendTarget::InMemory => {
            info!("dry run: orders stay in memory");
            Box::new(InMemoryBackend::new())
        }
        BackendTarget::Http {
            base_url,
            token,
            user_hash,
        } => {
            info!(%base_url, "using dispatch api");
            let backend = HttpBackend::new(&base_url, ApiCredentials { token, user_hash })
                .context("building http client")?;
            Box::new(backend)
        }
    })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let params = cli.params()?;
    let poll_interval = cli.poll_interval()?;
    let mut backend = build_backend(cli.backend_target()?)?;
    info!(
        riders = params.rider_count,
        compression = params.time_compression,
        hours = params.simulation_hours,
        seed = ?params.seed,
        "configuration loaded"
    );

    let riders = RiderPool::sync(&mut backend, params.rider_count).context("syncing riders")?;
    let mut engine = SimulationEngine::with_system_clock(&params, riders, backend)?;

    engine.start();
    info!(
        end = %engine.end_game_time(),
        real_secs = engine.real_duration().as_secs_f64(),
        "running until the simulated day ends"
    );

    while !engine.is_past_end() {
        let step = engine.update().context("simulation step failed")?;
        if !step.failed_cancellations.is_empty() {
            warn!(count = step.failed_cancellations.len(), "some expired orders could not be cancelled");
        }

        let game_time = format_start_time(engine.current_game_time(), params.utc_offset_minutes);
        let rows = engine.active_orders_view();
        if cli.json {
            println!("{}", report::render_json_line(&game_time, &rows)?);
        } else {
            print!("{}", report::render_table(&game_time, &rows));
        }

        thread::sleep(poll_interval);
    }

    // One last sweep so orders that expired during the final sleep are cancelled.
    engine.update().context("final simulation step failed")?;

    let stats = engine.stats();
    for kind in [OrderKind::Regular, OrderKind::Voting] {
        let per_kind = stats.for_kind(kind);
        info!(
            %kind,
            fired = per_kind.fired,
            created = per_kind.created,
            skipped = per_kind.skipped_no_rider,
            "generation totals"
        );
    }
    info!(
        expired = stats.expired,
        cancel_failures = stats.cancel_failures,
        still_active = engine.store().len(),
        "simulation finished"
    );
    Ok(())
}
