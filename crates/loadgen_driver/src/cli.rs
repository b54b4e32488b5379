//! Command-line interface and parameter loading.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use loadgen_core::params::SimulationParams;

#[derive(Debug, Parser)]
#[command(
    name = "loadgen",
    about = "Synthetic rider load generator for a taxi dispatch backend",
    long_about = "Registers synthetic riders, then creates and expires ride orders on a\n\
                  time-compressed simulated day until the configured run length elapses."
)]
pub struct Cli {
    /// JSON file with simulation parameters; missing fields use defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Base URL of the dispatch API
    #[arg(long, env = "LOADGEN_API_URL")]
    pub base_url: Option<String>,

    /// Admin token sent with every API request
    #[arg(long, env = "LOADGEN_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Admin user hash sent with every API request
    #[arg(long, env = "LOADGEN_API_USER_HASH", hide_env_values = true)]
    pub user_hash: Option<String>,

    /// Use an in-memory backend instead of the dispatch API
    #[arg(long)]
    pub dry_run: bool,

    /// Real seconds between two engine updates
    #[arg(long, default_value_t = 2.0)]
    pub poll_secs: f64,

    /// RNG seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Game seconds per real second
    #[arg(long)]
    pub compression: Option<f64>,

    /// Run length in game hours
    #[arg(long)]
    pub hours: Option<f64>,

    /// Number of synthetic riders
    #[arg(long)]
    pub riders: Option<usize>,

    /// Print active-order snapshots as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Where orders go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendTarget {
    InMemory,
    Http {
        base_url: String,
        token: String,
        user_hash: String,
    },
}

impl Cli {
    /// Params from `--config` (or defaults) with CLI overrides applied, validated.
    pub fn params(&self) -> Result<SimulationParams> {
        let mut params = match &self.config {
            Some(path) => load_params(path)?,
            None => SimulationParams::default(),
        };
        if let Some(seed) = self.seed {
            params = params.with_seed(seed);
        }
        if let Some(compression) = self.compression {
            params = params.with_time_compression(compression);
        }
        if let Some(hours) = self.hours {
            params = params.with_simulation_hours(hours);
        }
        if let Some(riders) = self.riders {
            params = params.with_rider_count(riders);
        }
        params.validate()?;
        Ok(params)
    }

    pub fn poll_interval(&self) -> Result<Duration> {
        if !(self.poll_secs.is_finite() && self.poll_secs > 0.0) {
            bail!("--poll-secs must be a positive number, got {}", self.poll_secs);
        }
        Ok(Duration::from_secs_f64(self.poll_secs))
    }

    pub fn backend_target(&self) -> Result<BackendTarget> {
        if self.dry_run {
            return Ok(BackendTarget::InMemory);
        }
        let (Some(base_url), Some(token), Some(user_hash)) =
            (&self.base_url, &self.token, &self.user_hash)
        else {
            bail!("--base-url, --token and --user-hash are required unless --dry-run is set");
        };
        Ok(BackendTarget::Http {
            base_url: base_url.clone(),
            token: token.clone(),
            user_hash: user_hash.clone(),
        })
    }
}

pub fn load_params(path: &Path) -> Result<SimulationParams> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}
