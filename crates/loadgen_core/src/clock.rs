//! Game clock: maps elapsed real time onto an accelerated game-time axis.
//!
//! Game time starts at a fixed virtual instant (by default 08:00:00 of the
//! current local date) and advances `compression` game-seconds for every real
//! second. Real time is read through [`TimeSource`] so tests can drive the
//! clock by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// Monotonic real-time source. `now` is measured from an arbitrary origin and
/// must never go backwards.
pub trait TimeSource {
    fn now(&self) -> Duration;
}

/// Wall-clock backed source for real runs.
#[derive(Debug, Clone)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven source. Clones share the same reading, so a test can keep one
/// handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    micros: Arc<AtomicU64>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.micros
            .fetch_add(by.as_micros() as u64, Ordering::SeqCst);
    }

    /// Advance by fractional seconds, rounded to the nearest microsecond.
    pub fn advance_secs_f64(&self, secs: f64) {
        let micros = (secs.max(0.0) * 1_000_000.0).round() as u64;
        self.micros.fetch_add(micros, Ordering::SeqCst);
    }

    /// Move to an absolute reading. Readings earlier than the current one are ignored.
    pub fn set(&self, at: Duration) {
        self.micros
            .fetch_max(at.as_micros() as u64, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

/// Virtual start of the simulated day: `date` (local today if `None`) at `day_start`.
pub fn virtual_day_start(date: Option<NaiveDate>, day_start: NaiveTime) -> NaiveDateTime {
    date.unwrap_or_else(|| Local::now().date_naive())
        .and_time(day_start)
}

/// Convert fractional game seconds to a chrono duration at microsecond resolution.
pub fn game_duration(secs: f64) -> chrono::Duration {
    chrono::Duration::microseconds((secs * 1_000_000.0).round() as i64)
}

/// UTC offset as `+HH:MM` / `-HH:MM` from a signed number of minutes.
pub fn format_utc_offset(offset_minutes: i32) -> String {
    let sign = if offset_minutes < 0 { '-' } else { '+' };
    let abs = offset_minutes.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs / 60, abs % 60)
}

/// Local timestamp annotated with a fixed UTC offset, as the dispatch API expects.
pub fn format_start_time(at: NaiveDateTime, offset_minutes: i32) -> String {
    format!(
        "{}{}",
        at.format("%Y-%m-%d %H:%M:%S"),
        format_utc_offset(offset_minutes)
    )
}

#[derive(Debug, Clone)]
pub struct GameClock<T: TimeSource = SystemTimeSource> {
    sim_start_game_time: NaiveDateTime,
    real_start: Option<Duration>,
    compression: f64,
    time: T,
}

impl<T: TimeSource> GameClock<T> {
    pub fn new(sim_start_game_time: NaiveDateTime, compression: f64, time: T) -> Self {
        debug_assert!(
            compression.is_finite() && compression > 0.0,
            "compression must be positive"
        );
        Self {
            sim_start_game_time,
            real_start: None,
            compression,
            time,
        }
    }

    /// Start (or restart) the clock at the current real instant.
    pub fn start(&mut self) {
        self.real_start = Some(self.time.now());
    }

    pub fn is_started(&self) -> bool {
        self.real_start.is_some()
    }

    pub fn compression(&self) -> f64 {
        self.compression
    }

    pub fn sim_start_game_time(&self) -> NaiveDateTime {
        self.sim_start_game_time
    }

    /// Game seconds since `start()`; zero while the clock is inactive.
    pub fn elapsed_game_seconds(&self) -> f64 {
        match self.real_start {
            None => 0.0,
            Some(started) => {
                let real = self.time.now().saturating_sub(started);
                real.as_secs_f64() * self.compression
            }
        }
    }

    pub fn current_game_time(&self) -> NaiveDateTime {
        self.game_time_at(self.elapsed_game_seconds())
    }

    /// Game timestamp `elapsed_secs` game seconds after the virtual start.
    pub fn game_time_at(&self, elapsed_secs: f64) -> NaiveDateTime {
        self.sim_start_game_time + game_duration(elapsed_secs)
    }

    /// Game timestamp at which a run of `hours` game hours ends.
    pub fn end_game_time(&self, hours: f64) -> NaiveDateTime {
        self.game_time_at(hours * 3600.0)
    }

    /// Real time needed for `hours` of game time to elapse.
    pub fn real_duration_for(&self, hours: f64) -> Duration {
        Duration::from_secs_f64((hours * 3600.0 / self.compression).max(0.0))
    }
}
