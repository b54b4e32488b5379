//! Periodic generation schedule in game seconds.
//!
//! Each generator is a monotonic counter: it fires whenever accumulated game
//! time has reached `next_fire_game_secs` and then moves that mark forward by
//! one interval. Comparing against game time (not wall-clock timers) keeps
//! firing deterministic under a mocked clock.

/// Fixed-rate schedule for one order kind.
#[derive(Debug, Clone)]
pub struct Generator {
    /// Game seconds between two events; infinite when the generator is disabled.
    interval_game_secs: f64,
    next_fire_game_secs: f64,
    fired: u64,
}

impl Generator {
    /// Create from a rate in events per game hour. Rates `<= 0` never fire.
    pub fn from_rate_per_hour(rate_per_hour: f64) -> Self {
        let interval_game_secs = if rate_per_hour > 0.0 {
            3600.0 / rate_per_hour
        } else {
            f64::INFINITY
        };
        Self {
            interval_game_secs,
            next_fire_game_secs: 0.0,
            fired: 0,
        }
    }

    pub fn interval_game_secs(&self) -> f64 {
        self.interval_game_secs
    }

    pub fn next_fire_game_secs(&self) -> f64 {
        self.next_fire_game_secs
    }

    pub fn is_enabled(&self) -> bool {
        self.interval_game_secs.is_finite()
    }

    /// Number of events fired so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Claim the next due event at game time `now`, if any.
    ///
    /// Call in a loop: when polling lags behind several intervals every missed
    /// event is returned in turn, so none is dropped.
    pub fn poll_due(&mut self, now_game_secs: f64) -> bool {
        if !self.is_enabled() || now_game_secs < self.next_fire_game_secs {
            return false;
        }
        self.next_fire_game_secs += self.interval_game_secs;
        self.fired += 1;
        true
    }
}
