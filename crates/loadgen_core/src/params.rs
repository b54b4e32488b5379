use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::sampling::DEFAULT_MAX_ATTEMPTS;
use crate::spatial::{Region, RegionError};

/// Default region: a 12-vertex polygon around Agadir, Morocco, as `[lat, lon]`.
pub const DEFAULT_REGION: [[f64; 2]; 12] = [
    [30.42854544631636, -9.611663818359375],
    [30.45459295698008, -9.53819274902344],
    [30.420256142845158, -9.545745849609377],
    [30.410189613309132, -9.526519775390627],
    [30.385314913418373, -9.482574462890627],
    [30.35806392728733, -9.477081298828127],
    [30.34325042354528, -9.472961425781252],
    [30.329620019722665, -9.481201171875002],
    [30.315987718557867, -9.50798034667969],
    [30.329620019722665, -9.539566040039064],
    [30.347990988731844, -9.567718505859377],
    [30.378206692827195, -9.602050781250002],
];

/// Virtual time of day the simulated day starts at.
pub fn default_day_start() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamsError {
    #[error("{field} is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("invalid region: {0}")]
    Region(#[from] RegionError),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ParamsError {
    ParamsError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Parameters of one load-generation run.
///
/// Missing fields in a config file fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Number of synthetic riders synced before the run.
    pub rider_count: usize,
    /// Regular orders per game hour. `<= 0` disables regular orders.
    pub regular_frequency_per_hour: f64,
    /// Voting orders per game hour. `<= 0` disables voting orders.
    pub voting_frequency_per_hour: f64,
    pub regular_lifetime_minutes: u32,
    pub voting_lifetime_minutes_min: u32,
    pub voting_lifetime_minutes_max: u32,
    /// Origin/destination distance bounds in coordinate degrees (not meters).
    pub distance_min: f64,
    pub distance_max: f64,
    /// Game seconds per real second.
    pub time_compression: f64,
    /// Advisory run length in game hours from the virtual day start.
    pub simulation_hours: f64,
    /// UTC offset attached to order start times, in minutes.
    pub utc_offset_minutes: i32,
    pub day_start: NaiveTime,
    /// Date of the simulated day; today (local) when unset.
    pub start_date: Option<NaiveDate>,
    /// RNG seed. When unset the run is seeded from entropy.
    pub seed: Option<u64>,
    /// Attempt budget for each rejection-sampling loop.
    pub max_sampling_attempts: u32,
    /// Polygon vertices as `[lat, lon]`.
    pub region: Vec<[f64; 2]>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            rider_count: 5,
            regular_frequency_per_hour: 2.0,
            voting_frequency_per_hour: 1.0,
            regular_lifetime_minutes: 10,
            voting_lifetime_minutes_min: 5,
            voting_lifetime_minutes_max: 15,
            distance_min: 0.01,
            distance_max: 0.05,
            time_compression: 1.0,
            simulation_hours: 2.0,
            utc_offset_minutes: 0,
            day_start: default_day_start(),
            start_date: None,
            seed: None,
            max_sampling_attempts: DEFAULT_MAX_ATTEMPTS,
            region: DEFAULT_REGION.to_vec(),
        }
    }
}

impl SimulationParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_rider_count(mut self, count: usize) -> Self {
        self.rider_count = count;
        self
    }

    pub fn with_frequencies(mut self, regular_per_hour: f64, voting_per_hour: f64) -> Self {
        self.regular_frequency_per_hour = regular_per_hour;
        self.voting_frequency_per_hour = voting_per_hour;
        self
    }

    pub fn with_regular_lifetime_minutes(mut self, minutes: u32) -> Self {
        self.regular_lifetime_minutes = minutes;
        self
    }

    pub fn with_voting_lifetime_minutes(mut self, min: u32, max: u32) -> Self {
        self.voting_lifetime_minutes_min = min;
        self.voting_lifetime_minutes_max = max;
        self
    }

    pub fn with_distance_range(mut self, min: f64, max: f64) -> Self {
        self.distance_min = min;
        self.distance_max = max;
        self
    }

    pub fn with_time_compression(mut self, compression: f64) -> Self {
        self.time_compression = compression;
        self
    }

    pub fn with_simulation_hours(mut self, hours: f64) -> Self {
        self.simulation_hours = hours;
        self
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_region(mut self, region: Vec<[f64; 2]>) -> Self {
        self.region = region;
        self
    }

    pub fn with_max_sampling_attempts(mut self, attempts: u32) -> Self {
        self.max_sampling_attempts = attempts;
        self
    }

    /// Build the configured region.
    pub fn build_region(&self) -> Result<Region, ParamsError> {
        Ok(Region::from_pairs(&self.region)?)
    }

    /// Check every field; returns the first problem found.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(self.time_compression.is_finite() && self.time_compression > 0.0) {
            return Err(invalid(
                "time_compression",
                format!("{} (must be finite and > 0)", self.time_compression),
            ));
        }
        if !self.regular_frequency_per_hour.is_finite() {
            return Err(invalid("regular_frequency_per_hour", "must be finite"));
        }
        if !self.voting_frequency_per_hour.is_finite() {
            return Err(invalid("voting_frequency_per_hour", "must be finite"));
        }
        if self.regular_lifetime_minutes == 0 {
            return Err(invalid("regular_lifetime_minutes", "must be at least 1"));
        }
        if self.voting_lifetime_minutes_min == 0 {
            return Err(invalid("voting_lifetime_minutes_min", "must be at least 1"));
        }
        if self.voting_lifetime_minutes_min > self.voting_lifetime_minutes_max {
            return Err(invalid(
                "voting_lifetime_minutes_max",
                format!(
                    "{} is below the minimum {}",
                    self.voting_lifetime_minutes_max, self.voting_lifetime_minutes_min
                ),
            ));
        }
        if !(self.distance_min.is_finite() && self.distance_max.is_finite()) {
            return Err(invalid("distance_min", "distance bounds must be finite"));
        }
        if self.distance_min < 0.0 || self.distance_min > self.distance_max {
            return Err(invalid(
                "distance_max",
                format!(
                    "range [{}, {}] must satisfy 0 <= min <= max",
                    self.distance_min, self.distance_max
                ),
            ));
        }
        if !(self.simulation_hours.is_finite() && self.simulation_hours > 0.0) {
            return Err(invalid("simulation_hours", "must be finite and > 0"));
        }
        if self.utc_offset_minutes.unsigned_abs() >= 24 * 60 {
            return Err(invalid(
                "utc_offset_minutes",
                format!("{} is a day or more", self.utc_offset_minutes),
            ));
        }
        if self.max_sampling_attempts == 0 {
            return Err(invalid("max_sampling_attempts", "must be at least 1"));
        }
        self.build_region()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = SimulationParams::default();
        params.validate().expect("defaults validate");
        assert_eq!(params.day_start, NaiveTime::from_hms_opt(8, 0, 0).expect("time"));
        assert_eq!(params.build_region().expect("region").vertices().len(), 12);
    }

    #[test]
    fn builder_overrides_fields() {
        let params = SimulationParams::default()
            .with_seed(9)
            .with_frequencies(5.0, 0.0)
            .with_time_compression(15.0)
            .with_utc_offset_minutes(180);
        assert_eq!(params.seed, Some(9));
        assert_eq!(params.voting_frequency_per_hour, 0.0);
        assert_eq!(params.time_compression, 15.0);
        params.validate().expect("valid");
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            SimulationParams::default().with_time_compression(0.0),
            SimulationParams::default().with_regular_lifetime_minutes(0),
            SimulationParams::default().with_voting_lifetime_minutes(10, 5),
            SimulationParams::default().with_distance_range(0.05, 0.01),
            SimulationParams::default().with_distance_range(-0.1, 0.01),
            SimulationParams::default().with_simulation_hours(f64::NAN),
            SimulationParams::default().with_utc_offset_minutes(-1440),
            SimulationParams::default().with_utc_offset_minutes(i32::MIN),
            SimulationParams::default().with_utc_offset_minutes(i32::MAX),
            SimulationParams::default().with_max_sampling_attempts(0),
        ];
        for params in cases {
            assert!(
                matches!(params.validate(), Err(ParamsError::Invalid { .. })),
                "{params:?} should be rejected"
            );
        }
    }

    #[test]
    fn bad_region_surfaces_region_error() {
        let params = SimulationParams::default().with_region(vec![[0.0, 0.0], [1.0, 1.0]]);
        assert_eq!(
            params.validate(),
            Err(ParamsError::Region(RegionError::TooFewVertices(2)))
        );
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "rider_count": 12, "time_compression": 60.0, "day_start": "07:30:00" }"#;
        let params: SimulationParams = serde_json::from_str(json).expect("parse");
        assert_eq!(params.rider_count, 12);
        assert_eq!(params.time_compression, 60.0);
        assert_eq!(params.day_start, NaiveTime::from_hms_opt(7, 30, 0).expect("time"));
        assert_eq!(params.regular_lifetime_minutes, 10);
        assert_eq!(params.region.len(), DEFAULT_REGION.len());
    }
}
