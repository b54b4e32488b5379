//! Rejection sampling of trip endpoints inside a [`Region`].
//!
//! Both loops are bounded. When a budget runs out the sampler reports the
//! constraint as infeasible instead of spinning: a region much smaller than
//! its bounding box, or a distance range that no point of the region can
//! satisfy from a given origin, would otherwise hang the simulation.

use rand::Rng;

use crate::spatial::{planar_distance, Point, Region};

/// Default attempt budget for each sampling loop.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    #[error("invalid distance range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },

    #[error("infeasible constraint: {constraint} not satisfied after {attempts} attempts")]
    Infeasible { constraint: String, attempts: u32 },
}

/// Draws uniformly distributed points from a region.
#[derive(Debug, Clone)]
pub struct RegionSampler {
    region: Region,
    max_point_attempts: u32,
    max_destination_attempts: u32,
}

impl RegionSampler {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            max_point_attempts: DEFAULT_MAX_ATTEMPTS,
            max_destination_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Use the same attempt budget (at least 1) for both sampling loops.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_point_attempts = attempts.max(1);
        self.max_destination_attempts = attempts.max(1);
        self
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Sample a point inside the region (boundary included).
    ///
    /// Draws uniformly from the bounding box and keeps the first hit. The
    /// expected number of draws is `bbox_area / region_area`.
    pub fn sample_point<R: Rng>(&self, rng: &mut R) -> Result<Point, SamplingError> {
        let b = self.region.bounds();
        for _ in 0..self.max_point_attempts {
            let candidate = Point::new(
                rng.gen_range(b.lat_min..=b.lat_max),
                rng.gen_range(b.lon_min..=b.lon_max),
            );
            if self.region.contains(candidate) {
                return Ok(candidate);
            }
        }
        Err(SamplingError::Infeasible {
            constraint: format!(
                "point inside region (area {:e} of bounding box {:e})",
                self.region.area(),
                b.area()
            ),
            attempts: self.max_point_attempts,
        })
    }

    /// Sample a destination whose planar distance to `origin` lies in
    /// `[dist_min, dist_max]` (inclusive, degrees).
    ///
    /// The acceptance area is the annulus around `origin` intersected with the
    /// region. If that intersection is empty or tiny the loop exhausts its
    /// budget and returns [`SamplingError::Infeasible`].
    pub fn sample_destination<R: Rng>(
        &self,
        rng: &mut R,
        origin: Point,
        dist_min: f64,
        dist_max: f64,
    ) -> Result<Point, SamplingError> {
        if !dist_min.is_finite() || !dist_max.is_finite() || dist_min < 0.0 || dist_min > dist_max {
            return Err(SamplingError::InvalidRange {
                min: dist_min,
                max: dist_max,
            });
        }
        if dist_min > self.region.bounds().diagonal() {
            return Err(SamplingError::Infeasible {
                constraint: format!(
                    "minimum distance {dist_min} exceeds the region's bounding-box diagonal"
                ),
                attempts: 0,
            });
        }

        for _ in 0..self.max_destination_attempts {
            let candidate = self.sample_point(rng)?;
            let distance = planar_distance(origin, candidate);
            if distance >= dist_min && distance <= dist_max {
                return Ok(candidate);
            }
        }
        Err(SamplingError::Infeasible {
            constraint: format!(
                "destination within [{dist_min}, {dist_max}] of ({}, {})",
                origin.lat, origin.lon
            ),
            attempts: self.max_destination_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn triangle() -> Region {
        Region::from_pairs(&[[0.0, 0.0], [0.0, 1.0], [1.0, 0.0]]).expect("triangle")
    }

    #[test]
    fn sampled_points_stay_inside() {
        let sampler = RegionSampler::new(triangle());
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2_000 {
            let p = sampler.sample_point(&mut rng).expect("point");
            assert!(p.lat + p.lon <= 1.0 + 1e-12, "{p:?} outside triangle");
        }
    }

    #[test]
    fn destinations_respect_range() {
        let sampler = RegionSampler::new(triangle());
        let mut rng = StdRng::seed_from_u64(11);
        let origin = Point::new(0.2, 0.2);
        for _ in 0..500 {
            let dest = sampler
                .sample_destination(&mut rng, origin, 0.1, 0.3)
                .expect("destination");
            let d = planar_distance(origin, dest);
            assert!((0.1..=0.3).contains(&d), "distance {d} out of range");
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let sampler = RegionSampler::new(triangle());
        let mut rng = StdRng::seed_from_u64(1);
        let err = sampler
            .sample_destination(&mut rng, Point::new(0.1, 0.1), 0.5, 0.2)
            .expect_err("inverted range");
        assert_eq!(err, SamplingError::InvalidRange { min: 0.5, max: 0.2 });
    }

    #[test]
    fn unreachable_annulus_fails_instead_of_hanging() {
        let sampler = RegionSampler::new(triangle()).with_max_attempts(200);
        let mut rng = StdRng::seed_from_u64(3);
        // Nothing in the triangle is between 1.3 and 1.4 away from the origin corner.
        let err = sampler
            .sample_destination(&mut rng, Point::new(0.0, 0.0), 1.3, 1.4)
            .expect_err("infeasible");
        assert!(matches!(err, SamplingError::Infeasible { attempts: 200, .. }));
        assert!(err.to_string().contains("infeasible constraint"));
    }

    #[test]
    fn distance_beyond_bounds_fails_fast() {
        let sampler = RegionSampler::new(triangle());
        let mut rng = StdRng::seed_from_u64(3);
        let err = sampler
            .sample_destination(&mut rng, Point::new(0.0, 0.0), 5.0, 6.0)
            .expect_err("infeasible");
        assert!(matches!(err, SamplingError::Infeasible { attempts: 0, .. }));
    }
}
