mod support;

use rand::rngs::StdRng;
use rand::SeedableRng;

use loadgen_core::backend::InMemoryBackend;
use loadgen_core::error::SimError;
use loadgen_core::sampling::{RegionSampler, SamplingError};
use loadgen_core::spatial::{planar_distance, Region};
use loadgen_core::test_helpers::{square_region, test_params};
use support::harness::Harness;

#[test]
fn distance_band_converges_on_small_region() {
    let region = Region::from_pairs(&square_region()).expect("region");
    let sampler = RegionSampler::new(region.clone()).with_max_attempts(1_000);
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..500 {
        let origin = sampler.sample_point(&mut rng).expect("origin");
        let destination = sampler
            .sample_destination(&mut rng, origin, 0.01, 0.05)
            .expect("destination within 1000 attempts");
        let d = planar_distance(origin, destination);
        assert!((0.01..=0.05).contains(&d), "distance {d}");
        assert!(region.contains(origin) && region.contains(destination));
    }
}

#[test]
fn engine_orders_respect_region_and_distance() {
    let params = test_params()
        .with_rider_count(30)
        .with_frequencies(600.0, 600.0)
        .with_distance_range(0.02, 0.04)
        .with_time_compression(60.0);
    let region = params.build_region().expect("region");
    let mut h = Harness::started(&params, InMemoryBackend::new());
    h.step_real(1.0).expect("update");

    let created = h.engine.backend().created();
    assert!(created.len() >= 10);
    for (_, request) in created {
        let d = request.origin.distance_to(request.destination);
        assert!((0.02..=0.04).contains(&d), "distance {d}");
        assert!(region.contains(request.origin));
        assert!(region.contains(request.destination));
    }
}

#[test]
fn unreachable_distance_is_fatal() {
    let params = test_params().with_rider_count(1).with_distance_range(0.5, 0.6);
    let mut h = Harness::started(&params, InMemoryBackend::new());

    let err = h.step_real(0.0).expect_err("infeasible");
    assert!(matches!(
        err,
        SimError::Sampling(SamplingError::Infeasible { attempts: 0, .. })
    ));
    assert!(h.engine.backend().created().is_empty());
}

#[test]
fn exhausted_budget_names_the_constraint() {
    // Reachable in principle (below the diagonal) but outside the square from any origin near its center.
    let sampler = RegionSampler::new(Region::from_pairs(&square_region()).expect("region"))
        .with_max_attempts(50);
    let mut rng = StdRng::seed_from_u64(11);
    let center = loadgen_core::spatial::Point::new(30.40, -9.55);

    let err = sampler
        .sample_destination(&mut rng, center, 0.09, 0.1)
        .expect_err("no point of the square is that far from its center");
    match err {
        SamplingError::Infeasible { constraint, attempts } => {
            assert_eq!(attempts, 50);
            assert!(constraint.contains("destination within"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
