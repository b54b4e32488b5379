//! Benchmarks for trip sampling and engine stepping using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use loadgen_core::backend::InMemoryBackend;
use loadgen_core::params::SimulationParams;
use loadgen_core::sampling::RegionSampler;
use loadgen_core::spatial::Region;
use loadgen_core::test_helpers::{manual_engine, test_params};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn bench_destination_sampling(c: &mut Criterion) {
    let bands = vec![
        ("short", 0.005, 0.01),
        ("default", 0.01, 0.05),
        ("long", 0.05, 0.1),
    ];
    let region = SimulationParams::default()
        .build_region()
        .expect("default region");
    let sampler = RegionSampler::new(region);

    let mut group = c.benchmark_group("destination_sampling");
    for (name, min, max) in bands {
        group.bench_with_input(BenchmarkId::from_parameter(name), &(min, max), |b, &(min, max)| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| {
                let origin = sampler.sample_point(&mut rng).expect("origin");
                black_box(sampler.sample_destination(&mut rng, origin, min, max))
            });
        });
    }
    group.finish();
}

fn bench_engine_hour(c: &mut Criterion) {
    let riders = vec![10usize, 100, 1000];

    let mut group = c.benchmark_group("engine_one_game_hour");
    for count in riders {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let params = test_params()
                    .with_rider_count(count)
                    .with_frequencies(120.0, 60.0)
                    .with_time_compression(3600.0);
                let (mut engine, time) =
                    manual_engine(&params, InMemoryBackend::new()).expect("engine");
                engine.start();
                for _ in 0..60 {
                    time.advance_secs_f64(1.0 / 60.0);
                    black_box(engine.update().expect("update"));
                }
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_destination_sampling, bench_engine_hour);
criterion_main!(benches);
