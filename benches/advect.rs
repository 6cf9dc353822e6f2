//! Benchmarks for the CPU reference backend.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use sphere_drift::advect::advance;
use sphere_drift::{CpuSimulation, ParticleAttributes, StateSize, Vec3};

fn bench_advance(c: &mut Criterion) {
    let axis = Vec3::new(0.0, 0.6, 0.8);
    c.bench_function("advance", |b| {
        b.iter(|| black_box(advance(black_box(Vec3::X), axis, 0.05)))
    });
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_step");
    let size = StateSize::new(648, 648).unwrap();

    for count in [1_000u32, 10_000, 100_000] {
        let mut rng = StdRng::seed_from_u64(7);
        let attrs = ParticleAttributes::spawn_with(&mut rng, count, 0.1);
        let mut sim = CpuSimulation::new(attrs, size);
        sim.seed();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                sim.step();
                sim.swap();
            })
        });
    }

    group.finish();
}

fn bench_spawn(c: &mut Criterion) {
    c.bench_function("spawn_1000", |b| {
        let mut rng = StdRng::seed_from_u64(3);
        b.iter(|| black_box(ParticleAttributes::spawn_with(&mut rng, 1000, 0.1)))
    });
}

criterion_group!(benches, bench_advance, bench_step, bench_spawn);
criterion_main!(benches);
