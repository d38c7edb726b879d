//! Benchmarks for the Gravity CA update engine.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use gravity_ca::{
    compute::{GravityMap, Topology},
    schema::{MapConfig, Pattern, Seed},
};

fn seeded_map(size: usize) -> GravityMap {
    let config = MapConfig {
        width: size,
        height: size,
        topology: Topology::Torus,
        seed: Some(7),
        ..MapConfig::default()
    };

    let seed = Seed {
        pattern: Pattern::Scatter {
            chance: 0.05,
            mass_divisor: 1 << 25,
            seed: 7,
        },
    };

    let mut map = GravityMap::new(&config).unwrap();
    seed.apply(&mut map).unwrap();
    map.set_running(true);
    map
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for size in [32, 64, 125, 256] {
        let mut map = seeded_map(size);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &size,
            |b, _| {
                b.iter(|| {
                    black_box(&mut map).tick();
                });
            },
        );
    }

    group.finish();
}

fn bench_paused_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("paused_stats");

    for size in [125, 256] {
        let mut map = seeded_map(size);
        map.set_running(false);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &size,
            |b, _| {
                b.iter(|| {
                    map.update();
                    black_box(map.stats());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_tick, bench_paused_stats);
criterion_main!(benches);
