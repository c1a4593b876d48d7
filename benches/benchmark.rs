use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use galaxy_nbody::{
    random_cube, BarnesHut, DirectSummation, ForceEvaluator, Simulation, SimulationParameters,
};
use nalgebra::Vector3;

fn direct_vs_barnes_hut(c: &mut Criterion) {
    let params = SimulationParameters::default();

    let mut group = c.benchmark_group("direct vs barnes hut");
    for n in [100, 1_000, 10_000] {
        let bodies = random_cube(n, 10., 0).unwrap();
        let mut forces = vec![Vector3::zeros(); n];

        // direct summation is too slow to be useful at the largest size
        if n <= 1_000 {
            group.bench_with_input(BenchmarkId::new("direct", n), &bodies, |b, bodies| {
                let mut ds = DirectSummation::new();
                b.iter(|| ds.calculate_forces(bodies, &mut forces, &params).unwrap())
            });

            group.bench_with_input(BenchmarkId::new("direct rayon", n), &bodies, |b, bodies| {
                let mut ds = DirectSummation::new().rayon_iter();
                b.iter(|| ds.calculate_forces(bodies, &mut forces, &params).unwrap())
            });
        }

        group.bench_with_input(BenchmarkId::new("barnes hut", n), &bodies, |b, bodies| {
            let mut bh = BarnesHut::new();
            b.iter(|| bh.calculate_forces(bodies, &mut forces, &params).unwrap())
        });

        group.bench_with_input(
            BenchmarkId::new("barnes hut multithreaded", n),
            &bodies,
            |b, bodies| {
                let mut bh = BarnesHut::new().multithreaded(4);
                b.iter(|| bh.calculate_forces(bodies, &mut forces, &params).unwrap())
            },
        );

        group.bench_with_input(BenchmarkId::new("barnes hut rayon", n), &bodies, |b, bodies| {
            let mut bh = BarnesHut::new().rayon_iter();
            b.iter(|| bh.calculate_forces(bodies, &mut forces, &params).unwrap())
        });
    }
}

fn barnes_hut_theta(c: &mut Criterion) {
    let bodies = random_cube(1_000, 10., 1).unwrap();

    let mut group = c.benchmark_group("barnes hut theta");
    for theta in [0., 0.5, 1.] {
        let params = SimulationParameters::default().with_theta(theta);

        group.bench_with_input(BenchmarkId::new("step", theta), &theta, |b, _| {
            b.iter_batched_ref(
                || Simulation::new(bodies.clone(), params).unwrap(),
                |simulation| simulation.simulate(10, 0).unwrap(),
                BatchSize::SmallInput,
            )
        });
    }
}

criterion_group!(benches, direct_vs_barnes_hut, barnes_hut_theta);
criterion_main!(benches);
