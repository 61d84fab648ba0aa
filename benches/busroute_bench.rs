//! Seed, fitness and full-run timings on a 50-stop instance.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use u_busroute::api::{AlgorithmMode, BusInput, OptimizationRequest, StopInput};
use u_busroute::builder::build;
use u_busroute::evaluation::{FitnessEvaluator, FitnessWeights};
use u_busroute::hybrid::{HybridController, SolverConfig};
use u_busroute::rl::ValueStore;

fn request(mode: AlgorithmMode) -> OptimizationRequest {
    let stops = (0..50u64)
        .map(|i| {
            let k = i as f64;
            let lat = 12.90 + 0.002 * (k * 7.0 % 23.0);
            let lng = 77.50 + 0.002 * (k * 11.0 % 29.0);
            StopInput::new(i + 1, lat, lng, 1 + (i % 6) as i64)
        })
        .collect();
    let buses = (0..6u64).map(|i| BusInput::new(i + 1, 40)).collect();
    OptimizationRequest::new(mode, stops, buses)
        .with_depot(12.93, 77.53)
        .with_seed(42)
}

fn bench_build(c: &mut Criterion) {
    let req = request(AlgorithmMode::Genetic);
    c.bench_function("build_50", |b| {
        b.iter(|| build(black_box(&req), None).map(|out| out.seed))
    });
}

fn bench_fitness(c: &mut Criterion) {
    let req = request(AlgorithmMode::Genetic);
    let built = build(&req, None).expect("valid request");
    let fitness = FitnessEvaluator::new(&built.model, FitnessWeights::default());
    c.bench_function("fitness_50", |b| {
        b.iter(|| fitness.score(black_box(&built.seed)))
    });
}

fn bench_optimize(c: &mut Criterion) {
    let controller = HybridController::new(SolverConfig::fast())
        .expect("valid config")
        .with_value_store(Arc::new(ValueStore::default()));
    let mut group = c.benchmark_group("optimize_50");
    group.sample_size(10);
    for mode in [AlgorithmMode::Genetic, AlgorithmMode::Rl, AlgorithmMode::Hybrid] {
        let req = request(mode);
        group.bench_function(mode.name(), |b| {
            b.iter(|| controller.optimize(black_box(&req)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_fitness, bench_optimize);
criterion_main!(benches);
