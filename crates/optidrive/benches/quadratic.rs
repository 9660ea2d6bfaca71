//! Benchmarks driving each algorithm on random separable quadratics.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use optidrive::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// f(x) = Σ wᵢ (xᵢ - cᵢ)²
#[derive(Debug)]
struct Quadratic {
    weights: Vec<f64>,
    center: Vec<f64>,
}

impl Quadratic {
    fn random(n: usize, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self {
            weights: (0..n).map(|_| rng.gen_range(1.0..100.0)).collect(),
            center: (0..n).map(|_| rng.gen_range(-2.0..2.0)).collect(),
        }
    }

    fn eval(&self, x: &[f64], g: &mut [f64]) -> f64 {
        let mut f = 0.0;
        for i in 0..x.len() {
            let r = x[i] - self.center[i];
            f += self.weights[i] * r * r;
            g[i] = 2.0 * self.weights[i] * r;
        }
        f
    }
}

fn solve(mut opt: Optimizer, problem: &Quadratic) -> Task {
    let n = problem.weights.len();
    let mut x = vec![0.0; n];
    let mut g = vec![0.0; n];
    let mut f = 0.0;
    let Ok(mut task) = opt.start(&mut x) else {
        return Task::Error;
    };
    loop {
        match task {
            Task::ComputeObjectiveAndGradient => f = problem.eval(&x, &mut g),
            Task::NewPoint => {}
            _ => return task,
        }
        task = match opt.iterate(&mut x, f, &mut g) {
            Ok(task) => task,
            Err(_) => return Task::Error,
        };
    }
}

fn benchmark_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("separable_quadratic");

    for &dim in &[10, 100, 1000] {
        let problem = Quadratic::random(dim, 42);
        let config = NlcgConfig::new().with_grtol(1e-8).with_max_iterations(10_000);

        group.bench_with_input(BenchmarkId::new("nlcg", dim), &dim, |b, &dim| {
            b.iter(|| {
                let opt = Optimizer::nlcg(Shape::vector(dim), config.clone()).unwrap();
                solve(opt, black_box(&problem))
            });
        });

        group.bench_with_input(BenchmarkId::new("lbfgs", dim), &dim, |b, &dim| {
            b.iter(|| {
                let opt = Optimizer::vmlmb(
                    Shape::vector(dim),
                    VmlmbConfig::new().with_grtol(1e-8),
                    BoundSpec::Absent,
                    BoundSpec::Absent,
                )
                .unwrap();
                solve(opt, black_box(&problem))
            });
        });

        group.bench_with_input(BenchmarkId::new("vmlmb_box", dim), &dim, |b, &dim| {
            b.iter(|| {
                let opt = Optimizer::vmlmb(
                    Shape::vector(dim),
                    VmlmbConfig::new().with_grtol(1e-8),
                    -1.0,
                    1.0,
                )
                .unwrap();
                solve(opt, black_box(&problem))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_algorithms);
criterion_main!(benches);
