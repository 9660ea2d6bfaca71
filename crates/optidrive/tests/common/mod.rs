//! Shared helpers for the integration tests.

#![allow(dead_code)]

use optidrive::prelude::*;
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber honoring `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// f(x) = Σ wᵢ (xᵢ - cᵢ)²
#[derive(Debug, Clone)]
pub struct Quadratic {
    pub weights: Vec<f64>,
    pub center: Vec<f64>,
}

impl Quadratic {
    pub fn new(weights: Vec<f64>, center: Vec<f64>) -> Self {
        assert_eq!(weights.len(), center.len());
        Self { weights, center }
    }

    /// Unit weights, every coordinate centered on `c`.
    pub fn uniform(n: usize, c: f64) -> Self {
        Self::new(vec![1.0; n], vec![c; n])
    }

    pub fn eval(&self, x: &[f64], g: &mut [f64]) -> f64 {
        let mut f = 0.0;
        for i in 0..x.len() {
            let r = x[i] - self.center[i];
            f += self.weights[i] * r * r;
            g[i] = 2.0 * self.weights[i] * r;
        }
        f
    }
}

/// Runs the reverse-communication loop from `x` until the optimizer stops
/// asking for evaluations or new points, or `max_calls` is reached.
pub fn drive(opt: &mut Optimizer, problem: &Quadratic, x: &mut Vec<f64>, max_calls: usize) -> Task {
    let mut g = vec![0.0; x.len()];
    let mut f = 0.0;
    let mut task = opt.start(&mut *x).unwrap();
    for _ in 0..max_calls {
        match task {
            Task::ComputeObjectiveAndGradient => f = problem.eval(x, &mut g),
            Task::NewPoint => {}
            _ => break,
        }
        task = opt.iterate(&mut *x, f, &mut g).unwrap();
    }
    task
}
