//! End-to-end optimization scenarios.

mod common;

use approx::assert_relative_eq;
use common::{drive, init_tracing, Quadratic};
use optidrive::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn test_conjugate_gradient_reaches_ones() {
    init_tracing();
    let problem = Quadratic::uniform(10, 1.0);
    let mut opt = Optimizer::nlcg(Shape::vector(10), NlcgConfig::default()).unwrap();
    let mut x = vec![0.0_f64; 10];
    let task = drive(&mut opt, &problem, &mut x, 200);
    assert_eq!(task, Task::FinalPoint);
    assert!(opt.iterations() <= 10);
    for xi in &x {
        assert_relative_eq!(*xi, 1.0, epsilon = 1e-5);
    }
}

#[test]
fn test_every_nlcg_rule_solves_an_ill_conditioned_quadratic() {
    let problem = Quadratic::new(vec![1.0, 3.0, 10.0, 30.0], vec![1.0, -2.0, 0.5, 4.0]);
    for rule in [
        NlcgRule::FletcherReeves,
        NlcgRule::HestenesStiefel,
        NlcgRule::PolakRibierePolyak,
        NlcgRule::Fletcher,
        NlcgRule::LiuStorey,
        NlcgRule::DaiYuan,
        NlcgRule::PerryShanno,
        NlcgRule::HagerZhang,
    ] {
        let config = NlcgConfig::new().with_rule(rule).with_grtol(1e-8);
        let mut opt = Optimizer::nlcg(Shape::vector(4), config).unwrap();
        let mut x = vec![0.0_f64; 4];
        let task = drive(&mut opt, &problem, &mut x, 10_000);
        assert_eq!(task, Task::FinalPoint, "{rule}: {}", opt.reason());
        for (xi, ci) in x.iter().zip(&problem.center) {
            assert_relative_eq!(*xi, *ci, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_lower_bound_keeps_variables_feasible() {
    init_tracing();
    let problem = Quadratic::new(vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![-1.0, -2.0, -0.5, -3.0, -1.5]);
    let mut opt = Optimizer::vmlmb(
        Shape::vector(5),
        VmlmbConfig::default(),
        0.0,
        BoundSpec::Absent,
    )
    .unwrap();
    assert_eq!(opt.name(), "VMLMB");
    let mut x = vec![1.0_f64; 5];
    let task = drive(&mut opt, &problem, &mut x, 1000);
    assert_eq!(task, Task::FinalPoint);
    assert!(x.iter().all(|&xi| xi >= 0.0));
    assert!(x.iter().all(|&xi| xi.abs() < 1e-8));
    assert!(opt.projections() > 0);
    assert_eq!(opt.projections(), opt.evaluations());
}

#[test]
fn test_box_with_interior_and_active_variables() {
    let problem = Quadratic::new(vec![1.0, 1.0, 1.0], vec![-5.0, 0.25, 5.0]);
    let lower = [-1.0_f64, -1.0, -1.0];
    let upper = [1.0_f64, 1.0, 1.0];
    let mut opt = Optimizer::vmlmb(
        Shape::vector(3),
        VmlmbConfig::new().with_grtol(1e-10),
        &lower[..],
        &upper[..],
    )
    .unwrap();
    let mut x = vec![0.0_f64; 3];
    assert_eq!(drive(&mut opt, &problem, &mut x, 1000), Task::FinalPoint);
    assert_relative_eq!(x[0], -1.0, epsilon = 1e-8);
    assert_relative_eq!(x[1], 0.25, epsilon = 1e-6);
    assert_relative_eq!(x[2], 1.0, epsilon = 1e-8);
}

#[test]
fn test_scalar_and_uniform_bounds_are_equivalent() {
    let problem = Quadratic::new(vec![1.0, 4.0, 9.0, 16.0], vec![-2.0, 0.5, 3.0, -0.25]);
    let uniform_lower = vec![-0.5_f64; 4];
    let uniform_upper = vec![1.0_f64; 4];

    let mut scalar = Optimizer::vmlmb(Shape::vector(4), VmlmbConfig::default(), -0.5, 1.0).unwrap();
    let mut array = Optimizer::vmlmb(
        Shape::vector(4),
        VmlmbConfig::default(),
        uniform_lower.as_slice(),
        uniform_upper.as_slice(),
    )
    .unwrap();

    let mut x_scalar = vec![3.0_f64, -3.0, 0.0, 0.25];
    let mut x_array = x_scalar.clone();
    let task_scalar = drive(&mut scalar, &problem, &mut x_scalar, 1000);
    let task_array = drive(&mut array, &problem, &mut x_array, 1000);
    assert_eq!(task_scalar, task_array);
    assert_eq!(x_scalar, x_array);
    assert_eq!(scalar.summary(), array.summary());
}

#[test]
fn test_start_projects_initial_point() {
    let mut opt = Optimizer::vmlmb(Shape::from([2, 2]), VmlmbConfig::default(), 0.0, 2.0).unwrap();
    let mut x = vec![-1.0_f64, 1.0, 5.0, f64::INFINITY];
    opt.start(ArrayMut::new(x.as_mut_slice(), Shape::from([2, 2]))).unwrap();
    assert_eq!(x, vec![0.0, 1.0, 2.0, 2.0]);
}

#[test]
fn test_bound_of_wrong_length_is_rejected() {
    let short = vec![0.0_f64; 4];
    let err = Optimizer::vmlmb(
        Shape::vector(5),
        VmlmbConfig::default(),
        short.as_slice(),
        BoundSpec::Absent,
    )
    .unwrap_err();
    assert!(err.is_dimension_mismatch());

    let reshaped = vec![0.0_f64; 6];
    let err = Optimizer::vmlmb(
        Shape::from([2, 3]),
        VmlmbConfig::default(),
        BoundSpec::Absent,
        Array::new(reshaped.as_slice(), Shape::from([3, 2])),
    )
    .unwrap_err();
    assert!(err.is_dimension_mismatch());
}

#[test]
fn test_bound_of_wrong_precision_is_rejected() {
    let lower = vec![0.0_f32; 3];
    let err = Optimizer::vmlmb(
        Shape::vector(3),
        VmlmbConfig::default(),
        lower.as_slice(),
        BoundSpec::Absent,
    )
    .unwrap_err();
    assert!(err.is_dimension_mismatch());
}

#[test]
fn test_crossed_bounds_stop_at_start() {
    let lower = vec![0.0_f64, 2.0];
    let mut opt = Optimizer::vmlmb(Shape::vector(2), VmlmbConfig::default(), lower.as_slice(), 1.0)
        .unwrap();
    let mut x = vec![0.0_f64; 2];
    assert_eq!(opt.start(&mut x).unwrap(), Task::Error);
    assert_eq!(opt.status(), Status::InfeasibleBounds);

    let mut g = vec![0.0_f64; 2];
    assert!(matches!(
        opt.iterate(&mut x, 0.0, &mut g),
        Err(OptimizerError::InvalidSequence { .. })
    ));
}

#[test]
fn test_single_precision_bounded_run() {
    let config = VmlmbConfig::new().with_single(true).with_grtol(1e-4);
    let mut opt = Optimizer::vmlmb(Shape::vector(3), config, BoundSpec::Absent, 0.5).unwrap();
    let mut x = vec![0.0_f32; 3];
    let mut g = vec![0.0_f32; 3];
    let mut f = 0.0;
    let mut task = opt.start(&mut x).unwrap();
    for _ in 0..1000 {
        match task {
            Task::ComputeObjectiveAndGradient => {
                f = 0.0;
                for (xi, gi) in x.iter().zip(g.iter_mut()) {
                    f += f64::from((xi - 2.0) * (xi - 2.0));
                    *gi = 2.0 * (xi - 2.0);
                }
            }
            Task::NewPoint => {}
            _ => break,
        }
        task = opt.iterate(&mut x, f, &mut g).unwrap();
    }
    assert_eq!(task, Task::FinalPoint);
    assert!(x.iter().all(|&xi| (xi - 0.5).abs() < 1e-6));
}
