//! Tests of the task protocol as seen through optimizer instances.

mod common;

use common::{drive, init_tracing, Quadratic};
use optidrive::prelude::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn shape_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..5, 0..4)
}

fn both_algorithms(shape: &Shape) -> Vec<Optimizer> {
    vec![
        Optimizer::nlcg(shape.clone(), NlcgConfig::default()).unwrap(),
        Optimizer::vmlmb(
            shape.clone(),
            VmlmbConfig::default(),
            BoundSpec::Absent,
            BoundSpec::Absent,
        )
        .unwrap(),
        Optimizer::vmlmb(shape.clone(), VmlmbConfig::default(), -1.0, 1.0).unwrap(),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_start_asks_for_evaluation(lengths in shape_strategy()) {
        let shape = Shape::new(lengths).unwrap();
        for mut opt in both_algorithms(&shape) {
            let mut x = vec![0.0_f64; shape.count()];
            let task = opt.start(ArrayMut::new(x.as_mut_slice(), shape.clone())).unwrap();
            prop_assert_eq!(task, Task::ComputeObjectiveAndGradient);
            prop_assert_eq!(opt.iterations(), 0);
            prop_assert_eq!(opt.evaluations(), 0);
            prop_assert_eq!(opt.restarts(), 0);
        }
    }

    #[test]
    fn test_other_shape_is_rejected(
        lengths in shape_strategy(),
        other in shape_strategy(),
    ) {
        let shape = Shape::new(lengths).unwrap();
        let other = Shape::new(other).unwrap();
        prop_assume!(shape != other);
        for mut opt in both_algorithms(&shape) {
            let mut x = vec![0.0_f64; other.count()];
            let err = opt.start(ArrayMut::new(x.as_mut_slice(), other.clone())).unwrap_err();
            prop_assert!(err.is_dimension_mismatch());
            prop_assert_eq!(opt.status(), Status::NotStarted);
        }
    }
}

#[test]
fn test_transposed_buffer_is_rejected() {
    init_tracing();
    let shape = Shape::from([2, 3]);
    let mut opt = Optimizer::nlcg(shape.clone(), NlcgConfig::default()).unwrap();
    let mut x = vec![0.0_f64; 6];
    let mut g = vec![0.0_f64; 6];
    opt.start(ArrayMut::new(x.as_mut_slice(), shape.clone())).unwrap();

    let err = opt
        .iterate(
            ArrayMut::new(x.as_mut_slice(), shape.clone()),
            1.0,
            ArrayMut::new(g.as_mut_slice(), Shape::from([3, 2])),
        )
        .unwrap_err();
    assert!(err.is_dimension_mismatch());

    // The failed call left the backend untouched
    assert_eq!(opt.task(), Task::ComputeObjectiveAndGradient);
    assert_eq!(opt.evaluations(), 0);
}

#[test]
fn test_iterate_before_start() {
    let mut opt = Optimizer::nlcg(Shape::vector(2), NlcgConfig::default()).unwrap();
    let mut x = vec![0.0_f64; 2];
    let mut g = vec![0.0_f64; 2];
    let err = opt.iterate(&mut x, 0.0, &mut g).unwrap_err();
    assert!(matches!(err, OptimizerError::InvalidSequence { .. }));
    assert_eq!(opt.status(), Status::NotStarted);
}

#[test]
fn test_iterate_after_final_point() {
    init_tracing();
    let problem = Quadratic::uniform(3, 2.0);
    let mut opt = Optimizer::nlcg(Shape::vector(3), NlcgConfig::default()).unwrap();
    let mut x = vec![0.0_f64; 3];
    assert_eq!(drive(&mut opt, &problem, &mut x, 1000), Task::FinalPoint);

    let evaluations = opt.evaluations();
    let mut g = vec![0.0_f64; 3];
    let err = opt.iterate(&mut x, 0.0, &mut g).unwrap_err();
    assert!(matches!(err, OptimizerError::InvalidSequence { .. }));
    assert_eq!(opt.task(), Task::FinalPoint);
    assert_eq!(opt.evaluations(), evaluations);

    // A new start is always allowed
    x.fill(0.0);
    assert_eq!(opt.start(&mut x).unwrap(), Task::ComputeObjectiveAndGradient);
    assert_eq!(opt.evaluations(), 0);
}

#[test]
fn test_new_point_is_deterministic() {
    // Two instances fed the same calls, including a NewPoint step with
    // unchanged buffers, stay in lockstep.
    let problem = Quadratic::uniform(4, -1.0);
    let mut runs = Vec::new();
    for _ in 0..2 {
        let mut opt = Optimizer::vmlmb(
            Shape::vector(4),
            VmlmbConfig::default(),
            BoundSpec::Absent,
            BoundSpec::Absent,
        )
        .unwrap();
        let mut x = vec![0.5_f64; 4];
        let mut g = vec![0.0_f64; 4];
        opt.start(&mut x).unwrap();
        let f = problem.eval(&x, &mut g);
        assert_eq!(opt.iterate(&mut x, f, &mut g).unwrap(), Task::NewPoint);
        let task = opt.iterate(&mut x, f, &mut g).unwrap();
        assert_eq!(task, Task::ComputeObjectiveAndGradient);
        runs.push((x.clone(), opt.summary()));
    }
    assert_eq!(runs[0], runs[1]);
    assert!(runs[0].0.iter().all(|xi| xi.is_finite()));
}

#[test]
fn test_reason_matches_terminal_status() {
    let problem = Quadratic::uniform(5, 3.0);
    for mut opt in both_algorithms(&Shape::vector(5)) {
        let mut x = vec![0.0_f64; 5];
        let task = drive(&mut opt, &problem, &mut x, 1000);
        assert!(task.is_terminal());
        assert_eq!(task, Task::FinalPoint);
        assert_eq!(opt.status().terminal_task(), Some(task));
        assert_eq!(opt.reason(), Optimizer::get_reason(opt.status().code()));
        assert!(!opt.reason().is_empty());
    }
}

#[test]
fn test_non_finite_objective_is_an_error() {
    let mut opt = Optimizer::nlcg(Shape::vector(2), NlcgConfig::default()).unwrap();
    let mut x = vec![0.0_f64; 2];
    let mut g = vec![1.0_f64; 2];
    opt.start(&mut x).unwrap();
    assert_eq!(opt.iterate(&mut x, f64::NAN, &mut g).unwrap(), Task::Error);
    assert_eq!(opt.status(), Status::UndefinedValue);
    assert_eq!(opt.reason(), Status::UndefinedValue.reason());
}

#[test]
fn test_evaluation_budget_then_resume() {
    init_tracing();
    let problem = Quadratic::new(vec![1.0, 50.0], vec![2.0, -1.0]);
    let config = NlcgConfig::new().with_max_evaluations(2).with_grtol(0.0);
    let mut opt = Optimizer::nlcg(Shape::vector(2), config).unwrap();
    let mut x = vec![0.0_f64; 2];
    assert_eq!(drive(&mut opt, &problem, &mut x, 100), Task::Warning);
    assert_eq!(opt.status(), Status::TooManyEvaluations);

    // Continuing after a warning restarts from the last accepted point
    let mut g = vec![0.0_f64; 2];
    let task = opt.iterate(&mut x, 0.0, &mut g).unwrap();
    assert_eq!(task, Task::ComputeObjectiveAndGradient);
    assert_eq!(opt.restarts(), 1);
}

#[test]
fn test_single_precision_buffers() {
    let config = NlcgConfig::new().with_single(true);
    let mut opt = Optimizer::nlcg(Shape::vector(3), config).unwrap();
    assert!(opt.is_single());
    assert_eq!(opt.precision(), Precision::Single);

    let mut wrong = vec![0.0_f64; 3];
    assert!(opt.start(&mut wrong).unwrap_err().is_dimension_mismatch());

    let mut x = vec![0.0_f32; 3];
    assert_eq!(opt.start(&mut x).unwrap(), Task::ComputeObjectiveAndGradient);
}
