//! Limited memory variable metric backend with optional bounds.
//!
//! VMLMB minimizes a smooth function subject to box constraints
//! `lower ≤ x ≤ upper` (either side may be absent). Every iterate is kept
//! feasible by projection onto the box:
//!
//! 1. The projected gradient is the gradient with the entries of blocked
//!    variables zeroed (a variable is blocked when it sits on a bound and
//!    the steepest descent points out of the box).
//! 2. The search direction is -H·g_P where H is the L-BFGS approximation
//!    of the inverse Hessian, restricted to the free variables.
//! 3. Trial points are x = P(x₀ + αd) and the step is accepted by Armijo's
//!    rule f(x) ≤ f(x₀) + ftol·⟨g₀, x - x₀⟩ with backtracking.
//!
//! Without bounds, the method reduces to L-BFGS. With the
//! [`EMULATE_BLMVM`] flag, gradient changes are measured on projected
//! gradients as in Benson & Moré's BLMVM.
//!
//! # References
//!
//! - Thiébaut, "Optimization issues in blind deconvolution algorithms",
//!   SPIE 4847 (2002)
//! - Nocedal, "Updating quasi-Newton matrices with limited storage",
//!   Math. Comp. 35 (1980)

use crate::config::Tolerances;
use crate::lbfgs::LbfgsMemory;
use crate::line_search::{Backtracking, LineSearchParams, SearchTask};
use crate::utils::{bool_value, count_value, flags_value, unknown_keyword};
use optidrive_core::{
    config::EMULATE_BLMVM,
    core::types::Precision,
    error::{OptimizerError, OptimizerResult},
    optimization::{Backend, Status, Task},
    vector::{Bound, Vector, VectorSpace, WrappedVector},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default number of memorized steps.
pub const DEFAULT_MEMORY: usize = 5;

/// Pairs with ⟨s, y⟩ ≤ ε‖s‖‖y‖ are not memorized.
const CURVATURE_EPSILON: f64 = 1e-12;

/// Configuration for the variable metric backend.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VmlmbConfig {
    /// Number of memorized steps.
    ///
    /// At most as many steps as there are variables are memorized.
    pub mem: usize,
    /// Algorithm flags (`EMULATE_BLMVM`).
    pub flags: u32,
    /// Precision of the variables.
    pub precision: Precision,
    /// Convergence tolerances and budgets.
    pub tolerances: Tolerances,
}

impl Default for VmlmbConfig {
    fn default() -> Self {
        Self {
            mem: DEFAULT_MEMORY,
            flags: 0,
            precision: Precision::Double,
            tolerances: Tolerances::default(),
        }
    }
}

impl VmlmbConfig {
    /// Creates a new configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of memorized steps.
    pub fn with_mem(mut self, mem: usize) -> Self {
        self.mem = mem;
        self
    }

    /// Sets the flag word.
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Enables or disables BLMVM emulation.
    pub fn with_blmvm(mut self, emulate: bool) -> Self {
        if emulate {
            self.flags |= EMULATE_BLMVM;
        } else {
            self.flags &= !EMULATE_BLMVM;
        }
        self
    }

    /// Sets the precision of the variables.
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Selects single (`true`) or double precision.
    pub fn with_single(self, single: bool) -> Self {
        self.with_precision(Precision::from_single(single))
    }

    /// Sets the absolute gradient tolerance.
    pub fn with_gatol(mut self, gatol: f64) -> Self {
        self.tolerances.gatol = gatol;
        self
    }

    /// Sets the relative gradient tolerance.
    pub fn with_grtol(mut self, grtol: f64) -> Self {
        self.tolerances.grtol = grtol;
        self
    }

    /// Sets the line search step limits.
    pub fn with_step_limits(mut self, stpmin: f64, stpmax: f64) -> Self {
        self.tolerances.stpmin = stpmin;
        self.tolerances.stpmax = stpmax;
        self
    }

    /// Sets the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.tolerances.max_iterations = Some(max_iterations);
        self
    }

    /// Sets the maximum number of objective evaluations.
    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.tolerances.max_evaluations = Some(max_evaluations);
        self
    }

    /// Applies a keyword setting.
    ///
    /// Known keys are `mem`, `flags`, `single` and the tolerance keys
    /// `gatol`, `grtol`, `stpmin`, `stpmax`, `maxiter` and `maxeval`.
    pub fn set(&mut self, key: &str, value: f64) -> OptimizerResult<()> {
        match key {
            "mem" => self.mem = count_value(key, value)?,
            "flags" => self.flags = flags_value(key, value)?,
            "single" => self.precision = Precision::from_single(bool_value(key, value)?),
            _ => {
                if !self.tolerances.set(key, value)? {
                    return Err(unknown_keyword(key));
                }
            }
        }
        Ok(())
    }

    /// Checks the configuration.
    pub fn validate(&self) -> OptimizerResult<()> {
        if self.mem < 1 {
            return Err(OptimizerError::invalid_argument(
                "invalid number of memorized steps",
            ));
        }
        if self.flags & !EMULATE_BLMVM != 0 {
            return Err(OptimizerError::invalid_argument(format!(
                "unknown variable metric flags {:#x}",
                self.flags
            )));
        }
        self.tolerances.validate()
    }
}

/// What the next objective evaluation is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Evaluation at a starting or restarting point.
    Initial,
    /// Evaluation at a line search trial point.
    Search,
}

/// Limited memory variable metric backend.
#[derive(Debug)]
pub struct Vmlmb {
    space: Arc<VectorSpace>,
    lower: Option<Bound>,
    upper: Option<Bound>,
    flags: u32,
    tolerances: Tolerances,
    memory: LbfgsMemory,
    x0: Vector,
    g0: Vector,
    pg: Vector,
    pg0: Vector,
    d: Vector,
    step: Vector,
    f: f64,
    f0: f64,
    gtest: Option<f64>,
    search: Backtracking,
    stage: Stage,
    iterations: usize,
    evaluations: usize,
    restarts: usize,
    projections: usize,
    status: Status,
    task: Task,
}

impl Vmlmb {
    /// Creates a backend working in `space` with the given bounds.
    ///
    /// The bounds must have been built for `space`.
    pub fn new(
        space: Arc<VectorSpace>,
        config: &VmlmbConfig,
        lower: Option<Bound>,
        upper: Option<Bound>,
    ) -> OptimizerResult<Self> {
        config.validate()?;
        let params = config.tolerances.line_search(LineSearchParams::default());
        let mem = config.mem.min(space.size());
        if mem < config.mem {
            debug!(requested = config.mem, mem, "memorized steps limited to the number of variables");
        }
        Ok(Self {
            memory: LbfgsMemory::new(&space, mem)?,
            x0: space.create_vector()?,
            g0: space.create_vector()?,
            pg: space.create_vector()?,
            pg0: space.create_vector()?,
            d: space.create_vector()?,
            step: space.create_vector()?,
            space,
            lower,
            upper,
            flags: config.flags,
            tolerances: config.tolerances,
            f: 0.0,
            f0: 0.0,
            gtest: None,
            search: Backtracking::new(params),
            stage: Stage::Initial,
            iterations: 0,
            evaluations: 0,
            restarts: 0,
            projections: 0,
            status: Status::NotStarted,
            task: Task::Error,
        })
    }

    /// Returns true if at least one side of the box is constrained.
    pub fn is_bounded(&self) -> bool {
        self.lower.is_some() || self.upper.is_some()
    }

    /// Returns true when emulating BLMVM.
    pub fn emulates_blmvm(&self) -> bool {
        self.flags & EMULATE_BLMVM != 0
    }

    /// Lower bound, if any.
    pub fn lower(&self) -> Option<&Bound> {
        self.lower.as_ref()
    }

    /// Upper bound, if any.
    pub fn upper(&self) -> Option<&Bound> {
        self.upper.as_ref()
    }

    fn stop(&mut self, status: Status) -> Task {
        self.status = status;
        self.task = status.terminal_task().unwrap_or(Task::Error);
        match self.task {
            Task::Warning | Task::Error => warn!(
                algorithm = self.name(),
                reason = status.reason(),
                iterations = self.iterations,
                evaluations = self.evaluations,
                "stopped"
            ),
            _ => debug!(
                algorithm = self.name(),
                iterations = self.iterations,
                evaluations = self.evaluations,
                "converged"
            ),
        }
        self.task
    }

    fn proceed(&mut self, task: Task) -> Task {
        self.status = Status::Success;
        self.task = task;
        task
    }

    fn restart(&mut self, x: &mut WrappedVector<'_>) -> OptimizerResult<Task> {
        self.iterations = 0;
        self.evaluations = 0;
        self.restarts = 0;
        self.projections = 0;
        self.gtest = None;
        self.stage = Stage::Initial;
        self.memory.clear();
        if let Some(index) = self
            .space
            .first_infeasible(self.lower.as_ref(), self.upper.as_ref())?
        {
            debug!(index, "lower bound above upper bound");
            return Ok(self.stop(Status::InfeasibleBounds));
        }
        let moved = self
            .space
            .project(x, self.lower.as_ref(), self.upper.as_ref())?;
        debug!(
            algorithm = self.name(),
            size = self.space.size(),
            mem = self.memory.capacity(),
            moved,
            "start"
        );
        Ok(self.proceed(Task::ComputeObjectiveAndGradient))
    }

    fn advance(
        &mut self,
        x: &mut WrappedVector<'_>,
        f: f64,
        gx: &WrappedVector<'_>,
    ) -> OptimizerResult<Task> {
        match self.task {
            Task::ComputeObjectiveAndGradient => self.on_evaluation(x, f, gx),
            Task::NewPoint => self.on_new_point(x, gx),
            Task::Warning => self.on_resume(x),
            Task::FinalPoint | Task::Error => Ok(self.task),
        }
    }

    fn on_evaluation(
        &mut self,
        x: &mut WrappedVector<'_>,
        f: f64,
        gx: &WrappedVector<'_>,
    ) -> OptimizerResult<Task> {
        self.evaluations += 1;
        self.projections += 1;
        if !f.is_finite() || !self.space.all_finite(gx)? {
            return Ok(self.stop(Status::UndefinedValue));
        }
        self.f = f;
        self.space.copy(&mut self.pg, gx)?;
        self.space.mask_active(
            &mut self.pg,
            &*x,
            gx,
            self.lower.as_ref(),
            self.upper.as_ref(),
        )?;
        match self.stage {
            Stage::Initial => self.gradient_test(),
            Stage::Search => {
                self.space.combine(&mut self.step, 1.0, &*x, -1.0, &self.x0)?;
                let decrease = self.space.dot(&self.g0, &self.step)?;
                match self.search.iterate(f, decrease) {
                    SearchTask::Evaluate => self.next_trial(x),
                    SearchTask::Converged => {
                        self.iterations += 1;
                        self.update_memory(gx)?;
                        self.stage = Stage::Initial;
                        self.gradient_test()
                    }
                    SearchTask::Warning(status) | SearchTask::Error(status) => {
                        Ok(self.stop(status))
                    }
                }
            }
        }
    }

    fn update_memory(&mut self, gx: &WrappedVector<'_>) -> OptimizerResult<()> {
        let space = &self.space;
        let blmvm = self.flags & EMULATE_BLMVM != 0;
        let slot = self.memory.next_slot();
        space.copy(&mut slot.s, &self.step)?;
        if blmvm {
            space.combine(&mut slot.y, 1.0, &self.pg, -1.0, &self.pg0)?;
        } else {
            space.combine(&mut slot.y, 1.0, gx, -1.0, &self.g0)?;
        }
        let sy = space.dot(&slot.s, &slot.y)?;
        let threshold = CURVATURE_EPSILON * space.norm2(&slot.s)? * space.norm2(&slot.y)?;
        if sy > threshold {
            self.memory.commit(sy);
        } else {
            debug!(sy, "step not memorized");
        }
        Ok(())
    }

    fn gradient_test(&mut self) -> OptimizerResult<Task> {
        let gnorm = self.space.norm2(&self.pg)?;
        let gtest = match self.gtest {
            Some(gtest) => gtest,
            None => {
                let gtest = self.tolerances.gradient_threshold(gnorm);
                self.gtest = Some(gtest);
                gtest
            }
        };
        debug!(
            iteration = self.iterations,
            f = self.f,
            gnorm,
            "VMLMB new point"
        );
        if gnorm <= gtest {
            return Ok(self.stop(Status::GradientTestSatisfied));
        }
        if self
            .tolerances
            .max_iterations
            .is_some_and(|max| self.iterations >= max)
        {
            return Ok(self.stop(Status::TooManyIterations));
        }
        Ok(self.proceed(Task::NewPoint))
    }

    fn on_new_point(
        &mut self,
        x: &mut WrappedVector<'_>,
        gx: &WrappedVector<'_>,
    ) -> OptimizerResult<Task> {
        let lower = self.lower.as_ref();
        let upper = self.upper.as_ref();
        let space = &self.space;

        // d = -H·g_P on the free variables
        space.copy(&mut self.d, &self.pg)?;
        if !self.memory.is_empty() {
            self.memory.apply(space, &mut self.d)?;
            space.mask_active(&mut self.d, &*x, gx, lower, upper)?;
        }
        space.scale(&mut self.d, -1.0)?;
        let mut dg = space.dot(gx, &self.d)?;
        if !(dg < 0.0) && !self.memory.is_empty() {
            self.restarts += 1;
            self.memory.clear();
            debug!(iteration = self.iterations, "VMLMB restart along steepest descent");
            space.copy(&mut self.d, &self.pg)?;
            space.scale(&mut self.d, -1.0)?;
            dg = space.dot(gx, &self.d)?;
        }
        if !(dg < 0.0) {
            return Ok(self.stop(Status::NotADescent));
        }

        let stp = if self.memory.is_empty() {
            1.0_f64.min(1.0 / space.norm2(&self.d)?)
        } else {
            1.0
        };
        let stp = stp.max(self.tolerances.stpmin).min(self.tolerances.stpmax);

        space.copy(&mut self.x0, &*x)?;
        space.copy(&mut self.g0, gx)?;
        space.copy(&mut self.pg0, &self.pg)?;
        self.f0 = self.f;

        match self.search.start(stp, self.f0, dg) {
            SearchTask::Evaluate => {
                self.stage = Stage::Search;
                self.next_trial(x)
            }
            SearchTask::Converged => Ok(self.proceed(Task::NewPoint)),
            SearchTask::Warning(status) | SearchTask::Error(status) => Ok(self.stop(status)),
        }
    }

    fn next_trial(&mut self, x: &mut WrappedVector<'_>) -> OptimizerResult<Task> {
        if self
            .tolerances
            .max_evaluations
            .is_some_and(|max| self.evaluations >= max)
        {
            return Ok(self.stop(Status::TooManyEvaluations));
        }
        self.space.copy(x, &self.x0)?;
        self.space.axpy(x, self.search.step(), &self.d)?;
        self.space
            .project(x, self.lower.as_ref(), self.upper.as_ref())?;
        Ok(self.proceed(Task::ComputeObjectiveAndGradient))
    }

    fn on_resume(&mut self, x: &mut WrappedVector<'_>) -> OptimizerResult<Task> {
        if self.stage == Stage::Search {
            self.space.copy(x, &self.x0)?;
        }
        self.stage = Stage::Initial;
        self.memory.clear();
        self.restarts += 1;
        debug!(restarts = self.restarts, "VMLMB resumed after warning");
        Ok(self.proceed(Task::ComputeObjectiveAndGradient))
    }
}

impl Backend for Vmlmb {
    fn start(&mut self, x: &mut WrappedVector<'_>) -> Task {
        match self.restart(x) {
            Ok(task) => task,
            Err(err) => {
                warn!(error = %err, "VMLMB vector operation failed");
                self.stop(Status::BadSpace)
            }
        }
    }

    fn iterate(&mut self, x: &mut WrappedVector<'_>, f: f64, gx: &mut WrappedVector<'_>) -> Task {
        match self.advance(x, f, gx) {
            Ok(task) => task,
            Err(err) => {
                warn!(error = %err, "VMLMB vector operation failed");
                self.stop(Status::BadSpace)
            }
        }
    }

    fn task(&self) -> Task {
        self.task
    }

    fn status(&self) -> Status {
        self.status
    }

    fn flags(&self) -> u32 {
        self.flags
    }

    fn iterations(&self) -> usize {
        self.iterations
    }

    fn evaluations(&self) -> usize {
        self.evaluations
    }

    fn restarts(&self) -> usize {
        self.restarts
    }

    fn projections(&self) -> usize {
        self.projections
    }

    fn name(&self) -> &str {
        if !self.is_bounded() {
            "LBFGS"
        } else if self.emulates_blmvm() {
            "BLMVM"
        } else {
            "VMLMB"
        }
    }

    fn description(&self) -> String {
        let mut description = format!(
            "limited memory variable metric method with {} memorized steps",
            self.memory.capacity()
        );
        if self.is_bounded() {
            description.push_str(" and bound constraints");
        }
        description
    }

    fn memory(&self) -> Option<usize> {
        Some(self.memory.capacity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use optidrive_core::vector::ElementsMut;

    /// f(x) = Σ (xᵢ - cᵢ)² with cᵢ = target
    fn objective(target: f64) -> impl Fn(&[f64], &mut [f64]) -> f64 {
        move |x, g| {
            let mut f = 0.0;
            for (xi, gi) in x.iter().zip(g.iter_mut()) {
                f += (xi - target).powi(2);
                *gi = 2.0 * (xi - target);
            }
            f
        }
    }

    fn drive(
        backend: &mut Vmlmb,
        x: &mut [f64],
        fg: impl Fn(&[f64], &mut [f64]) -> f64,
        max_calls: usize,
    ) -> Task {
        let space = Arc::clone(&backend.space);
        let mut g = vec![0.0; x.len()];
        let mut f = 0.0;
        let mut task = {
            let mut xw = space.wrap(ElementsMut::from(&mut x[..])).unwrap();
            backend.start(&mut xw)
        };
        for _ in 0..max_calls {
            if task == Task::ComputeObjectiveAndGradient {
                f = fg(x, &mut g);
            } else if task != Task::NewPoint {
                break;
            }
            let mut xw = space.wrap(ElementsMut::from(&mut x[..])).unwrap();
            let mut gw = space.wrap(ElementsMut::from(&mut g[..])).unwrap();
            task = backend.iterate(&mut xw, f, &mut gw);
        }
        task
    }

    fn backend(n: usize, config: &VmlmbConfig, lower: Option<Bound>, upper: Option<Bound>) -> Vmlmb {
        let space = Arc::new(VectorSpace::new(n, config.precision).unwrap());
        Vmlmb::new(space, config, lower, upper).unwrap()
    }

    #[test]
    fn test_names() {
        let config = VmlmbConfig::default();
        assert_eq!(backend(2, &config, None, None).name(), "LBFGS");
        assert_eq!(
            backend(2, &config, Some(Bound::Scalar(0.0)), None).name(),
            "VMLMB"
        );
        let blmvm = config.clone().with_blmvm(true);
        assert_eq!(
            backend(2, &blmvm, None, Some(Bound::Scalar(1.0))).name(),
            "BLMVM"
        );
        assert_eq!(backend(8, &config, None, None).memory(), Some(DEFAULT_MEMORY));
    }

    #[test]
    fn test_memory_is_limited_by_size() {
        let config = VmlmbConfig::new().with_mem(u32::MAX as usize);
        let lbfgs = backend(3, &config, None, None);
        assert_eq!(lbfgs.memory(), Some(3));
        assert_eq!(
            lbfgs.description(),
            "limited memory variable metric method with 3 memorized steps"
        );

        let mut config = VmlmbConfig::default();
        config.set("mem", f64::from(u32::MAX)).unwrap();
        assert_eq!(backend(2, &config, None, None).memory(), Some(2));
    }

    #[test]
    fn test_config_validation() {
        assert!(VmlmbConfig::new().with_mem(0).validate().is_err());
        assert!(VmlmbConfig::new().with_flags(2).validate().is_err());
        let mut config = VmlmbConfig::new();
        config.set("mem", 3.0).unwrap();
        config.set("flags", 1.0).unwrap();
        assert_eq!(config.mem, 3);
        assert!(config.set("frobnicate", 1.0).is_err());
    }

    #[test]
    fn test_unconstrained_convergence() {
        let config = VmlmbConfig::new().with_grtol(1e-10);
        let mut lbfgs = backend(8, &config, None, None);
        let mut x = vec![0.0; 8];
        let task = drive(&mut lbfgs, &mut x, objective(3.0), 1000);
        assert_eq!(task, Task::FinalPoint);
        for xi in &x {
            assert_relative_eq!(*xi, 3.0, epsilon = 1e-6);
        }
        assert_eq!(lbfgs.projections(), lbfgs.evaluations());
    }

    #[test]
    fn test_lower_bound_is_active() {
        let config = VmlmbConfig::default();
        let mut vmlmb = backend(5, &config, Some(Bound::Scalar(0.0)), None);
        let mut x = vec![1.0; 5];
        let task = drive(&mut vmlmb, &mut x, objective(-1.0), 1000);
        assert_eq!(task, Task::FinalPoint);
        assert!(x.iter().all(|&xi| xi >= 0.0));
        for xi in &x {
            assert_relative_eq!(*xi, 0.0, epsilon = 1e-8);
        }
        assert!(vmlmb.projections() > 0);
    }

    #[test]
    fn test_start_projects_initial_point() {
        let config = VmlmbConfig::default();
        let mut vmlmb = backend(3, &config, Some(Bound::Scalar(0.0)), Some(Bound::Scalar(1.0)));
        let space = Arc::clone(&vmlmb.space);
        let mut x = vec![-2.0, 0.5, 7.0];
        {
            let mut xw = space.wrap(ElementsMut::from(&mut x[..])).unwrap();
            assert_eq!(vmlmb.start(&mut xw), Task::ComputeObjectiveAndGradient);
        }
        assert_eq!(x, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_infeasible_bounds() {
        let config = VmlmbConfig::default();
        let mut vmlmb = backend(3, &config, Some(Bound::Scalar(1.0)), Some(Bound::Scalar(0.0)));
        let space = Arc::clone(&vmlmb.space);
        let mut x = vec![0.0; 3];
        let mut xw = space.wrap(ElementsMut::from(&mut x[..])).unwrap();
        assert_eq!(vmlmb.start(&mut xw), Task::Error);
        assert_eq!(vmlmb.status(), Status::InfeasibleBounds);
    }

    #[test]
    fn test_blmvm_converges_with_bounds() {
        let config = VmlmbConfig::new().with_blmvm(true).with_grtol(1e-10);
        let mut blmvm = backend(4, &config, Some(Bound::Scalar(-0.5)), Some(Bound::Scalar(2.0)));
        let mut x = vec![1.5, -0.5, 0.0, 2.0];
        let task = drive(&mut blmvm, &mut x, objective(1.0), 1000);
        assert_eq!(task, Task::FinalPoint);
        for xi in &x {
            assert_relative_eq!(*xi, 1.0, epsilon = 1e-6);
        }
    }
}
