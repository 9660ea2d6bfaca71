//! Nonlinear conjugate gradient backend.
//!
//! Conjugate gradient methods combine the current gradient with the
//! previous search direction:
//!
//! ```text
//! d₁ = -g₁ + β d₀
//! ```
//!
//! and perform a Moré & Thuente line search along d₁. The rule for β is
//! selected by the low byte of the flags.
//!
//! # Supported Rules
//!
//! With y = g₁ - g₀:
//!
//! - **Fletcher-Reeves**: β = ‖g₁‖² / ‖g₀‖²
//! - **Hestenes-Stiefel**: β = ⟨g₁, y⟩ / ⟨d₀, y⟩
//! - **Polak-Ribière-Polyak**: β = ⟨g₁, y⟩ / ‖g₀‖²
//! - **Fletcher**: β = -‖g₁‖² / ⟨d₀, g₀⟩
//! - **Liu-Storey**: β = -⟨g₁, y⟩ / ⟨d₀, g₀⟩
//! - **Dai-Yuan**: β = ‖g₁‖² / ⟨d₀, y⟩
//! - **Hager-Zhang**: β = ⟨y - 2d₀‖y‖²/⟨d₀, y⟩, g₁⟩ / ⟨d₀, y⟩
//! - **Perry-Shanno**: memoryless BFGS direction
//!
//! Powell's modification clips β at zero. With Shanno & Phua's rule the
//! first trial step of a line search is α₀·⟨g₀, d₀⟩ / ⟨g₁, d₁⟩ where α₀ is
//! the previous step.
//!
//! Whenever the rule fails or yields an ascent direction, the method
//! restarts along the steepest descent.
//!
//! # References
//!
//! - Hager & Zhang, "A survey of nonlinear conjugate gradient methods" (2006)
//! - Shanno & Phua, "Remark on algorithm 500", ACM TOMS 6 (1980)

use crate::config::Tolerances;
use crate::line_search::{LineSearchParams, MoreThuente, SearchTask};
use crate::utils::{bool_value, flags_value, unknown_keyword};
use optidrive_core::{
    config::{NlcgFlags, NlcgRule, NLCG_DEFAULT},
    core::types::Precision,
    error::OptimizerResult,
    optimization::{Backend, Status, Task},
    vector::{Vector, VectorSpace, WrappedVector},
};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration for the conjugate gradient backend.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NlcgConfig {
    /// Rule and modifiers, see [`optidrive_core::config::flags`].
    pub flags: u32,
    /// Precision of the variables.
    pub precision: Precision,
    /// Convergence tolerances and budgets.
    pub tolerances: Tolerances,
}

impl Default for NlcgConfig {
    fn default() -> Self {
        Self {
            flags: NLCG_DEFAULT,
            precision: Precision::Double,
            tolerances: Tolerances::default(),
        }
    }
}

impl NlcgConfig {
    /// Creates a new configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag word.
    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the update rule, keeping the modifiers.
    pub fn with_rule(mut self, rule: NlcgRule) -> Self {
        self.flags = (self.flags & !0xff) | rule.flag();
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
    /// Known keys are `flags`, `single` and the tolerance keys `gatol`,
    /// `grtol`, `stpmin`, `stpmax`, `maxiter` and `maxeval`.
    pub fn set(&mut self, key: &str, value: f64) -> OptimizerResult<()> {
        match key {
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

    /// Checks the configuration and decodes the flags.
    pub fn validate(&self) -> OptimizerResult<NlcgFlags> {
        self.tolerances.validate()?;
        NlcgFlags::decode(self.flags)
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

/// Nonlinear conjugate gradient backend.
#[derive(Debug)]
pub struct Nlcg {
    space: Arc<VectorSpace>,
    flags: u32,
    decoded: NlcgFlags,
    tolerances: Tolerances,
    x0: Vector,
    g0: Vector,
    d: Vector,
    y: Vector,
    f: f64,
    f0: f64,
    g0norm2: f64,
    dg0: f64,
    gtest: Option<f64>,
    previous_step: Option<(f64, f64)>,
    search: MoreThuente,
    stage: Stage,
    fresh: bool,
    iterations: usize,
    evaluations: usize,
    restarts: usize,
    status: Status,
    task: Task,
}

impl Nlcg {
    /// Creates a backend working in `space`.
    pub fn new(space: Arc<VectorSpace>, config: &NlcgConfig) -> OptimizerResult<Self> {
        let decoded = config.validate()?;
        let params = config.tolerances.line_search(LineSearchParams::default());
        Ok(Self {
            x0: space.create_vector()?,
            g0: space.create_vector()?,
            d: space.create_vector()?,
            y: space.create_vector()?,
            space,
            flags: config.flags,
            decoded,
            tolerances: config.tolerances,
            f: 0.0,
            f0: 0.0,
            g0norm2: 0.0,
            dg0: 0.0,
            gtest: None,
            previous_step: None,
            search: MoreThuente::new(params),
            stage: Stage::Initial,
            fresh: true,
            iterations: 0,
            evaluations: 0,
            restarts: 0,
            status: Status::NotStarted,
            task: Task::Error,
        })
    }

    /// Decoded flags.
    pub fn method(&self) -> NlcgFlags {
        self.decoded
    }

    fn stop(&mut self, status: Status) -> Task {
        self.status = status;
        self.task = status.terminal_task().unwrap_or(Task::Error);
        match self.task {
            Task::Warning | Task::Error => warn!(
                algorithm = "NLCG",
                reason = status.reason(),
                iterations = self.iterations,
                evaluations = self.evaluations,
                "stopped"
            ),
            _ => debug!(
                algorithm = "NLCG",
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
        if !f.is_finite() || !self.space.all_finite(gx)? {
            return Ok(self.stop(Status::UndefinedValue));
        }
        self.f = f;
        match self.stage {
            Stage::Initial => self.gradient_test(gx),
            Stage::Search => {
                let dg = self.space.dot(gx, &self.d)?;
                match self.search.iterate(f, dg) {
                    SearchTask::Evaluate => self.next_trial(x),
                    SearchTask::Converged => {
                        self.iterations += 1;
                        self.previous_step = Some((self.search.step(), self.dg0));
                        self.stage = Stage::Initial;
                        self.gradient_test(gx)
                    }
                    SearchTask::Warning(status) | SearchTask::Error(status) => {
                        Ok(self.stop(status))
                    }
                }
            }
        }
    }

    fn gradient_test(&mut self, gx: &WrappedVector<'_>) -> OptimizerResult<Task> {
        let gnorm = self.space.norm2(gx)?;
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
            "NLCG new point"
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
        let conjugate = if self.fresh {
            None
        } else {
            self.update_direction(x, gx)?
        };
        let (dg, restarted) = match conjugate {
            Some(dg) if dg < 0.0 => (dg, false),
            _ => {
                if !self.fresh {
                    self.restarts += 1;
                    debug!(iteration = self.iterations, "NLCG restart along steepest descent");
                }
                self.space.copy(&mut self.d, gx)?;
                self.space.scale(&mut self.d, -1.0)?;
                (self.space.dot(gx, &self.d)?, true)
            }
        };
        if dg >= 0.0 {
            return Ok(self.stop(Status::NotADescent));
        }

        let stp = match self.previous_step {
            Some((stp0, dg0)) if !restarted && self.decoded.shanno_phua => stp0 * dg0 / dg,
            Some(_) if !restarted => 1.0,
            _ => 1.0 / self.space.norm2(&self.d)?,
        };
        let stp = stp.max(self.tolerances.stpmin).min(self.tolerances.stpmax);

        self.space.copy(&mut self.x0, x)?;
        self.space.copy(&mut self.g0, gx)?;
        self.f0 = self.f;
        self.g0norm2 = self.space.dot(gx, gx)?;
        self.dg0 = dg;
        self.fresh = false;

        match self.search.start(stp, self.f0, dg) {
            SearchTask::Evaluate => {
                self.stage = Stage::Search;
                self.next_trial(x)
            }
            SearchTask::Converged => Ok(self.proceed(Task::NewPoint)),
            SearchTask::Warning(status) | SearchTask::Error(status) => Ok(self.stop(status)),
        }
    }

    /// Computes the conjugate direction into `d` and returns its slope, or
    /// `None` if the rule cannot be applied.
    fn update_direction(
        &mut self,
        x: &WrappedVector<'_>,
        gx: &WrappedVector<'_>,
    ) -> OptimizerResult<Option<f64>> {
        let space = &self.space;
        if self.decoded.rule == NlcgRule::PerryShanno {
            // d = s = x - x₀, y = g - g₀
            space.combine(&mut self.d, 1.0, x, -1.0, &self.x0)?;
            space.combine(&mut self.y, 1.0, gx, -1.0, &self.g0)?;
            let sy = space.dot(&self.d, &self.y)?;
            let yy = space.dot(&self.y, &self.y)?;
            if !(sy > 0.0 && yy > 0.0) {
                return Ok(None);
            }
            let sg = space.dot(&self.d, gx)?;
            let yg = space.dot(&self.y, gx)?;
            let gamma = sy / yy;
            space.scale(&mut self.d, yg / yy - 2.0 * sg / sy)?;
            space.axpy(&mut self.d, sg / yy, &self.y)?;
            space.axpy(&mut self.d, -gamma, gx)?;
            return Ok(Some(space.dot(gx, &self.d)?));
        }

        let gg = space.dot(gx, gx)?;
        let needs_y = !matches!(
            self.decoded.rule,
            NlcgRule::FletcherReeves | NlcgRule::Fletcher
        );
        if needs_y {
            space.combine(&mut self.y, 1.0, gx, -1.0, &self.g0)?;
        }
        let beta = match self.decoded.rule {
            NlcgRule::FletcherReeves => gg / self.g0norm2,
            NlcgRule::HestenesStiefel => {
                space.dot(gx, &self.y)? / space.dot(&self.d, &self.y)?
            }
            NlcgRule::PolakRibierePolyak => space.dot(gx, &self.y)? / self.g0norm2,
            NlcgRule::Fletcher => -gg / self.dg0,
            NlcgRule::LiuStorey => -space.dot(gx, &self.y)? / self.dg0,
            NlcgRule::DaiYuan => gg / space.dot(&self.d, &self.y)?,
            NlcgRule::HagerZhang => {
                let dy = space.dot(&self.d, &self.y)?;
                let yy = space.dot(&self.y, &self.y)?;
                let gy = space.dot(gx, &self.y)?;
                let dg = space.dot(&self.d, gx)?;
                (gy - 2.0 * yy * dg / dy) / dy
            }
            NlcgRule::PerryShanno => return Ok(None),
        };
        if !beta.is_finite() {
            return Ok(None);
        }
        let beta = if self.decoded.powell { beta.max(0.0) } else { beta };
        space.scale(&mut self.d, beta)?;
        space.axpy(&mut self.d, -1.0, gx)?;
        Ok(Some(space.dot(gx, &self.d)?))
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
        Ok(self.proceed(Task::ComputeObjectiveAndGradient))
    }

    fn on_resume(&mut self, x: &mut WrappedVector<'_>) -> OptimizerResult<Task> {
        if self.stage == Stage::Search {
            self.space.copy(x, &self.x0)?;
        }
        self.stage = Stage::Initial;
        self.fresh = true;
        self.previous_step = None;
        self.restarts += 1;
        debug!(restarts = self.restarts, "NLCG resumed after warning");
        Ok(self.proceed(Task::ComputeObjectiveAndGradient))
    }
}

impl Backend for Nlcg {
    fn start(&mut self, _x: &mut WrappedVector<'_>) -> Task {
        self.iterations = 0;
        self.evaluations = 0;
        self.restarts = 0;
        self.gtest = None;
        self.previous_step = None;
        self.stage = Stage::Initial;
        self.fresh = true;
        debug!(size = self.space.size(), flags = self.flags, "NLCG start");
        self.proceed(Task::ComputeObjectiveAndGradient)
    }

    fn iterate(&mut self, x: &mut WrappedVector<'_>, f: f64, gx: &mut WrappedVector<'_>) -> Task {
        match self.advance(x, f, gx) {
            Ok(task) => task,
            Err(err) => {
                warn!(error = %err, "NLCG vector operation failed");
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

    fn name(&self) -> &str {
        "NLCG"
    }

    fn description(&self) -> String {
        format!("nonlinear conjugate gradient ({})", self.decoded)
    }
}
