//! Optimizer instances.
//!
//! An [`Optimizer`] owns the vector space of its variables, the binding
//! slots for the variables and the gradient, and one algorithm backend.
//! The caller keeps ownership of the variable and gradient buffers; they
//! are validated and wrapped anew on every call and never retained.

use crate::attributes::{Attribute, Summary};
use optidrive_core::{
    error::{OptimizerError, OptimizerResult},
    optimization::{Backend, Status, Task},
    types::Precision,
    vector::{make_bound, ArrayMut, BoundSpec, Shape, VectorSlot, VectorSpace},
};
use optidrive_optim::{Nlcg, NlcgConfig, Vmlmb, VmlmbConfig};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reverse-communication optimizer.
///
/// # Protocol
///
/// ```rust
/// use optidrive::prelude::*;
///
/// let mut opt = Optimizer::nlcg(Shape::vector(2), NlcgConfig::default()).unwrap();
/// let mut x = vec![0.0_f64, 0.0];
/// let mut gx = vec![0.0_f64, 0.0];
/// let mut task = opt.start(&mut x).unwrap();
/// while task == Task::ComputeObjectiveAndGradient || task == Task::NewPoint {
///     let mut f = 0.0;
///     if task == Task::ComputeObjectiveAndGradient {
///         f = (x[0] - 1.0).powi(2) + 10.0 * (x[1] + 2.0).powi(2);
///         gx[0] = 2.0 * (x[0] - 1.0);
///         gx[1] = 20.0 * (x[1] + 2.0);
///     }
///     task = opt.iterate(&mut x, f, &mut gx).unwrap();
/// }
/// assert_eq!(task, Task::FinalPoint);
/// assert!((x[0] - 1.0).abs() < 1e-4);
/// assert!((x[1] + 2.0).abs() < 1e-4);
/// ```
#[derive(Debug)]
pub struct Optimizer {
    space: Arc<VectorSpace>,
    x: VectorSlot,
    gx: VectorSlot,
    backend: Box<dyn Backend>,
    started: bool,
}

impl Optimizer {
    /// Creates a nonlinear conjugate gradient optimizer.
    pub fn nlcg(shape: Shape, config: NlcgConfig) -> OptimizerResult<Self> {
        let space = Self::space_for(&shape, config.precision)?;
        let backend = Nlcg::new(Arc::clone(&space), &config)?;
        Ok(Self::assemble(space, shape, Box::new(backend)))
    }

    /// Creates a limited memory variable metric optimizer, optionally with
    /// bounds on the variables.
    ///
    /// Each bound may be absent, a scalar applying to every variable or an
    /// array with the same shape and precision as the variables. Arrays are
    /// copied; the caller may reuse them afterwards.
    pub fn vmlmb<'a, 'b>(
        shape: Shape,
        config: VmlmbConfig,
        lower: impl Into<BoundSpec<'a>>,
        upper: impl Into<BoundSpec<'b>>,
    ) -> OptimizerResult<Self> {
        let space = Self::space_for(&shape, config.precision)?;
        let lower = make_bound(&space, &shape, lower.into())?;
        let upper = make_bound(&space, &shape, upper.into())?;
        let backend = Vmlmb::new(Arc::clone(&space), &config, lower, upper)?;
        Ok(Self::assemble(space, shape, Box::new(backend)))
    }

    fn space_for(shape: &Shape, precision: Precision) -> OptimizerResult<Arc<VectorSpace>> {
        shape.validate()?;
        Ok(Arc::new(VectorSpace::new(shape.count(), precision)?))
    }

    fn assemble(space: Arc<VectorSpace>, shape: Shape, backend: Box<dyn Backend>) -> Self {
        debug!(
            name = backend.name(),
            dims = %shape,
            precision = %space.precision(),
            "optimizer created"
        );
        Self {
            x: VectorSlot::new("x", shape.clone()),
            gx: VectorSlot::new("gx", shape),
            space,
            backend,
            started: false,
        }
    }

    /// Starts the optimization from the variables in `x`.
    ///
    /// `x` must have the optimizer's shape and precision. Bounded
    /// optimizers project `x` onto the feasible set in place. The usual
    /// returned task is [`Task::ComputeObjectiveAndGradient`];
    /// [`Task::Error`] means the problem cannot be solved (see
    /// [`reason`](Self::reason)).
    pub fn start<'a>(&mut self, x: impl Into<ArrayMut<'a>>) -> OptimizerResult<Task> {
        let mut x = self.x.rewrap(&self.space, x.into())?;
        let task = self.backend.start(&mut x);
        self.started = true;
        self.report(task);
        Ok(task)
    }

    /// Advances the optimization.
    ///
    /// `f` and `gx` must hold the objective and its gradient at `x` when
    /// the pending task is [`Task::ComputeObjectiveAndGradient`]; they are
    /// ignored for [`Task::NewPoint`]. The optimizer may overwrite `x`
    /// with the next point to evaluate.
    ///
    /// Fails with an invalid sequence error before [`start`](Self::start)
    /// and once the task is [`Task::FinalPoint`] or [`Task::Error`].
    pub fn iterate<'a, 'b>(
        &mut self,
        x: impl Into<ArrayMut<'a>>,
        f: f64,
        gx: impl Into<ArrayMut<'b>>,
    ) -> OptimizerResult<Task> {
        if !self.started {
            return Err(OptimizerError::invalid_sequence(
                "iterate called before start",
            ));
        }
        let pending = self.backend.task();
        if pending.is_terminal() {
            return Err(OptimizerError::invalid_sequence(format!(
                "iterate called after {pending}"
            )));
        }
        let mut x = self.x.rewrap(&self.space, x.into())?;
        let mut gx = self.gx.rewrap(&self.space, gx.into())?;
        let task = self.backend.iterate(&mut x, f, &mut gx);
        self.report(task);
        Ok(task)
    }

    fn report(&self, task: Task) {
        match task {
            Task::Warning | Task::Error => warn!(
                name = self.backend.name(),
                task = %task,
                reason = self.reason(),
                "optimizer stopped"
            ),
            _ => debug!(
                name = self.backend.name(),
                task = %task,
                iterations = self.iterations(),
                evaluations = self.evaluations(),
                "next task"
            ),
        }
    }

    /// Pending task.
    pub fn task(&self) -> Task {
        self.backend.task()
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.backend.status()
    }

    /// Message explaining the current status.
    pub fn reason(&self) -> &'static str {
        self.status().reason()
    }

    /// Message for a status code, empty for an unknown code.
    pub fn get_reason(code: i32) -> &'static str {
        Status::reason_of(code)
    }

    /// Algorithm flags.
    pub fn flags(&self) -> u32 {
        self.backend.flags()
    }

    /// One line description of the algorithm.
    pub fn description(&self) -> String {
        self.backend.description()
    }

    /// Algorithm name.
    pub fn name(&self) -> &str {
        self.backend.name()
    }

    /// Number of variables.
    pub fn size(&self) -> usize {
        self.space.size()
    }

    /// Shape of the variables.
    pub fn shape(&self) -> &Shape {
        self.x.shape()
    }

    /// Accepted iterations since the last start.
    pub fn iterations(&self) -> usize {
        self.backend.iterations()
    }

    /// Objective evaluations since the last start.
    pub fn evaluations(&self) -> usize {
        self.backend.evaluations()
    }

    /// Restarts since the last start.
    pub fn restarts(&self) -> usize {
        self.backend.restarts()
    }

    /// Projections onto the feasible set since the last start.
    pub fn projections(&self) -> usize {
        self.backend.projections()
    }

    /// Floating point precision of the variables.
    pub fn precision(&self) -> Precision {
        self.space.precision()
    }

    /// Returns true for single precision variables.
    pub fn is_single(&self) -> bool {
        self.precision().is_single()
    }

    /// Memorized steps, for limited memory methods.
    pub fn memory(&self) -> Option<usize> {
        self.backend.memory()
    }

    /// Vector space of the variables.
    pub fn space(&self) -> &VectorSpace {
        &self.space
    }

    /// Looks up a member by name.
    ///
    /// Returns `None` for unknown names, and for `"mem"` when the
    /// algorithm keeps no memory.
    pub fn attribute(&self, name: &str) -> Option<Attribute> {
        let value = match name {
            "flags" => self.flags().into(),
            "task" => self.task().code().into(),
            "status" => self.status().code().into(),
            "reason" => self.reason().into(),
            "description" => self.description().into(),
            "name" => self.name().into(),
            "size" => self.size().into(),
            "dims" => Attribute::Dims(self.shape().lengths().to_vec()),
            "iterations" => self.iterations().into(),
            "evaluations" => self.evaluations().into(),
            "restarts" => self.restarts().into(),
            "projections" => self.projections().into(),
            "single" => self.is_single().into(),
            "mem" => self.memory()?.into(),
            _ => return None,
        };
        Some(value)
    }

    /// Snapshot of every member.
    pub fn summary(&self) -> Summary {
        Summary {
            name: self.name().to_owned(),
            description: self.description(),
            size: self.size(),
            dims: self.shape().lengths().to_vec(),
            single: self.is_single(),
            flags: self.flags(),
            task: self.task().code(),
            status: self.status().code(),
            reason: self.reason().to_owned(),
            iterations: self.iterations(),
            evaluations: self.evaluations(),
            restarts: self.restarts(),
            projections: self.projections(),
            mem: self.memory(),
        }
    }
}

impl fmt::Display for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} implementing {} (size={}, type={})",
            self.name(),
            self.description(),
            self.size(),
            self.precision().type_name()
        )
    }
}
