//! Algorithm backend interface.
//!
//! An optimizer instance is a thin shell around one [`Backend`] chosen at
//! construction time. The instance validates and binds the caller buffers;
//! the backend runs the algorithm on the already validated vectors and
//! keeps all algorithm state (counters, saved iterates, line search).
//!
//! # Protocol
//!
//! 1. `start(x)` resets the backend for the initial variables and returns
//!    the first task, normally [`Task::ComputeObjectiveAndGradient`].
//! 2. `iterate(x, f, gx)` is called with the objective and gradient at the
//!    current `x` (or with the unchanged buffers after a
//!    [`Task::NewPoint`]) and returns the next task. The backend may
//!    overwrite `x` with the next trial point.
//!
//! The instance guards against calls out of sequence, so a backend can
//! assume `iterate` is only called after `start` and never after
//! [`Task::FinalPoint`] or [`Task::Error`].

use crate::optimization::status::Status;
use crate::optimization::task::Task;
use crate::vector::vectors::WrappedVector;
use std::fmt::Debug;

/// Operations every algorithm backend provides.
///
/// The trait is object safe; instances hold a `Box<dyn Backend>`.
pub trait Backend: Debug + Send {
    /// Starts (or restarts) the algorithm from the variables `x`.
    fn start(&mut self, x: &mut WrappedVector<'_>) -> Task;

    /// Advances the algorithm.
    ///
    /// `f` and `gx` are the objective and its gradient at `x` when the
    /// previous task was [`Task::ComputeObjectiveAndGradient`]; they are
    /// ignored otherwise.
    fn iterate(&mut self, x: &mut WrappedVector<'_>, f: f64, gx: &mut WrappedVector<'_>) -> Task;

    /// Last task returned.
    fn task(&self) -> Task;

    /// Current status.
    fn status(&self) -> Status;

    /// Algorithm flags the backend was built with.
    fn flags(&self) -> u32;

    /// Number of accepted iterations since the last start.
    fn iterations(&self) -> usize;

    /// Number of objective evaluations since the last start.
    fn evaluations(&self) -> usize;

    /// Number of restarts since the last start.
    fn restarts(&self) -> usize;

    /// Number of projections onto the feasible set since the last start.
    fn projections(&self) -> usize {
        0
    }

    /// Short name of the algorithm.
    fn name(&self) -> &str;

    /// One line description of the algorithm and its settings.
    fn description(&self) -> String;

    /// Number of memorized steps for limited-memory methods.
    fn memory(&self) -> Option<usize> {
        None
    }
}
