//! Tasks of the reverse-communication protocol.
//!
//! After every call to `start` or `iterate`, an optimizer returns a [`Task`]
//! telling the caller what to do next:
//!
//! - [`Task::ComputeObjectiveAndGradient`]: evaluate f(x) and ∇f(x) at the
//!   variables currently stored in the caller's `x` buffer, write the
//!   gradient into `gx` and call `iterate` again.
//! - [`Task::NewPoint`]: a new iterate has been accepted; the caller may
//!   inspect it and calls `iterate` again with the same buffers.
//! - [`Task::FinalPoint`]: convergence; `x` holds the solution.
//! - [`Task::Warning`]: the algorithm cannot make further progress.
//! - [`Task::Error`]: a fatal condition; see the optimizer status.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the caller must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(i32)]
pub enum Task {
    /// A fatal error occurred.
    Error = -1,
    /// The caller must compute f(x) and ∇f(x).
    ComputeObjectiveAndGradient = 0,
    /// A new iterate is available.
    NewPoint = 1,
    /// The algorithm has converged.
    FinalPoint = 2,
    /// The algorithm stopped without converging.
    Warning = 3,
}

impl Task {
    /// All tasks, in code order.
    pub const ALL: [Self; 5] = [
        Self::Error,
        Self::ComputeObjectiveAndGradient,
        Self::NewPoint,
        Self::FinalPoint,
        Self::Warning,
    ];

    /// Integer code of the task.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Task with the given integer code.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|task| task.code() == code)
    }

    /// Returns true if no further `iterate` is meaningful.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::FinalPoint | Self::Error)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Error => "error",
            Self::ComputeObjectiveAndGradient => "compute f and g",
            Self::NewPoint => "new point",
            Self::FinalPoint => "final point",
            Self::Warning => "warning",
        };
        f.write_str(name)
    }
}
