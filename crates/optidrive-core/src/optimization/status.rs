//! Detailed status of an algorithm backend.
//!
//! The [`Task`] tells the caller what to do; the [`Status`] says why. Every
//! status has a fixed integer code and a fixed human readable reason, and
//! maps to exactly one task.

use crate::core::error::{OptimizerError, OptimizerResult};
use crate::optimization::task::Task;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status reported by a backend.
///
/// Codes are consecutive from 0 in the order of [`Status::ALL`], so
/// `Success` is 0 and `TooManyIterations` is 16. They are specific to this
/// crate: status values of other optimization libraries cannot be passed
/// to [`Status::from_code`] or [`Status::reason_of`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Status {
    /// Everything went fine.
    #[default]
    Success,
    /// An argument of the algorithm is invalid.
    InvalidArgument,
    /// Some work storage could not be allocated.
    InsufficientMemory,
    /// `iterate` was called before `start`.
    NotStarted,
    /// A vector does not belong to the optimizer's space.
    BadSpace,
    /// The internal state is inconsistent.
    CorruptedWorkspace,
    /// The gradient norm dropped below the tolerance.
    GradientTestSatisfied,
    /// Rounding errors prevent further progress.
    RoundingErrorsPreventProgress,
    /// The line search interval became smaller than its tolerance.
    XtolTestSatisfied,
    /// The line search step reached its upper limit.
    StepEqualsStpmax,
    /// The line search step reached its lower limit.
    StepEqualsStpmin,
    /// The line search step limits are inconsistent.
    StpminGtStpmax,
    /// The search direction is not a descent direction.
    NotADescent,
    /// Some lower bound exceeds the corresponding upper bound.
    InfeasibleBounds,
    /// The objective or its gradient is not finite.
    UndefinedValue,
    /// The evaluation budget is exhausted.
    TooManyEvaluations,
    /// The iteration budget is exhausted.
    TooManyIterations,
}

impl Status {
    /// All statuses, in code order.
    pub const ALL: [Self; 17] = [
        Self::Success,
        Self::InvalidArgument,
        Self::InsufficientMemory,
        Self::NotStarted,
        Self::BadSpace,
        Self::CorruptedWorkspace,
        Self::GradientTestSatisfied,
        Self::RoundingErrorsPreventProgress,
        Self::XtolTestSatisfied,
        Self::StepEqualsStpmax,
        Self::StepEqualsStpmin,
        Self::StpminGtStpmax,
        Self::NotADescent,
        Self::InfeasibleBounds,
        Self::UndefinedValue,
        Self::TooManyEvaluations,
        Self::TooManyIterations,
    ];

    /// Integer code of the status.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Status with the given integer code.
    pub fn from_code(code: i32) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Fixed textual explanation of the status.
    pub fn reason(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::InvalidArgument => "Invalid argument",
            Self::InsufficientMemory => "Insufficient memory",
            Self::NotStarted => "Algorithm not started",
            Self::BadSpace => "Variables do not belong to the vector space",
            Self::CorruptedWorkspace => "Corrupted workspace",
            Self::GradientTestSatisfied => "Convergence in the gradient norm",
            Self::RoundingErrorsPreventProgress => "Rounding errors prevent progress",
            Self::XtolTestSatisfied => "Line search interval too small",
            Self::StepEqualsStpmax => "Step is at the upper bound",
            Self::StepEqualsStpmin => "Step is at the lower bound",
            Self::StpminGtStpmax => "Lower step bound larger than upper bound",
            Self::NotADescent => "Search direction is not a descent direction",
            Self::InfeasibleBounds => "Box set is empty",
            Self::UndefinedValue => "Undefined value",
            Self::TooManyEvaluations => "Too many evaluations",
            Self::TooManyIterations => "Too many iterations",
        }
    }

    /// Reason of the status with the given code, or an empty string.
    pub fn reason_of(code: i32) -> &'static str {
        Self::from_code(code).map_or("", Self::reason)
    }

    /// Returns true for statuses that stop the algorithm for good.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            Self::InvalidArgument
                | Self::InsufficientMemory
                | Self::NotStarted
                | Self::BadSpace
                | Self::CorruptedWorkspace
                | Self::StpminGtStpmax
                | Self::NotADescent
                | Self::InfeasibleBounds
                | Self::UndefinedValue
        )
    }

    /// Returns true for statuses that stop the algorithm without convergence.
    pub fn is_warning(self) -> bool {
        matches!(
            self,
            Self::RoundingErrorsPreventProgress
                | Self::XtolTestSatisfied
                | Self::StepEqualsStpmax
                | Self::StepEqualsStpmin
                | Self::TooManyEvaluations
                | Self::TooManyIterations
        )
    }

    /// Task a backend reports after stopping with this status.
    ///
    /// Statuses that do not stop the algorithm map to `None`.
    pub fn terminal_task(self) -> Option<Task> {
        if self.is_error() {
            Some(Task::Error)
        } else if self.is_warning() {
            Some(Task::Warning)
        } else if self == Self::GradientTestSatisfied {
            Some(Task::FinalPoint)
        } else {
            None
        }
    }

    /// Converts an error status into an error, anything else into `Ok`.
    pub fn into_result(self) -> OptimizerResult<Self> {
        if self.is_error() {
            Err(OptimizerError::backend(self))
        } else {
            Ok(self)
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for (index, status) in Status::ALL.iter().enumerate() {
            assert_eq!(status.code() as usize, index);
            assert_eq!(Status::from_code(status.code()), Some(*status));
        }
        assert_eq!(Status::from_code(-1), None);
        assert_eq!(Status::from_code(Status::ALL.len() as i32), None);
    }

    #[test]
    fn test_code_numbering() {
        assert_eq!(Status::Success.code(), 0);
        assert_eq!(Status::NotStarted.code(), 3);
        assert_eq!(Status::InfeasibleBounds.code(), 13);
        assert_eq!(Status::TooManyIterations.code(), 16);
        assert_eq!(Status::reason_of(17), "");
    }

    #[test]
    fn test_reasons() {
        assert_eq!(Status::Success.reason(), "Success");
        assert_eq!(Status::reason_of(Status::InfeasibleBounds.code()), "Box set is empty");
        assert_eq!(Status::reason_of(1000), "");
        for status in Status::ALL {
            assert!(!status.reason().is_empty());
        }
    }

    #[test]
    fn test_task_mapping() {
        assert_eq!(Status::Success.terminal_task(), None);
        assert_eq!(
            Status::GradientTestSatisfied.terminal_task(),
            Some(Task::FinalPoint)
        );
        assert_eq!(Status::TooManyIterations.terminal_task(), Some(Task::Warning));
        assert_eq!(Status::InfeasibleBounds.terminal_task(), Some(Task::Error));
        for status in Status::ALL {
            assert!(!(status.is_error() && status.is_warning()));
        }
    }

    #[test]
    fn test_into_result() {
        assert!(Status::Success.into_result().is_ok());
        assert!(Status::TooManyEvaluations.into_result().is_ok());
        let err = Status::UndefinedValue.into_result().unwrap_err();
        assert_eq!(err, OptimizerError::backend(Status::UndefinedValue));
    }
}
