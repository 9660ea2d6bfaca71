//! Error types for optimizer construction and driving.
//!
//! This module defines the single error type returned by every fallible
//! operation of the driver: building vector spaces and bounds, wrapping
//! caller buffers, and advancing the task protocol.

use crate::optimization::status::Status;
use thiserror::Error;

/// Errors that can occur while building or driving an optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizerError {
    /// Malformed argument.
    ///
    /// Raised for invalid dimension lists, a non-positive memory depth,
    /// unknown configuration keys or invalid bound specifications.
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// Description of the invalid argument
        reason: String,
    },

    /// Buffer or bound shape does not match the optimizer.
    ///
    /// Every buffer bound to an optimizer must have exactly the dimensions
    /// and precision fixed at construction time.
    #[error("{context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// What was being checked (e.g. "bad dimensions")
        context: String,
        /// Expected shape or precision
        expected: String,
        /// Actual shape or precision
        actual: String,
    },

    /// Storage for a vector space, vector or backend could not be allocated.
    #[error("Allocation failure: {reason}")]
    AllocationFailure {
        /// Description of what could not be allocated
        reason: String,
    },

    /// Operation called out of the order required by the task protocol.
    #[error("Invalid task sequence: {reason}")]
    InvalidSequence {
        /// Description of the protocol violation
        reason: String,
    },

    /// The algorithm reported a fatal condition.
    #[error("Backend error: {}", status.reason())]
    Backend {
        /// Status reported by the backend
        status: Status,
    },
}

impl OptimizerError {
    /// Create an InvalidArgument error with a custom reason.
    pub fn invalid_argument<S: Into<String>>(reason: S) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<C, S1, S2>(context: C, expected: S1, actual: S2) -> Self
    where
        C: Into<String>,
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an AllocationFailure error with a custom reason.
    pub fn allocation_failure<S: Into<String>>(reason: S) -> Self {
        Self::AllocationFailure {
            reason: reason.into(),
        }
    }

    /// Create an InvalidSequence error with a custom reason.
    pub fn invalid_sequence<S: Into<String>>(reason: S) -> Self {
        Self::InvalidSequence {
            reason: reason.into(),
        }
    }

    /// Wrap a backend status.
    pub fn backend(status: Status) -> Self {
        Self::Backend { status }
    }

    /// Returns true for errors caused by a shape or precision mismatch.
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }
}

/// Result type alias for optimizer operations.
pub type OptimizerResult<T> = std::result::Result<T, OptimizerError>;
