//! Settings shared by all backends.

use crate::line_search::LineSearchParams;
use crate::utils::{count_value, tolerance_value};
use optidrive_core::error::{OptimizerError, OptimizerResult};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Convergence tolerances, step limits and budgets.
///
/// The gradient test is `‖g‖ ≤ max(gatol, grtol·‖g₀‖)` where g₀ is the
/// gradient at the initial point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tolerances {
    /// Absolute gradient tolerance.
    pub gatol: f64,
    /// Gradient tolerance relative to the initial gradient.
    pub grtol: f64,
    /// Smallest line search step.
    pub stpmin: f64,
    /// Largest line search step.
    pub stpmax: f64,
    /// Maximum number of iterations.
    pub max_iterations: Option<usize>,
    /// Maximum number of objective evaluations.
    pub max_evaluations: Option<usize>,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            gatol: 0.0,
            grtol: 1e-6,
            stpmin: 1e-20,
            stpmax: 1e20,
            max_iterations: None,
            max_evaluations: None,
        }
    }
}

impl Tolerances {
    /// Checks the tolerances for consistency.
    pub fn validate(&self) -> OptimizerResult<()> {
        if !(self.gatol >= 0.0 && self.gatol.is_finite()) {
            return Err(OptimizerError::invalid_argument("invalid gatol"));
        }
        if !(self.grtol >= 0.0 && self.grtol.is_finite()) {
            return Err(OptimizerError::invalid_argument("invalid grtol"));
        }
        if !(self.stpmin >= 0.0 && self.stpmin < self.stpmax) {
            return Err(OptimizerError::invalid_argument("invalid step limits"));
        }
        Ok(())
    }

    /// Gradient threshold for an initial gradient norm `ginit`.
    pub fn gradient_threshold(&self, ginit: f64) -> f64 {
        self.gatol.max(self.grtol * ginit)
    }

    /// Line search parameters with these step limits.
    pub(crate) fn line_search(&self, base: LineSearchParams) -> LineSearchParams {
        LineSearchParams {
            stpmin: self.stpmin,
            stpmax: self.stpmax,
            ..base
        }
    }

    /// Applies a keyword setting; returns false if the key is not a tolerance.
    pub(crate) fn set(&mut self, key: &str, value: f64) -> OptimizerResult<bool> {
        match key {
            "gatol" => self.gatol = tolerance_value(key, value)?,
            "grtol" => self.grtol = tolerance_value(key, value)?,
            "stpmin" => self.stpmin = tolerance_value(key, value)?,
            "stpmax" => self.stpmax = tolerance_value(key, value)?,
            "maxiter" => self.max_iterations = Some(count_value(key, value)?),
            "maxeval" => self.max_evaluations = Some(count_value(key, value)?),
            _ => return Ok(false),
        }
        Ok(true)
    }
}
