//! Reverse-communication line searches.
//!
//! A line search looks for a step α > 0 along a descent direction d from a
//! point x₀. Both searches here never evaluate anything themselves: the
//! backend starts them with f(x₀) and the initial slope, then feeds them
//! the objective at each trial step until they report convergence.
//!
//! # Available Searches
//!
//! - [`MoreThuente`]: Moré & Thuente's search for a step satisfying the
//!   strong Wolfe conditions
//!   f(x₀ + αd) ≤ f(x₀) + c₁α⟨g₀, d⟩ and |⟨g(x₀ + αd), d⟩| ≤ c₂|⟨g₀, d⟩|
//! - [`Backtracking`]: Armijo backtracking with safeguarded quadratic
//!   interpolation, usable along a projected path
//!
//! # References
//!
//! - Moré & Thuente, "Line search algorithms with guaranteed sufficient
//!   decrease", ACM TOMS 20 (1994)

use optidrive_core::optimization::Status;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Outcome of one line search call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTask {
    /// The objective is needed at the new trial step.
    Evaluate,
    /// The current step is acceptable.
    Converged,
    /// No acceptable step can be found; the current step is the best one.
    Warning(Status),
    /// The search could not be started.
    Error(Status),
}

impl SearchTask {
    /// Returns true once the search has stopped.
    pub fn is_done(self) -> bool {
        !matches!(self, Self::Evaluate)
    }
}

/// Parameters of the line searches.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineSearchParams {
    /// Sufficient decrease parameter c₁ ∈ (0, 1).
    pub ftol: f64,
    /// Curvature parameter c₂ ∈ (c₁, 1).
    pub gtol: f64,
    /// Relative width below which a bracketing interval is too small.
    pub xtol: f64,
    /// Smallest step.
    pub stpmin: f64,
    /// Largest step.
    pub stpmax: f64,
}

impl Default for LineSearchParams {
    fn default() -> Self {
        Self {
            ftol: 1e-4,
            gtol: 0.1,
            xtol: 1e-17,
            stpmin: 1e-20,
            stpmax: 1e20,
        }
    }
}

impl LineSearchParams {
    /// Returns true if the parameters are usable.
    pub fn is_valid(&self) -> bool {
        self.ftol > 0.0
            && self.ftol < 1.0
            && self.gtol > 0.0
            && self.gtol < 1.0
            && self.xtol >= 0.0
            && self.stpmin >= 0.0
            && self.stpmax >= self.stpmin
    }
}

const XTRAPL: f64 = 1.1;
const XTRAPU: f64 = 4.0;

/// Moré & Thuente line search.
#[derive(Debug, Clone)]
pub struct MoreThuente {
    params: LineSearchParams,
    stp: f64,
    brackt: bool,
    stage1: bool,
    finit: f64,
    ginit: f64,
    gtest: f64,
    width: f64,
    width1: f64,
    stx: f64,
    fx: f64,
    gx: f64,
    sty: f64,
    fy: f64,
    gy: f64,
    stmin: f64,
    stmax: f64,
    task: SearchTask,
}

impl MoreThuente {
    /// Creates an idle line search.
    pub fn new(params: LineSearchParams) -> Self {
        Self {
            params,
            stp: 0.0,
            brackt: false,
            stage1: true,
            finit: 0.0,
            ginit: 0.0,
            gtest: 0.0,
            width: 0.0,
            width1: 0.0,
            stx: 0.0,
            fx: 0.0,
            gx: 0.0,
            sty: 0.0,
            fy: 0.0,
            gy: 0.0,
            stmin: 0.0,
            stmax: 0.0,
            task: SearchTask::Error(Status::NotStarted),
        }
    }

    /// Parameters of the search.
    pub fn params(&self) -> &LineSearchParams {
        &self.params
    }

    /// Current trial step.
    pub fn step(&self) -> f64 {
        self.stp
    }

    /// Last outcome.
    pub fn task(&self) -> SearchTask {
        self.task
    }

    /// Starts a search with first trial step `stp`.
    ///
    /// `f0` is the objective at x₀ and `g0` the directional derivative
    /// ⟨∇f(x₀), d⟩, which must be negative.
    pub fn start(&mut self, stp: f64, f0: f64, g0: f64) -> SearchTask {
        let LineSearchParams {
            ftol,
            stpmin,
            stpmax,
            ..
        } = self.params;
        self.task = if stpmin > stpmax {
            SearchTask::Error(Status::StpminGtStpmax)
        } else if !self.params.is_valid() {
            SearchTask::Error(Status::InvalidArgument)
        } else if g0 >= 0.0 {
            SearchTask::Error(Status::NotADescent)
        } else if !(stp >= stpmin && stp <= stpmax) {
            SearchTask::Error(Status::InvalidArgument)
        } else {
            self.stp = stp;
            self.brackt = false;
            self.stage1 = true;
            self.finit = f0;
            self.ginit = g0;
            self.gtest = ftol * g0;
            self.width = stpmax - stpmin;
            self.width1 = 2.0 * self.width;
            self.stx = 0.0;
            self.fx = f0;
            self.gx = g0;
            self.sty = 0.0;
            self.fy = f0;
            self.gy = g0;
            self.stmin = 0.0;
            self.stmax = stp + XTRAPU * stp;
            SearchTask::Evaluate
        };
        self.task
    }

    /// Feeds the objective `f` and directional derivative `g` at the
    /// current trial step and returns the next outcome.
    ///
    /// On [`SearchTask::Evaluate`], [`step`](Self::step) holds the next
    /// trial step.
    pub fn iterate(&mut self, f: f64, g: f64) -> SearchTask {
        if self.task != SearchTask::Evaluate {
            return self.task;
        }
        let LineSearchParams {
            gtol,
            xtol,
            stpmin,
            stpmax,
            ..
        } = self.params;
        let stp = self.stp;
        let ftest = self.finit + stp * self.gtest;

        if self.stage1 && f <= ftest && g >= 0.0 {
            self.stage1 = false;
        }

        self.task = if self.brackt && (stp <= self.stmin || stp >= self.stmax) {
            SearchTask::Warning(Status::RoundingErrorsPreventProgress)
        } else if self.brackt && self.stmax - self.stmin <= xtol * self.stmax {
            SearchTask::Warning(Status::XtolTestSatisfied)
        } else if stp == stpmax && f <= ftest && g <= self.gtest {
            SearchTask::Warning(Status::StepEqualsStpmax)
        } else if stp == stpmin && (f > ftest || g >= self.gtest) {
            SearchTask::Warning(Status::StepEqualsStpmin)
        } else if f <= ftest && g.abs() <= gtol * (-self.ginit) {
            SearchTask::Converged
        } else {
            SearchTask::Evaluate
        };
        if self.task.is_done() {
            trace!(stp, f, g, task = ?self.task, "line search stopped");
            return self.task;
        }

        if self.stage1 && f <= self.fx && f > ftest {
            // Modified function ψ(α) = f(α) - f(0) - α·gtest.
            let mut step = Step {
                stx: self.stx,
                fx: self.fx - self.stx * self.gtest,
                dx: self.gx - self.gtest,
                sty: self.sty,
                fy: self.fy - self.sty * self.gtest,
                dy: self.gy - self.gtest,
                brackt: self.brackt,
            };
            self.stp = step.update(
                stp,
                f - stp * self.gtest,
                g - self.gtest,
                self.stmin,
                self.stmax,
            );
            self.stx = step.stx;
            self.sty = step.sty;
            self.brackt = step.brackt;
            self.fx = step.fx + step.stx * self.gtest;
            self.fy = step.fy + step.sty * self.gtest;
            self.gx = step.dx + self.gtest;
            self.gy = step.dy + self.gtest;
        } else {
            let mut step = Step {
                stx: self.stx,
                fx: self.fx,
                dx: self.gx,
                sty: self.sty,
                fy: self.fy,
                dy: self.gy,
                brackt: self.brackt,
            };
            self.stp = step.update(stp, f, g, self.stmin, self.stmax);
            self.stx = step.stx;
            self.fx = step.fx;
            self.gx = step.dx;
            self.sty = step.sty;
            self.fy = step.fy;
            self.gy = step.dy;
            self.brackt = step.brackt;
        }

        // Force a sufficient decrease of the bracketing interval.
        if self.brackt {
            if (self.sty - self.stx).abs() >= 0.66 * self.width1 {
                self.stp = self.stx + 0.5 * (self.sty - self.stx);
            }
            self.width1 = self.width;
            self.width = (self.sty - self.stx).abs();
        }

        if self.brackt {
            self.stmin = self.stx.min(self.sty);
            self.stmax = self.stx.max(self.sty);
        } else {
            self.stmin = self.stp + XTRAPL * (self.stp - self.stx);
            self.stmax = self.stp + XTRAPU * (self.stp - self.stx);
        }

        self.stp = self.stp.max(stpmin).min(stpmax);

        // Fall back to the best step if no further progress is possible.
        if self.brackt
            && (self.stp <= self.stmin
                || self.stp >= self.stmax
                || self.stmax - self.stmin <= xtol * self.stmax)
        {
            self.stp = self.stx;
        }
        trace!(stp = self.stp, brackt = self.brackt, "line search new trial step");
        self.task
    }
}

/// Safeguarded step of the Moré & Thuente search.
///
/// `stx` is the best step so far, `sty` the other end of the interval of
/// uncertainty; `f*` and `d*` are function values and derivatives.
struct Step {
    stx: f64,
    fx: f64,
    dx: f64,
    sty: f64,
    fy: f64,
    dy: f64,
    brackt: bool,
}

impl Step {
    /// Updates the interval with the trial `(stp, fp, dp)` and returns the
    /// next trial step, kept in `[stpmin, stpmax]` when not bracketed.
    fn update(&mut self, stp: f64, fp: f64, dp: f64, stpmin: f64, stpmax: f64) -> f64 {
        let Self {
            stx,
            fx,
            dx,
            sty,
            fy,
            dy,
            ..
        } = *self;
        let sgnd = dp * dx.signum();

        let stpf = if fp > fx {
            // Higher function value: the minimum is bracketed.
            let theta = 3.0 * (fx - fp) / (stp - stx) + dx + dp;
            let s = theta.abs().max(dx.abs()).max(dp.abs());
            let mut gamma = s * ((theta / s).powi(2) - (dx / s) * (dp / s)).sqrt();
            if stp < stx {
                gamma = -gamma;
            }
            let p = (gamma - dx) + theta;
            let q = ((gamma - dx) + gamma) + dp;
            let stpc = stx + (p / q) * (stp - stx);
            let stpq = stx + ((dx / ((fx - fp) / (stp - stx) + dx)) / 2.0) * (stp - stx);
            self.brackt = true;
            if (stpc - stx).abs() < (stpq - stx).abs() {
                stpc
            } else {
                stpc + (stpq - stpc) / 2.0
            }
        } else if sgnd < 0.0 {
            // Derivatives of opposite sign: the minimum is bracketed.
            let theta = 3.0 * (fx - fp) / (stp - stx) + dx + dp;
            let s = theta.abs().max(dx.abs()).max(dp.abs());
            let mut gamma = s * ((theta / s).powi(2) - (dx / s) * (dp / s)).sqrt();
            if stp > stx {
                gamma = -gamma;
            }
            let p = (gamma - dp) + theta;
            let q = ((gamma - dp) + gamma) + dx;
            let stpc = stp + (p / q) * (stx - stp);
            let stpq = stp + (dp / (dp - dx)) * (stx - stp);
            self.brackt = true;
            if (stpc - stp).abs() > (stpq - stp).abs() {
                stpc
            } else {
                stpq
            }
        } else if dp.abs() < dx.abs() {
            // Derivative decreases in magnitude.
            let theta = 3.0 * (fx - fp) / (stp - stx) + dx + dp;
            let s = theta.abs().max(dx.abs()).max(dp.abs());
            let mut gamma = s * ((theta / s).powi(2) - (dx / s) * (dp / s)).max(0.0).sqrt();
            if stp > stx {
                gamma = -gamma;
            }
            let p = (gamma - dp) + theta;
            let q = (gamma + (dx - dp)) + gamma;
            let r = p / q;
            let stpc = if r < 0.0 && gamma != 0.0 {
                stp + r * (stx - stp)
            } else if stp > stx {
                stpmax
            } else {
                stpmin
            };
            let stpq = stp + (dp / (dp - dx)) * (stx - stp);
            if self.brackt {
                let stpf = if (stpc - stp).abs() < (stpq - stp).abs() {
                    stpc
                } else {
                    stpq
                };
                if stp > stx {
                    stpf.min(stp + 0.66 * (sty - stp))
                } else {
                    stpf.max(stp + 0.66 * (sty - stp))
                }
            } else {
                let stpf = if (stpc - stp).abs() > (stpq - stp).abs() {
                    stpc
                } else {
                    stpq
                };
                stpf.min(stpmax).max(stpmin)
            }
        } else if self.brackt {
            // Derivative does not decrease: cubic step towards sty.
            let theta = 3.0 * (fp - fy) / (sty - stp) + dy + dp;
            let s = theta.abs().max(dy.abs()).max(dp.abs());
            let mut gamma = s * ((theta / s).powi(2) - (dy / s) * (dp / s)).sqrt();
            if stp > sty {
                gamma = -gamma;
            }
            let p = (gamma - dp) + theta;
            let q = ((gamma - dp) + gamma) + dy;
            stp + (p / q) * (sty - stp)
        } else if stp > stx {
            stpmax
        } else {
            stpmin
        };

        if fp > fx {
            self.sty = stp;
            self.fy = fp;
            self.dy = dp;
        } else {
            if sgnd < 0.0 {
                self.sty = stx;
                self.fy = fx;
                self.dy = dx;
            }
            self.stx = stp;
            self.fx = fp;
            self.dx = dp;
        }
        stpf
    }
}

/// Armijo backtracking line search.
///
/// The sufficient decrease condition is
/// f(x) ≤ f(x₀) + ftol·⟨g₀, x - x₀⟩, where x may be a projection of
/// x₀ + αd, so the caller supplies ⟨g₀, x - x₀⟩ at each trial.
#[derive(Debug, Clone)]
pub struct Backtracking {
    params: LineSearchParams,
    stp: f64,
    f0: f64,
    g0: f64,
    task: SearchTask,
}

/// Bounds of the interpolated step, as fractions of the current step.
const BACKTRACK_MIN: f64 = 0.1;
const BACKTRACK_MAX: f64 = 0.5;

impl Backtracking {
    /// Creates an idle line search.
    pub fn new(params: LineSearchParams) -> Self {
        Self {
            params,
            stp: 0.0,
            f0: 0.0,
            g0: 0.0,
            task: SearchTask::Error(Status::NotStarted),
        }
    }

    /// Current trial step.
    pub fn step(&self) -> f64 {
        self.stp
    }

    /// Last outcome.
    pub fn task(&self) -> SearchTask {
        self.task
    }

    /// Starts a search with first trial step `stp`, objective `f0` at x₀
    /// and directional derivative `g0 < 0`.
    pub fn start(&mut self, stp: f64, f0: f64, g0: f64) -> SearchTask {
        self.task = if self.params.stpmin > self.params.stpmax {
            SearchTask::Error(Status::StpminGtStpmax)
        } else if g0 >= 0.0 {
            SearchTask::Error(Status::NotADescent)
        } else if !(stp > 0.0 && stp <= self.params.stpmax) {
            SearchTask::Error(Status::InvalidArgument)
        } else {
            self.stp = stp;
            self.f0 = f0;
            self.g0 = g0;
            SearchTask::Evaluate
        };
        self.task
    }

    /// Feeds the objective `f` at the current trial point and the
    /// predicted decrease `decrease = ⟨g₀, x - x₀⟩`.
    pub fn iterate(&mut self, f: f64, decrease: f64) -> SearchTask {
        if self.task != SearchTask::Evaluate {
            return self.task;
        }
        if f <= self.f0 + self.params.ftol * decrease {
            self.task = SearchTask::Converged;
            return self.task;
        }
        if self.stp <= self.params.stpmin {
            self.task = SearchTask::Warning(Status::StepEqualsStpmin);
            return self.task;
        }
        let stp = self.stp;
        let curvature = 2.0 * (f - self.f0 - stp * self.g0);
        let next = if curvature > 0.0 {
            -self.g0 * stp * stp / curvature
        } else {
            BACKTRACK_MAX * stp
        };
        self.stp = next
            .max(BACKTRACK_MIN * stp)
            .min(BACKTRACK_MAX * stp)
            .max(self.params.stpmin);
        trace!(stp = self.stp, f, "backtracking");
        self.task
    }
}
