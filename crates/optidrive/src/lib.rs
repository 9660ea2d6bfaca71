//! # Optidrive
//!
//! Reverse-communication driver for iterative optimization.
//!
//! An [`Optimizer`] never calls the objective function. The caller owns
//! the variables and gradient buffers, evaluates the objective whenever
//! the optimizer asks for it, and keeps calling
//! [`iterate`](Optimizer::iterate) until the returned [`Task`] says the
//! solution has been found or something went wrong.
//!
//! ## Algorithms
//!
//! - **NLCG**: Nonlinear conjugate gradient for unconstrained problems
//! - **VMLMB**: Limited memory variable metric method, with optional
//!   lower and upper bounds on the variables (LBFGS when unbounded,
//!   BLMVM emulation on request)
//!
//! ## Quick Start
//!
//! ```rust
//! use optidrive::prelude::*;
//!
//! // Minimize (x₀ - 3)² + (x₁ - 3)² subject to x ≤ 1
//! let mut opt = Optimizer::vmlmb(
//!     Shape::vector(2),
//!     VmlmbConfig::default(),
//!     BoundSpec::Absent,
//!     1.0,
//! )
//! .unwrap();
//!
//! let mut x = vec![0.0_f64; 2];
//! let mut g = vec![0.0_f64; 2];
//! let mut f = 0.0;
//! let mut task = opt.start(&mut x).unwrap();
//! loop {
//!     match task {
//!         Task::ComputeObjectiveAndGradient => {
//!             f = 0.0;
//!             for (xi, gi) in x.iter().zip(g.iter_mut()) {
//!                 f += (xi - 3.0) * (xi - 3.0);
//!                 *gi = 2.0 * (xi - 3.0);
//!             }
//!         }
//!         Task::NewPoint => {}
//!         _ => break,
//!     }
//!     task = opt.iterate(&mut x, f, &mut g).unwrap();
//! }
//! assert_eq!(task, Task::FinalPoint);
//! assert!(x.iter().all(|&xi| (xi - 1.0).abs() < 1e-8));
//! ```
//!
//! ## Crate Organization
//!
//! - [`optidrive_core`]: Shapes, vector spaces, bounds, tasks and statuses
//! - [`optidrive_optim`]: The algorithm backends
//! - this crate: Optimizer instances built on top of both

pub mod attributes;
pub mod instance;

pub use attributes::{Attribute, Summary};
pub use instance::Optimizer;

/// Everything needed to build and drive an optimizer.
pub mod prelude {
    pub use crate::attributes::{Attribute, Summary};
    pub use crate::instance::Optimizer;
    pub use optidrive_core::prelude::*;
    pub use optidrive_optim::{NlcgConfig, Tolerances, VmlmbConfig, DEFAULT_MEMORY};
}
