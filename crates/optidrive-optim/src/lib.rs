//! Optidrive Optim - Reverse-communication optimization backends.
//!
//! This crate provides the algorithm backends driven by
//! [`optidrive`](https://docs.rs/optidrive) optimizer instances. Each
//! backend implements [`optidrive_core::optimization::Backend`] and never
//! evaluates the objective itself: it tells the caller what to do next
//! through a [`Task`](optidrive_core::optimization::Task).
//!
//! # Available Backends
//!
//! - **NLCG**: Nonlinear conjugate gradient with eight update rules and a
//!   Moré & Thuente line search
//! - **VMLMB**: Limited memory variable metric method with optional box
//!   constraints (L-BFGS without bounds, BLMVM emulation on request)
//!
//! # Examples
//!
//! ```rust
//! use optidrive_core::prelude::*;
//! use optidrive_optim::{Nlcg, NlcgConfig};
//! use std::sync::Arc;
//!
//! let space = Arc::new(VectorSpace::new(2, Precision::Double).unwrap());
//! let mut nlcg = Nlcg::new(space.clone(), &NlcgConfig::default()).unwrap();
//!
//! let mut x = vec![0.0_f64, 0.0];
//! let mut xw = space.wrap(ElementsMut::from(&mut x[..])).unwrap();
//! assert_eq!(nlcg.start(&mut xw), Task::ComputeObjectiveAndGradient);
//! ```

pub mod config;
pub mod lbfgs;
pub mod line_search;
pub mod nlcg;
pub mod vmlmb;

mod utils;

// Re-export main backends for convenience
pub use config::Tolerances;
pub use lbfgs::LbfgsMemory;
pub use line_search::{Backtracking, LineSearchParams, MoreThuente, SearchTask};
pub use nlcg::{Nlcg, NlcgConfig};
pub use vmlmb::{Vmlmb, VmlmbConfig, DEFAULT_MEMORY};
