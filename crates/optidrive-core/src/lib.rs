//! Core types for reverse-communication optimization.
//!
//! This crate provides the building blocks shared by every algorithm
//! backend and by the optimizer instances that drive them. The caller owns
//! the variables and evaluates the objective; the optimizer only ever sees
//! the caller's buffers for the duration of one call.
//!
//! # Key Concepts
//!
//! - **Shapes**: The dimensions of the variables, fixed at construction
//! - **Vector spaces**: Element count and precision, with the vector kernels
//! - **Wrapped vectors**: Zero-copy views over caller buffers
//! - **Bounds**: Scalar or per-variable box constraints
//! - **Tasks**: What the caller must do after each call
//!
//! # Modules
//!
//! - [`config`]: Algorithm flags and the global constants registry
//! - [`core`]: Error types and the scalar trait
//! - [`optimization`]: Tasks, statuses and the backend interface
//! - [`vector`]: Shapes, spaces, vectors and bounds

pub mod config;
pub mod core;
pub mod optimization;
pub mod vector;

// Re-export commonly used items at the crate root
pub use crate::core::error::{OptimizerError, OptimizerResult};
pub use crate::core::{error, types};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use optidrive_core::prelude::*;
///
/// let space = VectorSpace::new(4, Precision::Double).unwrap();
/// assert_eq!(space.size(), 4);
/// ```
pub mod prelude {
    pub use crate::config::{constants, Constants, NlcgFlags, NlcgRule};
    pub use crate::core::error::{OptimizerError, OptimizerResult};
    pub use crate::core::types::{Precision, Scalar};
    pub use crate::optimization::{Backend, Status, Task};
    pub use crate::vector::{
        make_bound, Array, ArrayMut, AsElements, AsElementsMut, Bound, BoundSpec, Elements,
        ElementsMut, Shape, Vector, VectorSlot, VectorSpace, WrappedVector,
    };
}
