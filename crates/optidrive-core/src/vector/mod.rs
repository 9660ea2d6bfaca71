//! Shapes, vector spaces, vectors and bounds.
//!
//! Caller buffers enter through [`ArrayMut`] and [`Array`]; the optimizer
//! checks them against its [`Shape`] and [`VectorSpace`] and then works on
//! them in place through [`WrappedVector`]s.

pub mod bound;
pub mod kernels;
pub mod shape;
pub mod space;
pub mod storage;
pub mod vectors;

pub use bound::{make_bound, Bound, BoundSpec};
pub use kernels::BoundView;
pub use shape::{Shape, MAX_RANK};
pub use space::VectorSpace;
pub use storage::{Array, ArrayMut, AsElements, AsElementsMut, Elements, ElementsMut};
pub use vectors::{Vector, VectorSlot, WrappedVector};
