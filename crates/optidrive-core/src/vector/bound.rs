//! Box constraints.
//!
//! A bound is either a single value applying to every variable or one value
//! per variable. Bounds are built once, when the optimizer is constructed,
//! from a [`BoundSpec`] supplied by the caller. Array bounds are copied into
//! a vector owned by the optimizer so the caller's buffer is not retained.

use crate::core::error::{OptimizerError, OptimizerResult};
use crate::vector::shape::Shape;
use crate::vector::space::VectorSpace;
use crate::vector::storage::Array;
use crate::vector::vectors::Vector;
use tracing::debug;

/// Caller description of one side of the box.
#[derive(Debug, Clone, Default)]
pub enum BoundSpec<'a> {
    /// No constraint on this side.
    #[default]
    Absent,
    /// Same value for every variable.
    Scalar(f64),
    /// One value per variable; must have the optimizer's shape.
    Array(Array<'a>),
}

impl From<f64> for BoundSpec<'_> {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl<'a> From<Array<'a>> for BoundSpec<'a> {
    fn from(array: Array<'a>) -> Self {
        Self::Array(array)
    }
}

impl<'a> From<&'a [f64]> for BoundSpec<'a> {
    fn from(values: &'a [f64]) -> Self {
        Self::Array(Array::from(values))
    }
}

impl<'a> From<&'a [f32]> for BoundSpec<'a> {
    fn from(values: &'a [f32]) -> Self {
        Self::Array(Array::from(values))
    }
}

impl<T> From<Option<T>> for BoundSpec<'_>
where
    T: Into<f64>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, |v| Self::Scalar(v.into()))
    }
}

/// Validated bound owned by an optimizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// Same value for every variable.
    Scalar(f64),
    /// One value per variable, in the precision of the vector space.
    Vector(Vector),
}

impl Bound {
    /// Bound value of variable `i`, widened to f64.
    pub fn value_at(&self, i: usize) -> Option<f64> {
        match self {
            Self::Scalar(value) => Some(*value),
            Self::Vector(vector) => vector.get(i),
        }
    }

    /// Returns true for a single value applying to every variable.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }
}

/// Builds one side of the box for an optimizer of the given space and shape.
///
/// `BoundSpec::Absent` yields `None`. A scalar must not be NaN; infinite values
/// are accepted and leave the side unconstrained in practice. An array
/// must have exactly `shape` and `space.size()` elements in the space's
/// precision; its contents are copied once.
pub fn make_bound(
    space: &VectorSpace,
    shape: &Shape,
    spec: BoundSpec<'_>,
) -> OptimizerResult<Option<Bound>> {
    match spec {
        BoundSpec::Absent => Ok(None),
        BoundSpec::Scalar(value) => {
            if value.is_nan() {
                return Err(OptimizerError::invalid_argument("invalid bound"));
            }
            Ok(Some(Bound::Scalar(value)))
        }
        BoundSpec::Array(array) => {
            shape.check_same(array.shape(), "bad bound dimensions")?;
            let data = array.data();
            if data.len() != space.size() {
                return Err(OptimizerError::dimension_mismatch(
                    "bad number of elements for the bound",
                    space.size(),
                    data.len(),
                ));
            }
            let vector = space.vector_from(data)?;
            if (0..vector.len()).any(|i| vector.get(i).is_some_and(f64::is_nan)) {
                return Err(OptimizerError::invalid_argument("invalid bound"));
            }
            debug!(size = vector.len(), "copied array bound");
            Ok(Some(Bound::Vector(vector)))
        }
    }
}
