//! Scalar types and precision tags.
//!
//! Optimizers work either in single (`f32`) or double (`f64`) precision.
//! The precision is chosen once per optimizer and carried at runtime by
//! [`Precision`]; kernels are written once, generically over [`Scalar`].

use crate::vector::storage::{Elements, ElementsMut};
use nalgebra::RealField;
use num_traits::{Float, FromPrimitive};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Display};

/// Floating-point precision of the variables of an optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Precision {
    /// 32-bit IEEE floats.
    Single,
    /// 64-bit IEEE floats.
    #[default]
    Double,
}

impl Precision {
    /// Returns the precision matching a "single" flag.
    pub fn from_single(single: bool) -> Self {
        if single {
            Self::Single
        } else {
            Self::Double
        }
    }

    /// Returns true for single precision.
    pub fn is_single(self) -> bool {
        matches!(self, Self::Single)
    }

    /// Name of the element type ("float" or "double").
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Single => "float",
            Self::Double => "double",
        }
    }

    /// Size of one element in bytes.
    pub fn element_size(self) -> usize {
        match self {
            Self::Single => std::mem::size_of::<f32>(),
            Self::Double => std::mem::size_of::<f64>(),
        }
    }
}

impl Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Trait for scalar types used by the vector kernels (f32 or f64).
pub trait Scalar:
    RealField + Float + FromPrimitive + Display + Debug + Default + Copy + Send + Sync + 'static
{
    /// Runtime tag of this type.
    const PRECISION: Precision;

    /// Convert from f64 (for step lengths and coefficients).
    fn from_f64(v: f64) -> Self;

    /// Convert to f64 (for reductions and logging).
    fn to_f64(self) -> f64;

    /// Borrow the elements as a slice of this type, if the precision matches.
    fn slice(elements: Elements<'_>) -> Option<&'_ [Self]>;

    /// Mutably borrow the elements as a slice of this type, if the precision matches.
    fn slice_mut(elements: ElementsMut<'_>) -> Option<&'_ mut [Self]>;
}

impl Scalar for f32 {
    const PRECISION: Precision = Precision::Single;

    #[allow(clippy::cast_possible_truncation)]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn slice(elements: Elements<'_>) -> Option<&'_ [Self]> {
        match elements {
            Elements::Single(data) => Some(data),
            Elements::Double(_) => None,
        }
    }

    fn slice_mut(elements: ElementsMut<'_>) -> Option<&'_ mut [Self]> {
        match elements {
            ElementsMut::Single(data) => Some(data),
            ElementsMut::Double(_) => None,
        }
    }
}

impl Scalar for f64 {
    const PRECISION: Precision = Precision::Double;

    fn from_f64(v: f64) -> Self {
        v
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn slice(elements: Elements<'_>) -> Option<&'_ [Self]> {
        match elements {
            Elements::Double(data) => Some(data),
            Elements::Single(_) => None,
        }
    }

    fn slice_mut(elements: ElementsMut<'_>) -> Option<&'_ mut [Self]> {
        match elements {
            ElementsMut::Double(data) => Some(data),
            ElementsMut::Single(_) => None,
        }
    }
}
