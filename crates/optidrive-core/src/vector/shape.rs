//! Dimension descriptors.
//!
//! A [`Shape`] is the ordered list of axis lengths of the variables of an
//! optimizer. It is fixed when the optimizer is built and every buffer
//! handed to the optimizer afterwards must have an equal shape: same rank
//! and same length along every axis. Two buffers with the same number of
//! elements but different shapes are *not* interchangeable.

use crate::core::error::{OptimizerError, OptimizerResult};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of axes of a shape.
pub const MAX_RANK: usize = 10;

/// Ordered sequence of axis lengths.
///
/// Rank 0 denotes a single element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Shape {
    lengths: Vec<usize>,
}

impl Shape {
    /// Creates a validated shape.
    ///
    /// Every length must be at least 1 and the rank must not exceed
    /// [`MAX_RANK`].
    pub fn new<L: Into<Vec<usize>>>(lengths: L) -> OptimizerResult<Self> {
        let shape = Self::from_lengths(lengths);
        shape.validate()?;
        Ok(shape)
    }

    /// Creates a shape without validating it.
    ///
    /// Buffers of any shape can be described this way; invalid shapes are
    /// rejected when compared against an optimizer's shape.
    pub fn from_lengths<L: Into<Vec<usize>>>(lengths: L) -> Self {
        Self {
            lengths: lengths.into(),
        }
    }

    /// Rank-0 shape (a single element).
    pub fn scalar() -> Self {
        Self {
            lengths: Vec::new(),
        }
    }

    /// Rank-1 shape of `n` elements.
    pub fn vector(n: usize) -> Self {
        Self { lengths: vec![n] }
    }

    /// Checks that the shape can describe the variables of an optimizer.
    pub fn validate(&self) -> OptimizerResult<()> {
        if self.lengths.len() > MAX_RANK {
            return Err(OptimizerError::invalid_argument("too many dimensions"));
        }
        if self.lengths.iter().any(|&len| len < 1) || self.checked_count().is_none() {
            return Err(OptimizerError::invalid_argument("invalid dimension length"));
        }
        Ok(())
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.lengths.len()
    }

    /// Axis lengths.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Total number of elements, saturating at `usize::MAX`.
    ///
    /// A validated shape never saturates.
    pub fn count(&self) -> usize {
        self.checked_count().unwrap_or(usize::MAX)
    }

    /// Total number of elements, or `None` if it does not fit in a `usize`.
    pub fn checked_count(&self) -> Option<usize> {
        self.lengths
            .iter()
            .try_fold(1_usize, |count, &len| count.checked_mul(len))
    }

    /// Fails with a DimensionMismatch error unless `other` equals `self`.
    pub fn check_same(&self, other: &Self, context: &str) -> OptimizerResult<()> {
        if self == other {
            Ok(())
        } else {
            Err(OptimizerError::dimension_mismatch(context, self, other))
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, len) in self.lengths.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{len}")?;
        }
        f.write_str("]")
    }
}

impl TryFrom<i64> for Shape {
    type Error = OptimizerError;

    /// A scalar length `n` describes a rank-1 shape of `n` elements.
    fn try_from(n: i64) -> OptimizerResult<Self> {
        usize::try_from(n)
            .ok()
            .filter(|&n| n >= 1)
            .map(Self::vector)
            .ok_or_else(|| OptimizerError::invalid_argument("invalid dimension length"))
    }
}

impl TryFrom<&[i64]> for Shape {
    type Error = OptimizerError;

    fn try_from(lengths: &[i64]) -> OptimizerResult<Self> {
        let lengths = lengths
            .iter()
            .map(|&len| {
                usize::try_from(len)
                    .map_err(|_| OptimizerError::invalid_argument("invalid dimension length"))
            })
            .collect::<OptimizerResult<Vec<_>>>()?;
        Self::new(lengths)
    }
}

impl From<usize> for Shape {
    fn from(n: usize) -> Self {
        Self::vector(n)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(lengths: [usize; N]) -> Self {
        Self::from_lengths(lengths.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_counts() {
        assert_eq!(Shape::scalar().count(), 1);
        assert_eq!(Shape::scalar().rank(), 0);
        assert_eq!(Shape::vector(7).count(), 7);
        assert_eq!(Shape::from([2, 3, 4]).count(), 24);
        assert_eq!(Shape::from([2, 3, 4]).rank(), 3);
    }

    #[test]
    fn test_shape_validation() {
        assert!(Shape::new(vec![3, 2]).is_ok());
        assert!(Shape::new(vec![3, 0]).is_err());
        assert!(Shape::new(vec![1; MAX_RANK + 1]).is_err());
        assert!(Shape::try_from(0_i64).is_err());
        assert!(Shape::try_from(-4_i64).is_err());
        assert_eq!(Shape::try_from(5_i64).unwrap(), Shape::vector(5));
        assert!(Shape::try_from(&[2_i64, -1][..]).is_err());
    }

    #[test]
    fn test_overflowing_count_is_rejected() {
        let huge = Shape::from([usize::MAX / 2, 3]);
        assert_eq!(huge.checked_count(), None);
        assert_eq!(huge.count(), usize::MAX);
        assert!(matches!(
            huge.validate(),
            Err(OptimizerError::InvalidArgument { .. })
        ));

        let wrapping = Shape::from([(1_usize << (usize::BITS - 1)) + 1, 2]);
        assert!(Shape::new(wrapping.lengths().to_vec()).is_err());
        assert_eq!(Shape::from([3, 4]).checked_count(), Some(12));
    }

    #[test]
    fn test_same_count_different_shape() {
        let a = Shape::from([2, 3]);
        let b = Shape::from([3, 2]);
        let c = Shape::vector(6);
        assert_eq!(a.count(), b.count());
        assert_ne!(a, b);
        assert_ne!(a, c);
        let err = a.check_same(&b, "bad dimensions").unwrap_err();
        assert!(err.is_dimension_mismatch());
        assert_eq!(err.to_string(), "bad dimensions: expected [2, 3], got [3, 2]");
    }
}
