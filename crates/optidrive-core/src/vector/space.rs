//! Vector spaces.
//!
//! A [`VectorSpace`] fixes the number of elements and the precision of all
//! vectors an optimizer works with. It creates owned vectors, wraps caller
//! buffers and implements the vector operations the backends need. The
//! operations accept any mix of owned and wrapped vectors; each operand is
//! checked against the space before the kernel runs.

use crate::core::error::{OptimizerError, OptimizerResult};
use crate::core::types::{Precision, Scalar};
use crate::vector::bound::Bound;
use crate::vector::kernels::{self, BoundView};
use crate::vector::storage::{AsElements, AsElementsMut, Elements, ElementsMut};
use crate::vector::vectors::{Vector, WrappedVector};

/// Runs a generic method of the space with the scalar type of its precision.
macro_rules! by_precision {
    ($space:expr, $method:ident($($arg:expr),*)) => {
        match $space.precision {
            Precision::Single => $space.$method::<f32>($($arg),*),
            Precision::Double => $space.$method::<f64>($($arg),*),
        }
    };
}

/// Element count and precision shared by all vectors of an optimizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorSpace {
    size: usize,
    precision: Precision,
}

impl VectorSpace {
    /// Creates a space of `size` elements.
    pub fn new(size: usize, precision: Precision) -> OptimizerResult<Self> {
        if size < 1 {
            return Err(OptimizerError::invalid_argument(format!(
                "invalid vector space size {size}"
            )));
        }
        Ok(Self { size, precision })
    }

    /// Number of elements of every vector.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Precision of every vector.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Allocates a zero-filled vector of this space.
    pub fn create_vector(&self) -> OptimizerResult<Vector> {
        Vector::zeros(self.size, self.precision)
    }

    /// Allocates a vector of this space holding a copy of `source`.
    pub fn vector_from(&self, source: Elements<'_>) -> OptimizerResult<Vector> {
        self.check(&source, "bad number of elements")?;
        let mut vector = self.create_vector()?;
        match (vector.elements_mut(), source) {
            (ElementsMut::Single(dst), Elements::Single(src)) => dst.copy_from_slice(src),
            (ElementsMut::Double(dst), Elements::Double(src)) => dst.copy_from_slice(src),
            _ => unreachable!("precision checked above"),
        }
        Ok(vector)
    }

    /// Wraps a caller buffer without copying it.
    ///
    /// Fails with a DimensionMismatch error if the buffer does not hold
    /// exactly `size` elements of this space's precision.
    pub fn wrap<'a>(&self, data: ElementsMut<'a>) -> OptimizerResult<WrappedVector<'a>> {
        self.check(&data.as_elements(), "bad number of elements")?;
        Ok(WrappedVector::new(data))
    }

    fn check(&self, elements: &Elements<'_>, context: &str) -> OptimizerResult<()> {
        if elements.precision() != self.precision {
            return Err(OptimizerError::dimension_mismatch(
                "bad element type",
                self.precision,
                elements.precision(),
            ));
        }
        if elements.len() != self.size {
            return Err(OptimizerError::dimension_mismatch(
                context,
                self.size,
                elements.len(),
            ));
        }
        Ok(())
    }

    fn slice<'v, T: Scalar>(&self, v: &'v impl AsElements) -> OptimizerResult<&'v [T]> {
        let elements = v.elements();
        self.check(&elements, "vector does not belong to the space")?;
        T::slice(elements).ok_or_else(|| {
            OptimizerError::dimension_mismatch("bad element type", self.precision, T::PRECISION)
        })
    }

    fn slice_mut<'v, T: Scalar>(
        &self,
        v: &'v mut impl AsElementsMut,
    ) -> OptimizerResult<&'v mut [T]> {
        self.check(&v.elements(), "vector does not belong to the space")?;
        T::slice_mut(v.elements_mut()).ok_or_else(|| {
            OptimizerError::dimension_mismatch("bad element type", self.precision, T::PRECISION)
        })
    }

    fn bound_view<'b, T: Scalar>(&self, bound: Option<&'b Bound>) -> OptimizerResult<BoundView<'b, T>> {
        Ok(match bound {
            None => BoundView::None,
            Some(Bound::Scalar(value)) => BoundView::Scalar(<T as Scalar>::from_f64(*value)),
            Some(Bound::Vector(vector)) => BoundView::Slice(self.slice::<T>(vector)?),
        })
    }

    /// Inner product `<x, y>`.
    pub fn dot(&self, x: &impl AsElements, y: &impl AsElements) -> OptimizerResult<f64> {
        by_precision!(self, dot_impl(x, y))
    }

    fn dot_impl<T: Scalar>(&self, x: &impl AsElements, y: &impl AsElements) -> OptimizerResult<f64> {
        Ok(kernels::dot(self.slice::<T>(x)?, self.slice::<T>(y)?))
    }

    /// Euclidean norm of `x`.
    pub fn norm2(&self, x: &impl AsElements) -> OptimizerResult<f64> {
        by_precision!(self, norm2_impl(x))
    }

    fn norm2_impl<T: Scalar>(&self, x: &impl AsElements) -> OptimizerResult<f64> {
        Ok(kernels::norm2(self.slice::<T>(x)?))
    }

    /// Infinite norm of `x`.
    pub fn norminf(&self, x: &impl AsElements) -> OptimizerResult<f64> {
        by_precision!(self, norminf_impl(x))
    }

    fn norminf_impl<T: Scalar>(&self, x: &impl AsElements) -> OptimizerResult<f64> {
        Ok(kernels::norminf(self.slice::<T>(x)?))
    }

    /// Returns true if every element of `x` is finite.
    pub fn all_finite(&self, x: &impl AsElements) -> OptimizerResult<bool> {
        by_precision!(self, all_finite_impl(x))
    }

    fn all_finite_impl<T: Scalar>(&self, x: &impl AsElements) -> OptimizerResult<bool> {
        Ok(kernels::all_finite(self.slice::<T>(x)?))
    }

    /// `dst = src`.
    pub fn copy(&self, dst: &mut impl AsElementsMut, src: &impl AsElements) -> OptimizerResult<()> {
        by_precision!(self, copy_impl(dst, src))
    }

    fn copy_impl<T: Scalar>(
        &self,
        dst: &mut impl AsElementsMut,
        src: &impl AsElements,
    ) -> OptimizerResult<()> {
        let src = self.slice::<T>(src)?;
        kernels::copy(self.slice_mut::<T>(dst)?, src);
        Ok(())
    }

    /// Sets every element of `dst` to `value`.
    pub fn fill(&self, dst: &mut impl AsElementsMut, value: f64) -> OptimizerResult<()> {
        by_precision!(self, fill_impl(dst, value))
    }

    fn fill_impl<T: Scalar>(&self, dst: &mut impl AsElementsMut, value: f64) -> OptimizerResult<()> {
        kernels::fill(self.slice_mut::<T>(dst)?, value);
        Ok(())
    }

    /// `dst = alpha * dst`.
    pub fn scale(&self, dst: &mut impl AsElementsMut, alpha: f64) -> OptimizerResult<()> {
        by_precision!(self, scale_impl(dst, alpha))
    }

    fn scale_impl<T: Scalar>(&self, dst: &mut impl AsElementsMut, alpha: f64) -> OptimizerResult<()> {
        kernels::scale(self.slice_mut::<T>(dst)?, alpha);
        Ok(())
    }

    /// `dst = dst + alpha * x`.
    pub fn axpy(
        &self,
        dst: &mut impl AsElementsMut,
        alpha: f64,
        x: &impl AsElements,
    ) -> OptimizerResult<()> {
        by_precision!(self, axpy_impl(dst, alpha, x))
    }

    fn axpy_impl<T: Scalar>(
        &self,
        dst: &mut impl AsElementsMut,
        alpha: f64,
        x: &impl AsElements,
    ) -> OptimizerResult<()> {
        let x = self.slice::<T>(x)?;
        kernels::axpy(self.slice_mut::<T>(dst)?, alpha, x);
        Ok(())
    }

    /// `dst = alpha * x + beta * y`.
    pub fn combine(
        &self,
        dst: &mut impl AsElementsMut,
        alpha: f64,
        x: &impl AsElements,
        beta: f64,
        y: &impl AsElements,
    ) -> OptimizerResult<()> {
        by_precision!(self, combine_impl(dst, alpha, x, beta, y))
    }

    fn combine_impl<T: Scalar>(
        &self,
        dst: &mut impl AsElementsMut,
        alpha: f64,
        x: &impl AsElements,
        beta: f64,
        y: &impl AsElements,
    ) -> OptimizerResult<()> {
        let x = self.slice::<T>(x)?;
        let y = self.slice::<T>(y)?;
        kernels::combine(self.slice_mut::<T>(dst)?, alpha, x, beta, y);
        Ok(())
    }

    /// Projects `x` in place onto the box `[lower, upper]`.
    ///
    /// Returns the number of coordinates that had to be moved.
    pub fn project(
        &self,
        x: &mut impl AsElementsMut,
        lower: Option<&Bound>,
        upper: Option<&Bound>,
    ) -> OptimizerResult<usize> {
        by_precision!(self, project_impl(x, lower, upper))
    }

    fn project_impl<T: Scalar>(
        &self,
        x: &mut impl AsElementsMut,
        lower: Option<&Bound>,
        upper: Option<&Bound>,
    ) -> OptimizerResult<usize> {
        let lower = self.bound_view::<T>(lower)?;
        let upper = self.bound_view::<T>(upper)?;
        Ok(kernels::project(self.slice_mut::<T>(x)?, lower, upper))
    }

    /// Zeroes the entries of `dst` for variables blocked at a bound.
    ///
    /// A variable is blocked when it lies on a bound and `-g` points out of
    /// the box. With `dst = g` this yields the projected gradient. Returns
    /// the number of blocked variables.
    pub fn mask_active(
        &self,
        dst: &mut impl AsElementsMut,
        x: &impl AsElements,
        g: &impl AsElements,
        lower: Option<&Bound>,
        upper: Option<&Bound>,
    ) -> OptimizerResult<usize> {
        by_precision!(self, mask_active_impl(dst, x, g, lower, upper))
    }

    fn mask_active_impl<T: Scalar>(
        &self,
        dst: &mut impl AsElementsMut,
        x: &impl AsElements,
        g: &impl AsElements,
        lower: Option<&Bound>,
        upper: Option<&Bound>,
    ) -> OptimizerResult<usize> {
        let x = self.slice::<T>(x)?;
        let g = self.slice::<T>(g)?;
        let lower = self.bound_view::<T>(lower)?;
        let upper = self.bound_view::<T>(upper)?;
        Ok(kernels::mask_active(self.slice_mut::<T>(dst)?, x, g, lower, upper))
    }

    /// Index of the first coordinate whose lower bound exceeds its upper bound.
    pub fn first_infeasible(
        &self,
        lower: Option<&Bound>,
        upper: Option<&Bound>,
    ) -> OptimizerResult<Option<usize>> {
        by_precision!(self, first_infeasible_impl(lower, upper))
    }

    fn first_infeasible_impl<T: Scalar>(
        &self,
        lower: Option<&Bound>,
        upper: Option<&Bound>,
    ) -> OptimizerResult<Option<usize>> {
        let lower = self.bound_view::<T>(lower)?;
        let upper = self.bound_view::<T>(upper)?;
        Ok(kernels::first_infeasible(self.size, lower, upper))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_space_creation() {
        let space = VectorSpace::new(10, Precision::Double).unwrap();
        assert_eq!(space.size(), 10);
        assert_eq!(space.precision(), Precision::Double);
        assert!(VectorSpace::new(0, Precision::Single).is_err());
    }

    #[test]
    fn test_wrap_checks_count_and_precision() {
        let space = VectorSpace::new(3, Precision::Single).unwrap();
        let mut good = [0.0_f32; 3];
        let mut short = [0.0_f32; 2];
        let mut wide = [0.0_f64; 3];
        assert!(space.wrap(ElementsMut::from(&mut good[..])).is_ok());
        assert!(space
            .wrap(ElementsMut::from(&mut short[..]))
            .unwrap_err()
            .is_dimension_mismatch());
        assert!(space
            .wrap(ElementsMut::from(&mut wide[..]))
            .unwrap_err()
            .is_dimension_mismatch());
    }

    #[test]
    fn test_operations_mix_owned_and_wrapped() {
        let space = VectorSpace::new(3, Precision::Double).unwrap();
        let mut buffer = [1.0_f64, 2.0, 2.0];
        let x = space.wrap(ElementsMut::from(&mut buffer[..])).unwrap();
        let mut d = space.create_vector().unwrap();

        space.fill(&mut d, 1.0).unwrap();
        assert_relative_eq!(space.dot(&x, &d).unwrap(), 5.0);
        assert_relative_eq!(space.norm2(&x).unwrap(), 3.0);
        assert_relative_eq!(space.norminf(&x).unwrap(), 2.0);

        space.axpy(&mut d, -1.0, &x).unwrap();
        assert_eq!(d.to_f64_vec(), vec![0.0, -1.0, -1.0]);

        let mut e = space.create_vector().unwrap();
        space.combine(&mut e, 2.0, &x, 1.0, &d).unwrap();
        assert_eq!(e.to_f64_vec(), vec![2.0, 3.0, 3.0]);

        space.copy(&mut d, &e).unwrap();
        space.scale(&mut d, 0.5).unwrap();
        assert_eq!(d.to_f64_vec(), vec![1.0, 1.5, 1.5]);
    }

    #[test]
    fn test_operations_reject_foreign_vectors() {
        let space = VectorSpace::new(3, Precision::Double).unwrap();
        let other = VectorSpace::new(4, Precision::Double).unwrap();
        let a = space.create_vector().unwrap();
        let b = other.create_vector().unwrap();
        assert!(space.dot(&a, &b).is_err());
    }

    #[test]
    fn test_vector_from_copies() {
        let space = VectorSpace::new(2, Precision::Single).unwrap();
        let source = [1.0_f32, -1.0];
        let v = space.vector_from(Elements::from(&source[..])).unwrap();
        assert_eq!(v.to_f64_vec(), vec![1.0, -1.0]);
        assert!(space.vector_from(Elements::from(&[1.0_f64, 2.0][..])).is_err());
    }
}
