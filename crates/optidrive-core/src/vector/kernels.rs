//! Slice kernels shared by all vector spaces.
//!
//! Every kernel works on plain slices so that caller buffers are used in
//! place. Linear algebra goes through nalgebra views built on top of the
//! slices, which never copy the data.

use crate::core::types::Scalar;
use nalgebra::{DVectorView, DVectorViewMut};
use num_traits::Float;

/// Bound value seen by the kernels for one side of the box.
#[derive(Debug, Clone, Copy)]
pub enum BoundView<'a, T: Scalar> {
    /// Unconstrained side.
    None,
    /// Same value for every coordinate.
    Scalar(T),
    /// One value per coordinate.
    Slice(&'a [T]),
}

impl<T: Scalar> BoundView<'_, T> {
    /// Bound value for coordinate `i`, if any.
    #[inline]
    pub fn at(&self, i: usize) -> Option<T> {
        match self {
            Self::None => None,
            Self::Scalar(v) => Some(*v),
            Self::Slice(values) => Some(values[i]),
        }
    }

    /// Returns true if this side constrains nothing.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

fn view<T: Scalar>(x: &[T]) -> DVectorView<'_, T> {
    DVectorView::from_slice(x, x.len())
}

fn view_mut<T: Scalar>(x: &mut [T]) -> DVectorViewMut<'_, T> {
    let n = x.len();
    DVectorViewMut::from_slice(x, n)
}

/// Inner product `<x, y>`.
pub fn dot<T: Scalar>(x: &[T], y: &[T]) -> f64 {
    <T as Scalar>::to_f64(view(x).dot(&view(y)))
}

/// Euclidean norm `||x||_2`.
pub fn norm2<T: Scalar>(x: &[T]) -> f64 {
    <T as Scalar>::to_f64(view(x).norm())
}

/// Infinite norm `max |x_i|`.
pub fn norminf<T: Scalar>(x: &[T]) -> f64 {
    x.iter()
        .fold(0.0_f64, |acc, &v| acc.max(<T as Scalar>::to_f64(Float::abs(v))))
}

/// `dst = src`.
pub fn copy<T: Scalar>(dst: &mut [T], src: &[T]) {
    dst.copy_from_slice(src);
}

/// `dst = value` for every element.
pub fn fill<T: Scalar>(dst: &mut [T], value: f64) {
    dst.fill(<T as Scalar>::from_f64(value));
}

/// `dst = alpha * dst`.
pub fn scale<T: Scalar>(dst: &mut [T], alpha: f64) {
    view_mut(dst).scale_mut(<T as Scalar>::from_f64(alpha));
}

/// `dst = dst + alpha * x`.
pub fn axpy<T: Scalar>(dst: &mut [T], alpha: f64, x: &[T]) {
    view_mut(dst).axpy(<T as Scalar>::from_f64(alpha), &view(x), T::one());
}

/// `dst = alpha * x + beta * y`.
pub fn combine<T: Scalar>(dst: &mut [T], alpha: f64, x: &[T], beta: f64, y: &[T]) {
    dst.copy_from_slice(y);
    view_mut(dst).axpy(
        <T as Scalar>::from_f64(alpha),
        &view(x),
        <T as Scalar>::from_f64(beta),
    );
}

/// Clamps `x` into the box in place and returns the number of coordinates moved.
pub fn project<T: Scalar>(x: &mut [T], lower: BoundView<'_, T>, upper: BoundView<'_, T>) -> usize {
    let mut moved = 0;
    for (i, xi) in x.iter_mut().enumerate() {
        let mut v = *xi;
        if let Some(lo) = lower.at(i) {
            if v < lo {
                v = lo;
            }
        }
        if let Some(hi) = upper.at(i) {
            if v > hi {
                v = hi;
            }
        }
        if v != *xi {
            *xi = v;
            moved += 1;
        }
    }
    moved
}

/// Zeroes the entries of `dst` for the variables that are blocked by a bound.
///
/// Variable `i` is blocked when it sits on its lower bound with `g_i > 0`
/// or on its upper bound with `g_i < 0`: moving along `-g` would leave the
/// box. Returns the number of blocked variables.
pub fn mask_active<T: Scalar>(
    dst: &mut [T],
    x: &[T],
    g: &[T],
    lower: BoundView<'_, T>,
    upper: BoundView<'_, T>,
) -> usize {
    let zero = T::zero();
    let mut blocked = 0;
    for i in 0..dst.len() {
        let at_lower = lower.at(i).is_some_and(|lo| x[i] <= lo && g[i] > zero);
        let at_upper = upper.at(i).is_some_and(|hi| x[i] >= hi && g[i] < zero);
        if at_lower || at_upper {
            dst[i] = zero;
            blocked += 1;
        }
    }
    blocked
}

/// Index of the first coordinate where the lower bound exceeds the upper bound.
pub fn first_infeasible<T: Scalar>(
    n: usize,
    lower: BoundView<'_, T>,
    upper: BoundView<'_, T>,
) -> Option<usize> {
    if lower.is_none() || upper.is_none() {
        return None;
    }
    (0..n).find(|&i| match (lower.at(i), upper.at(i)) {
        (Some(lo), Some(hi)) => lo > hi,
        _ => false,
    })
}

/// Returns true if every element is finite.
pub fn all_finite<T: Scalar>(x: &[T]) -> bool {
    x.iter().all(|v| Float::is_finite(*v))
}
