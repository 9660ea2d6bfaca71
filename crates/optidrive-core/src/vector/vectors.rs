//! Owned and wrapped vectors.
//!
//! A [`Vector`] owns its storage and is created by a
//! [`VectorSpace`](crate::vector::space::VectorSpace); backends use them
//! for their work arrays and vector-valued bounds store one.
//!
//! A [`WrappedVector`] aliases a caller buffer: reads and writes through
//! the wrapper are reads and writes of the caller's memory. It borrows the
//! buffer for the duration of one call only, so it can never outlive it and
//! never frees it. A [`VectorSlot`] is the long-lived side of a wrapped
//! vector: it remembers which shape the caller must supply and rebinds a
//! fresh buffer on every call.

use crate::core::error::{OptimizerError, OptimizerResult};
use crate::core::types::Precision;
use crate::vector::shape::Shape;
use crate::vector::space::VectorSpace;
use crate::vector::storage::{ArrayMut, AsElements, AsElementsMut, Elements, ElementsMut};

#[derive(Debug, Clone, PartialEq)]
enum Storage {
    Single(Vec<f32>),
    Double(Vec<f64>),
}

/// Vector owning its elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    storage: Storage,
}

impl Vector {
    /// Allocates a zero-filled vector, reporting allocation failures.
    pub(crate) fn zeros(size: usize, precision: Precision) -> OptimizerResult<Self> {
        let failed = |_| {
            OptimizerError::allocation_failure(format!(
                "vector of {size} {precision} elements"
            ))
        };
        let storage = match precision {
            Precision::Single => {
                let mut data = Vec::new();
                data.try_reserve_exact(size).map_err(failed)?;
                data.resize(size, 0.0_f32);
                Storage::Single(data)
            }
            Precision::Double => {
                let mut data = Vec::new();
                data.try_reserve_exact(size).map_err(failed)?;
                data.resize(size, 0.0_f64);
                Storage::Double(data)
            }
        };
        Ok(Self { storage })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements().len()
    }

    /// Returns true if the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Precision of the elements.
    pub fn precision(&self) -> Precision {
        self.elements().precision()
    }

    /// Element `i` widened to f64.
    pub fn get(&self, i: usize) -> Option<f64> {
        self.elements().get(i)
    }

    /// Copy of the elements widened to f64.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.elements().to_f64_vec()
    }
}

impl AsElements for Vector {
    fn elements(&self) -> Elements<'_> {
        match &self.storage {
            Storage::Single(data) => Elements::Single(data),
            Storage::Double(data) => Elements::Double(data),
        }
    }
}

impl AsElementsMut for Vector {
    fn elements_mut(&mut self) -> ElementsMut<'_> {
        match &mut self.storage {
            Storage::Single(data) => ElementsMut::Single(data),
            Storage::Double(data) => ElementsMut::Double(data),
        }
    }
}

/// Vector whose storage is a borrowed caller buffer.
#[derive(Debug)]
pub struct WrappedVector<'a> {
    data: ElementsMut<'a>,
}

impl<'a> WrappedVector<'a> {
    /// Wraps an already validated view.
    pub(crate) fn new(data: ElementsMut<'a>) -> Self {
        Self { data }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the vector has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Precision of the elements.
    pub fn precision(&self) -> Precision {
        self.data.precision()
    }

    /// Element `i` widened to f64.
    pub fn get(&self, i: usize) -> Option<f64> {
        self.data.as_elements().get(i)
    }
}

impl AsElements for WrappedVector<'_> {
    fn elements(&self) -> Elements<'_> {
        self.data.as_elements()
    }
}

impl AsElementsMut for WrappedVector<'_> {
    fn elements_mut(&mut self) -> ElementsMut<'_> {
        self.data.reborrow()
    }
}

/// Long-lived binding point for one of the optimizer's variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorSlot {
    name: &'static str,
    shape: Shape,
}

impl VectorSlot {
    /// Creates an unbound slot expecting buffers of the given shape.
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self { name, shape }
    }

    /// Name of the variable bound through this slot.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Shape every bound buffer must have.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Binds a caller buffer for the duration of one call.
    ///
    /// The claimed shape must equal the slot's shape (a buffer with the
    /// same number of elements but another shape is rejected), and the
    /// buffer itself must hold exactly that many elements of the space's
    /// precision.
    pub fn rewrap<'a>(
        &self,
        space: &VectorSpace,
        array: ArrayMut<'a>,
    ) -> OptimizerResult<WrappedVector<'a>> {
        let (data, shape) = array.into_parts();
        self.shape.check_same(&shape, "bad dimensions")?;
        space.wrap(data)
    }
}
