//! Precision-tagged views over numeric buffers.
//!
//! [`Elements`] and [`ElementsMut`] are borrowed views over either `f32` or
//! `f64` storage. [`Array`] and [`ArrayMut`] pair such a view with the
//! [`Shape`] the caller claims for it; they are the only way buffers enter
//! an optimizer, so the claimed shape can be checked on every call.

use crate::core::types::Precision;
use crate::vector::shape::Shape;

/// Read-only view over single or double precision elements.
#[derive(Debug, Clone, Copy)]
pub enum Elements<'a> {
    /// Single precision data.
    Single(&'a [f32]),
    /// Double precision data.
    Double(&'a [f64]),
}

impl Elements<'_> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(data) => data.len(),
            Self::Double(data) => data.len(),
        }
    }

    /// Returns true if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Precision of the elements.
    pub fn precision(&self) -> Precision {
        match self {
            Self::Single(_) => Precision::Single,
            Self::Double(_) => Precision::Double,
        }
    }

    /// Element `i` widened to f64.
    pub fn get(&self, i: usize) -> Option<f64> {
        match self {
            Self::Single(data) => data.get(i).map(|&v| f64::from(v)),
            Self::Double(data) => data.get(i).copied(),
        }
    }

    /// Copy of the elements widened to f64.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Self::Single(data) => data.iter().map(|&v| f64::from(v)).collect(),
            Self::Double(data) => data.to_vec(),
        }
    }
}

/// Mutable view over single or double precision elements.
#[derive(Debug)]
pub enum ElementsMut<'a> {
    /// Single precision data.
    Single(&'a mut [f32]),
    /// Double precision data.
    Double(&'a mut [f64]),
}

impl ElementsMut<'_> {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(data) => data.len(),
            Self::Double(data) => data.len(),
        }
    }

    /// Returns true if there are no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Precision of the elements.
    pub fn precision(&self) -> Precision {
        match self {
            Self::Single(_) => Precision::Single,
            Self::Double(_) => Precision::Double,
        }
    }

    /// Shorter-lived mutable view of the same data.
    pub fn reborrow(&mut self) -> ElementsMut<'_> {
        match self {
            Self::Single(data) => ElementsMut::Single(data),
            Self::Double(data) => ElementsMut::Double(data),
        }
    }

    /// Read-only view of the same data.
    pub fn as_elements(&self) -> Elements<'_> {
        match self {
            Self::Single(data) => Elements::Single(data),
            Self::Double(data) => Elements::Double(data),
        }
    }
}

impl<'a> From<&'a [f32]> for Elements<'a> {
    fn from(data: &'a [f32]) -> Self {
        Self::Single(data)
    }
}

impl<'a> From<&'a [f64]> for Elements<'a> {
    fn from(data: &'a [f64]) -> Self {
        Self::Double(data)
    }
}

impl<'a> From<&'a mut [f32]> for ElementsMut<'a> {
    fn from(data: &'a mut [f32]) -> Self {
        Self::Single(data)
    }
}

impl<'a> From<&'a mut [f64]> for ElementsMut<'a> {
    fn from(data: &'a mut [f64]) -> Self {
        Self::Double(data)
    }
}

/// Anything whose elements can be read through an [`Elements`] view.
pub trait AsElements {
    /// Read-only view of the elements.
    fn elements(&self) -> Elements<'_>;
}

/// Anything whose elements can be written through an [`ElementsMut`] view.
pub trait AsElementsMut: AsElements {
    /// Mutable view of the elements.
    fn elements_mut(&mut self) -> ElementsMut<'_>;
}

/// Read-only caller buffer with its claimed shape.
#[derive(Debug, Clone)]
pub struct Array<'a> {
    data: Elements<'a>,
    shape: Shape,
}

impl<'a> Array<'a> {
    /// Pairs a buffer with an explicit shape.
    pub fn new<E: Into<Elements<'a>>>(data: E, shape: Shape) -> Self {
        Self {
            data: data.into(),
            shape,
        }
    }

    /// The elements.
    pub fn data(&self) -> Elements<'a> {
        self.data
    }

    /// The claimed shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

impl<'a> From<&'a [f64]> for Array<'a> {
    fn from(data: &'a [f64]) -> Self {
        let shape = Shape::vector(data.len());
        Self::new(data, shape)
    }
}

impl<'a> From<&'a [f32]> for Array<'a> {
    fn from(data: &'a [f32]) -> Self {
        let shape = Shape::vector(data.len());
        Self::new(data, shape)
    }
}

/// Mutable caller buffer with its claimed shape.
#[derive(Debug)]
pub struct ArrayMut<'a> {
    data: ElementsMut<'a>,
    shape: Shape,
}

impl<'a> ArrayMut<'a> {
    /// Pairs a buffer with an explicit shape.
    pub fn new<E: Into<ElementsMut<'a>>>(data: E, shape: Shape) -> Self {
        Self {
            data: data.into(),
            shape,
        }
    }

    /// The claimed shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of elements actually present in the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Splits into the mutable view and the claimed shape.
    pub fn into_parts(self) -> (ElementsMut<'a>, Shape) {
        (self.data, self.shape)
    }
}

impl<'a> From<&'a mut [f64]> for ArrayMut<'a> {
    fn from(data: &'a mut [f64]) -> Self {
        let shape = Shape::vector(data.len());
        Self::new(data, shape)
    }
}

impl<'a> From<&'a mut [f32]> for ArrayMut<'a> {
    fn from(data: &'a mut [f32]) -> Self {
        let shape = Shape::vector(data.len());
        Self::new(data, shape)
    }
}

impl<'a> From<&'a mut Vec<f64>> for ArrayMut<'a> {
    fn from(data: &'a mut Vec<f64>) -> Self {
        Self::from(data.as_mut_slice())
    }
}

impl<'a> From<&'a mut Vec<f32>> for ArrayMut<'a> {
    fn from(data: &'a mut Vec<f32>) -> Self {
        Self::from(data.as_mut_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elements_views() {
        let data = [1.5_f32, -2.0];
        let view = Elements::from(&data[..]);
        assert_eq!(view.len(), 2);
        assert_eq!(view.precision(), Precision::Single);
        assert_eq!(view.get(1), Some(-2.0));
        assert_eq!(view.get(2), None);
        assert_eq!(view.to_f64_vec(), vec![1.5, -2.0]);
    }

    #[test]
    fn test_array_mut_flat_shape() {
        let mut data = vec![0.0_f64; 4];
        let array = ArrayMut::from(&mut data);
        assert_eq!(array.shape(), &Shape::vector(4));
        assert_eq!(array.len(), 4);

        let mut data = vec![0.0_f64; 6];
        let array = ArrayMut::new(data.as_mut_slice(), Shape::from([2, 3]));
        let (view, shape) = array.into_parts();
        assert_eq!(view.precision(), Precision::Double);
        assert_eq!(shape.count(), 6);
    }

    #[test]
    fn test_reborrow_writes_through() {
        let mut data = [0.0_f64; 3];
        let mut view = ElementsMut::from(&mut data[..]);
        if let ElementsMut::Double(inner) = view.reborrow() {
            inner[1] = 4.0;
        }
        assert_eq!(view.as_elements().get(1), Some(4.0));
        assert_eq!(data[1], 4.0);
    }
}
