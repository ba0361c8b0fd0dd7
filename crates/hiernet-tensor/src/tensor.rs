//! Tensor - Core N-Dimensional Array Type
//!
//! `Tensor` is an immutable, reference-counted, contiguous f32 array. Cloning
//! a tensor shares its storage; every operation that changes values returns
//! a new tensor.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use core::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::shape::{normalize_dim, numel, reshape, Shape};

// =============================================================================
// Tensor Struct
// =============================================================================

/// An N-dimensional array of f32 values in row-major order.
#[derive(Clone)]
pub struct Tensor {
    /// Underlying data storage (reference-counted).
    pub(crate) data: Arc<Vec<f32>>,
    /// Shape of the tensor (dimensions).
    pub(crate) shape: Shape,
}

impl Tensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a new tensor from a vector with the given shape.
    ///
    /// # Returns
    /// New tensor, or error if shape doesn't match data length.
    pub fn from_vec(data: Vec<f32>, shape: &[usize]) -> Result<Self> {
        let total = numel(shape);
        if total != data.len() {
            return Err(Error::shape_mismatch(&[data.len()], shape));
        }
        Ok(Self {
            data: Arc::new(data),
            shape: Shape::from_slice(shape),
        })
    }

    /// Creates a new tensor from a slice with the given shape.
    pub fn from_slice(data: &[f32], shape: &[usize]) -> Result<Self> {
        Self::from_vec(data.to_vec(), shape)
    }

    /// Builds a tensor whose length is correct by construction.
    pub(crate) fn from_parts(data: Vec<f32>, shape: &[usize]) -> Self {
        debug_assert_eq!(data.len(), numel(shape));
        Self {
            data: Arc::new(data),
            shape: Shape::from_slice(shape),
        }
    }

    /// Creates a tensor filled with zeros.
    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        crate::creation::zeros(shape)
    }

    /// Creates a tensor filled with ones.
    #[must_use]
    pub fn ones(shape: &[usize]) -> Self {
        crate::creation::ones(shape)
    }

    /// Creates a tensor filled with a constant value.
    #[must_use]
    pub fn full(shape: &[usize], value: f32) -> Self {
        crate::creation::full(shape, value)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Returns the shape of the tensor.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Returns the total number of elements.
    #[must_use]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the tensor has zero elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the size of a specific dimension (supports negative indexing).
    pub fn size(&self, dim: i64) -> Result<usize> {
        let idx = normalize_dim(dim, self.ndim())?;
        Ok(self.shape[idx])
    }

    // =========================================================================
    // Data Access
    // =========================================================================

    /// Borrows the underlying contiguous data.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns the data as an owned vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.as_ref().clone()
    }

    /// Returns the element at the given indices.
    pub fn get(&self, indices: &[usize]) -> Result<f32> {
        if indices.len() != self.ndim() {
            return Err(Error::invalid_operation(format!(
                "Expected {} indices, got {}",
                self.ndim(),
                indices.len()
            )));
        }

        let mut offset = 0;
        for (&idx, &dim) in indices.iter().zip(self.shape.iter()) {
            if idx >= dim {
                return Err(Error::IndexOutOfBounds {
                    index: idx,
                    size: dim,
                });
            }
            offset = offset * dim + idx;
        }
        Ok(self.data[offset])
    }

    /// Returns the value of a single-element tensor.
    pub fn item(&self) -> Result<f32> {
        if self.numel() != 1 {
            return Err(Error::invalid_operation(
                "item() only works on single-element tensors",
            ));
        }
        Ok(self.data[0])
    }

    // =========================================================================
    // Shape Operations
    // =========================================================================

    /// Returns a tensor sharing this storage with a new shape.
    ///
    /// Supports -1 in one dimension to infer the size.
    pub fn reshape(&self, new_shape: &[isize]) -> Result<Self> {
        let shape = reshape(&self.shape, new_shape)?;
        Ok(Self {
            data: Arc::clone(&self.data),
            shape,
        })
    }

    /// Flattens every dimension after the first: `[N, ...] -> [N, prod(...)]`.
    pub fn flatten_batch(&self) -> Result<Self> {
        if self.ndim() == 0 {
            return Err(Error::invalid_operation("cannot flatten a scalar"));
        }
        let batch = self.shape[0] as isize;
        self.reshape(&[batch, -1])
    }

    // =========================================================================
    // Elementwise
    // =========================================================================

    /// Applies `f` to every element.
    #[must_use]
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f32) -> f32,
    {
        let data = self.data.iter().map(|&x| f(x)).collect();
        Self::from_parts(data, &self.shape)
    }

    /// Combines two equally shaped tensors elementwise.
    pub fn zip_map<F>(&self, other: &Self, f: F) -> Result<Self>
    where
        F: Fn(f32, f32) -> f32,
    {
        if self.shape != other.shape {
            return Err(Error::shape_mismatch(&self.shape, &other.shape));
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Self::from_parts(data, &self.shape))
    }

    /// Elementwise addition.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_map(other, |a, b| a + b)
    }

    /// Elementwise subtraction.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_map(other, |a, b| a - b)
    }

    /// Elementwise multiplication.
    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.zip_map(other, |a, b| a * b)
    }

    /// Adds a scalar to every element.
    #[must_use]
    pub fn add_scalar(&self, value: f32) -> Self {
        self.map(|x| x + value)
    }

    /// Multiplies every element by a scalar.
    #[must_use]
    pub fn mul_scalar(&self, value: f32) -> Self {
        self.map(|x| x * value)
    }

    // =========================================================================
    // Reductions
    // =========================================================================

    /// Sum of all elements.
    #[must_use]
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Mean of all elements (0 for an empty tensor).
    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.is_empty() {
            0.0
        } else {
            self.sum() / self.numel() as f32
        }
    }

    /// Largest element, or `None` for an empty tensor.
    #[must_use]
    pub fn max(&self) -> Option<f32> {
        self.data.iter().copied().reduce(f32::max)
    }

    /// Index of the largest value in every row of a 2-D tensor.
    ///
    /// Ties resolve to the lowest index.
    pub fn argmax_rows(&self) -> Result<Vec<usize>> {
        crate::shape::expect_rank(&self.shape, 2, "argmax_rows")?;
        let cols = self.shape[1];
        if cols == 0 {
            return Err(Error::invalid_operation("argmax over an empty dimension"));
        }
        Ok(self
            .data
            .chunks(cols)
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f32::NEG_INFINITY), |best, (i, &v)| {
                        if v > best.1 {
                            (i, v)
                        } else {
                            best
                        }
                    })
                    .0
            })
            .collect())
    }

    /// Returns true if both tensors share a shape and all values are within `tol`.
    #[must_use]
    pub fn allclose(&self, other: &Self, tol: f32) -> bool {
        self.shape == other.shape
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| (a - b).abs() <= tol)
    }
}

// =============================================================================
// Formatting
// =============================================================================

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape.as_slice())
            .field("numel", &self.numel())
            .finish()
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 8;
        write!(f, "Tensor(shape={:?}, data=[", self.shape.as_slice())?;
        for (i, v) in self.data.iter().take(PREVIEW).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v:.4}")?;
        }
        if self.numel() > PREVIEW {
            write!(f, ", ...")?;
        }
        write!(f, "])")
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_vec() {
        let t = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.numel(), 6);
        assert_eq!(t.get(&[1, 2]).unwrap(), 6.0);
    }

    #[test]
    fn test_from_vec_rejects_bad_length() {
        assert!(Tensor::from_vec(vec![1.0; 5], &[2, 3]).is_err());
    }

    #[test]
    fn test_get_out_of_bounds() {
        let t = Tensor::zeros(&[2, 2]);
        assert!(matches!(
            t.get(&[2, 0]),
            Err(Error::IndexOutOfBounds { index: 2, size: 2 })
        ));
    }

    #[test]
    fn test_reshape_shares_storage() {
        let t = Tensor::from_vec((0..12).map(|x| x as f32).collect(), &[2, 3, 2]).unwrap();
        let r = t.reshape(&[3, -1]).unwrap();
        assert_eq!(r.shape(), &[3, 4]);
        assert!(Arc::ptr_eq(&t.data, &r.data));
    }

    #[test]
    fn test_flatten_batch() {
        let t = Tensor::zeros(&[4, 8, 2, 2]);
        assert_eq!(t.flatten_batch().unwrap().shape(), &[4, 32]);
    }

    #[test]
    fn test_elementwise() {
        let a = Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let b = Tensor::from_vec(vec![3.0, 4.0], &[2]).unwrap();
        assert_eq!(a.add(&b).unwrap().to_vec(), vec![4.0, 6.0]);
        assert_eq!(a.mul_scalar(2.0).to_vec(), vec![2.0, 4.0]);
        assert!(a.add(&Tensor::zeros(&[3])).is_err());
    }

    #[test]
    fn test_argmax_rows() {
        let t = Tensor::from_vec(vec![0.1, 0.7, 0.2, 0.5, 0.5, 0.0], &[2, 3]).unwrap();
        assert_eq!(t.argmax_rows().unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_reductions() {
        let t = Tensor::from_vec(vec![1.0, -2.0, 4.0, 1.0], &[4]).unwrap();
        assert_eq!(t.sum(), 4.0);
        assert_eq!(t.mean(), 1.0);
        assert_eq!(t.max(), Some(4.0));
    }
}
