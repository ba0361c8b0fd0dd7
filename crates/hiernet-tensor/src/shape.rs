//! Shape - Tensor Dimension Management
//!
//! Shapes use a small-vector so the common 1-4 dimensional cases never
//! allocate.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use smallvec::SmallVec;

use crate::error::{Error, Result};

// =============================================================================
// Type Aliases
// =============================================================================

/// Shape type - dimensions of a tensor.
pub type Shape = SmallVec<[usize; 6]>;

// =============================================================================
// Shape Utilities
// =============================================================================

/// Computes the total number of elements from a shape.
#[must_use]
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Normalizes a possibly negative dimension index.
pub fn normalize_dim(dim: i64, ndim: usize) -> Result<usize> {
    let ndim_i = ndim as i64;
    let idx = if dim < 0 { dim + ndim_i } else { dim };
    if idx < 0 || idx >= ndim_i {
        return Err(Error::InvalidDimension { index: dim, ndim });
    }
    Ok(idx as usize)
}

/// Resolves a target shape that may contain a single `-1` placeholder.
pub fn reshape(old_shape: &[usize], new_shape: &[isize]) -> Result<Shape> {
    let total = numel(old_shape);
    let mut inferred = None;
    let mut known = 1usize;

    for (i, &d) in new_shape.iter().enumerate() {
        if d == -1 {
            if inferred.is_some() {
                return Err(Error::invalid_operation(
                    "only one dimension can be inferred in reshape",
                ));
            }
            inferred = Some(i);
        } else if d < 0 {
            return Err(Error::invalid_operation(format!(
                "invalid dimension {d} in reshape"
            )));
        } else {
            known *= d as usize;
        }
    }

    let mut shape: Shape = new_shape.iter().map(|&d| d.max(0) as usize).collect();
    if let Some(i) = inferred {
        if known == 0 || total % known != 0 {
            return Err(Error::shape_mismatch(old_shape, &shape));
        }
        shape[i] = total / known;
    }

    if numel(&shape) != total {
        return Err(Error::shape_mismatch(old_shape, &shape));
    }
    Ok(shape)
}

/// Checks that `shape` has exactly `rank` dimensions.
pub fn expect_rank(shape: &[usize], rank: usize, op: &str) -> Result<()> {
    if shape.len() == rank {
        Ok(())
    } else {
        Err(Error::invalid_operation(format!(
            "{op} expects a {rank}-D tensor, got shape {shape:?}"
        )))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numel() {
        assert_eq!(numel(&[2, 3, 4]), 24);
        assert_eq!(numel(&[]), 1);
    }

    #[test]
    fn test_normalize_dim() {
        assert_eq!(normalize_dim(-1, 4).unwrap(), 3);
        assert_eq!(normalize_dim(1, 4).unwrap(), 1);
        assert!(normalize_dim(4, 4).is_err());
        assert!(normalize_dim(-5, 4).is_err());
    }

    #[test]
    fn test_reshape_infers_dimension() {
        let shape = reshape(&[2, 3, 4], &[2, -1]).unwrap();
        assert_eq!(shape.as_slice(), &[2, 12]);
    }

    #[test]
    fn test_reshape_rejects_bad_total() {
        assert!(reshape(&[2, 3], &[4, 2]).is_err());
        assert!(reshape(&[2, 3], &[-1, -1]).is_err());
    }

    #[test]
    fn test_expect_rank() {
        assert!(expect_rank(&[1, 3, 8, 8], 4, "conv2d").is_ok());
        assert!(expect_rank(&[3, 8, 8], 4, "conv2d").is_err());
    }
}
