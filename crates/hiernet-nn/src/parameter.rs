//! Parameter - Shared Layer State
//!
//! Wraps the tensors a layer owns (kernels, biases, normalization
//! statistics). Parameters are shared handles: cloning one yields another
//! view of the same storage, so a weight loaded through a model is seen by
//! every holder.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use std::sync::Arc;

use hiernet_tensor::{Error, Result, Tensor};
use parking_lot::RwLock;

// =============================================================================
// Parameter
// =============================================================================

/// A named tensor slot of a layer.
///
/// The name is the slot within its layer (`weight`, `bias`, `running_mean`);
/// models qualify it as `"{layer}.{slot}"`. Non-trainable parameters hold
/// state such as batch-norm running statistics.
#[derive(Clone)]
pub struct Parameter {
    /// The underlying tensor.
    data: Arc<RwLock<Tensor>>,
    /// Slot name within the owning layer.
    name: String,
    /// Whether an optimizer would update this parameter.
    trainable: bool,
}

impl Parameter {
    /// Creates an unnamed parameter.
    pub fn new(data: Tensor, trainable: bool) -> Self {
        Self::named("", data, trainable)
    }

    /// Creates a parameter with a slot name.
    pub fn named(name: impl Into<String>, data: Tensor, trainable: bool) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            name: name.into(),
            trainable,
        }
    }

    /// Returns the slot name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a handle to the current tensor.
    pub fn data(&self) -> Tensor {
        self.data.read().clone()
    }

    /// Returns the shape of the parameter.
    pub fn shape(&self) -> Vec<usize> {
        self.data.read().shape().to_vec()
    }

    /// Returns the number of elements.
    pub fn numel(&self) -> usize {
        self.data.read().numel()
    }

    /// Returns whether this parameter is trainable.
    pub fn is_trainable(&self) -> bool {
        self.trainable
    }

    /// Replaces the tensor after checking that the shape is unchanged.
    pub fn load(&self, tensor: Tensor) -> Result<()> {
        let mut guard = self.data.write();
        if guard.shape() != tensor.shape() {
            return Err(Error::shape_mismatch(guard.shape(), tensor.shape()));
        }
        *guard = tensor;
        Ok(())
    }

    /// Replaces the tensor unconditionally.
    pub(crate) fn update_data(&self, tensor: Tensor) {
        *self.data.write() = tensor;
    }

    /// Returns true if both handles point at the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl std::fmt::Debug for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parameter")
            .field("name", &self.name)
            .field("shape", &self.shape())
            .field("trainable", &self.trainable)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_creation() {
        let p = Parameter::named("weight", Tensor::zeros(&[2, 3]), true);
        assert_eq!(p.name(), "weight");
        assert_eq!(p.shape(), vec![2, 3]);
        assert_eq!(p.numel(), 6);
        assert!(p.is_trainable());
    }

    #[test]
    fn test_load_is_shared_between_clones() {
        let p = Parameter::new(Tensor::zeros(&[2]), false);
        let q = p.clone();
        p.load(Tensor::ones(&[2])).unwrap();
        assert_eq!(q.data().to_vec(), vec![1.0, 1.0]);
        assert!(p.ptr_eq(&q));
    }

    #[test]
    fn test_load_rejects_shape_change() {
        let p = Parameter::new(Tensor::zeros(&[2, 2]), true);
        assert!(matches!(
            p.load(Tensor::zeros(&[4])),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
