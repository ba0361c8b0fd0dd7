//! Activation Layers - ReLU and Softmax
//!
//! Stateless, shape-preserving layers. [`Activation`] also serves as the
//! fused activation of [`crate::layers::Linear`], mirroring Keras
//! `Dense(units, activation=...)`.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use std::fmt;

use hiernet_tensor::{ops, Result, Tensor};

use crate::module::Module;

// =============================================================================
// Activation
// =============================================================================

/// Elementwise activation applied after a projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    /// Identity.
    #[default]
    Linear,
    /// `max(x, 0)`.
    Relu,
    /// Softmax over the last dimension.
    Softmax,
}

impl Activation {
    /// Applies the activation.
    pub fn apply(self, input: &Tensor) -> Result<Tensor> {
        match self {
            Self::Linear => Ok(input.clone()),
            Self::Relu => Ok(ops::relu(input)),
            Self::Softmax => ops::softmax(input),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Linear => "linear",
            Self::Relu => "relu",
            Self::Softmax => "softmax",
        };
        f.write_str(s)
    }
}

// =============================================================================
// ReLU
// =============================================================================

/// Applies the rectified linear unit function element-wise.
#[derive(Debug, Clone, Default)]
pub struct ReLU {
    name: String,
}

impl ReLU {
    /// Creates a named ReLU layer.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Module for ReLU {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        Ok(ops::relu(input))
    }

    fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        Ok(input.to_vec())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn kind(&self) -> &'static str {
        "Activation"
    }
}

// =============================================================================
// Softmax
// =============================================================================

/// Normalizes the last dimension into a probability distribution.
#[derive(Debug, Clone, Default)]
pub struct Softmax {
    name: String,
}

impl Softmax {
    /// Creates a named softmax layer.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Module for Softmax {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        ops::softmax(input)
    }

    fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        Ok(input.to_vec())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn kind(&self) -> &'static str {
        "Softmax"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relu_layer() {
        let relu = ReLU::new("activation");
        let x = Tensor::from_vec(vec![-1.0, 2.0, -3.0, 4.0], &[1, 1, 2, 2]).unwrap();
        let y = relu.forward(&x).unwrap();
        assert_eq!(y.to_vec(), vec![0.0, 2.0, 0.0, 4.0]);
        assert_eq!(relu.kind(), "Activation");
        assert_eq!(relu.name(), "activation");
    }

    #[test]
    fn test_softmax_layer() {
        let sm = Softmax::new("probs");
        let x = Tensor::from_vec(vec![0.0, 0.0], &[1, 2]).unwrap();
        assert_eq!(sm.forward(&x).unwrap().to_vec(), vec![0.5, 0.5]);
        assert_eq!(sm.output_shape(&[4, 2]).unwrap(), vec![4, 2]);
    }

    #[test]
    fn test_activation_enum() {
        let x = Tensor::from_vec(vec![-2.0, 1.0], &[1, 2]).unwrap();
        assert_eq!(Activation::Linear.apply(&x).unwrap().to_vec(), x.to_vec());
        assert_eq!(Activation::Relu.apply(&x).unwrap().to_vec(), vec![0.0, 1.0]);
        let s = Activation::Softmax.apply(&x).unwrap();
        assert!((s.sum() - 1.0).abs() < 1e-6);
        assert_eq!(Activation::Softmax.to_string(), "softmax");
    }
}
