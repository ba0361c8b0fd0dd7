//! Linear Layer - Dense Projection
//!
//! Applies y = act(x W^T + b), the counterpart of Keras `Dense`.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use hiernet_tensor::{ops, shape::expect_rank, Error, Result, Tensor};

use crate::activation::Activation;
use crate::init::{glorot_uniform, zeros};
use crate::module::Module;
use crate::parameter::Parameter;

// =============================================================================
// Linear
// =============================================================================

/// Applies a linear transformation followed by an optional activation.
///
/// # Shape
/// - Input: (N, in_features)
/// - Output: (N, out_features)
pub struct Linear {
    /// Weight matrix of shape (out_features, in_features).
    pub weight: Parameter,
    /// Bias vector of shape (out_features).
    pub bias: Option<Parameter>,
    name: String,
    in_features: usize,
    out_features: usize,
    activation: Activation,
}

impl Linear {
    /// Creates a dense layer with a bias and no activation.
    pub fn new(name: impl Into<String>, in_features: usize, out_features: usize) -> Self {
        Self::with_options(name, in_features, out_features, Activation::Linear, true)
    }

    /// Creates a dense layer with a fused activation.
    pub fn with_activation(
        name: impl Into<String>,
        in_features: usize,
        out_features: usize,
        activation: Activation,
    ) -> Self {
        Self::with_options(name, in_features, out_features, activation, true)
    }

    /// Creates a Linear layer with all options.
    pub fn with_options(
        name: impl Into<String>,
        in_features: usize,
        out_features: usize,
        activation: Activation,
        bias: bool,
    ) -> Self {
        let weight = Parameter::named(
            "weight",
            glorot_uniform(&[out_features, in_features], in_features, out_features),
            true,
        );
        let bias = bias.then(|| Parameter::named("bias", zeros(&[out_features]), true));

        Self {
            weight,
            bias,
            name: name.into(),
            in_features,
            out_features,
            activation,
        }
    }

    /// Returns the input feature size.
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Returns the output feature size.
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// Returns the fused activation.
    pub fn activation(&self) -> Activation {
        self.activation
    }
}

impl Module for Linear {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        self.output_shape(input.shape())?;
        let weight = self.weight.data();
        let bias = self.bias.as_ref().map(Parameter::data);
        let projected = ops::linear(input, &weight, bias.as_ref())?;
        self.activation.apply(&projected)
    }

    fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        expect_rank(input, 2, &self.name)?;
        if input[1] != self.in_features {
            return Err(Error::shape_mismatch(&[input[0], self.in_features], input));
        }
        Ok(vec![input[0], self.out_features])
    }

    fn parameters(&self) -> Vec<Parameter> {
        let mut params = vec![self.weight.clone()];
        if let Some(ref bias) = self.bias {
            params.push(bias.clone());
        }
        params
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn kind(&self) -> &'static str {
        "Dense"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_creation() {
        let linear = Linear::new("dense", 128, 100);
        assert_eq!(linear.weight.shape(), vec![100, 128]);
        assert_eq!(linear.bias.as_ref().unwrap().shape(), vec![100]);
        assert_eq!(linear.num_parameters(), 12_900);
    }

    #[test]
    fn test_linear_forward() {
        let linear = Linear::new("dense", 3, 2);
        linear
            .weight
            .load(Tensor::from_vec(vec![1.0, 0.0, 0.0, 0.0, 1.0, 1.0], &[2, 3]).unwrap())
            .unwrap();
        let x = Tensor::from_vec(vec![1.0, 2.0, 3.0], &[1, 3]).unwrap();
        assert_eq!(linear.forward(&x).unwrap().to_vec(), vec![1.0, 5.0]);
    }

    #[test]
    fn test_linear_softmax_rows() {
        let head = Linear::with_activation("coarse", 8, 2, Activation::Softmax);
        let y = head.forward(&hiernet_tensor::randn(&[4, 8])).unwrap();
        for row in y.as_slice().chunks(2) {
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_linear_rejects_wrong_features() {
        let linear = Linear::new("dense", 4, 2);
        assert!(linear.forward(&Tensor::ones(&[1, 5])).is_err());
        assert!(linear.output_shape(&[1, 2, 2]).is_err());
    }
}
