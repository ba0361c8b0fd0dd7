//! Normalization Layers - BatchNorm2d
//!
//! Normalizes each channel of an NCHW batch. Defaults follow Keras
//! `BatchNormalization`: eps 1e-3 and a moving-average decay of 0.99.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use std::sync::atomic::{AtomicBool, Ordering};

use hiernet_tensor::{ops, shape::expect_rank, Error, Result, Tensor};

use crate::init::{ones, zeros};
use crate::module::Module;
use crate::parameter::Parameter;

// =============================================================================
// BatchNorm2d
// =============================================================================

/// Applies Batch Normalization over a 4D input.
///
/// y = (x - E[x]) / sqrt(Var[x] + eps) * gamma + beta
///
/// In training mode the batch statistics are used and folded into the
/// running statistics; in evaluation mode the running statistics are used.
///
/// # Shape
/// - Input: (N, C, H, W)
/// - Output: Same as input
pub struct BatchNorm2d {
    /// Learnable scale parameter (gamma).
    pub weight: Parameter,
    /// Learnable shift parameter (beta).
    pub bias: Parameter,
    /// Running mean used at inference.
    pub running_mean: Parameter,
    /// Running variance used at inference.
    pub running_var: Parameter,
    name: String,
    num_features: usize,
    eps: f32,
    /// Momentum for running stats update: running = (1 - momentum) * running + momentum * batch.
    momentum: f32,
    training: AtomicBool,
}

impl BatchNorm2d {
    /// Creates a BatchNorm2d layer with Keras defaults.
    pub fn new(name: impl Into<String>, num_features: usize) -> Self {
        Self::with_options(name, num_features, 1e-3, 0.01)
    }

    /// Creates a BatchNorm2d with custom options.
    pub fn with_options(
        name: impl Into<String>,
        num_features: usize,
        eps: f32,
        momentum: f32,
    ) -> Self {
        Self {
            weight: Parameter::named("weight", ones(&[num_features]), true),
            bias: Parameter::named("bias", zeros(&[num_features]), true),
            running_mean: Parameter::named("running_mean", zeros(&[num_features]), false),
            running_var: Parameter::named("running_var", ones(&[num_features]), false),
            name: name.into(),
            num_features,
            eps,
            momentum,
            training: AtomicBool::new(true),
        }
    }

    /// Returns the number of features.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Returns epsilon.
    pub fn eps(&self) -> f32 {
        self.eps
    }

    fn check_input(&self, shape: &[usize]) -> Result<()> {
        expect_rank(shape, 4, &self.name)?;
        if shape[1] != self.num_features {
            return Err(Error::shape_mismatch(
                &[shape[0], self.num_features, shape[2], shape[3]],
                shape,
            ));
        }
        Ok(())
    }

    fn update_running(&self, batch_mean: &[f32], batch_var: &[f32]) -> Result<()> {
        let m = self.momentum;
        let blend = |running: &Parameter, batch: &[f32]| -> Result<()> {
            let updated: Vec<f32> = running
                .data()
                .as_slice()
                .iter()
                .zip(batch)
                .map(|(&r, &b)| (1.0 - m) * r + m * b)
                .collect();
            running.update_data(Tensor::from_vec(updated, &[self.num_features])?);
            Ok(())
        };
        blend(&self.running_mean, batch_mean)?;
        blend(&self.running_var, batch_var)
    }
}

impl Module for BatchNorm2d {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        self.check_input(input.shape())?;
        let gamma = self.weight.data();
        let beta = self.bias.data();

        if self.training.load(Ordering::Relaxed) {
            let (mean, var) = ops::channel_moments(input)?;
            self.update_running(&mean, &var)?;
            ops::batch_norm2d(input, &mean, &var, gamma.as_slice(), beta.as_slice(), self.eps)
        } else {
            let mean = self.running_mean.data();
            let var = self.running_var.data();
            ops::batch_norm2d(
                input,
                mean.as_slice(),
                var.as_slice(),
                gamma.as_slice(),
                beta.as_slice(),
                self.eps,
            )
        }
    }

    fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        self.check_input(input)?;
        Ok(input.to_vec())
    }

    fn parameters(&self) -> Vec<Parameter> {
        vec![
            self.weight.clone(),
            self.bias.clone(),
            self.running_mean.clone(),
            self.running_var.clone(),
        ]
    }

    fn set_training(&mut self, training: bool) {
        self.training.store(training, Ordering::Relaxed);
    }

    fn is_training(&self) -> bool {
        self.training.load(Ordering::Relaxed)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn kind(&self) -> &'static str {
        "BatchNormalization"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batchnorm_parameter_split() {
        let bn = BatchNorm2d::new("batch_normalization", 32);
        assert_eq!(bn.num_parameters(), 64);
        assert_eq!(bn.num_non_trainable(), 64);
        assert_eq!(bn.parameters().len(), 4);
    }

    #[test]
    fn test_batchnorm_eval_uses_running_stats() {
        let mut bn = BatchNorm2d::new("bn", 1);
        bn.eval();
        // mean 0, var 1, gamma 1, beta 0: only the eps term remains
        let x = Tensor::full(&[1, 1, 2, 2], 2.0);
        let y = bn.forward(&x).unwrap();
        let expected = 2.0 / (1.0f32 + 1e-3).sqrt();
        assert!(y.to_vec().iter().all(|&v| (v - expected).abs() < 1e-6));
    }

    #[test]
    fn test_batchnorm_training_updates_running_stats() {
        let bn = BatchNorm2d::new("bn", 1);
        let x = Tensor::from_vec(vec![1.0, 3.0, 1.0, 3.0], &[1, 1, 2, 2]).unwrap();
        let y = bn.forward(&x).unwrap();
        assert!(y.mean().abs() < 1e-6);

        // batch mean 2, var 1; momentum 0.01
        let mean = bn.running_mean.data().to_vec()[0];
        let var = bn.running_var.data().to_vec()[0];
        assert!((mean - 0.02).abs() < 1e-6);
        assert!((var - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_batchnorm_channel_check() {
        let bn = BatchNorm2d::new("bn", 3);
        assert!(bn.forward(&Tensor::ones(&[1, 2, 2, 2])).is_err());
        assert!(bn.output_shape(&[4, 3, 8, 8]).is_ok());
    }
}
