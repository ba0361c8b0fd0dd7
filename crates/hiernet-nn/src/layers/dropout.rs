//! Dropout Layers - Regularization via Random Zeroing
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use std::sync::atomic::{AtomicBool, Ordering};

use hiernet_tensor::{with_rng, Result, Tensor};
use rand::Rng;

use crate::module::Module;

// =============================================================================
// Dropout
// =============================================================================

/// During training, randomly zeros elements with probability `rate` and
/// scales the survivors by `1 / (1 - rate)`.
///
/// During evaluation, returns input unchanged.
pub struct Dropout {
    name: String,
    rate: f32,
    training: AtomicBool,
}

impl std::fmt::Debug for Dropout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dropout")
            .field("name", &self.name)
            .field("rate", &self.rate)
            .field("training", &self.training.load(Ordering::Relaxed))
            .finish()
    }
}

impl Dropout {
    /// Creates a new Dropout layer with the given rate.
    pub fn new(name: impl Into<String>, rate: f32) -> Self {
        assert!(
            (0.0..1.0).contains(&rate),
            "Dropout rate must be in [0, 1)"
        );
        Self {
            name: name.into(),
            rate,
            training: AtomicBool::new(true),
        }
    }

    /// Returns the drop probability.
    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl Module for Dropout {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        if !self.training.load(Ordering::Relaxed) || self.rate == 0.0 {
            return Ok(input.clone());
        }

        let rate = self.rate;
        let scale = 1.0 / (1.0 - rate);
        let output: Vec<f32> = with_rng(|rng| {
            input
                .as_slice()
                .iter()
                .map(|&x| if rng.gen::<f32>() < rate { 0.0 } else { x * scale })
                .collect()
        });
        Tensor::from_vec(output, input.shape())
    }

    fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        Ok(input.to_vec())
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
        "Dropout"
    }
}

// =============================================================================
// Tests
// =============================================================================
