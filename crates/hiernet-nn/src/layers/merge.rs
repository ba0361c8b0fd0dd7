//! Merge Layers - Concatenate
//!
//! Merge layers take several inputs and are wired with
//! [`crate::graph::GraphBuilder::concat`].
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use hiernet_tensor::{ops, shape::normalize_dim, Error, Result, Tensor};

use crate::module::Module;

// =============================================================================
// Concatenate
// =============================================================================

/// Concatenates its inputs along one axis (channels by default).
///
/// Every other dimension must match, so a skip map and an upsampled map can
/// only be joined when their spatial sizes agree.
pub struct Concatenate {
    name: String,
    dim: i64,
}

impl Concatenate {
    /// Creates a channel-axis concatenation for NCHW inputs.
    pub fn new(name: impl Into<String>) -> Self {
        Self::along(name, 1)
    }

    /// Creates a concatenation along `dim` (negative values count from the end).
    pub fn along(name: impl Into<String>, dim: i64) -> Self {
        Self {
            name: name.into(),
            dim,
        }
    }
}

impl Module for Concatenate {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        self.forward_many(&[input])
    }

    fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        self.output_shape_many(&[input])
    }

    fn forward_many(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        let shapes: Vec<&[usize]> = inputs.iter().map(|t| t.shape()).collect();
        self.output_shape_many(&shapes)?;
        ops::cat(inputs, self.dim)
    }

    fn output_shape_many(&self, inputs: &[&[usize]]) -> Result<Vec<usize>> {
        if inputs.len() < 2 {
            return Err(Error::invalid_argument(format!(
                "{} needs at least two inputs, got {}",
                self.name,
                inputs.len()
            )));
        }
        let first = inputs[0];
        let dim = normalize_dim(self.dim, first.len())?;
        let mut out = first.to_vec();
        out[dim] = 0;
        for shape in inputs {
            let aligned = shape.len() == first.len()
                && shape
                    .iter()
                    .zip(first.iter())
                    .enumerate()
                    .all(|(i, (a, b))| i == dim || a == b);
            if !aligned {
                return Err(Error::shape_mismatch(first, shape));
            }
            out[dim] += shape[dim];
        }
        Ok(out)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn kind(&self) -> &'static str {
        "Concatenate"
    }
}

// =============================================================================
// Tests
// =============================================================================
