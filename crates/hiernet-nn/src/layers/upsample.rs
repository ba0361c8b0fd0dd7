//! Upsampling Layer - Nearest-Neighbour UpSampling2d
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use hiernet_tensor::{ops, shape::expect_rank, Result, Tensor};

use crate::module::Module;

/// Repeats every pixel `size` times along height and width.
///
/// # Shape
/// - Input: (N, C, H, W)
/// - Output: (N, C, H * sh, W * sw)
pub struct UpSampling2d {
    name: String,
    size: (usize, usize),
}

impl UpSampling2d {
    /// Creates a 2x2 nearest-neighbour upsampling layer.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_size(name, (2, 2))
    }

    /// Creates an upsampling layer with explicit factors.
    pub fn with_size(name: impl Into<String>, size: (usize, usize)) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

impl Module for UpSampling2d {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        ops::upsample_nearest2d(input, self.size)
    }

    fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        expect_rank(input, 4, &self.name)?;
        Ok(vec![
            input[0],
            input[1],
            input[2] * self.size.0,
            input[3] * self.size.1,
        ])
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn kind(&self) -> &'static str {
        "UpSampling2D"
    }
}
