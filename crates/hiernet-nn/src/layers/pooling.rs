//! Pooling Layers - MaxPool2d and GlobalAvgPool2d
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use hiernet_tensor::{ops, shape::expect_rank, Error, Result, Tensor};

use crate::module::Module;

// =============================================================================
// MaxPool2d
// =============================================================================

/// Applies max pooling over a 2D input.
///
/// Windows never extend past the input; leftover rows and columns are
/// dropped (Keras `valid` pooling).
///
/// # Shape
/// - Input: (N, C, H, W)
/// - Output: (N, C, H_out, W_out) with H_out = (H - kh) / sh + 1
pub struct MaxPool2d {
    name: String,
    kernel_size: (usize, usize),
    stride: (usize, usize),
}

impl MaxPool2d {
    /// Creates a square max pool whose stride equals its size.
    pub fn new(name: impl Into<String>, kernel_size: usize) -> Self {
        Self::with_options(
            name,
            (kernel_size, kernel_size),
            (kernel_size, kernel_size),
        )
    }

    /// Creates a MaxPool2d with all options.
    pub fn with_options(
        name: impl Into<String>,
        kernel_size: (usize, usize),
        stride: (usize, usize),
    ) -> Self {
        Self {
            name: name.into(),
            kernel_size,
            stride,
        }
    }
}

impl Module for MaxPool2d {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        ops::max_pool2d(input, self.kernel_size, self.stride)
    }

    fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        expect_rank(input, 4, &self.name)?;
        let (kh, kw) = self.kernel_size;
        let (sh, sw) = self.stride;
        if input[2] < kh || input[3] < kw || sh == 0 || sw == 0 {
            return Err(Error::invalid_operation(format!(
                "{}: pool {kh}x{kw} does not fit input {input:?}",
                self.name
            )));
        }
        Ok(vec![
            input[0],
            input[1],
            (input[2] - kh) / sh + 1,
            (input[3] - kw) / sw + 1,
        ])
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn kind(&self) -> &'static str {
        "MaxPooling2D"
    }
}

// =============================================================================
// GlobalAvgPool2d
// =============================================================================

/// Averages every channel over its spatial extent.
///
/// # Shape
/// - Input: (N, C, H, W)
/// - Output: (N, C)
#[derive(Default)]
pub struct GlobalAvgPool2d {
    name: String,
}

impl GlobalAvgPool2d {
    /// Creates an unnamed layer; the graph builder assigns the Keras name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a named layer.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Module for GlobalAvgPool2d {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        ops::global_avg_pool2d(input)
    }

    fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        expect_rank(input, 4, &self.name)?;
        Ok(vec![input[0], input[1]])
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn kind(&self) -> &'static str {
        "GlobalAveragePooling2D"
    }
}

// =============================================================================
// Tests
// =============================================================================
