//! Convolutional Layers - 2D Convolution
//!
//! Applies a stride-1 2-D convolution over NCHW batches, with Keras
//! `same` or `valid` padding.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use hiernet_tensor::{ops, shape::expect_rank, Error, Result, Tensor};

use crate::init::{glorot_uniform_conv, zeros};
use crate::module::Module;
use crate::parameter::Parameter;

// =============================================================================
// Padding
// =============================================================================

/// Spatial padding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    /// Zero-pad so the output keeps the input's height and width.
    #[default]
    Same,
    /// No padding.
    Valid,
}

impl Padding {
    /// Zero padding applied on each side for an odd kernel extent.
    fn amount(self, kernel: usize) -> usize {
        match self {
            Self::Same => kernel.saturating_sub(1) / 2,
            Self::Valid => 0,
        }
    }
}

// =============================================================================
// Conv2d
// =============================================================================

/// Applies a 2D convolution over an input image.
///
/// # Shape
/// - Input: (N, C_in, H, W)
/// - Output: (N, C_out, H_out, W_out)
///
/// where H_out = H for `Same` padding and H - kh + 1 for `Valid`.
pub struct Conv2d {
    /// Weight tensor of shape (out_channels, in_channels, kh, kw).
    pub weight: Parameter,
    /// Bias tensor of shape (out_channels).
    pub bias: Option<Parameter>,
    name: String,
    in_channels: usize,
    out_channels: usize,
    kernel_size: (usize, usize),
    padding: Padding,
}

impl Conv2d {
    /// Creates a square-kernel convolution with `same` padding and a bias.
    pub fn new(
        name: impl Into<String>,
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
    ) -> Self {
        Self::with_options(
            name,
            in_channels,
            out_channels,
            (kernel_size, kernel_size),
            Padding::Same,
            true,
        )
    }

    /// Creates a Conv2d layer with all options.
    pub fn with_options(
        name: impl Into<String>,
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        padding: Padding,
        bias: bool,
    ) -> Self {
        let (kh, kw) = kernel_size;
        let weight = Parameter::named(
            "weight",
            glorot_uniform_conv(out_channels, in_channels, kh, kw),
            true,
        );
        let bias = bias.then(|| Parameter::named("bias", zeros(&[out_channels]), true));

        Self {
            weight,
            bias,
            name: name.into(),
            in_channels,
            out_channels,
            kernel_size,
            padding,
        }
    }

    /// Number of input channels.
    pub fn in_channels(&self) -> usize {
        self.in_channels
    }

    /// Number of output channels.
    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    /// Padding mode.
    pub fn padding(&self) -> Padding {
        self.padding
    }

    fn pads(&self) -> (usize, usize) {
        (
            self.padding.amount(self.kernel_size.0),
            self.padding.amount(self.kernel_size.1),
        )
    }

    fn check_input(&self, shape: &[usize]) -> Result<()> {
        expect_rank(shape, 4, &self.name)?;
        if shape[1] != self.in_channels {
            return Err(Error::shape_mismatch(
                &[shape[0], self.in_channels, shape[2], shape[3]],
                shape,
            ));
        }
        Ok(())
    }
}

impl Module for Conv2d {
    fn forward(&self, input: &Tensor) -> Result<Tensor> {
        self.check_input(input.shape())?;
        let weight = self.weight.data();
        let bias = self.bias.as_ref().map(Parameter::data);
        ops::conv2d(input, &weight, bias.as_ref(), (1, 1), self.pads())
    }

    fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>> {
        self.check_input(input)?;
        let (kh, kw) = self.kernel_size;
        let (ph, pw) = self.pads();
        let (h, w) = (input[2] + 2 * ph, input[3] + 2 * pw);
        if h < kh || w < kw {
            return Err(Error::invalid_operation(format!(
                "{}: kernel {kh}x{kw} does not fit input {input:?}",
                self.name
            )));
        }
        Ok(vec![input[0], self.out_channels, h - kh + 1, w - kw + 1])
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
        "Conv2D"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conv2d_same_shape() {
        let conv = Conv2d::new("conv2d", 3, 32, 3);
        let x = Tensor::ones(&[2, 3, 8, 8]);
        let y = conv.forward(&x).unwrap();
        assert_eq!(y.shape(), &[2, 32, 8, 8]);
        assert_eq!(conv.output_shape(&[2, 3, 8, 8]).unwrap(), vec![2, 32, 8, 8]);
    }

    #[test]
    fn test_conv2d_valid_shape() {
        let conv = Conv2d::with_options("c", 1, 4, (3, 3), Padding::Valid, false);
        assert_eq!(conv.output_shape(&[1, 1, 5, 5]).unwrap(), vec![1, 4, 3, 3]);
        assert!(conv.output_shape(&[1, 1, 2, 2]).is_err());
        assert!(conv.bias.is_none());
    }

    #[test]
    fn test_conv2d_parameter_count() {
        // Keras: 3*3*32*32 + 32
        let conv = Conv2d::new("conv2d_1", 32, 32, 3);
        assert_eq!(conv.num_parameters(), 9248);
        let names: Vec<String> = conv.parameters().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["weight", "bias"]);
    }

    #[test]
    fn test_conv2d_rejects_wrong_channels() {
        let conv = Conv2d::new("conv2d", 3, 8, 3);
        assert!(conv.forward(&Tensor::ones(&[1, 4, 8, 8])).is_err());
        assert!(conv.forward(&Tensor::ones(&[3, 8, 8])).is_err());
    }

    #[test]
    fn test_conv2d_bias_starts_at_zero() {
        let conv = Conv2d::new("conv2d", 1, 2, 3);
        let bias = conv.bias.as_ref().unwrap().data();
        assert_eq!(bias.to_vec(), vec![0.0, 0.0]);
        let y = conv.forward(&Tensor::zeros(&[1, 1, 4, 4])).unwrap();
        assert!(y.to_vec().iter().all(|&v| v == 0.0));
    }
}
