//! Tensor Operations
//!
//! Stateless kernels used by the layer library. Every kernel validates the
//! ranks and shapes of its inputs and returns a fresh tensor.
//!
//! - [`nn`]: convolution, pooling, upsampling, concatenation, normalization
//! - [`linalg`]: matrix multiplication and dense projection
//! - activations and layout permutations live here
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

pub mod linalg;
pub mod nn;

pub use linalg::{linear, matmul};
pub use nn::{
    batch_norm2d, cat, channel_moments, conv2d, global_avg_pool2d, max_pool2d,
    upsample_nearest2d,
};

use crate::error::Result;
use crate::shape::expect_rank;
use crate::tensor::Tensor;

// =============================================================================
// Activations
// =============================================================================

/// Rectified linear unit: `max(x, 0)`.
#[must_use]
pub fn relu(input: &Tensor) -> Tensor {
    input.map(|x| x.max(0.0))
}

/// Softmax over the last dimension.
///
/// The row maximum is subtracted before exponentiation, so large logits do
/// not overflow.
pub fn softmax(input: &Tensor) -> Result<Tensor> {
    if input.ndim() == 0 {
        return Err(crate::Error::invalid_operation("softmax on a scalar tensor"));
    }
    let cols = input.shape()[input.ndim() - 1];
    if cols == 0 {
        return Ok(input.clone());
    }

    let mut out = input.to_vec();
    for row in out.chunks_mut(cols) {
        let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut sum = 0.0f32;
        for v in row.iter_mut() {
            *v = (*v - max).exp();
            sum += *v;
        }
        for v in row.iter_mut() {
            *v /= sum;
        }
    }
    Ok(Tensor::from_parts(out, input.shape()))
}

// =============================================================================
// Layout
// =============================================================================

/// Converts a channels-last batch `(N, H, W, C)` to `(N, C, H, W)`.
pub fn nhwc_to_nchw(input: &Tensor) -> Result<Tensor> {
    expect_rank(input.shape(), 4, "nhwc_to_nchw")?;
    let (n, h, w, c) = (
        input.shape()[0],
        input.shape()[1],
        input.shape()[2],
        input.shape()[3],
    );
    let src = input.as_slice();
    let mut out = vec![0.0f32; src.len()];
    for b in 0..n {
        for y in 0..h {
            for x in 0..w {
                for ch in 0..c {
                    out[((b * c + ch) * h + y) * w + x] = src[((b * h + y) * w + x) * c + ch];
                }
            }
        }
    }
    Ok(Tensor::from_parts(out, &[n, c, h, w]))
}

/// Converts a channels-first batch `(N, C, H, W)` to `(N, H, W, C)`.
pub fn nchw_to_nhwc(input: &Tensor) -> Result<Tensor> {
    expect_rank(input.shape(), 4, "nchw_to_nhwc")?;
    let (n, c, h, w) = (
        input.shape()[0],
        input.shape()[1],
        input.shape()[2],
        input.shape()[3],
    );
    let src = input.as_slice();
    let mut out = vec![0.0f32; src.len()];
    for b in 0..n {
        for ch in 0..c {
            for y in 0..h {
                for x in 0..w {
                    out[((b * h + y) * w + x) * c + ch] = src[((b * c + ch) * h + y) * w + x];
                }
            }
        }
    }
    Ok(Tensor::from_parts(out, &[n, h, w, c]))
}

// =============================================================================
// Tests
// =============================================================================
