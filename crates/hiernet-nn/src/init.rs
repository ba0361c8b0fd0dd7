//! Weight Initialization - Parameter Initialization Strategies
//!
//! Initializers draw from the thread-local generator in `hiernet-tensor`;
//! call [`seed`] before building a model to make its weights reproducible.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use hiernet_tensor::Tensor;

// =============================================================================
// Seeding
// =============================================================================

/// Seeds the generator used for weight initialization and dropout masks.
pub fn seed(value: u64) {
    hiernet_tensor::manual_seed(value);
}

// =============================================================================
// Basic Initializers
// =============================================================================

/// Creates a tensor filled with zeros.
pub fn zeros(shape: &[usize]) -> Tensor {
    hiernet_tensor::zeros(shape)
}

/// Creates a tensor filled with ones.
pub fn ones(shape: &[usize]) -> Tensor {
    hiernet_tensor::ones(shape)
}

/// Creates a tensor filled with a constant value.
pub fn constant(shape: &[usize], value: f32) -> Tensor {
    hiernet_tensor::full(shape, value)
}

// =============================================================================
// Glorot Initialization
// =============================================================================

/// Glorot (Xavier) uniform initialization.
///
/// Samples from U(-a, a) where a = sqrt(6 / (fan_in + fan_out)). This is the
/// default kernel initializer of Keras `Conv2D` and `Dense`.
///
/// # Arguments
/// * `shape` - Shape of the tensor to create
/// * `fan_in` - Number of input units (`in_channels * kh * kw` for a conv)
/// * `fan_out` - Number of output units (`out_channels * kh * kw` for a conv)
pub fn glorot_uniform(shape: &[usize], fan_in: usize, fan_out: usize) -> Tensor {
    let fans = (fan_in + fan_out).max(1);
    let a = (6.0 / fans as f32).sqrt();
    hiernet_tensor::uniform_range(shape, -a, a)
}

/// Glorot uniform kernel for a 2-D convolution in OIHW layout.
pub fn glorot_uniform_conv(out_channels: usize, in_channels: usize, kh: usize, kw: usize) -> Tensor {
    let receptive = kh * kw;
    glorot_uniform(
        &[out_channels, in_channels, kh, kw],
        in_channels * receptive,
        out_channels * receptive,
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glorot_bounds() {
        let t = glorot_uniform(&[100, 50], 50, 100);
        let a = (6.0f32 / 150.0).sqrt();
        assert!(t.to_vec().iter().all(|&x| x >= -a && x < a));
    }

    #[test]
    fn test_glorot_conv_shape() {
        let t = glorot_uniform_conv(32, 3, 3, 3);
        assert_eq!(t.shape(), &[32, 3, 3, 3]);
        let a = (6.0f32 / (27.0 + 288.0)).sqrt();
        assert!(t.to_vec().iter().all(|&x| x.abs() <= a));
    }

    #[test]
    fn test_seed_reproducible() {
        seed(7);
        let a = glorot_uniform(&[8], 4, 4);
        seed(7);
        let b = glorot_uniform(&[8], 4, 4);
        assert_eq!(a.to_vec(), b.to_vec());
    }

    #[test]
    fn test_constants() {
        assert_eq!(zeros(&[2]).to_vec(), vec![0.0, 0.0]);
        assert_eq!(ones(&[1]).to_vec(), vec![1.0]);
        assert_eq!(constant(&[2], 0.5).to_vec(), vec![0.5, 0.5]);
    }
}
