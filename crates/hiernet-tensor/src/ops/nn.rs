//! Spatial Kernels - Convolution, Pooling, Upsampling, Concatenation
//!
//! All kernels operate on NCHW tensors. Convolution is parallelized over
//! `(batch, out_channel)` planes with rayon.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::shape::{expect_rank, normalize_dim};
use crate::tensor::Tensor;

/// Output length of a sliding window, or an error if the window never fits.
fn window_out(len: usize, kernel: usize, stride: usize, pad: usize, op: &str) -> Result<usize> {
    if stride == 0 || kernel == 0 {
        return Err(Error::invalid_argument(format!(
            "{op}: kernel and stride must be non-zero"
        )));
    }
    let padded = len + 2 * pad;
    if padded < kernel {
        return Err(Error::invalid_operation(format!(
            "{op}: window of {kernel} does not fit an extent of {padded}"
        )));
    }
    Ok((padded - kernel) / stride + 1)
}

fn dims4(t: &Tensor) -> (usize, usize, usize, usize) {
    let s = t.shape();
    (s[0], s[1], s[2], s[3])
}

// =============================================================================
// Convolution
// =============================================================================

/// 2-D cross-correlation with zero padding.
///
/// # Shape
/// - input: `(N, C_in, H, W)`
/// - weight: `(C_out, C_in, kh, kw)`
/// - bias: `(C_out)`
/// - output: `(N, C_out, H_out, W_out)`
pub fn conv2d(
    input: &Tensor,
    weight: &Tensor,
    bias: Option<&Tensor>,
    stride: (usize, usize),
    padding: (usize, usize),
) -> Result<Tensor> {
    expect_rank(input.shape(), 4, "conv2d input")?;
    expect_rank(weight.shape(), 4, "conv2d weight")?;

    let (batch, in_c, in_h, in_w) = dims4(input);
    let (out_c, w_in_c, kh, kw) = dims4(weight);
    if w_in_c != in_c {
        return Err(Error::shape_mismatch(
            &[out_c, in_c, kh, kw],
            weight.shape(),
        ));
    }
    if let Some(b) = bias {
        if b.shape() != [out_c] {
            return Err(Error::shape_mismatch(&[out_c], b.shape()));
        }
    }

    let (sh, sw) = stride;
    let (ph, pw) = padding;
    let out_h = window_out(in_h, kh, sh, ph, "conv2d")?;
    let out_w = window_out(in_w, kw, sw, pw, "conv2d")?;
    let plane = out_h * out_w;

    let src = input.as_slice();
    let wts = weight.as_slice();
    let bias = bias.map(Tensor::as_slice);
    let mut out = vec![0.0f32; batch * out_c * plane];

    if plane > 0 {
        out.par_chunks_mut(plane)
            .enumerate()
            .for_each(|(idx, dst)| {
                let b = idx / out_c;
                let oc = idx % out_c;
                if let Some(bias) = bias {
                    dst.fill(bias[oc]);
                }

                for ic in 0..in_c {
                    let in_base = (b * in_c + ic) * in_h * in_w;
                    let w_base = (oc * in_c + ic) * kh * kw;
                    for ki in 0..kh {
                        for kj in 0..kw {
                            let w = wts[w_base + ki * kw + kj];
                            for oy in 0..out_h {
                                let iy = oy * sh + ki;
                                if iy < ph || iy >= in_h + ph {
                                    continue;
                                }
                                let row = in_base + (iy - ph) * in_w;
                                let out_row = oy * out_w;
                                for ox in 0..out_w {
                                    let ix = ox * sw + kj;
                                    if ix < pw || ix >= in_w + pw {
                                        continue;
                                    }
                                    dst[out_row + ox] += w * src[row + ix - pw];
                                }
                            }
                        }
                    }
                }
            });
    }

    Ok(Tensor::from_parts(out, &[batch, out_c, out_h, out_w]))
}

// =============================================================================
// Pooling
// =============================================================================

/// Max pooling without padding; trailing rows/columns that do not fill a
/// window are dropped.
pub fn max_pool2d(input: &Tensor, kernel: (usize, usize), stride: (usize, usize)) -> Result<Tensor> {
    expect_rank(input.shape(), 4, "max_pool2d")?;
    let (batch, channels, height, width) = dims4(input);
    let (kh, kw) = kernel;
    let (sh, sw) = stride;
    let out_h = window_out(height, kh, sh, 0, "max_pool2d")?;
    let out_w = window_out(width, kw, sw, 0, "max_pool2d")?;

    let src = input.as_slice();
    let mut out = vec![f32::NEG_INFINITY; batch * channels * out_h * out_w];

    for bc in 0..batch * channels {
        let in_base = bc * height * width;
        let out_base = bc * out_h * out_w;
        for oy in 0..out_h {
            for ox in 0..out_w {
                let mut max_val = f32::NEG_INFINITY;
                for ki in 0..kh {
                    let row = in_base + (oy * sh + ki) * width;
                    for kj in 0..kw {
                        max_val = max_val.max(src[row + ox * sw + kj]);
                    }
                }
                out[out_base + oy * out_w + ox] = max_val;
            }
        }
    }

    Ok(Tensor::from_parts(out, &[batch, channels, out_h, out_w]))
}

/// Averages every channel over its spatial extent: `(N, C, H, W) -> (N, C)`.
pub fn global_avg_pool2d(input: &Tensor) -> Result<Tensor> {
    expect_rank(input.shape(), 4, "global_avg_pool2d")?;
    let (batch, channels, height, width) = dims4(input);
    let spatial = height * width;
    if spatial == 0 {
        return Err(Error::invalid_operation(
            "global_avg_pool2d on an empty spatial extent",
        ));
    }

    let out = input
        .as_slice()
        .chunks(spatial)
        .map(|plane| plane.iter().sum::<f32>() / spatial as f32)
        .collect();
    Ok(Tensor::from_parts(out, &[batch, channels]))
}

// =============================================================================
// Upsampling
// =============================================================================

/// Nearest-neighbour upsampling: every pixel is repeated `scale` times along
/// each spatial axis.
pub fn upsample_nearest2d(input: &Tensor, scale: (usize, usize)) -> Result<Tensor> {
    expect_rank(input.shape(), 4, "upsample_nearest2d")?;
    let (fh, fw) = scale;
    if fh == 0 || fw == 0 {
        return Err(Error::invalid_argument("upsampling factors must be non-zero"));
    }
    let (batch, channels, height, width) = dims4(input);
    let (out_h, out_w) = (height * fh, width * fw);

    let src = input.as_slice();
    let mut out = Vec::with_capacity(batch * channels * out_h * out_w);
    for bc in 0..batch * channels {
        let base = bc * height * width;
        for oy in 0..out_h {
            let row = base + (oy / fh) * width;
            for ox in 0..out_w {
                out.push(src[row + ox / fw]);
            }
        }
    }
    Ok(Tensor::from_parts(out, &[batch, channels, out_h, out_w]))
}

// =============================================================================
// Concatenation
// =============================================================================

/// Concatenates tensors along `dim`; all other dimensions must agree.
pub fn cat(tensors: &[&Tensor], dim: i64) -> Result<Tensor> {
    let first = tensors
        .first()
        .ok_or_else(|| Error::invalid_argument("cat needs at least one tensor"))?;
    let ndim = first.ndim();
    let dim = normalize_dim(dim, ndim)?;

    let mut out_shape = first.shape().to_vec();
    out_shape[dim] = 0;
    for t in tensors {
        if t.ndim() != ndim
            || t.shape()[..dim] != first.shape()[..dim]
            || t.shape()[dim + 1..] != first.shape()[dim + 1..]
        {
            return Err(Error::shape_mismatch(first.shape(), t.shape()));
        }
        out_shape[dim] += t.shape()[dim];
    }

    let outer: usize = first.shape()[..dim].iter().product();
    let inner: usize = first.shape()[dim + 1..].iter().product();
    let mut out = Vec::with_capacity(out_shape.iter().product());
    for o in 0..outer {
        for t in tensors {
            let chunk = t.shape()[dim] * inner;
            out.extend_from_slice(&t.as_slice()[o * chunk..(o + 1) * chunk]);
        }
    }
    Ok(Tensor::from_parts(out, &out_shape))
}

// =============================================================================
// Batch Normalization
// =============================================================================

/// Per-channel mean and (biased) variance of an NCHW batch.
pub fn channel_moments(input: &Tensor) -> Result<(Vec<f32>, Vec<f32>)> {
    expect_rank(input.shape(), 4, "channel_moments")?;
    let (batch, channels, height, width) = dims4(input);
    let spatial = height * width;
    let count = (batch * spatial) as f32;
    if count == 0.0 {
        return Err(Error::invalid_operation("batch statistics of an empty batch"));
    }

    let src = input.as_slice();
    let mut means = vec![0.0f32; channels];
    let mut vars = vec![0.0f32; channels];
    for c in 0..channels {
        let mut sum = 0.0f32;
        for b in 0..batch {
            let base = (b * channels + c) * spatial;
            sum += src[base..base + spatial].iter().sum::<f32>();
        }
        let mean = sum / count;
        let mut var_sum = 0.0f32;
        for b in 0..batch {
            let base = (b * channels + c) * spatial;
            var_sum += src[base..base + spatial]
                .iter()
                .map(|&x| (x - mean) * (x - mean))
                .sum::<f32>();
        }
        means[c] = mean;
        vars[c] = var_sum / count;
    }
    Ok((means, vars))
}

/// Normalizes every channel: `(x - mean) / sqrt(var + eps) * gamma + beta`.
pub fn batch_norm2d(
    input: &Tensor,
    mean: &[f32],
    var: &[f32],
    gamma: &[f32],
    beta: &[f32],
    eps: f32,
) -> Result<Tensor> {
    expect_rank(input.shape(), 4, "batch_norm2d")?;
    let (_, channels, height, width) = dims4(input);
    for stat in [mean, var, gamma, beta] {
        if stat.len() != channels {
            return Err(Error::shape_mismatch(&[channels], &[stat.len()]));
        }
    }

    let spatial = height * width;
    let scale: Vec<f32> = (0..channels)
        .map(|c| gamma[c] / (var[c] + eps).sqrt())
        .collect();

    let mut out = input.to_vec();
    if spatial > 0 {
        for (i, plane) in out.chunks_mut(spatial).enumerate() {
            let c = i % channels;
            for v in plane.iter_mut() {
                *v = (*v - mean[c]) * scale[c] + beta[c];
            }
        }
    }
    Ok(Tensor::from_parts(out, input.shape()))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conv2d_same_padding_shape() {
        let x = Tensor::ones(&[2, 3, 8, 8]);
        let w = Tensor::ones(&[4, 3, 3, 3]);
        let y = conv2d(&x, &w, None, (1, 1), (1, 1)).unwrap();
        assert_eq!(y.shape(), &[2, 4, 8, 8]);
        // interior sees all 27 taps, corners only 12
        assert_eq!(y.get(&[0, 0, 4, 4]).unwrap(), 27.0);
        assert_eq!(y.get(&[1, 3, 0, 0]).unwrap(), 12.0);
    }

    #[test]
    fn test_conv2d_bias_and_values() {
        // identity kernel on one channel plus bias
        let x = Tensor::from_vec((0..9).map(|v| v as f32).collect(), &[1, 1, 3, 3]).unwrap();
        let mut k = vec![0.0; 9];
        k[4] = 1.0;
        let w = Tensor::from_vec(k, &[1, 1, 3, 3]).unwrap();
        let b = Tensor::from_vec(vec![0.5], &[1]).unwrap();
        let y = conv2d(&x, &w, Some(&b), (1, 1), (1, 1)).unwrap();
        let expected: Vec<f32> = (0..9).map(|v| v as f32 + 0.5).collect();
        assert_eq!(y.to_vec(), expected);
    }

    #[test]
    fn test_conv2d_channel_mismatch() {
        let x = Tensor::ones(&[1, 2, 4, 4]);
        let w = Tensor::ones(&[4, 3, 3, 3]);
        assert!(matches!(
            conv2d(&x, &w, None, (1, 1), (1, 1)),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_max_pool2d_floor() {
        let x = Tensor::from_vec((0..25).map(|v| v as f32).collect(), &[1, 1, 5, 5]).unwrap();
        let y = max_pool2d(&x, (2, 2), (2, 2)).unwrap();
        assert_eq!(y.shape(), &[1, 1, 2, 2]);
        assert_eq!(y.to_vec(), vec![6.0, 8.0, 16.0, 18.0]);
    }

    #[test]
    fn test_max_pool2d_too_small() {
        let x = Tensor::ones(&[1, 1, 1, 1]);
        assert!(max_pool2d(&x, (2, 2), (2, 2)).is_err());
    }

    #[test]
    fn test_global_avg_pool2d() {
        let x = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 10.0, 10.0, 10.0, 10.0], &[1, 2, 2, 2])
            .unwrap();
        let y = global_avg_pool2d(&x).unwrap();
        assert_eq!(y.shape(), &[1, 2]);
        assert_eq!(y.to_vec(), vec![2.5, 10.0]);
    }

    #[test]
    fn test_upsample_nearest2d() {
        let x = Tensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2]).unwrap();
        let y = upsample_nearest2d(&x, (2, 2)).unwrap();
        assert_eq!(y.shape(), &[1, 1, 4, 4]);
        assert_eq!(
            y.to_vec(),
            vec![
                1.0, 1.0, 2.0, 2.0, //
                1.0, 1.0, 2.0, 2.0, //
                3.0, 3.0, 4.0, 4.0, //
                3.0, 3.0, 4.0, 4.0,
            ]
        );
    }

    #[test]
    fn test_cat_channels() {
        let a = Tensor::full(&[2, 1, 2, 2], 1.0);
        let b = Tensor::full(&[2, 3, 2, 2], 2.0);
        let y = cat(&[&a, &b], 1).unwrap();
        assert_eq!(y.shape(), &[2, 4, 2, 2]);
        assert_eq!(y.get(&[1, 0, 1, 1]).unwrap(), 1.0);
        assert_eq!(y.get(&[1, 1, 0, 0]).unwrap(), 2.0);
    }

    #[test]
    fn test_cat_spatial_mismatch() {
        let a = Tensor::zeros(&[1, 2, 4, 4]);
        let b = Tensor::zeros(&[1, 2, 2, 2]);
        assert!(cat(&[&a, &b], 1).is_err());
        assert!(cat(&[], 1).is_err());
    }

    #[test]
    fn test_batch_norm_with_moments_standardizes() {
        let x = Tensor::from_vec(vec![1.0, 3.0, 5.0, 7.0], &[2, 1, 1, 2]).unwrap();
        let (mean, var) = channel_moments(&x).unwrap();
        assert_eq!(mean, vec![4.0]);
        assert_eq!(var, vec![5.0]);
        let y = batch_norm2d(&x, &mean, &var, &[1.0], &[0.0], 0.0).unwrap();
        assert!(y.mean().abs() < 1e-6);
        let var_out = y.to_vec().iter().map(|v| v * v).sum::<f32>() / 4.0;
        assert!((var_out - 1.0).abs() < 1e-5);
    }
}
