//! Linear Algebra - Matrix Multiplication and Dense Projection
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::shape::expect_rank;
use crate::tensor::Tensor;

/// Matrix product of two 2-D tensors: `(m, k) x (k, n) -> (m, n)`.
pub fn matmul(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    expect_rank(a.shape(), 2, "matmul lhs")?;
    expect_rank(b.shape(), 2, "matmul rhs")?;
    let (m, k) = (a.shape()[0], a.shape()[1]);
    let (k2, n) = (b.shape()[0], b.shape()[1]);
    if k != k2 {
        return Err(Error::shape_mismatch(&[k, n], b.shape()));
    }

    let lhs = a.as_slice();
    let rhs = b.as_slice();
    let mut out = vec![0.0f32; m * n];
    if n > 0 {
        out.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
            for p in 0..k {
                let av = lhs[i * k + p];
                let rhs_row = &rhs[p * n..(p + 1) * n];
                for (o, &bv) in row.iter_mut().zip(rhs_row) {
                    *o += av * bv;
                }
            }
        });
    }
    Ok(Tensor::from_parts(out, &[m, n]))
}

/// Dense projection `y = x W^T + b`.
///
/// # Shape
/// - input: `(N, in)`
/// - weight: `(out, in)`
/// - bias: `(out)`
/// - output: `(N, out)`
pub fn linear(input: &Tensor, weight: &Tensor, bias: Option<&Tensor>) -> Result<Tensor> {
    expect_rank(input.shape(), 2, "linear input")?;
    expect_rank(weight.shape(), 2, "linear weight")?;
    let (batch, in_f) = (input.shape()[0], input.shape()[1]);
    let out_f = weight.shape()[0];
    if weight.shape()[1] != in_f {
        return Err(Error::shape_mismatch(&[out_f, in_f], weight.shape()));
    }
    if let Some(b) = bias {
        if b.shape() != [out_f] {
            return Err(Error::shape_mismatch(&[out_f], b.shape()));
        }
    }

    let x = input.as_slice();
    let w = weight.as_slice();
    let bias = bias.map(Tensor::as_slice);
    let mut out = vec![0.0f32; batch * out_f];
    if out_f > 0 {
        out.par_chunks_mut(out_f).enumerate().for_each(|(i, row)| {
            let xi = &x[i * in_f..(i + 1) * in_f];
            for (o, dst) in row.iter_mut().enumerate() {
                let wo = &w[o * in_f..(o + 1) * in_f];
                let dot: f32 = xi.iter().zip(wo).map(|(a, b)| a * b).sum();
                *dst = dot + bias.map_or(0.0, |b| b[o]);
            }
        });
    }
    Ok(Tensor::from_parts(out, &[batch, out_f]))
}

// =============================================================================
// Tests
// =============================================================================
