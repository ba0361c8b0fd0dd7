//! Tensor Creation Functions
//!
//! Factory functions for constant and random tensors. Random draws go
//! through a thread-local generator that can be reseeded with
//! [`manual_seed`], which makes weight initialization and dropout masks
//! reproducible.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::cell::RefCell;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal, Uniform};

use crate::tensor::Tensor;

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::from_entropy());
}

// =============================================================================
// Random Generator
// =============================================================================

/// Reseeds the thread-local generator used by every random factory.
pub fn manual_seed(seed: u64) {
    RNG.with(|rng| *rng.borrow_mut() = StdRng::seed_from_u64(seed));
}

/// Runs `f` with exclusive access to the thread-local generator.
pub fn with_rng<T>(f: impl FnOnce(&mut StdRng) -> T) -> T {
    RNG.with(|rng| f(&mut rng.borrow_mut()))
}

/// Creates a standalone generator from a seed.
#[must_use]
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

// =============================================================================
// Constant Initialization
// =============================================================================

/// Creates a tensor filled with zeros.
#[must_use]
pub fn zeros(shape: &[usize]) -> Tensor {
    full(shape, 0.0)
}

/// Creates a tensor filled with ones.
#[must_use]
pub fn ones(shape: &[usize]) -> Tensor {
    full(shape, 1.0)
}

/// Creates a tensor filled with a specific value.
#[must_use]
pub fn full(shape: &[usize], value: f32) -> Tensor {
    let numel: usize = shape.iter().product();
    Tensor::from_parts(vec![value; numel], shape)
}

// =============================================================================
// Random Initialization
// =============================================================================

/// Creates a tensor with uniformly distributed values in [0, 1).
#[must_use]
pub fn rand(shape: &[usize]) -> Tensor {
    uniform_range(shape, 0.0, 1.0)
}

/// Creates a tensor with uniformly distributed values in [low, high).
#[must_use]
pub fn uniform_range(shape: &[usize], low: f32, high: f32) -> Tensor {
    let numel: usize = shape.iter().product();
    let data = if low < high {
        let dist = Uniform::new(low, high);
        with_rng(|rng| (0..numel).map(|_| dist.sample(rng)).collect())
    } else {
        vec![low; numel]
    };
    Tensor::from_parts(data, shape)
}

/// Creates a tensor with standard normal values (mean 0, std 1).
#[must_use]
pub fn randn(shape: &[usize]) -> Tensor {
    let numel: usize = shape.iter().product();
    let data = with_rng(|rng| {
        (0..numel)
            .map(|_| rng.sample::<f32, _>(StandardNormal))
            .collect()
    });
    Tensor::from_parts(data, shape)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_factories() {
        assert!(zeros(&[2, 3]).to_vec().iter().all(|&x| x == 0.0));
        assert!(ones(&[4]).to_vec().iter().all(|&x| x == 1.0));
        assert_eq!(full(&[2], 7.5).to_vec(), vec![7.5, 7.5]);
    }

    #[test]
    fn test_uniform_range_bounds() {
        let t = uniform_range(&[1000], -0.5, 0.5);
        assert!(t.to_vec().iter().all(|&x| (-0.5..0.5).contains(&x)));
    }

    #[test]
    fn test_manual_seed_reproducible() {
        manual_seed(42);
        let a = randn(&[16]);
        manual_seed(42);
        let b = randn(&[16]);
        assert_eq!(a.to_vec(), b.to_vec());
    }

    #[test]
    fn test_degenerate_range() {
        let t = uniform_range(&[3], 1.0, 1.0);
        assert_eq!(t.to_vec(), vec![1.0; 3]);
    }
}
