//! Hiernet Tensor - N-Dimensional Array for Hierarchical Classifiers
//!
//! This crate provides the `Tensor` type and the CPU kernels every hiernet
//! layer is built on. Tensors are contiguous, row-major f32 arrays; images
//! use the NCHW layout.
//!
//! # Key Features
//! - Shape-checked construction and reshaping
//! - Convolution, pooling, upsampling and concatenation kernels
//! - Dense algebra (matmul) and numerically stable softmax
//! - Seedable random initialization
//!
//! # Example
//! ```rust
//! use hiernet_tensor::{ops, Tensor};
//!
//! let x = Tensor::ones(&[1, 3, 4, 4]);
//! let pooled = ops::max_pool2d(&x, (2, 2), (2, 2)).unwrap();
//! assert_eq!(pooled.shape(), &[1, 3, 2, 2]);
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// ML/tensor-specific allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]

// =============================================================================
// Modules
// =============================================================================

pub mod creation;
pub mod error;
pub mod ops;
pub mod shape;
pub mod tensor;

// =============================================================================
// Re-exports
// =============================================================================

pub use creation::{
    full, manual_seed, ones, rand, randn, seeded_rng, uniform_range, with_rng, zeros,
};
pub use error::{Error, Result};
pub use shape::Shape;
pub use tensor::Tensor;

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::ops;
    pub use crate::shape::Shape;
    pub use crate::tensor::Tensor;
    pub use crate::{full, ones, rand, randn, zeros};
}
