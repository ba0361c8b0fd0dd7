//! hiernet-nn - Named Layers and Functional Graphs
//!
//! Provides the layer vocabulary of the hierarchical classifiers and a
//! functional-graph container that wires layers into a multi-output model.
//!
//! # Key Components
//!
//! - **Module trait**: forward pass, shape inference, parameters, train/eval
//! - **Parameter**: shared, named tensor slot (`weight`, `bias`, ...)
//! - **Layers**: Conv2d, BatchNorm2d, MaxPool2d, Dropout, Linear,
//!   UpSampling2d, Concatenate, GlobalAvgPool2d
//! - **Activations**: ReLU, Softmax, and fused activations for Linear
//! - **GraphBuilder / Model**: Keras-style functional API with a summary
//! - **Initialization**: Glorot uniform, seedable
//!
//! # Example
//!
//! ```rust
//! use hiernet_nn::prelude::*;
//!
//! let mut g = GraphBuilder::new();
//! let x = g.input("input_1", &[3, 8, 8]).unwrap();
//! let h = g.apply(Conv2d::new("conv2d", 3, 8, 3), x).unwrap();
//! let h = g.apply(ReLU::new("activation"), h).unwrap();
//! let f = g.apply(GlobalAvgPool2d::new(), h).unwrap();
//! let y = g
//!     .apply(Linear::with_activation("coarse", 8, 2, Activation::Softmax), f)
//!     .unwrap();
//! let model = g.build(x, &[y]).unwrap();
//!
//! let out = model.forward(&Tensor::ones(&[4, 3, 8, 8])).unwrap();
//! assert_eq!(out[0].shape(), &[4, 2]);
//! ```
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// ML/tensor-specific allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::format_push_string)]

// =============================================================================
// Modules
// =============================================================================

pub mod activation;
pub mod graph;
pub mod init;
pub mod layers;
pub mod model;
pub mod module;
pub mod parameter;

// =============================================================================
// Re-exports
// =============================================================================

pub use activation::{Activation, ReLU, Softmax};
pub use graph::{keras_prefix, GraphBuilder, NodeId};
pub use layers::{
    BatchNorm2d, Concatenate, Conv2d, Dropout, GlobalAvgPool2d, Linear, MaxPool2d, Padding,
    UpSampling2d,
};
pub use model::{LayerSummary, Model};
pub use module::Module;
pub use parameter::Parameter;

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for building models.
pub mod prelude {
    pub use crate::{
        Activation, BatchNorm2d, Concatenate, Conv2d, Dropout, GlobalAvgPool2d, GraphBuilder,
        Linear, MaxPool2d, Model, Module, NodeId, Padding, Parameter, ReLU, Softmax,
        UpSampling2d,
    };
    pub use hiernet_tensor::{Error, Result, Tensor};
}
