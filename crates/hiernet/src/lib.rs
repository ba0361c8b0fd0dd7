//! # hiernet - Hierarchical Image Classifiers in Pure Rust
//!
//! hiernet builds convolutional networks that classify small images at three
//! granularities at once: **coarse** (2 classes), **middle** (5) and
//! **fine** (10). Two families share a conv trunk:
//!
//! - **U-Net**: upsampling branches with skip connections feed the deeper heads
//! - **Bottleneck**: heads tap a plain trunk at increasing depth
//!
//! Layers carry Keras-compatible names, so weights trained for a coarse model
//! load by name into the middle and fine models of the same family.
//!
//! # Quick Start
//!
//! ```rust
//! use hiernet::prelude::*;
//!
//! let model = fine_bottleneck(InputShape::new(16, 16, 3)).unwrap();
//! let x = randn(&[2, 3, 16, 16]);
//! let outputs = model.forward(&x).unwrap();
//! assert_eq!(outputs[2].shape(), &[2, 10]);
//!
//! let preds =
//!     HierarchicalPrediction::decode(&model, &outputs, &LabelHierarchy::cifar10()).unwrap();
//! println!("{}", preds[0]);
//! ```
//!
//! # Feature Flags
//!
//! - `full` (default): everything below
//! - `serialize`: state dicts and weight files (JSON, bincode, SafeTensors)
//! - `vision`: the eight architecture factories, registry and label hierarchy
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

// =============================================================================
// Re-exports
// =============================================================================

pub use hiernet_nn as nn;
#[cfg(feature = "serialize")]
pub use hiernet_serialize as serialize;
pub use hiernet_tensor as tensor;
#[cfg(feature = "vision")]
pub use hiernet_vision as vision;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Prelude
// =============================================================================

/// Everything needed to build, run and checkpoint the classifiers.
pub mod prelude {
    // Tensors
    pub use hiernet_tensor::{manual_seed, ops, randn, zeros, Error, Result, Tensor};

    // Layers and graphs
    pub use hiernet_nn::{
        Activation, BatchNorm2d, Concatenate, Conv2d, Dropout, GlobalAvgPool2d, GraphBuilder,
        Linear, MaxPool2d, Model, Module, NodeId, Padding, Parameter, ReLU, Softmax,
        UpSampling2d,
    };

    // Weight files
    #[cfg(feature = "serialize")]
    pub use hiernet_serialize::{
        load_model, load_state_dict, save_model, save_state_dict, Format, LoadReport, StateDict,
    };

    // Architectures
    #[cfg(feature = "vision")]
    pub use hiernet_vision::{
        coarse_bottleneck, coarse_unet, fine_bottleneck, fine_bottleneck_single, fine_unet,
        fine_unet_single, middle_bottleneck, middle_unet, HierarchicalPrediction, InputShape,
        LabelHierarchy, Level, ModelConfig, ModelKind,
    };
}
