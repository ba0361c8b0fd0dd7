//! hiernet-vision - Hierarchical CIFAR-10 Classifiers
//!
//! Architecture factories for coarse -> middle -> fine image classification,
//! together with what is needed to use them:
//!
//! - **Models**: four U-Net and four bottleneck factories
//! - **Registry**: `ModelKind`, a parseable name for every factory
//! - **Config**: `ModelConfig`, a TOML-loadable build recipe
//! - **Hierarchy**: `LabelHierarchy`, the fine -> middle -> coarse class tree
//! - **Prediction**: `HierarchicalPrediction`, decoded per-sample picks
//!
//! # Example
//!
//! ```rust
//! use hiernet_vision::prelude::*;
//!
//! let model = ModelKind::MiddleUnet.build(InputShape::new(16, 16, 3)).unwrap();
//! let x = hiernet_tensor::randn(&[2, 3, 16, 16]);
//! let outputs = model.forward(&x).unwrap();
//! let preds =
//!     HierarchicalPrediction::decode(&model, &outputs, &LabelHierarchy::cifar10()).unwrap();
//! assert_eq!(preds.len(), 2);
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
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::match_same_arms)]

// =============================================================================
// Modules
// =============================================================================

pub mod config;
pub mod hierarchy;
pub mod models;
pub mod prediction;
pub mod registry;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::ModelConfig;
pub use hierarchy::{LabelHierarchy, Level};
pub use models::{
    coarse_bottleneck, coarse_unet, fine_bottleneck, fine_bottleneck_single, fine_unet,
    fine_unet_single, middle_bottleneck, middle_unet, InputShape,
};
pub use prediction::{HierarchicalPrediction, LevelPrediction};
pub use registry::{Family, ModelKind};

// =============================================================================
// Prelude
// =============================================================================

/// Common imports for building and running the classifiers.
pub mod prelude {
    pub use crate::{
        Family, HierarchicalPrediction, InputShape, LabelHierarchy, Level, LevelPrediction,
        ModelConfig, ModelKind,
    };
    pub use hiernet_nn::Model;
    pub use hiernet_tensor::{Error, Result, Tensor};
}

// =============================================================================
// Tests
// =============================================================================
