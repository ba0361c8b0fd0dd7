//! Model Configuration
//!
//! A serde description of which model to build and how:
//!
//! ```toml
//! kind = "middle-unet"
//! input_shape = "32x32x3"
//! seed = 42
//! weights = "coarse.safetensors"
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::{Path, PathBuf};

use hiernet_nn::Model;
use hiernet_tensor::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::models::InputShape;
use crate::registry::ModelKind;

// =============================================================================
// ModelConfig
// =============================================================================

/// Everything needed to build one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Which factory to call.
    #[serde(default = "default_kind")]
    pub kind: ModelKind,

    /// Input shape as `HxWxC`.
    #[serde(default)]
    pub input_shape: InputShape,

    /// Seed for weight initialization.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Leave the model in training mode.
    #[serde(default)]
    pub training: bool,

    /// Weights to load by name after building.
    #[serde(default)]
    pub weights: Option<PathBuf>,

    /// Fail when the weights do not cover every parameter.
    #[serde(default)]
    pub strict: bool,
}

fn default_kind() -> ModelKind {
    ModelKind::FineUnet
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            input_shape: InputShape::default(),
            seed: None,
            training: false,
            weights: None,
            strict: false,
        }
    }
}

impl ModelConfig {
    /// Config for a kind with default settings.
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Sets the input shape.
    #[must_use]
    pub fn with_input_shape(mut self, shape: InputShape) -> Self {
        self.input_shape = shape;
        self
    }

    /// Sets the initialization seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets a weight file to load after building.
    #[must_use]
    pub fn with_weights(mut self, path: impl Into<PathBuf>) -> Self {
        self.weights = Some(path.into());
        self
    }

    /// Parses a config from TOML.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Loads a config from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Serializes the config to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::serialization(e.to_string()))
    }

    /// Seeds the generator, builds the model, loads weights and sets the mode.
    pub fn build(&self) -> Result<Model> {
        if let Some(seed) = self.seed {
            hiernet_nn::init::seed(seed);
        }
        let mut model = self.kind.build(self.input_shape)?;

        if let Some(path) = &self.weights {
            let report = hiernet_serialize::load_model(&model, path, self.strict)?;
            tracing::info!(
                path = %path.display(),
                loaded = report.loaded.len(),
                missing = report.missing.len(),
                "loaded weights"
            );
        }
        if self.training {
            model.train();
        }
        tracing::debug!(kind = %self.kind, training = self.training, "configured model");
        Ok(model)
    }
}

// =============================================================================
// Tests
// =============================================================================
