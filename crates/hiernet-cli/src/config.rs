//! Config - Project Configuration File
//!
//! `hiernet.toml` supplies defaults for commands that take a model:
//!
//! ```toml
//! [model]
//! kind = "fine-bottleneck"
//! input = "32x32x3"
//! seed = 42
//!
//! # optional, replaces the CIFAR-10 labels used by `run`
//! [hierarchy]
//! fine = ["airplane", ...]
//! middle = ["air_water", ...]
//! coarse = ["vehicle", "animal"]
//! fine_to_middle = [0, ...]
//! middle_to_coarse = [0, ...]
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::{Path, PathBuf};

use hiernet_vision::{InputShape, LabelHierarchy, ModelKind};
use serde::{Deserialize, Serialize};

use crate::cli::ModelArgs;
use crate::error::{CliError, CliResult};

/// Name of the config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "hiernet.toml";

// =============================================================================
// Project Configuration
// =============================================================================

/// Project configuration (hiernet.toml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Model defaults
    #[serde(default)]
    pub model: ModelDefaults,

    /// Label hierarchy for decoding predictions
    #[serde(default)]
    pub hierarchy: Option<LabelHierarchy>,
}

/// `[model]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefaults {
    /// Default model kind
    #[serde(default)]
    pub kind: Option<ModelKind>,

    /// Default input shape
    #[serde(default)]
    pub input: Option<InputShape>,

    /// Default seed
    #[serde(default)]
    pub seed: Option<u64>,

    /// Default weight file for `run`
    #[serde(default)]
    pub weights: Option<PathBuf>,
}

impl ProjectConfig {
    /// Loads configuration from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> CliResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: ProjectConfig = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded project config");
        Ok(config)
    }

    /// Loads the explicit config, else `hiernet.toml` if present, else defaults.
    pub fn discover(explicit: Option<&Path>) -> CliResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::load(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Resolves the model kind from the argument or the config.
    pub fn resolve_kind(&self, args: &ModelArgs) -> CliResult<ModelKind> {
        match (&args.kind, self.model.kind) {
            (Some(name), _) => Ok(name.parse()?),
            (None, Some(kind)) => Ok(kind),
            (None, None) => Err(CliError::InvalidArgument(
                "no model kind given and no [model].kind in the config".to_string(),
            )),
        }
    }

    /// Resolves the input shape from the argument, the config, or the default.
    pub fn resolve_input(&self, args: &ModelArgs) -> CliResult<InputShape> {
        match &args.input {
            Some(text) => Ok(text.parse()?),
            None => Ok(self.model.input.unwrap_or_default()),
        }
    }

    /// Resolves the label hierarchy from `--hierarchy`, the `[hierarchy]`
    /// table, or CIFAR-10.
    pub fn resolve_hierarchy(&self, file: Option<&Path>) -> CliResult<LabelHierarchy> {
        match (file, &self.hierarchy) {
            (Some(path), _) => {
                CliError::require_file("hierarchy file", path)?;
                Ok(LabelHierarchy::from_file(path)?)
            }
            (None, Some(hierarchy)) => Ok(hierarchy.clone()),
            (None, None) => Ok(LabelHierarchy::cifar10()),
        }
    }

    /// Resolves the seed from the argument or the config.
    pub fn resolve_seed(&self, arg: Option<u64>) -> Option<u64> {
        arg.or(self.model.seed)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args(kind: Option<&str>, input: Option<&str>) -> ModelArgs {
        ModelArgs {
            kind: kind.map(str::to_string),
            input: input.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_model_table() {
        let config: ProjectConfig = toml::from_str(
            r#"
            [model]
            kind = "fine-bottleneck"
            input = "16x16x3"
            seed = 9
            "#,
        )
        .unwrap();
        assert_eq!(config.model.kind, Some(ModelKind::FineBottleneck));
        assert_eq!(config.resolve_seed(None), Some(9));
        assert_eq!(config.resolve_seed(Some(1)), Some(1));
        assert_eq!(
            config.resolve_input(&args(None, None)).unwrap(),
            InputShape::new(16, 16, 3)
        );
    }

    #[test]
    fn test_arguments_override_config() {
        let config = ProjectConfig {
            model: ModelDefaults {
                kind: Some(ModelKind::CoarseUnet),
                ..ModelDefaults::default()
            },
            ..ProjectConfig::default()
        };
        assert_eq!(
            config.resolve_kind(&args(Some("middle-unet"), None)).unwrap(),
            ModelKind::MiddleUnet
        );
        assert_eq!(config.resolve_kind(&args(None, None)).unwrap(), ModelKind::CoarseUnet);
        assert!(ProjectConfig::default().resolve_kind(&args(None, None)).is_err());
        assert!(config.resolve_input(&args(None, Some("bad"))).is_err());
    }

    #[test]
    fn test_hierarchy_table() {
        let config: ProjectConfig = toml::from_str(
            r#"
            [hierarchy]
            fine = ["a", "b", "c"]
            middle = ["ab", "c"]
            coarse = ["all"]
            fine_to_middle = [0, 0, 1]
            middle_to_coarse = [0, 0]
            "#,
        )
        .unwrap();
        let h = config.resolve_hierarchy(None).unwrap();
        assert_eq!(h.class_names(hiernet_vision::Level::Middle).join(","), "ab,c");
        assert_eq!(
            ProjectConfig::default().resolve_hierarchy(None).unwrap(),
            LabelHierarchy::cifar10()
        );
        assert!(config.resolve_hierarchy(Some(Path::new("absent.toml"))).is_err());

        // an orphaned middle class fails validation at load time
        assert!(toml::from_str::<ProjectConfig>(
            "[hierarchy]\nfine = [\"a\"]\nmiddle = [\"x\", \"y\"]\ncoarse = [\"all\"]\n\
             fine_to_middle = [0]\nmiddle_to_coarse = [0, 0]\n"
        )
        .is_err());
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: ProjectConfig = toml::from_str("").unwrap();
        assert_eq!(config, ProjectConfig::default());
    }
}
