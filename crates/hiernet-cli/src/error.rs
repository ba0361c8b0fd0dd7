//! Error - CLI Error Types
//!
//! Everything a command can fail with. Library errors from model building,
//! weight loading and forward passes arrive as [`CliError::Model`].
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Bad or unreadable hiernet.toml
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Model building, weight loading or forward failure
    #[error("Model error: {0}")]
    Model(#[from] hiernet_tensor::Error),

    /// JSON output could not be produced
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A weight file named on the command line does not exist
    #[error("{what} not found: {}", path.display())]
    NotFound {
        /// Which file was expected ("input file", "weights")
        what: &'static str,
        /// Where it was looked for
        path: PathBuf,
    },

    /// Refusing to overwrite
    #[error("File already exists: {0} (use --force to overwrite)")]
    FileExists(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Fails with [`CliError::NotFound`] unless `path` is an existing file.
    pub fn require_file(what: &'static str, path: &std::path::Path) -> CliResult<()> {
        if path.is_file() {
            Ok(())
        } else {
            Err(CliError::NotFound {
                what,
                path: path.to_path_buf(),
            })
        }
    }
}

// =============================================================================
// Error Conversion
// =============================================================================

impl From<toml::de::Error> for CliError {
    fn from(e: toml::de::Error) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_file() {
        let err = CliError::require_file("weights", std::path::Path::new("nope.hnet")).unwrap_err();
        assert_eq!(err.to_string(), "weights not found: nope.hnet");
        assert!(matches!(err, CliError::NotFound { what: "weights", .. }));
    }

    #[test]
    fn test_model_errors_convert() {
        let err: CliError = hiernet_tensor::Error::invalid_argument("unknown model kind: x").into();
        assert!(err.to_string().contains("unknown model kind"));
    }
}
