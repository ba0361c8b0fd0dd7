//! CLI - Command Line Interface Definitions
//!
//! Defines the CLI structure using clap derive macros.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// hiernet - Hierarchical image classifiers for small images
#[derive(Parser, Debug)]
#[command(
    name = "hiernet",
    author = "AutomataNexus Development Team",
    version,
    about = "Build, inspect and run coarse -> middle -> fine image classifiers",
    long_about = "hiernet builds the U-Net and bottleneck families of hierarchical CIFAR-10 \
                  classifiers.\n\nUse this CLI to list the architectures, print Keras-style \
                  summaries, write initial weights, run forward passes and convert weight files."
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Project config with `[model]` defaults (hiernet.toml is used if present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the available model kinds
    List(ListArgs),

    /// Print a Keras-style summary of a model
    Summary(SummaryArgs),

    /// Build a model and write its initial weights
    Init(InitArgs),

    /// Run a forward pass on a random batch and decode the predictions
    Run(RunArgs),

    /// Re-encode a weight file in another format
    Convert(ConvertArgs),
}

/// Output format for listing commands.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Shared model selection.
#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Model kind, e.g. fine-unet (falls back to [model].kind)
    pub kind: Option<String>,

    /// Input shape as HxWxC (falls back to [model].input, then 32x32x3)
    #[arg(long, value_name = "HxWxC")]
    pub input: Option<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Batch size shown in output shapes
    #[arg(long)]
    pub batch: Option<usize>,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Weight file to write (.json, .bin/.hnet or .safetensors)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Seed for weight initialization
    #[arg(long)]
    pub seed: Option<u64>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    /// Weights to load by layer name
    #[arg(short, long)]
    pub weights: Option<PathBuf>,

    /// Require the weights to cover every parameter
    #[arg(long)]
    pub strict: bool,

    /// Number of random samples
    #[arg(short, long, default_value_t = 4)]
    pub batch: usize,

    /// Seed for weights and the random batch
    #[arg(long)]
    pub seed: Option<u64>,

    /// Label hierarchy TOML (falls back to [hierarchy], then CIFAR-10)
    #[arg(long, value_name = "FILE")]
    pub hierarchy: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input weight file
    pub input: PathBuf,

    /// Output weight file; the format follows the extension
    pub output: PathBuf,

    /// Treat the input as Keras-keyed (layer/kernel:0, HWIO kernels)
    #[arg(long, conflicts_with = "to_keras")]
    pub from_keras: bool,

    /// Write Keras keys and layouts
    #[arg(long)]
    pub to_keras: bool,
}
