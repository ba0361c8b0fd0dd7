//! hiernet CLI - Command Line Interface for Hierarchical Classifiers
//!
//! The main entry point for the hiernet command-line tool.
//!
//! # Commands
//! - `hiernet list` - List the available model kinds
//! - `hiernet summary` - Print a Keras-style model summary
//! - `hiernet init` - Write a model's initial weights
//! - `hiernet run` - Run a forward pass and decode predictions
//! - `hiernet convert` - Convert weight files between formats
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// CLI-specific allowances
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::struct_excessive_bools)]

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod error;

use cli::{Cli, Commands};
use config::ProjectConfig;
use error::CliResult;

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = ProjectConfig::discover(cli.config.as_deref())?;

    match cli.command {
        Commands::List(args) => commands::list::execute(args),
        Commands::Summary(args) => commands::summary::execute(args, &config),
        Commands::Init(args) => commands::init::execute(args, &config),
        Commands::Run(args) => commands::run::execute(args, &config),
        Commands::Convert(args) => commands::convert::execute(args),
    }
}

/// `RUST_LOG` wins; otherwise -v selects debug, -q error, default info.
fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
