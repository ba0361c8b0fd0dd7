//! Init - Write Initial Weights
//!
//! Builds a model and saves its freshly initialized weights, giving a
//! checkpoint with the exact layer names later stages expect.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use hiernet_serialize::{detect_format, save_model};

use super::utils::{display_path, print_header, print_kv, print_model_overview, print_success};
use crate::cli::InitArgs;
use crate::config::ProjectConfig;
use crate::error::{CliError, CliResult};

/// Execute the `init` command
pub fn execute(args: InitArgs, config: &ProjectConfig) -> CliResult<()> {
    let kind = config.resolve_kind(&args.model)?;
    let shape = config.resolve_input(&args.model)?;

    if args.output.exists() && !args.force {
        return Err(CliError::FileExists(display_path(&args.output)));
    }

    if let Some(seed) = config.resolve_seed(args.seed) {
        hiernet_nn::init::seed(seed);
    }
    let model = kind.build(shape)?;
    save_model(&model, &args.output)?;
    tracing::info!(kind = %kind, path = %args.output.display(), "wrote initial weights");

    print_header("Initial Weights");
    print_model_overview(&model);
    print_kv("Input", &shape.to_string());
    print_kv("Format", detect_format(&args.output).name());
    println!();
    print_success(&format!("Wrote {}", display_path(&args.output)));
    Ok(())
}
