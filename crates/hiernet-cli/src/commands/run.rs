//! Run - Forward Pass on a Random Batch
//!
//! Builds a model in evaluation mode, optionally loads weights by name, feeds
//! a seeded random batch and prints the decoded hierarchical predictions.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::time::Instant;

use colored::Colorize;
use hiernet_serialize::load_model;
use hiernet_vision::HierarchicalPrediction;

use super::utils::{display_path, print_header, print_kv, print_model_overview, print_warning, spinner};
use crate::cli::{OutputFormat, RunArgs};
use crate::config::ProjectConfig;
use crate::error::{CliError, CliResult};

/// Execute the `run` command
pub fn execute(args: RunArgs, config: &ProjectConfig) -> CliResult<()> {
    if args.batch == 0 {
        return Err(CliError::InvalidArgument("--batch must be at least 1".to_string()));
    }
    let kind = config.resolve_kind(&args.model)?;
    let hierarchy = config.resolve_hierarchy(args.hierarchy.as_deref())?;
    let shape = config.resolve_input(&args.model)?;
    let seed = config.resolve_seed(args.seed);

    if let Some(seed) = seed {
        hiernet_nn::init::seed(seed);
    }
    let model = kind.build(shape)?;

    let weights = args.weights.clone().or_else(|| config.model.weights.clone());
    let report = match &weights {
        Some(path) => {
            CliError::require_file("weights", path)?;
            Some(load_model(&model, path, args.strict)?)
        }
        None => None,
    };

    let input = hiernet_tensor::randn(&shape.batch(args.batch));
    let start = Instant::now();
    let sp = spinner("Running forward pass...");
    let outputs = model.forward(&input);
    sp.finish_and_clear();
    let outputs = outputs?;
    let elapsed = start.elapsed();
    tracing::debug!(kind = %kind, batch = args.batch, ?elapsed, "forward pass done");

    let predictions = HierarchicalPrediction::decode(&model, &outputs, &hierarchy)?;

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&predictions)?);
        return Ok(());
    }

    print_header("Forward Pass");
    print_model_overview(&model);
    print_kv("Input", &format!("{} x {}", args.batch, shape));
    if let Some(seed) = seed {
        print_kv("Seed", &seed.to_string());
    }
    match (&weights, &report) {
        (Some(path), Some(report)) => {
            print_kv(
                "Weights",
                &format!("{} ({} loaded)", display_path(path), report.loaded.len()),
            );
            if !report.missing.is_empty() {
                print_warning(&format!(
                    "{} parameters kept their initial values",
                    report.missing.len()
                ));
            }
        }
        _ => print_warning("No weights loaded, predictions come from random initialization"),
    }
    print_kv("Elapsed", &format!("{:.2?}", elapsed));

    print_header("Predictions");
    for (i, prediction) in predictions.iter().enumerate() {
        println!("  {} {}", format!("#{i}").cyan().bold(), prediction);
    }
    println!();
    Ok(())
}
