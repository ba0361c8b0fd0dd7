//! Summary - Keras-Style Model Summary
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use serde::Serialize;

use crate::cli::{OutputFormat, SummaryArgs};
use crate::config::ProjectConfig;
use crate::error::CliResult;

#[derive(Serialize)]
struct LayerRow {
    name: String,
    kind: String,
    output_shape: Vec<usize>,
    params: usize,
    connected_to: Vec<String>,
}

#[derive(Serialize)]
struct SummaryReport {
    model: String,
    input: String,
    outputs: Vec<String>,
    total_params: usize,
    trainable_params: usize,
    non_trainable_params: usize,
    layers: Vec<LayerRow>,
}

/// Execute the `summary` command
pub fn execute(args: SummaryArgs, config: &ProjectConfig) -> CliResult<()> {
    let kind = config.resolve_kind(&args.model)?;
    let shape = config.resolve_input(&args.model)?;
    let model = kind.build(shape)?;
    let batch = args.batch.unwrap_or(1);

    match args.format {
        OutputFormat::Text => print!("{}", model.summary(batch)),
        OutputFormat::Json => {
            let report = SummaryReport {
                model: model.name().to_string(),
                input: shape.to_string(),
                outputs: model.output_names().iter().map(ToString::to_string).collect(),
                total_params: model.total_parameters(),
                trainable_params: model.num_parameters(),
                non_trainable_params: model.num_non_trainable(),
                layers: model
                    .summary_rows(batch)
                    .into_iter()
                    .map(|row| LayerRow {
                        name: row.name,
                        kind: row.kind,
                        output_shape: row.output_shape,
                        params: row.params,
                        connected_to: row.connected_to,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
