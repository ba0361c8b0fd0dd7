//! List - Available Model Kinds
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use colored::Colorize;
use hiernet_vision::ModelKind;
use serde::Serialize;

use super::utils::print_header;
use crate::cli::{ListArgs, OutputFormat};
use crate::error::CliResult;

#[derive(Serialize)]
struct KindInfo {
    name: &'static str,
    family: String,
    levels: Vec<String>,
    outputs: &'static [&'static str],
}

/// Execute the `list` command
pub fn execute(args: ListArgs) -> CliResult<()> {
    let infos: Vec<KindInfo> = ModelKind::all()
        .iter()
        .map(|kind| KindInfo {
            name: kind.as_str(),
            family: kind.family().to_string(),
            levels: kind.levels().iter().map(ToString::to_string).collect(),
            outputs: kind.output_names(),
        })
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&infos)?),
        OutputFormat::Text => {
            print_header("Model Kinds");
            for info in &infos {
                println!(
                    "  {:<24} {:<11} {}",
                    info.name.cyan().bold(),
                    info.family,
                    info.outputs.join(", ")
                );
            }
            println!();
        }
    }
    Ok(())
}
