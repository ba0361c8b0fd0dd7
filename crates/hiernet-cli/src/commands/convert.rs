//! Convert - Weight File Format Conversion
//!
//! Re-encodes a state dict between JSON, bincode and SafeTensors, optionally
//! translating Keras keys and kernel layouts on the way.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use hiernet_serialize::{
    convert_from_keras, convert_to_keras, detect_format, read_state_dict, save_state_dict,
};

use super::utils::{display_path, print_header, print_kv, print_success, print_warning};
use crate::cli::ConvertArgs;
use crate::error::{CliError, CliResult};

/// Execute the `convert` command
pub fn execute(args: ConvertArgs) -> CliResult<()> {
    CliError::require_file("input file", &args.input)?;

    let (mut state_dict, from) = read_state_dict(&args.input)?;
    let to = detect_format(&args.output);
    let loaded = state_dict.len();

    if args.from_keras {
        state_dict = convert_from_keras(&state_dict)?;
    } else if args.to_keras {
        state_dict = convert_to_keras(&state_dict)?;
    }

    save_state_dict(&state_dict, &args.output, to)?;
    tracing::info!(
        input = %args.input.display(),
        output = %args.output.display(),
        tensors = state_dict.len(),
        "converted weights"
    );

    print_header("Weight Conversion");
    print_kv("Input", &format!("{} ({from})", display_path(&args.input)));
    print_kv("Output", &format!("{} ({to})", display_path(&args.output)));
    print_kv("Tensors", &state_dict.len().to_string());
    print_kv("Parameters", &state_dict.total_params().to_string());
    if state_dict.len() < loaded {
        print_warning(&format!(
            "{} tensors had no native counterpart and were dropped",
            loaded - state_dict.len()
        ));
    }
    println!();
    print_success(&format!("Wrote {}", display_path(&args.output)));
    Ok(())
}
