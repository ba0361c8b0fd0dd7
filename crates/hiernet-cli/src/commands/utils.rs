//! Utils - Common Utilities for CLI Commands
//!
//! Shared output helpers used across CLI commands.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::Path;

use colored::Colorize;
use hiernet_nn::Model;
use indicatif::{ProgressBar, ProgressStyle};

// =============================================================================
// Output Formatting
// =============================================================================

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print a header
pub fn print_header(title: &str) {
    println!();
    println!("{}", title.bold().underline());
    println!();
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Format a parameter count with thousands separators
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Print the model name, outputs and parameter counts
pub fn print_model_overview(model: &Model) {
    print_kv("Model", model.name());
    print_kv("Outputs", &model.output_names().join(", "));
    print_kv("Parameters", &format_count(model.total_parameters()));
}

// =============================================================================
// Progress
// =============================================================================

/// Create a spinner for indeterminate operations
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb
}

// =============================================================================
// File Operations
// =============================================================================

/// Display a path for messages
pub fn display_path<P: AsRef<Path>>(path: P) -> String {
    path.as_ref().display().to_string()
}
