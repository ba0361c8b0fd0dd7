//! Format Detection and Management
//!
//! Handles the weight file encodings a state dictionary can be stored in.

use std::path::Path;

// =============================================================================
// Format Enum
// =============================================================================

/// Supported serialization formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Compact bincode encoding (.bin, .hnet)
    Bincode,
    /// JSON format for inspection (.json)
    Json,
    /// `SafeTensors` format (.safetensors)
    SafeTensors,
}

impl Format {
    /// Get the file extension for this format.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Bincode => "bin",
            Format::Json => "json",
            Format::SafeTensors => "safetensors",
        }
    }

    /// Get a human-readable name for this format.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Format::Bincode => "Bincode",
            Format::Json => "JSON",
            Format::SafeTensors => "SafeTensors",
        }
    }

    /// Check if this format is binary.
    #[must_use]
    pub fn is_binary(&self) -> bool {
        !matches!(self, Format::Json)
    }

    /// Get all supported formats.
    #[must_use]
    pub fn all() -> &'static [Format] {
        &[Format::Bincode, Format::Json, Format::SafeTensors]
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// Format Detection
// =============================================================================

/// Maps a file extension to its format, if it is one we write.
#[must_use]
pub fn format_for_extension(ext: &str) -> Option<Format> {
    match ext.to_ascii_lowercase().as_str() {
        "json" => Some(Format::Json),
        "safetensors" | "st" => Some(Format::SafeTensors),
        "bin" | "hnet" => Some(Format::Bincode),
        _ => None,
    }
}

/// Picks the format for `path` from its extension, else bincode.
pub fn detect_format<P: AsRef<Path>>(path: P) -> Format {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .and_then(format_for_extension)
        .unwrap_or(Format::Bincode)
}

/// Guesses the format of an encoded state dict from its leading bytes.
///
/// Returns `None` when there are too few bytes to tell.
#[must_use]
pub fn detect_format_from_bytes(bytes: &[u8]) -> Option<Format> {
    let head: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
    if head[0] == b'{' {
        return Some(Format::Json);
    }

    // safetensors: u64 LE header length, then the JSON header itself
    let header_len = u64::from_le_bytes(head);
    let fits = usize::try_from(header_len).is_ok_and(|n| n <= bytes.len() - 8);
    if fits && bytes.get(8) == Some(&b'{') {
        return Some(Format::SafeTensors);
    }

    Some(Format::Bincode)
}

// =============================================================================
// Tests
// =============================================================================
