//! hiernet-serialize - Weight Files for Hierarchical Classifiers
//!
//! Saves and restores model weights keyed by layer name, so a checkpoint from
//! one stage of a model family loads into the next.
//!
//! # Supported Formats
//!
//! - **Bincode** (.bin, .hnet) - compact binary encoding of a `StateDict`
//! - **JSON** (.json) - human-readable, for inspection and diffs
//! - **`SafeTensors`** (.safetensors) - F32 tensors, flags kept in metadata
//!
//! # Example
//!
//! ```ignore
//! use hiernet_serialize::{load_model, save_model};
//!
//! save_model(&coarse, "coarse.safetensors")?;
//! let report = load_model(&middle, "coarse.safetensors", false)?;
//! println!("{} loaded, {} missing", report.loaded.len(), report.missing.len());
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// ML/tensor-specific allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::case_sensitive_file_extension_comparisons)]

// =============================================================================
// Modules
// =============================================================================

mod convert;
mod format;
mod state_dict;

// =============================================================================
// Re-exports
// =============================================================================

pub use convert::{
    convert_from_keras, convert_to_keras, from_keras_key, hwio_to_oihw, oihw_to_hwio,
    to_keras_key, transpose_2d,
};
pub use format::{detect_format, detect_format_from_bytes, format_for_extension, Format};
pub use state_dict::{LoadReport, StateDict, StateDictEntry, TensorData};

// =============================================================================
// Imports
// =============================================================================

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use hiernet_nn::Model;
use hiernet_tensor::{Error, Result};
use safetensors::tensor::{Dtype, SafeTensors, TensorView};

/// Safetensors metadata key listing the non-trainable tensors.
const NON_TRAINABLE_KEY: &str = "hiernet.non_trainable";

// =============================================================================
// High-Level API
// =============================================================================

/// Save a model's weights to a file.
///
/// The format is determined from the file extension.
pub fn save_model<P: AsRef<Path>>(model: &Model, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = detect_format(path);
    let state_dict = StateDict::from_model(model);

    save_state_dict(&state_dict, path, format)?;
    tracing::debug!(
        model = model.name(),
        path = %path.display(),
        format = %format,
        tensors = state_dict.len(),
        "saved weights"
    );
    Ok(())
}

/// Load weights from a file into a model by parameter name.
pub fn load_model<P: AsRef<Path>>(model: &Model, path: P, strict: bool) -> Result<LoadReport> {
    let state_dict = load_state_dict(path)?;
    state_dict.apply_to(model, strict)
}

/// Save a state dictionary to a file with the given format.
pub fn save_state_dict<P: AsRef<Path>>(
    state_dict: &StateDict,
    path: P,
    format: Format,
) -> Result<()> {
    let path = path.as_ref();

    match format {
        Format::Bincode => {
            let encoded =
                bincode::serialize(state_dict).map_err(|e| Error::serialization(e.to_string()))?;
            let mut writer = BufWriter::new(File::create(path)?);
            writer.write_all(&encoded)?;
            writer.flush()?;
        }
        Format::Json => {
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, state_dict)
                .map_err(|e| Error::serialization(e.to_string()))?;
            writer.flush()?;
        }
        Format::SafeTensors => {
            std::fs::write(path, to_safetensors_bytes(state_dict)?)?;
        }
    }

    Ok(())
}

/// Load a state dictionary from a file.
///
/// The codec follows the extension; files without a known extension are
/// sniffed from their first bytes.
pub fn load_state_dict<P: AsRef<Path>>(path: P) -> Result<StateDict> {
    read_state_dict(path).map(|(state_dict, _)| state_dict)
}

/// Like [`load_state_dict`], also returning the codec that decoded the file.
pub fn read_state_dict<P: AsRef<Path>>(path: P) -> Result<(StateDict, Format)> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(format_for_extension)
        .or_else(|| detect_format_from_bytes(&bytes))
        .unwrap_or(Format::Bincode);
    tracing::debug!(path = %path.display(), format = %format, "reading state dict");

    let state_dict = match format {
        Format::Bincode => {
            bincode::deserialize(&bytes).map_err(|e| Error::serialization(e.to_string()))?
        }
        Format::Json => {
            serde_json::from_slice(&bytes).map_err(|e| Error::serialization(e.to_string()))?
        }
        Format::SafeTensors => from_safetensors_bytes(&bytes)?,
    };
    Ok((state_dict, format))
}

/// Load a Keras-keyed weight file and convert it to native keys and layouts.
pub fn load_keras_state_dict<P: AsRef<Path>>(path: P) -> Result<StateDict> {
    convert_from_keras(&load_state_dict(path)?)
}

// =============================================================================
// SafeTensors Support
// =============================================================================

fn to_safetensors_bytes(state_dict: &StateDict) -> Result<Vec<u8>> {
    let mut metadata: HashMap<String, String> = state_dict.metadata().clone();
    let frozen: Vec<&str> = state_dict
        .entries()
        .filter(|(_, entry)| !entry.trainable)
        .map(|(name, _)| name.as_str())
        .collect();
    metadata.insert(NON_TRAINABLE_KEY.to_string(), frozen.join(","));

    let mut views = Vec::with_capacity(state_dict.len());
    for (name, entry) in state_dict.entries() {
        let bytes: &[u8] = bytemuck::cast_slice(&entry.data.values);
        let view = TensorView::new(Dtype::F32, entry.data.shape.clone(), bytes)
            .map_err(|e| Error::serialization(format!("{name}: {e:?}")))?;
        views.push((name.clone(), view));
    }

    safetensors::serialize(views, &Some(metadata))
        .map_err(|e| Error::serialization(format!("{e:?}")))
}

fn from_safetensors_bytes(bytes: &[u8]) -> Result<StateDict> {
    let tensors =
        SafeTensors::deserialize(bytes).map_err(|e| Error::serialization(format!("{e:?}")))?;
    let (_, header) =
        SafeTensors::read_metadata(bytes).map_err(|e| Error::serialization(format!("{e:?}")))?;

    let mut metadata = header.metadata().clone().unwrap_or_default();
    let frozen: Vec<String> = metadata
        .remove(NON_TRAINABLE_KEY)
        .map(|list| {
            list.split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut state_dict = StateDict::new();
    for (name, view) in tensors.tensors() {
        if view.dtype() != Dtype::F32 {
            return Err(Error::serialization(format!(
                "tensor {name} has dtype {:?}, only F32 is supported",
                view.dtype()
            )));
        }
        let values: Vec<f32> = bytemuck::pod_collect_to_vec(view.data());
        let data = TensorData {
            shape: view.shape().to_vec(),
            values,
        };
        let trainable = !frozen.contains(&name);
        state_dict.insert_entry(name, StateDictEntry::new(data, trainable));
    }
    for (key, value) in &metadata {
        state_dict.set_metadata(key, value);
    }

    Ok(state_dict)
}

// =============================================================================
// Tests
// =============================================================================
