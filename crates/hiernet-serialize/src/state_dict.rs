//! State Dictionary - Model parameter storage
//!
//! Provides `StateDict` for storing and retrieving model parameters by their
//! qualified `"{layer}.{slot}"` names, and for applying them back onto a
//! model built by any factory that shares those layer names.

use std::collections::{BTreeMap, HashMap};

use hiernet_nn::Model;
use hiernet_tensor::{Error, Result, Tensor};
use serde::{Deserialize, Serialize};

// =============================================================================
// TensorData
// =============================================================================

/// Serializable tensor data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorData {
    /// Shape of the tensor.
    pub shape: Vec<usize>,
    /// Flattened f32 values.
    pub values: Vec<f32>,
}

impl TensorData {
    /// Create `TensorData` from a Tensor.
    #[must_use]
    pub fn from_tensor(tensor: &Tensor) -> Self {
        Self {
            shape: tensor.shape().to_vec(),
            values: tensor.to_vec(),
        }
    }

    /// Convert `TensorData` back to a Tensor.
    pub fn to_tensor(&self) -> Result<Tensor> {
        Tensor::from_vec(self.values.clone(), &self.shape)
    }

    /// Get the number of elements.
    #[must_use]
    pub fn numel(&self) -> usize {
        self.values.len()
    }

    /// Get the shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
}

// =============================================================================
// StateDictEntry
// =============================================================================

/// An entry in the state dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateDictEntry {
    /// The tensor data.
    pub data: TensorData,
    /// Whether this parameter is trainable (false for running statistics).
    pub trainable: bool,
    /// Optional metadata.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl StateDictEntry {
    /// Create a new entry from tensor data.
    #[must_use]
    pub fn new(data: TensorData, trainable: bool) -> Self {
        Self {
            data,
            trainable,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata to the entry.
    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

// =============================================================================
// LoadReport
// =============================================================================

/// Outcome of applying a state dictionary to a model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Parameters that were overwritten.
    pub loaded: Vec<String>,
    /// Model parameters with no entry in the dictionary.
    pub missing: Vec<String>,
    /// Dictionary entries the model has no parameter for.
    pub unexpected: Vec<String>,
}

impl LoadReport {
    /// True when every model parameter was loaded and nothing was left over.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

// =============================================================================
// StateDict
// =============================================================================

/// State dictionary for storing model parameters.
///
/// Keys are kept sorted, so every encoding of the same dictionary is
/// byte-for-byte stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDict {
    entries: BTreeMap<String, StateDictEntry>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl StateDict {
    /// Create an empty state dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot every parameter of a model.
    #[must_use]
    pub fn from_model(model: &Model) -> Self {
        let mut state_dict = Self::new();
        for (name, param) in model.named_parameters() {
            let entry = StateDictEntry::new(TensorData::from_tensor(&param.data()), param.is_trainable());
            state_dict.entries.insert(name, entry);
        }
        state_dict.set_metadata("model", model.name());
        state_dict.set_metadata("outputs", &model.output_names().join(","));
        state_dict
    }

    /// Copy matching entries into a model.
    ///
    /// A shape mismatch is always an error. Missing keys are an error when
    /// `strict` and are skipped otherwise. Unexpected keys are never loaded;
    /// they are reported and logged.
    pub fn apply_to(&self, model: &Model, strict: bool) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        let model_params = model.named_parameters();

        for (name, _) in &model_params {
            if !self.entries.contains_key(name) {
                report.missing.push(name.clone());
            }
        }
        report.unexpected = self
            .entries
            .keys()
            .filter(|key| !model_params.iter().any(|(name, _)| name == *key))
            .cloned()
            .collect();

        if strict && !report.missing.is_empty() {
            return Err(Error::invalid_argument(format!(
                "state dict does not cover model {}: missing {:?}",
                model.name(),
                report.missing
            )));
        }

        // validate every shape before touching the model
        let mut staged = Vec::new();
        for (name, param) in &model_params {
            let Some(entry) = self.entries.get(name) else {
                continue;
            };
            if entry.data.shape != param.shape() {
                return Err(Error::invalid_argument(format!(
                    "parameter {name}: expected shape {:?}, got {:?}",
                    param.shape(),
                    entry.data.shape
                )));
            }
            staged.push((name, param, entry.data.to_tensor()?));
        }
        for (name, param, tensor) in staged {
            param.load(tensor)?;
            report.loaded.push(name.clone());
        }

        for key in &report.missing {
            tracing::warn!(key = %key, "no weights for parameter, keeping initial values");
        }
        for key in &report.unexpected {
            tracing::warn!(key = %key, "skipping weights with no matching parameter");
        }
        tracing::debug!(
            model = model.name(),
            loaded = report.loaded.len(),
            missing = report.missing.len(),
            unexpected = report.unexpected.len(),
            "applied state dict"
        );
        Ok(report)
    }

    /// Insert a trainable tensor into the state dictionary.
    pub fn insert(&mut self, name: String, data: TensorData) {
        let entry = StateDictEntry::new(data, true);
        self.entries.insert(name, entry);
    }

    /// Insert an entry into the state dictionary.
    pub fn insert_entry(&mut self, name: String, entry: StateDictEntry) {
        self.entries.insert(name, entry);
    }

    /// Get an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StateDictEntry> {
        self.entries.get(name)
    }

    /// Check if the state dictionary contains a key.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Get the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the state dictionary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get all keys, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Get all entries, sorted by key.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &StateDictEntry)> {
        self.entries.iter()
    }

    /// Remove an entry.
    pub fn remove(&mut self, name: &str) -> Option<StateDictEntry> {
        self.entries.remove(name)
    }

    /// Merge another state dictionary into this one.
    pub fn merge(&mut self, other: StateDict) {
        self.entries.extend(other.entries);
        self.metadata.extend(other.metadata);
    }

    /// Set metadata on the state dictionary.
    pub fn set_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Get metadata from the state dictionary.
    #[must_use]
    pub fn get_metadata(&self, key: &str) -> Option<&String> {
        self.metadata.get(key)
    }

    /// All dictionary-level metadata.
    #[must_use]
    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    /// Get total number of parameters (elements across all tensors).
    #[must_use]
    pub fn total_params(&self) -> usize {
        self.entries.values().map(|e| e.data.numel()).sum()
    }

    /// Get total size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.total_params() * std::mem::size_of::<f32>()
    }

    /// Print a summary of the state dictionary.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!("StateDict with {} entries:", self.len()));
        lines.push(format!("  Total parameters: {}", self.total_params()));
        lines.push(format!("  Size: {} bytes", self.size_bytes()));
        lines.push("  Entries:".to_string());

        for (name, entry) in &self.entries {
            lines.push(format!(
                "    {} - shape: {:?}, numel: {}{}",
                name,
                entry.data.shape,
                entry.data.numel(),
                if entry.trainable { "" } else { " (non-trainable)" }
            ));
        }

        lines.join("\n")
    }
}

// =============================================================================
// Tests
// =============================================================================
