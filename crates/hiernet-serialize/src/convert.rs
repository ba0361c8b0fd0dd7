//! Keras Conversion Utilities
//!
//! Keras checkpoints name weights `"{layer}/{variable}"` (optionally with a
//! repeated layer scope and a `:0` suffix) and store kernels channels-last:
//! conv kernels as HWIO, dense kernels as (in, out). Native state dicts use
//! `"{layer}.{slot}"`, OIHW conv kernels and (out, in) dense kernels.

use hiernet_tensor::{Error, Result};

use crate::state_dict::{StateDict, StateDictEntry, TensorData};

// =============================================================================
// Key Mapping
// =============================================================================

/// Keras variable name to native slot name, with the trainable flag.
const VARIABLES: &[(&str, &str, bool)] = &[
    ("kernel", "weight", true),
    ("bias", "bias", true),
    ("gamma", "weight", true),
    ("beta", "bias", true),
    ("moving_mean", "running_mean", false),
    ("moving_variance", "running_var", false),
];

/// Convert a Keras weight key to a native key.
///
/// Accepts `conv2d/kernel`, `conv2d/kernel:0` and `conv2d/conv2d/kernel:0`.
/// Returns `None` for variables with no native counterpart.
#[must_use]
pub fn from_keras_key(key: &str) -> Option<String> {
    let key = key.strip_suffix(":0").unwrap_or(key);
    let mut parts = key.split('/');
    let layer = parts.next().filter(|l| !l.is_empty())?;
    let variable = parts.last()?;
    let (_, slot, _) = VARIABLES.iter().find(|(k, _, _)| *k == variable)?;
    Some(format!("{layer}.{slot}"))
}

/// Convert a native key to a Keras key.
///
/// `weight` is ambiguous on its own: a rank-1 weight is a batch-norm gamma,
/// anything else is a kernel.
#[must_use]
pub fn to_keras_key(key: &str, rank: usize) -> Option<String> {
    let (layer, slot) = key.rsplit_once('.')?;
    let variable = match (slot, rank) {
        ("weight", 1) => "gamma",
        ("weight", _) => "kernel",
        ("bias", _) => "bias",
        ("running_mean", _) => "moving_mean",
        ("running_var", _) => "moving_variance",
        _ => return None,
    };
    Some(format!("{layer}/{variable}"))
}

fn keras_trainable(key: &str) -> bool {
    let key = key.strip_suffix(":0").unwrap_or(key);
    let variable = key.rsplit('/').next().unwrap_or(key);
    VARIABLES
        .iter()
        .find(|(k, _, _)| *k == variable)
        .map_or(true, |(_, _, trainable)| *trainable)
}

// =============================================================================
// Layout Conversion
// =============================================================================

fn expect_shape(data: &TensorData, rank: usize, op: &str) -> Result<()> {
    if data.shape.len() != rank || data.values.len() != data.shape.iter().product::<usize>() {
        return Err(Error::invalid_argument(format!(
            "{op}: expected a rank-{rank} tensor, got shape {:?}",
            data.shape
        )));
    }
    Ok(())
}

/// Permute a conv kernel from (kh, kw, in, out) to (out, in, kh, kw).
pub fn hwio_to_oihw(data: &TensorData) -> Result<TensorData> {
    expect_shape(data, 4, "hwio_to_oihw")?;
    let (kh, kw, ci, co) = (data.shape[0], data.shape[1], data.shape[2], data.shape[3]);
    let mut values = vec![0.0f32; data.values.len()];
    for h in 0..kh {
        for w in 0..kw {
            for i in 0..ci {
                for o in 0..co {
                    values[((o * ci + i) * kh + h) * kw + w] =
                        data.values[((h * kw + w) * ci + i) * co + o];
                }
            }
        }
    }
    Ok(TensorData {
        shape: vec![co, ci, kh, kw],
        values,
    })
}

/// Permute a conv kernel from (out, in, kh, kw) to (kh, kw, in, out).
pub fn oihw_to_hwio(data: &TensorData) -> Result<TensorData> {
    expect_shape(data, 4, "oihw_to_hwio")?;
    let (co, ci, kh, kw) = (data.shape[0], data.shape[1], data.shape[2], data.shape[3]);
    let mut values = vec![0.0f32; data.values.len()];
    for o in 0..co {
        for i in 0..ci {
            for h in 0..kh {
                for w in 0..kw {
                    values[((h * kw + w) * ci + i) * co + o] =
                        data.values[((o * ci + i) * kh + h) * kw + w];
                }
            }
        }
    }
    Ok(TensorData {
        shape: vec![kh, kw, ci, co],
        values,
    })
}

/// Transpose a 2-D matrix, used for dense kernels.
pub fn transpose_2d(data: &TensorData) -> Result<TensorData> {
    expect_shape(data, 2, "transpose_2d")?;
    let (rows, cols) = (data.shape[0], data.shape[1]);
    let mut values = vec![0.0f32; data.values.len()];
    for r in 0..rows {
        for c in 0..cols {
            values[c * rows + r] = data.values[r * cols + c];
        }
    }
    Ok(TensorData {
        shape: vec![cols, rows],
        values,
    })
}

// =============================================================================
// State Dict Conversion
// =============================================================================

/// Convert a Keras-keyed state dictionary to native keys and layouts.
///
/// Entries with no native counterpart are dropped with a warning.
pub fn convert_from_keras(keras: &StateDict) -> Result<StateDict> {
    let mut native = StateDict::new();
    for (key, entry) in keras.entries() {
        let Some(name) = from_keras_key(key) else {
            tracing::warn!(key = %key, "dropping Keras variable with no native slot");
            continue;
        };
        let data = match entry.data.shape.len() {
            4 => hwio_to_oihw(&entry.data)?,
            2 => transpose_2d(&entry.data)?,
            _ => entry.data.clone(),
        };
        native.insert_entry(name, StateDictEntry::new(data, keras_trainable(key)));
    }
    for (k, v) in keras.metadata() {
        native.set_metadata(k, v);
    }
    Ok(native)
}

/// Convert a native state dictionary to Keras keys and layouts.
pub fn convert_to_keras(native: &StateDict) -> Result<StateDict> {
    let mut keras = StateDict::new();
    for (key, entry) in native.entries() {
        let rank = entry.data.shape.len();
        let name = to_keras_key(key, rank)
            .ok_or_else(|| Error::invalid_argument(format!("no Keras name for {key}")))?;
        let data = match rank {
            4 => oihw_to_hwio(&entry.data)?,
            2 => transpose_2d(&entry.data)?,
            _ => entry.data.clone(),
        };
        keras.insert_entry(name, StateDictEntry::new(data, entry.trainable));
    }
    for (k, v) in native.metadata() {
        keras.set_metadata(k, v);
    }
    Ok(keras)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_keras_key() {
        assert_eq!(from_keras_key("conv2d/kernel").as_deref(), Some("conv2d.weight"));
        assert_eq!(from_keras_key("conv2d_3/bias:0").as_deref(), Some("conv2d_3.bias"));
        assert_eq!(
            from_keras_key("batch_normalization/batch_normalization/moving_variance:0").as_deref(),
            Some("batch_normalization.running_var")
        );
        assert_eq!(
            from_keras_key("batch_normalization_2/gamma").as_deref(),
            Some("batch_normalization_2.weight")
        );
        assert_eq!(from_keras_key("optimizer/iter"), None);
        assert_eq!(from_keras_key("/kernel"), None);
    }

    #[test]
    fn test_to_keras_key() {
        assert_eq!(to_keras_key("conv2d.weight", 4).as_deref(), Some("conv2d/kernel"));
        assert_eq!(to_keras_key("dense.weight", 2).as_deref(), Some("dense/kernel"));
        assert_eq!(
            to_keras_key("batch_normalization.weight", 1).as_deref(),
            Some("batch_normalization/gamma")
        );
        assert_eq!(
            to_keras_key("batch_normalization.running_mean", 1).as_deref(),
            Some("batch_normalization/moving_mean")
        );
        assert_eq!(to_keras_key("noslot", 1), None);
    }

    #[test]
    fn test_hwio_to_oihw_moves_elements() {
        // kh=1, kw=2, in=2, out=3; value encodes (w, i, o)
        let mut values = Vec::new();
        for w in 0..2 {
            for i in 0..2 {
                for o in 0..3 {
                    values.push((w * 100 + i * 10 + o) as f32);
                }
            }
        }
        let hwio = TensorData { shape: vec![1, 2, 2, 3], values };
        let oihw = hwio_to_oihw(&hwio).unwrap();
        assert_eq!(oihw.shape, vec![3, 2, 1, 2]);
        // element (o=2, i=1, h=0, w=1)
        let idx = ((2 * 2 + 1) * 1) * 2 + 1;
        assert_eq!(oihw.values[idx], 112.0);
        assert_eq!(oihw_to_hwio(&oihw).unwrap(), hwio);
    }

    #[test]
    fn test_transpose_2d() {
        let m = TensorData { shape: vec![2, 3], values: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0] };
        let t = transpose_2d(&m).unwrap();
        assert_eq!(t.shape, vec![3, 2]);
        assert_eq!(t.values, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert!(transpose_2d(&TensorData { shape: vec![6], values: vec![0.0; 6] }).is_err());
    }

    #[test]
    fn test_convert_from_keras_dict() {
        let mut keras = StateDict::new();
        keras.insert(
            "dense/kernel:0".to_string(),
            TensorData { shape: vec![4, 2], values: (0..8).map(|v| v as f32).collect() },
        );
        keras.insert(
            "batch_normalization/moving_mean:0".to_string(),
            TensorData { shape: vec![3], values: vec![0.0; 3] },
        );
        keras.insert(
            "optimizer/iter".to_string(),
            TensorData { shape: vec![], values: vec![1.0] },
        );

        let native = convert_from_keras(&keras).unwrap();
        assert_eq!(native.len(), 2);
        assert_eq!(native.get("dense.weight").unwrap().data.shape, vec![2, 4]);
        assert!(!native.get("batch_normalization.running_mean").unwrap().trainable);

        let back = convert_to_keras(&native).unwrap();
        assert_eq!(back.get("dense/kernel").unwrap().data.shape, vec![4, 2]);
        assert_eq!(
            back.get("dense/kernel").unwrap().data.values,
            keras.get("dense/kernel:0").unwrap().data.values
        );
    }
}
