//! Prediction Decoding
//!
//! Turns the probability outputs of a model into per-sample class picks.
//! Feature outputs are ignored.

use std::fmt;

use hiernet_nn::Model;
use hiernet_tensor::{Error, Result, Tensor};
use serde::Serialize;

use crate::hierarchy::{LabelHierarchy, Level};

/// Most likely class at one level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelPrediction {
    /// Which head produced it.
    pub level: Level,
    /// Class index.
    pub class: usize,
    /// Class name from the hierarchy.
    pub label: String,
    /// Probability of the chosen class.
    pub confidence: f32,
}

/// Decoded predictions for one sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchicalPrediction {
    /// Coarse pick, if the model has a coarse head.
    pub coarse: Option<LevelPrediction>,
    /// Middle pick, if the model has a middle head.
    pub middle: Option<LevelPrediction>,
    /// Fine pick, if the model has a fine head.
    pub fine: Option<LevelPrediction>,
    /// Whether the picks lie on one path of the hierarchy.
    pub consistent: bool,
}

impl HierarchicalPrediction {
    /// Decodes a batch of model outputs.
    ///
    /// `outputs` must be the result of `model.forward`, in the same order as
    /// `model.output_names()`.
    pub fn decode(
        model: &Model,
        outputs: &[Tensor],
        hierarchy: &LabelHierarchy,
    ) -> Result<Vec<HierarchicalPrediction>> {
        let names = model.output_names();
        if names.len() != outputs.len() {
            return Err(Error::invalid_argument(format!(
                "model {} has {} outputs, got {} tensors",
                model.name(),
                names.len(),
                outputs.len()
            )));
        }

        let mut heads: Vec<(Level, &Tensor)> = Vec::new();
        for (name, tensor) in names.iter().zip(outputs) {
            let Ok(level) = name.parse::<Level>() else {
                continue;
            };
            let classes = hierarchy.num_classes(level);
            if tensor.ndim() != 2 || tensor.shape()[1] != classes {
                return Err(Error::shape_mismatch(
                    &[tensor.shape().first().copied().unwrap_or(0), classes],
                    tensor.shape(),
                ));
            }
            heads.push((level, tensor));
        }
        if heads.is_empty() {
            return Err(Error::invalid_argument(format!(
                "model {} has no classification head",
                model.name()
            )));
        }

        let batch = heads[0].1.shape()[0];
        let mut decoded = vec![
            HierarchicalPrediction {
                coarse: None,
                middle: None,
                fine: None,
                consistent: true,
            };
            batch
        ];
        for (level, probs) in heads {
            if probs.shape()[0] != batch {
                return Err(Error::invalid_argument(format!(
                    "head {level} has batch {}, expected {batch}",
                    probs.shape()[0]
                )));
            }
            let picks = probs.argmax_rows()?;
            let width = probs.shape()[1];
            for (row, (&class, sample)) in picks.iter().zip(decoded.iter_mut()).enumerate() {
                let pick = LevelPrediction {
                    level,
                    class,
                    label: hierarchy
                        .class_name(level, class)
                        .unwrap_or_default()
                        .to_string(),
                    confidence: probs.as_slice()[row * width + class],
                };
                match level {
                    Level::Coarse => sample.coarse = Some(pick),
                    Level::Middle => sample.middle = Some(pick),
                    Level::Fine => sample.fine = Some(pick),
                }
            }
        }

        for sample in &mut decoded {
            sample.consistent = hierarchy.is_consistent(
                sample.coarse.as_ref().map(|p| p.class),
                sample.middle.as_ref().map(|p| p.class),
                sample.fine.as_ref().map(|p| p.class),
            );
        }
        Ok(decoded)
    }

    /// Picks from coarse to fine, skipping absent heads.
    pub fn levels(&self) -> impl Iterator<Item = &LevelPrediction> {
        [&self.coarse, &self.middle, &self.fine]
            .into_iter()
            .filter_map(Option::as_ref)
    }
}

impl fmt::Display for HierarchicalPrediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .levels()
            .map(|p| format!("{}={} ({:.3})", p.level, p.label, p.confidence))
            .collect();
        write!(f, "{}", parts.join("  "))?;
        if !self.consistent {
            write!(f, "  [inconsistent]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fine_unet, middle_bottleneck, InputShape};

    #[test]
    fn test_decode_real_model() {
        let model = fine_unet(InputShape::new(8, 8, 3)).unwrap();
        let outputs = model.forward(&hiernet_tensor::randn(&[3, 3, 8, 8])).unwrap();
        let preds =
            HierarchicalPrediction::decode(&model, &outputs, &LabelHierarchy::cifar10()).unwrap();
        assert_eq!(preds.len(), 3);
        for p in &preds {
            assert_eq!(p.levels().count(), 3);
            let fine = p.fine.as_ref().unwrap();
            assert!(fine.class < 10);
            assert!(fine.confidence > 0.0 && fine.confidence <= 1.0);
        }
    }

    #[test]
    fn test_consistency_flag() {
        let model = middle_bottleneck(InputShape::new(8, 8, 3)).unwrap();
        // vehicle + pet is off-path; animal + pet is on it
        let coarse = Tensor::from_vec(vec![0.9, 0.1, 0.2, 0.8], &[2, 2]).unwrap();
        let middle = Tensor::from_vec(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            &[2, 5],
        )
        .unwrap();
        let preds = HierarchicalPrediction::decode(
            &model,
            &[coarse, middle],
            &LabelHierarchy::cifar10(),
        )
        .unwrap();
        assert!(!preds[0].consistent);
        assert!(preds[1].consistent);
        assert_eq!(preds[1].middle.as_ref().unwrap().label, "pet");
        assert!(preds[0].to_string().contains("[inconsistent]"));
    }

    #[test]
    fn test_decode_rejects_wrong_widths() {
        let model = middle_bottleneck(InputShape::new(8, 8, 3)).unwrap();
        let coarse = Tensor::ones(&[1, 2]);
        let bad = Tensor::ones(&[1, 4]);
        let h = LabelHierarchy::cifar10();
        assert!(HierarchicalPrediction::decode(&model, &[coarse.clone(), bad], &h).is_err());
        assert!(HierarchicalPrediction::decode(&model, &[coarse], &h).is_err());
    }
}
