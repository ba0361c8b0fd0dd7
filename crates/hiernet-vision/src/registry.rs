//! Model Registry - Named Access to Every Factory

use std::fmt;
use std::str::FromStr;

use hiernet_nn::Model;
use hiernet_tensor::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::hierarchy::Level;
use crate::models::{self, InputShape};

/// Architecture family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Trunk with upsampling skip branches.
    Unet,
    /// Plain trunk without skip connections.
    Bottleneck,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Family::Unet => "unet",
            Family::Bottleneck => "bottleneck",
        })
    }
}

/// One of the eight architecture factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// [`models::coarse_unet`]
    CoarseUnet,
    /// [`models::middle_unet`]
    MiddleUnet,
    /// [`models::fine_unet`]
    FineUnet,
    /// [`models::fine_unet_single`]
    FineUnetSingle,
    /// [`models::coarse_bottleneck`]
    CoarseBottleneck,
    /// [`models::middle_bottleneck`]
    MiddleBottleneck,
    /// [`models::fine_bottleneck`]
    FineBottleneck,
    /// [`models::fine_bottleneck_single`]
    FineBottleneckSingle,
}

impl ModelKind {
    /// Every kind, U-Net family first.
    pub fn all() -> &'static [ModelKind] {
        &[
            ModelKind::CoarseUnet,
            ModelKind::MiddleUnet,
            ModelKind::FineUnet,
            ModelKind::FineUnetSingle,
            ModelKind::CoarseBottleneck,
            ModelKind::MiddleBottleneck,
            ModelKind::FineBottleneck,
            ModelKind::FineBottleneckSingle,
        ]
    }

    /// Kebab-case name, e.g. `fine-unet`.
    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::CoarseUnet => "coarse-unet",
            ModelKind::MiddleUnet => "middle-unet",
            ModelKind::FineUnet => "fine-unet",
            ModelKind::FineUnetSingle => "fine-unet-single",
            ModelKind::CoarseBottleneck => "coarse-bottleneck",
            ModelKind::MiddleBottleneck => "middle-bottleneck",
            ModelKind::FineBottleneck => "fine-bottleneck",
            ModelKind::FineBottleneckSingle => "fine-bottleneck-single",
        }
    }

    /// Architecture family.
    pub fn family(self) -> Family {
        match self {
            ModelKind::CoarseUnet
            | ModelKind::MiddleUnet
            | ModelKind::FineUnet
            | ModelKind::FineUnetSingle => Family::Unet,
            _ => Family::Bottleneck,
        }
    }

    /// Classification levels produced, in output order.
    pub fn levels(self) -> &'static [Level] {
        match self {
            ModelKind::CoarseUnet | ModelKind::CoarseBottleneck => &[Level::Coarse],
            ModelKind::MiddleUnet | ModelKind::MiddleBottleneck => &[Level::Coarse, Level::Middle],
            ModelKind::FineUnet | ModelKind::FineBottleneck => &Level::ALL,
            ModelKind::FineUnetSingle | ModelKind::FineBottleneckSingle => &[Level::Fine],
        }
    }

    /// Output names in order, feature outputs included.
    pub fn output_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::FineUnet => &[
                "coarse",
                "middle",
                "fine",
                "global_average_pooling2d",
                "global_average_pooling2d_1",
                "global_average_pooling2d_2",
            ],
            ModelKind::CoarseUnet | ModelKind::CoarseBottleneck => &["coarse"],
            ModelKind::MiddleUnet | ModelKind::MiddleBottleneck => &["coarse", "middle"],
            ModelKind::FineBottleneck => &["coarse", "middle", "fine"],
            ModelKind::FineUnetSingle | ModelKind::FineBottleneckSingle => &["fine"],
        }
    }

    /// Calls the factory.
    pub fn build(self, shape: InputShape) -> Result<Model> {
        let model = match self {
            ModelKind::CoarseUnet => models::coarse_unet(shape),
            ModelKind::MiddleUnet => models::middle_unet(shape),
            ModelKind::FineUnet => models::fine_unet(shape),
            ModelKind::FineUnetSingle => models::fine_unet_single(shape),
            ModelKind::CoarseBottleneck => models::coarse_bottleneck(shape),
            ModelKind::MiddleBottleneck => models::middle_bottleneck(shape),
            ModelKind::FineBottleneck => models::fine_bottleneck(shape),
            ModelKind::FineBottleneckSingle => models::fine_bottleneck_single(shape),
        }?;
        tracing::debug!(
            kind = %self,
            input = %shape,
            layers = model.num_layers(),
            params = model.total_parameters(),
            "built model"
        );
        Ok(model)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = Error;

    /// Accepts kebab-case or snake_case names.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        ModelKind::all()
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = ModelKind::all().iter().map(|k| k.as_str()).collect();
                Error::invalid_argument(format!(
                    "unknown model kind: {s} (expected one of {})",
                    known.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        for kind in ModelKind::all() {
            assert_eq!(kind.to_string().parse::<ModelKind>().unwrap(), *kind);
        }
        assert_eq!("fine_unet_single".parse::<ModelKind>().unwrap(), ModelKind::FineUnetSingle);
        let err = "resnet".parse::<ModelKind>().unwrap_err();
        assert!(err.to_string().contains("unknown model kind"));
    }

    #[test]
    fn test_static_outputs_match_built_models() {
        for kind in ModelKind::all() {
            let model = kind.build(InputShape::cifar10()).unwrap();
            assert_eq!(model.output_names(), kind.output_names().to_vec(), "{kind}");
            for (i, level) in kind.levels().iter().enumerate() {
                assert_eq!(model.output_names()[i], level.output_name());
            }
        }
    }

    #[test]
    fn test_families() {
        assert_eq!(ModelKind::all().len(), 8);
        let unets = ModelKind::all().iter().filter(|k| k.family() == Family::Unet).count();
        assert_eq!(unets, 4);
        assert_eq!(ModelKind::FineBottleneckSingle.family().to_string(), "bottleneck");
    }
}
