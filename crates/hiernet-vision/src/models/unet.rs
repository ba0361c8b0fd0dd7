//! U-Net Family - Trunk with Upsampling Skip Branches
//!
//! Seven conv blocks with three pooling stages form the trunk. Two
//! upsampling branches then climb back up, each concatenating the upsampled
//! map with the trunk map of matching resolution:
//!
//! ```text
//! c7 (128, H/8) --up--> [c6 (128, H/4), up] --conv2d_7--> c9 (64, H/4)
//! c9 (64, H/4)  --up--> [c4 (64, H/2),  up] --conv2d_8--> c10 (32, H/2)
//! ```
//!
//! The coarse head reads c7, the middle head c9 and the fine head c10.

use hiernet_nn::{Concatenate, GraphBuilder, Model, NodeId, UpSampling2d};
use hiernet_tensor::{Error, Result};

use super::blocks::{conv_block, head, pool_block, HeadSpec};
use super::InputShape;

// =============================================================================
// Heads
// =============================================================================

const COARSE: HeadSpec = HeadSpec {
    dense: "dense",
    dropout: "dropout_3",
    output: "coarse",
    hidden: 100,
    classes: 2,
};

const MIDDLE: HeadSpec = HeadSpec {
    dense: "dense_1",
    dropout: "dropout_4",
    output: "middle",
    hidden: 50,
    classes: 5,
};

const FINE: HeadSpec = HeadSpec {
    dense: "dense_2",
    dropout: "dropout_5",
    output: "fine",
    hidden: 50,
    classes: 10,
};

// =============================================================================
// Trunk and Branches
// =============================================================================

struct Trunk {
    input: NodeId,
    c4: NodeId,
    c6: NodeId,
    c7: NodeId,
}

fn validate(shape: InputShape) -> Result<()> {
    shape.check_non_zero()?;
    if shape.height % 8 != 0 || shape.width % 8 != 0 {
        return Err(Error::invalid_argument(format!(
            "U-Net models need height and width divisible by 8, got {shape}"
        )));
    }
    Ok(())
}

fn trunk(g: &mut GraphBuilder, shape: InputShape) -> Result<Trunk> {
    validate(shape)?;
    let input = g.input("input_1", &shape.per_sample())?;

    let x = conv_block(g, 0, shape.channels, 32, input)?;
    let x = conv_block(g, 1, 32, 32, x)?;
    let x = pool_block(g, 0, x)?;

    let x = conv_block(g, 2, 32, 64, x)?;
    let c4 = conv_block(g, 3, 64, 64, x)?;
    let x = pool_block(g, 1, c4)?;

    let x = conv_block(g, 4, 64, 128, x)?;
    let c6 = conv_block(g, 5, 128, 128, x)?;
    let x = pool_block(g, 2, c6)?;

    let c7 = conv_block(g, 6, 128, 128, x)?;

    Ok(Trunk { input, c4, c6, c7 })
}

/// up_sampling2d(c7) ++ c6 -> conv2d_7 (64 channels).
fn first_branch(g: &mut GraphBuilder, t: &Trunk) -> Result<NodeId> {
    let up = g.apply(UpSampling2d::new("up_sampling2d"), t.c7)?;
    let cat = g.concat(Concatenate::new("concatenate_1"), &[t.c6, up])?;
    conv_block(g, 7, 128 + 128, 64, cat)
}

/// up_sampling2d_1(c9) ++ c4 -> conv2d_8 (32 channels).
fn second_branch(g: &mut GraphBuilder, t: &Trunk, c9: NodeId) -> Result<NodeId> {
    let up = g.apply(UpSampling2d::new("up_sampling2d_1"), c9)?;
    let cat = g.concat(Concatenate::new("concatenate_2"), &[t.c4, up])?;
    conv_block(g, 8, 64 + 64, 32, cat)
}

// =============================================================================
// Factories
// =============================================================================

/// Trunk and coarse head. Outputs `[coarse]`.
pub fn coarse_unet(shape: InputShape) -> Result<Model> {
    let mut g = GraphBuilder::new();
    let t = trunk(&mut g, shape)?;
    let (_, coarse) = head(&mut g, COARSE, 128, t.c7)?;
    Ok(g.build(t.input, &[coarse])?.with_name("coarse_unet"))
}

/// Adds the first skip branch and the middle head. Outputs `[coarse, middle]`.
pub fn middle_unet(shape: InputShape) -> Result<Model> {
    let mut g = GraphBuilder::new();
    let t = trunk(&mut g, shape)?;
    let c9 = first_branch(&mut g, &t)?;
    let (_, coarse) = head(&mut g, COARSE, 128, t.c7)?;
    let (_, middle) = head(&mut g, MIDDLE, 64, c9)?;
    Ok(g.build(t.input, &[coarse, middle])?.with_name("middle_unet"))
}

/// Both branches and all three heads.
///
/// Outputs `[coarse, middle, fine, f1, f2, f3]`, where `f1..f3` are the
/// pooled features feeding each head (128, 64 and 32 wide).
pub fn fine_unet(shape: InputShape) -> Result<Model> {
    let mut g = GraphBuilder::new();
    let t = trunk(&mut g, shape)?;
    let c9 = first_branch(&mut g, &t)?;
    let c10 = second_branch(&mut g, &t, c9)?;
    let (f1, coarse) = head(&mut g, COARSE, 128, t.c7)?;
    let (f2, middle) = head(&mut g, MIDDLE, 64, c9)?;
    let (f3, fine) = head(&mut g, FINE, 32, c10)?;
    Ok(g
        .build(t.input, &[coarse, middle, fine, f1, f2, f3])?
        .with_name("fine_unet"))
}

/// Both branches with only the fine head. Outputs `[fine]`.
pub fn fine_unet_single(shape: InputShape) -> Result<Model> {
    let mut g = GraphBuilder::new();
    let t = trunk(&mut g, shape)?;
    let c9 = first_branch(&mut g, &t)?;
    let c10 = second_branch(&mut g, &t, c9)?;
    let (_, fine) = head(&mut g, FINE, 32, c10)?;
    Ok(g.build(t.input, &[fine])?.with_name("fine_unet_single"))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use hiernet_nn::Module;
    use hiernet_tensor::Tensor;

    #[test]
    fn test_output_shapes() {
        let shape = InputShape::cifar10();
        assert_eq!(coarse_unet(shape).unwrap().output_shapes(4), vec![vec![4, 2]]);
        assert_eq!(
            middle_unet(shape).unwrap().output_shapes(4),
            vec![vec![4, 2], vec![4, 5]]
        );
        assert_eq!(
            fine_unet(shape).unwrap().output_shapes(4),
            vec![
                vec![4, 2],
                vec![4, 5],
                vec![4, 10],
                vec![4, 128],
                vec![4, 64],
                vec![4, 32]
            ]
        );
        assert_eq!(fine_unet_single(shape).unwrap().output_shapes(4), vec![vec![4, 10]]);
    }

    #[test]
    fn test_layer_names() {
        let model = fine_unet(InputShape::cifar10()).unwrap();
        assert_eq!(model.input_name(), "input_1");
        for name in [
            "conv2d",
            "batch_normalization_6",
            "activation_8",
            "max_pooling2d_2",
            "dropout_5",
            "up_sampling2d",
            "up_sampling2d_1",
            "concatenate_1",
            "concatenate_2",
            "conv2d_8",
            "dense",
            "dense_1",
            "dense_2",
        ] {
            assert!(model.layer(name).is_some(), "missing {name}");
        }
        assert_eq!(
            model.output_names(),
            vec![
                "coarse",
                "middle",
                "fine",
                "global_average_pooling2d",
                "global_average_pooling2d_1",
                "global_average_pooling2d_2"
            ]
        );
    }

    #[test]
    fn test_parameter_counts_match_keras() {
        let model = coarse_unet(InputShape::cifar10()).unwrap();
        assert_eq!(model.layer("conv2d").unwrap().num_parameters(), 3 * 32 * 9 + 32);
        assert_eq!(model.layer("conv2d_1").unwrap().num_parameters(), 9_248);
        assert_eq!(model.layer("batch_normalization").unwrap().num_parameters(), 64);
        assert_eq!(model.layer("dense").unwrap().num_parameters(), 128 * 100 + 100);

        let middle = middle_unet(InputShape::cifar10()).unwrap();
        assert_eq!(middle.layer("conv2d_7").unwrap().num_parameters(), 256 * 64 * 9 + 64);
    }

    #[test]
    fn test_coarse_has_no_branches() {
        let model = coarse_unet(InputShape::cifar10()).unwrap();
        assert!(model.layer("up_sampling2d").is_none());
        assert!(model.layer("conv2d_7").is_none());
        assert_eq!(model.name(), "coarse_unet");
    }

    #[test]
    fn test_rejects_misaligned_input() {
        assert!(coarse_unet(InputShape::new(30, 32, 3)).is_err());
        assert!(fine_unet(InputShape::new(32, 0, 3)).is_err());
        assert!(middle_unet(InputShape::new(16, 24, 1)).is_ok());
    }

    #[test]
    fn test_forward_small_input() {
        let model = fine_unet(InputShape::new(8, 8, 3)).unwrap();
        let x = hiernet_tensor::randn(&[2, 3, 8, 8]);
        let outs = model.forward(&x).unwrap();
        assert_eq!(outs.len(), 6);
        for probs in &outs[..3] {
            for row in probs.as_slice().chunks(probs.shape()[1]) {
                assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-4);
            }
        }
        assert!(model.forward(&Tensor::zeros(&[2, 1, 8, 8])).is_err());
    }

    #[test]
    fn test_forward_rejects_other_input_size() {
        let model = coarse_unet(InputShape::cifar10()).unwrap();
        for shape in [[1, 3, 16, 16], [1, 3, 64, 48]] {
            let err = model.forward(&hiernet_tensor::randn(&shape)).unwrap_err();
            assert!(matches!(err, Error::ShapeMismatch { .. }), "{shape:?}");
        }
    }
}
