//! Bottleneck Family - Plain Trunk Without Skip Connections
//!
//! The trunk widens faster than the U-Net one (32, 64, 64, 128, 128, 256,
//! 256) and the heads tap it at three depths: after the second pooling stage
//! (coarse), after the third (middle) and after the last conv block (fine).

use hiernet_nn::{GraphBuilder, Model, NodeId};
use hiernet_tensor::{Error, Result};

use super::blocks::{conv_block, head, pool_block, HeadSpec};
use super::InputShape;

const COARSE: HeadSpec = HeadSpec {
    dense: "dense_2",
    dropout: "dropout_4",
    output: "coarse",
    hidden: 50,
    classes: 2,
};

const MIDDLE: HeadSpec = HeadSpec {
    dense: "dense_1",
    dropout: "dropout_5",
    output: "middle",
    hidden: 50,
    classes: 5,
};

const FINE: HeadSpec = HeadSpec {
    dense: "dense",
    dropout: "dropout_3",
    output: "fine",
    hidden: 100,
    classes: 10,
};

/// How far down the trunk a factory builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Depth {
    /// Through `dropout_1` (d2, 128 channels at H/4).
    Second,
    /// Through `dropout_2` (d3, 256 channels at H/8).
    Third,
    /// Through `conv2d_6` (c7, 256 channels at H/8).
    Full,
}

impl Depth {
    /// Smallest height and width that survive every pooling stage built.
    fn min_side(self) -> usize {
        match self {
            Depth::Second => 4,
            Depth::Third | Depth::Full => 8,
        }
    }
}

struct Trunk {
    input: NodeId,
    d2: NodeId,
    d3: Option<NodeId>,
    c7: Option<NodeId>,
}

fn validate(shape: InputShape, depth: Depth) -> Result<()> {
    shape.check_non_zero()?;
    let min = depth.min_side();
    if shape.height < min || shape.width < min {
        return Err(Error::invalid_argument(format!(
            "this bottleneck model needs height and width of at least {min}, got {shape}"
        )));
    }
    Ok(())
}

fn trunk(g: &mut GraphBuilder, shape: InputShape, depth: Depth) -> Result<Trunk> {
    validate(shape, depth)?;
    let input = g.input("input_1", &shape.per_sample())?;

    let x = conv_block(g, 0, shape.channels, 32, input)?;
    let x = conv_block(g, 1, 32, 64, x)?;
    let x = pool_block(g, 0, x)?;

    let x = conv_block(g, 2, 64, 64, x)?;
    let x = conv_block(g, 3, 64, 128, x)?;
    let d2 = pool_block(g, 1, x)?;

    let mut trunk = Trunk {
        input,
        d2,
        d3: None,
        c7: None,
    };
    if depth >= Depth::Third {
        let x = conv_block(g, 4, 128, 128, d2)?;
        let x = conv_block(g, 5, 128, 256, x)?;
        let d3 = pool_block(g, 2, x)?;
        trunk.d3 = Some(d3);
        if depth == Depth::Full {
            trunk.c7 = Some(conv_block(g, 6, 256, 256, d3)?);
        }
    }
    Ok(trunk)
}

fn tap(node: Option<NodeId>, what: &str) -> Result<NodeId> {
    node.ok_or_else(|| Error::internal(format!("bottleneck trunk was not built through {what}")))
}

/// Trunk through the second pooling stage with the coarse head.
/// Outputs `[coarse]`.
pub fn coarse_bottleneck(shape: InputShape) -> Result<Model> {
    let mut g = GraphBuilder::new();
    let t = trunk(&mut g, shape, Depth::Second)?;
    let (_, coarse) = head(&mut g, COARSE, 128, t.d2)?;
    Ok(g.build(t.input, &[coarse])?.with_name("coarse_bottleneck"))
}

/// Trunk through the third pooling stage. Outputs `[coarse, middle]`.
pub fn middle_bottleneck(shape: InputShape) -> Result<Model> {
    let mut g = GraphBuilder::new();
    let t = trunk(&mut g, shape, Depth::Third)?;
    let (_, coarse) = head(&mut g, COARSE, 128, t.d2)?;
    let (_, middle) = head(&mut g, MIDDLE, 256, tap(t.d3, "dropout_2")?)?;
    Ok(g
        .build(t.input, &[coarse, middle])?
        .with_name("middle_bottleneck"))
}

/// Full trunk with all three heads. Outputs `[coarse, middle, fine]`.
pub fn fine_bottleneck(shape: InputShape) -> Result<Model> {
    let mut g = GraphBuilder::new();
    let t = trunk(&mut g, shape, Depth::Full)?;
    let (_, coarse) = head(&mut g, COARSE, 128, t.d2)?;
    let (_, middle) = head(&mut g, MIDDLE, 256, tap(t.d3, "dropout_2")?)?;
    let (_, fine) = head(&mut g, FINE, 256, tap(t.c7, "conv2d_6")?)?;
    Ok(g
        .build(t.input, &[coarse, middle, fine])?
        .with_name("fine_bottleneck"))
}

/// Full trunk with only the fine head. Outputs `[fine]`.
pub fn fine_bottleneck_single(shape: InputShape) -> Result<Model> {
    let mut g = GraphBuilder::new();
    let t = trunk(&mut g, shape, Depth::Full)?;
    let (_, fine) = head(&mut g, FINE, 256, tap(t.c7, "conv2d_6")?)?;
    Ok(g.build(t.input, &[fine])?.with_name("fine_bottleneck_single"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hiernet_nn::Module;

    #[test]
    fn test_output_shapes() {
        let shape = InputShape::cifar10();
        assert_eq!(coarse_bottleneck(shape).unwrap().output_shapes(3), vec![vec![3, 2]]);
        assert_eq!(
            middle_bottleneck(shape).unwrap().output_shapes(3),
            vec![vec![3, 2], vec![3, 5]]
        );
        assert_eq!(
            fine_bottleneck(shape).unwrap().output_shapes(3),
            vec![vec![3, 2], vec![3, 5], vec![3, 10]]
        );
        assert_eq!(
            fine_bottleneck_single(shape).unwrap().output_shapes(3),
            vec![vec![3, 10]]
        );
    }

    #[test]
    fn test_head_taps_and_names() {
        let model = fine_bottleneck(InputShape::cifar10()).unwrap();
        assert_eq!(model.layer("dense_2").unwrap().num_parameters(), 128 * 50 + 50);
        assert_eq!(model.layer("dense_1").unwrap().num_parameters(), 256 * 50 + 50);
        assert_eq!(model.layer("dense").unwrap().num_parameters(), 256 * 100 + 100);
        assert_eq!(model.layer("conv2d_1").unwrap().num_parameters(), 32 * 64 * 9 + 64);
        assert_eq!(model.output_names(), vec!["coarse", "middle", "fine"]);

        let coarse = coarse_bottleneck(InputShape::cifar10()).unwrap();
        assert!(coarse.layer("conv2d_4").is_none());
        assert!(coarse.layer("dropout_4").is_some());

        let middle = middle_bottleneck(InputShape::cifar10()).unwrap();
        assert!(middle.layer("conv2d_6").is_none());
        assert!(middle.layer("max_pooling2d_2").is_some());
    }

    #[test]
    fn test_input_validation() {
        assert!(coarse_bottleneck(InputShape::new(4, 32, 3)).is_ok());
        assert!(coarse_bottleneck(InputShape::new(3, 32, 3)).is_err());
        assert!(middle_bottleneck(InputShape::new(4, 32, 3)).is_err());
        assert!(fine_bottleneck(InputShape::new(32, 7, 3)).is_err());
        assert!(fine_bottleneck(InputShape::new(32, 32, 0)).is_err());
        assert!(fine_bottleneck_single(InputShape::new(9, 13, 1)).is_ok());
    }

    #[test]
    fn test_forward_is_deterministic_in_eval() {
        let model = middle_bottleneck(InputShape::new(8, 8, 3)).unwrap();
        assert!(!model.is_training());
        let x = hiernet_tensor::randn(&[2, 3, 8, 8]);
        let a = model.forward(&x).unwrap();
        let b = model.forward(&x).unwrap();
        assert_eq!(a[1].to_vec(), b[1].to_vec());
        assert_eq!(a[1].shape(), &[2, 5]);
    }

    #[test]
    fn test_coarse_runs_on_4x4() {
        let model = coarse_bottleneck(InputShape::new(4, 4, 3)).unwrap();
        let out = model.forward(&hiernet_tensor::randn(&[1, 3, 4, 4])).unwrap();
        assert_eq!(out[0].shape(), &[1, 2]);
    }

    #[test]
    fn test_forward_rejects_other_input_size() {
        let model = fine_bottleneck(InputShape::cifar10()).unwrap();
        let err = model.forward(&hiernet_tensor::randn(&[1, 3, 16, 16])).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }
}
