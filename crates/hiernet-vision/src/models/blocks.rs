//! Building blocks shared by both families.

use hiernet_nn::{
    Activation, BatchNorm2d, Conv2d, Dropout, GlobalAvgPool2d, GraphBuilder, Linear, MaxPool2d,
    NodeId, ReLU,
};
use hiernet_tensor::Result;

/// Dropout rate used after every pooling stage and every hidden dense layer.
pub const DROPOUT_RATE: f32 = 0.3;

/// Keras default naming: `base`, `base_1`, `base_2`, ...
pub fn keras_name(base: &str, index: usize) -> String {
    if index == 0 {
        base.to_string()
    } else {
        format!("{base}_{index}")
    }
}

/// Conv(3x3, same) -> BatchNorm -> ReLU, named `conv2d_{i}`,
/// `batch_normalization_{i}` and `activation_{i}`.
pub fn conv_block(
    g: &mut GraphBuilder,
    index: usize,
    in_channels: usize,
    out_channels: usize,
    from: NodeId,
) -> Result<NodeId> {
    let x = g.apply(
        Conv2d::new(keras_name("conv2d", index), in_channels, out_channels, 3),
        from,
    )?;
    let x = g.apply(
        BatchNorm2d::new(keras_name("batch_normalization", index), out_channels),
        x,
    )?;
    g.apply(ReLU::new(keras_name("activation", index)), x)
}

/// MaxPool(2x2) -> Dropout, named `max_pooling2d_{i}` and `dropout_{i}`.
pub fn pool_block(g: &mut GraphBuilder, index: usize, from: NodeId) -> Result<NodeId> {
    let x = g.apply(MaxPool2d::new(keras_name("max_pooling2d", index), 2), from)?;
    g.apply(Dropout::new(keras_name("dropout", index), DROPOUT_RATE), x)
}

/// Names and widths of one classification head.
#[derive(Debug, Clone, Copy)]
pub struct HeadSpec {
    /// Hidden dense layer name.
    pub dense: &'static str,
    /// Dropout layer name.
    pub dropout: &'static str,
    /// Output layer name, also the model output name.
    pub output: &'static str,
    /// Hidden width.
    pub hidden: usize,
    /// Number of classes.
    pub classes: usize,
}

/// GAP -> Dense(relu) -> Dropout -> Dense(softmax).
///
/// Returns the pooled feature node and the probability node.
pub fn head(
    g: &mut GraphBuilder,
    spec: HeadSpec,
    channels: usize,
    from: NodeId,
) -> Result<(NodeId, NodeId)> {
    let features = g.apply(GlobalAvgPool2d::new(), from)?;
    let x = g.apply(
        Linear::with_activation(spec.dense, channels, spec.hidden, Activation::Relu),
        features,
    )?;
    let x = g.apply(Dropout::new(spec.dropout, DROPOUT_RATE), x)?;
    let probs = g.apply(
        Linear::with_activation(spec.output, spec.hidden, spec.classes, Activation::Softmax),
        x,
    )?;
    Ok((features, probs))
}
