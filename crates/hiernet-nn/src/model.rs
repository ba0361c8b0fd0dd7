//! Model - Executable Multi-Output Layer Graph
//!
//! A `Model` is produced by [`crate::graph::GraphBuilder::build`]. It runs
//! its nodes in topological order, infers shapes without computing, prints
//! a Keras-style summary and exposes its parameters by fully qualified name
//! (`"{layer}.{slot}"`), which is the key space of saved weights.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use std::fmt;

use hiernet_tensor::{Error, Result, Tensor};

use crate::graph::{Node, NodeOp};
use crate::module::Module;
use crate::parameter::Parameter;

// =============================================================================
// Summary Row
// =============================================================================

/// One line of [`Model::summary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    /// Layer name.
    pub name: String,
    /// Layer type in Keras spelling.
    pub kind: String,
    /// Output shape including the batch dimension (NCHW for images).
    pub output_shape: Vec<usize>,
    /// Trainable plus non-trainable parameter count.
    pub params: usize,
    /// Trainable parameter count.
    pub trainable: usize,
    /// Names of the nodes feeding this one.
    pub connected_to: Vec<String>,
}

// =============================================================================
// Model
// =============================================================================

/// A built, single-input, multi-output layer graph.
pub struct Model {
    name: String,
    nodes: Vec<Node>,
    input: usize,
    outputs: Vec<usize>,
    /// Per-node output shape without the batch dimension.
    sample_shapes: Vec<Vec<usize>>,
    training: bool,
}

impl Model {
    pub(crate) fn from_nodes(
        nodes: Vec<Node>,
        input: usize,
        outputs: Vec<usize>,
        input_shape: Vec<usize>,
    ) -> Result<Self> {
        let mut model = Self {
            name: "model".to_string(),
            nodes,
            input,
            outputs,
            sample_shapes: Vec::new(),
            training: true,
        };

        let mut batched = vec![1];
        batched.extend_from_slice(&input_shape);
        model.sample_shapes = model
            .infer_shapes(&batched)?
            .into_iter()
            .map(|s| s[1..].to_vec())
            .collect();
        model.eval();

        tracing::debug!(
            layers = model.num_layers(),
            params = model.total_parameters(),
            outputs = model.outputs.len(),
            "built model graph"
        );
        Ok(model)
    }

    /// Renames the model.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Name of the input node.
    pub fn input_name(&self) -> &str {
        &self.nodes[self.input].name
    }

    /// Per-sample input shape, e.g. `[3, 32, 32]`.
    pub fn input_shape(&self) -> &[usize] {
        &self.sample_shapes[self.input]
    }

    /// Output names in declaration order.
    pub fn output_names(&self) -> Vec<&str> {
        self.outputs
            .iter()
            .map(|&i| self.nodes[i].name.as_str())
            .collect()
    }

    /// Output shapes for a batch of the declared input shape.
    pub fn output_shapes(&self, batch: usize) -> Vec<Vec<usize>> {
        self.outputs
            .iter()
            .map(|&i| {
                let mut shape = vec![batch];
                shape.extend_from_slice(&self.sample_shapes[i]);
                shape
            })
            .collect()
    }

    /// Number of layers, the input excluded.
    pub fn num_layers(&self) -> usize {
        self.nodes.iter().filter(|n| n.layer().is_some()).count()
    }

    /// Iterates over the layers in execution order.
    pub fn layers(&self) -> impl Iterator<Item = &dyn Module> {
        self.nodes.iter().filter_map(Node::layer)
    }

    /// Layer names in execution order.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers().map(|l| l.name()).collect()
    }

    /// Looks a layer up by name.
    pub fn layer(&self, name: &str) -> Option<&dyn Module> {
        self.layers().find(|l| l.name() == name)
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Infers every node's output shape for a full input shape (batch
    /// included) without running any kernel.
    pub fn infer_shapes(&self, input: &[usize]) -> Result<Vec<Vec<usize>>> {
        self.check_input(input)?;
        let mut shapes: Vec<Vec<usize>> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let shape = match &node.op {
                NodeOp::Input { .. } => input.to_vec(),
                NodeOp::Layer(layer) => {
                    let srcs: Vec<&[usize]> =
                        node.inputs.iter().map(|&i| shapes[i].as_slice()).collect();
                    layer.output_shape_many(&srcs)?
                }
            };
            shapes.push(shape);
        }
        Ok(shapes)
    }

    /// Runs the graph and returns the outputs in declaration order.
    pub fn forward(&self, input: &Tensor) -> Result<Vec<Tensor>> {
        self.check_input(input.shape())?;
        let mut values: Vec<Tensor> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let value = match &node.op {
                NodeOp::Input { .. } => input.clone(),
                NodeOp::Layer(layer) => {
                    let srcs: Vec<&Tensor> = node.inputs.iter().map(|&i| &values[i]).collect();
                    layer.forward_many(&srcs)?
                }
            };
            values.push(value);
        }
        Ok(self.outputs.iter().map(|&i| values[i].clone()).collect())
    }

    /// Runs the graph and pairs every output with its name.
    pub fn forward_named(&self, input: &Tensor) -> Result<Vec<(String, Tensor)>> {
        let outputs = self.forward(input)?;
        Ok(self
            .output_names()
            .into_iter()
            .map(str::to_string)
            .zip(outputs)
            .collect())
    }

    fn check_input(&self, shape: &[usize]) -> Result<()> {
        let declared = match &self.nodes[self.input].op {
            NodeOp::Input { shape: declared } => declared,
            NodeOp::Layer(_) => return Err(Error::internal("model input is not an input node")),
        };
        if shape.len() != declared.len() + 1 || shape[1..] != declared[..] {
            let mut expected = vec![shape.first().copied().unwrap_or(1)];
            expected.extend_from_slice(declared);
            return Err(Error::shape_mismatch(&expected, shape));
        }
        Ok(())
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// All parameters keyed `"{layer}.{slot}"`, in execution order.
    pub fn named_parameters(&self) -> Vec<(String, Parameter)> {
        self.layers()
            .flat_map(|layer| {
                layer
                    .parameters()
                    .into_iter()
                    .map(move |p| (format!("{}.{}", layer.name(), p.name()), p))
            })
            .collect()
    }

    /// Looks a parameter up by its qualified name.
    pub fn parameter(&self, name: &str) -> Option<Parameter> {
        let (layer, slot) = name.rsplit_once('.')?;
        self.layer(layer)?
            .parameters()
            .into_iter()
            .find(|p| p.name() == slot)
    }

    /// Snapshot of every parameter tensor by qualified name.
    pub fn state_tensors(&self) -> Vec<(String, Tensor)> {
        self.named_parameters()
            .into_iter()
            .map(|(name, p)| (name, p.data()))
            .collect()
    }

    /// Replaces one parameter by qualified name; the shape must not change.
    pub fn load_named(&self, name: &str, tensor: Tensor) -> Result<()> {
        let param = self
            .parameter(name)
            .ok_or_else(|| Error::invalid_argument(format!("unknown parameter: {name}")))?;
        param.load(tensor).map_err(|e| match e {
            Error::ShapeMismatch { expected, actual } => Error::invalid_argument(format!(
                "parameter {name}: expected shape {expected:?}, got {actual:?}"
            )),
            other => other,
        })
    }

    /// Number of trainable parameters.
    pub fn num_parameters(&self) -> usize {
        self.layers().map(|l| l.num_parameters()).sum()
    }

    /// Number of non-trainable parameters (batch-norm statistics).
    pub fn num_non_trainable(&self) -> usize {
        self.layers().map(|l| l.num_non_trainable()).sum()
    }

    /// Total parameter count.
    pub fn total_parameters(&self) -> usize {
        self.num_parameters() + self.num_non_trainable()
    }

    // =========================================================================
    // Mode
    // =========================================================================

    /// Sets every layer's training flag.
    pub fn set_training(&mut self, training: bool) {
        self.training = training;
        for node in &mut self.nodes {
            if let Some(layer) = node.layer_mut() {
                layer.set_training(training);
            }
        }
    }

    /// Switches to training mode (dropout active, batch statistics).
    pub fn train(&mut self) {
        self.set_training(true);
    }

    /// Switches to evaluation mode.
    pub fn eval(&mut self) {
        self.set_training(false);
    }

    /// Returns whether the model is in training mode.
    pub fn is_training(&self) -> bool {
        self.training
    }

    // =========================================================================
    // Summary
    // =========================================================================

    /// One row per node for a batch of `batch` samples.
    pub fn summary_rows(&self, batch: usize) -> Vec<LayerSummary> {
        self.nodes
            .iter()
            .zip(&self.sample_shapes)
            .map(|(node, shape)| {
                let mut output_shape = vec![batch];
                output_shape.extend_from_slice(shape);
                let (params, trainable) = node.layer().map_or((0, 0), |l| {
                    (l.num_parameters() + l.num_non_trainable(), l.num_parameters())
                });
                LayerSummary {
                    name: node.name.clone(),
                    kind: node.kind().to_string(),
                    output_shape,
                    params,
                    trainable,
                    connected_to: node
                        .inputs
                        .iter()
                        .map(|&i| self.nodes[i].name.clone())
                        .collect(),
                }
            })
            .collect()
    }

    /// Keras-style summary table.
    pub fn summary(&self, batch: usize) -> String {
        const WIDTH: usize = 98;
        let mut out = String::new();
        out.push_str(&format!("Model: \"{}\"\n", self.name));
        out.push_str(&"_".repeat(WIDTH));
        out.push('\n');
        out.push_str(&format!(
            " {:<31}{:<22}{:<12}{}\n",
            "Layer (type)", "Output Shape", "Param #", "Connected to"
        ));
        out.push_str(&"=".repeat(WIDTH));
        out.push('\n');

        let rows = self.summary_rows(batch);
        for (i, row) in rows.iter().enumerate() {
            let label = format!("{} ({})", row.name, row.kind);
            let shape = format!(
                "({})",
                row.output_shape
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            let links = row
                .connected_to
                .iter()
                .map(|n| format!("'{n}[0][0]'"))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                " {label:<31}{shape:<22}{:<12}[{links}]\n",
                row.params
            ));
            if i + 1 < rows.len() {
                out.push('\n');
            }
        }

        out.push_str(&"=".repeat(WIDTH));
        out.push('\n');
        out.push_str(&format!("Total params: {}\n", self.total_parameters()));
        out.push_str(&format!("Trainable params: {}\n", self.num_parameters()));
        out.push_str(&format!(
            "Non-trainable params: {}\n",
            self.num_non_trainable()
        ));
        out.push_str(&"_".repeat(WIDTH));
        out.push('\n');
        out
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("layers", &self.num_layers())
            .field("outputs", &self.output_names())
            .field("training", &self.training)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::{Activation, ReLU};
    use crate::graph::GraphBuilder;
    use crate::layers::{BatchNorm2d, Conv2d, Dropout, GlobalAvgPool2d, Linear};

    fn tiny() -> Model {
        let mut g = GraphBuilder::new();
        let x = g.input("input_1", &[3, 8, 8]).unwrap();
        let c = g.apply(Conv2d::new("conv2d", 3, 4, 3), x).unwrap();
        let c = g.apply(BatchNorm2d::new("batch_normalization", 4), c).unwrap();
        let c = g.apply(ReLU::new("activation"), c).unwrap();
        let f = g.apply(GlobalAvgPool2d::new(), c).unwrap();
        let h = g
            .apply(Linear::with_activation("dense", 4, 6, Activation::Relu), f)
            .unwrap();
        let h = g.apply(Dropout::new("dropout", 0.3), h).unwrap();
        let y = g
            .apply(Linear::with_activation("coarse", 6, 2, Activation::Softmax), h)
            .unwrap();
        g.build(x, &[y, f]).unwrap().with_name("tiny")
    }

    #[test]
    fn test_forward_outputs_in_order() {
        let model = tiny();
        assert!(!model.is_training());
        let x = hiernet_tensor::randn(&[5, 3, 8, 8]);
        let outs = model.forward(&x).unwrap();
        assert_eq!(outs.len(), 2);
        assert_eq!(outs[0].shape(), &[5, 2]);
        assert_eq!(outs[1].shape(), &[5, 4]);
        assert_eq!(model.output_names(), vec!["coarse", "global_average_pooling2d"]);
        assert_eq!(model.output_shapes(5), vec![vec![5, 2], vec![5, 4]]);
    }

    #[test]
    fn test_eval_forward_is_deterministic() {
        let model = tiny();
        let x = hiernet_tensor::randn(&[2, 3, 8, 8]);
        let a = model.forward(&x).unwrap();
        let b = model.forward(&x).unwrap();
        assert_eq!(a[0].to_vec(), b[0].to_vec());
    }

    #[test]
    fn test_forward_rejects_wrong_channels() {
        let model = tiny();
        let err = model.forward(&Tensor::ones(&[1, 1, 8, 8])).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        assert!(model.infer_shapes(&[1, 3, 8]).is_err());
    }

    #[test]
    fn test_forward_rejects_other_spatial_size() {
        let model = tiny();
        let err = model.forward(&Tensor::ones(&[1, 3, 4, 4])).unwrap_err();
        assert_eq!(err, Error::shape_mismatch(&[1, 3, 8, 8], &[1, 3, 4, 4]));
        assert!(model.forward(&Tensor::ones(&[1, 3, 8, 16])).is_err());
        assert!(model.infer_shapes(&[1, 3, 16, 16]).is_err());
    }

    #[test]
    fn test_parameter_names_and_counts() {
        let model = tiny();
        let names: Vec<String> = model.named_parameters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "conv2d.weight",
                "conv2d.bias",
                "batch_normalization.weight",
                "batch_normalization.bias",
                "batch_normalization.running_mean",
                "batch_normalization.running_var",
                "dense.weight",
                "dense.bias",
                "coarse.weight",
                "coarse.bias",
            ]
        );
        // conv 3*4*9+4, bn 8 trainable + 8 running, dense 4*6+6, coarse 6*2+2
        assert_eq!(model.num_parameters(), 112 + 8 + 30 + 14);
        assert_eq!(model.num_non_trainable(), 8);
    }

    #[test]
    fn test_load_named() {
        let model = tiny();
        model
            .load_named("coarse.bias", Tensor::from_vec(vec![1.0, 2.0], &[2]).unwrap())
            .unwrap();
        assert_eq!(
            model.parameter("coarse.bias").unwrap().data().to_vec(),
            vec![1.0, 2.0]
        );
        assert!(model.load_named("coarse.bias", Tensor::zeros(&[3])).is_err());
        assert!(model.load_named("nope.bias", Tensor::zeros(&[2])).is_err());
    }

    #[test]
    fn test_train_toggles_layers() {
        let mut model = tiny();
        model.train();
        assert!(model.layer("dropout").unwrap().is_training());
        model.eval();
        assert!(!model.layer("batch_normalization").unwrap().is_training());
    }

    #[test]
    fn test_summary_table() {
        let model = tiny();
        let text = model.summary(1);
        assert!(text.starts_with("Model: \"tiny\""));
        assert!(text.contains("conv2d (Conv2D)"));
        assert!(text.contains("['input_1[0][0]']"));
        assert!(text.contains("Non-trainable params: 8"));
        let rows = model.summary_rows(1);
        assert_eq!(rows[0].kind, "InputLayer");
        assert_eq!(rows[1].params, 112);
    }
}
