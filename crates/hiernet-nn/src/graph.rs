//! Functional Graph - Wiring Layers into a DAG
//!
//! `GraphBuilder` mirrors the Keras functional API: declare an input, apply
//! layers to existing nodes, then build a [`Model`] from one input and any
//! number of outputs. Node handles are only handed out for nodes that
//! already exist, so the node list is topologically ordered by construction.
//!
//! # Example
//! ```rust
//! use hiernet_nn::prelude::*;
//!
//! let mut g = GraphBuilder::new();
//! let x = g.input("input_1", &[3, 8, 8]).unwrap();
//! let c = g.apply(Conv2d::new("conv2d", 3, 4, 3), x).unwrap();
//! let f = g.apply(GlobalAvgPool2d::new(), c).unwrap();
//! let model = g.build(x, &[f]).unwrap();
//! assert_eq!(model.output_names(), vec!["global_average_pooling2d"]);
//! ```
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use std::collections::HashSet;

use hiernet_tensor::{Error, Result};

use crate::model::Model;
use crate::module::Module;

// =============================================================================
// Nodes
// =============================================================================

/// Handle to a node inside a [`GraphBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the position of the node in creation order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a node computes.
pub(crate) enum NodeOp {
    /// Graph input with its per-sample shape.
    Input { shape: Vec<usize> },
    /// A layer applied to the node's inputs.
    Layer(Box<dyn Module>),
}

pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) op: NodeOp,
    pub(crate) inputs: Vec<usize>,
}

impl Node {
    pub(crate) fn layer(&self) -> Option<&dyn Module> {
        match &self.op {
            NodeOp::Layer(m) => Some(m.as_ref()),
            NodeOp::Input { .. } => None,
        }
    }

    pub(crate) fn layer_mut(&mut self) -> Option<&mut Box<dyn Module>> {
        match &mut self.op {
            NodeOp::Layer(m) => Some(m),
            NodeOp::Input { .. } => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match &self.op {
            NodeOp::Layer(m) => m.kind(),
            NodeOp::Input { .. } => "InputLayer",
        }
    }
}

// =============================================================================
// Keras Naming
// =============================================================================

/// Converts a layer type to its Keras default-name prefix
/// (`GlobalAveragePooling2D` -> `global_average_pooling2d`).
pub fn keras_prefix(kind: &str) -> String {
    let chars: Vec<char> = kind.chars().collect();
    let mut out = String::with_capacity(kind.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev_lower = chars[i - 1].is_ascii_lowercase();
            let next_lower = chars
                .get(i + 1)
                .is_some_and(|n| n.is_ascii_lowercase() || n.is_ascii_digit());
            if prev_lower || next_lower {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

// =============================================================================
// GraphBuilder
// =============================================================================

/// Incrementally builds a layer DAG.
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    names: HashSet<String>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes added so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node has been added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Declares a graph input with a per-sample shape (no batch dimension).
    pub fn input(&mut self, name: &str, shape: &[usize]) -> Result<NodeId> {
        if shape.is_empty() || shape.iter().any(|&d| d == 0) {
            return Err(Error::invalid_argument(format!(
                "input {name} needs non-zero dimensions, got {shape:?}"
            )));
        }
        let name = self.claim_name(name, "InputLayer")?;
        Ok(self.push(Node {
            name,
            op: NodeOp::Input {
                shape: shape.to_vec(),
            },
            inputs: Vec::new(),
        }))
    }

    /// Applies a single-input layer to `from`.
    pub fn apply<M: Module + 'static>(&mut self, layer: M, from: NodeId) -> Result<NodeId> {
        self.add(Box::new(layer), &[from])
    }

    /// Applies a merge layer to several nodes, in order.
    pub fn concat<M: Module + 'static>(&mut self, layer: M, from: &[NodeId]) -> Result<NodeId> {
        if from.len() < 2 {
            return Err(Error::invalid_argument(format!(
                "{} needs at least two inputs, got {}",
                layer.kind(),
                from.len()
            )));
        }
        self.add(Box::new(layer), from)
    }

    /// Finishes the graph.
    ///
    /// Nodes that no output depends on are dropped, output shapes are
    /// inferred once, and the model is returned in evaluation mode.
    pub fn build(self, input: NodeId, outputs: &[NodeId]) -> Result<Model> {
        let input_shape = match self.nodes.get(input.0) {
            Some(Node {
                op: NodeOp::Input { shape },
                ..
            }) => shape.clone(),
            _ => {
                return Err(Error::invalid_argument(format!(
                    "node {} is not a graph input",
                    input.0
                )))
            }
        };
        if outputs.is_empty() {
            return Err(Error::invalid_argument("a model needs at least one output"));
        }
        for out in outputs {
            self.check_id(*out)?;
        }

        // keep only the ancestors of the outputs
        let mut keep = vec![false; self.nodes.len()];
        for out in outputs {
            keep[out.0] = true;
        }
        for idx in (0..self.nodes.len()).rev() {
            if keep[idx] {
                for &src in &self.nodes[idx].inputs {
                    keep[src] = true;
                }
            }
        }
        if !keep[input.0] {
            return Err(Error::invalid_argument(format!(
                "no output depends on input {}",
                self.nodes[input.0].name
            )));
        }

        let mut remap = vec![usize::MAX; self.nodes.len()];
        let mut nodes = Vec::new();
        let dropped = self.nodes.len() - keep.iter().filter(|&&k| k).count();
        for (idx, node) in self.nodes.into_iter().enumerate() {
            if !keep[idx] {
                continue;
            }
            if matches!(node.op, NodeOp::Input { .. }) && idx != input.0 {
                return Err(Error::invalid_argument(format!(
                    "outputs depend on a second input {}",
                    node.name
                )));
            }
            remap[idx] = nodes.len();
            let inputs = node.inputs.iter().map(|&i| remap[i]).collect();
            nodes.push(Node { inputs, ..node });
        }
        if dropped > 0 {
            tracing::debug!(dropped, "pruned nodes unreachable from the outputs");
        }

        let outputs = outputs.iter().map(|o| remap[o.0]).collect();
        Model::from_nodes(nodes, remap[input.0], outputs, input_shape)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn add(&mut self, mut layer: Box<dyn Module>, from: &[NodeId]) -> Result<NodeId> {
        for id in from {
            self.check_id(*id)?;
        }
        let name = self.claim_name(layer.name(), layer.kind())?;
        layer.set_name(&name);
        Ok(self.push(Node {
            name,
            op: NodeOp::Layer(layer),
            inputs: from.iter().map(|id| id.0).collect(),
        }))
    }

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn check_id(&self, id: NodeId) -> Result<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds {
                index: id.0,
                size: self.nodes.len(),
            })
        }
    }

    /// Reserves `requested`, or the next free Keras default name when empty.
    fn claim_name(&mut self, requested: &str, kind: &str) -> Result<String> {
        let name = if requested.is_empty() {
            let prefix = keras_prefix(kind);
            (0..)
                .map(|n| {
                    if n == 0 {
                        prefix.clone()
                    } else {
                        format!("{prefix}_{n}")
                    }
                })
                .find(|candidate| !self.names.contains(candidate))
                .unwrap_or_default()
        } else {
            requested.to_string()
        };

        if !self.names.insert(name.clone()) {
            return Err(Error::invalid_argument(format!(
                "duplicate layer name: {name}"
            )));
        }
        Ok(name)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ReLU;
    use crate::layers::{Concatenate, Conv2d, GlobalAvgPool2d, MaxPool2d, UpSampling2d};

    #[test]
    fn test_keras_prefix() {
        assert_eq!(keras_prefix("Conv2D"), "conv2d");
        assert_eq!(keras_prefix("BatchNormalization"), "batch_normalization");
        assert_eq!(keras_prefix("MaxPooling2D"), "max_pooling2d");
        assert_eq!(keras_prefix("UpSampling2D"), "up_sampling2d");
        assert_eq!(
            keras_prefix("GlobalAveragePooling2D"),
            "global_average_pooling2d"
        );
        assert_eq!(keras_prefix("Dense"), "dense");
    }

    #[test]
    fn test_auto_names_are_sequential() {
        let mut g = GraphBuilder::new();
        let x = g.input("input_1", &[2, 4, 4]).unwrap();
        let a = g.apply(GlobalAvgPool2d::new(), x).unwrap();
        let b = g.apply(GlobalAvgPool2d::new(), x).unwrap();
        let c = g.apply(GlobalAvgPool2d::new(), x).unwrap();
        let model = g.build(x, &[a, b, c]).unwrap();
        assert_eq!(
            model.output_names(),
            vec![
                "global_average_pooling2d",
                "global_average_pooling2d_1",
                "global_average_pooling2d_2"
            ]
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut g = GraphBuilder::new();
        let x = g.input("input_1", &[3, 4, 4]).unwrap();
        g.apply(ReLU::new("activation"), x).unwrap();
        let err = g.apply(ReLU::new("activation"), x).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert!(err.to_string().contains("duplicate layer name"));
    }

    #[test]
    fn test_build_prunes_dead_branches() {
        let mut g = GraphBuilder::new();
        let x = g.input("input_1", &[3, 4, 4]).unwrap();
        let c = g.apply(Conv2d::new("conv2d", 3, 2, 3), x).unwrap();
        g.apply(Conv2d::new("unused", 2, 2, 3), c).unwrap();
        let model = g.build(x, &[c]).unwrap();
        assert!(model.layer("unused").is_none());
        assert!(model.layer("conv2d").is_some());
    }

    #[test]
    fn test_concat_wiring_checks_shapes() {
        let mut g = GraphBuilder::new();
        let x = g.input("input_1", &[2, 8, 8]).unwrap();
        let p = g.apply(MaxPool2d::new("max_pooling2d", 2), x).unwrap();
        let u = g.apply(UpSampling2d::new("up_sampling2d"), p).unwrap();
        let m = g.concat(Concatenate::new("concatenate"), &[x, u]).unwrap();
        let model = g.build(x, &[m]).unwrap();
        assert_eq!(model.output_shapes(1), vec![vec![1, 4, 8, 8]]);

        // a pooled map cannot be joined with the full-resolution input
        let mut g = GraphBuilder::new();
        let x = g.input("input_1", &[2, 8, 8]).unwrap();
        let p = g.apply(MaxPool2d::new("max_pooling2d", 2), x).unwrap();
        let m = g.concat(Concatenate::new("concatenate"), &[x, p]).unwrap();
        assert!(g.build(x, &[m]).is_err());
    }

    #[test]
    fn test_build_rejects_bad_handles() {
        let mut g = GraphBuilder::new();
        let x = g.input("input_1", &[1, 2, 2]).unwrap();
        let r = g.apply(ReLU::new("r"), x).unwrap();
        assert!(g.apply(ReLU::new("s"), NodeId(99)).is_err());
        assert!(g.concat(Concatenate::new("c"), &[r]).is_err());
        assert!(GraphBuilder::new().input("bad", &[0, 2, 2]).is_err());
        let mut g2 = GraphBuilder::new();
        let x2 = g2.input("input_1", &[1, 2, 2]).unwrap();
        let r2 = g2.apply(ReLU::new("r"), x2).unwrap();
        assert!(g2.build(r2, &[r2]).is_err());
    }
}
