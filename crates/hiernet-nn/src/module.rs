//! Module Trait - Layer Interface
//!
//! Defines the trait every hiernet layer implements. A module is a named
//! node that maps one tensor (or, for merge layers, several) to a new tensor
//! and can report its output shape without computing anything.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use std::collections::HashMap;

use hiernet_tensor::{Error, Result, Tensor};

use crate::parameter::Parameter;

// =============================================================================
// Module Trait
// =============================================================================

/// Core trait for all layers.
///
/// Every layer provides:
/// - Forward pass computation and shape inference
/// - Parameter access
/// - Training/evaluation mode switching
/// - An instance name, unique within its model
pub trait Module: Send + Sync {
    /// Performs the forward pass on a batch.
    fn forward(&self, input: &Tensor) -> Result<Tensor>;

    /// Infers the output shape for an input shape, batch dimension included.
    fn output_shape(&self, input: &[usize]) -> Result<Vec<usize>>;

    /// Forward pass over several inputs. Only merge layers accept more than one.
    fn forward_many(&self, inputs: &[&Tensor]) -> Result<Tensor> {
        match inputs {
            [single] => self.forward(single),
            _ => Err(Error::invalid_argument(format!(
                "{} ({}) takes one input, got {}",
                self.name(),
                self.kind(),
                inputs.len()
            ))),
        }
    }

    /// Shape inference over several inputs.
    fn output_shape_many(&self, inputs: &[&[usize]]) -> Result<Vec<usize>> {
        match inputs {
            [single] => self.output_shape(single),
            _ => Err(Error::invalid_argument(format!(
                "{} ({}) takes one input, got {}",
                self.name(),
                self.kind(),
                inputs.len()
            ))),
        }
    }

    /// Returns all parameters of this module, trainable or not.
    fn parameters(&self) -> Vec<Parameter> {
        Vec::new()
    }

    /// Returns parameters keyed by slot name.
    fn named_parameters(&self) -> HashMap<String, Parameter> {
        self.parameters()
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect()
    }

    /// Returns the number of trainable parameters.
    fn num_parameters(&self) -> usize {
        self.parameters()
            .iter()
            .filter(|p| p.is_trainable())
            .map(Parameter::numel)
            .sum()
    }

    /// Returns the number of non-trainable parameters.
    fn num_non_trainable(&self) -> usize {
        self.parameters()
            .iter()
            .filter(|p| !p.is_trainable())
            .map(Parameter::numel)
            .sum()
    }

    /// Sets the module to training mode.
    fn train(&mut self) {
        self.set_training(true);
    }

    /// Sets the module to evaluation mode.
    fn eval(&mut self) {
        self.set_training(false);
    }

    /// Sets the training mode.
    fn set_training(&mut self, _training: bool) {
        // Stateless layers behave the same in both modes
    }

    /// Returns whether the module is in training mode.
    fn is_training(&self) -> bool {
        false
    }

    /// Returns the instance name. Empty until the layer is placed in a graph
    /// if none was given.
    fn name(&self) -> &str;

    /// Assigns the instance name.
    fn set_name(&mut self, name: &str);

    /// Returns the layer type, in Keras spelling (`Conv2D`, `Dense`, ...).
    fn kind(&self) -> &'static str;
}

// =============================================================================
// Tests
// =============================================================================
