//! Module defining the core `Module` trait for all layers.

use crate::asg::AsgResult;
use crate::tensor::Tensor;

/// Common interface for all layers/modules.
///
/// A `Module` adds a specific pattern of operation nodes to the graph.
pub trait Module {
    /// Performs a "symbolic" forward pass, building the corresponding part of the graph.
    fn forward(&self, input: &Tensor) -> AsgResult<Tensor>;
}
