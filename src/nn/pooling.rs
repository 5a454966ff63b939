//! Module implementing pooling layers.

use crate::asg::{AsgResult, NodeType};
use crate::nn::module::Module;
use crate::tensor::Tensor;

/// Max pooling with equal window size and stride.
///
/// # Example
///
/// ```rust,ignore
/// let pool = MaxPool2d::square("p2", 2);
/// let output = pool.forward(&input)?; // Halves every spatial dimension
/// ```
#[derive(Debug, Clone)]
pub struct MaxPool2d {
    pub name: String,
    /// Window size and stride.
    pub factor: i64,
}

impl MaxPool2d {
    pub fn square(name: &str, factor: i64) -> Self {
        Self { name: name.to_string(), factor }
    }
}

impl Module for MaxPool2d {
    fn forward(&self, input: &Tensor) -> AsgResult<Tensor> {
        Tensor::from_op(
            &input.context,
            Some(&self.name),
            Some(&format!("maxpool{0}x{0}", self.factor)),
            NodeType::Pooling { input: input.node_id, factor: self.factor },
        )
    }
}
