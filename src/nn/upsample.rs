//! Module implementing nearest-neighbour upsampling.

use crate::asg::{AsgResult, NodeType};
use crate::nn::module::Module;
use crate::tensor::Tensor;

/// Upsampling by an integer scale factor along every spatial dimension.
#[derive(Debug, Clone)]
pub struct Upsample {
    pub name: String,
    pub scale_factor: i64,
}

impl Upsample {
    pub fn new(name: &str, scale_factor: i64) -> Self {
        Self { name: name.to_string(), scale_factor }
    }
}

impl Module for Upsample {
    fn forward(&self, input: &Tensor) -> AsgResult<Tensor> {
        Tensor::from_op(
            &input.context,
            Some(&self.name),
            Some(&format!("upsample_x{}", self.scale_factor)),
            NodeType::Upsample { input: input.node_id, factor: self.scale_factor },
        )
    }
}
