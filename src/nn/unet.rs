//! Encoder-decoder (U-Net) topology.
//!
//! Down path: a convolution block per resolution level, separated by
//! pooling. Up path: upsample, concatenate with the matching skip
//! connection, convolution block. Every skip connection re-converges on an
//! encoder node, which makes this graph the standard stress case for region
//! propagation.

use crate::asg::{AsgError, AsgResult, NodeType};
use crate::nn::conv::{Conv2dConfig, ConvBlock};
use crate::nn::module::Module;
use crate::nn::pooling::MaxPool2d;
use crate::nn::upsample::Upsample;
use crate::tensor::{GraphContext, Tensor};
use std::cell::RefCell;
use std::rc::Rc;

/// Configuration for the U-Net builder.
#[derive(Debug, Clone, PartialEq)]
pub struct UNetConfig {
    /// Number of pooling (and upsampling) steps.
    pub depth: usize,
    /// Convolutions per block.
    pub convs_per_block: usize,
    pub conv: Conv2dConfig,
    /// Pooling and upsampling factor.
    pub scale_factor: i64,
}

impl Default for UNetConfig {
    fn default() -> Self {
        Self {
            depth: 4,
            convs_per_block: 2,
            conv: Conv2dConfig::default(),
            scale_factor: 2,
        }
    }
}

impl UNetConfig {
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_convs_per_block(mut self, convs_per_block: usize) -> Self {
        self.convs_per_block = convs_per_block;
        self
    }

    pub fn with_conv(mut self, conv: Conv2dConfig) -> Self {
        self.conv = conv;
        self
    }

    pub fn with_scale_factor(mut self, scale_factor: i64) -> Self {
        self.scale_factor = scale_factor;
        self
    }
}

/// Handles to the interesting nodes of a built U-Net.
#[derive(Debug, Clone)]
pub struct UNet {
    pub input: Tensor,
    pub output: Tensor,
    /// Last node of every encoder level, top level first.
    pub skips: Vec<Tensor>,
}

impl UNet {
    /// Builds the network into `context` and marks the output node.
    ///
    /// Nodes are named after their level: `c1a`, `c1b`, `p2`, ..., `u1`,
    /// `cn1`, `c1c`, `c1d`.
    pub fn build(context: &Rc<RefCell<GraphContext>>, config: &UNetConfig) -> AsgResult<Self> {
        if config.convs_per_block == 0 {
            return Err(AsgError::InvalidParameter {
                op: "UNet".to_string(),
                reason: "convs_per_block must be at least 1".to_string(),
            });
        }
        let block = |level: usize, offset: usize| {
            let names: Vec<String> = (offset..offset + config.convs_per_block)
                .map(|i| format!("c{}{}", level, conv_suffix(i)))
                .collect();
            ConvBlock::new(&names, &config.conv)
        };

        let input = Tensor::new_input(context, "input");
        let mut x = block(1, 0).forward(&input)?;
        let mut skips = Vec::with_capacity(config.depth);

        for level in 2..=config.depth + 1 {
            skips.push(x.clone());
            x = MaxPool2d::square(&format!("p{level}"), config.scale_factor).forward(&x)?;
            x = block(level, 0).forward(&x)?;
        }

        for level in (1..=config.depth).rev() {
            let up = Upsample::new(&format!("u{level}"), config.scale_factor).forward(&x)?;
            let skip = &skips[level - 1];
            let merged = Tensor::from_op(
                context,
                Some(&format!("cn{level}")),
                Some("concat"),
                NodeType::Concatenate(vec![skip.node_id, up.node_id]),
            )?;
            x = block(level, config.convs_per_block).forward(&merged)?;
        }

        context.borrow_mut().main_graph_mut().set_output(x.node_id);
        Ok(Self { input, output: x, skips })
    }
}

fn conv_suffix(i: usize) -> String {
    match u8::try_from(i) {
        Ok(i) if i < 26 => char::from(b'a' + i).to_string(),
        _ => format!("_{i}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Region;

    #[test]
    fn test_node_count_and_names() {
        let context = GraphContext::new().shared();
        let unet = UNet::build(&context, &UNetConfig::default()).unwrap();

        let ctx = context.borrow();
        let graph = ctx.main_graph();
        // input + 5 down blocks of 2 convs + 4 pools + 4 x (upsample, concat, 2 convs)
        assert_eq!(graph.nodes.len(), 1 + 10 + 4 + 16);
        assert_eq!(graph.outputs, vec![unet.output.node_id]);
        assert_eq!(graph.find_by_name("c1d"), Some(unet.output.node_id));
        assert_eq!(graph.find_by_name("c4b"), Some(unet.skips[3].node_id));
        assert!(graph.find_by_name("cn1").is_some());
        assert!(graph.find_by_name("c5c").is_none());
    }

    #[test]
    fn test_depth_zero_is_a_plain_block() {
        let context = GraphContext::new().shared();
        let unet = UNet::build(&context, &UNetConfig::default().with_depth(0)).unwrap();

        unet.output.request_region(&Region::from_bounds(&[(0, 8)]).unwrap()).unwrap();
        assert_eq!(unet.input.requested_region().unwrap().unwrap().bounds(), vec![(-2, 10)]);
    }

    #[test]
    fn test_rejects_empty_blocks() {
        let context = GraphContext::new().shared();
        assert!(UNet::build(&context, &UNetConfig::default().with_convs_per_block(0)).is_err());
    }
}
