//! Module implementing convolutional layers.

use crate::asg::{AsgError, AsgResult, NodeType};
use crate::nn::module::Module;
use crate::tensor::Tensor;

/// Configuration for Conv2d layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Conv2dConfig {
    /// Convolution kernel size (square, odd).
    pub kernel_size: usize,
    /// Dilation (kernel expansion).
    pub dilation: usize,
}

impl Default for Conv2dConfig {
    fn default() -> Self {
        Self { kernel_size: 3, dilation: 1 }
    }
}

impl Conv2dConfig {
    pub fn new(kernel_size: usize) -> Self {
        Self { kernel_size, ..Default::default() }
    }

    /// Sets dilation.
    pub fn with_dilation(mut self, dilation: usize) -> Self {
        self.dilation = dilation;
        self
    }

    /// Number of extra input positions read on each side of an output position.
    ///
    /// The kernel must be odd so that it is centred on the output position.
    pub fn margin(&self) -> AsgResult<i64> {
        let invalid = |reason: &str| AsgError::InvalidParameter {
            op: "Conv2d".to_string(),
            reason: reason.to_string(),
        };
        if self.kernel_size % 2 == 0 {
            return Err(invalid("kernel_size must be odd"));
        }
        if self.dilation == 0 {
            return Err(invalid("dilation must be at least 1"));
        }
        let half = self.dilation * (self.kernel_size - 1) / 2;
        i64::try_from(half).map_err(|_| invalid("kernel too large"))
    }

    fn describe(&self) -> String {
        match self.dilation {
            1 => format!("conv{0}x{0}", self.kernel_size),
            d => format!("conv{0}x{0}_d{1}", self.kernel_size, d),
        }
    }
}

/// 2D convolutional layer.
///
/// # Example
///
/// ```rust,ignore
/// let conv = Conv2d::new("c1a", Conv2dConfig::new(5));
/// let output = conv.forward(&input)?;
/// ```
#[derive(Debug, Clone)]
pub struct Conv2d {
    pub name: String,
    pub config: Conv2dConfig,
}

impl Conv2d {
    pub fn new(name: &str, config: Conv2dConfig) -> Self {
        Self { name: name.to_string(), config }
    }
}

impl Module for Conv2d {
    fn forward(&self, input: &Tensor) -> AsgResult<Tensor> {
        let margin = self.config.margin()?;
        Tensor::from_op(
            &input.context,
            Some(&self.name),
            Some(&self.config.describe()),
            NodeType::Convolution { input: input.node_id, margin },
        )
    }
}

/// A chain of convolutions applied one after another, e.g. the paired
/// 3x3 convolutions at every U-Net resolution level.
#[derive(Debug, Clone)]
pub struct ConvBlock {
    pub convs: Vec<Conv2d>,
}

impl ConvBlock {
    /// Creates one convolution per name, all sharing `config`.
    pub fn new(names: &[String], config: &Conv2dConfig) -> Self {
        let convs = names.iter().map(|n| Conv2d::new(n, config.clone())).collect();
        Self { convs }
    }
}

impl Module for ConvBlock {
    fn forward(&self, input: &Tensor) -> AsgResult<Tensor> {
        self.convs.iter().try_fold(input.clone(), |x, conv| conv.forward(&x))
    }
}
