//! # Layers Module
//!
//! Builders that add operation nodes to the ASG.
//!
//! - [`Conv2d`], [`ConvBlock`]: convolutions (region padded by the kernel half-width)
//! - [`MaxPool2d`]: downsampling
//! - [`Upsample`]: upsampling
//! - [`UNet`]: the full encoder-decoder topology with skip connections
//!
//! ## Example
//!
//! ```ignore
//! use lazyasg::nn::{UNet, UNetConfig};
//! use lazyasg::tensor::GraphContext;
//!
//! let context = GraphContext::new().shared();
//! let unet = UNet::build(&context, &UNetConfig::default())?;
//! unet.output.request_region(&region)?;
//! ```

pub mod conv;
pub mod module;
pub mod pooling;
pub mod unet;
pub mod upsample;

pub use conv::{Conv2d, Conv2dConfig, ConvBlock};
pub use module::Module;
pub use pooling::MaxPool2d;
pub use unet::{UNet, UNetConfig};
pub use upsample::Upsample;
