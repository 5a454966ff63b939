//! # lazyasg: receptive-field calculator for lazy/tiled evaluation
//!
//! Networks are described as an **Abstract Semantic Graph (ASG)** of
//! region-transforming operations (convolution, pooling, upsampling, channel
//! concatenation) ending in an input node. Requesting a spatial region at the
//! output propagates it back through the graph and records on every node the
//! region it must produce, in particular how much of the input is needed.
//!
//! ## Usage Example
//!
//! ```
//! use lazyasg::region::Region;
//! use lazyasg::tensor::{GraphContext, Tensor};
//!
//! // 1. Create graph context
//! let context = GraphContext::new().shared();
//!
//! // 2. Build the graph bottom-up
//! let input = Tensor::new_input(&context, "input");
//! let features = input.conv(1)?.pool(2)?;
//! let output = features.conv(1)?;
//!
//! // 3. Request an output region and read what the input must cover
//! output.request_region(&Region::from_bounds(&[(0, 10)])?)?;
//! assert_eq!(input.requested_region()?.unwrap().bounds(), vec![(-3, 23)]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod asg;
pub mod nn;
pub mod region;
pub mod serialization;
pub mod tensor;
