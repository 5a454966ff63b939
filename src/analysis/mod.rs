//! # Graph Analysis Module
//!
//! Analysis passes that run over the ASG before any numeric evaluation.
//!
//! ## Available Passes
//!
//! - [`RegionPropagation`](region_propagation::RegionPropagation): walks from a
//!   requested output region back to the graph inputs, accumulating on every
//!   node the region it must produce.
//!
//! ## How It Works
//!
//! ```text
//! output region -> Convolution (pad) -> Pooling (scale up) -> ... -> Input
//! ```
//!
//! Every node merges incoming requests into its accumulated region (a
//! coordinate-wise union), derives what it needs from its own inputs and
//! forwards that, depth-first. This tells you how much of a large input has
//! to be supplied for tiled evaluation, before anything is computed.
//!
//! ## Example
//!
//! ```ignore
//! use lazyasg::analysis::region_propagation::RegionPropagation;
//!
//! let region = Region::from_bounds(&[(-2, 386), (-2, 386)])?;
//! RegionPropagation::default().run(&mut graph, output_id, &region)?;
//!
//! let needed = graph.requested_region(input_id)?;
//! ```

pub mod region_propagation;
