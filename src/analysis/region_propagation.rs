//! Module for requested-region propagation (receptive field backpropagation).
//!
//! Starting from a region requested at some node, each node merges the
//! request into its accumulated region, derives the region it needs from its
//! inputs according to its operation type and forwards it to every input.

use crate::asg::{Asg, AsgError, NodeId, NodeType};
use crate::region::{Interval, Region};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropagationError {
    #[error("Graph error: {0}")]
    AsgError(#[from] AsgError),

    #[error("Dimension mismatch at node {node_id}: accumulated region has {expected} dimensions, \
             request has {actual}. All requests against one graph must use the same dimensionality.")]
    DimensionMismatch {
        node_id: NodeId,
        expected: usize,
        actual: usize,
    },

    #[error("Cycle detected: node {0} was reached again while its own request was still propagating. \
             Region propagation requires an acyclic graph.")]
    CycleDetected(NodeId),

    #[error("Integer overflow while deriving the upstream region of node {0}.")]
    Overflow(NodeId),
}

type Result<T> = std::result::Result<T, PropagationError>;

/// Whether a node re-propagates when a request leaves its region unchanged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum PropagationMode {
    /// Re-derive and re-forward on every request, even if nothing changed.
    /// Shared ancestors are traversed once per incoming path.
    Eager,
    /// Stop at a node whose accumulated region did not change. Produces the
    /// same accumulated regions as `Eager` with work linear in edge count.
    #[default]
    SkipUnchanged,
}

#[derive(Debug, Clone, Default)]
pub struct PropagationConfig {
    pub mode: PropagationMode,
}

impl PropagationConfig {
    pub fn eager() -> Self {
        Self { mode: PropagationMode::Eager }
    }

    pub fn with_mode(mut self, mode: PropagationMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Counters collected during a single `run`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Requests received, counting every incoming edge traversal.
    pub visits: usize,
    /// Requests that derived and forwarded an upstream region.
    pub propagated: usize,
    /// Requests that stopped because the region did not change.
    pub skipped: usize,
}

/// Performs region propagation over an ASG.
#[derive(Debug, Clone, Default)]
pub struct RegionPropagation {
    config: PropagationConfig,
}

impl RegionPropagation {
    pub fn new(config: PropagationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    /// Requests `region` at `node_id` and propagates it to every ancestor.
    ///
    /// Modifies the graph in-place, updating `requested_region` and
    /// `upstream_region` on each node reached. On error, nodes visited before
    /// the failure keep their updated regions.
    pub fn run(&self, asg: &mut Asg, node_id: NodeId, region: &Region) -> Result<PropagationStats> {
        let mut stats = PropagationStats::default();
        let mut on_path = HashSet::new();
        self.request_region(asg, node_id, region, &mut on_path, &mut stats)?;

        log::info!(
            "Propagated {} from node {}: {} visits, {} propagated, {} skipped",
            region,
            node_id,
            stats.visits,
            stats.propagated,
            stats.skipped
        );
        Ok(stats)
    }

    fn request_region(
        &self,
        asg: &mut Asg,
        node_id: NodeId,
        region: &Region,
        on_path: &mut HashSet<NodeId>,
        stats: &mut PropagationStats,
    ) -> Result<()> {
        if !on_path.insert(node_id) {
            return Err(PropagationError::CycleDetected(node_id));
        }
        let result = self.merge_and_forward(asg, node_id, region, on_path, stats);
        on_path.remove(&node_id);
        result
    }

    fn merge_and_forward(
        &self,
        asg: &mut Asg,
        node_id: NodeId,
        region: &Region,
        on_path: &mut HashSet<NodeId>,
        stats: &mut PropagationStats,
    ) -> Result<()> {
        stats.visits += 1;
        let node = asg.get_node_mut(node_id)?;

        let (merged, changed) = match &node.requested_region {
            None => (region.clone(), true),
            Some(current) => {
                let merged = current.union(region).ok_or(PropagationError::DimensionMismatch {
                    node_id,
                    expected: current.dims(),
                    actual: region.dims(),
                })?;
                let changed = merged != *current;
                (merged, changed)
            }
        };

        if !changed && self.config.mode == PropagationMode::SkipUnchanged {
            stats.skipped += 1;
            log::trace!("Node {} already covers {}, skipping", node_id, region);
            return Ok(());
        }

        let upstream = Self::derive_upstream(node_id, &node.node_type, &merged)?;
        log::debug!(
            "Node {} ({}): requested {} -> upstream {}",
            node_id,
            node.node_type.op_name(),
            merged,
            upstream
        );
        node.requested_region = Some(merged);
        node.upstream_region = Some(upstream.clone());
        let inputs = node.node_type.inputs();
        stats.propagated += 1;

        for input_id in inputs {
            self.request_region(asg, input_id, &upstream, on_path, stats)?;
        }
        Ok(())
    }

    /// Maps a node's accumulated region to the region it needs from its inputs.
    pub fn derive_upstream(node_id: NodeId, node_type: &NodeType, region: &Region) -> Result<Region> {
        match *node_type {
            NodeType::Input | NodeType::Concatenate(_) => Ok(region.clone()),

            // Output position p reads input positions [p - margin, p + margin].
            NodeType::Convolution { margin, .. } => map_intervals(node_id, region, |i| {
                Some(Interval::from_ordered(i.low().checked_sub(margin)?, i.high().checked_add(margin)?))
            }),

            NodeType::Pooling { factor, .. } => map_intervals(node_id, region, |i| {
                Some(Interval::from_ordered(i.low().checked_mul(factor)?, i.high().checked_mul(factor)?))
            }),

            // Round outward to multiples of the factor first, so the result
            // scaled back up still covers the request.
            NodeType::Upsample { factor, .. } => map_intervals(node_id, region, |i| {
                let low = i.low().checked_sub(i.low().rem_euclid(factor))?;
                let high = i.high().checked_add((factor - i.high().rem_euclid(factor)) % factor)?;
                Some(Interval::from_ordered(low.div_euclid(factor), high.div_euclid(factor)))
            }),
        }
    }
}

fn map_intervals(
    node_id: NodeId,
    region: &Region,
    f: impl Fn(&Interval) -> Option<Interval>,
) -> Result<Region> {
    let intervals = region
        .intervals()
        .iter()
        .map(|i| f(i).ok_or(PropagationError::Overflow(node_id)))
        .collect::<Result<Vec<_>>>()?;
    Ok(Region::from_ordered(intervals))
}
