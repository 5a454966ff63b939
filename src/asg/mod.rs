//! ASG: the abstract semantic graph of region-transforming operations.
//!
//! The arena (`Asg`) is the sole owner of every node. Edges are plain
//! `NodeId` handles, so two consumers can share an ancestor (skip
//! connections) without shared ownership.

use crate::region::Region;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Node identifier
pub type NodeId = usize;
/// Graph identifier
pub type AsgId = usize;

pub type AsgResult<T> = std::result::Result<T, AsgError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AsgError {
    #[error("Node with ID {0} not found")]
    NodeNotFound(NodeId),
    #[error("Invalid parameter for {op}: {reason}")]
    InvalidParameter { op: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node ID (duplicates the HashMap key for convenience).
    pub id: NodeId,
    pub name: Option<String>,
    /// Opaque operation handle. Carried along, never interpreted.
    pub component: Option<String>,
    pub node_type: NodeType,
    /// Accumulated requested region. Only ever grows once set.
    #[serde(default)]
    pub requested_region: Option<Region>,
    /// Region this node requires of its inputs, derived from `requested_region`.
    #[serde(default)]
    pub upstream_region: Option<Region>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeType {
    Input,
    /// Expands every interval by `margin` on each side.
    Convolution { input: NodeId, margin: i64 },
    /// Maps pooled coordinates back to the higher-resolution input space.
    Pooling { input: NodeId, factor: i64 },
    /// Channel concatenation; spatially the identity.
    Concatenate(Vec<NodeId>),
    /// Maps upsampled coordinates back to the lower-resolution input space.
    Upsample { input: NodeId, factor: i64 },
}

impl NodeType {
    /// Input nodes this operation depends on, in declaration order.
    pub fn inputs(&self) -> Vec<NodeId> {
        match self {
            NodeType::Input => vec![],
            NodeType::Convolution { input, .. }
            | NodeType::Pooling { input, .. }
            | NodeType::Upsample { input, .. } => vec![*input],
            NodeType::Concatenate(inputs) => inputs.clone(),
        }
    }

    /// Short operation name used in errors and logs.
    pub fn op_name(&self) -> &'static str {
        match self {
            NodeType::Input => "Input",
            NodeType::Convolution { .. } => "Convolution",
            NodeType::Pooling { .. } => "Pooling",
            NodeType::Concatenate(_) => "Concatenate",
            NodeType::Upsample { .. } => "Upsample",
        }
    }

    fn validate(&self) -> AsgResult<()> {
        let invalid = |reason: &str| AsgError::InvalidParameter {
            op: self.op_name().to_string(),
            reason: reason.to_string(),
        };
        match self {
            NodeType::Convolution { margin, .. } if *margin < 0 => {
                Err(invalid("margin must be non-negative"))
            }
            NodeType::Pooling { factor, .. } | NodeType::Upsample { factor, .. } if *factor < 1 => {
                Err(invalid("factor must be at least 1"))
            }
            NodeType::Concatenate(inputs) if inputs.is_empty() => {
                Err(invalid("at least one input is required"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asg {
    pub id: AsgId,
    pub name: Option<String>,
    pub nodes: HashMap<NodeId, Node>,
    pub inputs: Vec<NodeId>,
    pub outputs: Vec<NodeId>,
}

impl Asg {
    pub fn new(id: AsgId, name: Option<String>) -> Self {
        Self { id, name, nodes: HashMap::new(), inputs: vec![], outputs: vec![] }
    }

    /// Adds a node to the arena.
    ///
    /// Parameters are validated and every referenced input must already
    /// exist. The new node gets a fresh ID, so it can never close a cycle.
    pub fn add_node(
        &mut self,
        name: Option<String>,
        component: Option<String>,
        node_type: NodeType,
    ) -> AsgResult<NodeId> {
        node_type.validate()?;
        for input in node_type.inputs() {
            self.get_node(input)?;
        }
        Ok(self.insert_node(name, component, node_type))
    }

    /// Adds a terminal `Input` node and registers it as a graph input.
    pub fn add_input(&mut self, name: &str) -> NodeId {
        self.insert_node(Some(name.to_string()), None, NodeType::Input)
    }

    /// One past the largest ID in use. Loaded graphs may have gaps.
    fn next_id(&self) -> NodeId {
        self.nodes.keys().max().map_or(0, |max| max + 1)
    }

    fn insert_node(
        &mut self,
        name: Option<String>,
        component: Option<String>,
        node_type: NodeType,
    ) -> NodeId {
        let new_id = self.next_id();
        if matches!(node_type, NodeType::Input) {
            self.inputs.push(new_id);
        }
        let node = Node {
            id: new_id,
            name,
            component,
            node_type,
            requested_region: None,
            upstream_region: None,
        };
        self.nodes.insert(new_id, node);
        new_id
    }

    /// Checks parameters and edge targets of every node.
    ///
    /// Used for graphs that did not come from `add_node`, e.g. deserialized
    /// ones. Cycles are not rejected here; propagation detects them.
    pub fn validate(&self) -> AsgResult<()> {
        for (&id, node) in &self.nodes {
            if node.id != id {
                return Err(AsgError::InvalidParameter {
                    op: node.node_type.op_name().to_string(),
                    reason: format!("node stored under ID {} claims ID {}", id, node.id),
                });
            }
            node.node_type.validate()?;
            for input in node.node_type.inputs() {
                self.get_node(input)?;
            }
        }
        for id in self.inputs.iter().chain(&self.outputs) {
            self.get_node(*id)?;
        }
        Ok(())
    }

    pub fn set_outputs(&mut self, outputs: Vec<NodeId>) { self.outputs = outputs; }

    /// Shortcut for the common single-output case.
    pub fn set_output(&mut self, output: NodeId) {
        self.set_outputs(vec![output]);
    }

    pub fn get_node(&self, id: NodeId) -> AsgResult<&Node> {
        self.nodes.get(&id).ok_or(AsgError::NodeNotFound(id))
    }
    pub fn get_node_mut(&mut self, id: NodeId) -> AsgResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(AsgError::NodeNotFound(id))
    }

    /// Looks a node up by its name. Returns the first match by ID.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        let mut ids: Vec<_> = self
            .nodes
            .values()
            .filter(|n| n.name.as_deref() == Some(name))
            .map(|n| n.id)
            .collect();
        ids.sort_unstable();
        ids.first().copied()
    }

    /// Accumulated region of a node, if any request has reached it.
    pub fn requested_region(&self, id: NodeId) -> AsgResult<Option<&Region>> {
        Ok(self.get_node(id)?.requested_region.as_ref())
    }

    /// Clears every accumulated and derived region so the graph can be reused.
    pub fn reset_regions(&mut self) {
        for node in self.nodes.values_mut() {
            node.requested_region = None;
            node.upstream_region = None;
        }
    }
}
