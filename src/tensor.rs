//! Module defining `Tensor` and `GraphContext`.
//!
//! A `Tensor` is not a data container. It is a lightweight handle to a node
//! in the abstract semantic graph (ASG). Operations on tensors (`conv`,
//! `pool`, `upsample`, `concat`) add nodes to the graph; nothing is computed.
//!
//! `GraphContext` owns the ASG being built and the configuration used when
//! regions are requested through a handle.

use crate::analysis::region_propagation::{
    PropagationConfig, PropagationError, PropagationStats, RegionPropagation,
};
use crate::asg::{Asg, AsgError, AsgResult, NodeId, NodeType};
use crate::region::Region;
use std::cell::RefCell;
use std::rc::Rc;

/// Context that owns and manages the construction of one ASG.
///
/// Wrapped in `Rc<RefCell<>>` so many `Tensor` handles can share it.
#[derive(Debug, Clone)]
pub struct GraphContext {
    main_graph: Asg,
    propagation: PropagationConfig,
}

impl GraphContext {
    /// Creates a new, empty graph context.
    pub fn new() -> Self {
        Self::with_config(PropagationConfig::default())
    }

    pub fn with_config(propagation: PropagationConfig) -> Self {
        Self {
            main_graph: Asg::new(0, Some("main".to_string())),
            propagation,
        }
    }

    /// Wraps the context for sharing between handles.
    pub fn shared(self) -> Rc<RefCell<GraphContext>> {
        Rc::new(RefCell::new(self))
    }

    pub fn main_graph_mut(&mut self) -> &mut Asg {
        &mut self.main_graph
    }

    pub fn main_graph(&self) -> &Asg {
        &self.main_graph
    }

    pub fn propagation_config(&self) -> &PropagationConfig {
        &self.propagation
    }
}

impl Default for GraphContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Symbolic handle for a node in the ASG.
///
/// Holds the node ID and a reference to the `GraphContext` the node lives in.
#[derive(Debug, Clone)]
pub struct Tensor {
    pub node_id: NodeId,
    pub context: Rc<RefCell<GraphContext>>,
}

impl Tensor {
    /// Creates a new input node, the leaf every request ends at.
    pub fn new_input(context: &Rc<RefCell<GraphContext>>, name: &str) -> Self {
        let node_id = context.borrow_mut().main_graph_mut().add_input(name);
        Self {
            node_id,
            context: Rc::clone(context),
        }
    }

    /// Adds an arbitrary operation node.
    ///
    /// `component` is the opaque operation handle; it is stored but never read
    /// by the region calculation.
    pub fn from_op(
        context: &Rc<RefCell<GraphContext>>,
        name: Option<&str>,
        component: Option<&str>,
        node_type: NodeType,
    ) -> AsgResult<Self> {
        let node_id = context.borrow_mut().main_graph_mut().add_node(
            name.map(str::to_string),
            component.map(str::to_string),
            node_type,
        )?;
        Ok(Self {
            node_id,
            context: Rc::clone(context),
        })
    }

    /// Convolution that reads `margin` extra positions on each side.
    pub fn conv(&self, margin: i64) -> AsgResult<Tensor> {
        Self::from_op(&self.context, None, None, NodeType::Convolution { input: self.node_id, margin })
    }

    /// Downsampling by `factor`.
    pub fn pool(&self, factor: i64) -> AsgResult<Tensor> {
        Self::from_op(&self.context, None, None, NodeType::Pooling { input: self.node_id, factor })
    }

    /// Upsampling by `factor`.
    pub fn upsample(&self, factor: i64) -> AsgResult<Tensor> {
        Self::from_op(&self.context, None, None, NodeType::Upsample { input: self.node_id, factor })
    }

    /// Channel concatenation of `inputs`, in order.
    pub fn concat(inputs: &[&Tensor]) -> AsgResult<Tensor> {
        let first = inputs.first().ok_or_else(|| AsgError::InvalidParameter {
            op: "Concatenate".to_string(),
            reason: "at least one input is required".to_string(),
        })?;
        if inputs.iter().any(|t| !Rc::ptr_eq(&t.context, &first.context)) {
            return Err(AsgError::InvalidParameter {
                op: "Concatenate".to_string(),
                reason: "inputs belong to different graph contexts".to_string(),
            });
        }
        let ids = inputs.iter().map(|t| t.node_id).collect();
        Self::from_op(&first.context, None, None, NodeType::Concatenate(ids))
    }

    /// Requests `region` at this node and propagates it to all ancestors.
    pub fn request_region(&self, region: &Region) -> Result<PropagationStats, PropagationError> {
        let mut ctx = self.context.borrow_mut();
        let engine = RegionPropagation::new(ctx.propagation_config().clone());
        engine.run(ctx.main_graph_mut(), self.node_id, region)
    }

    /// Region accumulated at this node so far. `None` until a request reaches it.
    pub fn requested_region(&self) -> AsgResult<Option<Region>> {
        let ctx = self.context.borrow();
        let region = ctx.main_graph().get_node(self.node_id)?.requested_region.clone();
        Ok(region)
    }

    /// Region this node last required of its inputs.
    pub fn upstream_region(&self) -> AsgResult<Option<Region>> {
        let ctx = self.context.borrow();
        let region = ctx.main_graph().get_node(self.node_id)?.upstream_region.clone();
        Ok(region)
    }
}
