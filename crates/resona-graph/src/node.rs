//! Node identity and the operator factory contract.
//!
//! A [`Node`] is the engine's only extension point: DSP authors implement
//! it to declare a vertex interface and produce an [`Operator`] bound to
//! that interface. The engine never looks inside an operator — everything
//! it needs flows through the vertex data handed to the factory.

use core::fmt;

use resona_core::{Environment, InputVertexData, Operator, OperatorSettings, VertexInterface};

/// Unique identifier for a node in a graph.
///
/// Identifiers are assigned by the caller (typically an editor document)
/// and double as the runtime operator identity; they are never reused
/// while the node is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Error returned by an operator factory.
///
/// Factory failures surface as build diagnostics attached to the node;
/// they never panic the build or the render thread.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OperatorError {
    /// A vertex binding the factory required was missing or mistyped.
    #[error(transparent)]
    Bind(#[from] resona_core::BindError),

    /// Free-form factory failure.
    #[error("{0}")]
    Message(String),
}

/// Everything an operator factory gets to work with.
pub struct CreateOperatorParams<'a> {
    /// Identity of the node being instantiated.
    pub node_id: NodeId,
    /// Settings of the render instance this operator will run in.
    pub settings: &'a OperatorSettings,
    /// Input bindings, already wired from upstream operators and external
    /// inputs. Unbound vertices materialize their declared defaults via
    /// [`InputVertexData::get_or_default`].
    pub inputs: &'a mut InputVertexData,
    /// Host context passed unchanged through the build.
    pub environment: &'a Environment,
}

/// A graph node: a vertex interface plus an operator factory.
///
/// Nodes are shared as `Arc<dyn Node>` so one authored node can be
/// instantiated by several independently-running renders.
pub trait Node: Send + Sync {
    /// Returns the declared inputs and outputs of this node.
    fn vertex_interface(&self) -> &VertexInterface;

    /// Instantiates the node's operator against bound input data.
    fn create_operator(
        &self,
        params: CreateOperatorParams<'_>,
    ) -> Result<Box<dyn Operator>, OperatorError>;

    /// Approximate per-cycle render cost of this node's operator.
    ///
    /// Costs are summed across a live graph to approximate real-time
    /// render load; the unit is host-defined.
    fn render_cost(&self) -> f32 {
        1.0
    }
}
