//! Queueable edit operations against a live runtime graph.
//!
//! Transforms are constructed by the transactor and applied by the
//! dynamic operator during its drain step. They cross the writer→render
//! boundary by value: node factories travel as `Arc<dyn Node>`, replacement
//! values as literals (materialized render-side at the render instance's
//! block size), and references only when the writer explicitly supplies
//! one.

use std::fmt;
use std::sync::Arc;

use resona_core::{AnyDataReference, Literal};

use crate::fade::FadeDirection;
use crate::node::{Node, NodeId};
use crate::sorter::OrdinalSwap;

/// Payload of a set-input edit.
#[derive(Clone)]
pub(crate) enum InputSource {
    /// A live reference supplied by the writer.
    Reference(AnyDataReference),
    /// A literal materialized render-side for the named data type.
    Literal {
        /// Data-type name to construct.
        data_type: &'static str,
        /// The literal value.
        literal: Literal,
    },
}

/// One queued edit, tagged with how application continues.
///
/// Application order within a queue is total. A [`Transform::Fence`]
/// forces one full execute cycle before any later transform applies; an
/// [`Transform::Atomic`] sub-list applies as one unit with no intervening
/// execute.
#[derive(Clone)]
pub(crate) enum Transform {
    /// Apply an ordered sub-list with no intervening execute.
    Atomic(Vec<Transform>),
    /// Stop draining until one execute/post-execute cycle has run.
    Fence,
    /// Instantiate a node's operator, unconnected, at an ordinal.
    InsertOperator {
        /// Operator identity.
        id: NodeId,
        /// Factory to instantiate render-side.
        node: Arc<dyn Node>,
        /// Rank assigned by the writer's sorter.
        ordinal: i64,
    },
    /// Destroy an operator and its routing records.
    RemoveOperator {
        /// Operator identity.
        id: NodeId,
    },
    /// Route a source output into a destination input.
    ConnectOperators {
        /// Source operator.
        from: NodeId,
        /// Source output vertex.
        from_vertex: String,
        /// Destination operator.
        to: NodeId,
        /// Destination input vertex.
        to_vertex: String,
    },
    /// Replace a destination input's binding, severing any routing into it.
    SetOperatorInput {
        /// Destination operator.
        id: NodeId,
        /// Destination input vertex.
        vertex: String,
        /// Replacement binding.
        source: InputSource,
    },
    /// Apply an ordinal reassignment batch and resort the pass tables.
    SwapOrdinals {
        /// The batch, internally consistent.
        swaps: Vec<OrdinalSwap>,
    },
    /// Wrap an operator in an audio fade.
    BeginFade {
        /// Operator to wrap.
        id: NodeId,
        /// Ramp direction.
        direction: FadeDirection,
        /// Audio input vertices to ramp.
        fade_inputs: Vec<String>,
        /// Audio output vertices to ramp.
        fade_outputs: Vec<String>,
    },
    /// Unwrap a faded operator.
    EndFade {
        /// Operator to unwrap.
        id: NodeId,
    },
    /// Expose an operator input as a graph-level input.
    AddInputDestination {
        /// Graph input name.
        name: String,
        /// Destination operator.
        id: NodeId,
        /// Destination vertex.
        vertex: String,
    },
    /// Remove a graph-level input.
    RemoveInputDestination {
        /// Graph input name.
        name: String,
    },
    /// Expose an operator output as a graph-level output.
    AddOutputSource {
        /// Graph output name.
        name: String,
        /// Source operator.
        id: NodeId,
        /// Source vertex.
        vertex: String,
    },
    /// Remove a graph-level output.
    RemoveOutputSource {
        /// Graph output name.
        name: String,
    },
}

impl Transform {
    /// Short name for logging.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Atomic(_) => "Atomic",
            Self::Fence => "Fence",
            Self::InsertOperator { .. } => "InsertOperator",
            Self::RemoveOperator { .. } => "RemoveOperator",
            Self::ConnectOperators { .. } => "ConnectOperators",
            Self::SetOperatorInput { .. } => "SetOperatorInput",
            Self::SwapOrdinals { .. } => "SwapOrdinals",
            Self::BeginFade { .. } => "BeginFade",
            Self::EndFade { .. } => "EndFade",
            Self::AddInputDestination { .. } => "AddInputDestination",
            Self::RemoveInputDestination { .. } => "RemoveInputDestination",
            Self::AddOutputSource { .. } => "AddOutputSource",
            Self::RemoveOutputSource { .. } => "RemoveOutputSource",
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atomic(list) => write!(f, "Atomic({} transforms)", list.len()),
            other => f.write_str(other.name()),
        }
    }
}
