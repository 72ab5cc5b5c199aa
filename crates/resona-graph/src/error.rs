//! Build-time error taxonomy and diagnostics.
//!
//! Builds never panic and never throw past the API boundary: every
//! problem becomes a [`BuildDiagnostic`]. Fatal diagnostics abort the
//! build (no operator is constructed); warnings are collected and the
//! build proceeds. Live edits after a successful build use a separate,
//! logged-and-ignored failure path — see the transactor and dynamic
//! operator modules.

use crate::node::NodeId;

/// A single build problem, tagged with the implicated graph entities.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BuildErrorKind {
    /// An edge endpoint does not resolve to a node in the graph.
    #[error("edge endpoint {node}:{vertex} does not resolve to a node in the graph")]
    DanglingVertex {
        /// The missing node.
        node: NodeId,
        /// The vertex the edge named on it.
        vertex: String,
    },

    /// A node exists but does not declare the vertex an edge names.
    #[error("node {node} declares no vertex named \"{vertex}\"")]
    MissingVertex {
        /// The node that was searched.
        node: NodeId,
        /// The vertex name that was not found.
        vertex: String,
    },

    /// More than one edge terminates at the same input vertex.
    #[error("input vertex {node}:{vertex} has more than one incoming edge")]
    DuplicateInput {
        /// Destination node.
        node: NodeId,
        /// Destination vertex.
        vertex: String,
    },

    /// The graph contains a cycle; building requires a DAG.
    #[error("graph contains a cycle through {nodes:?}")]
    GraphCycle {
        /// Every node on the detected cycle.
        nodes: Vec<NodeId>,
    },

    /// A node was removed by the configured pruning policy.
    #[error("node {node} was pruned")]
    NodePruned {
        /// The pruned node.
        node: NodeId,
    },

    /// Source and destination vertex of an edge declare different types.
    #[error(
        "edge {from}:{from_vertex} → {to}:{to_vertex} connects data type \"{from_type}\" to \"{to_type}\""
    )]
    InvalidConnectionDataType {
        /// Source node.
        from: NodeId,
        /// Source vertex.
        from_vertex: String,
        /// Source data type.
        from_type: &'static str,
        /// Destination node.
        to: NodeId,
        /// Destination vertex.
        to_vertex: String,
        /// Destination data type.
        to_type: &'static str,
    },

    /// An operator factory failed for a node.
    #[error("node {node} failed to create its operator: {message}")]
    OperatorCreation {
        /// The node whose factory failed.
        node: NodeId,
        /// Factory error text.
        message: String,
    },

    /// A required input reference could not be bound.
    #[error("input {node}:{vertex} could not be bound: {message}")]
    MissingInputDataReference {
        /// Destination node.
        node: NodeId,
        /// Destination vertex.
        vertex: String,
        /// Binding error text.
        message: String,
    },

    /// An operator finished binding with a declared output left unbound.
    #[error("output {node}:{vertex} was left unbound after binding")]
    MissingOutputDataReference {
        /// The operator's node.
        node: NodeId,
        /// The unbound output vertex.
        vertex: String,
    },

    /// A graph input's default reference could not be materialized.
    #[error("graph input \"{name}\" of data type \"{data_type}\" has no registered constructor")]
    InputDefaultInit {
        /// Graph input name.
        name: String,
        /// Unregistered data type.
        data_type: &'static str,
    },

    /// Invariant violation inside the builder itself.
    #[error("internal build error: {0}")]
    InternalError(String),
}

impl BuildErrorKind {
    /// Returns the default severity of this kind.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::NodePruned { .. }
            | Self::MissingOutputDataReference { .. }
            | Self::InputDefaultInit { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

/// How a diagnostic affects the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Collected; the build proceeds.
    Warning,
    /// Aborts the build.
    Error,
}

/// A build problem with its effective severity.
#[derive(Debug, Clone)]
pub struct BuildDiagnostic {
    /// What went wrong, with implicated entities.
    pub kind: BuildErrorKind,
    /// Effective severity after the builder's policy was applied.
    pub severity: Severity,
}

/// Fatal build failure: at least one error-severity diagnostic.
///
/// Carries every diagnostic collected up to the abort, warnings included.
#[derive(Debug, Clone, thiserror::Error)]
#[error("graph build failed: {}", summarize(.diagnostics))]
pub struct BuildError {
    /// All diagnostics collected during the build.
    pub diagnostics: Vec<BuildDiagnostic>,
}

fn summarize(diagnostics: &[BuildDiagnostic]) -> String {
    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    match diagnostics
        .iter()
        .find(|d| d.severity == Severity::Error)
    {
        Some(first) => format!("{} error(s), first: {}", errors, first.kind),
        None => String::from("no error diagnostics recorded"),
    }
}

/// Successful build: the built value plus any warning diagnostics.
#[derive(Debug)]
pub struct BuildOutput<T> {
    /// The built operator (or runtime state).
    pub operator: T,
    /// Warning diagnostics collected during the build.
    pub diagnostics: Vec<BuildDiagnostic>,
}
