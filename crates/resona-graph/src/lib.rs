//! Resona Graph - dynamic operator graph runtime
//!
//! A dataflow engine that builds, executes, and live-rewires directed
//! graphs of signal-processing operators while audio keeps rendering.
//!
//! # Architecture
//!
//! The system deliberately keeps **three representations** of the same
//! graph, each shaped for its job:
//!
//! - [`Graph`] - the declarative authoring description (nodes, edges,
//!   exposed vertices). No behavior, no runtime references.
//! - [`IncrementalSorter`] - the writer-side ordinal bookkeeping. Keeps
//!   every operator's execution rank valid as edges come and go, touching
//!   only the operators implicated by an edit instead of re-sorting the
//!   whole graph.
//! - the runtime operator map owned by each [`DynamicOperator`] /
//!   [`GraphOperator`] - the hot-path execution shape: operators plus
//!   three ordinal-sorted pass tables.
//!
//! Debug builds cross-validate the representations after every mutation.
//!
//! # Static builds
//!
//! [`OperatorBuilder`] validates a graph (dangling vertices, type
//! mismatches, duplicate inputs, cycles - with a configurable severity
//! policy), topologically sorts it, instantiates each node's operator in
//! order, and routes every output forward into its consumers' input
//! slots in the same pass. The result is a [`GraphOperator`] (fixed) or
//! [`RebindableGraphOperator`] (graph-level inputs swappable).
//!
//! # Live edits
//!
//! The [`Transactor`] is the only mutation API for a live graph. Each
//! edit updates the authoritative graph and sorter synchronously, then
//! broadcasts equivalent transforms over a single-producer queue to every
//! active render's [`DynamicOperator`], which drains them at the top of
//! its next cycle - all graph mutation happens between passes, never
//! concurrently with one. Audio-carrying connects and disconnects are
//! bracketed with a fade wrapper and an execute fence so the ramp runs
//! before the topology change lands; removed inputs always receive a
//! replacement value (silence for audio) - an operator never observes an
//! unbound input.
//!
//! # Example
//!
//! ```rust,ignore
//! use resona_graph::{Transactor, OperatorBuilder, BuilderSettings, BuildParams, NodeId};
//!
//! let registry = Arc::new(DataTypeRegistry::with_core_types());
//! let mut transactor = Transactor::with_graph(graph, Arc::clone(&registry))?;
//! let builder = OperatorBuilder::new(BuilderSettings::default(), registry);
//! let mut runtime = transactor.create_runtime(&builder, BuildParams::default())?.operator;
//!
//! // Render thread, per audio callback:
//! runtime.run_cycle();
//!
//! // Editor thread, any time:
//! transactor.add_node(NodeId(7), oscillator)?;
//! transactor.add_data_edge(NodeId(7), "Out", NodeId(3), "In")?;
//! ```

pub mod builder;
pub mod dynamic;
pub mod error;
pub mod graph;
pub mod graph_operator;
pub mod node;
pub mod sorter;
pub mod transactor;

mod fade;
mod runtime;
mod transform;

#[cfg(test)]
mod testing;

pub use builder::{BuildParams, BuilderSettings, OperatorBuilder, PrunePolicy};
pub use dynamic::DynamicOperator;
pub use error::{BuildDiagnostic, BuildError, BuildErrorKind, BuildOutput, Severity};
pub use graph::{Edge, Graph, GraphError, InputDestination, OutputSource};
pub use graph_operator::{GraphOperator, RebindableGraphOperator};
pub use node::{CreateOperatorParams, Node, NodeId, OperatorError};
pub use sorter::{IncrementalSorter, InsertLocation, OrdinalSwap};
pub use transactor::{EditError, Transactor};
