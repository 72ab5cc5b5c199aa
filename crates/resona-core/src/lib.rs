//! Resona Core - data model for the operator graph runtime
//!
//! This crate provides the leaf types the graph engine is built on: typed,
//! access-qualified references to shared data, vertex declarations and
//! bound vertex data, and the executable [`Operator`] contract.
//!
//! # Core Abstractions
//!
//! ## Data References
//!
//! - [`WriteRef`] / [`ReadRef`] / [`ValueRef`] - typed handles over shared
//!   storage; one producer writes, any number of consumers read
//! - [`AnyDataReference`] - the type-erased form vertex bindings and live
//!   edits carry, with access rules enforced on downcast
//! - [`DataReferenceId`] - storage identity, used to detect whether a
//!   rebind actually changed a binding without comparing values
//!
//! ## Vertices
//!
//! - [`InputVertex`] / [`OutputVertex`] / [`VertexInterface`] - named,
//!   typed slot declarations with access qualifiers and default literals
//! - [`InputVertexData`] / [`OutputVertexData`] / [`VertexInterfaceData`] -
//!   the references an interface is currently bound to, with checked
//!   binding and default-literal materialization
//!
//! ## Operators
//!
//! - [`Operator`] - bind inputs, publish outputs, and up to three
//!   per-cycle passes declared via [`Capabilities`]; an absent capability
//!   keeps the operator out of that execution table entirely
//!
//! ## Services
//!
//! - [`DataTypeRegistry`] - constructs values for data types known only by
//!   name (silence replacements, graph-input defaults)
//! - [`Environment`] - typed key→value side channel passed through builds
//!
//! Everything here is an explicit, injected object; the crate holds no
//! global state.

pub mod buffer;
pub mod data;
pub mod environment;
pub mod literal;
pub mod operator;
pub mod reference;
pub mod registry;
pub mod settings;
pub mod vertex;
pub mod vertex_data;

pub use buffer::AudioBuffer;
pub use data::GraphData;
pub use environment::Environment;
pub use literal::Literal;
pub use operator::{Capabilities, Operator, ResetParams};
pub use reference::{AccessKind, AnyDataReference, DataReferenceId, ReadRef, ValueRef, WriteRef};
pub use registry::DataTypeRegistry;
pub use settings::OperatorSettings;
pub use vertex::{InputVertex, OutputVertex, VertexAccess, VertexInterface};
pub use vertex_data::{BindError, InputVertexData, OutputVertexData, VertexInterfaceData};
