//! Fixed-topology graph operators produced by the builder.
//!
//! Two composition modes share the same built runtime state:
//!
//! - [`GraphOperator`] — the plain mode. Topology and bindings are fixed
//!   at build time; binding calls only publish the current graph-level
//!   references for host inspection and never rewire the interior.
//! - [`RebindableGraphOperator`] — graph-level inputs can be swapped
//!   after the build; a rebind routes the new references to their
//!   destination operators and propagates resulting output changes
//!   forward. This is the substrate the dynamic engine builds on.

use core::fmt;

use resona_core::{
    AnyDataReference, Capabilities, InputVertexData, Operator, OperatorSettings, OutputVertexData,
    ResetParams,
};

use crate::node::NodeId;
use crate::runtime::RuntimeGraph;

fn debug_runtime(name: &str, runtime: &RuntimeGraph, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct(name)
        .field("operator_count", &runtime.operator_count())
        .field("render_cost", &runtime.render_cost())
        .finish_non_exhaustive()
}

fn publish_outputs(runtime: &RuntimeGraph, outputs: &mut OutputVertexData) {
    let declarations: Vec<_> = runtime.graph_data.outputs().vertices().to_vec();
    for declaration in declarations {
        let name = declaration.name().to_owned();
        outputs.add_vertex(declaration);
        if let Some(reference) = runtime.graph_output_reference(&name)
            && let Err(err) = outputs.bind(&name, reference)
        {
            tracing::warn!("could not publish graph output \"{name}\": {err}");
        }
    }
}

fn publish_inputs(runtime: &RuntimeGraph, inputs: &mut InputVertexData) {
    let declarations: Vec<_> = runtime.graph_data.inputs().vertices().to_vec();
    for declaration in declarations {
        let name = declaration.name().to_owned();
        inputs.add_vertex(declaration);
        if let Some(reference) = runtime.graph_data.inputs().reference(&name).cloned()
            && let Err(err) = inputs.bind(&name, reference)
        {
            tracing::warn!("could not publish graph input \"{name}\": {err}");
        }
    }
}

fn table_capabilities(runtime: &RuntimeGraph) -> Capabilities {
    Capabilities {
        execute: !runtime.execute_table.is_empty(),
        post_execute: !runtime.post_execute_table.is_empty(),
        reset: !runtime.reset_table.is_empty(),
    }
}

/// A built graph executing as a single operator with fixed topology.
pub struct GraphOperator {
    runtime: RuntimeGraph,
}

impl fmt::Debug for GraphOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_runtime("GraphOperator", &self.runtime, f)
    }
}

impl GraphOperator {
    pub(crate) fn new(runtime: RuntimeGraph) -> Self {
        Self { runtime }
    }

    /// Returns the settings the graph was built with.
    pub fn settings(&self) -> &OperatorSettings {
        self.runtime.settings()
    }

    /// Returns the summed render cost of the graph's operators.
    pub fn render_cost(&self) -> f32 {
        self.runtime.render_cost()
    }

    /// Returns the reference bound to an interior operator input.
    pub fn input_reference(&self, id: NodeId, vertex: &str) -> Option<AnyDataReference> {
        self.runtime.input_reference(id, vertex)
    }

    /// Returns the reference bound to an interior operator output.
    pub fn output_reference(&self, id: NodeId, vertex: &str) -> Option<AnyDataReference> {
        self.runtime.output_reference(id, vertex)
    }

    /// Returns the reference behind a graph-level output.
    pub fn graph_output_reference(&self, name: &str) -> Option<AnyDataReference> {
        self.runtime.graph_output_reference(name)
    }
}

impl Operator for GraphOperator {
    /// Publishes the current graph-level input bindings.
    ///
    /// The plain graph operator cannot be rebound — its interior wiring
    /// was finalized at build time — so this only mirrors state outward.
    fn bind_inputs(&mut self, inputs: &mut InputVertexData) {
        publish_inputs(&self.runtime, inputs);
    }

    /// Publishes the graph-level outputs.
    fn bind_outputs(&mut self, outputs: &mut OutputVertexData) {
        publish_outputs(&self.runtime, outputs);
    }

    /// A pass is declared exactly when some interior operator takes part
    /// in it.
    fn capabilities(&self) -> Capabilities {
        table_capabilities(&self.runtime)
    }

    fn execute(&mut self) {
        self.runtime.run_execute();
    }

    fn post_execute(&mut self) {
        self.runtime.run_post_execute();
    }

    fn reset(&mut self, params: &ResetParams<'_>) {
        self.runtime.run_reset_with(params.settings, params.environment);
    }
}

/// A built graph whose graph-level inputs can be swapped after the build.
pub struct RebindableGraphOperator {
    runtime: RuntimeGraph,
}

impl fmt::Debug for RebindableGraphOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_runtime("RebindableGraphOperator", &self.runtime, f)
    }
}

impl RebindableGraphOperator {
    pub(crate) fn new(runtime: RuntimeGraph) -> Self {
        Self { runtime }
    }

    /// Returns the settings the graph was built with.
    pub fn settings(&self) -> &OperatorSettings {
        self.runtime.settings()
    }

    /// Returns the summed render cost of the graph's operators.
    pub fn render_cost(&self) -> f32 {
        self.runtime.render_cost()
    }

    /// Returns the reference bound to an interior operator input.
    pub fn input_reference(&self, id: NodeId, vertex: &str) -> Option<AnyDataReference> {
        self.runtime.input_reference(id, vertex)
    }

    /// Returns the reference bound to an interior operator output.
    pub fn output_reference(&self, id: NodeId, vertex: &str) -> Option<AnyDataReference> {
        self.runtime.output_reference(id, vertex)
    }

    /// Returns the reference behind a graph-level output.
    pub fn graph_output_reference(&self, name: &str) -> Option<AnyDataReference> {
        self.runtime.graph_output_reference(name)
    }
}

impl Operator for RebindableGraphOperator {
    /// Routes the supplied graph-input references to their destination
    /// operators and propagates any resulting output changes forward.
    fn bind_inputs(&mut self, inputs: &mut InputVertexData) {
        self.runtime.rebind_graph_inputs(inputs);
    }

    /// Publishes the graph-level outputs.
    fn bind_outputs(&mut self, outputs: &mut OutputVertexData) {
        publish_outputs(&self.runtime, outputs);
    }

    fn capabilities(&self) -> Capabilities {
        table_capabilities(&self.runtime)
    }

    fn execute(&mut self) {
        self.runtime.run_execute();
    }

    fn post_execute(&mut self) {
        self.runtime.run_post_execute();
    }

    fn reset(&mut self, params: &ResetParams<'_>) {
        self.runtime.run_reset_with(params.settings, params.environment);
    }
}
