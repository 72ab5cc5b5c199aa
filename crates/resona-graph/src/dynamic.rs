//! The dynamic operator: queue consumer and execution engine.
//!
//! Each render cycle moves through drain → execute → post-execute.
//! Draining pops transforms from the writer's queue and applies them
//! against the local runtime state until the queue empties, a fence arms,
//! or the optional wall-clock budget runs out (deferring the remainder to
//! the next cycle; nothing is ever dropped). A fence armed in a previous
//! cycle suppresses draining entirely until post-execute clears it — that
//! is what guarantees an in-flight audio fade runs at least one full pass
//! before the topology change it protects is finalized.
//!
//! All graph mutation happens inside the drain step. The execute and
//! post-execute passes only walk the ordinal-sorted tables, so they never
//! observe a half-rewritten graph; correctness rests on
//! apply-all-transforms-before-any-execute, not on locking.
//!
//! Live-edit failures are logged and become no-ops — the render thread
//! stays panic-free.

use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use resona_core::{
    AnyDataReference, Capabilities, InputVertexData, Operator, OperatorSettings, OutputVertexData,
    ResetParams,
};

use crate::node::NodeId;
use crate::runtime::RuntimeGraph;
use crate::transform::{InputSource, Transform};

/// A live, editable graph operator driven by an external render callback.
///
/// Created by [`Transactor::create_runtime`](crate::transactor::Transactor::create_runtime);
/// one per active render of the graph. Implements [`Operator`] so dynamic
/// graphs nest inside other graphs.
pub struct DynamicOperator {
    runtime: RuntimeGraph,
    queue: Receiver<Transform>,
    fence_armed: bool,
    drain_budget: Option<Duration>,
}

impl core::fmt::Debug for DynamicOperator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DynamicOperator")
            .field("operator_count", &self.runtime.operator_count())
            .field("queued", &self.queue.len())
            .field("fence_armed", &self.fence_armed)
            .finish_non_exhaustive()
    }
}

impl DynamicOperator {
    pub(crate) fn new(runtime: RuntimeGraph, queue: Receiver<Transform>) -> Self {
        Self {
            runtime,
            queue,
            fence_armed: false,
            drain_budget: None,
        }
    }

    /// Sets a soft wall-clock budget for the drain step.
    ///
    /// When the budget runs out mid-drain, remaining transforms wait for
    /// the next cycle; nothing is dropped. Sustained edit pressure can
    /// therefore defer topology changes indefinitely — there is no drop
    /// or backpressure policy.
    pub fn set_drain_budget(&mut self, budget: Option<Duration>) {
        self.drain_budget = budget;
    }

    /// Runs one full render cycle: drain, execute, post-execute.
    pub fn run_cycle(&mut self) {
        Operator::execute(self);
        Operator::post_execute(self);
    }

    /// Flushes every queued transform (fences do not pause a flush), then
    /// runs the reset table in ascending order with the runtime's own
    /// context. Used for transport seeks and similar discontinuities.
    pub fn flush_and_reset(&mut self) {
        self.flush();
        self.runtime.run_reset();
    }

    // --- Introspection ---

    /// Returns the settings this runtime was built with.
    pub fn settings(&self) -> &OperatorSettings {
        self.runtime.settings()
    }

    /// Returns an operator's current execution rank.
    pub fn ordinal_of(&self, id: NodeId) -> Option<i64> {
        self.runtime.ordinal(id)
    }

    /// Returns the ids in the execute table, in execution order.
    pub fn execute_order(&self) -> Vec<NodeId> {
        self.runtime.execute_table.clone()
    }

    /// Returns the number of live operators.
    pub fn operator_count(&self) -> usize {
        self.runtime.operator_count()
    }

    /// Returns true if the operator is live.
    pub fn contains(&self, id: NodeId) -> bool {
        self.runtime.contains(id)
    }

    /// Returns the summed render cost of the live graph — an
    /// approximation of real-time render load.
    pub fn render_cost(&self) -> f32 {
        self.runtime.render_cost()
    }

    /// Returns the reference bound to an operator input.
    pub fn input_reference(&self, id: NodeId, vertex: &str) -> Option<AnyDataReference> {
        self.runtime.input_reference(id, vertex)
    }

    /// Returns the reference bound to an operator output.
    pub fn output_reference(&self, id: NodeId, vertex: &str) -> Option<AnyDataReference> {
        self.runtime.output_reference(id, vertex)
    }

    /// Returns the reference behind a graph-level output.
    pub fn graph_output_reference(&self, name: &str) -> Option<AnyDataReference> {
        self.runtime.graph_output_reference(name)
    }

    /// Returns true if the operator is currently fade-wrapped.
    pub fn is_fading(&self, id: NodeId) -> bool {
        self.runtime.is_fading(id)
    }

    // --- Drain ---

    fn drain(&mut self) {
        if self.fence_armed {
            return;
        }
        let deadline = self.drain_budget.map(|budget| Instant::now() + budget);
        loop {
            if let Some(deadline) = deadline
                && Instant::now() >= deadline
            {
                tracing::debug!("drain budget exhausted; deferring remaining transforms");
                break;
            }
            match self.queue.try_recv() {
                Ok(transform) => {
                    self.apply(transform);
                    if self.fence_armed {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    }

    fn flush(&mut self) {
        while let Ok(transform) = self.queue.try_recv() {
            if matches!(transform, Transform::Fence) {
                continue;
            }
            self.apply(transform);
        }
        self.fence_armed = false;
    }

    fn apply(&mut self, transform: Transform) {
        let name = transform.name();
        let result = match transform {
            Transform::Atomic(list) => {
                for sub in list {
                    self.apply(sub);
                }
                Ok(())
            }
            Transform::Fence => {
                self.fence_armed = true;
                Ok(())
            }
            Transform::InsertOperator { id, node, ordinal } => {
                self.runtime.insert_operator(id, &node, ordinal)
            }
            Transform::RemoveOperator { id } => self.runtime.remove_operator(id),
            Transform::ConnectOperators {
                from,
                from_vertex,
                to,
                to_vertex,
            } => self.runtime.connect(from, &from_vertex, to, &to_vertex),
            Transform::SetOperatorInput { id, vertex, source } => {
                let type_name = match &source {
                    InputSource::Literal { data_type, .. } => *data_type,
                    InputSource::Reference(reference) => reference.data_type(),
                };
                match self.resolve_source(source) {
                    Some(reference) => self.runtime.set_input(id, &vertex, reference),
                    None => Err(crate::runtime::ApplyError::UnknownDataType(
                        type_name.to_owned(),
                    )),
                }
            }
            Transform::SwapOrdinals { swaps } => {
                self.runtime.swap_ordinals(&swaps);
                Ok(())
            }
            Transform::BeginFade {
                id,
                direction,
                fade_inputs,
                fade_outputs,
            } => self
                .runtime
                .begin_fade(id, direction, fade_inputs, fade_outputs),
            Transform::EndFade { id } => self.runtime.end_fade(id),
            Transform::AddInputDestination { name, id, vertex } => {
                self.runtime.add_input_destination(&name, id, &vertex)
            }
            Transform::RemoveInputDestination { name } => {
                self.runtime.remove_input_destination(&name)
            }
            Transform::AddOutputSource { name, id, vertex } => {
                self.runtime.add_output_source(&name, id, &vertex)
            }
            Transform::RemoveOutputSource { name } => self.runtime.remove_output_source(&name),
        };
        if let Err(err) = result {
            tracing::warn!("transform {name} ignored: {err}");
        }
    }

    fn resolve_source(&self, source: InputSource) -> Option<AnyDataReference> {
        match source {
            InputSource::Reference(reference) => Some(reference),
            InputSource::Literal { data_type, literal } => {
                self.runtime
                    .registry
                    .create_value(data_type, &literal, &self.runtime.settings)
            }
        }
    }
}

impl Operator for DynamicOperator {
    /// Routes externally supplied graph-input references to their
    /// destination operators, propagating any output changes forward.
    fn bind_inputs(&mut self, inputs: &mut InputVertexData) {
        self.runtime.rebind_graph_inputs(inputs);
    }

    /// Publishes the graph-level outputs into `outputs`.
    fn bind_outputs(&mut self, outputs: &mut OutputVertexData) {
        let declarations: Vec<_> = self
            .runtime
            .graph_data
            .outputs()
            .vertices()
            .to_vec();
        for declaration in declarations {
            let name = declaration.name().to_owned();
            outputs.add_vertex(declaration);
            if let Some(reference) = self.runtime.graph_output_reference(&name)
                && let Err(err) = outputs.bind(&name, reference)
            {
                tracing::warn!("could not publish graph output \"{name}\": {err}");
            }
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    /// Drain queued transforms (unless a fence from a previous cycle is
    /// still armed), then run the execute table in ascending ordinal
    /// order.
    fn execute(&mut self) {
        self.drain();
        self.runtime.run_execute();
    }

    /// Run the post-execute table in descending ordinal order, then clear
    /// the fence.
    fn post_execute(&mut self) {
        self.runtime.run_post_execute();
        self.fence_armed = false;
    }

    /// Flush the queue, then run the reset table against the caller's
    /// context.
    fn reset(&mut self, params: &ResetParams<'_>) {
        self.flush();
        self.runtime
            .run_reset_with(params.settings, params.environment);
    }
}
