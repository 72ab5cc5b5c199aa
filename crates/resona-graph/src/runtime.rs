//! Live runtime graph state: the operator map and execution tables.
//!
//! [`RuntimeGraph`] is the hot-path representation a render instance owns:
//! one [`OperatorInfo`] per node, three ordinal-sorted pass tables, and
//! graph-level vertex data. The static graph operator executes it as-is;
//! the dynamic operator additionally mutates it by applying transforms
//! between passes.
//!
//! This is deliberately a third representation of the same graph (next to
//! the declarative [`Graph`](crate::graph::Graph) and the sorter's
//! adjacency model): authoring, sort bookkeeping, and execution want
//! different shapes. A debug-only validator keeps the runtime shape
//! honest after every mutation.

use std::collections::HashMap;
use std::sync::Arc;

use resona_core::{
    AnyDataReference, Capabilities, DataTypeRegistry, Environment, Operator, OperatorSettings,
    ResetParams, VertexInterfaceData,
};

use crate::fade::{FadeDirection, FadeWrapper};
use crate::node::{Node, NodeId};

/// Live-edit failure. Logged by the applier; never aborts the queue.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ApplyError {
    /// The targeted operator is not in the runtime graph.
    #[error("operator {0} is not in the runtime graph")]
    MissingOperator(NodeId),

    /// An operator with this id already exists.
    #[error("operator {0} is already in the runtime graph")]
    DuplicateOperator(NodeId),

    /// The source operator has no bound output under this name.
    #[error("operator {node} has no bound output \"{vertex}\"")]
    UnboundOutput {
        /// Source operator.
        node: NodeId,
        /// Output vertex name.
        vertex: String,
    },

    /// An operator factory failed during live insertion.
    #[error("operator {node} failed to create: {message}")]
    OperatorCreation {
        /// The node whose factory failed.
        node: NodeId,
        /// Factory error text.
        message: String,
    },

    /// A vertex binding was rejected.
    #[error(transparent)]
    Bind(#[from] resona_core::BindError),

    /// Begin-fade on an operator that is already wrapped.
    #[error("operator {0} is already fading")]
    AlreadyFading(NodeId),

    /// End-fade on an operator that is not wrapped.
    #[error("operator {0} is not fading")]
    NotFading(NodeId),

    /// A literal could not be materialized for an unregistered data type.
    #[error("no data type \"{0}\" registered for literal materialization")]
    UnknownDataType(String),

    /// No graph-level vertex is exposed under this name.
    #[error("no exposed graph vertex named \"{0}\"")]
    UnknownExposure(String),
}

/// A routed consumer of one operator output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Connection {
    /// Destination operator.
    pub to: NodeId,
    /// Input vertex on the destination.
    pub vertex: String,
}

/// The operator storage slot: plain, or wrapped in a live fade.
pub(crate) enum OperatorSlot {
    /// The node's own operator.
    Plain(Box<dyn Operator>),
    /// The operator wrapped for a click-free topology change.
    Faded(FadeWrapper),
}

impl OperatorSlot {
    fn as_operator_mut(&mut self) -> &mut dyn Operator {
        match self {
            Self::Plain(operator) => operator.as_mut(),
            Self::Faded(wrapper) => wrapper,
        }
    }

    fn capabilities(&self) -> Capabilities {
        match self {
            Self::Plain(operator) => operator.capabilities(),
            Self::Faded(wrapper) => wrapper.capabilities(),
        }
    }

    pub(crate) fn is_faded(&self) -> bool {
        matches!(self, Self::Faded(_))
    }
}

/// Placeholder operator used while swapping a slot's contents.
struct InertOperator;

impl Operator for InertOperator {
    fn bind_inputs(&mut self, _inputs: &mut resona_core::InputVertexData) {}
    fn bind_outputs(&mut self, _outputs: &mut resona_core::OutputVertexData) {}
    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }
}

/// Everything the runtime knows about one live operator.
pub(crate) struct OperatorInfo {
    /// Execution rank; the only thing that determines pass order.
    pub ordinal: i64,
    /// The operator itself.
    pub slot: OperatorSlot,
    /// Bound inputs and outputs, upstream-facing (a fade wrapper's private
    /// rebinding is not visible here).
    pub vertex_data: VertexInterfaceData,
    /// Downstream consumers per output vertex name.
    pub output_connections: HashMap<String, Vec<Connection>>,
    /// Approximate render cost registered at insertion.
    pub render_cost: f32,
}

/// Runtime operator map plus ordinal-sorted pass tables.
pub(crate) struct RuntimeGraph {
    pub(crate) operators: HashMap<NodeId, OperatorInfo>,
    pub(crate) execute_table: Vec<NodeId>,
    pub(crate) post_execute_table: Vec<NodeId>,
    pub(crate) reset_table: Vec<NodeId>,
    /// Graph-input name → destination (operator, vertex).
    pub(crate) graph_inputs: HashMap<String, (NodeId, String)>,
    /// Graph-output name → source (operator, vertex).
    pub(crate) graph_outputs: HashMap<String, (NodeId, String)>,
    /// Graph-level interface and bindings.
    pub(crate) graph_data: VertexInterfaceData,
    pub(crate) settings: OperatorSettings,
    pub(crate) environment: Environment,
    pub(crate) registry: Arc<DataTypeRegistry>,
}

fn sorted_insert(table: &mut Vec<NodeId>, operators: &HashMap<NodeId, OperatorInfo>, id: NodeId) {
    let Some(info) = operators.get(&id) else {
        return;
    };
    if table.contains(&id) {
        return;
    }
    let ordinal = info.ordinal;
    let position = table.partition_point(|other| {
        operators.get(other).map_or(i64::MIN, |o| o.ordinal) < ordinal
    });
    table.insert(position, id);
}

impl RuntimeGraph {
    /// Creates an empty runtime for the given render instance.
    pub(crate) fn new(
        settings: OperatorSettings,
        environment: Environment,
        registry: Arc<DataTypeRegistry>,
    ) -> Self {
        Self {
            operators: HashMap::new(),
            execute_table: Vec::new(),
            post_execute_table: Vec::new(),
            reset_table: Vec::new(),
            graph_inputs: HashMap::new(),
            graph_outputs: HashMap::new(),
            graph_data: VertexInterfaceData::default(),
            settings,
            environment,
            registry,
        }
    }

    /// Returns the render settings.
    pub(crate) fn settings(&self) -> &OperatorSettings {
        &self.settings
    }

    /// Returns the operator's current ordinal.
    pub(crate) fn ordinal(&self, id: NodeId) -> Option<i64> {
        self.operators.get(&id).map(|info| info.ordinal)
    }

    /// Returns the number of live operators.
    pub(crate) fn operator_count(&self) -> usize {
        self.operators.len()
    }

    /// Returns true if the operator exists.
    pub(crate) fn contains(&self, id: NodeId) -> bool {
        self.operators.contains_key(&id)
    }

    /// Returns the summed render cost of every live operator.
    pub(crate) fn render_cost(&self) -> f32 {
        self.operators.values().map(|info| info.render_cost).sum()
    }

    /// Returns the reference bound to an operator input.
    pub(crate) fn input_reference(&self, id: NodeId, vertex: &str) -> Option<AnyDataReference> {
        self.operators
            .get(&id)?
            .vertex_data
            .inputs()
            .reference(vertex)
            .cloned()
    }

    /// Returns the reference bound to an operator output.
    pub(crate) fn output_reference(&self, id: NodeId, vertex: &str) -> Option<AnyDataReference> {
        self.operators
            .get(&id)?
            .vertex_data
            .outputs()
            .reference(vertex)
            .cloned()
    }

    /// Returns the reference behind a graph-level output.
    pub(crate) fn graph_output_reference(&self, name: &str) -> Option<AnyDataReference> {
        self.graph_data.outputs().reference(name).cloned()
    }

    /// Returns true if the operator is currently fade-wrapped.
    pub(crate) fn is_fading(&self, id: NodeId) -> bool {
        self.operators
            .get(&id)
            .is_some_and(|info| info.slot.is_faded())
    }

    // --- Construction (builder side) ---

    /// Inserts a fully built operator record; used by the builder, which
    /// wires inputs before instantiation.
    pub(crate) fn insert_built(&mut self, id: NodeId, info: OperatorInfo) {
        let caps = info.slot.capabilities();
        self.operators.insert(id, info);
        self.insert_into_tables(id, caps);
    }

    /// Overrides every operator's ordinal from an authoritative snapshot
    /// and resorts the tables. Operators absent from the snapshot keep
    /// their ordinals.
    pub(crate) fn set_ordinals(&mut self, ordinals: &HashMap<NodeId, i64>) {
        for (id, info) in &mut self.operators {
            if let Some(ordinal) = ordinals.get(id) {
                info.ordinal = *ordinal;
            }
        }
        self.resort_tables();
    }

    // --- Transform application primitives ---

    /// Instantiates a node's operator and inserts it, unconnected, at the
    /// given ordinal.
    pub(crate) fn insert_operator(
        &mut self,
        id: NodeId,
        node: &Arc<dyn Node>,
        ordinal: i64,
    ) -> Result<(), ApplyError> {
        if self.operators.contains_key(&id) {
            return Err(ApplyError::DuplicateOperator(id));
        }
        let mut vertex_data = VertexInterfaceData::new(node.vertex_interface());
        let mut operator = node
            .create_operator(crate::node::CreateOperatorParams {
                node_id: id,
                settings: &self.settings,
                inputs: vertex_data.inputs_mut(),
                environment: &self.environment,
            })
            .map_err(|err| ApplyError::OperatorCreation {
                node: id,
                message: err.to_string(),
            })?;
        operator.bind_inputs(vertex_data.inputs_mut());
        operator.bind_outputs(vertex_data.outputs_mut());
        let info = OperatorInfo {
            ordinal,
            slot: OperatorSlot::Plain(operator),
            vertex_data,
            output_connections: HashMap::new(),
            render_cost: node.render_cost(),
        };
        self.insert_built(id, info);
        tracing::debug!("runtime_insert: {id} at ordinal {ordinal}");
        Ok(())
    }

    /// Removes an operator, its table entries, and every routing record
    /// that targets it.
    pub(crate) fn remove_operator(&mut self, id: NodeId) -> Result<(), ApplyError> {
        if self.operators.remove(&id).is_none() {
            return Err(ApplyError::MissingOperator(id));
        }
        for info in self.operators.values_mut() {
            for connections in info.output_connections.values_mut() {
                connections.retain(|c| c.to != id);
            }
        }
        self.execute_table.retain(|other| *other != id);
        self.post_execute_table.retain(|other| *other != id);
        self.reset_table.retain(|other| *other != id);

        let stale_inputs: Vec<String> = self
            .graph_inputs
            .iter()
            .filter(|(_, (node, _))| *node == id)
            .map(|(name, _)| name.clone())
            .collect();
        for name in stale_inputs {
            self.graph_inputs.remove(&name);
            self.graph_data.inputs_mut().remove_vertex(&name);
        }
        let stale_outputs: Vec<String> = self
            .graph_outputs
            .iter()
            .filter(|(_, (node, _))| *node == id)
            .map(|(name, _)| name.clone())
            .collect();
        for name in stale_outputs {
            self.graph_outputs.remove(&name);
            self.graph_data.outputs_mut().remove_vertex(&name);
        }
        tracing::debug!("runtime_remove: {id}");
        Ok(())
    }

    /// Routes a source output into a destination input and rebinds the
    /// destination, propagating any resulting output changes forward.
    pub(crate) fn connect(
        &mut self,
        from: NodeId,
        from_vertex: &str,
        to: NodeId,
        to_vertex: &str,
    ) -> Result<(), ApplyError> {
        let reference = self
            .operators
            .get(&from)
            .ok_or(ApplyError::MissingOperator(from))?
            .vertex_data
            .outputs()
            .reference(from_vertex)
            .cloned()
            .ok_or_else(|| ApplyError::UnboundOutput {
                node: from,
                vertex: from_vertex.to_owned(),
            })?;

        let destination = self
            .operators
            .get_mut(&to)
            .ok_or(ApplyError::MissingOperator(to))?;
        destination
            .vertex_data
            .inputs_mut()
            .bind(to_vertex, reference)?;

        let source = self
            .operators
            .get_mut(&from)
            .ok_or(ApplyError::MissingOperator(from))?;
        source
            .output_connections
            .entry(from_vertex.to_owned())
            .or_default()
            .push(Connection {
                to,
                vertex: to_vertex.to_owned(),
            });

        self.rebind_and_propagate(to);
        tracing::debug!("runtime_connect: {from}:{from_vertex} → {to}:{to_vertex}");
        Ok(())
    }

    /// Binds a replacement reference to an operator input, severing any
    /// routing record that fed the vertex, then rebinds and propagates.
    pub(crate) fn set_input(
        &mut self,
        to: NodeId,
        vertex: &str,
        reference: AnyDataReference,
    ) -> Result<(), ApplyError> {
        for info in self.operators.values_mut() {
            for connections in info.output_connections.values_mut() {
                connections.retain(|c| !(c.to == to && c.vertex == vertex));
            }
        }
        let destination = self
            .operators
            .get_mut(&to)
            .ok_or(ApplyError::MissingOperator(to))?;
        destination.vertex_data.inputs_mut().bind(vertex, reference)?;
        self.rebind_and_propagate(to);
        tracing::debug!("runtime_set_input: {to}:{vertex}");
        Ok(())
    }

    /// Applies an ordinal swap batch and resorts the pass tables.
    pub(crate) fn swap_ordinals(&mut self, swaps: &[crate::sorter::OrdinalSwap]) {
        for swap in swaps {
            match self.operators.get_mut(&swap.operator) {
                Some(info) => {
                    if info.ordinal != swap.original {
                        tracing::warn!(
                            "ordinal swap for {}: expected original {} but found {}",
                            swap.operator,
                            swap.original,
                            info.ordinal,
                        );
                    }
                    info.ordinal = swap.new;
                }
                None => {
                    tracing::warn!("ordinal swap for unknown operator {}", swap.operator);
                }
            }
        }
        self.resort_tables();
    }

    /// Wraps an operator in a fade, rebinds it, and propagates the output
    /// substitution downstream.
    pub(crate) fn begin_fade(
        &mut self,
        id: NodeId,
        direction: FadeDirection,
        fade_inputs: Vec<String>,
        fade_outputs: Vec<String>,
    ) -> Result<(), ApplyError> {
        let block_size = self.settings.block_size();
        let info = self
            .operators
            .get_mut(&id)
            .ok_or(ApplyError::MissingOperator(id))?;
        if info.slot.is_faded() {
            return Err(ApplyError::AlreadyFading(id));
        }
        let inner = match std::mem::replace(
            &mut info.slot,
            OperatorSlot::Plain(Box::new(InertOperator)),
        ) {
            OperatorSlot::Plain(operator) => operator,
            OperatorSlot::Faded(_) => unreachable!("checked above"),
        };
        info.slot = OperatorSlot::Faded(FadeWrapper::new(
            inner,
            direction,
            fade_inputs,
            fade_outputs,
            block_size,
        ));
        self.update_table_membership(id);
        self.rebind_and_propagate(id);
        tracing::debug!("runtime_begin_fade: {id} {direction:?}");
        Ok(())
    }

    /// Unwraps a fade, rebinds the inner operator to the true vertex data,
    /// and propagates the output reversion downstream.
    pub(crate) fn end_fade(&mut self, id: NodeId) -> Result<(), ApplyError> {
        let info = self
            .operators
            .get_mut(&id)
            .ok_or(ApplyError::MissingOperator(id))?;
        if !info.slot.is_faded() {
            return Err(ApplyError::NotFading(id));
        }
        let wrapper = match std::mem::replace(
            &mut info.slot,
            OperatorSlot::Plain(Box::new(InertOperator)),
        ) {
            OperatorSlot::Faded(wrapper) => wrapper,
            OperatorSlot::Plain(_) => unreachable!("checked above"),
        };
        info.slot = OperatorSlot::Plain(wrapper.into_inner());
        self.update_table_membership(id);
        self.rebind_and_propagate(id);
        tracing::debug!("runtime_end_fade: {id}");
        Ok(())
    }

    /// Exposes an operator input as a graph-level input.
    pub(crate) fn add_input_destination(
        &mut self,
        name: &str,
        id: NodeId,
        vertex: &str,
    ) -> Result<(), ApplyError> {
        let info = self
            .operators
            .get(&id)
            .ok_or(ApplyError::MissingOperator(id))?;
        let declaration = info
            .vertex_data
            .inputs()
            .vertex(vertex)
            .ok_or_else(|| {
                ApplyError::Bind(resona_core::BindError::MissingVertex(vertex.to_owned()))
            })?
            .clone();
        let current = info.vertex_data.inputs().reference(vertex).cloned();
        self.graph_inputs
            .insert(name.to_owned(), (id, vertex.to_owned()));
        self.graph_data.inputs_mut().add_vertex(declaration);
        if let Some(reference) = current {
            let _ = self.graph_data.inputs_mut().bind(name, reference);
        }
        Ok(())
    }

    /// Removes a graph-level input by name.
    pub(crate) fn remove_input_destination(&mut self, name: &str) -> Result<(), ApplyError> {
        if self.graph_inputs.remove(name).is_none() {
            return Err(ApplyError::UnknownExposure(name.to_owned()));
        }
        self.graph_data.inputs_mut().remove_vertex(name);
        Ok(())
    }

    /// Exposes an operator output as a graph-level output.
    pub(crate) fn add_output_source(
        &mut self,
        name: &str,
        id: NodeId,
        vertex: &str,
    ) -> Result<(), ApplyError> {
        let info = self
            .operators
            .get(&id)
            .ok_or(ApplyError::MissingOperator(id))?;
        let declaration = info
            .vertex_data
            .outputs()
            .vertex(vertex)
            .ok_or_else(|| {
                ApplyError::Bind(resona_core::BindError::MissingVertex(vertex.to_owned()))
            })?
            .clone();
        let current = info.vertex_data.outputs().reference(vertex).cloned();
        self.graph_outputs
            .insert(name.to_owned(), (id, vertex.to_owned()));
        self.graph_data.outputs_mut().add_vertex(declaration);
        if let Some(reference) = current {
            let _ = self.graph_data.outputs_mut().bind(name, reference);
        }
        Ok(())
    }

    /// Removes a graph-level output by name.
    pub(crate) fn remove_output_source(&mut self, name: &str) -> Result<(), ApplyError> {
        if self.graph_outputs.remove(name).is_none() {
            return Err(ApplyError::UnknownExposure(name.to_owned()));
        }
        self.graph_data.outputs_mut().remove_vertex(name);
        Ok(())
    }

    /// Routes externally supplied graph-input references to their
    /// destination operators and propagates.
    pub(crate) fn rebind_graph_inputs(&mut self, data: &resona_core::InputVertexData) {
        let destinations: Vec<(String, NodeId, String)> = self
            .graph_inputs
            .iter()
            .map(|(name, (id, vertex))| (name.clone(), *id, vertex.clone()))
            .collect();
        for (name, id, vertex) in destinations {
            let Some(reference) = data.reference(&name).cloned() else {
                continue;
            };
            let bound = match self.operators.get_mut(&id) {
                Some(info) => info
                    .vertex_data
                    .inputs_mut()
                    .bind(&vertex, reference.clone()),
                None => continue,
            };
            match bound {
                Ok(()) => {
                    let _ = self.graph_data.inputs_mut().bind(&name, reference);
                    self.rebind_and_propagate(id);
                }
                Err(err) => {
                    tracing::warn!("graph input \"{name}\" could not bind to {id}:{vertex}: {err}");
                }
            }
        }
    }

    // --- Rebind propagation ---

    /// Rebinds an operator whose inputs changed and pushes any output
    /// identity changes through its connections, recursively. Runs
    /// entirely inside transform application — never concurrently with an
    /// execute pass.
    pub(crate) fn rebind_and_propagate(&mut self, start: NodeId) {
        let mut queue = vec![start];
        while let Some(id) = queue.pop() {
            let work = {
                let Some(info) = self.operators.get_mut(&id) else {
                    continue;
                };
                let before: Vec<(String, Option<resona_core::DataReferenceId>)> = info
                    .vertex_data
                    .outputs()
                    .vertices()
                    .iter()
                    .map(|v| {
                        let id = info
                            .vertex_data
                            .outputs()
                            .reference(v.name())
                            .map(|r| r.id());
                        (v.name().to_owned(), id)
                    })
                    .collect();

                {
                    let OperatorInfo {
                        slot, vertex_data, ..
                    } = &mut *info;
                    let (inputs, outputs) = vertex_data.split_mut();
                    let operator = slot.as_operator_mut();
                    operator.bind_inputs(inputs);
                    operator.bind_outputs(outputs);
                }

                let mut work: Vec<(NodeId, String, AnyDataReference)> = Vec::new();
                for (name, old_id) in before {
                    let Some(reference) = info.vertex_data.outputs().reference(&name) else {
                        continue;
                    };
                    if Some(reference.id()) == old_id {
                        continue;
                    }
                    if let Some(connections) = info.output_connections.get(&name) {
                        for connection in connections {
                            work.push((
                                connection.to,
                                connection.vertex.clone(),
                                reference.clone(),
                            ));
                        }
                    }
                }
                work
            };

            for (to, vertex, reference) in work {
                if let Some(destination) = self.operators.get_mut(&to) {
                    match destination.vertex_data.inputs_mut().bind(&vertex, reference) {
                        Ok(()) => queue.push(to),
                        Err(err) => {
                            tracing::warn!("rebind propagation into {to}:{vertex} failed: {err}");
                        }
                    }
                }
            }
        }
        self.refresh_graph_outputs();
        #[cfg(debug_assertions)]
        self.debug_validate();
    }

    /// Re-mirrors graph-level output bindings from their source operators.
    fn refresh_graph_outputs(&mut self) {
        let sources: Vec<(String, NodeId, String)> = self
            .graph_outputs
            .iter()
            .map(|(name, (id, vertex))| (name.clone(), *id, vertex.clone()))
            .collect();
        for (name, id, vertex) in sources {
            let reference = self
                .operators
                .get(&id)
                .and_then(|info| info.vertex_data.outputs().reference(&vertex))
                .cloned();
            if let Some(reference) = reference {
                let _ = self.graph_data.outputs_mut().bind(&name, reference);
            }
        }
    }

    // --- Table maintenance ---

    fn insert_into_tables(&mut self, id: NodeId, caps: Capabilities) {
        if caps.execute {
            sorted_insert(&mut self.execute_table, &self.operators, id);
        }
        if caps.post_execute {
            sorted_insert(&mut self.post_execute_table, &self.operators, id);
        }
        if caps.reset {
            sorted_insert(&mut self.reset_table, &self.operators, id);
        }
    }

    /// Re-derives table membership for one operator after its capability
    /// set may have changed (fade wrap/unwrap).
    fn update_table_membership(&mut self, id: NodeId) {
        let Some(caps) = self.operators.get(&id).map(|info| info.slot.capabilities()) else {
            return;
        };
        self.execute_table.retain(|other| *other != id);
        self.post_execute_table.retain(|other| *other != id);
        self.reset_table.retain(|other| *other != id);
        self.insert_into_tables(id, caps);
    }

    fn resort_tables(&mut self) {
        let operators = &self.operators;
        self.execute_table
            .sort_by_key(|id| operators.get(id).map_or(i64::MAX, |info| info.ordinal));
        self.post_execute_table
            .sort_by_key(|id| operators.get(id).map_or(i64::MAX, |info| info.ordinal));
        self.reset_table
            .sort_by_key(|id| operators.get(id).map_or(i64::MAX, |info| info.ordinal));
    }

    // --- Passes ---

    /// Runs the execute table in ascending ordinal order.
    pub(crate) fn run_execute(&mut self) {
        for index in 0..self.execute_table.len() {
            let id = self.execute_table[index];
            if let Some(info) = self.operators.get_mut(&id) {
                info.slot.as_operator_mut().execute();
            }
        }
    }

    /// Runs the post-execute table in descending ordinal order, so
    /// downstream consumers finish before upstream post-steps mutate
    /// shared values.
    pub(crate) fn run_post_execute(&mut self) {
        for index in (0..self.post_execute_table.len()).rev() {
            let id = self.post_execute_table[index];
            if let Some(info) = self.operators.get_mut(&id) {
                info.slot.as_operator_mut().post_execute();
            }
        }
    }

    /// Runs the reset table in ascending ordinal order against explicit
    /// context.
    pub(crate) fn run_reset_with(
        &mut self,
        settings: &OperatorSettings,
        environment: &Environment,
    ) {
        let params = ResetParams {
            settings,
            environment,
        };
        for index in 0..self.reset_table.len() {
            let id = self.reset_table[index];
            if let Some(info) = self.operators.get_mut(&id) {
                info.slot.as_operator_mut().reset(&params);
            }
        }
    }

    /// Runs the reset table against the runtime's own context.
    pub(crate) fn run_reset(&mut self) {
        let settings = self.settings;
        let environment = self.environment.clone();
        self.run_reset_with(&settings, &environment);
    }

    // --- Debug validation ---

    /// Cross-checks the runtime's invariants: table order and membership,
    /// connection targets, and the topological ordinal invariant over the
    /// live connection set.
    #[cfg(debug_assertions)]
    pub(crate) fn debug_validate(&self) {
        for table in [
            &self.execute_table,
            &self.post_execute_table,
            &self.reset_table,
        ] {
            for pair in table.windows(2) {
                let a = self.operators.get(&pair[0]).map(|i| i.ordinal);
                let b = self.operators.get(&pair[1]).map(|i| i.ordinal);
                debug_assert!(
                    a.is_some() && b.is_some() && a < b,
                    "table out of order: {pair:?} ({a:?} vs {b:?})"
                );
            }
        }
        for (id, info) in &self.operators {
            let caps = info.slot.capabilities();
            debug_assert_eq!(
                caps.execute,
                self.execute_table.contains(id),
                "execute table membership wrong for {id}"
            );
            debug_assert_eq!(
                caps.post_execute,
                self.post_execute_table.contains(id),
                "post-execute table membership wrong for {id}"
            );
            debug_assert_eq!(
                caps.reset,
                self.reset_table.contains(id),
                "reset table membership wrong for {id}"
            );
            for (vertex, connections) in &info.output_connections {
                debug_assert!(
                    info.vertex_data.outputs().vertex(vertex).is_some(),
                    "connection from undeclared output {id}:{vertex}"
                );
                for connection in connections {
                    let Some(destination) = self.operators.get(&connection.to) else {
                        debug_assert!(false, "connection into missing operator {}", connection.to);
                        continue;
                    };
                    debug_assert!(
                        info.ordinal < destination.ordinal,
                        "ordinal invariant violated: {id} ({}) feeds {} ({})",
                        info.ordinal,
                        connection.to,
                        destination.ordinal,
                    );
                    debug_assert!(
                        destination
                            .vertex_data
                            .inputs()
                            .vertex(&connection.vertex)
                            .is_some(),
                        "connection into undeclared input {}:{}",
                        connection.to,
                        connection.vertex,
                    );
                }
            }
        }
    }
}
