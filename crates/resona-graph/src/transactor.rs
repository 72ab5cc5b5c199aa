//! The transactor: the single write API for live graph edits.
//!
//! A [`Transactor`] owns the authoritative [`Graph`] and an
//! [`IncrementalSorter`] that tracks every operator's execution rank. Each
//! edit method mutates both synchronously, translates the edit into
//! transforms, and broadcasts them to every live runtime's queue — one
//! queue per active render of the graph, because the same logical edit
//! may target several independently-running renders (a graph being
//! auditioned while it also plays).
//!
//! Audio-carrying edits are never applied instantaneously: they are
//! bracketed with begin/end fade transforms and an execute fence so the
//! ramp actually runs before the topology change is finalized. Edge
//! removal installs a replacement literal (silence for audio) — an
//! operator never observes an unbound required input. A side table keyed
//! by destination vertex remembers which literal a disconnected vertex
//! currently holds, so reconnecting displaces the stale literal instead
//! of leaking it.

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::Sender;

use resona_core::{AudioBuffer, DataTypeRegistry, GraphData, Literal};

use crate::builder::{topological_order, BuildParams, OperatorBuilder};
use crate::dynamic::DynamicOperator;
use crate::error::{BuildDiagnostic, BuildError, BuildErrorKind, BuildOutput, Severity};
use crate::fade::FadeDirection;
use crate::graph::{Graph, GraphError};
use crate::node::{Node, NodeId};
use crate::sorter::{IncrementalSorter, InsertLocation};
use crate::transform::{InputSource, Transform};

/// Error performing a live edit. The transactor's own state is unchanged
/// when an edit fails; nothing is enqueued.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EditError {
    /// The underlying graph rejected the edit.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The edge would close a cycle in the live graph.
    #[error("connecting {from}:{from_vertex} to {to}:{to_vertex} would create a cycle")]
    WouldCycle {
        /// Source node.
        from: NodeId,
        /// Source vertex.
        from_vertex: String,
        /// Destination node.
        to: NodeId,
        /// Destination vertex.
        to_vertex: String,
    },

    /// The destination input already has an incoming edge.
    #[error("input {node}:{vertex} already has an incoming edge")]
    DuplicateInput {
        /// Destination node.
        node: NodeId,
        /// Destination vertex.
        vertex: String,
    },

    /// Set-value targets an input that is connected to an edge.
    #[error("input {node}:{vertex} is connected; remove the edge before setting a value")]
    VertexConnected {
        /// Destination node.
        node: NodeId,
        /// Destination vertex.
        vertex: String,
    },

    /// A replacement value was requested for a data type the registry
    /// cannot construct.
    #[error("data type \"{0}\" is not registered; cannot materialize a replacement value")]
    UnregisteredDataType(&'static str),
}

/// Authoritative live-graph state plus the transform fan-out.
pub struct Transactor {
    graph: Graph,
    sorter: IncrementalSorter,
    registry: Arc<DataTypeRegistry>,
    senders: Vec<Sender<Transform>>,
    /// Replacement literal currently standing in for each disconnected
    /// input, keyed by (destination node, vertex).
    literals: HashMap<(NodeId, String), Literal>,
}

impl Transactor {
    /// Creates a transactor over an empty graph.
    pub fn new(registry: Arc<DataTypeRegistry>) -> Self {
        Self {
            graph: Graph::new(),
            sorter: IncrementalSorter::new(),
            registry,
            senders: Vec::new(),
            literals: HashMap::new(),
        }
    }

    /// Creates a transactor over an existing graph, seeding the sorter
    /// with the same deterministic topological order a build computes.
    pub fn with_graph(
        graph: Graph,
        registry: Arc<DataTypeRegistry>,
    ) -> Result<Self, BuildError> {
        let order = topological_order(&graph).map_err(|cycle| BuildError {
            diagnostics: vec![BuildDiagnostic {
                kind: BuildErrorKind::GraphCycle { nodes: cycle },
                severity: Severity::Error,
            }],
        })?;
        let mut sorter = IncrementalSorter::new();
        for (position, id) in order.iter().enumerate() {
            sorter.insert_with_ordinal(*id, position as i64);
        }
        for edge in graph.edges() {
            let swaps = sorter.add_data_edge(edge.from, edge.to);
            debug_assert!(swaps.is_empty(), "seeding from a topological order");
        }
        Ok(Self {
            graph,
            sorter,
            registry,
            senders: Vec::new(),
            literals: HashMap::new(),
        })
    }

    /// Returns the authoritative graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Returns an operator's current execution rank.
    pub fn ordinal_of(&self, id: NodeId) -> Option<i64> {
        self.sorter.ordinal(id)
    }

    /// Builds a new live runtime of this graph and registers its queue.
    ///
    /// The freshly built runtime is stamped with the sorter's current
    /// ordinals so transform replay stays consistent across runtimes that
    /// joined at different times. Use a builder without pruning here — a
    /// pruned runtime would disagree with the authoritative graph about
    /// which operators exist.
    pub fn create_runtime(
        &mut self,
        builder: &OperatorBuilder,
        params: BuildParams,
    ) -> Result<BuildOutput<DynamicOperator>, BuildError> {
        let output = builder.build_runtime(&self.graph, params)?;
        let mut runtime = output.operator;
        runtime.set_ordinals(&self.sorter.ordinals());
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.senders.push(sender);
        Ok(BuildOutput {
            operator: DynamicOperator::new(runtime, receiver),
            diagnostics: output.diagnostics,
        })
    }

    // --- Edits ---

    /// Adds a node and inserts its operator, unconnected, after every
    /// existing operator.
    pub fn add_node(&mut self, id: NodeId, node: Arc<dyn Node>) -> Result<(), EditError> {
        self.graph.add_node(id, Arc::clone(&node))?;
        let ordinal = self.sorter.insert_operator(id, InsertLocation::Last);
        self.broadcast(Transform::InsertOperator { id, node, ordinal });
        self.debug_validate();
        Ok(())
    }

    /// Removes a node. Downstream inputs it fed receive replacement
    /// literals; audio outputs fade out first.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), EditError> {
        if self.graph.node(id).is_none() {
            return Err(GraphError::UnknownNode(id).into());
        }
        let outgoing: Vec<crate::graph::Edge> = self
            .graph
            .edges()
            .iter()
            .filter(|edge| edge.from == id)
            .cloned()
            .collect();

        let mut fade_outputs: Vec<String> = Vec::new();
        let mut finish: Vec<Transform> = Vec::new();
        for edge in &outgoing {
            let Ok(declaration) = self.graph.input_vertex(edge.to, &edge.to_vertex) else {
                continue;
            };
            let data_type = declaration.data_type();
            let literal = if data_type == AudioBuffer::TYPE_NAME {
                Literal::None
            } else {
                self.literals
                    .get(&(edge.to, edge.to_vertex.clone()))
                    .cloned()
                    .unwrap_or_else(|| declaration.default_literal().clone())
            };
            if data_type == AudioBuffer::TYPE_NAME
                && !fade_outputs.contains(&edge.from_vertex)
            {
                fade_outputs.push(edge.from_vertex.clone());
            }
            self.literals
                .insert((edge.to, edge.to_vertex.clone()), literal.clone());
            finish.push(Transform::SetOperatorInput {
                id: edge.to,
                vertex: edge.to_vertex.clone(),
                source: InputSource::Literal { data_type, literal },
            });
        }
        finish.push(Transform::RemoveOperator { id });

        self.graph.remove_node(id)?;
        self.sorter.remove_operator(id);
        self.literals.retain(|(node, _), _| *node != id);

        if fade_outputs.is_empty() {
            self.broadcast(Transform::Atomic(finish));
        } else {
            self.broadcast_all(vec![
                Transform::BeginFade {
                    id,
                    direction: FadeDirection::FadeOut,
                    fade_inputs: Vec::new(),
                    fade_outputs,
                },
                Transform::Fence,
                Transform::Atomic(finish),
            ]);
        }
        self.debug_validate();
        Ok(())
    }

    /// Connects two vertices. Audio connections fade in across one
    /// execute cycle.
    pub fn add_data_edge(
        &mut self,
        from: NodeId,
        from_vertex: &str,
        to: NodeId,
        to_vertex: &str,
    ) -> Result<(), EditError> {
        let from_type = self.graph.output_vertex(from, from_vertex)?.data_type();
        let to_type = self.graph.input_vertex(to, to_vertex)?.data_type();
        if from_type != to_type {
            return Err(GraphError::DataTypeMismatch {
                from,
                from_vertex: from_vertex.to_owned(),
                from_type,
                to,
                to_vertex: to_vertex.to_owned(),
                to_type,
            }
            .into());
        }
        if self.graph.input_is_connected(to, to_vertex) {
            return Err(EditError::DuplicateInput {
                node: to,
                vertex: to_vertex.to_owned(),
            });
        }
        if self.graph.has_path(to, from) {
            return Err(EditError::WouldCycle {
                from,
                from_vertex: from_vertex.to_owned(),
                to,
                to_vertex: to_vertex.to_owned(),
            });
        }

        self.graph
            .add_data_edge(from, from_vertex, to, to_vertex)?;
        let swaps = self.sorter.add_data_edge(from, to);
        // A connection displaces whatever literal stood in on the vertex.
        self.literals.remove(&(to, to_vertex.to_owned()));

        let mut steps = Vec::new();
        if !swaps.is_empty() {
            steps.push(Transform::SwapOrdinals { swaps });
        }
        steps.push(Transform::ConnectOperators {
            from,
            from_vertex: from_vertex.to_owned(),
            to,
            to_vertex: to_vertex.to_owned(),
        });

        if to_type == AudioBuffer::TYPE_NAME {
            steps.push(Transform::BeginFade {
                id: to,
                direction: FadeDirection::FadeIn,
                fade_inputs: vec![to_vertex.to_owned()],
                fade_outputs: Vec::new(),
            });
            self.broadcast_all(vec![
                Transform::Atomic(steps),
                Transform::Fence,
                Transform::EndFade { id: to },
            ]);
        } else if steps.len() == 1 {
            self.broadcast(steps.remove(0));
        } else {
            self.broadcast(Transform::Atomic(steps));
        }
        self.debug_validate();
        Ok(())
    }

    /// Removes an edge, installing `replacement` as the destination's new
    /// input. Audio disconnections fade out across one execute cycle
    /// before silence replaces the signal.
    pub fn remove_data_edge(
        &mut self,
        from: NodeId,
        from_vertex: &str,
        to: NodeId,
        to_vertex: &str,
        replacement: impl Into<Literal>,
    ) -> Result<(), EditError> {
        let data_type = self.graph.input_vertex(to, to_vertex)?.data_type();
        if !self.registry.contains(data_type) {
            return Err(EditError::UnregisteredDataType(data_type));
        }
        self.graph
            .remove_data_edge(from, from_vertex, to, to_vertex)?;
        self.sorter.remove_data_edge(from, to);
        let replacement = replacement.into();
        self.literals
            .insert((to, to_vertex.to_owned()), replacement.clone());

        let set_input = Transform::SetOperatorInput {
            id: to,
            vertex: to_vertex.to_owned(),
            source: InputSource::Literal {
                data_type,
                literal: replacement,
            },
        };
        if data_type == AudioBuffer::TYPE_NAME {
            self.broadcast_all(vec![
                Transform::BeginFade {
                    id: to,
                    direction: FadeDirection::FadeOut,
                    fade_inputs: vec![to_vertex.to_owned()],
                    fade_outputs: Vec::new(),
                },
                Transform::Fence,
                Transform::Atomic(vec![set_input, Transform::EndFade { id: to }]),
            ]);
        } else {
            self.broadcast(set_input);
        }
        self.debug_validate();
        Ok(())
    }

    /// Sets an unconnected input to a literal value.
    pub fn set_value(
        &mut self,
        to: NodeId,
        vertex: &str,
        value: impl Into<Literal>,
    ) -> Result<(), EditError> {
        let data_type = self.graph.input_vertex(to, vertex)?.data_type();
        if !self.registry.contains(data_type) {
            return Err(EditError::UnregisteredDataType(data_type));
        }
        if self.graph.input_is_connected(to, vertex) {
            return Err(EditError::VertexConnected {
                node: to,
                vertex: vertex.to_owned(),
            });
        }
        let value = value.into();
        self.literals
            .insert((to, vertex.to_owned()), value.clone());
        self.broadcast(Transform::SetOperatorInput {
            id: to,
            vertex: vertex.to_owned(),
            source: InputSource::Literal {
                data_type,
                literal: value,
            },
        });
        Ok(())
    }

    /// Exposes a node input as a graph-level input.
    pub fn add_input_data_destination(
        &mut self,
        node: NodeId,
        vertex: &str,
    ) -> Result<(), EditError> {
        self.graph.add_input_data_destination(node, vertex)?;
        self.broadcast(Transform::AddInputDestination {
            name: vertex.to_owned(),
            id: node,
            vertex: vertex.to_owned(),
        });
        Ok(())
    }

    /// Removes a graph-level input by name.
    pub fn remove_input_data_destination(&mut self, name: &str) -> Result<(), EditError> {
        self.graph.remove_input_data_destination(name)?;
        self.broadcast(Transform::RemoveInputDestination {
            name: name.to_owned(),
        });
        Ok(())
    }

    /// Exposes a node output as a graph-level output.
    pub fn add_output_data_source(
        &mut self,
        node: NodeId,
        vertex: &str,
    ) -> Result<(), EditError> {
        self.graph.add_output_data_source(node, vertex)?;
        self.broadcast(Transform::AddOutputSource {
            name: vertex.to_owned(),
            id: node,
            vertex: vertex.to_owned(),
        });
        Ok(())
    }

    /// Removes a graph-level output by name.
    pub fn remove_output_data_source(&mut self, name: &str) -> Result<(), EditError> {
        self.graph.remove_output_data_source(name)?;
        self.broadcast(Transform::RemoveOutputSource {
            name: name.to_owned(),
        });
        Ok(())
    }

    // --- Fan-out ---

    fn broadcast(&mut self, transform: Transform) {
        self.broadcast_all(vec![transform]);
    }

    /// Sends a transform sequence to every live runtime, pruning queues
    /// whose runtime has been dropped.
    fn broadcast_all(&mut self, transforms: Vec<Transform>) {
        self.senders.retain(|sender| {
            transforms
                .iter()
                .all(|transform| sender.send(transform.clone()).is_ok())
        });
    }

    /// Diffs the two writer-side graph representations: the declarative
    /// graph and the sorter's adjacency model must always agree.
    #[cfg(debug_assertions)]
    fn debug_validate(&self) {
        debug_assert_eq!(self.sorter.len(), self.graph.node_count());
        for (id, _) in self.graph.nodes() {
            debug_assert!(self.sorter.contains(id), "sorter missing node {id}");
        }
        let mut graph_edges: Vec<(NodeId, NodeId)> = self
            .graph
            .edges()
            .iter()
            .map(|edge| (edge.from, edge.to))
            .collect();
        let mut sorter_edges = self.sorter.edge_pairs();
        graph_edges.sort_unstable();
        sorter_edges.sort_unstable();
        debug_assert_eq!(graph_edges, sorter_edges, "edge sets diverged");
        for edge in self.graph.edges() {
            debug_assert!(
                self.sorter.ordinal(edge.from) < self.sorter.ordinal(edge.to),
                "ordinal invariant violated for {} -> {}",
                edge.from,
                edge.to,
            );
        }
    }

    #[cfg(not(debug_assertions))]
    fn debug_validate(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use resona_core::{AccessKind, Environment, OperatorSettings};

    use crate::builder::BuilderSettings;
    use crate::testing::{take_trace, trace_log, PassNode, SourceNode, TraceLog, TraceNode, TracePass};

    const BLOCK: usize = 8;

    fn builder() -> OperatorBuilder {
        OperatorBuilder::new(
            BuilderSettings::default(),
            Arc::new(DataTypeRegistry::with_core_types()),
        )
    }

    fn params() -> BuildParams {
        BuildParams {
            settings: OperatorSettings::new(48_000.0, BLOCK),
            environment: Environment::new(),
            graph_inputs: HashMap::new(),
        }
    }

    fn trace_pair() -> (Transactor, DynamicOperator, TraceLog) {
        let log = trace_log();
        let mut graph = Graph::new();
        graph
            .add_node(NodeId(1), Arc::new(TraceNode::new(1, Arc::clone(&log))))
            .unwrap();
        graph
            .add_node(NodeId(2), Arc::new(TraceNode::new(2, Arc::clone(&log))))
            .unwrap();
        graph.add_data_edge(NodeId(1), "Out", NodeId(2), "In").unwrap();
        let mut transactor =
            Transactor::with_graph(graph, Arc::new(DataTypeRegistry::with_core_types())).unwrap();
        let runtime = transactor.create_runtime(&builder(), params()).unwrap();
        (transactor, runtime.operator, log)
    }

    fn audio_pair() -> (Transactor, DynamicOperator) {
        let mut graph = Graph::new();
        graph
            .add_node(NodeId(1), Arc::new(SourceNode::with_value(1.0)))
            .unwrap();
        graph.add_node(NodeId(2), Arc::new(PassNode::new())).unwrap();
        graph.add_data_edge(NodeId(1), "Out", NodeId(2), "In").unwrap();
        graph.add_output_data_source(NodeId(2), "Out").unwrap();
        let mut transactor =
            Transactor::with_graph(graph, Arc::new(DataTypeRegistry::with_core_types())).unwrap();
        let runtime = transactor.create_runtime(&builder(), params()).unwrap();
        (transactor, runtime.operator)
    }

    fn graph_output_samples(operator: &DynamicOperator) -> Vec<f32> {
        operator
            .graph_output_reference("Out")
            .unwrap()
            .as_read::<resona_core::AudioBuffer>()
            .unwrap()
            .read()
            .samples()
            .to_vec()
    }

    #[test]
    fn test_cycle_passes_run_in_ordinal_order() {
        let (_transactor, mut operator, log) = trace_pair();
        operator.run_cycle();
        assert_eq!(
            take_trace(&log),
            vec![
                (1, TracePass::Execute),
                (2, TracePass::Execute),
                (2, TracePass::PostExecute),
                (1, TracePass::PostExecute),
            ],
        );
    }

    #[test]
    fn test_insert_node_between_live_operators() {
        let (mut transactor, mut operator, log) = trace_pair();
        operator.run_cycle();
        take_trace(&log);

        let a = NodeId(1);
        let b = NodeId(2);
        let c = NodeId(3);
        transactor
            .remove_data_edge(a, "Out", b, "In", 0.0f32)
            .unwrap();
        transactor
            .add_node(c, Arc::new(TraceNode::new(3, Arc::clone(&log))))
            .unwrap();
        transactor.add_data_edge(a, "Out", c, "In").unwrap();
        transactor.add_data_edge(c, "Out", b, "In").unwrap();

        // All four edits drain in one cycle; no fence separates them.
        operator.run_cycle();
        let executes: Vec<u64> = take_trace(&log)
            .into_iter()
            .filter(|(_, pass)| *pass == TracePass::Execute)
            .map(|(tag, _)| tag)
            .collect();
        assert_eq!(executes, vec![1, 3, 2], "expected a, c, b");
        assert_eq!(operator.execute_order(), vec![a, c, b]);

        // The runtime agrees with the writer-side sorter.
        for id in [a, b, c] {
            assert_eq!(operator.ordinal_of(id), transactor.ordinal_of(id));
        }
    }

    #[test]
    fn test_built_references_alias_source_storage() {
        let (_transactor, operator) = audio_pair();
        assert_eq!(
            operator.input_reference(NodeId(2), "In").unwrap().id(),
            operator.output_reference(NodeId(1), "Out").unwrap().id(),
        );
    }

    #[test]
    fn test_remove_float_edge_installs_value_literal() {
        let (mut transactor, mut operator, log) = trace_pair();
        let a = NodeId(1);
        let b = NodeId(2);
        transactor
            .remove_data_edge(a, "Out", b, "In", 0.5f32)
            .unwrap();
        operator.run_cycle();
        take_trace(&log);

        let reference = operator.input_reference(b, "In").unwrap();
        assert_ne!(
            reference.id(),
            operator.output_reference(a, "Out").unwrap().id()
        );
        assert_eq!(reference.access(), AccessKind::Value);
        assert_eq!(*reference.as_read::<f32>().unwrap().read(), 0.5);
    }

    #[test]
    fn test_remove_audio_edge_fades_then_silences() {
        let (mut transactor, mut operator) = audio_pair();
        let source = NodeId(1);
        let pass = NodeId(2);

        operator.run_cycle();
        assert!(graph_output_samples(&operator).iter().all(|&s| s == 1.0));

        transactor
            .remove_data_edge(source, "Out", pass, "In", Literal::None)
            .unwrap();

        // Fade cycle: the wrapper is installed and ramps the input down;
        // the destination is never unbound.
        operator.run_cycle();
        assert!(operator.is_fading(pass));
        assert!(operator.input_reference(pass, "In").is_some());
        let faded = graph_output_samples(&operator);
        assert!(faded[0] > *faded.last().unwrap(), "ramp down: {faded:?}");
        assert_eq!(*faded.last().unwrap(), 0.0);

        // Post-fence cycle: silence literal replaces the signal and the
        // wrapper is removed.
        operator.run_cycle();
        assert!(!operator.is_fading(pass));
        let reference = operator.input_reference(pass, "In").unwrap();
        assert_eq!(reference.access(), AccessKind::Value);
        assert!(graph_output_samples(&operator).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_remove_node_keeps_faded_operator_for_one_cycle() {
        let (mut transactor, mut operator) = audio_pair();
        let source = NodeId(1);
        let pass = NodeId(2);

        operator.run_cycle();
        transactor.remove_node(source).unwrap();

        // The fence holds removal back; the faded operator still executes.
        operator.run_cycle();
        assert_eq!(operator.operator_count(), 2);
        assert!(operator.is_fading(source));
        assert!(operator.contains(source));

        operator.run_cycle();
        assert_eq!(operator.operator_count(), 1);
        assert!(!operator.contains(source));
        let reference = operator.input_reference(pass, "In").unwrap();
        assert_eq!(reference.access(), AccessKind::Value);
        assert!(graph_output_samples(&operator).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_set_value_on_unconnected_input() {
        let (mut transactor, mut operator) = audio_pair();
        let pass = NodeId(2);
        transactor.set_value(pass, "Gain", 2.0f32).unwrap();
        operator.run_cycle();
        assert!(graph_output_samples(&operator).iter().all(|&s| s == 2.0));
    }

    #[test]
    fn test_set_value_rejected_on_connected_input() {
        let (mut transactor, _operator) = audio_pair();
        let err = transactor
            .set_value(NodeId(2), "In", Literal::None)
            .unwrap_err();
        assert!(matches!(err, EditError::VertexConnected { .. }));
    }

    #[test]
    fn test_reconnect_displaces_stale_literal() {
        let (mut transactor, mut operator) = audio_pair();
        let source = NodeId(1);
        let pass = NodeId(2);

        transactor
            .remove_data_edge(source, "Out", pass, "In", Literal::None)
            .unwrap();
        operator.run_cycle();
        operator.run_cycle();

        transactor.add_data_edge(source, "Out", pass, "In").unwrap();
        operator.run_cycle();
        operator.run_cycle();

        assert_eq!(
            operator.input_reference(pass, "In").unwrap().id(),
            operator.output_reference(source, "Out").unwrap().id(),
        );
        operator.run_cycle();
        assert!(graph_output_samples(&operator).iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_duplicate_input_and_cycle_rejected() {
        let (mut transactor, _operator, _log) = trace_pair();
        let a = NodeId(1);
        let b = NodeId(2);
        let c = NodeId(3);
        let log = trace_log();
        transactor
            .add_node(c, Arc::new(TraceNode::new(3, log)))
            .unwrap();

        let err = transactor.add_data_edge(c, "Out", b, "In").unwrap_err();
        assert!(matches!(err, EditError::DuplicateInput { .. }));

        let err = transactor.add_data_edge(b, "Out", a, "In").unwrap_err();
        assert!(matches!(err, EditError::WouldCycle { .. }));
    }

    #[test]
    fn test_multiple_runtimes_replay_the_same_edits() {
        let log = trace_log();
        let mut graph = Graph::new();
        graph
            .add_node(NodeId(1), Arc::new(TraceNode::new(1, Arc::clone(&log))))
            .unwrap();
        let mut transactor =
            Transactor::with_graph(graph, Arc::new(DataTypeRegistry::with_core_types())).unwrap();
        let mut first = transactor
            .create_runtime(&builder(), params())
            .unwrap()
            .operator;
        let mut second = transactor
            .create_runtime(&builder(), params())
            .unwrap()
            .operator;

        transactor
            .add_node(NodeId(2), Arc::new(TraceNode::new(2, Arc::clone(&log))))
            .unwrap();
        transactor
            .add_data_edge(NodeId(2), "Out", NodeId(1), "In")
            .unwrap();

        first.run_cycle();
        second.run_cycle();
        assert_eq!(first.execute_order(), vec![NodeId(2), NodeId(1)]);
        assert_eq!(second.execute_order(), vec![NodeId(2), NodeId(1)]);
        assert_eq!(first.operator_count(), 2);
        assert_eq!(second.operator_count(), 2);
    }

    #[test]
    fn test_late_joining_runtime_sees_current_order() {
        let (mut transactor, mut operator, log) = trace_pair();
        let a = NodeId(1);
        let b = NodeId(2);
        let c = NodeId(3);
        transactor.remove_data_edge(a, "Out", b, "In", 0.0f32).unwrap();
        transactor
            .add_node(c, Arc::new(TraceNode::new(3, Arc::clone(&log))))
            .unwrap();
        transactor.add_data_edge(a, "Out", c, "In").unwrap();
        transactor.add_data_edge(c, "Out", b, "In").unwrap();
        operator.run_cycle();

        // A runtime created after the edits starts from the live order.
        let mut late = transactor
            .create_runtime(&builder(), params())
            .unwrap()
            .operator;
        late.run_cycle();
        assert_eq!(late.execute_order(), vec![a, c, b]);
    }

    #[test]
    fn test_flush_and_reset_applies_pending_edits_then_resets() {
        let (mut transactor, mut operator, log) = trace_pair();
        take_trace(&log);
        transactor
            .add_node(NodeId(3), Arc::new(TraceNode::new(3, Arc::clone(&log))))
            .unwrap();

        operator.flush_and_reset();
        assert_eq!(operator.operator_count(), 3);
        let resets: Vec<u64> = take_trace(&log)
            .into_iter()
            .filter(|(_, pass)| *pass == TracePass::Reset)
            .map(|(tag, _)| tag)
            .collect();
        assert_eq!(resets.len(), 3);
    }

    #[test]
    fn test_render_cost_tracks_insertions_and_removals() {
        let (mut transactor, mut operator, log) = trace_pair();
        assert_eq!(operator.render_cost(), 2.0);
        transactor
            .add_node(NodeId(3), Arc::new(TraceNode::new(3, Arc::clone(&log))))
            .unwrap();
        operator.run_cycle();
        assert_eq!(operator.render_cost(), 3.0);
        transactor.remove_node(NodeId(3)).unwrap();
        operator.run_cycle();
        assert_eq!(operator.render_cost(), 2.0);
    }
}
