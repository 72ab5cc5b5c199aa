//! Static operator builder: validation, topological sort, and binding.
//!
//! The builder turns a declarative [`Graph`] plus external input bindings
//! into an executable operator. Stages, in order, each gated by the
//! severity policy:
//!
//! 1. Structural validation — edge endpoints exist, data types agree, no
//!    input vertex has two incoming edges.
//! 2. Depth-first topological sort — ordinal assignment in traversal
//!    order; a cycle is fatal and enumerates its member nodes.
//! 3. Optional pruning of unreachable nodes (non-fatal diagnostics).
//! 4. Operator-info initialization and output-connection routing tables.
//! 5. External graph-input seeding; absent inputs default to the
//!    destination vertex's declared literal.
//! 6. Operator instantiation in ordinal order: bind inputs (already
//!    materialized from upstream), bind outputs, and route each output
//!    forward into downstream input slots — one pass wires the whole
//!    graph.
//! 7. Output-binding validation (non-fatal).
//!
//! The sort is deterministic (roots in ascending node id, edges in
//! insertion order) so independently seeded bookkeeping — notably the
//! transactor's incremental sorter — agrees with a fresh build of the
//! same graph.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use resona_core::{
    AnyDataReference, DataTypeRegistry, Environment, OperatorSettings, VertexInterfaceData,
};

use crate::error::{BuildDiagnostic, BuildError, BuildErrorKind, BuildOutput, Severity};
use crate::graph::Graph;
use crate::graph_operator::{GraphOperator, RebindableGraphOperator};
use crate::node::{CreateOperatorParams, NodeId};
use crate::runtime::{Connection, OperatorInfo, OperatorSlot, RuntimeGraph};

/// Which unreachable nodes the builder removes before instantiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrunePolicy {
    /// Keep every node.
    #[default]
    None,
    /// Remove nodes that cannot reach any exposed graph output.
    UnreachableFromOutputs,
    /// Remove nodes that neither reach an exposed output nor are fed by
    /// an exposed input.
    UnreachableFromIo,
}

/// Build policy knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuilderSettings {
    /// Pruning policy applied after the sort.
    pub prune: PrunePolicy,
    /// Treat warning diagnostics as fatal.
    pub fail_on_warnings: bool,
}

/// Per-build inputs: render settings, environment, and external bindings
/// for exposed graph inputs (keyed by graph-input name).
#[derive(Default)]
pub struct BuildParams {
    /// Settings of the render instance being built for.
    pub settings: OperatorSettings,
    /// Host context passed unchanged to every operator factory.
    pub environment: Environment,
    /// Externally supplied references for exposed graph inputs.
    pub graph_inputs: HashMap<String, AnyDataReference>,
}

/// Builds executable operators from declarative graphs.
pub struct OperatorBuilder {
    settings: BuilderSettings,
    registry: Arc<DataTypeRegistry>,
}

impl OperatorBuilder {
    /// Creates a builder with the given policy and data-type registry.
    pub fn new(settings: BuilderSettings, registry: Arc<DataTypeRegistry>) -> Self {
        Self { settings, registry }
    }

    /// Builds a fixed-topology graph operator.
    pub fn build_graph_operator(
        &self,
        graph: &Graph,
        params: BuildParams,
    ) -> Result<BuildOutput<GraphOperator>, BuildError> {
        let output = self.build_runtime(graph, params)?;
        Ok(BuildOutput {
            operator: GraphOperator::new(output.operator),
            diagnostics: output.diagnostics,
        })
    }

    /// Builds a graph operator whose graph-level inputs can be swapped
    /// after the build.
    pub fn build_rebindable(
        &self,
        graph: &Graph,
        params: BuildParams,
    ) -> Result<BuildOutput<RebindableGraphOperator>, BuildError> {
        let output = self.build_runtime(graph, params)?;
        Ok(BuildOutput {
            operator: RebindableGraphOperator::new(output.operator),
            diagnostics: output.diagnostics,
        })
    }

    /// The shared build routine both composition modes (and the dynamic
    /// engine) consume.
    pub(crate) fn build_runtime(
        &self,
        graph: &Graph,
        params: BuildParams,
    ) -> Result<BuildOutput<RuntimeGraph>, BuildError> {
        let mut diagnostics = Vec::new();

        // Stage 1: structural validation.
        self.validate_structure(graph, &mut diagnostics);
        if has_fatal(&diagnostics) {
            return Err(BuildError { diagnostics });
        }

        // Stage 2: topological sort.
        let order = match topological_order(graph) {
            Ok(order) => order,
            Err(cycle) => {
                self.note(&mut diagnostics, BuildErrorKind::GraphCycle { nodes: cycle });
                return Err(BuildError { diagnostics });
            }
        };

        // Stage 3: pruning.
        let retained = self.prune(graph, &order, &mut diagnostics);
        if has_fatal(&diagnostics) {
            return Err(BuildError { diagnostics });
        }

        // Stage 4 bookkeeping: group edges by endpoint for seeding and
        // routing.
        let mut incoming: HashMap<NodeId, Vec<usize>> = HashMap::new();
        let mut outgoing: HashMap<NodeId, Vec<usize>> = HashMap::new();
        for (index, edge) in graph.edges().iter().enumerate() {
            if retained.contains(&edge.from) && retained.contains(&edge.to) {
                incoming.entry(edge.to).or_default().push(index);
                outgoing.entry(edge.from).or_default().push(index);
            }
        }

        // Stage 5: external input seeds (or vertex-default literals).
        let seeds = self.collect_input_seeds(graph, &retained, &params, &mut diagnostics);

        // Stage 6: instantiate and bind in ordinal order, routing outputs
        // forward as we go.
        let mut runtime = RuntimeGraph::new(
            params.settings,
            params.environment.clone(),
            Arc::clone(&self.registry),
        );
        for (position, id) in order.iter().enumerate() {
            if !retained.contains(id) {
                continue;
            }
            let Some(node) = graph.node(*id) else {
                self.note(
                    &mut diagnostics,
                    BuildErrorKind::InternalError(format!("sorted node {id} vanished")),
                );
                return Err(BuildError { diagnostics });
            };

            let mut vertex_data = VertexInterfaceData::new(node.vertex_interface());

            for ((seed_node, vertex), reference) in &seeds {
                if seed_node == id
                    && let Err(err) = vertex_data.inputs_mut().bind(vertex, reference.clone())
                {
                    self.note(
                        &mut diagnostics,
                        BuildErrorKind::MissingInputDataReference {
                            node: *id,
                            vertex: vertex.clone(),
                            message: err.to_string(),
                        },
                    );
                }
            }

            if let Some(edge_indices) = incoming.get(id) {
                for &index in edge_indices {
                    let edge = &graph.edges()[index];
                    match runtime.output_reference(edge.from, &edge.from_vertex) {
                        Some(reference) => {
                            if let Err(err) =
                                vertex_data.inputs_mut().bind(&edge.to_vertex, reference)
                            {
                                self.note(
                                    &mut diagnostics,
                                    BuildErrorKind::MissingInputDataReference {
                                        node: *id,
                                        vertex: edge.to_vertex.clone(),
                                        message: err.to_string(),
                                    },
                                );
                            }
                        }
                        None => {
                            self.note(
                                &mut diagnostics,
                                BuildErrorKind::MissingInputDataReference {
                                    node: *id,
                                    vertex: edge.to_vertex.clone(),
                                    message: format!(
                                        "upstream output {}:{} is unbound",
                                        edge.from, edge.from_vertex
                                    ),
                                },
                            );
                        }
                    }
                }
            }
            if has_fatal(&diagnostics) {
                return Err(BuildError { diagnostics });
            }

            let mut operator = match node.create_operator(CreateOperatorParams {
                node_id: *id,
                settings: &params.settings,
                inputs: vertex_data.inputs_mut(),
                environment: &params.environment,
            }) {
                Ok(operator) => operator,
                Err(err) => {
                    self.note(
                        &mut diagnostics,
                        BuildErrorKind::OperatorCreation {
                            node: *id,
                            message: err.to_string(),
                        },
                    );
                    return Err(BuildError { diagnostics });
                }
            };
            operator.bind_inputs(vertex_data.inputs_mut());
            operator.bind_outputs(vertex_data.outputs_mut());

            // Stage 7: every declared output must have ended up bound.
            let unbound: Vec<String> = vertex_data
                .outputs()
                .vertices()
                .iter()
                .map(|v| v.name().to_owned())
                .filter(|name| !vertex_data.outputs().is_bound(name))
                .collect();
            for vertex in unbound {
                self.note(
                    &mut diagnostics,
                    BuildErrorKind::MissingOutputDataReference { node: *id, vertex },
                );
            }

            let mut output_connections: HashMap<String, Vec<Connection>> = HashMap::new();
            if let Some(edge_indices) = outgoing.get(id) {
                for &index in edge_indices {
                    let edge = &graph.edges()[index];
                    output_connections
                        .entry(edge.from_vertex.clone())
                        .or_default()
                        .push(Connection {
                            to: edge.to,
                            vertex: edge.to_vertex.clone(),
                        });
                }
            }

            runtime.insert_built(
                *id,
                OperatorInfo {
                    ordinal: position as i64,
                    slot: OperatorSlot::Plain(operator),
                    vertex_data,
                    output_connections,
                    render_cost: node.render_cost(),
                },
            );
        }

        // Graph-level exposures.
        for destination in graph.input_destinations() {
            if retained.contains(&destination.node)
                && let Err(err) = runtime.add_input_destination(
                    &destination.vertex,
                    destination.node,
                    &destination.vertex,
                )
            {
                self.note(
                    &mut diagnostics,
                    BuildErrorKind::InternalError(format!(
                        "could not expose graph input \"{}\": {err}",
                        destination.vertex
                    )),
                );
            }
        }
        for source in graph.output_sources() {
            if retained.contains(&source.node)
                && let Err(err) =
                    runtime.add_output_source(&source.vertex, source.node, &source.vertex)
            {
                self.note(
                    &mut diagnostics,
                    BuildErrorKind::InternalError(format!(
                        "could not expose graph output \"{}\": {err}",
                        source.vertex
                    )),
                );
            }
        }

        if has_fatal(&diagnostics) {
            return Err(BuildError { diagnostics });
        }
        #[cfg(debug_assertions)]
        runtime.debug_validate();
        Ok(BuildOutput {
            operator: runtime,
            diagnostics,
        })
    }

    fn note(&self, diagnostics: &mut Vec<BuildDiagnostic>, kind: BuildErrorKind) {
        let severity = if self.settings.fail_on_warnings {
            Severity::Error
        } else {
            kind.default_severity()
        };
        diagnostics.push(BuildDiagnostic { kind, severity });
    }

    fn validate_structure(&self, graph: &Graph, diagnostics: &mut Vec<BuildDiagnostic>) {
        for edge in graph.edges() {
            let from_node = graph.node(edge.from);
            let to_node = graph.node(edge.to);
            if from_node.is_none() {
                self.note(
                    diagnostics,
                    BuildErrorKind::DanglingVertex {
                        node: edge.from,
                        vertex: edge.from_vertex.clone(),
                    },
                );
            }
            if to_node.is_none() {
                self.note(
                    diagnostics,
                    BuildErrorKind::DanglingVertex {
                        node: edge.to,
                        vertex: edge.to_vertex.clone(),
                    },
                );
            }
            let (Some(from_node), Some(to_node)) = (from_node, to_node) else {
                continue;
            };
            let from_decl = from_node.vertex_interface().output(&edge.from_vertex);
            if from_decl.is_none() {
                self.note(
                    diagnostics,
                    BuildErrorKind::MissingVertex {
                        node: edge.from,
                        vertex: edge.from_vertex.clone(),
                    },
                );
            }
            let to_decl = to_node.vertex_interface().input(&edge.to_vertex);
            if to_decl.is_none() {
                self.note(
                    diagnostics,
                    BuildErrorKind::MissingVertex {
                        node: edge.to,
                        vertex: edge.to_vertex.clone(),
                    },
                );
            }
            if let (Some(from_decl), Some(to_decl)) = (from_decl, to_decl)
                && from_decl.data_type() != to_decl.data_type()
            {
                self.note(
                    diagnostics,
                    BuildErrorKind::InvalidConnectionDataType {
                        from: edge.from,
                        from_vertex: edge.from_vertex.clone(),
                        from_type: from_decl.data_type(),
                        to: edge.to,
                        to_vertex: edge.to_vertex.clone(),
                        to_type: to_decl.data_type(),
                    },
                );
            }
        }

        let mut seen: HashSet<(NodeId, &str)> = HashSet::new();
        let mut reported: HashSet<(NodeId, &str)> = HashSet::new();
        for edge in graph.edges() {
            let key = (edge.to, edge.to_vertex.as_str());
            if !seen.insert(key) && reported.insert(key) {
                self.note(
                    diagnostics,
                    BuildErrorKind::DuplicateInput {
                        node: edge.to,
                        vertex: edge.to_vertex.clone(),
                    },
                );
            }
        }
    }

    /// Computes the retained node set for the configured policy and emits
    /// a non-fatal diagnostic per pruned node.
    fn prune(
        &self,
        graph: &Graph,
        order: &[NodeId],
        diagnostics: &mut Vec<BuildDiagnostic>,
    ) -> HashSet<NodeId> {
        let all: HashSet<NodeId> = order.iter().copied().collect();
        let retained = match self.settings.prune {
            PrunePolicy::None => all.clone(),
            PrunePolicy::UnreachableFromOutputs => reach_backward(graph),
            PrunePolicy::UnreachableFromIo => {
                let mut keep = reach_backward(graph);
                keep.extend(reach_forward(graph));
                keep
            }
        };
        for id in order {
            if !retained.contains(id) {
                self.note(diagnostics, BuildErrorKind::NodePruned { node: *id });
            }
        }
        all.intersection(&retained).copied().collect()
    }

    fn collect_input_seeds(
        &self,
        graph: &Graph,
        retained: &HashSet<NodeId>,
        params: &BuildParams,
        diagnostics: &mut Vec<BuildDiagnostic>,
    ) -> Vec<((NodeId, String), AnyDataReference)> {
        let mut seeds = Vec::new();
        for destination in graph.input_destinations() {
            if !retained.contains(&destination.node) {
                continue;
            }
            let Ok(declaration) = graph.input_vertex(destination.node, &destination.vertex) else {
                continue;
            };
            if let Some(external) = params.graph_inputs.get(&destination.vertex) {
                seeds.push((
                    (destination.node, destination.vertex.clone()),
                    external.clone(),
                ));
            } else if let Some(default) = self.registry.create_value(
                declaration.data_type(),
                declaration.default_literal(),
                &params.settings,
            ) {
                seeds.push(((destination.node, destination.vertex.clone()), default));
            } else {
                self.note(
                    diagnostics,
                    BuildErrorKind::InputDefaultInit {
                        name: destination.vertex.clone(),
                        data_type: declaration.data_type(),
                    },
                );
            }
        }
        seeds
    }
}

fn has_fatal(diagnostics: &[BuildDiagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}

/// Backward reachability from every exposed graph output.
fn reach_backward(graph: &Graph) -> HashSet<NodeId> {
    let mut reached = HashSet::new();
    let mut stack: Vec<NodeId> = graph.output_sources().iter().map(|s| s.node).collect();
    while let Some(current) = stack.pop() {
        if !reached.insert(current) {
            continue;
        }
        for edge in graph.edges() {
            if edge.to == current {
                stack.push(edge.from);
            }
        }
    }
    reached
}

/// Forward reachability from every exposed graph input.
fn reach_forward(graph: &Graph) -> HashSet<NodeId> {
    let mut reached = HashSet::new();
    let mut stack: Vec<NodeId> = graph.input_destinations().iter().map(|d| d.node).collect();
    while let Some(current) = stack.pop() {
        if !reached.insert(current) {
            continue;
        }
        for edge in graph.edges() {
            if edge.from == current {
                stack.push(edge.to);
            }
        }
    }
    reached
}

/// Deterministic depth-first topological order.
///
/// Roots are visited in ascending node id and edges in insertion order,
/// so every consumer of the same graph computes the same order. On a
/// cycle, returns the nodes on the cycle.
pub(crate) fn topological_order(graph: &Graph) -> Result<Vec<NodeId>, Vec<NodeId>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Grey,
        Black,
    }

    let mut roots: Vec<NodeId> = graph.nodes().map(|(id, _)| id).collect();
    roots.sort_unstable();

    let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for edge in graph.edges() {
        if graph.node(edge.from).is_some() && graph.node(edge.to).is_some() {
            adjacency.entry(edge.from).or_default().push(edge.to);
        }
    }

    let mut color: HashMap<NodeId, Color> = roots.iter().map(|id| (*id, Color::White)).collect();
    let mut post_order = Vec::with_capacity(roots.len());
    let empty: Vec<NodeId> = Vec::new();

    for root in &roots {
        if color[root] != Color::White {
            continue;
        }
        let mut stack: Vec<(NodeId, usize)> = vec![(*root, 0)];
        color.insert(*root, Color::Grey);
        while let Some((node, child_index)) = stack.last().copied() {
            let children = adjacency.get(&node).unwrap_or(&empty);
            if child_index < children.len() {
                if let Some(entry) = stack.last_mut() {
                    entry.1 += 1;
                }
                let child = children[child_index];
                match color[&child] {
                    Color::White => {
                        color.insert(child, Color::Grey);
                        stack.push((child, 0));
                    }
                    Color::Grey => {
                        // Back edge: the stack suffix from the child's
                        // occurrence is the cycle.
                        let position = stack
                            .iter()
                            .position(|(n, _)| *n == child)
                            .unwrap_or(0);
                        return Err(stack[position..].iter().map(|(n, _)| *n).collect());
                    }
                    Color::Black => {}
                }
            } else {
                stack.pop();
                color.insert(node, Color::Black);
                post_order.push(node);
            }
        }
    }

    post_order.reverse();
    Ok(post_order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use resona_core::{AudioBuffer, Operator, WriteRef};

    use crate::graph::Graph;
    use crate::testing::{trace_log, PassNode, SourceNode, TraceNode};

    fn builder() -> OperatorBuilder {
        OperatorBuilder::new(
            BuilderSettings::default(),
            Arc::new(DataTypeRegistry::with_core_types()),
        )
    }

    #[test]
    fn test_build_routes_source_output_to_destination_input() {
        let mut graph = Graph::new();
        let a = NodeId(1);
        let b = NodeId(2);
        graph.add_node(a, Arc::new(SourceNode::with_value(0.5))).unwrap();
        graph.add_node(b, Arc::new(PassNode::new())).unwrap();
        graph.add_data_edge(a, "Out", b, "In").unwrap();
        graph.add_output_data_source(b, "Out").unwrap();

        let output = builder()
            .build_graph_operator(&graph, BuildParams::default())
            .unwrap();
        assert!(output.diagnostics.is_empty());
        let mut operator = output.operator;

        // Identity, not a copy: the destination input aliases the source
        // output's storage.
        assert_eq!(
            operator.input_reference(b, "In").unwrap().id(),
            operator.output_reference(a, "Out").unwrap().id(),
        );

        operator.execute();
        let out = operator.graph_output_reference("Out").unwrap();
        let buffer = out.as_read::<AudioBuffer>().unwrap();
        assert!(buffer.read().samples().iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_cycle_is_fatal_and_enumerates_nodes() {
        let log = trace_log();
        let mut graph = Graph::new();
        let a = NodeId(1);
        let b = NodeId(2);
        graph.add_node(a, Arc::new(TraceNode::new(1, Arc::clone(&log)))).unwrap();
        graph.add_node(b, Arc::new(TraceNode::new(2, Arc::clone(&log)))).unwrap();
        graph.add_data_edge(a, "Out", b, "In").unwrap();
        graph.add_data_edge(b, "Out", a, "In").unwrap();

        let err = builder()
            .build_graph_operator(&graph, BuildParams::default())
            .unwrap_err();
        let cycle = err
            .diagnostics
            .iter()
            .find_map(|d| match &d.kind {
                BuildErrorKind::GraphCycle { nodes } => Some(nodes.clone()),
                _ => None,
            })
            .expect("expected a cycle diagnostic");
        assert!(cycle.contains(&a) && cycle.contains(&b), "{cycle:?}");
        // No operator was constructed.
        assert!(take_no_trace(&log));
    }

    fn take_no_trace(log: &crate::testing::TraceLog) -> bool {
        crate::testing::take_trace(log).is_empty()
    }

    #[test]
    fn test_duplicate_input_is_fatal() {
        let mut graph = Graph::new();
        let a = NodeId(1);
        let b = NodeId(2);
        let c = NodeId(3);
        graph.add_node(a, Arc::new(SourceNode::new())).unwrap();
        graph.add_node(b, Arc::new(SourceNode::new())).unwrap();
        graph.add_node(c, Arc::new(PassNode::new())).unwrap();
        graph.add_data_edge(a, "Out", c, "In").unwrap();
        graph.add_data_edge(b, "Out", c, "In").unwrap();

        let err = builder()
            .build_graph_operator(&graph, BuildParams::default())
            .unwrap_err();
        assert!(err
            .diagnostics
            .iter()
            .any(|d| matches!(d.kind, BuildErrorKind::DuplicateInput { node, .. } if node == c)));
    }

    #[test]
    fn test_unbound_inputs_default_to_declared_literals() {
        let mut graph = Graph::new();
        let b = NodeId(1);
        graph.add_node(b, Arc::new(PassNode::new())).unwrap();
        graph.add_output_data_source(b, "Out").unwrap();

        let output = builder()
            .build_graph_operator(&graph, BuildParams::default())
            .unwrap();
        let mut operator = output.operator;
        operator.execute();
        // No upstream audio: the default literal is silence.
        let out = operator.graph_output_reference("Out").unwrap();
        let buffer = out.as_read::<AudioBuffer>().unwrap();
        assert!(buffer.read().samples().iter().all(|&s| s == 0.0));
        // The gain default materialized as a value reference.
        assert_eq!(
            *operator
                .input_reference(b, "Gain")
                .unwrap()
                .as_read::<f32>()
                .unwrap()
                .read(),
            1.0
        );
    }

    #[test]
    fn test_external_graph_input_seeds_destination() {
        let mut graph = Graph::new();
        let b = NodeId(1);
        graph.add_node(b, Arc::new(PassNode::new())).unwrap();
        graph.add_input_data_destination(b, "In").unwrap();
        graph.add_output_data_source(b, "Out").unwrap();

        let external = WriteRef::new(AudioBuffer::from_samples(vec![0.25; 256]));
        let mut params = BuildParams::default();
        params
            .graph_inputs
            .insert(String::from("In"), external.clone().into());

        let output = builder().build_graph_operator(&graph, params).unwrap();
        let operator = output.operator;
        assert_eq!(
            operator.input_reference(b, "In").unwrap().id(),
            external.id()
        );
    }

    #[test]
    fn test_prune_policy_removes_unreachable_nodes() {
        let mut graph = Graph::new();
        let a = NodeId(1);
        let b = NodeId(2);
        let orphan = NodeId(3);
        graph.add_node(a, Arc::new(SourceNode::new())).unwrap();
        graph.add_node(b, Arc::new(PassNode::new())).unwrap();
        graph.add_node(orphan, Arc::new(PassNode::new())).unwrap();
        graph.add_data_edge(a, "Out", b, "In").unwrap();
        graph.add_output_data_source(b, "Out").unwrap();

        let pruning = OperatorBuilder::new(
            BuilderSettings {
                prune: PrunePolicy::UnreachableFromOutputs,
                fail_on_warnings: false,
            },
            Arc::new(DataTypeRegistry::with_core_types()),
        );
        let output = pruning
            .build_graph_operator(&graph, BuildParams::default())
            .unwrap();
        assert!(output
            .diagnostics
            .iter()
            .any(|d| matches!(d.kind, BuildErrorKind::NodePruned { node } if node == orphan)));
        assert!(output.operator.input_reference(orphan, "In").is_none());

        // The default policy keeps the orphan.
        let output = builder()
            .build_graph_operator(&graph, BuildParams::default())
            .unwrap();
        assert!(output.diagnostics.is_empty());
        assert!(output.operator.input_reference(orphan, "In").is_some() || {
            // Unconnected inputs may be unbound until the factory
            // materializes defaults; presence in the runtime is enough.
            output.operator.output_reference(orphan, "Out").is_some()
        });
    }

    #[test]
    fn test_fail_on_warnings_upgrades_pruning() {
        let mut graph = Graph::new();
        let a = NodeId(1);
        let orphan = NodeId(2);
        graph.add_node(a, Arc::new(SourceNode::new())).unwrap();
        graph.add_node(orphan, Arc::new(PassNode::new())).unwrap();
        graph.add_output_data_source(a, "Out").unwrap();

        let strict = OperatorBuilder::new(
            BuilderSettings {
                prune: PrunePolicy::UnreachableFromOutputs,
                fail_on_warnings: true,
            },
            Arc::new(DataTypeRegistry::with_core_types()),
        );
        assert!(strict
            .build_graph_operator(&graph, BuildParams::default())
            .is_err());
    }

    #[test]
    fn test_rebindable_input_swap_propagates_identity() {
        let mut graph = Graph::new();
        let b = NodeId(1);
        let c = NodeId(2);
        graph.add_node(b, Arc::new(PassNode::new())).unwrap();
        graph.add_node(c, Arc::new(PassNode::new())).unwrap();
        graph.add_data_edge(b, "Out", c, "In").unwrap();
        graph.add_input_data_destination(b, "In").unwrap();
        graph.add_output_data_source(c, "Out").unwrap();

        let output = builder()
            .build_rebindable(&graph, BuildParams::default())
            .unwrap();
        let mut operator = output.operator;

        let replacement = WriteRef::new(AudioBuffer::silent(256));
        let mut external = resona_core::InputVertexData::new(vec![
            resona_core::InputVertex::new::<AudioBuffer>("In", resona_core::Literal::None),
        ]);
        external
            .bind("In", replacement.clone().into())
            .unwrap();
        operator.bind_inputs(&mut external);

        assert_eq!(
            operator.input_reference(b, "In").unwrap().id(),
            replacement.id()
        );
        // b republished its output; c still aliases b's output storage.
        assert_eq!(
            operator.input_reference(c, "In").unwrap().id(),
            operator.output_reference(b, "Out").unwrap().id()
        );
    }

    #[test]
    fn test_deterministic_order() {
        // Same node and edge set, different insertion order: identical
        // traversal result, so independently seeded bookkeeping agrees.
        let build_order = |insertion: &[u64]| {
            let mut graph = Graph::new();
            for &id in insertion {
                graph.add_node(NodeId(id), Arc::new(PassNode::new())).unwrap();
            }
            graph.add_data_edge(NodeId(1), "Out", NodeId(2), "In").unwrap();
            topological_order(&graph).unwrap()
        };
        assert_eq!(build_order(&[1, 2, 3]), build_order(&[3, 2, 1]));
    }
}
