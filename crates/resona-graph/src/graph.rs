//! Declarative graph description: nodes, edges, and exposed vertices.
//!
//! A [`Graph`] holds no runtime state — it is the authoring-side
//! description the builder validates and the transactor mutates. Edge
//! insertion checks vertex existence and data-type agreement; duplicate
//! inputs and cycles are deliberately legal here and rejected at build
//! time, because an in-progress edit session routinely passes through
//! states a build would refuse.

use std::collections::HashMap;
use std::sync::Arc;

use resona_core::{InputVertex, OutputVertex};

use crate::node::{Node, NodeId};

/// Error performing a graph edit.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GraphError {
    /// The node id is not present in the graph.
    #[error("node {0} is not in the graph")]
    UnknownNode(NodeId),

    /// A node with this id already exists.
    #[error("node {0} is already in the graph")]
    DuplicateNode(NodeId),

    /// The named vertex does not exist on the node.
    #[error("node {node} has no vertex named \"{vertex}\"")]
    UnknownVertex {
        /// Node that was searched.
        node: NodeId,
        /// Vertex name that was not found.
        vertex: String,
    },

    /// Source and destination vertex declare different data types.
    #[error(
        "cannot connect {from}:{from_vertex} ({from_type}) to {to}:{to_vertex} ({to_type}): data types differ"
    )]
    DataTypeMismatch {
        /// Source node.
        from: NodeId,
        /// Source vertex name.
        from_vertex: String,
        /// Source data type.
        from_type: &'static str,
        /// Destination node.
        to: NodeId,
        /// Destination vertex name.
        to_vertex: String,
        /// Destination data type.
        to_type: &'static str,
    },

    /// The edge is not present in the graph.
    #[error("no edge from {from}:{from_vertex} to {to}:{to_vertex}")]
    UnknownEdge {
        /// Source node.
        from: NodeId,
        /// Source vertex name.
        from_vertex: String,
        /// Destination node.
        to: NodeId,
        /// Destination vertex name.
        to_vertex: String,
    },

    /// No graph input/output is exposed under this name.
    #[error("no exposed graph vertex named \"{0}\"")]
    UnknownExposure(String),
}

/// A directed data connection between two node vertices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Source node.
    pub from: NodeId,
    /// Output vertex on the source node.
    pub from_vertex: String,
    /// Destination node.
    pub to: NodeId,
    /// Input vertex on the destination node.
    pub to_vertex: String,
}

/// A node input vertex exposed as a graph-level input.
///
/// The graph-level input takes the name of the exposed vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDestination {
    /// Node whose vertex receives the graph input.
    pub node: NodeId,
    /// Input vertex name on that node (also the graph input name).
    pub vertex: String,
}

/// A node output vertex exposed as a graph-level output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSource {
    /// Node whose vertex feeds the graph output.
    pub node: NodeId,
    /// Output vertex name on that node (also the graph output name).
    pub vertex: String,
}

/// Declarative node/edge storage.
#[derive(Clone, Default)]
pub struct Graph {
    nodes: HashMap<NodeId, Arc<dyn Node>>,
    edges: Vec<Edge>,
    input_destinations: Vec<InputDestination>,
    output_sources: Vec<OutputSource>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node under the given id.
    ///
    /// The graph owns the node until it is explicitly removed; nodes with
    /// no edges are retained on purpose — a live graph may connect them
    /// later.
    pub fn add_node(&mut self, id: NodeId, node: Arc<dyn Node>) -> Result<(), GraphError> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Removes a node, cascading removal of its edges and exposures.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Arc<dyn Node>, GraphError> {
        let node = self.nodes.remove(&id).ok_or(GraphError::UnknownNode(id))?;
        self.edges.retain(|e| e.from != id && e.to != id);
        self.input_destinations.retain(|d| d.node != id);
        self.output_sources.retain(|s| s.node != id);
        Ok(node)
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Arc<dyn Node>> {
        self.nodes.get(&id)
    }

    /// Iterates over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Arc<dyn Node>)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Looks up an input vertex declaration on a node.
    pub fn input_vertex(&self, id: NodeId, vertex: &str) -> Result<&InputVertex, GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))?;
        node.vertex_interface()
            .input(vertex)
            .ok_or_else(|| GraphError::UnknownVertex {
                node: id,
                vertex: vertex.to_owned(),
            })
    }

    /// Looks up an output vertex declaration on a node.
    pub fn output_vertex(&self, id: NodeId, vertex: &str) -> Result<&OutputVertex, GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::UnknownNode(id))?;
        node.vertex_interface()
            .output(vertex)
            .ok_or_else(|| GraphError::UnknownVertex {
                node: id,
                vertex: vertex.to_owned(),
            })
    }

    /// Adds a directed data edge between two vertices.
    ///
    /// Fails if either vertex is absent or the data-type names differ.
    /// Duplicate inputs and cycles are not checked here — the builder
    /// rejects them with full diagnostics.
    pub fn add_data_edge(
        &mut self,
        from: NodeId,
        from_vertex: &str,
        to: NodeId,
        to_vertex: &str,
    ) -> Result<(), GraphError> {
        let from_type = self.output_vertex(from, from_vertex)?.data_type();
        let to_type = self.input_vertex(to, to_vertex)?.data_type();
        if from_type != to_type {
            return Err(GraphError::DataTypeMismatch {
                from,
                from_vertex: from_vertex.to_owned(),
                from_type,
                to,
                to_vertex: to_vertex.to_owned(),
                to_type,
            });
        }
        self.edges.push(Edge {
            from,
            from_vertex: from_vertex.to_owned(),
            to,
            to_vertex: to_vertex.to_owned(),
        });
        Ok(())
    }

    /// Removes one instance of a data edge.
    pub fn remove_data_edge(
        &mut self,
        from: NodeId,
        from_vertex: &str,
        to: NodeId,
        to_vertex: &str,
    ) -> Result<(), GraphError> {
        let position = self
            .edges
            .iter()
            .position(|e| {
                e.from == from && e.from_vertex == from_vertex && e.to == to
                    && e.to_vertex == to_vertex
            })
            .ok_or_else(|| GraphError::UnknownEdge {
                from,
                from_vertex: from_vertex.to_owned(),
                to,
                to_vertex: to_vertex.to_owned(),
            })?;
        self.edges.remove(position);
        Ok(())
    }

    /// Returns all edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns true if an edge into the given input vertex exists.
    pub fn input_is_connected(&self, to: NodeId, to_vertex: &str) -> bool {
        self.edges
            .iter()
            .any(|e| e.to == to && e.to_vertex == to_vertex)
    }

    /// Exposes a node input vertex as a graph-level input.
    ///
    /// The graph input takes the vertex's name; re-exposing a name
    /// replaces the previous destination.
    pub fn add_input_data_destination(
        &mut self,
        node: NodeId,
        vertex: &str,
    ) -> Result<(), GraphError> {
        self.input_vertex(node, vertex)?;
        self.input_destinations.retain(|d| d.vertex != vertex);
        self.input_destinations.push(InputDestination {
            node,
            vertex: vertex.to_owned(),
        });
        Ok(())
    }

    /// Removes a graph-level input by name.
    pub fn remove_input_data_destination(&mut self, name: &str) -> Result<(), GraphError> {
        let before = self.input_destinations.len();
        self.input_destinations.retain(|d| d.vertex != name);
        if self.input_destinations.len() == before {
            return Err(GraphError::UnknownExposure(name.to_owned()));
        }
        Ok(())
    }

    /// Exposes a node output vertex as a graph-level output.
    pub fn add_output_data_source(
        &mut self,
        node: NodeId,
        vertex: &str,
    ) -> Result<(), GraphError> {
        self.output_vertex(node, vertex)?;
        self.output_sources.retain(|s| s.vertex != vertex);
        self.output_sources.push(OutputSource {
            node,
            vertex: vertex.to_owned(),
        });
        Ok(())
    }

    /// Removes a graph-level output by name.
    pub fn remove_output_data_source(&mut self, name: &str) -> Result<(), GraphError> {
        let before = self.output_sources.len();
        self.output_sources.retain(|s| s.vertex != name);
        if self.output_sources.len() == before {
            return Err(GraphError::UnknownExposure(name.to_owned()));
        }
        Ok(())
    }

    /// Returns the exposed graph-level inputs.
    pub fn input_destinations(&self) -> &[InputDestination] {
        &self.input_destinations
    }

    /// Returns the exposed graph-level outputs.
    pub fn output_sources(&self) -> &[OutputSource] {
        &self.output_sources
    }

    /// Returns the nodes with no edges that are not exposed as a graph
    /// input or output.
    ///
    /// Such nodes are valid — they are retained so a live session can
    /// connect them later — but a host may want to surface them.
    pub fn find_unconnected_nodes(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .nodes
            .keys()
            .copied()
            .filter(|&id| {
                !self.edges.iter().any(|e| e.from == id || e.to == id)
                    && !self.input_destinations.iter().any(|d| d.node == id)
                    && !self.output_sources.iter().any(|s| s.node == id)
            })
            .collect();
        ids.sort_unstable();
        ids
    }

    /// DFS reachability: does a directed path from `from` to `to` exist?
    pub fn has_path(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }
        let mut visited = Vec::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);
            for edge in &self.edges {
                if edge.from == current {
                    stack.push(edge.to);
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PassNode, SourceNode};

    fn audio_graph() -> (Graph, NodeId, NodeId) {
        let mut graph = Graph::new();
        let a = NodeId(1);
        let b = NodeId(2);
        graph.add_node(a, Arc::new(SourceNode::new())).unwrap();
        graph.add_node(b, Arc::new(PassNode::new())).unwrap();
        (graph, a, b)
    }

    #[test]
    fn test_add_edge_validates_vertices() {
        let (mut graph, a, b) = audio_graph();
        assert!(matches!(
            graph.add_data_edge(a, "Nope", b, "In"),
            Err(GraphError::UnknownVertex { .. })
        ));
        assert!(matches!(
            graph.add_data_edge(NodeId(99), "Out", b, "In"),
            Err(GraphError::UnknownNode(_))
        ));
        assert!(graph.add_data_edge(a, "Out", b, "In").is_ok());
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_add_edge_rejects_type_mismatch() {
        let (mut graph, a, b) = audio_graph();
        // SourceNode's "Level" output is float; PassNode's "In" is audio.
        assert!(matches!(
            graph.add_data_edge(a, "Level", b, "In"),
            Err(GraphError::DataTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_remove_node_cascades() {
        let (mut graph, a, b) = audio_graph();
        graph.add_data_edge(a, "Out", b, "In").unwrap();
        graph.add_output_data_source(b, "Out").unwrap();
        graph.remove_node(b).unwrap();
        assert!(graph.edges().is_empty());
        assert!(graph.output_sources().is_empty());
        assert!(graph.node(b).is_none());
    }

    #[test]
    fn test_unconnected_nodes_are_retained_and_reported() {
        let (mut graph, a, b) = audio_graph();
        let c = NodeId(3);
        graph.add_node(c, Arc::new(PassNode::new())).unwrap();
        graph.add_data_edge(a, "Out", b, "In").unwrap();
        assert_eq!(graph.find_unconnected_nodes(), vec![c]);
        // Exposing the vertex counts as connected.
        graph.add_input_data_destination(c, "In").unwrap();
        assert!(graph.find_unconnected_nodes().is_empty());
    }

    #[test]
    fn test_has_path() {
        let (mut graph, a, b) = audio_graph();
        let c = NodeId(3);
        graph.add_node(c, Arc::new(PassNode::new())).unwrap();
        graph.add_data_edge(a, "Out", b, "In").unwrap();
        graph.add_data_edge(b, "Out", c, "In").unwrap();
        assert!(graph.has_path(a, c));
        assert!(!graph.has_path(c, a));
    }

    #[test]
    fn test_exposure_replaces_same_name() {
        let (mut graph, _a, b) = audio_graph();
        let c = NodeId(3);
        graph.add_node(c, Arc::new(PassNode::new())).unwrap();
        graph.add_input_data_destination(b, "In").unwrap();
        graph.add_input_data_destination(c, "In").unwrap();
        assert_eq!(graph.input_destinations().len(), 1);
        assert_eq!(graph.input_destinations()[0].node, c);
        graph.remove_input_data_destination("In").unwrap();
        assert!(matches!(
            graph.remove_input_data_destination("In"),
            Err(GraphError::UnknownExposure(_))
        ));
    }
}
