//! Engine-private working copy of the input graph
//!
//! Every vertex and edge of the caller's graph is wrapped once, and the
//! wrappers only carry indices back to the caller's ids. Dummy vertices and
//! segments added for long edges live in the same arena and are dropped with
//! it, so the caller's graph is never touched.

use super::LayeredLayoutError;
use derive_more::{Constructor, Display, From};
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences, IntoNodeIdentifiers};
use petgraph::Direction;
use std::collections::HashMap;
use std::hash::Hash;

pub(crate) type VertexId = NodeIndex;

/// Index of a [`Segment`] in [`DecoratedGraph::segments`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From)]
#[display("s{_0}")]
pub(crate) struct SegmentId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VertexKind {
    /// Wraps the caller's vertex at this index
    Original(usize),
    /// Upper end of a segment
    P,
    /// Lower end of a segment
    Q,
    /// Middle of an edge spanning exactly two layers
    R,
}

#[derive(Debug, Clone)]
pub(crate) struct DecoratedVertex {
    pub kind: VertexKind,
    pub layer: usize,
    pub index_in_layer: usize,
    pub measured_position: f64,
    pub do_not_optimize: bool,
    pub segment: Option<SegmentId>,
    pub permutation_index: usize,
}

impl DecoratedVertex {
    pub fn new(kind: VertexKind) -> Self {
        Self {
            kind,
            layer: 0,
            index_in_layer: 0,
            measured_position: 0.0,
            do_not_optimize: false,
            segment: None,
            permutation_index: 0,
        }
    }

    pub fn original(&self) -> Option<usize> {
        match self.kind {
            VertexKind::Original(index) => Some(index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DecoratedEdge {
    /// Index of the caller's edge this one stands for
    pub original: Option<usize>,
    /// Set when cycle removal flipped the edge
    pub reversed: bool,
    /// Set when the edge crosses a segment in the final ordering
    pub marked: bool,
}

impl DecoratedEdge {
    pub fn for_original(index: usize) -> Self {
        Self {
            original: Some(index),
            ..Default::default()
        }
    }
}

/// Straight stand-in for the dummy vertices of a long edge between its P and
/// Q vertices
#[derive(Debug, Clone, Copy, Constructor)]
pub(crate) struct Segment {
    pub p: VertexId,
    pub q: VertexId,
}

/// Sequence of working vertices an original edge is drawn through, in
/// working-graph direction
#[derive(Debug, Clone)]
pub(crate) struct EdgeChain {
    pub original: usize,
    pub vertices: Vec<VertexId>,
    pub reversed: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct DecoratedGraph {
    pub graph: StableDiGraph<DecoratedVertex, DecoratedEdge>,
    pub segments: Vec<Segment>,
    pub layers: Vec<Vec<VertexId>>,
    pub chains: Vec<EdgeChain>,
    /// Caller's vertices removed because they have no edges
    pub isolated: Vec<usize>,
    /// Caller's edges removed because they loop on one vertex
    pub self_loops: Vec<usize>,
}

impl DecoratedGraph {
    /// Wrap every vertex and edge of `graph`
    ///
    /// Returns the working graph along with the caller's vertex and edge ids,
    /// indexed the same way as [`VertexKind::Original`] and
    /// [`DecoratedEdge::original`].
    #[allow(clippy::type_complexity)]
    pub fn from_graph<G>(
        graph: G,
    ) -> Result<(Self, Vec<G::NodeId>, Vec<G::EdgeId>), LayeredLayoutError>
    where
        G: IntoNodeIdentifiers + IntoEdgeReferences,
        G::NodeId: Copy + Eq + Hash,
    {
        let mut decorated = Self::default();
        let mut index = HashMap::new();
        let mut vertices = Vec::new();

        for (i, node) in graph.node_identifiers().enumerate() {
            let id = decorated
                .graph
                .add_node(DecoratedVertex::new(VertexKind::Original(i)));
            index.insert(node, id);
            vertices.push(node);
        }

        let mut edges = Vec::new();
        for (i, edge) in graph.edge_references().enumerate() {
            let source = *index
                .get(&edge.source())
                .ok_or(LayeredLayoutError::MissingVertex("edge source"))?;
            let target = *index
                .get(&edge.target())
                .ok_or(LayeredLayoutError::MissingVertex("edge target"))?;
            decorated
                .graph
                .add_edge(source, target, DecoratedEdge::for_original(i));
            edges.push(edge.id());
        }

        Ok((decorated, vertices, edges))
    }

    pub fn vertex(&self, id: VertexId) -> Result<&DecoratedVertex, LayeredLayoutError> {
        self.graph
            .node_weight(id)
            .ok_or(LayeredLayoutError::MissingVertex("working graph"))
    }

    pub fn vertex_mut(
        &mut self,
        id: VertexId,
    ) -> Result<&mut DecoratedVertex, LayeredLayoutError> {
        self.graph
            .node_weight_mut(id)
            .ok_or(LayeredLayoutError::MissingVertex("working graph"))
    }

    /// Add a dummy vertex at the end of the given layer
    pub fn add_dummy(&mut self, kind: VertexKind, layer: usize) -> VertexId {
        let mut vertex = DecoratedVertex::new(kind);
        vertex.layer = layer;
        vertex.index_in_layer = self.layers[layer].len();
        vertex.measured_position = vertex.index_in_layer as f64;
        let id = self.graph.add_node(vertex);
        self.layers[layer].push(id);
        id
    }

    pub fn degree(&self, id: VertexId) -> usize {
        self.graph.edges_directed(id, Direction::Outgoing).count()
            + self.graph.edges_directed(id, Direction::Incoming).count()
    }

    /// Rebuild `layers` from the `layer` fields, dropping empty layers and
    /// keeping the current in-layer order
    pub fn rebuild_layers(&mut self) {
        let mut vertices: Vec<_> = self
            .graph
            .node_indices()
            .map(|id| {
                let v = &self.graph[id];
                (v.layer, v.index_in_layer, id)
            })
            .collect();
        vertices.sort();

        let mut layers: Vec<Vec<VertexId>> = Vec::new();
        let mut current = None;
        for (layer, _, id) in vertices {
            if current != Some(layer) {
                layers.push(Vec::new());
                current = Some(layer);
            }
            if let Some(last) = layers.last_mut() {
                last.push(id);
            }
        }
        self.layers = layers;
        self.reindex();
    }

    /// Rewrite `layer` and `index_in_layer` of every vertex from `layers`
    pub fn reindex(&mut self) {
        for (layer, vertices) in self.layers.iter().enumerate() {
            for (index, &id) in vertices.iter().enumerate() {
                if let Some(v) = self.graph.node_weight_mut(id) {
                    v.layer = layer;
                    v.index_in_layer = index;
                }
            }
        }
    }

    /// Whether every step of `chain` follows a working edge, or the segment
    /// from a P vertex to its Q vertex
    pub fn is_connected(&self, chain: &EdgeChain) -> bool {
        chain.vertices.windows(2).all(|step| {
            if self.graph.find_edge(step[0], step[1]).is_some() {
                return true;
            }
            match (
                self.graph.node_weight(step[0]),
                self.graph.node_weight(step[1]),
            ) {
                (Some(p), Some(q)) => {
                    p.kind == VertexKind::P
                        && q.kind == VertexKind::Q
                        && p.segment.is_some()
                        && p.segment == q.segment
                }
                _ => false,
            }
        })
    }

    /// Whether one of the working edges of `chain` is marked as crossing a
    /// segment
    pub fn crosses_segment(&self, chain: &EdgeChain) -> bool {
        chain.vertices.windows(2).any(|step| {
            self.graph
                .find_edge(step[0], step[1])
                .and_then(|edge| self.graph.edge_weight(edge))
                .is_some_and(|edge| edge.marked)
        })
    }

    pub fn dummy_count(&self) -> usize {
        self.graph
            .node_weights()
            .filter(|v| v.original().is_none())
            .count()
    }
}
