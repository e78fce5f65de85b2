//! Left-of relations between vertices and segments, collected from every
//! alternating layer
//!
//! A segment is a single node no matter how many layers it runs through, so
//! its P vertex, its Q vertex and every container slot it occupies end up at
//! the same breadth once the graph is compacted.

use super::alternating::{AlternatingLayer, LayerItem};
use super::graph::{DecoratedGraph, SegmentId, VertexId, VertexKind};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) enum CompactionNode {
    Vertex(VertexId),
    Segment(SegmentId),
}

/// Edge weights count how many layers currently assert the relation
#[derive(Debug, Clone, Default)]
pub(crate) struct CompactionGraph {
    graph: DiGraphMap<CompactionNode, usize>,
    layers: Vec<Vec<(CompactionNode, CompactionNode)>>,
}

impl CompactionGraph {
    pub fn node_of(dg: &DecoratedGraph, vertex: VertexId) -> CompactionNode {
        match dg.graph.node_weight(vertex) {
            Some(v) if matches!(v.kind, VertexKind::P | VertexKind::Q) => v
                .segment
                .map_or(CompactionNode::Vertex(vertex), CompactionNode::Segment),
            _ => CompactionNode::Vertex(vertex),
        }
    }

    /// Replace the relations of layer `index` by the ones of `layer`
    pub fn set_layer(&mut self, index: usize, layer: &AlternatingLayer, dg: &DecoratedGraph) {
        self.unset_layer(index);

        let mut nodes = Vec::new();
        for item in layer.items() {
            match item {
                LayerItem::Vertex(v) => nodes.push(Self::node_of(dg, *v)),
                LayerItem::Container(c) => {
                    nodes.extend(c.segments.iter().copied().map(CompactionNode::Segment))
                }
            }
        }
        for &node in &nodes {
            self.graph.add_node(node);
        }

        let relations: Vec<_> = nodes
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .filter(|(a, b)| a != b)
            .collect();
        for &(a, b) in &relations {
            match self.graph.edge_weight_mut(a, b) {
                Some(count) => *count += 1,
                None => {
                    self.graph.add_edge(a, b, 1);
                }
            }
        }

        if self.layers.len() <= index {
            self.layers.resize_with(index + 1, Vec::new);
        }
        self.layers[index] = relations;
    }

    pub fn unset_layer(&mut self, index: usize) {
        let Some(relations) = self.layers.get_mut(index).map(std::mem::take) else {
            return;
        };
        for (a, b) in relations {
            if let Some(count) = self.graph.edge_weight_mut(a, b) {
                *count -= 1;
                if *count == 0 {
                    self.graph.remove_edge(a, b);
                }
            }
        }
    }

    pub fn relation_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Centre breadth of every node, packed as far left as the relations
    /// allow with `spacing` between neighbours
    ///
    /// Returns `None` if the relations contain a cycle.
    pub fn longest_path<F>(&self, breadth: F, spacing: f32) -> Option<HashMap<CompactionNode, f32>>
    where
        F: Fn(CompactionNode) -> f32,
    {
        let order = toposort(&self.graph, None).ok()?;
        let mut centres: HashMap<CompactionNode, f32> = HashMap::with_capacity(order.len());
        for node in order {
            let half = breadth(node) / 2.0;
            let centre = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .filter_map(|pred| {
                    centres
                        .get(&pred)
                        .map(|x| x + breadth(pred) / 2.0 + spacing + half)
                })
                .fold(half, f32::max);
            centres.insert(node, centre);
        }
        Some(centres)
    }
}
