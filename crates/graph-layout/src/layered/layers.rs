use super::graph::DecoratedGraph;
use super::LayeredLayoutError;
use crate::cancel::CancelToken;
use petgraph::visit::{IntoNeighborsDirected, IntoNodeIdentifiers};
use petgraph::Direction;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

/// Split an acyclic graph into layers by repeatedly peeling off its sources
///
/// Layer 0 holds the vertices without incoming edges, and every edge points
/// from a lower layer to a strictly higher one. Vertices inside a layer keep
/// the order in which they became sources.
///
/// # Errors
/// Returns [`LayeredLayoutError::LayeringIncomplete`] if some vertices are
/// never exposed, which happens when the graph has a cycle.
pub fn layered_topological_sort<G>(
    graph: G,
    cancel: &CancelToken,
) -> Result<Vec<Vec<G::NodeId>>, LayeredLayoutError>
where
    G: IntoNodeIdentifiers + IntoNeighborsDirected,
    G::NodeId: Copy + Eq + Hash,
{
    let mut in_degree: HashMap<G::NodeId, usize> = graph
        .node_identifiers()
        .map(|node| {
            let degree = graph.neighbors_directed(node, Direction::Incoming).count();
            (node, degree)
        })
        .collect();

    let mut sources: Vec<G::NodeId> = graph
        .node_identifiers()
        .filter(|node| in_degree.get(node) == Some(&0))
        .collect();

    let mut layers = Vec::new();
    let mut placed = 0;
    while !sources.is_empty() {
        cancel.check()?;

        let mut next = Vec::new();
        for &source in &sources {
            for succ in graph.neighbors_directed(source, Direction::Outgoing) {
                let degree = in_degree
                    .get_mut(&succ)
                    .ok_or(LayeredLayoutError::MissingVertex("in-degree table"))?;
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    next.push(succ);
                }
            }
        }

        placed += sources.len();
        layers.push(std::mem::replace(&mut sources, next));
    }

    if placed < in_degree.len() {
        return Err(LayeredLayoutError::LayeringIncomplete {
            remaining: in_degree.len() - placed,
        });
    }

    Ok(layers)
}

/// Assign a layer to every vertex of the acyclic working graph
///
/// With `minimize_edge_length`, vertices that have successors are then moved
/// down to the layer right above their closest successor.
pub(crate) fn assign_layers(
    dg: &mut DecoratedGraph,
    minimize_edge_length: bool,
    cancel: &CancelToken,
) -> Result<(), LayeredLayoutError> {
    let layers = layered_topological_sort(&dg.graph, cancel)?;
    for (layer, vertices) in layers.iter().enumerate() {
        for (index, &id) in vertices.iter().enumerate() {
            let vertex = dg.vertex_mut(id)?;
            vertex.layer = layer;
            vertex.index_in_layer = index;
            vertex.measured_position = index as f64;
        }
    }

    if minimize_edge_length {
        // Reverse topological order, successors are final before their
        // predecessors are looked at
        for &id in layers.iter().flatten().rev() {
            let layer = dg.vertex(id)?.layer;
            let min_succ_layer = dg
                .graph
                .neighbors_directed(id, Direction::Outgoing)
                .filter_map(|succ| dg.graph.node_weight(succ).map(|v| v.layer))
                .min();

            if let Some(min_succ_layer) = min_succ_layer {
                if min_succ_layer > layer + 1 {
                    let vertex = dg.vertex_mut(id)?;
                    vertex.layer = min_succ_layer - 1;
                    // Behind the vertices already in that layer
                    vertex.index_in_layer = usize::MAX;
                }
            }
        }
    }

    dg.rebuild_layers();
    for vertices in &dg.layers {
        for (index, &id) in vertices.iter().enumerate() {
            if let Some(v) = dg.graph.node_weight_mut(id) {
                v.measured_position = index as f64;
            }
        }
    }

    debug!(
        "Assigned {} vertices to {} layers",
        dg.graph.node_count(),
        dg.layers.len()
    );
    Ok(())
}
