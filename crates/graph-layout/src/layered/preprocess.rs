//! Makes the working graph acyclic and loop free before layering

use super::graph::{DecoratedGraph, VertexId};
use crate::cancel::{CancelToken, Cancelled};
use petgraph::stable_graph::EdgeIndex;
use petgraph::visit::{EdgeRef, IntoEdgeReferences, NodeIndexable};
use petgraph::Direction;
use tracing::debug;

/// Remove every edge whose source is its target, returning how many were
/// removed. The caller's edge indices are kept in `self_loops`.
pub(crate) fn remove_loops(dg: &mut DecoratedGraph) -> usize {
    let loops: Vec<EdgeIndex> = dg
        .graph
        .edge_references()
        .filter(|e| e.source() == e.target())
        .map(|e| e.id())
        .collect();

    for &edge in &loops {
        if let Some(original) = dg.graph.remove_edge(edge).and_then(|e| e.original) {
            dg.self_loops.push(original);
        }
    }

    debug!("Removed {} self loops", loops.len());
    loops.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    OnStack,
    Done,
}

/// Reverse the back edges found by a depth-first traversal
///
/// Vertices are visited in index order, so the reversed set only depends on
/// the order of the input graph. Returns the number of reversed edges.
pub(crate) fn remove_cycles(
    dg: &mut DecoratedGraph,
    cancel: &CancelToken,
) -> Result<usize, Cancelled> {
    let mut visit = vec![Visit::New; dg.graph.node_bound()];
    let mut back_edges = Vec::new();
    let roots: Vec<VertexId> = dg.graph.node_indices().collect();

    for root in roots {
        cancel.check()?;
        if visit[root.index()] != Visit::New {
            continue;
        }

        visit[root.index()] = Visit::OnStack;
        let mut stack = vec![(root, out_edges(dg, root))];
        loop {
            let Some((vertex, pending)) = stack.last_mut() else {
                break;
            };
            let vertex = *vertex;
            match pending.pop() {
                Some((edge, target)) => match visit[target.index()] {
                    Visit::New => {
                        visit[target.index()] = Visit::OnStack;
                        let edges = out_edges(dg, target);
                        stack.push((target, edges));
                    }
                    Visit::OnStack => back_edges.push(edge),
                    Visit::Done => {}
                },
                None => {
                    visit[vertex.index()] = Visit::Done;
                    stack.pop();
                }
            }
        }
    }

    for &edge in &back_edges {
        let Some((source, target)) = dg.graph.edge_endpoints(edge) else {
            continue;
        };
        if let Some(mut weight) = dg.graph.remove_edge(edge) {
            weight.reversed = !weight.reversed;
            dg.graph.add_edge(target, source, weight);
        }
    }

    debug!("Reversed {} edges to break cycles", back_edges.len());
    Ok(back_edges.len())
}

/// Outgoing edges of `vertex`, last to be explored first
fn out_edges(dg: &DecoratedGraph, vertex: VertexId) -> Vec<(EdgeIndex, VertexId)> {
    dg.graph
        .edges_directed(vertex, Direction::Outgoing)
        .map(|e| (e.id(), e.target()))
        .collect()
}

/// Remove the vertices without edges, keeping the caller's indices in
/// `isolated`
pub(crate) fn remove_isolated_vertices(dg: &mut DecoratedGraph) -> usize {
    let isolated: Vec<VertexId> = dg
        .graph
        .node_indices()
        .filter(|&v| dg.degree(v) == 0)
        .collect();

    for &vertex in &isolated {
        if let Some(original) = dg.graph.remove_node(vertex).and_then(|v| v.original()) {
            dg.isolated.push(original);
        }
    }

    debug!("Set aside {} isolated vertices", isolated.len());
    isolated.len()
}
