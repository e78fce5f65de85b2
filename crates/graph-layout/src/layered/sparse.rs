//! Turns the layered graph into a proper one where every edge connects
//! adjacent layers
//!
//! An edge spanning two layers gets one R dummy. Longer edges get a P dummy
//! right below their source and a Q dummy right above their target, joined
//! by a [`Segment`]; the layers in between get no dummy at all.

use super::graph::{DecoratedGraph, EdgeChain, Segment, SegmentId, VertexKind};
use super::LayeredLayoutError;
use crate::cancel::CancelToken;
use petgraph::stable_graph::EdgeIndex;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::HashSet;
use tracing::{debug, trace};

pub(crate) fn insert_dummy_vertices(
    dg: &mut DecoratedGraph,
    cancel: &CancelToken,
) -> Result<(), LayeredLayoutError> {
    let edges: Vec<EdgeIndex> = dg.graph.edge_indices().collect();

    for edge in edges {
        cancel.check()?;

        let (source, target) = dg
            .graph
            .edge_endpoints(edge)
            .ok_or(LayeredLayoutError::MissingVertex("edge endpoints"))?;
        let weight = dg
            .graph
            .edge_weight(edge)
            .cloned()
            .ok_or(LayeredLayoutError::MissingVertex("edge weight"))?;
        let (original, reversed) = (weight.original, weight.reversed);
        let from_layer = dg.vertex(source)?.layer;
        let to_layer = dg.vertex(target)?.layer;
        if to_layer <= from_layer {
            return Err(LayeredLayoutError::MalformedSpan {
                from_layer,
                to_layer,
            });
        }

        let vertices = match to_layer - from_layer {
            1 => vec![source, target],
            2 => {
                dg.graph.remove_edge(edge);
                let r = dg.add_dummy(VertexKind::R, from_layer + 1);
                dg.graph.add_edge(source, r, weight.clone());
                dg.graph.add_edge(r, target, weight);
                vec![source, r, target]
            }
            _ => {
                dg.graph.remove_edge(edge);
                let p = dg.add_dummy(VertexKind::P, from_layer + 1);
                let q = dg.add_dummy(VertexKind::Q, to_layer - 1);
                let segment = SegmentId::from(dg.segments.len());
                dg.segments.push(Segment::new(p, q));
                dg.vertex_mut(p)?.segment = Some(segment);
                dg.vertex_mut(q)?.segment = Some(segment);
                trace!("Segment {segment} spans layers {from_layer} to {to_layer}");
                dg.graph.add_edge(source, p, weight.clone());
                dg.graph.add_edge(q, target, weight);
                vec![source, p, q, target]
            }
        };

        if let Some(original) = original {
            dg.chains.push(EdgeChain {
                original,
                vertices,
                reversed,
            });
        }
    }

    debug!(
        "Inserted {} dummy vertices and {} segments",
        dg.dummy_count(),
        dg.segments.len()
    );
    Ok(())
}

/// Keep a single edge out of every group of edges sharing source and target
///
/// The chains of the dropped edges are kept, so every original edge still
/// gets a route, but the group only weighs once when counting crossings.
pub(crate) fn remove_parallel_edges(dg: &mut DecoratedGraph) -> usize {
    let mut seen = HashSet::new();
    let parallel: Vec<EdgeIndex> = dg
        .graph
        .edge_references()
        .filter(|e| !seen.insert((e.source(), e.target())))
        .map(|e| e.id())
        .collect();

    for &edge in &parallel {
        dg.graph.remove_edge(edge);
    }

    debug!("Removed {} parallel edges", parallel.len());
    parallel.len()
}
