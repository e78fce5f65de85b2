//! Optional pass that trades layer width for height until the drawing gets
//! close to a requested aspect ratio

use super::graph::{DecoratedGraph, VertexId};
use super::LayeredLayoutError;
use crate::cancel::CancelToken;
use crate::Vec2;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy)]
pub(crate) struct WidthTarget {
    pub width_per_height: f32,
    pub vertex_distance: f32,
    pub layer_distance: f32,
}

/// Move vertices out of the widest layer into the layer below it until no
/// layer is wider than `width_per_height` times the height of the drawing
///
/// `size` gives the (breadth, depth) of a caller's vertex. Only vertices whose
/// successors all lie at least two layers down can join the next layer; when
/// none can, a fresh layer is inserted below the widest one. Returns the
/// number of moved vertices.
pub(crate) fn balance_layers<F>(
    dg: &mut DecoratedGraph,
    target: WidthTarget,
    size: F,
    cancel: &CancelToken,
) -> Result<usize, LayeredLayoutError>
where
    F: Fn(usize) -> Vec2,
{
    let size_of = |dg: &DecoratedGraph, id: VertexId| {
        dg.graph
            .node_weight(id)
            .and_then(|v| v.original())
            .map(&size)
            .unwrap_or_default()
    };

    let max_moves = dg.graph.node_count() * 2;
    let mut moves = 0;
    while moves < max_moves {
        cancel.check()?;

        let passing = passing_edges(dg);
        let widths: Vec<f32> = dg
            .layers
            .iter()
            .enumerate()
            .map(|(k, layer)| {
                let breadth: f32 = layer.iter().map(|&v| size_of(dg, v).x).sum();
                let gaps = (layer.len() + passing[k]).saturating_sub(1);
                breadth + gaps as f32 * target.vertex_distance
            })
            .collect();
        let depth: f32 = dg
            .layers
            .iter()
            .map(|layer| {
                layer
                    .iter()
                    .map(|&v| size_of(dg, v).y)
                    .fold(0.0, f32::max)
            })
            .sum();
        let height = depth + dg.layers.len().saturating_sub(1) as f32 * target.layer_distance;
        let desired = target.width_per_height * height;

        let Some((widest, width)) = widths
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
        else {
            break;
        };
        if width <= desired || dg.layers[widest].len() < 2 {
            break;
        }

        let Some(candidate) = cheapest_move(dg, widest, target.vertex_distance, &size_of) else {
            break;
        };
        trace!(
            "Moving {:?} out of layer {widest} ({width} > {desired})",
            candidate.vertex
        );

        if !candidate.into_existing {
            for v in dg.graph.node_weights_mut() {
                if v.layer > widest {
                    v.layer += 1;
                }
            }
        }
        let vertex = dg.vertex_mut(candidate.vertex)?;
        vertex.layer = widest + 1;
        vertex.index_in_layer = usize::MAX;
        dg.rebuild_layers();
        moves += 1;
    }

    debug!("Balanced layers with {moves} moves, {} layers", dg.layers.len());
    Ok(moves)
}

struct Move {
    vertex: VertexId,
    into_existing: bool,
}

/// Number of edges passing through each layer without a vertex in it
fn passing_edges(dg: &DecoratedGraph) -> Vec<usize> {
    let mut diff = vec![0i64; dg.layers.len() + 1];
    for edge in dg.graph.edge_references() {
        let from = dg.graph[edge.source()].layer;
        let to = dg.graph[edge.target()].layer;
        if to > from + 1 {
            diff[from + 1] += 1;
            diff[to] -= 1;
        }
    }

    let mut running = 0;
    diff.iter()
        .take(dg.layers.len())
        .map(|d| {
            running += d;
            running.max(0) as usize
        })
        .collect()
}

/// Pick the vertex of `layer` with the best ratio of width saved in `layer`
/// to width added below it
fn cheapest_move<S>(
    dg: &DecoratedGraph,
    layer: usize,
    vertex_distance: f32,
    size_of: &S,
) -> Option<Move>
where
    S: Fn(&DecoratedGraph, VertexId) -> Vec2,
{
    // Edges crossing the gap right below `layer`, each of them would need a
    // dummy vertex in a freshly inserted layer
    let crossing_gap = dg
        .graph
        .edge_references()
        .filter(|e| dg.graph[e.source()].layer <= layer && dg.graph[e.target()].layer > layer)
        .count();
    let has_next = layer + 1 < dg.layers.len();

    let mut best: Option<(f32, Move)> = None;
    for &vertex in &dg.layers[layer] {
        let breadth = size_of(dg, vertex).x;
        let in_degree = dg.graph.edges_directed(vertex, Direction::Incoming).count();
        let succ_layers: Vec<usize> = dg
            .graph
            .neighbors_directed(vertex, Direction::Outgoing)
            .map(|succ| dg.graph[succ].layer)
            .collect();

        // Incoming edges get one layer longer and leave a dummy behind
        let value = breadth + vertex_distance - in_degree as f32 * vertex_distance;
        if value <= 0.0 {
            continue;
        }

        let into_existing = has_next && succ_layers.iter().all(|&l| l > layer + 1);
        let cost = if into_existing {
            let shortened = succ_layers.iter().filter(|&&l| l > layer + 1).count();
            breadth + vertex_distance - shortened as f32 * vertex_distance
        } else {
            let others = crossing_gap.saturating_sub(succ_layers.len());
            breadth + others as f32 * vertex_distance
        };

        let ratio = value / cost.max(1e-3);
        if best.as_ref().map_or(true, |(r, _)| ratio > *r) {
            best = Some((
                ratio,
                Move {
                    vertex,
                    into_existing,
                },
            ));
        }
    }

    best.map(|(_, m)| m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layered::graph::tests::decorated;
    use crate::layered::layers::assign_layers;
    use test_log::test;

    fn target() -> WidthTarget {
        WidthTarget {
            width_per_height: 1.0,
            vertex_distance: 10.0,
            layer_distance: 20.0,
        }
    }

    #[test]
    fn wide_layer_is_split() {
        let edges: Vec<(u32, u32)> = (1..=6).map(|leaf| (0, leaf)).collect();
        let mut dg = decorated(7, &edges);
        assign_layers(&mut dg, false, &CancelToken::new()).unwrap();
        assert_eq!(dg.layers.len(), 2);

        let moves = balance_layers(
            &mut dg,
            target(),
            |_| Vec2::new(50.0, 20.0),
            &CancelToken::new(),
        )
        .unwrap();
        assert!(moves > 0);
        assert!(dg.layers.len() > 2);
        assert!(dg.layers.iter().all(|l| l.len() < 6));

        for edge in dg.graph.edge_references() {
            assert!(dg.graph[edge.target()].layer > dg.graph[edge.source()].layer);
        }
        for (k, layer) in dg.layers.iter().enumerate() {
            for &v in layer {
                assert_eq!(dg.graph[v].layer, k);
            }
        }
    }

    #[test]
    fn narrow_drawing_is_left_alone() {
        let mut dg = decorated(3, &[(0, 1), (1, 2)]);
        assign_layers(&mut dg, false, &CancelToken::new()).unwrap();
        let moves = balance_layers(
            &mut dg,
            target(),
            |_| Vec2::new(50.0, 20.0),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(moves, 0);
        assert_eq!(dg.layers.len(), 3);
    }

    #[test]
    fn passing_edges_are_counted_per_layer() {
        let mut dg = decorated(4, &[(0, 1), (1, 2), (2, 3), (0, 3)]);
        assign_layers(&mut dg, false, &CancelToken::new()).unwrap();
        assert_eq!(passing_edges(&dg), vec![0, 1, 1, 0]);
    }
}
