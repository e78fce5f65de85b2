use super::alternating::{AlternatingLayer, Slots};
use super::graph::{DecoratedGraph, VertexId};
use super::sweep::SweepDirection;
use petgraph::stable_graph::EdgeIndex;
use petgraph::visit::EdgeRef;

/// A bundle of `weight` parallel edges between two slots of adjacent layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerEdge {
    pub top: usize,
    pub bottom: usize,
    pub weight: u64,
}

impl LayerEdge {
    pub fn new(top: usize, bottom: usize, weight: u64) -> Self {
        Self {
            top,
            bottom,
            weight,
        }
    }
}

/// Count the weighted crossings between two ordered layers
///
/// Edges sharing an endpoint never cross. The edges are radix sorted by
/// bottom then top slot, then an accumulator tree over the top slots counts,
/// for each edge, the weight of the already inserted edges starting to its
/// right. Runs in O(E log V).
pub fn bilayer_cross_count(edges: &[LayerEdge]) -> u64 {
    let Some(top_len) = edges.iter().map(|e| e.top + 1).max() else {
        return 0;
    };
    let bottom_len = edges.iter().map(|e| e.bottom + 1).max().unwrap_or(0);

    let by_top = counting_sort(edges.to_vec(), top_len, |e| e.top);
    let sorted = counting_sort(by_top, bottom_len, |e| e.bottom);

    let mut first_index: usize = 1;
    while first_index < top_len {
        first_index <<= 1;
    }
    let tree_size = 2 * first_index - 1;
    first_index -= 1;
    let mut tree = vec![0u64; tree_size];

    let mut crossings = 0;
    for edge in sorted {
        let mut index = edge.top + first_index;
        tree[index] += edge.weight;
        let mut weight_sum = 0;
        while index > 0 {
            if index % 2 == 1 {
                weight_sum += tree[index + 1];
            }
            index = (index - 1) >> 1;
            tree[index] += edge.weight;
        }
        crossings += edge.weight * weight_sum;
    }

    crossings
}

/// Stable counting sort on a key in `0..range`
fn counting_sort<F>(edges: Vec<LayerEdge>, range: usize, key: F) -> Vec<LayerEdge>
where
    F: Fn(&LayerEdge) -> usize,
{
    let mut buckets: Vec<Vec<LayerEdge>> = vec![Vec::new(); range];
    for edge in edges {
        buckets[key(&edge)].push(edge);
    }
    buckets.into_iter().flatten().collect()
}

/// Edges between a fixed layer, with its opening vertices already replaced by
/// their segments, and a free layer
///
/// Real edges weigh one. Segments become edges from their slot in the fixed
/// layer to their slot (or their closing vertex) in the free layer, and runs
/// of segments that are contiguous on both sides are bundled into one
/// weighted edge.
pub(crate) fn layer_edges(
    dg: &DecoratedGraph,
    fixed: &Slots,
    free: &AlternatingLayer,
    direction: SweepDirection,
) -> Vec<LayerEdge> {
    let free_slots = free.slots();
    edges_between(dg, fixed, &free_slots, free, direction)
        .into_iter()
        .map(|(edge, _)| edge)
        .collect()
}

fn edges_between(
    dg: &DecoratedGraph,
    fixed: &Slots,
    free_slots: &Slots,
    free: &AlternatingLayer,
    direction: SweepDirection,
) -> Vec<(LayerEdge, Option<EdgeIndex>)> {
    let mut edges = Vec::new();

    for v in free.vertices() {
        let Some(&bottom) = free_slots.vertices.get(&v) else {
            continue;
        };
        for edge in dg.graph.edges_directed(v, direction.towards_fixed()) {
            let neighbor = if edge.source() == v {
                edge.target()
            } else {
                edge.source()
            };
            if let Some(&top) = fixed.vertices.get(&neighbor) {
                edges.push((LayerEdge::new(top, bottom, 1), Some(edge.id())));
            }
        }
    }

    let mut run: Option<(LayerEdge, usize, usize)> = None;
    for (start, container) in &fixed.containers {
        for (offset, &segment) in container.segments.iter().enumerate() {
            let top = start + offset;
            let bottom = free_slots.segments.get(&segment).copied().or_else(|| {
                dg.segments
                    .get(segment.0)
                    .map(|s| direction.closing_vertex(s))
                    .and_then(|v: VertexId| free_slots.vertices.get(&v).copied())
            });
            let Some(bottom) = bottom else {
                continue;
            };

            match run.as_mut() {
                Some((edge, last_top, last_bottom))
                    if *last_top + 1 == top && *last_bottom + 1 == bottom =>
                {
                    edge.weight += 1;
                    *last_top = top;
                    *last_bottom = bottom;
                }
                _ => {
                    if let Some((edge, _, _)) = run.take() {
                        edges.push((edge, None));
                    }
                    run = Some((LayerEdge::new(top, bottom, 1), top, bottom));
                }
            }
        }
    }
    if let Some((edge, _, _)) = run {
        edges.push((edge, None));
    }

    edges
}

/// Real edges between the two layers that cross at least one segment
pub(crate) fn segment_conflicts(
    dg: &DecoratedGraph,
    fixed: &Slots,
    free: &AlternatingLayer,
    direction: SweepDirection,
) -> Vec<EdgeIndex> {
    let free_slots = free.slots();
    let edges = edges_between(dg, fixed, &free_slots, free, direction);
    let (real, segments): (Vec<_>, Vec<_>) = edges.into_iter().partition(|(_, id)| id.is_some());

    real.into_iter()
        .filter(|(edge, _)| {
            segments.iter().any(|(run, _)| {
                (edge.top < run.top && edge.bottom > run.bottom)
                    || (edge.top > run.top && edge.bottom < run.bottom)
            })
        })
        .filter_map(|(_, id)| id)
        .collect()
}
