use super::compaction::{CompactionGraph, CompactionNode};
use super::graph::{DecoratedGraph, VertexId};
use super::{LayeredLayoutError, LayoutDirection};
use crate::{Point, Vec2};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub(crate) struct Spacing {
    pub vertex_distance: f32,
    pub layer_distance: f32,
    pub direction: LayoutDirection,
}

/// Centres of the working vertices and of the isolated vertices, in drawing
/// coordinates
#[derive(Debug, Clone, Default)]
pub(crate) struct Placement {
    pub centres: HashMap<VertexId, Point>,
    /// Same order as [`DecoratedGraph::isolated`]
    pub isolated: Vec<Point>,
}

/// Place every vertex of the ordered working graph
///
/// Depth comes from the layer bands, breadth from the longest path over the
/// compaction graph. `size` gives the width and height of a caller's vertex,
/// dummies have no size. Boxes start at zero on both axes, and the isolated
/// vertices get their own band before the first layer.
pub(crate) fn assign_positions<F>(
    dg: &DecoratedGraph,
    compaction: &CompactionGraph,
    spacing: Spacing,
    size: F,
) -> Result<Placement, LayeredLayoutError>
where
    F: Fn(usize) -> Vec2,
{
    let direction = spacing.direction;
    let real_size = |v: VertexId| {
        dg.graph
            .node_weight(v)
            .and_then(|w| w.original())
            .map(&size)
            .unwrap_or_default()
    };
    let frame_size = |v: VertexId| direction.to_frame(real_size(v));

    // Depth of the centre of each layer band
    let mut depths = Vec::with_capacity(dg.layers.len());
    let mut top = 0.0;
    for layer in &dg.layers {
        let depth = layer.iter().map(|&v| frame_size(v).y).fold(0.0, f32::max);
        depths.push(top + depth / 2.0);
        top += depth + spacing.layer_distance;
    }

    let breadths = breadths(dg, compaction, spacing.vertex_distance, &frame_size)?;

    let mut centres = HashMap::with_capacity(breadths.len());
    let mut min = Vec2::new(f32::INFINITY, f32::INFINITY);
    for (k, layer) in dg.layers.iter().enumerate() {
        for &v in layer {
            let breadth = breadths
                .get(&v)
                .copied()
                .ok_or(LayeredLayoutError::MissingVertex("breadth table"))?;
            let centre = direction.from_frame(breadth, depths[k]);
            let half = real_size(v);
            min.x = min.x.min(centre.x - half.x / 2.0);
            min.y = min.y.min(centre.y - half.y / 2.0);
            centres.insert(v, centre);
        }
    }

    let mut shift = if centres.is_empty() {
        Vec2::zero()
    } else {
        Vec2::new(-min.x, -min.y)
    };

    // Isolated vertices, side by side at the start of the drawing
    let mut isolated = Vec::with_capacity(dg.isolated.len());
    let mut breadth = 0.0;
    let mut band = 0.0f32;
    for &original in &dg.isolated {
        let real = size(original);
        let frame = direction.to_frame(real);
        let corner = direction.from_band(breadth, 0.0);
        isolated.push(corner.offset(Vec2::new(real.x / 2.0, real.y / 2.0)));
        breadth += frame.x + spacing.vertex_distance;
        band = band.max(frame.y);
    }
    if !dg.isolated.is_empty() {
        let past_band = direction.from_band(0.0, band + spacing.layer_distance);
        shift = Vec2::new(shift.x + past_band.x, shift.y + past_band.y);
    }

    for centre in centres.values_mut() {
        *centre = centre.offset(shift);
    }

    debug!(
        "Placed {} vertices and {} isolated vertices",
        centres.len(),
        isolated.len()
    );
    Ok(Placement { centres, isolated })
}

/// Breadth of the centre of every working vertex
fn breadths<F>(
    dg: &DecoratedGraph,
    compaction: &CompactionGraph,
    vertex_distance: f32,
    frame_size: &F,
) -> Result<HashMap<VertexId, f32>, LayeredLayoutError>
where
    F: Fn(VertexId) -> Vec2,
{
    let node_breadth = |node: CompactionNode| match node {
        CompactionNode::Vertex(v) => frame_size(v).x,
        CompactionNode::Segment(_) => 0.0,
    };

    let mut breadths = HashMap::new();
    if let Some(by_node) = compaction.longest_path(node_breadth, vertex_distance) {
        for &v in dg.layers.iter().flatten() {
            let breadth = by_node
                .get(&CompactionGraph::node_of(dg, v))
                .copied()
                .ok_or(LayeredLayoutError::MissingVertex("compaction graph"))?;
            breadths.insert(v, breadth);
        }
        return Ok(breadths);
    }

    warn!("Segment order is inconsistent between layers, packing layers independently");
    for layer in &dg.layers {
        let mut left = 0.0;
        for &v in layer {
            let breadth = frame_size(v).x;
            breadths.insert(v, left + breadth / 2.0);
            left += breadth + vertex_distance;
        }
    }
    Ok(breadths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::layered::graph::tests::decorated;
    use crate::layered::layers::assign_layers;
    use crate::layered::preprocess::remove_isolated_vertices;
    use crate::layered::sparse::{insert_dummy_vertices, remove_parallel_edges};
    use crate::layered::sweep::{minimize_crossings, SweepBudget};
    use test_log::test;

    fn ordered(n: usize, edges: &[(u32, u32)]) -> (DecoratedGraph, CompactionGraph) {
        let mut dg = decorated(n, edges);
        remove_isolated_vertices(&mut dg);
        assign_layers(&mut dg, false, &CancelToken::new()).unwrap();
        insert_dummy_vertices(&mut dg, &CancelToken::new()).unwrap();
        remove_parallel_edges(&mut dg);
        let budget = SweepBudget {
            max_permutations: 10,
            max_strict_rounds: 5,
            max_dirty_rounds: 1,
            seed: 0,
        };
        let order = minimize_crossings(&mut dg, budget, &CancelToken::new()).unwrap();
        (dg, order.compaction)
    }

    fn place(
        dg: &DecoratedGraph,
        compaction: &CompactionGraph,
        direction: LayoutDirection,
    ) -> Placement {
        let spacing = Spacing {
            vertex_distance: 10.0,
            layer_distance: 20.0,
            direction,
        };
        assign_positions(dg, compaction, spacing, |_| Vec2::new(40.0, 20.0)).unwrap()
    }

    fn placed(
        n: usize,
        edges: &[(u32, u32)],
        direction: LayoutDirection,
    ) -> (DecoratedGraph, Placement) {
        let (dg, compaction) = ordered(n, edges);
        let placement = place(&dg, &compaction, direction);
        (dg, placement)
    }

    fn centre_of(dg: &DecoratedGraph, placement: &Placement, original: usize) -> Point {
        let id = dg
            .graph
            .node_indices()
            .find(|&v| dg.graph[v].original() == Some(original))
            .unwrap();
        placement.centres[&id]
    }

    #[test]
    fn layers_are_stacked_top_to_bottom() {
        let (dg, placement) = placed(3, &[(0, 1), (1, 2)], LayoutDirection::TopToBottom);
        let ys: Vec<f32> = (0..3).map(|i| centre_of(&dg, &placement, i).y).collect();
        assert_eq!(ys, vec![10.0, 50.0, 90.0]);
        assert_eq!(centre_of(&dg, &placement, 0).x, 20.0);
    }

    #[test]
    fn bottom_to_top_mirrors_depth() {
        let (dg, placement) = placed(3, &[(0, 1), (1, 2)], LayoutDirection::BottomToTop);
        let ys: Vec<f32> = (0..3).map(|i| centre_of(&dg, &placement, i).y).collect();
        assert_eq!(ys, vec![90.0, 50.0, 10.0]);
    }

    #[test]
    fn left_to_right_swaps_axes() {
        let (dg, placement) = placed(3, &[(0, 1), (1, 2)], LayoutDirection::LeftToRight);
        let xs: Vec<f32> = (0..3).map(|i| centre_of(&dg, &placement, i).x).collect();
        // Boxes are 40 wide, so each band is 40 deep
        assert_eq!(xs, vec![20.0, 80.0, 140.0]);
        assert_eq!(centre_of(&dg, &placement, 0).y, 10.0);
    }

    #[test]
    fn vertices_of_a_layer_do_not_overlap() {
        let (dg, placement) = placed(4, &[(0, 1), (0, 2), (0, 3)], LayoutDirection::TopToBottom);
        let mut xs: Vec<f32> = (1..4).map(|i| centre_of(&dg, &placement, i).x).collect();
        xs.sort_by(f32::total_cmp);
        for pair in xs.windows(2) {
            assert!(pair[1] - pair[0] >= 50.0);
        }
    }

    #[test]
    fn segment_ends_share_a_breadth() {
        let (dg, placement) = placed(
            5,
            &[(0, 1), (1, 2), (2, 3), (3, 4), (0, 4)],
            LayoutDirection::TopToBottom,
        );
        let segment = dg.segments[0];
        assert_eq!(
            placement.centres[&segment.p].x,
            placement.centres[&segment.q].x
        );
    }

    #[test]
    fn isolated_vertices_get_their_own_band() {
        let (dg, placement) = placed(3, &[(0, 1)], LayoutDirection::TopToBottom);
        assert_eq!(dg.isolated, vec![2]);
        assert_eq!(placement.isolated, vec![Point::new(20.0, 10.0)]);
        // Band of 20, then the layer distance
        assert_eq!(centre_of(&dg, &placement, 0).y, 50.0);
    }

    #[test]
    fn placement_is_idempotent() {
        let (dg, compaction) = ordered(6, &[(0, 2), (1, 2), (2, 3), (2, 4), (0, 5)]);
        let first = place(&dg, &compaction, LayoutDirection::TopToBottom);
        let second = place(&dg, &compaction, LayoutDirection::TopToBottom);
        assert_eq!(first.centres, second.centres);
        assert_eq!(first.isolated, second.isolated);
    }
}
