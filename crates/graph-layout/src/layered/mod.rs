mod alternating;
mod balance;
mod compaction;
mod crossings;
mod graph;
mod layers;
mod positions;
mod preprocess;
mod sparse;
mod sweep;

use crate::cancel::{CancelToken, Cancelled};
use crate::{Layout, LayoutEngine, NodeSizes, Point, Vec2};
use balance::{balance_layers, WidthTarget};
use compaction::CompactionGraph;
use graph::DecoratedGraph;
use petgraph::visit::{IntoEdgeReferences, IntoNodeIdentifiers};
use positions::{assign_positions, Spacing};
use preprocess::{remove_cycles, remove_isolated_vertices, remove_loops};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use sweep::{minimize_crossings, SweepBudget};
use thiserror::Error;
use tracing::debug;

pub use crossings::{bilayer_cross_count, LayerEdge};
pub use layers::layered_topological_sort;

/// Random orders tried for a tie group too large to be fully enumerated
pub const MAX_PERMUTATIONS: usize = 50;

#[derive(Debug, Error)]
pub enum LayeredLayoutError {
    #[error("layering stopped with {remaining} vertices left, the graph is not acyclic")]
    LayeringIncomplete { remaining: usize },

    #[error("edge goes from layer {from_layer} to layer {to_layer}")]
    MalformedSpan { from_layer: usize, to_layer: usize },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error("vertex missing from the {0}")]
    MissingVertex(&'static str),

    #[error("segment missing from the {0}")]
    MissingSegment(&'static str),
}

/// Where the first layer goes and where edges point to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutDirection {
    #[default]
    TopToBottom,
    BottomToTop,
    LeftToRight,
    RightToLeft,
}

impl LayoutDirection {
    fn is_vertical(self) -> bool {
        matches!(self, Self::TopToBottom | Self::BottomToTop)
    }

    /// (breadth, depth) of a box of the given width and height
    pub(crate) fn to_frame(self, size: Vec2) -> Vec2 {
        if self.is_vertical() {
            size
        } else {
            size.transposed()
        }
    }

    pub(crate) fn from_frame(self, breadth: f32, depth: f32) -> Point {
        match self {
            Self::TopToBottom => Point::new(breadth, depth),
            Self::BottomToTop => Point::new(breadth, -depth),
            Self::LeftToRight => Point::new(depth, breadth),
            Self::RightToLeft => Point::new(-depth, breadth),
        }
    }

    /// Like [`Self::from_frame`] without mirroring, for the isolated band
    pub(crate) fn from_band(self, breadth: f32, depth: f32) -> Point {
        if self.is_vertical() {
            Point::new(breadth, depth)
        } else {
            Point::new(depth, breadth)
        }
    }
}

/// Configuration for the layered (Sugiyama-style) layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayeredLayout {
    /// Gap between two consecutive layer bands
    pub layer_distance: f32,

    /// Gap between two neighbours of a layer
    pub vertex_distance: f32,

    pub direction: LayoutDirection,

    /// Pull vertices down towards their closest successor
    pub minimize_edge_length: bool,

    /// Split layers wider than `width_per_height` times the drawing height
    pub optimize_width: bool,
    pub width_per_height: f32,

    pub max_permutations: usize,

    /// Rounds of strict (never worse) sweeps between two dirty rounds
    pub max_strict_rounds: usize,

    /// Rounds accepting worse orders to leave a local minimum
    pub max_dirty_rounds: usize,

    /// Seed of the tie breaking shuffles
    pub seed: u64,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self {
            layer_distance: 30.0,
            vertex_distance: 20.0,
            direction: LayoutDirection::TopToBottom,
            minimize_edge_length: true,
            optimize_width: false,
            width_per_height: 1.0,
            max_permutations: MAX_PERMUTATIONS,
            max_strict_rounds: 10,
            max_dirty_rounds: 3,
            seed: 0,
        }
    }
}

impl LayeredLayout {
    /// Create a layout with `margin.x` between neighbours and `margin.y`
    /// between layers
    pub fn new(margin: Vec2) -> Self {
        Self {
            vertex_distance: margin.x,
            layer_distance: margin.y,
            ..Default::default()
        }
    }
}

/// Layer structure that can be cached and reused
#[derive(Debug, Clone)]
pub struct Layers<N, E> {
    /// Caller's vertices organized into layers, in their final order
    pub nodes: Vec<Vec<N>>,

    /// Vertices without edges, laid out apart from the layers
    pub isolated: Vec<N>,

    /// Number of edge crossings (quality metric)
    pub crossings: u64,

    /// Edges drawn against their direction to break cycles
    pub reversed_edges: Vec<E>,

    pub self_loops: Vec<E>,

    /// Number of edges crossing the straight part of a long edge
    pub segment_conflicts: usize,

    /// Caller's edges drawn across the straight part of a long edge
    pub conflicting_edges: Vec<E>,

    pub(crate) vertices: Vec<N>,
    pub(crate) edges: Vec<E>,
    pub(crate) sparse: DecoratedGraph,
    pub(crate) compaction: CompactionGraph,
}

impl<N: Copy, E: Copy> Layers<N, E> {
    /// Caller's edges as `(edge, source, target)`, read back from the layered
    /// graph
    ///
    /// Dummy vertices are dropped, segments collapsed and reversed edges
    /// turned back. Self loops are not part of the layered graph.
    pub fn collapsed_edges(&self) -> Vec<(E, N, N)> {
        let caller = |v: graph::VertexId| {
            self.sparse
                .graph
                .node_weight(v)
                .and_then(|vertex| vertex.original())
                .and_then(|i| self.vertices.get(i).copied())
        };
        self.sparse
            .chains
            .iter()
            .filter(|chain| self.sparse.is_connected(chain))
            .filter(|chain| {
                let inner = chain.vertices.len().saturating_sub(2);
                chain
                    .vertices
                    .iter()
                    .skip(1)
                    .take(inner)
                    .all(|&v| caller(v).is_none())
            })
            .filter_map(|chain| {
                let first = caller(*chain.vertices.first()?)?;
                let last = caller(*chain.vertices.last()?)?;
                let edge = *self.edges.get(chain.original)?;
                Some(if chain.reversed {
                    (edge, last, first)
                } else {
                    (edge, first, last)
                })
            })
            .collect()
    }
}

impl LayeredLayout {
    /// Compute layer structure (expensive, cache this)
    ///
    /// This phase breaks cycles, assigns vertices to layers and minimizes
    /// edge crossings. Sizes are only looked at when `optimize_width` is set.
    ///
    /// # Errors
    /// Fails if `cancel` fires, or on an internal invariant violation.
    pub fn compute_layers<G, S>(
        &self,
        graph: G,
        sizes: &S,
        cancel: &CancelToken,
    ) -> Result<Layers<G::NodeId, G::EdgeId>, LayeredLayoutError>
    where
        G: IntoNodeIdentifiers + IntoEdgeReferences,
        G::NodeId: Copy + Ord + Hash,
        G::EdgeId: Copy + Eq + Hash,
        S: NodeSizes<G::NodeId>,
    {
        let (mut dg, vertices, edges) = DecoratedGraph::from_graph(graph)?;

        remove_loops(&mut dg);
        remove_cycles(&mut dg, cancel)?;
        remove_isolated_vertices(&mut dg);

        layers::assign_layers(&mut dg, self.minimize_edge_length, cancel)?;
        if self.optimize_width {
            let target = WidthTarget {
                width_per_height: self.width_per_height,
                vertex_distance: self.vertex_distance,
                layer_distance: self.layer_distance,
            };
            let size = |i: usize| {
                vertices
                    .get(i)
                    .map(|&node| self.direction.to_frame(sizes.size(node)))
                    .unwrap_or_default()
            };
            balance_layers(&mut dg, target, size, cancel)?;
        }

        sparse::insert_dummy_vertices(&mut dg, cancel)?;
        sparse::remove_parallel_edges(&mut dg);

        let budget = SweepBudget {
            max_permutations: self.max_permutations,
            max_strict_rounds: self.max_strict_rounds,
            max_dirty_rounds: self.max_dirty_rounds,
            seed: self.seed,
        };
        let order = minimize_crossings(&mut dg, budget, cancel)?;

        let original = |id: graph::VertexId| {
            dg.graph
                .node_weight(id)
                .and_then(|v| v.original())
                .and_then(|i| vertices.get(i).copied())
        };
        let nodes: Vec<Vec<G::NodeId>> = dg
            .layers
            .iter()
            .map(|layer| layer.iter().filter_map(|&v| original(v)).collect())
            .filter(|layer: &Vec<_>| !layer.is_empty())
            .collect();
        let isolated = dg
            .isolated
            .iter()
            .filter_map(|&i| vertices.get(i).copied())
            .collect();
        let reversed_edges = dg
            .chains
            .iter()
            .filter(|chain| chain.reversed)
            .filter_map(|chain| edges.get(chain.original).copied())
            .collect();
        let self_loops = dg
            .self_loops
            .iter()
            .filter_map(|&i| edges.get(i).copied())
            .collect();
        let conflicting_edges = dg
            .chains
            .iter()
            .filter(|chain| dg.crosses_segment(chain))
            .filter_map(|chain| edges.get(chain.original).copied())
            .collect();

        debug!(
            "Laid out {} layers with {} crossings",
            nodes.len(),
            order.crossings
        );
        Ok(Layers {
            nodes,
            isolated,
            crossings: order.crossings,
            reversed_edges,
            self_loops,
            segment_conflicts: order.segment_conflicts,
            conflicting_edges,
            vertices,
            edges,
            sparse: dg,
            compaction: order.compaction,
        })
    }

    /// Compute positions and routes from cached layers (cheap, rerun when
    /// sizes change)
    ///
    /// Positions are the top-left corners of the vertex boxes. Every edge
    /// gets a route, empty unless the edge spans more than one layer.
    pub fn compute_positions<N, E, S>(
        &self,
        layers: &Layers<N, E>,
        sizes: &S,
    ) -> Result<Layout<N, E>, LayeredLayoutError>
    where
        N: Copy + Eq + Hash,
        E: Copy + Eq + Hash,
        S: NodeSizes<N>,
    {
        let size_of = |i: usize| {
            layers
                .vertices
                .get(i)
                .map(|&node| sizes.size(node))
                .unwrap_or_default()
        };
        let spacing = Spacing {
            vertex_distance: self.vertex_distance,
            layer_distance: self.layer_distance,
            direction: self.direction,
        };
        let placement = assign_positions(&layers.sparse, &layers.compaction, spacing, size_of)?;

        let mut positions = HashMap::with_capacity(layers.vertices.len());
        for (&id, &centre) in &placement.centres {
            let Some(original) = layers.sparse.vertex(id)?.original() else {
                continue;
            };
            let size = size_of(original);
            let node = *layers
                .vertices
                .get(original)
                .ok_or(LayeredLayoutError::MissingVertex("caller's vertices"))?;
            positions.insert(node, centre.offset(Vec2::new(-size.x / 2.0, -size.y / 2.0)));
        }
        for (&original, &centre) in layers.sparse.isolated.iter().zip(&placement.isolated) {
            let size = size_of(original);
            let node = *layers
                .vertices
                .get(original)
                .ok_or(LayeredLayoutError::MissingVertex("caller's vertices"))?;
            positions.insert(node, centre.offset(Vec2::new(-size.x / 2.0, -size.y / 2.0)));
        }

        let mut routes: HashMap<E, Vec<Point>> =
            layers.edges.iter().map(|&e| (e, Vec::new())).collect();
        for chain in &layers.sparse.chains {
            if chain.vertices.len() <= 2 {
                continue;
            }
            let mut points = chain
                .vertices
                .iter()
                .map(|v| {
                    placement
                        .centres
                        .get(v)
                        .copied()
                        .ok_or(LayeredLayoutError::MissingVertex("placement"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if chain.reversed {
                points.reverse();
            }
            let edge = *layers
                .edges
                .get(chain.original)
                .ok_or(LayeredLayoutError::MissingVertex("caller's edges"))?;
            routes.insert(edge, points);
        }

        Ok(Layout { positions, routes })
    }
}

// Implement LayoutEngine for any graph with the required capabilities
impl<G> LayoutEngine<G> for LayeredLayout
where
    G: IntoNodeIdentifiers + IntoEdgeReferences,
    G::NodeId: Copy + Ord + Hash,
    G::EdgeId: Copy + Eq + Hash,
{
    type NodeId = G::NodeId;
    type EdgeId = G::EdgeId;
    type Error = LayeredLayoutError;

    fn layout<S>(
        &self,
        graph: G,
        sizes: &S,
    ) -> Result<Layout<Self::NodeId, Self::EdgeId>, Self::Error>
    where
        S: NodeSizes<Self::NodeId>,
    {
        let layers = self.compute_layers(graph, sizes, &CancelToken::new())?;
        self.compute_positions(&layers, sizes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::DiGraph;
    use petgraph::graphmap::DiGraphMap;
    use test_log::test;

    fn boxes<N>(_: N) -> Vec2 {
        Vec2::new(40.0, 20.0)
    }

    #[test]
    fn default_parameters() {
        let layout = LayeredLayout::default();
        assert_eq!(layout.max_permutations, MAX_PERMUTATIONS);
        assert_eq!(layout.direction, LayoutDirection::TopToBottom);

        let layout = LayeredLayout::new(Vec2::new(5.0, 7.0));
        assert_eq!(layout.vertex_distance, 5.0);
        assert_eq!(layout.layer_distance, 7.0);
    }

    #[test]
    fn swapped_edges_end_without_crossing() {
        let mut graph = DiGraph::<&str, ()>::new();
        let a1 = graph.add_node("a1");
        let a2 = graph.add_node("a2");
        let b1 = graph.add_node("b1");
        let b2 = graph.add_node("b2");
        graph.add_edge(a1, b2, ());
        graph.add_edge(a2, b1, ());

        let layers = LayeredLayout::default()
            .compute_layers(&graph, &boxes, &CancelToken::new())
            .unwrap();
        assert_eq!(layers.crossings, 0);
        assert_eq!(layers.nodes.len(), 2);
    }

    #[test]
    fn long_edge_gets_a_four_point_route() {
        let mut graph = DiGraph::<u32, ()>::new();
        let n: Vec<_> = (0..5).map(|i| graph.add_node(i)).collect();
        for pair in n.windows(2) {
            graph.add_edge(pair[0], pair[1], ());
        }
        let long = graph.add_edge(n[0], n[4], ());

        let engine = LayeredLayout::default();
        let layers = engine
            .compute_layers(&graph, &boxes, &CancelToken::new())
            .unwrap();
        assert_eq!(layers.sparse.segments.len(), 1);
        assert_eq!(layers.sparse.dummy_count(), 2);

        let layout = engine.compute_positions(&layers, &boxes).unwrap();
        let route = &layout.routes[&long];
        assert_eq!(route.len(), 4);
        // Source centre first, target centre last
        let source = layout.positions[&n[0]].offset(Vec2::new(20.0, 10.0));
        let target = layout.positions[&n[4]].offset(Vec2::new(20.0, 10.0));
        assert_eq!(route[0], source);
        assert_eq!(route[3], target);
        // The straight part is vertical
        assert_eq!(route[1].x, route[2].x);

        for pair in n.windows(2) {
            let edge = graph.find_edge(pair[0], pair[1]).unwrap();
            assert!(layout.routes[&edge].is_empty());
        }
    }

    #[test]
    fn two_cycle_is_split_over_two_layers() {
        let graph = DiGraphMap::<char, ()>::from_edges([('a', 'b'), ('b', 'a')]);
        let layers = LayeredLayout::default()
            .compute_layers(&graph, &boxes, &CancelToken::new())
            .unwrap();
        assert_eq!(layers.nodes.len(), 2);
        assert_eq!(layers.reversed_edges.len(), 1);

        let layout = LayeredLayout::default().compute_positions(&layers, &boxes).unwrap();
        assert_ne!(layout.positions[&'a'].y, layout.positions[&'b'].y);
    }

    #[test]
    fn reversed_route_still_starts_at_the_source() {
        // 0 -> 1 -> 2 -> 3 and 3 -> 0 closes a cycle over four layers
        let mut graph = DiGraph::<u32, ()>::new();
        let n: Vec<_> = (0..4).map(|i| graph.add_node(i)).collect();
        for pair in n.windows(2) {
            graph.add_edge(pair[0], pair[1], ());
        }
        let back = graph.add_edge(n[3], n[0], ());

        let engine = LayeredLayout::default();
        let layers = engine
            .compute_layers(&graph, &boxes, &CancelToken::new())
            .unwrap();
        assert_eq!(layers.reversed_edges, vec![back]);

        let layout = engine.compute_positions(&layers, &boxes).unwrap();
        let route = &layout.routes[&back];
        assert_eq!(route.len(), 4);
        assert_eq!(route[0], layout.positions[&n[3]].offset(Vec2::new(20.0, 10.0)));
        assert_eq!(route[3], layout.positions[&n[0]].offset(Vec2::new(20.0, 10.0)));
    }

    #[test]
    fn chains_collapse_to_the_caller_edges() {
        let mut graph = DiGraph::<u32, ()>::new();
        let n: Vec<_> = (0..4).map(|i| graph.add_node(i)).collect();
        for pair in n.windows(2) {
            graph.add_edge(pair[0], pair[1], ());
        }
        graph.add_edge(n[0], n[3], ());
        graph.add_edge(n[0], n[1], ());
        graph.add_edge(n[3], n[1], ());
        let looped = graph.add_edge(n[2], n[2], ());

        let layers = LayeredLayout::default()
            .compute_layers(&graph, &boxes, &CancelToken::new())
            .unwrap();
        let mut collapsed = layers.collapsed_edges();
        collapsed.sort_by_key(|&(edge, _, _)| edge);
        let expected: Vec<_> = graph
            .edge_indices()
            .filter(|&e| e != looped)
            .filter_map(|e| graph.edge_endpoints(e).map(|(a, b)| (e, a, b)))
            .collect();
        assert_eq!(collapsed, expected);
        assert!(layers.conflicting_edges.is_empty());
        assert_eq!(layers.segment_conflicts, 0);
    }

    #[test]
    fn isolated_vertex_sits_at_the_origin() {
        let mut graph = DiGraph::<u32, ()>::new();
        let a = graph.add_node(0);
        let b = graph.add_node(1);
        let lonely = graph.add_node(2);
        graph.add_edge(a, b, ());

        let layout = LayeredLayout::default().layout(&graph, &boxes).unwrap();
        assert_eq!(layout.positions[&lonely], Point::new(0.0, 0.0));
        assert!(layout.positions[&a].y > 20.0);
        assert_eq!(layout.positions.len(), 3);
    }

    #[test]
    fn self_loop_gets_an_empty_route() {
        let mut graph = DiGraph::<u32, ()>::new();
        let a = graph.add_node(0);
        let b = graph.add_node(1);
        let looped = graph.add_edge(a, a, ());
        graph.add_edge(a, b, ());

        let engine = LayeredLayout::default();
        let layers = engine
            .compute_layers(&graph, &boxes, &CancelToken::new())
            .unwrap();
        assert_eq!(layers.self_loops, vec![looped]);
        let layout = engine.compute_positions(&layers, &boxes).unwrap();
        assert!(layout.routes[&looped].is_empty());
    }

    #[test]
    fn parallel_edges_each_get_a_route() {
        let mut graph = DiGraph::<u32, ()>::new();
        let n: Vec<_> = (0..4).map(|i| graph.add_node(i)).collect();
        for pair in n.windows(2) {
            graph.add_edge(pair[0], pair[1], ());
        }
        let first = graph.add_edge(n[0], n[3], ());
        let second = graph.add_edge(n[0], n[3], ());

        let layout = LayeredLayout::default().layout(&graph, &boxes).unwrap();
        assert_eq!(layout.routes[&first].len(), 4);
        assert_eq!(layout.routes[&second].len(), 4);
    }

    #[test]
    fn directions_transform_the_drawing() {
        let graph = DiGraphMap::<u32, ()>::from_edges([(0, 1), (1, 2)]);
        let place = |direction| {
            let engine = LayeredLayout {
                direction,
                ..Default::default()
            };
            engine.layout(&graph, &boxes).unwrap().positions
        };

        let down = place(LayoutDirection::TopToBottom);
        assert!(down[&0].y < down[&1].y && down[&1].y < down[&2].y);
        let up = place(LayoutDirection::BottomToTop);
        assert!(up[&0].y > up[&1].y && up[&1].y > up[&2].y);
        let right = place(LayoutDirection::LeftToRight);
        assert!(right[&0].x < right[&1].x && right[&1].x < right[&2].x);
        let left = place(LayoutDirection::RightToLeft);
        assert!(left[&0].x > left[&1].x && left[&1].x > left[&2].x);
    }

    #[test]
    fn same_seed_same_layout() {
        let graph = DiGraphMap::<u32, ()>::from_edges([
            (0, 3),
            (0, 4),
            (1, 3),
            (1, 5),
            (2, 4),
            (2, 5),
            (3, 6),
            (4, 6),
            (5, 7),
            (0, 7),
        ]);
        let engine = LayeredLayout {
            seed: 42,
            ..Default::default()
        };
        let first = engine.layout(&graph, &boxes).unwrap();
        let second = engine.layout(&graph, &boxes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn positions_are_idempotent() {
        let graph = DiGraphMap::<u32, ()>::from_edges([(0, 1), (0, 2), (1, 3), (2, 3), (0, 3)]);
        let engine = LayeredLayout::default();
        let layers = engine
            .compute_layers(&graph, &boxes, &CancelToken::new())
            .unwrap();
        let first = engine.compute_positions(&layers, &boxes).unwrap();
        let second = engine.compute_positions(&layers, &boxes).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn optimized_width_adds_layers() {
        let edges: Vec<(u32, u32)> = (1..=8).map(|leaf| (0, leaf)).collect();
        let graph = DiGraphMap::<u32, ()>::from_edges(edges);
        let engine = LayeredLayout {
            optimize_width: true,
            ..Default::default()
        };
        let layers = engine
            .compute_layers(&graph, &boxes, &CancelToken::new())
            .unwrap();
        assert!(layers.nodes.len() > 2);
    }

    #[test]
    fn cancelled_run_publishes_nothing() {
        let graph = DiGraphMap::<u32, ()>::from_edges([(0, 1)]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = LayeredLayout::default()
            .compute_layers(&graph, &boxes, &cancel)
            .unwrap_err();
        assert!(matches!(err, LayeredLayoutError::Cancelled(_)));
    }

    #[test]
    fn parameters_read_from_ron() {
        let layout: LayeredLayout = ron::from_str("(direction: LeftToRight, seed: 3)").unwrap();
        assert_eq!(layout.direction, LayoutDirection::LeftToRight);
        assert_eq!(layout.seed, 3);
        assert_eq!(layout.vertex_distance, 20.0);
    }
}
