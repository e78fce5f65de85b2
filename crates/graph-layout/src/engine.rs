use crate::{Point, Vec2};
use std::collections::HashMap;
use std::hash::Hash;

/// Result of a layout run
///
/// Positions are the top-left corners of the vertex boxes. Routes hold the
/// bend points of every edge, from the edge's source to its target, and are
/// empty for edges that connect adjacent layers or loop on a single vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout<N, E>
where
    N: Eq + Hash,
    E: Eq + Hash,
{
    pub positions: HashMap<N, Point>,
    pub routes: HashMap<E, Vec<Point>>,
}

impl<N, E> Default for Layout<N, E>
where
    N: Eq + Hash,
    E: Eq + Hash,
{
    fn default() -> Self {
        Self {
            positions: HashMap::new(),
            routes: HashMap::new(),
        }
    }
}

/// A layout engine that can compute positions for graph nodes and routes for
/// its edges
///
/// The trait is generic over the graph type `G` so that engines can state
/// their own requirements on the graph (directed, acyclic, ...).
pub trait LayoutEngine<G> {
    /// The type used to identify nodes in the graph
    type NodeId: Copy + Ord + Hash;

    /// The type used to identify edges in the graph
    type EdgeId: Copy + Eq + Hash;

    /// Error raised when the layout cannot be computed
    type Error: std::error::Error;

    /// Compute node positions and edge routes for the given graph
    fn layout<S>(
        &self,
        graph: G,
        sizes: &S,
    ) -> Result<Layout<Self::NodeId, Self::EdgeId>, Self::Error>
    where
        S: NodeSizes<Self::NodeId>;
}

/// Provides the width and height of every node
pub trait NodeSizes<N> {
    fn size(&self, node: N) -> Vec2;
}

impl<N, F> NodeSizes<N> for F
where
    F: Fn(N) -> Vec2,
{
    fn size(&self, node: N) -> Vec2 {
        self(node)
    }
}

// Nodes missing from the map are laid out as points
impl<N: Eq + Hash + Copy> NodeSizes<N> for HashMap<N, Vec2> {
    fn size(&self, node: N) -> Vec2 {
        self.get(&node).copied().unwrap_or_default()
    }
}
