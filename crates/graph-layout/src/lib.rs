//! Layered drawing of directed graphs
//!
//! This crate computes positions for the vertices and bend points for the
//! edges of a directed graph, with the vertices arranged in layers and the
//! edge crossings between layers kept low. It works with any graph
//! implementing petgraph's visitor traits.
//!
//! # Layout Engines
//!
//! - [`LayeredLayout`]: Sugiyama-style layered layout, cycles are broken by
//!   reversing edges and long edges are routed through dummy vertices
//!
//! # Example
//!
//! ```
//! use petgraph::graphmap::DiGraphMap;
//! use strata_layout::{CancelToken, LayeredLayout, LayoutEngine, Vec2};
//!
//! // Create a graph
//! let mut graph = DiGraphMap::new();
//! graph.add_edge(1, 2, ());
//! graph.add_edge(2, 3, ());
//! graph.add_edge(1, 3, ());
//!
//! // Create a layout engine
//! let engine = LayeredLayout::new(Vec2::new(20.0, 20.0));
//!
//! // Provide node sizes
//! let sizes = |_node: i32| Vec2::new(100.0, 50.0);
//!
//! // Use the LayoutEngine trait (simple, single-phase):
//! let layout = engine.layout(&graph, &sizes).unwrap();
//! assert_eq!(layout.routes[&(1, 3)].len(), 3);
//!
//! // Or directly by calling each step for better control
//! let layers = engine.compute_layers(&graph, &sizes, &CancelToken::new()).unwrap();
//! let layout = engine.compute_positions(&layers, &sizes).unwrap();
//! ```

mod cancel;
mod engine;
mod geometry;

pub mod layered;

// Re-export core types and traits
pub use cancel::{CancelToken, Cancelled};
pub use engine::{Layout, LayoutEngine, NodeSizes};
pub use geometry::{Point, Vec2};

// Re-export petgraph visitor traits for graph abstraction
pub use petgraph::visit::{
    GraphBase, IntoEdgeReferences, IntoNeighborsDirected, IntoNodeIdentifiers,
};
pub use petgraph::Direction;

// Re-export layered layout types
pub use layered::{
    bilayer_cross_count, layered_topological_sort, LayerEdge, LayeredLayout, LayeredLayoutError,
    Layers, LayoutDirection, MAX_PERMUTATIONS,
};
