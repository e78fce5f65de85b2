use anyhow::{bail, Result};
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strata_layout::{CancelToken, LayeredLayout, Point, Vec2};
use tracing::debug;

/// Graph to lay out, as read from a RON file
///
/// ```ron
/// (
///     layout: (direction: LeftToRight),
///     nodes: [(name: "src", width: 80, height: 30), (name: "sink")],
///     edges: [("src", "sink")],
/// )
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub layout: LayeredLayout,
    pub nodes: Vec<NodeEntry>,
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeEntry {
    pub name: String,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutDocument {
    pub crossings: u64,
    pub nodes: Vec<PlacedNode>,
    pub edges: Vec<RoutedEdge>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedNode {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutedEdge {
    pub from: String,
    pub to: String,
    pub points: Vec<Point>,
}

impl GraphDocument {
    pub fn lay_out(&self, cancel: &CancelToken) -> Result<LayoutDocument> {
        let mut graph = DiGraph::<&str, ()>::new();
        let mut index = HashMap::new();
        let mut sizes = HashMap::new();
        for node in &self.nodes {
            if index.contains_key(node.name.as_str()) {
                bail!("node {} is declared twice", node.name);
            }
            let id = graph.add_node(node.name.as_str());
            index.insert(node.name.as_str(), id);
            sizes.insert(id, Vec2::new(node.width, node.height));
        }
        for (from, to) in &self.edges {
            let (Some(&source), Some(&target)) =
                (index.get(from.as_str()), index.get(to.as_str()))
            else {
                bail!("edge {from} -> {to} names an undeclared node");
            };
            graph.add_edge(source, target, ());
        }

        let layers = self.layout.compute_layers(&graph, &sizes, cancel)?;
        debug!(
            "{} layers, {} crossings, {} reversed edges",
            layers.nodes.len(),
            layers.crossings,
            layers.reversed_edges.len()
        );
        let layout = self.layout.compute_positions(&layers, &sizes)?;

        let nodes = graph
            .node_indices()
            .map(|id| {
                let position = layout.positions.get(&id).copied().unwrap_or_default();
                let size = sizes.get(&id).copied().unwrap_or_default();
                PlacedNode {
                    name: graph[id].to_string(),
                    x: position.x,
                    y: position.y,
                    width: size.x,
                    height: size.y,
                }
            })
            .collect();
        let edges = graph
            .edge_references()
            .map(|edge| RoutedEdge {
                from: graph[edge.source()].to_string(),
                to: graph[edge.target()].to_string(),
                points: layout.routes.get(&edge.id()).cloned().unwrap_or_default(),
            })
            .collect();

        Ok(LayoutDocument {
            crossings: layers.crossings,
            nodes,
            edges,
        })
    }
}
