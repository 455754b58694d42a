//! Critical-path heights over the dependency DAG.
//!
//! # Definition
//!
//! `height(u) = 1 + max(height(v))` over prerequisites `v` of `u`, or `1`
//! when `u` has none. It is the length of the longest dependency chain
//! starting at `u`, so the item that gates the deepest chain scores highest.
//!
//! Heights only make sense on a DAG. The function takes a
//! [`TopologicalOrder`], which exists only for acyclic graphs, so a cyclic
//! graph cannot reach it.

use std::collections::HashMap;

use tracing::instrument;

use crate::graph::{GraphView, TopologicalOrder};

/// Dense heights, one per node index.
#[must_use]
pub fn heights(graph: &GraphView, order: &TopologicalOrder) -> Vec<f64> {
    let mut height = vec![0.0_f64; graph.node_count()];
    // Prerequisites first, so every successor is already final.
    for node in order.prerequisites_first() {
        let deepest = graph
            .successors(node)
            .iter()
            .map(|&v| height[v])
            .fold(0.0_f64, f64::max);
        height[node] = 1.0 + deepest;
    }
    height
}

/// Heights keyed by item id.
#[must_use]
#[instrument(skip(graph, order), fields(nodes = graph.node_count()))]
pub fn compute_heights(graph: &GraphView, order: &TopologicalOrder) -> HashMap<String, f64> {
    graph.to_id_map(&heights(graph, order))
}
