//! Graph construction from work-item records.
//!
//! # Overview
//!
//! [`GraphView`] is the immutable snapshot every metric reads. It is built
//! once per analysis run and never mutated afterwards.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A **depends on** B" (B is a prerequisite of A).
//! For each blocking dependency `(item_id=A, depends_on_id=B)` we insert
//! edge `A → B`. In-degree therefore counts dependents ("how many items
//! wait on me") and out-degree counts prerequisites.
//!
//! ## Only Blocking Edges
//!
//! Only `blocks` dependencies become edges. `related`, `parent-child` and
//! other informational links are excluded. Dependencies naming an item that
//! is not in the input are dropped and counted in
//! [`GraphView::dropped_edges`].
//!
//! ## Indexing
//!
//! Nodes get dense indices `0..n` in input order; duplicate item ids keep
//! their first occurrence, dependencies included. The petgraph `NodeIndex`
//! of node `i` is `NodeIndex::new(i)`. Adjacency is also stored as flat CSR arrays so the
//! hot loops (betweenness, PageRank) read `&[usize]` slices instead of
//! walking petgraph's linked edge lists.
//!
//! ## Content Hash
//!
//! [`GraphView::content_hash`] is a BLAKE3 hash of the sorted edge list, so
//! two snapshots with the same dependency structure hash identically.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use keystone_core::model::WorkItem;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, instrument};

// ---------------------------------------------------------------------------
// GraphView
// ---------------------------------------------------------------------------

/// Immutable directed dependency graph over dense node indices.
#[derive(Debug, Clone)]
pub struct GraphView {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, usize>,
    out_offsets: Vec<usize>,
    out_targets: Vec<usize>,
    in_offsets: Vec<usize>,
    in_sources: Vec<usize>,
    content_hash: String,
    dropped_edges: usize,
}

impl GraphView {
    /// Build a [`GraphView`] from work-item records.
    ///
    /// Every item becomes a node, even with no dependencies, so downstream
    /// metrics see the full node set.
    #[must_use]
    #[instrument(skip(items), fields(items = items.len()))]
    pub fn from_items(items: &[WorkItem]) -> Self {
        let mut ids: Vec<String> = Vec::with_capacity(items.len());
        let mut node_map: HashMap<String, usize> = HashMap::with_capacity(items.len());
        // Later records with an already-seen id are ignored entirely.
        let mut firsts: Vec<&WorkItem> = Vec::with_capacity(items.len());

        for item in items {
            if !node_map.contains_key(&item.id) {
                node_map.insert(item.id.clone(), ids.len());
                ids.push(item.id.clone());
                firsts.push(item);
            }
        }

        let mut edges: Vec<(usize, usize)> = Vec::new();
        let mut dropped = 0usize;

        for (u, item) in firsts.iter().enumerate() {
            for dep in item.blocking_dependencies() {
                if let Some(&v) = node_map.get(dep) {
                    edges.push((u, v));
                } else {
                    dropped += 1;
                    debug!(item = %item.id, missing = dep, "dropping dependency on unknown item");
                }
            }
        }

        Self::assemble(ids, node_map, edges, dropped)
    }

    /// Build a graph whose nodes are the ids mentioned in `edges`, in sorted
    /// order. Each pair `(a, b)` means "a depends on b".
    #[must_use]
    pub fn from_edges(edges: &[(&str, &str)]) -> Self {
        let all_ids: std::collections::BTreeSet<&str> =
            edges.iter().flat_map(|(a, b)| [*a, *b]).collect();
        let nodes: Vec<&str> = all_ids.into_iter().collect();
        Self::with_nodes(&nodes, edges)
    }

    /// Build a graph with an explicit node list (isolated nodes allowed).
    ///
    /// Edges naming ids not in `nodes` are dropped.
    #[must_use]
    pub fn with_nodes(nodes: &[&str], edges: &[(&str, &str)]) -> Self {
        let mut ids: Vec<String> = Vec::with_capacity(nodes.len());
        let mut node_map: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
        for id in nodes {
            if !node_map.contains_key(*id) {
                node_map.insert((*id).to_string(), ids.len());
                ids.push((*id).to_string());
            }
        }

        let mut pairs = Vec::with_capacity(edges.len());
        let mut dropped = 0usize;
        for (a, b) in edges {
            match (node_map.get(*a), node_map.get(*b)) {
                (Some(&u), Some(&v)) => pairs.push((u, v)),
                _ => dropped += 1,
            }
        }

        Self::assemble(ids, node_map, pairs, dropped)
    }

    fn assemble(
        ids: Vec<String>,
        node_map: HashMap<String, usize>,
        mut edges: Vec<(usize, usize)>,
        dropped_edges: usize,
    ) -> Self {
        let n = ids.len();

        // Parallel edges collapse to one unit-weight edge.
        edges.sort_unstable();
        edges.dedup();

        let content_hash = compute_edge_hash(&ids, &edges);

        let mut graph = DiGraph::<String, ()>::with_capacity(n, edges.len());
        for id in ids {
            graph.add_node(id);
        }
        for &(u, v) in &edges {
            graph.add_edge(NodeIndex::new(u), NodeIndex::new(v), ());
        }

        let (out_offsets, out_targets) = compressed_rows(n, edges.iter().copied());

        let mut reversed: Vec<(usize, usize)> = edges.iter().map(|&(u, v)| (v, u)).collect();
        reversed.sort_unstable();
        let (in_offsets, in_sources) = compressed_rows(n, reversed.into_iter());

        Self {
            graph,
            node_map,
            out_offsets,
            out_targets,
            in_offsets,
            in_sources,
            content_hash,
            dropped_edges,
        }
    }

    /// Return the number of nodes (items) in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of distinct dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// `edge_count / (node_count * (node_count - 1))`, or 0 below two nodes.
    #[must_use]
    pub fn density(&self) -> f64 {
        crate::plan::density(self.node_count(), self.edge_count())
    }

    /// Look up the dense index for an item ID.
    #[must_use]
    pub fn node_index(&self, item_id: &str) -> Option<usize> {
        self.node_map.get(item_id).copied()
    }

    /// Return the item ID for a dense index.
    #[must_use]
    pub fn item_id(&self, idx: usize) -> Option<&str> {
        self.graph
            .node_weight(NodeIndex::new(idx))
            .map(String::as_str)
    }

    /// Item ids in index order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.graph.node_weights().map(String::as_str)
    }

    /// Nodes `idx` depends on, ascending.
    #[must_use]
    pub fn successors(&self, idx: usize) -> &[usize] {
        &self.out_targets[self.out_offsets[idx]..self.out_offsets[idx + 1]]
    }

    /// Nodes that depend on `idx`, ascending.
    #[must_use]
    pub fn predecessors(&self, idx: usize) -> &[usize] {
        &self.in_sources[self.in_offsets[idx]..self.in_offsets[idx + 1]]
    }

    #[must_use]
    pub fn out_degree(&self, idx: usize) -> usize {
        self.out_offsets[idx + 1] - self.out_offsets[idx]
    }

    #[must_use]
    pub fn in_degree(&self, idx: usize) -> usize {
        self.in_offsets[idx + 1] - self.in_offsets[idx]
    }

    /// The underlying petgraph graph (node `i` is `NodeIndex::new(i)`).
    #[must_use]
    pub const fn graph(&self) -> &DiGraph<String, ()> {
        &self.graph
    }

    /// BLAKE3 content hash of the edge set.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Blocking dependencies dropped because their target was unknown.
    #[must_use]
    pub const fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }

    /// Expand a dense per-node vector into an item-id keyed map.
    #[must_use]
    pub fn to_id_map<T: Copy>(&self, values: &[T]) -> HashMap<String, T> {
        self.ids()
            .zip(values.iter().copied())
            .map(|(id, value)| (id.to_string(), value))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Build CSR offsets/targets from `(row, col)` pairs sorted by row.
fn compressed_rows(
    n: usize,
    sorted_pairs: impl Iterator<Item = (usize, usize)>,
) -> (Vec<usize>, Vec<usize>) {
    let mut offsets = vec![0usize; n + 1];
    let mut targets = Vec::new();
    for (row, col) in sorted_pairs {
        offsets[row + 1] += 1;
        targets.push(col);
    }
    for i in 0..n {
        offsets[i + 1] += offsets[i];
    }
    (offsets, targets)
}

/// Compute a BLAKE3 hash of the edge list sorted by item id.
fn compute_edge_hash(ids: &[String], edges: &[(usize, usize)]) -> String {
    let mut named: Vec<(&str, &str)> = edges
        .iter()
        .map(|&(u, v)| (ids[u].as_str(), ids[v].as_str()))
        .collect();
    named.sort_unstable();

    let mut hasher = blake3::Hasher::new();
    for (dependent, prerequisite) in named {
        hasher.update(dependent.as_bytes());
        hasher.update(b"\x00");
        hasher.update(prerequisite.as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
