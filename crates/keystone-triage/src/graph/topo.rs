//! Topological order as a proof of acyclicity.
//!
//! Critical-path heights are only defined on a DAG. Rather than trusting
//! callers to check, the only way to get a [`TopologicalOrder`] is
//! [`TopologicalOrder::of`], which returns `None` for cyclic graphs.

use petgraph::algo::toposort;

use crate::graph::GraphView;

/// Node indices in topological order of the "depends on" edges.
///
/// Dependents come before their prerequisites. Use
/// [`TopologicalOrder::prerequisites_first`] for execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalOrder {
    order: Vec<usize>,
}

impl TopologicalOrder {
    /// Sort `graph` topologically; `None` if it has a cycle (self-loops
    /// included).
    #[must_use]
    pub fn of(graph: &GraphView) -> Option<Self> {
        let sorted = toposort(graph.graph(), None).ok()?;
        Some(Self {
            order: sorted.into_iter().map(|idx| idx.index()).collect(),
        })
    }

    /// Dependents first: every edge `u → v` has `u` before `v`.
    #[must_use]
    pub fn dependents_first(&self) -> &[usize] {
        &self.order
    }

    /// Execution order: every prerequisite before the items that need it.
    pub fn prerequisites_first(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().rev().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Item ids in execution order.
    #[must_use]
    pub fn to_ids(&self, graph: &GraphView) -> Vec<String> {
        self.prerequisites_first()
            .filter_map(|idx| graph.item_id(idx).map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_orders_prerequisites_first() {
        let graph = GraphView::from_edges(&[("A", "B"), ("B", "C")]);
        let order = TopologicalOrder::of(&graph).expect("acyclic");
        assert_eq!(order.to_ids(&graph), vec!["C", "B", "A"]);
        assert_eq!(order.len(), 3);
    }

    #[test]
    fn every_edge_respects_order() {
        let graph = GraphView::from_edges(&[
            ("A", "B"),
            ("A", "C"),
            ("B", "D"),
            ("C", "D"),
            ("E", "C"),
        ]);
        let order = TopologicalOrder::of(&graph).expect("acyclic");
        let mut position = vec![0usize; graph.node_count()];
        for (pos, idx) in order.dependents_first().iter().enumerate() {
            position[*idx] = pos;
        }
        for u in 0..graph.node_count() {
            for &v in graph.successors(u) {
                assert!(position[u] < position[v]);
            }
        }
    }

    #[test]
    fn cycle_has_no_order() {
        let graph = GraphView::from_edges(&[("A", "B"), ("B", "A")]);
        assert!(TopologicalOrder::of(&graph).is_none());
    }

    #[test]
    fn self_loop_has_no_order() {
        let graph = GraphView::from_edges(&[("A", "A")]);
        assert!(TopologicalOrder::of(&graph).is_none());
    }

    #[test]
    fn empty_graph_has_empty_order() {
        let graph = GraphView::from_edges(&[]);
        let order = TopologicalOrder::of(&graph).expect("acyclic");
        assert!(order.is_empty());
    }
}
