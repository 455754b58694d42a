//! In/out degree per item.
//!
//! In-degree counts dependents ("how many items wait on me"); out-degree
//! counts prerequisites.

use crate::graph::GraphView;

/// Dense in- and out-degree vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degrees {
    pub in_degree: Vec<usize>,
    pub out_degree: Vec<usize>,
}

#[must_use]
pub fn degrees(graph: &GraphView) -> Degrees {
    let n = graph.node_count();
    Degrees {
        in_degree: (0..n).map(|i| graph.in_degree(i)).collect(),
        out_degree: (0..n).map(|i| graph.out_degree(i)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_in_counts_dependents() {
        // A and B both depend on C.
        let graph = GraphView::from_edges(&[("A", "C"), ("B", "C")]);
        let d = degrees(&graph);
        assert_eq!(d.in_degree, vec![0, 0, 2]);
        assert_eq!(d.out_degree, vec![1, 1, 0]);
    }

    #[test]
    fn self_loop_counts_both_ways() {
        let d = degrees(&GraphView::from_edges(&[("A", "A")]));
        assert_eq!(d.in_degree, vec![1]);
        assert_eq!(d.out_degree, vec![1]);
    }
}
