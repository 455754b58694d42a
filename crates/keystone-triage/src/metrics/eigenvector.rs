//! Eigenvector centrality via power iteration.
//!
//! # Overview
//!
//! Eigenvector centrality scores nodes by the company they keep: links to
//! high-scoring nodes count more. A dependency DAG has no dominant directed
//! eigenvector (power iteration decays to zero), so edges are read as
//! **undirected**.
//!
//! # Algorithm
//!
//! 1. Initialize scores to `1/√n`.
//! 2. `score'(v) = score(v) + Σ score(u)` over undirected neighbours `u`.
//!    The identity shift keeps bipartite graphs (chains, stars) from
//!    oscillating.
//! 3. Normalize to unit L2 norm.
//! 4. Repeat until convergence, max iterations, or the deadline.

use serde::Serialize;
use tracing::{instrument, warn};

use crate::deadline::Deadline;
use crate::graph::GraphView;
use crate::metrics::hits::normalize_l2;

/// Iteration limits for eigenvector centrality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EigenvectorConfig {
    pub max_iter: usize,
    /// Stop when the L2 change in scores drops below this.
    pub tolerance: f64,
}

impl Default for EigenvectorConfig {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tolerance: 1e-6,
        }
    }
}

/// Result of eigenvector centrality computation.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenvectorResult {
    /// Score per dense node index.
    pub scores: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
    pub timed_out: bool,
}

/// Compute eigenvector centrality for all items in the graph.
#[must_use]
#[allow(clippy::cast_precision_loss)]
#[instrument(skip(graph, config, deadline), fields(nodes = graph.node_count()))]
pub fn eigenvector_centrality(
    graph: &GraphView,
    config: &EigenvectorConfig,
    deadline: &Deadline,
) -> EigenvectorResult {
    let n = graph.node_count();

    if n == 0 {
        return EigenvectorResult {
            scores: Vec::new(),
            iterations: 0,
            converged: true,
            timed_out: false,
        };
    }

    let mut scores: Vec<f64> = vec![1.0 / (n as f64).sqrt(); n];
    let mut new_scores = vec![0.0; n];

    let mut converged = false;
    let mut timed_out = false;
    let mut iterations = 0;

    for _ in 0..config.max_iter {
        if deadline.is_expired() {
            timed_out = true;
            break;
        }
        iterations += 1;

        for (v, slot) in new_scores.iter_mut().enumerate() {
            let incoming: f64 = graph
                .predecessors(v)
                .iter()
                .filter(|&&u| u != v)
                .map(|&u| scores[u])
                .sum();
            // An edge seen in both directions counts once.
            let outgoing: f64 = graph
                .successors(v)
                .iter()
                .filter(|&&w| w != v && graph.predecessors(v).binary_search(&w).is_err())
                .map(|&w| scores[w])
                .sum();
            *slot = scores[v] + incoming + outgoing;
        }

        normalize_l2(&mut new_scores);

        let diff: f64 = scores
            .iter()
            .zip(new_scores.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();

        std::mem::swap(&mut scores, &mut new_scores);

        if diff < config.tolerance {
            converged = true;
            break;
        }
    }

    if timed_out {
        warn!(iterations, "eigenvector centrality hit its deadline");
    }

    EigenvectorResult {
        scores,
        iterations,
        converged,
        timed_out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(graph: &GraphView) -> EigenvectorResult {
        let config = EigenvectorConfig {
            max_iter: 500,
            tolerance: 1e-9,
        };
        eigenvector_centrality(graph, &config, &Deadline::unbounded())
    }

    #[test]
    fn empty_graph() {
        let result = run(&GraphView::from_edges(&[]));
        assert!(result.scores.is_empty());
        assert!(result.converged);
    }

    #[test]
    fn star_center_scores_highest() {
        let graph = GraphView::from_edges(&[("A", "H"), ("B", "H"), ("C", "H"), ("H", "D")]);
        let result = run(&graph);
        let hub = graph.node_index("H").expect("H");
        for (idx, score) in result.scores.iter().enumerate() {
            if idx != hub {
                assert!(result.scores[hub] > *score);
            }
        }
        assert!(result.converged);
    }

    #[test]
    fn chain_converges_with_symmetric_ends() {
        let graph = GraphView::from_edges(&[("A", "B"), ("B", "C")]);
        let result = run(&graph);
        assert!(result.converged);
        assert!((result.scores[0] - result.scores[2]).abs() < 1e-8);
        assert!(result.scores[1] > result.scores[0]);
    }

    #[test]
    fn reciprocal_edges_count_once() {
        let one_way = run(&GraphView::from_edges(&[("A", "B")]));
        let both_ways = run(&GraphView::from_edges(&[("A", "B"), ("B", "A")]));
        assert!((one_way.scores[0] - both_ways.scores[0]).abs() < 1e-9);
    }
}
