//! Known-topology regressions for the per-metric functions.
//!
//! Each section builds a small graph whose answer can be worked out by hand:
//! chains, diamonds, stars, disconnected pairs, and simple cycles.

use std::time::Duration;

use keystone_triage::GraphView;
use keystone_triage::deadline::Deadline;
use keystone_triage::graph::{TopologicalOrder, cyclic_components, enumerate_cycles};
use keystone_triage::metrics::critical_path::{compute_heights, heights};
use keystone_triage::metrics::degree::degrees;
use keystone_triage::metrics::eigenvector::{EigenvectorConfig, eigenvector_centrality};
use keystone_triage::metrics::hits::{HitsConfig, hits};
use keystone_triage::metrics::pagerank::{PageRankConfig, pagerank};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_graph(edges: &[(&str, &str)]) -> GraphView {
    GraphView::from_edges(edges)
}

fn idx(graph: &GraphView, id: &str) -> usize {
    graph
        .node_index(id)
        .unwrap_or_else(|| panic!("{id} missing from graph"))
}

fn chain() -> GraphView {
    // A depends on B depends on C depends on D.
    build_graph(&[("A", "B"), ("B", "C"), ("C", "D")])
}

fn diamond() -> GraphView {
    build_graph(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")])
}

fn star() -> GraphView {
    // Four leaves all depend on one hub.
    build_graph(&[("l1", "hub"), ("l2", "hub"), ("l3", "hub"), ("l4", "hub")])
}

// ---------------------------------------------------------------------------
// Degree
// ---------------------------------------------------------------------------

#[test]
fn star_hub_has_all_dependents() {
    let graph = star();
    let d = degrees(&graph);
    let hub = idx(&graph, "hub");
    assert_eq!(d.in_degree[hub], 4);
    assert_eq!(d.out_degree[hub], 0);
    for leaf in ["l1", "l2", "l3", "l4"] {
        assert_eq!(d.out_degree[idx(&graph, leaf)], 1);
    }
}

#[test]
fn diamond_degrees() {
    let graph = diamond();
    let d = degrees(&graph);
    assert_eq!(d.out_degree[idx(&graph, "A")], 2);
    assert_eq!(d.in_degree[idx(&graph, "D")], 2);
    assert_eq!(d.in_degree[idx(&graph, "B")], 1);
}

// ---------------------------------------------------------------------------
// PageRank
// ---------------------------------------------------------------------------

#[test]
fn pagerank_favours_deep_prerequisites() {
    let graph = chain();
    let result = pagerank(&graph, &PageRankConfig::default(), &Deadline::unbounded());
    assert!(result.converged);
    let s = |id| result.scores[idx(&graph, id)];
    assert!(s("D") > s("C"));
    assert!(s("C") > s("B"));
    assert!(s("B") > s("A"));
}

#[test]
fn pagerank_star_hub_ranks_first() {
    let graph = star();
    let result = pagerank(&graph, &PageRankConfig::default(), &Deadline::unbounded());
    let hub = result.scores[idx(&graph, "hub")];
    for leaf in ["l1", "l2", "l3", "l4"] {
        assert!(hub > result.scores[idx(&graph, leaf)]);
    }
}

#[test]
fn pagerank_disconnected_pairs_are_symmetric() {
    let graph = build_graph(&[("A", "B"), ("C", "D")]);
    let result = pagerank(&graph, &PageRankConfig::default(), &Deadline::unbounded());
    let s = |id| result.scores[idx(&graph, id)];
    assert!((s("A") - s("C")).abs() < 1e-9);
    assert!((s("B") - s("D")).abs() < 1e-9);
}

proptest! {
    #[test]
    fn pagerank_sums_to_one(edges in prop::collection::vec((0u8..12, 0u8..12), 0..40)) {
        let ids: Vec<String> = edges
            .iter()
            .flat_map(|&(a, b)| [format!("n{a}"), format!("n{b}")])
            .collect();
        let pairs: Vec<(&str, &str)> = ids
            .chunks(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
            .collect();
        let graph = build_graph(&pairs);
        let result = pagerank(&graph, &PageRankConfig::default(), &Deadline::unbounded());
        if graph.node_count() > 0 {
            let sum: f64 = result.scores.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-6, "sum = {sum}");
            prop_assert!(result.scores.iter().all(|&s| s > 0.0));
        }
    }
}

// ---------------------------------------------------------------------------
// HITS and eigenvector
// ---------------------------------------------------------------------------

#[test]
fn hits_star_hub_is_the_authority() {
    let graph = star();
    let result = hits(&graph, &HitsConfig::default(), &Deadline::unbounded());
    let hub = idx(&graph, "hub");
    assert!(result.authorities[hub] > 0.99);
    assert!(result.hubs[hub] < 1e-9);
    let leaf = result.hubs[idx(&graph, "l1")];
    assert!((leaf - 0.5).abs() < 1e-6, "leaf hub score {leaf}");
}

#[test]
fn eigenvector_star_centre_dominates() {
    let graph = star();
    let result =
        eigenvector_centrality(&graph, &EigenvectorConfig::default(), &Deadline::unbounded());
    let hub = result.scores[idx(&graph, "hub")];
    for leaf in ["l1", "l2", "l3", "l4"] {
        assert!(hub > result.scores[idx(&graph, leaf)]);
    }
    let norm: f64 = result.scores.iter().map(|s| s * s).sum::<f64>().sqrt();
    assert!((norm - 1.0).abs() < 1e-6);
}

#[test]
fn iterative_metrics_flag_zero_budget() {
    let graph = diamond();
    let expired = Deadline::after(Duration::ZERO);
    assert!(pagerank(&graph, &PageRankConfig::default(), &expired).timed_out);
    assert!(hits(&graph, &HitsConfig::default(), &expired).timed_out);
    assert!(eigenvector_centrality(&graph, &EigenvectorConfig::default(), &expired).timed_out);
}

// ---------------------------------------------------------------------------
// Topological order and heights
// ---------------------------------------------------------------------------

#[test]
fn chain_heights_count_remaining_steps() {
    let graph = chain();
    let order = TopologicalOrder::of(&graph).expect("acyclic");
    let scores = compute_heights(&graph, &order);
    assert!((scores["A"] - 4.0).abs() < f64::EPSILON);
    assert!((scores["B"] - 3.0).abs() < f64::EPSILON);
    assert!((scores["C"] - 2.0).abs() < f64::EPSILON);
    assert!((scores["D"] - 1.0).abs() < f64::EPSILON);
}

#[test]
fn diamond_heights_take_longest_branch() {
    let graph = build_graph(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "E"), ("E", "D")]);
    let order = TopologicalOrder::of(&graph).expect("acyclic");
    let h = heights(&graph, &order);
    assert!((h[idx(&graph, "A")] - 4.0).abs() < f64::EPSILON);
}

#[test]
fn execution_order_puts_prerequisites_first() {
    let graph = diamond();
    let order = TopologicalOrder::of(&graph).expect("acyclic");
    let ids = order.to_ids(&graph);
    let pos = |id: &str| ids.iter().position(|x| x == id).expect("present");
    assert!(pos("D") < pos("B"));
    assert!(pos("D") < pos("C"));
    assert!(pos("B") < pos("A"));
    assert!(pos("C") < pos("A"));
}

proptest! {
    #[test]
    fn heights_exceed_every_prerequisite(edges in prop::collection::vec((0u8..15, 0u8..15), 0..40)) {
        // Forward edges only keep the graph acyclic.
        let ids: Vec<(String, String)> = edges
            .iter()
            .filter(|(a, b)| a < b)
            .map(|&(a, b)| (format!("n{a:02}"), format!("n{b:02}")))
            .collect();
        let pairs: Vec<(&str, &str)> = ids.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        let graph = build_graph(&pairs);
        let order = TopologicalOrder::of(&graph).expect("forward edges are acyclic");
        let h = heights(&graph, &order);
        for u in 0..graph.node_count() {
            prop_assert!(h[u] >= 1.0);
            for &v in graph.successors(u) {
                prop_assert!(h[u] >= h[v] + 1.0);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Cycles
// ---------------------------------------------------------------------------

#[test]
fn cycle_blocks_topological_order() {
    let graph = build_graph(&[("A", "B"), ("B", "C"), ("C", "A"), ("C", "D")]);
    assert!(TopologicalOrder::of(&graph).is_none());

    let found = enumerate_cycles(&graph, 100, &Deadline::unbounded());
    assert_eq!(found.cycles, vec![vec!["A", "B", "C"]]);
    assert_eq!(cyclic_components(&graph), vec![vec!["A", "B", "C"]]);
}

#[test]
fn two_disjoint_cycles_are_both_reported() {
    let graph = build_graph(&[("A", "B"), ("B", "A"), ("C", "D"), ("D", "C")]);
    let found = enumerate_cycles(&graph, 100, &Deadline::unbounded());
    assert_eq!(found.cycles.len(), 2);
    assert!(!found.truncated);
    assert!(!found.timed_out);
}
