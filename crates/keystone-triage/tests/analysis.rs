//! End-to-end analysis over work-item records.
//!
//! Covers:
//! - plan selection for every size tier
//! - chain heights and execution order
//! - cycle degradation (only topo order and critical path drop out)
//! - dangling and informational dependencies
//! - sampled betweenness on a large sparse graph

use keystone_core::{Dependency, DependencyKind, WorkItem};
use keystone_triage::plan::{Metric, SizeTier, density, recommend_sample_size};
use keystone_triage::{
    AnalysisConfig, Analyzer, AnalyzerOptions, BetweennessMode, GraphView, MetricStatus, analyze,
    select_config,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Items `ids`, each depending on the targets listed for it in `edges`.
fn build_items(ids: &[&str], edges: &[(&str, &str)]) -> Vec<WorkItem> {
    ids.iter()
        .map(|&id| {
            edges
                .iter()
                .filter(|(from, _)| *from == id)
                .fold(WorkItem::new(id), |item, (_, to)| item.depends_on(*to))
        })
        .collect()
}

/// `n` items where item `i` depends on `i+1` and `i+7` (when present).
fn sparse_items(n: usize) -> Vec<WorkItem> {
    (0..n)
        .map(|i| {
            let mut item = WorkItem::new(format!("w{i:05}"));
            for step in [1, 7] {
                if i + step < n {
                    item = item.depends_on(format!("w{:05}", i + step));
                }
            }
            item
        })
        .collect()
}

fn seeded_options() -> AnalyzerOptions {
    AnalyzerOptions {
        workers: 2,
        seed: Some(42),
        ..AnalyzerOptions::default()
    }
}

// ---------------------------------------------------------------------------
// Config selection
// ---------------------------------------------------------------------------

#[test]
fn small_graph_plans_exact_everything() {
    let config = select_config(50, 100, false);
    assert_eq!(config.tier, SizeTier::Small);
    assert_eq!(config.betweenness.mode, BetweennessMode::Exact);
    assert_eq!(config.max_cycles_to_store, 1000);
    assert!(config.critical_path);
    assert!(config.skipped_metrics().is_empty());
}

#[test]
fn large_dense_graph_skips_betweenness_with_reason() {
    // 1000 nodes, 20000 edges: density ≈ 0.02.
    let config = select_config(1000, 20_000, false);
    assert_eq!(config.tier, SizeTier::Large);
    assert_eq!(config.betweenness.mode, BetweennessMode::Skip);
    assert_eq!(
        config.betweenness.skip_reason.as_deref(),
        Some("graph too dense (density > 0.01)")
    );
    let skipped = config.skipped_metrics();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].metric, Metric::Betweenness);
}

#[test]
fn large_tier_switches_on_density() {
    // density ≈ 0.00044
    let sparse = select_config(1500, 1000, false);
    assert_eq!(sparse.betweenness.mode, BetweennessMode::Approximate);
    assert_eq!(sparse.betweenness.sample_size, 100);

    // density ≈ 0.022
    let dense = select_config(1500, 50_000, false);
    assert_eq!(dense.betweenness.mode, BetweennessMode::Skip);
    assert!(
        dense
            .betweenness
            .skip_reason
            .as_deref()
            .is_some_and(|r| !r.is_empty())
    );
}

#[test]
fn large_sparse_graph_samples() {
    let config = select_config(1000, 5_000, false);
    assert_eq!(config.betweenness.mode, BetweennessMode::Approximate);
    assert_eq!(config.betweenness.sample_size, 100);
    assert_eq!(config.max_cycles_to_store, 50);
}

#[test]
fn xl_graph_drops_cycles_and_dense_hits() {
    let config = select_config(5000, 30_000, false);
    assert_eq!(config.tier, SizeTier::Xl);
    assert!(!config.cycles.enabled);
    assert_eq!(
        config.cycles.skip_reason.as_deref(),
        Some("graph too large (>2000 nodes)")
    );
    assert_eq!(config.betweenness.sample_size, 200);
    // density ≈ 0.0012: HITS skipped
    assert!(!config.hits.enabled);
    assert_eq!(config.hits.skip_reason.as_deref(), Some("graph too large and dense"));

    let sparse = select_config(5000, 10_000, false);
    assert!(sparse.hits.enabled);
}

#[test]
fn force_full_overrides_every_tier() {
    for (n, e) in [(10, 20), (1000, 20_000), (10_000, 100_000)] {
        let config = select_config(n, e, true);
        assert_eq!(config.betweenness.mode, BetweennessMode::Exact);
        assert_eq!(config.max_cycles_to_store, usize::MAX);
        assert!(config.skipped_metrics().is_empty());
    }
}

#[test]
fn approximate_plans_keep_sample_below_node_count() {
    for n in [500, 750, 1999, 2000, 50_000] {
        let config = select_config(n, n, false);
        if config.betweenness.mode == BetweennessMode::Approximate {
            assert!(config.betweenness.sample_size >= 1);
            assert!(config.betweenness.sample_size < n, "n = {n}");
        }
    }
}

#[test]
fn sample_size_and_density_helpers() {
    assert_eq!(recommend_sample_size(10), 50);
    assert_eq!(recommend_sample_size(400), 80);
    assert_eq!(recommend_sample_size(150), 50);
    assert_eq!(recommend_sample_size(1500), 100);
    assert_eq!(recommend_sample_size(9000), 200);
    assert!(density(1, 0).abs() < f64::EPSILON);
    assert!((density(4, 6) - 0.5).abs() < f64::EPSILON);
}

// ---------------------------------------------------------------------------
// Acyclic analysis
// ---------------------------------------------------------------------------

#[test]
fn chain_of_three_has_heights_three_two_one() {
    let items = build_items(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
    let stats = analyze(&items).expect("analyze");

    assert!((stats.critical_path_score["A"] - 3.0).abs() < f64::EPSILON);
    assert!((stats.critical_path_score["B"] - 2.0).abs() < f64::EPSILON);
    assert!((stats.critical_path_score["C"] - 1.0).abs() < f64::EPSILON);
    assert_eq!(stats.topological_order, vec!["C", "B", "A"]);
    assert!(!stats.is_cyclic());

    let rank_sum: f64 = stats.page_rank.values().sum();
    assert!((rank_sum - 1.0).abs() < 1e-6);
}

#[test]
fn empty_input_yields_empty_maps() {
    let stats = analyze(&[]).expect("analyze");
    assert_eq!(stats.node_count, 0);
    assert_eq!(stats.edge_count, 0);
    assert!(stats.density.abs() < f64::EPSILON);
    assert!(stats.page_rank.is_empty());
    assert!(stats.betweenness.is_empty());
    assert!(stats.critical_path_score.is_empty());
}

#[test]
fn dangling_and_informational_links_are_not_edges() {
    let items = vec![
        WorkItem::new("A")
            .depends_on("B")
            .depends_on("ghost")
            .with_dependency(Dependency::new("C", DependencyKind::Related))
            .with_dependency(Dependency::new("C", DependencyKind::ParentChild)),
        WorkItem::new("B"),
        WorkItem::new("C"),
    ];
    let stats = analyze(&items).expect("analyze");
    assert_eq!(stats.node_count, 3);
    assert_eq!(stats.edge_count, 1);
    assert_eq!(stats.dropped_edges, 1);
    assert_eq!(stats.in_degree["C"], 0);
}

#[test]
fn same_edges_hash_the_same_regardless_of_item_order() {
    let forward = build_items(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
    let mut reversed = forward.clone();
    reversed.reverse();
    let a = GraphView::from_items(&forward);
    let b = GraphView::from_items(&reversed);
    assert_eq!(a.content_hash(), b.content_hash());
    assert!(a.content_hash().starts_with("blake3:"));
}

// ---------------------------------------------------------------------------
// Cycles
// ---------------------------------------------------------------------------

#[test]
fn cycle_disables_only_order_and_heights() {
    let items = build_items(
        &["A", "B", "C", "D"],
        &[("A", "B"), ("B", "C"), ("C", "A"), ("D", "A")],
    );
    let stats = analyze(&items).expect("analyze");

    assert!(stats.is_cyclic());
    assert!(stats.critical_path_score.is_empty());
    assert!(stats.topological_order.is_empty());
    assert_eq!(stats.cycles.len(), 1);
    assert_eq!(stats.page_rank.len(), 4);
    assert_eq!(stats.betweenness.len(), 4);

    for metric in [Metric::TopologicalOrder, Metric::CriticalPath] {
        assert_eq!(
            stats.outcome(metric).map(|o| &o.status),
            Some(&MetricStatus::NotApplicable {
                reason: "graph contains a dependency cycle".to_string()
            })
        );
    }
    for metric in [
        Metric::Degree,
        Metric::PageRank,
        Metric::Betweenness,
        Metric::Eigenvector,
        Metric::Hits,
        Metric::Cycles,
    ] {
        assert!(
            stats.outcome(metric).is_some_and(|o| o.is_computed()),
            "{metric} should be computed"
        );
    }
}

#[test]
fn self_loop_is_a_cycle() {
    let items = vec![WorkItem::new("A").depends_on("A"), WorkItem::new("B")];
    let stats = analyze(&items).expect("analyze");
    assert!(stats.is_cyclic());
    assert_eq!(stats.cycles, vec![vec!["A".to_string()]]);
}

// ---------------------------------------------------------------------------
// Large graphs
// ---------------------------------------------------------------------------

#[test]
fn large_sparse_graph_runs_sampled_betweenness() {
    let items = sparse_items(600);
    let stats = Analyzer::new(&items)
        .with_options(seeded_options())
        .analyze()
        .expect("analyze");

    assert_eq!(stats.tier, Some(SizeTier::Large));
    let run = stats.betweenness_run.as_ref().expect("betweenness ran");
    assert_eq!(run.mode, BetweennessMode::Approximate);
    assert_eq!(run.sample_size, 100);
    assert_eq!(run.total_nodes, 600);
    assert!(run.pivots_completed <= 100);
    assert_eq!(stats.betweenness.len(), 600);
    assert!(stats.betweenness.values().all(|&s| s >= 0.0));
}

#[test]
fn explicit_config_overrides_size_plan() {
    let items = sparse_items(600);
    let stats = Analyzer::new(&items)
        .with_config(AnalysisConfig::full())
        .analyze()
        .expect("analyze");
    let run = stats.betweenness_run.as_ref().expect("betweenness ran");
    assert_eq!(run.mode, BetweennessMode::Exact);
    assert_eq!(stats.tier, Some(SizeTier::Full));
    assert!((stats.critical_path_score["w00000"] - 600.0).abs() < f64::EPSILON);
}
