//! One-call structural analysis of a work-item set.
//!
//! # Overview
//!
//! [`Analyzer`] builds the [`GraphView`], picks an [`AnalysisConfig`] from
//! the graph's size, and runs every enabled metric against its own deadline.
//! The result is a [`GraphStats`] snapshot plus one [`MetricOutcome`] per
//! metric saying whether it was computed, skipped, cut short, or not
//! applicable.
//!
//! # Degradation
//!
//! - A cycle disables the topological order and critical-path heights; every
//!   other metric still runs.
//! - A timeout keeps the partial result and marks the outcome `timed_out`.
//! - The only hard failure is being unable to start the betweenness worker
//!   pool.
//!
//! ```rust,ignore
//! use keystone_triage::{Analyzer, analyze};
//!
//! let stats = analyze(&items)?;
//! let plan = Analyzer::new(&items).with_options(opts).config().clone();
//! ```

use std::collections::HashMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use keystone_core::config::Settings;
use keystone_core::model::WorkItem;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::deadline::Deadline;
use crate::graph::{GraphView, TopologicalOrder, enumerate_cycles};
use crate::metrics::betweenness::{BetweennessEngine, BetweennessRun, SamplingOptions};
use crate::metrics::critical_path::compute_heights;
use crate::metrics::degree::degrees;
use crate::metrics::eigenvector::{EigenvectorConfig, eigenvector_centrality};
use crate::metrics::hits::{HitsConfig, hits};
use crate::metrics::pagerank::{PageRankConfig, pagerank};
use crate::plan::{AnalysisConfig, Metric, MetricPlan, SizeTier, select_config};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Tunables that do not depend on graph size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalyzerOptions {
    /// Betweenness worker threads; 0 means available parallelism.
    pub workers: usize,
    /// Seed for betweenness pivot sampling.
    pub seed: Option<u64>,
    pub pagerank: PageRankConfig,
    pub hits: HitsConfig,
    pub eigenvector: EigenvectorConfig,
}

impl AnalyzerOptions {
    /// Options from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            workers: settings.analysis.workers,
            seed: settings.analysis.seed,
            pagerank: PageRankConfig {
                damping: settings.pagerank.damping,
                tolerance: settings.pagerank.tolerance,
                max_iter: settings.pagerank.max_iter,
            },
            hits: HitsConfig {
                max_iter: settings.hits.max_iter,
                tolerance: settings.hits.tolerance,
            },
            eigenvector: EigenvectorConfig::default(),
        }
    }

    const fn sampling(&self) -> SamplingOptions {
        SamplingOptions {
            workers: self.workers,
            seed: self.seed,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetricStatus {
    Computed,
    /// Disabled by the size policy.
    Skipped { reason: String },
    /// Budget ran out; the stored result is partial.
    TimedOut,
    /// Not defined for this graph (e.g. heights on a cyclic graph).
    NotApplicable { reason: String },
}

/// Status and wall time of one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricOutcome {
    pub metric: Metric,
    #[serde(flatten)]
    pub status: MetricStatus,
    #[serde(rename = "elapsed_ms", serialize_with = "crate::plan::serialize_millis")]
    pub elapsed: Duration,
}

impl MetricOutcome {
    fn new(metric: Metric, status: MetricStatus, started: Instant) -> Self {
        Self {
            metric,
            status,
            elapsed: started.elapsed(),
        }
    }

    fn skipped_now(metric: Metric, reason: String) -> Self {
        Self {
            metric,
            status: MetricStatus::Skipped { reason },
            elapsed: Duration::ZERO,
        }
    }

    fn finished(metric: Metric, timed_out: bool, started: Instant) -> Self {
        let status = if timed_out {
            MetricStatus::TimedOut
        } else {
            MetricStatus::Computed
        };
        Self {
            metric,
            status,
            elapsed: started.elapsed(),
        }
    }

    #[must_use]
    pub const fn is_computed(&self) -> bool {
        matches!(self.status, MetricStatus::Computed)
    }
}

// ---------------------------------------------------------------------------
// GraphStats
// ---------------------------------------------------------------------------

/// Everything one analysis run produced, keyed by item id.
///
/// Maps for metrics that did not run are empty; check [`GraphStats::outcomes`]
/// to tell "skipped" from "all zero".
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub content_hash: String,
    /// Blocking dependencies on unknown items, left out of the graph.
    pub dropped_edges: usize,
    pub tier: Option<SizeTier>,

    pub page_rank: HashMap<String, f64>,
    pub betweenness: HashMap<String, f64>,
    pub eigenvector: HashMap<String, f64>,
    pub hubs: HashMap<String, f64>,
    pub authorities: HashMap<String, f64>,
    /// Number of items that depend on each item.
    pub in_degree: HashMap<String, usize>,
    /// Number of prerequisites of each item.
    pub out_degree: HashMap<String, usize>,
    /// Longest dependency chain from each item; empty when cyclic.
    pub critical_path_score: HashMap<String, f64>,

    pub cycles: Vec<Vec<String>>,
    pub cycles_truncated: bool,
    /// Execution order, prerequisites first; empty when cyclic.
    pub topological_order: Vec<String>,

    pub betweenness_run: Option<BetweennessRun>,
    pub outcomes: Vec<MetricOutcome>,
}

impl GraphStats {
    #[must_use]
    pub fn outcome(&self, metric: Metric) -> Option<&MetricOutcome> {
        self.outcomes.iter().find(|o| o.metric == metric)
    }

    /// `true` when the graph has at least one dependency cycle.
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        matches!(
            self.outcome(Metric::TopologicalOrder).map(|o| &o.status),
            Some(MetricStatus::NotApplicable { .. })
        )
    }

    /// The `k` highest entries of `scores`, ties broken by id.
    #[must_use]
    pub fn top(scores: &HashMap<String, f64>, k: usize) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> =
            scores.iter().map(|(id, &s)| (id.as_str(), s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(k);
        ranked
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Graph snapshot plus the plan and options for analysing it.
#[derive(Debug, Clone)]
pub struct Analyzer {
    graph: GraphView,
    config: AnalysisConfig,
    options: AnalyzerOptions,
}

impl Analyzer {
    /// Build the graph from `items` and plan by its size.
    #[must_use]
    pub fn new(items: &[WorkItem]) -> Self {
        Self::from_graph(GraphView::from_items(items))
    }

    #[must_use]
    pub fn from_graph(graph: GraphView) -> Self {
        let config = select_config(graph.node_count(), graph.edge_count(), false);
        Self {
            graph,
            config,
            options: AnalyzerOptions::default(),
        }
    }

    /// Replace the size-derived plan.
    #[must_use]
    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Switch to the full plan when `force_full` is set.
    ///
    /// `false` keeps whatever plan is current, including one given to
    /// [`Analyzer::with_config`].
    #[must_use]
    pub fn force_full(mut self, force_full: bool) -> Self {
        if force_full {
            self.config = select_config(self.graph.node_count(), self.graph.edge_count(), true);
        }
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: AnalyzerOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    #[must_use]
    pub const fn graph(&self) -> &GraphView {
        &self.graph
    }

    /// Run every metric the plan enables.
    ///
    /// # Errors
    ///
    /// Returns an error only if the betweenness worker pool cannot start.
    #[instrument(skip(self), fields(nodes = self.graph.node_count(), edges = self.graph.edge_count()))]
    pub fn analyze(&self) -> Result<GraphStats> {
        let started = Instant::now();
        let graph = &self.graph;
        let config = &self.config;
        let options = &self.options;

        if graph.dropped_edges() > 0 {
            debug!(
                dropped = graph.dropped_edges(),
                "dependencies on unknown items were ignored"
            );
        }

        let mut stats = GraphStats {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            density: graph.density(),
            content_hash: graph.content_hash().to_string(),
            dropped_edges: graph.dropped_edges(),
            tier: Some(config.tier),
            ..GraphStats::default()
        };

        // Degree
        let t = Instant::now();
        let degree = degrees(graph);
        stats.in_degree = graph.to_id_map(&degree.in_degree);
        stats.out_degree = graph.to_id_map(&degree.out_degree);
        stats
            .outcomes
            .push(MetricOutcome::finished(Metric::Degree, false, t));

        // PageRank
        if let Some(deadline) = deadline_for(&config.pagerank) {
            let t = Instant::now();
            let result = pagerank(graph, &options.pagerank, &deadline);
            stats.page_rank = graph.to_id_map(&result.scores);
            stats.outcomes.push(MetricOutcome::finished(
                Metric::PageRank,
                result.timed_out,
                t,
            ));
        } else {
            stats.outcomes.push(skipped(Metric::PageRank, &config.pagerank));
        }

        // Betweenness
        let t = Instant::now();
        let engine = BetweennessEngine::new(options.sampling());
        match engine
            .run(graph, &config.betweenness)
            .context("betweenness analysis failed")?
        {
            Some(run) => {
                stats.betweenness = run.to_id_map(graph);
                stats.outcomes.push(MetricOutcome::finished(
                    Metric::Betweenness,
                    run.timed_out,
                    t,
                ));
                stats.betweenness_run = Some(run);
            }
            None => {
                let reason = config
                    .betweenness
                    .skip_reason
                    .clone()
                    .unwrap_or_default();
                stats
                    .outcomes
                    .push(MetricOutcome::skipped_now(Metric::Betweenness, reason));
            }
        }

        // Eigenvector
        if let Some(deadline) = deadline_for(&config.eigenvector) {
            let t = Instant::now();
            let result = eigenvector_centrality(graph, &options.eigenvector, &deadline);
            stats.eigenvector = graph.to_id_map(&result.scores);
            stats.outcomes.push(MetricOutcome::finished(
                Metric::Eigenvector,
                result.timed_out,
                t,
            ));
        } else {
            stats
                .outcomes
                .push(skipped(Metric::Eigenvector, &config.eigenvector));
        }

        // HITS
        if let Some(deadline) = deadline_for(&config.hits) {
            let t = Instant::now();
            let result = hits(graph, &options.hits, &deadline);
            stats.hubs = graph.to_id_map(&result.hubs);
            stats.authorities = graph.to_id_map(&result.authorities);
            stats
                .outcomes
                .push(MetricOutcome::finished(Metric::Hits, result.timed_out, t));
        } else {
            stats.outcomes.push(skipped(Metric::Hits, &config.hits));
        }

        // Cycles
        if let Some(deadline) = deadline_for(&config.cycles) {
            let t = Instant::now();
            let found = enumerate_cycles(graph, config.max_cycles_to_store, &deadline);
            stats.cycles = found.cycles;
            stats.cycles_truncated = found.truncated;
            stats.outcomes.push(MetricOutcome::finished(
                Metric::Cycles,
                found.timed_out,
                t,
            ));
        } else {
            stats.outcomes.push(skipped(Metric::Cycles, &config.cycles));
        }

        // Topological order and critical path
        let t = Instant::now();
        if let Some(order) = TopologicalOrder::of(graph) {
            stats.topological_order = order.to_ids(graph);
            stats.outcomes.push(MetricOutcome::finished(
                Metric::TopologicalOrder,
                false,
                t,
            ));

            let t = Instant::now();
            if config.critical_path {
                stats.critical_path_score = compute_heights(graph, &order);
                stats
                    .outcomes
                    .push(MetricOutcome::finished(Metric::CriticalPath, false, t));
            } else {
                stats.outcomes.push(MetricOutcome::skipped_now(
                    Metric::CriticalPath,
                    "disabled by configuration".to_string(),
                ));
            }
        } else {
            warn!("dependency cycle present; skipping topological order and critical path");
            let reason = "graph contains a dependency cycle".to_string();
            stats.outcomes.push(MetricOutcome::new(
                Metric::TopologicalOrder,
                MetricStatus::NotApplicable {
                    reason: reason.clone(),
                },
                t,
            ));
            stats.outcomes.push(MetricOutcome::new(
                Metric::CriticalPath,
                MetricStatus::NotApplicable { reason },
                t,
            ));
        }

        let timed_out = stats
            .outcomes
            .iter()
            .filter(|o| o.status == MetricStatus::TimedOut)
            .count();
        info!(
            nodes = stats.node_count,
            edges = stats.edge_count,
            tier = %config.tier,
            cycles = stats.cycles.len(),
            timed_out,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "analysis complete"
        );

        Ok(stats)
    }
}

/// Analyse `items` with the size-selected plan and default options.
///
/// # Errors
///
/// Returns an error only if the betweenness worker pool cannot start.
pub fn analyze(items: &[WorkItem]) -> Result<GraphStats> {
    Analyzer::new(items).analyze()
}

fn deadline_for(plan: &MetricPlan) -> Option<Deadline> {
    plan.enabled.then(|| Deadline::after(plan.timeout))
}

fn skipped(metric: Metric, plan: &MetricPlan) -> MetricOutcome {
    let reason = plan.skip_reason.clone().unwrap_or_default();
    debug!(%metric, %reason, "metric skipped by plan");
    MetricOutcome::skipped_now(metric, reason)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
