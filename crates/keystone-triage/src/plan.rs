//! Size-adaptive analysis planning.
//!
//! # Overview
//!
//! Which metrics are worth running, and for how long, depends on how big and
//! how dense the dependency graph is. [`select_config`] maps
//! `(node_count, edge_count, force_full)` to an [`AnalysisConfig`]; it is a
//! pure function with no failure mode.
//!
//! # Tiers
//!
//! | Tier   | Nodes     | Betweenness                                   | Budgets        |
//! |--------|-----------|-----------------------------------------------|----------------|
//! | Small  | < 100     | exact                                         | 2 s            |
//! | Medium | 100–499   | exact                                         | 500 ms         |
//! | Large  | 500–1999  | sampled if density < 0.01, otherwise skipped  | 300 ms / 500 ms|
//! | XL     | ≥ 2000    | sampled (200 pivots)                          | 200 ms / 500 ms|
//!
//! XL graphs also skip cycle enumeration, and HITS unless density < 0.001.
//! `force_full` overrides everything: exact betweenness, 30 s budgets and no
//! cap on stored cycles.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tracing::debug;

const SMALL_LIMIT: usize = 100;
const MEDIUM_LIMIT: usize = 500;
const LARGE_LIMIT: usize = 2000;

const LARGE_DENSITY_LIMIT: f64 = 0.01;
const XL_HITS_DENSITY_LIMIT: f64 = 0.001;

const FULL_BUDGET: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Vocabulary
// ---------------------------------------------------------------------------

/// Graph size class that drove the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTier {
    Small,
    Medium,
    Large,
    Xl,
    /// Every metric forced on regardless of size.
    Full,
}

impl fmt::Display for SizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Xl => "xl",
            Self::Full => "full",
        };
        f.write_str(name)
    }
}

/// Metrics the analyzer knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Degree,
    PageRank,
    Betweenness,
    Eigenvector,
    Hits,
    Cycles,
    TopologicalOrder,
    CriticalPath,
}

impl Metric {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Degree => "degree",
            Self::PageRank => "pagerank",
            Self::Betweenness => "betweenness",
            Self::Eigenvector => "eigenvector",
            Self::Hits => "hits",
            Self::Cycles => "cycles",
            Self::TopologicalOrder => "topological_order",
            Self::CriticalPath => "critical_path",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How betweenness centrality is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BetweennessMode {
    /// Brandes over every source node.
    Exact,
    /// Brandes over a random sample of pivots, extrapolated.
    Approximate,
    /// Not computed.
    Skip,
}

impl fmt::Display for BetweennessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exact => "exact",
            Self::Approximate => "approximate",
            Self::Skip => "skip",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// Enable flag and budget for one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricPlan {
    pub enabled: bool,
    #[serde(rename = "timeout_ms", serialize_with = "serialize_millis")]
    pub timeout: Duration,
    /// Why the metric is disabled. Reporting only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl MetricPlan {
    #[must_use]
    pub const fn run(timeout: Duration) -> Self {
        Self {
            enabled: true,
            timeout,
            skip_reason: None,
        }
    }

    #[must_use]
    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            enabled: false,
            timeout: Duration::ZERO,
            skip_reason: Some(reason.into()),
        }
    }
}

/// Betweenness mode, sample size and budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BetweennessPlan {
    pub mode: BetweennessMode,
    /// Pivot count; meaningful only for [`BetweennessMode::Approximate`].
    pub sample_size: usize,
    #[serde(rename = "timeout_ms", serialize_with = "serialize_millis")]
    pub timeout: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl BetweennessPlan {
    #[must_use]
    pub const fn exact(timeout: Duration) -> Self {
        Self {
            mode: BetweennessMode::Exact,
            sample_size: 0,
            timeout,
            skip_reason: None,
        }
    }

    #[must_use]
    pub const fn approximate(sample_size: usize, timeout: Duration) -> Self {
        Self {
            mode: BetweennessMode::Approximate,
            sample_size,
            timeout,
            skip_reason: None,
        }
    }

    #[must_use]
    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            mode: BetweennessMode::Skip,
            sample_size: 0,
            timeout: Duration::ZERO,
            skip_reason: Some(reason.into()),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.mode != BetweennessMode::Skip
    }
}

/// A metric disabled by policy, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedMetric {
    pub metric: Metric,
    pub reason: String,
}

/// Which metrics run, and with what budgets, for one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisConfig {
    pub tier: SizeTier,
    pub betweenness: BetweennessPlan,
    pub pagerank: MetricPlan,
    pub hits: MetricPlan,
    pub eigenvector: MetricPlan,
    pub cycles: MetricPlan,
    pub max_cycles_to_store: usize,
    pub critical_path: bool,
}

impl AnalysisConfig {
    /// Tiered plan for a graph of the given size.
    #[must_use]
    pub fn for_size(node_count: usize, edge_count: usize) -> Self {
        let density = density(node_count, edge_count);
        if node_count < SMALL_LIMIT {
            Self::uniform(SizeTier::Small, Duration::from_secs(2), 1000)
        } else if node_count < MEDIUM_LIMIT {
            Self::uniform(SizeTier::Medium, Duration::from_millis(500), 100)
        } else if node_count < LARGE_LIMIT {
            Self::large(node_count, density)
        } else {
            Self::xl(node_count, density)
        }
    }

    fn large(node_count: usize, density: f64) -> Self {
        let budget = Duration::from_millis(300);
        let betweenness = if density < LARGE_DENSITY_LIMIT {
            BetweennessPlan::approximate(
                recommend_sample_size(node_count),
                Duration::from_millis(500),
            )
        } else {
            BetweennessPlan::skip("graph too dense (density > 0.01)")
        };
        Self {
            tier: SizeTier::Large,
            betweenness,
            pagerank: MetricPlan::run(budget),
            hits: MetricPlan::run(budget),
            eigenvector: MetricPlan::run(budget),
            cycles: MetricPlan::run(budget),
            max_cycles_to_store: 50,
            critical_path: true,
        }
    }

    fn xl(node_count: usize, density: f64) -> Self {
        let budget = Duration::from_millis(200);
        let hits = if density < XL_HITS_DENSITY_LIMIT {
            MetricPlan::run(budget)
        } else {
            MetricPlan::skip("graph too large and dense")
        };
        Self {
            tier: SizeTier::Xl,
            betweenness: BetweennessPlan::approximate(
                recommend_sample_size(node_count),
                Duration::from_millis(500),
            ),
            pagerank: MetricPlan::run(budget),
            hits,
            eigenvector: MetricPlan::run(budget),
            cycles: MetricPlan::skip("graph too large (>2000 nodes)"),
            max_cycles_to_store: 10,
            critical_path: true,
        }
    }

    /// Everything on, exact betweenness, generous budgets, no cycle cap.
    #[must_use]
    pub fn full() -> Self {
        Self {
            tier: SizeTier::Full,
            betweenness: BetweennessPlan::exact(FULL_BUDGET),
            pagerank: MetricPlan::run(FULL_BUDGET),
            hits: MetricPlan::run(FULL_BUDGET),
            eigenvector: MetricPlan::run(FULL_BUDGET),
            cycles: MetricPlan::run(FULL_BUDGET),
            max_cycles_to_store: usize::MAX,
            critical_path: true,
        }
    }

    fn uniform(tier: SizeTier, budget: Duration, max_cycles_to_store: usize) -> Self {
        Self {
            tier,
            betweenness: BetweennessPlan::exact(budget),
            pagerank: MetricPlan::run(budget),
            hits: MetricPlan::run(budget),
            eigenvector: MetricPlan::run(budget),
            cycles: MetricPlan::run(budget),
            max_cycles_to_store,
            critical_path: true,
        }
    }

    /// Metrics disabled by this plan, in a fixed order.
    #[must_use]
    pub fn skipped_metrics(&self) -> Vec<SkippedMetric> {
        let reason = |r: Option<&String>| r.cloned().unwrap_or_default();
        let mut skipped = Vec::new();

        if !self.betweenness.enabled() {
            skipped.push(SkippedMetric {
                metric: Metric::Betweenness,
                reason: reason(self.betweenness.skip_reason.as_ref()),
            });
        }
        for (metric, plan) in [
            (Metric::PageRank, &self.pagerank),
            (Metric::Hits, &self.hits),
            (Metric::Eigenvector, &self.eigenvector),
            (Metric::Cycles, &self.cycles),
        ] {
            if !plan.enabled {
                skipped.push(SkippedMetric {
                    metric,
                    reason: reason(plan.skip_reason.as_ref()),
                });
            }
        }
        skipped
    }
}

/// Pick the analysis plan for a graph of `node_count` nodes and
/// `edge_count` edges.
#[must_use]
pub fn select_config(node_count: usize, edge_count: usize, force_full: bool) -> AnalysisConfig {
    let config = if force_full {
        AnalysisConfig::full()
    } else {
        AnalysisConfig::for_size(node_count, edge_count)
    };
    debug!(
        node_count,
        edge_count,
        tier = %config.tier,
        betweenness = %config.betweenness.mode,
        sample_size = config.betweenness.sample_size,
        "selected analysis config"
    );
    config
}

/// Pivot count for sampled betweenness.
///
/// Sampling error shrinks as `1/√k`; these sizes target roughly 20%, 14%,
/// 10% and 7% ranking error per tier.
#[must_use]
pub fn recommend_sample_size(node_count: usize) -> usize {
    if node_count < SMALL_LIMIT {
        50
    } else if node_count < MEDIUM_LIMIT {
        (node_count / 5).max(50)
    } else if node_count < LARGE_LIMIT {
        100
    } else {
        200
    }
}

/// Directed density `e / (n(n-1))`, or 0 below two nodes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0;
    }
    edge_count as f64 / (node_count as f64 * (node_count - 1) as f64)
}

#[allow(clippy::trivially_copy_pass_by_ref, clippy::cast_possible_truncation)]
pub(crate) fn serialize_millis<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis().min(u128::from(u64::MAX)) as u64)
}
