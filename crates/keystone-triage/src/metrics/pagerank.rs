//! PageRank by power iteration.
//!
//! # Overview
//!
//! PageRank identifies items that unblock the most downstream work. Rank
//! flows along "depends on" edges, so a prerequisite that many (important)
//! items wait on accumulates rank.
//!
//! # Algorithm
//!
//! ```text
//! PR(v) = (1 - d) / N + d * Σ PR(u) / out_degree(u)   for each u → v
//!       + d * Σ PR(w) / N                             for each dangling w
//! ```
//!
//! Dangling mass (items with no prerequisites) is spread uniformly so the
//! scores always sum to 1. The deadline is checked once per iteration; on
//! timeout the last complete iterate is returned and flagged.

use serde::Serialize;
use tracing::{instrument, warn};

use crate::deadline::Deadline;
use crate::graph::GraphView;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for PageRank computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageRankConfig {
    /// Damping factor (probability of following a link vs teleporting).
    /// Default: 0.85.
    pub damping: f64,
    /// Convergence threshold: stop when L1 norm of rank delta < tolerance.
    /// Default: 1e-6.
    pub tolerance: f64,
    /// Maximum number of iterations.
    /// Default: 100.
    pub max_iter: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iter: 100,
        }
    }
}

/// Result of a PageRank computation.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRankResult {
    /// Rank per dense node index.
    pub scores: Vec<f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged within `max_iter`.
    pub converged: bool,
    /// The deadline stopped iteration early.
    pub timed_out: bool,
}

/// Compute PageRank over `graph`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
#[instrument(skip(graph, config, deadline), fields(nodes = graph.node_count()))]
pub fn pagerank(graph: &GraphView, config: &PageRankConfig, deadline: &Deadline) -> PageRankResult {
    let n = graph.node_count();

    if n == 0 {
        return PageRankResult {
            scores: Vec::new(),
            iterations: 0,
            converged: true,
            timed_out: false,
        };
    }

    let n_f64 = n as f64;
    let base = (1.0 - config.damping) / n_f64;

    let mut ranks = vec![1.0 / n_f64; n];
    let mut new_ranks = vec![0.0_f64; n];

    let mut iterations = 0;
    let mut converged = false;
    let mut timed_out = false;

    for _ in 0..config.max_iter {
        if deadline.is_expired() {
            timed_out = true;
            break;
        }
        iterations += 1;

        let mut dangling = 0.0_f64;
        new_ranks.fill(0.0);
        for (node, &rank) in ranks.iter().enumerate() {
            let targets = graph.successors(node);
            if targets.is_empty() {
                dangling += rank;
            } else {
                let share = config.damping * rank / targets.len() as f64;
                for &target in targets {
                    new_ranks[target] += share;
                }
            }
        }

        let spread = base + config.damping * dangling / n_f64;
        for r in &mut new_ranks {
            *r += spread;
        }

        // L1 norm of delta.
        let delta: f64 = ranks
            .iter()
            .zip(new_ranks.iter())
            .map(|(old, new)| (old - new).abs())
            .sum();

        std::mem::swap(&mut ranks, &mut new_ranks);

        if delta < config.tolerance {
            converged = true;
            break;
        }
    }

    if timed_out {
        warn!(iterations, "pagerank hit its deadline");
    }

    PageRankResult {
        scores: ranks,
        iterations,
        converged,
        timed_out,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
