//! HITS (Hyperlink-Induced Topic Search) algorithm.
//!
//! # Overview
//!
//! HITS computes two scores for each node:
//!
//! - **Hub score**: how much a node points to good authorities. Here a hub
//!   is an item that depends on many important prerequisites.
//! - **Authority score**: how much a node is pointed to by good hubs. An
//!   authority is a prerequisite that many important items depend on.
//!
//! # Algorithm
//!
//! Iterative power method (Kleinberg, 1999):
//!
//! 1. Initialize all hub and authority scores to 1.0.
//! 2. Authority update: `auth(v) = sum of hub(u) for all u → v`.
//! 3. Hub update: `hub(v) = sum of auth(w) for all v → w`.
//! 4. Normalize both vectors to unit length (L2 norm).
//! 5. Repeat until convergence, max iterations, or the deadline.

use serde::Serialize;
use tracing::{instrument, warn};

use crate::deadline::Deadline;
use crate::graph::GraphView;

/// Iteration limits for HITS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitsConfig {
    pub max_iter: usize,
    /// Stop when the L2 change in authority scores drops below this.
    pub tolerance: f64,
}

impl Default for HitsConfig {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tolerance: 1e-8,
        }
    }
}

/// Result of the HITS algorithm.
#[derive(Debug, Clone, PartialEq)]
pub struct HitsResult {
    /// Hub score per dense node index.
    pub hubs: Vec<f64>,
    /// Authority score per dense node index.
    pub authorities: Vec<f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged within `max_iter`.
    pub converged: bool,
    pub timed_out: bool,
}

/// Compute HITS hub and authority scores.
///
/// Isolated nodes end with a score of 0 after the first update.
#[must_use]
#[instrument(skip(graph, config, deadline), fields(nodes = graph.node_count()))]
pub fn hits(graph: &GraphView, config: &HitsConfig, deadline: &Deadline) -> HitsResult {
    let n = graph.node_count();

    let mut hub: Vec<f64> = vec![1.0; n];
    let mut auth: Vec<f64> = vec![1.0; n];
    let mut new_auth = vec![0.0; n];
    let mut new_hub = vec![0.0; n];

    let mut converged = n == 0;
    let mut timed_out = false;
    let mut iterations = 0;

    while !converged && iterations < config.max_iter {
        if deadline.is_expired() {
            timed_out = true;
            break;
        }
        iterations += 1;

        // Authority update: auth(v) = sum of hub(u) for all u → v
        for (v, slot) in new_auth.iter_mut().enumerate() {
            *slot = graph.predecessors(v).iter().map(|&u| hub[u]).sum();
        }

        // Hub update: hub(v) = sum of auth(w) for all v → w
        for (v, slot) in new_hub.iter_mut().enumerate() {
            *slot = graph.successors(v).iter().map(|&w| new_auth[w]).sum();
        }

        normalize_l2(&mut new_auth);
        normalize_l2(&mut new_hub);

        let diff: f64 = auth
            .iter()
            .zip(new_auth.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();

        std::mem::swap(&mut auth, &mut new_auth);
        std::mem::swap(&mut hub, &mut new_hub);

        converged = diff < config.tolerance;
    }

    if timed_out {
        warn!(iterations, "hits hit its deadline");
    }

    HitsResult {
        hubs: hub,
        authorities: auth,
        iterations,
        converged,
        timed_out,
    }
}

/// Scale `v` to unit L2 norm; all-zero vectors are left alone.
pub(crate) fn normalize_l2(v: &mut [f64]) {
    let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
