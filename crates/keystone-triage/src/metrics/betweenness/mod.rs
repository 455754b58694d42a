//! Betweenness centrality via Brandes' algorithm.
//!
//! # Overview
//!
//! Betweenness measures how often an item lies on shortest dependency paths
//! between other pairs. High-betweenness items are bottlenecks: many chains
//! of work route through them.
//!
//! # Modes
//!
//! - [`exact::compute_exact`]: one pass from every source, sequential,
//!   bit-identical across runs. O(V·E). A timed-out run keeps unscaled
//!   partial sums.
//! - [`approx::compute_approximate`]: passes from `k` random pivots on a
//!   worker pool, scaled by `n / k`. Error shrinks as `1/√k`; good enough for
//!   ranking, not for absolute values.
//!
//! Both share the pooled single-source pass in [`pass`], backed by
//! [`pool::BufferPool`].
//!
//! # Output
//!
//! Scores are **not** normalized. For directed graphs each lies in
//! `[0, (n-1)(n-2)]` when exact.

pub mod approx;
pub mod exact;
pub mod pass;
pub mod pool;

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use crate::deadline::Deadline;
use crate::graph::GraphView;
use crate::plan::{BetweennessMode, BetweennessPlan};

pub use approx::{SamplingOptions, choose_pivots, compute_approximate};
pub use exact::compute_exact;
pub use pass::{fresh_pass, single_source_pass};
pub use pool::{BufferPool, PassBuffers, PooledBuffers};

/// Result of one betweenness computation.
#[derive(Debug, Clone, Serialize)]
pub struct BetweennessRun {
    /// Score per dense node index.
    #[serde(skip)]
    pub scores: Vec<f64>,
    /// Mode actually used (a sampled request covering every node runs exact).
    pub mode: BetweennessMode,
    pub sample_size: usize,
    pub total_nodes: usize,
    pub pivots_completed: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "crate::plan::serialize_millis")]
    pub elapsed: Duration,
    /// The deadline cut the run short. Sampled scores are extrapolated from
    /// the completed pivots; exact scores are the raw partial sums.
    pub timed_out: bool,
}

impl BetweennessRun {
    #[must_use]
    pub const fn empty(mode: BetweennessMode) -> Self {
        Self {
            scores: Vec::new(),
            mode,
            sample_size: 0,
            total_nodes: 0,
            pivots_completed: 0,
            elapsed: Duration::ZERO,
            timed_out: false,
        }
    }

    /// Scores keyed by item id.
    #[must_use]
    pub fn to_id_map(&self, graph: &GraphView) -> HashMap<String, f64> {
        graph.to_id_map(&self.scores)
    }
}

/// Scale partial sums from `completed` of `n` sources up to the full graph.
#[allow(clippy::cast_precision_loss)]
fn extrapolate(scores: &mut [f64], n: usize, completed: usize) {
    if completed == 0 || completed == n {
        return;
    }
    let factor = n as f64 / completed as f64;
    for score in scores {
        *score *= factor;
    }
}

/// Betweenness front end owning the buffer pool shared by every run.
#[derive(Debug, Default)]
pub struct BetweennessEngine {
    pool: BufferPool,
    options: SamplingOptions,
}

impl BetweennessEngine {
    #[must_use]
    pub const fn new(options: SamplingOptions) -> Self {
        Self {
            pool: BufferPool::new(),
            options,
        }
    }

    #[must_use]
    pub const fn pool(&self) -> &BufferPool {
        &self.pool
    }

    #[must_use]
    pub fn compute_exact(&self, graph: &GraphView, deadline: &Deadline) -> BetweennessRun {
        compute_exact(graph, &self.pool, deadline)
    }

    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be started.
    pub fn compute_approximate(
        &self,
        graph: &GraphView,
        sample_size: usize,
        deadline: &Deadline,
    ) -> Result<BetweennessRun> {
        compute_approximate(graph, sample_size, &self.pool, self.options, deadline)
    }

    /// Run whatever `plan` asks for; `None` when it says skip.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be started.
    pub fn run(&self, graph: &GraphView, plan: &BetweennessPlan) -> Result<Option<BetweennessRun>> {
        let deadline = Deadline::after(plan.timeout);
        match plan.mode {
            BetweennessMode::Skip => Ok(None),
            BetweennessMode::Exact => Ok(Some(self.compute_exact(graph, &deadline))),
            BetweennessMode::Approximate => self
                .compute_approximate(graph, plan.sample_size, &deadline)
                .map(Some),
        }
    }
}
