//! Exact betweenness: one pass from every source, sequentially.

use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::deadline::Deadline;
use crate::graph::GraphView;
use crate::plan::BetweennessMode;

use super::BetweennessRun;
use super::pass::single_source_pass;
use super::pool::BufferPool;

/// Brandes over all sources in index order with one pooled bundle.
///
/// Sources and accumulation run in a fixed order, so the result is
/// bit-identical across runs. If `deadline` expires part-way, the run is
/// flagged and keeps the raw sums of the completed sources. Those sources are
/// an index-ordered prefix, not a random sample, so they are not scaled up:
/// every partial score is a lower bound on the exact one. A source whose pass
/// ends after expiry is dropped whole.
#[must_use]
#[instrument(skip(graph, pool, deadline), fields(nodes = graph.node_count()))]
pub fn compute_exact(graph: &GraphView, pool: &BufferPool, deadline: &Deadline) -> BetweennessRun {
    let started = Instant::now();
    let n = graph.node_count();
    let mut scores = vec![0.0; n];
    let mut completed = 0usize;

    if n > 0 {
        let mut buffers = pool.checkout();
        for source in 0..n {
            if deadline.is_expired() {
                break;
            }
            single_source_pass(graph, source, &mut buffers);
            if deadline.is_expired() {
                break;
            }
            buffers.merge_into(&mut scores);
            completed += 1;
        }
    }

    let timed_out = completed < n;
    if timed_out {
        warn!(completed, total = n, "exact betweenness hit its deadline");
    } else {
        debug!(sources = n, "exact betweenness complete");
    }

    BetweennessRun {
        scores,
        mode: BetweennessMode::Exact,
        sample_size: n,
        total_nodes: n,
        pivots_completed: completed,
        elapsed: started.elapsed(),
        timed_out,
    }
}
