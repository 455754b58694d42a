//! Sampled betweenness over random pivots on a bounded worker pool.
//!
//! Workers pull pivot positions from a shared cursor, run a pooled
//! single-source pass, and merge into one accumulator under a mutex. The
//! deadline is checked before a pivot starts and again before it merges; a
//! pivot that finishes late is dropped whole. `ThreadPool::scope` is the join
//! barrier. The budget is counted from when the pool is up, so thread
//! start-up does not eat into it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, instrument, warn};

use crate::deadline::Deadline;
use crate::graph::GraphView;
use crate::plan::BetweennessMode;

use super::BetweennessRun;
use super::exact::compute_exact;
use super::pass::single_source_pass;
use super::pool::BufferPool;

/// Knobs for a sampled run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SamplingOptions {
    /// Worker threads; 0 means available parallelism.
    pub workers: usize,
    /// Fixed RNG seed for reproducible pivot choice.
    pub seed: Option<u64>,
}

#[derive(Debug)]
struct Accumulator {
    scores: Vec<f64>,
    pivots: usize,
}

/// Estimate betweenness from `sample_size` random pivots.
///
/// Falls back to [`compute_exact`] when `sample_size >= n`. Scores are
/// scaled by `n / completed_pivots`.
///
/// # Errors
///
/// Returns an error only if the worker thread pool cannot be started.
#[instrument(skip(graph, pool, options, deadline), fields(nodes = graph.node_count()))]
pub fn compute_approximate(
    graph: &GraphView,
    sample_size: usize,
    pool: &BufferPool,
    options: SamplingOptions,
    deadline: &Deadline,
) -> Result<BetweennessRun> {
    let started = Instant::now();
    let n = graph.node_count();

    if n == 0 {
        return Ok(BetweennessRun::empty(BetweennessMode::Approximate));
    }
    if sample_size >= n {
        debug!(sample_size, nodes = n, "sample covers every node; running exact");
        return Ok(compute_exact(graph, pool, deadline));
    }

    let sample_size = sample_size.max(1);
    let pivots = choose_pivots(n, sample_size, options.seed);
    let threads = resolve_workers(options.workers).min(sample_size);

    let startup = Instant::now();
    let workers = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("keystone-brandes-{i}"))
        .build()
        .context("failed to start betweenness worker pool")?;
    // Pool start-up is not pivot time.
    let deadline = &deadline.restarted();
    debug!(
        threads,
        startup_us = u64::try_from(startup.elapsed().as_micros()).unwrap_or(u64::MAX),
        "betweenness worker pool started"
    );

    let accumulator = Mutex::new(Accumulator {
        scores: vec![0.0; n],
        pivots: 0,
    });
    let cursor = AtomicUsize::new(0);

    workers.scope(|scope| {
        for _ in 0..threads {
            scope.spawn(|_| {
                drain_pivots(graph, &pivots, &cursor, pool, &accumulator, deadline);
            });
        }
    });

    let Accumulator {
        mut scores,
        pivots: completed,
    } = accumulator
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner);

    super::extrapolate(&mut scores, n, completed);
    let timed_out = completed < sample_size;
    if timed_out {
        warn!(completed, sample_size, "sampled betweenness hit its deadline");
    } else {
        debug!(sample_size, threads, "sampled betweenness complete");
    }

    Ok(BetweennessRun {
        scores,
        mode: BetweennessMode::Approximate,
        sample_size,
        total_nodes: n,
        pivots_completed: completed,
        elapsed: started.elapsed(),
        timed_out,
    })
}

/// Worker loop: one pivot at a time until the queue or the budget runs out.
fn drain_pivots(
    graph: &GraphView,
    pivots: &[usize],
    cursor: &AtomicUsize,
    pool: &BufferPool,
    accumulator: &Mutex<Accumulator>,
    deadline: &Deadline,
) {
    loop {
        if deadline.is_expired() {
            return;
        }
        let position = cursor.fetch_add(1, Ordering::Relaxed);
        let Some(&pivot) = pivots.get(position) else {
            return;
        };

        let mut buffers = pool.checkout();
        single_source_pass(graph, pivot, &mut buffers);
        if deadline.is_expired() {
            return;
        }

        // The bundle goes back only after its contribution is merged.
        let mut shared = accumulator.lock().unwrap_or_else(PoisonError::into_inner);
        buffers.merge_into(&mut shared.scores);
        shared.pivots += 1;
        drop(shared);
        drop(buffers);
    }
}

/// `sample_size` distinct node indices by partial Fisher–Yates shuffle.
#[must_use]
pub fn choose_pivots(n: usize, sample_size: usize, seed: Option<u64>) -> Vec<usize> {
    let mut rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let mut nodes: Vec<usize> = (0..n).collect();
    let (chosen, _) = nodes.partial_shuffle(&mut rng, sample_size);
    chosen.to_vec()
}

fn resolve_workers(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
