//! The single-source accumulation pass of Brandes' algorithm.
//!
//! # Steps
//!
//! 1. BFS from the source over "depends on" edges for hop distances.
//! 2. List reached non-source nodes by increasing distance, ties in index
//!    order. A counting sort over BFS layers keeps this allocation-free and
//!    identical for exact and sampled runs, so rounding is reproducible.
//! 3. In that order, `sigma[n]` sums `sigma[p]` over in-neighbours `p` with
//!    `dist[p] + 1 == dist[n]`; those `p` are `n`'s predecessors.
//! 4. In reverse order, `delta[p] += sigma[p] / sigma[n] * (1 + delta[n])`.
//!
//! Every slot read in steps 3 and 4 was written earlier in the same pass.
//! Unreached nodes never enter the order and are never read.

use crate::graph::GraphView;

use super::pool::{PassBuffers, UNREACHED};

/// Run one pass from `source`, leaving dependency scores in `buffers`.
///
/// Use [`PassBuffers::merge_into`] to add them to a running total.
pub fn single_source_pass(graph: &GraphView, source: usize, buffers: &mut PassBuffers) {
    let n = graph.node_count();
    buffers.reset(n);
    if source >= n {
        return;
    }

    // 1. BFS distances.
    buffers.dist[source] = 0;
    buffers.sigma[source] = 1.0;
    buffers.queue.push_back(source);
    let mut max_dist = 0u32;
    let mut reached = 0usize;
    while let Some(v) = buffers.queue.pop_front() {
        let next = buffers.dist[v] + 1;
        for &w in graph.successors(v) {
            if buffers.dist[w] == UNREACHED {
                buffers.dist[w] = next;
                buffers.queue.push_back(w);
                max_dist = max_dist.max(next);
                reached += 1;
            }
        }
    }

    // 2. Reached nodes by (distance, index).
    order_by_distance(buffers, source, max_dist, reached);

    // 3. Path counts and shortest-path predecessors.
    let PassBuffers {
        dist,
        sigma,
        preds,
        order,
        ..
    } = &mut *buffers;
    for &node in order.iter() {
        let on_path = dist[node] - 1;
        for &p in graph.predecessors(node) {
            if dist[p] == on_path {
                sigma[node] += sigma[p];
                preds[node].push(p);
            }
        }
        // First BFS layer: only reachable straight from the source. Holds for
        // unit weights only.
        if preds[node].is_empty() && dist[node] == 1 {
            sigma[node] = 1.0;
            preds[node].push(source);
        }
    }

    // 4. Dependency accumulation, farthest first.
    let PassBuffers {
        sigma,
        delta,
        preds,
        order,
        ..
    } = &mut *buffers;
    for &node in order.iter().rev() {
        let carried = 1.0 + delta[node];
        let paths = sigma[node];
        for &p in &preds[node] {
            delta[p] += (sigma[p] / paths) * carried;
        }
    }
}

/// Counting sort of reached non-source nodes into `buffers.order`.
fn order_by_distance(buffers: &mut PassBuffers, source: usize, max_dist: u32, reached: usize) {
    let PassBuffers {
        dist,
        order,
        layers,
        ..
    } = buffers;

    let depth = max_dist as usize;
    layers.resize(depth + 1, 0);
    for (node, &d) in dist.iter().enumerate() {
        if node != source && d != UNREACHED {
            layers[d as usize] += 1;
        }
    }

    // Bucket counts → start offsets (layer 0 holds only the source).
    let mut start = 0usize;
    for slot in layers.iter_mut() {
        let count = *slot;
        *slot = start;
        start += count;
    }

    order.resize(reached, 0);
    for (node, &d) in dist.iter().enumerate() {
        if node != source && d != UNREACHED {
            let slot = &mut layers[d as usize];
            order[*slot] = node;
            *slot += 1;
        }
    }
}

/// Dependency scores from `source` with freshly allocated state.
///
/// The straightforward Brandes sweep: BFS discovery order as the stack,
/// `VecDeque` queue, new vectors per call. Used to check that pooled passes
/// change nothing but allocation behaviour.
#[must_use]
pub fn fresh_pass(graph: &GraphView, source: usize) -> Vec<f64> {
    use std::collections::VecDeque;

    let n = graph.node_count();
    let mut delta = vec![0.0; n];
    if source >= n {
        return delta;
    }

    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0_f64; n];
    let mut dist: Vec<i64> = vec![-1; n];
    sigma[source] = 1.0;
    dist[source] = 0;

    let mut queue = VecDeque::from([source]);
    while let Some(v) = queue.pop_front() {
        stack.push(v);
        for &w in graph.successors(v) {
            if dist[w] < 0 {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
            if dist[w] == dist[v] + 1 {
                sigma[w] += sigma[v];
                predecessors[w].push(v);
            }
        }
    }

    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
        }
    }
    delta[source] = 0.0;
    delta
}
