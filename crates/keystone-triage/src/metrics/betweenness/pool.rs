//! Reusable scratch storage for single-source Brandes passes.
//!
//! A pass needs per-node distance, path count, dependency and predecessor
//! state plus a few working lists. Allocating those per pivot dominates the
//! cost of sampled betweenness, so passes borrow a [`PassBuffers`] bundle
//! from a [`BufferPool`] instead. Only storage survives between passes:
//! [`PassBuffers::reset`] overwrites every slot the next pass can read.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Distance marker for nodes the current pass has not reached.
pub const UNREACHED: u32 = u32::MAX;

/// Per-node capacity reserved when a bundle is first created.
pub const DEFAULT_NODE_CAPACITY: usize = 256;

/// Scratch state for one single-source pass.
///
/// Fields are indexed by dense node index and valid only for nodes listed in
/// `order` (plus the source) after a pass.
#[derive(Debug, Default)]
pub struct PassBuffers {
    pub(crate) dist: Vec<u32>,
    pub(crate) sigma: Vec<f64>,
    pub(crate) delta: Vec<f64>,
    pub(crate) preds: Vec<Vec<usize>>,
    /// Reached non-source nodes, ascending distance then index.
    pub(crate) order: Vec<usize>,
    pub(crate) queue: VecDeque<usize>,
    /// Counting-sort buckets, one per BFS layer.
    pub(crate) layers: Vec<usize>,
}

impl PassBuffers {
    #[must_use]
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            dist: Vec::with_capacity(nodes),
            sigma: Vec::with_capacity(nodes),
            delta: Vec::with_capacity(nodes),
            preds: Vec::with_capacity(nodes),
            order: Vec::with_capacity(nodes),
            queue: VecDeque::with_capacity(nodes),
            layers: Vec::new(),
        }
    }

    /// Prepare for a pass over a graph of `nodes` nodes.
    ///
    /// Per-node slots are rewritten by value; predecessor lists keep their
    /// backing storage. Storage only grows, once, when `nodes` exceeds what
    /// the bundle has seen before.
    pub fn reset(&mut self, nodes: usize) {
        self.dist.clear();
        self.dist.resize(nodes, UNREACHED);
        self.sigma.clear();
        self.sigma.resize(nodes, 0.0);
        self.delta.clear();
        self.delta.resize(nodes, 0.0);

        if self.preds.len() < nodes {
            self.preds.resize_with(nodes, Vec::new);
        }
        for list in &mut self.preds[..nodes] {
            list.clear();
        }

        self.order.clear();
        self.queue.clear();
        self.layers.clear();
    }

    /// Number of nodes this bundle can hold without reallocating.
    #[must_use]
    pub fn node_capacity(&self) -> usize {
        self.dist.capacity()
    }

    /// Add this pass's dependency scores into `scores`.
    ///
    /// Only nodes reached by the pass are touched; the source never is.
    pub fn merge_into(&self, scores: &mut [f64]) {
        for &node in &self.order {
            scores[node] += self.delta[node];
        }
    }

    /// Dependency score of `node` from the last pass (0 if unreached).
    #[must_use]
    pub fn dependency(&self, node: usize) -> f64 {
        if self.dist.get(node).is_some_and(|&d| d != UNREACHED && d > 0) {
            self.delta[node]
        } else {
            0.0
        }
    }
}

/// Check-out/check-in pool of [`PassBuffers`].
///
/// Each concurrent pass holds its own bundle; a bundle is never shared. The
/// pool is an ordinary value: construct one per engine, or per test.
#[derive(Debug)]
pub struct BufferPool {
    idle: Mutex<Vec<PassBuffers>>,
    created: AtomicUsize,
    node_capacity: usize,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_node_capacity(DEFAULT_NODE_CAPACITY)
    }

    /// A pool whose fresh bundles reserve room for `nodes` nodes.
    #[must_use]
    pub const fn with_node_capacity(nodes: usize) -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            created: AtomicUsize::new(0),
            node_capacity: nodes,
        }
    }

    /// Take a bundle, creating one if none is idle. It goes back to the pool
    /// when the guard is dropped.
    pub fn checkout(&self) -> PooledBuffers<'_> {
        let reused = self.lock_idle().pop();
        let buffers = reused.unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            PassBuffers::with_capacity(self.node_capacity)
        });
        PooledBuffers {
            pool: self,
            buffers,
        }
    }

    /// Bundles created over the pool's lifetime.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Bundles currently checked in.
    #[must_use]
    pub fn available(&self) -> usize {
        self.lock_idle().len()
    }

    fn check_in(&self, buffers: PassBuffers) {
        self.lock_idle().push(buffers);
    }

    fn lock_idle(&self) -> MutexGuard<'_, Vec<PassBuffers>> {
        // A panicking pass cannot leave a bundle half-returned.
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A checked-out [`PassBuffers`]; returns itself to the pool on drop.
#[derive(Debug)]
pub struct PooledBuffers<'a> {
    pool: &'a BufferPool,
    buffers: PassBuffers,
}

impl Deref for PooledBuffers<'_> {
    type Target = PassBuffers;

    fn deref(&self) -> &PassBuffers {
        &self.buffers
    }
}

impl DerefMut for PooledBuffers<'_> {
    fn deref_mut(&mut self) -> &mut PassBuffers {
        &mut self.buffers
    }
}

impl Drop for PooledBuffers<'_> {
    fn drop(&mut self) {
        let buffers = std::mem::take(&mut self.buffers);
        self.pool.check_in(buffers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_overwrites_stale_values() {
        let mut buffers = PassBuffers::with_capacity(4);
        buffers.reset(4);
        buffers.dist[2] = 7;
        buffers.sigma[2] = 3.0;
        buffers.delta[2] = 1.5;
        buffers.preds[2].push(1);
        buffers.order.push(2);

        buffers.reset(4);
        assert_eq!(buffers.dist, vec![UNREACHED; 4]);
        assert!(buffers.sigma.iter().all(|&s| s == 0.0));
        assert!(buffers.delta.iter().all(|&d| d == 0.0));
        assert!(buffers.preds.iter().all(Vec::is_empty));
        assert!(buffers.order.is_empty());
    }

    #[test]
    fn reset_keeps_predecessor_storage() {
        let mut buffers = PassBuffers::with_capacity(2);
        buffers.reset(2);
        buffers.preds[1].extend([0, 0, 0, 0]);
        let capacity = buffers.preds[1].capacity();

        buffers.reset(2);
        assert!(buffers.preds[1].is_empty());
        assert_eq!(buffers.preds[1].capacity(), capacity);
    }

    #[test]
    fn reset_grows_for_larger_graph() {
        let mut buffers = PassBuffers::with_capacity(2);
        buffers.reset(1000);
        assert_eq!(buffers.dist.len(), 1000);
        assert!(buffers.node_capacity() >= 1000);

        buffers.reset(3);
        assert_eq!(buffers.dist.len(), 3);
        assert!(buffers.node_capacity() >= 1000);
    }

    #[test]
    fn concurrent_checkouts_get_distinct_bundles() {
        let pool = BufferPool::with_node_capacity(8);
        let mut first = pool.checkout();
        let second = pool.checkout();
        assert_eq!(pool.created(), 2);
        assert_eq!(pool.available(), 0);
        first.reset(3);
        first.dist[0] = 0;
        assert!(second.dist.is_empty());
        drop(first);
        drop(second);
        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn returned_bundles_are_reused() {
        let pool = BufferPool::new();
        for _ in 0..10 {
            let mut buffers = pool.checkout();
            buffers.reset(16);
        }
        assert_eq!(pool.created(), 1);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn reused_bundle_keeps_grown_storage() {
        let pool = BufferPool::with_node_capacity(4);
        {
            let mut buffers = pool.checkout();
            buffers.reset(500);
        }
        let buffers = pool.checkout();
        assert!(buffers.node_capacity() >= 500);
    }
}
