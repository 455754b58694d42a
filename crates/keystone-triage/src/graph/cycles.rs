//! Cycle detection and enumeration for dependency graphs.
//!
//! # Edge Direction
//!
//! Edges read `dependent → prerequisite`. A cycle means no item in it can
//! ever be started, so every cycle is worth reporting, but a dense tangle can
//! hold exponentially many elementary cycles. Enumeration is therefore capped
//! and deadline-checked.
//!
//! # Algorithm
//!
//! Johnson-style blocking search. For each start node `s` in index order,
//! walk only nodes with index `≥ s` inside the strongly connected component
//! of `s`; every cycle is found exactly once, rooted at its lowest index.
//! The DFS is iterative so deep chains never overflow the stack.

#![allow(clippy::module_name_repetitions)]

use fixedbitset::FixedBitSet;
use petgraph::algo::tarjan_scc;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::deadline::Deadline;
use crate::graph::GraphView;

/// How often (in DFS steps) the deadline is polled.
const DEADLINE_POLL_MASK: usize = 0xFF;

/// Elementary cycles found in a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleEnumeration {
    /// Each cycle lists item ids in edge order, starting from the member
    /// with the lowest index. A self-loop is a one-element cycle.
    pub cycles: Vec<Vec<String>>,
    /// The store cap was reached before the search finished.
    pub truncated: bool,
    /// The deadline expired before the search finished.
    pub timed_out: bool,
}

/// Strongly connected components that contain at least one cycle.
///
/// Each entry is a sorted list of item ids. Self-loops are reported as a
/// one-element component.
#[must_use]
pub fn cyclic_components(graph: &GraphView) -> Vec<Vec<String>> {
    let mut components: Vec<Vec<String>> = tarjan_scc(graph.graph())
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| has_self_loop(graph, node.index()))
        })
        .map(|component| {
            let mut ids: Vec<String> = component
                .into_iter()
                .filter_map(|idx| graph.item_id(idx.index()).map(str::to_string))
                .collect();
            ids.sort_unstable();
            ids
        })
        .collect();

    components.sort_unstable();
    components
}

/// Enumerate elementary cycles, storing at most `max_cycles`.
#[must_use]
#[instrument(skip(graph, deadline), fields(nodes = graph.node_count()))]
pub fn enumerate_cycles(
    graph: &GraphView,
    max_cycles: usize,
    deadline: &Deadline,
) -> CycleEnumeration {
    let n = graph.node_count();
    let mut result = CycleEnumeration::default();
    if n == 0 {
        return result;
    }

    let (component_of, component_size) = component_labels(graph);
    let mut search = CircuitSearch::new(n);
    let mut found: Vec<Vec<usize>> = Vec::new();
    let mut steps = 0usize;

    'starts: for start in 0..n {
        let component = component_of[start];
        if component_size[component] == 1 && !has_self_loop(graph, start) {
            continue;
        }
        if deadline.is_expired() {
            result.timed_out = true;
            break;
        }

        let allowed = |w: usize| w >= start && component_of[w] == component;
        search.reset(start, graph, &allowed);

        while let Some(step) = search.advance(start, graph, &allowed) {
            steps += 1;
            if steps & DEADLINE_POLL_MASK == 0 && deadline.is_expired() {
                result.timed_out = true;
                break 'starts;
            }
            if let Step::Closed(cycle) = step {
                if found.len() >= max_cycles {
                    result.truncated = true;
                    break 'starts;
                }
                found.push(cycle);
            }
        }
    }

    if result.timed_out {
        warn!(stored = found.len(), "cycle enumeration hit its deadline");
    }

    result.cycles = found
        .into_iter()
        .map(|cycle| {
            cycle
                .into_iter()
                .filter_map(|idx| graph.item_id(idx).map(str::to_string))
                .collect()
        })
        .collect();
    result
}

fn has_self_loop(graph: &GraphView, idx: usize) -> bool {
    graph.successors(idx).binary_search(&idx).is_ok()
}

/// Component id per node plus the size of each component.
fn component_labels(graph: &GraphView) -> (Vec<usize>, Vec<usize>) {
    let mut component_of = vec![0usize; graph.node_count()];
    let mut sizes = Vec::new();
    for (label, component) in tarjan_scc(graph.graph()).into_iter().enumerate() {
        sizes.push(component.len());
        for node in component {
            component_of[node.index()] = label;
        }
    }
    (component_of, sizes)
}

enum Step {
    Moved,
    Closed(Vec<usize>),
}

struct Frame {
    node: usize,
    next: usize,
    closed_cycle: bool,
}

/// Iterative state for one start node of Johnson's search.
struct CircuitSearch {
    blocked: FixedBitSet,
    blocked_by: Vec<Vec<usize>>,
    path: Vec<usize>,
    frames: Vec<Frame>,
}

impl CircuitSearch {
    fn new(n: usize) -> Self {
        Self {
            blocked: FixedBitSet::with_capacity(n),
            blocked_by: vec![Vec::new(); n],
            path: Vec::new(),
            frames: Vec::new(),
        }
    }

    fn reset(&mut self, start: usize, graph: &GraphView, allowed: &impl Fn(usize) -> bool) {
        self.blocked.clear();
        for idx in start..graph.node_count() {
            if allowed(idx) {
                self.blocked_by[idx].clear();
            }
        }
        self.path.clear();
        self.frames.clear();
        self.path.push(start);
        self.blocked.insert(start);
        self.frames.push(Frame {
            node: start,
            next: 0,
            closed_cycle: false,
        });
    }

    /// Take one DFS step; `None` once the start node is exhausted.
    fn advance(
        &mut self,
        start: usize,
        graph: &GraphView,
        allowed: &impl Fn(usize) -> bool,
    ) -> Option<Step> {
        let frame = self.frames.last_mut()?;
        let successors = graph.successors(frame.node);

        if let Some(&w) = successors.get(frame.next) {
            frame.next += 1;
            if !allowed(w) {
                return Some(Step::Moved);
            }
            if w == start {
                frame.closed_cycle = true;
                return Some(Step::Closed(self.path.clone()));
            }
            if !self.blocked.contains(w) {
                self.blocked.insert(w);
                self.path.push(w);
                self.frames.push(Frame {
                    node: w,
                    next: 0,
                    closed_cycle: false,
                });
            }
            return Some(Step::Moved);
        }

        let Frame {
            node, closed_cycle, ..
        } = self.frames.pop()?;
        if closed_cycle {
            self.unblock(node);
        } else {
            for &w in successors {
                if allowed(w) && !self.blocked_by[w].contains(&node) {
                    self.blocked_by[w].push(node);
                }
            }
        }
        self.path.pop();
        if closed_cycle {
            if let Some(parent) = self.frames.last_mut() {
                parent.closed_cycle = true;
            }
        }
        Some(Step::Moved)
    }

    fn unblock(&mut self, node: usize) {
        let mut pending = vec![node];
        while let Some(current) = pending.pop() {
            if !self.blocked.contains(current) {
                continue;
            }
            self.blocked.set(current, false);
            pending.append(&mut self.blocked_by[current]);
        }
    }
}
