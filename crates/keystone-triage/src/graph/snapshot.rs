//! Snapshot comparison between two exports of the same work-item set.
//!
//! # Overview
//!
//! A [`Snapshot`] keeps the items of one export keyed by id, the
//! [`GraphView::content_hash`] of its dependency graph, and its elementary
//! cycles in canonical form. [`compare_snapshots`] reports what moved
//! between two of them: items added, removed, or modified field by field,
//! plus cycles that appeared or were resolved.
//!
//! ## Dependencies
//!
//! Dependencies compare as a set of `(target, kind)` pairs, so reordering
//! them is not a change but switching a kind (say `related` to `blocks`) is.
//! Only blocking dependencies reach the graph, so [`SnapshotDiff::graph_changed`]
//! can be `false` while an item still shows a dependency change.
//!
//! ## Cycles
//!
//! A cycle is rotated to start at its smallest id, so the same loop found
//! from a different entry point, or in a reordered export, compares equal.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use keystone_core::model::WorkItem;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::deadline::Deadline;
use crate::graph::{GraphView, enumerate_cycles};

/// Cycles kept per snapshot.
const CYCLE_CAP: usize = 1000;

/// Budget for cycle enumeration per snapshot.
const CYCLE_BUDGET: Duration = Duration::from_secs(2);

/// One export of the work-item set, ready for comparison.
#[derive(Debug, Clone)]
pub struct Snapshot {
    items: BTreeMap<String, WorkItem>,
    content_hash: String,
    cycles: BTreeSet<Vec<String>>,
    cycles_complete: bool,
}

impl Snapshot {
    /// Capture `items`. Duplicate ids keep their first occurrence, as in
    /// [`GraphView::from_items`].
    #[must_use]
    #[instrument(skip(items), fields(items = items.len()))]
    pub fn new(items: &[WorkItem]) -> Self {
        let graph = GraphView::from_items(items);
        let found = enumerate_cycles(&graph, CYCLE_CAP, &Deadline::after(CYCLE_BUDGET));

        let mut by_id = BTreeMap::new();
        for item in items {
            by_id
                .entry(item.id.clone())
                .or_insert_with(|| item.clone());
        }

        Self {
            items: by_id,
            content_hash: graph.content_hash().to_string(),
            cycles: found.cycles.into_iter().map(canonical_cycle).collect(),
            cycles_complete: !found.truncated && !found.timed_out,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Canonical cycles, sorted.
    pub fn cycles(&self) -> impl Iterator<Item = &[String]> + '_ {
        self.cycles.iter().map(Vec::as_slice)
    }
}

/// One field that differs between two versions of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub from: String,
    pub to: String,
}

/// An item present in both snapshots whose fields differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifiedItem {
    pub id: String,
    pub changes: Vec<FieldChange>,
}

/// What changed from one [`Snapshot`] to another. Lists are sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotDiff {
    pub from_hash: String,
    pub to_hash: String,
    /// The blocking-dependency graph differs.
    pub graph_changed: bool,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<ModifiedItem>,
    pub new_cycles: Vec<Vec<String>>,
    pub resolved_cycles: Vec<Vec<String>>,
    /// Cycle enumeration stopped early on either side, so the cycle lists
    /// may be incomplete.
    pub cycles_partial: bool,
}

impl SnapshotDiff {
    /// `true` when nothing at all changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.graph_changed
            && self.added.is_empty()
            && self.removed.is_empty()
            && self.modified.is_empty()
            && self.new_cycles.is_empty()
            && self.resolved_cycles.is_empty()
    }
}

/// Compare `from` (older) against `to` (newer).
#[must_use]
#[instrument(skip_all, fields(from = from.len(), to = to.len()))]
pub fn compare_snapshots(from: &Snapshot, to: &Snapshot) -> SnapshotDiff {
    let mut diff = SnapshotDiff {
        from_hash: from.content_hash.clone(),
        to_hash: to.content_hash.clone(),
        graph_changed: from.content_hash != to.content_hash,
        cycles_partial: !from.cycles_complete || !to.cycles_complete,
        ..SnapshotDiff::default()
    };

    for (id, old) in &from.items {
        match to.items.get(id) {
            None => diff.removed.push(id.clone()),
            Some(new) => {
                let changes = field_changes(old, new);
                if !changes.is_empty() {
                    diff.modified.push(ModifiedItem {
                        id: id.clone(),
                        changes,
                    });
                }
            }
        }
    }
    diff.added = to
        .items
        .keys()
        .filter(|id| !from.items.contains_key(*id))
        .cloned()
        .collect();

    diff.new_cycles = to.cycles.difference(&from.cycles).cloned().collect();
    diff.resolved_cycles = from.cycles.difference(&to.cycles).cloned().collect();

    debug!(
        added = diff.added.len(),
        removed = diff.removed.len(),
        modified = diff.modified.len(),
        new_cycles = diff.new_cycles.len(),
        resolved_cycles = diff.resolved_cycles.len(),
        "compared snapshots"
    );
    diff
}

fn field_changes(old: &WorkItem, new: &WorkItem) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    if old.title != new.title {
        changes.push(FieldChange {
            field: "title",
            from: old.title.clone(),
            to: new.title.clone(),
        });
    }
    if old.status != new.status {
        changes.push(FieldChange {
            field: "status",
            from: old.status.to_string(),
            to: new.status.to_string(),
        });
    }
    let (old_deps, new_deps) = (dependency_set(old), dependency_set(new));
    if old_deps != new_deps {
        changes.push(FieldChange {
            field: "dependencies",
            from: render_dependencies(&old_deps),
            to: render_dependencies(&new_deps),
        });
    }
    changes
}

fn dependency_set(item: &WorkItem) -> BTreeSet<(&str, String)> {
    item.dependencies
        .iter()
        .map(|d| (d.depends_on_id.as_str(), d.kind.to_string()))
        .collect()
}

fn render_dependencies(deps: &BTreeSet<(&str, String)>) -> String {
    deps.iter()
        .map(|(target, kind)| format!("{target} ({kind})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rotate `cycle` so it starts at its smallest id.
fn canonical_cycle(mut cycle: Vec<String>) -> Vec<String> {
    let start = cycle
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.cmp(b.1))
        .map_or(0, |(i, _)| i);
    cycle.rotate_left(start);
    cycle
}
