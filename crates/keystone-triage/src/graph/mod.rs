//! Dependency graph snapshot and structural helpers.
//!
//! # Overview
//!
//! ```text
//! WorkItem records
//!        ↓  build::GraphView::from_items()
//! GraphView (petgraph DiGraph + CSR adjacency, may contain cycles)
//!        ├─ topo::TopologicalOrder::of()   → Some only when acyclic
//!        └─ cycles::enumerate_cycles()     → elementary cycles, capped
//! ```
//!
//! ## Change Detection
//!
//! [`GraphView::content_hash`] is a BLAKE3 hash of the edge set. Compare it
//! against a stored value to tell whether the dependency structure moved;
//! [`snapshot::compare_snapshots`] says what moved.

pub mod build;
pub mod cycles;
pub mod snapshot;
pub mod topo;

pub use build::GraphView;
pub use cycles::{CycleEnumeration, cyclic_components, enumerate_cycles};
pub use snapshot::{Snapshot, SnapshotDiff, compare_snapshots};
pub use topo::TopologicalOrder;
