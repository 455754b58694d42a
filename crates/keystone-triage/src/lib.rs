#![forbid(unsafe_code)]
//! keystone-triage library.
//!
//! Structural-importance metrics over a work-item dependency graph:
//! size-adaptive planning ([`plan`]), exact and sampled betweenness
//! ([`metrics::betweenness`]), PageRank/HITS/eigenvector, cycle detection,
//! and critical-path heights, bundled by [`analyze`]. Two exports can be
//! compared with [`compare_snapshots`].
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod analyze;
pub mod deadline;
pub mod graph;
pub mod metrics;
pub mod plan;

pub use analyze::{Analyzer, AnalyzerOptions, GraphStats, MetricOutcome, MetricStatus, analyze};
pub use graph::{GraphView, Snapshot, SnapshotDiff, compare_snapshots};
pub use plan::{AnalysisConfig, BetweennessMode, select_config};
