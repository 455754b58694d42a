#![forbid(unsafe_code)]
//! keystone-core library.
//!
//! Work-item records, dependency kinds, JSONL ingestion, and the layered
//! settings file consumed by the triage engine.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types where appropriate;
//!   typed errors (`thiserror`) where callers need to match on the cause.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod ingest;
pub mod model;

pub use model::{Dependency, DependencyKind, Status, WorkItem};
