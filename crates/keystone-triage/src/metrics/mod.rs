//! Structural-importance metrics for the dependency graph.
//!
//! # Overview
//!
//! Each metric answers a different question about item importance:
//!
//! - **Betweenness** (`betweenness`): which items are bottlenecks that many
//!   dependency paths route through?
//! - **PageRank** (`pagerank`): which prerequisites does the most
//!   (important) work ultimately wait on?
//! - **HITS** (`hits`): which items are authorities (many things depend on
//!   them) vs hubs (they depend on many things)?
//! - **Eigenvector centrality** (`eigenvector`): which items are connected
//!   to other central items?
//! - **Critical path** (`critical_path`): how long is the longest chain
//!   starting at each item?
//! - **Degree** (`degree`): raw fan-in and fan-out.
//!
//! All metrics read a [`crate::graph::GraphView`] and return dense vectors
//! indexed by node; [`crate::analyze`] keys them by item id. Iterative
//! metrics take a [`crate::deadline::Deadline`] and stop between iterations.

pub mod betweenness;
pub mod critical_path;
pub mod degree;
pub mod eigenvector;
pub mod hits;
pub mod pagerank;
