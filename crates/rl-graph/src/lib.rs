//! Dependency graph construction and analysis for relayout.
//!
//! This crate turns the raw reference strings collected by `rl-scanner`
//! into a directed graph between known files, and answers structural
//! questions about it.
//!
//! # Overview
//!
//! - [`ReferenceResolver`]: Maps raw reference text to known files
//! - [`DependencyGraphBuilder`]: Builds a [`DependencyGraph`] from records
//! - [`GraphAnalyzer`]: Components, cycles, ordering, clusters, relocation
//!   checks and statistics
//!
//! # Example
//!
//! ```
//! use rl_core::{FileCategory, FileRecord, ResolveConfig};
//! use rl_graph::{DependencyGraphBuilder, GraphAnalyzer};
//!
//! let mut a = FileRecord::new("app/a.py".into(), FileCategory::BackendSource);
//! a.references.push(".b".to_owned());
//! let b = FileRecord::new("app/b.py".into(), FileCategory::BackendSource);
//!
//! let graph = DependencyGraphBuilder::new(ResolveConfig::default()).build(&[a, b]);
//! let analyzer = GraphAnalyzer::new(&graph);
//! assert_eq!(graph.edge_count(), 1);
//! assert!(analyzer.find_cycles().is_empty());
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod analyzer;
mod builder;

pub use analyzer::{
    CYCLE_COUNT_LIMIT, Cluster, GraphAnalyzer, GraphStatistics, RelocationReport, format_cycle,
};
pub use builder::{DependencyGraph, DependencyGraphBuilder, Node, ReferenceResolver, Targets};
