//! Core types, errors, and utilities for relayout.
//!
//! This crate provides the foundational types used across the workspace:
//!
//! - Domain types (`FileRecord`, `ReferenceEdge`, `PathMapping`,
//!   `MigrationPlan`, `PlanStatus`)
//! - Configuration structures
//! - Error types for configuration and mappings
//! - Lexical path helpers for root-relative paths
//! - Type aliases for `FxHashMap`/`FxHashSet`

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hash;
pub mod paths;
pub mod types;

pub use config::{Config, ResolveConfig, ScanConfig, StoreConfig};
pub use error::{ConfigError, MappingError};
pub use hash::{FxHashMap, FxHashSet, fx_hash_map_with_capacity};
pub use types::*;
