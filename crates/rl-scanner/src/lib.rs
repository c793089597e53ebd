//! File classification and reference extraction for relayout.
//!
//! This crate discovers the files of a project tree and describes each one
//! as a [`FileRecord`](rl_core::FileRecord): its category, test and config
//! flags, the raw reference strings it contains, and the names it exports.
//!
//! # Overview
//!
//! - [`FileWalker`]: Directory traversal with ignore-list pruning
//! - [`FileClassifier`]: Classification, extraction and the per-path record cache
//! - [`PatternTable`]: Per-language line-anchored regex tables
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use rl_core::ScanConfig;
//! use rl_scanner::FileClassifier;
//!
//! let mut classifier = FileClassifier::new(Utf8Path::new("./project"), &ScanConfig::default())?;
//! let analysis = classifier.analyze_tree()?;
//! println!("{} files, {} errors", analysis.records.len(), analysis.errors.len());
//! # Ok::<(), rl_scanner::ScanError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! FileClassifier (main entry point)
//!     │
//!     ├── FileWalker (collect root-relative paths)
//!     │       │
//!     │       └── WalkBuilder (ignore crate, standard filters off)
//!     │
//!     ├── GlobSet × 3 (configuration file patterns)
//!     │
//!     ├── PatternTable (regex per language, compiled once)
//!     │
//!     └── record arena + FxHashMap index (per-path cache)
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod classifier;
mod error;
mod patterns;
mod walker;

pub use classifier::{FileClassifier, TreeAnalysis, read_lossy};
pub use error::ScanError;
pub use patterns::{LineMatch, PatternTable, is_python_module};
pub use walker::FileWalker;
