//! Reference rewriting and transactional relocation for relayout.
//!
//! # Overview
//!
//! - [`ReferenceRewriter`]: Computes, applies and reverts reference updates
//! - [`Migrator`]: Builds plans and drives them through execution and
//!   rollback, persisting every step
//! - [`suggest_mapping`]: Proposes a frontend/backend layout
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use rl_core::{Config, PathMapping};
//! use rl_migrate::Migrator;
//! use rl_scanner::FileClassifier;
//!
//! let root = Utf8Path::new("./project");
//! let config = Config::default();
//! let records = FileClassifier::new(root, &config.scan)?.analyze_tree()?.records;
//! let mapping = PathMapping::load(Utf8Path::new("mapping.json"))?;
//!
//! let mut migrator = Migrator::open(root, config)?;
//! let draft = migrator.create_plan(&records, &mapping, "split frontend")?;
//! let result = migrator.execute(draft.plan.id)?;
//! if result.rollback_available && result.error_message.is_some() {
//!     migrator.rollback(draft.plan.id)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # State directory
//!
//! ```text
//! <root>/.relayout/
//!     ├── state.json                      plans + result history
//!     └── backups/<plan id>/<old path>    shadow copies of moved files
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod backup;
mod error;
mod layout;
mod migrator;
mod rewriter;
mod store;

pub use backup::ShadowStore;
pub use error::{MigrateError, RewriteError};
pub use layout::{LayoutOptions, LayoutSuggestion, suggest_mapping};
pub use migrator::{Migrator, PlanDraft, Retention};
pub use rewriter::{ChangeLog, ComputedUpdates, ReferenceRewriter};
pub use store::PlanStore;
