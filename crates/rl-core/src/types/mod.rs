//! Domain types for relayout.
//!
//! # Module Organization
//!
//! - [`file`] - File records, categories, languages and buckets
//! - [`edge`] - Resolved references between files
//! - [`mapping`] - Old-path to new-path relocation mappings
//! - [`plan`] - Plans, operations, reference updates and results
//! - [`status`] - Plan lifecycle status
//!
//! All public types are re-exported here and at the crate root:
//!
//! ```
//! use rl_core::{FileRecord, MigrationPlan, PathMapping, PlanStatus};
//! ```

pub mod edge;
pub mod file;
pub mod mapping;
pub mod plan;
pub mod status;

pub use edge::{ReferenceEdge, ReferenceKind};
pub use file::{Bucket, FileCategory, FileRecord, FrontendVariant, Language};
pub use mapping::{MappingEntry, PathMapping};
pub use plan::{
    MigrationPlan, MigrationResult, Operation, OperationId, OperationKind, PlanId,
    ReferenceUpdate, RollbackReport,
};
pub use status::PlanStatus;
