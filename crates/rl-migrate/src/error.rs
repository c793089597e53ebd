//! Error types for the rl-migrate crate.
//!
//! [`RewriteError`] covers editing reference text in files; [`MigrateError`]
//! covers planning, execution, rollback and the durable plan store.

use camino::Utf8PathBuf;
use rl_core::{PlanId, PlanStatus};

/// Errors that can occur while applying or reverting reference updates.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// The file could not be read or written.
    #[error("failed to rewrite {path}: {source}")]
    Io {
        /// Root-relative path of the file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The text at the recorded position is not the expected reference.
    #[error("stale update in {path} at line {line}, column {column}: expected '{expected}'")]
    Stale {
        /// Root-relative path of the file.
        path: Utf8PathBuf,
        /// 1-based line number.
        line: usize,
        /// Byte offset within the line.
        column: usize,
        /// Text the update expected to find.
        expected: String,
    },
}

impl RewriteError {
    /// Creates a new [`RewriteError::Io`] error.
    #[inline]
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors that can occur while planning, executing or rolling back a
/// migration.
///
/// # Error Recovery Strategy
///
/// - **Lookup errors** ([`MigrateError::PlanNotFound`],
///   [`MigrateError::InvalidTransition`]): Nothing was changed
/// - **Store errors** ([`MigrateError::Store`], [`MigrateError::StoreFormat`]):
///   The state file could not be read or written; in-memory state may be
///   ahead of disk
/// - **Step errors** ([`MigrateError::Io`], [`MigrateError::Rewrite`]):
///   Recorded on the failing operation; the plan becomes FAILED
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// No plan with this id is stored.
    #[error("plan {0} not found")]
    PlanNotFound(PlanId),

    /// The plan's status does not permit the requested action.
    #[error("cannot {action} plan {plan}: status is {status}")]
    InvalidTransition {
        /// The plan.
        plan: PlanId,
        /// Its current status.
        status: PlanStatus,
        /// The refused action.
        action: &'static str,
    },

    /// The state file could not be read or written.
    #[error("plan store {path}: {source}")]
    Store {
        /// Path of the state file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The state file is not valid JSON for the store.
    #[error("corrupt plan store: {0}")]
    StoreFormat(#[from] serde_json::Error),

    /// A filesystem step failed.
    #[error("{path}: {source}")]
    Io {
        /// Root-relative path the step acted on.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A step's precondition does not hold.
    #[error("{0}")]
    Step(String),

    /// Reference text could not be rewritten.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

impl MigrateError {
    /// Creates a new [`MigrateError::Io`] error.
    #[inline]
    pub fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`MigrateError::Store`] error.
    #[inline]
    pub fn store(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Store {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`MigrateError::InvalidTransition`] error.
    #[inline]
    pub fn invalid_transition(plan: PlanId, status: PlanStatus, action: &'static str) -> Self {
        Self::InvalidTransition {
            plan,
            status,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_invalid_transition_message() {
        let plan: PlanId = "7b0f3c5e-8a51-4d5c-9a52-2c8c4f1e0a11".parse().unwrap();
        let err = MigrateError::invalid_transition(plan, PlanStatus::Completed, "execute");
        insta::assert_snapshot!(
            err.to_string(),
            @"cannot execute plan 7b0f3c5e-8a51-4d5c-9a52-2c8c4f1e0a11: status is COMPLETED"
        );
    }

    #[test]
    fn test_rewrite_error_converts() {
        let err: MigrateError =
            RewriteError::io("web/a.ts", io::Error::new(io::ErrorKind::NotFound, "gone")).into();
        assert!(err.to_string().contains("web/a.ts"));
        assert!(matches!(err, MigrateError::Rewrite(RewriteError::Io { .. })));
    }
}
