//! Migration plan types.
//!
//! This module provides the durable records of a relocation:
//!
//! - [`MigrationPlan`] - ordered [`Operation`]s plus the [`ReferenceUpdate`]s
//!   computed against pre-move locations
//! - [`MigrationResult`] - the immutable outcome of one execution
//! - [`RollbackReport`] - the outcome of undoing a plan
//!
//! Every type here serializes to the state file, so field names are part of
//! the on-disk format.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PlanStatus;

/// Unique identifier of a migration plan.
///
/// # Examples
///
/// ```
/// use rl_core::PlanId;
///
/// let id = PlanId::new();
/// let parsed: PlanId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(Uuid);

impl PlanId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for PlanId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Unique identifier of an operation within a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What a single plan step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Create a directory that the new layout needs.
    CreateDirectory,
    /// Relocate one file, backing it up first.
    MoveFile,
    /// Apply every reference update of one file at its post-move location.
    RewriteReference,
}

impl OperationKind {
    /// Returns a lowercase label, used in log lines and listings.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreateDirectory => "create_directory",
            Self::MoveFile => "move_file",
            Self::RewriteReference => "rewrite_reference",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One step of a migration plan.
///
/// Paths are root-relative. `backup` is relative to the state directory and
/// is only set for moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Identifier of this step.
    pub id: OperationId,
    /// What the step does.
    pub kind: OperationKind,
    /// Pre-move path, for moves and rewrites.
    pub source: Option<Utf8PathBuf>,
    /// Directory to create, move destination, or post-move file to rewrite.
    pub target: Utf8PathBuf,
    /// Shadow copy location under the state directory.
    pub backup: Option<Utf8PathBuf>,
    /// Whether the step finished successfully.
    #[serde(default)]
    pub completed: bool,
    /// Failure message of the step, if it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Operation {
    /// Creates a create-directory step.
    #[must_use]
    pub fn create_directory(target: Utf8PathBuf) -> Self {
        Self::with_kind(OperationKind::CreateDirectory, None, target, None)
    }

    /// Creates a move step with its deterministic backup location.
    #[must_use]
    pub fn move_file(source: Utf8PathBuf, target: Utf8PathBuf, backup: Utf8PathBuf) -> Self {
        Self::with_kind(OperationKind::MoveFile, Some(source), target, Some(backup))
    }

    /// Creates a rewrite step for the file that lives at `target` after moves.
    #[must_use]
    pub fn rewrite_reference(source: Utf8PathBuf, target: Utf8PathBuf) -> Self {
        Self::with_kind(OperationKind::RewriteReference, Some(source), target, None)
    }

    fn with_kind(
        kind: OperationKind,
        source: Option<Utf8PathBuf>,
        target: Utf8PathBuf,
        backup: Option<Utf8PathBuf>,
    ) -> Self {
        Self {
            id: OperationId::new(),
            kind,
            source,
            target,
            backup,
            completed: false,
            error: None,
        }
    }

    /// Returns a one-line human-readable description.
    #[must_use]
    pub fn describe(&self) -> String {
        match (self.kind, &self.source) {
            (OperationKind::CreateDirectory, _) | (_, None) => {
                format!("{} {}", self.kind, self.target)
            }
            (_, Some(source)) => format!("{} {} -> {}", self.kind, source, self.target),
        }
    }
}

/// A single pending edit of reference text.
///
/// `file` is the pre-move path of the referencing file. `line` is 1-based and
/// `column` is the byte offset of `old` within that line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceUpdate {
    /// Pre-move path of the file containing the reference.
    pub file: Utf8PathBuf,
    /// 1-based line number.
    pub line: usize,
    /// Byte offset of `old` within the line.
    pub column: usize,
    /// Reference text currently in the file.
    pub old: String,
    /// Replacement text.
    pub new: String,
}

impl ReferenceUpdate {
    /// Returns the update that undoes this one.
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self {
            file: self.file.clone(),
            line: self.line,
            column: self.column,
            old: self.new.clone(),
            new: self.old.clone(),
        }
    }

    /// Renders the change-log line for this update.
    ///
    /// # Examples
    ///
    /// ```
    /// use rl_core::ReferenceUpdate;
    ///
    /// let update = ReferenceUpdate {
    ///     file: "a/x.ts".into(),
    ///     line: 3,
    ///     column: 20,
    ///     old: "./y".to_owned(),
    ///     new: "../b/y".to_owned(),
    /// };
    /// assert_eq!(update.log_line(), "Line 3: ./y -> ../b/y");
    /// ```
    #[must_use]
    pub fn log_line(&self) -> String {
        format!("Line {}: {} -> {}", self.line, self.old, self.new)
    }
}

/// A persisted relocation plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPlan {
    /// Unique identifier.
    pub id: PlanId,
    /// Free-text description supplied at creation.
    pub description: String,
    /// Steps in execution order.
    pub operations: Vec<Operation>,
    /// Reference edits computed against pre-move locations.
    pub updates: Vec<ReferenceUpdate>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Current lifecycle status.
    pub status: PlanStatus,
}

impl MigrationPlan {
    /// Creates a pending plan.
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        operations: Vec<Operation>,
        updates: Vec<ReferenceUpdate>,
    ) -> Self {
        Self {
            id: PlanId::new(),
            description: description.into(),
            operations,
            updates,
            created_at: Utc::now(),
            status: PlanStatus::Pending,
        }
    }

    /// Returns the updates belonging to the file at pre-move path `file`.
    pub fn updates_for<'a>(
        &'a self,
        file: &'a Utf8Path,
    ) -> impl Iterator<Item = &'a ReferenceUpdate> + 'a {
        self.updates.iter().filter(move |update| update.file.as_path() == file)
    }

    /// Counts operations of the given kind.
    #[must_use]
    pub fn count(&self, kind: OperationKind) -> usize {
        self.operations.iter().filter(|op| op.kind == kind).count()
    }

    /// Counts completed operations.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.operations.iter().filter(|op| op.completed).count()
    }
}

/// The immutable outcome of executing a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Plan that was executed.
    pub plan_id: PlanId,
    /// Final status after execution.
    pub status: PlanStatus,
    /// Number of operations that completed.
    pub completed_operations: usize,
    /// Number of operations in the plan.
    pub total_operations: usize,
    /// Identifiers of operations that failed.
    pub failed_operations: Vec<OperationId>,
    /// Wall-clock execution time in milliseconds.
    pub elapsed_ms: u64,
    /// Whether any step completed and can therefore be undone.
    pub rollback_available: bool,
    /// First failure message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When execution finished.
    pub finished_at: DateTime<Utc>,
}

/// The outcome of rolling back a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackReport {
    /// Plan that was rolled back.
    pub plan_id: PlanId,
    /// `true` only if every undo step succeeded.
    pub success: bool,
    /// One message per failed undo step.
    pub failures: Vec<String>,
    /// Files restored from backup.
    pub restored: usize,
    /// Directories removed.
    pub removed_directories: usize,
    /// Files whose reference edits were reverted.
    pub reverted_files: usize,
}

impl RollbackReport {
    /// Creates an empty, successful report.
    #[must_use]
    pub fn new(plan_id: PlanId) -> Self {
        Self {
            plan_id,
            success: true,
            failures: Vec::new(),
            restored: 0,
            removed_directories: 0,
            reverted_files: 0,
        }
    }

    /// Records a failed undo step.
    pub fn fail(&mut self, message: String) {
        self.success = false;
        self.failures.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_constructors() {
        let dir = Operation::create_directory("b".into());
        assert_eq!(dir.kind, OperationKind::CreateDirectory);
        assert!(dir.source.is_none());
        assert!(!dir.completed);

        let mv = Operation::move_file("a/x.ts".into(), "b/x.ts".into(), "backups/p/a/x.ts".into());
        assert_eq!(mv.kind, OperationKind::MoveFile);
        assert_eq!(mv.backup.as_deref().map(Utf8Path::as_str), Some("backups/p/a/x.ts"));
        assert_eq!(mv.describe(), "move_file a/x.ts -> b/x.ts");
        assert_ne!(dir.id, mv.id);
    }

    #[test]
    fn test_reference_update_inverted() {
        let update = ReferenceUpdate {
            file: "a/x.py".into(),
            line: 1,
            column: 5,
            old: ".y".to_owned(),
            new: "..b.y".to_owned(),
        };
        let inverse = update.inverted();
        assert_eq!(inverse.old, "..b.y");
        assert_eq!(inverse.new, ".y");
        assert_eq!(inverse.column, 5);
    }

    #[test]
    fn test_plan_updates_for() {
        let update = |file: &str| ReferenceUpdate {
            file: file.into(),
            line: 1,
            column: 0,
            old: "a".to_owned(),
            new: "b".to_owned(),
        };
        let plan = MigrationPlan::new(
            "test",
            vec![Operation::create_directory("b".into())],
            vec![update("x.ts"), update("y.ts"), update("x.ts")],
        );
        assert_eq!(plan.status, PlanStatus::Pending);
        assert_eq!(plan.updates_for(Utf8Path::new("x.ts")).count(), 2);
        assert_eq!(plan.count(OperationKind::CreateDirectory), 1);
        assert_eq!(plan.completed_count(), 0);
    }

    #[test]
    fn test_plan_serialization() {
        let plan = MigrationPlan::new("round trip", Vec::new(), Vec::new());
        let json = serde_json::to_string(&plan).unwrap();
        let parsed: MigrationPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan, parsed);
        assert!(json.contains(r#""status":"pending""#));
    }

    #[test]
    fn test_rollback_report_fail() {
        let mut report = RollbackReport::new(PlanId::new());
        assert!(report.success);
        report.fail("restore failed".to_owned());
        assert!(!report.success);
        assert_eq!(report.failures.len(), 1);
    }
}
