//! Plan construction, execution and rollback.
//!
//! [`Migrator`] owns the plan store of one project root and drives every
//! plan through its lifecycle:
//!
//! ```text
//! PENDING ──execute──▶ IN_PROGRESS ──▶ COMPLETED ─┐
//!                           │                      ├─rollback─▶ ROLLED_BACK
//!                           └────────▶ FAILED ─────┘
//! ```
//!
//! Operations run strictly in their recorded order: directories first,
//! then moves, then reference rewrites. The first failing operation stops
//! the run. Every state change and every completed operation is persisted
//! before control returns to the caller, so the state file always reflects
//! what has been done to the tree.

use std::collections::BTreeSet;
use std::time::Instant;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{TimeDelta, Utc};
use rl_core::{
    Config, FileRecord, FxHashMap, MigrationPlan, MigrationResult, Operation, OperationKind, PathMapping,
    PlanId, PlanStatus, ReferenceUpdate, RollbackReport,
};
use tracing::{debug, error, info, warn};

use crate::backup::ShadowStore;
use crate::error::MigrateError;
use crate::rewriter::ReferenceRewriter;
use crate::store::PlanStore;

/// Which terminal plans [`Migrator::cleanup`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Keep the newest `n` prunable plans.
    KeepLatest(usize),
    /// Keep prunable plans created within the window.
    OlderThan(TimeDelta),
}

/// A freshly created plan and the references it leaves untouched.
#[derive(Debug, Clone)]
pub struct PlanDraft {
    /// The persisted plan.
    pub plan: MigrationPlan,
    /// Warnings from reference rewriting.
    pub warnings: Vec<String>,
}

/// Plans, executes and rolls back relocations under one project root.
#[derive(Debug)]
pub struct Migrator {
    root: Utf8PathBuf,
    config: Config,
    store: PlanStore,
    backups: ShadowStore,
}

impl Migrator {
    /// Opens the migrator for `root`, loading its plan store.
    pub fn open(root: &Utf8Path, config: Config) -> Result<Self, MigrateError> {
        let state_dir = root.join(&config.store.state_dir);
        let store = PlanStore::open(&state_dir)?;
        let backups = ShadowStore::new(root, &config.store.state_dir);
        debug!(root = %root, plans = store.plans().len(), "opened plan store");
        Ok(Self {
            root: root.to_owned(),
            config,
            store,
            backups,
        })
    }

    /// Returns the project root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Builds a plan for relocating files according to `mapping`, and
    /// persists it as PENDING.
    ///
    /// The plan holds, in order: one create-directory step per missing
    /// directory (parents first), one move per relocated file, and one
    /// rewrite step per file with reference updates.
    ///
    /// Moves keep mapping order except where a destination is another
    /// move's source: that source is moved away first. Moves forming a
    /// cycle go through a temporary file next to the first member.
    /// Unreadable files contribute no updates; only store failures are
    /// errors.
    pub fn create_plan(
        &mut self,
        records: &[FileRecord],
        mapping: &PathMapping,
        description: &str,
    ) -> Result<PlanDraft, MigrateError> {
        let rewriter = ReferenceRewriter::new(&self.root, records, self.config.resolve.clone());
        let computed = rewriter.compute_updates(records, mapping);

        let mut plan = MigrationPlan::new(description, Vec::new(), Vec::new());

        let mut directories = BTreeSet::new();
        for (old, entry) in mapping.iter() {
            if !mapping.moves(old) {
                continue;
            }
            for dir in entry.new_path.ancestors().skip(1) {
                if !dir.as_str().is_empty() && !self.root.join(dir).is_dir() {
                    directories.insert(dir.to_owned());
                }
            }
        }
        plan.operations
            .extend(directories.into_iter().map(Operation::create_directory));

        let moves: Vec<(Utf8PathBuf, Utf8PathBuf)> = mapping
            .iter()
            .filter(|(old, _)| mapping.moves(old))
            .map(|(old, entry)| (old.to_owned(), entry.new_path.clone()))
            .collect();
        for (from, to) in order_moves(&moves, plan.id) {
            let backup = ShadowStore::backup_path(plan.id, &from);
            plan.operations.push(Operation::move_file(from, to, backup));
        }

        let mut rewritten: Vec<&Utf8Path> = Vec::new();
        for update in &computed.updates {
            if !rewritten.contains(&update.file.as_path()) {
                rewritten.push(&update.file);
            }
        }
        for file in rewritten {
            plan.operations.push(Operation::rewrite_reference(
                file.to_owned(),
                mapping.prospective(file).to_owned(),
            ));
        }
        plan.updates = computed.updates;

        info!(
            plan = %plan.id,
            directories = plan.count(OperationKind::CreateDirectory),
            moves = plan.count(OperationKind::MoveFile),
            rewrites = plan.count(OperationKind::RewriteReference),
            updates = plan.updates.len(),
            "created plan"
        );
        self.persist(&plan)?;
        Ok(PlanDraft {
            plan,
            warnings: computed.warnings,
        })
    }

    /// Executes a PENDING plan.
    ///
    /// A failing operation does not make this return an error: the plan
    /// becomes FAILED and the result records the failure. Errors are
    /// reserved for lookups, invalid transitions and the store.
    pub fn execute(&mut self, id: PlanId) -> Result<MigrationResult, MigrateError> {
        let mut plan = self.load(id)?;
        if plan.status != PlanStatus::Pending {
            return Err(MigrateError::invalid_transition(id, plan.status, "execute"));
        }

        let started = Instant::now();
        plan.status = PlanStatus::InProgress;
        self.persist(&plan)?;
        info!(plan = %id, operations = plan.operations.len(), "executing plan");

        let rewriter = ReferenceRewriter::new(&self.root, &[], self.config.resolve.clone());
        let mut failure = None;
        for index in 0..plan.operations.len() {
            let outcome = self.run(&plan, &plan.operations[index], &rewriter);
            let op = &mut plan.operations[index];
            match outcome {
                Ok(()) => {
                    op.completed = true;
                    self.persist(&plan)?;
                }
                Err(err) => {
                    error!(plan = %id, operation = %op.describe(), error = %err, "operation failed");
                    op.error = Some(err.to_string());
                    failure = Some((op.id, err.to_string()));
                    break;
                }
            }
        }

        plan.status = if failure.is_some() {
            PlanStatus::Failed
        } else {
            PlanStatus::Completed
        };
        self.persist(&plan)?;

        let completed = plan.completed_count();
        let (failed_operations, error_message) = match failure {
            Some((op, message)) => (vec![op], Some(message)),
            None => (Vec::new(), None),
        };
        let result = MigrationResult {
            plan_id: id,
            status: plan.status,
            completed_operations: completed,
            total_operations: plan.operations.len(),
            failed_operations,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            rollback_available: completed > 0,
            error_message,
            finished_at: Utc::now(),
        };
        self.store.record(result.clone());
        self.store.save()?;

        info!(
            plan = %id,
            status = %result.status,
            completed = result.completed_operations,
            total = result.total_operations,
            elapsed_ms = result.elapsed_ms,
            "execution finished"
        );
        Ok(result)
    }

    fn run(
        &self,
        plan: &MigrationPlan,
        op: &Operation,
        rewriter: &ReferenceRewriter,
    ) -> Result<(), MigrateError> {
        match op.kind {
            OperationKind::CreateDirectory => {
                std::fs::create_dir_all(self.root.join(&op.target))
                    .map_err(|err| MigrateError::io(&op.target, err))?;
                info!(directory = %op.target, "created directory");
            }
            OperationKind::MoveFile => {
                let (Some(source), Some(backup)) = (&op.source, &op.backup) else {
                    return Err(MigrateError::Step(format!(
                        "move to {} has no source or backup",
                        op.target
                    )));
                };
                let to = self.root.join(&op.target);
                if to.symlink_metadata().is_ok() {
                    return Err(MigrateError::Step(format!(
                        "cannot move {source}: {} already exists",
                        op.target
                    )));
                }
                self.backups
                    .acquire(source, backup)
                    .map_err(|err| MigrateError::io(source, err))?;
                if let Some(parent) = to.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|err| MigrateError::io(&op.target, err))?;
                }
                move_file(&self.root.join(source), &to)
                    .map_err(|err| MigrateError::io(source, err))?;
                info!(from = %source, to = %op.target, "moved file");
            }
            OperationKind::RewriteReference => {
                let updates = owned_updates(plan, op);
                let log = rewriter.apply_file(&op.target, &updates, false)?;
                for line in &log {
                    info!(file = %op.target, "{line}");
                }
            }
        }
        Ok(())
    }

    /// Undoes every completed operation of a COMPLETED or FAILED plan, in
    /// exact reverse order.
    ///
    /// Rollback is best-effort: a failing step is recorded in the report
    /// and the remaining steps still run. The plan becomes ROLLED_BACK only
    /// if every step succeeded; otherwise its status is kept.
    pub fn rollback(&mut self, id: PlanId) -> Result<RollbackReport, MigrateError> {
        let mut plan = self.load(id)?;
        if !plan.status.can_roll_back() {
            return Err(MigrateError::invalid_transition(id, plan.status, "roll back"));
        }

        info!(plan = %id, status = %plan.status, "rolling back plan");
        let rewriter = ReferenceRewriter::new(&self.root, &[], self.config.resolve.clone());
        let mut report = RollbackReport::new(id);

        for op in plan.operations.iter().rev().filter(|op| op.completed) {
            match op.kind {
                OperationKind::RewriteReference => {
                    let updates = owned_updates(&plan, op);
                    match rewriter.revert_file(&op.target, &updates, false) {
                        Ok(_) => {
                            report.reverted_files += 1;
                            info!(file = %op.target, "reverted references");
                        }
                        Err(err) => {
                            warn!(file = %op.target, error = %err, "revert failed");
                            report.fail(format!("{}: {err}", op.describe()));
                        }
                    }
                }
                OperationKind::MoveFile => match self.undo_move(op) {
                    Ok(()) => {
                        report.restored += 1;
                        info!(file = %op.target, "restored from backup");
                    }
                    Err(err) => {
                        warn!(file = %op.target, error = %err, "restore failed");
                        report.fail(format!("{}: {err}", op.describe()));
                    }
                },
                OperationKind::CreateDirectory => match remove_if_empty(&self.root.join(&op.target)) {
                    Ok(true) => {
                        report.removed_directories += 1;
                        info!(directory = %op.target, "removed directory");
                    }
                    Ok(false) => debug!(directory = %op.target, "directory kept"),
                    Err(err) => {
                        warn!(directory = %op.target, error = %err, "remove failed");
                        report.fail(format!("{}: {err}", op.describe()));
                    }
                },
            }
        }

        if report.success {
            plan.status = PlanStatus::RolledBack;
        }
        self.persist(&plan)?;
        info!(
            plan = %id,
            success = report.success,
            restored = report.restored,
            failures = report.failures.len(),
            "rollback finished"
        );
        Ok(report)
    }

    fn undo_move(&self, op: &Operation) -> Result<(), MigrateError> {
        let (Some(source), Some(backup)) = (&op.source, &op.backup) else {
            return Err(MigrateError::Step("move has no source or backup".to_owned()));
        };
        if !self.backups.exists(backup) {
            return Err(MigrateError::Step(format!("backup {backup} is missing")));
        }
        let moved = self.root.join(&op.target);
        if moved.is_file() {
            std::fs::remove_file(&moved).map_err(|err| MigrateError::io(&op.target, err))?;
        }
        self.backups
            .restore(backup, source)
            .map_err(|err| MigrateError::io(source, err))
    }

    /// Marks a plan left IN_PROGRESS by a crash as FAILED, so it can be
    /// rolled back.
    pub fn mark_interrupted(&mut self, id: PlanId) -> Result<MigrationResult, MigrateError> {
        let mut plan = self.load(id)?;
        if plan.status != PlanStatus::InProgress {
            return Err(MigrateError::invalid_transition(id, plan.status, "recover"));
        }
        plan.status = PlanStatus::Failed;
        self.persist(&plan)?;

        let completed = plan.completed_count();
        let result = MigrationResult {
            plan_id: id,
            status: PlanStatus::Failed,
            completed_operations: completed,
            total_operations: plan.operations.len(),
            failed_operations: Vec::new(),
            elapsed_ms: 0,
            rollback_available: completed > 0,
            error_message: Some("execution was interrupted".to_owned()),
            finished_at: Utc::now(),
        };
        self.store.record(result.clone());
        self.store.save()?;
        warn!(plan = %id, completed, "marked interrupted plan as failed");
        Ok(result)
    }

    /// Returns every plan, oldest first.
    #[must_use]
    pub fn plans(&self) -> Vec<&MigrationPlan> {
        let mut plans: Vec<&MigrationPlan> = self.store.plans().iter().collect();
        plans.sort_by_key(|plan| plan.created_at);
        plans
    }

    /// Returns the plan with the given id.
    #[must_use]
    pub fn plan(&self, id: PlanId) -> Option<&MigrationPlan> {
        self.store.get(id)
    }

    /// Returns the status of the plan with the given id.
    #[must_use]
    pub fn status(&self, id: PlanId) -> Option<PlanStatus> {
        self.store.get(id).map(|plan| plan.status)
    }

    /// Returns every execution result, oldest first.
    #[must_use]
    pub fn history(&self) -> &[MigrationResult] {
        self.store.history()
    }

    /// Removes COMPLETED and ROLLED_BACK plans outside `retention`, along
    /// with their backups. Other plans are never removed.
    pub fn cleanup(&mut self, retention: Retention) -> Result<Vec<PlanId>, MigrateError> {
        let mut prunable: Vec<&MigrationPlan> = self
            .store
            .plans()
            .iter()
            .filter(|plan| plan.status.is_prunable())
            .collect();
        prunable.sort_by_key(|plan| std::cmp::Reverse(plan.created_at));

        let doomed: Vec<PlanId> = match retention {
            Retention::KeepLatest(keep) => prunable.iter().skip(keep).map(|plan| plan.id).collect(),
            Retention::OlderThan(window) => {
                let cutoff = Utc::now() - window;
                prunable
                    .iter()
                    .filter(|plan| plan.created_at < cutoff)
                    .map(|plan| plan.id)
                    .collect()
            }
        };

        for &id in &doomed {
            self.store.remove(id);
            if let Err(err) = self.backups.release(id) {
                warn!(plan = %id, error = %err, "failed to remove backups");
            }
        }
        if !doomed.is_empty() {
            self.store.save()?;
        }
        info!(removed = doomed.len(), "cleaned up plans");
        Ok(doomed)
    }

    fn load(&self, id: PlanId) -> Result<MigrationPlan, MigrateError> {
        self.store
            .get(id)
            .cloned()
            .ok_or(MigrateError::PlanNotFound(id))
    }

    fn persist(&mut self, plan: &MigrationPlan) -> Result<(), MigrateError> {
        self.store.upsert(plan.clone());
        self.store.save()
    }
}

/// Orders `moves` so that no move lands on a path another pending move has
/// yet to vacate. Cycles are broken by parking their first member under a
/// temporary name.
fn order_moves(
    moves: &[(Utf8PathBuf, Utf8PathBuf)],
    plan: PlanId,
) -> Vec<(Utf8PathBuf, Utf8PathBuf)> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Pending,
        Visiting,
        Done,
    }

    let by_source: FxHashMap<&Utf8Path, usize> = moves
        .iter()
        .enumerate()
        .map(|(ix, (from, _))| (from.as_path(), ix))
        .collect();
    let mut marks = vec![Mark::Pending; moves.len()];
    let mut ordered = Vec::with_capacity(moves.len());

    for first in 0..moves.len() {
        if marks[first] != Mark::Pending {
            continue;
        }

        // chain[k + 1] vacates the destination of chain[k].
        let mut chain = vec![first];
        marks[first] = Mark::Visiting;
        let mut cycle_start = None;
        while let Some(&blocker) = chain
            .last()
            .and_then(|&last| by_source.get(moves[last].1.as_path()))
        {
            match marks[blocker] {
                Mark::Done => break,
                Mark::Visiting => {
                    cycle_start = chain.iter().position(|&ix| ix == blocker);
                    break;
                }
                Mark::Pending => {
                    marks[blocker] = Mark::Visiting;
                    chain.push(blocker);
                }
            }
        }

        let (head, tail) = chain.split_at(cycle_start.unwrap_or(chain.len()));
        let parked = tail.first().map(|&ix| {
            let (from, to) = &moves[ix];
            let temp = Utf8PathBuf::from(format!("{from}.relayout-{plan}"));
            ordered.push((from.clone(), temp.clone()));
            (temp, to.clone())
        });
        for &ix in tail.iter().skip(1).rev() {
            ordered.push(moves[ix].clone());
        }
        if let Some(parked) = parked {
            ordered.push(parked);
        }
        for &ix in head.iter().rev() {
            ordered.push(moves[ix].clone());
        }
        for &ix in &chain {
            marks[ix] = Mark::Done;
        }
    }
    ordered
}

fn owned_updates(plan: &MigrationPlan, op: &Operation) -> Vec<ReferenceUpdate> {
    op.source
        .as_deref()
        .map(|source| plan.updates_for(source).cloned().collect())
        .unwrap_or_default()
}

/// Renames `from` to `to`, copying across filesystems when rename fails.
fn move_file(from: &Utf8Path, to: &Utf8Path) -> std::io::Result<()> {
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)
}

fn remove_if_empty(dir: &Utf8Path) -> std::io::Result<bool> {
    if !dir.is_dir() || dir.read_dir()?.next().is_some() {
        return Ok(false);
    }
    std::fs::remove_dir(dir)?;
    Ok(true)
}
