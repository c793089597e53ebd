//! Durable plan storage.
//!
//! All plans and the result history live in a single JSON document,
//! `<state dir>/state.json`. The document is rewritten wholesale on every
//! save: the new contents go to a temporary sibling which is then renamed
//! over the old file, so a crash leaves either the old or the new state.

use camino::{Utf8Path, Utf8PathBuf};
use rl_core::{MigrationPlan, MigrationResult, PlanId};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::MigrateError;

const STATE_FILE: &str = "state.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    plans: Vec<MigrationPlan>,
    #[serde(default)]
    history: Vec<MigrationResult>,
}

/// Plans and execution history, backed by a JSON state file.
#[derive(Debug)]
pub struct PlanStore {
    path: Utf8PathBuf,
    state: StoreState,
}

impl PlanStore {
    /// Opens the store in `state_dir`. A missing state file is an empty
    /// store; nothing is written until [`save`](Self::save).
    pub fn open(state_dir: &Utf8Path) -> Result<Self, MigrateError> {
        let path = state_dir.join(STATE_FILE);
        let state = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(err) => return Err(MigrateError::store(path, err)),
        };
        Ok(Self { path, state })
    }

    /// Writes the whole store atomically.
    pub fn save(&self) -> Result<(), MigrateError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|err| MigrateError::store(dir, err))?;
        }
        let json = serde_json::to_string_pretty(&self.state)?;
        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, json).map_err(|err| MigrateError::store(&temp, err))?;
        std::fs::rename(&temp, &self.path).map_err(|err| MigrateError::store(&self.path, err))?;
        trace!(path = %self.path, plans = self.state.plans.len(), "saved plan store");
        Ok(())
    }

    /// Returns the state file path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Returns every plan in insertion order.
    #[inline]
    #[must_use]
    pub fn plans(&self) -> &[MigrationPlan] {
        &self.state.plans
    }

    /// Returns the plan with the given id.
    #[must_use]
    pub fn get(&self, id: PlanId) -> Option<&MigrationPlan> {
        self.state.plans.iter().find(|plan| plan.id == id)
    }

    /// Inserts `plan`, replacing a stored plan with the same id.
    pub fn upsert(&mut self, plan: MigrationPlan) {
        match self.state.plans.iter_mut().find(|stored| stored.id == plan.id) {
            Some(stored) => *stored = plan,
            None => self.state.plans.push(plan),
        }
    }

    /// Removes and returns the plan with the given id.
    pub fn remove(&mut self, id: PlanId) -> Option<MigrationPlan> {
        let index = self.state.plans.iter().position(|plan| plan.id == id)?;
        Some(self.state.plans.remove(index))
    }

    /// Returns every recorded execution result, oldest first.
    #[inline]
    #[must_use]
    pub fn history(&self) -> &[MigrationResult] {
        &self.state.history
    }

    /// Appends an execution result.
    pub fn record(&mut self, result: MigrationResult) {
        self.state.history.push(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_core::{Operation, PlanStatus};

    fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join(".relayout")).unwrap();
        (dir, path)
    }

    #[test]
    fn test_open_missing_is_empty() {
        let (_dir, state_dir) = temp_dir();
        let store = PlanStore::open(&state_dir).unwrap();
        assert!(store.plans().is_empty());
        assert!(store.history().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_save_and_reopen() {
        let (_dir, state_dir) = temp_dir();
        let mut store = PlanStore::open(&state_dir).unwrap();
        let plan = MigrationPlan::new(
            "move x",
            vec![Operation::create_directory("b".into())],
            Vec::new(),
        );
        let id = plan.id;
        store.upsert(plan);
        store.save().unwrap();

        let mut reopened = PlanStore::open(&state_dir).unwrap();
        let stored = reopened.get(id).unwrap();
        assert_eq!(stored.description, "move x");
        assert_eq!(stored.status, PlanStatus::Pending);
        assert_eq!(stored.operations.len(), 1);
        assert!(!state_dir.join("state.json.tmp").exists());

        let mut changed = stored.clone();
        changed.status = PlanStatus::Completed;
        reopened.upsert(changed);
        assert_eq!(reopened.plans().len(), 1);
        assert_eq!(reopened.get(id).unwrap().status, PlanStatus::Completed);

        assert!(reopened.remove(id).is_some());
        assert!(reopened.get(id).is_none());
    }

    #[test]
    fn test_open_corrupt_fails() {
        let (_dir, state_dir) = temp_dir();
        std::fs::create_dir_all(&state_dir).unwrap();
        std::fs::write(state_dir.join("state.json"), "{ not json").unwrap();
        let err = PlanStore::open(&state_dir).unwrap_err();
        assert!(matches!(err, MigrateError::StoreFormat(_)));
    }
}
