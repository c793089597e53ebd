//! Shadow copies of files about to be moved.
//!
//! Every move backs its source up to
//! `<state dir>/backups/<plan id>/<original relative path>` before touching
//! it. Backups outlive execution and rollback; they are released only when
//! their plan is pruned.

use camino::{Utf8Path, Utf8PathBuf};
use rl_core::PlanId;
use tracing::debug;

const BACKUP_DIR: &str = "backups";

/// Backup storage rooted at a project.
#[derive(Debug, Clone)]
pub struct ShadowStore {
    root: Utf8PathBuf,
    state_dir: Utf8PathBuf,
}

impl ShadowStore {
    /// Creates a store for the project at `root`, keeping backups under
    /// `root/<state_dir_name>`.
    #[must_use]
    pub fn new(root: &Utf8Path, state_dir_name: &str) -> Self {
        Self {
            root: root.to_owned(),
            state_dir: root.join(state_dir_name),
        }
    }

    /// Returns the backup location of `original`, relative to the state
    /// directory.
    #[must_use]
    pub fn backup_path(plan: PlanId, original: &Utf8Path) -> Utf8PathBuf {
        Utf8Path::new(BACKUP_DIR).join(plan.to_string()).join(original)
    }

    /// Returns `true` if the backup at `backup` exists.
    #[must_use]
    pub fn exists(&self, backup: &Utf8Path) -> bool {
        self.state_dir.join(backup).is_file()
    }

    /// Copies the project file `original` to `backup`.
    pub fn acquire(&self, original: &Utf8Path, backup: &Utf8Path) -> std::io::Result<()> {
        let from = self.root.join(original);
        let to = self.state_dir.join(backup);
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&from, &to)?;
        debug!(original = %original, backup = %backup, "backed up");
        Ok(())
    }

    /// Copies `backup` back to the project file `original`, recreating its
    /// directory if needed. The backup is kept.
    pub fn restore(&self, backup: &Utf8Path, original: &Utf8Path) -> std::io::Result<()> {
        let from = self.state_dir.join(backup);
        let to = self.root.join(original);
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&from, &to)?;
        debug!(original = %original, backup = %backup, "restored");
        Ok(())
    }

    /// Deletes every backup of `plan`. Returns `false` if there was none.
    pub fn release(&self, plan: PlanId) -> std::io::Result<bool> {
        let dir = self.state_dir.join(BACKUP_DIR).join(plan.to_string());
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_layout() {
        let plan: PlanId = "7b0f3c5e-8a51-4d5c-9a52-2c8c4f1e0a11".parse().unwrap();
        assert_eq!(
            ShadowStore::backup_path(plan, Utf8Path::new("a/x.ts")),
            "backups/7b0f3c5e-8a51-4d5c-9a52-2c8c4f1e0a11/a/x.ts"
        );
    }

    #[test]
    fn test_acquire_restore_release() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        std::fs::create_dir_all(root.join("a")).unwrap();
        std::fs::write(root.join("a/x.ts"), "original").unwrap();

        let store = ShadowStore::new(&root, ".relayout");
        let plan = PlanId::new();
        let backup = ShadowStore::backup_path(plan, Utf8Path::new("a/x.ts"));
        store.acquire(Utf8Path::new("a/x.ts"), &backup).unwrap();
        assert!(store.exists(&backup));

        std::fs::remove_dir_all(root.join("a")).unwrap();
        store.restore(&backup, Utf8Path::new("a/x.ts")).unwrap();
        assert_eq!(std::fs::read_to_string(root.join("a/x.ts")).unwrap(), "original");
        assert!(store.exists(&backup));

        assert!(store.release(plan).unwrap());
        assert!(!store.exists(&backup));
        assert!(!store.release(plan).unwrap());
    }
}
