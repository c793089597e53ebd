//! Directory traversal for relocation analysis.
//!
//! This module provides [`FileWalker`], which uses the `ignore` crate to walk
//! a project tree and yield every regular file as a root-relative path.
//!
//! # Features
//!
//! - Standard filters are disabled: dotfiles such as `.gitignore` and `.env`
//!   are classified like any other file
//! - Any path with a component *containing* one of the ignore-list
//!   substrings is skipped, and ignored directories are never descended into
//! - Per-entry failures are collected rather than aborting the walk
//! - Output is sorted by path
//!
//! # Examples
//!
//! ```no_run
//! use rl_scanner::FileWalker;
//! use camino::Utf8Path;
//!
//! let walker = FileWalker::new(Utf8Path::new("/path/to/project"))?
//!     .with_ignore_dirs(&["node_modules".to_owned()]);
//! let (paths, errors) = walker.walk();
//!
//! for path in &paths {
//!     println!("Found: {path}");
//! }
//! # Ok::<(), rl_scanner::ScanError>(())
//! ```

use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use tracing::{debug, trace};

use crate::error::ScanError;

/// A file walker that lists every non-ignored file under a root.
#[derive(Debug, Clone)]
pub struct FileWalker {
    /// The root directory to walk.
    root: Utf8PathBuf,
    /// Directory-name substrings to skip.
    ignore_dirs: Vec<String>,
    /// Whether to follow symbolic links.
    follow_links: bool,
}

impl FileWalker {
    /// Creates a new file walker for the given root directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root path doesn't exist or
    /// isn't a directory.
    pub fn new(root: &Utf8Path) -> Result<Self, ScanError> {
        if !root.exists() {
            return Err(ScanError::config(format!(
                "root path does not exist: {root}"
            )));
        }
        if !root.is_dir() {
            return Err(ScanError::config(format!(
                "root path is not a directory: {root}"
            )));
        }

        Ok(Self {
            root: root.to_owned(),
            ignore_dirs: Vec::new(),
            follow_links: false,
        })
    }

    /// Adds directory-name substrings to skip during traversal.
    #[must_use]
    pub fn with_ignore_dirs(mut self, dirs: &[String]) -> Self {
        self.ignore_dirs.extend(dirs.iter().cloned());
        self
    }

    /// Configures whether to follow symbolic links.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Walks the tree and returns root-relative file paths, sorted, along
    /// with every per-entry error encountered.
    pub fn walk(&self) -> (Vec<Utf8PathBuf>, Vec<ScanError>) {
        let mut paths = Vec::new();
        let mut errors = Vec::new();

        for result in self.build_walker() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(error = %err, "walk entry failed");
                    errors.push(ScanError::Walk(err));
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let Some(path) = Utf8Path::from_path(entry.path()) else {
                errors.push(ScanError::NonUtf8Path(entry.path().to_owned()));
                continue;
            };
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };
            trace!(path = %relative, "discovered");
            paths.push(relative.to_owned());
        }

        paths.sort();
        (paths, errors)
    }

    /// Builds the ignore walker with configured settings.
    fn build_walker(&self) -> ignore::Walk {
        let root = self.root.clone().into_std_path_buf();
        let ignore_dirs = self.ignore_dirs.clone();

        WalkBuilder::new(&self.root)
            // Dotfiles and gitignored files are part of the layout too
            .standard_filters(false)
            .follow_links(self.follow_links)
            .filter_entry(move |entry| !is_ignored(&root, entry.path(), &ignore_dirs))
            .build()
    }

    /// Returns `true` if the root-relative `path` lies under an ignored
    /// directory.
    #[must_use]
    pub fn should_skip_path(&self, path: &Utf8Path) -> bool {
        path.components()
            .any(|component| contains_any(component.as_str(), &self.ignore_dirs))
    }

    /// Returns the root directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

fn is_ignored(root: &Path, path: &Path, ignore_dirs: &[String]) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    relative
        .components()
        .any(|component| contains_any(&component.as_os_str().to_string_lossy(), ignore_dirs))
}

fn contains_any(name: &str, needles: &[String]) -> bool {
    needles.iter().any(|needle| name.contains(needle.as_str()))
}
