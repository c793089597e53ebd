//! Lexical helpers for root-relative paths.
//!
//! Every path the tool stores is relative to the analysis root and uses `/`
//! separators. These helpers never touch the filesystem: `.` and `..` are
//! folded purely lexically, and a path that would climb above the root is
//! rejected rather than clamped.
//!
//! # Examples
//!
//! ```
//! use camino::Utf8Path;
//! use rl_core::paths::{normalize, relative_path};
//!
//! assert_eq!(
//!     normalize(Utf8Path::new("web/./components/../app.ts")).unwrap(),
//!     "web/app.ts"
//! );
//! assert!(normalize(Utf8Path::new("../outside.py")).is_none());
//!
//! assert_eq!(
//!     relative_path(Utf8Path::new("web/pages"), Utf8Path::new("web/lib/api.ts")),
//!     "../lib/api.ts"
//! );
//! ```

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Folds `.` and `..` components of a root-relative path.
///
/// Returns `None` when the path is absolute or would escape the root.
#[must_use]
pub fn normalize(path: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                parts.pop()?;
            }
            Utf8Component::Normal(part) => parts.push(part),
            Utf8Component::RootDir | Utf8Component::Prefix(_) => return None,
        }
    }
    Some(join_parts(&parts))
}

/// Joins `rel` onto the root-relative directory `dir` and normalizes.
#[must_use]
pub fn join_normalized(dir: &Utf8Path, rel: &str) -> Option<Utf8PathBuf> {
    normalize(&dir.join(rel))
}

/// Returns the directory containing a root-relative path (`""` at top level).
#[inline]
#[must_use]
pub fn parent_dir(path: &Utf8Path) -> &Utf8Path {
    path.parent().unwrap_or_else(|| Utf8Path::new(""))
}

/// Computes the shortest relative path from directory `from_dir` to `to`.
///
/// Both arguments are root-relative and assumed normalized. The result uses
/// `..` for every directory of `from_dir` not shared with `to`, and is `.`
/// when the two are the same.
#[must_use]
pub fn relative_path(from_dir: &Utf8Path, to: &Utf8Path) -> Utf8PathBuf {
    let from: Vec<&str> = from_dir.iter().collect();
    let target: Vec<&str> = to.iter().collect();
    let shared = from
        .iter()
        .zip(&target)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = Vec::with_capacity(from.len() + target.len() - shared);
    parts.extend(std::iter::repeat_n("..", from.len() - shared));
    parts.extend_from_slice(&target[shared..]);

    if parts.is_empty() {
        Utf8PathBuf::from(".")
    } else {
        join_parts(&parts)
    }
}

/// Counts the directory levels of `from_dir` not shared with `to_dir`.
#[must_use]
pub fn levels_up(from_dir: &Utf8Path, to_dir: &Utf8Path) -> usize {
    let shared = from_dir
        .iter()
        .zip(to_dir.iter())
        .take_while(|(a, b)| a == b)
        .count();
    from_dir.iter().count() - shared
}

fn join_parts(parts: &[&str]) -> Utf8PathBuf {
    Utf8PathBuf::from(parts.join("/"))
}
