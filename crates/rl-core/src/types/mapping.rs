//! Old-path to new-path relocation mappings.
//!
//! A [`PathMapping`] is the caller's description of the target layout. Each
//! old path maps to at most one new path; entries iterate in path order so
//! plans built from the same mapping are always identical.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::MappingError;
use crate::paths::normalize;
use crate::types::FileCategory;

/// The destination of a single mapped file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Root-relative destination path.
    pub new_path: Utf8PathBuf,
    /// Category of the file, when known at mapping time.
    #[serde(default)]
    pub category: FileCategory,
}

/// A set of relocations keyed by root-relative old path.
///
/// # Examples
///
/// ```
/// use rl_core::PathMapping;
///
/// let mapping = PathMapping::from_json_str(r#"{"a/x.ts": "b/x.ts"}"#).unwrap();
/// assert_eq!(mapping.new_path("a/x.ts".as_ref()).unwrap().as_str(), "b/x.ts");
/// assert_eq!(mapping.prospective("a/y.ts".as_ref()).as_str(), "a/y.ts");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathMapping {
    entries: BTreeMap<Utf8PathBuf, MappingEntry>,
}

impl PathMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object of the form `{"old/path": "new/path", ...}`.
    pub fn from_json_str(json: &str) -> Result<Self, MappingError> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
        let mut mapping = Self::new();
        for (old, new) in raw {
            mapping.insert(old.as_ref(), new.as_ref(), FileCategory::Unknown)?;
        }
        Ok(mapping)
    }

    /// Reads and parses a mapping file.
    pub fn load(path: &Utf8Path) -> Result<Self, MappingError> {
        let contents = std::fs::read_to_string(path).map_err(|e| MappingError::Io {
            path: path.to_owned(),
            source: e,
        })?;
        Self::from_json_str(&contents)
    }

    /// Adds an entry.
    ///
    /// Both paths are normalized. Re-inserting an identical entry is a no-op
    /// that refreshes the category; mapping an old path to a second,
    /// different destination is a [`MappingError::Conflict`].
    pub fn insert(
        &mut self,
        old: &Utf8Path,
        new: &Utf8Path,
        category: FileCategory,
    ) -> Result<(), MappingError> {
        let old = checked(old)?;
        let new = checked(new)?;

        if let Some(existing) = self.entries.get_mut(&old) {
            if existing.new_path != new {
                return Err(MappingError::Conflict {
                    old,
                    existing: existing.new_path.clone(),
                    requested: new,
                });
            }
            existing.category = category;
            return Ok(());
        }

        self.entries.insert(
            old,
            MappingEntry {
                new_path: new,
                category,
            },
        );
        Ok(())
    }

    /// Returns the entry for `old`, if mapped.
    #[inline]
    #[must_use]
    pub fn get(&self, old: &Utf8Path) -> Option<&MappingEntry> {
        self.entries.get(old)
    }

    /// Returns the destination of `old`, if mapped.
    #[inline]
    #[must_use]
    pub fn new_path(&self, old: &Utf8Path) -> Option<&Utf8Path> {
        self.entries.get(old).map(|entry| entry.new_path.as_path())
    }

    /// Returns where `path` will live after relocation: its destination if
    /// mapped, otherwise the path itself.
    #[inline]
    #[must_use]
    pub fn prospective<'a>(&'a self, path: &'a Utf8Path) -> &'a Utf8Path {
        self.new_path(path).unwrap_or(path)
    }

    /// Returns `true` if `path` is mapped to a different location.
    #[inline]
    #[must_use]
    pub fn moves(&self, path: &Utf8Path) -> bool {
        self.new_path(path).is_some_and(|new| new != path)
    }

    /// Returns `true` if `path` is a key of this mapping.
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Iterates `(old, entry)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&Utf8Path, &MappingEntry)> {
        self.entries
            .iter()
            .map(|(old, entry)| (old.as_path(), entry))
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn checked(path: &Utf8Path) -> Result<Utf8PathBuf, MappingError> {
    match normalize(path) {
        Some(normalized) if !normalized.as_str().is_empty() => Ok(normalized),
        _ => Err(MappingError::InvalidPath {
            path: path.to_owned(),
            reason: "must be a non-empty path inside the root".to_owned(),
        }),
    }
}
