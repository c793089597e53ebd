//! File classification types.
//!
//! This module provides [`FileRecord`], the per-file analysis result, and the
//! closed [`FileCategory`] union that selects pattern tables and layout rules.

use std::fmt;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// The flavour of a frontend source file.
///
/// React, TypeScript and JavaScript files carry reference pattern tables;
/// stylesheets and markup are tracked but never scanned for references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontendVariant {
    /// JSX/TSX component files.
    React,
    /// Plain TypeScript modules.
    TypeScript,
    /// Plain JavaScript modules (ESM or CommonJS).
    JavaScript,
    /// CSS and preprocessor stylesheets.
    Stylesheet,
    /// HTML documents.
    Markup,
}

/// The language whose pattern table is used to extract references.
///
/// # Examples
///
/// ```
/// use rl_core::{FileCategory, FrontendVariant, Language};
///
/// assert_eq!(FileCategory::BackendSource.language(), Some(Language::Python));
/// assert_eq!(
///     FileCategory::FrontendSource(FrontendVariant::React).language(),
///     Some(Language::TypeScript)
/// );
/// assert_eq!(FileCategory::Documentation.language(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// Python: dotted module references, relative or rooted.
    Python,
    /// TypeScript (and TSX): quoted module specifiers.
    TypeScript,
    /// JavaScript (and JSX): TypeScript's forms plus `require()`.
    JavaScript,
}

/// Best-effort classification of a file.
///
/// This is a closed union: adding a new kind of file means adding a variant
/// here and a pattern table for its language, never a string key.
///
/// # Examples
///
/// ```
/// use rl_core::{Bucket, FileCategory, FrontendVariant};
///
/// let category = FileCategory::FrontendSource(FrontendVariant::TypeScript);
/// assert!(category.is_frontend_source());
/// assert_eq!(category.bucket(), Bucket::Frontend);
/// assert_eq!(category.label(), "frontend_typescript");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    /// Python source module.
    BackendSource,
    /// Frontend source of the given variant.
    FrontendSource(FrontendVariant),
    /// Backend configuration (`requirements.txt`, `pyproject.toml`, ...).
    ConfigBackend,
    /// Frontend configuration (`package.json`, `vite.config.*`, ...).
    ConfigFrontend,
    /// Repository-wide configuration (`.gitignore`, `Dockerfile`, ...).
    ConfigShared,
    /// Project documentation (`README.md`, `LICENSE`, ...).
    Documentation,
    /// Anything else.
    #[default]
    Unknown,
}

impl FileCategory {
    /// Returns the language whose pattern table applies to this category.
    #[inline]
    #[must_use]
    pub const fn language(self) -> Option<Language> {
        match self {
            Self::BackendSource => Some(Language::Python),
            Self::FrontendSource(FrontendVariant::React | FrontendVariant::TypeScript) => {
                Some(Language::TypeScript)
            }
            Self::FrontendSource(FrontendVariant::JavaScript) => Some(Language::JavaScript),
            Self::FrontendSource(FrontendVariant::Stylesheet | FrontendVariant::Markup)
            | Self::ConfigBackend
            | Self::ConfigFrontend
            | Self::ConfigShared
            | Self::Documentation
            | Self::Unknown => None,
        }
    }

    /// Returns `true` for Python sources.
    #[inline]
    #[must_use]
    pub const fn is_backend_source(self) -> bool {
        matches!(self, Self::BackendSource)
    }

    /// Returns `true` for any frontend source variant.
    #[inline]
    #[must_use]
    pub const fn is_frontend_source(self) -> bool {
        matches!(self, Self::FrontendSource(_))
    }

    /// Returns `true` for the three configuration categories.
    #[inline]
    #[must_use]
    pub const fn is_config(self) -> bool {
        matches!(
            self,
            Self::ConfigBackend | Self::ConfigFrontend | Self::ConfigShared
        )
    }

    /// Returns the top-level bucket this category belongs to.
    #[inline]
    #[must_use]
    pub const fn bucket(self) -> Bucket {
        match self {
            Self::FrontendSource(_) | Self::ConfigFrontend => Bucket::Frontend,
            Self::BackendSource | Self::ConfigBackend => Bucket::Backend,
            Self::ConfigShared | Self::Documentation | Self::Unknown => Bucket::Shared,
        }
    }

    /// Returns a stable snake-case label, used as a key in reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BackendSource => "backend_python",
            Self::FrontendSource(FrontendVariant::React) => "frontend_react",
            Self::FrontendSource(FrontendVariant::TypeScript) => "frontend_typescript",
            Self::FrontendSource(FrontendVariant::JavaScript) => "frontend_javascript",
            Self::FrontendSource(FrontendVariant::Stylesheet) => "frontend_css",
            Self::FrontendSource(FrontendVariant::Markup) => "frontend_html",
            Self::ConfigBackend => "config_backend",
            Self::ConfigFrontend => "config_frontend",
            Self::ConfigShared => "config_shared",
            Self::Documentation => "documentation",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Top-level grouping of categories used for clusters and layout rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Frontend sources and frontend configuration.
    Frontend,
    /// Backend sources and backend configuration.
    Backend,
    /// Everything that belongs to neither side.
    Shared,
}

impl Bucket {
    /// Returns the bucket name as used in cluster reports.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Shared => "shared",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// The analysis result for a single file.
///
/// Records are produced by the classifier, cached per path, and never
/// modified afterwards. `path` is relative to the analysis root and is the
/// record's unique key.
///
/// # Examples
///
/// ```
/// use rl_core::{FileCategory, FileRecord};
/// use camino::Utf8PathBuf;
///
/// let record = FileRecord::new(Utf8PathBuf::from("app/models.py"), FileCategory::BackendSource);
/// assert!(record.references.is_empty());
/// assert!(!record.is_test);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Root-relative path of the file.
    pub path: Utf8PathBuf,

    /// Classification of the file.
    pub category: FileCategory,

    /// Size of the file in bytes (0 if it could not be read).
    pub size: u64,

    /// Whether the path follows a test naming convention.
    pub is_test: bool,

    /// Whether the file name matched one of the configuration pattern sets.
    pub is_config: bool,

    /// Raw reference strings in source order, exactly as written.
    pub references: Vec<String>,

    /// Exported symbol names in source order.
    pub exports: Vec<String>,
}

impl FileRecord {
    /// Creates a record with no references, exports, or flags.
    #[must_use]
    pub fn new(path: Utf8PathBuf, category: FileCategory) -> Self {
        Self {
            path,
            category,
            size: 0,
            is_test: false,
            is_config: false,
            references: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Returns the number of raw references.
    #[inline]
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    /// Returns the language of this record's category, if any.
    #[inline]
    #[must_use]
    pub const fn language(&self) -> Option<Language> {
        self.category.language()
    }
}
