//! Error types for the rl-scanner crate.
//!
//! This module provides the [`ScanError`] type for errors that can occur
//! during directory traversal and file analysis.

use camino::Utf8PathBuf;

/// Errors that can occur during scanning operations.
///
/// # Error Recovery Strategy
///
/// - **Configuration errors** ([`ScanError::Config`]): Fatal, nothing is walked
/// - **Walk errors** ([`ScanError::Walk`]): Recorded, the walk continues
/// - **File read errors** ([`ScanError::Read`]): Recorded, the file is skipped
///
/// # Examples
///
/// ```
/// use rl_scanner::ScanError;
///
/// fn describe(err: &ScanError) -> String {
///     match err {
///         ScanError::Walk(e) => format!("walk error: {e}"),
///         ScanError::Read { path, .. } => format!("read error: {path}"),
///         ScanError::Config(msg) => format!("config error: {msg}"),
///         ScanError::NonUtf8Path(p) => format!("invalid path: {}", p.display()),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// A directory entry could not be visited.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// A file's metadata or contents could not be read.
    #[error("failed to read file {path}: {source}")]
    Read {
        /// The root-relative path of the file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid scanner configuration: a missing root or a bad pattern.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),
}

impl ScanError {
    /// Creates a new [`ScanError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if the walk can continue past this error.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::Walk(_) | Self::NonUtf8Path(_)
        )
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. } => Some(path),
            Self::Walk(_) | Self::Config(_) | Self::NonUtf8Path(_) => None,
        }
    }
}
