//! Error types for the rl-core crate.
//!
//! This module provides [`ConfigError`] for configuration loading and
//! [`MappingError`] for building path mappings.

use camino::Utf8PathBuf;

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use rl_core::ConfigError;
/// use camino::Utf8PathBuf;
///
/// let error = ConfigError::MissingDirectory(Utf8PathBuf::from("/some/path"));
/// assert!(error.to_string().contains("/some/path"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The analysis root does not exist or is not a directory.
    #[error("missing required directory: {0}")]
    MissingDirectory(Utf8PathBuf),

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// An I/O error occurred while reading configuration.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors that can occur while building a [`PathMapping`](crate::PathMapping).
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// An old path is already mapped to a different destination.
    #[error("'{old}' is already mapped to '{existing}', cannot map it to '{requested}'")]
    Conflict {
        /// The old path.
        old: Utf8PathBuf,
        /// Its current destination.
        existing: Utf8PathBuf,
        /// The rejected destination.
        requested: Utf8PathBuf,
    },

    /// A path is absolute, empty, or escapes the root.
    #[error("invalid mapping path '{path}': {reason}")]
    InvalidPath {
        /// The rejected path.
        path: Utf8PathBuf,
        /// Explanation of why the path is invalid.
        reason: String,
    },

    /// The mapping file could not be read.
    #[error("failed to read mapping '{path}': {source}")]
    Io {
        /// The mapping file.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The mapping file is not a JSON object of strings.
    #[error("failed to parse mapping: {0}")]
    Parse(#[from] serde_json::Error),
}
