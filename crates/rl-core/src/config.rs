//! Configuration structures for relayout.
//!
//! This module provides configuration types for every stage of a relocation:
//!
//! - [`ScanConfig`] - tree walking, ignore list, configuration file patterns
//! - [`ResolveConfig`] - frontend candidate extensions and package markers
//! - [`StoreConfig`] - durable state location and retention
//! - [`Config`] - root configuration combining all settings
//!
//! All configuration types implement [`Default`] with values suited to a
//! mixed Python backend / TypeScript frontend repository, and every section
//! is `#[serde(default)]` so partial JSON files are accepted.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|&item| item.to_owned()).collect()
}

/// Configuration for tree walking and classification.
///
/// # Examples
///
/// ```
/// use rl_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert!(config.ignore_dirs.iter().any(|dir| dir == "node_modules"));
/// assert!(config.frontend_config.iter().any(|p| p == "package.json"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory-name substrings; a path with any component containing one
    /// of these is skipped.
    pub ignore_dirs: Vec<String>,

    /// File-name patterns (glob syntax, case-insensitive) for frontend
    /// configuration.
    pub frontend_config: Vec<String>,

    /// File-name patterns for backend configuration.
    pub backend_config: Vec<String>,

    /// File-name patterns for shared configuration and documentation.
    pub shared_config: Vec<String>,

    /// Whether to follow symbolic links while walking.
    pub follow_links: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_dirs: owned(&[
                "node_modules",
                "__pycache__",
                ".git",
                ".pytest_cache",
                ".hypothesis",
                "dist",
                "build",
                ".venv",
                "venv",
                ".relayout",
            ]),
            frontend_config: owned(&[
                "package.json",
                "package-lock.json",
                "tsconfig.json",
                "tsconfig.*.json",
                "vite.config.*",
                "webpack.config.*",
                ".eslintrc*",
                ".prettierrc*",
                "tailwind.config.*",
            ]),
            backend_config: owned(&[
                "requirements.txt",
                "requirements-*.txt",
                "setup.py",
                "setup.cfg",
                "pyproject.toml",
                "Pipfile",
                ".env",
                ".env.*",
                "alembic.ini",
            ]),
            shared_config: owned(&[
                ".gitignore",
                "README.md",
                "LICENSE",
                "CHANGELOG.md",
                "docker-compose.*",
                "Dockerfile",
            ]),
            follow_links: false,
        }
    }
}

/// Configuration for reference resolution and rewriting.
///
/// # Examples
///
/// ```
/// use rl_core::ResolveConfig;
///
/// let config = ResolveConfig::default();
/// assert_eq!(config.candidate_extensions[0], ".ts");
/// assert_eq!(config.package_marker, "__init__.py");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Extensions appended, in order, when probing a frontend reference.
    pub candidate_extensions: Vec<String>,

    /// Extensions removed from rewritten frontend references.
    pub strip_extensions: Vec<String>,

    /// Stem of directory index modules (`index.ts`, `index.js`, ...).
    pub index_stem: String,

    /// File that marks a directory as a Python package.
    pub package_marker: String,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            candidate_extensions: owned(&[".ts", ".tsx", ".js", ".jsx", ".json"]),
            strip_extensions: owned(&[".ts", ".tsx", ".js", ".jsx"]),
            index_stem: "index".to_owned(),
            package_marker: "__init__.py".to_owned(),
        }
    }
}

/// Configuration for the durable plan store.
///
/// # Examples
///
/// ```
/// use rl_core::StoreConfig;
///
/// let config = StoreConfig::default();
/// assert_eq!(config.state_dir, ".relayout");
/// assert_eq!(config.retention_days, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name of the state directory, created under the analysis root.
    pub state_dir: String,

    /// Default age, in days, after which terminal plans may be pruned.
    pub retention_days: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            state_dir: ".relayout".to_owned(),
            retention_days: 30,
        }
    }
}

/// Root configuration for relayout.
///
/// # Examples
///
/// ```
/// use rl_core::Config;
///
/// let config = Config::default();
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// assert!(json.contains("ignore_dirs"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scanner configuration.
    pub scan: ScanConfig,

    /// Resolver configuration.
    pub resolve: ResolveConfig,

    /// Plan store configuration.
    pub store: StoreConfig,
}

impl Config {
    /// Reads a JSON configuration file and validates it.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks option values that serde alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.state_dir.is_empty() || self.store.state_dir.contains(['/', '\\']) {
            return Err(ConfigError::InvalidOption {
                option: "store.state_dir".to_owned(),
                reason: "must be a single directory name".to_owned(),
            });
        }
        if let Some(bad) = self
            .resolve
            .candidate_extensions
            .iter()
            .chain(&self.resolve.strip_extensions)
            .find(|ext| !ext.starts_with('.'))
        {
            return Err(ConfigError::InvalidOption {
                option: "resolve".to_owned(),
                reason: format!("extension '{bad}' must start with '.'"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_config_defaults() {
        let config = ScanConfig::default();
        assert!(config.ignore_dirs.contains(&".relayout".to_owned()));
        assert!(config.backend_config.contains(&"pyproject.toml".to_owned()));
        assert!(!config.follow_links);
    }

    #[test]
    fn test_resolve_config_defaults() {
        let config = ResolveConfig::default();
        assert_eq!(
            config.candidate_extensions,
            vec![".ts", ".tsx", ".js", ".jsx", ".json"]
        );
        assert_eq!(config.strip_extensions, vec![".ts", ".tsx", ".js", ".jsx"]);
        assert_eq!(config.index_stem, "index");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_deserialize_with_missing_fields() {
        let json = r#"{"store": {"retention_days": 7}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.store.retention_days, 7);
        assert_eq!(config.store.state_dir, ".relayout");
        assert_eq!(config.resolve.index_stem, "index");
    }

    #[test]
    fn test_validate_rejects_nested_state_dir() {
        let mut config = Config::default();
        config.store.state_dir = "a/b".to_owned();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidOption { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bare_extension() {
        let mut config = Config::default();
        config.resolve.candidate_extensions.push("vue".to_owned());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("vue"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("relayout.json")).unwrap();
        std::fs::write(&path, r#"{"scan": {"follow_links": true}}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert!(config.scan.follow_links);
    }
}
