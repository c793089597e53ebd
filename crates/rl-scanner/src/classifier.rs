//! File classification and per-file analysis.
//!
//! [`FileClassifier`] turns a path into a [`FileRecord`]: it picks a
//! [`FileCategory`], flags tests and configuration files, and extracts raw
//! references and exported names with the language's [`PatternTable`].
//!
//! Records are cached per path for the lifetime of the classifier. A second
//! `analyze` of the same path returns the very same record, even if the file
//! changed on disk in between; create a new classifier to rescan.

use camino::{Utf8Path, Utf8PathBuf};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use rl_core::paths::normalize;
use rl_core::{FileCategory, FileRecord, FrontendVariant, FxHashMap, ScanConfig};
use tracing::{debug, info, warn};

use crate::error::ScanError;
use crate::patterns::{LineMatch, PatternTable};
use crate::walker::FileWalker;

/// Case-insensitive path markers of test files. Paths are checked with a
/// leading `/` so top-level `tests/` directories match.
const TEST_MARKERS: &[&str] = &[
    ".test.", ".spec.", "_test.", "_spec.", "/test/", "/tests/", "test_", "spec_",
];

/// Extensions that make a shared-pattern match documentation.
const DOC_EXTENSIONS: &[&str] = &["md", "rst", "txt", "adoc"];

/// File names that make a shared-pattern match documentation.
const DOC_NAMES: &[&str] = &["license", "copying", "authors"];

/// The result of analyzing a whole tree.
#[derive(Debug, Default)]
pub struct TreeAnalysis {
    /// One record per analyzed file, sorted by path.
    pub records: Vec<FileRecord>,
    /// Per-file and per-entry failures; none of them stopped the walk.
    pub errors: Vec<ScanError>,
}

/// Classifies files under one root and caches their records.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use rl_core::ScanConfig;
/// use rl_scanner::FileClassifier;
///
/// let mut classifier = FileClassifier::new(Utf8Path::new("."), &ScanConfig::default())?;
/// let analysis = classifier.analyze_tree()?;
/// for record in &analysis.records {
///     println!("{} {}", record.category, record.path);
/// }
/// # Ok::<(), rl_scanner::ScanError>(())
/// ```
#[derive(Debug)]
pub struct FileClassifier {
    root: Utf8PathBuf,
    frontend_config: GlobSet,
    backend_config: GlobSet,
    shared_config: GlobSet,
    ignore_dirs: Vec<String>,
    follow_links: bool,
    /// Record arena; `index` maps paths into it.
    records: Vec<FileRecord>,
    index: FxHashMap<Utf8PathBuf, usize>,
}

impl FileClassifier {
    /// Creates a classifier for `root`, compiling the configured pattern sets.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Config`] if the root is not a directory or a
    /// pattern does not compile.
    pub fn new(root: &Utf8Path, config: &ScanConfig) -> Result<Self, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::config(format!(
                "root path is not a directory: {root}"
            )));
        }

        Ok(Self {
            root: root.to_owned(),
            frontend_config: compile_set(&config.frontend_config)?,
            backend_config: compile_set(&config.backend_config)?,
            shared_config: compile_set(&config.shared_config)?,
            ignore_dirs: config.ignore_dirs.clone(),
            follow_links: config.follow_links,
            records: Vec::new(),
            index: FxHashMap::default(),
        })
    }

    /// Returns the analysis root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Classifies a path by name alone.
    ///
    /// Configuration patterns win over extensions, so `vite.config.ts` is
    /// frontend configuration rather than TypeScript source.
    #[must_use]
    pub fn classify(&self, path: &Utf8Path) -> FileCategory {
        let Some(name) = path.file_name() else {
            return FileCategory::Unknown;
        };

        if self.frontend_config.is_match(name) {
            return FileCategory::ConfigFrontend;
        }
        if self.backend_config.is_match(name) {
            return FileCategory::ConfigBackend;
        }
        if self.shared_config.is_match(name) {
            return if is_documentation(path) {
                FileCategory::Documentation
            } else {
                FileCategory::ConfigShared
            };
        }

        let extension = path.extension().map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("py") => FileCategory::BackendSource,
            Some("tsx" | "jsx") => FileCategory::FrontendSource(FrontendVariant::React),
            Some("ts" | "mts" | "cts") => FileCategory::FrontendSource(FrontendVariant::TypeScript),
            Some("js" | "mjs" | "cjs") => FileCategory::FrontendSource(FrontendVariant::JavaScript),
            Some("css" | "scss" | "sass" | "less") => {
                FileCategory::FrontendSource(FrontendVariant::Stylesheet)
            }
            Some("html" | "htm") => FileCategory::FrontendSource(FrontendVariant::Markup),
            _ => FileCategory::Unknown,
        }
    }

    /// Returns `true` if the path follows a test naming convention.
    #[must_use]
    pub fn is_test(path: &Utf8Path) -> bool {
        let haystack = format!("/{}", path.as_str().replace('\\', "/")).to_lowercase();
        TEST_MARKERS.iter().any(|marker| haystack.contains(marker))
    }

    /// Returns `true` if the file name matches any configuration pattern set.
    #[must_use]
    pub fn is_config(&self, path: &Utf8Path) -> bool {
        path.file_name().is_some_and(|name| {
            self.frontend_config.is_match(name)
                || self.backend_config.is_match(name)
                || self.shared_config.is_match(name)
        })
    }

    /// Extracts raw reference strings from a root-relative file, in source
    /// order. Never fails: unreadable files and categories without a
    /// language yield nothing.
    #[must_use]
    pub fn extract_references(&self, path: &Utf8Path, category: FileCategory) -> Vec<String> {
        self.reference_matches(path, category)
            .into_iter()
            .map(|m| m.text)
            .collect()
    }

    /// Like [`extract_references`](Self::extract_references), keeping the
    /// line and column of each match.
    #[must_use]
    pub fn reference_matches(&self, path: &Utf8Path, category: FileCategory) -> Vec<LineMatch> {
        self.with_table(path, category, |table, content| table.references(content))
    }

    /// Extracts exported names from a root-relative file, in source order.
    #[must_use]
    pub fn extract_exports(&self, path: &Utf8Path, category: FileCategory) -> Vec<String> {
        self.with_table(path, category, |table, content| table.exports(content))
    }

    fn with_table<T>(
        &self,
        path: &Utf8Path,
        category: FileCategory,
        extract: impl FnOnce(&PatternTable, &str) -> Vec<T>,
    ) -> Vec<T> {
        let Some(language) = category.language() else {
            return Vec::new();
        };
        let table = match PatternTable::get(language) {
            Ok(table) => table,
            Err(err) => {
                warn!(?language, error = %err, "pattern table failed to compile");
                return Vec::new();
            }
        };
        match read_lossy(&self.root.join(path)) {
            Ok(content) => extract(table, &content),
            Err(err) => {
                debug!(path = %path, error = %err, "unreadable file, no extraction");
                Vec::new()
            }
        }
    }

    /// Analyzes one file, returning its cached record on repeat calls.
    ///
    /// `path` may be absolute under the root or root-relative.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::Read`] if the file's metadata cannot be read.
    pub fn analyze(&mut self, path: &Utf8Path) -> Result<&FileRecord, ScanError> {
        let relative = self.relativize(path)?;
        if let Some(&slot) = self.index.get(&relative) {
            return Ok(&self.records[slot]);
        }

        let metadata =
            std::fs::metadata(self.root.join(&relative)).map_err(|e| ScanError::read(&relative, e))?;
        if !metadata.is_file() {
            return Err(ScanError::read(
                &relative,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
            ));
        }

        let category = self.classify(&relative);
        let record = FileRecord {
            size: metadata.len(),
            is_test: Self::is_test(&relative),
            is_config: self.is_config(&relative),
            references: self.extract_references(&relative, category),
            exports: self.extract_exports(&relative, category),
            ..FileRecord::new(relative.clone(), category)
        };

        let slot = self.records.len();
        self.records.push(record);
        self.index.insert(relative, slot);
        Ok(&self.records[slot])
    }

    /// Walks the whole root and analyzes every non-ignored file.
    ///
    /// Failures on individual entries are collected in
    /// [`TreeAnalysis::errors`]; only an unusable root aborts.
    pub fn analyze_tree(&mut self) -> Result<TreeAnalysis, ScanError> {
        let walker = FileWalker::new(&self.root)?
            .with_ignore_dirs(&self.ignore_dirs)
            .with_follow_links(self.follow_links);
        let (paths, mut errors) = walker.walk();

        let mut records = Vec::with_capacity(paths.len());
        for path in &paths {
            match self.analyze(path) {
                Ok(record) => records.push(record.clone()),
                Err(err) => {
                    warn!(path = %path, error = %err, "skipping file");
                    errors.push(err);
                }
            }
        }

        info!(
            root = %self.root,
            files = records.len(),
            errors = errors.len(),
            "analyzed tree"
        );
        Ok(TreeAnalysis { records, errors })
    }

    /// Returns the cached record for a root-relative path, if analyzed.
    #[must_use]
    pub fn cached(&self, path: &Utf8Path) -> Option<&FileRecord> {
        self.index.get(path).map(|&slot| &self.records[slot])
    }

    /// Returns the number of cached records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been analyzed yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn relativize(&self, path: &Utf8Path) -> Result<Utf8PathBuf, ScanError> {
        let candidate = if path.is_absolute() {
            path.strip_prefix(&self.root).map_err(|_| {
                ScanError::read(
                    path,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "outside the root"),
                )
            })?
        } else {
            path
        };
        normalize(candidate).ok_or_else(|| {
            ScanError::read(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "escapes the root"),
            )
        })
    }
}

/// Reads a file as text, replacing undecodable bytes.
pub fn read_lossy(path: &Utf8Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

fn is_documentation(path: &Utf8Path) -> bool {
    let extension = path.extension().map(str::to_ascii_lowercase);
    if extension
        .as_deref()
        .is_some_and(|ext| DOC_EXTENSIONS.contains(&ext))
    {
        return true;
    }
    path.file_stem()
        .map(str::to_ascii_lowercase)
        .is_some_and(|stem| DOC_NAMES.contains(&stem.as_str()))
}

fn compile_set(patterns: &[String]) -> Result<GlobSet, ScanError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|e| ScanError::config(format!("invalid pattern '{pattern}': {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ScanError::config(format!("invalid pattern set: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
        (dir, root)
    }

    fn write(root: &Utf8Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn classifier(root: &Utf8Path) -> FileClassifier {
        FileClassifier::new(root, &ScanConfig::default()).unwrap()
    }

    #[test]
    fn test_classify_config_before_extension() {
        let (_dir, root) = temp_root();
        let c = classifier(&root);
        assert_eq!(c.classify(Utf8Path::new("vite.config.ts")), FileCategory::ConfigFrontend);
        assert_eq!(c.classify(Utf8Path::new("web/Package.JSON")), FileCategory::ConfigFrontend);
        assert_eq!(c.classify(Utf8Path::new("pyproject.toml")), FileCategory::ConfigBackend);
        assert_eq!(c.classify(Utf8Path::new(".env.local")), FileCategory::ConfigBackend);
        assert_eq!(c.classify(Utf8Path::new("README.md")), FileCategory::Documentation);
        assert_eq!(c.classify(Utf8Path::new("LICENSE")), FileCategory::Documentation);
        assert_eq!(c.classify(Utf8Path::new(".gitignore")), FileCategory::ConfigShared);
        assert_eq!(c.classify(Utf8Path::new("Dockerfile")), FileCategory::ConfigShared);
    }

    #[test]
    fn test_classify_extensions() {
        let (_dir, root) = temp_root();
        let c = classifier(&root);
        assert_eq!(c.classify(Utf8Path::new("app/main.py")), FileCategory::BackendSource);
        assert_eq!(
            c.classify(Utf8Path::new("web/App.tsx")),
            FileCategory::FrontendSource(FrontendVariant::React)
        );
        assert_eq!(
            c.classify(Utf8Path::new("web/api.ts")),
            FileCategory::FrontendSource(FrontendVariant::TypeScript)
        );
        assert_eq!(
            c.classify(Utf8Path::new("web/legacy.MJS")),
            FileCategory::FrontendSource(FrontendVariant::JavaScript)
        );
        assert_eq!(
            c.classify(Utf8Path::new("web/site.scss")),
            FileCategory::FrontendSource(FrontendVariant::Stylesheet)
        );
        assert_eq!(
            c.classify(Utf8Path::new("index.html")),
            FileCategory::FrontendSource(FrontendVariant::Markup)
        );
        assert_eq!(c.classify(Utf8Path::new("data.bin")), FileCategory::Unknown);
        assert_eq!(c.classify(Utf8Path::new("Makefile")), FileCategory::Unknown);
    }

    #[test]
    fn test_is_test_markers() {
        assert!(FileClassifier::is_test(Utf8Path::new("tests/conftest.py")));
        assert!(FileClassifier::is_test(Utf8Path::new("app/test_models.py")));
        assert!(FileClassifier::is_test(Utf8Path::new("web/Button.test.tsx")));
        assert!(FileClassifier::is_test(Utf8Path::new("web/api.SPEC.ts")));
        assert!(FileClassifier::is_test(Utf8Path::new("pkg/test/helpers.js")));
        assert!(!FileClassifier::is_test(Utf8Path::new("app/models.py")));
        assert!(!FileClassifier::is_test(Utf8Path::new("web/Attest.tsx")));
    }

    #[test]
    fn test_is_config() {
        let (_dir, root) = temp_root();
        let c = classifier(&root);
        assert!(c.is_config(Utf8Path::new("tsconfig.json")));
        assert!(c.is_config(Utf8Path::new("requirements.txt")));
        assert!(c.is_config(Utf8Path::new("README.md")));
        assert!(!c.is_config(Utf8Path::new("app/main.py")));
    }

    #[test]
    fn test_extract_unreadable_is_empty() {
        let (_dir, root) = temp_root();
        let c = classifier(&root);
        assert!(
            c.extract_references(Utf8Path::new("missing.py"), FileCategory::BackendSource)
                .is_empty()
        );
        write(&root, "style.css", "@import './base.css';");
        assert!(
            c.extract_references(Utf8Path::new("style.css"),
                FileCategory::FrontendSource(FrontendVariant::Stylesheet)
            )
            .is_empty()
        );
    }

    #[test]
    fn test_extract_lossy_decoding() {
        let (_dir, root) = temp_root();
        let path = root.join("app/bad.py");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"# \xff\xfe\nimport os\n").unwrap();
        let c = classifier(&root);
        assert_eq!(
            c.extract_references(Utf8Path::new("app/bad.py"), FileCategory::BackendSource),
            vec!["os"]
        );
    }

    #[test]
    fn test_analyze_builds_record_and_caches() {
        let (_dir, root) = temp_root();
        write(&root, "app/test_api.py", "from .models import User\ndef test_it():\n    pass\n");
        let mut c = classifier(&root);

        let first = c.analyze(Utf8Path::new("app/test_api.py")).unwrap().clone();
        assert_eq!(first.category, FileCategory::BackendSource);
        assert!(first.is_test);
        assert!(!first.is_config);
        assert_eq!(first.references, vec![".models"]);
        assert_eq!(first.exports, vec!["test_it"]);
        assert_eq!(first.size, 49);

        // Later edits are not observed through the cache.
        write(&root, "app/test_api.py", "import os\n");
        let second = c.analyze(&root.join("app/test_api.py")).unwrap();
        assert_eq!(*second, first);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_analyze_missing_file_errors() {
        let (_dir, root) = temp_root();
        let mut c = classifier(&root);
        let err = c.analyze(Utf8Path::new("nope.py")).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(err.path().map(|p| p.as_str()), Some("nope.py"));
    }

    #[test]
    fn test_analyze_tree_sorted_and_filtered() {
        let (_dir, root) = temp_root();
        write(&root, "web/src/App.tsx", "import { api } from './api';\n");
        write(&root, "web/src/api.ts", "export const api = {};\n");
        write(&root, "app/main.py", "import app.models\n");
        write(&root, "app/__pycache__/main.cpython-312.pyc", "");
        write(&root, "web/node_modules/react/index.js", "");
        write(&root, ".relayout/state.json", "{}");
        write(&root, ".env", "SECRET=1");

        let mut c = classifier(&root);
        let analysis = c.analyze_tree().unwrap();
        assert!(analysis.errors.is_empty());

        let paths: Vec<&str> = analysis.records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![".env", "app/main.py", "web/src/App.tsx", "web/src/api.ts"]
        );
        assert_eq!(analysis.records[0].category, FileCategory::ConfigBackend);
        assert_eq!(analysis.records[2].references, vec!["./api"]);
        assert_eq!(analysis.records[3].exports, vec!["api"]);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let (_dir, root) = temp_root();
        let config = ScanConfig {
            frontend_config: vec!["[unclosed".to_owned()],
            ..ScanConfig::default()
        };
        let err = FileClassifier::new(&root, &config).unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
    }
}
