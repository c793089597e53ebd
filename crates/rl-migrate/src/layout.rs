//! Frontend/backend layout suggestion.
//!
//! Proposes a [`PathMapping`] that splits a flat project into a frontend
//! tree and a backend tree:
//!
//! | File | Destination |
//! |---|---|
//! | shared config, documentation, unknown | stays |
//! | already under either tree | stays |
//! | frontend config | `frontend/<name>` |
//! | `index.html` | `frontend/public/index.html` |
//! | frontend source under `components/` or `services/` | `frontend/src/<path>` |
//! | other frontend source | `frontend/src/<name>` |
//! | backend config | `backend/<name>` |
//! | `main.py`, `server.py` | `backend/<name>` |
//! | `test_*.py` | `backend/tests/<name>` |
//! | other Python | `backend/app/<name>` |

use camino::{Utf8Path, Utf8PathBuf};
use rl_core::{FileCategory, FileRecord, FxHashMap, PathMapping};
use tracing::{debug, warn};

const ENTRY_POINTS: &[&str] = &["main.py", "server.py"];
const NESTED_FRONTEND_DIRS: &[&str] = &["components", "services"];

/// Target directory names for [`suggest_mapping`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Root of the frontend tree.
    pub frontend_dir: String,
    /// Root of the backend tree.
    pub backend_dir: String,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            frontend_dir: "frontend".to_owned(),
            backend_dir: "backend".to_owned(),
        }
    }
}

/// A suggested mapping plus the files it had to leave out.
#[derive(Debug, Clone, Default)]
pub struct LayoutSuggestion {
    /// Suggested relocations, one per moving file.
    pub mapping: PathMapping,
    /// One message per skipped file.
    pub warnings: Vec<String>,
}

/// Suggests where each of `records` should live in a frontend/backend
/// layout. Files whose destination is already taken are skipped with a
/// warning.
#[must_use]
pub fn suggest_mapping(records: &[FileRecord], options: &LayoutOptions) -> LayoutSuggestion {
    let mut suggestion = LayoutSuggestion::default();
    let mut claimed: FxHashMap<Utf8PathBuf, &Utf8Path> = FxHashMap::default();

    for record in records {
        let Some(target) = destination(&record.path, record.category, options) else {
            continue;
        };
        if target == record.path {
            continue;
        }

        if let Some(first) = claimed.get(&target) {
            warn!(path = %record.path, target = %target, "destination already claimed");
            suggestion.warnings.push(format!(
                "skipped '{}': '{target}' is already the destination of '{first}'",
                record.path
            ));
            continue;
        }
        if records.iter().any(|other| other.path == target) {
            suggestion.warnings.push(format!(
                "skipped '{}': '{target}' already exists",
                record.path
            ));
            continue;
        }

        match suggestion.mapping.insert(&record.path, &target, record.category) {
            Ok(()) => {
                debug!(path = %record.path, target = %target, "suggested move");
                claimed.insert(target, &record.path);
            }
            Err(err) => suggestion
                .warnings
                .push(format!("skipped '{}': {err}", record.path)),
        }
    }

    suggestion
}

fn destination(
    path: &Utf8Path,
    category: FileCategory,
    options: &LayoutOptions,
) -> Option<Utf8PathBuf> {
    let first = path.components().next()?.as_str();
    if path.components().count() > 1
        && (first == options.frontend_dir || first == options.backend_dir)
    {
        return None;
    }

    let name = path.file_name()?;
    let frontend = Utf8Path::new(&options.frontend_dir);
    let backend = Utf8Path::new(&options.backend_dir);

    match category {
        FileCategory::ConfigFrontend => Some(frontend.join(name)),
        FileCategory::FrontendSource(_) => Some(if name.eq_ignore_ascii_case("index.html") {
            frontend.join("public").join(name)
        } else if NESTED_FRONTEND_DIRS.contains(&first) {
            frontend.join("src").join(path)
        } else {
            frontend.join("src").join(name)
        }),
        FileCategory::ConfigBackend => Some(backend.join(name)),
        FileCategory::BackendSource => Some(if ENTRY_POINTS.contains(&name) {
            backend.join(name)
        } else if name.starts_with("test_") {
            backend.join("tests").join(name)
        } else {
            backend.join("app").join(name)
        }),
        FileCategory::ConfigShared | FileCategory::Documentation | FileCategory::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_core::FrontendVariant;

    fn record(path: &str, category: FileCategory) -> FileRecord {
        FileRecord::new(path.into(), category)
    }

    #[test]
    fn test_suggest_mapping_rules() {
        let records = vec![
            record("README.md", FileCategory::Documentation),
            record(".gitignore", FileCategory::ConfigShared),
            record("package.json", FileCategory::ConfigFrontend),
            record("index.html", FileCategory::FrontendSource(FrontendVariant::Markup)),
            record("App.tsx", FileCategory::FrontendSource(FrontendVariant::React)),
            record(
                "components/ui/Button.tsx",
                FileCategory::FrontendSource(FrontendVariant::React),
            ),
            record("services/api.ts", FileCategory::FrontendSource(FrontendVariant::TypeScript)),
            record("requirements.txt", FileCategory::ConfigBackend),
            record("main.py", FileCategory::BackendSource),
            record("test_models.py", FileCategory::BackendSource),
            record("models.py", FileCategory::BackendSource),
            record("backend/app/db.py", FileCategory::BackendSource),
        ];
        let suggestion = suggest_mapping(&records, &LayoutOptions::default());
        assert!(suggestion.warnings.is_empty());

        let moves: Vec<String> = suggestion
            .mapping
            .iter()
            .map(|(old, entry)| format!("{old} -> {}", entry.new_path))
            .collect();
        insta::assert_debug_snapshot!(moves, @r#"
        [
            "App.tsx -> frontend/src/App.tsx",
            "components/ui/Button.tsx -> frontend/src/components/ui/Button.tsx",
            "index.html -> frontend/public/index.html",
            "main.py -> backend/main.py",
            "models.py -> backend/app/models.py",
            "package.json -> frontend/package.json",
            "requirements.txt -> backend/requirements.txt",
            "services/api.ts -> frontend/src/services/api.ts",
            "test_models.py -> backend/tests/test_models.py",
        ]
        "#);
    }

    #[test]
    fn test_collisions_are_skipped() {
        let records = vec![
            record("lib/utils.ts", FileCategory::FrontendSource(FrontendVariant::TypeScript)),
            record("utils.ts", FileCategory::FrontendSource(FrontendVariant::TypeScript)),
            record("a/models.py", FileCategory::BackendSource),
            record("backend/app/models.py", FileCategory::BackendSource),
        ];
        let suggestion = suggest_mapping(&records, &LayoutOptions::default());

        assert_eq!(suggestion.mapping.len(), 1);
        assert_eq!(
            suggestion.mapping.new_path(Utf8Path::new("lib/utils.ts")).unwrap().as_str(),
            "frontend/src/utils.ts"
        );
        assert_eq!(
            suggestion.warnings,
            vec![
                "skipped 'utils.ts': 'frontend/src/utils.ts' is already the destination of 'lib/utils.ts'",
                "skipped 'a/models.py': 'backend/app/models.py' already exists",
            ]
        );
    }

    #[test]
    fn test_custom_directories() {
        let records = vec![
            record("client/app.ts", FileCategory::FrontendSource(FrontendVariant::TypeScript)),
            record("server.py", FileCategory::BackendSource),
        ];
        let options = LayoutOptions {
            frontend_dir: "client".to_owned(),
            backend_dir: "api".to_owned(),
        };
        let suggestion = suggest_mapping(&records, &options);
        assert_eq!(suggestion.mapping.len(), 1);
        assert_eq!(
            suggestion.mapping.new_path(Utf8Path::new("server.py")).unwrap().as_str(),
            "api/server.py"
        );
    }
}
