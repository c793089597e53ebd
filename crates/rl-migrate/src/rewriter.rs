//! Reference rewriting.
//!
//! [`ReferenceRewriter`] computes the [`ReferenceUpdate`]s a relocation
//! needs and applies or reverts them in place.
//!
//! Updates are computed once, against pre-move locations, by re-running the
//! classifier's pattern tables over each file so every update knows the
//! exact line and column of the text it replaces. New text is derived from
//! the referencing file's prospective location (its destination if it
//! moves, else where it is now) and the referenced file's destination.
//!
//! Edits are made on raw bytes, so files that are not valid UTF-8 keep every
//! byte outside the replaced spans.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use rl_core::paths::{parent_dir, relative_path};
use rl_core::{FileCategory, FileRecord, PathMapping, ReferenceUpdate, ResolveConfig};
use rl_graph::ReferenceResolver;
use rl_scanner::{PatternTable, is_python_module};
use tracing::{debug, info, warn};

use crate::error::RewriteError;

/// Change-log lines per edited file.
pub type ChangeLog = BTreeMap<Utf8PathBuf, Vec<String>>;

/// Updates computed for a mapping, plus the references that could not be
/// expressed at their new location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedUpdates {
    /// Updates in file order, then line order.
    pub updates: Vec<ReferenceUpdate>,
    /// One message per reference left untouched.
    pub warnings: Vec<String>,
}

/// Computes, applies and reverts reference updates under one root.
#[derive(Debug, Clone)]
pub struct ReferenceRewriter {
    root: Utf8PathBuf,
    resolver: ReferenceResolver,
}

impl ReferenceRewriter {
    /// Creates a rewriter that resolves references against `records`.
    #[must_use]
    pub fn new(root: &Utf8Path, records: &[FileRecord], config: ResolveConfig) -> Self {
        Self {
            root: root.to_owned(),
            resolver: ReferenceResolver::from_records(records, config),
        }
    }

    /// Returns the root every path is relative to.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Computes every update that relocating according to `mapping`
    /// requires.
    ///
    /// A reference is updated only when the file it resolves to moves and
    /// the new text differs from the old. Unreadable files contribute no
    /// updates.
    #[must_use]
    pub fn compute_updates(&self, records: &[FileRecord], mapping: &PathMapping) -> ComputedUpdates {
        let mut computed = ComputedUpdates::default();

        for record in records {
            let Some(language) = record.language() else {
                continue;
            };
            let table = match PatternTable::get(language) {
                Ok(table) => table,
                Err(err) => {
                    warn!(?language, error = %err, "pattern table failed to compile");
                    continue;
                }
            };
            let bytes = match std::fs::read(self.root.join(&record.path)) {
                Ok(bytes) => bytes,
                Err(err) => {
                    debug!(path = %record.path, error = %err, "unreadable file, no updates");
                    continue;
                }
            };
            let content = String::from_utf8_lossy(&bytes);
            let raw_lines: Vec<&[u8]> = bytes.split_inclusive(|&b| b == b'\n').collect();

            let from_dir = parent_dir(mapping.prospective(&record.path));
            for found in table.references(&content) {
                let targets = self
                    .resolver
                    .resolve(&record.path, record.category, &found.text);
                let Some(target) = targets.first() else {
                    continue;
                };
                if !mapping.moves(target) {
                    continue;
                }
                let Some(new_target) = mapping.new_path(target) else {
                    continue;
                };
                if !raw_span_matches(&raw_lines, found.line, found.column, &found.text) {
                    warn!(path = %record.path, line = found.line, "undecodable bytes before reference");
                    computed.warnings.push(format!(
                        "{}:{}: '{}' left unchanged: line contains undecodable bytes",
                        record.path, found.line, found.text
                    ));
                    continue;
                }

                let new_text = match record.category {
                    FileCategory::BackendSource => python_text(
                        from_dir,
                        new_target,
                        &found.text,
                        &self.resolver.config().package_marker,
                    ),
                    _ => Ok(self.frontend_text(from_dir, new_target, &found.text)),
                };
                match new_text {
                    Ok(new) if new != found.text => computed.updates.push(ReferenceUpdate {
                        file: record.path.clone(),
                        line: found.line,
                        column: found.column,
                        old: found.text,
                        new,
                    }),
                    Ok(_) => {}
                    Err(reason) => {
                        warn!(path = %record.path, line = found.line, %reason, "reference left unchanged");
                        computed.warnings.push(format!(
                            "{}:{}: '{}' left unchanged: {reason}",
                            record.path, found.line, found.text
                        ));
                    }
                }
            }
        }

        debug!(updates = computed.updates.len(), "computed reference updates");
        computed
    }

    fn frontend_text(&self, from_dir: &Utf8Path, target: &Utf8Path, old: &str) -> String {
        let config = self.resolver.config();
        let old_path = Utf8Path::new(old);

        let file_form = match target.extension() {
            Some(ext)
                if config
                    .strip_extensions
                    .iter()
                    .any(|strip| strip.strip_prefix('.') == Some(ext))
                    && old_path.extension() != Some(ext) =>
            {
                target.with_extension("")
            }
            _ => target.to_owned(),
        };

        let by_directory = target.file_stem() == Some(config.index_stem.as_str())
            && old_path.file_stem() != Some(config.index_stem.as_str());
        let mut relative = if by_directory {
            relative_path(from_dir, parent_dir(target))
        } else {
            relative_path(from_dir, &file_form)
        };
        // A bare `.` or `..` names no file once the directory is the root.
        if matches!(relative.as_str(), "." | "..") {
            relative = relative_path(from_dir, &file_form);
        }

        if relative.as_str().starts_with("../") {
            relative.into_string()
        } else {
            format!("./{relative}")
        }
    }

    /// Applies `updates` to the files they name.
    ///
    /// Updates are grouped by file; each file is verified completely before
    /// it is written, so a stale update leaves that file untouched. With
    /// `dry_run` nothing is written.
    pub fn apply(&self, updates: &[ReferenceUpdate], dry_run: bool) -> Result<ChangeLog, RewriteError> {
        let mut log = ChangeLog::new();
        for (file, group) in group_by_file(updates) {
            let lines = self.apply_file(file, &group, dry_run)?;
            log.insert(file.to_owned(), lines);
        }
        Ok(log)
    }

    /// Undoes `updates` previously applied to the files they name.
    pub fn revert(&self, updates: &[ReferenceUpdate], dry_run: bool) -> Result<ChangeLog, RewriteError> {
        let mut log = ChangeLog::new();
        for (file, group) in group_by_file(updates) {
            let lines = self.revert_file(file, &group, dry_run)?;
            log.insert(file.to_owned(), lines);
        }
        Ok(log)
    }

    /// Applies `updates` to the file at `path`, which may differ from the
    /// updates' own pre-move path.
    pub fn apply_file(
        &self,
        path: &Utf8Path,
        updates: &[ReferenceUpdate],
        dry_run: bool,
    ) -> Result<Vec<String>, RewriteError> {
        let absolute = self.root.join(path);
        let content = std::fs::read(&absolute).map_err(|err| RewriteError::io(path, err))?;
        let edited = edit(&content, updates).map_err(|stale| RewriteError::Stale {
            path: path.to_owned(),
            line: stale.line,
            column: stale.column,
            expected: stale.old.clone(),
        })?;

        if !dry_run {
            std::fs::write(&absolute, edited).map_err(|err| RewriteError::io(path, err))?;
            info!(path = %path, updates = updates.len(), "rewrote references");
        }

        let mut ordered: Vec<&ReferenceUpdate> = updates.iter().collect();
        ordered.sort_by_key(|u| (u.line, u.column));
        Ok(ordered.iter().map(|u| u.log_line()).collect())
    }

    /// Undoes `updates` in the file at `path`.
    pub fn revert_file(
        &self,
        path: &Utf8Path,
        updates: &[ReferenceUpdate],
        dry_run: bool,
    ) -> Result<Vec<String>, RewriteError> {
        self.apply_file(path, &inverse(updates), dry_run)
    }
}

/// Dotted module text for a backend reference to `target`, written from a
/// file in `from_dir`. Relative references stay relative.
fn python_text(
    from_dir: &Utf8Path,
    target: &Utf8Path,
    old: &str,
    package_marker: &str,
) -> Result<String, String> {
    let module = if target.file_name() == Some(package_marker) {
        parent_dir(target).to_owned()
    } else {
        target.with_extension("")
    };
    let parts: Vec<&str> = module.iter().collect();

    if old.starts_with('.') {
        let from: Vec<&str> = from_dir.iter().collect();
        let shared = from.iter().zip(&parts).take_while(|(a, b)| a == b).count();
        let rest = parts[shared..].join(".");
        if !rest.is_empty() && !is_python_module(&rest) {
            return Err(format!("'{module}' is not a valid module path"));
        }
        return Ok(format!("{}{rest}", ".".repeat(1 + from.len() - shared)));
    }

    let dotted = parts.join(".");
    if dotted.is_empty() {
        return Err("target is the root package".to_owned());
    }
    if !is_python_module(&dotted) {
        return Err(format!("'{module}' is not a valid module path"));
    }
    Ok(dotted)
}

fn group_by_file(updates: &[ReferenceUpdate]) -> BTreeMap<&Utf8Path, Vec<ReferenceUpdate>> {
    let mut groups: BTreeMap<&Utf8Path, Vec<ReferenceUpdate>> = BTreeMap::new();
    for update in updates {
        groups
            .entry(update.file.as_path())
            .or_default()
            .push(update.clone());
    }
    groups
}

/// Inverse edits, with columns moved to where the applied text now sits.
#[allow(clippy::cast_possible_wrap)]
fn inverse(updates: &[ReferenceUpdate]) -> Vec<ReferenceUpdate> {
    let mut ordered: Vec<&ReferenceUpdate> = updates.iter().collect();
    ordered.sort_by_key(|u| (u.line, u.column));

    let mut inverted = Vec::with_capacity(ordered.len());
    let mut line = 0;
    let mut shift: isize = 0;
    for update in ordered {
        if update.line != line {
            line = update.line;
            shift = 0;
        }
        let mut undo = update.inverted();
        undo.column = update.column.saturating_add_signed(shift);
        shift += update.new.len() as isize - update.old.len() as isize;
        inverted.push(undo);
    }
    inverted
}

fn raw_span_matches(lines: &[&[u8]], line: usize, column: usize, text: &str) -> bool {
    line.checked_sub(1)
        .and_then(|ix| lines.get(ix))
        .and_then(|raw| raw.get(column..column + text.len()))
        == Some(text.as_bytes())
}

/// Applies `updates` bottom-up and right-to-left, keeping every other byte
/// as it was. Returns the first update whose old text is not at its
/// recorded position.
fn edit<'u>(content: &[u8], updates: &'u [ReferenceUpdate]) -> Result<Vec<u8>, &'u ReferenceUpdate> {
    let mut lines: Vec<Vec<u8>> = content
        .split_inclusive(|&b| b == b'\n')
        .map(<[u8]>::to_vec)
        .collect();

    let mut ordered: Vec<&ReferenceUpdate> = updates.iter().collect();
    ordered.sort_by_key(|u| std::cmp::Reverse((u.line, u.column)));

    for update in ordered {
        let Some(line) = update.line.checked_sub(1).and_then(|ix| lines.get_mut(ix)) else {
            return Err(update);
        };
        let end = update.column + update.old.len();
        if line.get(update.column..end) != Some(update.old.as_bytes()) {
            return Err(update);
        }
        let mut edited = Vec::with_capacity(line.len() + update.new.len());
        edited.extend_from_slice(&line[..update.column]);
        edited.extend_from_slice(update.new.as_bytes());
        edited.extend_from_slice(&line[end..]);
        *line = edited;
    }

    Ok(lines.concat())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rl_core::FrontendVariant;

    const TSX: FileCategory = FileCategory::FrontendSource(FrontendVariant::React);
    const TS: FileCategory = FileCategory::FrontendSource(FrontendVariant::TypeScript);
    const PY: FileCategory = FileCategory::BackendSource;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: Utf8PathBuf,
        records: Vec<FileRecord>,
    }

    impl Fixture {
        fn new(files: &[(&str, FileCategory, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = Utf8PathBuf::from_path_buf(dir.path().to_owned()).unwrap();
            let mut records = Vec::new();
            for &(path, category, content) in files {
                let absolute = root.join(path);
                std::fs::create_dir_all(absolute.parent().unwrap()).unwrap();
                std::fs::write(&absolute, content).unwrap();
                records.push(FileRecord::new(path.into(), category));
            }
            Self {
                _dir: dir,
                root,
                records,
            }
        }

        fn rewriter(&self) -> ReferenceRewriter {
            ReferenceRewriter::new(&self.root, &self.records, ResolveConfig::default())
        }

        fn read(&self, path: &str) -> String {
            std::fs::read_to_string(self.root.join(path)).unwrap()
        }
    }

    fn mapping(pairs: &[(&str, &str)]) -> PathMapping {
        let mut mapping = PathMapping::new();
        for &(old, new) in pairs {
            mapping
                .insert(Utf8Path::new(old), Utf8Path::new(new), FileCategory::Unknown)
                .unwrap();
        }
        mapping
    }

    fn pairs(updates: &[ReferenceUpdate]) -> Vec<(&str, &str)> {
        updates
            .iter()
            .map(|u| (u.old.as_str(), u.new.as_str()))
            .collect()
    }

    #[test]
    fn test_frontend_target_moves() {
        let fx = Fixture::new(&[
            (
                "web/pages/home.tsx",
                TSX,
                "import { api } from '../lib/api';\nimport Button from './Button';\nimport C from '../components';\n",
            ),
            ("web/pages/Button.tsx", TSX, ""),
            ("web/lib/api.ts", TS, ""),
            ("web/components/index.tsx", TSX, ""),
        ]);
        let computed = fx.rewriter().compute_updates(
            &fx.records,
            &mapping(&[
                ("web/lib/api.ts", "web/src/lib/api.ts"),
                ("web/components/index.tsx", "web/src/components/index.tsx"),
            ]),
        );
        assert_eq!(
            pairs(&computed.updates),
            vec![("../lib/api", "../src/lib/api"), ("../components", "../src/components")]
        );
        assert_eq!(computed.updates[0].line, 1);
        assert_eq!(computed.updates[0].column, 21);
        assert_eq!(computed.updates[1].line, 3);
    }

    #[test]
    fn test_frontend_source_and_target_move_together() {
        let fx = Fixture::new(&[
            ("a/x.ts", TS, "import { y } from './y';\n"),
            ("a/y.ts", TS, "export const y = 1;\n"),
        ]);
        let computed = fx
            .rewriter()
            .compute_updates(&fx.records, &mapping(&[("a/x.ts", "b/x.ts"), ("a/y.ts", "b/y.ts")]));
        assert!(computed.updates.is_empty());
    }

    #[test]
    fn test_frontend_only_source_moves_is_not_updated() {
        let fx = Fixture::new(&[
            ("a/x.ts", TS, "import { y } from './y';\n"),
            ("a/y.ts", TS, ""),
        ]);
        let computed = fx
            .rewriter()
            .compute_updates(&fx.records, &mapping(&[("a/x.ts", "b/x.ts")]));
        assert!(computed.updates.is_empty());
    }

    #[test]
    fn test_frontend_descendant_gets_dot_prefix() {
        let fx = Fixture::new(&[
            ("src/app.ts", TS, "import './styles.css';\nimport { a } from '../lib/a.js';\n"),
            ("src/styles.css", FileCategory::FrontendSource(FrontendVariant::Stylesheet), ""),
            ("lib/a.js", FileCategory::FrontendSource(FrontendVariant::JavaScript), ""),
        ]);
        let computed = fx.rewriter().compute_updates(
            &fx.records,
            &mapping(&[("src/styles.css", "src/theme/styles.css"), ("lib/a.js", "src/lib/a.js")]),
        );
        assert_eq!(
            pairs(&computed.updates),
            vec![("./styles.css", "./theme/styles.css"), ("../lib/a.js", "./lib/a.js")]
        );
    }

    #[test]
    fn test_python_relative_and_rooted() {
        let fx = Fixture::new(&[
            (
                "app/api/routes.py",
                PY,
                "from ..models import User\nimport app.models\nfrom . import deps\n",
            ),
            ("app/api/deps.py", PY, ""),
            ("app/api/__init__.py", PY, ""),
            ("app/models.py", PY, ""),
        ]);
        let computed = fx.rewriter().compute_updates(
            &fx.records,
            &mapping(&[
                ("app/api/routes.py", "backend/app/api/routes.py"),
                ("app/api/__init__.py", "backend/app/api/__init__.py"),
                ("app/models.py", "backend/app/models.py"),
            ]),
        );
        assert_eq!(pairs(&computed.updates), vec![("app.models", "backend.app.models")]);
        assert!(computed.warnings.is_empty());
    }

    #[test]
    fn test_python_only_target_moves() {
        let fx = Fixture::new(&[
            ("app/api/routes.py", PY, "from ..models import User\n"),
            ("app/models.py", PY, ""),
        ]);
        let computed = fx
            .rewriter()
            .compute_updates(&fx.records, &mapping(&[("app/models.py", "app/db/models.py")]));
        assert_eq!(pairs(&computed.updates), vec![("..models", "..db.models")]);
    }

    #[test]
    fn test_python_package_marker_referenced_by_directory() {
        let fx = Fixture::new(&[
            ("main.py", PY, "import core\n"),
            ("core/__init__.py", PY, ""),
        ]);
        let computed = fx.rewriter().compute_updates(
            &fx.records,
            &mapping(&[("core/__init__.py", "backend/core/__init__.py")]),
        );
        assert_eq!(pairs(&computed.updates), vec![("core", "backend.core")]);
    }

    #[test]
    fn test_python_invalid_module_warns() {
        let fx = Fixture::new(&[("main.py", PY, "import util\n"), ("util.py", PY, "")]);
        let computed = fx
            .rewriter()
            .compute_updates(&fx.records, &mapping(&[("util.py", "my-lib/util.py")]));
        assert!(computed.updates.is_empty());
        assert_eq!(computed.warnings.len(), 1);
        assert!(computed.warnings[0].starts_with("main.py:1: 'util' left unchanged"));
    }

    #[test]
    fn test_apply_and_revert_preserve_bytes() {
        let original = "import a from './a';\r\nimport b from './b'; import c from './c';\r\nno newline";
        let fx = Fixture::new(&[("x.ts", TS, original)]);
        let rewriter = fx.rewriter();
        let updates = vec![
            ReferenceUpdate {
                file: "x.ts".into(),
                line: 1,
                column: 15,
                old: "./a".to_owned(),
                new: "../lib/a".to_owned(),
            },
            ReferenceUpdate {
                file: "x.ts".into(),
                line: 2,
                column: 15,
                old: "./b".to_owned(),
                new: "./deep/b".to_owned(),
            },
            ReferenceUpdate {
                file: "x.ts".into(),
                line: 2,
                column: 36,
                old: "./c".to_owned(),
                new: "../c".to_owned(),
            },
        ];

        let log = rewriter.apply(&updates, false).unwrap();
        assert_eq!(
            fx.read("x.ts"),
            "import a from '../lib/a';\r\nimport b from './deep/b'; import c from '../c';\r\nno newline"
        );
        insta::assert_debug_snapshot!(log, @r#"
        {
            "x.ts": [
                "Line 1: ./a -> ../lib/a",
                "Line 2: ./b -> ./deep/b",
                "Line 2: ./c -> ../c",
            ],
        }
        "#);

        rewriter.revert(&updates, false).unwrap();
        assert_eq!(fx.read("x.ts"), original);
    }

    #[test]
    fn test_apply_dry_run_writes_nothing() {
        let fx = Fixture::new(&[("x.ts", TS, "import a from './a';\n")]);
        let updates = vec![ReferenceUpdate {
            file: "x.ts".into(),
            line: 1,
            column: 15,
            old: "./a".to_owned(),
            new: "./b".to_owned(),
        }];
        let log = fx.rewriter().apply(&updates, true).unwrap();
        assert_eq!(log[Utf8Path::new("x.ts")], vec!["Line 1: ./a -> ./b"]);
        assert_eq!(fx.read("x.ts"), "import a from './a';\n");
    }

    #[test]
    fn test_apply_stale_leaves_file_untouched() {
        let fx = Fixture::new(&[("x.ts", TS, "import a from './a';\nimport z from './z';\n")]);
        let updates = vec![
            ReferenceUpdate {
                file: "x.ts".into(),
                line: 1,
                column: 15,
                old: "./a".to_owned(),
                new: "./b".to_owned(),
            },
            ReferenceUpdate {
                file: "x.ts".into(),
                line: 2,
                column: 15,
                old: "./q".to_owned(),
                new: "./r".to_owned(),
            },
        ];
        let err = fx.rewriter().apply(&updates, false).unwrap_err();
        assert!(matches!(err, RewriteError::Stale { line: 2, .. }));
        assert_eq!(fx.read("x.ts"), "import a from './a';\nimport z from './z';\n");
    }

    #[test]
    fn test_apply_file_at_moved_location() {
        let fx = Fixture::new(&[("b/x.ts", TS, "import y from '../a/y';\n")]);
        let updates = vec![ReferenceUpdate {
            file: "a/x.ts".into(),
            line: 1,
            column: 15,
            old: "../a/y".to_owned(),
            new: "./y".to_owned(),
        }];
        fx.rewriter()
            .apply_file(Utf8Path::new("b/x.ts"), &updates, false)
            .unwrap();
        assert_eq!(fx.read("b/x.ts"), "import y from './y';\n");
    }

    /// Resolves `text`, written in `file`, against the post-mapping tree.
    fn resolves_after(
        fx: &Fixture,
        mapping: &PathMapping,
        file: &str,
        category: FileCategory,
        text: &str,
    ) -> Vec<Utf8PathBuf> {
        let moved = fx
            .records
            .iter()
            .map(|record| mapping.prospective(&record.path).to_owned());
        let resolver = ReferenceResolver::new(moved, ResolveConfig::default());
        resolver.resolve(Utf8Path::new(file), category, text).to_vec()
    }

    #[test]
    fn test_python_relative_round_trip() {
        let fx = Fixture::new(&[
            ("svc/routes.py", PY, "from .models import User\n"),
            ("svc/models.py", PY, ""),
        ]);
        let mapping = mapping(&[
            ("svc/routes.py", "svc/api/routes.py"),
            ("svc/models.py", "svc/db/models.py"),
        ]);
        let computed = fx.rewriter().compute_updates(&fx.records, &mapping);
        assert_eq!(pairs(&computed.updates), vec![(".models", "..db.models")]);
        assert_eq!(
            resolves_after(&fx, &mapping, "svc/api/routes.py", PY, &computed.updates[0].new),
            vec!["svc/db/models.py"]
        );
    }

    #[test]
    fn test_python_rooted_round_trip() {
        let fx = Fixture::new(&[
            ("main.py", PY, "import app.models\n"),
            ("app/models.py", PY, ""),
        ]);
        let mapping = mapping(&[("app/models.py", "backend/app/models.py")]);
        let computed = fx.rewriter().compute_updates(&fx.records, &mapping);
        assert_eq!(pairs(&computed.updates), vec![("app.models", "backend.app.models")]);
        assert_eq!(
            resolves_after(&fx, &mapping, "main.py", PY, &computed.updates[0].new),
            vec!["backend/app/models.py"]
        );
    }

    #[test]
    fn test_frontend_index_into_own_directory() {
        let fx = Fixture::new(&[
            ("app.ts", TS, "import { w } from './lib';\n"),
            ("lib/index.ts", TS, ""),
            ("web/pages/home.ts", TS, "import { w } from '../widgets';\n"),
            ("web/widgets/index.ts", TS, ""),
        ]);
        let mapping = mapping(&[
            ("lib/index.ts", "index.ts"),
            ("web/widgets/index.ts", "web/pages/index.ts"),
        ]);
        let computed = fx.rewriter().compute_updates(&fx.records, &mapping);
        assert_eq!(
            pairs(&computed.updates),
            vec![("./lib", "./index"), ("../widgets", "./index")]
        );
        assert_eq!(
            resolves_after(&fx, &mapping, "app.ts", TS, "./index"),
            vec!["index.ts"]
        );
        assert_eq!(
            resolves_after(&fx, &mapping, "web/pages/home.ts", TS, "./index"),
            vec!["web/pages/index.ts"]
        );
    }

    #[test]
    fn test_non_utf8_file_is_edited_bytewise() {
        let fx = Fixture::new(&[("web/app.ts", TS, ""), ("web/api.ts", TS, "")]);
        let original: &[u8] = b"// caf\xe9\nimport { api } from './api';\n";
        std::fs::write(fx.root.join("web/app.ts"), original).unwrap();

        let rewriter = fx.rewriter();
        let computed = rewriter
            .compute_updates(&fx.records, &mapping(&[("web/api.ts", "web/lib/api.ts")]));
        assert_eq!(pairs(&computed.updates), vec![("./api", "./lib/api")]);

        rewriter.apply(&computed.updates, false).unwrap();
        assert_eq!(
            std::fs::read(fx.root.join("web/app.ts")).unwrap(),
            b"// caf\xe9\nimport { api } from './lib/api';\n"
        );
        rewriter.revert(&computed.updates, false).unwrap();
        assert_eq!(std::fs::read(fx.root.join("web/app.ts")).unwrap(), original);
    }

    #[test]
    fn test_undecodable_bytes_before_reference_warn() {
        let fx = Fixture::new(&[("web/app.ts", TS, ""), ("web/api.ts", TS, "")]);
        std::fs::write(
            fx.root.join("web/app.ts"),
            b"import { caf\xe9 } from './api';\n",
        )
        .unwrap();

        let computed = fx
            .rewriter()
            .compute_updates(&fx.records, &mapping(&[("web/api.ts", "web/lib/api.ts")]));
        assert!(computed.updates.is_empty());
        assert_eq!(
            computed.warnings,
            vec!["web/app.ts:1: './api' left unchanged: line contains undecodable bytes"]
        );
    }
}
