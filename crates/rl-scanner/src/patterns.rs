//! Line-anchored reference and export pattern tables.
//!
//! Each [`Language`] owns one [`PatternTable`]. Tables are compiled once on
//! first use and shared for the life of the process. Every pattern is
//! applied to every line independently: multi-line statements and dynamic
//! references are out of reach by construction.
//!
//! The same tables drive classification (raw reference strings) and
//! rewriting (exact line and column of each reference), so the two can never
//! disagree about what a reference is.
//!
//! # Examples
//!
//! ```
//! use rl_core::Language;
//! use rl_scanner::PatternTable;
//!
//! let table = PatternTable::get(Language::Python).unwrap();
//! let refs = table.references("import os\nfrom .models import User\n");
//! let texts: Vec<&str> = refs.iter().map(|m| m.text.as_str()).collect();
//! assert_eq!(texts, vec!["os", ".models"]);
//! assert_eq!(refs[1].line, 2);
//! assert_eq!(refs[1].column, 5);
//! ```

use std::sync::OnceLock;

use regex::Regex;
use rl_core::Language;

const PYTHON_MODULE: &str = r"[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*";

const PYTHON_REFERENCES: &[&str] = &[
    r"^\s*import\s+([A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)",
    r"^\s*from\s+(\.+(?:[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)?|[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*)\s+import\b",
];

const PYTHON_EXPORTS: &[&str] = &[
    r"^\s*(?:async\s+)?def\s+([A-Za-z_]\w*)",
    r"^\s*class\s+([A-Za-z_]\w*)",
    r"^([A-Za-z_]\w*)\s*(?::[^=]*)?=(?:[^=]|$)",
];

const TYPESCRIPT_REFERENCES: &[&str] = &[
    r#"^\s*import\s+.*?\s+from\s+["']([^"']+)["']"#,
    r#"^\s*import\s+["']([^"']+)["']"#,
    r#"^\s*export\s+.*?\s+from\s+["']([^"']+)["']"#,
];

const JAVASCRIPT_REFERENCES: &[&str] = &[
    r#"^\s*import\s+.*?\s+from\s+["']([^"']+)["']"#,
    r#"^\s*import\s+["']([^"']+)["']"#,
    r#"^\s*export\s+.*?\s+from\s+["']([^"']+)["']"#,
    r#"^\s*(?:const|let|var)\s+.*?=\s*require\(\s*["']([^"']+)["']\s*\)"#,
];

const DECLARATION_EXPORT: &str = r"^\s*export\s+(?:default\s+)?(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?:function\*?|class|const|let|var|interface|type|enum)\s+([A-Za-z_$][\w$]*)";

const LIST_EXPORT: &str = r"^\s*export\s+(?:type\s+)?\{([^}]*)\}";

const COMMONJS_EXPORT: &str = r"^\s*(?:module\.)?exports\.([A-Za-z_$][\w$]*)\s*=";

/// A single pattern match within a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    /// 1-based line number.
    pub line: usize,
    /// Byte offset of `text` within the line.
    pub column: usize,
    /// The captured text.
    pub text: String,
}

/// How an export pattern's capture turns into names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExportShape {
    /// The capture is a single name.
    Name,
    /// The capture is a comma-separated `a, b as c` list.
    List,
}

/// The compiled reference and export patterns of one language.
#[derive(Debug)]
pub struct PatternTable {
    language: Language,
    references: Vec<Regex>,
    exports: Vec<(Regex, ExportShape)>,
}

static PYTHON: OnceLock<PatternTable> = OnceLock::new();
static TYPESCRIPT: OnceLock<PatternTable> = OnceLock::new();
static JAVASCRIPT: OnceLock<PatternTable> = OnceLock::new();

impl PatternTable {
    /// Returns the compiled table for `language`.
    ///
    /// The table is compiled once and cached for all subsequent calls.
    pub fn get(language: Language) -> Result<&'static Self, regex::Error> {
        let cell = match language {
            Language::Python => &PYTHON,
            Language::TypeScript => &TYPESCRIPT,
            Language::JavaScript => &JAVASCRIPT,
        };
        if let Some(table) = cell.get() {
            return Ok(table);
        }

        let table = Self::compile(language)?;
        Ok(cell.get_or_init(|| table))
    }

    fn compile(language: Language) -> Result<Self, regex::Error> {
        let (references, exports): (&[&str], Vec<(&str, ExportShape)>) = match language {
            Language::Python => (
                PYTHON_REFERENCES,
                PYTHON_EXPORTS
                    .iter()
                    .map(|&p| (p, ExportShape::Name))
                    .collect(),
            ),
            Language::TypeScript => (
                TYPESCRIPT_REFERENCES,
                vec![
                    (DECLARATION_EXPORT, ExportShape::Name),
                    (LIST_EXPORT, ExportShape::List),
                ],
            ),
            Language::JavaScript => (
                JAVASCRIPT_REFERENCES,
                vec![
                    (DECLARATION_EXPORT, ExportShape::Name),
                    (LIST_EXPORT, ExportShape::List),
                    (COMMONJS_EXPORT, ExportShape::Name),
                ],
            ),
        };

        Ok(Self {
            language,
            references: references
                .iter()
                .map(|p| Regex::new(p))
                .collect::<Result<_, _>>()?,
            exports: exports
                .into_iter()
                .map(|(p, shape)| Regex::new(p).map(|re| (re, shape)))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Returns the language this table belongs to.
    #[inline]
    #[must_use]
    pub const fn language(&self) -> Language {
        self.language
    }

    /// Finds every reference in `content`, in line order.
    ///
    /// Within a line, matches are ordered by column. Two patterns capturing
    /// the same span produce a single match.
    #[must_use]
    pub fn references(&self, content: &str) -> Vec<LineMatch> {
        let mut matches = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let start = matches.len();
            for regex in &self.references {
                let Some(capture) = regex.captures(line).and_then(|caps| caps.get(1)) else {
                    continue;
                };
                if matches[start..]
                    .iter()
                    .any(|m: &LineMatch| m.column == capture.start())
                {
                    continue;
                }
                matches.push(LineMatch {
                    line: index + 1,
                    column: capture.start(),
                    text: capture.as_str().to_owned(),
                });
            }
            matches[start..].sort_by_key(|m| m.column);
        }
        matches
    }

    /// Finds every exported name in `content`, in line order.
    #[must_use]
    pub fn exports(&self, content: &str) -> Vec<String> {
        let mut names = Vec::new();
        for line in content.lines() {
            for (regex, shape) in &self.exports {
                let Some(capture) = regex.captures(line).and_then(|caps| caps.get(1)) else {
                    continue;
                };
                match shape {
                    ExportShape::Name => names.push(capture.as_str().to_owned()),
                    ExportShape::List => names.extend(split_export_list(capture.as_str())),
                }
            }
        }
        names
    }
}

/// Splits `a, b as c, type D` into the names visible to importers.
fn split_export_list(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',').filter_map(|item| {
        let item = item.trim();
        let item = item.strip_prefix("type ").map_or(item, str::trim_start);
        let name = item.rsplit_once(" as ").map_or(item, |(_, alias)| alias.trim());
        (!name.is_empty()).then(|| name.to_owned())
    })
}

/// Returns `true` if `text` is a syntactically valid dotted Python module.
#[must_use]
pub fn is_python_module(text: &str) -> bool {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^{PYTHON_MODULE}$")).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(matches: &[LineMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.text.as_str()).collect()
    }

    #[test]
    fn test_all_tables_compile() {
        for language in [Language::Python, Language::TypeScript, Language::JavaScript] {
            let table = PatternTable::get(language).unwrap();
            assert_eq!(table.language(), language);
        }
    }

    #[test]
    fn test_python_references() {
        let table = PatternTable::get(Language::Python).unwrap();
        let source = "\
import os.path
from app.models import User
from . import utils
from ..core.db import session
    import json  # indented
x = 'from nowhere import thing'
";
        let refs = table.references(source);
        assert_eq!(
            texts(&refs),
            vec!["os.path", "app.models", ".", "..core.db", "json"]
        );
        assert_eq!(refs[3].line, 4);
        assert_eq!(refs[3].column, 5);
        assert_eq!(refs[4].column, 11);
    }

    #[test]
    fn test_python_exports() {
        let table = PatternTable::get(Language::Python).unwrap();
        let source = "\
MAX_SIZE = 10
TIMEOUT: int = 5
def load():
    local = 1
async def fetch():
    pass
class Store:
    pass
if MAX_SIZE == 10:
    pass
";
        assert_eq!(
            table.exports(source),
            vec!["MAX_SIZE", "TIMEOUT", "load", "fetch", "Store"]
        );
    }

    #[test]
    fn test_typescript_references() {
        let table = PatternTable::get(Language::TypeScript).unwrap();
        let source = r#"import React from 'react';
import { api } from "../lib/api";
import './styles.css';
export { Button } from './Button';
export * from "./types";
const x = require('./nope');
"#;
        let refs = table.references(source);
        assert_eq!(
            texts(&refs),
            vec!["react", "../lib/api", "./styles.css", "./Button", "./types"]
        );
        assert_eq!(refs[1].column, 21);
    }

    #[test]
    fn test_javascript_require() {
        let table = PatternTable::get(Language::JavaScript).unwrap();
        let refs = table.references("const fs = require('fs');\nlet util = require(\"./util\");\n");
        assert_eq!(texts(&refs), vec!["fs", "./util"]);
        assert_eq!(refs[1].line, 2);
    }

    #[test]
    fn test_typescript_exports() {
        let table = PatternTable::get(Language::TypeScript).unwrap();
        let source = "\
export default function App() {}
export const API_URL = '';
export interface Props {}
export type Id = string;
export enum Color { Red }
export async function load() {}
export { a, b as c, type D };
";
        assert_eq!(
            table.exports(source),
            vec!["App", "API_URL", "Props", "Id", "Color", "load", "a", "c", "D"]
        );
    }

    #[test]
    fn test_javascript_exports() {
        let table = PatternTable::get(Language::JavaScript).unwrap();
        let source = "exports.helper = () => {};\nmodule.exports.other = 1;\nexport class Widget {}\n";
        assert_eq!(table.exports(source), vec!["helper", "other", "Widget"]);
    }

    #[test]
    fn test_crlf_columns() {
        let table = PatternTable::get(Language::TypeScript).unwrap();
        let refs = table.references("import a from './a';\r\nimport b from './b';\r\n");
        assert_eq!(texts(&refs), vec!["./a", "./b"]);
        assert_eq!(refs[1].line, 2);
        assert_eq!(refs[1].column, 15);
    }

    #[test]
    fn test_is_python_module() {
        assert!(is_python_module("app.models.user"));
        assert!(!is_python_module(".models"));
        assert!(!is_python_module("app..models"));
    }
}
