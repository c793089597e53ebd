//! Reference edges between files.

use std::fmt;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// How a reference is anchored.
///
/// The kind is informational only: resolution decides by category and
/// leading dots, not by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Anchored at the referencing file's directory (`./x`, `..pkg.mod`).
    Relative,
    /// Anchored at the project root (`app.models.user`).
    Rooted,
}

impl ReferenceKind {
    /// Classifies raw reference text: relative when it begins with `.`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rl_core::ReferenceKind;
    ///
    /// assert_eq!(ReferenceKind::of("./button"), ReferenceKind::Relative);
    /// assert_eq!(ReferenceKind::of("..models"), ReferenceKind::Relative);
    /// assert_eq!(ReferenceKind::of("app.models"), ReferenceKind::Rooted);
    /// ```
    #[inline]
    #[must_use]
    pub fn of(raw: &str) -> Self {
        if raw.starts_with('.') {
            Self::Relative
        } else {
            Self::Rooted
        }
    }

    /// Returns a lowercase label for this kind.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Relative => "relative",
            Self::Rooted => "rooted",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A resolved reference from one known file to another.
///
/// Several edges may share a target, and a single source may reference the
/// same target more than once through different raw texts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceEdge {
    /// Root-relative path of the referencing file.
    pub source: Utf8PathBuf,
    /// Root-relative path of the referenced file.
    pub target: Utf8PathBuf,
    /// The reference text exactly as written in the source.
    pub raw: String,
    /// Anchoring of the raw text.
    pub kind: ReferenceKind,
}

impl ReferenceEdge {
    /// Creates an edge, deriving its kind from the raw text.
    #[must_use]
    pub fn new(source: Utf8PathBuf, target: Utf8PathBuf, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let kind = ReferenceKind::of(&raw);
        Self {
            source,
            target,
            raw,
            kind,
        }
    }

    /// Returns `true` if the edge points back at its own source.
    #[inline]
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_kind_derived() {
        let edge = ReferenceEdge::new("web/a.ts".into(), "web/b.ts".into(), "./b");
        assert_eq!(edge.kind, ReferenceKind::Relative);
        assert!(!edge.is_self_loop());

        let edge = ReferenceEdge::new("app/a.py".into(), "app/a.py".into(), "app.a");
        assert_eq!(edge.kind, ReferenceKind::Rooted);
        assert!(edge.is_self_loop());
    }

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&ReferenceKind::Relative).unwrap(),
            r#""relative""#
        );
        assert_eq!(ReferenceKind::Rooted.to_string(), "rooted");
    }
}
