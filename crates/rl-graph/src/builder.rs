//! Reference resolution and dependency graph construction.
//!
//! [`ReferenceResolver`] maps a raw reference string to the known files it
//! can denote. [`DependencyGraphBuilder`] runs it over every record and
//! collects the hits into a [`DependencyGraph`], an arena of nodes indexed
//! by path with deduplicated adjacency lists.
//!
//! Resolution is purely lexical: only paths present among the known records
//! ever become edge targets, and a reference that climbs above the root
//! resolves to nothing.

use camino::{Utf8Path, Utf8PathBuf};
use rl_core::paths::{join_normalized, parent_dir};
use rl_core::{
    FileCategory, FileRecord, FxHashMap, FxHashSet, ReferenceEdge, ResolveConfig,
    fx_hash_map_with_capacity,
};
use smallvec::SmallVec;
use tracing::{debug, trace};

/// Resolved targets of one reference; almost always zero, one or two.
pub type Targets = SmallVec<[Utf8PathBuf; 2]>;

/// Resolves raw reference text against a fixed set of known files.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use rl_core::{FileCategory, ResolveConfig};
/// use rl_graph::ReferenceResolver;
///
/// let resolver = ReferenceResolver::new(
///     ["app/models/__init__.py", "app/api.py"].map(Utf8PathBuf::from),
///     ResolveConfig::default(),
/// );
/// let targets = resolver.resolve("app/api.py".as_ref(), FileCategory::BackendSource, ".models");
/// assert_eq!(targets[0].as_str(), "app/models/__init__.py");
/// ```
#[derive(Debug, Clone)]
pub struct ReferenceResolver {
    known: FxHashSet<Utf8PathBuf>,
    config: ResolveConfig,
}

impl ReferenceResolver {
    /// Creates a resolver over the given root-relative paths.
    pub fn new(known: impl IntoIterator<Item = Utf8PathBuf>, config: ResolveConfig) -> Self {
        Self {
            known: known.into_iter().collect(),
            config,
        }
    }

    /// Creates a resolver over the paths of `records`.
    #[must_use]
    pub fn from_records(records: &[FileRecord], config: ResolveConfig) -> Self {
        Self::new(records.iter().map(|r| r.path.clone()), config)
    }

    /// Returns `true` if `path` is a known file.
    #[inline]
    #[must_use]
    pub fn is_known(&self, path: &Utf8Path) -> bool {
        self.known.contains(path)
    }

    /// Returns the resolver's configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ResolveConfig {
        &self.config
    }

    /// Resolves `raw`, written in the file `source` of the given category,
    /// to the known files it denotes.
    ///
    /// Python references may hit both a module file and a package marker;
    /// frontend references hit at most one file.
    #[must_use]
    pub fn resolve(&self, source: &Utf8Path, category: FileCategory, raw: &str) -> Targets {
        let targets = match category {
            FileCategory::BackendSource => self.resolve_python(source, raw),
            FileCategory::FrontendSource(_) if category.language().is_some() => {
                self.resolve_frontend(source, raw).into_iter().collect()
            }
            _ => Targets::new(),
        };
        if targets.is_empty() {
            trace!(source = %source, reference = raw, "unresolved reference");
        }
        targets
    }

    fn resolve_python(&self, source: &Utf8Path, raw: &str) -> Targets {
        let dots = raw.len() - raw.trim_start_matches('.').len();
        let rest = &raw[dots..];

        let base = if dots == 0 {
            Utf8PathBuf::new()
        } else {
            // One dot is the source's own package; each further dot climbs one level.
            match join_normalized(parent_dir(source), &"../".repeat(dots - 1)) {
                Some(base) => base,
                None => return Targets::new(),
            }
        };

        let mut candidates = Targets::new();
        if rest.is_empty() {
            candidates.push(base.join(&self.config.package_marker));
        } else {
            let module = base.join(rest.replace('.', "/"));
            candidates.push(module.with_extension("py"));
            candidates.push(module.join(&self.config.package_marker));
        }
        candidates.retain(|candidate| self.known.contains(candidate.as_path()));
        candidates
    }

    fn resolve_frontend(&self, source: &Utf8Path, raw: &str) -> Option<Utf8PathBuf> {
        if !raw.starts_with('.') {
            return None;
        }
        let literal = join_normalized(parent_dir(source), raw)?;
        if literal.as_str().is_empty() {
            return None;
        }

        if self.known.contains(&literal) {
            return Some(literal);
        }
        let appended = self
            .config
            .candidate_extensions
            .iter()
            .map(|ext| Utf8PathBuf::from(format!("{literal}{ext}")));
        let indexed = self
            .config
            .candidate_extensions
            .iter()
            .map(|ext| literal.join(format!("{}{ext}", self.config.index_stem)));
        appended
            .chain(indexed)
            .find(|candidate| self.known.contains(candidate))
    }
}

/// A node of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Root-relative path of the file.
    pub path: Utf8PathBuf,
    /// Category of the file.
    pub category: FileCategory,
}

/// A directed graph of file references, stored as an arena.
///
/// Node indices are assigned in insertion order and never change. Edges
/// keep their raw reference text; adjacency lists are deduplicated so
/// several references to the same file count as one graph arc.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: FxHashMap<Utf8PathBuf, usize>,
    edges: Vec<ReferenceEdge>,
    successors: Vec<SmallVec<[usize; 4]>>,
    predecessors: Vec<SmallVec<[usize; 4]>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node for `path`, returning its index. Adding a known path
    /// returns the existing index.
    pub fn add_node(&mut self, path: Utf8PathBuf, category: FileCategory) -> usize {
        if let Some(&ix) = self.index.get(&path) {
            return ix;
        }
        let ix = self.nodes.len();
        self.index.insert(path.clone(), ix);
        self.nodes.push(Node { path, category });
        self.successors.push(SmallVec::new());
        self.predecessors.push(SmallVec::new());
        ix
    }

    /// Adds an edge between two known nodes.
    ///
    /// Returns `false`, leaving the graph untouched, if either endpoint is
    /// unknown or the identical edge already exists.
    pub fn add_edge(&mut self, edge: ReferenceEdge) -> bool {
        let (Some(&from), Some(&to)) = (self.index.get(&edge.source), self.index.get(&edge.target))
        else {
            return false;
        };
        if self.edges.contains(&edge) {
            return false;
        }
        if !self.successors[from].contains(&to) {
            self.successors[from].push(to);
            self.predecessors[to].push(from);
        }
        self.edges.push(edge);
        true
    }

    /// Returns the number of nodes.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges, counting each raw reference separately.
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns all nodes in insertion order.
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns all edges in insertion order.
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[ReferenceEdge] {
        &self.edges
    }

    /// Returns the index of `path`, if it is a node.
    #[inline]
    #[must_use]
    pub fn index_of(&self, path: &Utf8Path) -> Option<usize> {
        self.index.get(path).copied()
    }

    /// Returns the node at `ix`.
    #[inline]
    #[must_use]
    pub fn node(&self, ix: usize) -> &Node {
        &self.nodes[ix]
    }

    /// Returns the distinct nodes that `ix` references.
    #[inline]
    #[must_use]
    pub fn successors(&self, ix: usize) -> &[usize] {
        &self.successors[ix]
    }

    /// Returns the distinct nodes that reference `ix`.
    #[inline]
    #[must_use]
    pub fn predecessors(&self, ix: usize) -> &[usize] {
        &self.predecessors[ix]
    }

    /// Returns the edges whose source is `path`.
    pub fn edges_from<'a>(
        &'a self,
        path: &'a Utf8Path,
    ) -> impl Iterator<Item = &'a ReferenceEdge> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.source.as_path() == path)
    }
}

/// Builds a [`DependencyGraph`] from file records.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraphBuilder {
    config: ResolveConfig,
}

impl DependencyGraphBuilder {
    /// Creates a builder with the given resolution settings.
    #[must_use]
    pub fn new(config: ResolveConfig) -> Self {
        Self { config }
    }

    /// Returns the resolver the builder would use for `records`.
    #[must_use]
    pub fn resolver(&self, records: &[FileRecord]) -> ReferenceResolver {
        ReferenceResolver::from_records(records, self.config.clone())
    }

    /// Builds the graph: one node per record, one edge per resolved
    /// reference. Unresolved references are dropped.
    #[must_use]
    pub fn build(&self, records: &[FileRecord]) -> DependencyGraph {
        let resolver = self.resolver(records);
        let mut graph = DependencyGraph {
            index: fx_hash_map_with_capacity(records.len()),
            ..DependencyGraph::default()
        };

        for record in records {
            graph.add_node(record.path.clone(), record.category);
        }

        let mut unresolved = 0usize;
        for record in records {
            for raw in &record.references {
                let targets = resolver.resolve(&record.path, record.category, raw);
                if targets.is_empty() {
                    unresolved += 1;
                }
                for target in targets {
                    graph.add_edge(ReferenceEdge::new(record.path.clone(), target, raw.as_str()));
                }
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            unresolved,
            "built dependency graph"
        );
        graph
    }
}
