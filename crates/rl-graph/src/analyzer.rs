//! Structural queries over a [`DependencyGraph`].
//!
//! [`GraphAnalyzer`] borrows a built graph and answers the questions asked
//! before and after a relocation: which files form cycles, in what order
//! files can be handled so dependencies come first, how the tree splits
//! into frontend/backend/shared clusters, and which references a proposed
//! [`PathMapping`] would break.
//!
//! All results are deterministic for a given graph: wherever a choice
//! exists, nodes are visited in path order.

use std::collections::{BTreeMap, VecDeque};

use camino::{Utf8Path, Utf8PathBuf};
use rl_core::paths::{parent_dir, relative_path};
use rl_core::{Bucket, FileRecord, FxHashMap, PathMapping, ReferenceEdge, ReferenceKind};
use serde::Serialize;
use tracing::{debug, warn};

use crate::builder::DependencyGraph;

/// Files grouped into one bucket, with the bucket's outgoing edges split by
/// whether they stay inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    /// The bucket this cluster represents.
    pub bucket: Bucket,
    /// Member files, in record order.
    pub files: Vec<Utf8PathBuf>,
    /// Edges whose source and target are both members.
    pub internal: Vec<ReferenceEdge>,
    /// Edges whose source is a member and whose target is not.
    pub external: Vec<ReferenceEdge>,
}

/// Advisory findings for a proposed relocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelocationReport {
    /// Relative references whose text would have to change although their
    /// target stays put.
    pub broken_dependencies: Vec<ReferenceEdge>,
    /// Every cycle of the graph, as `a -> b -> a` listings.
    pub circular_dependencies: Vec<String>,
    /// References crossing between frontend and backend sources.
    pub cross_boundary_dependencies: Vec<ReferenceEdge>,
    /// Problems with the mapping itself.
    pub warnings: Vec<String>,
}

impl RelocationReport {
    /// Returns `true` if no bucket has any entries.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.broken_dependencies.is_empty()
            && self.circular_dependencies.is_empty()
            && self.cross_boundary_dependencies.is_empty()
            && self.warnings.is_empty()
    }
}

/// Summary figures for a graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStatistics {
    /// Number of files.
    pub total_files: usize,
    /// Number of edges, counting every distinct raw reference.
    pub total_edges: usize,
    /// Number of elementary cycles, counted up to [`CYCLE_COUNT_LIMIT`].
    pub cycle_count: usize,
    /// Number of strongly connected components, singletons included.
    pub strongly_connected_components: usize,
    /// Number of weakly connected components.
    pub weakly_connected_components: usize,
    /// File count per category label.
    pub category_distribution: BTreeMap<String, usize>,
    /// Edge count per reference kind label.
    pub edge_kind_distribution: BTreeMap<String, usize>,
    /// Mean number of distinct files each file references.
    pub average_out_degree: f64,
    /// Largest number of distinct files a single file references.
    pub max_out_degree: usize,
    /// Files that reference nothing.
    pub isolated_files: usize,
}

/// Upper bound on the cycles [`GraphAnalyzer::statistics`] counts.
pub const CYCLE_COUNT_LIMIT: usize = 10_000;

struct TarjanData {
    index: usize,
    indices: Vec<Option<usize>>,
    lowlinks: Vec<usize>,
    stack: Vec<usize>,
    on_stack: Vec<bool>,
    sccs: Vec<Vec<usize>>,
}

impl TarjanData {
    fn visit(&mut self, node: usize) {
        self.indices[node] = Some(self.index);
        self.lowlinks[node] = self.index;
        self.index += 1;
        self.stack.push(node);
        self.on_stack[node] = true;
    }
}

/// Read-only analysis of a dependency graph.
#[derive(Debug)]
pub struct GraphAnalyzer<'g> {
    graph: &'g DependencyGraph,
    /// Position of each node in path order.
    rank: Vec<usize>,
    /// Node indices in path order.
    by_path: Vec<usize>,
    /// Successor lists sorted by rank.
    sorted_successors: Vec<Vec<usize>>,
}

impl<'g> GraphAnalyzer<'g> {
    /// Creates an analyzer over `graph`.
    #[must_use]
    pub fn new(graph: &'g DependencyGraph) -> Self {
        let n = graph.node_count();
        let mut by_path: Vec<usize> = (0..n).collect();
        by_path.sort_by(|&a, &b| graph.node(a).path.cmp(&graph.node(b).path));

        let mut rank = vec![0; n];
        for (position, &ix) in by_path.iter().enumerate() {
            rank[ix] = position;
        }

        let sorted_successors = (0..n)
            .map(|ix| {
                let mut next = graph.successors(ix).to_vec();
                next.sort_by_key(|&w| rank[w]);
                next
            })
            .collect();

        Self {
            graph,
            rank,
            by_path,
            sorted_successors,
        }
    }

    /// Returns the analyzed graph.
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &'g DependencyGraph {
        self.graph
    }

    fn path(&self, ix: usize) -> &'g Utf8PathBuf {
        &self.graph.node(ix).path
    }

    fn paths(&self, indices: &[usize]) -> Vec<Utf8PathBuf> {
        indices.iter().map(|&ix| self.path(ix).clone()).collect()
    }

    fn scc_indices(&self) -> Vec<Vec<usize>> {
        let n = self.graph.node_count();
        let mut data = TarjanData {
            index: 0,
            indices: vec![None; n],
            lowlinks: vec![0; n],
            stack: Vec::new(),
            on_stack: vec![false; n],
            sccs: Vec::new(),
        };
        for &node in &self.by_path {
            if data.indices[node].is_none() {
                self.strongconnect(node, &mut data);
            }
        }
        data.sccs
    }

    /// Tarjan's algorithm from `root`, iterating over an explicit frame
    /// stack.
    fn strongconnect(&self, root: usize, data: &mut TarjanData) {
        data.visit(root);
        // (node, position of its next successor to examine)
        let mut frames: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some(frame) = frames.last_mut() {
            let (node, next) = *frame;
            if let Some(&w) = self.sorted_successors[node].get(next) {
                frame.1 += 1;
                match data.indices[w] {
                    None => {
                        data.visit(w);
                        frames.push((w, 0));
                    }
                    Some(w_index) if data.on_stack[w] => {
                        data.lowlinks[node] = data.lowlinks[node].min(w_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                data.lowlinks[parent] = data.lowlinks[parent].min(data.lowlinks[node]);
            }

            if data.indices[node] == Some(data.lowlinks[node]) {
                let mut scc = Vec::new();
                while let Some(w) = data.stack.pop() {
                    data.on_stack[w] = false;
                    scc.push(w);
                    if w == node {
                        break;
                    }
                }
                scc.sort_by_key(|&ix| self.rank[ix]);
                data.sccs.push(scc);
            }
        }
    }

    /// Returns the strongly connected components, singletons included.
    ///
    /// Members of each component are in path order; components appear in
    /// the order Tarjan's algorithm completes them, so a component comes
    /// before every component that references it.
    #[must_use]
    pub fn strongly_connected_components(&self) -> Vec<Vec<Utf8PathBuf>> {
        self.scc_indices()
            .iter()
            .map(|scc| self.paths(scc))
            .collect()
    }

    /// Returns the weakly connected components, ignoring edge direction.
    ///
    /// Components are ordered by their smallest path; members are in path
    /// order.
    #[must_use]
    pub fn weakly_connected_components(&self) -> Vec<Vec<Utf8PathBuf>> {
        fn find(parent: &mut [usize], mut x: usize) -> usize {
            while parent[x] != x {
                parent[x] = parent[parent[x]];
                x = parent[x];
            }
            x
        }

        let n = self.graph.node_count();
        let mut parent: Vec<usize> = (0..n).collect();

        for node in 0..n {
            for &w in self.graph.successors(node) {
                let (a, b) = (find(&mut parent, node), find(&mut parent, w));
                if a != b {
                    parent[a] = b;
                }
            }
        }

        let mut slots: FxHashMap<usize, usize> = FxHashMap::default();
        let mut components: Vec<Vec<Utf8PathBuf>> = Vec::new();
        for &node in &self.by_path {
            let root = find(&mut parent, node);
            let slot = *slots.entry(root).or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[slot].push(self.path(node).clone());
        }
        components
    }

    /// Enumerates every elementary cycle.
    ///
    /// Each cycle is reported once, starting at its smallest path, without
    /// repeating the first node at the end. A file referencing itself is a
    /// cycle of length one. Cycles are ordered by starting node, then by
    /// the path order of their successors.
    #[must_use]
    pub fn find_cycles(&self) -> Vec<Vec<Utf8PathBuf>> {
        let cycles: Vec<Vec<Utf8PathBuf>> = self
            .cycle_indices(usize::MAX)
            .iter()
            .map(|cycle| self.paths(cycle))
            .collect();
        debug!(cycles = cycles.len(), "enumerated cycles");
        cycles
    }

    /// Enumerates at most `limit` elementary cycles as node indices, in
    /// [`find_cycles`](Self::find_cycles) order.
    fn cycle_indices(&self, limit: usize) -> Vec<Vec<usize>> {
        let n = self.graph.node_count();
        let mut component = vec![0; n];
        for (id, scc) in self.scc_indices().iter().enumerate() {
            for &ix in scc {
                component[ix] = id;
            }
        }

        let mut cycles = Vec::new();
        let mut on_path = vec![false; n];
        for &start in &self.by_path {
            // path[k] is examining its cursors[k]-th successor.
            let mut path = vec![start];
            let mut cursors = vec![0];
            on_path[start] = true;

            while let (Some(&node), Some(cursor)) = (path.last(), cursors.last_mut()) {
                let Some(&w) = self.sorted_successors[node].get(*cursor) else {
                    on_path[node] = false;
                    path.pop();
                    cursors.pop();
                    continue;
                };
                *cursor += 1;

                if w == start {
                    cycles.push(path.clone());
                    if cycles.len() >= limit {
                        return cycles;
                    }
                    continue;
                }
                // Only nodes ranked above the start, so each cycle is found from its smallest member.
                if on_path[w] || component[w] != component[start] || self.rank[w] < self.rank[start] {
                    continue;
                }
                path.push(w);
                cursors.push(0);
                on_path[w] = true;
            }
        }
        cycles
    }

    /// Returns `true` if the graph has no cycle.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        self.kahn().is_some()
    }

    fn kahn(&self) -> Option<Vec<usize>> {
        let n = self.graph.node_count();
        let mut remaining: Vec<usize> = (0..n).map(|ix| self.graph.successors(ix).len()).collect();
        let mut queue: VecDeque<usize> = (0..n).filter(|&ix| remaining[ix] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &pred in self.graph.predecessors(node) {
                remaining[pred] -= 1;
                if remaining[pred] == 0 {
                    queue.push_back(pred);
                }
            }
        }

        (order.len() == n).then_some(order)
    }

    /// Orders files so that every referenced file precedes the files
    /// referencing it.
    ///
    /// When the graph has a cycle no such order exists, and every file is
    /// returned in insertion order instead.
    #[must_use]
    pub fn topological_order(&self) -> Vec<Utf8PathBuf> {
        if let Some(order) = self.kahn() {
            return self.paths(&order);
        }
        warn!("graph has cycles, falling back to insertion order");
        self.graph.nodes().iter().map(|node| node.path.clone()).collect()
    }

    /// Partitions `records` by bucket and splits each bucket's outgoing
    /// edges into internal and external ones.
    ///
    /// Buckets without files are omitted.
    #[must_use]
    pub fn cluster(&self, records: &[FileRecord]) -> Vec<Cluster> {
        let bucket_of: FxHashMap<&Utf8Path, Bucket> = records
            .iter()
            .map(|record| (record.path.as_path(), record.category.bucket()))
            .collect();

        [Bucket::Frontend, Bucket::Backend, Bucket::Shared]
            .into_iter()
            .filter_map(|bucket| {
                let files: Vec<Utf8PathBuf> = records
                    .iter()
                    .filter(|record| record.category.bucket() == bucket)
                    .map(|record| record.path.clone())
                    .collect();
                if files.is_empty() {
                    return None;
                }

                let (internal, external): (Vec<_>, Vec<_>) = self
                    .graph
                    .edges()
                    .iter()
                    .filter(|edge| bucket_of.get(edge.source.as_path()) == Some(&bucket))
                    .cloned()
                    .partition(|edge| bucket_of.get(edge.target.as_path()) == Some(&bucket));

                Some(Cluster {
                    bucket,
                    files,
                    internal,
                    external,
                })
            })
            .collect()
    }

    /// Checks what relocating files according to `mapping` would do to the
    /// graph's references. Nothing is modified.
    #[must_use]
    pub fn validate_relocation(&self, mapping: &PathMapping) -> RelocationReport {
        let mut report = RelocationReport::default();

        for edge in self.graph.edges() {
            if edge.kind == ReferenceKind::Relative
                && !mapping.moves(&edge.target)
                && mapping.moves(&edge.source)
            {
                let new_source = mapping.prospective(&edge.source);
                let before = relative_path(parent_dir(&edge.source), &edge.target);
                let after = relative_path(parent_dir(new_source), &edge.target);
                if before != after {
                    report.broken_dependencies.push(edge.clone());
                }
            }

            let (Some(from), Some(to)) = (
                self.graph.index_of(&edge.source),
                self.graph.index_of(&edge.target),
            ) else {
                continue;
            };
            let (from, to) = (self.graph.node(from).category, self.graph.node(to).category);
            if (from.is_frontend_source() && to.is_backend_source())
                || (from.is_backend_source() && to.is_frontend_source())
            {
                report.cross_boundary_dependencies.push(edge.clone());
            }
        }

        report.circular_dependencies = self
            .find_cycles()
            .iter()
            .map(|cycle| format_cycle(cycle))
            .collect();

        report.warnings = self.mapping_warnings(mapping);
        report
    }

    fn mapping_warnings(&self, mapping: &PathMapping) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut claimed: BTreeMap<&Utf8Path, &Utf8Path> = BTreeMap::new();

        for (old, entry) in mapping.iter() {
            let new = entry.new_path.as_path();
            if self.graph.index_of(old).is_none() {
                warnings.push(format!("mapping entry '{old}' does not match any known file"));
            }
            if new == old {
                warnings.push(format!("'{old}' is mapped to itself"));
                continue;
            }
            if let Some(first) = claimed.get(new) {
                warnings.push(format!("'{first}' and '{old}' are both mapped to '{new}'"));
            } else {
                claimed.insert(new, old);
            }
            if mapping.moves(new) {
                warnings.push(format!(
                    "'{old}' is mapped onto '{new}', which is itself relocated; '{new}' will be moved away first"
                ));
            } else if self.graph.index_of(new).is_some() {
                warnings.push(format!(
                    "'{new}' already exists and is not being moved; moving '{old}' would overwrite it"
                ));
            }
        }
        warnings
    }

    /// Computes summary figures for the graph.
    #[must_use]
    pub fn statistics(&self) -> GraphStatistics {
        let graph = self.graph;
        let n = graph.node_count();

        let mut category_distribution = BTreeMap::new();
        for node in graph.nodes() {
            *category_distribution
                .entry(node.category.label().to_owned())
                .or_insert(0) += 1;
        }
        let mut edge_kind_distribution = BTreeMap::new();
        for edge in graph.edges() {
            *edge_kind_distribution
                .entry(edge.kind.label().to_owned())
                .or_insert(0) += 1;
        }

        let degrees: Vec<usize> = (0..n).map(|ix| graph.successors(ix).len()).collect();
        let arcs: usize = degrees.iter().sum();
        #[allow(clippy::cast_precision_loss)]
        let average_out_degree = if n == 0 { 0.0 } else { arcs as f64 / n as f64 };

        GraphStatistics {
            total_files: n,
            total_edges: graph.edge_count(),
            cycle_count: self.cycle_indices(CYCLE_COUNT_LIMIT).len(),
            strongly_connected_components: self.scc_indices().len(),
            weakly_connected_components: self.weakly_connected_components().len(),
            category_distribution,
            edge_kind_distribution,
            average_out_degree,
            max_out_degree: degrees.iter().copied().max().unwrap_or(0),
            isolated_files: degrees.iter().filter(|&&d| d == 0).count(),
        }
    }
}

/// Formats a cycle as `a -> b -> a`.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use rl_graph::format_cycle;
///
/// let cycle = vec![Utf8PathBuf::from("a.ts"), Utf8PathBuf::from("b.ts")];
/// assert_eq!(format_cycle(&cycle), "a.ts -> b.ts -> a.ts");
/// ```
#[must_use]
pub fn format_cycle(cycle: &[Utf8PathBuf]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(|p| p.as_str()).collect();
    if let Some(&first) = parts.first() {
        parts.push(first);
    }
    parts.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DependencyGraphBuilder;
    use rl_core::{FileCategory, FrontendVariant, ResolveConfig};

    const TS: FileCategory = FileCategory::FrontendSource(FrontendVariant::TypeScript);
    const PY: FileCategory = FileCategory::BackendSource;

    fn record(path: &str, category: FileCategory, references: &[&str]) -> FileRecord {
        FileRecord {
            references: references.iter().map(|&r| r.to_owned()).collect(),
            ..FileRecord::new(path.into(), category)
        }
    }

    fn build(records: &[FileRecord]) -> DependencyGraph {
        DependencyGraphBuilder::new(ResolveConfig::default()).build(records)
    }

    fn strs(paths: &[Utf8PathBuf]) -> Vec<&str> {
        paths.iter().map(|p| p.as_str()).collect()
    }

    /// a -> b -> c -> a, c -> d, e -> e
    fn cyclic() -> Vec<FileRecord> {
        vec![
            record("a.ts", TS, &["./b"]),
            record("b.ts", TS, &["./c"]),
            record("c.ts", TS, &["./a", "./d"]),
            record("d.ts", TS, &[]),
            record("e.ts", TS, &["./e"]),
        ]
    }

    #[test]
    fn test_scc_and_wcc() {
        let graph = build(&cyclic());
        let analyzer = GraphAnalyzer::new(&graph);

        let mut sccs = analyzer.strongly_connected_components();
        sccs.sort();
        let sccs: Vec<Vec<&str>> = sccs.iter().map(|c| strs(c)).collect();
        assert_eq!(
            sccs,
            vec![vec!["a.ts", "b.ts", "c.ts"], vec!["d.ts"], vec!["e.ts"]]
        );

        let wccs = analyzer.weakly_connected_components();
        let wccs: Vec<Vec<&str>> = wccs.iter().map(|c| strs(c)).collect();
        assert_eq!(wccs, vec![vec!["a.ts", "b.ts", "c.ts", "d.ts"], vec!["e.ts"]]);
    }

    #[test]
    fn test_find_cycles_once_each() {
        let records = vec![
            record("a.ts", TS, &["./b", "./c"]),
            record("b.ts", TS, &["./a"]),
            record("c.ts", TS, &["./a", "./b"]),
            record("d.ts", TS, &["./d"]),
        ];
        let graph = build(&records);
        let cycles = GraphAnalyzer::new(&graph).find_cycles();
        let cycles: Vec<String> = cycles.iter().map(|c| format_cycle(c)).collect();
        assert_eq!(
            cycles,
            vec![
                "a.ts -> b.ts -> a.ts",
                "a.ts -> c.ts -> a.ts",
                "a.ts -> c.ts -> b.ts -> a.ts",
                "d.ts -> d.ts",
            ]
        );
    }

    #[test]
    fn test_find_cycles_mutual_reference() {
        let records = vec![
            record("x.ts", TS, &["./y"]),
            record("y.ts", TS, &["./x"]),
        ];
        let graph = build(&records);
        let cycles = GraphAnalyzer::new(&graph).find_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(strs(&cycles[0]), vec!["x.ts", "y.ts"]);
    }

    #[test]
    fn test_validate_relocation_flags_cross_boundary() {
        let records = vec![
            record("web/api.ts", TS, &["../server.py", "./util"]),
            record("web/util.ts", TS, &[]),
            record("server.py", PY, &[]),
        ];
        let graph = build(&records);
        let report = GraphAnalyzer::new(&graph).validate_relocation(&PathMapping::new());

        let flagged: Vec<(&str, &str)> = report
            .cross_boundary_dependencies
            .iter()
            .map(|edge| (edge.source.as_str(), edge.target.as_str()))
            .collect();
        assert_eq!(flagged, vec![("web/api.ts", "server.py")]);
        assert!(report.broken_dependencies.is_empty());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_find_cycles_empty_for_dag() {
        let records = vec![record("a.ts", TS, &["./b"]), record("b.ts", TS, &[])];
        let graph = build(&records);
        assert!(GraphAnalyzer::new(&graph).find_cycles().is_empty());
    }

    #[test]
    fn test_topological_order_dependencies_first() {
        let records = vec![
            record("app/main.py", PY, &["app.service"]),
            record("app/service.py", PY, &["app.db"]),
            record("app/db.py", PY, &[]),
            record("app/cli.py", PY, &["app.db"]),
        ];
        let graph = build(&records);
        let analyzer = GraphAnalyzer::new(&graph);
        assert!(analyzer.is_acyclic());

        let order = analyzer.topological_order();
        let position = |p: &str| order.iter().position(|o| o == p).unwrap();
        for edge in graph.edges() {
            assert!(position(edge.target.as_str()) < position(edge.source.as_str()));
        }
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_topological_order_falls_back_with_cycles() {
        let graph = build(&cyclic());
        let analyzer = GraphAnalyzer::new(&graph);
        assert!(!analyzer.is_acyclic());
        assert_eq!(
            strs(&analyzer.topological_order()),
            vec!["a.ts", "b.ts", "c.ts", "d.ts", "e.ts"]
        );
    }

    #[test]
    fn test_cluster() {
        let records = vec![
            record("web/a.ts", TS, &["./b", "../README.md"]),
            record("web/b.ts", TS, &[]),
            record("app/main.py", PY, &[]),
            record("README.md", FileCategory::Documentation, &[]),
        ];
        let graph = build(&records);
        let clusters = GraphAnalyzer::new(&graph).cluster(&records);

        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].bucket, Bucket::Frontend);
        assert_eq!(strs(&clusters[0].files), vec!["web/a.ts", "web/b.ts"]);
        assert_eq!(clusters[0].internal.len(), 1);
        assert_eq!(clusters[0].external.len(), 1);
        assert_eq!(clusters[0].external[0].target.as_str(), "README.md");
        assert_eq!(clusters[1].bucket, Bucket::Backend);
        assert_eq!(clusters[2].bucket, Bucket::Shared);
        assert!(clusters[2].internal.is_empty());
    }

    #[test]
    fn test_validate_relocation_broken_and_warnings() {
        let records = vec![
            record("src/pages/home.ts", TS, &["../lib/api"]),
            record("src/lib/api.ts", TS, &[]),
            record("src/lib/util.ts", TS, &[]),
            record("src/other.ts", TS, &[]),
        ];
        let graph = build(&records);
        let mut mapping = PathMapping::new();
        mapping
            .insert(Utf8Path::new("src/pages/home.ts"), Utf8Path::new("frontend/pages/home.ts"), TS)
            .unwrap();
        mapping
            .insert(Utf8Path::new("src/ghost.ts"), Utf8Path::new("frontend/ghost.ts"), TS)
            .unwrap();
        mapping
            .insert(Utf8Path::new("src/other.ts"), Utf8Path::new("src/lib/util.ts"), TS)
            .unwrap();
        mapping
            .insert(Utf8Path::new("src/lib/api.ts"), Utf8Path::new("src/lib/api.ts"), TS)
            .unwrap();

        let report = GraphAnalyzer::new(&graph).validate_relocation(&mapping);
        assert_eq!(report.broken_dependencies.len(), 1);
        assert_eq!(report.broken_dependencies[0].raw, "../lib/api");
        assert!(report.circular_dependencies.is_empty());
        assert!(report.cross_boundary_dependencies.is_empty());
        assert!(!report.is_clean());

        insta::assert_json_snapshot!(report.warnings, @r#"
        [
          "mapping entry 'src/ghost.ts' does not match any known file",
          "'src/lib/api.ts' is mapped to itself",
          "'src/lib/util.ts' already exists and is not being moved; moving 'src/other.ts' would overwrite it"
        ]
        "#);
    }

    #[test]
    fn test_validate_relocation_duplicate_targets() {
        let records = vec![record("a.py", PY, &[]), record("b.py", PY, &[])];
        let graph = build(&records);
        let mut mapping = PathMapping::new();
        mapping.insert(Utf8Path::new("a.py"), Utf8Path::new("app/x.py"), PY).unwrap();
        mapping.insert(Utf8Path::new("b.py"), Utf8Path::new("app/x.py"), PY).unwrap();

        let report = GraphAnalyzer::new(&graph).validate_relocation(&mapping);
        assert_eq!(
            report.warnings,
            vec!["'a.py' and 'b.py' are both mapped to 'app/x.py'"]
        );
    }

    #[test]
    fn test_validate_relocation_warns_on_chained_moves() {
        let records = vec![record("a.ts", TS, &[]), record("b.ts", TS, &[])];
        let graph = build(&records);
        let mut mapping = PathMapping::new();
        mapping.insert(Utf8Path::new("a.ts"), Utf8Path::new("b.ts"), TS).unwrap();
        mapping.insert(Utf8Path::new("b.ts"), Utf8Path::new("a.ts"), TS).unwrap();

        let report = GraphAnalyzer::new(&graph).validate_relocation(&mapping);
        insta::assert_json_snapshot!(report.warnings, @r#"
        [
          "'a.ts' is mapped onto 'b.ts', which is itself relocated; 'b.ts' will be moved away first",
          "'b.ts' is mapped onto 'a.ts', which is itself relocated; 'a.ts' will be moved away first"
        ]
        "#);
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let count = 20_000;
        let records: Vec<FileRecord> = (0..count)
            .map(|i| {
                let next = format!("./f{:05}", i + 1);
                let refs: Vec<&str> = if i + 1 < count { vec![next.as_str()] } else { Vec::new() };
                record(&format!("f{i:05}.ts"), TS, &refs)
            })
            .collect();
        let graph = build(&records);
        let analyzer = GraphAnalyzer::new(&graph);

        assert_eq!(analyzer.strongly_connected_components().len(), count);
        assert!(analyzer.find_cycles().is_empty());
        assert_eq!(analyzer.statistics().cycle_count, 0);
        let order = analyzer.topological_order();
        assert_eq!(order.first().map(|p| p.as_str()), Some("f19999.ts"));
    }

    #[test]
    fn test_validate_relocation_clean_when_moving_together() {
        let records = vec![
            record("src/a.ts", TS, &["./b"]),
            record("src/b.ts", TS, &[]),
        ];
        let graph = build(&records);
        let mut mapping = PathMapping::new();
        mapping.insert(Utf8Path::new("src/a.ts"), Utf8Path::new("web/a.ts"), TS).unwrap();
        mapping.insert(Utf8Path::new("src/b.ts"), Utf8Path::new("web/b.ts"), TS).unwrap();

        let report = GraphAnalyzer::new(&graph).validate_relocation(&mapping);
        assert!(report.is_clean());
    }

    #[test]
    fn test_statistics() {
        let graph = build(&cyclic());
        let stats = GraphAnalyzer::new(&graph).statistics();

        assert_eq!(stats.total_files, 5);
        assert_eq!(stats.total_edges, 5);
        assert_eq!(stats.cycle_count, 2);
        assert_eq!(stats.strongly_connected_components, 3);
        assert_eq!(stats.weakly_connected_components, 2);
        assert_eq!(stats.category_distribution["frontend_typescript"], 5);
        assert_eq!(stats.edge_kind_distribution["relative"], 5);
        assert!((stats.average_out_degree - 1.0).abs() < f64::EPSILON);
        assert_eq!(stats.max_out_degree, 2);
        assert_eq!(stats.isolated_files, 1);
    }

    #[test]
    fn test_statistics_empty_graph() {
        let graph = DependencyGraph::new();
        let stats = GraphAnalyzer::new(&graph).statistics();
        assert_eq!(stats.total_files, 0);
        assert!(stats.average_out_degree.abs() < f64::EPSILON);
        assert_eq!(stats.max_out_degree, 0);
    }
}
