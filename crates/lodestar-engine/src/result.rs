//! The resolved dependency graph produced at successful termination.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use lodestar_core::configuration::Configuration;
use lodestar_core::lock::{LockSnapshot, LockedDimension};
use lodestar_core::root::RootSpec;
use lodestar_core::source::{RevisionId, SourceId};
use lodestar_provider::RevisionHistory;

use crate::index::DimensionIndex;
use crate::validate::{Requester, ValidationResult};

/// A node in the resolved graph: one dimension pinned to one revision.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ResolvedDimension {
    pub source: SourceId,
    pub revision: RevisionId,
    pub version: Option<String>,
}

impl fmt::Display for ResolvedDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.revision.as_str().is_empty() {
            write!(f, "{}", self.source)
        } else {
            write!(f, "{}@{}", self.source, self.revision)
        }
    }
}

/// Edge label: the constraint the requester imposed.
#[derive(Debug, Clone)]
pub struct RequireEdge {
    pub constraint: String,
}

/// The final output of a successful run: a root node plus, for every active
/// dimension, the chosen revision and the requesters that constrained it.
/// Immutable once built.
#[derive(Debug)]
pub struct ResolvedGraph {
    graph: DiGraph<ResolvedDimension, RequireEdge>,
    index: HashMap<SourceId, NodeIndex>,
    root: NodeIndex,
    /// One-revision moves between the requested configuration and the
    /// accepted one, recovered from the terminal node's lineage.
    pub moves: usize,
}

impl ResolvedGraph {
    fn new(root_name: &str) -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(ResolvedDimension {
            source: SourceId::new(root_name),
            revision: RevisionId::new(""),
            version: None,
        });
        Self {
            graph,
            index: HashMap::new(),
            root,
            moves: 0,
        }
    }

    fn add_dimension(&mut self, node: ResolvedDimension) -> NodeIndex {
        let source = node.source.clone();
        if let Some(&idx) = self.index.get(&source) {
            return idx;
        }
        let idx = self.graph.add_node(node);
        self.index.insert(source, idx);
        idx
    }

    fn add_requirement(&mut self, from: NodeIndex, to: NodeIndex, constraint: String) {
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, RequireEdge { constraint });
        }
    }

    /// Look up a resolved dimension by source.
    pub fn dimension(&self, source: &SourceId) -> Option<&ResolvedDimension> {
        self.index.get(source).map(|&idx| &self.graph[idx])
    }

    /// The requesters that constrained a dimension, with their constraints.
    pub fn requesters_of(&self, source: &SourceId) -> Vec<(&ResolvedDimension, &RequireEdge)> {
        let Some(&idx) = self.index.get(source) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| (&self.graph[e.source()], e.weight()))
            .collect()
    }

    /// Number of resolved dimensions (excluding the root).
    pub fn len(&self) -> usize {
        self.graph.node_count().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the resolution as an indented tree rooted at the project.
    pub fn print_tree(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n", self.graph[self.root]));
        let mut visited = HashSet::new();
        visited.insert(self.root);
        let children = self.children_of(self.root);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(&mut output, child, "", i == count - 1, &mut visited);
        }
        output
    }

    fn children_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.target())
            .collect();
        children.sort_by(|a, b| self.graph[*a].source.cmp(&self.graph[*b].source));
        children
    }

    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        // Cycles are expected in dependency graphs; render each node's
        // subtree once per path.
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.children_of(idx);
        let count = children.len();
        for (i, child) in children.into_iter().enumerate() {
            self.print_subtree(output, child, &child_prefix, i == count - 1, visited);
        }

        visited.remove(&idx);
    }

    /// Flatten into the serializable lock-style snapshot handed to
    /// persistence. Deterministically ordered by source.
    pub fn to_lock(&self) -> LockSnapshot {
        let mut dimensions: Vec<LockedDimension> = self
            .index
            .iter()
            .map(|(source, &idx)| {
                let node = &self.graph[idx];
                let mut requesters: Vec<String> = self
                    .graph
                    .edges_directed(idx, Direction::Incoming)
                    .map(|e| {
                        if e.source() == self.root {
                            "root".to_string()
                        } else {
                            self.graph[e.source()].to_string()
                        }
                    })
                    .collect();
                requesters.sort();
                requesters.dedup();
                LockedDimension {
                    source: source.to_string(),
                    revision: node.revision.to_string(),
                    version: node.version.clone(),
                    requesters,
                }
            })
            .collect();
        dimensions.sort_by(|a, b| a.source.cmp(&b.source));
        LockSnapshot {
            root: self.graph[self.root].source.to_string(),
            dimension: dimensions,
        }
    }
}

/// Build the resolved graph for a winning configuration. Total over any
/// fully valid terminal: every satisfied check becomes a requester edge.
pub(crate) fn build<P: RevisionHistory>(
    root: &RootSpec,
    config: &Configuration,
    validation: &ValidationResult,
    index: &DimensionIndex<'_, P>,
    moves: usize,
) -> ResolvedGraph {
    let mut graph = ResolvedGraph::new(&root.name);
    graph.moves = moves;

    for (source, selected) in config.iter() {
        let version = index
            .revision(source, selected)
            .and_then(|rev| rev.version.as_ref())
            .map(|v| v.label().to_string());
        graph.add_dimension(ResolvedDimension {
            source: source.clone(),
            revision: selected.clone(),
            version,
        });
    }

    for check in &validation.satisfied {
        let Some(&to) = graph.index.get(&check.target) else {
            continue;
        };
        let from = match &check.requester {
            Requester::Root => graph.root,
            Requester::Revision { source, .. } => match graph.index.get(source) {
                Some(&idx) => idx,
                None => continue,
            },
        };
        graph.add_requirement(from, to, check.constraint.to_string());
    }

    graph
}
