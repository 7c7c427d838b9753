//! Simple undirected graphs over opaque node-id strings.
//!
//! Train and test graphs are [`SimpleGraph`]s: no parallel edges, no
//! weights. They persist as plain edge lists, one `source target` pair per
//! line.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use seffnet_core::{Error, Result};
use std::collections::{BTreeSet, HashMap};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

/// An undirected simple graph keyed by node-id strings.
///
/// Node and edge iteration follow insertion order.
#[derive(Clone, Debug, Default)]
pub struct SimpleGraph {
    graph: UnGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
}

impl SimpleGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from `(u, v)` pairs.
    pub fn from_edges<I, S>(edges: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for (u, v) in edges {
            graph.add_edge(u.as_ref(), v.as_ref());
        }
        graph
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Checks if a node exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.indices.contains_key(id)
    }

    /// Adds a node if absent.
    pub fn add_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.indices.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.indices.insert(id.to_string(), idx);
        idx
    }

    /// Adds an undirected edge (and its endpoints); a no-op if it already exists.
    pub fn add_edge(&mut self, u: &str, v: &str) {
        let a = self.add_node(u);
        let b = self.add_node(v);
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, ());
        }
    }

    /// Checks whether the undirected edge `u - v` exists.
    pub fn has_edge(&self, u: &str, v: &str) -> bool {
        match (self.indices.get(u), self.indices.get(v)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Removes the edge `u - v`, keeping both endpoints. Returns whether an
    /// edge was removed.
    pub fn remove_edge(&mut self, u: &str, v: &str) -> bool {
        let (Some(&a), Some(&b)) = (self.indices.get(u), self.indices.get(v)) else {
            return false;
        };
        match self.graph.find_edge(a, b) {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        }
    }

    /// Number of edges incident to `id` (0 for unknown nodes).
    pub fn degree(&self, id: &str) -> usize {
        self.indices
            .get(id)
            .map(|&idx| self.graph.edges(idx).count())
            .unwrap_or(0)
    }

    /// Iterates over node ids in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Iterates over edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].as_str(),
                self.graph[e.target()].as_str(),
            )
        })
    }

    /// Edges as owned pairs, for callers that mutate while walking.
    pub fn edge_list(&self) -> Vec<(String, String)> {
        self.edges()
            .map(|(u, v)| (u.to_string(), v.to_string()))
            .collect()
    }

    /// Order-independent edge set: each pair normalized to `(min, max)`.
    pub fn edge_set(&self) -> BTreeSet<(String, String)> {
        self.edges()
            .map(|(u, v)| {
                if u <= v {
                    (u.to_string(), v.to_string())
                } else {
                    (v.to_string(), u.to_string())
                }
            })
            .collect()
    }

    /// Adds every node and edge of `other`.
    pub fn extend_from(&mut self, other: &SimpleGraph) {
        for node in other.nodes() {
            self.add_node(node);
        }
        for (u, v) in other.edges() {
            self.add_edge(u, v);
        }
    }

    /// Drops nodes without incident edges.
    pub fn remove_isolates(&mut self) {
        let mut kept = SimpleGraph::new();
        for node in self.nodes() {
            if self.degree(node) > 0 {
                kept.add_node(node);
            }
        }
        for (u, v) in self.edges() {
            kept.add_edge(u, v);
        }
        *self = kept;
    }

    // ========================================================================
    // Edge-list persistence
    // ========================================================================

    /// Parses an edge list. Blank lines and `#` comments are skipped; columns
    /// past the second are ignored.
    pub fn from_edgelist_reader<R: Read>(reader: R) -> Result<Self> {
        let mut graph = Self::new();
        for (number, line) in BufReader::new(reader).lines().enumerate() {
            let line = line.map_err(|e| Error::parse(format!("line {}: {e}", number + 1)))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut columns = line.split_whitespace();
            match (columns.next(), columns.next()) {
                (Some(u), Some(v)) => graph.add_edge(u, v),
                _ => {
                    return Err(Error::parse(format!(
                        "line {}: expected 'source target', got '{line}'",
                        number + 1
                    )));
                }
            }
        }
        Ok(graph)
    }

    /// Reads an edge-list file.
    pub fn read_edgelist(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_edgelist_reader(file)
    }

    /// Writes edges as `source target` lines. Isolated nodes are not written.
    pub fn write_edges<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for (u, v) in self.edges() {
            writeln!(writer, "{u} {v}")?;
        }
        Ok(())
    }

    /// Writes an edge-list file, replacing it only once fully written.
    pub fn write_edgelist(&self, path: impl AsRef<Path>) -> Result<()> {
        seffnet_core::write_all_or_nothing(path, |w| self.write_edges(w))
    }
}

impl PartialEq for SimpleGraph {
    fn eq(&self, other: &Self) -> bool {
        let nodes: BTreeSet<&str> = self.nodes().collect();
        let other_nodes: BTreeSet<&str> = other.nodes().collect();
        nodes == other_nodes && self.edge_set() == other.edge_set()
    }
}
