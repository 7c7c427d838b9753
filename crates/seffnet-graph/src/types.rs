//! Core graph types for biomedical knowledge graphs.
//!
//! Nodes are immutable `(namespace, identifier, name)` value objects whose
//! identity is decided by [`NodeKey`]. The full graph is a directed
//! multigraph whose edges carry a similarity `weight` in `[0, 1]`.

use petgraph::graph::{DiGraph, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use seffnet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Namespace string for PubChem compounds (chemicals).
pub const PUBCHEM_COMPOUND: &str = "pubchem.compound";
/// Namespace string for UMLS concepts (phenotypes).
pub const UMLS: &str = "umls";
/// Namespace string for UniProt entries (proteins).
pub const UNIPROT: &str = "uniprot";

// ============================================================================
// Namespace enum
// ============================================================================

/// Namespace of a graph node.
///
/// The three namespaces the pipeline reasons about are first-class variants;
/// anything else is carried verbatim in `Other(String)`.
///
/// # Example
///
/// ```rust
/// use seffnet_graph::Namespace;
///
/// assert_eq!(Namespace::from("pubchem.compound"), Namespace::PubchemCompound);
/// assert_eq!(Namespace::from("hgnc").as_str(), "hgnc");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Namespace {
    /// `pubchem.compound`
    PubchemCompound,
    /// `umls`
    Umls,
    /// `uniprot`
    Uniprot,
    /// Any other namespace.
    Other(String),
}

impl Namespace {
    /// Returns the namespace as it appears in input files.
    pub fn as_str(&self) -> &str {
        match self {
            Self::PubchemCompound => PUBCHEM_COMPOUND,
            Self::Umls => UMLS,
            Self::Uniprot => UNIPROT,
            Self::Other(name) => name,
        }
    }

    /// Whether nodes in this namespace are chemicals.
    pub fn is_chemical(&self) -> bool {
        matches!(self, Self::PubchemCompound)
    }
}

impl From<&str> for Namespace {
    fn from(s: &str) -> Self {
        match s {
            PUBCHEM_COMPOUND => Self::PubchemCompound,
            UMLS => Self::Umls,
            UNIPROT => Self::Uniprot,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Namespace {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Namespace> for String {
    fn from(ns: Namespace) -> Self {
        ns.as_str().to_string()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// NodeKey
// ============================================================================

/// Identity of a node: its namespace plus the one field that namespace is
/// keyed by.
///
/// Chemicals and proteins are keyed by identifier (falling back to name);
/// UMLS phenotypes are keyed by name (falling back to identifier).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    /// Namespace of the node.
    pub namespace: Namespace,
    /// Identifier or name, depending on the namespace convention.
    pub value: Option<String>,
}

impl NodeKey {
    /// Creates a key from a namespace and key value.
    pub fn new(namespace: impl Into<Namespace>, value: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            value: Some(value.into()),
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}:{}", self.namespace, value),
            None => write!(f, "{}:?", self.namespace),
        }
    }
}

// ============================================================================
// Node struct
// ============================================================================

/// A biological or chemical entity in the knowledge graph.
///
/// Equality and hashing go through [`Node::key`], so a chemical known only
/// by identifier equals the same chemical carrying a name as well.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    /// Namespace (e.g. `pubchem.compound`, `umls`, `uniprot`).
    pub namespace: Namespace,
    /// Stable external identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Human-readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Node {
    /// Creates a node with neither identifier nor name.
    pub fn new(namespace: impl Into<Namespace>) -> Self {
        Self {
            namespace: namespace.into(),
            identifier: None,
            name: None,
        }
    }

    /// A PubChem compound keyed by identifier.
    pub fn chemical(identifier: impl Into<String>) -> Self {
        Self::new(Namespace::PubchemCompound).with_identifier(identifier)
    }

    /// A UniProt protein.
    pub fn protein(name: Option<String>, identifier: Option<String>) -> Self {
        Self {
            namespace: Namespace::Uniprot,
            identifier,
            name,
        }
    }

    /// A UMLS phenotype.
    pub fn phenotype(name: Option<String>, identifier: Option<String>) -> Self {
        Self {
            namespace: Namespace::Umls,
            identifier,
            name,
        }
    }

    /// Sets the identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The identity key of this node.
    pub fn key(&self) -> NodeKey {
        let value = match self.namespace {
            Namespace::Umls => self.name.as_ref().or(self.identifier.as_ref()),
            _ => self.identifier.as_ref().or(self.name.as_ref()),
        };
        NodeKey {
            namespace: self.namespace.clone(),
            value: value.cloned(),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key().fmt(f)
    }
}

// ============================================================================
// EdgeData struct
// ============================================================================

/// Attributes of one (possibly parallel) edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Multigraph edge key; keyed edges between the same ordered pair replace
    /// each other, keyless edges are always parallel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Similarity in `[0, 1]` in the source graph.
    pub weight: f64,
}

impl EdgeData {
    /// Creates keyless edge data with the given weight.
    pub fn new(weight: f64) -> Self {
        Self { key: None, weight }
    }

    /// Sets the multigraph key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

fn check_weight(from: &Node, to: &Node, data: &EdgeData) -> Result<()> {
    if (0.0..=1.0).contains(&data.weight) {
        Ok(())
    } else {
        Err(Error::InvalidWeight {
            from: from.to_string(),
            to: to.to_string(),
            weight: data.weight,
        })
    }
}

// ============================================================================
// KnowledgeGraph struct
// ============================================================================

/// Directed multigraph of biomedical entities.
///
/// Wraps a petgraph `DiGraph` with a key → index lookup table.
#[derive(Clone, Debug, Default)]
pub struct KnowledgeGraph {
    /// The underlying directed multigraph.
    pub graph: DiGraph<Node, EdgeData>,
    /// Lookup table: node key → petgraph NodeIndex.
    pub node_indices: HashMap<NodeKey, NodeIndex>,
}

impl KnowledgeGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges (parallel edges counted separately).
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Gets the petgraph NodeIndex for a node.
    pub fn get_index(&self, node: &Node) -> Option<NodeIndex> {
        self.node_indices.get(&node.key()).copied()
    }

    /// Checks if a node exists.
    pub fn contains_node(&self, node: &Node) -> bool {
        self.node_indices.contains_key(&node.key())
    }

    /// Iterates over nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Iterates over `(source, target, data)` for every edge in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&Node, &Node, &EdgeData)> {
        self.graph
            .edge_references()
            .map(|e| (&self.graph[e.source()], &self.graph[e.target()], e.weight()))
    }

    /// Adds a node, returning the existing index if an equal node is present.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        let key = node.key();
        if let Some(&existing) = self.node_indices.get(&key) {
            return existing;
        }
        let idx = self.graph.add_node(node);
        self.node_indices.insert(key, idx);
        idx
    }

    /// Adds an edge between two nodes that must already exist.
    ///
    /// A keyed edge replaces an existing edge with the same key between the
    /// same ordered pair. Weights outside `[0, 1]` fail with `InvalidWeight`.
    pub fn add_edge(&mut self, from: &Node, to: &Node, data: EdgeData) -> Result<()> {
        let from_idx = self
            .get_index(from)
            .ok_or_else(|| Error::node_not_found(from))?;
        let to_idx = self.get_index(to).ok_or_else(|| Error::node_not_found(to))?;
        check_weight(from, to, &data)?;
        self.add_edge_by_index(from_idx, to_idx, data);
        Ok(())
    }

    /// Adds an edge, creating either endpoint if needed. Nothing is added
    /// when the weight is rejected.
    pub fn add_edge_with_nodes(&mut self, from: Node, to: Node, data: EdgeData) -> Result<()> {
        check_weight(&from, &to, &data)?;
        let from_idx = self.add_node(from);
        let to_idx = self.add_node(to);
        self.add_edge_by_index(from_idx, to_idx, data);
        Ok(())
    }

    fn add_edge_by_index(&mut self, from: NodeIndex, to: NodeIndex, data: EdgeData) {
        if data.key.is_some() {
            let existing = self
                .graph
                .edges_connecting(from, to)
                .find(|e| e.weight().key == data.key)
                .map(|e| e.id());
            if let Some(edge_idx) = existing {
                if let Some(slot) = self.graph.edge_weight_mut(edge_idx) {
                    *slot = data;
                }
                return;
            }
        }
        self.graph.add_edge(from, to, data);
    }

    /// Rewrites every edge weight in place.
    pub fn map_weights<F: Fn(f64) -> f64>(&mut self, f: F) {
        for data in self.graph.edge_weights_mut() {
            data.weight = f(data.weight);
        }
    }

    /// Undirected view with identical node indices; every directed edge
    /// becomes one undirected edge carrying its weight.
    pub fn to_undirected(&self) -> UnGraph<NodeKey, f64> {
        let mut undirected = UnGraph::with_capacity(self.node_count(), self.edge_count());
        for node in self.graph.node_weights() {
            undirected.add_node(node.key());
        }
        for edge in self.graph.edge_references() {
            undirected.add_edge(edge.source(), edge.target(), edge.weight().weight);
        }
        undirected
    }

    /// Subgraph containing exactly `nodes` (in the given order, duplicates and
    /// unknown nodes skipped) and every edge between them.
    pub fn induced_subgraph(&self, nodes: &[Node]) -> KnowledgeGraph {
        let mut subgraph = KnowledgeGraph::new();
        for node in nodes {
            if let Some(idx) = self.get_index(node) {
                subgraph.add_node(self.graph[idx].clone());
            }
        }
        for edge in self.graph.edge_references() {
            let source = &self.graph[edge.source()];
            let target = &self.graph[edge.target()];
            if let (Some(from), Some(to)) = (subgraph.get_index(source), subgraph.get_index(target))
            {
                subgraph.add_edge_by_index(from, to, edge.weight().clone());
            }
        }
        subgraph
    }

    /// Copy of this graph with nodes replaced by `relabel` where it returns
    /// `Some`. Nodes that collapse onto the same key are merged.
    pub fn relabel_nodes<F>(&self, relabel: F) -> KnowledgeGraph
    where
        F: Fn(&Node) -> Option<Node>,
    {
        let mut relabeled = KnowledgeGraph::new();
        let mut new_indices = Vec::with_capacity(self.node_count());
        for node in self.graph.node_weights() {
            let node = relabel(node).unwrap_or_else(|| node.clone());
            new_indices.push(relabeled.add_node(node));
        }
        for edge in self.graph.edge_references() {
            let from = new_indices[edge.source().index()];
            let to = new_indices[edge.target().index()];
            relabeled.add_edge_by_index(from, to, edge.weight().clone());
        }
        relabeled
    }
}

// ============================================================================
// Tests
// ============================================================================
