//! Chemical clusters and node-id mappings loaded from TSV files.
//!
//! - Cluster file: columns `PubchemID`, `Cluster`.
//! - Mapping file: columns `namespace`, `identifier`, `name`, `node_id`.
//!
//! Both files require a header row; extra columns are ignored.

use crate::{Namespace, Node, NodeKey};
use seffnet_core::{Error, Result};
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::Path;

fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .from_reader(reader)
}

fn open(kind: &str, path: &Path) -> Result<std::fs::File> {
    seffnet_core::require_file(kind, path)?;
    std::fs::File::open(path).map_err(|e| Error::io_with_path(e, path))
}

// ============================================================================
// ClusterLabel
// ============================================================================

/// Cluster label of a chemical.
///
/// Labels that parse as numbers compare numerically, so `3` and `3.0` are the
/// same cluster. Edges whose chemical has no cluster get [`ClusterLabel::default`],
/// the numeric label `0.0`.
#[derive(Clone, Debug)]
pub enum ClusterLabel {
    /// A numeric label.
    Numeric(f64),
    /// A non-numeric label.
    Text(String),
}

impl ClusterLabel {
    /// Parses a raw label, preferring the numeric form.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Numeric(value),
            _ => Self::Text(raw.to_string()),
        }
    }

    // -0.0 and 0.0 are the same group.
    fn numeric_bits(value: f64) -> u64 {
        if value == 0.0 { 0 } else { value.to_bits() }
    }
}

impl Default for ClusterLabel {
    fn default() -> Self {
        Self::Numeric(0.0)
    }
}

impl PartialEq for ClusterLabel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ClusterLabel {}

impl PartialOrd for ClusterLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClusterLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => {
                if Self::numeric_bits(*a) == Self::numeric_bits(*b) {
                    Ordering::Equal
                } else {
                    a.total_cmp(b)
                }
            }
            (Self::Numeric(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Numeric(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

impl Hash for ClusterLabel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Self::Numeric(value) => {
                0u8.hash(state);
                Self::numeric_bits(*value).hash(state);
            }
            Self::Text(text) => {
                1u8.hash(state);
                text.hash(state);
            }
        }
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{value:?}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

// ============================================================================
// ClusterAssignment
// ============================================================================

#[derive(Debug, Deserialize)]
struct ClusterRow {
    #[serde(rename = "PubchemID")]
    pubchem_id: String,
    #[serde(rename = "Cluster")]
    cluster: String,
}

/// Mapping from chemical identifier to cluster label.
#[derive(Clone, Debug, Default)]
pub struct ClusterAssignment {
    labels: HashMap<String, ClusterLabel>,
}

impl ClusterAssignment {
    /// Creates an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `identifier` to `label`.
    pub fn insert(&mut self, identifier: impl Into<String>, label: ClusterLabel) {
        self.labels.insert(identifier.into(), label);
    }

    /// Number of assigned chemicals.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no chemical is assigned.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Cluster of a chemical identifier, if assigned.
    pub fn get(&self, identifier: &str) -> Option<&ClusterLabel> {
        self.labels.get(identifier)
    }

    /// Cluster used to group an edge, decided by its source node's identifier
    /// alone; unassigned sources fall into the default `0.0` cluster.
    pub fn label_for(&self, source: &Node) -> ClusterLabel {
        source
            .identifier
            .as_deref()
            .and_then(|id| self.labels.get(id))
            .cloned()
            .unwrap_or_default()
    }

    /// Reads a cluster TSV.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut assignment = Self::new();
        for row in tsv_reader(reader).deserialize() {
            let row: ClusterRow = row?;
            assignment.insert(row.pubchem_id.trim(), ClusterLabel::parse(&row.cluster));
        }
        Ok(assignment)
    }

    /// Loads a cluster TSV; fails with `MissingInputFile` if absent.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let assignment = Self::from_reader(open("cluster", path)?)?;
        log::info!(
            "Loaded {} clustered chemicals from {}",
            assignment.len(),
            path.display()
        );
        Ok(assignment)
    }
}

// ============================================================================
// Mapping table
// ============================================================================

/// One row of the mapping file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MappingRow {
    /// Node namespace.
    pub namespace: String,
    /// External identifier.
    #[serde(default)]
    pub identifier: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Opaque internal node id.
    #[serde(default)]
    pub node_id: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// The parsed mapping file, from which both lookup directions are derived.
#[derive(Clone, Debug, Default)]
pub struct MappingTable {
    /// Rows in file order.
    pub rows: Vec<MappingRow>,
}

impl MappingTable {
    /// Reads a mapping TSV.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let rows = tsv_reader(reader)
            .deserialize()
            .collect::<std::result::Result<Vec<MappingRow>, csv::Error>>()?;
        Ok(Self { rows })
    }

    /// Loads a mapping TSV; fails with `MissingInputFile` if absent.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let table = Self::from_reader(open("mapping", path)?)?;
        log::info!("Read {} mapping rows from {}", table.rows.len(), path.display());
        Ok(table)
    }

    /// Node → internal id lookup used when splitting.
    ///
    /// Chemicals are keyed by identifier, UMLS phenotypes by name, and every
    /// other namespace by its `name` column taken as the identifier.
    pub fn node_ids(&self) -> NodeIdMapping {
        let mut ids = HashMap::new();
        for row in &self.rows {
            let namespace = Namespace::from(row.namespace.trim());
            let value = match namespace {
                Namespace::PubchemCompound => present(&row.identifier),
                _ => present(&row.name),
            };
            let (Some(value), Some(node_id)) = (value, present(&row.node_id)) else {
                log::debug!("Skipping incomplete mapping row: {row:?}");
                continue;
            };
            ids.insert(NodeKey::new(namespace, value), node_id.to_string());
        }
        NodeIdMapping { ids }
    }

    /// Chemical identifier → named chemical lookup used when relabeling
    /// subgraphs. Rows with any missing field, and non-chemical rows, are
    /// excluded.
    pub fn chemical_names(&self) -> NameMapping {
        let mut names = HashMap::new();
        for row in &self.rows {
            let namespace = Namespace::from(row.namespace.trim());
            if !namespace.is_chemical() {
                continue;
            }
            let (Some(identifier), Some(name), Some(_)) = (
                present(&row.identifier),
                present(&row.name),
                present(&row.node_id),
            ) else {
                continue;
            };
            names.insert(
                NodeKey::new(Namespace::PubchemCompound, identifier),
                Node::new(Namespace::PubchemCompound).with_name(name),
            );
        }
        NameMapping { names }
    }
}

// ============================================================================
// NodeIdMapping
// ============================================================================

/// Lookup from node to the opaque node id used in edge lists.
#[derive(Clone, Debug, Default)]
pub struct NodeIdMapping {
    ids: HashMap<NodeKey, String>,
}

impl NodeIdMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `node` to `node_id`.
    pub fn insert(&mut self, node: &Node, node_id: impl Into<String>) {
        self.ids.insert(node.key(), node_id.into());
    }

    /// Number of mapped nodes.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Resolves a node to its id, failing with `MissingMapping`.
    pub fn resolve(&self, node: &Node) -> Result<&str> {
        self.ids
            .get(&node.key())
            .map(String::as_str)
            .ok_or_else(|| Error::missing_mapping(node))
    }
}

// ============================================================================
// NameMapping
// ============================================================================

/// Lookup from `(pubchem.compound, identifier)` to the named chemical.
#[derive(Clone, Debug, Default)]
pub struct NameMapping {
    names: HashMap<NodeKey, Node>,
}

impl NameMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a chemical's display name.
    pub fn insert(&mut self, identifier: impl Into<String>, name: impl Into<String>) {
        self.names.insert(
            NodeKey::new(Namespace::PubchemCompound, identifier),
            Node::new(Namespace::PubchemCompound).with_name(name),
        );
    }

    /// Number of named chemicals.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name-keyed replacement for `node`, if it is a mapped chemical.
    pub fn relabel(&self, node: &Node) -> Option<Node> {
        if !node.namespace.is_chemical() {
            return None;
        }
        self.names.get(&node.key()).cloned()
    }
}
