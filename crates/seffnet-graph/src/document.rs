//! Node-link JSON persistence for [`KnowledgeGraph`].
//!
//! ```json
//! {
//!   "nodes": [{"namespace": "pubchem.compound", "identifier": "2244"}],
//!   "edges": [{"source": 0, "target": 1, "key": "e1", "weight": 0.9}]
//! }
//! ```
//!
//! `source` and `target` index into `nodes`. Weights must lie in `[0, 1]`.

use crate::{EdgeData, KnowledgeGraph, Node};
use seffnet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

/// One serialized edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    /// Index of the source node in `nodes`.
    pub source: usize,
    /// Index of the target node in `nodes`.
    pub target: usize,
    /// Optional multigraph edge key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Edge weight.
    pub weight: f64,
}

/// Serialized form of a [`KnowledgeGraph`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Nodes in index order.
    pub nodes: Vec<Node>,
    /// Edges referencing `nodes` by position.
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
}

impl GraphDocument {
    /// Builds a graph, validating node references and weight ranges.
    pub fn into_graph(self) -> Result<KnowledgeGraph> {
        let mut graph = KnowledgeGraph::new();
        for node in &self.nodes {
            graph.add_node(node.clone());
        }
        for (position, edge) in self.edges.into_iter().enumerate() {
            let from = self.nodes.get(edge.source).ok_or_else(|| {
                Error::parse(format!(
                    "edge {position}: source index {} out of range",
                    edge.source
                ))
            })?;
            let to = self.nodes.get(edge.target).ok_or_else(|| {
                Error::parse(format!(
                    "edge {position}: target index {} out of range",
                    edge.target
                ))
            })?;
            let data = EdgeData {
                key: edge.key,
                weight: edge.weight,
            };
            graph.add_edge(from, to, data)?;
        }
        Ok(graph)
    }

    /// Captures a graph in node-link form.
    pub fn from_graph(graph: &KnowledgeGraph) -> Self {
        let nodes = graph.nodes().cloned().collect();
        let edges = graph
            .graph
            .raw_edges()
            .iter()
            .map(|edge| EdgeRecord {
                source: edge.source().index(),
                target: edge.target().index(),
                key: edge.weight.key.clone(),
                weight: edge.weight.weight,
            })
            .collect();
        Self { nodes, edges }
    }
}

impl KnowledgeGraph {
    /// Reads a node-link JSON graph.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let document: GraphDocument = serde_json::from_reader(reader)?;
        document.into_graph()
    }

    /// Loads a node-link JSON graph from disk.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io_with_path(e, path))?;
        let graph = Self::from_reader(std::io::BufReader::new(file))?;
        log::info!(
            "Loaded graph from {}: {} nodes, {} edges",
            path.display(),
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Writes this graph as pretty-printed node-link JSON.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, &GraphDocument::from_graph(self))?;
        Ok(())
    }

    /// Saves this graph as node-link JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let document = GraphDocument::from_graph(self);
        seffnet_core::write_all_or_nothing(path, |w| {
            serde_json::to_writer_pretty(&mut *w, &document)?;
            writeln!(w)
        })
    }
}
