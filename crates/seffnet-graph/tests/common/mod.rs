//! Common fixtures for seffnet-graph integration tests.

use seffnet_graph::{EdgeData, KnowledgeGraph, Node, SplitPaths};
use std::path::Path;
use tempfile::TempDir;

pub fn chem(id: &str) -> Node {
    Node::chemical(id)
}

pub fn prot(id: &str) -> Node {
    Node::protein(None, Some(id.to_string()))
}

pub fn pheno(name: &str) -> Node {
    Node::phenotype(Some(name.to_string()), None)
}

/// Edges `(chem1, prot1, 0.9)`, `(chem1, prot2, 0.9)`, `(chem2, prot1, 0.5)`.
pub fn scenario_a_graph() -> KnowledgeGraph {
    let mut graph = KnowledgeGraph::new();
    graph.add_edge_with_nodes(chem("chem1"), prot("prot1"), EdgeData::new(0.9)).unwrap();
    graph.add_edge_with_nodes(chem("chem1"), prot("prot2"), EdgeData::new(0.9)).unwrap();
    graph.add_edge_with_nodes(chem("chem2"), prot("prot1"), EdgeData::new(0.5)).unwrap();
    graph
}

pub const SCENARIO_A_CLUSTERS: &str = "PubchemID\tCluster\nchem1\tA\nchem2\tB\n";

/// Proteins are keyed by the `name` column, as in the mapping files the
/// pipeline consumes.
pub const SCENARIO_A_MAPPING: &str = "namespace\tidentifier\tname\tnode_id\n\
    pubchem.compound\tchem1\taspirin\t1\n\
    pubchem.compound\tchem2\t\t2\n\
    uniprot\t\tprot1\t3\n\
    uniprot\t\tprot2\t4\n";

/// A temporary data directory holding split inputs.
pub struct DataDir {
    pub dir: TempDir,
    pub paths: SplitPaths,
}

impl DataDir {
    /// Writes `graph`, `clusters`, and `mapping` into a fresh directory.
    pub fn new(graph: &KnowledgeGraph, clusters: &str, mapping: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let paths = SplitPaths {
            graph: root.join("fullgraph.json"),
            clusters: root.join("clusters.tsv"),
            mapping: root.join("mapping.tsv"),
            train: root.join("out").join("train.edgelist"),
            test: root.join("out").join("test.edgelist"),
        };
        graph.save_json(&paths.graph).unwrap();
        std::fs::write(&paths.clusters, clusters).unwrap();
        std::fs::write(&paths.mapping, mapping).unwrap();
        Self { dir, paths }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}
