//! Common fixtures for seffnet-train integration tests.

use seffnet_core::Result;
use seffnet_graph::SimpleGraph;
use seffnet_train::{
    EmbeddingMethod, EmbeddingModel, EmbeddingParams, Embeddings, Method, MethodTable,
    TrainedEmbeddings,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Embeds each node by the community its id starts with.
pub struct CommunityEmbedding;

impl EmbeddingMethod for CommunityEmbedding {
    fn name(&self) -> &str {
        "community"
    }

    fn train(
        &self,
        graph: &SimpleGraph,
        params: &EmbeddingParams,
    ) -> Result<Box<dyn EmbeddingModel>> {
        let mut embeddings = Embeddings::new(3);
        for node in graph.nodes() {
            let vector = match node.chars().next() {
                Some('a') => vec![1.0, 0.0, 0.0],
                Some('b') => vec![0.0, 1.0, 0.0],
                _ => vec![0.0, 0.0, 1.0],
            };
            embeddings.insert(node, vector)?;
        }
        Ok(Box::new(TrainedEmbeddings {
            method: Method::Hope,
            params: params.clone(),
            embeddings,
        }))
    }
}

pub fn community_methods() -> MethodTable {
    MethodTable::new().with_all(Arc::new(CommunityEmbedding))
}

/// Three cliques of `size` nodes (`a*`, `b*`, `c*`).
pub fn communities(size: usize) -> SimpleGraph {
    let mut graph = SimpleGraph::new();
    for side in ["a", "b", "c"] {
        for i in 0..size {
            for j in (i + 1)..size {
                graph.add_edge(&format!("{side}{i}"), &format!("{side}{j}"));
            }
        }
    }
    graph
}

pub fn write_graph(dir: &Path, name: &str, graph: &SimpleGraph) -> PathBuf {
    let path = dir.join(name);
    graph.write_edgelist(&path).unwrap();
    path
}

pub fn write_labels(dir: &Path, graph: &SimpleGraph) -> PathBuf {
    let path = dir.join("labels.txt");
    let content: String = graph
        .nodes()
        .map(|n| format!("{n} {}\n", &n[..1]))
        .collect();
    std::fs::write(&path, content).unwrap();
    path
}

/// Top-level keys of a pretty-printed JSON object, in written order.
pub fn top_level_keys(json: &str) -> Vec<String> {
    json.lines()
        .filter(|l| l.starts_with("  \"") && !l.starts_with("   "))
        .map(|l| l.trim().split('"').nth(1).unwrap().to_string())
        .collect()
}
