//! SEffNet Graph: biomedical knowledge graphs, cluster-aware splitting, and
//! explanation subgraphs.
//!
//! # Modules
//!
//! - [`types`]: Namespace, Node, NodeKey, EdgeData, KnowledgeGraph
//! - [`document`]: Node-link JSON persistence for the full graph
//! - [`simple`]: Train/test graphs and edge-list persistence
//! - [`mapping`]: Cluster assignments and node-id / name mappings
//! - [`algorithms`]: All-shortest-paths enumeration
//! - [`split`]: [`GraphSplitter`] and the group-aware shuffle split
//! - [`cache`]: Fingerprints guarding cached splits
//! - [`subgraph`]: [`SubgraphExtractor`]
//!
//! # Example
//!
//! ```rust
//! use seffnet_graph::{
//!     ClusterAssignment, EdgeData, GraphSplitter, KnowledgeGraph, Node, NodeIdMapping,
//! };
//!
//! let mut graph = KnowledgeGraph::new();
//! let mut ids = NodeIdMapping::new();
//! let mut clusters = ClusterAssignment::new();
//! for i in 0..5 {
//!     let chem = Node::chemical(i.to_string());
//!     let prot = Node::protein(None, Some(format!("P{i}")));
//!     ids.insert(&chem, format!("c{i}"));
//!     ids.insert(&prot, format!("p{i}"));
//!     clusters.insert(i.to_string(), seffnet_graph::ClusterLabel::Numeric(i as f64));
//!     graph.add_edge_with_nodes(chem, prot, EdgeData::new(0.8)).unwrap();
//! }
//!
//! let split = GraphSplitter::default().split(&graph, &clusters, &ids).unwrap();
//! assert!(split.test.nodes().all(|n| split.train.contains_node(n)));
//! ```

#![forbid(unsafe_code)]

pub mod algorithms;
pub mod cache;
pub mod document;
pub mod mapping;
pub mod simple;
pub mod split;
pub mod subgraph;
pub mod types;

mod proptests;

// Re-export key types at crate root for convenience
pub use algorithms::{ShortestPaths, all_shortest_paths, path_cost};
pub use cache::{CacheStatus, SplitMetadata};
pub use document::{EdgeRecord, GraphDocument};
pub use mapping::{ClusterAssignment, ClusterLabel, MappingRow, MappingTable, NameMapping, NodeIdMapping};
pub use simple::SimpleGraph;
pub use split::{
    ClusteredEdge, GraphSplitter, GroupShuffleSplit, Partition, SplitConfig, SplitGraphs,
    SplitOutcome, SplitPaths, build_clustered_edge_list, repair_and_deduplicate,
};
pub use subgraph::{
    EntityDescriptor, EntityType, SamplingPolicy, Subgraph, SubgraphExtractor,
    similarity_to_distance,
};
pub use types::{EdgeData, KnowledgeGraph, Namespace, Node, NodeKey, PUBCHEM_COMPOUND, UMLS, UNIPROT};
