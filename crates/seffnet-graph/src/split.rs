//! Cluster-aware train/test splitting of a knowledge graph.
//!
//! [`GraphSplitter`] turns a full graph into a training and a testing
//! [`SimpleGraph`] in five steps:
//!
//! 1. Resolve every edge to `(source id, target id, cluster)`, where the
//!    cluster comes from the *source* node's identifier only.
//! 2. Shuffle clusters into train and test groups ([`GroupShuffleSplit`]),
//!    so that edges sharing a cluster never straddle the split.
//! 3. Build both graphs from their edge subsets.
//! 4. Re-attach test nodes missing from the training graph by copying their
//!    test edges into it.
//! 5. Drop every test edge that the repaired training graph also contains.
//!
//! [`GraphSplitter::split_files`] adds edge-list persistence and a
//! fingerprinted on-disk cache (see [`crate::cache`]).

use crate::cache::{CacheStatus, SplitMetadata, check_cache, compute_fingerprint};
use crate::{
    ClusterAssignment, ClusterLabel, KnowledgeGraph, MappingTable, NodeIdMapping, SimpleGraph,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use seffnet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Default fraction of cluster groups sent to the test side.
pub const DEFAULT_TEST_FRACTION: f64 = 0.20;
/// Default split seed.
pub const DEFAULT_SPLIT_SEED: u64 = 7;
/// Number of partitions generated per split; the first one is used.
pub const DEFAULT_N_SPLITS: usize = 2;

// ============================================================================
// Configuration
// ============================================================================

/// Parameters of a cluster-aware split.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of cluster groups assigned to the test side (rounded up).
    pub test_fraction: f64,
    /// Seed of the group shuffle.
    pub seed: u64,
    /// Partitions generated; only the first is kept.
    pub n_splits: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: DEFAULT_SPLIT_SEED,
            n_splits: DEFAULT_N_SPLITS,
        }
    }
}

/// Input and output locations for [`GraphSplitter::split_files`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitPaths {
    /// Full graph (node-link JSON).
    pub graph: PathBuf,
    /// Cluster TSV.
    pub clusters: PathBuf,
    /// Mapping TSV.
    pub mapping: PathBuf,
    /// Training edge list (output / cache).
    pub train: PathBuf,
    /// Testing edge list (output / cache).
    pub test: PathBuf,
}

impl Default for SplitPaths {
    fn default() -> Self {
        Self {
            graph: PathBuf::from("data/fullgraph.json"),
            clusters: PathBuf::from("data/clustered_chemicals.tsv"),
            mapping: PathBuf::from("data/mapping.tsv"),
            train: PathBuf::from("data/training_edgelist.txt"),
            test: PathBuf::from("data/testing_edgelist.txt"),
        }
    }
}

impl SplitPaths {
    fn inputs(&self) -> [&Path; 3] {
        [
            self.graph.as_path(),
            self.clusters.as_path(),
            self.mapping.as_path(),
        ]
    }
}

// ============================================================================
// Clustered edge list
// ============================================================================

/// One edge of the full graph, resolved to node ids and tagged with the
/// cluster of its source.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusteredEdge {
    /// Node id of the source.
    pub source: String,
    /// Node id of the target.
    pub target: String,
    /// Cluster of the source chemical (`0.0` when unassigned).
    pub cluster: ClusterLabel,
}

/// Resolves every edge of `graph` in insertion order.
///
/// Fails with `MissingMapping` on the first endpoint without a node id.
pub fn build_clustered_edge_list(
    graph: &KnowledgeGraph,
    clusters: &ClusterAssignment,
    ids: &NodeIdMapping,
) -> Result<Vec<ClusteredEdge>> {
    log::info!("Creating splitting dataframe");
    graph
        .edges()
        .map(|(source, target, _)| {
            Ok(ClusteredEdge {
                source: ids.resolve(source)?.to_string(),
                target: ids.resolve(target)?.to_string(),
                cluster: clusters.label_for(source),
            })
        })
        .collect()
}

// ============================================================================
// GroupShuffleSplit
// ============================================================================

/// Train/test sample indices of one partition, each sorted ascending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partition {
    /// Indices on the training side.
    pub train: Vec<usize>,
    /// Indices on the testing side.
    pub test: Vec<usize>,
}

/// Randomized split of samples by group label.
///
/// Distinct groups are ordered, `ceil(test_size * groups)` of them are drawn
/// for the test side from a seeded permutation, and the rest go to training.
/// Every partition consumes one permutation from the same random stream.
#[derive(Clone, Debug)]
pub struct GroupShuffleSplit {
    n_splits: usize,
    test_size: f64,
    seed: u64,
}

impl GroupShuffleSplit {
    /// Creates a splitter producing `n_splits` partitions.
    pub fn new(n_splits: usize, test_size: f64, seed: u64) -> Self {
        Self {
            n_splits,
            test_size,
            seed,
        }
    }

    /// Generates all partitions for samples labeled by `groups`.
    pub fn split<G: Ord>(&self, groups: &[G]) -> Result<Vec<Partition>> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(Error::config(format!(
                "test fraction must lie in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.n_splits == 0 {
            return Err(Error::config("number of splits must be at least 1"));
        }

        let distinct: BTreeSet<&G> = groups.iter().collect();
        let group_index: BTreeMap<&G, usize> = distinct
            .into_iter()
            .enumerate()
            .map(|(i, g)| (g, i))
            .collect();
        let n_groups = group_index.len();

        let n_test = (self.test_size * n_groups as f64).ceil() as usize;
        let n_train = n_groups.saturating_sub(n_test);
        if n_groups == 0 || n_train == 0 {
            return Err(Error::config(format!(
                "cannot split {n_groups} cluster group(s) with test fraction {}: \
                 the training side would be empty",
                self.test_size
            )));
        }

        let sample_groups: Vec<usize> = groups.iter().map(|g| group_index[g]).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut partitions = Vec::with_capacity(self.n_splits);

        for _ in 0..self.n_splits {
            let mut permutation: Vec<usize> = (0..n_groups).collect();
            permutation.shuffle(&mut rng);
            let mut side = vec![Side::Unused; n_groups];
            for &g in &permutation[..n_test] {
                side[g] = Side::Test;
            }
            for &g in &permutation[n_test..n_test + n_train] {
                side[g] = Side::Train;
            }

            let mut partition = Partition::default();
            for (sample, &g) in sample_groups.iter().enumerate() {
                match side[g] {
                    Side::Train => partition.train.push(sample),
                    Side::Test => partition.test.push(sample),
                    Side::Unused => {}
                }
            }
            partitions.push(partition);
        }
        Ok(partitions)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Train,
    Test,
    Unused,
}

// ============================================================================
// GraphSplitter
// ============================================================================

/// Training and testing graphs produced by a split.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SplitGraphs {
    /// Training graph.
    pub train: SimpleGraph,
    /// Testing graph.
    pub test: SimpleGraph,
}

/// Result of [`GraphSplitter::split_files`].
#[derive(Clone, Debug)]
pub struct SplitOutcome {
    /// The split graphs.
    pub graphs: SplitGraphs,
    /// Whether they were loaded from cached edge lists.
    pub from_cache: bool,
}

/// Cluster-aware splitter.
#[derive(Clone, Debug, Default)]
pub struct GraphSplitter {
    config: SplitConfig,
}

impl GraphSplitter {
    /// Creates a splitter with the given configuration.
    pub fn new(config: SplitConfig) -> Self {
        Self { config }
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Sets the test fraction.
    pub fn with_test_fraction(mut self, test_fraction: f64) -> Self {
        self.config.test_fraction = test_fraction;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    /// Group-aware partition of a clustered edge list. Of the
    /// generated partitions, the first is returned.
    pub fn partition(&self, edges: &[ClusteredEdge]) -> Result<Partition> {
        let groups: Vec<&ClusterLabel> = edges.iter().map(|e| &e.cluster).collect();
        GroupShuffleSplit::new(self.config.n_splits, self.config.test_fraction, self.config.seed)
            .split(&groups)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::config("group split produced no partition"))
    }

    /// Splits `graph` in memory.
    pub fn split(
        &self,
        graph: &KnowledgeGraph,
        clusters: &ClusterAssignment,
        ids: &NodeIdMapping,
    ) -> Result<SplitGraphs> {
        let edges = build_clustered_edge_list(graph, clusters, ids)?;
        let partition = self.partition(&edges)?;
        log::debug!(
            "Partitioned {} edges: {} train, {} test",
            edges.len(),
            partition.train.len(),
            partition.test.len()
        );

        let subset = |indices: &[usize]| {
            SimpleGraph::from_edges(
                indices
                    .iter()
                    .map(|&i| (edges[i].source.as_str(), edges[i].target.as_str())),
            )
        };
        let mut train = subset(&partition.train);
        let mut test = subset(&partition.test);

        repair_and_deduplicate(&mut train, &mut test);
        log::info!(
            "Split graph: train {} nodes / {} edges, test {} nodes / {} edges",
            train.node_count(),
            train.edge_count(),
            test.node_count(),
            test.edge_count()
        );
        Ok(SplitGraphs { train, test })
    }

    /// Splits the graph described by `paths`, persisting both edge lists,
    /// or loads them from a valid cache unless `rebuild` is set.
    pub fn split_files(&self, paths: &SplitPaths, rebuild: bool) -> Result<SplitOutcome> {
        let inputs = paths.inputs();
        match check_cache(&paths.train, &paths.test, &inputs, &self.config, rebuild)? {
            CacheStatus::Valid => {
                log::info!(
                    "Loading cached split from {} and {}",
                    paths.train.display(),
                    paths.test.display()
                );
                let graphs = SplitGraphs {
                    train: SimpleGraph::read_edgelist(&paths.train)?,
                    test: SimpleGraph::read_edgelist(&paths.test)?,
                };
                return Ok(SplitOutcome {
                    graphs,
                    from_cache: true,
                });
            }
            CacheStatus::Stale => log::info!("Inputs changed since the cached split; rebuilding"),
            CacheStatus::Absent => {}
        }

        seffnet_core::require_file("cluster", &paths.clusters)?;
        seffnet_core::require_file("mapping", &paths.mapping)?;
        seffnet_core::require_file("graph", &paths.graph)?;

        let clusters = ClusterAssignment::from_path(&paths.clusters)?;
        let ids = MappingTable::from_path(&paths.mapping)?.node_ids();
        let graph = KnowledgeGraph::from_json_path(&paths.graph)?;

        let graphs = self.split(&graph, &clusters, &ids)?;
        let fingerprint = compute_fingerprint(&inputs, &self.config)?;

        graphs.train.write_edgelist(&paths.train)?;
        graphs.test.write_edgelist(&paths.test)?;
        SplitMetadata::new(fingerprint, &self.config).save(&paths.train)?;

        Ok(SplitOutcome {
            graphs,
            from_cache: false,
        })
    }
}

/// Re-attaches test nodes to `train`, then removes from `test` every edge
/// `train` now contains.
pub fn repair_and_deduplicate(train: &mut SimpleGraph, test: &mut SimpleGraph) {
    log::info!("Modifying training set");
    for (u, v) in test.edge_list() {
        if !train.contains_node(&u) {
            train.add_node(&u);
            train.add_edge(&u, &v);
        }
        if !train.contains_node(&v) {
            train.add_node(&v);
            train.add_edge(&u, &v);
        }
    }

    log::info!("Removing training edges from testing set");
    for (u, v) in train.edge_list() {
        test.remove_edge(&u, &v);
    }
}
