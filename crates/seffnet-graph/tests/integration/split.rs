//! Integration tests for file-backed cluster-aware splitting.

use seffnet_core::Error;
use seffnet_graph::{GraphSplitter, SimpleGraph, SplitMetadata};
use std::collections::BTreeSet;

use crate::common::{DataDir, SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING, scenario_a_graph};

fn pairs(raw: &[(&str, &str)]) -> BTreeSet<(String, String)> {
    raw.iter()
        .map(|(u, v)| (u.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_scenario_a_split_properties() {
    let data = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    let outcome = GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap();
    assert!(!outcome.from_cache);

    let train = &outcome.graphs.train;
    let test = &outcome.graphs.test;

    // Disjoint edge sets.
    assert!(train.edge_set().is_disjoint(&test.edge_set()));
    // Every test node is reachable from training.
    assert!(test.nodes().all(|n| train.contains_node(n)));
    // With two clusters one whole side becomes the test set, and repair pulls
    // every test edge back into training.
    assert_eq!(
        train.edge_set(),
        pairs(&[("1", "3"), ("1", "4"), ("2", "3")])
    );
    assert_eq!(test.edge_count(), 0);
}

#[test]
fn test_split_writes_edge_lists_and_metadata() {
    let data = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    let outcome = GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap();

    let train = SimpleGraph::read_edgelist(&data.paths.train).unwrap();
    assert_eq!(train, outcome.graphs.train);
    assert!(data.paths.test.exists());

    let metadata = SplitMetadata::load(&data.paths.train).unwrap().unwrap();
    assert_eq!(metadata.seed, 7);
    assert_eq!(metadata.n_splits, 2);
}

#[test]
fn test_split_is_reproducible_with_fixed_seed() {
    let a = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    let b = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    let first = GraphSplitter::default().split_files(&a.paths, false).unwrap();
    let second = GraphSplitter::default().split_files(&b.paths, false).unwrap();
    assert_eq!(first.graphs, second.graphs);
    assert_eq!(
        std::fs::read_to_string(&a.paths.train).unwrap(),
        std::fs::read_to_string(&b.paths.train).unwrap()
    );
}

// ----------------------------------------------------------------------------
// Cache behavior
// ----------------------------------------------------------------------------

#[test]
fn test_cached_split_is_loaded_without_inputs() {
    let data = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    let first = GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap();

    // Hand-edit the cached training list; a cache hit must return it verbatim.
    std::fs::write(&data.paths.train, "1 3\n9 9\n").unwrap();
    std::fs::remove_file(&data.paths.graph).unwrap();
    std::fs::remove_file(&data.paths.clusters).unwrap();
    std::fs::remove_file(&data.paths.mapping).unwrap();

    let second = GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap();
    assert!(second.from_cache);
    assert_eq!(
        second.graphs.train,
        SimpleGraph::read_edgelist(&data.paths.train).unwrap()
    );
    assert_ne!(second.graphs.train, first.graphs.train);
}

/// Writes a train/test pair from an older run, with no metadata file.
fn write_legacy_split(data: &DataDir) {
    std::fs::create_dir_all(data.root().join("out")).unwrap();
    std::fs::write(&data.paths.train, "1 3\n2 3\n").unwrap();
    std::fs::write(&data.paths.test, "1 4\n").unwrap();
}

#[test]
fn test_split_without_metadata_is_loaded_verbatim() {
    let data = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    write_legacy_split(&data);

    let outcome = GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap();
    assert!(outcome.from_cache);
    assert_eq!(outcome.graphs.train.edge_set(), pairs(&[("1", "3"), ("2", "3")]));
    assert_eq!(outcome.graphs.test.edge_set(), pairs(&[("1", "4")]));
    assert!(SplitMetadata::load(&data.paths.train).unwrap().is_none());
    assert_eq!(std::fs::read_to_string(&data.paths.train).unwrap(), "1 3\n2 3\n");
}

#[test]
fn test_rebuild_replaces_split_without_metadata() {
    let data = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    write_legacy_split(&data);

    let outcome = GraphSplitter::default()
        .split_files(&data.paths, true)
        .unwrap();
    assert!(!outcome.from_cache);
    assert_eq!(
        outcome.graphs.train.edge_set(),
        pairs(&[("1", "3"), ("1", "4"), ("2", "3")])
    );
    assert_eq!(
        SimpleGraph::read_edgelist(&data.paths.train).unwrap(),
        outcome.graphs.train
    );
    assert_eq!(
        SimpleGraph::read_edgelist(&data.paths.test).unwrap().edge_set(),
        outcome.graphs.test.edge_set()
    );
    let metadata = SplitMetadata::load(&data.paths.train).unwrap().unwrap();
    assert_eq!(metadata.seed, 7);

    // The regenerated split now carries metadata, so a changed seed rebuilds.
    let reseeded = GraphSplitter::default()
        .with_seed(11)
        .split_files(&data.paths, false)
        .unwrap();
    assert!(!reseeded.from_cache);
}

#[test]
fn test_second_split_hits_cache() {
    let data = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    let first = GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap();
    let second = GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap();
    assert!(second.from_cache);
    // Edge lists do not carry isolated nodes, so compare edges.
    assert_eq!(first.graphs.train.edge_set(), second.graphs.train.edge_set());
    assert_eq!(first.graphs.test.edge_set(), second.graphs.test.edge_set());
}

#[test]
fn test_changed_input_invalidates_cache() {
    let data = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap();

    std::fs::write(
        &data.paths.clusters,
        "PubchemID\tCluster\nchem1\tA\nchem2\tA\n",
    )
    .unwrap();
    let err = GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap_err();
    // A single cluster cannot be split, proving the inputs were reprocessed.
    assert!(matches!(err, Error::Config { .. }));
}

#[test]
fn test_changed_seed_invalidates_cache() {
    let data = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap();
    let reseeded = GraphSplitter::default()
        .with_seed(11)
        .split_files(&data.paths, false)
        .unwrap();
    assert!(!reseeded.from_cache);
    assert_eq!(
        SplitMetadata::load(&data.paths.train).unwrap().unwrap().seed,
        11
    );
}

#[test]
fn test_rebuild_ignores_cache() {
    let data = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap();
    let rebuilt = GraphSplitter::default()
        .split_files(&data.paths, true)
        .unwrap();
    assert!(!rebuilt.from_cache);
}

// ----------------------------------------------------------------------------
// Failure conditions
// ----------------------------------------------------------------------------

#[test]
fn test_missing_cluster_file() {
    let data = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    std::fs::remove_file(&data.paths.clusters).unwrap();
    let err = GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap_err();
    assert!(matches!(err, Error::MissingInputFile { ref kind, .. } if kind == "cluster"));
}

#[test]
fn test_missing_mapping_file() {
    let data = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, SCENARIO_A_MAPPING);
    std::fs::remove_file(&data.paths.mapping).unwrap();
    let err = GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap_err();
    assert!(matches!(err, Error::MissingInputFile { ref kind, .. } if kind == "mapping"));
}

#[test]
fn test_unmapped_endpoint_fails_without_output() {
    let mapping = "namespace\tidentifier\tname\tnode_id\n\
        pubchem.compound\tchem1\taspirin\t1\n\
        uniprot\t\tprot1\t3\n";
    let data = DataDir::new(&scenario_a_graph(), SCENARIO_A_CLUSTERS, mapping);
    let err = GraphSplitter::default()
        .split_files(&data.paths, false)
        .unwrap_err();
    assert!(matches!(err, Error::MissingMapping { .. }));
    assert!(!data.paths.train.exists());
    assert!(!data.root().join("out").exists());
}
