//! Integration tests for shortest-path subgraph extraction.

use rand::SeedableRng;
use rand::rngs::StdRng;
use seffnet_graph::{
    EdgeData, EntityDescriptor, KnowledgeGraph, MappingTable, Namespace, NameMapping, Node,
    SamplingPolicy, SubgraphExtractor, path_cost,
};

use crate::common::{chem, pheno, prot};

fn named_chemical(name: &str) -> Node {
    Node::new(Namespace::PubchemCompound).with_name(name)
}

fn names(mapping: &str) -> NameMapping {
    MappingTable::from_reader(mapping.as_bytes())
        .unwrap()
        .chemical_names()
}

fn rng() -> StdRng {
    StdRng::seed_from_u64(1234)
}

#[test]
fn test_scenario_b_three_equal_paths() {
    // chem1 reaches prot1 through three distinct two-hop routes.
    let mut graph = KnowledgeGraph::new();
    for hub in [pheno("nausea"), pheno("rash"), prot("protX")] {
        graph.add_edge_with_nodes(chem("chem1"), hub.clone(), EdgeData::new(0.7)).unwrap();
        graph.add_edge_with_nodes(hub, prot("prot1"), EdgeData::new(0.7)).unwrap();
    }
    let mapping = "namespace\tidentifier\tname\tnode_id\n\
        pubchem.compound\tchem1\taspirin\t1\n";

    let sub = SubgraphExtractor::new()
        .extract(
            &graph,
            &EntityDescriptor::chemical("chem1"),
            &EntityDescriptor::protein(None, Some("prot1".into())),
            false,
            &names(mapping),
            &mut rng(),
        )
        .unwrap();

    assert_eq!(sub.total_paths, 3);
    assert_eq!(sub.paths.len(), 3);
    assert_eq!(sub.graph.node_count(), 5);
    for node in [pheno("nausea"), pheno("rash"), prot("protX"), prot("prot1")] {
        assert!(sub.graph.contains_node(&node), "{node} missing");
    }
    assert!(sub.graph.contains_node(&named_chemical("aspirin")));
    assert!(!sub.graph.contains_node(&chem("chem1")));
    // Source first, in first-seen order.
    assert_eq!(sub.graph.nodes().next(), Some(&named_chemical("aspirin")));
}

#[test]
fn test_scenario_c_unnamed_chemical_keeps_identifier() {
    // chem1 - chem2 - prot1 is the only shortest route.
    let mut graph = KnowledgeGraph::new();
    graph.add_edge_with_nodes(chem("chem1"), chem("chem2"), EdgeData::new(0.8)).unwrap();
    graph.add_edge_with_nodes(chem("chem2"), prot("prot1"), EdgeData::new(0.8)).unwrap();
    let mapping = "namespace\tidentifier\tname\tnode_id\n\
        pubchem.compound\tchem1\taspirin\t1\n\
        pubchem.compound\tchem2\t\t2\n";

    let sub = SubgraphExtractor::new()
        .extract(
            &graph,
            &EntityDescriptor::chemical("chem1"),
            &EntityDescriptor::protein(None, Some("prot1".into())),
            true,
            &names(mapping),
            &mut rng(),
        )
        .unwrap();

    assert!(sub.graph.contains_node(&named_chemical("aspirin")));
    assert!(sub.graph.contains_node(&chem("chem2")));
    assert_eq!(sub.graph.node_count(), 3);
    assert_eq!(sub.graph.edge_count(), 2);
}

#[test]
fn test_weighted_costs_are_inverted_similarities() {
    // Direct edge is dissimilar (cost 0.9); the detour through protA costs 0.2.
    let mut graph = KnowledgeGraph::new();
    graph.add_edge_with_nodes(chem("chem1"), prot("prot1"), EdgeData::new(0.1)).unwrap();
    graph.add_edge_with_nodes(chem("chem1"), prot("protA"), EdgeData::new(0.9)).unwrap();
    graph.add_edge_with_nodes(prot("protA"), prot("prot1"), EdgeData::new(0.9)).unwrap();

    let source = EntityDescriptor::chemical("chem1");
    let target = EntityDescriptor::protein(None, Some("prot1".into()));
    let extractor = SubgraphExtractor::new();

    let weighted = extractor
        .extract(&graph, &source, &target, true, &NameMapping::new(), &mut rng())
        .unwrap();
    assert_eq!(weighted.paths, vec![vec![chem("chem1"), prot("protA"), prot("prot1")]]);
    assert!((weighted.distance - 0.2).abs() < 1e-9);

    // Each traversed edge costs exactly 1 - stored weight.
    let mut costs = graph.clone();
    costs.map_weights(|w| 1.0 - w);
    let undirected = costs.to_undirected();
    let indices: Vec<_> = weighted.paths[0]
        .iter()
        .map(|n| costs.get_index(n).unwrap())
        .collect();
    let expected: f64 = (1.0 - 0.9) + (1.0 - 0.9);
    assert!((path_cost(&undirected, &indices).unwrap() - expected).abs() < 1e-9);
    assert_eq!(weighted.path_costs.len(), 1);
    assert!((weighted.path_costs[0] - expected).abs() < 1e-9);
    for (_, _, data) in weighted.graph.edges() {
        assert!([0.1, 0.9].iter().any(|c| (data.weight - c).abs() < 1e-9));
    }

    let hops = extractor
        .extract(&graph, &source, &target, false, &NameMapping::new(), &mut rng())
        .unwrap();
    assert_eq!(hops.paths, vec![vec![chem("chem1"), prot("prot1")]]);
    assert!((hops.path_costs[0] - 0.9).abs() < 1e-9);
}

#[test]
fn test_sampling_cap_uses_exactly_ten_paths() {
    let mut graph = KnowledgeGraph::new();
    for i in 0..150 {
        let hub = prot(&format!("hub{i}"));
        graph.add_edge_with_nodes(chem("chem1"), hub.clone(), EdgeData::new(0.5)).unwrap();
        graph.add_edge_with_nodes(hub, pheno("fever"), EdgeData::new(0.5)).unwrap();
    }
    let source = EntityDescriptor::chemical("chem1");
    let target = EntityDescriptor::phenotype(Some("fever".into()), None);

    let sub = SubgraphExtractor::new()
        .extract(&graph, &source, &target, false, &NameMapping::new(), &mut rng())
        .unwrap();
    assert_eq!(sub.total_paths, 150);
    assert!(sub.sampled);
    assert_eq!(sub.paths.len(), 10);

    // Same seed, same sample.
    let again = SubgraphExtractor::new()
        .extract(&graph, &source, &target, false, &NameMapping::new(), &mut rng())
        .unwrap();
    assert_eq!(sub.paths, again.paths);

    // A raised threshold keeps every path.
    let all = SubgraphExtractor::new()
        .with_policy(SamplingPolicy {
            threshold: 200,
            sample_size: 10,
        })
        .extract(&graph, &source, &target, false, &NameMapping::new(), &mut rng())
        .unwrap();
    assert_eq!(all.paths.len(), 150);
}

#[test]
fn test_proteins_are_never_relabeled() {
    let mut graph = KnowledgeGraph::new();
    graph.add_edge_with_nodes(chem("chem1"), prot("prot1"), EdgeData::new(0.5)).unwrap();
    // A uniprot row with every field present must still be ignored.
    let mapping = "namespace\tidentifier\tname\tnode_id\n\
        uniprot\tprot1\tSOME_PROTEIN\t7\n\
        pubchem.compound\tchem1\taspirin\t1\n";

    let sub = SubgraphExtractor::new()
        .extract(
            &graph,
            &EntityDescriptor::chemical("chem1"),
            &EntityDescriptor::protein(None, Some("prot1".into())),
            true,
            &names(mapping),
            &mut rng(),
        )
        .unwrap();

    let protein = sub
        .graph
        .nodes()
        .find(|n| n.namespace == Namespace::Uniprot)
        .unwrap();
    assert_eq!(protein.identifier.as_deref(), Some("prot1"));
    assert!(protein.name.is_none());
}

#[test]
fn test_extract_from_saved_graph() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("fullgraph.json");
    let mut graph = KnowledgeGraph::new();
    graph.add_edge_with_nodes(chem("chem1"), pheno("nausea"), EdgeData::new(0.6).with_key("e1")).unwrap();
    graph.save_json(&path).unwrap();

    let loaded = KnowledgeGraph::from_json_path(&path).unwrap();
    let sub = SubgraphExtractor::new()
        .extract(
            &loaded,
            &EntityDescriptor::chemical("chem1"),
            &EntityDescriptor::phenotype(Some("nausea".into()), None),
            true,
            &NameMapping::new(),
            &mut rng(),
        )
        .unwrap();
    assert_eq!(sub.graph.edge_count(), 1);
    let (_, _, data) = sub.graph.edges().next().unwrap();
    assert_eq!(data.key.as_deref(), Some("e1"));
    assert!((data.weight - 0.4).abs() < 1e-9);
}
