//! Property-based tests for splitting invariants.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::{
        ClusterAssignment, ClusterLabel, EdgeData, GraphSplitter, KnowledgeGraph, Node,
        NodeIdMapping, build_clustered_edge_list,
    };
    use proptest::prelude::*;
    use std::collections::{BTreeSet, HashMap};

    struct Fixture {
        graph: KnowledgeGraph,
        clusters: ClusterAssignment,
        ids: NodeIdMapping,
    }

    /// Chemical → protein edges; chemical `i` is in cluster `assignment[i]`
    /// when that entry is `Some`.
    fn fixture(edges: &[(usize, usize)], assignment: &[Option<u8>]) -> Fixture {
        let mut graph = KnowledgeGraph::new();
        let mut ids = NodeIdMapping::new();
        let mut clusters = ClusterAssignment::new();
        for (i, label) in assignment.iter().enumerate() {
            if let Some(label) = label {
                clusters.insert(i.to_string(), ClusterLabel::Numeric(f64::from(*label) + 1.0));
            }
        }
        for &(c, p) in edges {
            let chem = Node::chemical(c.to_string());
            let prot = Node::protein(None, Some(format!("P{p}")));
            ids.insert(&chem, format!("c{c}"));
            ids.insert(&prot, format!("p{p}"));
            graph.add_edge_with_nodes(chem, prot, EdgeData::new(0.5)).unwrap();
        }
        Fixture {
            graph,
            clusters,
            ids,
        }
    }

    fn arb_case() -> impl Strategy<Value = (Vec<(usize, usize)>, Vec<Option<u8>>, u64)> {
        (
            prop::collection::vec((0usize..8, 0usize..6), 2..40),
            prop::collection::vec(prop::option::of(0u8..5), 8),
            any::<u64>(),
        )
    }

    fn distinct_clusters(f: &Fixture) -> usize {
        build_clustered_edge_list(&f.graph, &f.clusters, &f.ids)
            .unwrap()
            .into_iter()
            .map(|e| e.cluster)
            .collect::<BTreeSet<_>>()
            .len()
    }

    proptest! {
        #[test]
        fn test_split_edges_are_disjoint((edges, assignment, seed) in arb_case()) {
            let f = fixture(&edges, &assignment);
            prop_assume!(distinct_clusters(&f) >= 2);

            let split = GraphSplitter::default()
                .with_seed(seed)
                .split(&f.graph, &f.clusters, &f.ids)
                .unwrap();
            let shared: Vec<_> = split
                .train
                .edge_set()
                .intersection(&split.test.edge_set())
                .cloned()
                .collect();
            prop_assert!(shared.is_empty(), "shared edges: {:?}", shared);
        }

        #[test]
        fn test_test_nodes_appear_in_train((edges, assignment, seed) in arb_case()) {
            let f = fixture(&edges, &assignment);
            prop_assume!(distinct_clusters(&f) >= 2);

            let split = GraphSplitter::default()
                .with_seed(seed)
                .split(&f.graph, &f.clusters, &f.ids)
                .unwrap();
            for node in split.test.nodes() {
                prop_assert!(split.train.contains_node(node), "{} missing from train", node);
            }
        }

        #[test]
        fn test_unassigned_sources_share_default_cluster(
            (edges, assignment, _seed) in arb_case()
        ) {
            let f = fixture(&edges, &assignment);
            let clustered = build_clustered_edge_list(&f.graph, &f.clusters, &f.ids).unwrap();
            for edge in clustered {
                let chem: usize = edge.source.trim_start_matches('c').parse().unwrap();
                let expected = match assignment[chem] {
                    Some(label) => ClusterLabel::Numeric(f64::from(label) + 1.0),
                    None => ClusterLabel::Numeric(0.0),
                };
                prop_assert_eq!(edge.cluster, expected);
            }
        }

        #[test]
        fn test_clusters_never_straddle_partition((edges, assignment, seed) in arb_case()) {
            let f = fixture(&edges, &assignment);
            prop_assume!(distinct_clusters(&f) >= 2);

            let splitter = GraphSplitter::default().with_seed(seed);
            let clustered = build_clustered_edge_list(&f.graph, &f.clusters, &f.ids).unwrap();
            let partition = splitter.partition(&clustered).unwrap();

            let mut side: HashMap<&ClusterLabel, bool> = HashMap::new();
            for (indices, is_test) in [(&partition.train, false), (&partition.test, true)] {
                for &i in indices {
                    let previous = side.insert(&clustered[i].cluster, is_test);
                    prop_assert!(previous.is_none_or(|p| p == is_test));
                }
            }
            prop_assert_eq!(partition.train.len() + partition.test.len(), clustered.len());
        }
    }
}
