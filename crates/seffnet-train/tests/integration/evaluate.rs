//! TrainingOrchestrator runs over edge-list files.

use crate::common::{communities, community_methods, top_level_keys, write_graph, write_labels};
use seffnet_core::Error;
use seffnet_graph::{
    ClusterAssignment, ClusterLabel, EdgeData, GraphSplitter, KnowledgeGraph, Node, NodeIdMapping,
};
use seffnet_train::{
    CommandEmbedding, EvaluationReport, EvaluationRequest, Method, MethodTable, PredictionTask,
    PredictiveModel, Report, TaskMetrics, TrainingOrchestrator,
};
use std::sync::Arc;
use tempfile::TempDir;

// ----------------------------------------------------------------------------
// Link prediction
// ----------------------------------------------------------------------------

#[test]
fn test_evaluation_report_written_with_sorted_keys() {
    let dir = TempDir::new().unwrap();
    let input = write_graph(dir.path(), "input.edgelist", &communities(6));
    let request = EvaluationRequest::new(&input, Method::Node2Vec).with_seed(3);
    let orchestrator = TrainingOrchestrator::new(community_methods());

    let report = orchestrator.evaluate(&request).unwrap();
    let path = dir.path().join("evaluation.json");
    report.save(&path).unwrap();

    let json = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        top_level_keys(&json),
        vec!["date", "dimension", "input", "method", "results", "user"]
    );
    let parsed: EvaluationReport = serde_json::from_str(&json).unwrap();
    let TaskMetrics::LinkPrediction(metrics) = parsed.results else {
        unreachable!("Expected link-prediction metrics");
    };
    assert!(metrics.auc_roc > 0.99);
    assert!(metrics.mcc > 0.9);
}

#[test]
fn test_evaluate_on_cluster_split() {
    let mut graph = KnowledgeGraph::new();
    let mut ids = NodeIdMapping::new();
    let mut clusters = ClusterAssignment::new();
    for i in 0..12 {
        let chem = Node::chemical(format!("{i}"));
        ids.insert(&chem, format!("a{i}"));
        clusters.insert(format!("{i}"), ClusterLabel::Numeric((i % 4) as f64));
        for j in [i % 3, (i + 1) % 3] {
            let prot = Node::protein(None, Some(format!("P{j}")));
            ids.insert(&prot, format!("b{j}"));
            graph.add_edge_with_nodes(chem.clone(), prot, EdgeData::new(0.7)).unwrap();
        }
    }
    let split = GraphSplitter::default().split(&graph, &clusters, &ids).unwrap();

    let dir = TempDir::new().unwrap();
    let train = write_graph(dir.path(), "train.edgelist", &split.train);
    let test = write_graph(dir.path(), "test.edgelist", &split.test);
    let model_path = dir.path().join("predictive.json");
    let request = EvaluationRequest::new(dir.path().join("fullgraph.json"), Method::GraRep)
        .with_split_files(&train, &test)
        .with_predictive_model_path(&model_path);

    let report = TrainingOrchestrator::new(community_methods())
        .evaluate(&request)
        .unwrap();
    assert_eq!(report.results.task(), PredictionTask::LinkPrediction);
    assert!(matches!(
        PredictiveModel::load(&model_path).unwrap(),
        PredictiveModel::Binary(_)
    ));
}

#[test]
fn test_missing_split_file() {
    let dir = TempDir::new().unwrap();
    let train = write_graph(dir.path(), "train.edgelist", &communities(3));
    let request = EvaluationRequest::new(&train, Method::Hope)
        .with_split_files(&train, dir.path().join("absent.edgelist"));
    let err = TrainingOrchestrator::new(community_methods())
        .evaluate(&request)
        .unwrap_err();
    assert!(matches!(err, Error::MissingInputFile { .. }));
}

// ----------------------------------------------------------------------------
// Node classification and repeats
// ----------------------------------------------------------------------------

#[test]
fn test_node_classification_from_labels_file() {
    let dir = TempDir::new().unwrap();
    let graph = communities(5);
    let input = write_graph(dir.path(), "input.edgelist", &graph);
    let labels = write_labels(dir.path(), &graph);
    let request = EvaluationRequest::new(&input, Method::Line)
        .with_prediction_task(PredictionTask::NodeClassification)
        .with_labels_file(&labels);

    let report = TrainingOrchestrator::new(community_methods())
        .evaluate(&request)
        .unwrap();
    let TaskMetrics::NodeClassification(metrics) = report.results else {
        unreachable!("Expected node-classification metrics");
    };
    assert!((metrics.accuracy - 1.0).abs() < 1e-9);
    assert!((metrics.micro_f1 - metrics.accuracy).abs() < 1e-12);
}

#[test]
fn test_repeat_report_keyed_by_run() {
    let dir = TempDir::new().unwrap();
    let input = write_graph(dir.path(), "input.edgelist", &communities(5));
    let request = EvaluationRequest::new(&input, Method::DeepWalk);
    let report = TrainingOrchestrator::new(community_methods())
        .repeat_experiment(&request, 11)
        .unwrap();
    assert_eq!(report.len(), 11);

    let json = report.to_json().unwrap();
    let keys: Vec<usize> = top_level_keys(&json)
        .iter()
        .map(|k| k.parse().unwrap())
        .collect();
    assert_eq!(keys, (0..11).collect::<Vec<_>>());
}

// ----------------------------------------------------------------------------
// External program backend
// ----------------------------------------------------------------------------

#[cfg(unix)]
const COMMUNITY_SCRIPT: &str = r#"
while [ $# -gt 0 ]; do
    case "$1" in
        --input) src="$2" ;;
        --output) out="$2" ;;
    esac
    shift
done
nodes=$(tr ' ' '\n' < "$src" | sort -u)
count=$(printf '%s\n' "$nodes" | wc -l)
{
    echo "$count 3"
    for n in $nodes; do
        case "$n" in
            a*) echo "$n 1 0 0" ;;
            b*) echo "$n 0 1 0" ;;
            *) echo "$n 0 0 1" ;;
        esac
    done
} > "$out"
"#;

#[cfg(unix)]
#[test]
fn test_command_backend_end_to_end() {
    let table = Method::ALL.into_iter().fold(MethodTable::new(), |table, method| {
        table.with(
            method,
            Arc::new(
                CommandEmbedding::new(method, "sh").with_args(["-c", COMMUNITY_SCRIPT, "sh"]),
            ),
        )
    });
    let dir = TempDir::new().unwrap();
    let input = write_graph(dir.path(), "input.edgelist", &communities(5));
    let embeddings = dir.path().join("embeddings.txt");
    let request = EvaluationRequest::new(&input, Method::Sdne).with_embeddings_path(&embeddings);

    let report = TrainingOrchestrator::new(table).evaluate(&request).unwrap();
    let TaskMetrics::LinkPrediction(metrics) = report.results else {
        unreachable!("Expected link-prediction metrics");
    };
    assert!(metrics.auc_roc > 0.99);
    assert!(embeddings.exists());
}

#[test]
fn test_backend_failure_writes_nothing() {
    let table = MethodTable::new().with_all(Arc::new(CommandEmbedding::new(
        Method::Hope,
        "definitely-not-an-embedding-program",
    )));
    let dir = TempDir::new().unwrap();
    let input = write_graph(dir.path(), "input.edgelist", &communities(4));
    let model_path = dir.path().join("predictive.json");
    let request =
        EvaluationRequest::new(&input, Method::Hope).with_predictive_model_path(&model_path);
    let err = TrainingOrchestrator::new(table).evaluate(&request).unwrap_err();
    assert!(matches!(err, Error::Backend { .. }));
    assert!(!model_path.exists());
}
