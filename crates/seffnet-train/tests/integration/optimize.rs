//! OptimizationOrchestrator studies over edge-list files.

use crate::common::{communities, community_methods, top_level_keys, write_graph, write_labels};
use seffnet_train::{
    ClassifierType, Method, OptimizationOrchestrator, OptimizationRequest, ParamValue,
    PredictionTask, Report,
};
use tempfile::TempDir;

#[test]
fn test_link_prediction_study_report() {
    let dir = TempDir::new().unwrap();
    let input = write_graph(dir.path(), "input.edgelist", &communities(5));
    let request = OptimizationRequest::new(&input, Method::Node2Vec, "node2vec-study")
        .with_trials(4)
        .with_dimensions_range(16, 64)
        .with_classifier(ClassifierType::ElasticNet)
        .with_seed(7);

    let study = OptimizationOrchestrator::new(community_methods())
        .optimize(&request)
        .unwrap();
    let report = study.report(request.prediction_task).unwrap();
    let path = dir.path().join("study.json");
    report.save(&path).unwrap();

    let json = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        top_level_keys(&json),
        vec!["best", "id", "n_trials", "name", "prediction_task", "seed", "start"]
    );
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["n_trials"], 4);
    assert_eq!(value["prediction_task"], "link_prediction");
    assert_eq!(value["best"]["method"], "node2vec");
    assert_eq!(value["best"]["classifier"], "EN");
    assert!(value["best"]["auc_roc"].as_f64().unwrap() > 0.99);
    assert_eq!(value["best"]["value"], value["best"]["auc_roc"]);

    let ParamValue::Int(dimensions) = report.best.params["dimensions"] else {
        unreachable!("Expected integer dimensions");
    };
    assert!((16..=64).contains(&dimensions));
    assert!(report.best.params.contains_key("p"));
}

#[test]
fn test_node_classification_study() {
    let dir = TempDir::new().unwrap();
    let graph = communities(5);
    let input = write_graph(dir.path(), "input.edgelist", &graph);
    let labels = write_labels(dir.path(), &graph);
    let request = OptimizationRequest::new(&input, Method::Sdne, "sdne-study")
        .with_trials(2)
        .with_prediction_task(PredictionTask::NodeClassification)
        .with_labels_file(&labels);

    let study = OptimizationOrchestrator::new(community_methods())
        .optimize(&request)
        .unwrap();
    let report = study.report(request.prediction_task).unwrap();
    let value = serde_json::to_value(&report).unwrap();
    let best = value["best"].as_object().unwrap();
    for key in ["accuracy", "macro_f1", "micro_f1", "mcc", "inner_seed", "params"] {
        assert!(best.contains_key(key), "missing {key}");
    }
    assert!(!best.contains_key("auc_roc"));
    assert_eq!(report.best.value, 1.0);
}
