//! Node classification over node embeddings.

use crate::classifier::OneVsRest;
use crate::embedding::Embeddings;
use crate::method::ClassifierType;
use crate::metrics::{NodeClassificationMetrics, node_classification_metrics};
use ndarray::{Array2, aview1};
use rand::Rng;
use rand::seq::SliceRandom;
use seffnet_core::{Error, Result};
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Fraction of labeled nodes held out for scoring.
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Labeled nodes, in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeLabels {
    /// Node ids.
    pub nodes: Vec<String>,
    /// Label of each node, aligned with `nodes`.
    pub labels: Vec<String>,
}

impl NodeLabels {
    /// Number of labeled nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node is labeled.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parses `node label` lines. Blank lines are skipped and columns past
    /// the second are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut labels = Self::default();
        for (number, line) in BufReader::new(reader).lines().enumerate() {
            let line = line.map_err(|e| Error::parse(format!("labels line {}: {e}", number + 1)))?;
            let mut columns = line.split_whitespace();
            match (columns.next(), columns.next()) {
                (None, _) => continue,
                (Some(node), Some(label)) => {
                    labels.nodes.push(node.to_string());
                    labels.labels.push(label.to_string());
                }
                (Some(_), None) => {
                    return Err(Error::parse(format!(
                        "labels line {}: expected 'node label', got '{}'",
                        number + 1,
                        line.trim()
                    )));
                }
            }
        }
        Ok(labels)
    }

    /// Reads a labels file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        seffnet_core::require_file("labels", path)?;
        let file = std::fs::File::open(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_reader(file)
    }
}

/// A fitted node classifier with its held-out scores.
#[derive(Clone, Debug)]
pub struct NodeClassificationOutcome {
    /// Held-out metrics.
    pub metrics: NodeClassificationMetrics,
    /// Fitted classifier.
    pub model: OneVsRest,
}

fn node_features(embeddings: &Embeddings, nodes: &[&str]) -> Array2<f64> {
    let mut features = Array2::zeros((nodes.len(), embeddings.dimensions()));
    let mut missing = 0usize;
    for (node, mut row) in nodes.iter().zip(features.rows_mut()) {
        match embeddings.get(node) {
            Some(vector) => row.assign(&aview1(vector)),
            None => missing += 1,
        }
    }
    if missing > 0 {
        log::warn!("{missing} labeled nodes have no embedding; using zero vectors");
    }
    features
}

/// Shuffles the labeled nodes, fits a one-vs-rest classifier on 80% of
/// them, and scores it on the rest.
pub fn do_node_classification<R: Rng + ?Sized>(
    embeddings: &Embeddings,
    labels: &NodeLabels,
    classifier_type: ClassifierType,
    rng: &mut R,
) -> Result<NodeClassificationOutcome> {
    let n = labels.len();
    let n_test = (n as f64 * DEFAULT_TEST_SIZE).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(Error::config(format!(
            "node classification needs at least 2 labeled nodes, got {n}"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    let (test, train) = order.split_at(n_test);

    let train_nodes: Vec<&str> = train.iter().map(|&i| labels.nodes[i].as_str()).collect();
    let train_labels: Vec<String> = train.iter().map(|&i| labels.labels[i].clone()).collect();
    let train_features = node_features(embeddings, &train_nodes);
    let model = OneVsRest::fit(classifier_type, &train_features, &train_labels)?;
    log::info!(
        "Fitted {classifier_type} node classifier over {} classes on {} nodes",
        model.classes.len(),
        train.len()
    );

    let test_nodes: Vec<&str> = test.iter().map(|&i| labels.nodes[i].as_str()).collect();
    let truth: Vec<String> = test.iter().map(|&i| labels.labels[i].clone()).collect();
    let test_features = node_features(embeddings, &test_nodes);
    let predicted = model.predict(&test_features)?;
    let metrics = node_classification_metrics(&truth, &predicted);
    Ok(NodeClassificationOutcome { metrics, model })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tempfile::TempDir;

    #[test]
    fn test_parse_labels() {
        let labels = NodeLabels::from_reader("a x\n\nb y extra\n".as_bytes()).unwrap();
        assert_eq!(labels.nodes, vec!["a", "b"]);
        assert_eq!(labels.labels, vec!["x", "y"]);
    }

    #[test]
    fn test_parse_labels_rejects_missing_label() {
        let err = NodeLabels::from_reader("a x\nb\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = NodeLabels::read(dir.path().join("labels.txt")).unwrap_err();
        assert!(matches!(err, Error::MissingInputFile { .. }));
    }

    #[test]
    fn test_classifies_separable_nodes() {
        let mut embeddings = Embeddings::new(2);
        let mut labels = NodeLabels::default();
        for i in 0..10 {
            let (label, vector) = if i % 2 == 0 {
                ("even", vec![2.0, 0.1 * i as f64])
            } else {
                ("odd", vec![-2.0, 0.1 * i as f64])
            };
            let node = format!("n{i}");
            embeddings.insert(node.clone(), vector).unwrap();
            labels.nodes.push(node);
            labels.labels.push(label.to_string());
        }

        let mut rng = StdRng::seed_from_u64(5);
        let outcome =
            do_node_classification(&embeddings, &labels, ClassifierType::LogisticRegression, &mut rng)
                .unwrap();
        assert_eq!(outcome.model.classes, vec!["even", "odd"]);
        assert!((outcome.metrics.accuracy - 1.0).abs() < 1e-9);
        assert!((outcome.metrics.macro_f1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_requires_two_nodes() {
        let labels = NodeLabels {
            nodes: vec!["a".to_string()],
            labels: vec!["x".to_string()],
        };
        let mut rng = StdRng::seed_from_u64(0);
        let err = do_node_classification(
            &Embeddings::new(2),
            &labels,
            ClassifierType::LogisticRegression,
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
