//! Link prediction: held-out edge splits, negative sampling, Hadamard edge
//! features, and the edge classifier.

use crate::classifier::LogisticRegression;
use crate::embedding::Embeddings;
use crate::method::ClassifierType;
use crate::metrics::{LinkPredictionMetrics, link_prediction_metrics};
use ndarray::{Array1, Array2, aview1};
use rand::Rng;
use rand::seq::index;
use seffnet_core::Result;
use seffnet_graph::SimpleGraph;
use std::collections::HashSet;
use std::path::Path;

/// Fraction of edges held out by [`EvaluationGraphs::random_split`].
pub const DEFAULT_HELD_OUT_FRACTION: f64 = 0.2;

/// Pair counts up to which negatives are drawn from the full non-edge list.
const ENUMERATION_LIMIT: usize = 1 << 20;

/// An undirected edge as owned node ids.
pub type Edge = (String, String);

fn canonical(u: &str, v: &str) -> Edge {
    if u <= v {
        (u.to_string(), v.to_string())
    } else {
        (v.to_string(), u.to_string())
    }
}

// ============================================================================
// Evaluation graphs
// ============================================================================

/// Graphs used to train and score a link predictor.
#[derive(Clone, Debug)]
pub struct EvaluationGraphs {
    /// Every known edge; negatives are drawn from its complement.
    pub original: SimpleGraph,
    /// Graph the embeddings are trained on.
    pub train: SimpleGraph,
    /// Held-out positive edges.
    pub test_edges: Vec<Edge>,
}

impl EvaluationGraphs {
    /// Holds out `fraction` of the edges of `graph` at random.
    ///
    /// An edge is only removed while both of its endpoints keep another
    /// edge, so every held-out endpoint stays in the training graph. Nodes
    /// left without edges are dropped from the training graph.
    pub fn random_split<R: Rng + ?Sized>(graph: &SimpleGraph, fraction: f64, rng: &mut R) -> Self {
        let edges = graph.edge_list();
        let n_candidates = ((edges.len() as f64 * fraction) as usize).min(edges.len());
        let mut train = graph.clone();
        let mut test_edges = Vec::with_capacity(n_candidates);

        for i in index::sample(rng, edges.len(), n_candidates).into_iter() {
            let (u, v) = &edges[i];
            if train.degree(u) > 1 && train.degree(v) > 1 {
                train.remove_edge(u, v);
                test_edges.push((u.clone(), v.clone()));
            }
        }
        train.remove_isolates();

        log::info!(
            "Held out {} of {} edges ({} candidates)",
            test_edges.len(),
            edges.len(),
            n_candidates
        );
        Self {
            original: graph.clone(),
            train,
            test_edges,
        }
    }

    /// Uses explicit train and test edge lists; the original graph is their
    /// union.
    pub fn from_edge_lists(train: SimpleGraph, test: &SimpleGraph) -> Self {
        let mut original = train.clone();
        original.extend_from(test);
        Self {
            original,
            train,
            test_edges: test.edge_list(),
        }
    }

    /// Reads train and test edge-list files.
    pub fn read(training_path: &Path, testing_path: &Path) -> Result<Self> {
        seffnet_core::require_file("training edge list", training_path)?;
        seffnet_core::require_file("testing edge list", testing_path)?;
        let train = SimpleGraph::read_edgelist(training_path)?;
        let test = SimpleGraph::read_edgelist(testing_path)?;
        Ok(Self::from_edge_lists(train, &test))
    }
}

// ============================================================================
// Negative sampling
// ============================================================================

/// Draws up to `count` distinct node pairs that are not edges of `graph`.
///
/// Fewer pairs are returned when the graph has fewer non-edges.
pub fn sample_negative_edges<R: Rng + ?Sized>(
    graph: &SimpleGraph,
    count: usize,
    rng: &mut R,
) -> Vec<Edge> {
    let nodes: Vec<&str> = graph.nodes().collect();
    let n = nodes.len();
    let total_pairs = n * n.saturating_sub(1) / 2;
    let available = total_pairs.saturating_sub(graph.edge_count());
    let count = count.min(available);
    if count == 0 {
        return Vec::new();
    }

    if total_pairs <= ENUMERATION_LIMIT || count * 2 >= available {
        let mut non_edges = Vec::with_capacity(available);
        for (i, u) in nodes.iter().enumerate() {
            for v in &nodes[i + 1..] {
                if !graph.has_edge(u, v) {
                    non_edges.push((u.to_string(), v.to_string()));
                }
            }
        }
        let picked = index::sample(rng, non_edges.len(), count);
        return picked.into_iter().map(|i| non_edges[i].clone()).collect();
    }

    let mut seen: HashSet<Edge> = HashSet::with_capacity(count);
    let mut negatives = Vec::with_capacity(count);
    while negatives.len() < count {
        let u = nodes[rng.gen_range(0..n)];
        let v = nodes[rng.gen_range(0..n)];
        if u == v || graph.has_edge(u, v) {
            continue;
        }
        if seen.insert(canonical(u, v)) {
            negatives.push((u.to_string(), v.to_string()));
        }
    }
    negatives
}

// ============================================================================
// Features
// ============================================================================

/// Hadamard products of endpoint embeddings, one row per edge. Edges with
/// an unembedded endpoint get a zero row.
pub fn edge_features(embeddings: &Embeddings, edges: &[Edge]) -> Array2<f64> {
    let mut features = Array2::zeros((edges.len(), embeddings.dimensions()));
    let mut missing = 0usize;

    for ((u, v), mut row) in edges.iter().zip(features.rows_mut()) {
        match (embeddings.get(u), embeddings.get(v)) {
            (Some(a), Some(b)) => row.assign(&(&aview1(a) * &aview1(b))),
            (a, b) => missing += usize::from(a.is_none()) + usize::from(b.is_none()),
        }
    }

    if missing > 0 {
        log::warn!("{missing} edge endpoints have no embedding; using zero vectors");
    }
    features
}

fn labelled_features(
    embeddings: &Embeddings,
    positives: &[Edge],
    negatives: &[Edge],
) -> (Array2<f64>, Array1<bool>) {
    let edges: Vec<Edge> = positives.iter().chain(negatives).cloned().collect();
    let labels = std::iter::repeat_n(true, positives.len())
        .chain(std::iter::repeat_n(false, negatives.len()))
        .collect();
    (edge_features(embeddings, &edges), labels)
}

// ============================================================================
// Training and scoring
// ============================================================================

/// A fitted edge classifier with its held-out scores.
#[derive(Clone, Debug)]
pub struct LinkPredictionOutcome {
    /// Held-out metrics.
    pub metrics: LinkPredictionMetrics,
    /// Fitted classifier.
    pub model: LogisticRegression,
}

/// Fits an edge classifier on every edge of `original` against as many
/// sampled non-edges. Used when no held-out evaluation is wanted.
pub fn create_prediction_model<R: Rng + ?Sized>(
    embeddings: &Embeddings,
    original: &SimpleGraph,
    classifier_type: ClassifierType,
    rng: &mut R,
) -> Result<LogisticRegression> {
    let positives = original.edge_list();
    let negatives = sample_negative_edges(original, positives.len(), rng);
    let (features, labels) = labelled_features(embeddings, &positives, &negatives);
    log::info!(
        "Fitting {classifier_type} edge classifier on {} positive and {} negative edges",
        positives.len(),
        negatives.len()
    );
    LogisticRegression::fit(classifier_type, &features, &labels)
}

/// Fits an edge classifier on the training graph and scores it on the
/// held-out edges.
pub fn do_link_prediction<R: Rng + ?Sized>(
    embeddings: &Embeddings,
    graphs: &EvaluationGraphs,
    classifier_type: ClassifierType,
    rng: &mut R,
) -> Result<LinkPredictionOutcome> {
    let train_positives = graphs.train.edge_list();
    let train_negatives = sample_negative_edges(&graphs.original, train_positives.len(), rng);
    let (features, labels) = labelled_features(embeddings, &train_positives, &train_negatives);
    let model = LogisticRegression::fit(classifier_type, &features, &labels)?;

    let test_negatives = sample_negative_edges(&graphs.original, graphs.test_edges.len(), rng);
    let (test_features, truth) = labelled_features(embeddings, &graphs.test_edges, &test_negatives);
    let scores = model.predict_proba(&test_features)?;
    let metrics = link_prediction_metrics(truth.view(), scores.view());
    log::debug!(
        "Link prediction: auc_roc={:.4} auc_pr={:.4} over {} test edges",
        metrics.auc_roc,
        metrics.auc_pr,
        truth.len()
    );
    Ok(LinkPredictionOutcome { metrics, model })
}
