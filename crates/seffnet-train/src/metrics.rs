//! Classification metrics reported by link prediction and node
//! classification.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Link-prediction scores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkPredictionMetrics {
    /// Area under the ROC curve.
    pub auc_roc: f64,
    /// Area under the precision-recall curve (average precision).
    pub auc_pr: f64,
    /// Accuracy at threshold 0.5.
    pub accuracy: f64,
    /// F1 of the positive class at threshold 0.5.
    pub f1: f64,
    /// Matthews correlation coefficient at threshold 0.5.
    pub mcc: f64,
}

/// Node-classification scores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeClassificationMetrics {
    /// Accuracy.
    pub accuracy: f64,
    /// Unweighted mean of per-class F1.
    pub macro_f1: f64,
    /// F1 over pooled decisions.
    pub micro_f1: f64,
    /// Multi-class Matthews correlation coefficient.
    pub mcc: f64,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

// ============================================================================
// Binary metrics
// ============================================================================

/// Scores `scores` against `truth`, thresholding at 0.5 for the decision
/// metrics.
pub fn link_prediction_metrics(
    truth: ArrayView1<'_, bool>,
    scores: ArrayView1<'_, f64>,
) -> LinkPredictionMetrics {
    let predicted = scores.mapv(|s| s >= 0.5);
    let (mut tp, mut fp, mut tn, mut fn_) = (0.0, 0.0, 0.0, 0.0);
    for (&t, &p) in truth.iter().zip(&predicted) {
        match (t, p) {
            (true, true) => tp += 1.0,
            (false, true) => fp += 1.0,
            (false, false) => tn += 1.0,
            (true, false) => fn_ += 1.0,
        }
    }
    let mcc_denominator: f64 = (tp + fp) * (tp + fn_) * (tn + fp) * (tn + fn_);
    LinkPredictionMetrics {
        auc_roc: roc_auc(truth, scores),
        auc_pr: average_precision(truth, scores),
        accuracy: ratio(tp + tn, truth.len() as f64),
        f1: ratio(2.0 * tp, 2.0 * tp + fp + fn_),
        mcc: ratio(tp * tn - fp * fn_, mcc_denominator.sqrt()),
    }
}

/// Area under the ROC curve via average ranks; ties share their mean rank.
/// Returns 0.5 when only one class is present.
pub fn roc_auc(truth: ArrayView1<'_, bool>, scores: ArrayView1<'_, f64>) -> f64 {
    let positives = truth.iter().filter(|&&t| t).count() as f64;
    let negatives = truth.len() as f64 - positives;
    if positives == 0.0 || negatives == 0.0 {
        return 0.5;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && scores[order[end + 1]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based.
        let mean_rank = (start + end) as f64 / 2.0 + 1.0;
        for &i in &order[start..=end] {
            if truth[i] {
                positive_rank_sum += mean_rank;
            }
        }
        start = end + 1;
    }

    (positive_rank_sum - positives * (positives + 1.0) / 2.0) / (positives * negatives)
}

/// Average precision: precision at each distinct score threshold weighted by
/// the recall gained there.
pub fn average_precision(truth: ArrayView1<'_, bool>, scores: ArrayView1<'_, f64>) -> f64 {
    let positives = truth.iter().filter(|&&t| t).count() as f64;
    if positives == 0.0 {
        return 0.0;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let (mut tp, mut fp) = (0.0, 0.0);
    let mut previous_recall = 0.0;
    let mut precision_sum = 0.0;
    let mut position = 0;
    while position < order.len() {
        let threshold = scores[order[position]];
        while position < order.len() && scores[order[position]] == threshold {
            if truth[order[position]] {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            position += 1;
        }
        let recall = tp / positives;
        precision_sum += (recall - previous_recall) * (tp / (tp + fp));
        previous_recall = recall;
    }
    precision_sum
}

// ============================================================================
// Multi-class metrics
// ============================================================================

/// Scores multi-class predictions.
pub fn node_classification_metrics(
    truth: &[String],
    predicted: &[String],
) -> NodeClassificationMetrics {
    let n = truth.len() as f64;
    let mut true_counts: BTreeMap<&str, f64> = BTreeMap::new();
    let mut predicted_counts: BTreeMap<&str, f64> = BTreeMap::new();
    let mut hits: BTreeMap<&str, f64> = BTreeMap::new();
    let mut correct = 0.0;

    for (t, p) in truth.iter().zip(predicted) {
        *true_counts.entry(t).or_default() += 1.0;
        *predicted_counts.entry(p).or_default() += 1.0;
        hits.entry(t).or_default();
        hits.entry(p).or_default();
        if t == p {
            correct += 1.0;
            *hits.entry(t).or_default() += 1.0;
        }
    }

    let macro_f1 = if hits.is_empty() {
        0.0
    } else {
        let total: f64 = hits
            .iter()
            .map(|(class, &tp)| {
                let t = true_counts.get(class).copied().unwrap_or(0.0);
                let p = predicted_counts.get(class).copied().unwrap_or(0.0);
                ratio(2.0 * tp, t + p)
            })
            .sum();
        total / hits.len() as f64
    };

    let sum_pt: f64 = hits
        .keys()
        .map(|class| {
            predicted_counts.get(class).copied().unwrap_or(0.0)
                * true_counts.get(class).copied().unwrap_or(0.0)
        })
        .sum();
    let sum_p2: f64 = predicted_counts.values().map(|p| p * p).sum();
    let sum_t2: f64 = true_counts.values().map(|t| t * t).sum();
    let mcc_denominator = ((n * n - sum_p2) * (n * n - sum_t2)).sqrt();

    let accuracy = ratio(correct, n);
    NodeClassificationMetrics {
        accuracy,
        macro_f1,
        // Single-label micro F1 equals accuracy.
        micro_f1: accuracy,
        mcc: ratio(correct * n - sum_pt, mcc_denominator),
    }
}
