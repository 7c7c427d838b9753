//! JSON reports for evaluations, repeated experiments, and studies.
//!
//! Reports are written with sorted keys and 2-space indentation. Objects
//! pass through [`serde_json::Value`], whose map is ordered by key.

use crate::method::{ClassifierType, Method, PredictionTask};
use crate::metrics::{LinkPredictionMetrics, NodeClassificationMetrics};
use seffnet_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// `strftime` format of report timestamps.
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d-%H%M%S";

/// Local time formatted with [`REPORT_DATE_FORMAT`].
pub fn timestamp() -> String {
    chrono::Local::now().format(REPORT_DATE_FORMAT).to_string()
}

/// A report that can be rendered as JSON.
pub trait Report {
    /// Pretty-printed JSON with sorted keys.
    fn to_json(&self) -> Result<String>;

    /// Writes the report to `path`, replacing it only once fully written.
    fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_json()?;
        seffnet_core::write_all_or_nothing(path, |w| writeln!(w, "{content}"))
    }
}

fn sorted_json<T: Serialize>(report: &T) -> Result<String> {
    let value = serde_json::to_value(report)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

// ============================================================================
// Metrics
// ============================================================================

/// Metrics of either prediction task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskMetrics {
    /// Link-prediction scores.
    LinkPrediction(LinkPredictionMetrics),
    /// Node-classification scores.
    NodeClassification(NodeClassificationMetrics),
}

impl TaskMetrics {
    /// Task that produced these metrics.
    pub fn task(&self) -> PredictionTask {
        match self {
            TaskMetrics::LinkPrediction(_) => PredictionTask::LinkPrediction,
            TaskMetrics::NodeClassification(_) => PredictionTask::NodeClassification,
        }
    }

    /// Score maximized by studies: `auc_roc` for link prediction,
    /// `accuracy` for node classification.
    pub fn objective(&self) -> f64 {
        match self {
            TaskMetrics::LinkPrediction(m) => m.auc_roc,
            TaskMetrics::NodeClassification(m) => m.accuracy,
        }
    }
}

// ============================================================================
// Evaluation reports
// ============================================================================

/// Result of one evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Completion time, [`REPORT_DATE_FORMAT`].
    pub date: String,
    /// Embedding dimensionality.
    pub dimension: usize,
    /// Input graph path.
    pub input: String,
    /// Embedding method.
    pub method: Method,
    /// Held-out metrics.
    pub results: TaskMetrics,
    /// Operator.
    pub user: String,
}

impl Report for EvaluationReport {
    fn to_json(&self) -> Result<String> {
        sorted_json(self)
    }
}

/// Reports of a repeated experiment, keyed by run index.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RepeatReport {
    /// One report per run.
    pub runs: BTreeMap<usize, EvaluationReport>,
}

impl RepeatReport {
    /// Number of runs.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Whether no run was recorded.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

impl Report for RepeatReport {
    /// Run indices stay in numeric order.
    fn to_json(&self) -> Result<String> {
        let runs = self
            .runs
            .iter()
            .map(|(&i, report)| Ok((i, serde_json::to_value(report)?)))
            .collect::<Result<BTreeMap<usize, serde_json::Value>>>()?;
        Ok(serde_json::to_string_pretty(&runs)?)
    }
}

// ============================================================================
// Study reports
// ============================================================================

/// A sampled hyperparameter value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Integer parameter.
    Int(i64),
    /// Real parameter.
    Float(f64),
}

impl ParamValue {
    /// Value as `f64`.
    pub fn as_f64(&self) -> f64 {
        match *self {
            ParamValue::Int(v) => v as f64,
            ParamValue::Float(v) => v,
        }
    }

    /// Value as a non-negative integer; reals are truncated and negatives
    /// clamp to zero.
    pub fn as_usize(&self) -> usize {
        match *self {
            ParamValue::Int(v) => usize::try_from(v).unwrap_or(0),
            ParamValue::Float(v) => v.max(0.0) as usize,
        }
    }
}

/// Best trial of a study.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BestTrial {
    /// Classifier used.
    pub classifier: ClassifierType,
    /// Seed of the trial's own random generator.
    pub inner_seed: u64,
    /// Embedding method.
    pub method: Method,
    /// Metrics of the trial, inlined.
    #[serde(flatten)]
    pub metrics: TaskMetrics,
    /// Sampled hyperparameters.
    pub params: BTreeMap<String, ParamValue>,
    /// Trial number.
    pub trial: usize,
    /// Objective value.
    pub value: f64,
}

/// Summary of an optimization study.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StudyReport {
    /// Best trial.
    pub best: BestTrial,
    /// Study id.
    pub id: u64,
    /// Number of trials run.
    pub n_trials: usize,
    /// Study name.
    pub name: String,
    /// Task the study optimized.
    pub prediction_task: PredictionTask,
    /// Study seed.
    pub seed: u64,
    /// Study start time, [`REPORT_DATE_FORMAT`].
    pub start: String,
}

impl Report for StudyReport {
    fn to_json(&self) -> Result<String> {
        sorted_json(self)
    }
}
