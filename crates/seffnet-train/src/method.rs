//! Embedding methods, prediction tasks, classifiers, and their parameters.

use seffnet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Method
// ============================================================================

/// Network representation learning method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Method {
    /// High-Order Proximity preserved Embedding.
    #[serde(rename = "HOPE")]
    Hope,
    /// DeepWalk random-walk skip-gram.
    DeepWalk,
    /// node2vec biased random walks.
    #[serde(rename = "node2vec")]
    Node2Vec,
    /// GraRep k-step representations.
    GraRep,
    /// Structural Deep Network Embedding.
    #[serde(rename = "SDNE")]
    Sdne,
    /// Large-scale Information Network Embedding.
    #[serde(rename = "LINE")]
    Line,
}

impl Method {
    /// Every method, in table order.
    pub const ALL: [Method; 6] = [
        Method::Hope,
        Method::DeepWalk,
        Method::Node2Vec,
        Method::GraRep,
        Method::Sdne,
        Method::Line,
    ];

    /// Canonical method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Hope => "HOPE",
            Method::DeepWalk => "DeepWalk",
            Method::Node2Vec => "node2vec",
            Method::GraRep => "GraRep",
            Method::Sdne => "SDNE",
            Method::Line => "LINE",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| {
                Error::config(format!(
                    "unknown method '{s}': expected one of HOPE, DeepWalk, node2vec, GraRep, SDNE, LINE"
                ))
            })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// PredictionTask
// ============================================================================

/// Downstream task used to score embeddings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionTask {
    /// Predict held-out edges.
    #[default]
    LinkPrediction,
    /// Predict node labels.
    NodeClassification,
}

impl PredictionTask {
    /// Task name as written in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionTask::LinkPrediction => "link_prediction",
            PredictionTask::NodeClassification => "node_classification",
        }
    }
}

impl FromStr for PredictionTask {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "link_prediction" => Ok(PredictionTask::LinkPrediction),
            "node_classification" => Ok(PredictionTask::NodeClassification),
            other => Err(Error::config(format!(
                "unknown prediction task '{other}': expected link_prediction or node_classification"
            ))),
        }
    }
}

impl fmt::Display for PredictionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ClassifierType
// ============================================================================

/// Predictive model trained on top of the embeddings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassifierType {
    /// L2-regularized logistic regression.
    #[default]
    #[serde(rename = "LR")]
    LogisticRegression,
    /// Elastic-net regularized logistic regression.
    #[serde(rename = "EN")]
    ElasticNet,
}

impl ClassifierType {
    /// Short classifier name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierType::LogisticRegression => "LR",
            ClassifierType::ElasticNet => "EN",
        }
    }
}

impl FromStr for ClassifierType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LR" => Ok(ClassifierType::LogisticRegression),
            "EN" => Ok(ClassifierType::ElasticNet),
            other => Err(Error::config(format!(
                "unknown classifier '{other}': expected LR or EN"
            ))),
        }
    }
}

impl fmt::Display for ClassifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// EmbeddingParams
// ============================================================================

/// Hyperparameters passed to an embedding method. Each method reads only the
/// fields it uses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingParams {
    /// Embedding dimensionality.
    pub dimensions: usize,
    /// Walks started per node (DeepWalk, node2vec).
    pub number_walks: usize,
    /// Length of each walk (DeepWalk, node2vec).
    pub walk_length: usize,
    /// Skip-gram window (DeepWalk, node2vec).
    pub window_size: usize,
    /// Return parameter (node2vec).
    pub p: f64,
    /// In-out parameter (node2vec).
    pub q: f64,
    /// First-order proximity weight (SDNE).
    pub alpha: f64,
    /// Reconstruction weight of non-zero elements (SDNE).
    pub beta: f64,
    /// Training epochs (SDNE, LINE).
    pub epochs: usize,
    /// Transition steps (GraRep).
    pub kstep: usize,
    /// Proximity order (LINE).
    pub order: usize,
    /// Whether edge weights are used.
    pub weighted: bool,
}

impl Default for EmbeddingParams {
    fn default() -> Self {
        Self {
            dimensions: 300,
            number_walks: 8,
            walk_length: 8,
            window_size: 4,
            p: 1.5,
            q: 2.1,
            alpha: 0.1,
            beta: 4.0,
            epochs: 5,
            kstep: 4,
            order: 3,
            weighted: false,
        }
    }
}
