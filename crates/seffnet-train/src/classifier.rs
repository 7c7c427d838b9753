//! Logistic-regression classifiers trained on embedding features.
//!
//! - [`ClassifierType::LogisticRegression`]: L2 penalty, `C = 1`.
//! - [`ClassifierType::ElasticNet`]: equal L1/L2 mix, `C = 1`, solved by
//!   proximal gradient steps.
//!
//! Multi-class problems are handled one-vs-rest.

use crate::method::ClassifierType;
use ndarray::{Array1, Array2, Axis};
use seffnet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

const LEARNING_RATE: f64 = 0.5;
const MAX_ITERATIONS: usize = 1000;
const TOLERANCE: f64 = 1e-7;
const INVERSE_REGULARIZATION: f64 = 1.0;
const L1_RATIO: f64 = 0.5;

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

fn check_training_set(x: &Array2<f64>, labels_len: usize) -> Result<()> {
    if x.nrows() == 0 {
        return Err(Error::backend("cannot fit a classifier on an empty training set"));
    }
    if x.nrows() != labels_len {
        return Err(Error::backend(format!(
            "{} feature rows but {labels_len} labels",
            x.nrows()
        )));
    }
    Ok(())
}

// ============================================================================
// Binary logistic regression
// ============================================================================

/// A fitted binary logistic-regression model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Penalty used when fitting.
    pub classifier_type: ClassifierType,
    /// Feature weights.
    pub weights: Array1<f64>,
    /// Intercept (not penalized).
    pub bias: f64,
}

impl LogisticRegression {
    /// Fits a model by full-batch gradient descent on the mean log-loss.
    pub fn fit(
        classifier_type: ClassifierType,
        x: &Array2<f64>,
        labels: &Array1<bool>,
    ) -> Result<Self> {
        check_training_set(x, labels.len())?;
        let y = labels.mapv(|label| if label { 1.0 } else { 0.0 });
        let n_samples = x.nrows() as f64;
        let strength = 1.0 / (INVERSE_REGULARIZATION * n_samples);
        let (l1, l2) = match classifier_type {
            ClassifierType::LogisticRegression => (0.0, strength),
            ClassifierType::ElasticNet => (strength * L1_RATIO, strength * (1.0 - L1_RATIO)),
        };

        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut bias: f64 = 0.0;

        for iteration in 0..MAX_ITERATIONS {
            let linear = x.dot(&weights) + bias;
            let errors = &linear.mapv(sigmoid) - &y;
            let dw = x.t().dot(&errors) / n_samples + &weights * l2;
            let db = errors.sum() / n_samples;

            // L1 enters as a proximal step after the smooth update.
            let updated = (&weights - &(dw * LEARNING_RATE))
                .mapv(|w| soft_threshold(w, LEARNING_RATE * l1));
            let bias_step = LEARNING_RATE * db;
            let change = (&updated - &weights)
                .fold(bias_step.abs(), |largest, d| largest.max(d.abs()));

            weights = updated;
            bias -= bias_step;
            if change < TOLERANCE {
                log::debug!("Converged at iteration {iteration}");
                break;
            }
        }
        Ok(Self {
            classifier_type,
            weights,
            bias,
        })
    }

    /// Positive-class probability of every row.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.weights.len() {
            return Err(Error::backend(format!(
                "model expects {} features, got {}",
                self.weights.len(),
                x.ncols()
            )));
        }
        Ok((x.dot(&self.weights) + self.bias).mapv(sigmoid))
    }

    /// Positive-class decisions at threshold 0.5.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<bool>> {
        Ok(self.predict_proba(x)?.mapv(|p| p >= 0.5))
    }
}

// ============================================================================
// One-vs-rest
// ============================================================================

/// A fitted one-vs-rest multi-class model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OneVsRest {
    /// Class labels, sorted.
    pub classes: Vec<String>,
    /// One binary model per class, aligned with `classes`.
    pub models: Vec<LogisticRegression>,
}

impl OneVsRest {
    /// Fits one binary model per distinct label.
    pub fn fit(
        classifier_type: ClassifierType,
        x: &Array2<f64>,
        labels: &[String],
    ) -> Result<Self> {
        check_training_set(x, labels.len())?;
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();

        let models = classes
            .iter()
            .map(|class| {
                let binary: Array1<bool> = labels.iter().map(|l| l == class).collect();
                LogisticRegression::fit(classifier_type, x, &binary)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { classes, models })
    }

    /// Per-class probabilities, one column per entry of `classes`.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut scores = Array2::zeros((x.nrows(), self.models.len()));
        for (model, mut column) in self.models.iter().zip(scores.columns_mut()) {
            column.assign(&model.predict_proba(x)?);
        }
        Ok(scores)
    }

    /// Most probable class of every row.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<String>> {
        let scores = self.predict_proba(x)?;
        Ok(scores
            .axis_iter(Axis(0))
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, _)| self.classes[i].clone())
                    .unwrap_or_default()
            })
            .collect())
    }
}

/// A fitted predictive model, persisted as JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictiveModel {
    /// Edge classifier.
    Binary(LogisticRegression),
    /// Node-label classifier.
    Multiclass(OneVsRest),
}

impl PredictiveModel {
    /// Saves the model as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        seffnet_core::write_all_or_nothing(path, |w| writeln!(w, "{content}"))
    }

    /// Loads a saved model.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Ok(serde_json::from_str(&content)?)
    }
}
