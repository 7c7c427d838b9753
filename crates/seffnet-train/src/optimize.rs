//! OptimizationOrchestrator: hyperparameter studies over embedding methods.
//!
//! A [`Study`] runs a fixed number of trials. Each trial asks a [`Sampler`]
//! for hyperparameters within the method's search space, trains and scores
//! the embeddings on inputs prepared once per study, and records the
//! objective (`auc_roc` for link prediction, `accuracy` for node
//! classification). The study maximizes the objective.

use crate::embedding::MethodTable;
use crate::evaluate::{Artifacts, PreparedTask, TrainingOrchestrator};
use crate::method::{ClassifierType, EmbeddingParams, Method, PredictionTask};
use crate::report::{BestTrial, ParamValue, StudyReport, TaskMetrics, timestamp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seffnet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Trials run when none is given.
pub const DEFAULT_TRIALS: usize = 50;

/// Study seed used when none is given.
pub const DEFAULT_STUDY_SEED: u64 = 2;

/// Dimension range searched when none is given.
pub const DEFAULT_DIMENSIONS_RANGE: (usize, usize) = (100, 300);

// ============================================================================
// Sampling
// ============================================================================

/// Range a hyperparameter is drawn from. Both bounds are inclusive for
/// integers; reals are drawn from `[low, high)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Distribution {
    /// Integer range.
    Int {
        /// Lower bound.
        low: i64,
        /// Upper bound.
        high: i64,
    },
    /// Real range.
    Float {
        /// Lower bound.
        low: f64,
        /// Upper bound.
        high: f64,
    },
}

/// Chooses hyperparameter values for trials.
pub trait Sampler: Send {
    /// Sampler name for diagnostics.
    fn name(&self) -> &str;

    /// Draws `param` for trial `trial` from `distribution`.
    fn sample(&mut self, trial: usize, param: &str, distribution: &Distribution) -> ParamValue;
}

/// Draws every parameter uniformly from its range.
#[derive(Clone, Debug)]
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    /// Creates a sampler seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Sampler for RandomSampler {
    fn name(&self) -> &str {
        "random"
    }

    fn sample(&mut self, _trial: usize, _param: &str, distribution: &Distribution) -> ParamValue {
        match *distribution {
            Distribution::Int { low, high } if low < high => {
                ParamValue::Int(self.rng.gen_range(low..=high))
            }
            Distribution::Int { low, .. } => ParamValue::Int(low),
            Distribution::Float { low, high } if low < high => {
                ParamValue::Float(self.rng.gen_range(low..high))
            }
            Distribution::Float { low, .. } => ParamValue::Float(low),
        }
    }
}

/// Parameter suggestions of one trial.
pub struct TrialContext<'a> {
    number: usize,
    sampler: &'a mut dyn Sampler,
    params: BTreeMap<String, ParamValue>,
}

impl<'a> TrialContext<'a> {
    /// Starts trial `number`.
    pub fn new(number: usize, sampler: &'a mut dyn Sampler) -> Self {
        Self {
            number,
            sampler,
            params: BTreeMap::new(),
        }
    }

    /// Trial number.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Suggests an integer in `[low, high]`.
    pub fn suggest_int(&mut self, name: &str, low: i64, high: i64) -> i64 {
        let value = self
            .sampler
            .sample(self.number, name, &Distribution::Int { low, high });
        let value = value.as_f64().round() as i64;
        let value = value.clamp(low, high.max(low));
        self.params.insert(name.to_string(), ParamValue::Int(value));
        value
    }

    /// Suggests a real in `[low, high)`.
    pub fn suggest_float(&mut self, name: &str, low: f64, high: f64) -> f64 {
        let value = self
            .sampler
            .sample(self.number, name, &Distribution::Float { low, high })
            .as_f64();
        self.params.insert(name.to_string(), ParamValue::Float(value));
        value
    }

    /// Parameters suggested so far.
    pub fn into_params(self) -> BTreeMap<String, ParamValue> {
        self.params
    }
}

fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Suggests the hyperparameters `method` reads, starting from `base`.
///
/// Every method except SDNE searches `dimensions` over `dimensions_range`.
/// GraRep dimensions are rounded down to a multiple of `kstep`.
pub fn suggest_params(
    method: Method,
    trial: &mut TrialContext<'_>,
    dimensions_range: (usize, usize),
    base: &EmbeddingParams,
) -> EmbeddingParams {
    let mut params = base.clone();
    let (low, high) = (dimensions_range.0 as i64, dimensions_range.1 as i64);
    match method {
        Method::Hope => {
            params.dimensions = to_usize(trial.suggest_int("dimensions", low, high));
        }
        Method::DeepWalk | Method::Node2Vec => {
            params.dimensions = to_usize(trial.suggest_int("dimensions", low, high));
            params.number_walks = to_usize(trial.suggest_int("number_walks", 8, 128));
            params.walk_length = to_usize(trial.suggest_int("walk_length", 8, 128));
            params.window_size = to_usize(trial.suggest_int("window_size", 2, 10));
            if method == Method::Node2Vec {
                params.p = trial.suggest_float("p", 0.0, 4.0);
                params.q = trial.suggest_float("q", 0.0, 4.0);
            }
        }
        Method::GraRep => {
            let kstep = to_usize(trial.suggest_int("kstep", 1, 7));
            let dimensions = to_usize(trial.suggest_int("dimensions", low, high));
            params.kstep = kstep;
            params.dimensions = (dimensions - dimensions % kstep).max(kstep);
        }
        Method::Sdne => {
            params.alpha = trial.suggest_float("alpha", 0.0, 0.4);
            params.beta = trial.suggest_int("beta", 0, 30) as f64;
            params.epochs = to_usize(trial.suggest_int("epochs", 5, 30));
        }
        Method::Line => {
            params.dimensions = to_usize(trial.suggest_int("dimensions", low, high));
            params.order = to_usize(trial.suggest_int("order", 1, 3));
            params.epochs = to_usize(trial.suggest_int("epochs", 5, 30));
        }
    }
    params
}

// ============================================================================
// Study
// ============================================================================

/// What a trial recorded besides its parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialAttributes {
    /// Embedding method.
    pub method: Method,
    /// Classifier used.
    pub classifier: ClassifierType,
    /// Seed of the trial's random generator.
    pub inner_seed: u64,
    /// Scores of the trial.
    pub metrics: TaskMetrics,
}

/// A completed trial.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Zero-based trial number.
    pub number: usize,
    /// Sampled hyperparameters.
    pub params: BTreeMap<String, ParamValue>,
    /// Recorded attributes.
    pub user_attrs: TrialAttributes,
    /// Objective value.
    pub value: f64,
}

/// A maximizing hyperparameter study.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Study {
    /// Study name.
    pub name: String,
    /// Study id.
    pub id: u64,
    /// Study seed.
    pub seed: u64,
    /// Start time.
    pub start: String,
    /// Completed trials, in order.
    pub trials: Vec<Trial>,
}

impl Study {
    /// Trial with the highest objective; the earliest wins ties.
    pub fn best_trial(&self) -> Option<&Trial> {
        let mut best: Option<&Trial> = None;
        for trial in &self.trials {
            if best.is_none_or(|b| trial.value > b.value) {
                best = Some(trial);
            }
        }
        best
    }

    /// Summarizes the study.
    pub fn report(&self, prediction_task: PredictionTask) -> Result<StudyReport> {
        let best = self
            .best_trial()
            .ok_or_else(|| Error::config(format!("study '{}' has no completed trials", self.name)))?;
        Ok(StudyReport {
            best: BestTrial {
                classifier: best.user_attrs.classifier,
                inner_seed: best.user_attrs.inner_seed,
                method: best.user_attrs.method,
                metrics: best.user_attrs.metrics.clone(),
                params: best.params.clone(),
                trial: best.number,
                value: best.value,
            },
            id: self.id,
            n_trials: self.trials.len(),
            name: self.name.clone(),
            prediction_task,
            seed: self.seed,
            start: self.start.clone(),
        })
    }
}

// ============================================================================
// OptimizationOrchestrator
// ============================================================================

/// Configuration of a study.
#[derive(Clone, Debug)]
pub struct OptimizationRequest {
    /// Input edge list.
    pub input_path: PathBuf,
    /// Explicit training edge list (used together with `testing_path`).
    pub training_path: Option<PathBuf>,
    /// Explicit testing edge list (used together with `training_path`).
    pub testing_path: Option<PathBuf>,
    /// Method whose hyperparameters are searched.
    pub method: Method,
    /// Downstream task.
    pub prediction_task: PredictionTask,
    /// Classifier fitted on the embeddings.
    pub classifier_type: ClassifierType,
    /// Node labels; required for node classification.
    pub labels_file: Option<PathBuf>,
    /// Inclusive range searched for `dimensions`.
    pub dimensions_range: (usize, usize),
    /// Number of trials.
    pub trials: usize,
    /// Seed of the sampler and of the study's generator.
    pub study_seed: u64,
    /// Study name.
    pub name: String,
    /// Values of parameters the search space leaves alone.
    pub base_params: EmbeddingParams,
}

impl OptimizationRequest {
    /// Creates a link-prediction study request with default settings.
    pub fn new(input_path: impl Into<PathBuf>, method: Method, name: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            training_path: None,
            testing_path: None,
            method,
            prediction_task: PredictionTask::default(),
            classifier_type: ClassifierType::default(),
            labels_file: None,
            dimensions_range: DEFAULT_DIMENSIONS_RANGE,
            trials: DEFAULT_TRIALS,
            study_seed: DEFAULT_STUDY_SEED,
            name: name.into(),
            base_params: EmbeddingParams::default(),
        }
    }

    /// Uses explicit train and test edge lists instead of a random split.
    pub fn with_split_files(
        mut self,
        training_path: impl Into<PathBuf>,
        testing_path: impl Into<PathBuf>,
    ) -> Self {
        self.training_path = Some(training_path.into());
        self.testing_path = Some(testing_path.into());
        self
    }

    /// Sets the downstream task.
    pub fn with_prediction_task(mut self, task: PredictionTask) -> Self {
        self.prediction_task = task;
        self
    }

    /// Sets the classifier type.
    pub fn with_classifier(mut self, classifier_type: ClassifierType) -> Self {
        self.classifier_type = classifier_type;
        self
    }

    /// Sets the labels file.
    pub fn with_labels_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.labels_file = Some(path.into());
        self
    }

    /// Sets the searched dimension range.
    pub fn with_dimensions_range(mut self, low: usize, high: usize) -> Self {
        self.dimensions_range = (low, high);
        self
    }

    /// Sets the number of trials.
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    /// Sets the study seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.study_seed = seed;
        self
    }

    /// Sets the parameters the search space leaves alone.
    pub fn with_base_params(mut self, params: EmbeddingParams) -> Self {
        self.base_params = params;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(Error::config("a study needs at least one trial"));
        }
        let (low, high) = self.dimensions_range;
        if low == 0 || low > high {
            return Err(Error::config(format!(
                "invalid dimensions range {low}..={high}"
            )));
        }
        Ok(())
    }
}

/// Runs studies, training each trial through a [`TrainingOrchestrator`].
#[derive(Clone, Debug)]
pub struct OptimizationOrchestrator {
    training: TrainingOrchestrator,
}

impl OptimizationOrchestrator {
    /// Creates an orchestrator dispatching through `methods`.
    pub fn new(methods: MethodTable) -> Self {
        Self {
            training: TrainingOrchestrator::new(methods),
        }
    }

    /// Runs a study with a [`RandomSampler`] seeded by the study seed.
    pub fn optimize(&self, request: &OptimizationRequest) -> Result<Study> {
        let mut sampler = RandomSampler::new(request.study_seed);
        self.optimize_with_sampler(request, &mut sampler)
    }

    /// Runs a study drawing parameters from `sampler`.
    pub fn optimize_with_sampler(
        &self,
        request: &OptimizationRequest,
        sampler: &mut dyn Sampler,
    ) -> Result<Study> {
        request.validate()?;
        let start = timestamp();
        let mut rng = StdRng::seed_from_u64(request.study_seed);
        let prepared = PreparedTask::prepare(
            &request.input_path,
            request.training_path.as_deref(),
            request.testing_path.as_deref(),
            request.prediction_task,
            request.labels_file.as_deref(),
            &mut rng,
        )?;

        log::info!(
            "Starting study '{}': {} trials of {} with the {} sampler",
            request.name,
            request.trials,
            request.method,
            sampler.name()
        );
        let mut study = Study {
            name: request.name.clone(),
            id: 0,
            seed: request.study_seed,
            start,
            trials: Vec::with_capacity(request.trials),
        };

        for number in 0..request.trials {
            let mut context = TrialContext::new(number, &mut *sampler);
            let params = suggest_params(
                request.method,
                &mut context,
                request.dimensions_range,
                &request.base_params,
            );
            let suggested = context.into_params();

            let inner_seed = rng.gen_range(1..=u64::from(u32::MAX));
            let mut trial_rng = StdRng::seed_from_u64(inner_seed);
            let metrics = self.training.evaluate_prepared(
                &prepared,
                request.method,
                &params,
                request.classifier_type,
                Artifacts::default(),
                &mut trial_rng,
            )?;
            let value = metrics.objective();
            log::info!("Trial {number} finished with value {value:.4}");

            study.trials.push(Trial {
                number,
                params: suggested,
                user_attrs: TrialAttributes {
                    method: request.method,
                    classifier: request.classifier_type,
                    inner_seed,
                    metrics,
                },
                value,
            });
        }

        if let Some(best) = study.best_trial() {
            log::info!("Best trial {} with value {:.4}", best.number, best.value);
        }
        Ok(study)
    }
}
