//! TrainingOrchestrator: embedding training, evaluation, and repeated
//! experiments.
//!
//! A run is configured by an [`EvaluationRequest`]. Inputs are loaded into a
//! [`PreparedTask`] before any embedding is trained, so configuration and
//! input errors surface first. Backend errors pass through unchanged.

use crate::classifier::PredictiveModel;
use crate::embedding::{EmbeddingModel, Embeddings, MethodTable};
use crate::link_prediction::{
    DEFAULT_HELD_OUT_FRACTION, EvaluationGraphs, create_prediction_model, do_link_prediction,
};
use crate::method::{ClassifierType, EmbeddingParams, Method, PredictionTask};
use crate::node_classification::{NodeLabels, do_node_classification};
use crate::report::{EvaluationReport, RepeatReport, TaskMetrics, timestamp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seffnet_core::{Error, Result};
use seffnet_graph::SimpleGraph;
use std::path::{Path, PathBuf};

/// Seed used when a request does not name one.
pub const DEFAULT_EVALUATION_SEED: u64 = 0;

/// Runs of a repeated experiment when none is given.
pub const DEFAULT_REPEATS: usize = 10;

// ============================================================================
// Requests
// ============================================================================

/// Everything one training or evaluation run needs.
#[derive(Clone, Debug)]
pub struct EvaluationRequest {
    /// Input edge list.
    pub input_path: PathBuf,
    /// Explicit training edge list (used together with `testing_path`).
    pub training_path: Option<PathBuf>,
    /// Explicit testing edge list (used together with `training_path`).
    pub testing_path: Option<PathBuf>,
    /// Embedding method.
    pub method: Method,
    /// Downstream task.
    pub prediction_task: PredictionTask,
    /// Embedding hyperparameters.
    pub params: EmbeddingParams,
    /// Classifier fitted on the embeddings.
    pub classifier_type: ClassifierType,
    /// Node labels; required for node classification.
    pub labels_file: Option<PathBuf>,
    /// Where to save the final embeddings.
    pub embeddings_path: Option<PathBuf>,
    /// Where to save the fitted classifier.
    pub predictive_model_path: Option<PathBuf>,
    /// Where to save the trained embedding model.
    pub training_model_path: Option<PathBuf>,
    /// Seed of the run's random generator.
    pub seed: u64,
}

impl EvaluationRequest {
    /// Creates a link-prediction request with default parameters.
    pub fn new(input_path: impl Into<PathBuf>, method: Method) -> Self {
        Self {
            input_path: input_path.into(),
            training_path: None,
            testing_path: None,
            method,
            prediction_task: PredictionTask::default(),
            params: EmbeddingParams::default(),
            classifier_type: ClassifierType::default(),
            labels_file: None,
            embeddings_path: None,
            predictive_model_path: None,
            training_model_path: None,
            seed: DEFAULT_EVALUATION_SEED,
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

    /// Sets the embedding hyperparameters.
    pub fn with_params(mut self, params: EmbeddingParams) -> Self {
        self.params = params;
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

    /// Saves the final embeddings to `path`.
    pub fn with_embeddings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.embeddings_path = Some(path.into());
        self
    }

    /// Saves the fitted classifier to `path`.
    pub fn with_predictive_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.predictive_model_path = Some(path.into());
        self
    }

    /// Saves the trained embedding model to `path`.
    pub fn with_training_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.training_model_path = Some(path.into());
        self
    }

    /// Sets the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn without_artifacts(&self) -> Self {
        Self {
            embeddings_path: None,
            predictive_model_path: None,
            training_model_path: None,
            ..self.clone()
        }
    }
}

// ============================================================================
// Prepared inputs
// ============================================================================

/// Loaded inputs of a run.
#[derive(Clone, Debug)]
pub enum PreparedTask {
    /// Train graph plus held-out edges.
    LinkPrediction(EvaluationGraphs),
    /// Full graph plus node labels.
    NodeClassification {
        /// Graph the embeddings are trained on.
        graph: SimpleGraph,
        /// Labeled nodes.
        labels: NodeLabels,
    },
}

impl PreparedTask {
    /// Loads the inputs of `task`.
    ///
    /// Node classification without a labels file fails with
    /// [`Error::Config`] before anything is read. Link prediction uses the
    /// explicit edge lists when both are given, else a random split of the
    /// input drawn from `rng`.
    pub fn prepare<R: Rng + ?Sized>(
        input_path: &Path,
        training_path: Option<&Path>,
        testing_path: Option<&Path>,
        task: PredictionTask,
        labels_file: Option<&Path>,
        rng: &mut R,
    ) -> Result<Self> {
        match task {
            PredictionTask::NodeClassification => {
                let labels_file = labels_file.ok_or_else(|| {
                    Error::config("node classification requires a labels file")
                })?;
                let labels = NodeLabels::read(labels_file)?;
                let graph = read_input(input_path)?;
                Ok(PreparedTask::NodeClassification { graph, labels })
            }
            PredictionTask::LinkPrediction => {
                let graphs = match (training_path, testing_path) {
                    (Some(train), Some(test)) => EvaluationGraphs::read(train, test)?,
                    _ => EvaluationGraphs::random_split(
                        &read_input(input_path)?,
                        DEFAULT_HELD_OUT_FRACTION,
                        rng,
                    ),
                };
                Ok(PreparedTask::LinkPrediction(graphs))
            }
        }
    }

    /// Task these inputs serve.
    pub fn task(&self) -> PredictionTask {
        match self {
            PreparedTask::LinkPrediction(_) => PredictionTask::LinkPrediction,
            PreparedTask::NodeClassification { .. } => PredictionTask::NodeClassification,
        }
    }

    /// Graph the embeddings are trained on.
    pub fn training_graph(&self) -> &SimpleGraph {
        match self {
            PreparedTask::LinkPrediction(graphs) => &graphs.train,
            PreparedTask::NodeClassification { graph, .. } => graph,
        }
    }
}

fn read_input(path: &Path) -> Result<SimpleGraph> {
    seffnet_core::require_file("input edge list", path)?;
    SimpleGraph::read_edgelist(path)
}

// ============================================================================
// TrainingOrchestrator
// ============================================================================

/// Output locations of a run.
#[derive(Clone, Copy, Debug, Default)]
pub struct Artifacts<'a> {
    /// Final embeddings.
    pub embeddings: Option<&'a Path>,
    /// Fitted classifier.
    pub predictive_model: Option<&'a Path>,
    /// Trained embedding model.
    pub training_model: Option<&'a Path>,
}

impl<'a> Artifacts<'a> {
    fn of(request: &'a EvaluationRequest) -> Self {
        Self {
            embeddings: request.embeddings_path.as_deref(),
            predictive_model: request.predictive_model_path.as_deref(),
            training_model: request.training_model_path.as_deref(),
        }
    }
}

/// Trains embeddings through a [`MethodTable`] and scores them.
#[derive(Clone, Debug)]
pub struct TrainingOrchestrator {
    methods: MethodTable,
}

impl TrainingOrchestrator {
    /// Creates an orchestrator dispatching through `methods`.
    pub fn new(methods: MethodTable) -> Self {
        Self { methods }
    }

    /// The method table.
    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    fn train_embeddings(
        &self,
        method: Method,
        graph: &SimpleGraph,
        params: &EmbeddingParams,
        artifacts: Artifacts<'_>,
    ) -> Result<Box<dyn EmbeddingModel>> {
        let handler = self.methods.get(method)?;
        log::info!(
            "Training {method} via {} on {} nodes, {} edges",
            handler.name(),
            graph.node_count(),
            graph.edge_count()
        );
        let model = handler.train(graph, params)?;
        if let Some(path) = artifacts.training_model {
            model.save_model(path)?;
        }
        if let Some(path) = artifacts.embeddings {
            model.save_embeddings(path)?;
        }
        Ok(model)
    }

    /// Trains `method` on prepared inputs and scores the embeddings.
    pub fn evaluate_prepared<R: Rng + ?Sized>(
        &self,
        prepared: &PreparedTask,
        method: Method,
        params: &EmbeddingParams,
        classifier_type: ClassifierType,
        artifacts: Artifacts<'_>,
        rng: &mut R,
    ) -> Result<TaskMetrics> {
        let model =
            self.train_embeddings(method, prepared.training_graph(), params, artifacts)?;
        let embeddings = scoring_embeddings(method, model.as_ref());

        let (metrics, predictive) = match prepared {
            PreparedTask::LinkPrediction(graphs) => {
                let outcome = do_link_prediction(embeddings, graphs, classifier_type, rng)?;
                (
                    TaskMetrics::LinkPrediction(outcome.metrics),
                    PredictiveModel::Binary(outcome.model),
                )
            }
            PreparedTask::NodeClassification { labels, .. } => {
                let outcome = do_node_classification(embeddings, labels, classifier_type, rng)?;
                (
                    TaskMetrics::NodeClassification(outcome.metrics),
                    PredictiveModel::Multiclass(outcome.model),
                )
            }
        };
        if let Some(path) = artifacts.predictive_model {
            predictive.save(path)?;
        }
        Ok(metrics)
    }

    /// Trains and evaluates one model.
    pub fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationReport> {
        let mut rng = StdRng::seed_from_u64(request.seed);
        let prepared = PreparedTask::prepare(
            &request.input_path,
            request.training_path.as_deref(),
            request.testing_path.as_deref(),
            request.prediction_task,
            request.labels_file.as_deref(),
            &mut rng,
        )?;
        let results = self.evaluate_prepared(
            &prepared,
            request.method,
            &request.params,
            request.classifier_type,
            Artifacts::of(request),
            &mut rng,
        )?;
        Ok(EvaluationReport {
            date: timestamp(),
            dimension: request.params.dimensions,
            input: request.input_path.display().to_string(),
            method: request.method,
            results,
            user: seffnet_core::current_user(),
        })
    }

    /// Trains embeddings and a predictive model on the whole input, without
    /// held-out evaluation.
    pub fn train_model(&self, request: &EvaluationRequest) -> Result<PredictiveModel> {
        let mut rng = StdRng::seed_from_u64(request.seed);
        let labels = match request.prediction_task {
            PredictionTask::NodeClassification => {
                let path = request.labels_file.as_deref().ok_or_else(|| {
                    Error::config("node classification requires a labels file")
                })?;
                Some(NodeLabels::read(path)?)
            }
            PredictionTask::LinkPrediction => None,
        };
        let graph = read_input(&request.input_path)?;

        let model = self.train_embeddings(
            request.method,
            &graph,
            &request.params,
            Artifacts::of(request),
        )?;
        let embeddings = scoring_embeddings(request.method, model.as_ref());

        let predictive = match labels {
            None => PredictiveModel::Binary(create_prediction_model(
                embeddings,
                &graph,
                request.classifier_type,
                &mut rng,
            )?),
            Some(labels) => PredictiveModel::Multiclass(
                do_node_classification(embeddings, &labels, request.classifier_type, &mut rng)?
                    .model,
            ),
        };
        if let Some(path) = &request.predictive_model_path {
            predictive.save(path)?;
        }
        Ok(predictive)
    }

    /// Runs `n` independent evaluations of `request`.
    ///
    /// Runs do not save artifacts. Each run draws its own seed from a
    /// generator seeded with `request.seed`, so every run sees a different
    /// split while the experiment as a whole is reproducible.
    pub fn repeat_experiment(&self, request: &EvaluationRequest, n: usize) -> Result<RepeatReport> {
        let mut seeds = StdRng::seed_from_u64(request.seed);
        let base = request.without_artifacts();
        let mut report = RepeatReport::default();
        for i in 0..n {
            log::info!("Repeating experiment: run {}/{n}", i + 1);
            let run = base.clone().with_seed(seeds.r#gen());
            report.runs.insert(i, self.evaluate(&run)?);
        }
        Ok(report)
    }
}

/// Embeddings a method is scored on; LINE is scored on its training-time
/// embeddings.
fn scoring_embeddings(method: Method, model: &dyn EmbeddingModel) -> &Embeddings {
    if method == Method::Line {
        model.training_embeddings()
    } else {
        model.embeddings()
    }
}
