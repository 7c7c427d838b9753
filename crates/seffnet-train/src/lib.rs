//! SEffNet Train: training, evaluation, and hyperparameter optimization
//! of network embeddings.
//!
//! Embedding algorithms are external collaborators reached through the
//! [`EmbeddingMethod`] trait; [`CommandEmbedding`] runs them as an external
//! program. Everything downstream of the embeddings (negative sampling,
//! classifiers, metrics, reports) lives here.
//!
//! # Modules
//!
//! - [`method`]: Methods, prediction tasks, classifier types, hyperparameters
//! - [`embedding`]: Embeddings, the capability traits, and the method table
//! - [`command`]: External-program embedding backend
//! - [`classifier`]: Logistic regression and one-vs-rest
//! - [`metrics`]: Ranking and decision metrics
//! - [`link_prediction`]: Held-out edges, negative sampling, edge features
//! - [`node_classification`]: Node labels and the node classifier
//! - [`evaluate`]: [`TrainingOrchestrator`]
//! - [`optimize`]: [`OptimizationOrchestrator`], studies, samplers
//! - [`report`]: JSON reports

#![forbid(unsafe_code)]

pub mod classifier;
pub mod command;
pub mod embedding;
pub mod evaluate;
pub mod link_prediction;
pub mod method;
pub mod metrics;
pub mod node_classification;
pub mod optimize;
pub mod report;

mod proptests;

// Re-export key types at crate root for convenience
pub use classifier::{LogisticRegression, OneVsRest, PredictiveModel};
pub use command::{CommandEmbedding, DEFAULT_EMBEDDING_PROGRAM, method_args};
pub use embedding::{EmbeddingMethod, EmbeddingModel, Embeddings, MethodTable, TrainedEmbeddings};
pub use evaluate::{
    Artifacts, DEFAULT_EVALUATION_SEED, DEFAULT_REPEATS, EvaluationRequest, PreparedTask,
    TrainingOrchestrator,
};
pub use link_prediction::{
    EvaluationGraphs, create_prediction_model, do_link_prediction, sample_negative_edges,
};
pub use method::{ClassifierType, EmbeddingParams, Method, PredictionTask};
pub use metrics::{LinkPredictionMetrics, NodeClassificationMetrics};
pub use node_classification::{NodeLabels, do_node_classification};
pub use optimize::{
    DEFAULT_DIMENSIONS_RANGE, DEFAULT_STUDY_SEED, DEFAULT_TRIALS, Distribution,
    OptimizationOrchestrator, OptimizationRequest, RandomSampler, Sampler, Study, Trial,
    TrialContext, suggest_params,
};
pub use report::{
    BestTrial, EvaluationReport, ParamValue, RepeatReport, Report, StudyReport, TaskMetrics,
};

/// Method table running every method through `program`.
pub fn command_methods(program: &str) -> MethodTable {
    Method::ALL
        .into_iter()
        .fold(MethodTable::new(), |table, method| {
            table.with(method, std::sync::Arc::new(CommandEmbedding::new(method, program)))
        })
}
