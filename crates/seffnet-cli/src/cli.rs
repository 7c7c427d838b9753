//! Command-line arguments.
//!
//! Every flag left unset falls back to the configuration file.

use clap::{Args, Parser, Subcommand};
use seffnet_train::{ClassifierType, DEFAULT_REPEATS, EmbeddingParams, Method, PredictionTask};
use std::path::PathBuf;

/// SEffNet: side-effect network splitting, explanation subgraphs, and
/// embedding evaluation.
#[derive(Parser, Debug)]
#[command(name = "seffnet", version)]
#[command(about = "Side-effect network embeddings toolkit", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "SEFFNET_CONFIG")]
    pub config: Option<String>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split the full graph into cluster-aware train/test edge lists
    Split(SplitArgs),
    /// Extract the shortest-path subgraph between two entities
    Subgraph(SubgraphArgs),
    /// Train embeddings and evaluate them on a held-out set
    Evaluate(EvaluateArgs),
    /// Train embeddings and a predictive model on the whole input
    Train(TrainArgs),
    /// Run independent evaluations and report each
    Repeat(RepeatArgs),
    /// Search embedding hyperparameters
    Optimize(OptimizeArgs),
    /// Inspect or edit the configuration file
    Config {
        /// Config action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `seffnet config` actions.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Print the resolved config file path
    Path,
    /// Print a value by dotted key (e.g. `split.seed`)
    Get {
        /// Dotted key
        key: String,
    },
    /// Set a value by dotted key in the config file
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// Write a default config file
    Init {
        /// Target file (defaults to the platform config location)
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// split / subgraph
// ============================================================================

/// Arguments of `seffnet split`.
#[derive(Args, Debug, Clone, Default)]
pub struct SplitArgs {
    /// Full graph (node-link JSON)
    #[arg(long, env = "SEFFNET_GRAPH")]
    pub graph: Option<PathBuf>,
    /// Cluster TSV
    #[arg(long)]
    pub clusters: Option<PathBuf>,
    /// Mapping TSV
    #[arg(long, env = "SEFFNET_MAPPING")]
    pub mapping: Option<PathBuf>,
    /// Training edge list to write
    #[arg(long)]
    pub train: Option<PathBuf>,
    /// Testing edge list to write
    #[arg(long)]
    pub test: Option<PathBuf>,
    /// Split seed
    #[arg(long)]
    pub seed: Option<u64>,
    /// Fraction of cluster groups held out
    #[arg(long)]
    pub test_fraction: Option<f64>,
    /// Ignore cached edge lists
    #[arg(long)]
    pub rebuild: bool,
}

/// Arguments of `seffnet subgraph`.
#[derive(Args, Debug, Clone)]
pub struct SubgraphArgs {
    /// Source type: chemical, protein or phenotype
    #[arg(long)]
    pub source_type: String,
    /// Source name
    #[arg(long)]
    pub source_name: Option<String>,
    /// Source identifier
    #[arg(long)]
    pub source_id: Option<String>,
    /// Target type: chemical, protein or phenotype
    #[arg(long)]
    pub target_type: String,
    /// Target name
    #[arg(long)]
    pub target_name: Option<String>,
    /// Target identifier
    #[arg(long)]
    pub target_id: Option<String>,
    /// Minimize summed edge cost instead of hop count
    #[arg(long)]
    pub weighted: bool,
    /// Sample only when more shortest paths than this are found
    #[arg(long)]
    pub threshold: Option<usize>,
    /// Paths kept when sampling
    #[arg(long)]
    pub sample_size: Option<usize>,
    /// Seed of the path sample
    #[arg(long)]
    pub seed: Option<u64>,
    /// Full graph (node-link JSON)
    #[arg(long, env = "SEFFNET_GRAPH")]
    pub graph: Option<PathBuf>,
    /// Mapping TSV
    #[arg(long, env = "SEFFNET_MAPPING")]
    pub mapping: Option<PathBuf>,
    /// Write the subgraph here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

// ============================================================================
// Embedding experiments
// ============================================================================

/// Input, method, and hyperparameters shared by the embedding subcommands.
#[derive(Args, Debug, Clone)]
pub struct ExperimentArgs {
    /// Input edge list
    #[arg(long)]
    pub input: PathBuf,
    /// Embedding method: HOPE, DeepWalk, node2vec, GraRep, SDNE or LINE
    #[arg(long, env = "SEFFNET_METHOD")]
    pub method: Method,
    /// link_prediction or node_classification
    #[arg(long, default_value = "link_prediction")]
    pub task: PredictionTask,
    /// Classifier: LR or EN
    #[arg(long, default_value = "LR")]
    pub classifier: ClassifierType,
    /// Node labels file (node classification)
    #[arg(long)]
    pub labels_file: Option<PathBuf>,
    /// Explicit training edge list (requires --testing)
    #[arg(long, requires = "testing")]
    pub training: Option<PathBuf>,
    /// Explicit testing edge list (requires --training)
    #[arg(long, requires = "training")]
    pub testing: Option<PathBuf>,
    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,
    /// Embedding program
    #[arg(long, env = "SEFFNET_EMBEDDING_PROGRAM")]
    pub program: Option<String>,
    #[command(flatten)]
    pub params: ParamArgs,
}

/// Hyperparameter overrides of the `[embedding]` section.
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// Embedding dimensionality
    #[arg(long)]
    pub dimensions: Option<usize>,
    /// Walks per node
    #[arg(long)]
    pub number_walks: Option<usize>,
    /// Walk length
    #[arg(long)]
    pub walk_length: Option<usize>,
    /// Skip-gram window
    #[arg(long)]
    pub window_size: Option<usize>,
    /// node2vec return parameter
    #[arg(long)]
    pub p: Option<f64>,
    /// node2vec in-out parameter
    #[arg(long)]
    pub q: Option<f64>,
    /// SDNE alpha
    #[arg(long)]
    pub alpha: Option<f64>,
    /// SDNE beta
    #[arg(long)]
    pub beta: Option<f64>,
    /// Training epochs
    #[arg(long)]
    pub epochs: Option<usize>,
    /// GraRep transition steps
    #[arg(long)]
    pub kstep: Option<usize>,
    /// LINE proximity order
    #[arg(long)]
    pub order: Option<usize>,
    /// Use edge weights
    #[arg(long)]
    pub weighted: bool,
}

impl ParamArgs {
    /// `base` with every given flag applied.
    pub fn apply(&self, base: &EmbeddingParams) -> EmbeddingParams {
        EmbeddingParams {
            dimensions: self.dimensions.unwrap_or(base.dimensions),
            number_walks: self.number_walks.unwrap_or(base.number_walks),
            walk_length: self.walk_length.unwrap_or(base.walk_length),
            window_size: self.window_size.unwrap_or(base.window_size),
            p: self.p.unwrap_or(base.p),
            q: self.q.unwrap_or(base.q),
            alpha: self.alpha.unwrap_or(base.alpha),
            beta: self.beta.unwrap_or(base.beta),
            epochs: self.epochs.unwrap_or(base.epochs),
            kstep: self.kstep.unwrap_or(base.kstep),
            order: self.order.unwrap_or(base.order),
            weighted: self.weighted || base.weighted,
        }
    }
}

/// Where trained artifacts are written.
#[derive(Args, Debug, Clone, Default)]
pub struct ArtifactArgs {
    /// Embeddings text file
    #[arg(long)]
    pub embeddings_path: Option<PathBuf>,
    /// Predictive model (JSON)
    #[arg(long)]
    pub predictive_model_path: Option<PathBuf>,
    /// Embedding model
    #[arg(long)]
    pub training_model_path: Option<PathBuf>,
}

/// Arguments of `seffnet evaluate`.
#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,
    #[command(flatten)]
    pub artifacts: ArtifactArgs,
    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments of `seffnet train`.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,
    #[command(flatten)]
    pub artifacts: ArtifactArgs,
}

/// Arguments of `seffnet repeat`.
#[derive(Args, Debug, Clone)]
pub struct RepeatArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,
    /// Number of runs
    #[arg(short = 'n', long, default_value_t = DEFAULT_REPEATS)]
    pub repeats: usize,
    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments of `seffnet optimize`.
#[derive(Args, Debug, Clone)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,
    /// Number of trials
    #[arg(long)]
    pub trials: Option<usize>,
    /// Smallest dimensionality sampled
    #[arg(long)]
    pub min_dimensions: Option<usize>,
    /// Largest dimensionality sampled
    #[arg(long)]
    pub max_dimensions: Option<usize>,
    /// Study name (defaults to `<method>-<task>`)
    #[arg(long)]
    pub name: Option<String>,
    /// Write the study report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
