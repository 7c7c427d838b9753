//! Subcommand handlers.
//!
//! Handlers resolve every unset flag from [`SeffnetConfig`] and write JSON
//! results to `--output` or stdout. Log output goes to stderr.

use crate::cli::{
    ArtifactArgs, Cli, Command, EvaluateArgs, ExperimentArgs, OptimizeArgs, RepeatArgs, SplitArgs,
    SubgraphArgs, TrainArgs,
};
use crate::config::SeffnetConfig;
use crate::config_handlers::handle_config_command;
use rand::SeedableRng;
use rand::rngs::StdRng;
use seffnet_core::Result;
use seffnet_graph::{
    EntityDescriptor, GraphSplitter, KnowledgeGraph, MappingTable, SubgraphExtractor,
};
use seffnet_train::{
    EvaluationRequest, MethodTable, OptimizationOrchestrator, OptimizationRequest, Report,
    TrainingOrchestrator, command_methods,
};
use std::io::Write;
use std::path::Path;

/// Runs the parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Config { action } => handle_config_command(config_path, action),
        Command::Split(args) => cmd_split(&SeffnetConfig::load(config_path)?, &args),
        Command::Subgraph(args) => cmd_subgraph(&SeffnetConfig::load(config_path)?, &args),
        Command::Evaluate(args) => cmd_evaluate(&SeffnetConfig::load(config_path)?, &args),
        Command::Train(args) => cmd_train(&SeffnetConfig::load(config_path)?, &args),
        Command::Repeat(args) => cmd_repeat(&SeffnetConfig::load(config_path)?, &args),
        Command::Optimize(args) => cmd_optimize(&SeffnetConfig::load(config_path)?, &args),
    }
}

fn emit(report: &dyn Report, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            report.save(path)?;
            tracing::info!(path = %path.display(), "Wrote report");
        }
        None => println!("{}", report.to_json()?),
    }
    Ok(())
}

// ============================================================================
// Graph commands
// ============================================================================

/// `seffnet split`
pub fn cmd_split(config: &SeffnetConfig, args: &SplitArgs) -> Result<()> {
    let mut paths = config.paths.split_paths();
    if let Some(graph) = &args.graph {
        paths.graph = graph.clone();
    }
    if let Some(clusters) = &args.clusters {
        paths.clusters = clusters.clone();
    }
    if let Some(mapping) = &args.mapping {
        paths.mapping = mapping.clone();
    }
    if let Some(train) = &args.train {
        paths.train = train.clone();
    }
    if let Some(test) = &args.test {
        paths.test = test.clone();
    }

    let mut splitter = GraphSplitter::new(config.split.clone());
    if let Some(seed) = args.seed {
        splitter = splitter.with_seed(seed);
    }
    if let Some(fraction) = args.test_fraction {
        splitter = splitter.with_test_fraction(fraction);
    }

    let outcome = splitter.split_files(&paths, args.rebuild)?;
    tracing::info!(
        train = %paths.train.display(),
        test = %paths.test.display(),
        train_edges = outcome.graphs.train.edge_count(),
        test_edges = outcome.graphs.test.edge_count(),
        from_cache = outcome.from_cache,
        "Split ready"
    );
    Ok(())
}

/// `seffnet subgraph`
pub fn cmd_subgraph(config: &SeffnetConfig, args: &SubgraphArgs) -> Result<()> {
    let source = EntityDescriptor::parse(
        "source",
        &args.source_type,
        args.source_name.clone(),
        args.source_id.clone(),
    )?;
    let target = EntityDescriptor::parse(
        "target",
        &args.target_type,
        args.target_name.clone(),
        args.target_id.clone(),
    )?;

    let graph_path = args.graph.as_deref().unwrap_or(&config.paths.graph);
    let mapping_path = args.mapping.as_deref().unwrap_or(&config.paths.mapping);
    seffnet_core::require_file("graph", graph_path)?;
    let graph = KnowledgeGraph::from_json_path(graph_path)?;
    let names = MappingTable::from_path(mapping_path)?.chemical_names();

    let mut policy = config.subgraph;
    if let Some(threshold) = args.threshold {
        policy.threshold = threshold;
    }
    if let Some(sample_size) = args.sample_size {
        policy.sample_size = sample_size;
    }
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let subgraph = SubgraphExtractor::new().with_policy(policy).extract(
        &graph,
        &source,
        &target,
        args.weighted,
        &names,
        &mut rng,
    )?;
    tracing::info!(
        paths = subgraph.paths.len(),
        total_paths = subgraph.total_paths,
        sampled = subgraph.sampled,
        distance = subgraph.distance,
        "Extracted subgraph"
    );

    match &args.output {
        Some(path) => subgraph.graph.save_json(path),
        None => {
            let mut stdout = std::io::stdout().lock();
            subgraph.graph.to_writer(&mut stdout)?;
            writeln!(stdout).map_err(|e| seffnet_core::Error::io_with_path(e, "<stdout>"))
        }
    }
}

// ============================================================================
// Embedding commands
// ============================================================================

fn method_table(config: &SeffnetConfig, experiment: &ExperimentArgs) -> MethodTable {
    let program = experiment
        .program
        .as_deref()
        .unwrap_or(&config.paths.embedding_program);
    command_methods(program)
}

pub(crate) fn evaluation_request(
    config: &SeffnetConfig,
    experiment: &ExperimentArgs,
    artifacts: Option<&ArtifactArgs>,
) -> EvaluationRequest {
    let mut request = EvaluationRequest::new(&experiment.input, experiment.method)
        .with_prediction_task(experiment.task)
        .with_classifier(experiment.classifier)
        .with_params(experiment.params.apply(&config.embedding));
    if let (Some(training), Some(testing)) = (&experiment.training, &experiment.testing) {
        request = request.with_split_files(training, testing);
    }
    if let Some(labels) = &experiment.labels_file {
        request = request.with_labels_file(labels);
    }
    if let Some(seed) = experiment.seed {
        request = request.with_seed(seed);
    }
    if let Some(artifacts) = artifacts {
        if let Some(path) = &artifacts.embeddings_path {
            request = request.with_embeddings_path(path);
        }
        if let Some(path) = &artifacts.predictive_model_path {
            request = request.with_predictive_model_path(path);
        }
        if let Some(path) = &artifacts.training_model_path {
            request = request.with_training_model_path(path);
        }
    }
    request
}

pub(crate) fn optimization_request(
    config: &SeffnetConfig,
    args: &OptimizeArgs,
) -> OptimizationRequest {
    let experiment = &args.experiment;
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| format!("{}-{}", experiment.method, experiment.task));
    let optimization = &config.optimization;
    let mut request = OptimizationRequest::new(&experiment.input, experiment.method, name)
        .with_prediction_task(experiment.task)
        .with_classifier(experiment.classifier)
        .with_trials(args.trials.unwrap_or(optimization.trials))
        .with_seed(experiment.seed.unwrap_or(optimization.seed))
        .with_dimensions_range(
            args.min_dimensions.unwrap_or(optimization.min_dimensions),
            args.max_dimensions.unwrap_or(optimization.max_dimensions),
        )
        .with_base_params(experiment.params.apply(&config.embedding));
    if let (Some(training), Some(testing)) = (&experiment.training, &experiment.testing) {
        request = request.with_split_files(training, testing);
    }
    if let Some(labels) = &experiment.labels_file {
        request = request.with_labels_file(labels);
    }
    request
}

/// `seffnet evaluate`
pub fn cmd_evaluate(config: &SeffnetConfig, args: &EvaluateArgs) -> Result<()> {
    let request = evaluation_request(config, &args.experiment, Some(&args.artifacts));
    let orchestrator = TrainingOrchestrator::new(method_table(config, &args.experiment));
    let report = orchestrator.evaluate(&request)?;
    emit(&report, args.output.as_deref())
}

/// `seffnet train`
///
/// Prints the predictive model unless `--predictive-model-path` is given.
pub fn cmd_train(config: &SeffnetConfig, args: &TrainArgs) -> Result<()> {
    let request = evaluation_request(config, &args.experiment, Some(&args.artifacts));
    let orchestrator = TrainingOrchestrator::new(method_table(config, &args.experiment));
    let model = orchestrator.train_model(&request)?;
    match &request.predictive_model_path {
        Some(path) => tracing::info!(path = %path.display(), "Saved predictive model"),
        None => println!("{}", serde_json::to_string_pretty(&model)?),
    }
    Ok(())
}

/// `seffnet repeat`
pub fn cmd_repeat(config: &SeffnetConfig, args: &RepeatArgs) -> Result<()> {
    let request = evaluation_request(config, &args.experiment, None);
    let orchestrator = TrainingOrchestrator::new(method_table(config, &args.experiment));
    let report = orchestrator.repeat_experiment(&request, args.repeats)?;
    emit(&report, args.output.as_deref())
}

/// `seffnet optimize`
pub fn cmd_optimize(config: &SeffnetConfig, args: &OptimizeArgs) -> Result<()> {
    let request = optimization_request(config, args);
    let orchestrator = OptimizationOrchestrator::new(method_table(config, &args.experiment));
    let study = orchestrator.optimize(&request)?;
    let report = study.report(request.prediction_task)?;
    tracing::info!(
        study = %request.name,
        best_trial = report.best.trial,
        value = report.best.value,
        "Study finished"
    );
    emit(&report, args.output.as_deref())
}
