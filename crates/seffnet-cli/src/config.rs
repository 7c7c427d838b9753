//! Configuration for the `seffnet` binary.
//!
//! Resolution order: `--config`, then `SEFFNET_CONFIG`, then
//! `<config dir>/seffnet/config.toml`. Missing sections fall back to the
//! built-in defaults of each library type.

use seffnet_core::{Error, Result};
use seffnet_graph::{SamplingPolicy, SplitConfig, SplitPaths};
use seffnet_train::{
    DEFAULT_DIMENSIONS_RANGE, DEFAULT_EMBEDDING_PROGRAM, DEFAULT_STUDY_SEED, DEFAULT_TRIALS,
    EmbeddingParams,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Binary and configuration directory name.
pub const PROJECT_NAME: &str = "seffnet";

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "SEFFNET_CONFIG";

// ============================================================================
// Sections
// ============================================================================

/// File locations shared by the subcommands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Full graph (node-link JSON).
    pub graph: PathBuf,
    /// Cluster TSV.
    pub clusters: PathBuf,
    /// Mapping TSV.
    pub mapping: PathBuf,
    /// Training edge list.
    pub train: PathBuf,
    /// Testing edge list.
    pub test: PathBuf,
    /// External program that trains embeddings.
    pub embedding_program: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let split = SplitPaths::default();
        Self {
            graph: split.graph,
            clusters: split.clusters,
            mapping: split.mapping,
            train: split.train,
            test: split.test,
            embedding_program: DEFAULT_EMBEDDING_PROGRAM.to_string(),
        }
    }
}

impl PathsConfig {
    /// The split inputs and outputs.
    pub fn split_paths(&self) -> SplitPaths {
        SplitPaths {
            graph: self.graph.clone(),
            clusters: self.clusters.clone(),
            mapping: self.mapping.clone(),
            train: self.train.clone(),
            test: self.test.clone(),
        }
    }
}

/// Hyperparameter study defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    /// Trials per study.
    pub trials: usize,
    /// Study seed.
    pub seed: u64,
    /// Smallest dimensionality sampled.
    pub min_dimensions: usize,
    /// Largest dimensionality sampled.
    pub max_dimensions: usize,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: DEFAULT_STUDY_SEED,
            min_dimensions: DEFAULT_DIMENSIONS_RANGE.0,
            max_dimensions: DEFAULT_DIMENSIONS_RANGE.1,
        }
    }
}

// ============================================================================
// SeffnetConfig
// ============================================================================

/// Top-level configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeffnetConfig {
    /// `[paths]`
    pub paths: PathsConfig,
    /// `[split]`
    pub split: SplitConfig,
    /// `[subgraph]`
    pub subgraph: SamplingPolicy,
    /// `[embedding]`
    pub embedding: EmbeddingParams,
    /// `[optimization]`
    pub optimization: OptimizationConfig,
}

impl SeffnetConfig {
    /// Name used in hints printed to the user.
    pub fn project_name() -> &'static str {
        PROJECT_NAME
    }

    /// `<config dir>/seffnet/config.toml`, if the platform has a config dir.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(PROJECT_NAME).join("config.toml"))
    }

    /// The file a run would read.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Loads the resolved file.
    ///
    /// An explicit path must exist. The default location may be absent, in
    /// which case the built-in defaults apply.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let Some(path) = Self::resolve_config_path(explicit) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            if explicit.is_some() {
                return Err(Error::missing_input("config", &path));
            }
            tracing::debug!(path = %path.display(), "No config file; using defaults");
            return Ok(Self::default());
        }
        Self::from_path(&path)
    }

    /// Parses a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let config = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Pretty TOML rendering.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_library_constants() {
        let config = SeffnetConfig::default();
        assert_eq!(config.split.seed, 7);
        assert_eq!(config.split.n_splits, 2);
        assert!((config.split.test_fraction - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.subgraph.threshold, 100);
        assert_eq!(config.subgraph.sample_size, 10);
        assert_eq!(config.embedding.dimensions, 300);
        assert_eq!(config.paths.embedding_program, "bionev");
        assert_eq!(config.paths.graph, PathBuf::from("data/fullgraph.json"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = SeffnetConfig::default();
        let rendered = config.to_toml_string().unwrap();
        for section in ["[paths]", "[split]", "[subgraph]", "[embedding]", "[optimization]"] {
            assert!(rendered.contains(section), "missing {section}");
        }
        let parsed: SeffnetConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[split]\nseed = 11\n\n[embedding]\ndimensions = 64\n").unwrap();

        let config = SeffnetConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.split.seed, 11);
        assert_eq!(config.split.n_splits, 2);
        assert_eq!(config.embedding.dimensions, 64);
        assert_eq!(config.embedding.walk_length, 8);
        assert_eq!(config.optimization, OptimizationConfig::default());
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let err = SeffnetConfig::load(Some(path.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, Error::MissingInputFile { .. }));
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[split\nseed = ").unwrap();
        let err = SeffnetConfig::load(Some(path.to_str().unwrap())).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_explicit_path_wins() {
        assert_eq!(
            SeffnetConfig::resolve_config_path(Some("/tmp/x.toml")),
            Some(PathBuf::from("/tmp/x.toml"))
        );
    }

    #[test]
    fn test_split_paths_follow_paths_section() {
        let mut config = SeffnetConfig::default();
        config.paths.train = PathBuf::from("out/train.edgelist");
        let paths = config.paths.split_paths();
        assert_eq!(paths.train, PathBuf::from("out/train.edgelist"));
        assert_eq!(paths.mapping, config.paths.mapping);
    }
}
