//! Freshness metadata for cached train/test edge lists.
//!
//! A split writes `<train>.meta.json` next to the training edge list. The
//! metadata records a blake3 fingerprint of:
//! - the full graph, cluster, and mapping files (contents, in that order)
//! - the split parameters (test fraction, seed, number of splits)
//!
//! A later split reuses the cached edge lists only while the fingerprint
//! still matches.

use crate::split::SplitConfig;
use chrono::Utc;
use seffnet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix appended to the training edge-list file name.
const METADATA_SUFFIX: &str = ".meta.json";

/// Metadata stored alongside a cached split.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitMetadata {
    /// Fingerprint of the inputs and parameters that produced the split.
    pub fingerprint: String,
    /// When the split was written (RFC 3339).
    pub created_at: String,
    /// Target test fraction used.
    pub test_fraction: f64,
    /// Random seed used.
    pub seed: u64,
    /// Number of partitions generated.
    pub n_splits: usize,
}

/// Outcome of checking a cached split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    /// Cached edge lists can be used.
    Valid,
    /// Cached edge lists exist but were produced from different inputs.
    Stale,
    /// At least one edge list is missing, or a rebuild was requested.
    Absent,
}

impl SplitMetadata {
    /// Creates metadata stamped with the current time.
    pub fn new(fingerprint: String, config: &SplitConfig) -> Self {
        Self {
            fingerprint,
            created_at: Utc::now().to_rfc3339(),
            test_fraction: config.test_fraction,
            seed: config.seed,
            n_splits: config.n_splits,
        }
    }

    /// Metadata path for a training edge list.
    pub fn path_for(train_path: &Path) -> PathBuf {
        let mut name = train_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(METADATA_SUFFIX);
        train_path.with_file_name(name)
    }

    /// Loads metadata for a training edge list.
    ///
    /// Returns `Ok(None)` if no metadata file exists.
    pub fn load(train_path: &Path) -> Result<Option<Self>> {
        let path = Self::path_for(train_path);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
        let metadata = serde_json::from_str(&content)
            .map_err(|e| Error::parse(format!("Invalid split metadata {}: {e}", path.display())))?;
        Ok(Some(metadata))
    }

    /// Saves metadata next to a training edge list.
    pub fn save(&self, train_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        seffnet_core::write_all_or_nothing(Self::path_for(train_path), |w| {
            writeln!(w, "{content}")
        })
    }
}

/// Computes the split fingerprint over input file contents and parameters.
pub fn compute_fingerprint(inputs: &[&Path], config: &SplitConfig) -> Result<String> {
    let mut hasher = blake3::Hasher::new();
    for path in inputs {
        let content = std::fs::read(path).map_err(|e| Error::io_with_path(e, path))?;
        hasher.update(&(content.len() as u64).to_le_bytes());
        hasher.update(&content);
    }
    hasher.update(&config.test_fraction.to_le_bytes());
    hasher.update(&config.seed.to_le_bytes());
    hasher.update(&(config.n_splits as u64).to_le_bytes());
    Ok(hasher.finalize().to_hex().to_string())
}

/// Decides whether the cached edge lists at `train`/`test` may be reused.
pub fn check_cache(
    train: &Path,
    test: &Path,
    inputs: &[&Path],
    config: &SplitConfig,
    rebuild: bool,
) -> Result<CacheStatus> {
    if rebuild || !train.exists() || !test.exists() {
        return Ok(CacheStatus::Absent);
    }

    let Some(metadata) = SplitMetadata::load(train)? else {
        log::warn!(
            "No split metadata for {}; using cached edge lists as-is",
            train.display()
        );
        return Ok(CacheStatus::Valid);
    };

    if let Some(missing) = inputs.iter().find(|p| !p.exists()) {
        log::warn!(
            "Input {} not found; cannot verify cached split, using it as-is",
            missing.display()
        );
        return Ok(CacheStatus::Valid);
    }

    if compute_fingerprint(inputs, config)? == metadata.fingerprint {
        Ok(CacheStatus::Valid)
    } else {
        log::info!("Cached split at {} is stale", train.display());
        Ok(CacheStatus::Stale)
    }
}
