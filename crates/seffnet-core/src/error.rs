//! Error types for SEffNet.

use std::path::{Path, PathBuf};

/// Result type alias for SEffNet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while splitting graphs, extracting subgraphs,
/// or orchestrating embedding runs.
///
/// Every variant except [`Error::Io`] and [`Error::Backend`] describes a
/// deterministic input-validation failure. Nothing in the workspace retries.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or incomplete configuration (e.g. node classification
    /// requested without a labels file).
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// A graph node has no entry in the node-id mapping.
    #[error("No node-id mapping for node {node}")]
    MissingMapping {
        /// Display form of the unresolved node
        node: String,
    },

    /// A source/target entity type tag is not one of chemical, protein, phenotype.
    #[error("Invalid {role} type '{value}': expected chemical, protein or phenotype")]
    InvalidEntityType {
        /// Which endpoint carried the tag ("source" or "target")
        role: String,
        /// The rejected tag
        value: String,
    },

    /// Source and target are disconnected.
    #[error("No path between {from} and {to}")]
    NoPathFound {
        /// Display form of the source node
        from: String,
        /// Display form of the target node
        to: String,
    },

    /// A requested node is not part of the graph.
    #[error("Node not found in graph: {node}")]
    NodeNotFound {
        /// Display form of the missing node
        node: String,
    },

    /// A required input file is absent.
    #[error("Missing {kind} file: {}", path.display())]
    MissingInputFile {
        /// Kind of input ("cluster", "mapping", "graph", ...)
        kind: String,
        /// Path that was checked
        path: PathBuf,
    },

    /// An edge carries a weight outside `[0, 1]`.
    #[error("Invalid weight {weight} on edge {from} -> {to}: must be within [0, 1]")]
    InvalidWeight {
        /// Display form of the edge source
        from: String,
        /// Display form of the edge target
        to: String,
        /// The rejected weight
        weight: f64,
    },

    /// Malformed input content.
    #[error("Parse error: {0}")]
    Parse(String),

    /// I/O failure bound to a path.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// TSV reading failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure reported by a delegated embedding or ML collaborator.
    ///
    /// These are passed through unchanged; the source (if any) is kept intact.
    #[error("{message}")]
    Backend {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Returns whether this error is a deterministic input-validation failure.
    pub fn is_input_error(&self) -> bool {
        match self {
            Error::Config { .. }
            | Error::MissingMapping { .. }
            | Error::InvalidEntityType { .. }
            | Error::NoPathFound { .. }
            | Error::NodeNotFound { .. }
            | Error::MissingInputFile { .. }
            | Error::InvalidWeight { .. }
            | Error::Parse(_)
            | Error::Csv(_)
            | Error::Json(_) => true,
            Error::Io { .. } | Error::Backend { .. } => false,
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a new parse error.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Error::Parse(message.into())
    }

    /// Wraps an I/O error with the path it occurred on.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a missing-input-file error.
    pub fn missing_input<S: Into<String>>(kind: S, path: impl AsRef<Path>) -> Self {
        Error::MissingInputFile {
            kind: kind.into(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates a missing-mapping error for the given node.
    pub fn missing_mapping(node: impl std::fmt::Display) -> Self {
        Error::MissingMapping {
            node: node.to_string(),
        }
    }

    /// Creates an invalid-entity-type error.
    pub fn invalid_entity_type<R: Into<String>, V: Into<String>>(role: R, value: V) -> Self {
        Error::InvalidEntityType {
            role: role.into(),
            value: value.into(),
        }
    }

    /// Creates a no-path error between two nodes.
    pub fn no_path(from: impl std::fmt::Display, to: impl std::fmt::Display) -> Self {
        Error::NoPathFound {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Creates a node-not-found error.
    pub fn node_not_found(node: impl std::fmt::Display) -> Self {
        Error::NodeNotFound {
            node: node.to_string(),
        }
    }

    /// Creates a backend error with a message.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Error::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a backend error with a message and source error.
    pub fn backend_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::config("No input label file");
        assert_eq!(err.to_string(), "Configuration error: No input label file");
        assert!(err.is_input_error());
    }

    #[test]
    fn test_missing_mapping_display() {
        let err = Error::missing_mapping("pubchem.compound:2244");
        assert_eq!(
            err.to_string(),
            "No node-id mapping for node pubchem.compound:2244"
        );
    }

    #[test]
    fn test_invalid_entity_type_display() {
        let err = Error::invalid_entity_type("source", "gene");
        assert!(err.to_string().contains("source"));
        assert!(err.to_string().contains("gene"));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_no_path_display() {
        let err = Error::no_path("a", "b");
        assert_eq!(err.to_string(), "No path between a and b");
    }

    #[test]
    fn test_missing_input_display() {
        let err = Error::missing_input("cluster", "/data/clusters.tsv");
        assert_eq!(err.to_string(), "Missing cluster file: /data/clusters.tsv");
        let Error::MissingInputFile { kind, path } = err else {
            unreachable!("Expected MissingInputFile variant");
        };
        assert_eq!(kind, "cluster");
        assert_eq!(path, PathBuf::from("/data/clusters.tsv"));
    }

    #[test]
    fn test_io_error_is_not_input_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::io_with_path(io, "/tmp/out.txt");
        assert!(err.to_string().contains("/tmp/out.txt"));
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_backend_error_keeps_source() {
        let io = std::io::Error::other("embedding crashed");
        let err = Error::backend_with_source("DeepWalk failed", io);
        assert_eq!(err.to_string(), "DeepWalk failed");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: Error = serde_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_error_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
