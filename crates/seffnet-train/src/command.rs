//! Embedding backend that shells out to an external program.
//!
//! The program is invoked as
//!
//! ```text
//! <program> [args...] --input <edge list> --output <embeddings> --method <name> \
//!     --dimensions <d> [method-specific flags] [--weighted]
//! ```
//!
//! and must write word2vec text to the `--output` path.

use crate::embedding::{EmbeddingMethod, EmbeddingModel, Embeddings, TrainedEmbeddings};
use crate::method::{EmbeddingParams, Method};
use seffnet_core::{Error, Result};
use seffnet_graph::SimpleGraph;
use std::process::{Command, Stdio};

/// Program run when none is configured.
pub const DEFAULT_EMBEDDING_PROGRAM: &str = "bionev";

/// Runs one embedding method through an external program.
#[derive(Clone, Debug)]
pub struct CommandEmbedding {
    method: Method,
    program: String,
    args: Vec<String>,
}

impl CommandEmbedding {
    /// Creates a backend for `method` run by `program`.
    pub fn new(method: Method, program: impl Into<String>) -> Self {
        Self {
            method,
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Adds arguments placed before the generated flags.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The method this backend trains.
    pub fn method(&self) -> Method {
        self.method
    }
}

/// Flags describing `method` and the parameters it reads.
pub fn method_args(method: Method, params: &EmbeddingParams) -> Vec<String> {
    let mut args = vec![
        "--method".to_string(),
        method.as_str().to_string(),
        "--dimensions".to_string(),
        params.dimensions.to_string(),
    ];
    let mut flag = |name: &str, value: String| {
        args.push(format!("--{name}"));
        args.push(value);
    };
    match method {
        Method::Hope => {}
        Method::DeepWalk | Method::Node2Vec => {
            flag("number-walks", params.number_walks.to_string());
            flag("walk-length", params.walk_length.to_string());
            flag("window-size", params.window_size.to_string());
            if method == Method::Node2Vec {
                flag("p", params.p.to_string());
                flag("q", params.q.to_string());
            }
        }
        Method::GraRep => flag("kstep", params.kstep.to_string()),
        Method::Sdne => {
            flag("alpha", params.alpha.to_string());
            flag("beta", params.beta.to_string());
            flag("epochs", params.epochs.to_string());
        }
        Method::Line => {
            flag("order", params.order.to_string());
            flag("epochs", params.epochs.to_string());
        }
    }
    if params.weighted {
        args.push("--weighted".to_string());
    }
    args
}

impl EmbeddingMethod for CommandEmbedding {
    fn name(&self) -> &str {
        &self.program
    }

    fn train(
        &self,
        graph: &SimpleGraph,
        params: &EmbeddingParams,
    ) -> Result<Box<dyn EmbeddingModel>> {
        let scratch = tempfile::TempDir::new()
            .map_err(|e| Error::backend_with_source("failed to create scratch directory", e))?;
        let input = scratch.path().join("train.edgelist");
        let output = scratch.path().join("embeddings.txt");
        graph.write_edgelist(&input)?;

        log::info!(
            "Training {} embeddings ({} dimensions) with {}",
            self.method,
            params.dimensions,
            self.program
        );
        let result = Command::new(&self.program)
            .args(&self.args)
            .arg("--input")
            .arg(&input)
            .arg("--output")
            .arg(&output)
            .args(method_args(self.method, params))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                Error::backend_with_source(format!("failed to run '{}'", self.program), e)
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::backend(format!(
                "{} {} failed ({}): {}",
                self.program,
                self.method,
                result.status,
                stderr.trim()
            )));
        }

        let embeddings = Embeddings::read(&output)?;
        log::debug!("Read {} embeddings from {}", embeddings.len(), self.program);
        Ok(Box::new(TrainedEmbeddings {
            method: self.method,
            params: params.clone(),
            embeddings,
        }))
    }
}
