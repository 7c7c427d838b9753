//! Node embeddings and the embedding-method capability interface.
//!
//! Embedding algorithms are external collaborators. Each [`Method`] maps to
//! an [`EmbeddingMethod`] handler in a [`MethodTable`]; a handler trains on a
//! graph and returns an [`EmbeddingModel`] exposing the learned vectors.
//!
//! Embeddings persist in the word2vec text format:
//!
//! ```text
//! <node count> <dimensions>
//! <node> <v1> ... <vd>
//! ```

use crate::method::{EmbeddingParams, Method};
use seffnet_core::{Error, Result};
use seffnet_graph::SimpleGraph;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// Embeddings
// ============================================================================

/// Fixed-width vectors keyed by node id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Embeddings {
    dimensions: usize,
    vectors: BTreeMap<String, Vec<f64>>,
}

impl Embeddings {
    /// Creates an empty set of `dimensions`-wide embeddings.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            vectors: BTreeMap::new(),
        }
    }

    /// Vector width.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of embedded nodes.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether no node is embedded.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Adds or replaces a node's vector.
    pub fn insert(&mut self, node: impl Into<String>, vector: Vec<f64>) -> Result<()> {
        let node = node.into();
        if vector.len() != self.dimensions {
            return Err(Error::parse(format!(
                "embedding for '{node}' has {} values, expected {}",
                vector.len(),
                self.dimensions
            )));
        }
        self.vectors.insert(node, vector);
        Ok(())
    }

    /// Vector of `node`, if embedded.
    pub fn get(&self, node: &str) -> Option<&[f64]> {
        self.vectors.get(node).map(Vec::as_slice)
    }

    /// Iterates over `(node, vector)` in node order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.vectors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Parses word2vec text.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut lines = BufReader::new(reader).lines();
        let header = lines
            .next()
            .ok_or_else(|| Error::parse("embedding file is empty"))?
            .map_err(|e| Error::parse(format!("embedding header: {e}")))?;
        let mut fields = header.split_whitespace().map(str::parse::<usize>);
        let (Some(Ok(count)), Some(Ok(dimensions))) = (fields.next(), fields.next()) else {
            return Err(Error::parse(format!(
                "embedding header must be '<count> <dimensions>', got '{header}'"
            )));
        };

        let mut embeddings = Self::new(dimensions);
        for (number, line) in lines.enumerate() {
            let line = line.map_err(|e| Error::parse(format!("embedding line {}: {e}", number + 2)))?;
            let mut fields = line.split_whitespace();
            let Some(node) = fields.next() else { continue };
            let vector = fields
                .map(str::parse::<f64>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::parse(format!("embedding line {}: {e}", number + 2)))?;
            embeddings.insert(node, vector)?;
        }
        if embeddings.len() != count {
            log::warn!(
                "Embedding header announces {count} nodes, found {}",
                embeddings.len()
            );
        }
        Ok(embeddings)
    }

    /// Reads a word2vec text file.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| Error::io_with_path(e, path))?;
        Self::from_reader(file)
    }

    /// Writes word2vec text.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{} {}", self.len(), self.dimensions)?;
        for (node, vector) in &self.vectors {
            write!(writer, "{node}")?;
            for value in vector {
                write!(writer, " {value}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    /// Saves word2vec text to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        seffnet_core::write_all_or_nothing(path, |w| self.write_to(w))
    }
}

// ============================================================================
// Capability traits
// ============================================================================

/// A trained embedding model.
pub trait EmbeddingModel: Send {
    /// The final node embeddings.
    fn embeddings(&self) -> &Embeddings;

    /// Embeddings captured during training. Methods that refine vectors
    /// after training (LINE) are evaluated on these.
    fn training_embeddings(&self) -> &Embeddings {
        self.embeddings()
    }

    /// Persists the trained model.
    fn save_model(&self, path: &Path) -> Result<()>;

    /// Persists the final embeddings.
    fn save_embeddings(&self, path: &Path) -> Result<()> {
        self.embeddings().save(path)
    }
}

/// Trains embeddings for one method.
///
/// # Object Safety
///
/// Handlers are stored as `Arc<dyn EmbeddingMethod>` in a [`MethodTable`].
pub trait EmbeddingMethod: Send + Sync {
    /// Handler name for diagnostics.
    fn name(&self) -> &str;

    /// Trains a model on `graph`.
    fn train(&self, graph: &SimpleGraph, params: &EmbeddingParams)
    -> Result<Box<dyn EmbeddingModel>>;
}

/// A model whose only state is its embeddings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainedEmbeddings {
    /// Method that produced the embeddings.
    pub method: Method,
    /// Parameters used.
    pub params: EmbeddingParams,
    /// Learned vectors.
    pub embeddings: Embeddings,
}

impl EmbeddingModel for TrainedEmbeddings {
    fn embeddings(&self) -> &Embeddings {
        &self.embeddings
    }

    fn save_model(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        seffnet_core::write_all_or_nothing(path, |w| writeln!(w, "{content}"))
    }
}

// ============================================================================
// MethodTable
// ============================================================================

/// Maps every [`Method`] to its handler.
#[derive(Clone, Default)]
pub struct MethodTable {
    handlers: HashMap<Method, Arc<dyn EmbeddingMethod>>,
}

impl MethodTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method`.
    pub fn with(mut self, method: Method, handler: Arc<dyn EmbeddingMethod>) -> Self {
        self.handlers.insert(method, handler);
        self
    }

    /// Registers the same handler for every method.
    pub fn with_all(mut self, handler: Arc<dyn EmbeddingMethod>) -> Self {
        for method in Method::ALL {
            self.handlers.insert(method, Arc::clone(&handler));
        }
        self
    }

    /// Handler for `method`.
    pub fn get(&self, method: Method) -> Result<&Arc<dyn EmbeddingMethod>> {
        self.handlers
            .get(&method)
            .ok_or_else(|| Error::config(format!("no embedding backend registered for {method}")))
    }
}

impl std::fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut methods: Vec<&Method> = self.handlers.keys().collect();
        methods.sort();
        f.debug_struct("MethodTable")
            .field("methods", &methods)
            .finish()
    }
}
