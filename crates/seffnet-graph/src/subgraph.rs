//! Explanation subgraphs between two entities.
//!
//! [`SubgraphExtractor`] finds every shortest path between a source and a
//! target entity, caps how many of them are used, and returns the graph
//! induced by the nodes on the chosen paths with chemicals relabeled to
//! their names.

use crate::algorithms::{all_shortest_paths, path_cost};
use crate::{KnowledgeGraph, NameMapping, Node};
use rand::Rng;
use seffnet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Path count above which paths are sampled.
pub const DEFAULT_PATH_THRESHOLD: usize = 100;
/// Number of paths kept when sampling.
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

// ============================================================================
// Entity descriptors
// ============================================================================

/// Kind of entity an endpoint refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    /// A PubChem compound.
    Chemical,
    /// A UniProt protein.
    Protein,
    /// A UMLS phenotype.
    Phenotype,
}

impl EntityType {
    /// Parses a type tag for the given endpoint role (`source` or `target`).
    pub fn parse(role: &str, value: &str) -> Result<Self> {
        match value {
            "chemical" => Ok(Self::Chemical),
            "protein" => Ok(Self::Protein),
            "phenotype" => Ok(Self::Phenotype),
            other => Err(Error::invalid_entity_type(role, other)),
        }
    }

    /// The type tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chemical => "chemical",
            Self::Protein => "protein",
            Self::Phenotype => "phenotype",
        }
    }
}

impl FromStr for EntityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse("entity", s)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source or target of an extraction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Entity kind.
    pub entity_type: EntityType,
    /// Display name.
    pub name: Option<String>,
    /// External identifier.
    pub identifier: Option<String>,
}

impl EntityDescriptor {
    /// A chemical known by PubChem identifier.
    pub fn chemical(identifier: impl Into<String>) -> Self {
        Self {
            entity_type: EntityType::Chemical,
            name: None,
            identifier: Some(identifier.into()),
        }
    }

    /// A protein.
    pub fn protein(name: Option<String>, identifier: Option<String>) -> Self {
        Self {
            entity_type: EntityType::Protein,
            name,
            identifier,
        }
    }

    /// A phenotype.
    pub fn phenotype(name: Option<String>, identifier: Option<String>) -> Self {
        Self {
            entity_type: EntityType::Phenotype,
            name,
            identifier,
        }
    }

    /// Builds a descriptor from an untyped tag, failing with
    /// `InvalidEntityType` for anything but chemical, protein or phenotype.
    pub fn parse(
        role: &str,
        type_tag: &str,
        name: Option<String>,
        identifier: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            entity_type: EntityType::parse(role, type_tag)?,
            name,
            identifier,
        })
    }

    /// The graph node this descriptor names. Chemicals carry only their
    /// identifier.
    pub fn to_node(&self) -> Node {
        match self.entity_type {
            EntityType::Chemical => {
                let mut node = Node::new(crate::Namespace::PubchemCompound);
                node.identifier = self.identifier.clone();
                node
            }
            EntityType::Protein => Node::protein(self.name.clone(), self.identifier.clone()),
            EntityType::Phenotype => Node::phenotype(self.name.clone(), self.identifier.clone()),
        }
    }
}

// ============================================================================
// Sampling policy
// ============================================================================

/// When and how many shortest paths are sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingPolicy {
    /// Sampling happens only when strictly more paths than this are found.
    pub threshold: usize,
    /// Paths drawn uniformly without replacement when sampling.
    pub sample_size: usize,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PATH_THRESHOLD,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// An extracted explanation subgraph.
#[derive(Clone, Debug)]
pub struct Subgraph {
    /// Induced, relabeled subgraph. Edge weights are traversal costs.
    pub graph: KnowledgeGraph,
    /// The paths the subgraph was induced from, before relabeling.
    pub paths: Vec<Vec<Node>>,
    /// Number of shortest paths found.
    pub total_paths: usize,
    /// Whether `paths` is a sample of the shortest paths.
    pub sampled: bool,
    /// Shared length of the paths: hops, or summed cost when weighted.
    pub distance: f64,
    /// Summed traversal cost of each path in `paths`, whether or not the
    /// search was weighted.
    pub path_costs: Vec<f64>,
}

/// Shortest-path subgraph extractor.
#[derive(Clone, Debug)]
pub struct SubgraphExtractor {
    policy: SamplingPolicy,
    cost: fn(f64) -> f64,
}

impl Default for SubgraphExtractor {
    fn default() -> Self {
        Self {
            policy: SamplingPolicy::default(),
            cost: similarity_to_distance,
        }
    }
}

/// Converts a similarity weight into a traversal cost.
pub fn similarity_to_distance(weight: f64) -> f64 {
    1.0 - weight
}

impl SubgraphExtractor {
    /// Creates an extractor with the default policy and cost transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sampling policy.
    pub fn with_policy(mut self, policy: SamplingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the weight-to-cost transform.
    pub fn with_cost(mut self, cost: fn(f64) -> f64) -> Self {
        self.cost = cost;
        self
    }

    /// The active sampling policy.
    pub fn policy(&self) -> &SamplingPolicy {
        &self.policy
    }

    /// Extracts the subgraph between `source` and `target`.
    ///
    /// `graph` is not modified; costs are computed on a copy. `rng` is only
    /// drawn from when the path count exceeds the sampling threshold.
    pub fn extract<R: Rng + ?Sized>(
        &self,
        graph: &KnowledgeGraph,
        source: &EntityDescriptor,
        target: &EntityDescriptor,
        weighted: bool,
        names: &NameMapping,
        rng: &mut R,
    ) -> Result<Subgraph> {
        let mut working = graph.clone();
        working.map_weights(self.cost);

        let source_node = source.to_node();
        let target_node = target.to_node();
        let from = working
            .get_index(&source_node)
            .ok_or_else(|| Error::node_not_found(&source_node))?;
        let to = working
            .get_index(&target_node)
            .ok_or_else(|| Error::node_not_found(&target_node))?;

        let undirected = working.to_undirected();
        let found = all_shortest_paths(&undirected, from, to, weighted)
            .ok_or_else(|| Error::no_path(&source_node, &target_node))?;
        let total_paths = found.len();
        log::info!(
            "Found {total_paths} shortest path(s) between {source_node} and {target_node}"
        );

        let sampled = total_paths > self.policy.threshold;
        let selected: Vec<&Vec<_>> = if sampled {
            let amount = self.policy.sample_size.min(total_paths);
            log::debug!("Sampling {amount} of {total_paths} paths");
            rand::seq::index::sample(rng, total_paths, amount)
                .into_iter()
                .map(|i| &found.paths[i])
                .collect()
        } else {
            found.paths.iter().collect()
        };

        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        let mut paths = Vec::with_capacity(selected.len());
        let mut path_costs = Vec::with_capacity(selected.len());
        for path in selected {
            let cost = path_cost(&undirected, path)
                .ok_or_else(|| Error::no_path(&source_node, &target_node))?;
            path_costs.push(cost);
            let path: Vec<Node> = path.iter().map(|&idx| working.graph[idx].clone()).collect();
            for node in &path {
                if seen.insert(node.key()) {
                    nodes.push(node.clone());
                }
            }
            paths.push(path);
        }

        log::debug!("Chosen path costs: {path_costs:?}");

        let induced = working.induced_subgraph(&nodes);
        let relabeled = induced.relabel_nodes(|node| names.relabel(node));
        log::info!(
            "Extracted subgraph with {} nodes and {} edges",
            relabeled.node_count(),
            relabeled.edge_count()
        );

        Ok(Subgraph {
            graph: relabeled,
            paths,
            total_paths,
            sampled,
            distance: found.distance,
            path_costs,
        })
    }
}
