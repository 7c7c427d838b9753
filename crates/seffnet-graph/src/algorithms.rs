//! Shortest-path enumeration over undirected, edge-weighted graphs.
//!
//! Provides:
//! - All minimum-hop paths (BFS with predecessor lists)
//! - All minimum-cost paths (Dijkstra with predecessor lists)
//! - Path cost evaluation
//!
//! Parallel edges are allowed; the cheapest one decides a step's cost.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, VecDeque};

// ============================================================================
// Result types
// ============================================================================

/// Every minimum-length path between two nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct ShortestPaths {
    /// Paths from source to target, each as a list of node indices.
    pub paths: Vec<Vec<NodeIndex>>,
    /// Length shared by all paths: hop count or summed cost.
    pub distance: f64,
}

impl ShortestPaths {
    /// Number of paths found.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no path was found.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

type Predecessors = HashMap<NodeIndex, Vec<NodeIndex>>;

// ============================================================================
// Public API
// ============================================================================

/// Finds all shortest paths from `source` to `target`.
///
/// With `weighted`, edge weights are traversal costs and must be
/// non-negative; otherwise every edge costs one hop. Returns `None` when the
/// target is unreachable or either index is out of range.
pub fn all_shortest_paths<N>(
    graph: &UnGraph<N, f64>,
    source: NodeIndex,
    target: NodeIndex,
    weighted: bool,
) -> Option<ShortestPaths> {
    if graph.node_weight(source).is_none() || graph.node_weight(target).is_none() {
        return None;
    }
    if source == target {
        return Some(ShortestPaths {
            paths: vec![vec![source]],
            distance: 0.0,
        });
    }

    let (distance, predecessors) = if weighted {
        dijkstra_predecessors(graph, source, target)?
    } else {
        bfs_predecessors(graph, source, target)?
    };

    Some(ShortestPaths {
        paths: build_paths(&predecessors, source, target),
        distance,
    })
}

/// Summed cost of `path`, taking the cheapest edge between consecutive
/// nodes. Returns `None` if two consecutive nodes are not adjacent.
pub fn path_cost<N>(graph: &UnGraph<N, f64>, path: &[NodeIndex]) -> Option<f64> {
    let mut total = 0.0;
    for step in path.windows(2) {
        let [from, to] = step else { continue };
        let cheapest = graph
            .edges_connecting(*from, *to)
            .map(|e| *e.weight())
            .min_by(f64::total_cmp)?;
        total += cheapest;
    }
    Some(total)
}

// ============================================================================
// Search
// ============================================================================

fn bfs_predecessors<N>(
    graph: &UnGraph<N, f64>,
    source: NodeIndex,
    target: NodeIndex,
) -> Option<(f64, Predecessors)> {
    let mut depth: HashMap<NodeIndex, usize> = HashMap::from([(source, 0)]);
    let mut predecessors = Predecessors::new();
    let mut queue = VecDeque::from([source]);

    while let Some(node) = queue.pop_front() {
        let next_depth = depth[&node] + 1;
        if depth.get(&target).is_some_and(|&d| next_depth > d) {
            break;
        }
        for neighbor in graph.neighbors(node) {
            match depth.get(&neighbor) {
                None => {
                    depth.insert(neighbor, next_depth);
                    predecessors.insert(neighbor, vec![node]);
                    queue.push_back(neighbor);
                }
                Some(&d) if d == next_depth => {
                    let preds = predecessors.entry(neighbor).or_default();
                    if !preds.contains(&node) {
                        preds.push(node);
                    }
                }
                Some(_) => {}
            }
        }
    }

    let hops = *depth.get(&target)?;
    Some((hops as f64, predecessors))
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

fn dijkstra_predecessors<N>(
    graph: &UnGraph<N, f64>,
    source: NodeIndex,
    target: NodeIndex,
) -> Option<(f64, Predecessors)> {
    let mut dist: HashMap<NodeIndex, f64> = HashMap::from([(source, 0.0)]);
    let mut predecessors = Predecessors::new();
    let mut heap = BinaryHeap::from([Reverse((Cost(0.0), source.index()))]);

    while let Some(Reverse((Cost(cost), raw))) = heap.pop() {
        let node = NodeIndex::new(raw);
        if dist.get(&node).is_some_and(|&best| cost > best) {
            continue;
        }
        if dist.get(&target).is_some_and(|&best| cost > best) {
            break;
        }
        for edge in graph.edges(node) {
            let neighbor = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            if neighbor == node {
                continue;
            }
            let candidate = cost + *edge.weight();
            match dist.get(&neighbor) {
                Some(&best) if candidate > best => {}
                Some(&best) if candidate == best => {
                    let preds = predecessors.entry(neighbor).or_default();
                    if !preds.contains(&node) {
                        preds.push(node);
                    }
                }
                _ => {
                    dist.insert(neighbor, candidate);
                    predecessors.insert(neighbor, vec![node]);
                    heap.push(Reverse((Cost(candidate), neighbor.index())));
                }
            }
        }
    }

    let distance = *dist.get(&target)?;
    Some((distance, predecessors))
}

// Walks predecessor lists back from the target. Zero-cost edges can make
// predecessors mutually reachable, so nodes already on the path are skipped.
fn build_paths(
    predecessors: &Predecessors,
    source: NodeIndex,
    target: NodeIndex,
) -> Vec<Vec<NodeIndex>> {
    let mut paths = Vec::new();
    let mut stack: Vec<(NodeIndex, usize)> = vec![(target, 0)];
    let mut current: Vec<NodeIndex> = vec![target];

    while let Some(&(node, next)) = stack.last() {
        if node == source {
            paths.push(current.iter().rev().copied().collect());
            stack.pop();
            current.pop();
            continue;
        }
        let preds = predecessors.get(&node).map(Vec::as_slice).unwrap_or(&[]);
        match preds.get(next) {
            Some(&pred) => {
                if let Some(top) = stack.last_mut() {
                    top.1 += 1;
                }
                if !current.contains(&pred) {
                    stack.push((pred, 0));
                    current.push(pred);
                }
            }
            None => {
                stack.pop();
                current.pop();
            }
        }
    }
    paths
}
