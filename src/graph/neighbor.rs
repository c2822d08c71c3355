//! Undirected neighbor graph and breadth-first depth expansion.
//!
//! The adjacency is stored in a petgraph `StableUnGraph` whose node weights
//! are member ids. Building it is O(E); `NeighborCache` keeps the last one
//! around as long as the edge list it was built from looks the same.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableUnGraph};

use super::edge::GraphEdge;
use super::hash::fold_str;

/// Adjacency over a set of edges, ignoring direction.
#[derive(Debug, Clone, Default)]
pub struct NeighborGraph {
    graph: StableUnGraph<String, ()>,
    id_to_index: HashMap<String, NodeIndex>,
}

impl NeighborGraph {
    /// Build the adjacency for `edges`.
    pub fn build(edges: &[GraphEdge]) -> Self {
        let mut graph = Self {
            graph: StableUnGraph::with_capacity(edges.len(), edges.len()),
            id_to_index: HashMap::with_capacity(edges.len()),
        };
        for edge in edges {
            let from = graph.intern(&edge.from);
            let to = graph.intern(&edge.to);
            graph.graph.add_edge(from, to, ());
        }
        graph
    }

    fn intern(&mut self, id: &str) -> NodeIndex {
        if let Some(&index) = self.id_to_index.get(id) {
            return index;
        }
        let index = self.graph.add_node(id.to_string());
        self.id_to_index.insert(id.to_string(), index);
        index
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Neighbor ids of `id` (empty for unknown ids).
    pub fn neighbors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a str> + use<'a> {
        self.id_to_index
            .get(id)
            .into_iter()
            .flat_map(move |&index| self.graph.neighbors(index))
            .map(move |n| self.graph[n].as_str())
    }

    /// Grow `seed` by `depth` rounds of frontier expansion.
    ///
    /// Depth 0 returns the seed unchanged. Stops early once a round adds
    /// nothing new.
    pub fn expand_by_depth(&self, seed: &HashSet<String>, depth: u32) -> HashSet<String> {
        let mut expanded = seed.clone();
        if seed.is_empty() || depth == 0 {
            return expanded;
        }
        let mut frontier: Vec<&str> = seed.iter().map(String::as_str).collect();
        for _ in 0..depth {
            let mut next = Vec::new();
            for id in frontier {
                for neighbor in self.neighbors(id) {
                    if expanded.insert(neighbor.to_string()) {
                        next.push(neighbor);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        expanded
    }
}

/// Cheap identity of an edge list: length, boundary ids and an
/// order-dependent hash of every id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeListKey {
    len: usize,
    first: Option<String>,
    last: Option<String>,
    hash: i32,
}

impl EdgeListKey {
    pub fn of(edges: &[GraphEdge]) -> Self {
        Self {
            len: edges.len(),
            first: edges.first().map(|e| e.id.clone()),
            last: edges.last().map(|e| e.id.clone()),
            hash: edges.iter().fold(0, |h, e| fold_str(h, &e.id)),
        }
    }
}

/// Last built neighbor graph plus the key of the edges it came from.
#[derive(Debug, Clone, Default)]
pub struct NeighborCache {
    key: Option<EdgeListKey>,
    graph: NeighborGraph,
    builds: usize,
}

impl NeighborCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Neighbor graph for `edges`, rebuilt only when the key changed.
    pub fn get(&mut self, edges: &[GraphEdge]) -> &NeighborGraph {
        let key = EdgeListKey::of(edges);
        if self.key.as_ref() != Some(&key) {
            self.graph = NeighborGraph::build(edges);
            self.key = Some(key);
            self.builds += 1;
        }
        &self.graph
    }

    /// Drop the cached graph.
    pub fn clear(&mut self) {
        self.key = None;
        self.graph = NeighborGraph::default();
    }

    /// Number of times the graph was (re)built.
    pub fn builds(&self) -> usize {
        self.builds
    }
}

/// One-shot expansion without a cache.
pub fn expand_by_depth(seed: &HashSet<String>, edges: &[GraphEdge], depth: u32) -> HashSet<String> {
    if seed.is_empty() || depth == 0 {
        return seed.clone();
    }
    NeighborGraph::build(edges).expand_by_depth(seed, depth)
}
