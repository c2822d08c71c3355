//! Choosing the cheapest correct update for the render surface.
//!
//! The decision is a pure function of the previous render and the freshly
//! computed graph. The controller applies whatever path comes out.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::graph::{GraphSignature, VisibleGraph, VisibleNode};

/// How a render is pushed to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncPath {
    /// Same graph, same selection. Nothing to do.
    Unchanged,
    /// Same structure; restyle nodes in place and re-select.
    SelectionOnly,
    /// Remove vanished ids and upsert the rest.
    Incremental,
    /// Replace all surface data.
    FullRebuild,
}

impl fmt::Display for SyncPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPath::Unchanged => "unchanged",
            SyncPath::SelectionOnly => "selection-only",
            SyncPath::Incremental => "incremental",
            SyncPath::FullRebuild => "full-rebuild",
        };
        f.write_str(name)
    }
}

/// What the surface currently shows, as far as the decision is concerned.
#[derive(Debug, Clone, Copy)]
pub struct PreviousRender<'a> {
    pub signature: &'a GraphSignature,
    pub selected: Option<&'a str>,
}

/// Pick the sync path for a new graph.
///
/// A signature that differs only in display mode keeps every node and edge
/// id, so it is handled as a restyle.
pub fn choose_path(
    previous: Option<PreviousRender<'_>>,
    next: &GraphSignature,
    selected: Option<&str>,
    incremental: bool,
) -> SyncPath {
    let Some(previous) = previous else {
        return SyncPath::FullRebuild;
    };
    if previous.signature == next {
        if previous.selected == selected {
            SyncPath::Unchanged
        } else {
            SyncPath::SelectionOnly
        }
    } else if previous.signature.same_structure(next) {
        SyncPath::SelectionOnly
    } else if incremental {
        SyncPath::Incremental
    } else {
        SyncPath::FullRebuild
    }
}

/// Id-level difference between what the surface holds and a new graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderDiff {
    pub removed_nodes: Vec<String>,
    pub removed_edges: Vec<String>,
    /// Every node of the new graph. Nodes the surface already holds carry no
    /// position so their live one is kept.
    pub upsert_nodes: Vec<VisibleNode>,
    pub added_nodes: usize,
}

impl RenderDiff {
    pub fn between(node_ids: &HashSet<String>, edge_ids: &HashSet<String>, graph: &VisibleGraph) -> Self {
        let next_nodes = graph.node_ids();
        let next_edges = graph.edge_ids();

        let mut removed_nodes: Vec<String> =
            node_ids.iter().filter(|id| !next_nodes.contains(id.as_str())).cloned().collect();
        let mut removed_edges: Vec<String> =
            edge_ids.iter().filter(|id| !next_edges.contains(id.as_str())).cloned().collect();
        removed_nodes.sort_unstable();
        removed_edges.sort_unstable();

        let mut added_nodes = 0;
        let upsert_nodes = graph
            .nodes
            .iter()
            .map(|node| {
                if node_ids.contains(&node.id) {
                    node.without_position()
                } else {
                    added_nodes += 1;
                    node.clone()
                }
            })
            .collect();

        Self {
            removed_nodes,
            removed_edges,
            upsert_nodes,
            added_nodes,
        }
    }
}
