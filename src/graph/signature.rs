//! Change signature of a visible graph.
//!
//! Per-node and per-edge hashes are summed with wrapping arithmetic, so the
//! result does not depend on the order nodes and edges were produced in.

use std::fmt;

use super::hash::{fold_code, fold_str};

const PINNED_MARK: i32 = b'p' as i32;

/// Summary of a visible graph plus the state that affects its styling.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphSignature {
    pub display_nickname: bool,
    /// Member nodes only; hubs are not counted.
    pub node_count: usize,
    /// Relation, group-cohesion and hub edges.
    pub edge_count: usize,
    pub circle_filter_enabled: bool,
    /// Hash of the sorted selected circle ids, when any are selected.
    pub circle_selection_hash: Option<i32>,
    pub node_hash: i32,
    pub edge_hash: i32,
}

impl GraphSignature {
    /// Equal in everything but the display mode.
    pub fn same_structure(&self, other: &GraphSignature) -> bool {
        Self {
            display_nickname: other.display_nickname,
            ..self.clone()
        } == *other
    }
}

impl fmt::Display for GraphSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            if self.display_nickname { 'N' } else { 'n' },
            self.node_count,
            self.edge_count,
            if self.circle_filter_enabled { "CF" } else { "cf" },
        )?;
        if let Some(hash) = self.circle_selection_hash {
            write!(f, "|{hash}")?;
        }
        write!(f, "|{}|{}", self.node_hash, self.edge_hash)
    }
}

/// Accumulates a `GraphSignature` one node and edge at a time.
#[derive(Debug, Default)]
pub struct SignatureBuilder {
    node_count: usize,
    edge_count: usize,
    node_hash: i32,
    edge_hash: i32,
}

impl SignatureBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member node with its style-relevant identity state.
    pub fn add_node<'a>(
        &mut self,
        id: &str,
        group: Option<&str>,
        circles: impl IntoIterator<Item = &'a str>,
        pinned: bool,
    ) {
        let mut h = fold_str(0, id);
        if let Some(group) = group {
            h = fold_str(h, group);
        }
        for circle in circles {
            h = fold_str(h, circle);
        }
        if pinned {
            h = fold_code(h, PINNED_MARK);
        }
        self.node_hash = self.node_hash.wrapping_add(h);
        self.node_count += 1;
    }

    pub fn add_edge(&mut self, id: &str) {
        self.edge_hash = self.edge_hash.wrapping_add(fold_str(0, id));
        self.edge_count += 1;
    }

    pub fn finish(
        self,
        display_nickname: bool,
        circle_filter_enabled: bool,
        selected_circles: &[String],
    ) -> GraphSignature {
        let circle_selection_hash = (!selected_circles.is_empty()).then(|| {
            let mut sorted: Vec<&str> = selected_circles.iter().map(String::as_str).collect();
            sorted.sort_unstable();
            sorted.dedup();
            sorted.into_iter().fold(0, fold_str)
        });
        GraphSignature {
            display_nickname,
            node_count: self.node_count,
            edge_count: self.edge_count,
            circle_filter_enabled,
            circle_selection_hash,
            node_hash: self.node_hash,
            edge_hash: self.edge_hash,
        }
    }
}
