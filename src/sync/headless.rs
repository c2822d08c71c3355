//! In-memory render surface.
//!
//! Keeps nodes and edges the way a renderer's data sets would, places nodes
//! without a position at a stable hash-derived spot, and counts every call so
//! tests can assert which sync path touched what.

use std::collections::BTreeMap;

use super::surface::RenderSurface;
use crate::error::SurfaceError;
use crate::graph::{hash_offset, GraphEdge, Point, PositionMap, VisibleNode};

/// Call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceCounters {
    pub set_data: usize,
    pub nodes_added: usize,
    pub nodes_updated: usize,
    pub nodes_removed: usize,
    pub edges_added: usize,
    pub edges_updated: usize,
    pub edges_removed: usize,
    pub position_queries: usize,
    pub fits: usize,
    pub moves: usize,
    pub physics_toggles: usize,
    pub settle_arms: usize,
}

#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    ready: bool,
    pub nodes: BTreeMap<String, VisibleNode>,
    pub edges: BTreeMap<String, GraphEdge>,
    /// Live positions, separate from the node records.
    pub live: PositionMap,
    pub selection: Vec<String>,
    pub physics: bool,
    pub view: Point,
    pub zoom: f64,
    pub counters: SurfaceCounters,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self {
            ready: true,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            live: PositionMap::new(),
            selection: Vec::new(),
            physics: false,
            view: Point::default(),
            zoom: 1.0,
            counters: SurfaceCounters::default(),
        }
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose renderer has not been created yet.
    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::default()
        }
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Move a node as if the simulation had pushed it.
    pub fn place(&mut self, id: &str, position: Point) {
        self.live.insert(id.to_string(), position);
    }

    pub fn reset_counters(&mut self) {
        self.counters = SurfaceCounters::default();
    }

    fn check(&self) -> Result<(), SurfaceError> {
        if self.ready { Ok(()) } else { Err(SurfaceError::NotReady) }
    }

    fn upsert_node(&mut self, node: &VisibleNode) {
        match node.position {
            Some(p) => {
                self.live.insert(node.id.clone(), p);
            }
            None => {
                self.live.entry(node.id.clone()).or_insert_with(|| {
                    Point::new(hash_offset(&node.id, 3) * 400.0, hash_offset(&node.id, 5) * 400.0)
                });
            }
        }
        if self.nodes.insert(node.id.clone(), node.clone()).is_some() {
            self.counters.nodes_updated += 1;
        } else {
            self.counters.nodes_added += 1;
        }
    }
}

impl RenderSurface for HeadlessSurface {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn set_data(&mut self, nodes: &[VisibleNode], edges: &[GraphEdge]) -> Result<(), SurfaceError> {
        self.check()?;
        self.counters.set_data += 1;
        self.nodes.clear();
        self.edges.clear();
        self.live.clear();
        self.selection.clear();
        for node in nodes {
            self.upsert_node(node);
        }
        for edge in edges {
            self.edges.insert(edge.id.clone(), edge.clone());
        }
        Ok(())
    }

    fn update_nodes(&mut self, nodes: &[VisibleNode]) -> Result<(), SurfaceError> {
        self.check()?;
        for node in nodes {
            self.upsert_node(node);
        }
        Ok(())
    }

    fn remove_nodes(&mut self, ids: &[String]) -> Result<(), SurfaceError> {
        self.check()?;
        for id in ids {
            if self.nodes.remove(id).is_some() {
                self.counters.nodes_removed += 1;
            }
            self.live.remove(id);
        }
        self.selection.retain(|s| !ids.contains(s));
        Ok(())
    }

    fn update_edges(&mut self, edges: &[GraphEdge]) -> Result<(), SurfaceError> {
        self.check()?;
        for edge in edges {
            if self.edges.insert(edge.id.clone(), edge.clone()).is_some() {
                self.counters.edges_updated += 1;
            } else {
                self.counters.edges_added += 1;
            }
        }
        Ok(())
    }

    fn remove_edges(&mut self, ids: &[String]) -> Result<(), SurfaceError> {
        self.check()?;
        for id in ids {
            if self.edges.remove(id).is_some() {
                self.counters.edges_removed += 1;
            }
        }
        Ok(())
    }

    fn positions(&self, ids: &[String]) -> Result<PositionMap, SurfaceError> {
        self.check()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.live.get(id).map(|p| (id.clone(), *p)))
            .collect())
    }

    fn view_position(&self) -> Result<Point, SurfaceError> {
        self.check()?;
        Ok(self.view)
    }

    fn scale(&self) -> Result<f64, SurfaceError> {
        self.check()?;
        Ok(self.zoom)
    }

    fn move_to(&mut self, position: Point, scale: f64) -> Result<(), SurfaceError> {
        self.check()?;
        self.counters.moves += 1;
        self.view = position;
        self.zoom = scale;
        Ok(())
    }

    fn fit(&mut self) -> Result<(), SurfaceError> {
        self.check()?;
        self.counters.fits += 1;
        Ok(())
    }

    fn select_nodes(&mut self, ids: &[String]) -> Result<(), SurfaceError> {
        self.check()?;
        self.selection = ids.iter().filter(|id| self.nodes.contains_key(*id)).cloned().collect();
        Ok(())
    }

    fn set_physics(&mut self, enabled: bool) -> Result<(), SurfaceError> {
        self.check()?;
        self.counters.physics_toggles += 1;
        self.physics = enabled;
        Ok(())
    }

    fn arm_settle_freeze(&mut self) -> Result<(), SurfaceError> {
        self.check()?;
        self.counters.settle_arms += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

    fn node(id: &str, position: Option<Point>) -> VisibleNode {
        VisibleNode {
            id: id.to_string(),
            kind: NodeKind::Member,
            label: id.to_string(),
            ..VisibleNode::hub(id, position)
        }
    }

    #[test]
    fn test_update_without_position_keeps_live_position() {
        let mut surface = HeadlessSurface::new();
        surface.set_data(&[node("1", Some(Point::new(3.0, 4.0)))], &[]).unwrap();
        surface.place("1", Point::new(10.0, 10.0));
        surface.update_nodes(&[node("1", None)]).unwrap();
        let positions = surface.positions(&["1".to_string(), "2".to_string()]).unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions["1"], Point::new(10.0, 10.0));
        assert_eq!(surface.counters.nodes_updated, 1);
    }

    #[test]
    fn test_not_ready_rejects_calls() {
        let mut surface = HeadlessSurface::not_ready();
        assert_eq!(surface.fit(), Err(SurfaceError::NotReady));
        assert_eq!(surface.counters.fits, 0);
    }
}
