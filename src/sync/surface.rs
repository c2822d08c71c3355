//! The narrow interface the controller drives.
//!
//! A render surface holds the renderer's own node and edge collections, its
//! physics simulation and its viewport. The controller only ever talks to it
//! through this trait, so the wasm adapter and the headless test surface are
//! interchangeable.

use crate::error::SurfaceError;
use crate::graph::{GraphEdge, Point, PositionMap, VisibleNode};

pub trait RenderSurface {
    /// Whether the underlying renderer has been created.
    fn is_ready(&self) -> bool;

    /// Replace every node and edge.
    fn set_data(&mut self, nodes: &[VisibleNode], edges: &[GraphEdge]) -> Result<(), SurfaceError>;

    /// Insert or patch nodes. A node without a position keeps its live one.
    fn update_nodes(&mut self, nodes: &[VisibleNode]) -> Result<(), SurfaceError>;

    fn remove_nodes(&mut self, ids: &[String]) -> Result<(), SurfaceError>;

    /// Insert or patch edges.
    fn update_edges(&mut self, edges: &[GraphEdge]) -> Result<(), SurfaceError>;

    fn remove_edges(&mut self, ids: &[String]) -> Result<(), SurfaceError>;

    /// Live positions of `ids`. Ids the renderer has not placed are absent.
    fn positions(&self, ids: &[String]) -> Result<PositionMap, SurfaceError>;

    fn view_position(&self) -> Result<Point, SurfaceError>;

    fn scale(&self) -> Result<f64, SurfaceError>;

    fn move_to(&mut self, position: Point, scale: f64) -> Result<(), SurfaceError>;

    fn fit(&mut self) -> Result<(), SurfaceError>;

    fn select_nodes(&mut self, ids: &[String]) -> Result<(), SurfaceError>;

    fn set_physics(&mut self, enabled: bool) -> Result<(), SurfaceError>;

    /// Freeze physics once the simulation next settles, then stop listening.
    fn arm_settle_freeze(&mut self) -> Result<(), SurfaceError>;
}

/// Interaction reported by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Select(String),
    /// `remaining` is the selection left after the click.
    Deselect { remaining: Vec<String> },
    DoubleClick(String),
    PhysicsSettled,
}
