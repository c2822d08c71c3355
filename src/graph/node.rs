//! Visible node types.
//!
//! A visible node is either a member (shown to the user) or a circle hub
//! (an invisible layout helper that must never appear in lists or stats).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::style::NodeStyle;

/// A point in graph space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Arithmetic mean of a set of points, or `None` when empty.
    pub fn centroid<I: IntoIterator<Item = Point>>(points: I) -> Option<Point> {
        let (mut sx, mut sy, mut n) = (0.0, 0.0, 0usize);
        for p in points {
            sx += p.x;
            sy += p.y;
            n += 1;
        }
        (n > 0).then(|| Point::new(sx / n as f64, sy / n as f64))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Node id -> current position, as reported by the renderer.
pub type PositionMap = HashMap<String, Point>;

/// Role of a node in the visible graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Member,
    /// Invisible per-circle attractor.
    CircleHub,
}

/// Id of the hub node of a circle.
pub fn hub_id(circle: &str) -> String {
    format!("c-hub-{circle}")
}

/// A node ready to be handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    /// Title bucket, used by the renderer for default grouping.
    pub title: String,
    /// Hover text.
    pub tooltip: String,
    /// Initial position. `None` leaves placement to the renderer or, on
    /// updates, keeps the renderer's live position.
    pub position: Option<Point>,
    pub style: NodeStyle,
}

impl VisibleNode {
    /// Invisible hub node for `circle`.
    pub fn hub(circle: &str, position: Option<Point>) -> Self {
        Self {
            id: hub_id(circle),
            kind: NodeKind::CircleHub,
            label: String::new(),
            title: String::new(),
            tooltip: String::new(),
            position,
            style: NodeStyle::hidden(),
        }
    }

    #[inline]
    pub fn is_hub(&self) -> bool {
        self.kind == NodeKind::CircleHub
    }

    /// Copy of this node without a position, for in-place updates of nodes
    /// the renderer already placed.
    pub fn without_position(&self) -> Self {
        Self {
            position: None,
            ..self.clone()
        }
    }
}
