//! Edge types.
//!
//! Relation edges come from member profiles. Group-cohesion and circle-hub
//! edges are synthesized per render and only exist to steer the physics.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// What an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    /// Directed owner -> owned member.
    Ownership,
    /// Undirected romantic relation.
    Romantic,
    /// Synthetic edge pulling members of one identity group together.
    Group,
    /// Synthetic invisible edge from a circle hub to a circle member.
    CircleHub,
}

impl EdgeKind {
    /// True for edges derived from profile data.
    #[inline]
    pub fn is_relation(self) -> bool {
        matches!(self, Self::Ownership | Self::Romantic)
    }

    /// Whether the edge should be drawn with an arrow.
    #[inline]
    pub fn is_directed(self) -> bool {
        matches!(self, Self::Ownership)
    }

    /// Rendering style of this kind of edge.
    pub fn style(self, config: &EngineConfig) -> EdgeStyle {
        match self {
            Self::Ownership => EdgeStyle {
                color: "#6ac9ff".to_string(),
                width: 1.0,
                dashes: false,
                arrow: true,
                length: None,
            },
            Self::Romantic => EdgeStyle {
                color: "#ffb86b".to_string(),
                width: 1.0,
                dashes: true,
                arrow: false,
                length: None,
            },
            Self::Group => EdgeStyle {
                color: config.group_edge_color.clone(),
                width: config.group_edge_width,
                dashes: false,
                arrow: false,
                length: Some(config.group_edge_length),
            },
            Self::CircleHub => EdgeStyle {
                color: "rgba(0,0,0,0)".to_string(),
                width: config.hub_edge_width,
                dashes: true,
                arrow: false,
                length: Some(config.hub_edge_length),
            },
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ownership => "ownership",
            Self::Romantic => "romantic",
            Self::Group => "group",
            Self::CircleHub => "circle",
        };
        f.write_str(name)
    }
}

/// Visual attributes of an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeStyle {
    pub color: String,
    pub width: f64,
    pub dashes: bool,
    pub arrow: bool,
    /// Preferred spring length, when the kind overrides the simulation default.
    pub length: Option<f64>,
}

/// An edge between two member ids (or a hub id and a member id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Stable edge id, unique within one visible graph.
    pub id: String,
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl GraphEdge {
    /// Ownership edge `owner -> member`.
    pub fn ownership(owner: &str, member: &str) -> Self {
        Self {
            id: format!("o-{owner}-{member}"),
            from: owner.to_string(),
            to: member.to_string(),
            kind: EdgeKind::Ownership,
        }
    }

    /// Romantic edge as recorded on `member`'s profile.
    pub fn romantic(member: &str, lover: &str) -> Self {
        Self {
            id: format!("l-{member}-{lover}"),
            from: member.to_string(),
            to: lover.to_string(),
            kind: EdgeKind::Romantic,
        }
    }

    /// Group-cohesion edge from the group's anchor to another visible member.
    pub fn group(group: &str, anchor: &str, member: &str) -> Self {
        Self {
            id: format!("g-{group}-{anchor}-{member}"),
            from: anchor.to_string(),
            to: member.to_string(),
            kind: EdgeKind::Group,
        }
    }

    /// Invisible hub edge for a circle.
    pub fn circle_hub(circle: &str, hub: &str, member: &str) -> Self {
        Self {
            id: format!("c-{circle}-{hub}-{member}"),
            from: hub.to_string(),
            to: member.to_string(),
            kind: EdgeKind::CircleHub,
        }
    }

    /// Check whether `id` is one of the endpoints.
    #[inline]
    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }
}

impl fmt::Display for GraphEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({}: {} -> {})", self.kind, self.from, self.to)
    }
}

/// Per-kind relation edge counts of a loaded data set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStats {
    pub ownership: usize,
    pub romantic: usize,
}

impl EdgeStats {
    /// Count edges by kind.
    pub fn count<'a>(edges: impl IntoIterator<Item = &'a GraphEdge>) -> Self {
        let mut stats = Self::default();
        for edge in edges {
            match edge.kind {
                EdgeKind::Ownership => stats.ownership += 1,
                EdgeKind::Romantic => stats.romantic += 1,
                EdgeKind::Group | EdgeKind::CircleHub => {}
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_ids() {
        assert_eq!(GraphEdge::ownership("1", "2").id, "o-1-2");
        assert_eq!(GraphEdge::romantic("2", "3").id, "l-2-3");
        assert_eq!(GraphEdge::group("g-1", "1", "4").id, "g-g-1-1-4");
        assert_eq!(GraphEdge::circle_hub("c-1", "c-hub-c-1", "5").id, "c-c-1-c-hub-c-1-5");
        assert_eq!(format!("{}", GraphEdge::ownership("1", "2")), "Edge(ownership: 1 -> 2)");
    }

    #[test]
    fn test_edge_kinds() {
        assert!(EdgeKind::Ownership.is_relation());
        assert!(EdgeKind::Romantic.is_relation());
        assert!(!EdgeKind::Group.is_relation());
        assert!(EdgeKind::Ownership.is_directed());
        assert!(!EdgeKind::Romantic.is_directed());

        let config = EngineConfig::default();
        assert_eq!(EdgeKind::Group.style(&config).length, Some(14.0));
        assert_eq!(EdgeKind::CircleHub.style(&config).length, Some(140.0));
        assert!(EdgeKind::Romantic.style(&config).dashes);
    }

    #[test]
    fn test_edge_stats() {
        let edges = [
            GraphEdge::ownership("1", "2"),
            GraphEdge::romantic("2", "3"),
            GraphEdge::romantic("3", "2"),
            GraphEdge::group("g", "1", "2"),
        ];
        let stats = EdgeStats::count(&edges);
        assert_eq!(stats, EdgeStats { ownership: 1, romantic: 2 });
    }
}
