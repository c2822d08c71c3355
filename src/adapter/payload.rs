//! vis-network style data-set items.
//!
//! Every payload carries its full style, defaults included, so that an
//! in-place update also clears overrides (a node that lost its pin loses the
//! pin border).

use serde::Serialize;

use crate::config::EngineConfig;
use crate::graph::{GraphEdge, NodeColor, VisibleNode};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorPayload<'a> {
    pub border: &'a str,
    pub background: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShadowPayload<'a> {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePayload<'a> {
    pub id: &'a str,
    pub label: &'a str,
    /// Hover text.
    pub title: &'a str,
    pub group: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    pub color: ColorPayload<'a>,
    pub size: f64,
    pub border_width: f64,
    pub shadow: ShadowPayload<'a>,
}

impl<'a> NodePayload<'a> {
    pub fn new(node: &'a VisibleNode, base: &'a NodeColor) -> Self {
        let style = &node.style;
        let color = style.color.as_ref().unwrap_or(base);
        Self {
            id: &node.id,
            label: &node.label,
            title: &node.tooltip,
            group: &node.title,
            x: node.position.map(|p| p.x),
            y: node.position.map(|p| p.y),
            color: ColorPayload {
                border: &color.border,
                background: &color.background,
            },
            size: style.resolved_size(),
            border_width: style.resolved_border_width(),
            shadow: match &style.shadow {
                Some(shadow) => ShadowPayload {
                    enabled: true,
                    color: Some(shadow.color.as_str()),
                    size: Some(shadow.size),
                },
                None => ShadowPayload {
                    enabled: false,
                    color: None,
                    size: None,
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeColorPayload {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgePayload<'a> {
    pub id: &'a str,
    pub from: &'a str,
    pub to: &'a str,
    /// Kind name, kept for the host's own lookups.
    pub kind: String,
    pub color: EdgeColorPayload,
    pub width: f64,
    pub dashes: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrows: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
}

impl<'a> EdgePayload<'a> {
    pub fn new(edge: &'a GraphEdge, config: &EngineConfig) -> Self {
        let style = edge.kind.style(config);
        Self {
            id: &edge.id,
            from: &edge.from,
            to: &edge.to,
            kind: edge.kind.to_string(),
            color: EdgeColorPayload { color: style.color },
            width: style.width,
            dashes: style.dashes,
            arrows: style.arrow.then_some("to"),
            length: style.length,
        }
    }
}

/// Payloads for a batch of nodes.
pub fn node_payloads<'a>(nodes: &'a [VisibleNode], base: &'a NodeColor) -> Vec<NodePayload<'a>> {
    nodes.iter().map(|n| NodePayload::new(n, base)).collect()
}

pub fn edge_payloads<'a>(edges: &'a [GraphEdge], config: &EngineConfig) -> Vec<EdgePayload<'a>> {
    edges.iter().map(|e| EdgePayload::new(e, config)).collect()
}
