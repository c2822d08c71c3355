//! Node styling.
//!
//! A node's style is assembled by running an ordered list of pure rules over
//! a `NodeStyle`. Order matters: later rules see and may extend what earlier
//! rules set (pinned keeps the group fill but replaces the border color).

use super::hash::hue;

const DEFAULT_BORDER: &str = "#2b3240";
const DEFAULT_BACKGROUND: &str = "#1f2430";
const DEFAULT_SIZE: f64 = 8.0;
const DEFAULT_BORDER_WIDTH: f64 = 1.0;

/// Border and fill colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeColor {
    pub border: String,
    pub background: String,
}

impl NodeColor {
    pub fn new(border: impl Into<String>, background: impl Into<String>) -> Self {
        Self {
            border: border.into(),
            background: background.into(),
        }
    }

    /// Renderer default colors.
    pub fn base() -> Self {
        Self::new(DEFAULT_BORDER, DEFAULT_BACKGROUND)
    }
}

/// A glow around the node.
#[derive(Debug, Clone, PartialEq)]
pub struct Shadow {
    pub color: String,
    pub size: f64,
}

impl Shadow {
    pub fn new(color: impl Into<String>, size: f64) -> Self {
        Self {
            color: color.into(),
            size,
        }
    }
}

/// Style overrides. `None` means "renderer default".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeStyle {
    pub color: Option<NodeColor>,
    pub size: Option<f64>,
    pub border_width: Option<f64>,
    pub shadow: Option<Shadow>,
    /// Fully transparent, layout-only node.
    pub invisible: bool,
}

impl NodeStyle {
    /// Style of an invisible hub node.
    pub fn hidden() -> Self {
        Self {
            color: Some(NodeColor::new("rgba(0,0,0,0)", "rgba(0,0,0,0)")),
            size: Some(1.0),
            border_width: None,
            shadow: None,
            invisible: true,
        }
    }

    /// Size with the renderer default filled in.
    pub fn resolved_size(&self) -> f64 {
        self.size.unwrap_or(DEFAULT_SIZE)
    }

    pub fn resolved_border_width(&self) -> f64 {
        self.border_width.unwrap_or(DEFAULT_BORDER_WIDTH)
    }
}

/// Colors of an identity group.
pub fn group_color(group: &str) -> NodeColor {
    let h = hue(group, 97, 17.0);
    NodeColor::new(
        format!("hsl({h:.0}, 70%, 55%)"),
        format!("hsl({h:.0}, 45%, 20%)"),
    )
}

/// Per-node facts the style rules look at.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleInput<'a> {
    pub group: Option<&'a str>,
    /// Member shares a multi-member group with the selected node (and is not it).
    pub selected_group_mate: bool,
    /// Member belongs to a circle selected by the circle filter.
    pub circle_glow: bool,
    pub pinned: bool,
}

/// A single styling step.
pub type StyleRule = fn(&StyleInput<'_>, &mut NodeStyle);

/// Rules in priority order.
pub const STYLE_RULES: [StyleRule; 4] = [
    group_rule,
    group_highlight_rule,
    circle_glow_rule,
    pinned_rule,
];

fn group_rule(input: &StyleInput<'_>, style: &mut NodeStyle) {
    if let Some(group) = input.group {
        style.color = Some(group_color(group));
        style.size = Some(10.0);
        style.border_width = Some(2.0);
    }
}

fn group_highlight_rule(input: &StyleInput<'_>, style: &mut NodeStyle) {
    if !input.selected_group_mate {
        return;
    }
    style.size = Some(style.size.unwrap_or(DEFAULT_SIZE) + 1.0);
    style.border_width = Some(style.border_width.unwrap_or(DEFAULT_BORDER_WIDTH) + 1.0);
    style.shadow = Some(Shadow::new("rgba(43, 106, 122, 0.65)", 18.0));
    style.color = Some(NodeColor::new("#2b6a7a", "#15242b"));
}

fn circle_glow_rule(input: &StyleInput<'_>, style: &mut NodeStyle) {
    if input.circle_glow {
        style.shadow = Some(Shadow::new("rgba(89, 165, 255, 0.55)", 16.0));
    }
}

fn pinned_rule(input: &StyleInput<'_>, style: &mut NodeStyle) {
    if !input.pinned {
        return;
    }
    let base = style.color.take().unwrap_or_else(NodeColor::base);
    style.border_width = Some(style.border_width.unwrap_or(DEFAULT_BORDER_WIDTH) + 2.0);
    style.color = Some(NodeColor::new("#6ac9ff", base.background));
    style.shadow = Some(Shadow::new("rgba(106, 201, 255, 0.45)", 14.0));
}

/// Run every rule in order.
pub fn style_for(input: &StyleInput<'_>) -> NodeStyle {
    let mut style = NodeStyle::default();
    for rule in STYLE_RULES {
        rule(input, &mut style);
    }
    style
}
