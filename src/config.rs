//! Engine configuration and per-render filter inputs.
//!
//! Both structs deserialize from camelCase JSON so the JS host can hand
//! them over unchanged. Every field has a default, so partial objects are fine.

use serde::{Deserialize, Serialize};

/// Tunables for layout helpers, synthetic edges and overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Spring length of group-cohesion edges (default: 14.0).
    pub group_edge_length: f64,
    /// Stroke width of group-cohesion edges (default: 1.2).
    pub group_edge_width: f64,
    /// Stroke color of group-cohesion edges.
    pub group_edge_color: String,
    /// Spring length of invisible circle-hub edges (default: 140.0).
    pub hub_edge_length: f64,
    /// Stroke width of circle-hub edges (default: 0.1).
    pub hub_edge_width: f64,
    /// Jitter applied around a neighbor centroid when seeding a new node (default: 6.0).
    pub seed_jitter: f64,
    /// Spread of hash-derived coordinates for nodes with no placed neighbor (default: 50.0).
    pub seed_spread: f64,
    /// Overlay padding for a root circle (default: 28.0).
    pub overlay_padding: f64,
    /// Extra overlay padding per nesting level (default: 10.0).
    pub overlay_padding_per_depth: f64,
    /// Minimum overlay glow blur (default: 6.0).
    pub overlay_blur_min: f64,
    /// Glow blur divided by the zoom scale (default: 14.0).
    pub overlay_blur_scaled: f64,
    pub overlay_blur_per_depth: f64,
    /// Minimum overlay line width (default: 1.1).
    pub overlay_line_min: f64,
    /// Line width divided by the zoom scale (default: 2.4).
    pub overlay_line_scaled: f64,
    pub overlay_line_per_depth: f64,
    /// Label used for placeholder members (default: "unknown").
    pub unknown_label: String,
    /// Title bucket for members without a title (default: "none").
    pub default_title: String,
    /// Console log level on wasm (default: "debug").
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            group_edge_length: 14.0,
            group_edge_width: 1.2,
            group_edge_color: "rgba(106, 201, 255, 0.45)".to_string(),
            hub_edge_length: 140.0,
            hub_edge_width: 0.1,
            seed_jitter: 6.0,
            seed_spread: 50.0,
            overlay_padding: 28.0,
            overlay_padding_per_depth: 10.0,
            overlay_blur_min: 6.0,
            overlay_blur_scaled: 14.0,
            overlay_blur_per_depth: 1.6,
            overlay_line_min: 1.1,
            overlay_line_scaled: 2.4,
            overlay_line_per_depth: 0.35,
            unknown_label: "unknown".to_string(),
            default_title: "none".to_string(),
            log_level: "debug".to_string(),
        }
    }
}

impl EngineConfig {
    /// Overlay padding for a circle at `depth`.
    pub fn overlay_padding_at(&self, depth: usize) -> f64 {
        self.overlay_padding + depth as f64 * self.overlay_padding_per_depth
    }

    /// Overlay glow blur and line width for `depth` at zoom `scale`.
    pub fn overlay_stroke_at(&self, depth: usize, scale: f64) -> (f64, f64) {
        let scale = if scale > 0.0 { scale } else { 1.0 };
        let depth = depth as f64;
        let blur = self.overlay_blur_min.max(self.overlay_blur_scaled / scale)
            + depth * self.overlay_blur_per_depth;
        let width = self.overlay_line_min.max(self.overlay_line_scaled / scale)
            + depth * self.overlay_line_per_depth;
        (blur, width)
    }

    /// Parse the configured log level, falling back to `Debug`.
    pub fn level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Debug)
    }
}

/// Live UI filter state, read once per render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    /// Free-text query matched against name, nickname and id.
    pub query: String,
    /// Exact title filter; empty means all titles.
    pub title: String,
    pub show_ownership: bool,
    pub show_romantic: bool,
    pub hide_isolated: bool,
    /// Neighbor expansion depth. Values below 1 are treated as 1.
    pub depth: u32,
    pub circle_filter_enabled: bool,
    pub selected_circles: Vec<String>,
    /// Label members with their nickname instead of their name.
    pub display_nickname: bool,
    pub show_circle_overlay: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            query: String::new(),
            title: String::new(),
            show_ownership: true,
            show_romantic: true,
            hide_isolated: false,
            depth: 1,
            circle_filter_enabled: false,
            selected_circles: Vec::new(),
            display_nickname: false,
            show_circle_overlay: true,
        }
    }
}

impl FilterState {
    /// Depth actually used for expansion.
    pub fn effective_depth(&self) -> u32 {
        self.depth.max(1)
    }

    /// Lower-cased, trimmed query.
    pub fn normalized_query(&self) -> String {
        self.query.trim().to_lowercase()
    }

    /// Whether circle filtering is on and has at least one circle selected.
    pub fn circle_filter_active(&self) -> bool {
        self.circle_filter_enabled && !self.selected_circles.is_empty()
    }
}

/// One render call from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RenderRequest {
    pub filter: FilterState,
    /// Currently selected member, if any.
    pub selected: Option<String>,
    /// Triggered by a tagging or pin change rather than a data load.
    pub incremental: bool,
    /// Run the physics simulation (and freeze it once settled).
    pub physics: bool,
}

impl Default for RenderRequest {
    fn default() -> Self {
        Self {
            filter: FilterState::default(),
            selected: None,
            incremental: false,
            physics: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_filter_json_uses_defaults() {
        let filter: FilterState =
            serde_json::from_str(r#"{"query":"  Alice ","depth":0}"#).unwrap();
        assert!(filter.show_ownership);
        assert!(filter.show_romantic);
        assert_eq!(filter.effective_depth(), 1);
        assert_eq!(filter.normalized_query(), "alice");
    }

    #[test]
    fn test_circle_filter_needs_selection() {
        let mut filter = FilterState {
            circle_filter_enabled: true,
            ..FilterState::default()
        };
        assert!(!filter.circle_filter_active());
        filter.selected_circles.push("c-1".into());
        assert!(filter.circle_filter_active());
    }

    #[test]
    fn test_render_request_json() {
        let request: RenderRequest =
            serde_json::from_str(r#"{"filter":{"hideIsolated":true},"selected":"12"}"#).unwrap();
        assert!(request.filter.hide_isolated);
        assert_eq!(request.selected.as_deref(), Some("12"));
        assert!(request.physics);
        assert!(!request.incremental);
    }

    #[test]
    fn test_overlay_metrics() {
        let config = EngineConfig::default();
        assert_eq!(config.overlay_padding_at(0), 28.0);
        assert_eq!(config.overlay_padding_at(2), 48.0);
        let (blur, width) = config.overlay_stroke_at(0, 1.0);
        assert_eq!(blur, 14.0);
        assert_eq!(width, 2.4);
        let (blur, width) = config.overlay_stroke_at(1, 4.0);
        assert!((blur - 7.6).abs() < 1e-9);
        assert!((width - 1.45).abs() < 1e-9);
    }

    #[test]
    fn test_config_level_fallback() {
        let mut config = EngineConfig::default();
        assert_eq!(config.level(), log::Level::Debug);
        config.log_level = "warn".into();
        assert_eq!(config.level(), log::Level::Warn);
        config.log_level = "loud".into();
        assert_eq!(config.level(), log::Level::Debug);
    }
}
