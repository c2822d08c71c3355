//! Bio Graph - WASM Module
//!
//! Graph computation and render synchronization for the Bio Graph
//! relationship viewer. Compiled to WebAssembly and exposed to JavaScript
//! through wasm-bindgen.
//!
//! # Architecture
//!
//! - `model`: loaded members, the user-editable identity model (groups,
//!   circles, pins) and its import/export document
//! - `graph`: indexes, neighbor expansion, the filter and expansion engine,
//!   node styles and change signatures
//! - `sync`: the render-surface interface and the controller that picks the
//!   cheapest correct update for it
//! - `overlay`: circle overlay geometry (capsules and padded hulls)
//! - `adapter`: the JS render surface and the canvas overlay painter

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

pub mod adapter;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod overlay;
pub mod sync;

use adapter::{paint_overlays, JsRenderSurface};
use config::{EngineConfig, RenderRequest};
use model::{to_json, ProfileRecord};
use sync::{GraphController, SurfaceEvent};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) keeps the first logger.
    let _ = console_log::init_with_level(log::Level::Debug);
}

fn from_js<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|e| JsError::new(&e.to_string()))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsError::new(&e.to_string()))
}

/// One row of the filtered member list.
#[derive(Serialize)]
struct ListItem<'a> {
    id: &'a str,
    label: &'a str,
    title: &'a str,
}

/// Main entry point for the graph engine.
///
/// Owns the controller and the JS render surface, and forwards calls from
/// JavaScript.
#[wasm_bindgen]
pub struct BioGraphWasm {
    controller: GraphController,
    surface: JsRenderSurface,
}

#[wasm_bindgen]
impl BioGraphWasm {
    /// Create an engine. `config` is a partial `EngineConfig` object or
    /// `undefined`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<BioGraphWasm, JsError> {
        let config: EngineConfig = from_js(config)?;
        log::set_max_level(config.level().to_level_filter());
        Ok(Self {
            surface: JsRenderSurface::new(JsValue::NULL, config.clone()),
            controller: GraphController::new(config),
        })
    }

    /// Attach the host object that wraps the renderer.
    #[wasm_bindgen(js_name = attachSurface)]
    pub fn attach_surface(&mut self, host: JsValue) {
        self.surface = JsRenderSurface::new(host, self.controller.config().clone());
    }

    #[wasm_bindgen(js_name = setConfig)]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsError> {
        let config: EngineConfig = from_js(config)?;
        log::set_max_level(config.level().to_level_filter());
        self.surface.set_config(config.clone());
        self.controller.set_config(config);
        Ok(())
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Replace the loaded profiles. Returns member and edge counts.
    #[wasm_bindgen(js_name = loadProfiles)]
    pub fn load_profiles(&mut self, records: JsValue) -> Result<JsValue, JsError> {
        let records: Vec<ProfileRecord> = from_js(records)?;
        to_js(&self.controller.load_profiles(records))
    }

    /// Merge profiles, keeping the newer record per member.
    #[wasm_bindgen(js_name = mergeProfiles)]
    pub fn merge_profiles(&mut self, records: JsValue) -> Result<JsValue, JsError> {
        let records: Vec<ProfileRecord> = from_js(records)?;
        to_js(&self.controller.merge_profiles(records))
    }

    pub fn stats(&self) -> Result<JsValue, JsError> {
        to_js(&self.controller.stats())
    }

    /// Distinct member titles for the title filter.
    pub fn titles(&self) -> Vec<String> {
        self.controller.titles()
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Compute the visible graph for `request` and sync it to the surface.
    /// Returns the sync outcome.
    pub fn render(&mut self, request: JsValue) -> Result<JsValue, JsError> {
        let request: RenderRequest = from_js(request)?;
        let outcome = self.controller.render(&mut self.surface, &request)?;
        to_js(&outcome)
    }

    /// Render again with the last filter and selection.
    pub fn rerender(&mut self, incremental: bool) -> Result<JsValue, JsError> {
        let outcome = self.controller.rerender(&mut self.surface, incremental)?;
        to_js(&outcome)
    }

    /// Signature of the graph currently on the surface.
    pub fn signature(&self) -> Option<String> {
        self.controller.state().signature.as_ref().map(ToString::to_string)
    }

    /// Visible members sorted by label, hubs excluded.
    #[wasm_bindgen(js_name = filteredList)]
    pub fn filtered_list(&self) -> Result<JsValue, JsError> {
        let items: Vec<ListItem<'_>> = self
            .controller
            .filtered_list()
            .into_iter()
            .map(|n| ListItem {
                id: &n.id,
                label: &n.label,
                title: &n.title,
            })
            .collect();
        to_js(&items)
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) -> Result<JsValue, JsError> {
        let outcome = self.controller.clear_selection(&mut self.surface)?;
        to_js(&outcome)
    }

    // =========================================================================
    // Surface events
    // =========================================================================

    #[wasm_bindgen(js_name = onSelect)]
    pub fn on_select(&mut self, id: String) -> Result<JsValue, JsError> {
        self.event(SurfaceEvent::Select(id))
    }

    #[wasm_bindgen(js_name = onDeselect)]
    pub fn on_deselect(&mut self, remaining: Vec<String>) -> Result<JsValue, JsError> {
        self.event(SurfaceEvent::Deselect { remaining })
    }

    #[wasm_bindgen(js_name = onDoubleClick)]
    pub fn on_double_click(&mut self, id: String) -> Result<JsValue, JsError> {
        self.event(SurfaceEvent::DoubleClick(id))
    }

    #[wasm_bindgen(js_name = onPhysicsSettled)]
    pub fn on_physics_settled(&mut self) -> Result<JsValue, JsError> {
        self.event(SurfaceEvent::PhysicsSettled)
    }

    /// Paint circle overlays for this frame. Call from the renderer's
    /// pre-paint hook.
    #[wasm_bindgen(js_name = onBeforePaint)]
    pub fn on_before_paint(&self, ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
        let draws = self
            .controller
            .overlay_frame(&self.surface)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        paint_overlays(ctx, &draws)
    }

    // =========================================================================
    // Groups
    // =========================================================================

    #[wasm_bindgen(js_name = createGroup)]
    pub fn create_group(&mut self, name: &str) -> Result<String, JsError> {
        Ok(self.controller.model_mut().create_group(name)?)
    }

    #[wasm_bindgen(js_name = renameGroup)]
    pub fn rename_group(&mut self, id: &str, name: &str) -> Result<(), JsError> {
        Ok(self.controller.model_mut().rename_group(id, name)?)
    }

    #[wasm_bindgen(js_name = deleteGroup)]
    pub fn delete_group(&mut self, id: &str) -> Result<(), JsError> {
        Ok(self.controller.model_mut().delete_group(id)?)
    }

    /// Put `member` into `group`, or take it out of any group.
    #[wasm_bindgen(js_name = assignGroup)]
    pub fn assign_group(&mut self, member: &str, group: Option<String>) -> Result<(), JsError> {
        Ok(self.controller.model_mut().assign_group(member, group.as_deref())?)
    }

    // =========================================================================
    // Circles
    // =========================================================================

    #[wasm_bindgen(js_name = createCircle)]
    pub fn create_circle(&mut self, name: &str) -> Result<String, JsError> {
        Ok(self.controller.model_mut().create_circle(name)?)
    }

    #[wasm_bindgen(js_name = renameCircle)]
    pub fn rename_circle(&mut self, id: &str, name: &str) -> Result<(), JsError> {
        Ok(self.controller.model_mut().rename_circle(id, name)?)
    }

    #[wasm_bindgen(js_name = deleteCircle)]
    pub fn delete_circle(&mut self, id: &str) -> Result<(), JsError> {
        Ok(self.controller.model_mut().delete_circle(id)?)
    }

    #[wasm_bindgen(js_name = setMemberCircle)]
    pub fn set_member_circle(&mut self, member: &str, circle: &str, tagged: bool) -> Result<(), JsError> {
        Ok(self.controller.model_mut().set_member_circle(member, circle, tagged)?)
    }

    /// Move `circle` under `parent` (or to the top level). Fails without
    /// changes if `parent` is the circle itself or one of its descendants.
    #[wasm_bindgen(js_name = reparentCircle)]
    pub fn reparent_circle(&mut self, circle: &str, parent: Option<String>) -> Result<(), JsError> {
        Ok(self.controller.model_mut().reparent_circle(circle, parent.as_deref())?)
    }

    /// Circle list for the circle filter, with member counts.
    #[wasm_bindgen(js_name = circleFilterEntries)]
    pub fn circle_filter_entries(&mut self) -> Result<JsValue, JsError> {
        to_js(&self.controller.circle_filter_entries())
    }

    /// Ancestors of `circle`, nearest first.
    #[wasm_bindgen(js_name = circleAncestors)]
    pub fn circle_ancestors(&mut self, circle: &str) -> Vec<String> {
        self.controller.circle_ancestors(circle)
    }

    /// Circles `member` belongs to through a descendant circle.
    #[wasm_bindgen(js_name = impliedCircles)]
    pub fn implied_circles(&self, member: &str) -> Vec<String> {
        self.controller.model().implied_circles(member).into_iter().collect()
    }

    // =========================================================================
    // Pins
    // =========================================================================

    /// Flip a member's pin without rendering. Returns the new state.
    #[wasm_bindgen(js_name = togglePin)]
    pub fn toggle_pin(&mut self, member: &str) -> bool {
        self.controller.model_mut().toggle_pin(member)
    }

    #[wasm_bindgen(js_name = isPinned)]
    pub fn is_pinned(&self, member: &str) -> bool {
        self.controller.model().is_pinned(member)
    }

    // =========================================================================
    // Import / export
    // =========================================================================

    /// Merge an identity document into the current model.
    #[wasm_bindgen(js_name = importDocument)]
    pub fn import_document(&mut self, text: &str) -> Result<(), JsError> {
        Ok(self.controller.import_document(text)?)
    }

    /// Export the identity model as pretty-printed JSON.
    #[wasm_bindgen(js_name = exportDocument)]
    pub fn export_document(&self, export_date: Option<String>) -> Result<String, JsError> {
        Ok(to_json(self.controller.model(), export_date)?)
    }
}

impl BioGraphWasm {
    fn event(&mut self, event: SurfaceEvent) -> Result<JsValue, JsError> {
        match self.controller.handle_event(&mut self.surface, event)? {
            Some(outcome) => to_js(&outcome),
            None => Ok(JsValue::UNDEFINED),
        }
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::config::FilterState;
    use crate::error::{SurfaceError, SyncError};
    use crate::graph::{GraphEdge, Point};
    use crate::model::{Member, MemberTable, RelationRef};
    use crate::overlay::OverlayShape;
    use crate::sync::{HeadlessSurface, SyncPath};

    fn record(id: u32, name: &str) -> ProfileRecord {
        ProfileRecord {
            member_number: id.into(),
            name: Some(name.to_string()),
            ..ProfileRecord::default()
        }
    }

    /// 1 owns 2, 2 loves 3, plus an unrelated 4.
    fn loaded() -> GraphController {
        let mut two = record(2, "Bea");
        two.nickname = Some("Bee".to_string());
        two.ownership = Some(RelationRef::new(1));
        two.lovership = Some(vec![RelationRef::new(3)]);
        let mut controller = GraphController::new(EngineConfig::default());
        controller.load_profiles(vec![record(1, "Ann"), two, record(3, "Cid"), record(4, "Dot")]);
        controller
    }

    fn request(filter: FilterState) -> RenderRequest {
        RenderRequest {
            filter,
            physics: false,
            ..RenderRequest::default()
        }
    }

    #[test]
    fn test_full_rebuild_then_unchanged() {
        let mut controller = loaded();
        let mut surface = HeadlessSurface::new();

        let first = controller.render(&mut surface, &request(FilterState::default())).unwrap();
        assert_eq!(first.path, SyncPath::FullRebuild);
        assert_eq!(first.members, 4);
        assert_eq!(surface.nodes.len(), 4);
        assert!(surface.edges.contains_key("o-1-2"));
        assert!(surface.edges.contains_key("l-2-3"));

        let second = controller.render(&mut surface, &request(FilterState::default())).unwrap();
        assert_eq!(second.path, SyncPath::Unchanged);
        assert_eq!(second.signature, first.signature);
        assert_eq!(surface.counters.set_data, 1);
    }

    #[test]
    fn test_display_nickname_restyles_in_place() {
        let mut controller = loaded();
        let mut surface = HeadlessSurface::new();
        controller.render(&mut surface, &request(FilterState::default())).unwrap();
        let positions_before = surface.live.clone();
        let edges_before = surface.edges.clone();
        surface.reset_counters();

        let nicknames = FilterState {
            display_nickname: true,
            ..FilterState::default()
        };
        let outcome = controller.render(&mut surface, &request(nicknames)).unwrap();

        assert_eq!(outcome.path, SyncPath::SelectionOnly);
        let counters = surface.counters;
        assert_eq!(counters.set_data, 0);
        assert_eq!(counters.nodes_added, 0);
        assert_eq!(counters.nodes_removed, 0);
        assert_eq!(counters.edges_added, 0);
        assert_eq!(counters.edges_removed, 0);
        assert_eq!(counters.nodes_updated, 4);
        assert_eq!(surface.live, positions_before);
        assert_eq!(surface.edges, edges_before);
        assert_eq!(surface.nodes["2"].label, "Bee (#2)");
        assert_eq!(surface.nodes["1"].label, "Ann (#1)");
    }

    #[test]
    fn test_pin_takes_incremental_path_and_keeps_positions() {
        let mut controller = loaded();
        let mut surface = HeadlessSurface::new();
        let filter = FilterState {
            query: "ann".to_string(),
            ..FilterState::default()
        };
        controller.render(&mut surface, &request(filter.clone())).unwrap();
        assert_eq!(surface.nodes.keys().collect::<Vec<_>>(), ["1", "2"]);
        surface.place("1", Point::new(120.0, -40.0));
        surface.place("2", Point::new(150.0, -10.0));
        surface.reset_counters();

        // Pinning 4 pulls it in next to the existing layout.
        controller.model_mut().toggle_pin("4");
        let outcome = controller
            .render(
                &mut surface,
                &RenderRequest {
                    incremental: true,
                    ..request(filter)
                },
            )
            .unwrap();

        assert_eq!(outcome.path, SyncPath::Incremental);
        assert_eq!(outcome.added_nodes, 1);
        assert_eq!(surface.counters.set_data, 0);
        assert_eq!(surface.counters.nodes_added, 1);
        assert_eq!(surface.counters.nodes_removed, 0);
        assert_eq!(surface.live["1"], Point::new(120.0, -40.0));
        assert_eq!(surface.live["2"], Point::new(150.0, -10.0));
        assert!(surface.nodes.contains_key("4"));
    }

    #[test]
    fn test_not_ready_leaves_state_untouched() {
        let mut controller = loaded();
        let mut surface = HeadlessSurface::not_ready();
        let err = controller
            .render(&mut surface, &request(FilterState::default()))
            .unwrap_err();
        assert_eq!(err, SyncError::Surface(SurfaceError::NotReady));
        assert!(controller.state().signature.is_none());
        assert!(!controller.state().rendered);

        surface.set_ready(true);
        let outcome = controller.render(&mut surface, &request(FilterState::default())).unwrap();
        assert_eq!(outcome.path, SyncPath::FullRebuild);
    }

    #[test]
    fn test_empty_result_clears_the_surface() {
        let mut controller = loaded();
        let mut surface = HeadlessSurface::new();
        controller.render(&mut surface, &request(FilterState::default())).unwrap();

        let nothing = FilterState {
            query: "zzz".to_string(),
            ..FilterState::default()
        };
        let outcome = controller.render(&mut surface, &request(nothing)).unwrap();
        assert_eq!(outcome.path, SyncPath::FullRebuild);
        assert_eq!(outcome.members, 0);
        assert!(surface.nodes.is_empty());
        assert!(surface.edges.is_empty());
        assert!(controller.filtered_list().is_empty());
    }

    #[test]
    fn test_empty_table_renders_no_data() {
        let mut controller = GraphController::new(EngineConfig::default());
        let mut surface = HeadlessSurface::new();
        let outcome = controller.render(&mut surface, &request(FilterState::default())).unwrap();
        assert_eq!(outcome.members, 0);
        assert_eq!(surface.counters.fits, 0);
    }

    #[test]
    fn test_overlay_frame_uses_one_position_lookup() {
        let mut controller = GraphController::new(EngineConfig::default());
        controller.load_table(MemberTable::from_parts(
            ["5", "6", "7", "8"].iter().map(|id| Member::new(*id, "m")).collect(),
            vec![GraphEdge::romantic("7", "8")],
        ));
        let model = controller.model_mut();
        let outer = model.create_circle("Outer").unwrap();
        let inner = model.create_circle("Inner").unwrap();
        model.reparent_circle(&inner, Some(&outer)).unwrap();
        model.set_member_circle("5", &inner, true).unwrap();
        model.set_member_circle("6", &inner, true).unwrap();
        model.set_member_circle("7", &outer, true).unwrap();

        let mut surface = HeadlessSurface::new();
        controller.render(&mut surface, &request(FilterState::default())).unwrap();
        assert_eq!(controller.circle_ancestors(&inner), [outer.clone()]);

        surface.place("5", Point::new(0.0, 0.0));
        surface.place("6", Point::new(30.0, 0.0));
        surface.place("7", Point::new(15.0, 25.0));

        let draws = controller.overlay_frame(&surface).unwrap();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].circle, outer);
        assert!(matches!(draws[0].shape, OverlayShape::Hull(_)));
        let OverlayShape::Capsule(capsule) = &draws[1].shape else {
            panic!("inner circle has two members");
        };
        assert_eq!(capsule.cap_centers(), (Point::new(0.0, 0.0), Point::new(30.0, 0.0)));

        // Overlay switched off: nothing to draw.
        let hidden = FilterState {
            show_circle_overlay: false,
            ..FilterState::default()
        };
        controller.render(&mut surface, &request(hidden)).unwrap();
        assert!(controller.overlay_frame(&surface).unwrap().is_empty());
    }

    #[test]
    fn test_rejected_reparent_keeps_render_stable() {
        let mut controller = loaded();
        let mut surface = HeadlessSurface::new();
        let model = controller.model_mut();
        let a = model.create_circle("A").unwrap();
        let b = model.create_circle("B").unwrap();
        model.reparent_circle(&b, Some(&a)).unwrap();
        model.set_member_circle("1", &a, true).unwrap();
        controller.render(&mut surface, &request(FilterState::default())).unwrap();

        let revision = controller.model().revision();
        assert!(controller.model_mut().reparent_circle(&a, Some(&b)).is_err());
        assert_eq!(controller.model().revision(), revision);

        let outcome = controller.render(&mut surface, &request(FilterState::default())).unwrap();
        assert_eq!(outcome.path, SyncPath::Unchanged);
    }

    #[test]
    fn test_circle_reparent_refreshes_overlay() {
        let mut controller = GraphController::new(EngineConfig::default());
        controller.load_table(MemberTable::from_parts(
            ["5", "6", "7"].iter().map(|id| Member::new(*id, "m")).collect(),
            Vec::new(),
        ));
        let model = controller.model_mut();
        let outer = model.create_circle("Outer").unwrap();
        let inner = model.create_circle("Inner").unwrap();
        model.reparent_circle(&inner, Some(&outer)).unwrap();
        model.set_member_circle("5", &inner, true).unwrap();
        model.set_member_circle("6", &inner, true).unwrap();
        model.set_member_circle("7", &outer, true).unwrap();

        let mut surface = HeadlessSurface::new();
        controller.render(&mut surface, &request(FilterState::default())).unwrap();
        surface.place("5", Point::new(0.0, 0.0));
        surface.place("6", Point::new(30.0, 0.0));
        surface.place("7", Point::new(15.0, 25.0));
        assert_eq!(controller.overlay_frame(&surface).unwrap().len(), 2);

        // Nesting changes leave nodes and edges alone.
        controller.model_mut().reparent_circle(&inner, None).unwrap();
        let outcome = controller
            .render(
                &mut surface,
                &RenderRequest {
                    incremental: true,
                    ..request(FilterState::default())
                },
            )
            .unwrap();
        assert_ne!(outcome.path, SyncPath::Unchanged);
        assert_eq!(surface.counters.set_data, 1);

        let draws = controller.overlay_frame(&surface).unwrap();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].circle, inner);
        assert_eq!(draws[0].depth, 0);
        assert!(draws.iter().all(|d| d.circle != outer));
    }

    #[test]
    fn test_reloaded_profiles_rebuild_with_new_labels() {
        let mut controller = GraphController::new(EngineConfig::default());
        controller.load_profiles(vec![record(1, "Old")]);
        let mut surface = HeadlessSurface::new();
        controller.render(&mut surface, &request(FilterState::default())).unwrap();
        assert_eq!(surface.nodes["1"].label, "Old (#1)");

        controller.load_profiles(vec![record(1, "New")]);
        let outcome = controller.render(&mut surface, &request(FilterState::default())).unwrap();
        assert_eq!(outcome.path, SyncPath::FullRebuild);
        assert_eq!(surface.nodes["1"].label, "New (#1)");

        controller.load_table(MemberTable::from_parts(vec![Member::new("1", "Table")], Vec::new()));
        let outcome = controller.render(&mut surface, &request(FilterState::default())).unwrap();
        assert_eq!(outcome.path, SyncPath::FullRebuild);
        assert_eq!(surface.nodes["1"].label, "Table (#1)");
        assert_eq!(surface.counters.set_data, 3);
    }

    #[test]
    fn test_render_after_empty_result_fits_again() {
        let mut controller = loaded();
        let mut surface = HeadlessSurface::new();
        controller.render(&mut surface, &request(FilterState::default())).unwrap();
        assert_eq!(surface.counters.fits, 1);

        let nothing = FilterState {
            query: "zzz".to_string(),
            ..FilterState::default()
        };
        controller.render(&mut surface, &request(nothing)).unwrap();
        assert_eq!(controller.state().last_visible_count, 0);
        assert_eq!(surface.counters.moves, 1);

        controller.render(&mut surface, &request(FilterState::default())).unwrap();
        assert_eq!(surface.counters.fits, 2);
        assert_eq!(surface.counters.moves, 1);
    }
}
