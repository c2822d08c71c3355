//! GraphController - the single owner of engine, identity model and render
//! state.
//!
//! Every render goes through `render`: compute the visible graph, pick a sync
//! path from the previous render, push it to the surface, then commit the new
//! state. State is only committed once the surface accepted the update.

use std::collections::HashSet;

use log::{debug, info, warn};
use serde::Serialize;

use super::strategy::{choose_path, PreviousRender, RenderDiff, SyncPath};
use super::surface::{RenderSurface, SurfaceEvent};
use crate::config::{EngineConfig, FilterState, RenderRequest};
use crate::error::{ImportError, SurfaceError, SyncError};
use crate::graph::{CircleFilterEntry, GraphEngine, GraphSignature, GraphStats, VisibleGraph, VisibleNode};
use crate::model::{
    export_document, from_json_str, merge_profiles, CircleId, IdentityModel, MarkDocument, MemberId, MemberTable,
    MergeReport, ProfileRecord,
};
use crate::overlay::{build_overlay_entries, frame_member_ids, layout_frame, OverlayDraw, OverlayEntry};

/// Everything the controller remembers between renders.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    /// Signature of the graph the surface shows. `None` forces a full rebuild.
    pub signature: Option<GraphSignature>,
    /// Selection the surface was last synced with.
    pub rendered_selected: Option<MemberId>,
    /// Selection requested by the user.
    pub selected: Option<MemberId>,
    pub node_ids: HashSet<String>,
    pub edge_ids: HashSet<String>,
    /// Whether anything was ever pushed to the surface.
    pub rendered: bool,
    /// Visible members of the last render. A view is only restored when the
    /// previous render showed something.
    pub last_visible_count: usize,
    /// Identity model revision the surface and overlay were built from.
    pub model_revision: Option<u64>,
    /// Physics is running (requested and not settled yet).
    pub physics: bool,
    pub filter: FilterState,
    pub visible: VisibleGraph,
    pub overlay_entries: Vec<OverlayEntry>,
}

/// Result of one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub path: SyncPath,
    /// Visible members (hubs excluded).
    pub members: usize,
    pub edges: usize,
    pub added_nodes: usize,
    pub removed_nodes: usize,
    pub removed_edges: usize,
    pub signature: String,
}

#[derive(Debug, Default)]
pub struct GraphController {
    engine: GraphEngine,
    model: IdentityModel,
    config: EngineConfig,
    profiles: Vec<ProfileRecord>,
    state: EngineState,
}

impl GraphController {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: GraphEngine::new(),
            config,
            ..Self::default()
        }
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Replace the loaded profiles. The next render should be a full one.
    pub fn load_profiles(&mut self, records: Vec<ProfileRecord>) -> GraphStats {
        self.profiles = records;
        self.rebuild_table()
    }

    /// Merge profiles into the loaded ones, keeping the newer record per id.
    pub fn merge_profiles(&mut self, records: Vec<ProfileRecord>) -> MergeReport {
        let report = merge_profiles(&mut self.profiles, records);
        info!(
            "merged profiles: {} added, {} updated, {} skipped",
            report.added, report.updated, report.skipped
        );
        self.rebuild_table();
        report
    }

    /// Load an already built member table.
    pub fn load_table(&mut self, table: MemberTable) -> GraphStats {
        self.profiles.clear();
        self.engine.load(table);
        self.state.signature = None;
        self.engine.stats()
    }

    fn rebuild_table(&mut self) -> GraphStats {
        self.engine.load(MemberTable::from_records(&self.profiles));
        self.state.signature = None;
        let stats = self.engine.stats();
        info!(
            "loaded {} members ({} placeholders), {} ownership, {} romantic",
            stats.members, stats.placeholders, stats.edges.ownership, stats.edges.romantic
        );
        stats
    }

    pub fn table(&self) -> &MemberTable {
        self.engine.table()
    }

    pub fn stats(&self) -> GraphStats {
        self.engine.stats()
    }

    pub fn titles(&self) -> Vec<String> {
        self.engine.table().titles(&self.config.default_title)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: EngineConfig) {
        self.config = config;
    }

    // =========================================================================
    // Identity model
    // =========================================================================

    pub fn model(&self) -> &IdentityModel {
        &self.model
    }

    /// Mutable access for tagging. Mutations bump the model revision, which
    /// the engine picks up on the next render.
    pub fn model_mut(&mut self) -> &mut IdentityModel {
        &mut self.model
    }

    /// Merge an identity document into the current model.
    pub fn import_document(&mut self, text: &str) -> Result<(), ImportError> {
        let incoming = from_json_str(text)?;
        self.model.merge(incoming);
        Ok(())
    }

    pub fn export_document(&self, export_date: Option<String>) -> MarkDocument {
        export_document(&self.model, export_date)
    }

    pub fn circle_filter_entries(&mut self) -> Vec<CircleFilterEntry> {
        self.engine
            .circle_filter_entries(&self.model, &self.state.filter.selected_circles)
    }

    pub fn circle_ancestors(&mut self, circle: &str) -> Vec<CircleId> {
        self.engine.circle_ancestors(&self.model, circle)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Members of the last rendered graph, sorted by label.
    pub fn filtered_list(&self) -> Vec<&VisibleNode> {
        self.state.visible.filtered_list()
    }

    /// Compute the visible graph and sync it to `surface`.
    ///
    /// A surface that is not ready is reported without touching any state.
    /// If the surface fails halfway through an update, the next render falls
    /// back to a full rebuild.
    pub fn render<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        request: &RenderRequest,
    ) -> Result<SyncOutcome, SyncError> {
        if !surface.is_ready() {
            warn!("render requested before the surface is ready");
            return Err(SurfaceError::NotReady.into());
        }

        let positions = if !request.physics && self.state.rendered {
            let ids: Vec<String> = self.state.node_ids.iter().cloned().collect();
            Some(surface.positions(&ids)?)
        } else {
            None
        };

        let graph = self.engine.compute_visible_graph(
            &self.model,
            &request.filter,
            request.selected.as_deref(),
            positions.as_ref(),
            &self.config,
        );

        let previous = self.state.signature.as_ref().map(|signature| PreviousRender {
            signature,
            selected: self.state.rendered_selected.as_deref(),
        });
        let mut path = choose_path(
            previous,
            &graph.signature,
            request.selected.as_deref(),
            request.incremental,
        );
        // Labels, titles and circle nesting live outside the signature.
        let model_moved = self.state.model_revision != Some(self.model.revision());
        if path == SyncPath::Unchanged && model_moved {
            path = SyncPath::SelectionOnly;
        }
        debug!("sync {path}: {}", graph.signature);

        match self.apply(surface, path, &graph, request) {
            Ok(outcome) => {
                self.commit(path, graph, request);
                Ok(outcome)
            }
            Err(err) => {
                warn!("sync {path} failed: {err}");
                self.state.signature = None;
                Err(err)
            }
        }
    }

    /// Render again with the last filter and the current selection.
    pub fn rerender<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        incremental: bool,
    ) -> Result<SyncOutcome, SyncError> {
        let request = RenderRequest {
            filter: self.state.filter.clone(),
            selected: self.state.selected.clone(),
            incremental,
            physics: self.state.physics,
        };
        self.render(surface, &request)
    }

    fn apply<S: RenderSurface + ?Sized>(
        &self,
        surface: &mut S,
        path: SyncPath,
        graph: &VisibleGraph,
        request: &RenderRequest,
    ) -> Result<SyncOutcome, SyncError> {
        let selection: Vec<String> = request
            .selected
            .iter()
            .filter(|id| graph.nodes.iter().any(|n| &n.id == *id))
            .cloned()
            .collect();
        let mut outcome = SyncOutcome {
            path,
            members: graph.member_count(),
            edges: graph.edges.len(),
            added_nodes: 0,
            removed_nodes: 0,
            removed_edges: 0,
            signature: graph.signature.to_string(),
        };

        match path {
            SyncPath::Unchanged => {}
            SyncPath::SelectionOnly => {
                let nodes: Vec<VisibleNode> = graph.nodes.iter().map(VisibleNode::without_position).collect();
                surface.update_nodes(&nodes)?;
                surface.select_nodes(&selection)?;
            }
            SyncPath::Incremental => {
                let diff = RenderDiff::between(&self.state.node_ids, &self.state.edge_ids, graph);
                if !diff.removed_edges.is_empty() {
                    surface.remove_edges(&diff.removed_edges)?;
                }
                if !diff.removed_nodes.is_empty() {
                    surface.remove_nodes(&diff.removed_nodes)?;
                }
                surface.update_nodes(&diff.upsert_nodes)?;
                surface.update_edges(&graph.edges)?;
                surface.select_nodes(&selection)?;
                outcome.added_nodes = diff.added_nodes;
                outcome.removed_nodes = diff.removed_nodes.len();
                outcome.removed_edges = diff.removed_edges.len();
            }
            SyncPath::FullRebuild => {
                let view = if self.state.rendered && self.state.last_visible_count > 0 {
                    Some((surface.view_position()?, surface.scale()?))
                } else {
                    None
                };
                surface.set_physics(request.physics)?;
                surface.set_data(&graph.nodes, &graph.edges)?;
                surface.select_nodes(&selection)?;
                match view {
                    Some((position, scale)) => surface.move_to(position, scale)?,
                    None if !graph.is_empty() => surface.fit()?,
                    None => {}
                }
                if request.physics {
                    surface.arm_settle_freeze()?;
                }
                outcome.added_nodes = graph.nodes.len();
                outcome.removed_nodes = self.state.node_ids.len();
                outcome.removed_edges = self.state.edge_ids.len();
            }
        }
        Ok(outcome)
    }

    fn commit(&mut self, path: SyncPath, graph: VisibleGraph, request: &RenderRequest) {
        let revision = self.model.revision();
        let structural = matches!(path, SyncPath::Incremental | SyncPath::FullRebuild);
        if structural {
            self.state.node_ids = graph.nodes.iter().map(|n| n.id.clone()).collect();
            self.state.edge_ids = graph.edges.iter().map(|e| e.id.clone()).collect();
        }
        if structural || self.state.model_revision != Some(revision) {
            self.state.overlay_entries = self.overlay_entries(&graph, &request.filter);
        }
        self.state.model_revision = Some(revision);
        if path == SyncPath::FullRebuild {
            self.state.physics = request.physics;
        }
        self.state.signature = Some(graph.signature.clone());
        self.state.rendered_selected = request.selected.clone();
        self.state.selected = request.selected.clone();
        self.state.rendered = true;
        self.state.last_visible_count = graph.member_count();
        self.state.filter = request.filter.clone();
        self.state.visible = graph;
    }

    fn overlay_entries(&mut self, graph: &VisibleGraph, filter: &FilterState) -> Vec<OverlayEntry> {
        let indexes = self.engine.indexes(&self.model);
        let allowed = filter
            .circle_filter_active()
            .then(|| indexes.forest.expanded(filter.selected_circles.iter().map(String::as_str)));
        build_overlay_entries(&graph.member_ids(), indexes, allowed.as_ref())
    }

    // =========================================================================
    // Surface events
    // =========================================================================

    /// React to a renderer event. Returns the render outcome when the event
    /// caused a render.
    pub fn handle_event<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        event: SurfaceEvent,
    ) -> Result<Option<SyncOutcome>, SyncError> {
        match event {
            SurfaceEvent::Select(id) => {
                if !self.engine.table().contains(&id) {
                    return Ok(None);
                }
                self.state.selected = Some(id);
                self.rerender(surface, true).map(Some)
            }
            SurfaceEvent::Deselect { remaining } => {
                // Clicking empty canvas keeps the current selection.
                if remaining.is_empty()
                    && let Some(selected) = &self.state.selected
                {
                    surface.select_nodes(std::slice::from_ref(selected))?;
                }
                Ok(None)
            }
            SurfaceEvent::DoubleClick(id) => {
                if !self.engine.table().contains(&id) {
                    return Ok(None);
                }
                self.model.toggle_pin(&id);
                self.rerender(surface, true).map(Some)
            }
            SurfaceEvent::PhysicsSettled => {
                surface.set_physics(false)?;
                self.state.physics = false;
                Ok(None)
            }
        }
    }

    /// Clear the selection and re-render.
    pub fn clear_selection<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> Result<SyncOutcome, SyncError> {
        self.state.selected = None;
        self.rerender(surface, true)
    }

    // =========================================================================
    // Overlay
    // =========================================================================

    /// Overlay shapes for the current frame, from one batched position lookup.
    pub fn overlay_frame<S: RenderSurface + ?Sized>(&self, surface: &S) -> Result<Vec<OverlayDraw>, SyncError> {
        if !self.state.filter.show_circle_overlay || self.state.overlay_entries.is_empty() {
            return Ok(Vec::new());
        }
        if !surface.is_ready() {
            return Err(SurfaceError::NotReady.into());
        }
        let ids = frame_member_ids(&self.state.overlay_entries);
        let positions = surface.positions(&ids)?;
        let scale = surface.scale()?;
        Ok(layout_frame(&self.state.overlay_entries, &positions, scale, &self.config))
    }
}
