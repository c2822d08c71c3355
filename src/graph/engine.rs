//! GraphEngine - filter and expansion over the loaded member table.
//!
//! The engine owns the member table, the derived indexes (behind a single
//! dirty flag) and two neighbor caches. `compute_visible_graph` turns the
//! identity model plus one filter state into the exact node and edge set the
//! renderer should show, including synthetic group-cohesion edges and
//! invisible circle hubs.

use std::collections::{HashMap, HashSet};

use log::debug;
use serde::Serialize;

use super::edge::{EdgeKind, EdgeStats, GraphEdge};
use super::hash::hash_offset;
use super::index::Indexes;
use super::neighbor::NeighborCache;
use super::node::{NodeKind, Point, PositionMap, VisibleNode};
use super::signature::{GraphSignature, SignatureBuilder};
use super::style::{style_for, StyleInput};
use crate::config::{EngineConfig, FilterState};
use crate::model::{CircleId, IdentityModel, Member, MemberId, MemberTable};

/// Output of one filter pass.
#[derive(Debug, Clone, Default)]
pub struct VisibleGraph {
    /// Member nodes followed by circle hubs.
    pub nodes: Vec<VisibleNode>,
    /// Relation edges, then group-cohesion edges, then hub edges.
    pub edges: Vec<GraphEdge>,
    pub signature: GraphSignature,
    /// Members forced in by the circle filter.
    pub forced: HashSet<MemberId>,
}

impl VisibleGraph {
    /// Nodes shown to the user (hubs excluded).
    pub fn members(&self) -> impl Iterator<Item = &VisibleNode> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Member)
    }

    pub fn member_count(&self) -> usize {
        self.members().count()
    }

    pub fn member_ids(&self) -> HashSet<&str> {
        self.members().map(|n| n.id.as_str()).collect()
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn edge_ids(&self) -> HashSet<&str> {
        self.edges.iter().map(|e| e.id.as_str()).collect()
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// Members sorted by label, for the filtered list.
    pub fn filtered_list(&self) -> Vec<&VisibleNode> {
        let mut list: Vec<&VisibleNode> = self.members().collect();
        list.sort_by_cached_key(|n| (n.label.to_lowercase(), n.id.clone()));
        list
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// One row of the circle filter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleFilterEntry {
    pub id: CircleId,
    pub name: String,
    pub depth: usize,
    /// Members tagged with this circle itself.
    pub direct: usize,
    /// Direct count summed over this circle and all its descendants.
    pub total: usize,
    pub selected: bool,
}

/// Counts of the loaded data set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub members: usize,
    pub placeholders: usize,
    #[serde(flatten)]
    pub edges: EdgeStats,
}

/// The filter and expansion engine.
#[derive(Debug, Default)]
pub struct GraphEngine {
    table: MemberTable,
    indexes: Indexes,
    /// Whether the indexes need rebuilding.
    index_dirty: bool,
    /// Identity model revision the indexes were built from.
    indexed_revision: Option<u64>,
    /// Adjacency over edges admitted by type and group.
    eligible_neighbors: NeighborCache,
    /// Adjacency over materialized relation edges, used for seeding.
    visible_neighbors: NeighborCache,
}

impl GraphEngine {
    /// Create an engine with no data.
    pub fn new() -> Self {
        Self {
            index_dirty: true,
            ..Self::default()
        }
    }

    /// Create an engine over a loaded member table.
    pub fn with_table(table: MemberTable) -> Self {
        let mut engine = Self::new();
        engine.load(table);
        engine
    }

    /// Replace the member table.
    pub fn load(&mut self, table: MemberTable) {
        self.table = table;
        self.eligible_neighbors.clear();
        self.visible_neighbors.clear();
        self.invalidate();
    }

    #[inline]
    pub fn table(&self) -> &MemberTable {
        &self.table
    }

    /// Force an index rebuild on the next pass.
    pub fn invalidate(&mut self) {
        self.index_dirty = true;
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            members: self.table.len() - self.table.placeholder_count(),
            placeholders: self.table.placeholder_count(),
            edges: self.table.stats(),
        }
    }

    /// Current indexes, rebuilt first if stale.
    pub fn indexes(&mut self, model: &IdentityModel) -> &Indexes {
        if self.index_dirty || self.indexed_revision != Some(model.revision()) {
            self.indexes = Indexes::build(&self.table, model);
            self.indexed_revision = Some(model.revision());
            self.index_dirty = false;
        }
        &self.indexes
    }

    /// Ancestors of `circle`, nearest first.
    pub fn circle_ancestors(&mut self, model: &IdentityModel, circle: &str) -> Vec<CircleId> {
        self.indexes(model).forest.ancestors(circle)
    }

    /// Ordered circle list with direct and descendant-inclusive counts.
    pub fn circle_filter_entries(
        &mut self,
        model: &IdentityModel,
        selected: &[String],
    ) -> Vec<CircleFilterEntry> {
        let indexes = self.indexes(model);
        indexes
            .forest
            .entries()
            .iter()
            .map(|entry| {
                let direct = indexes.circles.direct_count(&entry.id);
                let total = direct
                    + indexes
                        .forest
                        .descendants(&entry.id)
                        .iter()
                        .map(|d| indexes.circles.direct_count(d))
                        .sum::<usize>();
                let name = model
                    .circles()
                    .get(&entry.id)
                    .map(|c| c.name.clone())
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| entry.id.clone());
                CircleFilterEntry {
                    id: entry.id.clone(),
                    name,
                    depth: entry.depth,
                    direct,
                    total,
                    selected: selected.contains(&entry.id),
                }
            })
            .collect()
    }

    /// Compute the visible graph for one render.
    ///
    /// `positions` is the renderer's current layout when continuing an
    /// existing layout; new nodes are then seeded near their neighbors.
    pub fn compute_visible_graph(
        &mut self,
        model: &IdentityModel,
        filter: &FilterState,
        selected: Option<&str>,
        positions: Option<&PositionMap>,
        config: &EngineConfig,
    ) -> VisibleGraph {
        self.indexes(model);
        let Self {
            table,
            indexes,
            eligible_neighbors,
            visible_neighbors,
            ..
        } = self;
        let groups = &indexes.groups;

        // Primary matches, closed over groups.
        let query = filter.normalized_query();
        let mut allowed: HashSet<MemberId> = HashSet::new();
        for member in table.members() {
            let title_match = filter.title.is_empty()
                || (!member.placeholder && member.title_or(&config.default_title) == filter.title);
            if title_match && member.matches_query(&query) {
                allowed.extend(groups.mates_of(&member.id).into_iter().map(str::to_string));
            }
        }

        // Members of the selected circles (and their descendants) bypass the text filter.
        let glow_circles: HashSet<CircleId> = if filter.circle_filter_active() {
            indexes
                .forest
                .expanded(filter.selected_circles.iter().map(String::as_str))
        } else {
            HashSet::new()
        };
        let forced: HashSet<MemberId> = glow_circles
            .iter()
            .flat_map(|circle| indexes.circles.members(circle))
            .cloned()
            .collect();
        allowed.extend(forced.iter().cloned());

        // Relation edges admitted by kind toggles; intra-group edges are suppressed.
        let eligible: Vec<GraphEdge> = table
            .edges()
            .iter()
            .filter(|e| match e.kind {
                EdgeKind::Ownership => filter.show_ownership,
                EdgeKind::Romantic => filter.show_romantic,
                EdgeKind::Group | EdgeKind::CircleHub => false,
            })
            .filter(|e| !groups.same_group(&e.from, &e.to))
            .cloned()
            .collect();

        let selected_mates: Vec<&str> = selected.map(|id| groups.mates_of(id)).unwrap_or_default();
        let mut seed = allowed;
        seed.extend(selected_mates.iter().map(|id| id.to_string()));
        seed.extend(model.pinned().iter().cloned());

        let expanded = eligible_neighbors
            .get(&eligible)
            .expand_by_depth(&seed, filter.effective_depth());

        // Anything reached by expansion brings its whole group along.
        let mut visible: HashSet<MemberId> = expanded.clone();
        for id in &expanded {
            visible.extend(groups.mates_of(id).into_iter().map(str::to_string));
        }

        let relation_edges: Vec<GraphEdge> = eligible
            .into_iter()
            .filter(|e| visible.contains(&e.from) && visible.contains(&e.to))
            .collect();

        let mut group_ids: Vec<(&str, &[MemberId])> = groups.groups().collect();
        group_ids.sort_unstable_by_key(|(group, _)| *group);
        let mut group_edges = Vec::new();
        for (group, members) in group_ids {
            let mut shown = members.iter().filter(|m| visible.contains(*m));
            let Some(anchor) = shown.next() else {
                continue;
            };
            group_edges.extend(shown.map(|member| GraphEdge::group(group, anchor, member)));
        }

        let mut members: Vec<&Member> =
            table.members().iter().filter(|m| visible.contains(&m.id)).collect();

        if filter.hide_isolated {
            let mut connected: HashSet<&str> = HashSet::new();
            for edge in relation_edges.iter().chain(&group_edges) {
                connected.insert(&edge.from);
                connected.insert(&edge.to);
            }
            connected.extend(model.pinned().iter().map(String::as_str));
            connected.extend(selected);
            connected.extend(forced.iter().map(String::as_str));
            members.retain(|m| connected.contains(m.id.as_str()));
        }

        let seeding = match positions {
            Some(positions) => Some((positions, visible_neighbors.get(&relation_edges))),
            None => None,
        };
        let multi_group = selected_mates.len() > 1;

        let mut signature = SignatureBuilder::new();
        let mut nodes: Vec<VisibleNode> = Vec::with_capacity(members.len());
        for member in &members {
            let id = member.id.as_str();
            let position = seeding.map(|(positions, neighbors)| {
                seed_position(id, positions, neighbors.neighbors(id), config)
            });
            let group = groups.group_of(id);
            let member_circles = indexes.circles.circles_of(id);
            let pinned = model.is_pinned(id);
            let style = style_for(&StyleInput {
                group,
                selected_group_mate: multi_group && selected != Some(id) && selected_mates.contains(&id),
                circle_glow: member_circles.iter().any(|c| glow_circles.contains(c)),
                pinned,
            });
            signature.add_node(id, group, member_circles.iter().map(String::as_str), pinned);
            nodes.push(VisibleNode {
                id: member.id.clone(),
                kind: NodeKind::Member,
                label: member.label(filter.display_nickname, &config.unknown_label),
                title: if member.placeholder {
                    config.unknown_label.clone()
                } else {
                    member.title_or(&config.default_title).to_string()
                },
                tooltip: member.tooltip(),
                position,
                style,
            });
        }

        // Invisible hubs pulling each circle's visible members together.
        let shown: HashSet<&str> = members.iter().map(|m| m.id.as_str()).collect();
        let mut circles: Vec<(&str, &[MemberId])> = indexes.circles.circles().collect();
        circles.sort_unstable_by_key(|(circle, _)| *circle);
        let placed: HashMap<&str, Point> = nodes
            .iter()
            .filter_map(|n| n.position.map(|p| (n.id.as_str(), p)))
            .collect();
        let mut hubs = Vec::new();
        let mut hub_edges = Vec::new();
        for (circle, circle_members) in circles {
            let in_view: Vec<&MemberId> = circle_members
                .iter()
                .filter(|m| shown.contains(m.as_str()))
                .collect();
            if in_view.len() < 2 {
                continue;
            }
            let centroid =
                Point::centroid(in_view.iter().filter_map(|m| placed.get(m.as_str()).copied()));
            let hub = VisibleNode::hub(circle, centroid);
            hub_edges.extend(in_view.iter().map(|m| GraphEdge::circle_hub(circle, &hub.id, m)));
            hubs.push(hub);
        }

        let mut edges = relation_edges;
        edges.extend(group_edges);
        edges.extend(hub_edges);
        for edge in &edges {
            signature.add_edge(&edge.id);
        }
        nodes.extend(hubs);

        let signature = signature.finish(
            filter.display_nickname,
            filter.circle_filter_enabled,
            &filter.selected_circles,
        );
        debug!(
            "visible graph: {} nodes, {} edges, signature {signature}",
            nodes.len(),
            edges.len()
        );

        VisibleGraph {
            nodes,
            edges,
            signature,
            forced,
        }
    }
}

/// Position for a node when continuing a layout: its previous position, the
/// centroid of its placed neighbors plus a small stable jitter, or a
/// hash-derived spot near the origin.
fn seed_position<'a>(
    id: &str,
    positions: &PositionMap,
    neighbors: impl Iterator<Item = &'a str>,
    config: &EngineConfig,
) -> Point {
    if let Some(&placed) = positions.get(id) {
        return placed;
    }
    match Point::centroid(neighbors.filter_map(|n| positions.get(n).copied())) {
        Some(center) => Point::new(
            center.x + hash_offset(id, 0) * config.seed_jitter,
            center.y + hash_offset(id, 7) * config.seed_jitter,
        ),
        None => Point::new(
            hash_offset(id, 13) * config.seed_spread,
            hash_offset(id, 29) * config.seed_spread,
        ),
    }
}
