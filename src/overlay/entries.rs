//! Circle overlay entries and per-frame shape layout.
//!
//! Entries are computed once per render from the visible member set. Every
//! animation frame then looks up the live positions of all entry members in
//! one batch and turns each entry into a capsule or a padded hull.

use std::collections::HashSet;

use serde::Serialize;

use super::capsule::Capsule;
use super::hull::{padded_hull, PaddedHull};
use crate::config::EngineConfig;
use crate::graph::{hue, Indexes, Point, PositionMap};
use crate::model::{CircleId, MemberId};

/// Fill, stroke and glow colors of one circle overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayStyle {
    pub fill: String,
    pub stroke: String,
    pub glow: String,
}

/// Stable colors for a circle; deeper circles get darker.
pub fn circle_overlay_style(circle: &str, depth: usize) -> OverlayStyle {
    let h = hue(circle, 41, 11.0);
    let lightness = 60usize.saturating_sub(depth * 4).max(34);
    OverlayStyle {
        fill: format!("hsla({h}, 70%, {lightness}%, 0.14)"),
        stroke: format!("hsla({h}, 70%, {}%, 0.22)", lightness + 6),
        glow: format!("hsla({h}, 70%, {}%, 0.25)", (lightness + 18).min(80)),
    }
}

/// A circle with at least two visible members (its own or a descendant's).
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayEntry {
    pub circle: CircleId,
    /// Sorted visible members.
    pub members: Vec<MemberId>,
    pub depth: usize,
    pub style: OverlayStyle,
}

/// Build overlay entries in ascending depth order.
///
/// `allowed` restricts the result to a set of circles (the expanded circle
/// filter selection) when present.
pub fn build_overlay_entries(
    visible: &HashSet<&str>,
    indexes: &Indexes,
    allowed: Option<&HashSet<CircleId>>,
) -> Vec<OverlayEntry> {
    let mut entries = Vec::new();
    for entry in indexes.forest.entries() {
        if allowed.is_some_and(|allowed| !allowed.contains(&entry.id)) {
            continue;
        }
        let mut members: Vec<MemberId> = std::iter::once(entry.id.clone())
            .chain(indexes.forest.descendants(&entry.id))
            .flat_map(|circle| indexes.circles.members(&circle).iter())
            .filter(|m| visible.contains(m.as_str()))
            .cloned()
            .collect();
        members.sort_unstable();
        members.dedup();
        if members.len() < 2 {
            continue;
        }
        entries.push(OverlayEntry {
            style: circle_overlay_style(&entry.id, entry.depth),
            circle: entry.id.clone(),
            members,
            depth: entry.depth,
        });
    }
    entries.sort_by_key(|e| e.depth);
    entries
}

/// Every member id any entry needs a position for, without duplicates.
pub fn frame_member_ids(entries: &[OverlayEntry]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    entries
        .iter()
        .flat_map(|e| e.members.iter())
        .filter(|m| seen.insert(m.as_str()))
        .cloned()
        .collect()
}

/// Geometry of one overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayShape {
    Capsule(Capsule),
    Hull(PaddedHull),
}

impl OverlayShape {
    /// Capsule for two points, padded hull for more. Points that collapse
    /// to a segment or a single spot fall back to a capsule over the hull ends.
    pub fn from_points(points: &[Point], padding: f64) -> Option<Self> {
        match points {
            [] | [_] => None,
            [a, b] => Some(Self::Capsule(Capsule::new(*a, *b, padding))),
            _ => padded_hull(points, padding).map(Self::Hull).or_else(|| {
                let hull = super::hull::convex_hull(points);
                let first = *hull.first()?;
                let last = *hull.last()?;
                Some(Self::Capsule(Capsule::new(first, last, padding)))
            }),
        }
    }
}

/// One overlay ready to paint.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDraw {
    pub circle: CircleId,
    pub depth: usize,
    pub style: OverlayStyle,
    pub shape: OverlayShape,
    pub blur: f64,
    pub width: f64,
}

/// Lay out all entries for one frame. Entries with fewer than two
/// positioned members this frame are skipped.
pub fn layout_frame(
    entries: &[OverlayEntry],
    positions: &PositionMap,
    scale: f64,
    config: &EngineConfig,
) -> Vec<OverlayDraw> {
    let mut points: Vec<Point> = Vec::new();
    let mut draws = Vec::with_capacity(entries.len());
    for entry in entries {
        points.clear();
        points.extend(entry.members.iter().filter_map(|m| positions.get(m).copied()));
        let Some(shape) = OverlayShape::from_points(&points, config.overlay_padding_at(entry.depth)) else {
            continue;
        };
        let (blur, width) = config.overlay_stroke_at(entry.depth, scale);
        draws.push(OverlayDraw {
            circle: entry.circle.clone(),
            depth: entry.depth,
            style: entry.style.clone(),
            shape,
            blur,
            width,
        });
    }
    draws
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphEngine;
    use crate::model::{IdentityModel, Member, MemberTable};

    fn setup() -> (IdentityModel, Indexes, CircleId, CircleId) {
        let table = MemberTable::from_parts(
            ["5", "6", "7", "8"].iter().map(|id| Member::new(*id, "x")).collect(),
            Vec::new(),
        );
        let mut model = IdentityModel::new();
        let outer = model.create_circle("Outer").unwrap();
        let inner = model.create_circle("Inner").unwrap();
        model.reparent_circle(&inner, Some(&outer)).unwrap();
        model.set_member_circle("5", &inner, true).unwrap();
        model.set_member_circle("6", &inner, true).unwrap();
        model.set_member_circle("7", &outer, true).unwrap();
        let mut engine = GraphEngine::with_table(table);
        let indexes = engine.indexes(&model).clone();
        (model, indexes, outer, inner)
    }

    #[test]
    fn test_outer_includes_descendant_members() {
        let (_, indexes, outer, inner) = setup();
        let visible: HashSet<&str> = ["5", "6", "7"].into_iter().collect();
        let entries = build_overlay_entries(&visible, &indexes, None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].circle, outer);
        assert_eq!(entries[0].members, ["5", "6", "7"]);
        assert_eq!(entries[1].circle, inner);
        assert_eq!(entries[1].depth, 1);
    }

    #[test]
    fn test_allowed_and_visibility_filtering() {
        let (_, indexes, _, inner) = setup();
        let visible: HashSet<&str> = ["5", "7"].into_iter().collect();
        let entries = build_overlay_entries(&visible, &indexes, None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].members, ["5", "7"]);

        let visible: HashSet<&str> = ["5", "6", "7"].into_iter().collect();
        let allowed = HashSet::from([inner.clone()]);
        let entries = build_overlay_entries(&visible, &indexes, Some(&allowed));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].circle, inner);
    }

    #[test]
    fn test_two_members_make_a_capsule_on_their_positions() {
        let (_, indexes, _, _) = setup();
        let visible: HashSet<&str> = ["5", "6"].into_iter().collect();
        let entries = build_overlay_entries(&visible, &indexes, None);
        let positions = PositionMap::from([
            ("5".to_string(), Point::new(-12.5, 40.0)),
            ("6".to_string(), Point::new(33.0, 7.25)),
        ]);
        let draws = layout_frame(&entries, &positions, 1.0, &EngineConfig::default());
        // Both Outer (through Inner) and Inner enclose the same pair.
        assert_eq!(draws.len(), 2);
        for draw in &draws {
            let OverlayShape::Capsule(capsule) = &draw.shape else {
                panic!("expected a capsule, got {:?}", draw.shape);
            };
            assert_eq!(capsule.cap_centers(), (positions["5"], positions["6"]));
        }
        assert_eq!(draws[1].width, 2.4 + 0.35);
    }

    #[test]
    fn test_missing_positions_skip_entry() {
        let (_, indexes, _, _) = setup();
        let visible: HashSet<&str> = ["5", "6", "7"].into_iter().collect();
        let entries = build_overlay_entries(&visible, &indexes, None);
        let positions = PositionMap::from([("5".to_string(), Point::new(0.0, 0.0))]);
        assert!(layout_frame(&entries, &positions, 1.0, &EngineConfig::default()).is_empty());
        assert_eq!(frame_member_ids(&entries), ["5", "6", "7"]);
    }

    #[test]
    fn test_three_points_make_a_hull() {
        let shape = OverlayShape::from_points(
            &[Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(5.0, 8.0)],
            28.0,
        );
        assert!(matches!(shape, Some(OverlayShape::Hull(ref h)) if h.padding == 28.0));

        let line = OverlayShape::from_points(
            &[Point::new(0.0, 0.0), Point::new(5.0, 0.0), Point::new(10.0, 0.0)],
            28.0,
        );
        let Some(OverlayShape::Capsule(capsule)) = line else {
            panic!("collinear points should make a capsule");
        };
        assert_eq!(capsule.cap_centers(), (Point::new(0.0, 0.0), Point::new(10.0, 0.0)));
    }

    #[test]
    fn test_overlay_style() {
        let style = circle_overlay_style("c-1", 0);
        assert_eq!(style, circle_overlay_style("c-1", 0));
        assert!(style.fill.contains("60%"));
        assert!(circle_overlay_style("c-1", 9).fill.contains("34%"));
    }
}
