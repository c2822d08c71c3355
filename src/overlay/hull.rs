//! Convex hull and its constant-width padded outline.
//!
//! The padded shape is described as fillable pieces rather than a single
//! polygon: one strip per hull edge pushed out along that edge's normal, a
//! circular wedge at every vertex joining neighboring strips, and the hull
//! interior. Filling all three gives a rounded border of uniform width.

use std::f64::consts::TAU;

use crate::graph::Point;

/// Circular sector centered on `center`, swept counter-clockwise from
/// `start` to `end` (radians, `end >= start`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wedge {
    pub center: Point,
    pub radius: f64,
    pub start: f64,
    pub end: f64,
}

impl Wedge {
    #[inline]
    pub fn sweep(&self) -> f64 {
        self.end - self.start
    }
}

/// Padded outline of a convex hull.
#[derive(Debug, Clone, PartialEq)]
pub struct PaddedHull {
    /// Hull vertices, counter-clockwise.
    pub hull: Vec<Point>,
    /// Per edge: outer start, outer end, inner end, inner start.
    pub strips: Vec<[Point; 4]>,
    /// Corner fills, one per vertex.
    pub wedges: Vec<Wedge>,
    pub padding: f64,
}

#[inline]
fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Monotone-chain convex hull. Collinear points are dropped.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    if points.len() <= 1 {
        return points.to_vec();
    }
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    let mut lower: Vec<Point> = Vec::with_capacity(sorted.len());
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<Point> = Vec::with_capacity(sorted.len());
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Unit outward normal of the edge `a -> b` of a counter-clockwise polygon.
fn outward_normal(a: Point, b: Point) -> (f64, f64) {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = dx.hypot(dy);
    let len = if len > 0.0 { len } else { 1.0 };
    (dy / len, -dx / len)
}

#[inline]
fn offset(p: Point, (nx, ny): (f64, f64), by: f64) -> Point {
    Point::new(p.x + nx * by, p.y + ny * by)
}

/// Pad the convex hull of `points` by `padding`. Returns `None` when the
/// hull has fewer than three vertices.
pub fn padded_hull(points: &[Point], padding: f64) -> Option<PaddedHull> {
    let hull = convex_hull(points);
    let n = hull.len();
    if n < 3 {
        return None;
    }

    let normals: Vec<(f64, f64)> = (0..n).map(|i| outward_normal(hull[i], hull[(i + 1) % n])).collect();

    let strips = (0..n)
        .map(|i| {
            let (a, b) = (hull[i], hull[(i + 1) % n]);
            [offset(a, normals[i], padding), offset(b, normals[i], padding), b, a]
        })
        .collect();

    let wedges = (0..n)
        .map(|i| {
            let (px, py) = normals[(i + n - 1) % n];
            let (cx, cy) = normals[i];
            let start = py.atan2(px);
            let mut end = cy.atan2(cx);
            while end <= start {
                end += TAU;
            }
            Wedge {
                center: hull[i],
                radius: padding,
                start,
                end,
            }
        })
        .collect();

    Some(PaddedHull {
        hull,
        strips,
        wedges,
        padding,
    })
}
