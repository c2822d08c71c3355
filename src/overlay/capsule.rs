//! Capsule outline around two points.

use std::f64::consts::PI;

use super::hull::Wedge;
use crate::graph::Point;

/// A padded segment: a rectangle of half-width `radius` around `p0 -> p1`
/// with a semicircular cap at each end.
#[derive(Debug, Clone, PartialEq)]
pub struct Capsule {
    pub p0: Point,
    pub p1: Point,
    pub radius: f64,
    /// Left side at p0, left side at p1, right side at p1, right side at p0.
    pub body: [Point; 4],
    /// Cap at `p1` then cap at `p0`.
    pub caps: [Wedge; 2],
}

impl Capsule {
    pub fn new(p0: Point, p1: Point, radius: f64) -> Self {
        let (dx, dy) = (p1.x - p0.x, p1.y - p0.y);
        let len = dx.hypot(dy);
        let len = if len > 0.0 { len } else { 1.0 };
        let (nx, ny) = (dy / len, -dx / len);
        let side = |p: Point, sign: f64| Point::new(p.x + sign * nx * radius, p.y + sign * ny * radius);

        let angle = ny.atan2(nx);
        Self {
            p0,
            p1,
            radius,
            body: [side(p0, 1.0), side(p1, 1.0), side(p1, -1.0), side(p0, -1.0)],
            caps: [
                Wedge {
                    center: p1,
                    radius,
                    start: angle,
                    end: angle + PI,
                },
                Wedge {
                    center: p0,
                    radius,
                    start: angle + PI,
                    end: angle + 2.0 * PI,
                },
            ],
        }
    }

    /// Centers of the two caps.
    pub fn cap_centers(&self) -> (Point, Point) {
        (self.caps[1].center, self.caps[0].center)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_capsule() {
        let capsule = Capsule::new(Point::new(0.0, 0.0), Point::new(20.0, 0.0), 4.0);
        assert_eq!(capsule.body[0], Point::new(0.0, -4.0));
        assert_eq!(capsule.body[1], Point::new(20.0, -4.0));
        assert_eq!(capsule.body[2], Point::new(20.0, 4.0));
        assert_eq!(capsule.body[3], Point::new(0.0, 4.0));
        assert_eq!(capsule.cap_centers(), (Point::new(0.0, 0.0), Point::new(20.0, 0.0)));
        for cap in &capsule.caps {
            assert!((cap.sweep() - PI).abs() < 1e-12);
        }
    }

    #[test]
    fn test_coincident_points_do_not_blow_up() {
        let p = Point::new(3.0, 3.0);
        let capsule = Capsule::new(p, p, 5.0);
        assert!(capsule.body.iter().all(|q| q.x.is_finite() && q.y.is_finite()));
    }
}
