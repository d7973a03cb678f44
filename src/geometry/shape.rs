//! Shapes and symmetric shape-to-shape distance

use serde::{Deserialize, Serialize};

use crate::core::types::Point;

/// A region of the map used as a move target or proximity query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Point(Point),
    Circle { center: Point, radius: f64 },
    /// Axis-aligned rectangle, `min` is the lower-left corner
    Rect { min: Point, max: Point },
    /// Ring between `inner` and `outer` radius
    Annulus {
        center: Point,
        inner: f64,
        outer: f64,
    },
}

impl Shape {
    pub fn circle(center: Point, radius: f64) -> Self {
        Shape::Circle { center, radius }
    }

    pub fn center(&self) -> Point {
        match *self {
            Shape::Point(p) => p,
            Shape::Circle { center, .. } | Shape::Annulus { center, .. } => center,
            Shape::Rect { min, max } => Point::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0),
        }
    }

    pub fn contains(&self, p: &Point) -> bool {
        distance(&Shape::Point(*p), self) <= f64::EPSILON
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Shape::Point(_))
    }
}

impl From<Point> for Shape {
    fn from(p: Point) -> Self {
        Shape::Point(p)
    }
}

fn point_to_rect(p: &Point, min: &Point, max: &Point) -> f64 {
    let dx = (min.x - p.x).max(0.0).max(p.x - max.x);
    let dy = (min.y - p.y).max(0.0).max(p.y - max.y);
    (dx * dx + dy * dy).sqrt()
}

fn farthest_corner(p: &Point, min: &Point, max: &Point) -> f64 {
    let dx = (p.x - min.x).abs().max((p.x - max.x).abs());
    let dy = (p.y - min.y).abs().max((p.y - max.y).abs());
    (dx * dx + dy * dy).sqrt()
}

/// Gap between a ring and a disc of `radius` whose center is `d` away
fn ring_to_disc(d: f64, inner: f64, outer: f64, radius: f64) -> f64 {
    if d + radius < inner {
        inner - (d + radius)
    } else if d - radius > outer {
        d - radius - outer
    } else {
        0.0
    }
}

/// Smallest distance between any two points of `a` and `b` (0 when they overlap)
///
/// Defined for every pair of shape kinds and symmetric in its arguments.
pub fn distance(a: &Shape, b: &Shape) -> f64 {
    use Shape::*;

    match (*a, *b) {
        (Point(p), Point(q)) => p.distance(&q),
        (Point(p), Circle { center, radius }) | (Circle { center, radius }, Point(p)) => {
            (p.distance(&center) - radius).max(0.0)
        }
        (Point(p), Rect { min, max }) | (Rect { min, max }, Point(p)) => {
            point_to_rect(&p, &min, &max)
        }
        (Point(p), Annulus { center, inner, outer })
        | (Annulus { center, inner, outer }, Point(p)) => {
            ring_to_disc(p.distance(&center), inner, outer, 0.0)
        }
        (Circle { center: c1, radius: r1 }, Circle { center: c2, radius: r2 }) => {
            (c1.distance(&c2) - r1 - r2).max(0.0)
        }
        (Circle { center, radius }, Rect { min, max })
        | (Rect { min, max }, Circle { center, radius }) => {
            (point_to_rect(&center, &min, &max) - radius).max(0.0)
        }
        (Circle { center: c, radius }, Annulus { center, inner, outer })
        | (Annulus { center, inner, outer }, Circle { center: c, radius }) => {
            ring_to_disc(c.distance(&center), inner, outer, radius)
        }
        (Rect { min: a0, max: a1 }, Rect { min: b0, max: b1 }) => {
            let dx = (a0.x - b1.x).max(b0.x - a1.x).max(0.0);
            let dy = (a0.y - b1.y).max(b0.y - a1.y).max(0.0);
            (dx * dx + dy * dy).sqrt()
        }
        (Rect { min, max }, Annulus { center, inner, outer })
        | (Annulus { center, inner, outer }, Rect { min, max }) => {
            let farthest = farthest_corner(&center, &min, &max);
            let nearest = point_to_rect(&center, &min, &max);
            if farthest < inner {
                inner - farthest
            } else if nearest > outer {
                nearest - outer
            } else {
                0.0
            }
        }
        (
            Annulus { center: c1, inner: i1, outer: o1 },
            Annulus { center: c2, inner: i2, outer: o2 },
        ) => {
            let d = c1.distance(&c2);
            if d + o2 < i1 {
                i1 - (d + o2)
            } else if d + o1 < i2 {
                i2 - (d + o1)
            } else {
                (d - o1 - o2).max(0.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn all_shapes() -> Vec<Shape> {
        vec![
            Shape::Point(p(1.0, 2.0)),
            Shape::circle(p(10.0, 0.0), 2.0),
            Shape::Rect { min: p(-5.0, -5.0), max: p(-2.0, -1.0) },
            Shape::Annulus { center: p(0.0, 20.0), inner: 3.0, outer: 5.0 },
        ]
    }

    #[test]
    fn test_point_to_point() {
        assert!((distance(&p(0.0, 0.0).into(), &p(3.0, 4.0).into()) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_inside_circle_is_zero() {
        let circle = Shape::circle(p(0.0, 0.0), 5.0);
        assert_eq!(distance(&p(1.0, 1.0).into(), &circle), 0.0);
        assert!((distance(&p(8.0, 0.0).into(), &circle) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_in_annulus_hole() {
        let ring = Shape::Annulus { center: p(0.0, 0.0), inner: 4.0, outer: 6.0 };
        assert!((distance(&p(1.0, 0.0).into(), &ring) - 3.0).abs() < 1e-9);
        assert_eq!(distance(&p(5.0, 0.0).into(), &ring), 0.0);
        assert!((distance(&p(9.0, 0.0).into(), &ring) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_rect_to_rect() {
        let a = Shape::Rect { min: p(0.0, 0.0), max: p(1.0, 1.0) };
        let b = Shape::Rect { min: p(4.0, 5.0), max: p(6.0, 6.0) };
        assert!((distance(&a, &b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_rect_inside_annulus_hole() {
        let ring = Shape::Annulus { center: p(0.0, 0.0), inner: 10.0, outer: 12.0 };
        let rect = Shape::Rect { min: p(-1.0, -1.0), max: p(1.0, 1.0) };
        let expected = 10.0 - 2.0_f64.sqrt();
        assert!((distance(&rect, &ring) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_distance_is_symmetric_for_all_kinds() {
        let shapes = all_shapes();
        for a in &shapes {
            for b in &shapes {
                let ab = distance(a, b);
                let ba = distance(b, a);
                assert!((ab - ba).abs() < 1e-9, "{:?} vs {:?}", a, b);
                assert!(ab >= 0.0);
            }
        }
    }

    #[test]
    fn test_rect_center_and_contains() {
        let rect = Shape::Rect { min: p(0.0, 0.0), max: p(4.0, 2.0) };
        assert_eq!(rect.center(), p(2.0, 1.0));
        assert!(rect.contains(&p(1.0, 1.0)));
        assert!(!rect.contains(&p(5.0, 1.0)));
    }
}
