//! Collision detection based on line segments.

use super::{Point, Segment};

/// Tolerance used when checking whether an intersection point lies within the extent of both
/// segments. Absorbs floating point error at shared endpoints.
pub const INTERSECTION_TOLERANCE: f64 = 0.1;

pub trait HasCollision {
    fn has_collision(&self, other: &dyn HasCollision) -> bool {
        let other_edges = other.edges();
        self.edges().iter().any(|edge| {
            other_edges
                .iter()
                .any(|o| segments_intersect(edge.p1(), edge.p2(), o.p1(), o.p2()))
        })
    }

    fn edges(&self) -> &[Segment];
}

/// Closed rectangle given by its four corners in order. The edges connect consecutive corners
/// and the last corner back to the first one.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct BoundingBox {
    edges: [Segment; 4],
}

impl BoundingBox {
    pub fn from_corners(corners: [Point; 4]) -> Self {
        Self {
            edges: [
                Segment::new(corners[0], corners[1]),
                Segment::new(corners[1], corners[2]),
                Segment::new(corners[2], corners[3]),
                Segment::new(corners[3], corners[0]),
            ],
        }
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            self.edges[0].p1(),
            self.edges[1].p1(),
            self.edges[2].p1(),
            self.edges[3].p1(),
        ]
    }

    pub fn segments(&self) -> [Segment; 4] {
        self.edges
    }
}

impl HasCollision for BoundingBox {
    fn edges(&self) -> &[Segment] {
        &self.edges
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

fn orientation(a: Point, b: Point, c: Point) -> Orientation {
    let cross = (b.x() - a.x()) * (c.y() - a.y()) - (b.y() - a.y()) * (c.x() - a.x());
    if cross > 0.0 {
        Orientation::CounterClockwise
    } else if cross < 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::Collinear
    }
}

/// Whether `p`, known to be collinear with `a`-`b`, lies within the extent of that segment.
fn within_extent(a: Point, b: Point, p: Point) -> bool {
    p.x() >= a.x().min(b.x())
        && p.x() <= a.x().max(b.x())
        && p.y() >= a.y().min(b.y())
        && p.y() <= a.y().max(b.y())
}

/// Whether segment `a1`-`a2` intersects segment `b1`-`b2`. Touching at an endpoint and
/// overlapping collinear segments count as intersecting.
pub fn segments_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> bool {
    let o1 = orientation(a1, a2, b1);
    let o2 = orientation(a1, a2, b2);
    let o3 = orientation(b1, b2, a1);
    let o4 = orientation(b1, b2, a2);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Orientation::Collinear && within_extent(a1, a2, b1))
        || (o2 == Orientation::Collinear && within_extent(a1, a2, b2))
        || (o3 == Orientation::Collinear && within_extent(b1, b2, a1))
        || (o4 == Orientation::Collinear && within_extent(b1, b2, a2))
}

/// Line through two points in the form `a·x + b·y = c`.
fn line_coefficients(p1: Point, p2: Point) -> (f64, f64, f64) {
    let a = p1.y() - p2.y();
    let b = p2.x() - p1.x();
    let c = -(p1.x() * p2.y() - p2.x() * p1.y());
    (a, b, c)
}

fn within_tolerance(p1: Point, p2: Point, point: Point) -> bool {
    point.x() >= p1.x().min(p2.x()) - INTERSECTION_TOLERANCE
        && point.x() <= p1.x().max(p2.x()) + INTERSECTION_TOLERANCE
        && point.y() >= p1.y().min(p2.y()) - INTERSECTION_TOLERANCE
        && point.y() <= p1.y().max(p2.y()) + INTERSECTION_TOLERANCE
}

/// Intersection point of segment `a1`-`a2` with segment `b1`-`b2`, if any.
///
/// Parallel and degenerate (zero-length) segments never intersect.
pub fn segment_intersection_point(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let (l1_a, l1_b, l1_c) = line_coefficients(a1, a2);
    let (l2_a, l2_b, l2_c) = line_coefficients(b1, b2);

    let determinant = l1_a * l2_b - l1_b * l2_a;
    if determinant == 0.0 {
        return None;
    }

    let point = Point::new(
        (l1_c * l2_b - l1_b * l2_c) / determinant,
        (l1_a * l2_c - l1_c * l2_a) / determinant,
    );

    (within_tolerance(a1, a2, point) && within_tolerance(b1, b2, point)).then_some(point)
}

/// Distance from `point` to the nearest point on `segment`, together with that nearest point.
pub fn distance_point_to_segment(point: Point, segment: &Segment) -> (f64, Point) {
    let (p1, p2) = (segment.p1(), segment.p2());
    let (dx, dy) = (p2.x() - p1.x(), p2.y() - p1.y());
    let length_squared = dx * dx + dy * dy;

    let t = if length_squared == 0.0 {
        0.0
    } else {
        (((point.x() - p1.x()) * dx + (point.y() - p1.y()) * dy) / length_squared).clamp(0.0, 1.0)
    };

    let nearest = Point::new(p1.x() + t * dx, p1.y() + t * dy);
    (point.distance(nearest), nearest)
}
