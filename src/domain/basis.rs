//! Basic building blocks.

use std::{
    f64::consts::PI,
    ops::{Add, Mul, Neg, Sub},
};

use nalgebra::{Isometry2, Point2, Vector2};
use serde::{Deserialize, Serialize};

/// A point in arena coordinates. The arena uses graphics axes: `x` grows to the right and `y`
/// grows downwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Point {
    x: f64,
    y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn distance(&self, point: Self) -> f64 {
        distance(self.x, self.y, point.x, point.y)
    }

    /// Maps a point given in the local frame of a body located at `origin` and facing
    /// `direction` into arena coordinates.
    pub fn to_world(&self, origin: Point, direction: Angle) -> Point {
        let pose = Isometry2::new(Vector2::new(origin.x, origin.y), direction.radians());
        pose.transform_point(&Point2::new(self.x, self.y)).into()
    }

    /// Point at `length` along the ray `angle`, using the ray convention of the arena: angle 0
    /// points along +y.
    pub fn along_ray(&self, angle: Angle, length: f64) -> Point {
        Point::new(
            self.x + angle.radians().sin() * length,
            self.y + angle.radians().cos() * length,
        )
    }
}

impl From<Point> for (f32, f32) {
    fn from(value: Point) -> Self {
        (value.x as f32, value.y as f32)
    }
}

impl From<Point> for (f64, f64) {
    fn from(value: Point) -> Self {
        (value.x, value.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from(value: (f64, f64)) -> Self {
        Point::new(value.0, value.1)
    }
}

impl From<Point2<f64>> for Point {
    fn from(value: Point2<f64>) -> Self {
        Point::new(value.x, value.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

/// Position and facing of a robot. Direction 0 faces +x; increasing direction turns towards +y.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Pose {
    pub position: Point,
    pub direction: Angle,
}

impl Pose {
    pub const fn new(position: Point, direction: Angle) -> Self {
        Self {
            position,
            direction,
        }
    }

    /// Maps a point from the body frame into arena coordinates.
    pub fn transform(&self, local: Point) -> Point {
        local.to_world(self.position, self.direction)
    }

    /// Ray angle of a heading given relative to the body frame. Rays use 0 along +y, so the
    /// body's forward axis maps to `π/2 - direction`.
    pub fn ray_angle(&self, relative: Angle) -> Angle {
        Angle::new(std::f64::consts::FRAC_PI_2) - self.direction - relative
    }
}

/// A line segment. Used both for obstacle edges and for rays.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Segment {
    p1: Point,
    p2: Point,
}

impl Segment {
    pub const fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    pub fn p1(&self) -> Point {
        self.p1
    }

    pub fn p2(&self) -> Point {
        self.p2
    }

    pub fn length(&self) -> f64 {
        self.p1.distance(self.p2)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Angle(f64);

impl Angle {
    pub const fn new(radians: f64) -> Self {
        Self(radians)
    }

    pub fn from_deg(degree: f64) -> Self {
        Self(degree * PI / 180.0)
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    /// Degrees normalized to `[0, 360)`.
    pub fn to_deg(self) -> f64 {
        (self.0 * (180.0 / PI)).rem_euclid(360.0)
    }

    /// Degrees without normalization, as stored in configuration documents.
    pub fn as_deg(self) -> f64 {
        self.0 * (180.0 / PI)
    }
}

impl Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Angle(-self.0)
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Angle {
    type Output = Angle;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl From<Angle> for f64 {
    fn from(value: Angle) -> Self {
        value.0
    }
}

impl From<Angle> for f32 {
    fn from(value: Angle) -> Self {
        value.0 as f32
    }
}

/// Euclidean distance between `(x1, y1)` and `(x2, y2)`.
pub fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use approx::{assert_abs_diff_eq, AbsDiffEq};
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_point() {
        let point = Point::new(1.0, 2.0);
        assert_abs_diff_eq!(point.x(), 1.0);
        assert_abs_diff_eq!(point.y(), 2.0);
    }

    #[rstest]
    #[case(1.0, 1.0)]
    #[case(-1.0, -1.0)]
    #[case(-1.0, 1.0)]
    #[case(1.0, -1.0)]
    fn test_distance_diagonal(#[case] x: f64, #[case] y: f64) {
        assert_eq!(distance(0.0, 0.0, x, y), 2.0_f64.sqrt());
    }

    #[rstest]
    #[case(Angle::new(0.0), 0.0)]
    #[case(Angle::new(0.5 * PI), 90.0)]
    #[case(Angle::new(1.0 * PI), 180.0)]
    #[case(Angle::new(1.5 * PI), 270.0)]
    #[case(Angle::new(2.0 * PI), 0.0)]
    #[case(Angle::new(-0.5 * PI), 270.0)]
    fn test_angle_to_deg(#[case] angle: Angle, #[case] expected: f64) {
        assert_abs_diff_eq!(angle.to_deg(), expected, epsilon = 1e-9);
    }

    #[rstest]
    #[case::forward(Point::new(10.0, 0.0), 0.0, Point::new(11.0, 2.0))]
    #[case::left(Point::new(0.0, 10.0), 0.0, Point::new(1.0, 12.0))]
    #[case::turned(Point::new(10.0, 0.0), FRAC_PI_2, Point::new(1.0, 12.0))]
    #[case::turned_back(Point::new(10.0, 0.0), PI, Point::new(-9.0, 2.0))]
    fn test_point_to_world(#[case] local: Point, #[case] direction: f64, #[case] world: Point) {
        let result = local.to_world(Point::new(1.0, 2.0), Angle::new(direction));
        assert_abs_diff_eq!(result, world, epsilon = 1e-9);
    }

    #[rstest]
    #[case::forward(0.0, 0.0)]
    #[case::turned(FRAC_PI_2, 0.0)]
    #[case::offset(0.3, 0.2)]
    fn test_pose_ray_angle_matches_forward_axis(#[case] direction: f64, #[case] relative: f64) {
        let pose = Pose::new(Point::new(3.0, 4.0), Angle::new(direction));
        let along_ray = pose
            .position
            .along_ray(pose.ray_angle(Angle::new(relative)), 1.0);
        let forward = pose.transform(Point::new(relative.cos(), relative.sin()));
        assert_abs_diff_eq!(along_ray, forward, epsilon = 1e-9);
    }

    #[rstest]
    #[case::down(0.0, Point::new(0.0, 5.0))]
    #[case::right(FRAC_PI_2, Point::new(5.0, 0.0))]
    #[case::up(PI, Point::new(0.0, -5.0))]
    fn test_point_along_ray(#[case] angle: f64, #[case] expected: Point) {
        let result = Point::default().along_ray(Angle::new(angle), 5.0);
        assert_abs_diff_eq!(result, expected, epsilon = 1e-9);
    }

    impl AbsDiffEq for Point {
        type Epsilon = f64;

        fn default_epsilon() -> f64 {
            f64::EPSILON
        }

        fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
            f64::abs_diff_eq(&self.x, &other.x, epsilon)
                && f64::abs_diff_eq(&self.y, &other.y, epsilon)
        }
    }

    impl AbsDiffEq for Angle {
        type Epsilon = f64;

        fn default_epsilon() -> f64 {
            f64::EPSILON
        }

        fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
            f64::abs_diff_eq(&self.0, &other.0, epsilon)
        }
    }
}
