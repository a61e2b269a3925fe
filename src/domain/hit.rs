//! Result of a ray intersecting an obstacle.

use super::{Color, Point, RobotId};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    point: Point,
    origin: Point,
    distance: f64,
    height: f64,
    color: Color,
    owner: Option<RobotId>,
}

impl Hit {
    pub fn new(
        point: Point,
        origin: Point,
        height: f64,
        color: Color,
        owner: Option<RobotId>,
    ) -> Self {
        Self {
            point,
            origin,
            distance: point.distance(origin),
            height,
            color,
            owner,
        }
    }

    /// Impact point.
    pub fn point(&self) -> Point {
        self.point
    }

    /// Start of the ray that produced this hit.
    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// 1.0 for a full wall, the owning robot's height otherwise.
    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Robot owning the obstruction, `None` for static walls.
    pub fn owner(&self) -> Option<RobotId> {
        self.owner
    }

    pub fn is_wall(&self) -> bool {
        self.height >= 1.0
    }
}
