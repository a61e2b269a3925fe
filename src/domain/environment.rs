//! Environment with obstacles.
//!
//! The environment is the registry of everything a ray or a robot's bounding box can run into:
//! the four boundary walls, static boxes and walls, and one obstacle per robot tracking its
//! current bounding box.

use std::fmt;

use super::{
    collision::segment_intersection_point, Angle, BoundingBox, Color, HasCollision, Hit, Point,
    Segment,
};

/// Number of obstacles forming the arena boundary. They are always registered first.
const BOUNDARY_WALLS: usize = 4;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RobotId(u32);

impl RobotId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "robot#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Environment {
    width: f64,
    height: f64,
    obstacles: Vec<Obstacle>,
    /// Bumped on every change to the registered geometry.
    revision: u64,
}

impl Environment {
    pub fn new(width: f64, height: f64, boundary_color: Color) -> Self {
        let p1 = Point::new(0.0, 0.0);
        let p2 = Point::new(0.0, height);
        let p3 = Point::new(width, height);
        let p4 = Point::new(width, 0.0);
        Self {
            width,
            height,
            obstacles: vec![
                Obstacle::wall(boundary_color, p1, p2),
                Obstacle::wall(boundary_color, p2, p3),
                Obstacle::wall(boundary_color, p3, p4),
                Obstacle::wall(boundary_color, p4, p1),
            ],
            revision: 0,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Static obstacles added after the boundary walls.
    pub fn interior_obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles
            .iter()
            .skip(BOUNDARY_WALLS)
            .filter(|o| o.owner.is_none())
    }

    pub fn boundary_color(&self) -> Color {
        self.obstacles
            .first()
            .map(|o| o.color)
            .unwrap_or(Color::PURPLE)
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
        self.revision += 1;
    }

    pub fn robot_obstacle(&self, owner: RobotId) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.owner == Some(owner))
    }

    /// Moves the obstacle of `owner` to `bounding_box` and updates its look. Returns whether
    /// anything changed.
    pub fn sync_robot_obstacle(
        &mut self,
        owner: RobotId,
        color: Color,
        height: f64,
        bounding_box: &BoundingBox,
    ) -> bool {
        let Some(obstacle) = self.obstacles.iter_mut().find(|o| o.owner == Some(owner)) else {
            return false;
        };
        let segments = bounding_box.segments();
        if obstacle.color == color && obstacle.height == height && obstacle.segments == segments {
            return false;
        }
        obstacle.color = color;
        obstacle.height = height;
        obstacle.segments.clear();
        obstacle.segments.extend(segments);
        self.revision += 1;
        true
    }

    pub fn remove_robot_obstacle(&mut self, owner: RobotId) -> Option<Obstacle> {
        let idx = self.obstacles.iter().position(|o| o.owner == Some(owner))?;
        self.revision += 1;
        Some(self.obstacles.remove(idx))
    }

    /// Casts a ray from `origin` along `angle` (0 points along +y) up to `max_range` and returns
    /// every intersection, farthest first.
    ///
    /// Obstacles owned by `exclude` are ignored. Hits at equal distance keep the registration
    /// order of their obstacles, then the order of the segments within an obstacle.
    pub fn cast_ray(
        &self,
        origin: Point,
        angle: Angle,
        max_range: f64,
        exclude: Option<RobotId>,
    ) -> Vec<Hit> {
        let end = origin.along_ray(angle, max_range);

        let mut hits = self
            .obstacles
            .iter()
            .filter(|o| !o.is_owned_by(exclude))
            .flat_map(|o| {
                o.segments.iter().filter_map(move |s| {
                    segment_intersection_point(origin, end, s.p1(), s.p2())
                        .map(|point| Hit::new(point, origin, o.height, o.color, o.owner))
                })
            })
            .collect::<Vec<_>>();

        // Stable, so ties keep registration order.
        hits.sort_by(|a, b| b.distance().total_cmp(&a.distance()));
        hits
    }

    pub fn distance_to_next_obstacle(
        &self,
        origin: Point,
        angle: Angle,
        max_range: f64,
        exclude: Option<RobotId>,
    ) -> Option<f64> {
        self.cast_ray(origin, angle, max_range, exclude)
            .last()
            .map(Hit::distance)
    }

    pub fn has_collision(&self, object: &dyn HasCollision, exclude: Option<RobotId>) -> bool {
        self.obstacles
            .iter()
            .filter(|o| !o.is_owned_by(exclude))
            .any(|o| o.has_collision(object))
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x() >= 0.0 && point.x() <= self.width && point.y() >= 0.0 && point.y() <= self.height
    }
}

/// A colored group of segments blocking rays and robot movement.
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    color: Color,
    owner: Option<RobotId>,
    height: f64,
    segments: Vec<Segment>,
}

impl Obstacle {
    /// Single-segment wall.
    pub fn wall(color: Color, p1: Point, p2: Point) -> Self {
        Self {
            color,
            owner: None,
            height: 1.0,
            segments: vec![Segment::new(p1, p2)],
        }
    }

    /// Closed axis-aligned box spanned by two opposite corners.
    pub fn rectangle(color: Color, c1: Point, c2: Point) -> Self {
        let p1 = c1;
        let p2 = Point::new(c2.x(), c1.y());
        let p3 = c2;
        let p4 = Point::new(c1.x(), c2.y());
        Self {
            color,
            owner: None,
            height: 1.0,
            segments: vec![
                Segment::new(p1, p2),
                Segment::new(p2, p3),
                Segment::new(p3, p4),
                Segment::new(p4, p1),
            ],
        }
    }

    /// Bounding box of a robot.
    pub fn robot(owner: RobotId, color: Color, height: f64, bounding_box: &BoundingBox) -> Self {
        Self {
            color,
            owner: Some(owner),
            height,
            segments: bounding_box.segments().to_vec(),
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn owner(&self) -> Option<RobotId> {
        self.owner
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_owned_by(&self, robot: Option<RobotId>) -> bool {
        robot.is_some() && self.owner == robot
    }

    /// Opposite corners of a static box, `None` for anything else.
    pub fn box_corners(&self) -> Option<(Point, Point)> {
        match (self.owner, &self.segments[..]) {
            (None, [first, second, _, _]) => Some((first.p1(), second.p2())),
            _ => None,
        }
    }
}

impl HasCollision for Obstacle {
    fn edges(&self) -> &[Segment] {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn empty_environment() -> Environment {
        Environment::new(100.0, 100.0, Color::PURPLE)
    }

    #[test]
    fn test_environment_boundary() {
        let environment = empty_environment();
        assert_eq!(environment.obstacles().len(), 4);
        assert!(environment.obstacles().iter().all(|o| o.owner().is_none()));
        assert_eq!(environment.interior_obstacles().count(), 0);
        assert_eq!(environment.boundary_color(), Color::PURPLE);
    }

    #[rstest]
    #[case::down(0.0, 60.0)]
    #[case::right(FRAC_PI_2, 70.0)]
    #[case::up(PI, 40.0)]
    #[case::left(1.5 * PI, 30.0)]
    fn test_environment_distance_to_next_obstacle(#[case] angle: f64, #[case] expected: f64) {
        let environment = empty_environment();
        assert_abs_diff_eq!(
            environment
                .distance_to_next_obstacle(Point::new(30.0, 40.0), Angle::new(angle), 1000.0, None)
                .unwrap(),
            expected,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_cast_ray_single_wall() {
        let mut environment = Environment::new(1000.0, 1000.0, Color::PURPLE);
        environment.add_obstacle(Obstacle::wall(
            Color::RED,
            Point::new(100.0, 50.0),
            Point::new(100.0, 150.0),
        ));

        let hits = environment.cast_ray(Point::new(50.0, 100.0), Angle::new(FRAC_PI_2), 80.0, None);

        assert_eq!(hits.len(), 1);
        assert_abs_diff_eq!(hits[0].distance(), 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(hits[0].point(), Point::new(100.0, 100.0), epsilon = 1e-9);
        assert_eq!(hits[0].color(), Color::RED);
        assert_eq!(hits[0].height(), 1.0);
        assert_eq!(hits[0].owner(), None);
    }

    #[test]
    fn test_cast_ray_out_of_range() {
        let environment = empty_environment();
        let hits = environment.cast_ray(Point::new(50.0, 50.0), Angle::new(0.0), 10.0, None);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_cast_ray_farthest_first() {
        let mut environment = empty_environment();
        environment.add_obstacle(Obstacle::rectangle(
            Color::RED,
            Point::new(40.0, 40.0),
            Point::new(60.0, 60.0),
        ));

        let hits = environment.cast_ray(Point::new(50.0, 10.0), Angle::new(0.0), 1000.0, None);
        let distances = hits.iter().map(Hit::distance).collect::<Vec<_>>();

        assert_eq!(hits.len(), 3);
        assert_abs_diff_eq!(distances[0], 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(distances[1], 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(distances[2], 30.0, epsilon = 1e-9);
        assert_eq!(hits[2].color(), Color::RED);
    }

    #[test]
    fn test_cast_ray_tie_keeps_registration_order() {
        let mut environment = empty_environment();
        let segment = (Point::new(20.0, 60.0), Point::new(80.0, 60.0));
        environment.add_obstacle(Obstacle::wall(Color::RED, segment.0, segment.1));
        environment.add_obstacle(Obstacle::wall(Color::BLUE, segment.0, segment.1));

        let hits = environment.cast_ray(Point::new(50.0, 50.0), Angle::new(0.0), 30.0, None);

        assert_eq!(
            hits.iter().map(Hit::color).collect::<Vec<_>>(),
            vec![Color::RED, Color::BLUE]
        );
    }

    #[test]
    fn test_cast_ray_excludes_owner() {
        let mut environment = empty_environment();
        let id = RobotId::new(7);
        let bounding_box = BoundingBox::from_corners([
            Point::new(45.0, 45.0),
            Point::new(55.0, 45.0),
            Point::new(55.0, 55.0),
            Point::new(45.0, 55.0),
        ]);
        environment.add_obstacle(Obstacle::robot(id, Color::BLUE, 0.25, &bounding_box));

        let origin = Point::new(50.0, 20.0);
        let all = environment.cast_ray(origin, Angle::new(0.0), 1000.0, None);
        let others = environment.cast_ray(origin, Angle::new(0.0), 1000.0, Some(id));

        assert_eq!(all.len(), 3);
        assert_eq!(all.last().unwrap().owner(), Some(id));
        assert_abs_diff_eq!(all.last().unwrap().height(), 0.25);
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].owner(), None);
    }

    #[test]
    fn test_environment_has_collision() {
        let mut environment = empty_environment();
        let id = RobotId::new(1);
        let inside = BoundingBox::from_corners([
            Point::new(45.0, 45.0),
            Point::new(55.0, 45.0),
            Point::new(55.0, 55.0),
            Point::new(45.0, 55.0),
        ]);
        let crossing_boundary = BoundingBox::from_corners([
            Point::new(-5.0, 45.0),
            Point::new(5.0, 45.0),
            Point::new(5.0, 55.0),
            Point::new(-5.0, 55.0),
        ]);
        environment.add_obstacle(Obstacle::robot(id, Color::BLUE, 0.25, &inside));

        assert!(environment.has_collision(&crossing_boundary, Some(RobotId::new(2))));
        assert!(environment.has_collision(&inside, None));
        assert!(!environment.has_collision(&inside, Some(id)));
    }

    #[test]
    fn test_obstacle_rectangle_edges() {
        let obstacle =
            Obstacle::rectangle(Color::BLACK, Point::new(0.1, 0.2), Point::new(0.3, 0.4));

        assert_eq!(
            obstacle.segments(),
            &[
                Segment::new(Point::new(0.1, 0.2), Point::new(0.3, 0.2)),
                Segment::new(Point::new(0.3, 0.2), Point::new(0.3, 0.4)),
                Segment::new(Point::new(0.3, 0.4), Point::new(0.1, 0.4)),
                Segment::new(Point::new(0.1, 0.4), Point::new(0.1, 0.2)),
            ]
        );
        assert_eq!(
            obstacle.box_corners(),
            Some((Point::new(0.1, 0.2), Point::new(0.3, 0.4)))
        );
    }

    #[test]
    fn test_remove_robot_obstacle() {
        let mut environment = empty_environment();
        let id = RobotId::new(3);
        environment.add_obstacle(Obstacle::robot(id, Color::RED, 0.5, &BoundingBox::default()));

        assert!(environment.robot_obstacle(id).is_some());
        assert!(environment.remove_robot_obstacle(id).is_some());
        assert!(environment.robot_obstacle(id).is_none());
        assert!(environment.remove_robot_obstacle(id).is_none());
    }

    #[test]
    fn test_sync_robot_obstacle() {
        let mut environment = empty_environment();
        let id = RobotId::new(4);
        environment.add_obstacle(Obstacle::robot(id, Color::RED, 0.5, &BoundingBox::default()));
        let moved = BoundingBox::from_corners([
            Point::new(10.0, 10.0),
            Point::new(20.0, 10.0),
            Point::new(20.0, 20.0),
            Point::new(10.0, 20.0),
        ]);
        let revision = environment.revision();

        assert!(environment.sync_robot_obstacle(id, Color::BLUE, 0.5, &moved));
        assert_eq!(environment.revision(), revision + 1);
        let obstacle = environment.robot_obstacle(id).unwrap();
        assert_eq!(obstacle.color(), Color::BLUE);
        assert_eq!(obstacle.segments(), moved.segments());

        assert!(!environment.sync_robot_obstacle(id, Color::BLUE, 0.5, &moved));
        assert_eq!(environment.revision(), revision + 1);
        assert!(!environment.sync_robot_obstacle(RobotId::new(9), Color::BLUE, 0.5, &moved));
    }
}
