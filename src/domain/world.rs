//! World owning the obstacle registry, the robots and the light sources.
//!
//! Robots are stepped in the order they were added. Each robot's obstacle is updated right
//! after its own step, so robots later in the list see the new bounding boxes of earlier robots
//! within the same step.
//!
//! Robots handed out by [`World::robot_mut`] can be changed behind the registry's back. Their
//! obstacles are brought up to date before the next step, update or picture.

use std::{
    f64::consts::TAU,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use rand::{
    distr::{Distribution, Uniform},
    Rng,
};
use thiserror::Error;
use tracing::{debug, trace};

use super::{
    collision::distance_point_to_segment, Angle, Bulb, Color, DrawCommand, Environment,
    Obstacle, PictureKind, PixelGrid, Point, Pose, Robot, RobotId, Stroke,
};

/// Number of random poses tried before placement gives up.
const PLACEMENT_ATTEMPTS: usize = 1000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    #[error("time step must be finite and positive, got {0}")]
    InvalidTimeStep(f64),
    #[error("{0} is not part of this world")]
    RobotNotFound(RobotId),
    #[error("no free place found for {0}")]
    NoFreePlacement(RobotId),
}

/// Decides after every step of a run whether the run halts.
pub enum StopCondition {
    Never,
    World(Box<dyn FnMut(&World) -> bool>),
    /// The n-th function is applied to the n-th robot. Any `true` halts the run.
    PerRobot(Vec<Box<dyn FnMut(&Robot) -> bool>>),
}

impl StopCondition {
    pub fn world(f: impl FnMut(&World) -> bool + 'static) -> Self {
        StopCondition::World(Box::new(f))
    }

    fn is_met(&mut self, world: &World) -> bool {
        match self {
            StopCondition::Never => false,
            StopCondition::World(f) => f(world),
            StopCondition::PerRobot(fs) => fs
                .iter_mut()
                .zip(&world.robots)
                .fold(false, |met, (f, robot)| f(robot) || met),
        }
    }
}

impl fmt::Debug for StopCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopCondition::Never => write!(f, "Never"),
            StopCondition::World(_) => write!(f, "World(..)"),
            StopCondition::PerRobot(fs) => write!(f, "PerRobot({} functions)", fs.len()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Completed steps.
    pub steps: usize,
    /// World time at the end of the run.
    pub time: f64,
    /// The stop flag was raised.
    pub interrupted: bool,
    /// The stop condition was met.
    pub halted: bool,
}

#[derive(Debug)]
pub struct World {
    environment: Environment,
    robots: Vec<Robot>,
    bulbs: Vec<Bulb>,
    time: f64,
    time_step: f64,
    ground_color: Color,
    next_id: u32,
    stop: Arc<AtomicBool>,
}

impl World {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_colors(width, height, Color::PURPLE, Color::GREEN)
    }

    pub fn with_colors(width: f64, height: f64, boundary: Color, ground: Color) -> Self {
        Self {
            environment: Environment::new(width, height, boundary),
            robots: vec![],
            bulbs: vec![],
            time: 0.0,
            time_step: 0.1,
            ground_color: ground,
            next_id: 1,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn width(&self) -> f64 {
        self.environment.width()
    }

    pub fn height(&self) -> f64 {
        self.environment.height()
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn ground_color(&self) -> Color {
        self.ground_color
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn bulbs(&self) -> &[Bulb] {
        &self.bulbs
    }

    pub fn set_time_step(&mut self, time_step: f64) -> Result<(), WorldError> {
        self.time_step = validate_time_step(time_step)?;
        Ok(())
    }

    /// Flag checked between the steps of a run. Raising it ends the run before the next step.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn add_robot(&mut self, mut robot: Robot) -> RobotId {
        let id = RobotId::new(self.next_id);
        self.next_id += 1;

        robot.attach(id);
        self.environment.add_obstacle(Obstacle::robot(
            id,
            robot.color(),
            robot.height(),
            robot.bounding_box(),
        ));
        robot.refresh(&self.environment, &self.bulbs);
        debug!(robot = %robot.name(), %id, "robot added");
        self.robots.push(robot);
        id
    }

    pub fn remove_robot(&mut self, id: RobotId) -> Option<Robot> {
        let index = self.robots.iter().position(|r| r.id() == Some(id))?;
        let mut robot = self.robots.remove(index);
        self.environment.remove_robot_obstacle(id);
        robot.detach();
        debug!(robot = %robot.name(), %id, "robot removed");
        Some(robot)
    }

    /// Adds a closed box spanned by two opposite corners.
    pub fn add_obstacle(&mut self, color: Color, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.environment.add_obstacle(Obstacle::rectangle(
            color,
            Point::new(x1, y1),
            Point::new(x2, y2),
        ));
    }

    /// Adds a single segment wall.
    pub fn add_wall(&mut self, color: Color, x1: f64, y1: f64, x2: f64, y2: f64) {
        self.environment
            .add_obstacle(Obstacle::wall(color, Point::new(x1, y1), Point::new(x2, y2)));
    }

    pub fn add_bulb(&mut self, bulb: Bulb) {
        self.bulbs.push(bulb);
    }

    pub fn robot(&self, id: RobotId) -> Option<&Robot> {
        self.robots.iter().find(|r| r.id() == Some(id))
    }

    pub fn robot_mut(&mut self, id: RobotId) -> Option<&mut Robot> {
        self.robots.iter_mut().find(|r| r.id() == Some(id))
    }

    /// Places robot `id`, with `direction` in degrees, and lets its devices sense from there.
    pub fn set_pose(
        &mut self,
        id: RobotId,
        x: f64,
        y: f64,
        direction: f64,
    ) -> Result<Pose, WorldError> {
        let robot = self
            .robots
            .iter_mut()
            .find(|r| r.id() == Some(id))
            .ok_or(WorldError::RobotNotFound(id))?;
        robot.set_pose(x, y, direction);
        sync_obstacle(&mut self.environment, robot);
        robot.refresh(&self.environment, &self.bulbs);
        Ok(robot.pose())
    }

    pub fn recolor(&mut self, id: RobotId, color: Color) -> Result<(), WorldError> {
        let robot = self
            .robots
            .iter_mut()
            .find(|r| r.id() == Some(id))
            .ok_or(WorldError::RobotNotFound(id))?;
        robot.recolor(color);
        sync_obstacle(&mut self.environment, robot);
        Ok(())
    }

    pub fn robot_at(&self, index: usize) -> Option<&Robot> {
        self.robots.get(index)
    }

    /// Looks up a robot by `"robot-N"` (1-based position) or by name.
    pub fn find(&self, key: &str) -> Option<&Robot> {
        self.find_index(key).and_then(|i| self.robots.get(i))
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut Robot> {
        self.find_index(key).and_then(|i| self.robots.get_mut(i))
    }

    fn find_index(&self, key: &str) -> Option<usize> {
        let ordinal = key
            .strip_prefix("robot-")
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|&n| n >= 1);
        match ordinal {
            Some(n) => (n <= self.robots.len()).then(|| n - 1),
            None => self.robots.iter().position(|r| r.name() == key),
        }
    }

    /// Advances every robot by `dt` seconds, then lets every device sense the new state.
    pub fn step(&mut self, dt: f64) -> Result<(), WorldError> {
        let dt = validate_time_step(dt)?;

        self.sync_obstacles();
        for robot in &mut self.robots {
            robot.step(dt, &self.environment);
            sync_obstacle(&mut self.environment, robot);
        }
        self.time += dt;
        trace!(time = self.time, "world stepped");

        self.update();
        Ok(())
    }

    /// Re-synchronizes the robot obstacles, then refreshes every device.
    pub fn update(&mut self) {
        self.sync_obstacles();
        for robot in &mut self.robots {
            robot.refresh(&self.environment, &self.bulbs);
        }
    }

    fn sync_obstacles(&mut self) {
        for robot in &self.robots {
            sync_obstacle(&mut self.environment, robot);
        }
    }

    pub fn run_steps(
        &mut self,
        steps: usize,
        condition: &mut StopCondition,
    ) -> Result<RunSummary, WorldError> {
        let dt = validate_time_step(self.time_step)?;
        let mut summary = RunSummary::default();

        for _ in 0..steps {
            if self.stop.swap(false, Ordering::SeqCst) {
                debug!(time = self.time, "run interrupted");
                summary.interrupted = true;
                break;
            }
            self.step(dt)?;
            summary.steps += 1;
            if condition.is_met(self) {
                debug!(time = self.time, "run halted by stop condition");
                summary.halted = true;
                break;
            }
        }

        summary.time = self.time;
        Ok(summary)
    }

    pub fn run_seconds(
        &mut self,
        seconds: f64,
        condition: &mut StopCondition,
    ) -> Result<RunSummary, WorldError> {
        let dt = validate_time_step(self.time_step)?;
        let steps = (seconds / dt).round().max(0.0) as usize;
        self.run_steps(steps, condition)
    }

    /// Takes a picture with the camera mounted under `key` on robot `id`.
    pub fn take_picture(&mut self, id: RobotId, key: &str, kind: PictureKind) -> Option<PixelGrid> {
        self.sync_obstacles();
        let robot = self.robots.iter_mut().find(|r| r.id() == Some(id))?;
        let view = robot.sensor_view(&self.environment, &self.bulbs);
        let camera = robot.device_mut(key)?.as_camera_mut()?;
        Some(camera.take_picture(&view, kind))
    }

    pub fn point_cloud(&mut self, id: RobotId, key: &str) -> Option<Vec<[u32; 6]>> {
        self.sync_obstacles();
        let robot = self.robots.iter_mut().find(|r| r.id() == Some(id))?;
        let view = robot.sensor_view(&self.environment, &self.bulbs);
        let camera = robot.device_mut(key)?.as_camera_mut()?;
        Some(camera.point_cloud(&view))
    }

    /// Moves robot `id` to a random pose at which its bounding circle keeps clear of every
    /// other obstacle.
    pub fn place_robot_randomly(
        &mut self,
        id: RobotId,
        rng: &mut impl Rng,
    ) -> Result<Pose, WorldError> {
        let radius = self
            .robot(id)
            .ok_or(WorldError::RobotNotFound(id))?
            .bounding_radius();

        let x = Uniform::try_from(radius..self.width() - radius)
            .map_err(|_| WorldError::NoFreePlacement(id))?;
        let y = Uniform::try_from(radius..self.height() - radius)
            .map_err(|_| WorldError::NoFreePlacement(id))?;
        let direction = Uniform::try_from(0.0..TAU).map_err(|_| WorldError::NoFreePlacement(id))?;

        for _ in 0..PLACEMENT_ATTEMPTS {
            let position = Point::new(x.sample(rng), y.sample(rng));
            let direction = Angle::new(direction.sample(rng));

            let free = self
                .environment
                .obstacles()
                .iter()
                .filter(|o| !o.is_owned_by(Some(id)))
                .flat_map(|o| o.segments())
                .all(|s| distance_point_to_segment(position, s).0 > radius);

            if free {
                return self.set_pose(id, position.x(), position.y(), direction.as_deg());
            }
        }

        Err(WorldError::NoFreePlacement(id))
    }

    /// Describes the whole scene as an ordered list of draw commands.
    pub fn draw(&self) -> Vec<DrawCommand> {
        let mut commands = vec![
            DrawCommand::Clear {
                color: Color::WHITE,
            },
            DrawCommand::Rectangle {
                corner: Point::default(),
                width: self.width(),
                height: self.height(),
                fill: self.ground_color,
            },
        ];

        for obstacle in self.environment.interior_obstacles() {
            if obstacle.segments().len() > 1 {
                commands.push(DrawCommand::Polygon {
                    points: obstacle.segments().iter().map(|s| s.p1()).collect(),
                    fill: obstacle.color(),
                    stroke: None,
                });
            }
        }

        for obstacle in self.environment.obstacles() {
            if let [segment] = obstacle.segments() {
                commands.push(DrawCommand::Line {
                    from: segment.p1(),
                    to: segment.p2(),
                    stroke: Stroke::new(obstacle.color(), 3.0),
                });
            }
        }

        for robot in &self.robots {
            robot.draw(&mut commands);
        }

        commands
    }
}

fn sync_obstacle(environment: &mut Environment, robot: &Robot) {
    if let Some(id) = robot.id() {
        environment.sync_robot_obstacle(id, robot.color(), robot.height(), robot.bounding_box());
    }
}

fn validate_time_step(dt: f64) -> Result<f64, WorldError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(dt)
    } else {
        Err(WorldError::InvalidTimeStep(dt))
    }
}
