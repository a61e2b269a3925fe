//! Mobile robot with ramp-limited velocity control, a polygonal body and mounted devices.

use std::{
    collections::{BTreeMap, VecDeque},
    f64::consts::{FRAC_PI_2, PI},
};

use nalgebra::{Matrix2, Vector2};
use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::debug;

use super::{
    Angle, BoundingBox, Bulb, Color, Device, DrawCommand, Environment, Point, Pose, RobotId,
    SensorView, Stroke,
};

/// Half extent of the square used as bounding box for robots without a body.
const DEFAULT_HALF_EXTENT: f64 = 10.0;

const TRACE_COLOR: Color = Color::rgb(200, 200, 200);
const STALLED_COLOR: Color = Color::rgb(128, 128, 128);
const HOLE_COLOR: Color = Color::rgb(0, 64, 0);

/// Wheels as `(x, y, width, height)` rectangles in the body frame.
const WHEELS: [(f64, f64, f64, f64); 2] = [(-3.33, -7.67, 6.33, 1.67), (-3.33, 6.0, 6.33, 1.67)];

static SCRIBBLER: Lazy<Body> = Lazy::new(|| {
    Body::new(vec![BodyPart::Polygon {
        points: [
            (4.17, 5.0),
            (4.17, 6.67),
            (5.83, 5.83),
            (5.83, 5.0),
            (7.5, 5.0),
            (7.5, -5.0),
            (5.83, -5.0),
            (5.83, -5.83),
            (4.17, -6.67),
            (4.17, -5.0),
            (-4.17, -5.0),
            (-4.17, -6.67),
            (-5.83, -5.83),
            (-6.67, -5.0),
            (-7.5, -4.17),
            (-7.5, 4.17),
            (-6.67, 5.0),
            (-5.83, 5.83),
            (-4.17, 6.67),
            (-4.17, 5.0),
        ]
        .into_iter()
        .map(Point::from)
        .collect(),
        color: None,
    }])
});

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RobotError {
    #[error("trace length must be positive")]
    InvalidTraceLength,
    #[error("robot height must be within (0, 1], got {0}")]
    InvalidHeight(f64),
}

/// Velocities, or per-axis limits, along the three controlled axes: forward `vx`, lateral `vy`
/// and angular `va`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Motion {
    pub vx: f64,
    pub vy: f64,
    pub va: f64,
}

impl Motion {
    pub const fn new(vx: f64, vy: f64, va: f64) -> Self {
        Self { vx, vy, va }
    }
}

/// One shape primitive of a robot body, in the body frame. Without a color the part uses the
/// robot's color.
#[derive(Clone, Debug, PartialEq)]
pub enum BodyPart {
    Polygon {
        points: Vec<Point>,
        color: Option<Color>,
    },
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Option<Color>,
    },
}

impl BodyPart {
    pub fn vertices(&self) -> Vec<Point> {
        match self {
            BodyPart::Polygon { points, .. } => points.clone(),
            BodyPart::Rectangle {
                x,
                y,
                width,
                height,
                ..
            } => rectangle(*x, *y, *width, *height).to_vec(),
        }
    }

    pub fn color(&self) -> Option<Color> {
        match self {
            BodyPart::Polygon { color, .. } | BodyPart::Rectangle { color, .. } => *color,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Body {
    parts: Vec<BodyPart>,
}

impl Body {
    pub fn new(parts: Vec<BodyPart>) -> Self {
        Self { parts }
    }

    pub fn scribbler() -> Self {
        SCRIBBLER.clone()
    }

    pub fn parts(&self) -> &[BodyPart] {
        &self.parts
    }

    /// Minimum and maximum corner over all part vertices.
    pub fn extent(&self) -> (Point, Point) {
        let vertices = self.parts.iter().flat_map(BodyPart::vertices);
        let (min, max) = vertices.fold(
            (
                Point::new(f64::INFINITY, f64::INFINITY),
                Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            ),
            |(min, max), p| {
                (
                    Point::new(min.x().min(p.x()), min.y().min(p.y())),
                    Point::new(max.x().max(p.x()), max.y().max(p.y())),
                )
            },
        );
        if min.x() > max.x() {
            (
                Point::new(-DEFAULT_HALF_EXTENT, -DEFAULT_HALF_EXTENT),
                Point::new(DEFAULT_HALF_EXTENT, DEFAULT_HALF_EXTENT),
            )
        } else {
            (min, max)
        }
    }

    /// Largest distance of a bounding box corner from the body origin.
    pub fn bounding_radius(&self) -> f64 {
        let (min, max) = self.extent();
        [min, max, Point::new(min.x(), max.y()), Point::new(max.x(), min.y())]
            .into_iter()
            .map(|p| p.distance(Point::default()))
            .fold(0.0, f64::max)
    }

    pub fn bounding_box(&self, pose: Pose) -> BoundingBox {
        let (min, max) = self.extent();
        BoundingBox::from_corners([
            pose.transform(Point::new(max.x(), max.y())),
            pose.transform(Point::new(min.x(), max.y())),
            pose.transform(Point::new(min.x(), min.y())),
            pose.transform(Point::new(max.x(), min.y())),
        ])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Robot {
    id: Option<RobotId>,
    name: String,
    pose: Pose,
    velocity: Motion,
    target: Motion,
    max_speed: Motion,
    ramp: Motion,
    height: f64,
    color: Color,
    body: Body,
    bounding_box: BoundingBox,
    trace: VecDeque<(Point, Angle)>,
    max_trace_length: usize,
    keep_trace_forever: bool,
    stalled: bool,
    devices: Vec<Device>,
    device_index: BTreeMap<String, usize>,
}

impl Robot {
    pub fn new(name: impl Into<String>, pose: Pose, body: Body) -> Self {
        let bounding_box = body.bounding_box(pose);
        Self {
            id: None,
            name: name.into(),
            pose,
            velocity: Motion::default(),
            target: Motion::default(),
            max_speed: Motion::new(2.0, 2.0, 0.9 * PI),
            ramp: Motion::new(1.0, 1.0, 1.0),
            height: 0.25,
            color: Color::RED,
            body,
            bounding_box,
            trace: VecDeque::new(),
            max_trace_length: 1000,
            keep_trace_forever: false,
            stalled: false,
            devices: vec![],
            device_index: BTreeMap::new(),
        }
    }

    pub fn scribbler(name: impl Into<String>, x: f64, y: f64, direction: Angle) -> Self {
        Self::new(name, Pose::new(Point::new(x, y), direction), Body::scribbler())
    }

    pub fn id(&self) -> Option<RobotId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn position(&self) -> Point {
        self.pose.position
    }

    pub fn direction(&self) -> Angle {
        self.pose.direction
    }

    pub fn velocity(&self) -> Motion {
        self.velocity
    }

    pub fn target_velocity(&self) -> Motion {
        self.target
    }

    pub fn max_speed(&self) -> Motion {
        self.max_speed
    }

    /// Seconds needed to reach the maximum speed on each axis.
    pub fn ramp(&self) -> Motion {
        self.ramp
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub fn bounding_radius(&self) -> f64 {
        self.body.bounding_radius()
    }

    pub fn trace(&self) -> &VecDeque<(Point, Angle)> {
        &self.trace
    }

    pub fn max_trace_length(&self) -> usize {
        self.max_trace_length
    }

    pub fn keeps_trace_forever(&self) -> bool {
        self.keep_trace_forever
    }

    pub fn stalled(&self) -> bool {
        self.stalled
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Looks up a device by `"type"` (the first of its type) or `"type-N"` (1-based).
    pub fn device(&self, key: &str) -> Option<&Device> {
        let index = *self.device_index.get(&key.to_ascii_lowercase())?;
        self.devices.get(index)
    }

    pub fn device_mut(&mut self, key: &str) -> Option<&mut Device> {
        let index = *self.device_index.get(&key.to_ascii_lowercase())?;
        self.devices.get_mut(index)
    }

    pub fn device_at(&self, index: usize) -> Option<&Device> {
        self.devices.get(index)
    }

    pub fn device_keys(&self) -> impl Iterator<Item = &str> {
        self.device_index.keys().map(String::as_str)
    }

    /// Mounts a device and returns its `"type-N"` key.
    pub fn add_device(&mut self, device: impl Into<Device>) -> String {
        let device = device.into();
        let type_name = device.type_name();
        let ordinal = self
            .devices
            .iter()
            .filter(|d| d.type_name() == type_name)
            .count()
            + 1;
        let index = self.devices.len();
        let key = format!("{type_name}-{ordinal}");

        if ordinal == 1 {
            self.device_index.insert(type_name.to_string(), index);
        }
        self.device_index.insert(key.clone(), index);
        self.devices.push(device);
        key
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_height(&mut self, height: f64) -> Result<(), RobotError> {
        if !(height > 0.0 && height <= 1.0) {
            return Err(RobotError::InvalidHeight(height));
        }
        self.height = height;
        Ok(())
    }

    pub fn set_max_speed(&mut self, max_speed: Motion) {
        self.max_speed = max_speed;
    }

    pub fn set_ramp(&mut self, ramp: Motion) {
        self.ramp = ramp;
    }

    pub fn set_velocity(&mut self, velocity: Motion) {
        self.velocity = velocity;
    }

    pub fn set_target_velocity(&mut self, target: Motion) {
        self.target = target;
    }

    pub fn set_max_trace_length(&mut self, length: usize) -> Result<(), RobotError> {
        if length == 0 {
            return Err(RobotError::InvalidTraceLength);
        }
        self.max_trace_length = length;
        self.trim_trace();
        Ok(())
    }

    pub fn keep_trace_forever(&mut self, keep: bool) {
        self.keep_trace_forever = keep;
        self.trim_trace();
    }

    pub fn recolor(&mut self, color: Color) {
        self.color = color;
    }

    /// Places the robot, with `direction` in degrees. Clears the stall flag.
    pub fn set_pose(&mut self, x: f64, y: f64, direction: f64) {
        self.pose = Pose::new(Point::new(x, y), Angle::from_deg(direction));
        self.bounding_box = self.body.bounding_box(self.pose);
        self.stalled = false;
    }

    /// Sets target velocities from fractions of the maximum speed in `[-1, 1]`.
    pub fn move_by(&mut self, translate: f64, rotate: f64) {
        self.forward(translate);
        self.turn(rotate);
    }

    pub fn forward(&mut self, translate: f64) {
        self.target.vx = translate.clamp(-1.0, 1.0) * self.max_speed.vx;
    }

    pub fn backward(&mut self, translate: f64) {
        self.target.vx = -translate.clamp(-1.0, 1.0) * self.max_speed.vx;
    }

    pub fn reverse(&mut self) {
        self.target.vx = -self.target.vx;
    }

    pub fn turn(&mut self, rotate: f64) {
        self.target.va = rotate.clamp(-1.0, 1.0) * self.max_speed.va;
    }

    pub fn stop(&mut self) {
        self.target = Motion::default();
    }

    /// Advances the robot by `dt` seconds against the obstacles of `environment`.
    ///
    /// Velocities approach their targets within the ramp limits, then the pose is integrated
    /// using the current direction. The move is rejected when the bounding box at the proposed
    /// pose intersects any obstacle not owned by this robot. A rejected move stalls the robot and
    /// zeroes its velocity.
    pub fn step(&mut self, dt: f64, environment: &Environment) {
        let velocity = Motion::new(
            ramped(self.target.vx, self.velocity.vx, self.max_speed.vx, self.ramp.vx, dt),
            ramped(self.target.vy, self.velocity.vy, self.max_speed.vy, self.ramp.vy, dt),
            ramped(self.target.va, self.velocity.va, self.max_speed.va, self.ramp.va, dt),
        );
        let pose = self.proposed_pose(velocity, dt);
        let bounding_box = self.body.bounding_box(pose);

        self.stalled = environment.has_collision(&bounding_box, self.id);
        if self.stalled {
            debug!(
                robot = %self.name,
                x = pose.position.x(),
                y = pose.position.y(),
                "robot stalled"
            );
            self.velocity = Motion::default();
        } else {
            self.velocity = velocity;
            self.pose = pose;
            self.bounding_box = bounding_box;
            self.trace.push_back((pose.position, pose.direction));
            self.trim_trace();
        }

        for device in &mut self.devices {
            device.step(dt);
        }
    }

    /// Recomputes the bounding box from the committed pose and lets every device sense.
    pub fn refresh(&mut self, environment: &Environment, bulbs: &[Bulb]) {
        self.bounding_box = self.body.bounding_box(self.pose);
        let view = self.sensor_view(environment, bulbs);
        for device in &mut self.devices {
            device.refresh(&view);
        }
    }

    pub fn sensor_view<'a>(
        &self,
        environment: &'a Environment,
        bulbs: &'a [Bulb],
    ) -> SensorView<'a> {
        SensorView::new(environment, bulbs, self.pose, self.id)
    }

    pub fn draw(&self, commands: &mut Vec<DrawCommand>) {
        let trace_stroke = Stroke::new(TRACE_COLOR, 1.0);
        commands.extend(
            self.trace
                .iter()
                .zip(self.trace.iter().skip(1))
                .map(|((from, _), (to, _))| DrawCommand::Line {
                    from: *from,
                    to: *to,
                    stroke: trace_stroke,
                }),
        );

        for part in &self.body.parts {
            let (fill, stroke) = if self.stalled {
                (STALLED_COLOR, Some(Stroke::new(Color::WHITE, 1.0)))
            } else {
                (part.color().unwrap_or(self.color), None)
            };
            commands.push(DrawCommand::Polygon {
                points: self.to_world(part.vertices()),
                fill,
                stroke,
            });
        }

        for (x, y, width, height) in WHEELS {
            commands.push(DrawCommand::Polygon {
                points: self.to_world(rectangle(x, y, width, height).to_vec()),
                fill: Color::BLACK,
                stroke: None,
            });
        }

        commands.push(DrawCommand::Ellipse {
            center: self.pose.position,
            radius_x: 1.67,
            radius_y: 1.67,
            fill: HOLE_COLOR,
        });

        for device in &self.devices {
            device.draw(self.pose, commands);
        }

        commands.push(DrawCommand::Text {
            position: self.pose.position + Point::new(0.0, -self.bounding_radius() - 2.0),
            text: self.name.clone(),
            color: Color::WHITE,
        });
    }

    pub(crate) fn attach(&mut self, id: RobotId) {
        self.id = Some(id);
    }

    pub(crate) fn detach(&mut self) {
        self.id = None;
    }

    fn proposed_pose(&self, velocity: Motion, dt: f64) -> Pose {
        let g = FRAC_PI_2 - self.pose.direction.radians();
        let rotation = Matrix2::new(g.sin(), g.cos(), g.cos(), -g.sin());
        let delta = rotation * Vector2::new(velocity.vx, velocity.vy) * dt;
        Pose::new(
            self.pose.position + Point::new(delta.x, delta.y),
            self.pose.direction - Angle::new(velocity.va * dt),
        )
    }

    fn to_world(&self, points: Vec<Point>) -> Vec<Point> {
        points.into_iter().map(|p| self.pose.transform(p)).collect()
    }

    fn trim_trace(&mut self) {
        if self.keep_trace_forever {
            return;
        }
        while self.trace.len() > self.max_trace_length {
            self.trace.pop_front();
        }
    }
}

/// Velocity after one step of at most `max / (ramp / dt)` change towards `target`.
fn ramped(target: f64, current: f64, max: f64, ramp: f64, dt: f64) -> f64 {
    let limit = if ramp > 0.0 {
        max.abs() / (ramp / dt)
    } else {
        f64::INFINITY
    };
    current + (target - current).clamp(-limit, limit)
}

fn rectangle(x: f64, y: f64, width: f64, height: f64) -> [Point; 4] {
    [
        Point::new(x, y),
        Point::new(x + width, y),
        Point::new(x + width, y + height),
        Point::new(x, y + height),
    ]
}
