//! Structured world descriptions.
//!
//! The types in here mirror the documents describing a world: its size, static boxes and walls,
//! light sources, and robots with their bodies and devices. They are plain `serde` types, so any
//! format with a `serde` implementation can be used to read or write them. Angles are given in
//! degrees.

use std::f64::consts::PI;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::{
    Angle, Body, BodyPart, Bulb, Camera, Color, Device, DeviceError, LightSensor, Motion, Point,
    Pose, RangeSensor, Robot, RobotError, World, WorldError,
};

static DEMO: Lazy<WorldConfig> = Lazy::new(|| {
    let boxes = [
        (Color::BLUE, (100.0, 0.0), (110.0, 110.0)),
        (Color::rgb(255, 165, 0), (200.0, 95.0), (210.0, 250.0)),
        (Color::YELLOW, (300.0, 0.0), (310.0, 110.0)),
        (Color::rgb(0, 255, 255), (400.0, 140.0), (500.0, 150.0)),
    ];
    WorldConfig {
        boxes: boxes
            .into_iter()
            .map(|(color, p1, p2)| BoxConfig {
                color,
                p1: p1.into(),
                p2: p2.into(),
            })
            .collect(),
        robots: vec![
            RobotConfig {
                name: "Red".to_string(),
                x: 50.0,
                y: 200.0,
                direction: 0.0,
                color: Color::RED,
                devices: vec![
                    DeviceConfig::RangeSensor(RangeSensorConfig::default()),
                    DeviceConfig::RangeSensor(RangeSensorConfig {
                        position: [10.0, -10.0],
                        ..RangeSensorConfig::default()
                    }),
                    DeviceConfig::Camera(CameraConfig::default()),
                ],
                ..RobotConfig::scribbler()
            },
            RobotConfig {
                name: "Blue".to_string(),
                x: 450.0,
                y: 50.0,
                direction: 180.0,
                color: Color::BLUE,
                devices: vec![DeviceConfig::Camera(CameraConfig::default())],
                ..RobotConfig::scribbler()
            },
        ],
        ..WorldConfig::default()
    }
});

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("world width and height are required")]
    MissingWorldDimensions,
    #[error("world dimensions must be positive, got {width}x{height}")]
    InvalidWorldDimensions { width: f64, height: f64 },
    #[error("invalid {kind} on robot {robot:?}: {source}")]
    InvalidDevice {
        robot: String,
        kind: &'static str,
        #[source]
        source: DeviceError,
    },
    #[error(transparent)]
    Robot(#[from] RobotError),
    #[error(transparent)]
    World(#[from] WorldError),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    pub time_step: f64,
    pub boundary_wall_color: Color,
    pub ground_color: Color,
    pub boxes: Vec<BoxConfig>,
    pub walls: Vec<WallConfig>,
    pub bulbs: Vec<Bulb>,
    pub robots: Vec<RobotConfig>,
}

impl WorldConfig {
    /// Arena with two Scribbler robots and four boxes.
    pub fn demo() -> &'static WorldConfig {
        &DEMO
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: Some(500.0),
            height: Some(250.0),
            time_step: 0.1,
            boundary_wall_color: Color::PURPLE,
            ground_color: Color::GREEN,
            boxes: vec![],
            walls: vec![],
            bulbs: vec![],
            robots: vec![],
        }
    }
}

/// Closed box spanned by two opposite corners.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxConfig {
    pub color: Color,
    pub p1: Point,
    pub p2: Point,
}

/// Single segment wall.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WallConfig {
    pub color: Color,
    pub p1: Point,
    pub p2: Point,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub direction: f64,
    pub va: f64,
    pub vx: f64,
    pub vy: f64,
    pub tva: f64,
    pub tvx: f64,
    pub tvy: f64,
    pub va_max: f64,
    pub vx_max: f64,
    pub vy_max: f64,
    pub va_ramp: f64,
    pub vx_ramp: f64,
    pub vy_ramp: f64,
    pub height: f64,
    pub color: Color,
    pub max_trace_length: usize,
    pub keep_trace_forever: bool,
    pub body: BodyConfig,
    pub devices: Vec<DeviceConfig>,
}

impl RobotConfig {
    pub fn scribbler() -> Self {
        Self {
            body: BodyConfig::from(&Body::scribbler()),
            ..Self::default()
        }
    }

    pub fn build(&self) -> Result<Robot, ConfigError> {
        let pose = Pose::new(Point::new(self.x, self.y), Angle::from_deg(self.direction));
        let mut robot = Robot::new(&self.name, pose, self.body.to_body());

        robot.recolor(self.color);
        robot.set_height(self.height)?;
        robot.set_max_speed(Motion::new(self.vx_max, self.vy_max, self.va_max));
        robot.set_ramp(Motion::new(self.vx_ramp, self.vy_ramp, self.va_ramp));
        robot.set_velocity(Motion::new(self.vx, self.vy, self.va));
        robot.set_target_velocity(Motion::new(self.tvx, self.tvy, self.tva));
        robot.set_max_trace_length(self.max_trace_length)?;
        robot.keep_trace_forever(self.keep_trace_forever);

        for device in &self.devices {
            match device.build(&self.name)? {
                Some(device) => {
                    robot.add_device(device);
                }
                None => warn!(robot = %self.name, "unknown device type skipped"),
            }
        }

        Ok(robot)
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            name: "Robbie".to_string(),
            x: 0.0,
            y: 0.0,
            direction: 0.0,
            va: 0.0,
            vx: 0.0,
            vy: 0.0,
            tva: 0.0,
            tvx: 0.0,
            tvy: 0.0,
            va_max: 0.9 * PI,
            vx_max: 2.0,
            vy_max: 2.0,
            va_ramp: 1.0,
            vx_ramp: 1.0,
            vy_ramp: 1.0,
            height: 0.25,
            color: Color::RED,
            max_trace_length: 1000,
            keep_trace_forever: false,
            body: BodyConfig::default(),
            devices: vec![],
        }
    }
}

impl From<&Robot> for RobotConfig {
    fn from(robot: &Robot) -> Self {
        let (velocity, target) = (robot.velocity(), robot.target_velocity());
        let (max_speed, ramp) = (robot.max_speed(), robot.ramp());
        Self {
            name: robot.name().to_string(),
            x: robot.position().x(),
            y: robot.position().y(),
            direction: robot.direction().as_deg(),
            va: velocity.va,
            vx: velocity.vx,
            vy: velocity.vy,
            tva: target.va,
            tvx: target.vx,
            tvy: target.vy,
            va_max: max_speed.va,
            vx_max: max_speed.vx,
            vy_max: max_speed.vy,
            va_ramp: ramp.va,
            vx_ramp: ramp.vx,
            vy_ramp: ramp.vy,
            height: robot.height(),
            color: robot.color(),
            max_trace_length: robot.max_trace_length(),
            keep_trace_forever: robot.keeps_trace_forever(),
            body: BodyConfig::from(robot.body()),
            devices: robot.devices().iter().map(DeviceConfig::from).collect(),
        }
    }
}

/// A body is either a flat list of polygon vertices or a list of shape primitives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BodyConfig {
    Vertices(Vec<[f64; 2]>),
    Parts(Vec<BodyPartConfig>),
}

impl BodyConfig {
    pub fn to_body(&self) -> Body {
        match self {
            BodyConfig::Vertices(vertices) if vertices.is_empty() => Body::default(),
            BodyConfig::Vertices(vertices) => Body::new(vec![BodyPart::Polygon {
                points: to_points(vertices),
                color: None,
            }]),
            BodyConfig::Parts(parts) => {
                Body::new(parts.iter().map(BodyPartConfig::to_part).collect())
            }
        }
    }
}

impl Default for BodyConfig {
    fn default() -> Self {
        BodyConfig::Vertices(vec![])
    }
}

impl From<&Body> for BodyConfig {
    fn from(body: &Body) -> Self {
        match body.parts() {
            [] => BodyConfig::default(),
            [BodyPart::Polygon {
                points,
                color: None,
            }] => BodyConfig::Vertices(from_points(points)),
            parts => BodyConfig::Parts(parts.iter().map(BodyPartConfig::from).collect()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BodyPartConfig {
    Polygon {
        points: Vec<[f64; 2]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<Color>,
    },
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<Color>,
    },
}

impl BodyPartConfig {
    fn to_part(&self) -> BodyPart {
        match self {
            BodyPartConfig::Polygon { points, color } => BodyPart::Polygon {
                points: to_points(points),
                color: *color,
            },
            BodyPartConfig::Rectangle {
                x,
                y,
                width,
                height,
                color,
            } => BodyPart::Rectangle {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
                color: *color,
            },
        }
    }
}

impl From<&BodyPart> for BodyPartConfig {
    fn from(part: &BodyPart) -> Self {
        match part {
            BodyPart::Polygon { points, color } => BodyPartConfig::Polygon {
                points: from_points(points),
                color: *color,
            },
            BodyPart::Rectangle {
                x,
                y,
                width,
                height,
                color,
            } => BodyPartConfig::Rectangle {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
                color: *color,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeviceConfig {
    RangeSensor(RangeSensorConfig),
    Camera(CameraConfig),
    LightSensor(LightSensorConfig),
    #[serde(other)]
    Unknown,
}

impl DeviceConfig {
    /// Builds the device, `None` for unknown device types.
    pub fn build(&self, robot: &str) -> Result<Option<Device>, ConfigError> {
        let invalid = |kind: &'static str| {
            move |source| ConfigError::InvalidDevice {
                robot: robot.to_string(),
                kind,
                source,
            }
        };

        let device: Device = match self {
            DeviceConfig::RangeSensor(config) => RangeSensor::new(
                config.position.into(),
                Angle::from_deg(config.direction),
                config.max,
                Angle::from_deg(config.width),
            )
            .map_err(invalid("range sensor"))?
            .into(),
            DeviceConfig::Camera(config) => {
                let field_of_view = Angle::from_deg(config.angle);
                let mut camera = Camera::new(config.width, config.height, field_of_view)
                    .map_err(invalid("camera"))?;
                camera
                    .set_fade(config.colors_fade_with_distance, config.size_fade_with_distance)
                    .map_err(invalid("camera"))?;
                camera.set_reflections(config.reflect_ground, config.reflect_sky);
                camera.set_max_range(config.max_range).map_err(invalid("camera"))?;
                camera.into()
            }
            DeviceConfig::LightSensor(config) => LightSensor::new(config.position.into()).into(),
            DeviceConfig::Unknown => return Ok(None),
        };
        Ok(Some(device))
    }
}

impl From<&Device> for DeviceConfig {
    fn from(device: &Device) -> Self {
        match device {
            Device::RangeSensor(sensor) => DeviceConfig::RangeSensor(RangeSensorConfig {
                position: sensor.position().into(),
                direction: sensor.direction().as_deg(),
                max: sensor.max_range(),
                width: sensor.width().as_deg(),
            }),
            Device::Camera(camera) => DeviceConfig::Camera(CameraConfig {
                width: camera.width(),
                height: camera.height(),
                colors_fade_with_distance: camera.color_fade(),
                size_fade_with_distance: camera.size_fade(),
                reflect_ground: camera.reflect_ground(),
                reflect_sky: camera.reflect_sky(),
                angle: camera.field_of_view().as_deg(),
                max_range: camera.max_range(),
            }),
            Device::LightSensor(sensor) => DeviceConfig::LightSensor(LightSensorConfig {
                position: sensor.position().into(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeSensorConfig {
    pub position: [f64; 2],
    pub direction: f64,
    pub max: f64,
    pub width: f64,
}

impl Default for RangeSensorConfig {
    fn default() -> Self {
        Self {
            position: [10.0, 10.0],
            direction: 0.0,
            max: 100.0,
            width: 1.0_f64.to_degrees(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    pub width: usize,
    pub height: usize,
    pub colors_fade_with_distance: f64,
    pub size_fade_with_distance: f64,
    pub reflect_ground: bool,
    pub reflect_sky: bool,
    pub angle: f64,
    pub max_range: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 256,
            height: 128,
            colors_fade_with_distance: 0.5,
            size_fade_with_distance: 1.0,
            reflect_ground: true,
            reflect_sky: false,
            angle: 60.0,
            max_range: 1000.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightSensorConfig {
    pub position: [f64; 2],
}

impl From<[f64; 2]> for Point {
    fn from(value: [f64; 2]) -> Self {
        Point::new(value[0], value[1])
    }
}

impl From<Point> for [f64; 2] {
    fn from(value: Point) -> Self {
        [value.x(), value.y()]
    }
}

fn to_points(vertices: &[[f64; 2]]) -> Vec<Point> {
    vertices.iter().map(|&v| v.into()).collect()
}

fn from_points(points: &[Point]) -> Vec<[f64; 2]> {
    points.iter().map(|&p| p.into()).collect()
}

impl World {
    /// Builds a world from its description. Missing dimensions are fatal, unknown device types
    /// are skipped.
    pub fn from_config(config: &WorldConfig) -> Result<Self, ConfigError> {
        let (Some(width), Some(height)) = (config.width, config.height) else {
            return Err(ConfigError::MissingWorldDimensions);
        };
        if !(width > 0.0 && height > 0.0) {
            return Err(ConfigError::InvalidWorldDimensions { width, height });
        }

        let mut world = World::with_colors(
            width,
            height,
            config.boundary_wall_color,
            config.ground_color,
        );
        world.set_time_step(config.time_step)?;

        for b in &config.boxes {
            world.add_obstacle(b.color, b.p1.x(), b.p1.y(), b.p2.x(), b.p2.y());
        }
        for w in &config.walls {
            world.add_wall(w.color, w.p1.x(), w.p1.y(), w.p2.x(), w.p2.y());
        }
        for bulb in &config.bulbs {
            world.add_bulb(*bulb);
        }
        for robot in &config.robots {
            world.add_robot(robot.build()?);
        }

        world.update();
        Ok(world)
    }

    /// Describes the current state of the world, such that [`World::from_config`] rebuilds an
    /// equivalent world.
    pub fn to_config(&self) -> WorldConfig {
        let mut boxes = vec![];
        let mut walls = vec![];
        for obstacle in self.environment().interior_obstacles() {
            if let Some((p1, p2)) = obstacle.box_corners() {
                boxes.push(BoxConfig {
                    color: obstacle.color(),
                    p1,
                    p2,
                });
            } else if let [segment] = obstacle.segments() {
                walls.push(WallConfig {
                    color: obstacle.color(),
                    p1: segment.p1(),
                    p2: segment.p2(),
                });
            }
        }

        WorldConfig {
            width: Some(self.width()),
            height: Some(self.height()),
            time_step: self.time_step(),
            boundary_wall_color: self.environment().boundary_color(),
            ground_color: self.ground_color(),
            boxes,
            walls,
            bulbs: self.bulbs().to_vec(),
            robots: self.robots().iter().map(RobotConfig::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::domain::PictureKind;

    fn parse(value: serde_json::Value) -> WorldConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_world_from_document() {
        let config = parse(json!({
            "width": 300,
            "height": 200,
            "boxes": [
                {"color": [0, 0, 255], "p1": {"x": 10, "y": 10}, "p2": {"x": 20, "y": 30}}
            ],
            "walls": [
                {"color": "black", "p1": {"x": 50, "y": 0}, "p2": {"x": 50, "y": 40}}
            ],
            "bulbs": [{"x": 150, "y": 100, "brightness": 2.0}],
            "robots": [{
                "name": "Scout",
                "x": 100, "y": 120, "direction": 90,
                "color": "#00FF00",
                "body": [[5, 5], [-5, 5], [-5, -5], [5, -5]],
                "devices": [
                    {"type": "RangeSensor", "max": 80, "width": 0},
                    {"type": "Camera", "width": 32, "height": 16, "angle": 45},
                    {"type": "LightSensor"}
                ]
            }]
        }));

        let world = World::from_config(&config).unwrap();

        assert_eq!((world.width(), world.height()), (300.0, 200.0));
        assert_eq!(world.environment().interior_obstacles().count(), 2);
        assert_eq!(world.bulbs().len(), 1);
        assert_eq!(world.bulbs()[0].color, Color::YELLOW);

        let robot = world.find("Scout").unwrap();
        assert_eq!(robot.color(), Color::rgb(0, 255, 0));
        assert_abs_diff_eq!(robot.direction().radians(), PI / 2.0, epsilon = 1e-12);
        assert_eq!(robot.body().extent(), (Point::new(-5.0, -5.0), Point::new(5.0, 5.0)));
        assert_eq!(robot.devices().len(), 3);

        let sensor = robot
            .device("rangesensor")
            .and_then(Device::as_range_sensor)
            .unwrap();
        assert_eq!(sensor.max_range(), 80.0);
        assert_eq!(sensor.width(), Angle::new(0.0));
        let camera = robot.device("camera").and_then(Device::as_camera).unwrap();
        assert_eq!((camera.width(), camera.height()), (32, 16));
        assert_abs_diff_eq!(camera.field_of_view().as_deg(), 45.0, epsilon = 1e-9);
        assert!(robot.device("lightsensor").is_some());
    }

    #[rstest]
    #[case::no_dimensions(json!({}))]
    #[case::no_height(json!({"width": 100}))]
    fn test_missing_world_dimensions(#[case] document: serde_json::Value) {
        assert_eq!(
            World::from_config(&parse(document)).unwrap_err(),
            ConfigError::MissingWorldDimensions
        );
    }

    #[test]
    fn test_invalid_configuration() {
        let negative_range = parse(json!({
            "width": 100, "height": 100,
            "robots": [{"name": "A", "devices": [{"type": "RangeSensor", "max": -5}]}]
        }));
        assert_eq!(
            World::from_config(&negative_range).unwrap_err(),
            ConfigError::InvalidDevice {
                robot: "A".to_string(),
                kind: "range sensor",
                source: DeviceError::InvalidMaxRange(-5.0),
            }
        );

        let zero_trace = parse(json!({
            "width": 100, "height": 100,
            "robots": [{"max_trace_length": 0}]
        }));
        assert_eq!(
            World::from_config(&zero_trace).unwrap_err(),
            ConfigError::Robot(RobotError::InvalidTraceLength)
        );

        let zero_time_step = parse(json!({"width": 100, "height": 100, "time_step": 0.0}));
        assert_eq!(
            World::from_config(&zero_time_step).unwrap_err(),
            ConfigError::World(WorldError::InvalidTimeStep(0.0))
        );
    }

    #[test]
    fn test_unknown_device_is_skipped() {
        let config = parse(json!({
            "width": 100, "height": 100,
            "robots": [{
                "x": 50, "y": 50,
                "devices": [{"type": "Sonar", "pings": 3}, {"type": "RangeSensor"}]
            }]
        }));

        let world = World::from_config(&config).unwrap();

        let robot = world.robot_at(0).unwrap();
        assert_eq!(robot.devices().len(), 1);
        assert!(robot.device("rangesensor-1").is_some());
    }

    #[test]
    fn test_body_parts() {
        let config: RobotConfig = serde_json::from_value(json!({
            "body": [
                {"type": "polygon", "points": [[0, 0], [8, 0], [0, 4]], "color": "blue"},
                {"type": "rectangle", "x": -6, "y": -2, "width": 4, "height": 9}
            ]
        }))
        .unwrap();

        let body = config.build().unwrap().body().clone();

        assert_eq!(body.parts().len(), 2);
        assert_eq!(body.parts()[0].color(), Some(Color::BLUE));
        assert_eq!(body.parts()[1].color(), None);
        assert_eq!(body.extent(), (Point::new(-6.0, -2.0), Point::new(8.0, 7.0)));
    }

    #[test]
    fn test_config_rebuilds_equivalent_world() {
        let mut config = WorldConfig::demo().clone();
        config.walls.push(WallConfig {
            color: Color::BLACK,
            p1: Point::new(0.0, 125.0),
            p2: Point::new(50.0, 125.0),
        });
        config.bulbs.push(Bulb::new(250.0, 125.0, 1.5));
        let mut world = World::from_config(&config).unwrap();
        for robot in ["robot-1", "robot-2"] {
            world.find_mut(robot).unwrap().move_by(1.0, 0.3);
        }
        world.run_steps(20, &mut crate::domain::StopCondition::Never).unwrap();

        let described = world.to_config();
        let rebuilt = World::from_config(&described).unwrap();

        assert_eq!(described.boxes, config.boxes);
        assert_eq!(described.walls, config.walls);
        assert_eq!(described.bulbs, config.bulbs);
        assert_eq!(rebuilt.environment().obstacles().len(), world.environment().obstacles().len());
        for (a, b) in rebuilt.robots().iter().zip(world.robots()) {
            assert_eq!(a.name(), b.name());
            assert_eq!(a.position(), b.position());
            assert_abs_diff_eq!(a.direction().radians(), b.direction().radians(), epsilon = 1e-9);
            assert_eq!(a.velocity(), b.velocity());
            assert_eq!(a.target_velocity(), b.target_velocity());
            assert_eq!(a.body(), b.body());
            assert_eq!(a.color(), b.color());
            assert_eq!(a.device_keys().collect::<Vec<_>>(), b.device_keys().collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_demo_world() {
        let mut world = World::from_config(WorldConfig::demo()).unwrap();
        let red = world.find("Red").and_then(|r| r.id()).unwrap();

        assert_eq!(world.robots().len(), 2);
        assert_eq!(world.environment().interior_obstacles().count(), 4);
        assert!(world.robots().iter().all(|r| !r.stalled()));

        let picture = world.take_picture(red, "camera", PictureKind::Color).unwrap();
        assert_eq!((picture.width(), picture.height()), (256, 128));
    }
}
