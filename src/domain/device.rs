//! Sensing devices mounted on robots.
//!
//! Every device is built on the ray caster of the [`Environment`] and the pose of the robot it
//! is mounted on. Devices receive both through a [`SensorView`] whenever they sense.

mod camera;
mod light_sensor;
mod range_sensor;

pub use camera::{Camera, PictureKind, PixelGrid};
pub use light_sensor::{Bulb, LightSensor};
pub use range_sensor::RangeSensor;

use thiserror::Error;

use super::{Angle, DrawCommand, Environment, Hit, Point, Pose, RobotId};

/// Read-only view of the world from the robot carrying a device.
#[derive(Clone, Copy, Debug)]
pub struct SensorView<'a> {
    pub environment: &'a Environment,
    pub bulbs: &'a [Bulb],
    pub pose: Pose,
    pub owner: Option<RobotId>,
}

impl<'a> SensorView<'a> {
    pub fn new(
        environment: &'a Environment,
        bulbs: &'a [Bulb],
        pose: Pose,
        owner: Option<RobotId>,
    ) -> Self {
        Self {
            environment,
            bulbs,
            pose,
            owner,
        }
    }

    /// Casts a ray that never hits the robot carrying the device.
    pub fn cast_ray(&self, origin: Point, angle: Angle, max_range: f64) -> Vec<Hit> {
        self.environment
            .cast_ray(origin, angle, max_range, self.owner)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("maximum range must be finite and non-negative, got {0}")]
    InvalidMaxRange(f64),
    #[error("invalid camera resolution {width}x{height}")]
    InvalidResolution { width: usize, height: usize },
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },
}

pub(crate) fn validate_max_range(max_range: f64) -> Result<f64, DeviceError> {
    if max_range.is_finite() && max_range >= 0.0 {
        Ok(max_range)
    } else {
        Err(DeviceError::InvalidMaxRange(max_range))
    }
}

pub(crate) fn validate_unit(name: &'static str, value: f64) -> Result<f64, DeviceError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DeviceError::OutOfUnitRange { name, value })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Device {
    RangeSensor(RangeSensor),
    Camera(Camera),
    LightSensor(LightSensor),
}

impl Device {
    /// Lower-case type name used as lookup key on a robot.
    pub fn type_name(&self) -> &'static str {
        match self {
            Device::RangeSensor(_) => "rangesensor",
            Device::Camera(_) => "camera",
            Device::LightSensor(_) => "lightsensor",
        }
    }

    pub fn step(&mut self, dt: f64) {
        match self {
            Device::RangeSensor(d) => d.step(dt),
            Device::Camera(d) => d.step(dt),
            Device::LightSensor(d) => d.step(dt),
        }
    }

    pub fn refresh(&mut self, view: &SensorView) {
        match self {
            Device::RangeSensor(d) => d.refresh(view),
            Device::Camera(d) => d.refresh(view),
            Device::LightSensor(d) => d.refresh(view),
        }
    }

    pub fn draw(&self, pose: Pose, commands: &mut Vec<DrawCommand>) {
        match self {
            Device::RangeSensor(d) => d.draw(pose, commands),
            Device::Camera(d) => d.draw(pose, commands),
            Device::LightSensor(d) => d.draw(pose, commands),
        }
    }

    pub fn as_range_sensor(&self) -> Option<&RangeSensor> {
        match self {
            Device::RangeSensor(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_camera(&self) -> Option<&Camera> {
        match self {
            Device::Camera(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_camera_mut(&mut self) -> Option<&mut Camera> {
        match self {
            Device::Camera(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_light_sensor(&self) -> Option<&LightSensor> {
        match self {
            Device::LightSensor(d) => Some(d),
            _ => None,
        }
    }
}

impl From<RangeSensor> for Device {
    fn from(value: RangeSensor) -> Self {
        Device::RangeSensor(value)
    }
}

impl From<Camera> for Device {
    fn from(value: Camera) -> Self {
        Device::Camera(value)
    }
}

impl From<LightSensor> for Device {
    fn from(value: LightSensor) -> Self {
        Device::LightSensor(value)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0.0, true)]
    #[case(100.0, true)]
    #[case(-1.0, false)]
    #[case(f64::NAN, false)]
    #[case(f64::INFINITY, false)]
    fn test_validate_max_range(#[case] max_range: f64, #[case] valid: bool) {
        assert_eq!(validate_max_range(max_range).is_ok(), valid);
    }

    #[test]
    fn test_device_type_names() {
        let range_sensor: Device = RangeSensor::default().into();
        let camera: Device = Camera::default().into();
        let light_sensor: Device = LightSensor::default().into();

        assert_eq!(range_sensor.type_name(), "rangesensor");
        assert_eq!(camera.type_name(), "camera");
        assert_eq!(light_sensor.type_name(), "lightsensor");
        assert!(range_sensor.as_range_sensor().is_some());
        assert!(range_sensor.as_camera().is_none());
        assert!(camera.as_camera().is_some());
        assert!(light_sensor.as_light_sensor().is_some());
    }
}
