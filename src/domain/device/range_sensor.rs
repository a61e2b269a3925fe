//! Ray-cast distance sensor.

use super::{validate_max_range, DeviceError, SensorView};
use crate::domain::{Angle, Color, DrawCommand, Point, Pose, Stroke};

const CONE_FILL: Color = Color::rgba(128, 0, 128, 64);

/// Distance sensor mounted at a fixed offset of a robot.
///
/// The sensor casts one ray along its heading when `width` is zero, and three rays spanning
/// `±width / 2` otherwise. It keeps the nearest hit of all rays. Without any hit in range the
/// reading stays at `1.0` and the distance at `max_range`.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeSensor {
    position: Point,
    direction: Angle,
    max_range: f64,
    width: Angle,
    reading: f64,
    distance: f64,
}

impl RangeSensor {
    pub fn new(
        position: Point,
        direction: Angle,
        max_range: f64,
        width: Angle,
    ) -> Result<Self, DeviceError> {
        let max_range = validate_max_range(max_range)?;
        Ok(Self {
            position,
            direction,
            max_range,
            width,
            reading: 1.0,
            distance: max_range,
        })
    }

    /// Mounting offset in the robot's body frame.
    pub fn position(&self) -> Point {
        self.position
    }

    /// Heading relative to the robot's forward axis.
    pub fn direction(&self) -> Angle {
        self.direction
    }

    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    pub fn width(&self) -> Angle {
        self.width
    }

    /// `distance / max_range`, in `[0, 1]`.
    pub fn reading(&self) -> f64 {
        self.reading
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn set_max_range(&mut self, max_range: f64) -> Result<(), DeviceError> {
        self.max_range = validate_max_range(max_range)?;
        self.set_reading(1.0);
        Ok(())
    }

    pub fn step(&mut self, _dt: f64) {}

    pub fn refresh(&mut self, view: &SensorView) {
        let anchor = view.pose.transform(self.position);
        self.set_reading(1.0);

        for offset in self.ray_offsets() {
            let angle = view.pose.ray_angle(self.direction + offset);
            if let Some(nearest) = view.cast_ray(anchor, angle, self.max_range).last() {
                if nearest.distance() < self.distance {
                    self.set_distance(nearest.distance());
                }
            }
        }
    }

    pub fn draw(&self, pose: Pose, commands: &mut Vec<DrawCommand>) {
        let detected = self.reading < 1.0;
        let anchor = pose.transform(self.position);

        if self.width.radians() > 0.0 {
            let stroke = Stroke::new(if detected { Color::WHITE } else { Color::BLACK }, 1.0);
            let steps = 8;
            let start = self.direction.radians() - self.width.radians() / 2.0;
            let mut points = vec![anchor];
            points.extend((0..=steps).map(|i| {
                let a = start + self.width.radians() * i as f64 / steps as f64;
                pose.transform(self.position + Point::new(a.cos(), a.sin()) * self.distance)
            }));
            commands.push(DrawCommand::Polygon {
                points,
                fill: CONE_FILL,
                stroke: Some(stroke),
            });
        } else {
            let color = if detected { Color::WHITE } else { CONE_FILL };
            let a = self.direction.radians();
            commands.push(DrawCommand::Line {
                from: anchor,
                to: pose.transform(self.position + Point::new(a.cos(), a.sin()) * self.distance),
                stroke: Stroke::new(color, 1.0),
            });
        }
    }

    fn ray_offsets(&self) -> Vec<Angle> {
        let half = self.width.radians() / 2.0;
        if half == 0.0 {
            vec![Angle::new(0.0)]
        } else {
            vec![Angle::new(-half), Angle::new(0.0), Angle::new(half)]
        }
    }

    fn set_distance(&mut self, distance: f64) {
        self.distance = distance;
        self.reading = if self.max_range > 0.0 {
            distance / self.max_range
        } else {
            0.0
        };
    }

    fn set_reading(&mut self, reading: f64) {
        self.reading = reading;
        self.distance = reading * self.max_range;
    }
}

impl Default for RangeSensor {
    fn default() -> Self {
        Self {
            position: Point::new(10.0, 10.0),
            direction: Angle::new(0.0),
            max_range: 100.0,
            width: Angle::new(1.0),
            reading: 1.0,
            distance: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;
    use crate::domain::{Environment, Obstacle, RobotId};

    fn facing_wall_at(distance: f64) -> Environment {
        let mut environment = Environment::new(1000.0, 1000.0, Color::PURPLE);
        environment.add_obstacle(Obstacle::wall(
            Color::RED,
            Point::new(100.0 + distance, 0.0),
            Point::new(100.0 + distance, 1000.0),
        ));
        environment
    }

    fn sensor(width: f64) -> RangeSensor {
        RangeSensor::new(Point::new(0.0, 0.0), Angle::new(0.0), 100.0, Angle::new(width)).unwrap()
    }

    #[rstest]
    #[case::single_ray(0.0)]
    #[case::cone(0.2)]
    fn test_range_sensor_without_obstacle(#[case] width: f64) {
        let environment = facing_wall_at(500.0);
        let mut sensor = sensor(width);
        let view = SensorView::new(
            &environment,
            &[],
            Pose::new(Point::new(100.0, 500.0), Angle::new(0.0)),
            None,
        );

        sensor.refresh(&view);

        assert_abs_diff_eq!(sensor.reading(), 1.0);
        assert_abs_diff_eq!(sensor.distance(), 100.0);
    }

    #[rstest]
    #[case::single_ray(0.0)]
    #[case::cone(0.2)]
    fn test_range_sensor_half_range(#[case] width: f64) {
        let environment = facing_wall_at(50.0);
        let mut sensor = sensor(width);
        let view = SensorView::new(
            &environment,
            &[],
            Pose::new(Point::new(100.0, 500.0), Angle::new(0.0)),
            None,
        );

        sensor.refresh(&view);

        assert_abs_diff_eq!(sensor.reading(), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(sensor.distance(), 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_range_sensor_follows_robot_direction() {
        let mut environment = Environment::new(1000.0, 1000.0, Color::PURPLE);
        environment.add_obstacle(Obstacle::wall(
            Color::RED,
            Point::new(0.0, 530.0),
            Point::new(1000.0, 530.0),
        ));
        let mut sensor = sensor(0.0);
        let view = SensorView::new(
            &environment,
            &[],
            Pose::new(Point::new(100.0, 500.0), Angle::new(FRAC_PI_2)),
            None,
        );

        sensor.refresh(&view);

        assert_abs_diff_eq!(sensor.distance(), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_range_sensor_ignores_owner() {
        use crate::domain::BoundingBox;

        let mut environment = facing_wall_at(500.0);
        let id = RobotId::new(1);
        environment.add_obstacle(Obstacle::robot(
            id,
            Color::BLUE,
            0.25,
            &BoundingBox::from_corners([
                Point::new(110.0, 490.0),
                Point::new(120.0, 490.0),
                Point::new(120.0, 510.0),
                Point::new(110.0, 510.0),
            ]),
        ));
        let pose = Pose::new(Point::new(100.0, 500.0), Angle::new(0.0));
        let mut sensor = sensor(0.0);

        sensor.refresh(&SensorView::new(&environment, &[], pose, Some(id)));
        assert_abs_diff_eq!(sensor.reading(), 1.0);

        sensor.refresh(&SensorView::new(&environment, &[], pose, None));
        assert_abs_diff_eq!(sensor.distance(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_range_sensor_refresh_is_idempotent() {
        let environment = facing_wall_at(42.0);
        let mut sensor = RangeSensor::default();
        let view = SensorView::new(
            &environment,
            &[],
            Pose::new(Point::new(90.0, 490.0), Angle::new(0.0)),
            None,
        );

        sensor.refresh(&view);
        let first = sensor.clone();
        sensor.refresh(&view);

        assert_eq!(sensor, first);
    }

    #[test]
    fn test_range_sensor_rejects_negative_range() {
        assert_eq!(
            RangeSensor::new(Point::default(), Angle::new(0.0), -1.0, Angle::new(0.0)),
            Err(DeviceError::InvalidMaxRange(-1.0))
        );
    }
}
