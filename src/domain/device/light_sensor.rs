//! Light sensor and the light sources it measures.

use serde::{Deserialize, Serialize};

use super::SensorView;
use crate::domain::{Angle, Color, DrawCommand, Point, Pose};

/// Scales the inverse-square falloff of every bulb.
const MULTIPLIER: f64 = 1000.0;

/// Point light source placed in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bulb {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    pub brightness: f64,
    #[serde(default = "default_bulb_color")]
    pub color: Color,
}

fn default_bulb_color() -> Color {
    Color::YELLOW
}

impl Bulb {
    pub fn new(x: f64, y: f64, brightness: f64) -> Self {
        Self {
            x,
            y,
            z: 0.0,
            brightness,
            color: default_bulb_color(),
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Sums the light of every bulb with an unobstructed straight path to the sensor.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightSensor {
    position: Point,
    value: f64,
}

impl LightSensor {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            value: 0.0,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn reading(&self) -> f64 {
        self.value
    }

    pub fn step(&mut self, _dt: f64) {}

    pub fn refresh(&mut self, view: &SensorView) {
        let anchor = view.pose.transform(self.position);
        self.value = view
            .bulbs
            .iter()
            .filter_map(|bulb| {
                let dist = anchor.distance(bulb.position());
                if dist <= f64::EPSILON {
                    return None;
                }
                let angle = Angle::new((bulb.x - anchor.x()).atan2(bulb.y - anchor.y()));
                view.cast_ray(anchor, angle, dist)
                    .is_empty()
                    .then(|| bulb.brightness * MULTIPLIER / dist.powi(2))
            })
            .sum();
    }

    pub fn draw(&self, pose: Pose, commands: &mut Vec<DrawCommand>) {
        commands.push(DrawCommand::Ellipse {
            center: pose.transform(self.position),
            radius_x: 2.0,
            radius_y: 2.0,
            fill: Color::YELLOW,
        });
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::domain::{Environment, Obstacle};

    #[test]
    fn test_light_sensor_sums_visible_bulbs() {
        let environment = Environment::new(200.0, 200.0, Color::PURPLE);
        let bulbs = [Bulb::new(110.0, 100.0, 1.0), Bulb::new(100.0, 80.0, 2.0)];
        let mut sensor = LightSensor::default();

        sensor.refresh(&SensorView::new(
            &environment,
            &bulbs,
            Pose::new(Point::new(100.0, 100.0), Angle::new(0.0)),
            None,
        ));

        assert_abs_diff_eq!(sensor.reading(), 1000.0 / 100.0 + 2000.0 / 400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_light_sensor_blocked_bulb() {
        let mut environment = Environment::new(200.0, 200.0, Color::PURPLE);
        environment.add_obstacle(Obstacle::wall(
            Color::BLACK,
            Point::new(105.0, 50.0),
            Point::new(105.0, 150.0),
        ));
        let bulbs = [Bulb::new(110.0, 100.0, 1.0), Bulb::new(100.0, 80.0, 2.0)];
        let mut sensor = LightSensor::default();

        sensor.refresh(&SensorView::new(
            &environment,
            &bulbs,
            Pose::new(Point::new(100.0, 100.0), Angle::new(0.0)),
            None,
        ));

        assert_abs_diff_eq!(sensor.reading(), 2000.0 / 400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_light_sensor_without_bulbs() {
        let environment = Environment::new(200.0, 200.0, Color::PURPLE);
        let mut sensor = LightSensor::new(Point::new(5.0, 0.0));

        sensor.refresh(&SensorView::new(&environment, &[], Pose::default(), None));

        assert_abs_diff_eq!(sensor.reading(), 0.0);
    }
}
