//! Rendering strategies.
//!
//! A backend receives the draw commands of a world one primitive at a time. The world never
//! knows which backend is drawing it; the caller picks one and hands the commands over.

use crate::domain::{Color, DrawCommand, Point, Stroke, World};

pub trait RenderBackend {
    fn clear(&mut self, color: Color);

    fn polygon(&mut self, points: &[Point], fill: Color, stroke: Option<Stroke>);

    fn rectangle(&mut self, corner: Point, width: f64, height: f64, fill: Color);

    fn line(&mut self, from: Point, to: Point, stroke: Stroke);

    fn ellipse(&mut self, center: Point, radius_x: f64, radius_y: f64, fill: Color);

    fn text(&mut self, position: Point, text: &str, color: Color);

    /// Replays `commands` in order.
    fn render(&mut self, commands: &[DrawCommand]) {
        for command in commands {
            match command {
                DrawCommand::Clear { color } => self.clear(*color),
                DrawCommand::Polygon {
                    points,
                    fill,
                    stroke,
                } => self.polygon(points, *fill, *stroke),
                DrawCommand::Rectangle {
                    corner,
                    width,
                    height,
                    fill,
                } => self.rectangle(*corner, *width, *height, *fill),
                DrawCommand::Line { from, to, stroke } => self.line(*from, *to, *stroke),
                DrawCommand::Ellipse {
                    center,
                    radius_x,
                    radius_y,
                    fill,
                } => self.ellipse(*center, *radius_x, *radius_y, *fill),
                DrawCommand::Text {
                    position,
                    text,
                    color,
                } => self.text(*position, text, *color),
            }
        }
    }

    fn draw_world(&mut self, world: &World) {
        self.render(&world.draw());
    }
}

/// Writes one line of text per primitive.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DebugBackend {
    lines: Vec<String>,
}

impl DebugBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn transcript(&self) -> String {
        self.lines.join("\n")
    }

    fn record(&mut self, command: DrawCommand) {
        self.lines.push(command.to_string());
    }
}

impl RenderBackend for DebugBackend {
    fn clear(&mut self, color: Color) {
        // A clear starts a new frame.
        self.lines.clear();
        self.record(DrawCommand::Clear { color });
    }

    fn polygon(&mut self, points: &[Point], fill: Color, stroke: Option<Stroke>) {
        self.record(DrawCommand::Polygon {
            points: points.to_vec(),
            fill,
            stroke,
        });
    }

    fn rectangle(&mut self, corner: Point, width: f64, height: f64, fill: Color) {
        self.record(DrawCommand::Rectangle {
            corner,
            width,
            height,
            fill,
        });
    }

    fn line(&mut self, from: Point, to: Point, stroke: Stroke) {
        self.record(DrawCommand::Line { from, to, stroke });
    }

    fn ellipse(&mut self, center: Point, radius_x: f64, radius_y: f64, fill: Color) {
        self.record(DrawCommand::Ellipse {
            center,
            radius_x,
            radius_y,
            fill,
        });
    }

    fn text(&mut self, position: Point, text: &str, color: Color) {
        self.record(DrawCommand::Text {
            position,
            text: text.to_string(),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::{Angle, Robot};

    #[test]
    fn test_transcript_of_static_scene() {
        let mut world = World::new(60.0, 40.0);
        world.add_obstacle(Color::BLUE, 10.0, 10.0, 20.0, 20.0);
        world.add_wall(Color::BLACK, 30.0, 0.0, 30.0, 25.0);
        let mut backend = DebugBackend::new();

        backend.draw_world(&world);

        assert_snapshot!(backend.transcript(), @r"
        clear #FFFFFFFF
        rect #008000FF (0.00, 0.00) 60.00x40.00
        polygon #0000FFFF (10.00, 10.00) (20.00, 10.00) (20.00, 20.00) (10.00, 20.00)
        line #800080FF 3 (0.00, 0.00) (0.00, 40.00)
        line #800080FF 3 (0.00, 40.00) (60.00, 40.00)
        line #800080FF 3 (60.00, 40.00) (60.00, 0.00)
        line #800080FF 3 (60.00, 0.00) (0.00, 0.00)
        line #000000FF 3 (30.00, 0.00) (30.00, 25.00)
        ");
    }

    #[test]
    fn test_each_frame_starts_with_clear() {
        let mut world = World::new(100.0, 100.0);
        world.add_robot(Robot::scribbler("Robbie", 50.0, 50.0, Angle::new(0.0)));
        let mut backend = DebugBackend::new();

        backend.draw_world(&world);
        let first = backend.lines().len();
        backend.draw_world(&world);

        assert_eq!(backend.lines().len(), first);
        assert_eq!(backend.lines()[0], "clear #FFFFFFFF");
        assert!(backend
            .lines()
            .iter()
            .any(|line| line.starts_with("text") && line.ends_with("\"Robbie\"")));
    }
}
