//! Backend-agnostic drawing primitives.
//!
//! The world describes itself as an ordered list of commands in arena coordinates. Backends
//! replay the list onto whatever surface they own.

use std::fmt;

use super::{Color, Point};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

impl Stroke {
    pub const fn new(color: Color, width: f64) -> Self {
        Self { color, width }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Clear {
        color: Color,
    },
    Polygon {
        points: Vec<Point>,
        fill: Color,
        stroke: Option<Stroke>,
    },
    Rectangle {
        corner: Point,
        width: f64,
        height: f64,
        fill: Color,
    },
    Line {
        from: Point,
        to: Point,
        stroke: Stroke,
    },
    Ellipse {
        center: Point,
        radius_x: f64,
        radius_y: f64,
        fill: Color,
    },
    Text {
        position: Point,
        text: String,
        color: Color,
    },
}

impl fmt::Display for DrawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawCommand::Clear { color } => write!(f, "clear {color}"),
            DrawCommand::Polygon {
                points,
                fill,
                stroke,
            } => {
                write!(f, "polygon {fill}")?;
                if let Some(stroke) = stroke {
                    write!(f, " stroke {} {}", stroke.color, stroke.width)?;
                }
                for p in points {
                    write!(f, " ({:.2}, {:.2})", p.x(), p.y())?;
                }
                Ok(())
            }
            DrawCommand::Rectangle {
                corner,
                width,
                height,
                fill,
            } => write!(
                f,
                "rect {fill} ({:.2}, {:.2}) {width:.2}x{height:.2}",
                corner.x(),
                corner.y()
            ),
            DrawCommand::Line { from, to, stroke } => write!(
                f,
                "line {} {} ({:.2}, {:.2}) ({:.2}, {:.2})",
                stroke.color,
                stroke.width,
                from.x(),
                from.y(),
                to.x(),
                to.y()
            ),
            DrawCommand::Ellipse {
                center,
                radius_x,
                radius_y,
                fill,
            } => write!(
                f,
                "ellipse {fill} ({:.2}, {:.2}) {radius_x:.2}x{radius_y:.2}",
                center.x(),
                center.y()
            ),
            DrawCommand::Text {
                position,
                text,
                color,
            } => write!(
                f,
                "text {color} ({:.2}, {:.2}) {text:?}",
                position.x(),
                position.y()
            ),
        }
    }
}
