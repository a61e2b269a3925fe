//! The domain module encapsulates the simulation core. It defines the `World` with its obstacle
//! registry, the `Robot` entities moving through it and the devices they sense with.
//!
//! Nothing in here knows about a rendering surface or an application framework. The scene is
//! described to the outside as a list of `DrawCommand`s only.

mod basis;
pub(crate) mod collision;
mod color;
mod device;
mod draw;
mod environment;
mod hit;
mod robot;
mod world;

pub use basis::{distance, Angle, Point, Pose, Segment};
pub use collision::{
    distance_point_to_segment, segment_intersection_point, segments_intersect, BoundingBox,
    HasCollision,
};
pub use color::{Color, ColorError, ColorSpec};
pub use device::{
    Bulb, Camera, Device, DeviceError, LightSensor, PictureKind, PixelGrid, RangeSensor,
    SensorView,
};
pub use draw::{DrawCommand, Stroke};
pub use environment::{Environment, Obstacle, RobotId};
pub use hit::Hit;
pub use robot::{Body, BodyPart, Motion, Robot, RobotError};
pub use world::{RunSummary, StopCondition, World, WorldError};
