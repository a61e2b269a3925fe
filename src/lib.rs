//! Simulation of mobile robots in a bounded 2D arena.
//!
//! Robots move with ramp-limited velocity control, stall when their bounding box would run into
//! an obstacle, and sense the arena through ray-cast range sensors, cameras and light sensors.


pub mod config;
pub mod domain;
pub mod render;
