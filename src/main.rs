use bevy::prelude::*;

use arena_sim::{
    config::{ConfigError, WorldConfig},
    domain::World,
};

mod controller;
mod resource;
mod simulator;
mod visualizer;

fn main() -> Result<(), ConfigError> {
    let world = World::from_config(WorldConfig::demo())?;

    App::new()
        .add_plugins(DefaultPlugins)
        .insert_resource(resource::WorldRes::from(world))
        .add_plugins(controller::Controller)
        .add_plugins(visualizer::Visualizer)
        .add_plugins(simulator::Simulator)
        .run();

    Ok(())
}
