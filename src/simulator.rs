//! Simulation of the robots in the world.
//!
//! The world is stepped on Bevy's fixed timestep, which is set to the world's time step. Raising
//! the world's stop flag pauses the simulation before the next step.

use bevy::prelude::*;

use arena_sim::domain::StopCondition;

use crate::resource::WorldRes;

pub struct Simulator;

impl Plugin for Simulator {
    fn build(&self, app: &mut App) {
        app.init_resource::<Simulation>()
            .add_systems(Startup, set_up)
            .add_systems(FixedUpdate, simulate);
    }
}

#[derive(Resource, Default)]
pub struct Simulation {
    pub paused: bool,
}

fn set_up(world: Res<WorldRes>, mut time: ResMut<Time<Fixed>>) {
    time.set_timestep_seconds(world.time_step());
}

fn simulate(mut world: ResMut<WorldRes>, mut simulation: ResMut<Simulation>) {
    if simulation.paused {
        return;
    }

    match world.run_steps(1, &mut StopCondition::Never) {
        Ok(summary) if summary.interrupted => {
            info!(time = summary.time, "simulation paused");
            simulation.paused = true;
        }
        Ok(_) => {}
        Err(error) => {
            error!(%error, "simulation step failed");
            simulation.paused = true;
        }
    }
}
