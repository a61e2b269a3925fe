//! Keyboard control of the robots.
//!
//! The arrow keys drive the selected robot, space stops it and tab selects the next robot. `R`
//! places the selected robot at a random free spot. Escape pauses the simulation and `P` resumes
//! it.

use std::sync::atomic::Ordering;

use bevy::prelude::*;

use crate::{
    resource::{PlacementRng, SelectedRobot, WorldRes},
    simulator::Simulation,
};

const DRIVE_KEYS: [KeyCode; 4] = [
    KeyCode::ArrowUp,
    KeyCode::ArrowDown,
    KeyCode::ArrowLeft,
    KeyCode::ArrowRight,
];

pub struct Controller;

impl Plugin for Controller {
    fn build(&self, app: &mut App) {
        app.init_resource::<SelectedRobot>()
            .init_resource::<PlacementRng>()
            .add_systems(Update, (select, control, relocate, pause).chain());
    }
}

fn select(
    keys: Res<ButtonInput<KeyCode>>,
    world: Res<WorldRes>,
    mut selected: ResMut<SelectedRobot>,
) {
    if keys.just_pressed(KeyCode::Tab) {
        selected.select_next(world.robots().len());
    }
}

fn control(
    keys: Res<ButtonInput<KeyCode>>,
    selected: Res<SelectedRobot>,
    mut world: ResMut<WorldRes>,
) {
    let Some(robot) = world.find_mut(&format!("robot-{}", selected.0 + 1)) else {
        return;
    };

    if keys.just_pressed(KeyCode::Space) {
        robot.stop();
        return;
    }

    // Releases too, the command follows the keys currently held.
    let changed = DRIVE_KEYS
        .iter()
        .any(|&key| keys.just_pressed(key) || keys.just_released(key));
    if !changed {
        return;
    }

    let axis = |positive: KeyCode, negative: KeyCode| {
        f64::from(u8::from(keys.pressed(positive))) - f64::from(u8::from(keys.pressed(negative)))
    };
    robot.move_by(
        axis(KeyCode::ArrowUp, KeyCode::ArrowDown),
        axis(KeyCode::ArrowLeft, KeyCode::ArrowRight),
    );
}

fn relocate(
    keys: Res<ButtonInput<KeyCode>>,
    selected: Res<SelectedRobot>,
    mut rng: ResMut<PlacementRng>,
    mut world: ResMut<WorldRes>,
) {
    if !keys.just_pressed(KeyCode::KeyR) {
        return;
    }
    let Some(id) = world.robot_at(selected.0).and_then(|robot| robot.id()) else {
        return;
    };

    match world.place_robot_randomly(id, &mut rng.0) {
        Ok(pose) => debug!(%id, x = pose.position.x(), y = pose.position.y(), "robot relocated"),
        Err(error) => warn!(%error, "robot not relocated"),
    }
}

fn pause(
    keys: Res<ButtonInput<KeyCode>>,
    world: Res<WorldRes>,
    mut simulation: ResMut<Simulation>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        world.stop_handle().store(true, Ordering::SeqCst);
    }

    if keys.just_pressed(KeyCode::KeyP) && simulation.paused {
        simulation.paused = false;
    }
}
