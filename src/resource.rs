//! The resource module encapsulates domain entities for use with Bevy.

use std::ops::{Deref, DerefMut};

use bevy::ecs::system::Resource;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use arena_sim::domain;

const RNG_SEED: u64 = 19878367467712;

#[derive(Resource)]
pub struct WorldRes(domain::World);

impl Deref for WorldRes {
    type Target = domain::World;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for WorldRes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<domain::World> for WorldRes {
    fn from(value: domain::World) -> Self {
        Self(value)
    }
}

/// Index of the robot steered by the keyboard.
#[derive(Resource, Default)]
pub struct SelectedRobot(pub usize);

impl SelectedRobot {
    pub fn select_next(&mut self, robots: usize) {
        self.0 = if robots == 0 { 0 } else { (self.0 + 1) % robots };
    }
}

/// Source of random robot placements. Seeded so that runs are repeatable.
#[derive(Resource)]
pub struct PlacementRng(pub ChaCha8Rng);

impl Default for PlacementRng {
    fn default() -> Self {
        Self(ChaCha8Rng::seed_from_u64(RNG_SEED))
    }
}
