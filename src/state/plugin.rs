//! State plugin - schedules timer advancement for each side.

use bevy::prelude::*;

use super::systems::advance_states;
use crate::core::SimSet;
use crate::player::Player;

pub struct StatePlugin;

impl Plugin for StatePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                advance_states::<With<Player>>.in_set(SimSet::Player),
                advance_states::<Without<Player>>.in_set(SimSet::EnemyState),
            ),
        );
    }
}
