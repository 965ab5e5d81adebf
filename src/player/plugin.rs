//! Player plugin - lifecycle, intent, and input hand-off.

use bevy::prelude::*;

use super::actions::apply_player_input;
use super::input::PlayerInputs;
use super::lifecycle::settle_lives;
use crate::core::SimSet;
use crate::player::Player;
use crate::state::advance_states;

/// Player plugin - handles lives, respawns, and player input.
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerInputs>()
            .add_systems(FixedUpdate, settle_lives.in_set(SimSet::Input))
            .add_systems(
                FixedUpdate,
                apply_player_input
                    .after(advance_states::<With<Player>>)
                    .in_set(SimSet::Player),
            )
            .add_systems(FixedUpdate, clear_inputs.in_set(SimSet::Publish));
    }
}

/// Input is good for one tick only.
fn clear_inputs(mut inputs: ResMut<PlayerInputs>) {
    inputs.clear();
}
