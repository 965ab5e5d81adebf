//! Mount plugin - binding table, rider following, and binding upkeep.

use bevy::prelude::*;

use super::components::MountBindings;
use super::systems::*;
use crate::combat::CombatSet;
use crate::core::SimSet;
use crate::spatial::track_camera;

pub struct MountPlugin;

impl Plugin for MountPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MountBindings>()
            .add_systems(
                FixedUpdate,
                follow_riders.after(track_camera).in_set(SimSet::Movement),
            )
            .add_systems(
                FixedUpdate,
                maintain_bindings
                    .after(crate::combat::settle_deaths)
                    .in_set(CombatSet::Aftermath),
            );
    }
}
