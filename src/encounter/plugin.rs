//! Encounter plugin.

use bevy::prelude::*;

use super::systems::*;
use super::zone::EncounterDirector;
use crate::core::SimSet;

pub struct EncounterPlugin;

impl Plugin for EncounterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EncounterDirector>().add_systems(
            FixedUpdate,
            (activate_zones, run_active_zone, clear_remains, advance_session)
                .chain()
                .in_set(SimSet::Encounter),
        );
    }
}
