//! Enemy plugin - registers the AI decision cycle.

use bevy::prelude::*;

use super::ai;
use crate::core::SimSet;

/// Enemy plugin - enemy decisions run after combat, before enemy timers.
pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, ai::think.in_set(SimSet::Ai));
    }
}
