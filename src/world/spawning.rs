//! Level construction - placed mounts and pickups.

use bevy::prelude::*;

use super::registry::{GameData, LevelData};
use crate::combat::{Allegiance, Pickup};
use crate::core::SimContext;
use crate::mount::MountBundle;

/// Spawns the free mounts and pickups a level starts with.
pub fn spawn_level_props(commands: &mut Commands, data: &GameData, ctx: &mut SimContext, level: &LevelData) {
    for &(kind, position) in &level.mounts {
        let order = ctx.next_spawn_order();
        commands.spawn(MountBundle::new(
            data,
            kind,
            order,
            position,
            Allegiance::Neutral,
            ctx.tick,
        ));
        info!("Placed {} at x={:.0}", data.mount(kind).name, position.x);
    }

    for &(kind, position) in &level.pickups {
        let order = ctx.next_spawn_order();
        commands.spawn((Pickup { kind }, position, order));
    }
}
