//! Enemy spawning.
//!
//! Enemies are spawned by the encounter director and the camp phase. Stats
//! are scaled once here and never again.

use bevy::prelude::*;
use rand::Rng;

use super::components::{EnemyBundle, ScaledStats};
use crate::combat::Allegiance;
use crate::core::{SimConfig, SimContext, SimRng};
use crate::mount::{MountBindings, MountBundle, RiderSide};
use crate::spatial::{Facing, Position};
use crate::world::{EnemyId, GameData};

/// Spawns one enemy, and its mount if the definition rides one.
///
/// Returns the rider. A ridden mount fights for the horde until its rider
/// is defeated.
#[allow(clippy::too_many_arguments)]
pub fn spawn_enemy(
    commands: &mut Commands,
    data: &GameData,
    config: &SimConfig,
    ctx: &mut SimContext,
    rng: &mut SimRng,
    bindings: &mut MountBindings,
    kind: EnemyId,
    position: Position,
    facing: Facing,
    coop: bool,
) -> Entity {
    let def = data.enemy(kind);
    let difficulty = config.difficulty(ctx.level_index);
    let boss_multiplier = coop.then_some(config.coop_boss_hp_multiplier);
    let scaled = ScaledStats::new(def, difficulty, boss_multiplier);
    let lo = config.reeval_min_ticks.min(config.reeval_max_ticks);
    let hi = config.reeval_min_ticks.max(config.reeval_max_ticks);
    let interval = rng.0.gen_range(lo..=hi);

    let order = ctx.next_spawn_order();
    let tick = ctx.tick;
    let rider = commands
        .spawn(EnemyBundle::new(def, kind, scaled, order, position, interval, tick).facing(facing))
        .id();
    info!(
        "Spawned {} ({} hp) at x={:.0} depth={:.0}",
        def.name, scaled.max_health, position.x, position.depth
    );

    if let Some(mount_kind) = def.mount {
        let order = ctx.next_spawn_order();
        let mut mount = MountBundle::new(data, mount_kind, order, position, Allegiance::Horde, tick);
        mount.actor = mount.actor.facing(facing);
        let mount = commands.spawn(mount).id();
        bindings.bind(rider, mount, RiderSide::Horde);
    }
    rider
}
