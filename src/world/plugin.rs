//! World plugin - level loading.

use bevy::prelude::*;

use super::registry::GameData;
use super::spawning::spawn_level_props;
use crate::combat::Dead;
use crate::core::{advance_tick, SessionPhase, SimContext, SimSet};
use crate::encounter::EncounterDirector;
use crate::mount::{MountBindings, Mounted};
use crate::player::{spawn_hero, Player, PlayerRoster, SlotStatus};
use crate::spatial::{Position, Velocity};
use crate::state::{ActionState, TimedState};

/// World plugin - builds pending levels at the start of a tick.
pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            load_pending_level.after(advance_tick).in_set(SimSet::Begin),
        );
    }
}

type CarriedPlayer = (
    Entity,
    &'static Player,
    &'static mut Position,
    &'static mut Velocity,
    &'static mut TimedState<ActionState>,
    Has<Mounted>,
);

/// Tears down the previous level and builds the pending one.
///
/// Living players carry over to the new start positions with their health
/// and shards. Every other positioned entity is removed.
#[allow(clippy::too_many_arguments)]
pub fn load_pending_level(
    mut commands: Commands,
    data: Res<GameData>,
    mut ctx: ResMut<SimContext>,
    mut roster: ResMut<PlayerRoster>,
    mut bindings: ResMut<MountBindings>,
    mut director: ResMut<EncounterDirector>,
    leftovers: Query<Entity, (With<Position>, Without<Player>)>,
    mut players: Query<CarriedPlayer, Without<Dead>>,
) {
    let Some(index) = ctx.pending_level.take() else {
        return;
    };
    let Some(level) = data.level(index) else {
        error!("Level {} does not exist", index);
        ctx.phase = SessionPhase::Complete;
        return;
    };

    for entity in &leftovers {
        commands.entity(entity).despawn();
    }
    bindings.clear();
    director.reset();

    ctx.current_level = index;
    ctx.camera.enter_level(level.width);
    ctx.depth_band = level.depth_band;
    ctx.ai_tuning = level.ai_tuning;
    ctx.phase = SessionPhase::Playing;

    let now = ctx.tick;
    for (entity, player, mut pos, mut vel, mut action, mounted) in &mut players {
        *pos = level.player_start(player.slot.0 as usize);
        *vel = Velocity::default();
        if mounted {
            commands.entity(entity).remove::<Mounted>();
        }
        action.enter(ActionState::Idle, now, None);
    }

    let waiting: Vec<_> = roster
        .slots()
        .filter(|(_, record)| record.status == SlotStatus::Active && record.body.is_none())
        .map(|(slot, record)| (slot, record.hero))
        .collect();
    for (slot, hero) in waiting {
        let start = level.player_start(slot.0 as usize);
        spawn_hero(&mut commands, &data, &mut ctx, &mut roster, slot, hero, start, 0);
    }

    spawn_level_props(&mut commands, &data, &mut ctx, level);
    info!(
        "Entered level {} '{}' at difficulty {} ({} zones)",
        index,
        level.name,
        ctx.level_index,
        level.encounters.len()
    );
}
