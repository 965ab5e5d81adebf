//! Lives, respawns and continues.

use bevy::prelude::*;

use super::components::{Player, PlayerBundle, PlayerSlot};
use super::input::PlayerInputs;
use super::roster::{LifeOutcome, PlayerRoster, SlotStatus};
use crate::combat::{Dead, Invincible, MagicPool};
use crate::core::{LifeChange, LifeEvent, SessionPhase, SimConfig, SimContext};
use crate::spatial::Position;
use crate::state::{ActionState, TimedState};
use crate::world::{GameData, HeroId};

/// Spawns a fresh body for `slot` and records it on the roster.
#[allow(clippy::too_many_arguments)]
pub fn spawn_hero(
    commands: &mut Commands,
    data: &GameData,
    ctx: &mut SimContext,
    roster: &mut PlayerRoster,
    slot: PlayerSlot,
    hero: HeroId,
    position: Position,
    charges: u8,
) -> Entity {
    let order = ctx.next_spawn_order();
    let entity = commands
        .spawn(PlayerBundle::new(data, hero, slot, order, position, ctx.tick).with_charges(charges))
        .id();
    if let Some(record) = roster.slot_mut(slot) {
        record.body = Some(entity);
    }
    entity
}

/// Spends a life for every body whose death has played out, then runs
/// the continue countdowns.
#[allow(clippy::too_many_arguments)]
pub fn settle_lives(
    mut commands: Commands,
    config: Res<SimConfig>,
    data: Res<GameData>,
    mut ctx: ResMut<SimContext>,
    inputs: Res<PlayerInputs>,
    mut roster: ResMut<PlayerRoster>,
    fallen: Query<(Entity, &Player, &TimedState<ActionState>, &Position, &MagicPool), With<Dead>>,
    mut life_events: EventWriter<LifeEvent>,
) {
    if matches!(ctx.phase, SessionPhase::GameOver | SessionPhase::Complete) {
        return;
    }
    let now = ctx.tick;
    let countdown = config.secs_to_ticks(config.continue_countdown_secs);

    for (entity, player, action, pos, pool) in &fallen {
        if !action.is(ActionState::Death) || !action.has_elapsed(now) {
            continue;
        }
        let slot = player.slot;
        commands.entity(entity).despawn();
        let Some(outcome) = roster.lose_life(slot, now, countdown) else {
            continue;
        };
        if let Some(record) = roster.slot_mut(slot) {
            record.last_position = Some(Vec2::new(pos.x, pos.depth));
        }

        match outcome {
            LifeOutcome::Respawn { remaining } => {
                info!("{:?} lost a life, {} remaining", slot, remaining);
                life_events.send(LifeEvent {
                    slot,
                    change: LifeChange::LifeLost { remaining },
                });
                let Some(hero) = roster.slot(slot).map(|record| record.hero) else {
                    continue;
                };
                respawn(
                    &mut commands,
                    &data,
                    &mut ctx,
                    &mut roster,
                    &config,
                    slot,
                    hero,
                    Position::new(pos.x, pos.depth),
                    pool.charges(),
                );
                life_events.send(LifeEvent {
                    slot,
                    change: LifeChange::Respawned,
                });
            }
            LifeOutcome::OfferContinue { deadline } => {
                info!("{:?} out of lives, continue until tick {}", slot, deadline);
                life_events.send(LifeEvent {
                    slot,
                    change: LifeChange::LifeLost { remaining: 0 },
                });
                life_events.send(LifeEvent {
                    slot,
                    change: LifeChange::ContinueOffered { deadline },
                });
            }
            LifeOutcome::Spent => {
                info!("{:?} is out of the game", slot);
                life_events.send(LifeEvent {
                    slot,
                    change: LifeChange::Spent,
                });
            }
        }
    }

    // Continue countdowns
    let pending: Vec<_> = roster
        .slots()
        .filter(|(_, record)| matches!(record.status, SlotStatus::ContinuePending { .. }))
        .map(|(slot, record)| (slot, record.hero, record.last_position))
        .collect();
    for (slot, hero, last_position) in pending {
        let pressed = inputs.frame(slot).is_some_and(|frame| frame.attack);
        if pressed {
            if let Some(remaining) = roster.take_continue(slot, config.starting_lives) {
                info!("{:?} continues, {} continues left", slot, remaining);
                life_events.send(LifeEvent {
                    slot,
                    change: LifeChange::ContinueTaken { remaining },
                });
                let at = last_position.unwrap_or(Vec2::new(ctx.camera.center(), ctx.depth_band.min));
                respawn(
                    &mut commands,
                    &data,
                    &mut ctx,
                    &mut roster,
                    &config,
                    slot,
                    hero,
                    Position::new(at.x, at.y),
                    0,
                );
                life_events.send(LifeEvent {
                    slot,
                    change: LifeChange::Respawned,
                });
                continue;
            }
        }
        if roster.expire_continue(slot, now) {
            info!("{:?} let the continue lapse", slot);
            life_events.send(LifeEvent {
                slot,
                change: LifeChange::Spent,
            });
        }
    }

    if !roster.is_empty() && roster.all_spent() {
        info!("Every player is out; game over at tick {}", now);
        ctx.phase = SessionPhase::GameOver;
    }
}

#[allow(clippy::too_many_arguments)]
fn respawn(
    commands: &mut Commands,
    data: &GameData,
    ctx: &mut SimContext,
    roster: &mut PlayerRoster,
    config: &SimConfig,
    slot: PlayerSlot,
    hero: HeroId,
    position: Position,
    charges: u8,
) {
    let until = ctx.tick + config.invincibility_ticks;
    let entity = spawn_hero(commands, data, ctx, roster, slot, hero, position, charges);
    commands.entity(entity).insert(Invincible { until });
}
