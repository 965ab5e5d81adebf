//! Turns a tick's input into player intent.
//!
//! Commands are tried in a fixed order: mount, magic, jump, attack, then
//! movement. The first one that applies consumes the tick. Input that cannot
//! apply (no mount in reach, an empty magic pool) is ignored.

use bevy::prelude::*;

use super::components::{Player, Stride};
use super::input::{InputFrame, PlayerInputs};
use crate::combat::*;
use crate::core::{MagicCastEvent, MountChange, MountEvent, SimConfig, SimContext, SpawnOrder};
use crate::mount::{board, dismount, nearest_mount, Mount, MountBindings, MountCandidate, Mounted};
use crate::spatial::{Facing, Position, Velocity};
use crate::state::{ActionState, TimedState};
use crate::world::{Actor, ActorKind, GameData};

type PlayerBody = (
    Entity,
    &'static Player,
    &'static Actor,
    &'static mut TimedState<ActionState>,
    &'static mut Position,
    &'static mut Velocity,
    &'static mut Facing,
    &'static mut ComboTracker,
    &'static mut InputBuffer,
    &'static mut MagicPool,
    &'static mut Stride,
    Option<&'static Mounted>,
);

type OtherBody = (
    Entity,
    &'static SpawnOrder,
    &'static Position,
    &'static Allegiance,
    &'static TimedState<ActionState>,
    &'static Health,
    Option<&'static Mount>,
);

/// Applies each living player's input for this tick.
#[allow(clippy::too_many_arguments)]
pub fn apply_player_input(
    mut commands: Commands,
    config: Res<SimConfig>,
    data: Res<GameData>,
    mut ctx: ResMut<SimContext>,
    inputs: Res<PlayerInputs>,
    mut bindings: ResMut<MountBindings>,
    mut players: Query<PlayerBody, Without<Dead>>,
    others: Query<OtherBody, (Without<Player>, Without<Dead>)>,
    mut magic_events: EventWriter<MagicCastEvent>,
    mut mount_events: EventWriter<MountEvent>,
) {
    let now = ctx.tick;
    let empty = InputFrame::default();
    let double_tap = config.ms_to_ticks(config.double_tap_window_ms);
    let dash = config.ms_to_ticks(config.dash_attack_window_ms);

    for (
        entity,
        player,
        actor,
        mut action,
        mut pos,
        mut vel,
        mut facing,
        mut combo,
        mut buffer,
        mut pool,
        mut stride,
        mounted,
    ) in &mut players
    {
        let frame = inputs.frame(player.slot).unwrap_or(&empty);
        remember(&mut buffer, frame, now);

        let state = action.current();
        if state.is_incapacitated() {
            continue;
        }
        let ActorKind::Hero(hero) = actor.kind else {
            continue;
        };
        let grounded = !pos.is_airborne();

        // Mount / dismount
        if frame.mount && grounded {
            if mounted.is_some() {
                if dismount(
                    &mut commands,
                    &mut bindings,
                    entity,
                    now + config.invincibility_ticks,
                    MountChange::Dismounted,
                    &mut mount_events,
                ) {
                    action.enter(ActionState::Idle, now, None);
                    info!("{:?} dismounted", player.slot);
                }
                continue;
            }
            if state.is_free() {
                let candidates: Vec<MountCandidate> = others
                    .iter()
                    .filter_map(|(e, order, p, allegiance, _, health, mount)| {
                        let mount = mount?;
                        let free = *allegiance == Allegiance::Neutral
                            && !health.is_dead()
                            && !bindings.is_ridden(e);
                        free.then_some(MountCandidate {
                            entity: e,
                            kind: mount.kind,
                            order: *order,
                            position: *p,
                        })
                    })
                    .collect();
                if let Some(target) = nearest_mount(&pos, &candidates, config.interaction_range) {
                    if board(&mut commands, &mut bindings, entity, &target, &mut mount_events) {
                        action.enter(ActionState::Mount, now, None);
                        pos.x = target.position.x;
                        pos.depth = target.position.depth;
                        vel.stop_ground();
                        info!("{:?} mounted {:?}", player.slot, target.entity);
                        continue;
                    }
                }
            }
        }

        // Magic spends the whole pool; an empty pool does nothing
        if frame.magic && state.is_free() && grounded && mounted.is_none() {
            if let Some((tier, spent)) = pool.cast() {
                let profile = &data.hero(hero).magic[tier.index()];
                action.enter(
                    ActionState::Magic,
                    now,
                    data.clip_duration(actor.kind, ActionState::Magic),
                );
                vel.stop_ground();
                let order = ctx.next_spawn_order();
                commands.spawn((
                    MagicBlast {
                        caster: entity,
                        tier,
                        area: profile.area,
                        depth_reach: profile.depth_reach,
                        attack: data.attack(profile.attack).descriptor,
                        expires_at: now + config.magic_lifetime_ticks,
                        struck: Vec::new(),
                    },
                    *pos,
                    *facing,
                    order,
                ));
                magic_events.send(MagicCastEvent {
                    caster: entity,
                    slot: player.slot,
                    tier,
                    shards_spent: spent,
                });
                info!("{:?} cast tier {:?} magic with {} shards", player.slot, tier, spent);
                continue;
            }
        }

        if frame.jump && state.is_free() && grounded && mounted.is_none() {
            vel.z = config.jump_force;
            vel.x = frame.movement.x as f32 * move_speed(&config, &stride);
            action.enter(ActionState::Jump, now, None);
            continue;
        }

        if frame.attack {
            if let Some(choice) = choose_attack(
                now,
                state,
                grounded,
                mounted,
                &combo,
                &mut buffer,
                double_tap,
                dash,
            ) {
                // Throws take precedence over strikes when a body is in reach
                let attack = match choice {
                    AttackChoice::Fixed(state) => state,
                    AttackChoice::Ground => match grab(&others, &pos, *facing, &config) {
                        Some((target, distance)) => {
                            commands.entity(entity).insert(PendingThrow { target, distance });
                            ActionState::Throw
                        }
                        None => combo
                            .begin_attack(now, config.combo_window_ticks())
                            .action_state(),
                    },
                };
                let source = actor.clip_source(attack, mounted.map(|m| m.kind));
                action.enter(attack, now, data.clip_duration(source, attack));
                if grounded {
                    vel.stop_ground();
                }
                debug!("{:?} {:?}", player.slot, attack);
                continue;
            }
        }

        // Movement
        let can_move = grounded && (state.is_free() || state == ActionState::Mount);
        if !can_move {
            continue;
        }
        if frame.movement.x == 0 {
            stride.running = false;
        } else if buffer.double_tap(double_tap).is_some() {
            stride.running = true;
        }
        let speed = match mounted {
            Some(mounted) => data.mount(mounted.kind).speed,
            None => move_speed(&config, &stride),
        };
        if frame.movement != IVec2::ZERO {
            vel.x = frame.movement.x as f32 * speed;
            vel.depth = frame.movement.y as f32 * speed * 0.5;
        }
        if frame.movement.x != 0 {
            *facing = if frame.movement.x > 0 {
                Facing::Right
            } else {
                Facing::Left
            };
        }
        if mounted.is_none() {
            let next = if frame.movement == IVec2::ZERO {
                ActionState::Idle
            } else {
                ActionState::Walk
            };
            action.settle(next, now);
        }
    }
}

fn move_speed(config: &SimConfig, stride: &Stride) -> f32 {
    if stride.running {
        config.run_speed
    } else {
        config.walk_speed
    }
}

/// Records the tick's discrete inputs in the rolling buffer.
fn remember(buffer: &mut InputBuffer, frame: &InputFrame, now: u64) {
    for &direction in &frame.taps {
        buffer.push(InputEvent::Tap(direction), now);
    }
    if frame.jump {
        buffer.push(InputEvent::Jump, now);
    }
    if frame.magic {
        buffer.push(InputEvent::Magic, now);
    }
    if frame.mount {
        buffer.push(InputEvent::Mount, now);
    }
    if frame.attack {
        buffer.push(InputEvent::Attack, now);
    }
}

/// Which kind of attack an attack press starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttackChoice {
    Fixed(ActionState),
    /// Throw if something is in reach, otherwise the next combo step
    Ground,
}

#[allow(clippy::too_many_arguments)]
fn choose_attack(
    now: u64,
    state: ActionState,
    grounded: bool,
    mounted: Option<&Mounted>,
    combo: &ComboTracker,
    buffer: &mut InputBuffer,
    double_tap: u64,
    dash: u64,
) -> Option<AttackChoice> {
    if mounted.is_some() {
        return (state == ActionState::Mount).then_some(AttackChoice::Fixed(ActionState::MountAttack));
    }
    if state == ActionState::Jump {
        return Some(AttackChoice::Fixed(ActionState::JumpAttack));
    }
    if !grounded {
        return None;
    }
    let cancelling = ComboStep::from_action(state).is_some() && combo.can_cancel(now);
    if !state.is_free() && !cancelling {
        return None;
    }
    if state.is_free() && buffer.dash_attack(double_tap, dash) {
        buffer.clear();
        return Some(AttackChoice::Fixed(ActionState::RunAttack));
    }
    Some(AttackChoice::Ground)
}

/// Nearest grabbable enemy in front of the player.
fn grab(
    others: &Query<OtherBody, (Without<Player>, Without<Dead>)>,
    pos: &Position,
    facing: Facing,
    config: &SimConfig,
) -> Option<(Entity, f32)> {
    let candidates: Vec<GrabCandidate> = others
        .iter()
        .filter(|(_, _, p, allegiance, action, health, mount)| {
            mount.is_none()
                && **allegiance == Allegiance::Horde
                && !health.is_dead()
                && !p.is_airborne()
                && !action.current().is_incapacitated()
        })
        .map(|(entity, order, p, ..)| GrabCandidate {
            entity,
            order: *order,
            position: *p,
        })
        .collect();
    grab_target(pos, facing, &candidates, config.grab_range, config.depth_proximity)
}
