//! Enemy AI behavior.
//!
//! The decision rules are plain functions over positions and timers; the
//! [`think`] system gathers the inputs, applies the decisions, and writes
//! movement and attacks back onto the bodies.

use std::collections::BTreeMap;

use bevy::prelude::*;

use super::components::{AiController, Enemy, EnemyStats};
use crate::combat::Dead;
use crate::core::{SimContext, SpawnOrder};
use crate::player::{Player, PlayerRoster, PlayerSlot};
use crate::spatial::{distance, Facing, Position, Velocity};
use crate::state::{ActionState, AiState, TimedState};
use crate::world::{Actor, GameData};

/// A player the AI may chase.
#[derive(Debug, Clone, Copy)]
pub struct Prey {
    pub entity: Entity,
    pub slot: PlayerSlot,
    pub position: Position,
}

/// Another enemy's current pick, used to split targets in co-op.
#[derive(Debug, Clone, Copy)]
pub struct Claim {
    pub target: Entity,
    pub position: Position,
}

/// Nearest living player, ties to the lowest slot.
///
/// In co-op the nearest player is skipped when another enemy within
/// `claim_radius` already chases them and some player is still unclaimed.
pub fn select_target(
    me: &Position,
    prey: &[Prey],
    claims: &[Claim],
    coop: bool,
    claim_radius: f32,
) -> Option<Entity> {
    let mut ranked: Vec<(f32, PlayerSlot, Entity)> = prey
        .iter()
        .map(|p| (distance(me, &p.position), p.slot, p.entity))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    let nearest = ranked.first()?.2;
    if !coop || ranked.len() < 2 {
        return Some(nearest);
    }

    let claimed = |target: Entity| {
        claims
            .iter()
            .any(|claim| claim.target == target && distance(me, &claim.position) <= claim_radius)
    };
    if !claimed(nearest) {
        return Some(nearest);
    }
    ranked
        .iter()
        .map(|(_, _, entity)| *entity)
        .find(|entity| !claimed(*entity))
        .or(Some(nearest))
}

/// Picks the next controller state for an enemy that is free to choose.
pub fn decide(
    current: AiState,
    stats: &EnemyStats,
    target_distance: Option<f32>,
    cooldown_ready: bool,
) -> AiState {
    if current.is_preempted() || matches!(current, AiState::Attack | AiState::Retreat) {
        return current;
    }
    let Some(distance) = target_distance else {
        return AiState::Idle;
    };
    if stats.passive {
        return AiState::Patrol;
    }
    if distance > stats.attack_range {
        AiState::Approach
    } else if cooldown_ready {
        AiState::Attack
    } else {
        AiState::Idle
    }
}

/// Splits enemies that approach the same target between its two sides.
///
/// Enemies are taken in creation order and alternate left and right, so a
/// lone approacher goes straight in and a pair closes in from both sides.
pub fn flank_sides(approachers: &[(Entity, SpawnOrder, Entity)]) -> BTreeMap<Entity, f32> {
    let mut by_target: BTreeMap<Entity, Vec<(SpawnOrder, Entity)>> = BTreeMap::new();
    for &(enemy, order, target) in approachers {
        by_target.entry(target).or_default().push((order, enemy));
    }
    let mut sides = BTreeMap::new();
    for group in by_target.values_mut() {
        if group.len() < 2 {
            continue;
        }
        group.sort();
        for (i, (_, enemy)) in group.iter().enumerate() {
            sides.insert(*enemy, if i % 2 == 0 { -1.0 } else { 1.0 });
        }
    }
    sides
}

/// Velocity that closes in on `goal`, at most `speed` per axis step.
fn steer(from: &Position, goal: Vec2, speed: f32) -> Vec2 {
    let delta = Vec2::new(goal.x - from.x, goal.y - from.depth);
    Vec2::new(
        delta.x.clamp(-speed, speed),
        delta.y.clamp(-speed * 0.5, speed * 0.5),
    )
}

type EnemyBody = (
    Entity,
    &'static SpawnOrder,
    &'static Actor,
    &'static EnemyStats,
    &'static mut AiController,
    &'static mut TimedState<AiState>,
    &'static mut TimedState<ActionState>,
    &'static mut Position,
    &'static mut Velocity,
    &'static mut Facing,
);

/// Runs one decision cycle for every living enemy.
pub fn think(
    ctx: Res<SimContext>,
    data: Res<GameData>,
    roster: Res<PlayerRoster>,
    players: Query<(Entity, &Player, &Position, &TimedState<ActionState>), Without<Dead>>,
    mut enemies: Query<EnemyBody, (With<Enemy>, Without<Dead>, Without<Player>)>,
) {
    let now = ctx.tick;
    let tuning = ctx.ai_tuning;
    let coop = roster.is_coop();

    let prey: Vec<Prey> = players
        .iter()
        .filter(|(.., action)| !action.is(ActionState::Death))
        .map(|(entity, player, pos, _)| Prey {
            entity,
            slot: player.slot,
            position: *pos,
        })
        .collect();
    let prey_at = |entity: Entity| prey.iter().find(|p| p.entity == entity).map(|p| p.position);

    let snapshot: Vec<(Entity, SpawnOrder, Option<Entity>, Position, AiState)> = enemies
        .iter()
        .map(|(entity, order, _, _, controller, mind, _, pos, ..)| {
            (entity, *order, controller.target, *pos, mind.current())
        })
        .collect();
    let approachers: Vec<(Entity, SpawnOrder, Entity)> = snapshot
        .iter()
        .filter(|(.., state)| *state == AiState::Approach)
        .filter_map(|(entity, order, target, ..)| Some((*entity, *order, (*target)?)))
        .collect();
    let sides = flank_sides(&approachers);

    for (entity, _, actor, stats, mut controller, mut mind, mut action, mut pos, mut vel, mut facing) in
        &mut enemies
    {
        // The body pre-empts the controller
        if let Some(forced) = AiState::forced_by(action.current()) {
            if !mind.is(forced) {
                mind.enter(forced, now, None);
            }
            continue;
        }
        if mind.current().is_preempted() {
            mind.enter(AiState::Idle, now, None);
        }

        // Re-resolve the target
        let target_lost = controller.target.and_then(prey_at).is_none();
        if target_lost || controller.needs_reevaluation(now) {
            let claims: Vec<Claim> = snapshot
                .iter()
                .filter(|(other, ..)| *other != entity)
                .filter_map(|(_, _, target, position, _)| {
                    Some(Claim {
                        target: (*target)?,
                        position: *position,
                    })
                })
                .collect();
            let picked = select_target(&pos, &prey, &claims, coop, tuning.claim_radius);
            if picked != controller.target {
                debug!("{:?} now targets {:?}", entity, picked);
            }
            controller.target = picked;
            controller.last_reevaluation = Some(now);
        }
        let target = controller.target.and_then(prey_at);

        // An attack ends with a short retreat
        if mind.is(AiState::Attack) && !action.current().is_attack() {
            mind.enter(AiState::Retreat, now, Some(tuning.retreat_ticks));
        }
        mind.advance(now, |_| None);

        let next = decide(
            mind.current(),
            stats,
            target.map(|t| distance(&pos, &t)),
            controller.cooldown_ready(now),
        );
        if next != mind.current() && !mind.is(AiState::Attack) {
            mind.enter(next, now, None);
        }

        match (mind.current(), target) {
            (AiState::Approach, Some(goal)) => {
                let side = sides.get(&entity).copied();
                let far = distance(&pos, &goal) > stats.approach_range;
                let goal_x = match side {
                    Some(side) if far => goal.x + side * tuning.flank_offset,
                    _ => goal.x,
                };
                let step = steer(&pos, Vec2::new(goal_x, goal.depth), stats.move_speed);
                vel.x = step.x;
                vel.depth = step.y;
                *facing = Facing::toward(pos.x, goal.x);
                action.settle(ActionState::Walk, now);
            }
            (AiState::Attack, Some(goal)) if mind.entered_at() == now => {
                *facing = Facing::toward(pos.x, goal.x);
                vel.stop_ground();
                let duration = data.clip_duration(actor.kind, ActionState::Attack1);
                action.enter(ActionState::Attack1, now, duration);
                controller.cooldown_until = now + stats.attack_cooldown_ticks;
                debug!("{:?} attacks {:?}", entity, controller.target);
            }
            (AiState::Retreat, Some(goal)) => {
                let away = -Facing::toward(pos.x, goal.x).sign();
                vel.x = away * stats.move_speed * tuning.retreat_speed;
                action.settle(ActionState::Walk, now);
            }
            (AiState::Patrol, Some(threat)) => {
                let away = -Facing::toward(pos.x, threat.x).sign();
                vel.x = away * stats.move_speed;
                *facing = if away > 0.0 { Facing::Right } else { Facing::Left };
                action.settle(ActionState::Walk, now);
            }
            (AiState::Attack, _) => {}
            _ => {
                action.settle(ActionState::Idle, now);
            }
        }
    }
}
