//! Combat systems - throws, hit resolution, deaths, and pickups.

use std::collections::{HashMap, HashSet};

use bevy::ecs::query::QueryData;
use bevy::prelude::*;

use super::components::*;
use super::combo::{ComboStep, ComboTracker};
use super::magic::MagicPool;
use super::resolver::*;
use crate::core::{
    DeathEvent, HitEvent, HitKind, LifeChange, LifeEvent, PickupEvent, ScoreEvent, ScoreReason,
    SimConfig, SimContext, SimSet, SpawnOrder,
};
use crate::mount::{MountBindings, Mounted};
use crate::player::{Player, PlayerRoster};
use crate::spatial::{distance, Facing, Position, Velocity};
use crate::state::{ActionState, TimedState};
use crate::world::{Actor, ActorKind, ClipSet, GameData};

/// Ordering inside [`SimSet::Combat`].
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Throws, projectile flight
    Prepare,
    /// Hitbox against hurtbox
    Hits,
    /// Deaths, landings, expiry, pickups
    Aftermath,
}

/// Configure combat systems.
pub fn setup_combat_systems(app: &mut App) {
    app.configure_sets(
        FixedUpdate,
        (CombatSet::Prepare, CombatSet::Hits, CombatSet::Aftermath)
            .chain()
            .in_set(SimSet::Combat),
    )
    .add_systems(
        FixedUpdate,
        (resolve_throws, advance_projectiles).in_set(CombatSet::Prepare),
    )
    .add_systems(FixedUpdate, resolve_hits.in_set(CombatSet::Hits))
    .add_systems(
        FixedUpdate,
        (
            settle_deaths,
            land_thrown_bodies,
            expire_blasts,
            collect_pickups,
        )
            .chain()
            .in_set(CombatSet::Aftermath),
    );
}

#[derive(QueryData)]
#[query_data(mutable)]
struct Combatant {
    entity: Entity,
    order: &'static SpawnOrder,
    actor: &'static Actor,
    allegiance: &'static Allegiance,
    position: &'static mut Position,
    velocity: &'static mut Velocity,
    facing: &'static Facing,
    action: &'static mut TimedState<ActionState>,
    health: &'static mut Health,
    hits: &'static mut HitRegistry,
    hurtbox: &'static Hurtbox,
    last_attacker: &'static mut LastAttacker,
    player: Option<&'static Player>,
    mounted: Option<&'static Mounted>,
    invincible: Option<&'static Invincible>,
    damage_scale: Option<&'static DamageScale>,
    combo: Option<&'static mut ComboTracker>,
    thrown: Option<&'static mut Thrown>,
    dead: Has<Dead>,
}

/// Puts a struck body into HIT, KNOCKDOWN, or DEATH and pushes it.
///
/// Returns the state entered, or `None` if the body was already dead.
#[allow(clippy::too_many_arguments)]
pub fn apply_reaction(
    action: &mut TimedState<ActionState>,
    position: &mut Position,
    velocity: &mut Velocity,
    strike: &Strike,
    lethal: bool,
    now: u64,
    clips: &ClipSet,
    friction: f32,
) -> Option<ActionState> {
    let next = if lethal {
        ActionState::Death
    } else if strike.attack.knockdown {
        ActionState::Knockdown
    } else {
        ActionState::Hit
    };
    let duration = match next {
        ActionState::Hit => Some(strike.attack.hit_stun_ticks),
        _ => clips.duration(next),
    };
    if !action.enter(next, now, duration) {
        return None;
    }
    apply_knockback(position, velocity, strike, friction);
    Some(next)
}

/// Moves the body one tick along the push and leaves the rest to friction.
///
/// The velocity is seeded with what is left after this tick's friction, so
/// the first tick of the push is not applied again by the integrator.
pub fn apply_knockback(position: &mut Position, velocity: &mut Velocity, strike: &Strike, friction: f32) {
    let push = strike.push * strike.attack.knockback.x;
    position.x += push;
    velocity.x = push * friction;
    if strike.attack.knockback.y > 0.0 {
        velocity.z = strike.attack.knockback.y;
    }
}

/// Resolves throws queued by the player phase.
fn resolve_throws(
    mut commands: Commands,
    config: Res<SimConfig>,
    data: Res<GameData>,
    ctx: Res<SimContext>,
    throwers: Query<(Entity, &PendingThrow, &Actor, &Allegiance, &Facing), With<Player>>,
    mut bodies: Query<
        (
            &mut TimedState<ActionState>,
            &mut Health,
            &mut Velocity,
            &mut LastAttacker,
            &Actor,
        ),
        (Without<Player>, Without<Dead>),
    >,
    mut hit_events: EventWriter<HitEvent>,
) {
    let now = ctx.tick;
    for (thrower, pending, actor, allegiance, facing) in &throwers {
        commands.entity(thrower).remove::<PendingThrow>();
        let ActorKind::Hero(hero) = actor.kind else {
            continue;
        };
        let Ok((mut action, mut health, mut velocity, mut last_attacker, body)) =
            bodies.get_mut(pending.target)
        else {
            continue;
        };
        if action.current().is_incapacitated() {
            continue;
        }

        let profile = data.hero(hero).throw;
        let damage = throw_damage(
            pending.distance,
            config.grab_range,
            profile.close_damage,
            profile.far_damage,
        );
        let dealt = health.take_damage(damage);
        last_attacker.0 = Some(thrower);
        hit_events.send(HitEvent {
            attacker: thrower,
            defender: pending.target,
            damage: dealt,
            knockdown: true,
            kind: HitKind::Throw,
        });

        let clips = data.clips(body.kind);
        if health.is_dead() {
            action.enter(ActionState::Death, now, clips.duration(ActionState::Death));
        } else {
            action.enter(ActionState::Knockdown, now, clips.duration(ActionState::Knockdown));
        }
        velocity.x = facing.sign() * config.throw_speed;
        velocity.z = config.throw_lift;
        commands.entity(pending.target).insert(Thrown {
            thrower,
            allegiance: *allegiance,
            launched_at: now,
            struck: Vec::new(),
        });
        debug!("{:?} threw {:?} for {} damage", thrower, pending.target, dealt);
    }
}

/// Moves projectiles and removes the ones that ran out of time or level.
fn advance_projectiles(
    mut commands: Commands,
    ctx: Res<SimContext>,
    mut projectiles: Query<(Entity, &Projectile, &mut Position, &Velocity), Without<Actor>>,
) {
    for (entity, projectile, mut pos, vel) in &mut projectiles {
        pos.x += vel.x;
        if ctx.tick >= projectile.expires_at || pos.x < 0.0 || pos.x > ctx.camera.level_width {
            commands.entity(entity).despawn();
        }
    }
}

/// Where a striker's hits are credited and how they are reported.
#[derive(Clone, Copy)]
enum StrikeSource {
    Actor,
    Blast,
    Projectile,
    Body,
}

/// Collects every live hitbox and hurtbox, resolves them, and applies the results.
#[allow(clippy::too_many_arguments)]
fn resolve_hits(
    mut commands: Commands,
    config: Res<SimConfig>,
    data: Res<GameData>,
    mut ctx: ResMut<SimContext>,
    bindings: Res<MountBindings>,
    mut roster: ResMut<PlayerRoster>,
    mut combatants: Query<Combatant>,
    mut blasts: Query<(Entity, &SpawnOrder, &Position, &Facing, &mut MagicBlast), Without<Actor>>,
    projectiles: Query<(Entity, &SpawnOrder, &Position, &Facing, &Projectile), Without<Actor>>,
    mut hit_events: EventWriter<HitEvent>,
) {
    let now = ctx.tick;
    let scale = config.depth_scale;
    let mut strikers = Vec::new();
    let mut targets = Vec::new();
    let mut sources: HashMap<Entity, (StrikeSource, Entity)> = HashMap::new();
    // Bodies alive when resolution began; all of them take every hit this tick
    let mut alive = HashSet::new();

    for mut c in &mut combatants {
        if c.dead || c.health.is_dead() {
            continue;
        }
        alive.insert(c.entity);
        let state = c.action.current();

        if state.is_attack() {
            let kind = c.actor.clip_source(state, c.mounted.map(|m| m.kind));
            let hitbox = data
                .clips(kind)
                .get(state)
                .and_then(|clip| clip.active_hitbox(c.action.elapsed(now)))
                .copied();
            if let Some(hitbox) = hitbox {
                let entered_at = c.action.entered_at();
                c.hits.begin(entered_at);
                let attack = data.attack(hitbox.attack);
                let mut descriptor = attack.descriptor;
                if let Some(damage_scale) = c.damage_scale {
                    descriptor.damage = damage_scale.apply(descriptor.damage);
                }
                if state == ActionState::Attack3 {
                    descriptor.knockdown = true;
                }

                if let Some(projectile) = attack.projectile {
                    if c.hits.launch() {
                        let order = ctx.next_spawn_order();
                        commands.spawn((
                            Projectile {
                                owner: c.entity,
                                allegiance: *c.allegiance,
                                area: projectile.area,
                                attack: descriptor,
                                expires_at: now + projectile.lifetime_ticks,
                            },
                            *c.position,
                            Velocity {
                                x: c.facing.sign() * projectile.speed,
                                ..default()
                            },
                            *c.facing,
                            order,
                        ));
                    }
                } else {
                    sources.insert(c.entity, (StrikeSource::Actor, c.entity));
                    strikers.push(Striker {
                        entity: c.entity,
                        priority: PRIORITY_MELEE,
                        order: *c.order,
                        allegiance: *c.allegiance,
                        area: hitbox.area.place(&c.position, *c.facing, scale),
                        depth_reach: config.depth_proximity,
                        origin_x: c.position.x,
                        facing: *c.facing,
                        attack: descriptor,
                        already_struck: c.hits.struck().to_vec(),
                        single_target: false,
                    });
                }
            }
        }

        if let Some(thrown) = c.thrown.as_ref() {
            sources.insert(c.entity, (StrikeSource::Body, thrown.thrower));
            let mut already_struck = thrown.struck.clone();
            already_struck.push(thrown.thrower);
            strikers.push(Striker {
                entity: c.entity,
                priority: PRIORITY_BODY,
                order: *c.order,
                allegiance: thrown.allegiance,
                area: c.hurtbox.0.place(&c.position, *c.facing, scale),
                depth_reach: config.depth_proximity,
                origin_x: c.position.x - c.velocity.x,
                facing: *c.facing,
                attack: data.attack(data.thrown_body_attack()).descriptor,
                already_struck,
                single_target: false,
            });
        }

        let shielded_out = bindings.is_ridden(c.entity);
        let invincible = c.invincible.is_some_and(|inv| inv.active(now));
        if !shielded_out && !invincible {
            targets.push(Target {
                entity: c.entity,
                order: *c.order,
                allegiance: *c.allegiance,
                area: c.hurtbox.0.place(&c.position, *c.facing, scale),
                x: c.position.x,
            });
        }
    }

    for (entity, order, pos, facing, blast) in &blasts {
        if now >= blast.expires_at {
            continue;
        }
        sources.insert(entity, (StrikeSource::Blast, blast.caster));
        strikers.push(Striker {
            entity,
            priority: PRIORITY_MAGIC,
            order: *order,
            allegiance: Allegiance::Heroes,
            area: blast.area.place(pos, *facing, scale),
            depth_reach: blast.depth_reach,
            origin_x: pos.x,
            facing: *facing,
            attack: blast.attack,
            already_struck: blast.struck.clone(),
            single_target: false,
        });
    }

    for (entity, order, pos, facing, projectile) in &projectiles {
        sources.insert(entity, (StrikeSource::Projectile, projectile.owner));
        strikers.push(Striker {
            entity,
            priority: PRIORITY_BODY,
            order: *order,
            allegiance: projectile.allegiance,
            area: projectile.area.place(pos, *facing, scale),
            depth_reach: config.depth_proximity,
            origin_x: pos.x,
            facing: *facing,
            attack: projectile.attack,
            already_struck: Vec::new(),
            single_target: true,
        });
    }

    for strike in resolve_strikes(&strikers, &targets) {
        let Some(&(source, credit)) = sources.get(&strike.striker) else {
            continue;
        };

        // Striker bookkeeping
        let mut finisher_landed = false;
        match source {
            StrikeSource::Actor => {
                if let Ok(mut attacker) = combatants.get_mut(strike.striker) {
                    let first_landing = attacker.hits.struck().is_empty();
                    attacker.hits.record(strike.defender);
                    let state = attacker.action.current();
                    let cancel_after = data
                        .clip_duration(attacker.actor.kind, state)
                        .map_or(0, |d| (d as f32 * config.combo_cancel_fraction) as u64);
                    if let (true, Some(step), Some(mut combo)) =
                        (first_landing, ComboStep::from_action(state), attacker.combo)
                    {
                        finisher_landed =
                            combo.land(step, now, config.combo_window_ticks(), cancel_after);
                    }
                }
            }
            StrikeSource::Blast => {
                if let Ok((.., mut blast)) = blasts.get_mut(strike.striker) {
                    blast.struck.push(strike.defender);
                }
            }
            StrikeSource::Projectile => {
                commands.entity(strike.striker).despawn();
            }
            StrikeSource::Body => {
                if let Ok(mut body) = combatants.get_mut(strike.striker) {
                    if let Some(thrown) = body.thrown.as_mut() {
                        thrown.struck.push(strike.defender);
                    }
                }
            }
        }

        let kind = match source {
            StrikeSource::Actor => HitKind::Strike,
            StrikeSource::Blast => HitKind::Magic,
            StrikeSource::Projectile => HitKind::Projectile,
            StrikeSource::Body => HitKind::Body,
        };
        let mut strike = strike;
        if finisher_landed {
            strike.attack.knockdown = true;
        }

        // A mounted hero is shielded by the mount's health
        let shield = bindings.shielding_mount(strike.defender);
        let damage_target = shield.unwrap_or(strike.defender);
        if !alive.contains(&damage_target) {
            continue;
        }
        let Ok(mut target) = combatants.get_mut(damage_target) else {
            continue;
        };
        // The first lethal hit keeps the kill credit
        if !target.health.is_dead() {
            target.last_attacker.0 = Some(credit);
        }
        let dealt = target.health.take_damage(strike.attack.damage);
        let lethal = target.health.is_dead();
        if let Some(player) = target.player {
            roster.mark_damaged(player.slot);
        }
        let clips = data.clips(target.actor.kind);
        apply_reaction(
            &mut target.action,
            &mut target.position,
            &mut target.velocity,
            &strike,
            lethal,
            now,
            clips,
            config.ground_friction,
        );

        hit_events.send(HitEvent {
            attacker: credit,
            defender: damage_target,
            damage: dealt,
            knockdown: strike.attack.knockdown,
            kind,
        });

        if shield.is_some() {
            if let Ok(mut rider) = combatants.get_mut(strike.defender) {
                apply_knockback(
                    &mut rider.position,
                    &mut rider.velocity,
                    &strike,
                    config.ground_friction,
                );
            }
        }
    }
}

/// Finalizes every body whose health reached 0 this tick.
pub fn settle_deaths(
    mut commands: Commands,
    config: Res<SimConfig>,
    data: Res<GameData>,
    ctx: Res<SimContext>,
    mut roster: ResMut<PlayerRoster>,
    mut fallen: Query<
        (
            Entity,
            &Actor,
            &Health,
            &mut TimedState<ActionState>,
            &LastAttacker,
            &Position,
            Has<Player>,
        ),
        Without<Dead>,
    >,
    players: Query<&Player>,
    mut death_events: EventWriter<DeathEvent>,
    mut score_events: EventWriter<ScoreEvent>,
    mut life_events: EventWriter<LifeEvent>,
) {
    let now = ctx.tick;
    for (entity, actor, health, mut action, last_attacker, pos, is_player) in &mut fallen {
        if !health.is_dead() {
            continue;
        }
        if !action.is(ActionState::Death) {
            action.enter(
                ActionState::Death,
                now,
                data.clip_duration(actor.kind, ActionState::Death),
            );
        }
        commands.entity(entity).insert(Dead);
        if !is_player {
            commands.entity(entity).insert(Corpse {
                despawn_at: now + config.corpse_ticks,
            });
        }
        death_events.send(DeathEvent {
            entity,
            killed_by: last_attacker.0,
        });

        let ActorKind::Enemy(enemy) = actor.kind else {
            continue;
        };
        let def = data.enemy(enemy);
        if let Some(kind) = def.drops {
            commands.spawn((Pickup { kind }, *pos));
        }
        let Some(slot) = last_attacker.0.and_then(|e| players.get(e).ok()).map(|p| p.slot) else {
            continue;
        };
        if def.score > 0 {
            let extra_lives = roster.add_score(slot, def.score, &config.extra_life_scores);
            score_events.send(ScoreEvent {
                slot,
                points: def.score,
                total: roster.slot(slot).map_or(0, |record| record.score),
                reason: ScoreReason::Kill,
            });
            for _ in 0..extra_lives {
                life_events.send(LifeEvent {
                    slot,
                    change: LifeChange::ExtraLife,
                });
            }
        }
        debug!("{} defeated by {:?}", def.name, slot);
    }
}

/// Ends a throw's flight once the body is back on the ground.
fn land_thrown_bodies(
    mut commands: Commands,
    ctx: Res<SimContext>,
    bodies: Query<(Entity, &Thrown, &Position, &Velocity)>,
) {
    for (entity, thrown, pos, vel) in &bodies {
        if ctx.tick > thrown.launched_at && pos.z <= 0.0 && vel.z <= 0.0 {
            commands.entity(entity).remove::<Thrown>();
        }
    }
}

fn expire_blasts(
    mut commands: Commands,
    ctx: Res<SimContext>,
    blasts: Query<(Entity, &MagicBlast)>,
) {
    for (entity, blast) in &blasts {
        if ctx.tick >= blast.expires_at {
            commands.entity(entity).despawn();
        }
    }
}

/// Living players pick up anything within reach.
fn collect_pickups(
    mut commands: Commands,
    config: Res<SimConfig>,
    pickups: Query<(Entity, &Pickup, &Position), Without<Player>>,
    mut players: Query<(Entity, &Position, &mut Health, &mut MagicPool), (With<Player>, Without<Dead>)>,
    mut pickup_events: EventWriter<PickupEvent>,
) {
    for (pickup_entity, pickup, pickup_pos) in &pickups {
        let nearest = players
            .iter()
            .map(|(entity, pos, ..)| (entity, distance(pos, pickup_pos)))
            .filter(|(_, d)| *d <= config.interaction_range)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let Some((player, _)) = nearest else {
            continue;
        };
        let Ok((_, _, mut health, mut pool)) = players.get_mut(player) else {
            continue;
        };
        let taken = match pickup.kind {
            PickupKind::Shard => pool.add_shard(),
            PickupKind::Food(amount) => health.heal(amount) > 0,
        };
        if taken {
            commands.entity(pickup_entity).despawn();
            pickup_events.send(PickupEvent {
                player,
                kind: pickup.kind,
            });
        }
    }
}
