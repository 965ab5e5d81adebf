//! Encounter systems - zone activation, spawning, cleanup, and session flow.

use bevy::prelude::*;

use super::zone::{ActiveZone, EncounterDirector, ZonePhase};
use crate::combat::{Corpse, Dead};
use crate::core::{
    EncounterChange, EncounterEvent, LifeChange, LifeEvent, ScoreEvent, ScoreReason, SessionPhase,
    SimConfig, SimContext, SimRng,
};
use crate::enemies::{spawn_enemy, Enemy, ZoneMember};
use crate::mount::MountBindings;
use crate::player::{PlayerRoster, SlotStatus};
use crate::spatial::{Facing, Position};
use crate::world::{GameData, SpawnSide};

/// Locks the camera when its right edge reaches the next zone's trigger.
pub fn activate_zones(
    config: Res<SimConfig>,
    data: Res<GameData>,
    mut ctx: ResMut<SimContext>,
    mut director: ResMut<EncounterDirector>,
    mut roster: ResMut<PlayerRoster>,
    mut encounter_events: EventWriter<EncounterEvent>,
) {
    if !ctx.is_playing() || ctx.pending_level.is_some() || director.is_locked() {
        return;
    }
    let Some(level) = data.level(ctx.current_level) else {
        return;
    };
    let index = director.next_zone;
    let Some(encounter) = level.encounters.get(index) else {
        return;
    };
    if ctx.camera.right_edge() < encounter.trigger_x {
        return;
    }

    let zone = ActiveZone::activate(index, encounter, roster.is_coop(), &config);
    info!(
        "Zone {} of {} locked: {} enemies, {} at a time",
        index,
        level.name,
        zone.remaining(),
        zone.cap()
    );
    ctx.camera.lock();
    roster.reset_damage_flags();
    director.active = Some(zone);
    encounter_events.send(EncounterEvent {
        zone: index,
        change: EncounterChange::Locked,
    });
}

/// Feeds the live zone from its queue and unlocks it once cleared.
#[allow(clippy::too_many_arguments)]
pub fn run_active_zone(
    mut commands: Commands,
    config: Res<SimConfig>,
    data: Res<GameData>,
    mut ctx: ResMut<SimContext>,
    mut rng: ResMut<SimRng>,
    mut bindings: ResMut<MountBindings>,
    mut director: ResMut<EncounterDirector>,
    mut roster: ResMut<PlayerRoster>,
    members: Query<&ZoneMember, Without<Dead>>,
    mut encounter_events: EventWriter<EncounterEvent>,
    mut score_events: EventWriter<ScoreEvent>,
    mut life_events: EventWriter<LifeEvent>,
) {
    let Some(zone) = director.active.as_mut() else {
        return;
    };
    let index = zone.index;
    let mut alive = members.iter().filter(|member| member.zone == index).count();

    if !roster.is_coop() && zone.revert_to_solo(&config) {
        info!("Co-op ended in zone {}; {} enemies left to come", index, zone.remaining());
        encounter_events.send(EncounterEvent {
            zone: index,
            change: EncounterChange::RevertedToSolo,
        });
    }

    let coop = zone.is_coop();
    for _ in 0..zone.spawn_budget(alive) {
        let Some(spawn) = zone.next_spawn() else {
            break;
        };
        let x = match spawn.side {
            SpawnSide::Left => ctx.camera.x - config.spawn_margin,
            SpawnSide::Right => ctx.camera.right_edge() + config.spawn_margin,
        };
        let x = x.max(0.0).min(ctx.camera.level_width);
        let depth = ctx.depth_band.clamp(spawn.depth);
        let facing = Facing::toward(x, ctx.camera.center());
        let enemy = spawn_enemy(
            &mut commands,
            &data,
            &config,
            &mut ctx,
            &mut rng,
            &mut bindings,
            spawn.enemy,
            Position::new(x, depth),
            facing,
            coop,
        );
        commands.entity(enemy).insert(ZoneMember { zone: index });
        alive += 1;
    }

    let mut unlocked = false;
    while let Some(phase) = zone.settle(alive) {
        let change = match phase {
            ZonePhase::Locked => continue,
            ZonePhase::Clearing => EncounterChange::Clearing,
            ZonePhase::Unlocked => {
                unlocked = true;
                EncounterChange::Unlocked
            }
        };
        encounter_events.send(EncounterEvent { zone: index, change });
    }
    if !unlocked {
        return;
    }

    director.active = None;
    director.next_zone = index + 1;
    ctx.camera.unlock();
    info!("Zone {} cleared at tick {}", index, ctx.tick);

    // Untouched survivors earn the wave bonus
    let untouched: Vec<_> = roster
        .slots()
        .filter(|(_, record)| {
            record.status == SlotStatus::Active && record.body.is_some() && !record.damaged_in_zone
        })
        .map(|(slot, _)| slot)
        .collect();
    for slot in untouched {
        let extra_lives = roster.add_score(slot, config.no_damage_wave_bonus, &config.extra_life_scores);
        score_events.send(ScoreEvent {
            slot,
            points: config.no_damage_wave_bonus,
            total: roster.slot(slot).map_or(0, |record| record.score),
            reason: ScoreReason::NoDamageWave,
        });
        for _ in 0..extra_lives {
            life_events.send(LifeEvent {
                slot,
                change: LifeChange::ExtraLife,
            });
        }
    }
}

/// Removes expired corpses and enemies left far behind the camera.
pub fn clear_remains(
    mut commands: Commands,
    config: Res<SimConfig>,
    ctx: Res<SimContext>,
    director: Res<EncounterDirector>,
    mut bindings: ResMut<MountBindings>,
    corpses: Query<(Entity, &Corpse)>,
    stragglers: Query<(Entity, &Position, Option<&ZoneMember>), (With<Enemy>, Without<Dead>)>,
) {
    let now = ctx.tick;
    for (entity, corpse) in &corpses {
        if now >= corpse.despawn_at {
            bindings.dissolve_mount(entity);
            bindings.dissolve_rider(entity);
            commands.entity(entity).despawn();
        }
    }

    let live_zone = director.active.as_ref().map(|zone| zone.index);
    let behind = ctx.camera.x - config.despawn_margin;
    for (entity, pos, member) in &stragglers {
        if pos.x >= behind || member.is_some_and(|member| Some(member.zone) == live_zone) {
            continue;
        }
        if let Some(binding) = bindings.dissolve_rider(entity) {
            commands.entity(binding.mount).despawn();
        }
        debug!("Despawned straggler {:?} at x={:.0}", entity, pos.x);
        commands.entity(entity).despawn();
    }
}

/// Moves the session from level to camp to the next level.
#[allow(clippy::too_many_arguments)]
pub fn advance_session(
    mut commands: Commands,
    config: Res<SimConfig>,
    data: Res<GameData>,
    mut ctx: ResMut<SimContext>,
    mut rng: ResMut<SimRng>,
    mut bindings: ResMut<MountBindings>,
    director: Res<EncounterDirector>,
    roster: Res<PlayerRoster>,
) {
    match ctx.phase {
        SessionPhase::Playing => {
            if ctx.pending_level.is_some() {
                return;
            }
            let Some(level) = data.level(ctx.current_level) else {
                return;
            };
            if !director.all_cleared(level.encounters.len()) || !ctx.camera.at_level_end() {
                return;
            }
            let until = ctx.tick + config.secs_to_ticks(config.camp_duration_secs);
            ctx.phase = SessionPhase::Camp { until };
            info!("{} cleared; camping until tick {}", level.name, until);

            let Some(pixie) = data.camp_pixie() else {
                return;
            };
            let coop = roster.is_coop();
            let count = config.pixie_count(coop);
            for i in 0..count {
                let x = ctx.camera.x + ctx.camera.width * (i + 1) as f32 / (count + 1) as f32;
                let band = ctx.depth_band;
                let depth = band.min + (band.max - band.min) * ((i % 3) as f32 + 0.5) / 3.0;
                spawn_enemy(
                    &mut commands,
                    &data,
                    &config,
                    &mut ctx,
                    &mut rng,
                    &mut bindings,
                    pixie,
                    Position::new(x, depth),
                    Facing::Left,
                    coop,
                );
            }
        }
        SessionPhase::Camp { until } if ctx.tick >= until => {
            let next = ctx.current_level + 1;
            if next < data.level_count() {
                ctx.pending_level = Some(next);
                ctx.level_index += 1;
                info!("Camp over; difficulty level {} next", ctx.level_index);
            } else {
                ctx.phase = SessionPhase::Complete;
                info!("Every level cleared at tick {}", ctx.tick);
            }
        }
        _ => {}
    }
}
