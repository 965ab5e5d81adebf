//! Snapshot plugin - publishes [`SimSnapshot`] at the end of each tick.

use std::collections::HashMap;

use bevy::prelude::*;

use super::view::{EntityView, HudView, SimSnapshot};
use crate::combat::{Dead, Health, Hurtbox, MagicBlast, MagicPool, Projectile, Thrown};
use crate::core::{SimConfig, SimContext, SimSet, SpawnOrder};
use crate::mount::Mounted;
use crate::player::{Player, PlayerRoster};
use crate::spatial::{draw_order, project, DrawKey, Facing, Position};
use crate::state::{ActionState, TimedState};
use crate::world::{Actor, GameData};

pub struct SnapshotPlugin;

impl Plugin for SnapshotPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimSnapshot>()
            .add_systems(FixedUpdate, publish_snapshot.in_set(SimSet::Publish));
    }
}

type Visible = (
    Entity,
    &'static Position,
    Option<&'static SpawnOrder>,
    Option<&'static Facing>,
    Option<&'static Actor>,
    Option<&'static TimedState<ActionState>>,
    Option<&'static Health>,
    Option<&'static Hurtbox>,
    Option<&'static Mounted>,
    Has<Dead>,
    (
        Option<&'static MagicBlast>,
        Option<&'static Projectile>,
        Option<&'static Thrown>,
    ),
);

/// Projects every positioned entity and gathers the per-player HUD.
pub fn publish_snapshot(
    config: Res<SimConfig>,
    data: Res<GameData>,
    ctx: Res<SimContext>,
    roster: Res<PlayerRoster>,
    mut snapshot: ResMut<SimSnapshot>,
    bodies: Query<Visible>,
    players: Query<(&Health, &MagicPool), With<Player>>,
) {
    let now = ctx.tick;
    let scale = config.depth_scale;
    let offset = ctx.camera.offset();

    let mut views = Vec::new();
    let mut keys = Vec::new();
    for (entity, pos, order, facing, actor, action, health, hurtbox, mounted, dead, flying) in &bodies {
        let facing = facing.copied().unwrap_or_default();
        let (blast, projectile, thrown) = flying;
        let clip_hitbox = match (actor, action) {
            (Some(actor), Some(action)) if action.current().is_attack() => {
                let state = action.current();
                let kind = actor.clip_source(state, mounted.map(|m| m.kind));
                data.clips(kind)
                    .get(state)
                    .and_then(|clip| clip.active_hitbox(action.elapsed(now)))
                    .map(|hitbox| hitbox.area)
            }
            _ => None,
        };
        // Same boxes the combat phase strikes with
        let hitbox = clip_hitbox
            .or_else(|| blast.filter(|blast| now < blast.expires_at).map(|blast| blast.area))
            .or_else(|| projectile.map(|projectile| projectile.area))
            .or_else(|| thrown.and(hurtbox).filter(|_| !dead).map(|hurtbox| hurtbox.0))
            .map(|area| area.place(pos, facing, scale).shifted(offset));
        views.push(EntityView {
            entity,
            position: *pos,
            screen: project(pos, offset, scale),
            draw_index: 0,
            action: action.map(|action| action.current()),
            health: health.map(|h| (h.current(), h.max())),
            hurtbox: hurtbox
                .filter(|_| !dead)
                .map(|hurtbox| hurtbox.0.place(pos, facing, scale).shifted(offset)),
            hitbox,
        });
        keys.push(DrawKey {
            entity,
            depth: pos.depth,
            x: pos.x,
            order: order.copied().unwrap_or(SpawnOrder(u64::MAX)),
        });
    }

    let ranks: HashMap<Entity, usize> = draw_order(&keys)
        .into_iter()
        .enumerate()
        .map(|(rank, entity)| (entity, rank))
        .collect();
    for view in &mut views {
        view.draw_index = ranks.get(&view.entity).copied().unwrap_or_default();
    }
    views.sort_by_key(|view| view.draw_index);

    let hud = roster
        .slots()
        .map(|(slot, record)| {
            let body = record.body.and_then(|body| players.get(body).ok());
            HudView {
                slot,
                status: record.status,
                health: body.map_or(0, |(health, _)| health.current()),
                max_health: body.map_or(0, |(health, _)| health.max()),
                shards: body.map_or(0, |(_, pool)| pool.charges()),
                score: record.score,
                lives: record.lives,
                continues: record.continues,
            }
        })
        .collect();

    *snapshot = SimSnapshot {
        tick: now,
        camera: offset,
        scroll_locked: ctx.camera.is_locked(),
        phase: ctx.phase,
        entities: views,
        hud,
    };
}
