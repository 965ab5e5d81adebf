//! Motion integration and camera tracking.

use bevy::prelude::*;

use super::components::{Position, Velocity};
use crate::combat::{Dead, Projectile};
use crate::core::{SimConfig, SimContext};
use crate::player::Player;
use crate::state::{ActionState, TimedState};

/// Integrates velocity, gravity, and ground friction for every body.
///
/// Bodies that land leave their JUMP states. Depth is clamped to the level's
/// band and x to the level's length.
pub fn integrate_motion(
    config: Res<SimConfig>,
    ctx: Res<SimContext>,
    mut bodies: Query<
        (&mut Position, &mut Velocity, Option<&mut TimedState<ActionState>>),
        Without<Projectile>,
    >,
) {
    let now = ctx.tick;
    for (mut pos, mut vel, state) in &mut bodies {
        pos.x = (pos.x + vel.x).max(0.0).min(ctx.camera.level_width);
        pos.depth = ctx.depth_band.clamp(pos.depth + vel.depth);

        if pos.z > 0.0 || vel.z > 0.0 {
            vel.z -= config.gravity;
            pos.z += vel.z;
            if pos.z <= 0.0 {
                pos.z = 0.0;
                vel.z = 0.0;
                if let Some(mut state) = state {
                    if matches!(state.current(), ActionState::Jump | ActionState::JumpAttack) {
                        state.enter(ActionState::Idle, now, None);
                    }
                }
            }
            continue;
        }

        vel.x *= config.ground_friction;
        vel.depth *= config.ground_friction;
        if vel.x.abs() < 0.05 {
            vel.x = 0.0;
        }
        if vel.depth.abs() < 0.05 {
            vel.depth = 0.0;
        }
    }
}

/// Moves the camera to the living players' midpoint, then leashes players.
pub fn track_camera(
    mut ctx: ResMut<SimContext>,
    mut players: Query<&mut Position, (With<Player>, Without<Dead>)>,
) {
    let xs: Vec<f32> = players.iter().map(|pos| pos.x).collect();
    ctx.camera.track(&xs);
    for mut pos in &mut players {
        let clamped = ctx.camera.clamp_player(pos.x);
        if clamped != pos.x {
            pos.x = clamped;
        }
    }
}
