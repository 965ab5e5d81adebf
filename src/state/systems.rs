//! Timer advancement for body states.

use bevy::ecs::query::QueryFilter;
use bevy::prelude::*;

use super::machine::{ActionState, TimedState};
use crate::core::SimContext;
use crate::mount::Mounted;
use crate::world::{Actor, GameData};

/// Moves every elapsed body state to its follow-up.
///
/// Registered once for players and once for everything else, so each side
/// advances in its own phase of the tick.
pub fn advance_states<F: QueryFilter>(
    ctx: Res<SimContext>,
    data: Res<GameData>,
    mut bodies: Query<(&Actor, &mut TimedState<ActionState>, Option<&Mounted>), F>,
) {
    let now = ctx.tick;
    for (actor, mut state, mounted) in &mut bodies {
        if !state.has_elapsed(now) {
            continue;
        }
        let riding = mounted.map(|m| m.kind);
        state.advance(now, |next| {
            data.clip_duration(actor.clip_source(next, riding), next)
        });
    }
}
