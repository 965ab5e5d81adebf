//! Core plugin that sets up the tick schedule, events, and the tick counter.

use bevy::prelude::*;

use super::context::SimContext;
use super::events::*;
use super::schedule::SimSet;

/// Core plugin - must be added first as other plugins depend on it.
///
/// This plugin sets up:
/// - The ordered tick phases in `FixedUpdate`
/// - Global events (HitEvent, DeathEvent, etc.)
/// - The tick counter and per-tick event rotation
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app
            // Register global events
            .add_event::<HitEvent>()
            .add_event::<DeathEvent>()
            .add_event::<MagicCastEvent>()
            .add_event::<ScoreEvent>()
            .add_event::<MountEvent>()
            .add_event::<EncounterEvent>()
            .add_event::<LifeEvent>()
            .add_event::<PickupEvent>()

            // One tick = these phases, in this order
            .configure_sets(
                FixedUpdate,
                (
                    SimSet::Begin,
                    SimSet::Input,
                    SimSet::Player,
                    SimSet::Movement,
                    SimSet::Combat,
                    SimSet::Ai,
                    SimSet::EnemyState,
                    SimSet::Encounter,
                    SimSet::Publish,
                )
                    .chain(),
            )
            .add_systems(
                FixedUpdate,
                (
                    rotate_events::<HitEvent>,
                    rotate_events::<DeathEvent>,
                    rotate_events::<MagicCastEvent>,
                    rotate_events::<ScoreEvent>,
                    rotate_events::<MountEvent>,
                    rotate_events::<EncounterEvent>,
                    rotate_events::<LifeEvent>,
                    rotate_events::<PickupEvent>,
                )
                    .before(advance_tick)
                    .in_set(SimSet::Begin),
            )
            .add_systems(FixedUpdate, advance_tick.in_set(SimSet::Begin));
    }
}

/// Swaps an event queue's buffers once per tick.
///
/// Only `FixedUpdate` runs per tick, so the engine's own per-frame swap never
/// happens. After the swap, `iter_current_update_events` holds exactly the
/// events of the tick being run and anything older than the previous tick is
/// dropped.
pub fn rotate_events<E: Event>(mut events: ResMut<Events<E>>) {
    events.update();
}

/// Advances the tick counter. Everything else in the tick reads this value.
pub fn advance_tick(mut ctx: ResMut<SimContext>) {
    ctx.tick += 1;
}
