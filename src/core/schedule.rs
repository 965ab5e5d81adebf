//! Tick phases.

use bevy::prelude::*;

/// Ordered phases of one simulation tick, run in `FixedUpdate`.
///
/// The order is fixed: input is consumed, players act, bodies move, hits are
/// resolved, enemies think and animate, then encounter bookkeeping runs and
/// the snapshot is published. Every phase observes the results of the
/// phases before it within the same tick.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimSet {
    /// Tick counter, pending level loads
    Begin,
    /// Lives, continues, respawns
    Input,
    /// Player intent and player state timers
    Player,
    /// Velocity integration, camera tracking, mount following
    Movement,
    /// Hit detection and damage
    Combat,
    /// Enemy decisions
    Ai,
    /// Enemy and mount state timers
    EnemyState,
    /// Zones, spawns, corpses, session flow
    Encounter,
    /// Snapshot for renderers
    Publish,
}
