//! Global events used for cross-system communication.
//!
//! The simulation never talks to audio, rendering, or UI directly. Instead
//! each module sends an event when something observable happens and any
//! outer collaborator reads them after the tick.

use bevy::prelude::*;

use crate::combat::MagicTier;
use crate::player::PlayerSlot;

/// How a hit was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitKind {
    Strike,
    Throw,
    Magic,
    Projectile,
    Body,
}

/// Sent for every hit that lands, in resolution order.
#[derive(Event, Debug, Clone)]
pub struct HitEvent {
    /// Entity whose hitbox connected
    pub attacker: Entity,
    /// Entity whose health was reduced (the mount when a rider is shielded)
    pub defender: Entity,
    /// Damage actually removed after clamping
    pub damage: i32,
    pub knockdown: bool,
    pub kind: HitKind,
}

/// Sent when an entity's health reaches 0 and it enters DEATH.
#[derive(Event, Debug, Clone)]
pub struct DeathEvent {
    /// Entity that died
    pub entity: Entity,
    /// Entity that dealt the final blow (if any)
    pub killed_by: Option<Entity>,
}

/// Sent when a player spends their magic pool.
#[derive(Event, Debug, Clone)]
pub struct MagicCastEvent {
    pub caster: Entity,
    pub slot: PlayerSlot,
    pub tier: MagicTier,
    pub shards_spent: u8,
}

/// Why points were awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreReason {
    Kill,
    NoDamageWave,
}

/// Sent whenever a player's score changes.
#[derive(Event, Debug, Clone)]
pub struct ScoreEvent {
    pub slot: PlayerSlot,
    pub points: u64,
    pub total: u64,
    pub reason: ScoreReason,
}

/// Mount binding changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountChange {
    Mounted,
    Dismounted,
    /// The mount's health ran out and the rider was dropped
    Destroyed,
    /// A hostile rider died and the mount is free to take
    Freed,
}

#[derive(Event, Debug, Clone)]
pub struct MountEvent {
    pub rider: Entity,
    pub mount: Entity,
    pub change: MountChange,
}

/// Encounter zone lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncounterChange {
    Locked,
    Clearing,
    Unlocked,
    /// Co-op ended mid-zone and the spawn queue shrank to the solo budget
    RevertedToSolo,
}

#[derive(Event, Debug, Clone)]
pub struct EncounterEvent {
    pub zone: usize,
    pub change: EncounterChange,
}

/// Lives, continues and respawns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeChange {
    LifeLost { remaining: u32 },
    Respawned,
    ExtraLife,
    ContinueOffered { deadline: u64 },
    ContinueTaken { remaining: u32 },
    Spent,
}

#[derive(Event, Debug, Clone)]
pub struct LifeEvent {
    pub slot: PlayerSlot,
    pub change: LifeChange,
}

/// Sent when a player collects a pickup.
#[derive(Event, Debug, Clone)]
pub struct PickupEvent {
    pub player: Entity,
    pub kind: crate::combat::PickupKind,
}
