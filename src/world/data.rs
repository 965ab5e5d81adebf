//! RON file formats.
//!
//! These structs mirror the files under `assets/data/` one to one. They
//! refer to each other by name; [`GameData`](super::GameData) resolves the
//! names to typed ids and validates everything before the simulation sees it.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::combat::PickupKind;
use crate::spatial::{BoxSpec, DepthBand};
use crate::state::ActionState;

/// `content.ron`: every hero, enemy, mount, and attack.
#[derive(Deserialize, Debug, Clone)]
pub struct ContentFile {
    pub attacks: BTreeMap<String, AttackDef>,
    pub heroes: Vec<HeroDef>,
    pub enemies: Vec<EnemyDef>,
    pub mounts: Vec<MountDef>,
    /// Attack a thrown body deals to whatever it flies into
    pub thrown_body_attack: String,
    /// Enemy type used for camp pixies
    #[serde(default)]
    pub camp_pixie: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AttackDef {
    pub damage: i32,
    /// (horizontal push, upward lift) in pixels per tick
    #[serde(default)]
    pub knockback: (f32, f32),
    #[serde(default = "default_hit_stun")]
    pub hit_stun_ticks: u64,
    #[serde(default)]
    pub knockdown: bool,
    /// Launches a separate projectile instead of striking directly
    #[serde(default)]
    pub projectile: Option<ProjectileDef>,
}

fn default_hit_stun() -> u64 {
    18
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct ProjectileDef {
    pub speed: f32,
    pub lifetime_ticks: u64,
    pub area: BoxSpec,
}

/// One animation clip. Duration is `frames * frame_ticks`.
#[derive(Deserialize, Debug, Clone)]
pub struct ClipDef {
    pub frames: u32,
    pub frame_ticks: u32,
    #[serde(default)]
    pub hitbox: Option<ClipHitboxDef>,
}

/// A hitbox active on frames `first..=last` of its clip.
#[derive(Deserialize, Debug, Clone)]
pub struct ClipHitboxDef {
    pub frames: (u32, u32),
    pub area: BoxSpec,
    pub attack: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct HeroDef {
    pub name: String,
    pub max_health: i32,
    pub hurtbox: BoxSpec,
    pub clips: BTreeMap<ActionState, ClipDef>,
    /// Exactly three entries, one per tier
    pub magic: Vec<MagicTierDef>,
    pub throw: ThrowDef,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MagicTierDef {
    pub area: BoxSpec,
    /// Depth tolerance of the blast
    pub depth_reach: f32,
    pub attack: String,
}

/// Throw damage by distance band.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct ThrowDef {
    pub close_damage: i32,
    pub far_damage: i32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct EnemyDef {
    pub name: String,
    pub max_health: f32,
    pub move_speed: f32,
    pub approach_range: f32,
    pub attack_range: f32,
    pub attack_cooldown_ticks: u64,
    pub score: u64,
    pub hurtbox: BoxSpec,
    pub clips: BTreeMap<ActionState, ClipDef>,
    #[serde(default)]
    pub boss: bool,
    /// Flees instead of fighting (camp pixies)
    #[serde(default)]
    pub passive: bool,
    /// Spawns riding this mount
    #[serde(default)]
    pub mount: Option<String>,
    #[serde(default)]
    pub drops: Option<PickupKind>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MountDef {
    pub name: String,
    pub max_health: i32,
    pub speed: f32,
    pub hurtbox: BoxSpec,
    pub clips: BTreeMap<ActionState, ClipDef>,
}

/// `levels/*.ron`: one stage.
#[derive(Deserialize, Debug, Clone)]
pub struct LevelFile {
    pub name: String,
    pub width: f32,
    pub depth_band: DepthBand,
    /// (x, depth) per player slot
    pub player_starts: Vec<(f32, f32)>,
    #[serde(default)]
    pub mounts: Vec<MountPlacement>,
    #[serde(default)]
    pub pickups: Vec<PickupPlacement>,
    pub encounters: Vec<EncounterDef>,
    #[serde(default)]
    pub ai_tuning: AiTuning,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MountPlacement {
    pub mount: String,
    pub x: f32,
    pub depth: f32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PickupPlacement {
    pub kind: PickupKind,
    pub x: f32,
    pub depth: f32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct EncounterDef {
    /// Zone activates when the camera's right edge reaches this x
    pub trigger_x: f32,
    pub spawns: Vec<SpawnDef>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct SpawnDef {
    pub enemy: String,
    pub side: SpawnSide,
    pub depth: f32,
}

/// Which screen edge an enemy walks in from.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnSide {
    Left,
    Right,
}

/// Per-level enemy behaviour knobs.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AiTuning {
    pub retreat_ticks: u64,
    /// Retreat speed as a fraction of move speed
    pub retreat_speed: f32,
    /// Stand-off distance from the target when flanking
    pub flank_offset: f32,
    /// Enemies closer than this to a target count toward its claim
    pub claim_radius: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            retreat_ticks: 24,
            retreat_speed: 0.6,
            flank_offset: 36.0,
            claim_radius: 160.0,
        }
    }
}
