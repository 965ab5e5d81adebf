//! What an outer renderer or HUD sees after a tick.

use bevy::prelude::*;

use crate::core::SessionPhase;
use crate::player::{PlayerSlot, SlotStatus};
use crate::spatial::Position;
use crate::state::ActionState;

/// One drawable entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityView {
    pub entity: Entity,
    pub position: Position,
    /// Projected and camera-relative
    pub screen: Vec2,
    /// Position in back-to-front draw order
    pub draw_index: usize,
    pub action: Option<ActionState>,
    /// (current, max)
    pub health: Option<(i32, i32)>,
    pub hurtbox: Option<Rect>,
    /// Only while an attack frame is live
    pub hitbox: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HudView {
    pub slot: PlayerSlot,
    pub status: SlotStatus,
    pub health: i32,
    pub max_health: i32,
    pub shards: u8,
    pub score: u64,
    pub lives: u32,
    pub continues: u32,
}

/// Rebuilt at the end of every tick. Read-only for everything outside the
/// simulation.
#[derive(Resource, Debug, Clone)]
pub struct SimSnapshot {
    pub tick: u64,
    pub camera: Vec2,
    pub scroll_locked: bool,
    pub phase: SessionPhase,
    /// Sorted back to front
    pub entities: Vec<EntityView>,
    pub hud: Vec<HudView>,
}

impl Default for SimSnapshot {
    fn default() -> Self {
        Self {
            tick: 0,
            camera: Vec2::ZERO,
            scroll_locked: false,
            phase: SessionPhase::Playing,
            entities: Vec::new(),
            hud: Vec::new(),
        }
    }
}

impl SimSnapshot {
    pub fn entity(&self, entity: Entity) -> Option<&EntityView> {
        self.entities.iter().find(|view| view.entity == entity)
    }

    pub fn hud(&self, slot: PlayerSlot) -> Option<&HudView> {
        self.hud.iter().find(|view| view.slot == slot)
    }
}
