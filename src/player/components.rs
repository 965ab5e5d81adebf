//! Player-related components.

use bevy::prelude::*;

use crate::combat::{ActorBundle, Allegiance, ComboTracker, InputBuffer, MagicPool};
use crate::core::SpawnOrder;
use crate::spatial::Position;
use crate::world::{ActorKind, GameData, HeroId};

/// Index of a local player, starting at 0. Lower slots win ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerSlot(pub u8);

/// Marker component for a player-controlled body.
#[derive(Component, Debug, Clone, Copy)]
pub struct Player {
    pub slot: PlayerSlot,
}

/// Walk or run, picked by a horizontal double tap.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct Stride {
    pub running: bool,
}

#[derive(Bundle)]
pub struct PlayerBundle {
    pub actor: ActorBundle,
    pub player: Player,
    pub combo: ComboTracker,
    pub buffer: InputBuffer,
    pub magic: MagicPool,
    pub stride: Stride,
}

impl PlayerBundle {
    pub fn new(
        data: &GameData,
        hero: HeroId,
        slot: PlayerSlot,
        order: SpawnOrder,
        position: Position,
        tick: u64,
    ) -> Self {
        let def = data.hero(hero);
        Self {
            actor: ActorBundle::new(
                ActorKind::Hero(hero),
                order,
                Allegiance::Heroes,
                position,
                def.max_health,
                def.hurtbox,
                tick,
            ),
            player: Player { slot },
            combo: ComboTracker::default(),
            buffer: InputBuffer::default(),
            magic: MagicPool::default(),
            stride: Stride::default(),
        }
    }

    pub fn with_charges(mut self, charges: u8) -> Self {
        self.magic = MagicPool::new(charges);
        self
    }
}
