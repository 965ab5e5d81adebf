//! Enemy-related components.

use bevy::prelude::*;

use crate::combat::{ActorBundle, Allegiance, DamageScale};
use crate::core::SpawnOrder;
use crate::spatial::{Facing, Position};
use crate::state::{AiState, TimedState};
use crate::world::{ActorKind, EnemyData, EnemyId};

/// Marker component for all enemies, with the definition they came from.
#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy {
    pub kind: EnemyId,
}

/// Enemy stats after difficulty scaling.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct EnemyStats {
    pub move_speed: f32,
    pub approach_range: f32,
    pub attack_range: f32,
    pub attack_cooldown_ticks: u64,
    /// Flees players instead of fighting
    pub passive: bool,
}

/// Decision memory for one enemy.
#[derive(Component, Debug, Clone)]
pub struct AiController {
    /// Looked up again every re-evaluation, never trusted across one
    pub target: Option<Entity>,
    pub last_reevaluation: Option<u64>,
    /// Ticks between target re-evaluations, fixed per enemy at spawn
    pub reevaluation_interval: u64,
    pub cooldown_until: u64,
}

impl AiController {
    pub fn new(reevaluation_interval: u64) -> Self {
        Self {
            target: None,
            last_reevaluation: None,
            reevaluation_interval: reevaluation_interval.max(1),
            cooldown_until: 0,
        }
    }

    pub fn needs_reevaluation(&self, now: u64) -> bool {
        match self.last_reevaluation {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.reevaluation_interval,
        }
    }

    pub fn cooldown_ready(&self, now: u64) -> bool {
        now >= self.cooldown_until
    }
}

/// The encounter zone an enemy was spawned by.
#[derive(Component, Debug, Clone, Copy)]
pub struct ZoneMember {
    pub zone: usize,
}

/// Health, damage and speed of an enemy at spawn time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledStats {
    pub max_health: i32,
    pub damage_scale: f32,
    pub move_speed: f32,
}

impl ScaledStats {
    /// Applies the level multiplier, plus the co-op multiplier for bosses.
    pub fn new(def: &EnemyData, difficulty: f32, coop_boss_multiplier: Option<f32>) -> Self {
        let boss = match coop_boss_multiplier {
            Some(multiplier) if def.boss => multiplier,
            _ => 1.0,
        };
        Self {
            max_health: ((def.max_health * difficulty * boss).round() as i32).max(1),
            damage_scale: difficulty,
            move_speed: def.move_speed * difficulty,
        }
    }
}

#[derive(Bundle)]
pub struct EnemyBundle {
    pub actor: ActorBundle,
    pub enemy: Enemy,
    pub stats: EnemyStats,
    pub controller: AiController,
    pub mind: TimedState<AiState>,
    pub damage_scale: DamageScale,
}

impl EnemyBundle {
    pub fn new(
        def: &EnemyData,
        kind: EnemyId,
        scaled: ScaledStats,
        order: SpawnOrder,
        position: Position,
        reevaluation_interval: u64,
        tick: u64,
    ) -> Self {
        Self {
            actor: ActorBundle::new(
                ActorKind::Enemy(kind),
                order,
                Allegiance::Horde,
                position,
                scaled.max_health,
                def.hurtbox,
                tick,
            ),
            enemy: Enemy { kind },
            stats: EnemyStats {
                move_speed: scaled.move_speed,
                approach_range: def.approach_range,
                attack_range: def.attack_range,
                attack_cooldown_ticks: def.attack_cooldown_ticks,
                passive: def.passive,
            },
            controller: AiController::new(reevaluation_interval),
            mind: TimedState::new(AiState::Idle, tick),
            damage_scale: DamageScale(scaled.damage_scale),
        }
    }

    pub fn facing(mut self, facing: Facing) -> Self {
        self.actor = self.actor.facing(facing);
        self
    }
}
