//! Combat-related components.

use bevy::prelude::*;
use serde::Deserialize;

use crate::core::SpawnOrder;
use crate::spatial::{BoxSpec, Facing, Position, Velocity};
use crate::state::{ActionState, TimedState};
use crate::world::{Actor, ActorKind};

use super::magic::MagicTier;

/// Component for entities that can take damage.
///
/// `current` always stays within `0..=max`.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    current: i32,
    max: i32,
}

impl Health {
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self { current: max, max }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Removes up to `amount` and returns what was actually removed.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let actual = amount.max(0).min(self.current);
        self.current -= actual;
        actual
    }

    pub fn heal(&mut self, amount: i32) -> i32 {
        let actual = amount.max(0).min(self.max - self.current);
        self.current += actual;
        actual
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }

    pub fn percentage(&self) -> f32 {
        self.current as f32 / self.max as f32
    }
}

/// Which side an entity fights for. Equal sides never damage each other.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Allegiance {
    Heroes,
    Horde,
    /// Riderless mounts and inert props; never struck, never strikes
    Neutral,
}

impl Allegiance {
    pub fn can_strike(self, other: Allegiance) -> bool {
        self != other && self != Allegiance::Neutral && other != Allegiance::Neutral
    }
}

/// Hurtbox relative to the entity's feet.
#[derive(Component, Debug, Clone, Copy)]
pub struct Hurtbox(pub BoxSpec);

/// Ignores all damage until the given tick.
#[derive(Component, Debug, Clone, Copy)]
pub struct Invincible {
    pub until: u64,
}

impl Invincible {
    pub fn active(&self, now: u64) -> bool {
        now < self.until
    }
}

/// Marker for entities whose health reached 0.
#[derive(Component, Debug)]
pub struct Dead;

/// Removed from the world at the given tick.
#[derive(Component, Debug, Clone, Copy)]
pub struct Corpse {
    pub despawn_at: u64,
}

/// Defenders already struck by the current attack activation.
///
/// An activation is identified by the tick its attack state was entered, so
/// re-entering the same attack starts a fresh list.
#[derive(Component, Debug, Default, Clone)]
pub struct HitRegistry {
    activation: Option<u64>,
    struck: Vec<Entity>,
    launched: bool,
}

impl HitRegistry {
    /// Starts tracking a new activation; a no-op if it is already current.
    pub fn begin(&mut self, activation: u64) {
        if self.activation != Some(activation) {
            self.activation = Some(activation);
            self.struck.clear();
            self.launched = false;
        }
    }

    /// True the first time it is called in an activation. Gates projectile launches.
    pub fn launch(&mut self) -> bool {
        !std::mem::replace(&mut self.launched, true)
    }

    pub fn struck(&self) -> &[Entity] {
        &self.struck
    }

    pub fn record(&mut self, defender: Entity) {
        if !self.struck.contains(&defender) {
            self.struck.push(defender);
        }
    }
}

/// Who last damaged this entity. Used to credit kills.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct LastAttacker(pub Option<Entity>);

/// What a landed hit does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackDescriptor {
    pub damage: i32,
    /// (horizontal push, upward lift)
    pub knockback: Vec2,
    pub hit_stun_ticks: u64,
    pub knockdown: bool,
}

/// Multiplier applied to an enemy's outgoing damage.
#[derive(Component, Debug, Clone, Copy)]
pub struct DamageScale(pub f32);

impl DamageScale {
    pub fn apply(&self, damage: i32) -> i32 {
        if damage <= 0 {
            return 0;
        }
        ((damage as f32 * self.0).round() as i32).max(1)
    }
}

/// Transient area damage left behind by a magic cast.
#[derive(Component, Debug, Clone)]
pub struct MagicBlast {
    pub caster: Entity,
    pub tier: MagicTier,
    pub area: BoxSpec,
    pub depth_reach: f32,
    pub attack: AttackDescriptor,
    pub expires_at: u64,
    pub struck: Vec<Entity>,
}

/// A flying hitbox launched by an attack.
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub owner: Entity,
    pub allegiance: Allegiance,
    pub area: BoxSpec,
    pub attack: AttackDescriptor,
    pub expires_at: u64,
}

/// A body in flight after a throw. Strikes the thrower's enemies, once each.
#[derive(Component, Debug, Clone)]
pub struct Thrown {
    pub thrower: Entity,
    pub allegiance: Allegiance,
    pub launched_at: u64,
    pub struck: Vec<Entity>,
}

/// A throw queued by the player phase, resolved in combat.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingThrow {
    pub target: Entity,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub enum PickupKind {
    /// One magic charge
    Shard,
    /// Restores the given health
    Food(i32),
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Pickup {
    pub kind: PickupKind,
}

/// Components shared by every hittable actor.
#[derive(Bundle)]
pub struct ActorBundle {
    pub actor: Actor,
    pub order: SpawnOrder,
    pub allegiance: Allegiance,
    pub position: Position,
    pub velocity: Velocity,
    pub facing: Facing,
    pub action: TimedState<ActionState>,
    pub health: Health,
    pub hurtbox: Hurtbox,
    pub hits: HitRegistry,
    pub last_attacker: LastAttacker,
}

impl ActorBundle {
    pub fn new(
        kind: ActorKind,
        order: SpawnOrder,
        allegiance: Allegiance,
        position: Position,
        max_health: i32,
        hurtbox: BoxSpec,
        tick: u64,
    ) -> Self {
        Self {
            actor: Actor { kind },
            order,
            allegiance,
            position,
            velocity: Velocity::default(),
            facing: Facing::default(),
            action: TimedState::new(ActionState::Idle, tick),
            health: Health::new(max_health),
            hurtbox: Hurtbox(hurtbox),
            hits: HitRegistry::default(),
            last_attacker: LastAttacker::default(),
        }
    }

    pub fn facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_clamps_at_zero() {
        let mut health = Health::new(8);
        assert_eq!(health.take_damage(3), 3);
        assert_eq!(health.current(), 5);
        assert_eq!(health.take_damage(20), 5);
        assert_eq!(health.current(), 0);
        assert!(health.is_dead());
    }

    #[test]
    fn test_health_heal_clamps_at_max() {
        let mut health = Health::new(8);
        health.take_damage(2);
        assert_eq!(health.heal(10), 2);
        assert_eq!(health.current(), 8);
    }

    #[test]
    fn test_negative_damage_is_ignored() {
        let mut health = Health::new(8);
        assert_eq!(health.take_damage(-4), 0);
        assert_eq!(health.current(), 8);
    }

    #[test]
    fn test_allegiance_rules() {
        assert!(Allegiance::Heroes.can_strike(Allegiance::Horde));
        assert!(Allegiance::Horde.can_strike(Allegiance::Heroes));
        assert!(!Allegiance::Heroes.can_strike(Allegiance::Heroes));
        assert!(!Allegiance::Horde.can_strike(Allegiance::Neutral));
    }

    #[test]
    fn test_hit_registry_resets_per_activation() {
        let mut hits = HitRegistry::default();
        let target = Entity::from_raw(4);
        hits.begin(10);
        hits.record(target);
        hits.record(target);
        assert_eq!(hits.struck().len(), 1);

        hits.begin(10);
        assert_eq!(hits.struck().len(), 1);
        hits.begin(40);
        assert!(hits.struck().is_empty());
    }

    #[test]
    fn test_launch_once_per_activation() {
        let mut hits = HitRegistry::default();
        hits.begin(3);
        assert!(hits.launch());
        assert!(!hits.launch());
        hits.begin(9);
        assert!(hits.launch());
    }

    #[test]
    fn test_damage_scale_rounds_and_floors_at_one() {
        assert_eq!(DamageScale(1.3).apply(3), 4);
        assert_eq!(DamageScale(0.1).apply(2), 1);
        assert_eq!(DamageScale(2.0).apply(0), 0);
    }
}
