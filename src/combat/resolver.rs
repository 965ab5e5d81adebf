//! Pure hit detection.
//!
//! Given every live hitbox and hurtbox of a tick, decide which hits land and
//! in which order. No world access, so the rules can be tested exhaustively.

use bevy::prelude::*;

use super::components::{Allegiance, AttackDescriptor};
use crate::core::SpawnOrder;
use crate::spatial::{distance, overlap, Facing, Position, WorldBox};

/// Resolution priority. Higher goes first.
pub const PRIORITY_MELEE: u8 = 0;
pub const PRIORITY_BODY: u8 = 1;
pub const PRIORITY_MAGIC: u8 = 2;

/// A live hitbox this tick.
#[derive(Debug, Clone)]
pub struct Striker {
    /// Entity that owns the box (the attacker, blast, or projectile)
    pub entity: Entity,
    pub priority: u8,
    pub order: SpawnOrder,
    pub allegiance: Allegiance,
    pub area: WorldBox,
    pub depth_reach: f32,
    /// x the knockback pushes away from
    pub origin_x: f32,
    pub facing: Facing,
    pub attack: AttackDescriptor,
    /// Defenders this activation has already struck
    pub already_struck: Vec<Entity>,
    /// Stops after the first landed hit
    pub single_target: bool,
}

/// A live hurtbox this tick.
#[derive(Debug, Clone, Copy)]
pub struct Target {
    pub entity: Entity,
    pub order: SpawnOrder,
    pub allegiance: Allegiance,
    pub area: WorldBox,
    pub x: f32,
}

/// One landed hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Strike {
    pub striker: Entity,
    pub defender: Entity,
    pub attack: AttackDescriptor,
    /// -1 or 1: the direction the defender is pushed
    pub push: f32,
}

/// Resolves every landed hit of a tick.
///
/// Strikers go by priority, then creation order; each scans targets in
/// creation order. Same-side pairs never hit. A striker never hits the same
/// defender twice in one activation. All qualifying hits land even if an
/// earlier one in the list would kill the defender; applying them is the
/// caller's job.
pub fn resolve_strikes(strikers: &[Striker], targets: &[Target]) -> Vec<Strike> {
    let mut strikers: Vec<&Striker> = strikers.iter().collect();
    strikers.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.order.cmp(&b.order)));
    let mut targets: Vec<&Target> = targets.iter().collect();
    targets.sort_by_key(|target| target.order);

    let mut strikes = Vec::new();
    for striker in strikers {
        let mut struck = striker.already_struck.clone();
        for target in &targets {
            if target.entity == striker.entity
                || !striker.allegiance.can_strike(target.allegiance)
                || struck.contains(&target.entity)
                || !overlap(&striker.area, &target.area, striker.depth_reach)
            {
                continue;
            }
            struck.push(target.entity);
            strikes.push(Strike {
                striker: striker.entity,
                defender: target.entity,
                attack: striker.attack,
                push: push_direction(striker.origin_x, target.x, striker.facing),
            });
            if striker.single_target {
                break;
            }
        }
    }
    strikes
}

/// Away from the attacker, or along its facing when they stand on the same x.
pub fn push_direction(attacker_x: f32, defender_x: f32, facing: Facing) -> f32 {
    if defender_x > attacker_x {
        1.0
    } else if defender_x < attacker_x {
        -1.0
    } else {
        facing.sign()
    }
}

/// A body that might be grabbed.
#[derive(Debug, Clone, Copy)]
pub struct GrabCandidate {
    pub entity: Entity,
    pub order: SpawnOrder,
    pub position: Position,
}

/// Nearest candidate in front of the thrower within `grab_range` and the
/// depth tolerance. Ties go to the older entity.
pub fn grab_target(
    thrower: &Position,
    facing: Facing,
    candidates: &[GrabCandidate],
    grab_range: f32,
    depth_tolerance: f32,
) -> Option<(Entity, f32)> {
    candidates
        .iter()
        .filter(|c| (c.position.x - thrower.x) * facing.sign() >= 0.0)
        .filter(|c| (c.position.depth - thrower.depth).abs() <= depth_tolerance)
        .map(|c| (c, distance(thrower, &c.position)))
        .filter(|(_, d)| *d <= grab_range)
        .min_by(|(a, da), (b, db)| da.total_cmp(db).then(a.order.cmp(&b.order)))
        .map(|(c, d)| (c.entity, d))
}

/// Throws deal more damage at close range.
pub fn throw_damage(distance: f32, grab_range: f32, close: i32, far: i32) -> i32 {
    if distance <= grab_range * 0.5 {
        close
    } else {
        far
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::BoxSpec;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const BODY: BoxSpec = BoxSpec { x: -10.0, y: 0.0, w: 20.0, h: 48.0 };
    const FIST: BoxSpec = BoxSpec { x: 6.0, y: 20.0, w: 24.0, h: 14.0 };

    fn jab() -> AttackDescriptor {
        AttackDescriptor {
            damage: 2,
            knockback: Vec2::new(1.0, 0.0),
            hit_stun_ticks: 18,
            knockdown: false,
        }
    }

    fn striker(index: u32, order: u64, allegiance: Allegiance, pos: Position, facing: Facing) -> Striker {
        Striker {
            entity: Entity::from_raw(index),
            priority: PRIORITY_MELEE,
            order: SpawnOrder(order),
            allegiance,
            area: FIST.place(&pos, facing, 1.0),
            depth_reach: 15.0,
            origin_x: pos.x,
            facing,
            attack: jab(),
            already_struck: Vec::new(),
            single_target: false,
        }
    }

    fn target(index: u32, order: u64, allegiance: Allegiance, pos: Position) -> Target {
        Target {
            entity: Entity::from_raw(index),
            order: SpawnOrder(order),
            allegiance,
            area: BODY.place(&pos, Facing::Right, 1.0),
            x: pos.x,
        }
    }

    #[test]
    fn test_hit_lands_and_pushes_away() {
        let s = striker(0, 0, Allegiance::Heroes, Position::new(100.0, 200.0), Facing::Right);
        let t = target(1, 1, Allegiance::Horde, Position::new(120.0, 200.0));
        let strikes = resolve_strikes(&[s], &[t]);
        assert_eq!(strikes.len(), 1);
        assert_eq!(strikes[0].defender, Entity::from_raw(1));
        assert_eq!(strikes[0].push, 1.0);
    }

    #[test]
    fn test_depth_gap_prevents_hit() {
        let s = striker(0, 0, Allegiance::Heroes, Position::new(100.0, 200.0), Facing::Right);
        let t = target(1, 1, Allegiance::Horde, Position::new(120.0, 220.0));
        assert!(resolve_strikes(&[s], &[t]).is_empty());
    }

    #[test]
    fn test_one_hit_per_activation() {
        let mut s = striker(0, 0, Allegiance::Heroes, Position::new(100.0, 200.0), Facing::Right);
        s.already_struck.push(Entity::from_raw(1));
        let t = target(1, 1, Allegiance::Horde, Position::new(120.0, 200.0));
        assert!(resolve_strikes(&[s], &[t]).is_empty());
    }

    #[test]
    fn test_simultaneous_hits_all_register_in_creation_order() {
        let t = target(9, 9, Allegiance::Heroes, Position::new(120.0, 200.0));
        let late = striker(2, 5, Allegiance::Horde, Position::new(140.0, 200.0), Facing::Left);
        let early = striker(1, 3, Allegiance::Horde, Position::new(100.0, 200.0), Facing::Right);
        let strikes = resolve_strikes(&[late, early], &[t]);
        let order: Vec<Entity> = strikes.iter().map(|s| s.striker).collect();
        assert_eq!(order, vec![Entity::from_raw(1), Entity::from_raw(2)]);
        assert_eq!(strikes[0].push, 1.0);
        assert_eq!(strikes[1].push, -1.0);
    }

    #[test]
    fn test_magic_resolves_before_melee() {
        let t = target(9, 0, Allegiance::Horde, Position::new(120.0, 200.0));
        let melee = striker(1, 1, Allegiance::Heroes, Position::new(100.0, 200.0), Facing::Right);
        let mut magic = striker(2, 7, Allegiance::Heroes, Position::new(100.0, 200.0), Facing::Right);
        magic.priority = PRIORITY_MAGIC;
        let strikes = resolve_strikes(&[melee, magic], &[t]);
        assert_eq!(strikes[0].striker, Entity::from_raw(2));
    }

    #[test]
    fn test_single_target_stops_after_first_hit() {
        let mut s = striker(0, 0, Allegiance::Horde, Position::new(100.0, 200.0), Facing::Right);
        s.single_target = true;
        let a = target(1, 1, Allegiance::Heroes, Position::new(118.0, 200.0));
        let b = target(2, 2, Allegiance::Heroes, Position::new(122.0, 200.0));
        assert_eq!(resolve_strikes(&[s], &[a, b]).len(), 1);
    }

    #[test]
    fn test_no_friendly_fire_in_random_configurations() {
        let mut rng = StdRng::seed_from_u64(0xB1AD);
        let sides = [Allegiance::Heroes, Allegiance::Horde, Allegiance::Neutral];
        for _ in 0..10_000 {
            let count = rng.gen_range(2..8u32);
            let mut strikers = Vec::new();
            let mut targets = Vec::new();
            for i in 0..count {
                let side = sides[rng.gen_range(0..sides.len())];
                let pos = Position::new(rng.gen_range(0.0..120.0), rng.gen_range(180.0..220.0));
                let facing = if rng.gen_bool(0.5) { Facing::Left } else { Facing::Right };
                strikers.push(striker(i, i as u64, side, pos, facing));
                targets.push(target(i, i as u64, side, pos));
            }
            for strike in resolve_strikes(&strikers, &targets) {
                let attacker = strikers.iter().find(|s| s.entity == strike.striker).unwrap();
                let defender = targets.iter().find(|t| t.entity == strike.defender).unwrap();
                assert_ne!(attacker.allegiance, defender.allegiance);
                assert_ne!(defender.allegiance, Allegiance::Neutral);
                assert_ne!(attacker.entity, defender.entity);
            }
        }
    }

    #[test]
    fn test_grab_picks_nearest_in_front() {
        let thrower = Position::new(100.0, 200.0);
        let candidates = [
            GrabCandidate { entity: Entity::from_raw(1), order: SpawnOrder(1), position: Position::new(124.0, 200.0) },
            GrabCandidate { entity: Entity::from_raw(2), order: SpawnOrder(2), position: Position::new(110.0, 204.0) },
            GrabCandidate { entity: Entity::from_raw(3), order: SpawnOrder(3), position: Position::new(95.0, 200.0) },
        ];
        let (entity, _) = grab_target(&thrower, Facing::Right, &candidates, 30.0, 15.0).unwrap();
        assert_eq!(entity, Entity::from_raw(2));
        assert!(grab_target(&thrower, Facing::Right, &candidates[..1], 20.0, 15.0).is_none());
    }

    #[test]
    fn test_throw_damage_bands() {
        assert_eq!(throw_damage(10.0, 30.0, 4, 2), 4);
        assert_eq!(throw_damage(25.0, 30.0, 4, 2), 2);
    }
}
