//! Mounting, dismounting, and binding upkeep.

use bevy::prelude::*;

use super::components::*;
use crate::combat::{Allegiance, Dead, Health, Invincible};
use crate::core::{MountChange, MountEvent, SimConfig, SimContext, SpawnOrder};
use crate::spatial::{distance, Facing, Position, Velocity};
use crate::state::{ActionState, TimedState};
use crate::world::MountId;

/// A mount that might be boarded.
#[derive(Debug, Clone, Copy)]
pub struct MountCandidate {
    pub entity: Entity,
    pub kind: MountId,
    pub order: SpawnOrder,
    pub position: Position,
}

/// Nearest candidate within `range`, oldest first on ties.
pub fn nearest_mount(
    rider: &Position,
    candidates: &[MountCandidate],
    range: f32,
) -> Option<MountCandidate> {
    candidates
        .iter()
        .map(|c| (c, distance(rider, &c.position)))
        .filter(|(_, d)| *d <= range)
        .min_by(|(a, da), (b, db)| da.total_cmp(db).then(a.order.cmp(&b.order)))
        .map(|(c, _)| *c)
}

/// Boards a hero onto a free mount. The mount switches to the hero's side.
pub fn board(
    commands: &mut Commands,
    bindings: &mut MountBindings,
    rider: Entity,
    mount: &MountCandidate,
    events: &mut EventWriter<MountEvent>,
) -> bool {
    if !bindings.bind(rider, mount.entity, RiderSide::Heroes) {
        return false;
    }
    commands.entity(rider).insert(Mounted {
        mount: mount.entity,
        kind: mount.kind,
    });
    commands.entity(mount.entity).insert(Allegiance::Heroes);
    events.send(MountEvent {
        rider,
        mount: mount.entity,
        change: MountChange::Mounted,
    });
    true
}

/// Drops a hero off their mount with a short invincibility window. The mount
/// stays behind, free for anyone.
pub fn dismount(
    commands: &mut Commands,
    bindings: &mut MountBindings,
    rider: Entity,
    invincible_until: u64,
    change: MountChange,
    events: &mut EventWriter<MountEvent>,
) -> bool {
    let Some(binding) = bindings.dissolve_rider(rider) else {
        return false;
    };
    commands
        .entity(rider)
        .remove::<Mounted>()
        .insert(Invincible {
            until: invincible_until,
        });
    commands.entity(binding.mount).insert(Allegiance::Neutral);
    events.send(MountEvent {
        rider,
        mount: binding.mount,
        change,
    });
    true
}

/// Carries each mount along with its rider.
pub fn follow_riders(
    bindings: Res<MountBindings>,
    riders: Query<(&Position, &Facing), Without<Mount>>,
    mut mounts: Query<(&mut Position, &mut Facing, &mut Velocity), With<Mount>>,
) {
    for binding in bindings.bindings() {
        let Ok((rider_pos, rider_facing)) = riders.get(binding.rider) else {
            continue;
        };
        let Ok((mut pos, mut facing, mut vel)) = mounts.get_mut(binding.mount) else {
            continue;
        };
        *pos = *rider_pos;
        *facing = *rider_facing;
        *vel = Velocity::default();
    }
}

/// Dissolves bindings whose mount or rider can no longer hold them.
///
/// A mount at 0 health drops its rider this tick. A hostile rider that is
/// killed or knocked down leaves its mount free to take.
pub fn maintain_bindings(
    mut commands: Commands,
    config: Res<SimConfig>,
    ctx: Res<SimContext>,
    mut bindings: ResMut<MountBindings>,
    mut riders: Query<(&Health, &mut TimedState<ActionState>, Has<Dead>), Without<Mount>>,
    mounts: Query<(&Health, Has<Dead>), With<Mount>>,
    mut events: EventWriter<MountEvent>,
) {
    let now = ctx.tick;
    let current: Vec<MountBinding> = bindings.bindings().copied().collect();
    for binding in current {
        let mount_alive = mounts
            .get(binding.mount)
            .is_ok_and(|(health, dead)| !dead && !health.is_dead());

        if !mount_alive {
            bindings.dissolve_mount(binding.mount);
            if let Ok((health, mut action, dead)) = riders.get_mut(binding.rider) {
                if !dead && !health.is_dead() && binding.side == RiderSide::Heroes {
                    action.enter(ActionState::Idle, now, None);
                    commands
                        .entity(binding.rider)
                        .remove::<Mounted>()
                        .insert(Invincible {
                            until: now + config.invincibility_ticks,
                        });
                }
            }
            info!("Mount {:?} destroyed under {:?}", binding.mount, binding.rider);
            events.send(MountEvent {
                rider: binding.rider,
                mount: binding.mount,
                change: MountChange::Destroyed,
            });
            continue;
        }

        let rider_holds = riders
            .get(binding.rider)
            .is_ok_and(|(health, action, dead)| {
                !dead
                    && !health.is_dead()
                    && !matches!(
                        action.current(),
                        ActionState::Knockdown | ActionState::GetUp | ActionState::Death
                    )
            });
        if !rider_holds {
            bindings.dissolve_mount(binding.mount);
            if let Some(mut rider) = commands.get_entity(binding.rider) {
                rider.remove::<Mounted>();
            }
            commands.entity(binding.mount).insert(Allegiance::Neutral);
            events.send(MountEvent {
                rider: binding.rider,
                mount: binding.mount,
                change: MountChange::Freed,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index: u32, order: u64, x: f32) -> MountCandidate {
        MountCandidate {
            entity: Entity::from_raw(index),
            kind: MountId(0),
            order: SpawnOrder(order),
            position: Position::new(x, 200.0),
        }
    }

    #[test]
    fn test_nearest_mount_within_range() {
        let rider = Position::new(100.0, 200.0);
        let mounts = [candidate(1, 1, 125.0), candidate(2, 2, 90.0), candidate(3, 3, 300.0)];
        let picked = nearest_mount(&rider, &mounts, 28.0).unwrap();
        assert_eq!(picked.entity, Entity::from_raw(2));
        assert!(nearest_mount(&rider, &mounts[2..], 28.0).is_none());
    }

    #[test]
    fn test_equal_distance_prefers_older_mount() {
        let rider = Position::new(100.0, 200.0);
        let mounts = [candidate(5, 9, 110.0), candidate(6, 4, 90.0)];
        assert_eq!(nearest_mount(&rider, &mounts, 28.0).unwrap().entity, Entity::from_raw(6));
    }
}
