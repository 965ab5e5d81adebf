//! Mount components and the rider/mount binding table.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::combat::{ActorBundle, Allegiance};
use crate::core::SpawnOrder;
use crate::spatial::Position;
use crate::world::{ActorKind, GameData, MountId};

/// A rideable beast.
#[derive(Component, Debug, Clone, Copy)]
pub struct Mount {
    pub kind: MountId,
}

/// Carried by a hero while riding. Mirrors the binding table for queries.
#[derive(Component, Debug, Clone, Copy)]
pub struct Mounted {
    pub mount: Entity,
    pub kind: MountId,
}

/// Side of the rider. Only hero riders are shielded by the mount's health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiderSide {
    Heroes,
    Horde,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountBinding {
    pub rider: Entity,
    pub mount: Entity,
    pub side: RiderSide,
}

/// Every active rider/mount pair, keyed both ways.
///
/// A rider has at most one mount and a mount at most one rider. Entries
/// only ever point at each other.
#[derive(Resource, Debug, Default)]
pub struct MountBindings {
    by_mount: BTreeMap<Entity, MountBinding>,
    by_rider: BTreeMap<Entity, Entity>,
}

impl MountBindings {
    /// Binds `rider` to `mount`. Refused if either is already bound.
    pub fn bind(&mut self, rider: Entity, mount: Entity, side: RiderSide) -> bool {
        if rider == mount || self.by_mount.contains_key(&mount) || self.by_rider.contains_key(&rider) {
            return false;
        }
        self.by_mount.insert(mount, MountBinding { rider, mount, side });
        self.by_rider.insert(rider, mount);
        true
    }

    pub fn mount_of(&self, rider: Entity) -> Option<Entity> {
        self.by_rider.get(&rider).copied()
    }

    pub fn rider_of(&self, mount: Entity) -> Option<Entity> {
        self.by_mount.get(&mount).map(|binding| binding.rider)
    }

    pub fn is_ridden(&self, mount: Entity) -> bool {
        self.by_mount.contains_key(&mount)
    }

    pub fn is_riding(&self, rider: Entity) -> bool {
        self.by_rider.contains_key(&rider)
    }

    /// The mount whose health absorbs damage aimed at `rider`.
    pub fn shielding_mount(&self, rider: Entity) -> Option<Entity> {
        let mount = self.mount_of(rider)?;
        self.by_mount
            .get(&mount)
            .filter(|binding| binding.side == RiderSide::Heroes)
            .map(|binding| binding.mount)
    }

    pub fn dissolve_mount(&mut self, mount: Entity) -> Option<MountBinding> {
        let binding = self.by_mount.remove(&mount)?;
        self.by_rider.remove(&binding.rider);
        Some(binding)
    }

    pub fn dissolve_rider(&mut self, rider: Entity) -> Option<MountBinding> {
        let mount = self.by_rider.get(&rider).copied()?;
        self.dissolve_mount(mount)
    }

    /// Bindings in a stable order.
    pub fn bindings(&self) -> impl Iterator<Item = &MountBinding> {
        self.by_mount.values()
    }

    pub fn len(&self) -> usize {
        self.by_mount.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_mount.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_mount.clear();
        self.by_rider.clear();
    }
}

#[derive(Bundle)]
pub struct MountBundle {
    pub actor: ActorBundle,
    pub mount: Mount,
}

impl MountBundle {
    pub fn new(
        data: &GameData,
        kind: MountId,
        order: SpawnOrder,
        position: Position,
        allegiance: Allegiance,
        tick: u64,
    ) -> Self {
        let def = data.mount(kind);
        Self {
            actor: ActorBundle::new(
                ActorKind::Mount(kind),
                order,
                allegiance,
                position,
                def.max_health,
                def.hurtbox,
                tick,
            ),
            mount: Mount { kind },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn test_bind_is_exclusive_both_ways() {
        let mut bindings = MountBindings::default();
        assert!(bindings.bind(e(1), e(10), RiderSide::Heroes));
        assert!(!bindings.bind(e(2), e(10), RiderSide::Heroes));
        assert!(!bindings.bind(e(1), e(11), RiderSide::Heroes));
        assert_eq!(bindings.mount_of(e(1)), Some(e(10)));
        assert_eq!(bindings.rider_of(e(10)), Some(e(1)));
    }

    #[test]
    fn test_dissolve_clears_both_directions() {
        let mut bindings = MountBindings::default();
        bindings.bind(e(1), e(10), RiderSide::Heroes);
        let binding = bindings.dissolve_rider(e(1)).unwrap();
        assert_eq!(binding.mount, e(10));
        assert!(!bindings.is_ridden(e(10)));
        assert!(!bindings.is_riding(e(1)));
        assert!(bindings.dissolve_mount(e(10)).is_none());
    }

    #[test]
    fn test_only_hero_riders_are_shielded() {
        let mut bindings = MountBindings::default();
        bindings.bind(e(1), e(10), RiderSide::Heroes);
        bindings.bind(e(2), e(11), RiderSide::Horde);
        assert_eq!(bindings.shielding_mount(e(1)), Some(e(10)));
        assert_eq!(bindings.shielding_mount(e(2)), None);
    }

    #[test]
    fn test_cannot_ride_self() {
        let mut bindings = MountBindings::default();
        assert!(!bindings.bind(e(3), e(3), RiderSide::Horde));
        assert!(bindings.is_empty());
    }
}
