//! Encounter zone bookkeeping.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::core::SimConfig;
use crate::world::{EncounterData, SpawnDescriptor};

/// Lifecycle of an activated zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZonePhase {
    /// Camera locked, queue still feeding enemies in
    Locked,
    /// Queue empty, waiting for the last enemies to fall
    Clearing,
    /// Cleared; the camera is free again
    Unlocked,
}

/// The zone currently holding the camera.
#[derive(Debug, Clone)]
pub struct ActiveZone {
    pub index: usize,
    phase: ZonePhase,
    queue: VecDeque<SpawnDescriptor>,
    spawned: usize,
    cap: usize,
    solo_total: usize,
    coop: bool,
}

impl ActiveZone {
    /// Expands the zone's descriptors into a spawn queue.
    ///
    /// In co-op the queue is `ceil(len * multiplier)` long, cycling through
    /// the descriptors in order.
    pub fn activate(index: usize, encounter: &EncounterData, coop: bool, config: &SimConfig) -> Self {
        let base = encounter.spawns.len();
        let total = (base as f32 * config.spawn_multiplier(coop)).ceil() as usize;
        let queue = encounter.spawns.iter().copied().cycle().take(total).collect();
        Self {
            index,
            phase: ZonePhase::Locked,
            queue,
            spawned: 0,
            cap: config.enemy_cap(coop),
            solo_total: base,
            coop,
        }
    }

    pub fn phase(&self) -> ZonePhase {
        self.phase
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn spawned(&self) -> usize {
        self.spawned
    }

    pub fn is_coop(&self) -> bool {
        self.coop
    }

    /// How many more enemies may enter now, given how many are alive.
    pub fn spawn_budget(&self, alive: usize) -> usize {
        if self.phase != ZonePhase::Locked {
            return 0;
        }
        self.cap.saturating_sub(alive).min(self.queue.len())
    }

    pub fn next_spawn(&mut self) -> Option<SpawnDescriptor> {
        let next = self.queue.pop_front()?;
        self.spawned += 1;
        Some(next)
    }

    /// Drops back to solo rules after co-op ends mid-zone.
    ///
    /// Returns false when the zone was already running solo.
    pub fn revert_to_solo(&mut self, config: &SimConfig) -> bool {
        if !self.coop {
            return false;
        }
        self.coop = false;
        self.cap = config.enemy_cap(false);
        let left = self.solo_total.saturating_sub(self.spawned);
        self.queue.truncate(left);
        true
    }

    /// Moves the zone one step along its lifecycle, if it can move.
    pub fn settle(&mut self, alive: usize) -> Option<ZonePhase> {
        let next = match self.phase {
            ZonePhase::Locked if self.queue.is_empty() => ZonePhase::Clearing,
            ZonePhase::Clearing if alive == 0 => ZonePhase::Unlocked,
            _ => return None,
        };
        self.phase = next;
        Some(next)
    }
}

/// Tracks which zone of the current level is next and which one is live.
#[derive(Resource, Debug, Default)]
pub struct EncounterDirector {
    pub next_zone: usize,
    pub active: Option<ActiveZone>,
}

impl EncounterDirector {
    pub fn reset(&mut self) {
        self.next_zone = 0;
        self.active = None;
    }

    pub fn is_locked(&self) -> bool {
        self.active.is_some()
    }

    /// True once every zone of a level with `zone_count` zones has been cleared.
    pub fn all_cleared(&self, zone_count: usize) -> bool {
        self.active.is_none() && self.next_zone >= zone_count
    }
}
