//! Per-slot bookkeeping that outlives any one player body.

use bevy::prelude::*;

use super::components::PlayerSlot;
use crate::core::SimConfig;
use crate::world::HeroId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// A body is in play (or about to respawn)
    Active,
    /// Out of lives, waiting for a continue until the deadline tick
    ContinuePending { deadline: u64 },
    /// Permanently out of the session
    Spent,
}

#[derive(Debug, Clone)]
pub struct SlotRecord {
    pub hero: HeroId,
    pub status: SlotStatus,
    /// Lives in stock, counting the one in play
    pub lives: u32,
    pub continues: u32,
    pub score: u64,
    /// Extra-life thresholds already paid out
    pub awarded: usize,
    pub body: Option<Entity>,
    /// Where the last body fell; continues respawn here
    pub last_position: Option<Vec2>,
    /// Took damage since the current zone locked
    pub damaged_in_zone: bool,
}

/// Lives, continues and score for every joined slot.
///
/// Slots are fixed when the session starts; nobody joins mid-level.
#[derive(Resource, Debug, Clone)]
pub struct PlayerRoster {
    slots: Vec<SlotRecord>,
}

/// What spending a life led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeOutcome {
    Respawn { remaining: u32 },
    OfferContinue { deadline: u64 },
    Spent,
}

impl PlayerRoster {
    pub fn new(heroes: &[HeroId], config: &SimConfig) -> Self {
        let slots = heroes
            .iter()
            .map(|&hero| SlotRecord {
                hero,
                status: SlotStatus::Active,
                lives: config.starting_lives,
                continues: config.max_continues,
                score: 0,
                awarded: 0,
                body: None,
                last_position: None,
                damaged_in_zone: false,
            })
            .collect();
        Self { slots }
    }

    pub fn slot(&self, slot: PlayerSlot) -> Option<&SlotRecord> {
        self.slots.get(slot.0 as usize)
    }

    pub fn slot_mut(&mut self, slot: PlayerSlot) -> Option<&mut SlotRecord> {
        self.slots.get_mut(slot.0 as usize)
    }

    pub fn slots(&self) -> impl Iterator<Item = (PlayerSlot, &SlotRecord)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, record)| (PlayerSlot(i as u8), record))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Two or more slots still in the session.
    pub fn is_coop(&self) -> bool {
        self.slots
            .iter()
            .filter(|record| record.status != SlotStatus::Spent)
            .count()
            >= 2
    }

    pub fn all_spent(&self) -> bool {
        self.slots
            .iter()
            .all(|record| record.status == SlotStatus::Spent)
    }

    pub fn mark_damaged(&mut self, slot: PlayerSlot) {
        if let Some(record) = self.slot_mut(slot) {
            record.damaged_in_zone = true;
        }
    }

    pub fn reset_damage_flags(&mut self) {
        for record in &mut self.slots {
            record.damaged_in_zone = false;
        }
    }

    /// Adds points and pays out any extra-life thresholds crossed.
    /// Returns how many extra lives were granted.
    pub fn add_score(&mut self, slot: PlayerSlot, points: u64, thresholds: &[u64]) -> u32 {
        let Some(record) = self.slot_mut(slot) else {
            return 0;
        };
        record.score += points;
        let mut granted = 0;
        while let Some(&threshold) = thresholds.get(record.awarded) {
            if record.score < threshold {
                break;
            }
            record.awarded += 1;
            record.lives += 1;
            granted += 1;
        }
        granted
    }

    /// Spends one life after a body's death has played out.
    pub fn lose_life(&mut self, slot: PlayerSlot, now: u64, countdown: u64) -> Option<LifeOutcome> {
        let record = self.slot_mut(slot)?;
        record.body = None;
        record.lives = record.lives.saturating_sub(1);
        let outcome = if record.lives > 0 {
            LifeOutcome::Respawn {
                remaining: record.lives,
            }
        } else if record.continues > 0 {
            let deadline = now + countdown;
            record.status = SlotStatus::ContinuePending { deadline };
            LifeOutcome::OfferContinue { deadline }
        } else {
            record.status = SlotStatus::Spent;
            LifeOutcome::Spent
        };
        Some(outcome)
    }

    /// Spends a continue and refills lives. Only valid while one is offered.
    pub fn take_continue(&mut self, slot: PlayerSlot, lives: u32) -> Option<u32> {
        let record = self.slot_mut(slot)?;
        if !matches!(record.status, SlotStatus::ContinuePending { .. }) || record.continues == 0 {
            return None;
        }
        record.continues -= 1;
        record.lives = lives;
        record.status = SlotStatus::Active;
        Some(record.continues)
    }

    /// Marks a slot spent once its continue offer has lapsed.
    pub fn expire_continue(&mut self, slot: PlayerSlot, now: u64) -> bool {
        let Some(record) = self.slot_mut(slot) else {
            return false;
        };
        match record.status {
            SlotStatus::ContinuePending { deadline } if now >= deadline => {
                record.status = SlotStatus::Spent;
                true
            }
            _ => false,
        }
    }
}
