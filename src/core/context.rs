//! Per-run simulation context.
//!
//! Everything that would otherwise be a global (the tick counter, the level
//! index, the camera, the creation-order counter) lives on [`SimContext`]
//! so that two simulations can run side by side in one process.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::spatial::{DepthBand, ScrollCamera};
use crate::world::AiTuning;

/// Monotonic creation index. Breaks draw-order and resolution ties.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpawnOrder(pub u64);

/// Where the session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Playing,
    /// Bonus phase between levels; ends at the given tick
    Camp { until: u64 },
    /// Every level has been cleared
    Complete,
    /// Every joined slot is spent
    GameOver,
}

#[derive(Resource, Debug)]
pub struct SimContext {
    /// Number of completed ticks
    pub tick: u64,
    /// 1-based difficulty level; raised each time a level is cleared
    pub level_index: u32,
    /// Index into the loaded level list
    pub current_level: usize,
    /// Level waiting to be built at the start of the next tick
    pub pending_level: Option<usize>,
    pub phase: SessionPhase,
    pub camera: ScrollCamera,
    pub depth_band: DepthBand,
    pub ai_tuning: AiTuning,
    next_spawn_order: u64,
}

impl SimContext {
    pub fn new(camera: ScrollCamera, first_level: usize) -> Self {
        Self {
            tick: 0,
            level_index: 1,
            current_level: first_level,
            pending_level: Some(first_level),
            phase: SessionPhase::Playing,
            camera,
            depth_band: DepthBand::default(),
            ai_tuning: AiTuning::default(),
            next_spawn_order: 0,
        }
    }

    /// Hands out the next creation index.
    pub fn next_spawn_order(&mut self) -> SpawnOrder {
        let order = SpawnOrder(self.next_spawn_order);
        self.next_spawn_order += 1;
        order
    }

    pub fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }
}

/// Seeded random source. The only randomness in the simulation.
#[derive(Resource, Debug)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}
