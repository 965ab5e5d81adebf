//! Pseudo-3D position components.

use bevy::prelude::*;
use serde::Deserialize;

/// World position. `x` runs along the level, `depth` is the ground-plane
/// axis into the screen, `z` is height above the ground.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub depth: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, depth: f32) -> Self {
        Self { x, depth, z: 0.0 }
    }

    pub fn is_airborne(&self) -> bool {
        self.z > 0.0
    }
}

/// Per-tick displacement.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub x: f32,
    pub depth: f32,
    pub z: f32,
}

impl Velocity {
    pub fn stop_ground(&mut self) {
        self.x = 0.0;
        self.depth = 0.0;
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

impl Facing {
    pub fn sign(self) -> f32 {
        match self {
            Facing::Right => 1.0,
            Facing::Left => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Facing::Right => Facing::Left,
            Facing::Left => Facing::Right,
        }
    }

    /// Facing from `from_x` toward `to_x`; right when they coincide.
    pub fn toward(from_x: f32, to_x: f32) -> Self {
        if to_x < from_x {
            Facing::Left
        } else {
            Facing::Right
        }
    }
}

/// Walkable depth range of a level.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DepthBand {
    pub min: f32,
    pub max: f32,
}

impl Default for DepthBand {
    fn default() -> Self {
        Self { min: 150.0, max: 250.0 }
    }
}

impl DepthBand {
    pub fn clamp(&self, depth: f32) -> f32 {
        depth.max(self.min).min(self.max)
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }
}
