//! Side-scrolling camera.

use bevy::prelude::*;

/// Horizontal scroll window over the level.
///
/// Tracks the midpoint of the living players and stays inside the level.
/// While locked by an encounter it does not move and players are kept on
/// screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollCamera {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub level_width: f32,
    pub leash: f32,
    locked: bool,
}

impl ScrollCamera {
    pub fn new(width: f32, height: f32, leash: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            level_width: width,
            leash,
            locked: false,
        }
    }

    /// Resets to the start of a level of the given width.
    pub fn enter_level(&mut self, level_width: f32) {
        self.level_width = level_width.max(self.width);
        self.x = 0.0;
        self.locked = false;
    }

    pub fn max_x(&self) -> f32 {
        (self.level_width - self.width).max(0.0)
    }

    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn center(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn right_edge(&self) -> f32 {
        self.x + self.width
    }

    pub fn at_level_end(&self) -> bool {
        self.x >= self.max_x() - 0.5
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Centres on the midpoint of `xs` unless locked or empty.
    pub fn track(&mut self, xs: &[f32]) {
        if self.locked || xs.is_empty() {
            return;
        }
        let mid = xs.iter().sum::<f32>() / xs.len() as f32;
        self.x = (mid - self.width / 2.0).max(0.0).min(self.max_x());
    }

    /// Pulls a player x back inside the leash, the level, and (when locked)
    /// the screen.
    pub fn clamp_player(&self, x: f32) -> f32 {
        let mut lo = (self.center() - self.leash).max(0.0);
        let mut hi = (self.center() + self.leash).min(self.level_width);
        if self.locked {
            lo = lo.max(self.x);
            hi = hi.min(self.right_edge());
        }
        x.max(lo).min(hi)
    }
}
