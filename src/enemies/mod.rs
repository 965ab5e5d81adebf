//! Enemies module - enemy entities, AI, and spawning.

mod ai;
mod components;
mod plugin;
mod spawning;

pub use ai::{decide, flank_sides, select_target, think, Claim, Prey};
pub use components::*;
pub use plugin::EnemyPlugin;
pub use spawning::spawn_enemy;
