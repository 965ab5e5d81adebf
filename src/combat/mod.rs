//! Combat module - hit resolution, combos, throws, magic, and pickups.

mod combo;
mod components;
mod magic;
mod plugin;
mod resolver;
mod systems;

pub use combo::*;
pub use components::*;
pub use magic::{MagicPool, MagicTier};
pub use plugin::CombatPlugin;
pub use resolver::*;
pub use systems::{apply_knockback, apply_reaction, settle_deaths, CombatSet};
