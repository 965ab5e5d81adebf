//! Player module - input, intent, lives and score bookkeeping.

mod actions;
mod components;
mod input;
mod lifecycle;
mod plugin;
mod roster;

pub use actions::apply_player_input;
pub use components::*;
pub use input::*;
pub use lifecycle::{settle_lives, spawn_hero};
pub use plugin::PlayerPlugin;
pub use roster::*;
