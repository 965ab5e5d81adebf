//! Mount module - rideable beasts and the rider/mount binding table.

mod components;
mod plugin;
mod systems;

pub use components::*;
pub use plugin::MountPlugin;
pub use systems::{board, dismount, follow_riders, nearest_mount, MountCandidate};
