//! Encounter module - scroll-locking zones, spawn queues, and the level/camp cycle.

mod plugin;
mod systems;
mod zone;

pub use plugin::EncounterPlugin;
pub use systems::{activate_zones, advance_session, clear_remains, run_active_zone};
pub use zone::*;
