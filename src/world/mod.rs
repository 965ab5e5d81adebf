//! World module - content data, levels, and level loading.

mod data;
mod error;
mod plugin;
mod registry;
mod spawning;

pub use data::{AiTuning, ContentFile, LevelFile, ProjectileDef, SpawnSide, ThrowDef};
pub use error::DataLoadError;
pub use plugin::{load_pending_level, WorldPlugin};
pub use registry::*;
pub use spawning::spawn_level_props;
