//! Snapshot module - the per-tick view handed to renderers and the HUD.

mod plugin;
mod view;

pub use plugin::{publish_snapshot, SnapshotPlugin};
pub use view::*;
