//! Spatial model - positions, projection, overlap, and the camera.
//!
//! The world is a 2D plane (x along the level, depth into the screen) with a
//! height axis for jumps and throws. Everything is drawn and hit-tested in
//! projected 2D space.

mod camera;
mod components;
mod model;
mod plugin;
mod systems;

pub use camera::ScrollCamera;
pub use components::*;
pub use model::*;
pub use plugin::SpatialPlugin;
pub use systems::{integrate_motion, track_camera};
