//! Spatial plugin - registers movement and camera systems.

use bevy::prelude::*;

use super::systems::*;
use crate::core::SimSet;

pub struct SpatialPlugin;

impl Plugin for SpatialPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (integrate_motion, track_camera)
                .chain()
                .in_set(SimSet::Movement),
        );
    }
}
