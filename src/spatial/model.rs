//! Projection, draw order, and box overlap.
//!
//! Boxes live in "projected" space: screen coordinates before the camera
//! offset is subtracted. Two boxes touch only when their projected
//! rectangles intersect AND their owners stand close enough in depth, so a
//! punch thrown at the far edge of the street never hits someone on the
//! near edge even if the sprites overlap.

use bevy::prelude::*;
use serde::Deserialize;

use super::components::{Facing, Position};
use crate::core::SpawnOrder;

/// Screen position of `position` under a camera at `camera_offset`.
///
/// Depth pushes the sprite down the screen and height lifts it.
pub fn project(position: &Position, camera_offset: Vec2, depth_scale: f32) -> Vec2 {
    Vec2::new(
        position.x - camera_offset.x,
        position.depth * depth_scale - position.z - camera_offset.y,
    )
}

/// Sort key for painter's-algorithm ordering.
#[derive(Debug, Clone, Copy)]
pub struct DrawKey {
    pub entity: Entity,
    pub depth: f32,
    pub x: f32,
    pub order: SpawnOrder,
}

/// Back-to-front order: smaller depth first, then smaller x, then older.
pub fn draw_order(keys: &[DrawKey]) -> Vec<Entity> {
    let mut sorted = keys.to_vec();
    sorted.sort_by(|a, b| {
        a.depth
            .total_cmp(&b.depth)
            .then(a.x.total_cmp(&b.x))
            .then(a.order.cmp(&b.order))
    });
    sorted.into_iter().map(|key| key.entity).collect()
}

/// A box relative to an entity's feet, authored facing right.
///
/// `x` is the forward offset of the near edge, `y` the height of the bottom
/// edge above the feet.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoxSpec {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoxSpec {
    /// Places the box in projected space, mirrored when facing left.
    pub fn place(&self, position: &Position, facing: Facing, depth_scale: f32) -> WorldBox {
        let foot = project(position, Vec2::ZERO, depth_scale);
        let left = match facing {
            Facing::Right => foot.x + self.x,
            Facing::Left => foot.x - self.x - self.w,
        };
        let bottom = foot.y - self.y;
        WorldBox {
            rect: Rect::from_corners(Vec2::new(left, bottom - self.h), Vec2::new(left + self.w, bottom)),
            depth: position.depth,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }
}

/// A placed box plus the depth of its owner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBox {
    pub rect: Rect,
    pub depth: f32,
}

impl WorldBox {
    pub fn shifted(&self, offset: Vec2) -> Rect {
        Rect::from_corners(self.rect.min - offset, self.rect.max - offset)
    }
}

/// True when the rectangles share area and the depths are within `tolerance`.
/// Touching edges do not count.
pub fn overlap(a: &WorldBox, b: &WorldBox, tolerance: f32) -> bool {
    if (a.depth - b.depth).abs() > tolerance {
        return false;
    }
    a.rect.min.x < b.rect.max.x
        && b.rect.min.x < a.rect.max.x
        && a.rect.min.y < b.rect.max.y
        && b.rect.min.y < a.rect.max.y
}

/// Ground-plane distance. Height is ignored so a jumping entity stays in reach.
pub fn distance(a: &Position, b: &Position) -> f32 {
    Vec2::new(a.x - b.x, a.depth - b.depth).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(index: u32, depth: f32, x: f32, order: u64) -> DrawKey {
        DrawKey {
            entity: Entity::from_raw(index),
            depth,
            x,
            order: SpawnOrder(order),
        }
    }

    #[test]
    fn test_projection_lifts_by_height() {
        let mut pos = Position::new(100.0, 200.0);
        let ground = project(&pos, Vec2::new(40.0, 0.0), 1.0);
        assert_eq!(ground, Vec2::new(60.0, 200.0));

        pos.z = 30.0;
        let air = project(&pos, Vec2::new(40.0, 0.0), 1.0);
        assert_eq!(air, Vec2::new(60.0, 170.0));
    }

    #[test]
    fn test_projection_is_idempotent() {
        let pos = Position { x: 12.5, depth: 180.0, z: 4.0 };
        let offset = Vec2::new(3.0, 0.0);
        assert_eq!(project(&pos, offset, 1.0), project(&pos, offset, 1.0));
    }

    #[test]
    fn test_draw_order_depth_then_x_then_creation() {
        let keys = [
            key(0, 200.0, 10.0, 3),
            key(1, 180.0, 50.0, 2),
            key(2, 200.0, 10.0, 1),
            key(3, 200.0, 5.0, 0),
        ];
        let order = draw_order(&keys);
        let raw: Vec<u32> = order.iter().map(|e| e.index()).collect();
        assert_eq!(raw, vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_overlap_respects_depth_tolerance() {
        let spec = BoxSpec { x: -10.0, y: 0.0, w: 20.0, h: 40.0 };
        let a = spec.place(&Position::new(100.0, 200.0), Facing::Right, 1.0);
        let near = spec.place(&Position::new(110.0, 210.0), Facing::Right, 1.0);
        let far = spec.place(&Position::new(110.0, 216.0), Facing::Right, 1.0);

        assert!(overlap(&a, &near, 15.0));
        assert!(!overlap(&a, &far, 15.0));
    }

    #[test]
    fn test_touching_edges_do_not_overlap() {
        let spec = BoxSpec { x: 0.0, y: 0.0, w: 10.0, h: 10.0 };
        let a = spec.place(&Position::new(0.0, 200.0), Facing::Right, 1.0);
        let b = spec.place(&Position::new(10.0, 200.0), Facing::Right, 1.0);
        assert!(!overlap(&a, &b, 15.0));
    }

    #[test]
    fn test_box_mirrors_when_facing_left() {
        let spec = BoxSpec { x: 10.0, y: 20.0, w: 30.0, h: 10.0 };
        let pos = Position::new(100.0, 200.0);
        let right = spec.place(&pos, Facing::Right, 1.0);
        let left = spec.place(&pos, Facing::Left, 1.0);
        assert_eq!(right.rect.min.x, 110.0);
        assert_eq!(left.rect.max.x, 90.0);
        assert_eq!(right.rect.max.y, 180.0);
    }

    #[test]
    fn test_distance_ignores_height() {
        let a = Position::new(0.0, 200.0);
        let b = Position { x: 3.0, depth: 204.0, z: 50.0 };
        assert_eq!(distance(&a, &b), 5.0);
    }
}
