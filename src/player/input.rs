//! Per-tick player input, as delivered by the input collaborator.

use std::collections::BTreeMap;

use bevy::prelude::*;

use super::components::PlayerSlot;

/// A direction on the pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    /// Into the screen
    Up,
    /// Out of the screen
    Down,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// Everything one player pressed during one tick.
///
/// `movement` is held direction: x is -1/0/1 along the level, y is -1 (up,
/// away) / 0 / 1 (down, toward the viewer). `taps` are directions newly
/// pressed this tick, in the order they arrived.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputFrame {
    pub movement: IVec2,
    pub attack: bool,
    pub jump: bool,
    pub magic: bool,
    pub mount: bool,
    pub taps: Vec<Direction>,
}

impl InputFrame {
    pub fn moving(x: i32, y: i32) -> Self {
        Self {
            movement: IVec2::new(x.signum(), y.signum()),
            ..default()
        }
    }

    pub fn with_attack(mut self) -> Self {
        self.attack = true;
        self
    }

    pub fn with_jump(mut self) -> Self {
        self.jump = true;
        self
    }

    pub fn with_magic(mut self) -> Self {
        self.magic = true;
        self
    }

    pub fn with_mount(mut self) -> Self {
        self.mount = true;
        self
    }

    pub fn with_tap(mut self, direction: Direction) -> Self {
        self.taps.push(direction);
        self
    }
}

/// Input for the coming tick, keyed by slot. Cleared once the tick is published.
#[derive(Resource, Debug, Default)]
pub struct PlayerInputs {
    frames: BTreeMap<PlayerSlot, InputFrame>,
}

impl PlayerInputs {
    pub fn set(&mut self, slot: PlayerSlot, frame: InputFrame) {
        self.frames.insert(slot, frame);
    }

    pub fn frame(&self, slot: PlayerSlot) -> Option<&InputFrame> {
        self.frames.get(&slot)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moving_normalizes_to_unit_steps() {
        let frame = InputFrame::moving(5, -3);
        assert_eq!(frame.movement, IVec2::new(1, -1));
    }

    #[test]
    fn test_frames_are_per_slot() {
        let mut inputs = PlayerInputs::default();
        inputs.set(PlayerSlot(1), InputFrame::default().with_attack());
        assert!(inputs.frame(PlayerSlot(0)).is_none());
        assert!(inputs.frame(PlayerSlot(1)).is_some_and(|f| f.attack));
        inputs.clear();
        assert!(inputs.frame(PlayerSlot(1)).is_none());
    }
}
