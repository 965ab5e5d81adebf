//! Three-hit combo chain and the short input history behind it.

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::player::Direction;
use crate::state::ActionState;

/// Position in the three-hit chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComboStep {
    #[default]
    First,
    Second,
    Finisher,
}

impl ComboStep {
    pub fn next(self) -> Self {
        match self {
            ComboStep::First => ComboStep::Second,
            ComboStep::Second => ComboStep::Finisher,
            ComboStep::Finisher => ComboStep::First,
        }
    }

    pub fn action_state(self) -> ActionState {
        match self {
            ComboStep::First => ActionState::Attack1,
            ComboStep::Second => ActionState::Attack2,
            ComboStep::Finisher => ActionState::Attack3,
        }
    }

    pub fn from_action(state: ActionState) -> Option<Self> {
        match state {
            ActionState::Attack1 => Some(ComboStep::First),
            ActionState::Attack2 => Some(ComboStep::Second),
            ActionState::Attack3 => Some(ComboStep::Finisher),
            _ => None,
        }
    }
}

/// Tracks landed hits in the current chain.
///
/// Only landed hits advance the chain. The chain resets when the window
/// since the last landed hit lapses or after the finisher.
#[derive(Component, Debug, Default, Clone)]
pub struct ComboTracker {
    step: ComboStep,
    last_landed: Option<u64>,
    cancel_from: Option<u64>,
}

impl ComboTracker {
    pub fn step(&self) -> ComboStep {
        self.step
    }

    /// Step to use for an attack started at `now`.
    pub fn begin_attack(&mut self, now: u64, window: u64) -> ComboStep {
        if self
            .last_landed
            .is_some_and(|last| now.saturating_sub(last) > window)
        {
            self.reset();
        }
        self.cancel_from = None;
        self.step
    }

    /// Records a landed hit. Returns true when it was the finisher.
    ///
    /// A hit landing more than `window` ticks after the previous one starts
    /// a fresh chain and counts as its first hit.
    pub fn land(&mut self, step: ComboStep, now: u64, window: u64, cancel_after: u64) -> bool {
        let lapsed = self
            .last_landed
            .is_some_and(|last| now.saturating_sub(last) > window);
        let step = if lapsed || self.last_landed.is_none() {
            ComboStep::First
        } else {
            step
        };
        if step == ComboStep::Finisher {
            self.reset();
            return true;
        }
        self.step = step.next();
        self.last_landed = Some(now);
        self.cancel_from = Some(now + cancel_after);
        false
    }

    /// True once a landed hit's recovery may be cut short by the next attack.
    pub fn can_cancel(&self, now: u64) -> bool {
        self.cancel_from.is_some_and(|from| now >= from)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A discrete input worth remembering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Tap(Direction),
    Attack,
    Jump,
    Magic,
    Mount,
}

/// The last three input events with the tick each arrived.
#[derive(Component, Debug, Default, Clone)]
pub struct InputBuffer {
    events: VecDeque<(InputEvent, u64)>,
}

impl InputBuffer {
    pub const CAPACITY: usize = 3;

    pub fn push(&mut self, event: InputEvent, tick: u64) {
        if self.events.len() == Self::CAPACITY {
            self.events.pop_front();
        }
        self.events.push_back((event, tick));
    }

    pub fn events(&self) -> impl Iterator<Item = &(InputEvent, u64)> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Horizontal direction tapped twice in a row within `window` ticks,
    /// ending with the newest event.
    pub fn double_tap(&self, window: u64) -> Option<Direction> {
        let n = self.events.len();
        if n < 2 {
            return None;
        }
        match (self.events[n - 2], self.events[n - 1]) {
            ((InputEvent::Tap(a), t0), (InputEvent::Tap(b), t1))
                if a == b && a.is_horizontal() && t1.saturating_sub(t0) <= window =>
            {
                Some(a)
            }
            _ => None,
        }
    }

    /// Double tap followed by attack, each gap within its window.
    pub fn dash_attack(&self, tap_window: u64, attack_window: u64) -> bool {
        if self.events.len() < Self::CAPACITY {
            return false;
        }
        match (self.events[0], self.events[1], self.events[2]) {
            ((InputEvent::Tap(a), t0), (InputEvent::Tap(b), t1), (InputEvent::Attack, t2)) => {
                a == b && a.is_horizontal() && t1.saturating_sub(t0) <= tap_window && t2.saturating_sub(t1) <= attack_window
            }
            _ => false,
        }
    }
}
