//! Timed state machine shared by players, enemies, and mounts.
//!
//! A [`TimedState`] holds the current state, the tick it was entered, and
//! an optional duration. When the duration elapses the state moves to its
//! follow-up automatically. Any state may be interrupted except a terminal
//! one: once DEATH is entered nothing leaves it.

use std::fmt::Debug;

use bevy::prelude::*;
use serde::Deserialize;

/// A set of states a [`TimedState`] can hold.
pub trait StateKind: Copy + Eq + Debug + Send + Sync + 'static {
    /// Terminal states accept no further transitions.
    fn is_terminal(self) -> bool;

    /// State entered automatically when a timed state elapses.
    fn follow_up(self) -> Option<Self>;
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct TimedState<S: StateKind> {
    current: S,
    entered_at: u64,
    duration: Option<u64>,
}

impl<S: StateKind> TimedState<S> {
    pub fn new(initial: S, tick: u64) -> Self {
        Self {
            current: initial,
            entered_at: tick,
            duration: None,
        }
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn is(&self, state: S) -> bool {
        self.current == state
    }

    pub fn entered_at(&self) -> u64 {
        self.entered_at
    }

    pub fn duration(&self) -> Option<u64> {
        self.duration
    }

    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.entered_at)
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// Enters `next` at `tick`, restarting the clock even if `next` is the
    /// current state. Returns false when the current state is terminal.
    pub fn enter(&mut self, next: S, tick: u64, duration: Option<u64>) -> bool {
        if self.current.is_terminal() {
            return false;
        }
        self.current = next;
        self.entered_at = tick;
        self.duration = duration;
        true
    }

    /// Enters an untimed `next` only if it differs from the current state,
    /// so steady states like WALK keep their entry tick.
    pub fn settle(&mut self, next: S, tick: u64) -> bool {
        if self.current == next {
            return false;
        }
        self.enter(next, tick, None)
    }

    pub fn has_elapsed(&self, now: u64) -> bool {
        self.duration
            .is_some_and(|duration| self.elapsed(now) >= duration)
    }

    /// Moves to the follow-up state if the current one has run its course.
    /// `duration_of` supplies the follow-up's own duration.
    pub fn advance(&mut self, now: u64, duration_of: impl Fn(S) -> Option<u64>) -> Option<S> {
        if !self.has_elapsed(now) {
            return None;
        }
        let next = self.current.follow_up()?;
        let start = self.entered_at + self.duration.unwrap_or(0);
        self.enter(next, start.min(now), duration_of(next));
        Some(next)
    }
}

/// Body states for every actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum ActionState {
    Idle,
    Walk,
    Attack1,
    Attack2,
    Attack3,
    RunAttack,
    Jump,
    JumpAttack,
    Throw,
    Magic,
    Hit,
    Knockdown,
    GetUp,
    Death,
    Mount,
    MountAttack,
}

impl ActionState {
    /// States that take input freely.
    pub fn is_free(self) -> bool {
        matches!(self, ActionState::Idle | ActionState::Walk)
    }

    /// States in which the body takes no commands at all.
    pub fn is_incapacitated(self) -> bool {
        matches!(
            self,
            ActionState::Hit | ActionState::Knockdown | ActionState::GetUp | ActionState::Death
        )
    }

    /// States whose clip may carry a hitbox.
    pub fn is_attack(self) -> bool {
        matches!(
            self,
            ActionState::Attack1
                | ActionState::Attack2
                | ActionState::Attack3
                | ActionState::RunAttack
                | ActionState::JumpAttack
                | ActionState::MountAttack
        )
    }

    /// States that must be given a clip duration when entered.
    pub fn is_timed(self) -> bool {
        !matches!(
            self,
            ActionState::Idle | ActionState::Walk | ActionState::Jump | ActionState::Mount
        )
    }
}

impl StateKind for ActionState {
    fn is_terminal(self) -> bool {
        self == ActionState::Death
    }

    fn follow_up(self) -> Option<Self> {
        match self {
            ActionState::Attack1
            | ActionState::Attack2
            | ActionState::Attack3
            | ActionState::RunAttack
            | ActionState::Throw
            | ActionState::Magic
            | ActionState::Hit
            | ActionState::GetUp => Some(ActionState::Idle),
            ActionState::JumpAttack => Some(ActionState::Jump),
            ActionState::Knockdown => Some(ActionState::GetUp),
            ActionState::MountAttack => Some(ActionState::Mount),
            ActionState::Idle
            | ActionState::Walk
            | ActionState::Jump
            | ActionState::Mount
            | ActionState::Death => None,
        }
    }
}

/// Decision states for enemy controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AiState {
    Idle,
    Patrol,
    Approach,
    Attack,
    Retreat,
    HitStun,
    Knockdown,
    Death,
}

impl AiState {
    /// States forced by the body rather than chosen by the controller.
    pub fn is_preempted(self) -> bool {
        matches!(self, AiState::HitStun | AiState::Knockdown | AiState::Death)
    }

    /// The controller state a body state forces, if any.
    pub fn forced_by(action: ActionState) -> Option<Self> {
        match action {
            ActionState::Hit => Some(AiState::HitStun),
            ActionState::Knockdown | ActionState::GetUp => Some(AiState::Knockdown),
            ActionState::Death => Some(AiState::Death),
            _ => None,
        }
    }
}

impl StateKind for AiState {
    fn is_terminal(self) -> bool {
        self == AiState::Death
    }

    fn follow_up(self) -> Option<Self> {
        match self {
            AiState::Retreat => Some(AiState::Idle),
            _ => None,
        }
    }
}
