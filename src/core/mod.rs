//! Core simulation module - schedule, context, config, and events.
//!
//! This module provides the foundation that all other simulation modules build upon.

mod config;
mod context;
mod events;
mod plugin;
mod schedule;

pub use config::SimConfig;
pub use context::*;
pub use events::*;
pub use plugin::{advance_tick, rotate_events, CorePlugin};
pub use schedule::SimSet;
