//! Timed state machines for bodies and enemy controllers.

mod machine;
mod plugin;
mod systems;

pub use machine::*;
pub use plugin::StatePlugin;
pub use systems::advance_states;
