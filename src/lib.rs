//! Blades Sim - the gameplay core of a co-op side-scrolling beat 'em up.
//!
//! The simulation is headless and deterministic: one tick of the
//! `FixedUpdate` schedule advances everything, input goes in through
//! [`player::PlayerInputs`], and observable results come out as events plus
//! a [`snapshot::SimSnapshot`] rebuilt at the end of every tick.
//!
//! # Architecture
//!
//! The crate is organized into plugins, each handling one concern:
//!
//! - **Core**: Tick phases, run context, tunables, global events
//! - **Spatial**: Pseudo-3D positions, projection, overlap, the scroll camera
//! - **State**: Timed state machines for actions and enemy decisions
//! - **Combat**: Hit resolution, combos, throws, magic, deaths, pickups
//! - **Player**: Input, intent, lives, continues, score
//! - **Enemies**: Target selection, decisions, flanking, spawning
//! - **Mount**: Rider/mount bindings
//! - **Encounter**: Scroll-locking zones, spawn queues, camp and level flow
//! - **World**: Content data, levels, level loading
//! - **Snapshot**: Per-tick view for renderers and the HUD

pub mod combat;
pub mod core;
pub mod encounter;
pub mod enemies;
pub mod mount;
pub mod player;
pub mod snapshot;
pub mod spatial;
pub mod state;
pub mod world;

use bevy::prelude::*;

use crate::core::{SimConfig, SimContext, SimRng};
use crate::player::PlayerRoster;
use crate::spatial::ScrollCamera;
use crate::world::{GameData, HeroId};

/// Main simulation plugin that inserts the run's resources and adds all
/// sub-plugins.
pub struct SimulationPlugin {
    pub data: GameData,
    pub config: SimConfig,
    /// One hero per joined slot, in slot order
    pub heroes: Vec<HeroId>,
    pub seed: u64,
    pub first_level: usize,
}

impl SimulationPlugin {
    /// Single player on the first hero and first level.
    pub fn new(data: GameData, config: SimConfig) -> Self {
        Self {
            data,
            config,
            heroes: vec![HeroId(0)],
            seed: 0,
            first_level: 0,
        }
    }

    pub fn with_heroes(mut self, heroes: Vec<HeroId>) -> Self {
        self.heroes = heroes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn starting_at(mut self, level: usize) -> Self {
        self.first_level = level;
        self
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let heroes: Vec<HeroId> = self
            .heroes
            .iter()
            .copied()
            .filter(|hero| {
                let known = hero.0 < self.data.hero_count();
                if !known {
                    warn!("Ignoring unknown hero {:?}", hero);
                }
                known
            })
            .collect();
        let camera = ScrollCamera::new(
            self.config.screen_width,
            self.config.screen_height,
            self.config.player_leash,
        );

        app.insert_resource(Time::<Fixed>::from_hz(self.config.tick_rate.max(1) as f64))
            .insert_resource(self.config.clone())
            .insert_resource(self.data.clone())
            .insert_resource(SimContext::new(camera, self.first_level))
            .insert_resource(SimRng::seeded(self.seed))
            .insert_resource(PlayerRoster::new(&heroes, &self.config))
            // Core systems (must be first)
            .add_plugins(core::CorePlugin)
            .add_plugins((
                spatial::SpatialPlugin,
                state::StatePlugin,
                combat::CombatPlugin,
                player::PlayerPlugin,
                enemies::EnemyPlugin,
                mount::MountPlugin,
                encounter::EncounterPlugin,
                world::WorldPlugin,
                snapshot::SnapshotPlugin,
            ));
    }
}

/// Builds a ready-to-step app with no window or renderer.
pub fn headless_app(data: GameData, config: SimConfig) -> App {
    headless_app_with(SimulationPlugin::new(data, config))
}

pub fn headless_app_with(plugin: SimulationPlugin) -> App {
    let mut app = App::new();
    app.add_plugins(plugin);
    app.finish();
    app.cleanup();
    app
}

/// Advances the simulation by exactly one tick.
pub fn step(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}
