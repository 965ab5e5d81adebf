//! Blades Sim - headless demo run.
//!
//! Loads the shipped content, walks a solo player to the right with a
//! swing every half second, and logs what happens.
//!
//! Usage: `blades_sim [DATA_DIR] [TICKS]`

use bevy::log::LogPlugin;
use bevy::prelude::*;

use blades_sim::core::{EncounterEvent, SessionPhase, SimContext};
use blades_sim::player::{InputFrame, PlayerInputs, PlayerSlot};
use blades_sim::snapshot::SimSnapshot;
use blades_sim::world::{builtin_config, load_config, GameData};
use blades_sim::{step, SimulationPlugin};

fn main() {
    let mut args = std::env::args().skip(1);
    let dir = args.next();
    let ticks: u64 = args.next().and_then(|t| t.parse().ok()).unwrap_or(3_600);

    let loaded = match dir.as_deref() {
        Some(dir) => GameData::load(dir).and_then(|data| {
            let config = load_config(std::path::Path::new(dir).join("config.ron"))?;
            Ok((data, config))
        }),
        None => GameData::builtin().and_then(|data| Ok((data, builtin_config()?))),
    };

    let mut app = App::new();
    app.add_plugins(LogPlugin::default());
    match loaded {
        Ok((data, config)) => {
            app.add_plugins(SimulationPlugin::new(data, config));
            app.finish();
            app.cleanup();
        }
        Err(e) => {
            error!("Failed to load game data: {}", e);
            std::process::exit(1);
        }
    }

    let mut zone_events = 0;
    for tick in 0..ticks {
        let mut frame = InputFrame::moving(1, 0);
        // One swing, then walk until the next press
        if tick % 30 == 0 {
            frame = frame.with_attack();
        }
        app.world_mut()
            .resource_mut::<PlayerInputs>()
            .set(PlayerSlot(0), frame);
        step(&mut app);
        zone_events += app
            .world()
            .resource::<Events<EncounterEvent>>()
            .iter_current_update_events()
            .count();

        let phase = app.world().resource::<SimContext>().phase;
        if matches!(phase, SessionPhase::GameOver | SessionPhase::Complete) {
            break;
        }
    }

    let snapshot = app.world().resource::<SimSnapshot>();
    info!(
        "Stopped at tick {} in {:?} with {} entities on screen, {} zone events",
        snapshot.tick,
        snapshot.phase,
        snapshot.entities.len(),
        zone_events
    );
    for hud in &snapshot.hud {
        info!(
            "{:?}: {}/{} hp, {} shards, {} points, {} lives",
            hud.slot, hud.health, hud.max_health, hud.shards, hud.score, hud.lives
        );
    }
}
