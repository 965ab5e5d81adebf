//! Simulation tunables.
//!
//! Every constant the simulation uses is a field here. Defaults match the
//! shipped `assets/data/config.ron`; any field missing from a config file
//! falls back to its default.

use bevy::prelude::*;
use serde::Deserialize;

#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed ticks per second
    pub tick_rate: u32,

    // Movement (pixels per tick)
    pub gravity: f32,
    pub ground_friction: f32,
    pub walk_speed: f32,
    pub run_speed: f32,
    pub jump_force: f32,
    /// Vertical screen pixels per unit of depth
    pub depth_scale: f32,

    // Combat
    /// Max depth difference for two boxes to touch
    pub depth_proximity: f32,
    pub grab_range: f32,
    /// Reach for mounting and pickups
    pub interaction_range: f32,
    pub combo_window_ms: u32,
    /// Fraction of an attack clip after which a landed hit may be cancelled
    pub combo_cancel_fraction: f32,
    pub double_tap_window_ms: u32,
    pub dash_attack_window_ms: u32,
    pub invincibility_ticks: u64,
    pub throw_speed: f32,
    pub throw_lift: f32,
    pub magic_lifetime_ticks: u64,

    // Encounters
    pub max_enemies_solo: usize,
    pub max_enemies_coop: usize,
    pub coop_spawn_multiplier: f32,
    pub coop_boss_hp_multiplier: f32,
    pub difficulty_base: f32,
    /// How far outside the screen edge new enemies appear
    pub spawn_margin: f32,
    /// Enemies this far behind the camera are removed
    pub despawn_margin: f32,
    pub corpse_ticks: u64,

    // Session
    pub starting_lives: u32,
    pub max_continues: u32,
    pub continue_countdown_secs: u32,
    pub camp_duration_secs: u32,
    pub pixies_solo: usize,
    pub pixies_coop: usize,
    pub extra_life_scores: Vec<u64>,
    pub no_damage_wave_bonus: u64,

    // Screen
    pub screen_width: f32,
    pub screen_height: f32,
    /// Max horizontal distance of any player from the camera centre
    pub player_leash: f32,

    // AI
    pub reeval_min_ticks: u64,
    pub reeval_max_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            gravity: 0.5,
            ground_friction: 0.85,
            walk_speed: 2.5,
            run_speed: 4.0,
            jump_force: 8.0,
            depth_scale: 1.0,
            depth_proximity: 15.0,
            grab_range: 30.0,
            interaction_range: 28.0,
            combo_window_ms: 500,
            combo_cancel_fraction: 0.5,
            double_tap_window_ms: 250,
            dash_attack_window_ms: 300,
            invincibility_ticks: 60,
            throw_speed: 6.0,
            throw_lift: 4.0,
            magic_lifetime_ticks: 20,
            max_enemies_solo: 6,
            max_enemies_coop: 8,
            coop_spawn_multiplier: 1.5,
            coop_boss_hp_multiplier: 1.4,
            difficulty_base: 1.3,
            spawn_margin: 32.0,
            despawn_margin: 240.0,
            corpse_ticks: 90,
            starting_lives: 3,
            max_continues: 3,
            continue_countdown_secs: 10,
            camp_duration_secs: 15,
            pixies_solo: 2,
            pixies_coop: 3,
            extra_life_scores: vec![50_000, 100_000],
            no_damage_wave_bonus: 500,
            screen_width: 480.0,
            screen_height: 270.0,
            player_leash: 400.0,
            reeval_min_ticks: 60,
            reeval_max_ticks: 120,
        }
    }
}

impl SimConfig {
    /// Converts a wall-clock duration to whole ticks, rounding to nearest.
    pub fn ms_to_ticks(&self, ms: u32) -> u64 {
        (ms as u64 * self.tick_rate as u64 + 500) / 1000
    }

    pub fn secs_to_ticks(&self, secs: u32) -> u64 {
        secs as u64 * self.tick_rate as u64
    }

    pub fn combo_window_ticks(&self) -> u64 {
        self.ms_to_ticks(self.combo_window_ms)
    }

    pub fn enemy_cap(&self, coop: bool) -> usize {
        if coop {
            self.max_enemies_coop
        } else {
            self.max_enemies_solo
        }
    }

    pub fn spawn_multiplier(&self, coop: bool) -> f32 {
        if coop {
            self.coop_spawn_multiplier
        } else {
            1.0
        }
    }

    /// Stat multiplier for a 1-based level index.
    pub fn difficulty(&self, level_index: u32) -> f32 {
        self.difficulty_base
            .powi(level_index.saturating_sub(1) as i32)
    }

    pub fn pixie_count(&self, coop: bool) -> usize {
        if coop {
            self.pixies_coop
        } else {
            self.pixies_solo
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_window_is_thirty_ticks() {
        let config = SimConfig::default();
        assert_eq!(config.combo_window_ticks(), 30);
        assert_eq!(config.ms_to_ticks(600), 36);
    }

    #[test]
    fn test_difficulty_curve() {
        let config = SimConfig::default();
        assert_eq!(config.difficulty(1), 1.0);
        assert!((config.difficulty(3) - 1.69).abs() < 1e-4);
    }

    #[test]
    fn test_caps_by_mode() {
        let config = SimConfig::default();
        assert_eq!(config.enemy_cap(false), 6);
        assert_eq!(config.enemy_cap(true), 8);
        assert_eq!(config.spawn_multiplier(false), 1.0);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: SimConfig = ron::from_str("(walk_speed: 3.0)").unwrap();
        assert_eq!(config.walk_speed, 3.0);
        assert_eq!(config.max_enemies_coop, 8);
    }
}
