//! Game configuration.
//!
//! One `GameConfig` resource drives every tunable of a game instance. It is
//! plain serde data so a host can ship overrides as JSON; anything omitted
//! falls back to the defaults below.

use crate::error::ConfigError;
use crate::waves::WaveTable;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Which of the two arcade variants is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// The avatar is prey; survive and ram with power-ups.
    #[default]
    Hunt,
    /// Twin-stick: the avatar follows the pointer and auto-fires.
    Shooter,
}

/// Configuration for one game instance.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub mode: GameMode,
    /// Upper bound on a single frame's delta time, in seconds.
    pub max_dt: f32,
    pub max_lives: u32,
    /// Seconds the avatar stays down after losing a life.
    pub respawn_delay: f32,
    /// Seconds of invulnerability after respawning.
    pub invulnerability: f32,
    pub player_radius: f32,
    /// Smoothing coefficient (1/s) when following the pointer.
    pub player_smoothing: f32,
    /// Faster smoothing coefficient (1/s) when homing on a docking target.
    pub docking_smoothing: f32,
    /// Distance (px) under which the docking transition starts ramping.
    pub docking_snap_distance: f32,
    /// Seconds for the docking transition to go 0 -> 1 (or back).
    pub docking_transition: f32,
    /// Soft cap on live particles.
    pub particle_cap: usize,
    pub projectile_speed: f32,
    pub projectile_ttl: f32,
    pub projectile_bounces: u8,
    /// Seconds between auto-fire shots in shooter mode.
    pub fire_interval: f32,
    pub enemy_projectile_speed: f32,
    pub power_up_duration: f32,
    pub power_up_drop_chance: f32,
    pub coin_drop_chance: f32,
    pub pickup_lifespan: f32,
    /// Seconds between consecutive spawns within a wave.
    pub spawn_stagger: f32,
    pub inter_wave_delay: f32,
    pub first_wave_delay: f32,
    /// Overrides the mode's default wave table.
    pub waves: Option<WaveTable>,
    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Hunt,
            max_dt: 0.1,
            max_lives: 3,
            respawn_delay: 1.2,
            invulnerability: 2.0,
            player_radius: 8.0,
            player_smoothing: 14.0,
            docking_smoothing: 22.0,
            docking_snap_distance: 2.5,
            docking_transition: 0.35,
            particle_cap: 400,
            projectile_speed: 520.0,
            projectile_ttl: 1.6,
            projectile_bounces: 2,
            fire_interval: 0.22,
            enemy_projectile_speed: 260.0,
            power_up_duration: 8.0,
            power_up_drop_chance: 0.12,
            coin_drop_chance: 0.35,
            pickup_lifespan: 9.0,
            spawn_stagger: 0.35,
            inter_wave_delay: 2.0,
            first_wave_delay: 0.8,
            waves: None,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn for_mode(mode: GameMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_dt", self.max_dt),
            ("respawn_delay", self.respawn_delay),
            ("player_radius", self.player_radius),
            ("player_smoothing", self.player_smoothing),
            ("docking_smoothing", self.docking_smoothing),
            ("docking_snap_distance", self.docking_snap_distance),
            ("docking_transition", self.docking_transition),
            ("projectile_speed", self.projectile_speed),
            ("projectile_ttl", self.projectile_ttl),
            ("fire_interval", self.fire_interval),
            ("enemy_projectile_speed", self.enemy_projectile_speed),
            ("power_up_duration", self.power_up_duration),
            ("pickup_lifespan", self.pickup_lifespan),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive {
                    field,
                    value: value as f64,
                });
            }
        }
        if self.max_lives == 0 {
            return Err(ConfigError::NonPositive {
                field: "max_lives",
                value: 0.0,
            });
        }
        for (field, value) in [
            ("power_up_drop_chance", self.power_up_drop_chance),
            ("coin_drop_chance", self.coin_drop_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange {
                    field,
                    value: value as f64,
                });
            }
        }
        if let Some(table) = &self.waves {
            table.validate()?;
        }
        Ok(())
    }

    /// The wave table in effect: the override, or the mode's default.
    pub fn wave_table(&self) -> WaveTable {
        self.waves
            .clone()
            .unwrap_or_else(|| WaveTable::default_for(self.mode))
    }
}
