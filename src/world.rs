//! Serializable snapshot of the running game.
//!
//! The `Snapshot` struct is what the HUD draws from and what hosts that
//! render outside Rust receive as JSON.

use crate::components::*;
use crate::config::GameMode;
use crate::docking::DockingPhase;
use crate::player::Player;
use crate::systems::EntityCounts;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Player state for serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub x: f32,
    pub y: f32,
    pub facing: f32,
    pub lives: u32,
    pub max_lives: u32,
    pub score: u64,
    pub alive: bool,
    pub invulnerable: bool,
    pub game_over: bool,
    /// Active power-ups with seconds left, in kind order.
    pub power_ups: Vec<PowerUpSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUpSnapshot {
    pub kind: PowerUpKind,
    pub remaining: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HunterSnapshot {
    pub species: String,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub health: f32,
    pub health_max: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub owner: Owner,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupSnapshot {
    pub kind: PickupKind,
    pub x: f32,
    pub y: f32,
    pub lifespan: f32,
}

/// Complete game state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Simulation ticks run so far.
    pub tick: u64,
    /// Simulation seconds; paused time is not counted.
    pub time: f64,
    pub mode: GameMode,
    /// Current wave, 0 before the first one starts.
    pub wave: u32,
    pub player: PlayerSnapshot,
    pub hunters: Vec<HunterSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub pickups: Vec<PickupSnapshot>,
    pub particle_count: usize,
    pub docking: DockingPhase,
    pub docking_progress: f32,
    pub counts: EntityCounts,
}

impl Snapshot {
    /// Collect bodies and player state from the ECS world. Wave and docking
    /// fields are left at their defaults for the caller to fill in.
    pub fn from_world(world: &mut World, mode: GameMode) -> Self {
        let clock = *world.resource::<crate::frame::SimClock>();
        let player = player_snapshot(world.resource::<Player>(), clock.elapsed);

        let mut hunters = Vec::new();
        let mut query = world.query::<(&Hunter, &Position, &Body)>();
        for (hunter, pos, body) in query.iter(world) {
            hunters.push(HunterSnapshot {
                species: hunter.species.name().to_string(),
                x: pos.0.x,
                y: pos.0.y,
                radius: body.radius(),
                health: hunter.health,
                health_max: hunter.max_health,
            });
        }

        let mut projectiles = Vec::new();
        let mut query = world.query::<(&Projectile, &Position, &Velocity)>();
        for (projectile, pos, vel) in query.iter(world) {
            projectiles.push(ProjectileSnapshot {
                owner: projectile.owner,
                x: pos.0.x,
                y: pos.0.y,
                vx: vel.0.x,
                vy: vel.0.y,
            });
        }

        let mut pickups = Vec::new();
        let mut query = world.query::<(&Pickup, &Position)>();
        for (pickup, pos) in query.iter(world) {
            pickups.push(PickupSnapshot {
                kind: pickup.kind,
                x: pos.0.x,
                y: pos.0.y,
                lifespan: pickup.lifespan,
            });
        }

        Self {
            tick: clock.tick,
            time: clock.elapsed,
            mode,
            player,
            hunters,
            projectiles,
            pickups,
            particle_count: world.resource::<crate::particles::ParticlePool>().len(),
            counts: *world.resource::<EntityCounts>(),
            ..Self::default()
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn player_snapshot(player: &Player, now: f64) -> PlayerSnapshot {
    PlayerSnapshot {
        x: player.pos.x,
        y: player.pos.y,
        facing: player.facing,
        lives: player.lives,
        max_lives: player.max_lives,
        score: player.score,
        alive: player.is_alive(),
        invulnerable: player.invulnerable > 0.0,
        game_over: player.game_over,
        power_ups: player
            .remaining_power_ups(now)
            .into_iter()
            .map(|(kind, remaining)| PowerUpSnapshot { kind, remaining })
            .collect(),
    }
}
