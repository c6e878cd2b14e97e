//! Player systems: pointer following, timers and auto-fire.

use crate::components::{Owner, PowerUpKind};
use crate::config::{GameConfig, GameMode};
use crate::docking::DockTarget;
use crate::frame::SimClock;
use crate::player::{Player, Pointer};
use crate::spatial::SpatialGrid;
use crate::systems::movement::DeltaTime;
use crate::systems::resolve::{Action, PendingActions};
use bevy_ecs::prelude::*;
use glam::Vec2;

/// Hunters further away than this are not auto-targeted.
pub const AUTO_AIM_RANGE: f32 = 600.0;

/// Moves the avatar toward the docking target if there is one, otherwise
/// toward the pointer.
///
/// ## Data Access
/// - Reads: DeltaTime, Pointer, DockTarget, GameConfig
/// - Writes: Player
pub fn player_motion_system(
    dt: Res<DeltaTime>,
    pointer: Res<Pointer>,
    dock: Res<DockTarget>,
    config: Res<GameConfig>,
    mut player: ResMut<Player>,
) {
    if let Some(target) = dock.0 {
        player.smooth_toward(target, dt.0, config.docking_smoothing);
        return;
    }
    if !player.is_alive() {
        return;
    }
    if pointer.present && pointer.hit_testing {
        player.smooth_toward(pointer.pos, dt.0, config.player_smoothing);
    }
}

/// Respawn, invulnerability, power-up expiry and fire cooldown.
pub fn player_timers_system(
    dt: Res<DeltaTime>,
    clock: Res<SimClock>,
    config: Res<GameConfig>,
    pointer: Res<Pointer>,
    mut player: ResMut<Player>,
) {
    if player.tick_timers(dt.0, config.invulnerability) && pointer.present {
        player.snap_to(pointer.pos);
    }
    for kind in player.expire_power_ups(clock.elapsed) {
        log::debug!("power-up {:?} expired", kind);
    }
    player.fire_cooldown = (player.fire_cooldown - dt.0).max(0.0);
}

/// Shooter mode: fire at the nearest hunter whenever the cooldown allows.
///
/// ## Data Access
/// - Reads: GameConfig, SimClock, SpatialGrid
/// - Writes: Player, PendingActions
pub fn player_fire_system(
    config: Res<GameConfig>,
    clock: Res<SimClock>,
    grid: Res<SpatialGrid>,
    mut player: ResMut<Player>,
    mut actions: ResMut<PendingActions>,
) {
    if config.mode != GameMode::Shooter || !player.is_alive() || player.fire_cooldown > 0.0 {
        return;
    }
    let Some(nearest) = grid.nearest(player.pos, AUTO_AIM_RANGE) else {
        return;
    };
    let direction = (nearest.pos - player.pos).normalize_or(Vec2::X);
    player.facing = direction.y.atan2(direction.x);
    actions.push(Action::Fire {
        owner: Owner::Player,
        from: player.pos,
        direction,
    });
    let rapid = player.power_up_active(PowerUpKind::RapidFire, clock.elapsed);
    player.fire_cooldown = if rapid {
        config.fire_interval * 0.5
    } else {
        config.fire_interval
    };
}
