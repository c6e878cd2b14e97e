//! Player avatar and pointer state.

use crate::components::PowerUpKind;
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Activation record for one power-up kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUpState {
    pub active: bool,
    /// Simulation time (seconds) at which the power-up lapses.
    pub expires_at: f64,
}

/// What a hit did to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Dead, respawning, invulnerable, or already game over.
    Ignored,
    /// Shield soaked it.
    Absorbed,
    LifeLost,
    GameOver,
}

/// The avatar that replaces the pointer.
#[derive(Resource, Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    /// Velocity estimated from the last smoothing step.
    pub velocity: Vec2,
    /// Facing angle in radians.
    pub facing: f32,
    pub radius: f32,
    pub lives: u32,
    pub max_lives: u32,
    /// Seconds until respawn; positive while dead.
    pub respawn_timer: f32,
    /// Seconds of post-respawn invulnerability left.
    pub invulnerable: f32,
    pub power_ups: BTreeMap<PowerUpKind, PowerUpState>,
    pub score: u64,
    pub game_over: bool,
    /// Seconds until the next auto-fire shot (shooter mode).
    pub fire_cooldown: f32,
}

impl Player {
    pub fn new(max_lives: u32, radius: f32, at: Vec2) -> Self {
        Self {
            pos: at,
            velocity: Vec2::ZERO,
            facing: 0.0,
            radius,
            lives: max_lives,
            max_lives,
            respawn_timer: 0.0,
            invulnerable: 0.0,
            power_ups: BTreeMap::new(),
            score: 0,
            game_over: false,
            fire_cooldown: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.game_over && self.respawn_timer <= 0.0
    }

    pub fn can_be_hit(&self) -> bool {
        self.is_alive() && self.invulnerable <= 0.0
    }

    pub fn power_up_active(&self, kind: PowerUpKind, now: f64) -> bool {
        self.power_ups
            .get(&kind)
            .is_some_and(|state| state.active && state.expires_at > now)
    }

    /// Activate (or refresh) a power-up for `duration` seconds from `now`.
    pub fn activate(&mut self, kind: PowerUpKind, now: f64, duration: f32) {
        self.power_ups.insert(
            kind,
            PowerUpState {
                active: true,
                expires_at: now + duration as f64,
            },
        );
    }

    /// Deactivate lapsed power-ups. Returns the kinds that lapsed this call.
    pub fn expire_power_ups(&mut self, now: f64) -> Vec<PowerUpKind> {
        let mut lapsed = Vec::new();
        for (kind, state) in self.power_ups.iter_mut() {
            if state.active && state.expires_at <= now {
                state.active = false;
                lapsed.push(*kind);
            }
        }
        lapsed
    }

    /// Seconds left on each active power-up, for the HUD.
    pub fn remaining_power_ups(&self, now: f64) -> Vec<(PowerUpKind, f32)> {
        self.power_ups
            .iter()
            .filter(|(_, s)| s.active && s.expires_at > now)
            .map(|(k, s)| (*k, (s.expires_at - now) as f32))
            .collect()
    }

    /// Exponential smoothing toward `target`; `coefficient` is in 1/s.
    pub fn smooth_toward(&mut self, target: Vec2, dt: f32, coefficient: f32) {
        if dt <= 0.0 {
            return;
        }
        let alpha = 1.0 - (-coefficient * dt).exp();
        let previous = self.pos;
        self.pos += (target - self.pos) * alpha;
        let moved = self.pos - previous;
        self.velocity = moved / dt;
        if moved.length_squared() > 0.0001 {
            self.facing = moved.y.atan2(moved.x);
        }
    }

    /// Teleport without touching facing (docking snap, respawn).
    pub fn snap_to(&mut self, at: Vec2) {
        self.pos = at;
        self.velocity = Vec2::ZERO;
    }

    /// Apply one hit. Lives never go below zero.
    pub fn take_hit(&mut self, now: f64, respawn_delay: f32) -> HitOutcome {
        if !self.can_be_hit() {
            return HitOutcome::Ignored;
        }
        if self.power_up_active(PowerUpKind::Shield, now) {
            return HitOutcome::Absorbed;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.game_over = true;
            HitOutcome::GameOver
        } else {
            self.respawn_timer = respawn_delay;
            HitOutcome::LifeLost
        }
    }

    /// Advance respawn and invulnerability timers. Returns `true` on the
    /// tick the player comes back.
    pub fn tick_timers(&mut self, dt: f32, invulnerability: f32) -> bool {
        if self.invulnerable > 0.0 {
            self.invulnerable = (self.invulnerable - dt).max(0.0);
        }
        if self.respawn_timer > 0.0 && !self.game_over {
            self.respawn_timer -= dt;
            if self.respawn_timer <= 0.0 {
                self.respawn_timer = 0.0;
                self.invulnerable = invulnerability;
                return true;
            }
        }
        false
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points as u64);
    }

    /// Back to full lives without touching score (soft reset).
    pub fn refill(&mut self) {
        self.lives = self.max_lives;
        self.game_over = false;
        self.respawn_timer = 0.0;
        self.invulnerable = 0.0;
        self.fire_cooldown = 0.0;
        self.power_ups.clear();
    }
}

/// Latest pointer state as reported by the host.
#[derive(Resource, Debug, Clone, Copy)]
pub struct Pointer {
    pub pos: Vec2,
    /// Pointer is over the page.
    pub present: bool,
    /// Pointer drives the simulation. Cleared while docked.
    pub hit_testing: bool,
}

impl Default for Pointer {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            present: false,
            hit_testing: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_last_life_sets_game_over_and_stops_at_zero() {
        let mut player = Player::new(1, 10.0, Vec2::ZERO);
        assert_eq!(player.take_hit(0.0, 1.0), HitOutcome::GameOver);
        assert_eq!(player.lives, 0);
        assert!(player.game_over);
        assert_eq!(player.take_hit(0.0, 1.0), HitOutcome::Ignored);
        assert_eq!(player.lives, 0);
    }

    #[test]
    fn test_shield_absorbs_hit() {
        let mut player = Player::new(3, 10.0, Vec2::ZERO);
        player.activate(PowerUpKind::Shield, 0.0, 5.0);
        assert_eq!(player.take_hit(1.0, 1.0), HitOutcome::Absorbed);
        assert_eq!(player.lives, 3);
        // After expiry the hit lands.
        assert_eq!(player.take_hit(6.0, 1.0), HitOutcome::LifeLost);
        assert_eq!(player.lives, 2);
    }

    #[test]
    fn test_respawn_grants_invulnerability() {
        let mut player = Player::new(3, 10.0, Vec2::ZERO);
        player.take_hit(0.0, 0.5);
        assert!(!player.is_alive());
        assert!(!player.tick_timers(0.25, 2.0));
        assert!(player.tick_timers(0.25, 2.0));
        assert!(player.is_alive());
        assert!(!player.can_be_hit());
        player.tick_timers(2.0, 2.0);
        assert!(player.can_be_hit());
    }

    #[test]
    fn test_expire_power_ups_reports_each_once() {
        let mut player = Player::new(3, 10.0, Vec2::ZERO);
        player.activate(PowerUpKind::Boost, 0.0, 1.0);
        assert!(player.expire_power_ups(0.5).is_empty());
        assert_eq!(player.expire_power_ups(1.5), vec![PowerUpKind::Boost]);
        assert!(player.expire_power_ups(2.0).is_empty());
        assert!(!player.power_up_active(PowerUpKind::Boost, 2.0));
    }

    #[test]
    fn test_smoothing_converges_and_sets_facing() {
        let mut player = Player::new(3, 10.0, Vec2::ZERO);
        for _ in 0..200 {
            player.smooth_toward(Vec2::new(0.0, 100.0), 1.0 / 60.0, 12.0);
        }
        assert_relative_eq!(player.pos.y, 100.0, epsilon = 0.01);
        assert_relative_eq!(player.facing, std::f32::consts::FRAC_PI_2, epsilon = 1e-4);
    }
}
