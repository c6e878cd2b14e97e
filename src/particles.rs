//! Bounded particle pool for explosions and trails.
//!
//! Ordinary emission is truncated at the soft cap. Death bursts pass
//! `force = true` so they are always visible, even on a crowded screen; the
//! pool then shrinks back under the cap as particles expire.

use crate::surface::{Rgba, Surface};
use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::Rng;

/// Linear drag coefficient (1/s) for new particles.
const DEFAULT_DRAG: f32 = 2.5;
const MIN_SPEED: f32 = 40.0;
const MAX_SPEED: f32 = 220.0;
const MIN_LIFE: f32 = 0.35;
const MAX_LIFE: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub drag: f32,
    pub color: Rgba,
    pub size: f32,
    /// Seconds left.
    pub life: f32,
    pub max_life: f32,
}

impl Particle {
    /// Opacity from the remaining life ratio.
    pub fn alpha(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0)
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    pub fn update(&mut self, dt: f32) {
        self.vel *= (1.0 - self.drag * dt).max(0.0);
        self.pos += self.vel * dt;
        self.life -= dt;
    }
}

#[derive(Resource, Debug, Clone)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    cap: usize,
}

impl ParticlePool {
    pub fn new(cap: usize) -> Self {
        Self {
            particles: Vec::with_capacity(cap),
            cap,
        }
    }

    /// Emit up to `count` particles at `at`. Without `force` the burst is
    /// truncated to the room left under the cap. Returns how many were
    /// created.
    pub fn create<R: Rng + ?Sized>(
        &mut self,
        at: Vec2,
        count: usize,
        color: Rgba,
        force: bool,
        rng: &mut R,
    ) -> usize {
        let n = if force {
            count
        } else {
            count.min(self.cap.saturating_sub(self.particles.len()))
        };
        for _ in 0..n {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let speed = rng.gen_range(MIN_SPEED..MAX_SPEED);
            let life = rng.gen_range(MIN_LIFE..MAX_LIFE);
            self.particles.push(Particle {
                pos: at,
                vel: Vec2::from_angle(angle) * speed,
                drag: DEFAULT_DRAG,
                color,
                size: rng.gen_range(1.0..3.0),
                life,
                max_life: life,
            });
        }
        n
    }

    /// Advance every particle and drop the expired ones.
    pub fn update(&mut self, dt: f32) {
        for particle in &mut self.particles {
            particle.update(dt);
        }
        self.particles.retain(Particle::is_alive);
    }

    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        for p in &self.particles {
            surface.fill_circle(p.pos, p.size, p.color.fade(p.alpha()));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
