//! ECS Components for the cursor arcade simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use crate::behavior::{BOMBER_LIFETIME, DASHER_STALK_TIME, SNIPER_FIRST_SHOT_DELAY};
use crate::species::Species;
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Smallest radius any body may have.
pub const MIN_RADIUS: f32 = 0.5;

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// Position in page (CSS pixel) coordinates, y pointing down.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec2);

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        self.0.distance(other.0)
    }
}

/// Velocity in pixels per second.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec2);

impl Velocity {
    pub fn new(vx: f32, vy: f32) -> Self {
        Self(Vec2::new(vx, vy))
    }

    pub fn magnitude(&self) -> f32 {
        self.0.length()
    }
}

/// Base data every store-owned entity carries: a collision circle and the
/// removal flag the end-of-tick sweep looks at.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Body {
    radius: f32,
    marked_for_removal: bool,
}

impl Body {
    pub fn new(radius: f32) -> Self {
        Self {
            radius: sanitize_radius(radius),
            marked_for_removal: false,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = sanitize_radius(radius);
    }

    /// Flag for removal. Returns `true` only the first time.
    pub fn mark_removed(&mut self) -> bool {
        let newly = !self.marked_for_removal;
        self.marked_for_removal = true;
        newly
    }

    pub fn is_removed(&self) -> bool {
        self.marked_for_removal
    }
}

fn sanitize_radius(radius: f32) -> f32 {
    if radius.is_finite() {
        radius.max(MIN_RADIUS)
    } else {
        MIN_RADIUS
    }
}

// ============================================================================
// HUNTER COMPONENTS
// ============================================================================

/// An enemy. Debris produced by splitting carries a higher `generation`.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Hunter {
    pub species: Species,
    pub health: f32,
    pub max_health: f32,
    pub generation: u8,
}

impl Hunter {
    pub fn new(species: Species, generation: u8) -> Self {
        let health = (species.stats().health / (1.0 + generation as f32)).max(1.0);
        Self {
            species,
            health,
            max_health: health,
            generation,
        }
    }

    /// Apply damage. Returns `true` when this hit brought health to zero.
    pub fn damage(&mut self, amount: f32) -> bool {
        let was_alive = self.health > 0.0;
        self.health = (self.health - amount).max(0.0);
        was_alive && self.health <= 0.0
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }
}

/// Phases of the dasher's ability cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DasherPhase {
    Stalk,
    Windup,
    Dash,
    Snipe,
    Recover,
}

/// Per-species mutable AI scratch state.
///
/// The variant always matches the hunter's species; behaviors reject a
/// mismatched variant instead of guessing.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub enum AiScratch {
    Chaser {
        enraged: bool,
    },
    Interceptor {
        flanking: bool,
    },
    Sniper {
        fire_cooldown: f32,
        strafe_sign: f32,
    },
    Dasher {
        phase: DasherPhase,
        phase_timer: f32,
        dash_target: Option<Vec2>,
    },
    Phantom {
        afraid: bool,
    },
    /// `remaining` is the only clock: spawn, wander, kamikaze and detonation
    /// are all derived from it.
    Bomber {
        remaining: f32,
        lifetime: f32,
        wander_target: Option<Vec2>,
    },
    Splitter {
        wobble: f32,
    },
}

impl AiScratch {
    pub fn initial(species: Species) -> Self {
        match species {
            Species::Chaser => AiScratch::Chaser { enraged: false },
            Species::Interceptor => AiScratch::Interceptor { flanking: false },
            Species::Sniper => AiScratch::Sniper {
                fire_cooldown: SNIPER_FIRST_SHOT_DELAY,
                strafe_sign: 1.0,
            },
            Species::Dasher => AiScratch::Dasher {
                phase: DasherPhase::Stalk,
                phase_timer: DASHER_STALK_TIME,
                dash_target: None,
            },
            Species::Phantom => AiScratch::Phantom { afraid: false },
            Species::Bomber => AiScratch::Bomber {
                remaining: BOMBER_LIFETIME,
                lifetime: BOMBER_LIFETIME,
                wander_target: None,
            },
            Species::Splitter => AiScratch::Splitter { wobble: 0.0 },
        }
    }
}

/// Target point written by the behavior, consumed by the movement step.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Steering {
    pub target: Vec2,
    /// Multiplier on the species cruise speed (dashes, retreats, enrage).
    pub speed_scale: f32,
}

impl Default for Steering {
    fn default() -> Self {
        Self {
            target: Vec2::ZERO,
            speed_scale: 1.0,
        }
    }
}

// ============================================================================
// PROJECTILE COMPONENTS
// ============================================================================

/// Who fired a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Owner {
    Player,
    Enemy,
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub owner: Owner,
    pub bounces_left: u8,
    /// Seconds until the projectile expires.
    pub ttl: f32,
    pub damage: f32,
}

// ============================================================================
// PICKUP COMPONENTS
// ============================================================================

/// Timed player power-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// Absorbs hits; contacted hunters are destroyed.
    Shield,
    /// Contact becomes a ram that kills hunters.
    Boost,
    /// Halves the auto-fire interval.
    RapidFire,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [PowerUpKind::Shield, PowerUpKind::Boost, PowerUpKind::RapidFire];

    pub fn label(self) -> &'static str {
        match self {
            PowerUpKind::Shield => "SHIELD",
            PowerUpKind::Boost => "BOOST",
            PowerUpKind::RapidFire => "RAPID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickupKind {
    PowerUp(PowerUpKind),
    Coin { value: u32 },
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub kind: PickupKind,
    /// Seconds left before the pickup disappears.
    pub lifespan: f32,
    pub max_lifespan: f32,
}

impl Pickup {
    pub fn new(kind: PickupKind, lifespan: f32) -> Self {
        Self {
            kind,
            lifespan,
            max_lifespan: lifespan,
        }
    }
}

// ============================================================================
// BUNDLE HELPERS
// ============================================================================

/// Bundle for spawning a complete hunter entity.
#[derive(Bundle)]
pub struct HunterBundle {
    pub hunter: Hunter,
    pub scratch: AiScratch,
    pub steering: Steering,
    pub body: Body,
    pub position: Position,
    pub velocity: Velocity,
}

impl HunterBundle {
    pub fn new(species: Species, at: Vec2, generation: u8) -> Self {
        let scale = 0.6_f32.powi(generation as i32);
        Self {
            hunter: Hunter::new(species, generation),
            scratch: AiScratch::initial(species),
            steering: Steering {
                target: at,
                speed_scale: 1.0,
            },
            body: Body::new(species.stats().radius * scale),
            position: Position(at),
            velocity: Velocity::default(),
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = Velocity(velocity);
        self
    }
}

/// Bundle for spawning a projectile.
#[derive(Bundle)]
pub struct ProjectileBundle {
    pub projectile: Projectile,
    pub body: Body,
    pub position: Position,
    pub velocity: Velocity,
}

impl ProjectileBundle {
    pub fn new(owner: Owner, at: Vec2, velocity: Vec2, ttl: f32, bounces: u8) -> Self {
        let radius = match owner {
            Owner::Player => 3.0,
            Owner::Enemy => 4.0,
        };
        Self {
            projectile: Projectile {
                owner,
                bounces_left: bounces,
                ttl,
                damage: 1.0,
            },
            body: Body::new(radius),
            position: Position(at),
            velocity: Velocity(velocity),
        }
    }
}

/// Bundle for spawning a pickup.
#[derive(Bundle)]
pub struct PickupBundle {
    pub pickup: Pickup,
    pub body: Body,
    pub position: Position,
    pub velocity: Velocity,
}

impl PickupBundle {
    pub fn new(kind: PickupKind, at: Vec2, lifespan: f32) -> Self {
        let radius = match kind {
            PickupKind::PowerUp(_) => 9.0,
            PickupKind::Coin { .. } => 6.0,
        };
        Self {
            pickup: Pickup::new(kind, lifespan),
            body: Body::new(radius),
            position: Position(at),
            velocity: Velocity::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_radius_never_drops_to_zero() {
        let mut body = Body::new(0.0);
        assert!(body.radius() > 0.0);
        body.set_radius(-4.0);
        assert!(body.radius() > 0.0);
        body.set_radius(f32::NAN);
        assert_eq!(body.radius(), MIN_RADIUS);
    }

    #[test]
    fn test_mark_removed_is_idempotent() {
        let mut body = Body::new(5.0);
        assert!(body.mark_removed());
        assert!(!body.mark_removed());
        assert!(body.is_removed());
    }

    #[test]
    fn test_hunter_damage_reports_kill_once() {
        let mut hunter = Hunter::new(Species::Sniper, 0);
        assert!(!hunter.damage(1.0));
        assert!(hunter.damage(1.0));
        assert!(!hunter.damage(1.0));
        assert_eq!(hunter.health, 0.0);
    }

    #[test]
    fn test_debris_is_smaller_than_parent() {
        let parent = HunterBundle::new(Species::Splitter, Vec2::ZERO, 0);
        let debris = HunterBundle::new(Species::Splitter, Vec2::ZERO, 1);
        assert!(debris.body.radius() < parent.body.radius());
        assert!(debris.hunter.max_health <= parent.hunter.max_health);
    }
}
