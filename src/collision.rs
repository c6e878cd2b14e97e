//! Collision resolver.
//!
//! Pure functions over entity snapshots and the hunter grid built earlier in
//! the tick. Nothing here mutates the world: [`check`] returns typed events
//! and the resolve step decides what they do.
//!
//! Category pairs, in event order:
//! 1. player projectile vs hunter (one hunter per shot, the closest)
//! 2. enemy projectile vs player
//! 3. player vs hunter, reported as a ram while boosting
//! 4. player vs pickup

use crate::components::{Owner, PickupKind};
use crate::spatial::SpatialGrid;
use bevy_ecs::prelude::*;
use glam::Vec2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Circles overlap iff the distance between centers is strictly less than
/// the sum of radii. Touching circles do not collide.
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) < ra + rb
}

/// Category of a snapshotted body. Hunters are looked up in the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyKind {
    Projectile(Owner),
    Pickup(PickupKind),
}

/// Read-only copy of one live body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySnapshot {
    pub entity: Entity,
    pub kind: BodyKind,
    pub pos: Vec2,
    pub radius: f32,
}

/// Read-only copy of the player for collision purposes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerProbe {
    pub pos: Vec2,
    pub radius: f32,
    /// False while respawning or after game over; the player then collides
    /// with nothing.
    pub present: bool,
    pub boosting: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionEvent {
    ShotHitHunter { projectile: Entity, hunter: Entity },
    PlayerShot { projectile: Entity },
    PlayerContact { hunter: Entity },
    BoostRam { hunter: Entity },
    PickupCollected { pickup: Entity, kind: PickupKind },
}

/// Detect every collision between the player, the hunters in `hunters`
/// and the given projectile and pickup bodies.
pub fn check(
    player: &PlayerProbe,
    hunters: &SpatialGrid,
    bodies: &[BodySnapshot],
) -> Vec<CollisionEvent> {
    let mut events = player_shot_hits(hunters, bodies);

    if !player.present {
        return events;
    }

    for body in bodies {
        if let BodyKind::Projectile(Owner::Enemy) = body.kind {
            if circles_overlap(player.pos, player.radius, body.pos, body.radius) {
                events.push(CollisionEvent::PlayerShot {
                    projectile: body.entity,
                });
            }
        }
    }

    for hit in hunters.query_overlapping(player.pos, player.radius) {
        events.push(if player.boosting {
            CollisionEvent::BoostRam { hunter: hit.entity }
        } else {
            CollisionEvent::PlayerContact { hunter: hit.entity }
        });
    }

    for body in bodies {
        if let BodyKind::Pickup(kind) = body.kind {
            if circles_overlap(player.pos, player.radius, body.pos, body.radius) {
                events.push(CollisionEvent::PickupCollected {
                    pickup: body.entity,
                    kind,
                });
            }
        }
    }

    events
}

fn shot_hit(grid: &SpatialGrid, body: &BodySnapshot) -> Option<CollisionEvent> {
    if body.kind != BodyKind::Projectile(Owner::Player) {
        return None;
    }
    grid.query_overlapping(body.pos, body.radius)
        .first()
        .map(|hit| CollisionEvent::ShotHitHunter {
            projectile: body.entity,
            hunter: hit.entity,
        })
}

#[cfg(feature = "parallel")]
fn player_shot_hits(grid: &SpatialGrid, bodies: &[BodySnapshot]) -> Vec<CollisionEvent> {
    bodies.par_iter().filter_map(|body| shot_hit(grid, body)).collect()
}

#[cfg(not(feature = "parallel"))]
fn player_shot_hits(grid: &SpatialGrid, bodies: &[BodySnapshot]) -> Vec<CollisionEvent> {
    bodies.iter().filter_map(|body| shot_hit(grid, body)).collect()
}
