//! Resolve system - applies collision events, then queued actions.
//!
//! Runs as an exclusive system so one pass can read and spawn freely:
//! 1. **Events**: every collision event detected this tick is applied once.
//!    A per-tick guard makes simultaneous hits on the player cost one life.
//! 2. **Actions**: the queue filled by behaviors, player fire and step 1 is
//!    drained in order. Applying an action may queue more (a killed bomber
//!    detonates, the blast kills its neighbours), all within this tick.
//!
//! Entities are only flagged here; the sweep that follows removes them.

use crate::behavior::BOMBER_BLAST_RADIUS;
use crate::collision::CollisionEvent;
use crate::components::*;
use crate::config::{GameConfig, GameMode};
use crate::frame::SimClock;
use crate::host::sound;
use crate::particles::ParticlePool;
use crate::player::{HitOutcome, Player};
use crate::species::Species;
use crate::store::GameRng;
use crate::surface::{palette, Rgba};
use crate::systems::detection::CollisionEvents;
use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::Rng;
use std::collections::VecDeque;

/// Seconds an enemy projectile lives.
pub const ENEMY_SHOT_TTL: f32 = 4.0;
/// Splitters stop splitting once debris reaches this generation.
pub const MAX_SPLIT_GENERATION: u8 = 2;
const DEBRIS_SPEED: f32 = 120.0;
const BLAST_DAMAGE: f32 = 2.0;
const COIN_VALUE: u32 = 25;

const SPARK_COUNT: usize = 4;
const DEATH_BURST: usize = 14;
const PLAYER_BURST: usize = 24;
const BLAST_BURST: usize = 30;

/// Deferred world mutation requested during a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Fire {
        owner: Owner,
        from: Vec2,
        direction: Vec2,
    },
    Kill {
        hunter: Entity,
        by_player: bool,
    },
    Detonate {
        at: Vec2,
        radius: f32,
        /// Set when the blast came from a boosting ram; the rammer is not hurt.
        spares_player: bool,
    },
    SpawnHunter {
        species: Species,
        at: Vec2,
        generation: u8,
        velocity: Vec2,
    },
    SpawnPickup {
        kind: PickupKind,
        at: Vec2,
    },
}

/// Actions waiting for the resolve step.
#[derive(Resource, Debug, Default)]
pub struct PendingActions(pub VecDeque<Action>);

impl PendingActions {
    pub fn push(&mut self, action: Action) {
        self.0.push_back(action);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Sound ids requested this tick, drained by the game after the schedule.
#[derive(Resource, Debug, Default)]
pub struct SoundQueue(pub Vec<&'static str>);

impl SoundQueue {
    pub fn play(&mut self, id: &'static str) {
        self.0.push(id);
    }

    pub fn drain(&mut self) -> Vec<&'static str> {
        std::mem::take(&mut self.0)
    }
}

#[derive(Debug, Default)]
struct HitGuard {
    player_hit: bool,
}

/// Exclusive system applying this tick's collision events and actions.
///
/// ## Data Access
/// - Reads: GameConfig, SimClock
/// - Writes: everything an action can touch (Player, ParticlePool,
///   SoundQueue, GameRng, Hunter, Body, spawned entities)
pub fn resolve_system(world: &mut World) {
    let events = std::mem::take(&mut world.resource_mut::<CollisionEvents>().0);
    let mut queue = std::mem::take(&mut world.resource_mut::<PendingActions>().0);
    let mut guard = HitGuard::default();

    for event in events {
        apply_event(world, event, &mut guard, &mut queue);
    }
    while let Some(action) = queue.pop_front() {
        apply_action(world, action, &mut guard, &mut queue);
    }
}

// ============================================================================
// EVENTS
// ============================================================================

fn apply_event(
    world: &mut World,
    event: CollisionEvent,
    guard: &mut HitGuard,
    queue: &mut VecDeque<Action>,
) {
    let now = world.resource::<SimClock>().elapsed;
    match event {
        CollisionEvent::ShotHitHunter { projectile, hunter } => {
            if is_removed(world, hunter) || !mark_removed(world, projectile) {
                return;
            }
            let damage = world.get::<Projectile>(projectile).map_or(1.0, |p| p.damage);
            let Some(mut target) = world.get_mut::<Hunter>(hunter) else {
                return;
            };
            let killed = target.damage(damage);
            let color = target.species.stats().color;
            if let Some(at) = position_of(world, hunter) {
                burst(world, at, SPARK_COUNT, color, false);
            }
            play(world, sound::HIT);
            if killed {
                queue.push_back(Action::Kill {
                    hunter,
                    by_player: true,
                });
            }
        }
        CollisionEvent::PlayerShot { projectile } => {
            if mark_removed(world, projectile) {
                hit_player(world, guard);
            }
        }
        CollisionEvent::PlayerContact { hunter } => {
            if is_removed(world, hunter) {
                return;
            }
            if world.resource::<Player>().power_up_active(PowerUpKind::Shield, now) {
                // Shield soaks the contact and destroys the hunter.
                play(world, sound::SHIELD);
                queue.push_back(Action::Kill {
                    hunter,
                    by_player: true,
                });
                return;
            }
            let outcome = hit_player(world, guard);
            let fragile = world
                .get::<Hunter>(hunter)
                .is_some_and(|h| h.species.detonates_on_death());
            if fragile && outcome != HitOutcome::Ignored {
                queue.push_back(Action::Kill {
                    hunter,
                    by_player: false,
                });
            }
        }
        CollisionEvent::BoostRam { hunter } => {
            if !is_removed(world, hunter) {
                queue.push_back(Action::Kill {
                    hunter,
                    by_player: true,
                });
            }
        }
        CollisionEvent::PickupCollected { pickup, kind } => {
            if !mark_removed(world, pickup) {
                return;
            }
            match kind {
                PickupKind::PowerUp(power_up) => {
                    let duration = world.resource::<GameConfig>().power_up_duration;
                    world.resource_mut::<Player>().activate(power_up, now, duration);
                    play(world, sound::PICKUP);
                }
                PickupKind::Coin { value } => {
                    world.resource_mut::<Player>().add_score(value);
                    play(world, sound::COIN);
                }
            }
        }
    }
}

/// Apply one hit to the player unless it already took one this tick.
fn hit_player(world: &mut World, guard: &mut HitGuard) -> HitOutcome {
    if guard.player_hit {
        return HitOutcome::Ignored;
    }
    let now = world.resource::<SimClock>().elapsed;
    let delay = world.resource::<GameConfig>().respawn_delay;
    let outcome = world.resource_mut::<Player>().take_hit(now, delay);
    let at = world.resource::<Player>().pos;
    match outcome {
        HitOutcome::Ignored => {}
        HitOutcome::Absorbed => {
            guard.player_hit = true;
            play(world, sound::SHIELD);
        }
        HitOutcome::LifeLost => {
            guard.player_hit = true;
            burst(world, at, PLAYER_BURST, palette::PLAYER, true);
            play(world, sound::PLAYER_HIT);
        }
        HitOutcome::GameOver => {
            guard.player_hit = true;
            burst(world, at, PLAYER_BURST, palette::DANGER, true);
            play(world, sound::GAME_OVER);
            log::info!("game over, score {}", world.resource::<Player>().score);
        }
    }
    outcome
}

// ============================================================================
// ACTIONS
// ============================================================================

fn apply_action(
    world: &mut World,
    action: Action,
    guard: &mut HitGuard,
    queue: &mut VecDeque<Action>,
) {
    match action {
        Action::Fire {
            owner,
            from,
            direction,
        } => {
            let config = world.resource::<GameConfig>();
            let (speed, ttl, bounces) = match owner {
                Owner::Player => (
                    config.projectile_speed,
                    config.projectile_ttl,
                    config.projectile_bounces,
                ),
                Owner::Enemy => (config.enemy_projectile_speed, ENEMY_SHOT_TTL, 0),
            };
            world.spawn(ProjectileBundle::new(owner, from, direction * speed, ttl, bounces));
            if owner == Owner::Player {
                play(world, sound::SHOOT);
            }
        }
        Action::Kill { hunter, by_player } => kill(world, hunter, by_player, queue),
        Action::Detonate {
            at,
            radius,
            spares_player,
        } => detonate(world, at, radius, spares_player, guard, queue),
        Action::SpawnHunter {
            species,
            at,
            generation,
            velocity,
        } => {
            world.spawn(HunterBundle::new(species, at, generation).with_velocity(velocity));
        }
        Action::SpawnPickup { kind, at } => {
            let lifespan = world.resource::<GameConfig>().pickup_lifespan;
            world.spawn(PickupBundle::new(kind, at, lifespan));
        }
    }
}

fn kill(world: &mut World, entity: Entity, by_player: bool, queue: &mut VecDeque<Action>) {
    let Some(hunter) = world.get::<Hunter>(entity).copied() else {
        return;
    };
    let Some(at) = position_of(world, entity) else {
        return;
    };
    if !mark_removed(world, entity) {
        return;
    }
    if let Some(mut h) = world.get_mut::<Hunter>(entity) {
        h.health = 0.0;
    }

    let species = hunter.species;
    let stats = species.stats();
    if by_player {
        let points = stats.score / (1 + hunter.generation as u32);
        world.resource_mut::<Player>().add_score(points);
    }
    burst(world, at, DEATH_BURST, stats.color, false);
    play(world, sound::EXPLOSION);

    if species.detonates_on_death() {
        let now = world.resource::<SimClock>().elapsed;
        let spares_player = world
            .resource::<Player>()
            .power_up_active(PowerUpKind::Boost, now);
        queue.push_back(Action::Detonate {
            at,
            radius: BOMBER_BLAST_RADIUS,
            spares_player,
        });
    }

    if species == Species::Splitter && hunter.generation < MAX_SPLIT_GENERATION {
        let angle = world.resource_mut::<GameRng>().0.gen_range(0.0..std::f32::consts::TAU);
        let dir = Vec2::from_angle(angle);
        for side in [1.0, -1.0] {
            queue.push_back(Action::SpawnHunter {
                species,
                at: at + dir * side * stats.radius * 0.5,
                generation: hunter.generation + 1,
                velocity: dir * side * DEBRIS_SPEED,
            });
        }
    }

    if by_player {
        roll_drop(world, at, queue);
    }
}

fn roll_drop(world: &mut World, at: Vec2, queue: &mut VecDeque<Action>) {
    let config = world.resource::<GameConfig>();
    let (mode, coin_chance, power_up_chance) = (
        config.mode,
        config.coin_drop_chance,
        config.power_up_drop_chance,
    );
    let mut rng = world.resource_mut::<GameRng>();
    let kind = match mode {
        GameMode::Hunt => {
            if !rng.0.gen_bool(coin_chance.clamp(0.0, 1.0) as f64) {
                return;
            }
            PickupKind::Coin { value: COIN_VALUE }
        }
        GameMode::Shooter => {
            if !rng.0.gen_bool(power_up_chance.clamp(0.0, 1.0) as f64) {
                return;
            }
            let index = rng.0.gen_range(0..PowerUpKind::ALL.len());
            PickupKind::PowerUp(PowerUpKind::ALL[index])
        }
    };
    queue.push_back(Action::SpawnPickup { kind, at });
}

fn detonate(
    world: &mut World,
    at: Vec2,
    radius: f32,
    spares_player: bool,
    guard: &mut HitGuard,
    queue: &mut VecDeque<Action>,
) {
    burst(world, at, BLAST_BURST, palette::EXPLOSION, false);
    play(world, sound::EXPLOSION);

    let player = world.resource::<Player>();
    if !spares_player && player.is_alive() && player.pos.distance(at) < radius + player.radius {
        hit_player(world, guard);
    }

    let mut query = world.query::<(Entity, &mut Hunter, &Position, &Body)>();
    for (entity, mut hunter, pos, body) in query.iter_mut(world) {
        if body.is_removed() || pos.0.distance(at) >= radius + body.radius() {
            continue;
        }
        if hunter.damage(BLAST_DAMAGE) {
            queue.push_back(Action::Kill {
                hunter: entity,
                by_player: false,
            });
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn is_removed(world: &World, entity: Entity) -> bool {
    world.get::<Body>(entity).map_or(true, Body::is_removed)
}

/// Flag an entity for the sweep. `false` if it was already flagged or is gone.
fn mark_removed(world: &mut World, entity: Entity) -> bool {
    world
        .get_mut::<Body>(entity)
        .is_some_and(|mut body| body.mark_removed())
}

fn position_of(world: &World, entity: Entity) -> Option<Vec2> {
    world.get::<Position>(entity).map(|p| p.0)
}

fn play(world: &mut World, id: &'static str) {
    world.resource_mut::<SoundQueue>().play(id);
}

fn burst(world: &mut World, at: Vec2, count: usize, color: Rgba, force: bool) {
    world.resource_scope(|world, mut pool: Mut<ParticlePool>| {
        let mut rng = world.resource_mut::<GameRng>();
        pool.create(at, count, color, force, &mut rng.0);
    });
}
