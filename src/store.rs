//! Entity store.
//!
//! Owns the ECS world holding every transient simulation object, together
//! with the schedule that advances it. Typed sub-views are plain filtered
//! queries (`With<Hunter>`, `With<Projectile>`, `With<Pickup>`), so they
//! can never fall out of sync with the world itself.

use crate::behavior::{BehaviorDeps, SharedAiState, BOMBER_LIFETIME};
use crate::components::*;
use crate::config::GameConfig;
use crate::docking::DockTarget;
use crate::frame::SimClock;
use crate::particles::ParticlePool;
use crate::player::{Player, Pointer};
use crate::spatial::SpatialGrid;
use crate::species::Species;
use crate::surface::{palette, Surface, TextAlign};
use crate::systems::*;
use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seeded random source shared by every system.
#[derive(Resource, Debug)]
pub struct GameRng(pub StdRng);

impl GameRng {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(StdRng::seed_from_u64(seed)),
            None => Self(StdRng::from_entropy()),
        }
    }
}

/// Something to put into the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Spawn {
    Hunter {
        species: Species,
        at: Vec2,
        generation: u8,
    },
    Projectile {
        owner: Owner,
        at: Vec2,
        velocity: Vec2,
        ttl: f32,
        bounces: u8,
    },
    Pickup {
        kind: PickupKind,
        at: Vec2,
        lifespan: f32,
    },
}

/// What one update produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Bodies removed by this tick's sweep.
    pub swept: usize,
    /// Post-sweep counts.
    pub counts: EntityCounts,
    /// Sound ids requested during the tick, in order.
    pub sounds: Vec<&'static str>,
}

pub struct EntityStore {
    world: World,
    schedule: Schedule,
}

impl EntityStore {
    pub fn new(config: &GameConfig) -> Self {
        let mut world = World::new();

        // Core resources
        world.insert_resource(config.clone());
        world.insert_resource(DeltaTime::default());
        world.insert_resource(Arena::default());
        world.insert_resource(SimClock::default());
        world.insert_resource(GameRng::new(config.seed));

        // Player and input
        world.insert_resource(Player::new(config.max_lives, config.player_radius, Vec2::ZERO));
        world.insert_resource(Pointer::default());
        world.insert_resource(DockTarget::default());

        // AI and resolution
        world.insert_resource(SharedAiState::default());
        world.insert_resource(BehaviorDeps::default());
        world.insert_resource(SpatialGrid::default());
        world.insert_resource(CollisionEvents::default());
        world.insert_resource(PendingActions::default());
        world.insert_resource(SoundQueue::default());
        world.insert_resource(EntityCounts::default());
        world.insert_resource(SweepReport::default());
        world.insert_resource(ParticlePool::new(config.particle_cap));

        Self {
            world,
            schedule: build_schedule(),
        }
    }

    pub fn add(&mut self, spawn: Spawn) -> Entity {
        match spawn {
            Spawn::Hunter {
                species,
                at,
                generation,
            } => self.world.spawn(HunterBundle::new(species, at, generation)).id(),
            Spawn::Projectile {
                owner,
                at,
                velocity,
                ttl,
                bounces,
            } => self
                .world
                .spawn(ProjectileBundle::new(owner, at, velocity, ttl, bounces))
                .id(),
            Spawn::Pickup { kind, at, lifespan } => {
                self.world.spawn(PickupBundle::new(kind, at, lifespan)).id()
            }
        }
    }

    /// Run one tick: AI, motion, collisions, action application and the
    /// single sweep.
    pub fn update(&mut self, dt: f32, arena: Arena) -> TickReport {
        self.world.resource_mut::<DeltaTime>().0 = dt;
        *self.world.resource_mut::<Arena>() = arena;
        self.world.resource_mut::<SimClock>().advance(dt);

        self.schedule.run(&mut self.world);

        TickReport {
            swept: self.world.resource::<SweepReport>().removed,
            counts: *self.world.resource::<EntityCounts>(),
            sounds: self.world.resource_mut::<SoundQueue>().drain(),
        }
    }

    pub fn update_particles(&mut self, dt: f32) {
        self.world.resource_mut::<ParticlePool>().update(dt);
    }

    /// Post-sweep counts from the last update.
    pub fn counts(&self) -> EntityCounts {
        *self.world.resource::<EntityCounts>()
    }

    /// Bodies currently in the world, flagged or not.
    pub fn len(&mut self) -> usize {
        self.world.query::<&Body>().iter(&self.world).count()
    }

    pub fn is_empty(&mut self) -> bool {
        self.len() == 0
    }

    /// Draw every body. Reads only; `&mut` is needed to build queries.
    pub fn draw<S: Surface + ?Sized>(&mut self, surface: &mut S) {
        let mut pickups = self.world.query::<(&Pickup, &Position, &Body)>();
        for (pickup, pos, body) in pickups.iter(&self.world) {
            let alpha = (pickup.lifespan / 2.0).clamp(0.2, 1.0);
            match pickup.kind {
                PickupKind::Coin { .. } => {
                    surface.fill_circle(pos.0, body.radius(), palette::COIN.fade(alpha));
                }
                PickupKind::PowerUp(kind) => {
                    let color = power_up_color(kind).fade(alpha);
                    surface.stroke_circle(pos.0, body.radius(), 2.0, color);
                    let label = &kind.label()[..1];
                    surface.text(pos.0 + Vec2::new(0.0, 4.0), label, 10.0, color, TextAlign::Center);
                }
            }
        }

        let mut projectiles = self.world.query::<(&Projectile, &Position, &Body)>();
        for (projectile, pos, body) in projectiles.iter(&self.world) {
            let color = match projectile.owner {
                Owner::Player => palette::PLAYER_SHOT,
                Owner::Enemy => palette::ENEMY_SHOT,
            };
            surface.fill_circle(pos.0, body.radius(), color);
        }

        let mut hunters = self.world.query::<(&Hunter, &AiScratch, &Position, &Body)>();
        for (hunter, scratch, pos, body) in hunters.iter(&self.world) {
            let color = hunter.species.stats().color;
            surface.fill_circle(pos.0, body.radius(), color);
            if let AiScratch::Bomber { remaining, .. } = scratch {
                // Fuse ring shrinks with the countdown.
                let fuse = (remaining / BOMBER_LIFETIME).clamp(0.0, 1.0);
                surface.stroke_circle(pos.0, body.radius() + 3.0 * fuse + 1.0, 1.0, palette::DANGER);
            }
            if hunter.health < hunter.max_health {
                let width = body.radius() * 2.0;
                let origin = pos.0 - Vec2::new(body.radius(), body.radius() + 5.0);
                surface.fill_rect(origin, Vec2::new(width, 2.0), palette::HUD_DIM);
                surface.fill_rect(
                    origin,
                    Vec2::new(width * hunter.health / hunter.max_health, 2.0),
                    color,
                );
            }
        }

        self.world.resource::<ParticlePool>().draw(surface);
    }

    /// Drop every body, queued action and particle. Player, clocks and
    /// shared AI state are kept.
    pub fn clear_field(&mut self) {
        let bodies: Vec<Entity> = self
            .world
            .query_filtered::<Entity, With<Body>>()
            .iter(&self.world)
            .collect();
        for entity in bodies {
            self.world.despawn(entity);
        }
        self.world.resource_mut::<CollisionEvents>().0.clear();
        self.world.resource_mut::<PendingActions>().clear();
        self.world.resource_mut::<SoundQueue>().drain();
        self.world.resource_mut::<ParticlePool>().clear();
        self.world.resource_mut::<SpatialGrid>().clear();
        *self.world.resource_mut::<EntityCounts>() = EntityCounts::default();
    }

    /// Back to a fresh store: empty field, new player, zeroed clocks.
    pub fn reset(&mut self) {
        self.clear_field();
        let config = self.world.resource::<GameConfig>().clone();
        let at = self.world.resource::<Player>().pos;
        self.world
            .insert_resource(Player::new(config.max_lives, config.player_radius, at));
        self.world.insert_resource(SimClock::default());
        self.world.insert_resource(SharedAiState::default());
        self.world.insert_resource(BehaviorDeps::default());
        self.world.insert_resource(DockTarget::default());
        self.world.insert_resource(SweepReport::default());
    }

    pub fn config(&self) -> &GameConfig {
        self.world.resource::<GameConfig>()
    }

    pub fn player(&self) -> &Player {
        self.world.resource::<Player>()
    }

    pub fn player_mut(&mut self) -> Mut<'_, Player> {
        self.world.resource_mut::<Player>()
    }

    pub fn pointer_mut(&mut self) -> Mut<'_, Pointer> {
        self.world.resource_mut::<Pointer>()
    }

    pub fn shared_mut(&mut self) -> Mut<'_, SharedAiState> {
        self.world.resource_mut::<SharedAiState>()
    }

    pub fn set_dock_target(&mut self, target: Option<Vec2>) {
        self.world.resource_mut::<DockTarget>().0 = target;
    }

    pub fn clock(&self) -> SimClock {
        *self.world.resource::<SimClock>()
    }

    pub fn particles(&self) -> &ParticlePool {
        self.world.resource::<ParticlePool>()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.world.resource_mut::<GameRng>().into_inner().0
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

pub fn power_up_color(kind: PowerUpKind) -> crate::surface::Rgba {
    match kind {
        PowerUpKind::Shield => palette::SHIELD,
        PowerUpKind::Boost => palette::BOOST,
        PowerUpKind::RapidFire => palette::RAPID_FIRE,
    }
}
