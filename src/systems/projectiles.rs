//! Projectile and pickup lifetimes.

use crate::components::*;
use crate::systems::movement::{Arena, DeltaTime};
use bevy_ecs::prelude::*;

/// Moves projectiles, bounces them off the play area and expires them.
///
/// A projectile that hits a wall with no bounces left is removed.
///
/// ## Data Access
/// - Reads: DeltaTime, Arena
/// - Writes: Projectile, Body, Position, Velocity
pub fn projectile_motion_system(
    dt: Res<DeltaTime>,
    arena: Res<Arena>,
    mut query: Query<(&mut Projectile, &mut Body, &mut Position, &mut Velocity)>,
) {
    let delta = dt.0;
    for (mut projectile, mut body, mut pos, mut vel) in query.iter_mut() {
        if body.is_removed() {
            continue;
        }
        projectile.ttl -= delta;
        if projectile.ttl <= 0.0 {
            body.mark_removed();
            continue;
        }
        pos.0 += vel.0 * delta;
        if arena.reflect(&mut pos.0, &mut vel.0, body.radius()) {
            if projectile.bounces_left == 0 {
                body.mark_removed();
            } else {
                projectile.bounces_left -= 1;
            }
        }
    }
}

/// Counts pickups down and removes the ones that timed out.
pub fn pickup_lifespan_system(dt: Res<DeltaTime>, mut query: Query<(&mut Pickup, &mut Body)>) {
    for (mut pickup, mut body) in query.iter_mut() {
        if body.is_removed() {
            continue;
        }
        pickup.lifespan -= dt.0;
        if pickup.lifespan <= 0.0 {
            body.mark_removed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Rect;
    use glam::Vec2;

    fn world_with_arena(arena: Arena) -> World {
        let mut world = World::new();
        world.insert_resource(DeltaTime(0.1));
        world.insert_resource(arena);
        world
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems((projectile_motion_system, pickup_lifespan_system));
        schedule.run(world);
    }

    #[test]
    fn test_player_shot_bounces_until_exhausted() {
        let mut world = world_with_arena(Arena::new(Vec2::new(100.0, 100.0)));
        let shot = world
            .spawn(ProjectileBundle::new(
                Owner::Player,
                Vec2::new(95.0, 50.0),
                Vec2::new(100.0, 0.0),
                10.0,
                1,
            ))
            .id();

        run(&mut world);
        assert_eq!(world.get::<Projectile>(shot).unwrap().bounces_left, 0);
        assert!(world.get::<Velocity>(shot).unwrap().0.x < 0.0);
        assert!(!world.get::<Body>(shot).unwrap().is_removed());

        // Fly across and hit the far wall.
        for _ in 0..12 {
            run(&mut world);
        }
        assert!(world.get::<Body>(shot).unwrap().is_removed());
    }

    #[test]
    fn test_enemy_shot_dies_on_boundary_rect() {
        let mut arena = Arena::new(Vec2::new(1000.0, 1000.0));
        arena.boundaries.push(Rect::new(200.0, 0.0, 50.0, 1000.0));
        let mut world = world_with_arena(arena);
        let shot = world
            .spawn(ProjectileBundle::new(
                Owner::Enemy,
                Vec2::new(180.0, 500.0),
                Vec2::new(200.0, 0.0),
                10.0,
                0,
            ))
            .id();
        run(&mut world);
        assert!(world.get::<Body>(shot).unwrap().is_removed());
    }

    #[test]
    fn test_ttl_and_lifespan_expire() {
        let mut world = world_with_arena(Arena::new(Vec2::new(1000.0, 1000.0)));
        let shot = world
            .spawn(ProjectileBundle::new(
                Owner::Player,
                Vec2::new(500.0, 500.0),
                Vec2::ZERO,
                0.15,
                2,
            ))
            .id();
        let coin = world
            .spawn(PickupBundle::new(PickupKind::Coin { value: 5 }, Vec2::new(10.0, 10.0), 0.05))
            .id();
        run(&mut world);
        assert!(!world.get::<Body>(shot).unwrap().is_removed());
        assert!(world.get::<Body>(coin).unwrap().is_removed());
        run(&mut world);
        assert!(world.get::<Body>(shot).unwrap().is_removed());
    }
}
