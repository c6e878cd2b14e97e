//! Collision detection system.
//!
//! Snapshots every live projectile and pickup and hands them, with the hunter
//! grid rebuilt earlier in the tick, to the pure resolver in
//! [`crate::collision`]. The resulting events are applied by the resolve
//! system later in the same tick.

use crate::collision::{self, BodyKind, BodySnapshot, CollisionEvent, PlayerProbe};
use crate::components::*;
use crate::frame::SimClock;
use crate::player::Player;
use crate::spatial::SpatialGrid;
use bevy_ecs::prelude::*;

/// Collision events detected this tick, in resolver order.
#[derive(Resource, Debug, Default)]
pub struct CollisionEvents(pub Vec<CollisionEvent>);

/// ## Data Access
/// - Reads: Player, SimClock, SpatialGrid, Projectile, Pickup, Position, Body
/// - Writes: CollisionEvents
pub fn collision_detect_system(
    player: Res<Player>,
    clock: Res<SimClock>,
    grid: Res<SpatialGrid>,
    mut events: ResMut<CollisionEvents>,
    projectiles: Query<(Entity, &Projectile, &Position, &Body)>,
    pickups: Query<(Entity, &Pickup, &Position, &Body)>,
) {
    let mut bodies = Vec::new();
    let mut snapshot = |entity: Entity, kind: BodyKind, pos: &Position, body: &Body| {
        if !body.is_removed() {
            bodies.push(BodySnapshot {
                entity,
                kind,
                pos: pos.0,
                radius: body.radius(),
            });
        }
    };
    for (entity, projectile, pos, body) in projectiles.iter() {
        snapshot(entity, BodyKind::Projectile(projectile.owner), pos, body);
    }
    for (entity, pickup, pos, body) in pickups.iter() {
        snapshot(entity, BodyKind::Pickup(pickup.kind), pos, body);
    }

    let probe = PlayerProbe {
        pos: player.pos,
        radius: player.radius,
        present: player.is_alive(),
        boosting: player.power_up_active(PowerUpKind::Boost, clock.elapsed),
    };
    events.0 = collision::check(&probe, &grid, &bodies);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::spatial_grid_update_system;
    use crate::species::Species;
    use glam::Vec2;

    #[test]
    fn test_removed_bodies_are_not_snapshotted() {
        let mut world = World::new();
        world.insert_resource(Player::new(3, 8.0, Vec2::ZERO));
        world.insert_resource(SimClock::default());
        world.insert_resource(CollisionEvents::default());
        world.insert_resource(SpatialGrid::default());

        let touching = world.spawn(HunterBundle::new(Species::Chaser, Vec2::new(5.0, 0.0), 0)).id();
        let gone = world.spawn(HunterBundle::new(Species::Chaser, Vec2::new(-5.0, 0.0), 0)).id();
        world.get_mut::<Body>(gone).unwrap().mark_removed();

        let mut schedule = Schedule::default();
        schedule.add_systems((spatial_grid_update_system, collision_detect_system).chain());
        schedule.run(&mut world);

        assert_eq!(
            world.resource::<CollisionEvents>().0,
            vec![CollisionEvent::PlayerContact { hunter: touching }]
        );
    }
}
