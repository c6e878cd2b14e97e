//! Movement system - steers hunters toward their targets and keeps bodies
//! inside the play area.

use crate::components::*;
use crate::host::Rect;
use bevy_ecs::prelude::*;
use glam::Vec2;

/// Resource containing the delta time for the current tick.
#[derive(Resource, Default)]
pub struct DeltaTime(pub f32);

/// Play area for the current tick: the canvas size plus any boundary
/// rectangles re-queried from the page.
#[derive(Resource, Debug, Clone, Default)]
pub struct Arena {
    pub size: Vec2,
    pub boundaries: Vec<Rect>,
}

impl Arena {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            boundaries: Vec::new(),
        }
    }

    /// Reflect a circle off the viewport edges and every boundary rect.
    /// Returns `true` if anything was hit.
    pub fn reflect(&self, pos: &mut Vec2, vel: &mut Vec2, radius: f32) -> bool {
        let mut bounced = reflect_in_viewport(pos, vel, radius, self.size);
        for rect in &self.boundaries {
            bounced |= reflect_off_rect(pos, vel, radius, rect);
        }
        bounced
    }
}

/// How quickly hunters turn toward their desired velocity (1/s).
pub const STEERING_RESPONSE: f32 = 6.0;

/// Keep a circle inside `[0, size]`, flipping the velocity component that
/// points out.
pub fn reflect_in_viewport(pos: &mut Vec2, vel: &mut Vec2, radius: f32, size: Vec2) -> bool {
    if size.x <= 0.0 || size.y <= 0.0 {
        return false;
    }
    let mut bounced = false;
    if pos.x < radius {
        pos.x = radius;
        vel.x = vel.x.abs();
        bounced = true;
    } else if pos.x > size.x - radius {
        pos.x = size.x - radius;
        vel.x = -vel.x.abs();
        bounced = true;
    }
    if pos.y < radius {
        pos.y = radius;
        vel.y = vel.y.abs();
        bounced = true;
    } else if pos.y > size.y - radius {
        pos.y = size.y - radius;
        vel.y = -vel.y.abs();
        bounced = true;
    }
    bounced
}

/// Push a circle out of `rect` and mirror its velocity about the contact
/// normal.
pub fn reflect_off_rect(pos: &mut Vec2, vel: &mut Vec2, radius: f32, rect: &Rect) -> bool {
    let closest = rect.closest_point(*pos);
    let offset = *pos - closest;
    let distance = offset.length();
    if distance >= radius {
        return false;
    }

    let normal = if distance > f32::EPSILON {
        let normal = offset / distance;
        *pos = closest + normal * radius;
        normal
    } else {
        // Center is inside: leave through the nearest edge.
        let min = rect.min();
        let max = rect.max();
        let exits = [
            (pos.x - min.x, Vec2::NEG_X),
            (max.x - pos.x, Vec2::X),
            (pos.y - min.y, Vec2::NEG_Y),
            (max.y - pos.y, Vec2::Y),
        ];
        let (_, normal) = exits
            .into_iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .unwrap_or((0.0, Vec2::NEG_Y));
        if normal.x < 0.0 {
            pos.x = min.x - radius;
        } else if normal.x > 0.0 {
            pos.x = max.x + radius;
        } else if normal.y < 0.0 {
            pos.y = min.y - radius;
        } else {
            pos.y = max.y + radius;
        }
        normal
    };

    let along = vel.dot(normal);
    if along < 0.0 {
        *vel -= 2.0 * along * normal;
    }
    true
}

/// System that turns each hunter's steering target into motion.
///
/// ## Data Access
/// - Reads: DeltaTime, Arena, Hunter, Steering, Body
/// - Writes: Position, Velocity
pub fn hunter_movement_system(
    dt: Res<DeltaTime>,
    arena: Res<Arena>,
    mut query: Query<(&Hunter, &Steering, &Body, &mut Position, &mut Velocity)>,
) {
    let delta = dt.0;
    if delta <= 0.0 {
        return;
    }
    let blend = 1.0 - (-STEERING_RESPONSE * delta).exp();

    for (hunter, steering, body, mut pos, mut vel) in query.iter_mut() {
        if body.is_removed() {
            continue;
        }
        let speed = hunter.species.stats().speed * steering.speed_scale;
        let to_target = steering.target - pos.0;
        let desired = if to_target.length() < 1.0 {
            Vec2::ZERO
        } else {
            to_target.normalize() * speed
        };
        vel.0 = vel.0.lerp(desired, blend);
        pos.0 += vel.0 * delta;
        arena.reflect(&mut pos.0, &mut vel.0, body.radius());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Species;
    use approx::assert_relative_eq;

    #[test]
    fn test_hunter_moves_toward_target() {
        let mut world = World::new();
        world.insert_resource(DeltaTime(0.1));
        world.insert_resource(Arena::new(Vec2::new(1000.0, 1000.0)));

        let mut bundle = HunterBundle::new(Species::Chaser, Vec2::new(100.0, 100.0), 0);
        bundle.steering.target = Vec2::new(500.0, 100.0);
        let entity = world.spawn(bundle).id();

        let mut schedule = Schedule::default();
        schedule.add_systems(hunter_movement_system);
        for _ in 0..5 {
            schedule.run(&mut world);
        }

        let pos = world.get::<Position>(entity).unwrap();
        assert!(pos.0.x > 100.0);
        assert_relative_eq!(pos.0.y, 100.0);
    }

    #[test]
    fn test_viewport_reflection() {
        let mut pos = Vec2::new(-3.0, 50.0);
        let mut vel = Vec2::new(-10.0, 5.0);
        assert!(reflect_in_viewport(&mut pos, &mut vel, 4.0, Vec2::new(100.0, 100.0)));
        assert_eq!(pos, Vec2::new(4.0, 50.0));
        assert_eq!(vel, Vec2::new(10.0, 5.0));

        let mut inside = Vec2::new(50.0, 50.0);
        assert!(!reflect_in_viewport(&mut inside, &mut vel, 4.0, Vec2::new(100.0, 100.0)));
    }

    #[test]
    fn test_rect_reflection_from_above() {
        let rect = Rect::new(0.0, 100.0, 200.0, 20.0);
        let mut pos = Vec2::new(50.0, 97.0);
        let mut vel = Vec2::new(30.0, 40.0);
        assert!(reflect_off_rect(&mut pos, &mut vel, 5.0, &rect));
        assert_relative_eq!(pos.y, 95.0);
        assert_relative_eq!(vel.x, 30.0);
        assert_relative_eq!(vel.y, -40.0);
    }

    #[test]
    fn test_center_inside_rect_is_pushed_out_nearest_edge() {
        let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut pos = Vec2::new(95.0, 50.0);
        let mut vel = Vec2::new(-20.0, 0.0);
        assert!(reflect_off_rect(&mut pos, &mut vel, 3.0, &rect));
        assert_relative_eq!(pos.x, 103.0);
        assert_relative_eq!(vel.x, 20.0);
    }
}
