//! End-of-tick sweep and entity census.
//!
//! The sweep is the only place store-owned entities are despawned. It runs
//! once per tick, after every system that can flag a body, so anything
//! flagged during the tick is removed exactly once. The census then records
//! post-sweep counts for the HUD and the wave logic.

use crate::components::*;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Live entity counts, as of the last sweep.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub hunters: usize,
    pub projectiles: usize,
    pub pickups: usize,
}

impl EntityCounts {
    pub fn total(&self) -> usize {
        self.hunters + self.projectiles + self.pickups
    }
}

/// Result of the most recent sweep.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Bodies alive going into the sweep.
    pub before: usize,
    pub removed: usize,
}

/// Despawns every body flagged for removal.
pub fn sweep_system(world: &mut World) {
    let mut query = world.query::<(Entity, &Body)>();
    let mut before = 0;
    let mut flagged = Vec::new();
    for (entity, body) in query.iter(world) {
        before += 1;
        if body.is_removed() {
            flagged.push(entity);
        }
    }
    for entity in &flagged {
        world.despawn(*entity);
    }
    *world.resource_mut::<SweepReport>() = SweepReport {
        before,
        removed: flagged.len(),
    };
}

/// ## Data Access
/// - Reads: Hunter, Projectile, Pickup
/// - Writes: EntityCounts
pub fn census_system(
    mut counts: ResMut<EntityCounts>,
    hunters: Query<(), With<Hunter>>,
    projectiles: Query<(), With<Projectile>>,
    pickups: Query<(), With<Pickup>>,
) {
    *counts = EntityCounts {
        hunters: hunters.iter().count(),
        projectiles: projectiles.iter().count(),
        pickups: pickups.iter().count(),
    };
}
