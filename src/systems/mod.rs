//! ECS systems for the cursor arcade simulation.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## Tick Order
//!
//! One tick is a single chained pass; every system sees the effects of the
//! ones before it:
//!
//! **AI**
//! - `shared_ai_system` - wave clock, enrage, viewport
//! - `behavior_deps_system` - cross-entity references (chasers)
//! - `hunter_ai_system` - species behavior table, writes Steering
//!
//! **Motion**
//! - `hunter_movement_system` - steering and reflection
//! - `spatial_grid_update_system` - rebuilds the hunter grid
//! - `player_motion_system` / `player_timers_system` / `player_fire_system`
//! - `projectile_motion_system` / `pickup_lifespan_system`
//!
//! **Resolution**
//! - `collision_detect_system` - pure resolver over snapshots
//! - `resolve_system` - applies events, then queued actions (exclusive)
//! - `sweep_system` - the single removal pass (exclusive)
//! - `census_system` - post-sweep counts

pub mod ai;
pub mod census;
pub mod detection;
pub mod movement;
pub mod player;
pub mod projectiles;
pub mod resolve;

pub use ai::*;
pub use census::*;
pub use detection::*;
pub use movement::*;
pub use player::*;
pub use projectiles::*;
pub use resolve::*;

use crate::spatial::spatial_grid_update_system;
use bevy_ecs::prelude::*;

/// Build the per-tick schedule.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            shared_ai_system,
            behavior_deps_system,
            hunter_ai_system,
            hunter_movement_system,
            spatial_grid_update_system,
            player_motion_system,
            player_timers_system,
            player_fire_system,
            projectile_motion_system,
            pickup_lifespan_system,
            collision_detect_system,
            resolve_system,
            sweep_system,
            census_system,
        )
            .chain(),
    );
    schedule
}
