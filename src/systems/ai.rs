//! AI systems: shared state, cross-entity dependencies and the per-hunter
//! behavior dispatch.
//!
//! A failing behavior only affects its own hunter: the error is logged and
//! the hunter holds still for the tick.

use crate::behavior::{
    update_ai, BehaviorDeps, BehaviorInput, Intent, PlayerView, SelfView, SharedAiState, ENRAGE_AFTER,
};
use crate::components::*;
use crate::frame::SimClock;
use crate::player::{Player, Pointer};
use crate::species::Species;
use crate::store::GameRng;
use crate::systems::census::EntityCounts;
use crate::systems::movement::{Arena, DeltaTime};
use crate::systems::resolve::{Action, PendingActions};
use bevy_ecs::prelude::*;

// ============================================================================
// SHARED STATE SYSTEM
// ============================================================================

/// Advances wave time and decides whether hunters are enraged.
///
/// ## Data Access
/// - Reads: DeltaTime, Arena, EntityCounts
/// - Writes: SharedAiState
pub fn shared_ai_system(
    dt: Res<DeltaTime>,
    arena: Res<Arena>,
    counts: Res<EntityCounts>,
    mut shared: ResMut<SharedAiState>,
) {
    shared.wave_elapsed += dt.0;
    shared.viewport = arena.size;
    shared.hunters_alive = counts.hunters;
    shared.enraged = shared.wave > 0 && shared.wave_elapsed >= ENRAGE_AFTER;
}

// ============================================================================
// DEPENDENCY SYSTEM
// ============================================================================

/// Collects the cross-entity references behaviors read.
pub fn behavior_deps_system(
    mut deps: ResMut<BehaviorDeps>,
    query: Query<(&Hunter, &Position, &Body)>,
) {
    deps.chasers.clear();
    for (hunter, pos, body) in query.iter() {
        if hunter.species == Species::Chaser && !body.is_removed() {
            deps.chasers.push(pos.0);
        }
    }
}

// ============================================================================
// BEHAVIOR SYSTEM
// ============================================================================

/// Runs every live hunter's behavior and queues the actions it asks for.
///
/// ## Data Access
/// - Reads: DeltaTime, SimClock, Player, Pointer, SharedAiState, BehaviorDeps
/// - Writes: GameRng, PendingActions, AiScratch, Steering
#[allow(clippy::too_many_arguments)]
pub fn hunter_ai_system(
    dt: Res<DeltaTime>,
    clock: Res<SimClock>,
    player: Res<Player>,
    pointer: Res<Pointer>,
    shared: Res<SharedAiState>,
    deps: Res<BehaviorDeps>,
    mut rng: ResMut<GameRng>,
    mut actions: ResMut<PendingActions>,
    mut query: Query<(
        Entity,
        &Hunter,
        &Position,
        &Velocity,
        &Body,
        &mut AiScratch,
        &mut Steering,
    )>,
) {
    let view = PlayerView {
        pos: player.pos,
        velocity: player.velocity,
        alive: player.is_alive(),
        boosting: player.power_up_active(PowerUpKind::Boost, clock.elapsed),
    };
    let pointer_pos = (pointer.present && pointer.hit_testing).then_some(pointer.pos);

    for (entity, hunter, pos, vel, body, mut scratch, mut steering) in query.iter_mut() {
        if body.is_removed() {
            continue;
        }
        let input = BehaviorInput {
            dt: dt.0,
            me: SelfView {
                species: hunter.species,
                pos: pos.0,
                velocity: vel.0,
            },
            player: &view,
            pointer: pointer_pos,
            shared: &shared,
            deps: &deps,
        };

        match update_ai(&input, &mut scratch, &mut rng.0) {
            Ok(decision) => {
                steering.target = decision.target;
                steering.speed_scale = decision.speed_scale;
                for intent in decision.intents {
                    actions.push(match intent {
                        Intent::Fire { direction } => Action::Fire {
                            owner: Owner::Enemy,
                            from: pos.0,
                            direction,
                        },
                        Intent::Detonate => Action::Kill {
                            hunter: entity,
                            by_player: false,
                        },
                    });
                }
            }
            Err(err) => {
                log::warn!("hunter {:?} holds this tick: {}", entity, err);
                steering.target = pos.0;
                steering.speed_scale = 0.0;
            }
        }
    }
}
