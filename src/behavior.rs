//! Species behavior table.
//!
//! Every species maps to one plain function with the same signature. A
//! behavior reads an immutable view of the world (player, pointer, shared AI
//! state, cross-entity dependencies), updates the hunter's own scratch state
//! and returns a [`Decision`]: where to steer and which intents to raise.
//! Behaviors never touch other entities; intents are turned into actions by
//! the AI system and applied after collision detection.
//!
//! ## Species
//! - Chaser: direct pursuit, faster when enraged
//! - Interceptor: predictive lead blended toward the pointer, pincers off the
//!   nearest chaser
//! - Sniper: holds a distance band, retreats when crowded, fires on cooldown
//! - Dasher: stalk, windup, dash, snipe, recover
//! - Phantom: mirrored targeting, flees a boosting player, ambushes up close
//! - Bomber: one countdown drives arrive, wander, kamikaze and detonation
//! - Splitter: wobbling drift toward the player

use crate::components::{AiScratch, DasherPhase};
use crate::error::BehaviorError;
use crate::species::Species;
use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::{Rng, RngCore};

// ============================================================================
// TUNING
// ============================================================================

/// Seconds into a wave after which every hunter becomes enraged.
pub const ENRAGE_AFTER: f32 = 25.0;
pub const ENRAGE_SPEED_SCALE: f32 = 1.35;

pub const INTERCEPT_LEAD_TIME: f32 = 0.6;
/// Weight of the live pointer in the interceptor's aim point.
pub const INTERCEPT_POINTER_BLEND: f32 = 0.3;
pub const PINCER_OFFSET: f32 = 70.0;

pub const SNIPER_MIN_RANGE: f32 = 180.0;
pub const SNIPER_MAX_RANGE: f32 = 300.0;
pub const SNIPER_FIRST_SHOT_DELAY: f32 = 1.5;
pub const SNIPER_FIRE_INTERVAL: f32 = 2.2;
const SNIPER_STRAFE: f32 = 80.0;
/// Chance per second that a sniper reverses its strafe.
const SNIPER_STRAFE_FLIP_RATE: f32 = 0.4;

pub const DASHER_STALK_TIME: f32 = 1.6;
pub const DASHER_WINDUP_TIME: f32 = 0.5;
pub const DASHER_DASH_TIME: f32 = 0.45;
pub const DASHER_SNIPE_TIME: f32 = 0.6;
pub const DASHER_RECOVER_TIME: f32 = 0.8;
pub const DASHER_DASH_SCALE: f32 = 3.2;
const DASHER_OVERSHOOT: f32 = 80.0;

pub const PHANTOM_AMBUSH_RANGE: f32 = 120.0;
const PHANTOM_FLEE_DISTANCE: f32 = 150.0;

pub const BOMBER_LIFETIME: f32 = 9.0;
/// Seconds after spawning spent drifting onto the field.
pub const BOMBER_ARRIVE_TIME: f32 = 0.6;
/// Final seconds of the countdown in which a bomber may charge.
pub const BOMBER_KAMIKAZE_WINDOW: f32 = 2.5;
pub const BOMBER_KAMIKAZE_RANGE: f32 = 220.0;
pub const BOMBER_BLAST_RADIUS: f32 = 70.0;
const BOMBER_CHARGE_SCALE: f32 = 1.8;

const SPLITTER_WOBBLE_RATE: f32 = 3.0;
const SPLITTER_WOBBLE_AMPLITUDE: f32 = 40.0;

// ============================================================================
// SHARED STATE
// ============================================================================

/// State every behavior can read, maintained once per tick.
#[derive(Resource, Debug, Clone, Default)]
pub struct SharedAiState {
    pub enraged: bool,
    pub wave: u32,
    /// Seconds since the current wave started.
    pub wave_elapsed: f32,
    pub viewport: Vec2,
    /// Hunters alive after the previous sweep.
    pub hunters_alive: usize,
}

impl SharedAiState {
    pub fn begin_wave(&mut self, wave: u32) {
        self.wave = wave;
        self.wave_elapsed = 0.0;
        self.enraged = false;
    }

    pub fn center(&self) -> Vec2 {
        self.viewport * 0.5
    }
}

/// Cross-entity references a behavior may need.
#[derive(Resource, Debug, Clone, Default)]
pub struct BehaviorDeps {
    /// Positions of live chasers.
    pub chasers: Vec<Vec2>,
}

impl BehaviorDeps {
    pub fn nearest_chaser(&self, from: Vec2) -> Option<Vec2> {
        self.chasers
            .iter()
            .copied()
            .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
    }
}

/// What a behavior sees of the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    pub pos: Vec2,
    pub velocity: Vec2,
    pub alive: bool,
    pub boosting: bool,
}

/// What a behavior sees of the hunter it drives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfView {
    pub species: Species,
    pub pos: Vec2,
    pub velocity: Vec2,
}

/// Everything a behavior reads.
#[derive(Debug, Clone, Copy)]
pub struct BehaviorInput<'a> {
    pub dt: f32,
    pub me: SelfView,
    pub player: &'a PlayerView,
    /// Live pointer position, if the pointer is on the page.
    pub pointer: Option<Vec2>,
    pub shared: &'a SharedAiState,
    pub deps: &'a BehaviorDeps,
}

// ============================================================================
// DECISIONS
// ============================================================================

/// Side effects a behavior asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Fire one enemy projectile along `direction` (unit vector).
    Fire { direction: Vec2 },
    /// Blow up now.
    Detonate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub target: Vec2,
    pub speed_scale: f32,
    pub intents: Vec<Intent>,
}

impl Decision {
    fn toward(target: Vec2, speed_scale: f32) -> Self {
        Self {
            target,
            speed_scale,
            intents: Vec::new(),
        }
    }

    fn hold(at: Vec2) -> Self {
        Self::toward(at, 0.0)
    }

    fn with(mut self, intent: Intent) -> Self {
        self.intents.push(intent);
        self
    }
}

pub type BehaviorFn =
    fn(&BehaviorInput<'_>, &mut AiScratch, &mut dyn RngCore) -> Result<Decision, BehaviorError>;

/// The behavior table.
pub fn behavior_for(species: Species) -> BehaviorFn {
    match species {
        Species::Chaser => chaser,
        Species::Interceptor => interceptor,
        Species::Sniper => sniper,
        Species::Dasher => dasher,
        Species::Phantom => phantom,
        Species::Bomber => bomber,
        Species::Splitter => splitter,
    }
}

/// Look up and run the behavior for `input.me.species`, rejecting
/// non-finite targets.
pub fn update_ai(
    input: &BehaviorInput<'_>,
    scratch: &mut AiScratch,
    rng: &mut dyn RngCore,
) -> Result<Decision, BehaviorError> {
    let species = input.me.species;
    let decision = behavior_for(species)(input, scratch, rng)?;
    if !decision.target.is_finite() || !decision.speed_scale.is_finite() {
        return Err(BehaviorError::NonFiniteTarget { species });
    }
    Ok(decision)
}

fn mismatch(input: &BehaviorInput<'_>) -> BehaviorError {
    BehaviorError::ScratchMismatch {
        species: input.me.species,
    }
}

fn away_from(from: Vec2, threat: Vec2) -> Vec2 {
    (from - threat).normalize_or(Vec2::X)
}

// ============================================================================
// BEHAVIORS
// ============================================================================

fn chaser(
    input: &BehaviorInput<'_>,
    scratch: &mut AiScratch,
    _rng: &mut dyn RngCore,
) -> Result<Decision, BehaviorError> {
    let AiScratch::Chaser { enraged } = scratch else {
        return Err(mismatch(input));
    };
    *enraged = input.shared.enraged;
    let scale = if *enraged { ENRAGE_SPEED_SCALE } else { 1.0 };
    Ok(Decision::toward(input.player.pos, scale))
}

fn interceptor(
    input: &BehaviorInput<'_>,
    scratch: &mut AiScratch,
    _rng: &mut dyn RngCore,
) -> Result<Decision, BehaviorError> {
    let AiScratch::Interceptor { flanking } = scratch else {
        return Err(mismatch(input));
    };
    let player = input.player;
    let mut aim = player.pos + player.velocity * INTERCEPT_LEAD_TIME;
    if let Some(pointer) = input.pointer {
        aim = aim.lerp(pointer, INTERCEPT_POINTER_BLEND);
    }
    match input.deps.nearest_chaser(input.me.pos) {
        Some(chaser) => {
            // Come in from the side opposite the chaser.
            *flanking = true;
            aim += away_from(player.pos, chaser) * PINCER_OFFSET;
        }
        None => *flanking = false,
    }
    let scale = if input.shared.enraged { ENRAGE_SPEED_SCALE } else { 1.0 };
    Ok(Decision::toward(aim, scale))
}

fn sniper(
    input: &BehaviorInput<'_>,
    scratch: &mut AiScratch,
    rng: &mut dyn RngCore,
) -> Result<Decision, BehaviorError> {
    let AiScratch::Sniper {
        fire_cooldown,
        strafe_sign,
    } = scratch
    else {
        return Err(mismatch(input));
    };
    let me = input.me.pos;
    let player = input.player.pos;
    let distance = me.distance(player);

    let mut decision = if distance < SNIPER_MIN_RANGE {
        Decision::toward(player + away_from(me, player) * SNIPER_MAX_RANGE, 1.2)
    } else if distance > SNIPER_MAX_RANGE {
        Decision::toward(player, 1.0)
    } else {
        let flip_chance = (SNIPER_STRAFE_FLIP_RATE * input.dt).clamp(0.0, 1.0);
        if rng.gen_bool(flip_chance as f64) {
            *strafe_sign = -*strafe_sign;
        }
        let tangent = (player - me).normalize_or_zero().perp();
        Decision::toward(me + tangent * *strafe_sign * SNIPER_STRAFE, 0.6)
    };

    *fire_cooldown -= input.dt;
    if *fire_cooldown <= 0.0 {
        *fire_cooldown = SNIPER_FIRE_INTERVAL;
        if input.player.alive && distance <= SNIPER_MAX_RANGE * 1.3 {
            decision = decision.with(Intent::Fire {
                direction: (player - me).normalize_or(Vec2::X),
            });
        }
    }
    Ok(decision)
}

fn dasher(
    input: &BehaviorInput<'_>,
    scratch: &mut AiScratch,
    _rng: &mut dyn RngCore,
) -> Result<Decision, BehaviorError> {
    let AiScratch::Dasher {
        phase,
        phase_timer,
        dash_target,
    } = scratch
    else {
        return Err(mismatch(input));
    };
    let me = input.me.pos;
    let player = input.player.pos;
    *phase_timer -= input.dt;
    let expired = *phase_timer <= 0.0;

    let decision = match *phase {
        DasherPhase::Stalk => {
            if expired {
                *phase = DasherPhase::Windup;
                *phase_timer = DASHER_WINDUP_TIME;
            }
            Decision::toward(player, 0.7)
        }
        DasherPhase::Windup => {
            if expired {
                let toward = player - me;
                let reach = toward.length() + DASHER_OVERSHOOT;
                *dash_target = Some(me + toward.normalize_or(Vec2::X) * reach);
                *phase = DasherPhase::Dash;
                *phase_timer = DASHER_DASH_TIME;
            }
            Decision::hold(me)
        }
        DasherPhase::Dash => {
            let target = dash_target.unwrap_or(player);
            if expired || me.distance(target) < 8.0 {
                *dash_target = None;
                *phase = DasherPhase::Snipe;
                *phase_timer = DASHER_SNIPE_TIME;
                let shot = Intent::Fire {
                    direction: (player - me).normalize_or(Vec2::X),
                };
                Decision::hold(me).with(shot)
            } else {
                Decision::toward(target, DASHER_DASH_SCALE)
            }
        }
        DasherPhase::Snipe => {
            if expired {
                *phase = DasherPhase::Recover;
                *phase_timer = DASHER_RECOVER_TIME;
            }
            Decision::hold(me)
        }
        DasherPhase::Recover => {
            if expired {
                *phase = DasherPhase::Stalk;
                *phase_timer = DASHER_STALK_TIME;
            }
            Decision::toward(player, 0.4)
        }
    };
    Ok(decision)
}

fn phantom(
    input: &BehaviorInput<'_>,
    scratch: &mut AiScratch,
    _rng: &mut dyn RngCore,
) -> Result<Decision, BehaviorError> {
    let AiScratch::Phantom { afraid } = scratch else {
        return Err(mismatch(input));
    };
    let me = input.me.pos;
    let player = input.player.pos;
    *afraid = input.player.boosting;
    if *afraid {
        return Ok(Decision::toward(
            me + away_from(me, player) * PHANTOM_FLEE_DISTANCE,
            1.3,
        ));
    }
    if me.distance(player) < PHANTOM_AMBUSH_RANGE {
        return Ok(Decision::toward(player, 1.5));
    }
    // Mirror image of the player through the viewport center.
    let mirrored = input.shared.viewport - player;
    Ok(Decision::toward(mirrored, 1.0))
}

/// Phase of a bomber, derived from its countdown alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BomberPhase {
    Arriving,
    Wander,
    Kamikaze,
    Detonate,
}

pub fn bomber_phase(remaining: f32, lifetime: f32) -> BomberPhase {
    if remaining <= 0.0 {
        BomberPhase::Detonate
    } else if remaining <= BOMBER_KAMIKAZE_WINDOW {
        BomberPhase::Kamikaze
    } else if lifetime - remaining < BOMBER_ARRIVE_TIME {
        BomberPhase::Arriving
    } else {
        BomberPhase::Wander
    }
}

fn bomber(
    input: &BehaviorInput<'_>,
    scratch: &mut AiScratch,
    rng: &mut dyn RngCore,
) -> Result<Decision, BehaviorError> {
    let AiScratch::Bomber {
        remaining,
        lifetime,
        wander_target,
    } = scratch
    else {
        return Err(mismatch(input));
    };
    let me = input.me.pos;
    *remaining -= input.dt;

    let mut wander = |wander_target: &mut Option<Vec2>| {
        let reached = wander_target.map_or(true, |t| t.distance(me) < 20.0);
        if reached {
            let viewport = input.shared.viewport.max(Vec2::ONE);
            *wander_target = Some(Vec2::new(
                rng.gen_range(0.0..viewport.x),
                rng.gen_range(0.0..viewport.y),
            ));
        }
        Decision::toward(wander_target.unwrap_or(me), 1.0)
    };

    let decision = match bomber_phase(*remaining, *lifetime) {
        BomberPhase::Arriving => Decision::toward(input.shared.center(), 0.6),
        BomberPhase::Wander => wander(wander_target),
        BomberPhase::Kamikaze => {
            let player = input.player;
            if player.alive && me.distance(player.pos) < BOMBER_KAMIKAZE_RANGE {
                Decision::toward(player.pos, BOMBER_CHARGE_SCALE)
            } else {
                wander(wander_target)
            }
        }
        BomberPhase::Detonate => Decision::hold(me).with(Intent::Detonate),
    };
    Ok(decision)
}

fn splitter(
    input: &BehaviorInput<'_>,
    scratch: &mut AiScratch,
    _rng: &mut dyn RngCore,
) -> Result<Decision, BehaviorError> {
    let AiScratch::Splitter { wobble } = scratch else {
        return Err(mismatch(input));
    };
    *wobble = (*wobble + input.dt * SPLITTER_WOBBLE_RATE) % std::f32::consts::TAU;
    let player = input.player.pos;
    let side = (player - input.me.pos).normalize_or_zero().perp();
    Ok(Decision::toward(
        player + side * wobble.sin() * SPLITTER_WOBBLE_AMPLITUDE,
        1.0,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        player: PlayerView,
        shared: SharedAiState,
        deps: BehaviorDeps,
    }

    impl Fixture {
        fn new(player_pos: Vec2) -> Self {
            Self {
                player: PlayerView {
                    pos: player_pos,
                    velocity: Vec2::ZERO,
                    alive: true,
                    boosting: false,
                },
                shared: SharedAiState {
                    viewport: Vec2::new(800.0, 600.0),
                    ..Default::default()
                },
                deps: BehaviorDeps::default(),
            }
        }

        fn input(&self, species: Species, at: Vec2, dt: f32) -> BehaviorInput<'_> {
            BehaviorInput {
                dt,
                me: SelfView {
                    species,
                    pos: at,
                    velocity: Vec2::ZERO,
                },
                player: &self.player,
                pointer: None,
                shared: &self.shared,
                deps: &self.deps,
            }
        }
    }

    #[test]
    fn test_chaser_targets_player_and_speeds_up_when_enraged() {
        let mut fixture = Fixture::new(Vec2::new(100.0, 100.0));
        let mut rng = StdRng::seed_from_u64(0);
        let mut scratch = AiScratch::initial(Species::Chaser);
        let calm = update_ai(&fixture.input(Species::Chaser, Vec2::ZERO, 0.016), &mut scratch, &mut rng).unwrap();
        assert_eq!(calm.target, Vec2::new(100.0, 100.0));
        assert_eq!(calm.speed_scale, 1.0);

        fixture.shared.enraged = true;
        let angry = update_ai(&fixture.input(Species::Chaser, Vec2::ZERO, 0.016), &mut scratch, &mut rng).unwrap();
        assert!(angry.speed_scale > 1.0);
        assert_eq!(scratch, AiScratch::Chaser { enraged: true });
    }

    #[test]
    fn test_mismatched_scratch_is_an_error() {
        let fixture = Fixture::new(Vec2::ZERO);
        let mut rng = StdRng::seed_from_u64(0);
        let mut scratch = AiScratch::initial(Species::Chaser);
        let result = update_ai(&fixture.input(Species::Sniper, Vec2::ZERO, 0.016), &mut scratch, &mut rng);
        assert_eq!(
            result,
            Err(BehaviorError::ScratchMismatch {
                species: Species::Sniper
            })
        );
    }

    #[test]
    fn test_non_finite_target_is_rejected() {
        let fixture = Fixture::new(Vec2::new(f32::NAN, 0.0));
        let mut rng = StdRng::seed_from_u64(0);
        let mut scratch = AiScratch::initial(Species::Chaser);
        let result = update_ai(&fixture.input(Species::Chaser, Vec2::ZERO, 0.016), &mut scratch, &mut rng);
        assert!(matches!(result, Err(BehaviorError::NonFiniteTarget { .. })));
    }

    #[test]
    fn test_interceptor_pincers_off_nearest_chaser() {
        let mut fixture = Fixture::new(Vec2::new(400.0, 300.0));
        fixture.deps.chasers = vec![Vec2::new(300.0, 300.0), Vec2::new(900.0, 900.0)];
        let mut rng = StdRng::seed_from_u64(0);
        let mut scratch = AiScratch::initial(Species::Interceptor);
        let decision = update_ai(
            &fixture.input(Species::Interceptor, Vec2::new(350.0, 350.0), 0.016),
            &mut scratch,
            &mut rng,
        )
        .unwrap();
        // Chaser sits to the left of the player, so the interceptor aims right.
        assert!(decision.target.x > 400.0);
        assert_eq!(scratch, AiScratch::Interceptor { flanking: true });
    }

    #[test]
    fn test_sniper_retreats_when_close_and_fires_on_cooldown() {
        let fixture = Fixture::new(Vec2::new(400.0, 300.0));
        let mut rng = StdRng::seed_from_u64(0);
        let mut scratch = AiScratch::Sniper {
            fire_cooldown: 0.01,
            strafe_sign: 1.0,
        };
        let me = Vec2::new(350.0, 300.0);
        let decision = update_ai(&fixture.input(Species::Sniper, me, 0.02), &mut scratch, &mut rng).unwrap();
        assert!(decision.target.x < me.x, "should back away from the player");
        assert_eq!(decision.intents.len(), 1);
        let AiScratch::Sniper { fire_cooldown, .. } = scratch else {
            panic!("scratch changed variant");
        };
        assert_relative_eq!(fire_cooldown, SNIPER_FIRE_INTERVAL);
    }

    #[test]
    fn test_dasher_cycles_through_every_phase() {
        let fixture = Fixture::new(Vec2::new(400.0, 300.0));
        let mut rng = StdRng::seed_from_u64(0);
        let mut scratch = AiScratch::initial(Species::Dasher);
        let mut seen = Vec::new();
        let mut fired = false;
        for _ in 0..600 {
            let decision =
                update_ai(&fixture.input(Species::Dasher, Vec2::new(100.0, 100.0), 0.02), &mut scratch, &mut rng)
                    .unwrap();
            fired |= !decision.intents.is_empty();
            if let AiScratch::Dasher { phase, .. } = scratch {
                if seen.last() != Some(&phase) {
                    seen.push(phase);
                }
            }
        }
        assert!(fired);
        assert_eq!(
            &seen[..5],
            &[
                DasherPhase::Stalk,
                DasherPhase::Windup,
                DasherPhase::Dash,
                DasherPhase::Snipe,
                DasherPhase::Recover
            ]
        );
    }

    #[test]
    fn test_phantom_mirrors_and_flees_boost() {
        let mut fixture = Fixture::new(Vec2::new(100.0, 100.0));
        let mut rng = StdRng::seed_from_u64(0);
        let mut scratch = AiScratch::initial(Species::Phantom);
        let me = Vec2::new(600.0, 500.0);
        let decision = update_ai(&fixture.input(Species::Phantom, me, 0.016), &mut scratch, &mut rng).unwrap();
        assert_eq!(decision.target, Vec2::new(700.0, 500.0));

        fixture.player.boosting = true;
        let fleeing = update_ai(&fixture.input(Species::Phantom, me, 0.016), &mut scratch, &mut rng).unwrap();
        assert!(fleeing.target.distance(fixture.player.pos) > me.distance(fixture.player.pos));
    }

    #[test]
    fn test_bomber_phase_follows_single_countdown() {
        let lifetime = BOMBER_LIFETIME;
        assert_eq!(bomber_phase(lifetime, lifetime), BomberPhase::Arriving);
        assert_eq!(bomber_phase(lifetime - 1.0, lifetime), BomberPhase::Wander);
        assert_eq!(bomber_phase(BOMBER_KAMIKAZE_WINDOW, lifetime), BomberPhase::Kamikaze);
        assert_eq!(bomber_phase(0.0, lifetime), BomberPhase::Detonate);
    }

    #[test]
    fn test_bomber_detonates_when_countdown_runs_out() {
        let fixture = Fixture::new(Vec2::new(400.0, 300.0));
        let mut rng = StdRng::seed_from_u64(3);
        let mut scratch = AiScratch::initial(Species::Bomber);
        let mut detonated_at = None;
        for step in 0..1000 {
            let decision =
                update_ai(&fixture.input(Species::Bomber, Vec2::new(10.0, 10.0), 0.05), &mut scratch, &mut rng)
                    .unwrap();
            if decision.intents.contains(&Intent::Detonate) {
                detonated_at = Some(step);
                break;
            }
        }
        let step = detonated_at.expect("bomber never detonated");
        assert_relative_eq!((step + 1) as f32 * 0.05, BOMBER_LIFETIME, epsilon = 0.06);
    }
}
