//! Public API for the game.
//!
//! [`CursorGame`] is the one object a page embeds. It owns the entity store,
//! the docking machine, the wave scheduler and the frame clock, and talks to
//! the page only through a [`PageHost`].
//!
//! ## Frame order
//!
//! `tick(timestamp)` computes a clamped delta and then, in order:
//! boundary rects are re-queried, docking is stepped, due deferred tasks
//! run, the store update runs (AI, motion, collisions, actions, sweep),
//! queued sounds are played, wave completion is checked, and one draw pass
//! is made. The next frame is requested unless the game was stopped.
//!
//! ## Failure model
//!
//! Nothing here returns an error to the page. A missing canvas leaves the
//! game inactive and every call a no-op; audio failures are logged and
//! dropped; an invalid config falls back to the mode's defaults.

use crate::components::{PickupKind, PowerUpKind};
use crate::config::{GameConfig, GameMode};
use crate::docking::{DockingEffect, DockingPhase, DockingState, BODY_DOCKED_CLASS, LOCK_CLASS};
use crate::frame::FrameClock;
use crate::host::{sound, ElementId, FrameHandle, PageHost};
use crate::hud;
use crate::player::Player;
use crate::store::{EntityStore, Spawn};
use crate::surface::{palette, Surface};
use crate::systems::Arena;
use crate::waves::{Deferred, SpawnScheduler, WaveTable};
use crate::world::Snapshot;
use glam::Vec2;
use rand::Rng;

/// The cursor-replacement arcade game bound to one page surface.
pub struct CursorGame<H: PageHost> {
    host: H,
    surface_id: String,
    core: Option<GameCore>,
}

struct GameCore {
    config: GameConfig,
    store: EntityStore,
    docking: DockingState,
    scheduler: SpawnScheduler,
    clock: FrameClock,
    waves: WaveTable,
    /// Current wave, 0 before the first one starts.
    wave: u32,
    running: bool,
    frame: Option<FrameHandle>,
    boundary_selector: Option<String>,
    viewport: Vec2,
}

impl<H: PageHost> CursorGame<H> {
    /// Bind a game to the canvas `surface_id`. If the host has no such
    /// canvas the game is inactive.
    pub fn new(surface_id: &str, mut host: H, config: GameConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::warn!("invalid game config ({}), using {:?} defaults", e, config.mode);
                GameConfig {
                    seed: config.seed,
                    ..GameConfig::for_mode(config.mode)
                }
            }
        };

        let core = match host.canvas(surface_id).map(|canvas| canvas.size()) {
            Some(viewport) => {
                let mut store = EntityStore::new(&config);
                store.player_mut().snap_to(viewport * 0.5);
                log::info!(
                    "cursor game ready on '{}' ({:?}, {}x{})",
                    surface_id,
                    config.mode,
                    viewport.x,
                    viewport.y
                );
                Some(GameCore {
                    store,
                    docking: DockingState::new(
                        config.docking_transition,
                        config.docking_snap_distance,
                    ),
                    scheduler: SpawnScheduler::new(),
                    clock: FrameClock::new(config.max_dt),
                    waves: config.wave_table(),
                    wave: 0,
                    running: false,
                    frame: None,
                    boundary_selector: None,
                    viewport,
                    config,
                })
            }
            None => {
                log::warn!("no surface '{}', cursor game inactive", surface_id);
                None
            }
        };

        Self {
            host,
            surface_id: surface_id.to_string(),
            core,
        }
    }

    pub fn is_active(&self) -> bool {
        self.core.is_some()
    }

    pub fn is_running(&self) -> bool {
        self.core.as_ref().is_some_and(|core| core.running)
    }

    /// Start the frame pump. Idempotent. A wave whose spawns were dropped by
    /// [`stop`](Self::stop) is scheduled again.
    pub fn start(&mut self) {
        let Some(core) = self.core.as_mut() else {
            return;
        };
        if core.running {
            return;
        }
        core.running = true;
        core.clock.reset();
        if core.wave > 0
            && core.scheduler.is_idle()
            && core.store.counts().hunters == 0
            && !core.store.player().game_over
        {
            core.scheduler
                .schedule(core.config.first_wave_delay, Deferred::StartWave(core.wave));
            log::debug!("wave {} rescheduled on start", core.wave);
        }
        core.frame = Some(self.host.request_frame());
        log::info!("cursor game started");
    }

    /// Stop the frame pump and drop every pending deferred task.
    pub fn stop(&mut self) {
        let Some(core) = self.core.as_mut() else {
            return;
        };
        core.running = false;
        if let Some(handle) = core.frame.take() {
            self.host.cancel_frame(handle);
        }
        let dropped = core.scheduler.flush();
        core.clock.reset();
        log::info!("cursor game stopped, {} pending tasks dropped", dropped);
    }

    /// Hard reset starts over from wave 1. Soft reset clears the field,
    /// refills lives and restarts the current wave, keeping the score and
    /// leaving docking alone.
    pub fn reset(&mut self, soft: bool) {
        let Some(core) = self.core.as_mut() else {
            return;
        };
        let dropped = core.scheduler.flush();
        if soft {
            core.store.clear_field();
            core.store.player_mut().refill();
            if core.wave > 0 {
                core.scheduler
                    .schedule(core.config.first_wave_delay, Deferred::StartWave(core.wave));
            }
        } else {
            let effects = core.docking.fast_forward_exit();
            apply_docking_effects(&mut self.host, &mut core.store, &effects);
            core.store.reset();
            core.store.player_mut().snap_to(core.viewport * 0.5);
            core.wave = 0;
            core.clock.reset();
        }
        log::info!(
            "cursor game reset (soft: {}), {} pending tasks dropped",
            soft,
            dropped
        );
    }

    /// Frame callback. `timestamp_ms` is the host's monotonic frame time.
    pub fn tick(&mut self, timestamp_ms: f64) {
        let dt = match self.core.as_mut() {
            Some(core) if core.running => {
                core.frame = None;
                core.clock.delta(timestamp_ms)
            }
            _ => return,
        };
        self.advance(dt);
        self.draw();
        if let Some(core) = self.core.as_mut() {
            if core.running {
                core.frame = Some(self.host.request_frame());
            }
        }
    }

    /// Run one update of `dt` seconds without drawing. Does nothing while
    /// stopped.
    pub fn advance(&mut self, dt: f32) {
        let Some(core) = self.core.as_mut() else {
            return;
        };
        if !core.running {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if let Some(size) = self.host.canvas(&self.surface_id).map(|canvas| canvas.size()) {
            core.viewport = size;
        }
        let mut arena = Arena::new(core.viewport);
        if let Some(selector) = &core.boundary_selector {
            arena.boundaries = self.host.query_rects(selector);
        }

        // Docking
        let element = core.docking.target().and_then(|el| self.host.element_rect(el));
        let effects = core.docking.step(dt, core.store.player().pos, element);
        apply_docking_effects(&mut self.host, &mut core.store, &effects);
        if core.docking.pauses_simulation() {
            if let Some(rect) = element {
                core.store.player_mut().snap_to(rect.center());
            }
            core.store.update_particles(dt);
            return;
        }
        let homing = match core.docking.phase() {
            DockingPhase::Entering => element.map(|rect| rect.center()),
            _ => None,
        };
        core.store.set_dock_target(homing);

        let mut sounds = Vec::new();
        for task in core.scheduler.advance(dt) {
            core.run_task(task, &mut sounds);
        }

        let report = core.store.update(dt, arena);
        core.store.update_particles(dt);
        sounds.extend(report.sounds);
        for id in sounds {
            if let Err(e) = self.host.play_audio(id) {
                log::debug!("audio '{}' not played: {}", id, e);
            }
        }

        if core.store.player().game_over {
            let dropped = core.scheduler.flush();
            if dropped > 0 {
                log::info!("game over on wave {}, {} pending tasks dropped", core.wave, dropped);
            }
        } else if report.counts.hunters == 0 && core.scheduler.is_idle() {
            core.schedule_next_wave();
        }
    }

    /// Redraw the surface from current state.
    pub fn draw(&mut self) {
        let Some(core) = self.core.as_mut() else {
            return;
        };
        let snapshot = core.snapshot();
        let Some(canvas) = self.host.canvas(&self.surface_id) else {
            return;
        };
        canvas.clear();
        core.store.draw(canvas);
        draw_avatar(
            canvas,
            core.store.player(),
            core.store.clock().elapsed,
            core.docking.progress(),
        );
        hud::draw(canvas, &snapshot);
    }

    pub fn pointer_moved(&mut self, x: f32, y: f32) {
        if let Some(core) = self.core.as_mut() {
            let mut pointer = core.store.pointer_mut();
            pointer.pos = Vec2::new(x, y);
            pointer.present = true;
        }
    }

    pub fn pointer_left(&mut self) {
        if let Some(core) = self.core.as_mut() {
            core.store.pointer_mut().present = false;
        }
    }

    /// Elements matching `selector` become bounce boundaries, re-queried
    /// every tick. `None` clears them.
    pub fn set_bounce_boundaries(&mut self, selector: Option<&str>) {
        if let Some(core) = self.core.as_mut() {
            core.boundary_selector = selector.map(str::to_string);
        }
    }

    pub fn enter_magnetic_mode(&mut self, element: ElementId) {
        if let Some(core) = self.core.as_mut() {
            let effects = core.docking.enter(element);
            apply_docking_effects(&mut self.host, &mut core.store, &effects);
        }
    }

    pub fn exit_magnetic_mode(&mut self) {
        if let Some(core) = self.core.as_mut() {
            core.docking.exit();
        }
    }

    pub fn docking_phase(&self) -> DockingPhase {
        self.core
            .as_ref()
            .map_or(DockingPhase::None, |core| core.docking.phase())
    }

    pub fn wave(&self) -> u32 {
        self.core.as_ref().map_or(0, |core| core.wave)
    }

    /// Deferred tasks still waiting to run.
    pub fn pending_tasks(&self) -> usize {
        self.core
            .as_ref()
            .map_or(0, |core| core.scheduler.pending_count())
    }

    pub fn snapshot(&mut self) -> Option<Snapshot> {
        self.core.as_mut().map(GameCore::snapshot)
    }

    pub fn snapshot_json(&mut self) -> Option<String> {
        self.snapshot().and_then(|snapshot| snapshot.to_json().ok())
    }

    pub fn store_mut(&mut self) -> Option<&mut EntityStore> {
        self.core.as_mut().map(|core| &mut core.store)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl GameCore {
    fn run_task(&mut self, task: Deferred, sounds: &mut Vec<&'static str>) {
        match task {
            Deferred::StartWave(wave) => {
                self.wave = wave;
                self.store.shared_mut().begin_wave(wave);
                let with_pickup = self.config.mode == GameMode::Hunt;
                let ids = self.scheduler.schedule_wave(
                    &self.waves,
                    wave,
                    self.config.spawn_stagger,
                    with_pickup,
                    self.store.rng(),
                );
                log::info!("wave {} started, {} spawns scheduled", wave, ids.len());
                sounds.push(sound::WAVE_START);
            }
            Deferred::Spawn(species) => {
                let at = edge_point(self.store.rng(), self.viewport, species.stats().radius);
                self.store.add(Spawn::Hunter {
                    species,
                    at,
                    generation: 0,
                });
            }
            Deferred::SpawnPickup => {
                let rng = self.store.rng();
                let kind = PowerUpKind::ALL[rng.gen_range(0..PowerUpKind::ALL.len())];
                let at = Vec2::new(rng.gen_range(0.15..0.85), rng.gen_range(0.15..0.85))
                    * self.viewport;
                self.store.add(Spawn::Pickup {
                    kind: PickupKind::PowerUp(kind),
                    at,
                    lifespan: self.config.pickup_lifespan,
                });
            }
        }
    }

    fn schedule_next_wave(&mut self) {
        let delay = if self.wave == 0 {
            self.config.first_wave_delay
        } else {
            self.config.inter_wave_delay
        };
        self.scheduler.schedule(delay, Deferred::StartWave(self.wave + 1));
    }

    fn snapshot(&mut self) -> Snapshot {
        let mut snapshot = Snapshot::from_world(self.store.world_mut(), self.config.mode);
        snapshot.wave = self.wave;
        snapshot.docking = self.docking.phase();
        snapshot.docking_progress = self.docking.progress();
        snapshot
    }
}

fn apply_docking_effects<H: PageHost>(
    host: &mut H,
    store: &mut EntityStore,
    effects: &[DockingEffect],
) {
    for effect in effects {
        match *effect {
            DockingEffect::LockElement(element) => host.set_element_class(element, LOCK_CLASS, true),
            DockingEffect::UnlockElement(element) => {
                host.set_element_class(element, LOCK_CLASS, false)
            }
            DockingEffect::DetachPointer => store.pointer_mut().hit_testing = false,
            DockingEffect::AttachPointer => store.pointer_mut().hit_testing = true,
            DockingEffect::BodyDocked(on) => host.set_body_class(BODY_DOCKED_CLASS, on),
        }
    }
}

/// A point on a random viewport edge, inset by `inset`.
fn edge_point<R: Rng + ?Sized>(rng: &mut R, viewport: Vec2, inset: f32) -> Vec2 {
    let x = rng.gen_range(0.0..=viewport.x.max(0.0));
    let y = rng.gen_range(0.0..=viewport.y.max(0.0));
    match rng.gen_range(0..4) {
        0 => Vec2::new(x, inset),
        1 => Vec2::new(viewport.x - inset, y),
        2 => Vec2::new(x, viewport.y - inset),
        _ => Vec2::new(inset, y),
    }
}

fn draw_avatar<S: Surface + ?Sized>(surface: &mut S, player: &Player, now: f64, docking: f32) {
    if !player.is_alive() {
        return;
    }
    // Blink while invulnerable.
    let alpha = if player.invulnerable > 0.0 && (now * 10.0) as i64 % 2 == 0 {
        0.35
    } else {
        1.0
    };
    let radius = player.radius * (1.0 + docking);
    surface.fill_circle(player.pos, radius, palette::PLAYER.fade(alpha));
    if player.power_up_active(PowerUpKind::Shield, now) {
        surface.stroke_circle(player.pos, radius + 6.0, 2.0, palette::SHIELD.fade(alpha));
    }
    let nose = player.pos + Vec2::from_angle(player.facing) * (radius + 4.0);
    surface.line(player.pos, nose, 2.0, palette::PLAYER.fade(alpha));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, Rect};
    use crate::species::Species;
    use crate::waves::WaveSpec;

    const SURFACE: &str = "arcade";

    fn game_with(config: GameConfig) -> CursorGame<HeadlessHost> {
        CursorGame::new(SURFACE, HeadlessHost::with_canvas(SURFACE, 800.0, 600.0), config)
    }

    fn seeded() -> GameConfig {
        GameConfig {
            seed: Some(7),
            ..GameConfig::default()
        }
    }

    #[test]
    fn test_missing_surface_is_inactive_and_inert() {
        let mut game = CursorGame::new("nowhere", HeadlessHost::new(), GameConfig::default());
        assert!(!game.is_active());

        game.start();
        game.tick(16.0);
        game.pointer_moved(10.0, 10.0);
        game.enter_magnetic_mode(ElementId(1));
        game.reset(true);
        game.stop();

        assert!(!game.is_running());
        assert!(game.snapshot().is_none());
        assert_eq!(game.host().frames_requested(), 0);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let config = GameConfig {
            max_lives: 0,
            mode: GameMode::Shooter,
            ..seeded()
        };
        let mut game = game_with(config);
        assert!(game.is_active());
        let snapshot = game.snapshot().unwrap();
        assert_eq!(snapshot.mode, GameMode::Shooter);
        assert_eq!(snapshot.player.max_lives, GameConfig::default().max_lives);
    }

    #[test]
    fn test_reset_drops_pending_spawns() {
        let config = GameConfig {
            mode: GameMode::Shooter,
            first_wave_delay: 2.0,
            spawn_stagger: 0.5,
            waves: Some(WaveTable::new(vec![WaveSpec::new(3, &[Species::Chaser])]).unwrap()),
            ..seeded()
        };
        let mut game = game_with(config);
        game.start();

        // First update schedules wave 1; the second runs it.
        game.advance(0.016);
        game.advance(2.0);
        assert_eq!(game.wave(), 1);
        assert_eq!(game.pending_tasks(), 3);

        game.reset(false);
        assert_eq!(game.pending_tasks(), 0);

        for _ in 0..15 {
            game.advance(0.1);
        }
        let snapshot = game.snapshot().unwrap();
        assert!(snapshot.hunters.is_empty());
        assert_eq!(snapshot.wave, 0);
    }

    #[test]
    fn test_stop_then_start_resumes_interrupted_wave() {
        let config = GameConfig {
            mode: GameMode::Hunt,
            first_wave_delay: 2.0,
            spawn_stagger: 0.5,
            waves: Some(
                WaveTable::new(vec![
                    WaveSpec::new(3, &[Species::Chaser]),
                    WaveSpec::new(5, &[Species::Chaser]),
                ])
                .unwrap(),
            ),
            ..seeded()
        };
        let mut game = game_with(config);
        game.start();
        game.advance(0.016);
        game.advance(2.0);
        assert_eq!(game.wave(), 1);
        assert_eq!(game.pending_tasks(), 4);

        game.stop();
        game.start();
        assert_eq!(game.pending_tasks(), 1);
        game.advance(0.016);
        assert_eq!(game.wave(), 1);

        game.advance(2.0);
        assert_eq!(game.wave(), 1);
        assert_eq!(game.pending_tasks(), 4);
        for _ in 0..15 {
            game.advance(0.1);
        }
        let snapshot = game.snapshot().unwrap();
        assert_eq!(snapshot.wave, 1);
        assert_eq!(snapshot.hunters.len(), 3);
    }

    #[test]
    fn test_advance_is_inert_while_stopped() {
        let config = GameConfig {
            first_wave_delay: 0.0,
            ..seeded()
        };
        let mut game = game_with(config);
        game.advance(0.5);
        assert_eq!(game.pending_tasks(), 0);

        game.start();
        game.advance(0.016);
        game.stop();
        let before = game.snapshot().unwrap();
        game.pointer_moved(50.0, 50.0);
        for _ in 0..10 {
            game.advance(0.1);
        }
        let after = game.snapshot().unwrap();
        assert_eq!(after.time, before.time);
        assert_eq!(after.tick, before.tick);
        assert_eq!(after.player, before.player);
    }

    #[test]
    fn test_soft_reset_keeps_score_and_restarts_wave() {
        let config = GameConfig {
            first_wave_delay: 0.0,
            ..seeded()
        };
        let mut game = game_with(config);
        game.start();
        game.advance(0.016);
        game.advance(0.016);
        assert_eq!(game.wave(), 1);
        if let Some(store) = game.store_mut() {
            store.player_mut().add_score(300);
            store.player_mut().lives = 1;
        }

        game.reset(true);
        let snapshot = game.snapshot().unwrap();
        assert_eq!(snapshot.player.score, 300);
        assert_eq!(snapshot.player.lives, snapshot.player.max_lives);
        assert!(snapshot.hunters.is_empty());
        // Only the restart of the current wave is pending.
        assert_eq!(game.pending_tasks(), 1);
        game.advance(0.016);
        assert_eq!(game.wave(), 1);
    }

    #[test]
    fn test_docking_locks_pauses_and_releases() {
        let config = GameConfig {
            docking_transition: 0.2,
            ..seeded()
        };
        let mut game = game_with(config);
        let element = game
            .host_mut()
            .add_element(Rect::new(350.0, 280.0, 100.0, 40.0));
        game.start();

        game.enter_magnetic_mode(element);
        game.advance(0.1);
        assert_eq!(game.docking_phase(), DockingPhase::Entering);
        game.advance(0.1);
        assert_eq!(game.docking_phase(), DockingPhase::Active);
        assert!(game.host().element_has_class(element, LOCK_CLASS));
        assert!(game.host().body_has_class(BODY_DOCKED_CLASS));

        // Simulation time stands still while docked.
        let before = game.snapshot().unwrap().time;
        game.advance(0.5);
        assert_eq!(game.snapshot().unwrap().time, before);

        game.exit_magnetic_mode();
        game.advance(0.1);
        assert!(game.host().element_has_class(element, LOCK_CLASS));
        game.advance(0.1);
        assert_eq!(game.docking_phase(), DockingPhase::None);
        assert!(!game.host().element_has_class(element, LOCK_CLASS));
        assert!(!game.host().body_has_class(BODY_DOCKED_CLASS));
    }

    #[test]
    fn test_hard_reset_releases_docking() {
        let config = GameConfig {
            docking_transition: 0.1,
            ..seeded()
        };
        let mut game = game_with(config);
        let element = game
            .host_mut()
            .add_element(Rect::new(350.0, 280.0, 100.0, 40.0));
        game.start();
        game.enter_magnetic_mode(element);
        game.advance(0.1);
        assert_eq!(game.docking_phase(), DockingPhase::Active);

        game.reset(false);
        assert_eq!(game.docking_phase(), DockingPhase::None);
        assert!(!game.host().element_has_class(element, LOCK_CLASS));
    }

    #[test]
    fn test_rejected_audio_is_swallowed() {
        let config = GameConfig {
            first_wave_delay: 0.0,
            ..seeded()
        };
        let mut game = game_with(config);
        game.start();
        game.host_mut().set_reject_audio(true);
        game.advance(0.016);
        game.advance(0.016);
        assert_eq!(game.wave(), 1);
        assert!(game.host().played().is_empty());
    }

    #[test]
    fn test_wave_start_plays_sound() {
        let config = GameConfig {
            first_wave_delay: 0.0,
            ..seeded()
        };
        let mut game = game_with(config);
        game.start();
        game.advance(0.016);
        game.advance(0.016);
        assert_eq!(game.host().played_count(sound::WAVE_START), 1);
    }

    #[test]
    fn test_stop_cancels_frame_and_tasks() {
        let mut game = game_with(seeded());
        game.start();
        let handle = game.host().pending_frame();
        assert!(handle.is_some());
        game.advance(0.016);
        assert!(game.pending_tasks() > 0);

        game.stop();
        assert_eq!(game.host().pending_frame(), None);
        assert_eq!(game.host().cancelled_frames(), &[handle.unwrap()]);
        assert_eq!(game.pending_tasks(), 0);

        let requested = game.host().frames_requested();
        game.tick(100.0);
        assert_eq!(game.host().frames_requested(), requested);
    }

    #[test]
    fn test_tick_draws_once_and_requests_next_frame() {
        let mut game = game_with(seeded());
        game.start();
        game.tick(0.0);
        game.tick(16.0);
        assert_eq!(game.host().frames_requested(), 3);
        let surface = game.host().surface(SURFACE).unwrap();
        assert_eq!(surface.count_text("SCORE"), 1);
    }

    #[test]
    fn test_pointer_drives_avatar() {
        let mut game = game_with(seeded());
        game.start();
        game.pointer_moved(100.0, 100.0);
        for _ in 0..60 {
            game.advance(1.0 / 60.0);
        }
        let player = game.snapshot().unwrap().player;
        assert!(Vec2::new(player.x, player.y).distance(Vec2::new(100.0, 100.0)) < 5.0);
    }

    #[test]
    fn test_edge_points_lie_on_the_border() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let viewport = Vec2::new(800.0, 600.0);
        for _ in 0..64 {
            let p = edge_point(&mut rng, viewport, 10.0);
            let on_edge = p.x == 10.0 || p.y == 10.0 || p.x == 790.0 || p.y == 590.0;
            assert!(on_edge, "{:?}", p);
        }
    }
}
