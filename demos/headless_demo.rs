//! Headless run of the cursor arcade game.
//!
//! Run with: cargo run --example headless_demo [hunt|shooter]

use cursor_arcade::{logging, CursorGame, GameConfig, GameMode, HeadlessHost, Rect};

const SURFACE: &str = "cursor-arcade";

fn main() {
    logging::init(false);

    let mode = match std::env::args().nth(1).as_deref() {
        Some("shooter") => GameMode::Shooter,
        _ => GameMode::Hunt,
    };
    println!("=== Cursor Arcade - Headless Demo ({:?}) ===\n", mode);

    let mut host = HeadlessHost::with_canvas(SURFACE, 1280.0, 720.0);
    host.set_rects(
        ".card",
        vec![
            Rect::new(200.0, 200.0, 240.0, 140.0),
            Rect::new(840.0, 380.0, 240.0, 140.0),
        ],
    );
    let config = GameConfig {
        seed: Some(2024),
        ..GameConfig::for_mode(mode)
    };
    let mut game = CursorGame::new(SURFACE, host, config);
    game.set_bounce_boundaries(Some(".card"));
    game.start();

    // Sweep the pointer around a circle at 60 frames per second.
    for frame in 0..1800u32 {
        let t = frame as f32 / 60.0;
        game.pointer_moved(640.0 + 300.0 * t.cos(), 360.0 + 200.0 * (t * 1.3).sin());
        game.tick(frame as f64 * 1000.0 / 60.0);

        if (frame + 1) % 300 == 0 {
            if let Some(snapshot) = game.snapshot() {
                println!(
                    "t={:>4.1}s wave={} score={} lives={} hunters={} projectiles={} particles={}",
                    snapshot.time,
                    snapshot.wave,
                    snapshot.player.score,
                    snapshot.player.lives,
                    snapshot.hunters.len(),
                    snapshot.projectiles.len(),
                    snapshot.particle_count
                );
            }
        }
    }
    game.stop();

    println!("\nSounds played: {}", game.host().played().len());
    if let Some(json) = game.snapshot().and_then(|s| s.to_json_pretty().ok()) {
        println!("\n=== Final State (JSON) ===\n");
        println!("{}", json);
    }
}
