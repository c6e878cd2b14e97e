//! Heads-up display drawn over the field from a [`Snapshot`].

use crate::store::power_up_color;
use crate::surface::{palette, Surface, TextAlign};
use crate::world::Snapshot;
use glam::Vec2;

const MARGIN: f32 = 16.0;
const TEXT_SIZE: f32 = 14.0;
const LIFE_RADIUS: f32 = 5.0;
const BAR_WIDTH: f32 = 60.0;
/// Seconds shown by a full power-up bar.
const BAR_SECONDS: f32 = 10.0;

pub fn draw<S: Surface + ?Sized>(surface: &mut S, snapshot: &Snapshot) {
    let size = surface.size();
    let player = &snapshot.player;

    surface.text(
        Vec2::new(MARGIN, MARGIN + TEXT_SIZE),
        &format!("SCORE {}", player.score),
        TEXT_SIZE,
        palette::HUD_TEXT,
        TextAlign::Left,
    );
    if snapshot.wave > 0 {
        surface.text(
            Vec2::new(size.x - MARGIN, MARGIN + TEXT_SIZE),
            &format!("WAVE {}", snapshot.wave),
            TEXT_SIZE,
            palette::HUD_TEXT,
            TextAlign::Right,
        );
    }

    // Lives as pips, spent ones dimmed.
    for i in 0..player.max_lives {
        let center = Vec2::new(
            MARGIN + LIFE_RADIUS + i as f32 * (LIFE_RADIUS * 3.0),
            MARGIN + TEXT_SIZE * 2.0,
        );
        if i < player.lives {
            surface.fill_circle(center, LIFE_RADIUS, palette::PLAYER);
        } else {
            surface.stroke_circle(center, LIFE_RADIUS, 1.0, palette::HUD_DIM);
        }
    }

    let mut y = MARGIN + TEXT_SIZE * 3.0;
    for power_up in &player.power_ups {
        let color = power_up_color(power_up.kind);
        let fraction = (power_up.remaining / BAR_SECONDS).clamp(0.0, 1.0);
        surface.text(
            Vec2::new(MARGIN, y + TEXT_SIZE * 0.8),
            power_up.kind.label(),
            TEXT_SIZE * 0.8,
            color,
            TextAlign::Left,
        );
        surface.fill_rect(
            Vec2::new(MARGIN + 90.0, y + 4.0),
            Vec2::new(BAR_WIDTH * fraction, 4.0),
            color,
        );
        y += TEXT_SIZE;
    }

    if player.game_over {
        surface.text(
            size * 0.5,
            "GAME OVER",
            TEXT_SIZE * 3.0,
            palette::DANGER,
            TextAlign::Center,
        );
        surface.text(
            size * 0.5 + Vec2::new(0.0, TEXT_SIZE * 2.0),
            &format!("FINAL SCORE {}", player.score),
            TEXT_SIZE,
            palette::HUD_TEXT,
            TextAlign::Center,
        );
    }
}
