//! 2D drawing surface abstraction.
//!
//! The simulation never talks to a real canvas. Everything it draws goes
//! through the [`Surface`] trait, which the page host implements on top of
//! whatever it renders with. [`CommandSurface`] is the in-memory
//! implementation: it records a serializable command list that a host can
//! replay, and that tests can inspect.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// RGBA color with 8-bit channels and a float alpha (CSS style).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Same color with its alpha multiplied by `alpha` (clamped to [0, 1]).
    pub fn fade(self, alpha: f32) -> Self {
        Self {
            a: (self.a * alpha).clamp(0.0, 1.0),
            ..self
        }
    }

    /// CSS `rgba(...)` string.
    pub fn to_css(&self) -> String {
        format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.a)
    }
}

/// Palette shared by the entity renderer, particles and HUD.
pub mod palette {
    use super::Rgba;

    pub const PLAYER: Rgba = Rgba::rgb(240, 240, 245);
    pub const SHIELD: Rgba = Rgba::rgb(90, 200, 255);
    pub const BOOST: Rgba = Rgba::rgb(255, 170, 40);
    pub const RAPID_FIRE: Rgba = Rgba::rgb(180, 120, 255);
    pub const COIN: Rgba = Rgba::rgb(255, 215, 0);
    pub const PLAYER_SHOT: Rgba = Rgba::rgb(140, 255, 200);
    pub const ENEMY_SHOT: Rgba = Rgba::rgb(255, 90, 90);
    pub const EXPLOSION: Rgba = Rgba::rgb(255, 120, 40);
    pub const HUD_TEXT: Rgba = Rgba::rgb(220, 220, 230);
    pub const HUD_DIM: Rgba = Rgba::rgb(90, 90, 110);
    pub const DANGER: Rgba = Rgba::rgb(255, 60, 80);
}

/// Horizontal text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Minimal immediate-mode 2D drawing interface.
pub trait Surface {
    /// Drawable size in CSS pixels.
    fn size(&self) -> Vec2;
    fn clear(&mut self);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba);
    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba);
    fn text(&mut self, at: Vec2, text: &str, size: f32, color: Rgba, align: TextAlign);
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear,
    FillCircle { x: f32, y: f32, radius: f32, color: Rgba },
    StrokeCircle { x: f32, y: f32, radius: f32, width: f32, color: Rgba },
    Line { x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgba },
    FillRect { x: f32, y: f32, width: f32, height: f32, color: Rgba },
    Text { x: f32, y: f32, text: String, size: f32, color: Rgba, align: TextAlign },
}

/// Surface that records draw calls instead of rasterizing them.
#[derive(Debug, Clone, Default)]
pub struct CommandSurface {
    size: Vec2,
    commands: Vec<DrawCommand>,
}

impl CommandSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            commands: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
    }

    /// Commands recorded since the last `clear`.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of text commands whose text contains `needle`.
    pub fn count_text(&self, needle: &str) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Text { text, .. } if text.contains(needle)))
            .count()
    }

    /// Serialize the current command list for a JavaScript replayer.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.commands)
    }
}

impl Surface for CommandSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle {
            x: center.x,
            y: center.y,
            radius,
            color,
        });
    }

    fn stroke_circle(&mut self, center: Vec2, radius: f32, width: f32, color: Rgba) {
        self.commands.push(DrawCommand::StrokeCircle {
            x: center.x,
            y: center.y,
            radius,
            width,
            color,
        });
    }

    fn line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.commands.push(DrawCommand::Line {
            x1: from.x,
            y1: from.y,
            x2: to.x,
            y2: to.y,
            width,
            color,
        });
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        self.commands.push(DrawCommand::FillRect {
            x: origin.x,
            y: origin.y,
            width: size.x,
            height: size.y,
            color,
        });
    }

    fn text(&mut self, at: Vec2, text: &str, size: f32, color: Rgba, align: TextAlign) {
        self.commands.push(DrawCommand::Text {
            x: at.x,
            y: at.y,
            text: text.to_string(),
            size,
            color,
            align,
        });
    }
}
