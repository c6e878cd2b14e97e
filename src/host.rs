//! Page host abstraction.
//!
//! The game never talks to a browser directly. Everything it needs from the
//! page (the canvas, element geometry, presentation classes, audio and frame
//! callbacks) goes through [`PageHost`]. [`HeadlessHost`] is a complete
//! in-memory implementation used by tests, the demo and the benchmark.

use crate::error::AudioError;
use crate::surface::{CommandSurface, Surface};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Sound ids the game asks the host to play.
pub mod sound {
    pub const WAVE_START: &str = "wave-start";
    pub const SHOOT: &str = "shoot";
    pub const HIT: &str = "hit";
    pub const EXPLOSION: &str = "explosion";
    pub const PICKUP: &str = "pickup";
    pub const COIN: &str = "coin";
    pub const PLAYER_HIT: &str = "player-hit";
    pub const SHIELD: &str = "shield";
    pub const GAME_OVER: &str = "game-over";

    pub const ALL: [&str; 9] = [
        WAVE_START, SHOOT, HIT, EXPLOSION, PICKUP, COIN, PLAYER_HIT, SHIELD, GAME_OVER,
    ];
}

/// Opaque, non-owning reference to a page element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

/// Handle of a requested animation frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

/// Axis-aligned rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.cmpge(self.min()).all() && point.cmple(self.max()).all()
    }

    /// Point of the rectangle closest to `point`.
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.max(self.min()).min(self.max())
    }
}

/// Everything the game needs from the page.
pub trait PageHost {
    type Canvas: Surface;

    /// The drawing surface with the given id, if it exists.
    fn canvas(&mut self, surface_id: &str) -> Option<&mut Self::Canvas>;

    /// Bounding rectangles of all elements matching `selector`, queried live.
    fn query_rects(&self, selector: &str) -> Vec<Rect>;

    /// Current geometry of an element, `None` once it left the page.
    fn element_rect(&self, element: ElementId) -> Option<Rect>;

    fn set_element_class(&mut self, element: ElementId, class: &str, on: bool);

    fn set_body_class(&mut self, class: &str, on: bool);

    fn play_audio(&mut self, id: &str) -> Result<(), AudioError>;

    fn request_frame(&mut self) -> FrameHandle;

    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// In-memory page host that records everything it is asked to do.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    canvases: HashMap<String, CommandSurface>,
    rects: HashMap<String, Vec<Rect>>,
    elements: HashMap<ElementId, Rect>,
    next_element: u64,
    element_classes: HashMap<ElementId, BTreeSet<String>>,
    body_classes: BTreeSet<String>,
    missing_audio: HashSet<String>,
    reject_audio: bool,
    played: Vec<String>,
    next_frame: u64,
    requested: Vec<FrameHandle>,
    cancelled: Vec<FrameHandle>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host with a single canvas.
    pub fn with_canvas(surface_id: &str, width: f32, height: f32) -> Self {
        let mut host = Self::new();
        host.add_canvas(surface_id, width, height);
        host
    }

    pub fn add_canvas(&mut self, surface_id: &str, width: f32, height: f32) {
        self.canvases
            .insert(surface_id.to_string(), CommandSurface::new(width, height));
    }

    pub fn surface(&self, surface_id: &str) -> Option<&CommandSurface> {
        self.canvases.get(surface_id)
    }

    pub fn set_rects(&mut self, selector: &str, rects: Vec<Rect>) {
        self.rects.insert(selector.to_string(), rects);
    }

    pub fn add_element(&mut self, rect: Rect) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;
        self.elements.insert(id, rect);
        id
    }

    pub fn move_element(&mut self, element: ElementId, rect: Rect) {
        if let Some(slot) = self.elements.get_mut(&element) {
            *slot = rect;
        }
    }

    pub fn remove_element(&mut self, element: ElementId) {
        self.elements.remove(&element);
    }

    pub fn element_has_class(&self, element: ElementId, class: &str) -> bool {
        self.element_classes
            .get(&element)
            .is_some_and(|classes| classes.contains(class))
    }

    pub fn body_has_class(&self, class: &str) -> bool {
        self.body_classes.contains(class)
    }

    /// Make playback of `id` fail with [`AudioError::Missing`].
    pub fn remove_audio(&mut self, id: &str) {
        self.missing_audio.insert(id.to_string());
    }

    /// Make every playback fail with [`AudioError::Rejected`].
    pub fn set_reject_audio(&mut self, reject: bool) {
        self.reject_audio = reject;
    }

    /// Sounds that played successfully, in order.
    pub fn played(&self) -> &[String] {
        &self.played
    }

    pub fn played_count(&self, id: &str) -> usize {
        self.played.iter().filter(|p| p.as_str() == id).count()
    }

    /// The most recent frame request that was not cancelled.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.requested
            .last()
            .copied()
            .filter(|handle| !self.cancelled.contains(handle))
    }

    pub fn frames_requested(&self) -> usize {
        self.requested.len()
    }

    pub fn cancelled_frames(&self) -> &[FrameHandle] {
        &self.cancelled
    }
}

impl PageHost for HeadlessHost {
    type Canvas = CommandSurface;

    fn canvas(&mut self, surface_id: &str) -> Option<&mut CommandSurface> {
        self.canvases.get_mut(surface_id)
    }

    fn query_rects(&self, selector: &str) -> Vec<Rect> {
        self.rects.get(selector).cloned().unwrap_or_default()
    }

    fn element_rect(&self, element: ElementId) -> Option<Rect> {
        self.elements.get(&element).copied()
    }

    fn set_element_class(&mut self, element: ElementId, class: &str, on: bool) {
        let classes = self.element_classes.entry(element).or_default();
        if on {
            classes.insert(class.to_string());
        } else {
            classes.remove(class);
        }
    }

    fn set_body_class(&mut self, class: &str, on: bool) {
        if on {
            self.body_classes.insert(class.to_string());
        } else {
            self.body_classes.remove(class);
        }
    }

    fn play_audio(&mut self, id: &str) -> Result<(), AudioError> {
        if self.missing_audio.contains(id) {
            return Err(AudioError::Missing(id.to_string()));
        }
        if self.reject_audio {
            return Err(AudioError::Rejected(id.to_string()));
        }
        self.played.push(id.to_string());
        Ok(())
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_frame);
        self.next_frame += 1;
        self.requested.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.cancelled.push(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_geometry() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(rect.center(), Vec2::new(60.0, 45.0));
        assert!(rect.contains(Vec2::new(10.0, 20.0)));
        assert!(!rect.contains(Vec2::new(111.0, 30.0)));
        assert_eq!(rect.closest_point(Vec2::new(0.0, 0.0)), Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_removed_element_has_no_rect() {
        let mut host = HeadlessHost::new();
        let id = host.add_element(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(host.element_rect(id).is_some());
        host.remove_element(id);
        assert!(host.element_rect(id).is_none());
    }

    #[test]
    fn test_audio_failures_are_reported() {
        let mut host = HeadlessHost::new();
        host.remove_audio(sound::COIN);
        assert_eq!(
            host.play_audio(sound::COIN),
            Err(AudioError::Missing("coin".to_string()))
        );
        assert!(host.play_audio(sound::HIT).is_ok());
        host.set_reject_audio(true);
        assert!(matches!(host.play_audio(sound::HIT), Err(AudioError::Rejected(_))));
        assert_eq!(host.played(), &["hit".to_string()]);
    }

    #[test]
    fn test_cancelled_frame_is_not_pending() {
        let mut host = HeadlessHost::new();
        let handle = host.request_frame();
        assert_eq!(host.pending_frame(), Some(handle));
        host.cancel_frame(handle);
        assert_eq!(host.pending_frame(), None);
    }
}
