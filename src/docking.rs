//! Magnetic docking state machine.
//!
//! `None -> Entering -> Active -> Exiting -> None`.
//!
//! While entering, the avatar homes on the target element's center. Once it
//! is within the snap distance, `progress` ramps from 0 to 1 over the
//! configured transition time; at 1 the machine locks the element, detaches
//! pointer hit-testing and the game pauses. Exiting ramps `progress` back to
//! 0, and only the final `Exiting -> None` step undoes the lock.
//!
//! The machine itself never touches the page. Transitions return
//! [`DockingEffect`]s for the caller to apply through its host.

use crate::host::{ElementId, Rect};
use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Class put on the element while the avatar is locked to it.
pub const LOCK_CLASS: &str = "cursor-locked";
/// Class put on the page body while docked.
pub const BODY_DOCKED_CLASS: &str = "cursor-docked";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockingPhase {
    #[default]
    None,
    Entering,
    Active,
    Exiting,
}

/// Page-side change requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockingEffect {
    LockElement(ElementId),
    UnlockElement(ElementId),
    /// Stop driving the avatar from the pointer.
    DetachPointer,
    AttachPointer,
    BodyDocked(bool),
}

/// Point the avatar homes on while entering; `None` when undocked.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct DockTarget(pub Option<Vec2>);

#[derive(Debug, Clone)]
pub struct DockingState {
    phase: DockingPhase,
    progress: f32,
    target: Option<ElementId>,
    locked: bool,
    transition: f32,
    snap_distance: f32,
}

impl DockingState {
    pub fn new(transition: f32, snap_distance: f32) -> Self {
        Self {
            phase: DockingPhase::None,
            progress: 0.0,
            target: None,
            locked: false,
            transition: transition.max(f32::EPSILON),
            snap_distance,
        }
    }

    pub fn phase(&self) -> DockingPhase {
        self.phase
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn target(&self) -> Option<ElementId> {
        self.target
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// The simulation is frozen while locked onto an element.
    pub fn pauses_simulation(&self) -> bool {
        self.locked
    }

    /// Start docking onto `element`. Any current attachment is released
    /// first, at once.
    pub fn enter(&mut self, element: ElementId) -> Vec<DockingEffect> {
        if self.target == Some(element)
            && matches!(self.phase, DockingPhase::Entering | DockingPhase::Active)
        {
            return Vec::new();
        }
        let effects = self.fast_forward_exit();
        self.phase = DockingPhase::Entering;
        self.progress = 0.0;
        self.target = Some(element);
        log::debug!("docking: entering {:?}", element);
        effects
    }

    /// Begin releasing the current target.
    pub fn exit(&mut self) {
        if matches!(self.phase, DockingPhase::Entering | DockingPhase::Active) {
            self.phase = DockingPhase::Exiting;
            log::debug!("docking: exiting {:?}", self.target);
        }
    }

    /// Jump straight to `None`, running the terminal cleanup.
    pub fn fast_forward_exit(&mut self) -> Vec<DockingEffect> {
        if self.phase == DockingPhase::None {
            return Vec::new();
        }
        self.progress = 0.0;
        self.finish_exit()
    }

    /// Advance the machine by `dt` seconds.
    ///
    /// `element` is the target's current geometry, `None` if it has left the
    /// page, which forces an exit.
    pub fn step(&mut self, dt: f32, avatar: Vec2, element: Option<Rect>) -> Vec<DockingEffect> {
        let rate = dt.max(0.0) / self.transition;
        match self.phase {
            DockingPhase::None => Vec::new(),
            DockingPhase::Entering => {
                let Some(rect) = element else {
                    self.phase = DockingPhase::Exiting;
                    return Vec::new();
                };
                if self.progress > 0.0 || avatar.distance(rect.center()) < self.snap_distance {
                    self.progress = (self.progress + rate).min(1.0);
                }
                if self.progress >= 1.0 {
                    self.activate()
                } else {
                    Vec::new()
                }
            }
            DockingPhase::Active => {
                if element.is_none() {
                    self.phase = DockingPhase::Exiting;
                }
                Vec::new()
            }
            DockingPhase::Exiting => {
                self.progress = (self.progress - rate).max(0.0);
                if self.progress <= 0.0 {
                    self.finish_exit()
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn activate(&mut self) -> Vec<DockingEffect> {
        self.phase = DockingPhase::Active;
        self.locked = true;
        log::debug!("docking: active on {:?}", self.target);
        let mut effects = Vec::with_capacity(3);
        if let Some(element) = self.target {
            effects.push(DockingEffect::LockElement(element));
        }
        effects.push(DockingEffect::DetachPointer);
        effects.push(DockingEffect::BodyDocked(true));
        effects
    }

    fn finish_exit(&mut self) -> Vec<DockingEffect> {
        let mut effects = Vec::new();
        if self.locked {
            if let Some(element) = self.target {
                effects.push(DockingEffect::UnlockElement(element));
            }
            effects.push(DockingEffect::AttachPointer);
            effects.push(DockingEffect::BodyDocked(false));
        }
        self.phase = DockingPhase::None;
        self.locked = false;
        self.target = None;
        log::debug!("docking: released");
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn element() -> (ElementId, Rect) {
        (ElementId(7), Rect::new(100.0, 100.0, 40.0, 20.0))
    }

    #[test]
    fn test_full_cycle_locks_then_releases() {
        let (id, rect) = element();
        let mut docking = DockingState::new(0.2, 2.0);
        assert!(docking.enter(id).is_empty());

        // Far away: no ramp.
        docking.step(DT, Vec2::ZERO, Some(rect));
        assert_eq!(docking.progress(), 0.0);

        let mut effects = Vec::new();
        let mut last = 0.0;
        while docking.phase() == DockingPhase::Entering {
            effects = docking.step(DT, rect.center(), Some(rect));
            assert!(docking.progress() >= last);
            last = docking.progress();
        }
        assert_eq!(docking.phase(), DockingPhase::Active);
        assert!(docking.pauses_simulation());
        assert_eq!(effects, vec![
            DockingEffect::LockElement(id),
            DockingEffect::DetachPointer,
            DockingEffect::BodyDocked(true)
        ]);

        docking.exit();
        let mut effects = Vec::new();
        while docking.phase() == DockingPhase::Exiting {
            // Cleanup only happens on the terminal step.
            assert!(effects.is_empty());
            assert!(docking.is_locked());
            effects = docking.step(DT, rect.center(), Some(rect));
            assert!(docking.progress() <= last);
            last = docking.progress();
        }
        assert_eq!(docking.phase(), DockingPhase::None);
        assert_eq!(effects, vec![
            DockingEffect::UnlockElement(id),
            DockingEffect::AttachPointer,
            DockingEffect::BodyDocked(false)
        ]);
        assert!(!docking.pauses_simulation());
    }

    #[test]
    fn test_exit_before_active_never_locks() {
        let (id, rect) = element();
        let mut docking = DockingState::new(0.2, 2.0);
        docking.enter(id);
        docking.step(DT, rect.center(), Some(rect));
        assert!(docking.progress() > 0.0);
        docking.exit();
        assert_eq!(docking.phase(), DockingPhase::Exiting);
        let mut all_effects = Vec::new();
        for _ in 0..60 {
            assert!(!docking.pauses_simulation());
            all_effects.extend(docking.step(DT, rect.center(), Some(rect)));
        }
        assert_eq!(docking.phase(), DockingPhase::None);
        assert!(all_effects.is_empty());
    }

    #[test]
    fn test_progress_stays_in_unit_interval_with_huge_steps() {
        let (id, rect) = element();
        let mut docking = DockingState::new(0.2, 2.0);
        docking.enter(id);
        docking.step(10.0, rect.center(), Some(rect));
        assert_eq!(docking.progress(), 1.0);
        docking.exit();
        docking.step(10.0, rect.center(), Some(rect));
        assert_eq!(docking.progress(), 0.0);
        assert_eq!(docking.phase(), DockingPhase::None);
    }

    #[test]
    fn test_new_target_fast_forwards_previous_release() {
        let (first, rect) = element();
        let second = ElementId(8);
        let mut docking = DockingState::new(0.2, 2.0);
        docking.enter(first);
        docking.step(1.0, rect.center(), Some(rect));
        assert!(docking.is_locked());

        let effects = docking.enter(second);
        assert_eq!(effects, vec![
            DockingEffect::UnlockElement(first),
            DockingEffect::AttachPointer,
            DockingEffect::BodyDocked(false)
        ]);
        assert_eq!(docking.phase(), DockingPhase::Entering);
        assert_eq!(docking.target(), Some(second));
        assert_eq!(docking.progress(), 0.0);
    }

    #[test]
    fn test_vanished_element_forces_exit() {
        let (id, rect) = element();
        let mut docking = DockingState::new(0.2, 2.0);
        docking.enter(id);
        docking.step(1.0, rect.center(), Some(rect));
        assert_eq!(docking.phase(), DockingPhase::Active);
        docking.step(DT, rect.center(), None);
        assert_eq!(docking.phase(), DockingPhase::Exiting);
    }
}
