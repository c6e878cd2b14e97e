//! Cursor Arcade - Simulation Core
//!
//! The engine behind a cursor-replacement arcade game: the pointer becomes
//! an avatar that is hunted by (or shoots at) waves of enemies, can dock
//! onto page elements, and bounces projectiles off page rectangles.
//! Uses `bevy_ecs` for the entity-component-system architecture and talks
//! to the page only through the [`PageHost`] and [`Surface`] traits.

pub mod api;
pub mod behavior;
pub mod collision;
pub mod components;
pub mod config;
pub mod docking;
pub mod error;
pub mod frame;
pub mod host;
pub mod hud;
pub mod logging;
pub mod particles;
pub mod player;
pub mod spatial;
pub mod species;
pub mod store;
pub mod surface;
pub mod systems;
pub mod waves;
pub mod world;

pub use api::CursorGame;
pub use components::*;
pub use config::{GameConfig, GameMode};
pub use docking::{DockingPhase, DockingState};
pub use error::{AudioError, BehaviorError, ConfigError};
pub use host::{ElementId, FrameHandle, HeadlessHost, PageHost, Rect};
pub use spatial::{SpatialEntry, SpatialGrid};
pub use species::Species;
pub use store::{EntityStore, Spawn, TickReport};
pub use surface::{CommandSurface, DrawCommand, Rgba, Surface};
pub use systems::*;
pub use waves::{WaveSpec, WaveTable};
pub use world::Snapshot;
