//! Error types for the simulation core.
//!
//! None of these escape the public runtime API: the game degrades to
//! "feature silently does nothing" and logs instead. They exist so the
//! internal seams (config loading, audio playback, species behaviors) can use
//! `Result` and `?` like everything else.

use crate::species::Species;
use thiserror::Error;

/// Errors raised while loading or validating a [`GameConfig`](crate::config::GameConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("wave table is empty")]
    EmptyWaveTable,

    #[error("wave {wave} has a spawn count of zero")]
    ZeroCount { wave: usize },

    #[error("wave {wave} lists no species")]
    EmptySpecies { wave: usize },

    #[error("`{field}` must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("`{field}` must be within [0, 1] (got {value})")]
    OutOfUnitRange { field: &'static str, value: f64 },
}

/// Audio playback failures reported by the page host.
///
/// Autoplay restrictions make these routine, so callers log and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("no audio element with id `{0}`")]
    Missing(String),

    #[error("playback of `{0}` was rejected")]
    Rejected(String),
}

/// A single hunter's behavior could not produce a decision this tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BehaviorError {
    #[error("{species:?} behavior received scratch state for another species")]
    ScratchMismatch { species: Species },

    #[error("{species:?} behavior produced a non-finite target")]
    NonFiniteTarget { species: Species },
}
