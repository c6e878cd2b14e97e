//! Enemy species catalogue.
//!
//! A species is a closed tag. Everything that differs between species lives
//! either in the static [`SpeciesStats`] table here or in the behavior table
//! (`crate::behavior`).

use crate::surface::Rgba;
use serde::{Deserialize, Serialize};

/// Closed set of enemy species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    /// Direct pursuit; speeds up when enraged.
    Chaser,
    /// Leads the player and pincers off the nearest chaser.
    Interceptor,
    /// Holds a distance band and fires on cooldown.
    Sniper,
    /// Stalk, wind up, dash, snipe, recover.
    Dasher,
    /// Mirrors the player across the viewport center.
    Phantom,
    /// Fragile timed exploder.
    Bomber,
    /// Slow drifter that splits into debris on death.
    Splitter,
}

/// Static per-species tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesStats {
    /// Collision radius in CSS pixels.
    pub radius: f32,
    /// Cruise speed in pixels per second.
    pub speed: f32,
    pub health: f32,
    /// Score awarded on kill.
    pub score: u32,
    pub color: Rgba,
}

impl Species {
    pub const ALL: [Species; 7] = [
        Species::Chaser,
        Species::Interceptor,
        Species::Sniper,
        Species::Dasher,
        Species::Phantom,
        Species::Bomber,
        Species::Splitter,
    ];

    pub fn stats(self) -> SpeciesStats {
        match self {
            Species::Chaser => SpeciesStats {
                radius: 9.0,
                speed: 150.0,
                health: 1.0,
                score: 100,
                color: Rgba::rgb(255, 82, 82),
            },
            Species::Interceptor => SpeciesStats {
                radius: 8.0,
                speed: 175.0,
                health: 1.0,
                score: 150,
                color: Rgba::rgb(255, 150, 60),
            },
            Species::Sniper => SpeciesStats {
                radius: 10.0,
                speed: 120.0,
                health: 2.0,
                score: 200,
                color: Rgba::rgb(120, 210, 255),
            },
            Species::Dasher => SpeciesStats {
                radius: 9.0,
                speed: 110.0,
                health: 2.0,
                score: 250,
                color: Rgba::rgb(200, 90, 255),
            },
            Species::Phantom => SpeciesStats {
                radius: 10.0,
                speed: 140.0,
                health: 1.0,
                score: 175,
                color: Rgba::rgb(170, 255, 170),
            },
            Species::Bomber => SpeciesStats {
                radius: 7.0,
                speed: 90.0,
                health: 1.0,
                score: 125,
                color: Rgba::rgb(255, 230, 80),
            },
            Species::Splitter => SpeciesStats {
                radius: 16.0,
                speed: 70.0,
                health: 3.0,
                score: 60,
                color: Rgba::rgb(180, 180, 200),
            },
        }
    }

    /// Fragile species detonate when they die, whatever killed them.
    pub fn detonates_on_death(self) -> bool {
        matches!(self, Species::Bomber)
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Chaser => "chaser",
            Species::Interceptor => "interceptor",
            Species::Sniper => "sniper",
            Species::Dasher => "dasher",
            Species::Phantom => "phantom",
            Species::Bomber => "bomber",
            Species::Splitter => "splitter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_species_has_positive_radius_and_speed() {
        for species in Species::ALL {
            let stats = species.stats();
            assert!(stats.radius > 0.0, "{species:?}");
            assert!(stats.speed > 0.0, "{species:?}");
            assert!(stats.health > 0.0, "{species:?}");
        }
    }

    #[test]
    fn test_species_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Species::Interceptor).unwrap();
        assert_eq!(json, "\"interceptor\"");
        let parsed: Species = serde_json::from_str("\"bomber\"").unwrap();
        assert_eq!(parsed, Species::Bomber);
        assert_eq!(parsed.name(), "bomber");
    }
}
