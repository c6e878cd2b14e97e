//! Wave composition and deferred spawning.
//!
//! The wave table maps a 1-based wave number to a fixed composition. Waves
//! past the end of the table reuse the last entry. Spawns within a wave are
//! staggered through [`SpawnScheduler`], a cancellable timer set advanced by
//! the frame loop, so stopping or resetting a game can drop every spawn that
//! has not fired yet.

use crate::config::GameMode;
use crate::error::ConfigError;
use crate::species::Species;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One configured wave: `count` spawns cycling through `species`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveSpec {
    pub count: u32,
    pub species: Vec<Species>,
}

impl WaveSpec {
    pub fn new(count: u32, species: &[Species]) -> Self {
        Self {
            count,
            species: species.to_vec(),
        }
    }
}

/// Ordered wave table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaveTable(Vec<WaveSpec>);

impl WaveTable {
    pub fn new(entries: Vec<WaveSpec>) -> Result<Self, ConfigError> {
        let table = Self(entries);
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.0.is_empty() {
            return Err(ConfigError::EmptyWaveTable);
        }
        for (i, spec) in self.0.iter().enumerate() {
            if spec.count == 0 {
                return Err(ConfigError::ZeroCount { wave: i + 1 });
            }
            if spec.species.is_empty() {
                return Err(ConfigError::EmptySpecies { wave: i + 1 });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entry for a 1-based wave number, clamped to the last entry.
    /// Wave 0 is treated as wave 1.
    pub fn entry(&self, wave: u32) -> Option<&WaveSpec> {
        let index = (wave.saturating_sub(1) as usize).min(self.0.len().saturating_sub(1));
        self.0.get(index)
    }

    /// Deterministic expansion of a wave, in table order.
    pub fn composition(&self, wave: u32) -> Vec<Species> {
        let Some(spec) = self.entry(wave) else {
            return Vec::new();
        };
        if spec.species.is_empty() {
            return Vec::new();
        }
        (0..spec.count as usize)
            .map(|i| spec.species[i % spec.species.len()])
            .collect()
    }

    /// The species to spawn for `wave`, order shuffled per call.
    pub fn get_wave<R: Rng + ?Sized>(&self, wave: u32, rng: &mut R) -> Vec<Species> {
        let mut species = self.composition(wave);
        species.shuffle(rng);
        species
    }

    pub fn default_for(mode: GameMode) -> Self {
        use Species::*;
        let entries = match mode {
            GameMode::Hunt => vec![
                WaveSpec::new(2, &[Chaser]),
                WaveSpec::new(3, &[Chaser, Interceptor]),
                WaveSpec::new(4, &[Chaser, Phantom, Interceptor]),
                WaveSpec::new(5, &[Chaser, Bomber, Interceptor, Phantom]),
                WaveSpec::new(6, &[Dasher, Chaser, Bomber, Phantom, Interceptor]),
                WaveSpec::new(8, &[Dasher, Chaser, Bomber, Phantom, Interceptor, Chaser, Bomber]),
            ],
            GameMode::Shooter => vec![
                WaveSpec::new(3, &[Chaser, Splitter]),
                WaveSpec::new(4, &[Splitter, Chaser, Sniper]),
                WaveSpec::new(5, &[Splitter, Interceptor, Sniper, Chaser]),
                WaveSpec::new(6, &[Dasher, Splitter, Sniper, Chaser, Bomber]),
                WaveSpec::new(8, &[Dasher, Splitter, Sniper, Interceptor, Bomber, Phantom]),
            ],
        };
        Self(entries)
    }
}

// ============================================================================
// DEFERRED TASKS
// ============================================================================

/// Handle for a pending deferred task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Work the scheduler hands back when its delay elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Spawn one hunter at a viewport edge.
    Spawn(Species),
    /// Drop a random power-up pickup on the field.
    SpawnPickup,
    /// Begin the given wave.
    StartWave(u32),
}

#[derive(Debug, Clone, Copy)]
struct PendingTask {
    due_at: f64,
    task: Deferred,
}

/// Cancellable timer set driven by frame deltas.
#[derive(Debug, Default)]
pub struct SpawnScheduler {
    now: f64,
    next_id: u64,
    pending: HashMap<TimerId, PendingTask>,
}

impl SpawnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` after `delay` seconds of scheduler time.
    pub fn schedule(&mut self, delay: f32, task: Deferred) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert(
            id,
            PendingTask {
                due_at: self.now + delay.max(0.0) as f64,
                task,
            },
        );
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Drop every pending task. Returns how many were dropped.
    pub fn flush(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Advance the clock and return due tasks, earliest first.
    pub fn advance(&mut self, dt: f32) -> Vec<Deferred> {
        self.now += dt.max(0.0) as f64;
        let now = self.now;
        let mut due: Vec<(f64, TimerId)> = self
            .pending
            .iter()
            .filter(|(_, p)| p.due_at <= now)
            .map(|(id, p)| (p.due_at, *id))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        due.into_iter()
            .filter_map(|(_, id)| self.pending.remove(&id).map(|p| p.task))
            .collect()
    }

    /// Schedule every spawn of `wave`, staggered by `stagger` seconds.
    pub fn schedule_wave<R: Rng + ?Sized>(
        &mut self,
        table: &WaveTable,
        wave: u32,
        stagger: f32,
        with_pickup: bool,
        rng: &mut R,
    ) -> Vec<TimerId> {
        let mut ids: Vec<TimerId> = table
            .get_wave(wave, rng)
            .into_iter()
            .enumerate()
            .map(|(i, species)| self.schedule(stagger * i as f32, Deferred::Spawn(species)))
            .collect();
        if with_pickup {
            ids.push(self.schedule(stagger * ids.len() as f32, Deferred::SpawnPickup));
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    fn sorted(mut v: Vec<Species>) -> Vec<Species> {
        v.sort();
        v
    }

    #[test]
    fn test_single_entry_wave_returns_exactly_that_species() {
        let table = WaveTable::new(vec![WaveSpec::new(1, &[Species::Chaser])]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(table.get_wave(1, &mut rng), vec![Species::Chaser]);
    }

    #[rstest]
    #[case(5)]
    #[case(6)]
    #[case(10)]
    #[case(1000)]
    fn test_waves_past_the_table_reuse_the_last_entry(#[case] wave: u32) {
        let table = WaveTable::default_for(GameMode::Shooter);
        let last = table.len() as u32;
        assert!(wave >= last);
        let mut rng = StdRng::seed_from_u64(wave as u64);
        assert_eq!(table.entry(wave), table.entry(last));
        assert_eq!(
            sorted(table.get_wave(wave, &mut rng)),
            sorted(table.composition(last))
        );
    }

    #[test]
    fn test_first_wave_past_the_table_clamps_to_last_entry() {
        let table = WaveTable::new(vec![
            WaveSpec::new(2, &[Species::Chaser]),
            WaveSpec::new(3, &[Species::Sniper]),
        ])
        .unwrap();
        let n = table.len() as u32;
        assert_eq!(table.entry(1), Some(&WaveSpec::new(2, &[Species::Chaser])));
        assert_eq!(table.entry(n), Some(&WaveSpec::new(3, &[Species::Sniper])));
        assert_eq!(table.entry(n + 1), Some(&WaveSpec::new(3, &[Species::Sniper])));
        assert_eq!(table.composition(n + 1), vec![Species::Sniper; 3]);
    }

    #[test]
    fn test_composition_cycles_species() {
        let table = WaveTable::new(vec![WaveSpec::new(5, &[Species::Chaser, Species::Bomber])]).unwrap();
        assert_eq!(
            table.composition(1),
            vec![
                Species::Chaser,
                Species::Bomber,
                Species::Chaser,
                Species::Bomber,
                Species::Chaser
            ]
        );
    }

    #[test]
    fn test_wave_zero_is_wave_one() {
        let table = WaveTable::default_for(GameMode::Hunt);
        assert_eq!(table.composition(0), table.composition(1));
    }

    #[test]
    fn test_validation_rejects_bad_entries() {
        assert!(matches!(WaveTable::new(vec![]), Err(ConfigError::EmptyWaveTable)));
        assert!(matches!(
            WaveTable::new(vec![WaveSpec::new(1, &[Species::Chaser]), WaveSpec::new(0, &[Species::Chaser])]),
            Err(ConfigError::ZeroCount { wave: 2 })
        ));
        assert!(matches!(
            WaveTable::new(vec![WaveSpec::new(2, &[])]),
            Err(ConfigError::EmptySpecies { wave: 1 })
        ));
    }

    #[test]
    fn test_scheduler_fires_due_tasks_in_order() {
        let mut scheduler = SpawnScheduler::new();
        scheduler.schedule(0.2, Deferred::Spawn(Species::Sniper));
        scheduler.schedule(0.1, Deferred::Spawn(Species::Chaser));
        assert!(scheduler.advance(0.05).is_empty());
        assert_eq!(scheduler.advance(0.2), vec![
            Deferred::Spawn(Species::Chaser),
            Deferred::Spawn(Species::Sniper)
        ]);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_cancel_and_flush_drop_pending_tasks() {
        let mut scheduler = SpawnScheduler::new();
        let a = scheduler.schedule(0.1, Deferred::StartWave(2));
        scheduler.schedule(0.1, Deferred::SpawnPickup);
        scheduler.schedule(0.1, Deferred::Spawn(Species::Bomber));
        assert!(scheduler.cancel(a));
        assert!(!scheduler.cancel(a));
        assert_eq!(scheduler.flush(), 2);
        assert!(scheduler.advance(10.0).is_empty());
    }

    #[test]
    fn test_schedule_wave_staggers_spawns() {
        let table = WaveTable::new(vec![WaveSpec::new(3, &[Species::Chaser])]).unwrap();
        let mut scheduler = SpawnScheduler::new();
        let mut rng = StdRng::seed_from_u64(7);
        let ids = scheduler.schedule_wave(&table, 1, 0.5, true, &mut rng);
        assert_eq!(ids.len(), 4);
        assert_eq!(scheduler.advance(0.0).len(), 1);
        assert_eq!(scheduler.advance(0.5).len(), 1);
        assert_eq!(scheduler.advance(1.0).len(), 2);
    }
}
