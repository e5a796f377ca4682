// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Tempo map for tick to timestamp conversion.
//!
//! Tempo changes are stored at tick positions; a tick is converted to
//! microseconds by integrating over every tempo span that precedes it.

use serde::{Deserialize, Serialize};

use super::{Timestamp, DIVISION};

/// Default tempo in BPM (quarter note beats)
pub const DEFAULT_TEMPO: f64 = 120.0;

/// A tempo change at a tick position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    /// Tick where the tempo takes effect
    pub tick: i32,
    /// Tempo in quarter-note BPM
    pub bpm: f64,
}

impl TempoChange {
    /// Create a new tempo change
    pub fn new(tick: i32, bpm: f64) -> Self {
        Self {
            tick,
            bpm: clamp_bpm(bpm),
        }
    }

    /// Microseconds per tick at this tempo
    fn micros_per_tick(&self) -> f64 {
        60_000_000.0 / self.bpm / DIVISION as f64
    }
}

fn clamp_bpm(bpm: f64) -> f64 {
    bpm.clamp(1.0, 999.0)
}

/// Piecewise-constant tempo over ticks
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    /// Sorted by tick, always starting at tick 0
    changes: Vec<TempoChange>,
}

impl Default for TempoMap {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPO)
    }
}

impl TempoMap {
    /// Create a tempo map with a single tempo
    pub fn new(bpm: f64) -> Self {
        Self {
            changes: vec![TempoChange::new(0, bpm)],
        }
    }

    /// Build a tempo map from an unordered list of changes.
    ///
    /// If no change sits at tick 0 the default tempo is assumed there.
    pub fn from_changes(changes: impl IntoIterator<Item = TempoChange>) -> Self {
        let mut map = Self::default();
        for change in changes {
            map.set_tempo(change.tick, change.bpm);
        }
        map
    }

    /// Set the tempo from `tick` onward (replacing any change at that tick)
    pub fn set_tempo(&mut self, tick: i32, bpm: f64) {
        let tick = tick.max(0);
        let change = TempoChange::new(tick, bpm);
        match self.changes.binary_search_by_key(&tick, |c| c.tick) {
            Ok(idx) => self.changes[idx] = change,
            Err(idx) => self.changes.insert(idx, change),
        }
    }

    /// Remove the tempo change at `tick`. The change at tick 0 is reset to the default instead.
    pub fn remove_tempo(&mut self, tick: i32) {
        if let Ok(idx) = self.changes.binary_search_by_key(&tick, |c| c.tick) {
            if idx == 0 {
                self.changes[0] = TempoChange::new(0, DEFAULT_TEMPO);
            } else {
                self.changes.remove(idx);
            }
        }
    }

    /// Tempo in effect at `tick`
    pub fn tempo_at(&self, tick: i32) -> f64 {
        self.change_at(tick).bpm
    }

    fn change_at(&self, tick: i32) -> &TempoChange {
        let idx = match self.changes.binary_search_by_key(&tick, |c| c.tick) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        &self.changes[idx]
    }

    /// All tempo changes in tick order
    pub fn changes(&self) -> &[TempoChange] {
        &self.changes
    }

    /// Convert a tick to microseconds from the start
    pub fn tick_to_micros(&self, tick: i32) -> Timestamp {
        if tick <= 0 {
            return 0;
        }

        let mut micros = 0.0;
        for (idx, change) in self.changes.iter().enumerate() {
            if change.tick >= tick {
                break;
            }
            let span_end = self
                .changes
                .get(idx + 1)
                .map_or(tick, |next| next.tick.min(tick));
            micros += (span_end - change.tick) as f64 * change.micros_per_tick();
        }

        micros.round() as Timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tempo() {
        let map = TempoMap::default();
        assert_eq!(map.tempo_at(0), 120.0);
        assert_eq!(map.changes().len(), 1);
    }

    #[test]
    fn test_tick_to_micros_constant_tempo() {
        let map = TempoMap::new(120.0);
        // One quarter at 120 BPM = 500ms
        assert_eq!(map.tick_to_micros(DIVISION), 500_000);
        // One 4/4 measure = 2s
        assert_eq!(map.tick_to_micros(DIVISION * 4), 2_000_000);
        assert_eq!(map.tick_to_micros(0), 0);
        assert_eq!(map.tick_to_micros(-10), 0);
    }

    #[test]
    fn test_tick_to_micros_with_tempo_change() {
        let mut map = TempoMap::new(120.0);
        map.set_tempo(DIVISION * 4, 60.0);

        // First measure at 120 BPM, then one quarter at 60 BPM = 1s
        assert_eq!(map.tick_to_micros(DIVISION * 4), 2_000_000);
        assert_eq!(map.tick_to_micros(DIVISION * 5), 3_000_000);
        assert_eq!(map.tempo_at(DIVISION * 4 - 1), 120.0);
        assert_eq!(map.tempo_at(DIVISION * 4), 60.0);
    }

    #[test]
    fn test_set_tempo_replaces_existing() {
        let mut map = TempoMap::default();
        map.set_tempo(480, 90.0);
        map.set_tempo(480, 100.0);
        assert_eq!(map.changes().len(), 2);
        assert_eq!(map.tempo_at(500), 100.0);
    }

    #[test]
    fn test_remove_tempo() {
        let mut map = TempoMap::new(80.0);
        map.set_tempo(960, 140.0);
        map.remove_tempo(960);
        assert_eq!(map.tempo_at(2000), 80.0);

        map.remove_tempo(0);
        assert_eq!(map.tempo_at(0), DEFAULT_TEMPO);
    }

    #[test]
    fn test_from_changes_unordered() {
        let map = TempoMap::from_changes(vec![
            TempoChange::new(1920, 60.0),
            TempoChange::new(0, 120.0),
        ]);
        assert_eq!(map.changes()[0].tick, 0);
        assert_eq!(map.changes()[1].tick, 1920);
    }

    #[test]
    fn test_bpm_clamped() {
        let change = TempoChange::new(0, 0.0);
        assert_eq!(change.bpm, 1.0);
    }
}
