// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Repeat unrolling.
//!
//! The unrolled timeline is a list of repeat segments. Each segment is a
//! contiguous run of measures played once, placed at an unrolled tick
//! (`utick`). A measure inside a repeat appears in as many segments as the
//! repeat is played.

use std::ops::Range;

use super::measure::Measure;
use crate::timing::{TempoChange, TempoMap, Timestamp};

/// One pass through a contiguous run of measures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatSegment {
    /// Nominal start tick
    pub tick: i32,
    /// Start tick in the unrolled timeline
    pub utick: i32,
    /// Length in ticks
    pub len: i32,
    /// Indices into the score's measures
    pub measures: Range<usize>,
}

impl RepeatSegment {
    /// Nominal end tick (exclusive)
    pub fn end_tick(&self) -> i32 {
        self.tick + self.len
    }

    /// Offset from nominal ticks to unrolled ticks
    pub fn offset(&self) -> i32 {
        self.utick - self.tick
    }

    pub fn contains_tick(&self, tick: i32) -> bool {
        tick >= self.tick && tick < self.end_tick()
    }

    /// Whether the nominal span intersects `[from, to)`
    pub fn intersects(&self, from: i32, to: i32) -> bool {
        self.tick < to && self.end_tick() > from
    }
}

/// Repeat segments plus the tempo map over unrolled ticks
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatList {
    segments: Vec<RepeatSegment>,
    unrolled_tempo: TempoMap,
}

impl Default for RepeatList {
    fn default() -> Self {
        Self {
            segments: Vec::new(),
            unrolled_tempo: TempoMap::default(),
        }
    }
}

impl RepeatList {
    /// Unroll the repeat barlines of `measures`.
    ///
    /// A measure with a repeat count closes a repeat that started at the
    /// most recent repeat-start measure (or right after the previous repeat
    /// end, or at the beginning of the score).
    pub fn build(measures: &[Measure], tempo: &TempoMap) -> Self {
        let mut runs: Vec<Range<usize>> = Vec::new();
        let mut run_start = 0;
        let mut section_start = 0;

        for (idx, measure) in measures.iter().enumerate() {
            if measure.repeat_start() {
                section_start = idx;
            }
            if let Some(count) = measure.repeat_count() {
                runs.push(run_start..idx + 1);
                for _ in 1..count {
                    runs.push(section_start..idx + 1);
                }
                run_start = idx + 1;
                section_start = idx + 1;
            }
        }
        if run_start < measures.len() {
            runs.push(run_start..measures.len());
        }

        let mut segments = Vec::with_capacity(runs.len());
        let mut utick = 0;
        for run in runs {
            let tick = measures[run.start].tick();
            let len = measures[run.end - 1].end_tick() - tick;
            segments.push(RepeatSegment {
                tick,
                utick,
                len,
                measures: run,
            });
            utick += len;
        }

        let unrolled_tempo = Self::unroll_tempo(&segments, tempo);
        Self {
            segments,
            unrolled_tempo,
        }
    }

    fn unroll_tempo(segments: &[RepeatSegment], tempo: &TempoMap) -> TempoMap {
        let mut changes = Vec::new();
        for segment in segments {
            changes.push(TempoChange::new(segment.utick, tempo.tempo_at(segment.tick)));
            changes.extend(
                tempo
                    .changes()
                    .iter()
                    .filter(|c| c.tick > segment.tick && c.tick < segment.end_tick())
                    .map(|c| TempoChange::new(c.tick + segment.offset(), c.bpm)),
            );
        }
        if changes.is_empty() {
            return tempo.clone();
        }
        TempoMap::from_changes(changes)
    }

    pub fn segments(&self) -> &[RepeatSegment] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepeatSegment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// First segment that plays `tick`
    pub fn segment_containing(&self, tick: i32) -> Option<&RepeatSegment> {
        self.segments.iter().find(|s| s.contains_tick(tick))
    }

    /// End of the unrolled timeline
    pub fn unrolled_end_tick(&self) -> i32 {
        self.segments.last().map_or(0, |s| s.utick + s.len)
    }

    /// Timestamp of an unrolled tick
    pub fn utick_to_timestamp(&self, utick: i32) -> Timestamp {
        self.unrolled_tempo.tick_to_micros(utick)
    }
}
