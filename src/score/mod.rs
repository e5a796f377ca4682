// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! In-memory score.
//!
//! This module provides the score surface the playback model reads:
//! - Parts with instrument changes, mapped onto track indices
//! - Measures holding chord/rest positions and markings
//! - The repeat timeline and tick to timestamp conversion
//!
//! Tracks are numbered staff by staff, `VOICES` tracks per staff, in
//! part order.

pub mod measure;
pub mod part;
pub mod repeats;

use std::ops::Range;

pub use measure::{Annotation, AnnotationKind, Chord, ChordRest, Measure, Note, Rest, SegmentPosition};
pub use part::{Instrument, Part, PartId};
pub use repeats::{RepeatList, RepeatSegment};

use crate::error::ScoreError;
use crate::timing::{TempoMap, TimeSignature, Timestamp};

/// Voices per staff
pub const VOICES: usize = 4;

/// Reference to a score item for point playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRef {
    /// A whole chord or rest
    ChordRest { track: usize, tick: i32 },
    /// One note of a chord
    Note { track: usize, tick: i32, index: usize },
}

impl ItemRef {
    pub fn track(&self) -> usize {
        match self {
            ItemRef::ChordRest { track, .. } | ItemRef::Note { track, .. } => *track,
        }
    }

    pub fn tick(&self) -> i32 {
        match self {
            ItemRef::ChordRest { tick, .. } | ItemRef::Note { tick, .. } => *tick,
        }
    }
}

/// A score: parts, measures, tempo, and the derived repeat timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    title: String,
    parts: Vec<Part>,
    measures: Vec<Measure>,
    tempo: TempoMap,
    repeats: RepeatList,
}

impl Default for Score {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

impl Score {
    /// Create an empty score
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            parts: Vec::new(),
            measures: Vec::new(),
            tempo: TempoMap::default(),
            repeats: RepeatList::default(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    // --- parts and tracks ---

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Append a part; its tracks follow those of the existing parts
    pub fn add_part(&mut self, part: Part) {
        self.parts.push(part);
    }

    pub fn part_by_id(&self, id: PartId) -> Option<&Part> {
        self.parts.iter().find(|p| p.id() == id)
    }

    /// Remove a part and all its content
    pub fn remove_part(&mut self, id: PartId) -> Result<Part, ScoreError> {
        let tracks = self.track_range_of_part(id).ok_or(ScoreError::PartNotFound(id))?;
        let idx = self
            .parts
            .iter()
            .position(|p| p.id() == id)
            .ok_or(ScoreError::PartNotFound(id))?;

        // Drop the part's items and renumber the tracks after it
        let shift = tracks.len();
        let staff_shift = shift / VOICES;
        for measure in &mut self.measures {
            let positions: Vec<(i32, Vec<(usize, ChordRest)>)> = measure
                .positions()
                .iter()
                .map(|p| (p.tick(), p.elements().map(|(t, i)| (t, i.clone())).collect()))
                .collect();
            let annotations: Vec<(i32, Annotation)> = measure
                .positions()
                .iter()
                .flat_map(|p| p.annotations().iter().map(move |a| (p.tick(), *a)))
                .collect();

            let mut rebuilt = Measure::new(measure.tick(), measure.time_signature());
            rebuilt.set_repeat_start(measure.repeat_start());
            rebuilt.set_repeat_count(measure.repeat_count());
            for (tick, elements) in positions {
                for (track, item) in elements {
                    if tracks.contains(&track) {
                        continue;
                    }
                    let track = if track >= tracks.end { track - shift } else { track };
                    rebuilt.set_element(track, tick, item);
                }
            }
            for (tick, mut annotation) in annotations {
                let staff_range = tracks.start / VOICES..tracks.end / VOICES;
                if staff_range.contains(&annotation.staff) {
                    continue;
                }
                if annotation.staff >= staff_range.end {
                    annotation.staff -= staff_shift;
                }
                rebuilt.add_annotation(tick, annotation);
            }
            *measure = rebuilt;
        }

        Ok(self.parts.remove(idx))
    }

    /// Set a part's instrument from `tick` onward
    pub fn set_instrument(&mut self, part_id: PartId, tick: i32, instrument: Instrument) -> Result<(), ScoreError> {
        self.part_mut(part_id)?.set_instrument(tick, instrument);
        Ok(())
    }

    /// Remove an instrument from a part
    pub fn remove_instrument(&mut self, part_id: PartId, instrument_id: &str) -> Result<bool, ScoreError> {
        Ok(self.part_mut(part_id)?.remove_instrument(instrument_id))
    }

    fn part_mut(&mut self, id: PartId) -> Result<&mut Part, ScoreError> {
        self.parts
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or(ScoreError::PartNotFound(id))
    }

    /// Total number of tracks
    pub fn ntracks(&self) -> usize {
        self.parts.iter().map(|p| p.staves() * VOICES).sum()
    }

    /// Part that owns `track`
    pub fn part_for_track(&self, track: usize) -> Option<&Part> {
        let mut start = 0;
        for part in &self.parts {
            let end = start + part.staves() * VOICES;
            if track < end {
                return Some(part);
            }
            start = end;
        }
        None
    }

    /// Tracks owned by a part
    pub fn track_range_of_part(&self, id: PartId) -> Option<Range<usize>> {
        let mut start = 0;
        for part in &self.parts {
            let end = start + part.staves() * VOICES;
            if part.id() == id {
                return Some(start..end);
            }
            start = end;
        }
        None
    }

    /// Staves owned by a part
    pub fn staff_range_of_part(&self, id: PartId) -> Option<Range<usize>> {
        self.track_range_of_part(id)
            .map(|tracks| tracks.start / VOICES..tracks.end / VOICES)
    }

    /// Widen a track range to whole parts
    pub fn expand_to_parts(&self, tracks: Range<usize>) -> Range<usize> {
        let mut start = tracks.start;
        let mut end = tracks.end;
        let mut part_start = 0;
        for part in &self.parts {
            let part_end = part_start + part.staves() * VOICES;
            if part_start < tracks.end && part_end > tracks.start {
                start = start.min(part_start);
                end = end.max(part_end);
            }
            part_start = part_end;
        }
        start..end
    }

    // --- measures ---

    pub fn measures(&self) -> &[Measure] {
        &self.measures
    }

    /// Append `count` measures; returns their indices
    pub fn append_measures(&mut self, count: usize, time_signature: TimeSignature) -> Range<usize> {
        let first = self.measures.len();
        for _ in 0..count {
            let tick = self.end_tick();
            self.measures.push(Measure::new(tick, time_signature));
        }
        self.rebuild_repeats();
        first..self.measures.len()
    }

    /// Change a measure's time signature, shifting the measures after it
    pub fn set_time_signature(&mut self, index: usize, time_signature: TimeSignature) -> Result<(), ScoreError> {
        let measure = self
            .measures
            .get(index)
            .ok_or(ScoreError::MeasureOutOfRange(index))?;
        let longest = measure
            .positions()
            .iter()
            .flat_map(|p| p.elements().map(move |(_, item)| p.tick() + item.ticks()))
            .max()
            .unwrap_or(measure.tick());
        if longest > measure.tick() + time_signature.measure_ticks() {
            return Err(ScoreError::PositionOutsideMeasure {
                tick: measure.tick(),
                ticks: longest - measure.tick(),
            });
        }

        let mut rebuilt = Measure::new(measure.tick(), time_signature);
        rebuilt.set_repeat_start(measure.repeat_start());
        rebuilt.set_repeat_count(measure.repeat_count());
        for position in measure.positions() {
            for (track, item) in position.elements() {
                rebuilt.set_element(track, position.tick(), item.clone());
            }
            for annotation in position.annotations() {
                rebuilt.add_annotation(position.tick(), *annotation);
            }
        }
        self.measures[index] = rebuilt;

        let mut tick = self.measures[index].end_tick();
        for measure in &mut self.measures[index + 1..] {
            measure.move_to(tick);
            tick = measure.end_tick();
        }
        self.rebuild_repeats();
        Ok(())
    }

    /// Mark a measure as the start of a repeat
    pub fn set_repeat_start(&mut self, index: usize, start: bool) -> Result<(), ScoreError> {
        self.measures
            .get_mut(index)
            .ok_or(ScoreError::MeasureOutOfRange(index))?
            .set_repeat_start(start);
        self.rebuild_repeats();
        Ok(())
    }

    /// Close a repeat at a measure with a total play count (`None` removes it)
    pub fn set_repeat_end(&mut self, index: usize, count: Option<u32>) -> Result<(), ScoreError> {
        self.measures
            .get_mut(index)
            .ok_or(ScoreError::MeasureOutOfRange(index))?
            .set_repeat_count(count);
        self.rebuild_repeats();
        Ok(())
    }

    /// Measure containing `tick`
    pub fn measure_at(&self, tick: i32) -> Option<&Measure> {
        self.measure_index_at(tick).map(|idx| &self.measures[idx])
    }

    fn measure_index_at(&self, tick: i32) -> Option<usize> {
        let idx = self.measures.partition_point(|m| m.end_tick() <= tick);
        self.measures
            .get(idx)
            .filter(|m| m.contains_tick(tick))
            .map(|_| idx)
    }

    /// End of the last measure
    pub fn end_tick(&self) -> i32 {
        self.measures.last().map_or(0, Measure::end_tick)
    }

    // --- items and markings ---

    /// Item on `track` starting at `tick`
    pub fn element_at(&self, track: usize, tick: i32) -> Option<&ChordRest> {
        self.measure_at(tick)?.position_at(tick)?.element(track)
    }

    /// Place a chord or rest
    pub fn set_element(&mut self, track: usize, tick: i32, item: ChordRest) -> Result<(), ScoreError> {
        if track >= self.ntracks() {
            return Err(ScoreError::TrackOutOfRange(track));
        }
        let idx = self.measure_index_at(tick).ok_or(ScoreError::NoMeasureAt(tick))?;
        let measure = &mut self.measures[idx];
        if item.ticks() <= 0 || tick + item.ticks() > measure.end_tick() {
            return Err(ScoreError::PositionOutsideMeasure {
                tick,
                ticks: item.ticks(),
            });
        }
        measure.set_element(track, tick, item);
        Ok(())
    }

    /// Remove the item on `track` at `tick`
    pub fn remove_element(&mut self, track: usize, tick: i32) -> Result<Option<ChordRest>, ScoreError> {
        let idx = self.measure_index_at(tick).ok_or(ScoreError::NoMeasureAt(tick))?;
        Ok(self.measures[idx].remove_element(track, tick))
    }

    /// Attach a marking at `tick`
    pub fn add_annotation(&mut self, tick: i32, annotation: Annotation) -> Result<(), ScoreError> {
        if annotation.staff >= self.ntracks() / VOICES {
            return Err(ScoreError::TrackOutOfRange(annotation.staff * VOICES));
        }
        let idx = self.measure_index_at(tick).ok_or(ScoreError::NoMeasureAt(tick))?;
        self.measures[idx].add_annotation(tick, annotation);
        Ok(())
    }

    /// Remove every marking on `staff` at `tick`
    pub fn clear_annotations(&mut self, tick: i32, staff: usize) -> Result<(), ScoreError> {
        let idx = self.measure_index_at(tick).ok_or(ScoreError::NoMeasureAt(tick))?;
        self.measures[idx].clear_annotations(tick, staff);
        Ok(())
    }

    // --- time ---

    pub fn tempo_map(&self) -> &TempoMap {
        &self.tempo
    }

    /// Set the tempo from `tick` onward
    pub fn set_tempo(&mut self, tick: i32, bpm: f64) {
        self.tempo.set_tempo(tick, bpm);
        self.rebuild_repeats();
    }

    /// Replace the whole tempo map
    pub fn set_tempo_map(&mut self, tempo: TempoMap) {
        self.tempo = tempo;
        self.rebuild_repeats();
    }

    /// Repeat segments in performance order
    pub fn repeat_segments(&self) -> &[RepeatSegment] {
        self.repeats.segments()
    }

    pub fn repeat_list(&self) -> &RepeatList {
        &self.repeats
    }

    /// Timestamp of an unrolled tick
    pub fn timestamp_from_ticks(&self, utick: i32) -> Timestamp {
        self.repeats.utick_to_timestamp(utick)
    }

    fn rebuild_repeats(&mut self) {
        self.repeats = RepeatList::build(&self.measures, &self.tempo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_part_score() -> Score {
        let mut score = Score::new("Duo");
        score.add_part(Part::new(PartId(1), "Flute", 1).with_instrument(0, Instrument::new("flute", "flutes")));
        score.add_part(Part::new(PartId(2), "Piano", 2).with_instrument(0, Instrument::new("piano", "keyboards")));
        score.append_measures(2, TimeSignature::default());
        score
    }

    #[test]
    fn test_track_layout() {
        let score = two_part_score();
        assert_eq!(score.ntracks(), 12);
        assert_eq!(score.part_for_track(3).map(Part::id), Some(PartId(1)));
        assert_eq!(score.part_for_track(4).map(Part::id), Some(PartId(2)));
        assert_eq!(score.part_for_track(11).map(Part::id), Some(PartId(2)));
        assert!(score.part_for_track(12).is_none());
        assert_eq!(score.track_range_of_part(PartId(2)), Some(4..12));
        assert_eq!(score.staff_range_of_part(PartId(2)), Some(1..3));
    }

    #[test]
    fn test_expand_to_parts() {
        let score = two_part_score();
        assert_eq!(score.expand_to_parts(0..1), 0..4);
        assert_eq!(score.expand_to_parts(5..6), 4..12);
        assert_eq!(score.expand_to_parts(3..5), 0..12);
    }

    #[test]
    fn test_measure_lookup() {
        let score = two_part_score();
        assert_eq!(score.end_tick(), 3840);
        assert_eq!(score.measure_at(0).map(Measure::tick), Some(0));
        assert_eq!(score.measure_at(1920).map(Measure::tick), Some(1920));
        assert!(score.measure_at(3840).is_none());
    }

    #[test]
    fn test_set_element_validation() {
        let mut score = two_part_score();
        assert!(score.set_element(0, 0, ChordRest::chord(&[60], 480)).is_ok());
        assert_eq!(
            score.set_element(99, 0, ChordRest::rest(480)),
            Err(ScoreError::TrackOutOfRange(99))
        );
        assert_eq!(
            score.set_element(0, 5000, ChordRest::rest(480)),
            Err(ScoreError::NoMeasureAt(5000))
        );
        assert!(matches!(
            score.set_element(0, 1440, ChordRest::rest(960)),
            Err(ScoreError::PositionOutsideMeasure { .. })
        ));
        assert!(score.element_at(0, 0).is_some());
    }

    #[test]
    fn test_repeat_edits_rebuild_timeline() {
        let mut score = two_part_score();
        assert_eq!(score.repeat_segments().len(), 1);

        score.set_repeat_start(0, true).unwrap();
        score.set_repeat_end(1, Some(2)).unwrap();
        assert_eq!(score.repeat_segments().len(), 2);
        assert_eq!(score.timestamp_from_ticks(3840), 4_000_000);

        score.set_repeat_end(1, None).unwrap();
        assert_eq!(score.repeat_segments().len(), 1);
        assert!(score.set_repeat_end(7, Some(2)).is_err());
    }

    #[test]
    fn test_tempo_edit_changes_timestamps() {
        let mut score = two_part_score();
        assert_eq!(score.timestamp_from_ticks(1920), 2_000_000);
        score.set_tempo(0, 60.0);
        assert_eq!(score.timestamp_from_ticks(1920), 4_000_000);
    }

    #[test]
    fn test_set_time_signature_shifts_following_measures() {
        let mut score = two_part_score();
        score.set_element(0, 1920, ChordRest::chord(&[62], 480)).unwrap();

        score
            .set_time_signature(0, TimeSignature::new(3, 4).unwrap())
            .unwrap();
        assert_eq!(score.measures()[1].tick(), 1440);
        assert!(score.element_at(0, 1440).is_some());
        assert_eq!(score.end_tick(), 3360);
    }

    #[test]
    fn test_remove_part_renumbers_tracks() {
        let mut score = two_part_score();
        score.set_element(0, 0, ChordRest::chord(&[72], 480)).unwrap();
        score.set_element(4, 0, ChordRest::chord(&[48], 480)).unwrap();
        score.add_annotation(0, Annotation::dynamic(1, crate::events::DynamicType::P)).unwrap();

        let removed = score.remove_part(PartId(1)).unwrap();
        assert_eq!(removed.name(), "Flute");
        assert_eq!(score.ntracks(), 8);
        assert_eq!(score.element_at(0, 0), Some(&ChordRest::chord(&[48], 480)));

        let position = score.measure_at(0).unwrap().position_at(0).unwrap();
        assert_eq!(position.annotations()[0].staff, 0);
        assert_eq!(score.remove_part(PartId(1)), Err(ScoreError::PartNotFound(PartId(1))));
    }

    #[test]
    fn test_instrument_edits() {
        let mut score = two_part_score();
        score
            .set_instrument(PartId(1), 1920, Instrument::new("piccolo", "flutes"))
            .unwrap();
        assert_eq!(score.part_by_id(PartId(1)).unwrap().instrument_id(2000), Some("piccolo"));

        assert_eq!(score.remove_instrument(PartId(1), "piccolo"), Ok(true));
        assert_eq!(score.remove_instrument(PartId(9), "piccolo"), Err(ScoreError::PartNotFound(PartId(9))));
    }
}
