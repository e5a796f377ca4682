// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Measures, segment positions, and the chords and rests they hold.

use std::collections::BTreeMap;

use crate::events::{ArticulationType, DynamicType, PitchLevel};
use crate::timing::TimeSignature;

/// A single notated pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// MIDI note number
    pub pitch: u8,
}

impl Note {
    pub fn new(pitch: u8) -> Self {
        Self { pitch: pitch.min(127) }
    }

    /// Nominal pitch level used to match rendered events
    pub fn pitch_level(&self) -> PitchLevel {
        PitchLevel::from_midi(self.pitch)
    }
}

/// Notes sounding together in one voice
#[derive(Debug, Clone, PartialEq)]
pub struct Chord {
    pub notes: Vec<Note>,
    /// Notated length in ticks
    pub ticks: i32,
    /// Articulation marks on the chord itself
    pub articulations: Vec<ArticulationType>,
}

/// A notated rest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rest {
    pub ticks: i32,
}

/// Content of one track at one position
#[derive(Debug, Clone, PartialEq)]
pub enum ChordRest {
    Chord(Chord),
    Rest(Rest),
}

impl ChordRest {
    /// Chord of the given MIDI pitches
    pub fn chord(pitches: &[u8], ticks: i32) -> Self {
        ChordRest::Chord(Chord {
            notes: pitches.iter().map(|p| Note::new(*p)).collect(),
            ticks,
            articulations: Vec::new(),
        })
    }

    pub fn rest(ticks: i32) -> Self {
        ChordRest::Rest(Rest { ticks })
    }

    /// Add an articulation mark (no effect on rests)
    pub fn with_articulation(mut self, articulation: ArticulationType) -> Self {
        if let ChordRest::Chord(chord) = &mut self {
            chord.articulations.push(articulation);
        }
        self
    }

    /// Notated length in ticks
    pub fn ticks(&self) -> i32 {
        match self {
            ChordRest::Chord(chord) => chord.ticks,
            ChordRest::Rest(rest) => rest.ticks,
        }
    }

    /// Only chords produce sound
    pub fn is_playable(&self) -> bool {
        matches!(self, ChordRest::Chord(_))
    }

    pub fn notes(&self) -> &[Note] {
        match self {
            ChordRest::Chord(chord) => &chord.notes,
            ChordRest::Rest(_) => &[],
        }
    }
}

/// Kind of marking attached to a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// Dynamic marking (sticky until the next one)
    Dynamic(DynamicType),
    /// Playing technique (sticky until the next one)
    Technique(ArticulationType),
}

/// A marking on one staff at a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub staff: usize,
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn dynamic(staff: usize, dynamic: DynamicType) -> Self {
        Self {
            staff,
            kind: AnnotationKind::Dynamic(dynamic),
        }
    }

    pub fn technique(staff: usize, technique: ArticulationType) -> Self {
        Self {
            staff,
            kind: AnnotationKind::Technique(technique),
        }
    }
}

/// A time position inside a measure with the items starting there
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPosition {
    tick: i32,
    /// Distance to the next position or the measure end
    ticks: i32,
    elements: BTreeMap<usize, ChordRest>,
    annotations: Vec<Annotation>,
}

impl SegmentPosition {
    fn new(tick: i32) -> Self {
        Self {
            tick,
            ticks: 0,
            elements: BTreeMap::new(),
            annotations: Vec::new(),
        }
    }

    pub fn tick(&self) -> i32 {
        self.tick
    }

    pub fn ticks(&self) -> i32 {
        self.ticks
    }

    /// Item on `track`, if any
    pub fn element(&self, track: usize) -> Option<&ChordRest> {
        self.elements.get(&track)
    }

    /// Items by track
    pub fn elements(&self) -> impl Iterator<Item = (usize, &ChordRest)> {
        self.elements.iter().map(|(track, item)| (*track, item))
    }

    /// Whether any track has a chord or rest here
    pub fn is_chord_rest_type(&self) -> bool {
        !self.elements.is_empty()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.annotations.is_empty()
    }
}

/// A measure with its positions in tick order
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    tick: i32,
    time_signature: TimeSignature,
    positions: Vec<SegmentPosition>,
    repeat_start: bool,
    /// Total play count when this measure ends a repeat
    repeat_count: Option<u32>,
}

impl Measure {
    pub(crate) fn new(tick: i32, time_signature: TimeSignature) -> Self {
        Self {
            tick,
            time_signature,
            positions: Vec::new(),
            repeat_start: false,
            repeat_count: None,
        }
    }

    pub fn tick(&self) -> i32 {
        self.tick
    }

    pub fn ticks(&self) -> i32 {
        self.time_signature.measure_ticks()
    }

    pub fn end_tick(&self) -> i32 {
        self.tick + self.ticks()
    }

    pub fn time_signature(&self) -> TimeSignature {
        self.time_signature
    }

    pub fn contains_tick(&self, tick: i32) -> bool {
        tick >= self.tick && tick < self.end_tick()
    }

    /// Positions in ascending tick order
    pub fn positions(&self) -> &[SegmentPosition] {
        &self.positions
    }

    pub fn position_at(&self, tick: i32) -> Option<&SegmentPosition> {
        self.positions
            .binary_search_by_key(&tick, |p| p.tick)
            .ok()
            .map(|idx| &self.positions[idx])
    }

    pub fn repeat_start(&self) -> bool {
        self.repeat_start
    }

    /// Play count when this measure closes a repeat (two or more)
    pub fn repeat_count(&self) -> Option<u32> {
        self.repeat_count.filter(|count| *count >= 2)
    }

    pub(crate) fn set_repeat_start(&mut self, start: bool) {
        self.repeat_start = start;
    }

    pub(crate) fn set_repeat_count(&mut self, count: Option<u32>) {
        self.repeat_count = count;
    }

    pub(crate) fn move_to(&mut self, tick: i32) {
        let delta = tick - self.tick;
        self.tick = tick;
        for position in &mut self.positions {
            position.tick += delta;
        }
    }

    fn position_mut_or_insert(&mut self, tick: i32) -> &mut SegmentPosition {
        let idx = match self.positions.binary_search_by_key(&tick, |p| p.tick) {
            Ok(idx) => idx,
            Err(idx) => {
                self.positions.insert(idx, SegmentPosition::new(tick));
                idx
            }
        };
        &mut self.positions[idx]
    }

    pub(crate) fn set_element(&mut self, track: usize, tick: i32, item: ChordRest) {
        self.position_mut_or_insert(tick).elements.insert(track, item);
        self.refresh_positions();
    }

    pub(crate) fn remove_element(&mut self, track: usize, tick: i32) -> Option<ChordRest> {
        let idx = self.positions.binary_search_by_key(&tick, |p| p.tick).ok()?;
        let removed = self.positions[idx].elements.remove(&track);
        self.refresh_positions();
        removed
    }

    pub(crate) fn add_annotation(&mut self, tick: i32, annotation: Annotation) {
        let position = self.position_mut_or_insert(tick);
        // One marking of each kind per staff
        position.annotations.retain(|a| {
            a.staff != annotation.staff
                || std::mem::discriminant(&a.kind) != std::mem::discriminant(&annotation.kind)
        });
        position.annotations.push(annotation);
        self.refresh_positions();
    }

    pub(crate) fn clear_annotations(&mut self, tick: i32, staff: usize) {
        if let Ok(idx) = self.positions.binary_search_by_key(&tick, |p| p.tick) {
            self.positions[idx].annotations.retain(|a| a.staff != staff);
        }
        self.refresh_positions();
    }

    /// Drop empty positions and recompute position lengths
    fn refresh_positions(&mut self) {
        self.positions.retain(|p| !p.is_empty());
        let end = self.end_tick();
        let next_ticks: Vec<i32> = self
            .positions
            .iter()
            .skip(1)
            .map(|p| p.tick)
            .chain(std::iter::once(end))
            .collect();
        for (position, next) in self.positions.iter_mut().zip(next_ticks) {
            position.ticks = next - position.tick;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure() -> Measure {
        Measure::new(1920, TimeSignature::default())
    }

    #[test]
    fn test_measure_span() {
        let m = measure();
        assert_eq!(m.ticks(), 1920);
        assert_eq!(m.end_tick(), 3840);
        assert!(m.contains_tick(1920));
        assert!(!m.contains_tick(3840));
    }

    #[test]
    fn test_positions_sorted_with_lengths() {
        let mut m = measure();
        m.set_element(0, 2880, ChordRest::rest(960));
        m.set_element(0, 1920, ChordRest::chord(&[60], 960));

        let ticks: Vec<_> = m.positions().iter().map(|p| (p.tick(), p.ticks())).collect();
        assert_eq!(ticks, vec![(1920, 960), (2880, 960)]);
    }

    #[test]
    fn test_remove_element_drops_empty_position() {
        let mut m = measure();
        m.set_element(0, 1920, ChordRest::chord(&[60], 480));
        m.set_element(1, 2400, ChordRest::chord(&[64], 480));

        assert!(m.remove_element(1, 2400).is_some());
        assert_eq!(m.positions().len(), 1);
        assert_eq!(m.positions()[0].ticks(), 1920);
        assert!(m.remove_element(1, 2400).is_none());
    }

    #[test]
    fn test_annotation_replaces_same_kind() {
        let mut m = measure();
        m.set_element(0, 1920, ChordRest::chord(&[60], 480));
        m.add_annotation(1920, Annotation::dynamic(0, DynamicType::P));
        m.add_annotation(1920, Annotation::dynamic(0, DynamicType::Ff));
        m.add_annotation(1920, Annotation::technique(0, ArticulationType::Pizzicato));

        let position = m.position_at(1920).unwrap();
        assert_eq!(position.annotations().len(), 2);
        assert!(position
            .annotations()
            .contains(&Annotation::dynamic(0, DynamicType::Ff)));

        m.clear_annotations(1920, 0);
        assert!(m.position_at(1920).unwrap().annotations().is_empty());
    }

    #[test]
    fn test_move_to_shifts_positions() {
        let mut m = measure();
        m.set_element(0, 2400, ChordRest::rest(480));
        m.move_to(0);
        assert_eq!(m.tick(), 0);
        assert_eq!(m.positions()[0].tick(), 480);
    }

    #[test]
    fn test_repeat_count_requires_two_plays() {
        let mut m = measure();
        m.set_repeat_count(Some(1));
        assert_eq!(m.repeat_count(), None);
        m.set_repeat_count(Some(3));
        assert_eq!(m.repeat_count(), Some(3));
    }

    #[test]
    fn test_chord_rest_accessors() {
        let chord = ChordRest::chord(&[60, 64, 67], 480).with_articulation(ArticulationType::Staccato);
        assert!(chord.is_playable());
        assert_eq!(chord.notes().len(), 3);
        assert_eq!(chord.ticks(), 480);

        let rest = ChordRest::rest(240).with_articulation(ArticulationType::Accent);
        assert!(!rest.is_playable());
        assert!(rest.notes().is_empty());
    }
}
