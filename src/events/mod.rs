// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback events produced for each track.
//!
//! Events are a closed set of variants. Only note events carry a pitch,
//! so pitch lookups go through [`PlaybackEvent::pitch_level`] and every
//! consumer matches the variants exhaustively.

pub mod timeline;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use timeline::{EventTimeline, RenderTarget};

pub use crate::timing::Timestamp;

/// Events sharing a single timestamp, in insertion order
pub type PlaybackEventList = Vec<PlaybackEvent>;

/// Slice of a timeline, as published to subscribers
pub type PlaybackEventsMap = BTreeMap<Timestamp, PlaybackEventList>;

/// Pitch units per semitone
pub const PITCH_LEVEL_STEP: i32 = 50;

/// Nominal pitch level of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PitchLevel(pub i32);

impl PitchLevel {
    /// Pitch level for a MIDI note number
    pub fn from_midi(note: u8) -> Self {
        PitchLevel(note as i32 * PITCH_LEVEL_STEP)
    }
}

/// One percent of dynamic level
pub const ONE_PERCENT: u16 = 100;

/// Dynamic level in hundredths of a percent (0..=10000)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DynamicLevel(pub u16);

impl DynamicLevel {
    pub const MAX: DynamicLevel = DynamicLevel(100 * ONE_PERCENT);

    /// Level used when no dynamic marking is in effect (mezzo-forte)
    pub const NATURAL: DynamicLevel = DynamicLevel(50 * ONE_PERCENT);

    /// Apply a signed offset, clamping to the valid range
    pub fn offset(self, delta: i32) -> Self {
        let level = (self.0 as i32 + delta).clamp(0, Self::MAX.0 as i32);
        DynamicLevel(level as u16)
    }
}

impl Default for DynamicLevel {
    fn default() -> Self {
        Self::NATURAL
    }
}

/// Dynamic markings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicType {
    Ppp,
    Pp,
    P,
    Mp,
    Mf,
    F,
    Ff,
    Fff,
}

impl DynamicType {
    /// Nominal level for this marking
    pub fn level(self) -> DynamicLevel {
        let level = match self {
            DynamicType::Ppp => 1250,
            DynamicType::Pp => 2500,
            DynamicType::P => 3750,
            DynamicType::Mp => 4375,
            DynamicType::Mf => 5000,
            DynamicType::F => 6250,
            DynamicType::Ff => 7500,
            DynamicType::Fff => 8750,
        };
        DynamicLevel(level)
    }
}

/// Articulation and playing technique types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticulationType {
    /// Ordinary playing
    Standard,
    Staccato,
    Staccatissimo,
    Tenuto,
    Accent,
    Marcato,
    Legato,
    Pizzicato,
    Mute,
    Open,
    Tremolo,
}

impl Default for ArticulationType {
    fn default() -> Self {
        ArticulationType::Standard
    }
}

/// A sounding note
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteEvent {
    /// Start of the note
    pub timestamp: Timestamp,
    /// Sounding duration in microseconds, after articulation shaping
    pub duration: i64,
    /// Notated duration in microseconds
    pub nominal_duration: i64,
    pub pitch_level: PitchLevel,
    /// Dynamic in effect from the performance context
    pub nominal_dynamic_level: DynamicLevel,
    /// Dynamic after articulation shaping
    pub expression_level: DynamicLevel,
    pub articulation: ArticulationType,
}

/// A notated rest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestEvent {
    pub timestamp: Timestamp,
    pub duration: i64,
}

/// A metronome click
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetronomeEvent {
    pub timestamp: Timestamp,
    pub duration: i64,
    /// Downbeat of a measure
    pub accented: bool,
}

/// Any event in a track timeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlaybackEvent {
    Note(NoteEvent),
    Rest(RestEvent),
    Metronome(MetronomeEvent),
}

impl PlaybackEvent {
    /// Start of the event
    pub fn timestamp(&self) -> Timestamp {
        match self {
            PlaybackEvent::Note(note) => note.timestamp,
            PlaybackEvent::Rest(rest) => rest.timestamp,
            PlaybackEvent::Metronome(click) => click.timestamp,
        }
    }

    /// Nominal pitch, for note events only
    pub fn pitch_level(&self) -> Option<PitchLevel> {
        match self {
            PlaybackEvent::Note(note) => Some(note.pitch_level),
            PlaybackEvent::Rest(_) | PlaybackEvent::Metronome(_) => None,
        }
    }

    pub fn as_note(&self) -> Option<&NoteEvent> {
        match self {
            PlaybackEvent::Note(note) => Some(note),
            PlaybackEvent::Rest(_) | PlaybackEvent::Metronome(_) => None,
        }
    }
}
