// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for scoreplay.
//!
//! This module provides data structures for loading score descriptions
//! from YAML and playback settings from TOML.

pub mod watcher;

pub use watcher::{ScoreFileEvent, ScoreWatcher};

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::events::{ArticulationType, DynamicType};
use crate::score::{Annotation, ChordRest, Instrument, Part, PartId, Score};
use crate::timing::{TempoChange, TempoMap, TimeSignature, DEFAULT_TEMPO};

/// Root of a score description file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreFile {
    /// Score title
    #[serde(default = "default_title")]
    pub title: String,
    /// Initial tempo in BPM
    #[serde(default = "default_tempo")]
    pub tempo: f64,
    /// Later tempo changes
    #[serde(default)]
    pub tempo_changes: Vec<TempoChange>,
    /// Parts in track order
    #[serde(default)]
    pub parts: Vec<PartConfig>,
    /// Measures in order
    #[serde(default)]
    pub measures: Vec<MeasureConfig>,
}

fn default_title() -> String {
    "Untitled".to_string()
}
fn default_tempo() -> f64 {
    DEFAULT_TEMPO
}

impl ScoreFile {
    /// Load a score description from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read score file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse a score description from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML score")
    }

    /// Serialize to a YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize score to YAML")
    }

    /// Save to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write score file: {:?}", path.as_ref()))
    }

    /// Build the in-memory score
    pub fn to_score(&self) -> Result<Score> {
        let mut score = Score::new(self.title.clone());

        let mut tempo = TempoMap::new(self.tempo);
        for change in &self.tempo_changes {
            tempo.set_tempo(change.tick, change.bpm);
        }
        score.set_tempo_map(tempo);

        for part in &self.parts {
            let mut built = Part::new(PartId(part.id), part.name.clone(), part.staves);
            for instrument in &part.instruments {
                built.set_instrument(
                    instrument.tick,
                    Instrument::new(instrument.id.clone(), instrument.family.clone()),
                );
            }
            score.add_part(built);
        }

        for (number, measure) in self.measures.iter().enumerate().map(|(i, m)| (i + 1, m)) {
            let time_signature: TimeSignature = measure
                .time_signature
                .parse()
                .with_context(|| format!("Measure {}", number))?;
            let index = score.append_measures(1, time_signature).start;
            let start = score.measures()[index].tick();

            if measure.repeat_start {
                score.set_repeat_start(index, true)?;
            }
            if measure.repeat_count.is_some() {
                score.set_repeat_end(index, measure.repeat_count)?;
            }

            for voice in &measure.voices {
                let mut tick = start + voice.offset;
                for item in &voice.items {
                    score
                        .set_element(voice.track, tick, item.to_chord_rest())
                        .with_context(|| format!("Measure {}, track {}", number, voice.track))?;
                    tick += item.duration;
                }
            }

            for marking in &measure.annotations {
                let tick = start + marking.offset;
                if let Some(dynamic) = marking.dynamic {
                    score
                        .add_annotation(tick, Annotation::dynamic(marking.staff, dynamic))
                        .with_context(|| format!("Measure {}, staff {}", number, marking.staff))?;
                }
                if let Some(technique) = marking.technique {
                    score
                        .add_annotation(tick, Annotation::technique(marking.staff, technique))
                        .with_context(|| format!("Measure {}, staff {}", number, marking.staff))?;
                }
            }
        }

        Ok(score)
    }
}

/// Part definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartConfig {
    /// Stable part identifier
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// Number of staves
    #[serde(default = "default_staves")]
    pub staves: usize,
    /// Instrument changes; the first one applies from the start
    #[serde(default)]
    pub instruments: Vec<InstrumentConfig>,
}

fn default_staves() -> usize {
    1
}

/// Instrument change within a part
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentConfig {
    /// Tick where the instrument takes over
    #[serde(default)]
    pub tick: i32,
    /// Instrument identifier (e.g. "flute")
    pub id: String,
    /// Instrument family identifier (e.g. "flutes")
    pub family: String,
}

/// Measure definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasureConfig {
    /// Time signature as "n/d"
    #[serde(default = "default_time_signature")]
    pub time_signature: String,
    /// A repeat starts at this measure
    #[serde(default)]
    pub repeat_start: bool,
    /// Total play count when a repeat ends at this measure
    #[serde(default)]
    pub repeat_count: Option<u32>,
    #[serde(default)]
    pub voices: Vec<VoiceConfig>,
    #[serde(default)]
    pub annotations: Vec<AnnotationConfig>,
}

fn default_time_signature() -> String {
    "4/4".to_string()
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            time_signature: default_time_signature(),
            repeat_start: false,
            repeat_count: None,
            voices: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

/// Consecutive items on one track of a measure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VoiceConfig {
    /// Track index
    pub track: usize,
    /// Ticks from the measure start to the first item
    #[serde(default)]
    pub offset: i32,
    pub items: Vec<ItemConfig>,
}

/// A chord, or a rest when `notes` is empty
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemConfig {
    /// MIDI pitches
    #[serde(default)]
    pub notes: Vec<u8>,
    /// Length in ticks
    pub duration: i32,
    #[serde(default)]
    pub articulations: Vec<ArticulationType>,
}

impl ItemConfig {
    fn to_chord_rest(&self) -> ChordRest {
        if self.notes.is_empty() {
            return ChordRest::rest(self.duration);
        }
        self.articulations
            .iter()
            .fold(ChordRest::chord(&self.notes, self.duration), |item, articulation| {
                item.with_articulation(*articulation)
            })
    }
}

/// Dynamic and/or technique marking on a staff
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotationConfig {
    /// Ticks from the measure start
    #[serde(default)]
    pub offset: i32,
    #[serde(default)]
    pub staff: usize,
    #[serde(default)]
    pub dynamic: Option<DynamicType>,
    #[serde(default)]
    pub technique: Option<ArticulationType>,
}

/// Playback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Buffered slices per track stream before slow subscribers lag
    pub channel_capacity: usize,
    /// Render the metronome track
    pub metronome: bool,
    /// Quiet period before a changed score file is reloaded
    pub watch_debounce_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            metronome: true,
            watch_debounce_ms: 300,
        }
    }
}

impl PlaybackSettings {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read settings file: {:?}", path.as_ref()))?;
        Self::from_toml(&contents)
    }

    /// Parse settings from a TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML settings")
    }
}
