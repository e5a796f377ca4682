// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Nominal renderer: notated timing shaped by articulation patterns.

use crate::articulation::ArticulationsProfile;
use crate::events::{MetronomeEvent, NoteEvent, PlaybackEvent, RenderTarget, RestEvent};
use crate::score::{ChordRest, Score, SegmentPosition};

use super::{EventRenderer, RenderContext};

/// Renders chords note by note at their notated position.
///
/// Durations come from the tempo map; the articulation pattern scales the
/// sounding duration and offsets the expression level.
#[derive(Debug, Clone, Copy, Default)]
pub struct NominalRenderer;

impl NominalRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl EventRenderer for NominalRenderer {
    fn render(
        &self,
        score: &Score,
        position: &SegmentPosition,
        item: &ChordRest,
        context: &RenderContext,
        profile: &ArticulationsProfile,
        target: &mut RenderTarget<'_>,
    ) {
        let utick = position.tick() + context.tick_offset;
        let timestamp = score.timestamp_from_ticks(utick);
        let nominal_duration = score.timestamp_from_ticks(utick + item.ticks()) - timestamp;

        match item {
            ChordRest::Rest(_) => {
                target.insert(
                    timestamp,
                    PlaybackEvent::Rest(RestEvent {
                        timestamp,
                        duration: nominal_duration,
                    }),
                );
            }
            ChordRest::Chord(chord) => {
                // A mark on the chord wins over the sticky technique
                let articulation = chord
                    .articulations
                    .first()
                    .copied()
                    .unwrap_or(context.articulation);
                let pattern = profile.pattern(articulation);
                let duration = (nominal_duration as f64 * pattern.duration_factor).round() as i64;
                let expression_level = context.dynamic_level.offset(pattern.dynamic_offset);

                target.claim(timestamp);
                for note in &chord.notes {
                    target.insert(
                        timestamp,
                        PlaybackEvent::Note(NoteEvent {
                            timestamp,
                            duration,
                            nominal_duration,
                            pitch_level: note.pitch_level(),
                            nominal_dynamic_level: context.dynamic_level,
                            expression_level,
                            articulation,
                        }),
                    );
                }
            }
        }
    }

    fn render_metronome(
        &self,
        score: &Score,
        tick: i32,
        duration: i32,
        tick_offset: i32,
        target: &mut RenderTarget<'_>,
    ) {
        let Some(measure) = score.measure_at(tick) else {
            return;
        };
        let beat = measure.time_signature().beat_ticks();
        let beat_offset = tick - measure.tick();
        if beat_offset % beat != 0 {
            return;
        }

        let length = if duration > 0 { beat.min(duration) } else { beat };
        let utick = tick + tick_offset;
        let timestamp = score.timestamp_from_ticks(utick);
        target.insert(
            timestamp,
            PlaybackEvent::Metronome(MetronomeEvent {
                timestamp,
                duration: score.timestamp_from_ticks(utick + length) - timestamp,
                accented: beat_offset == 0,
            }),
        );
    }
}
