// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Playback model.
//!
//! The model keeps one rendered event timeline per (part, instrument)
//! track plus a metronome track. It:
//! - Renders the whole score on load
//! - Re-renders the region named by each change notification
//! - Drops tracks whose part or instrument left the score
//! - Publishes the changed timestamps of each track to subscribers
//! - Replays a single item on demand

pub mod changes;
pub mod context;
pub mod track;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Range;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

pub use changes::{changes_channel, ChangesReceiver, ChangesSender, ScoreChangesRange};
pub use context::PerformanceContext;
pub use track::{TrackChangeSet, TrackKey, TrackLifecycleEvent, TrackPlaybackData};

use crate::articulation::ProfileSelector;
use crate::config::PlaybackSettings;
use crate::error::PlaybackError;
use crate::events::{PlaybackEventList, PlaybackEventsMap, RenderTarget, Timestamp};
use crate::render::{EventRenderer, NominalRenderer, RenderContext};
use crate::score::{ItemRef, Note, Part, PartId, Score};

/// Score shared between editors and the playback model
pub type SharedScore = Arc<RwLock<Score>>;

/// Wrap a score for sharing
pub fn shared_score(score: Score) -> SharedScore {
    Arc::new(RwLock::new(score))
}

/// Capacity of the track lifecycle channel
const LIFECYCLE_CAPACITY: usize = 64;

/// Per-track playback timelines kept in sync with a score
pub struct PlaybackModel {
    score: Option<SharedScore>,
    changes: Option<ChangesReceiver>,
    renderer: Box<dyn EventRenderer>,
    profiles: ProfileSelector,
    settings: PlaybackSettings,
    events: HashMap<TrackKey, TrackPlaybackData>,
    contexts: HashMap<TrackKey, PerformanceContext>,
    lifecycle: broadcast::Sender<TrackLifecycleEvent>,
}

impl Default for PlaybackModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackModel {
    /// Create an unloaded model with the nominal renderer and built-in profiles
    pub fn new() -> Self {
        let (lifecycle, _) = broadcast::channel(LIFECYCLE_CAPACITY);
        Self {
            score: None,
            changes: None,
            renderer: Box::new(NominalRenderer::new()),
            profiles: ProfileSelector::default(),
            settings: PlaybackSettings::default(),
            events: HashMap::new(),
            contexts: HashMap::new(),
            lifecycle,
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn EventRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_profiles(mut self, profiles: ProfileSelector) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn with_settings(mut self, settings: PlaybackSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    /// Bind a score and its change notifications, then render everything.
    ///
    /// A previously bound receiver and every recorded marking are dropped
    /// first.
    pub fn load(&mut self, score: SharedScore, changes: ChangesReceiver) {
        self.changes = None;
        self.contexts.clear();
        let full = {
            let guard = score.read().unwrap_or_else(PoisonError::into_inner);
            ScoreChangesRange::full(&guard)
        };
        self.score = Some(score);
        self.changes = Some(changes);

        info!(
            ticks = full.tick_to,
            tracks = full.track_to,
            "loading score into playback model"
        );
        self.apply_changes(full);
    }

    /// Whether a score is bound
    pub fn is_loaded(&self) -> bool {
        self.score.is_some()
    }

    // --- change processing ---

    /// Process every queued change notification; returns how many were handled
    pub fn process_pending_changes(&mut self) -> usize {
        let mut processed = 0;
        while let Some(range) = self.changes.as_mut().and_then(|rx| rx.try_recv().ok()) {
            self.apply_changes(range);
            processed += 1;
        }
        processed
    }

    /// Wait for the next change notification and process it.
    ///
    /// Returns false when no score is bound or every sender is gone.
    pub async fn next_change(&mut self) -> bool {
        let Some(rx) = self.changes.as_mut() else {
            return false;
        };
        let received = rx.recv().await;
        match received {
            Some(range) => {
                self.apply_changes(range);
                true
            }
            None => false,
        }
    }

    /// Expire, purge, re-render, and publish one notification
    fn apply_changes(&mut self, range: ScoreChangesRange) {
        let Some(shared) = self.score.clone() else {
            warn!(?range, "change notification without a loaded score");
            return;
        };
        let score = shared.read().unwrap_or_else(PoisonError::into_inner);

        self.clear_expired_contexts(&score);
        self.clear_expired_events(&score);

        let tracks = score.expand_to_parts(range.track_from..range.track_to);
        let range = ScoreChangesRange::new(range.tick_from, range.tick_to, tracks.start, tracks.end);

        let mut changes = TrackChangeSet::new();
        self.purge_stale(&score, &range, &mut changes);
        self.sweep(&score, &range, Some(&mut changes));
        self.notify_about_changes(&changes);
    }

    /// Re-render `range` without purging or publishing.
    ///
    /// Dirty timestamps are added to `changes` when given.
    pub fn update(&mut self, range: ScoreChangesRange, changes: Option<&mut TrackChangeSet>) {
        let Some(shared) = self.score.clone() else {
            return;
        };
        let score = shared.read().unwrap_or_else(PoisonError::into_inner);
        self.sweep(&score, &range, changes);
    }

    /// Remove events and markings in the invalidated span of every affected track
    fn purge_stale(&mut self, score: &Score, range: &ScoreChangesRange, changes: &mut TrackChangeSet) {
        let parts: HashSet<PartId> = (range.track_from..range.track_to.min(score.ntracks()))
            .filter_map(|track| score.part_for_track(track))
            .map(Part::id)
            .collect();

        let mut spans: Vec<Range<Timestamp>> = score
            .repeat_segments()
            .iter()
            .filter(|segment| segment.intersects(range.tick_from, range.tick_to))
            .map(|segment| {
                let from = range.tick_from.max(segment.tick) + segment.offset();
                let to = range.tick_to.min(segment.end_tick()) + segment.offset();
                score.timestamp_from_ticks(from)..score.timestamp_from_ticks(to)
            })
            .collect();
        // Anything past the end is left over from a longer score
        if range.tick_to >= score.end_tick() {
            let end = score.timestamp_from_ticks(score.repeat_list().unrolled_end_tick());
            spans.push(end..Timestamp::MAX);
        }

        for (key, data) in self.events.iter_mut() {
            if !key.is_metronome() && !parts.contains(&key.part_id) {
                continue;
            }
            for span in &spans {
                for timestamp in data.origin_events_mut().remove_range(span.clone()) {
                    changes.record(key.clone(), timestamp);
                }
            }
        }

        // The sweep records again whatever markings are still in the score
        for (key, context) in self.contexts.iter_mut() {
            if parts.contains(&key.part_id) {
                context.clear_range(range.tick_from..range.tick_to);
            }
        }
    }

    /// Walk the repeat timeline over `range` and render every item found
    fn sweep(&mut self, score: &Score, range: &ScoreChangesRange, mut changes: Option<&mut TrackChangeSet>) {
        let capacity = self.settings.channel_capacity;
        let metronome = TrackKey::metronome();
        let track_to = range.track_to.min(score.ntracks());
        let mut written: HashMap<TrackKey, BTreeSet<Timestamp>> = HashMap::new();
        let mut rendered = 0usize;

        for segment in score.repeat_segments() {
            if !segment.intersects(range.tick_from, range.tick_to) {
                continue;
            }
            let offset = segment.offset();

            for measure in &score.measures()[segment.measures.clone()] {
                if measure.end_tick() <= range.tick_from || measure.tick() >= range.tick_to {
                    continue;
                }

                for position in measure.positions() {
                    let tick = position.tick();
                    if tick < range.tick_from || tick >= range.tick_to || !position.is_chord_rest_type() {
                        continue;
                    }
                    let timestamp = score.timestamp_from_ticks(tick + offset);

                    for track in range.track_from..track_to {
                        let Some(item) = position.element(track) else {
                            continue;
                        };
                        let Some(part) = score.part_for_track(track) else {
                            continue;
                        };
                        let Some(instrument) = part.instrument_at(tick) else {
                            continue;
                        };
                        let Some(profile) = self.profiles.profile_by_instrument(&instrument.family_id) else {
                            error!(
                                part = %part.id(),
                                instrument = %instrument.id,
                                family = %instrument.family_id,
                                "no articulation profile for instrument family, skipping item"
                            );
                            continue;
                        };

                        let key = TrackKey::new(part.id(), instrument.id.clone());
                        let context = self
                            .contexts
                            .entry(key.clone())
                            .or_insert_with(|| PerformanceContext::new(part.id()));
                        context.update(score, position, tick);
                        let render_context = RenderContext {
                            tick_offset: offset,
                            dynamic_level: context.nominal_dynamic_level(tick),
                            articulation: context.persistent_articulation_type(tick),
                        };

                        let data = track_entry(&mut self.events, &self.lifecycle, &key, capacity);
                        let stamps = written.entry(key.clone()).or_default();
                        let mut target = RenderTarget::new(data.origin_events_mut(), stamps);
                        self.renderer
                            .render(score, position, item, &render_context, &profile, &mut target);

                        if let Some(changes) = changes.as_deref_mut() {
                            changes.record(key, timestamp);
                        }
                        rendered += 1;
                    }

                    if self.settings.metronome {
                        let data = track_entry(&mut self.events, &self.lifecycle, &metronome, capacity);
                        let stamps = written.entry(metronome.clone()).or_default();
                        let mut target = RenderTarget::new(data.origin_events_mut(), stamps);
                        self.renderer
                            .render_metronome(score, tick, position.ticks(), offset, &mut target);
                    }
                }
            }
        }

        debug!(
            tick_from = range.tick_from,
            tick_to = range.tick_to,
            track_from = range.track_from,
            track_to = range.track_to,
            items = rendered,
            tracks = written.len(),
            "sweep complete"
        );

        if let Some(changes) = changes {
            for (key, stamps) in written {
                for timestamp in stamps {
                    changes.record(key.clone(), timestamp);
                }
            }
        }
    }

    /// Publish the current events at every dirty timestamp
    fn notify_about_changes(&self, changes: &TrackChangeSet) {
        for (key, stamps) in changes.iter() {
            let Some(data) = self.events.get(key) else {
                continue;
            };
            if stamps.is_empty() {
                continue;
            }
            let slice = data.origin_events().slice(stamps);
            let receivers = data.send_main(slice);
            debug!(track = %key, timestamps = stamps.len(), receivers, "published changes");
        }
    }

    // --- expiry ---

    /// Drop timelines whose part or instrument is gone from `score`
    pub fn clear_expired_events(&mut self, score: &Score) {
        let expired: Vec<TrackKey> = self
            .events
            .keys()
            .filter(|key| is_expired(score, key))
            .cloned()
            .collect();

        for key in expired {
            self.events.remove(&key);
            info!(track = %key, "track removed");
            let _ = self.lifecycle.send(TrackLifecycleEvent::Removed(key));
        }
    }

    /// Drop performance contexts whose part or instrument is gone from `score`
    pub fn clear_expired_contexts(&mut self, score: &Score) {
        self.contexts.retain(|key, _| !is_expired(score, key));
    }

    // --- queries ---

    /// Rendered data of one track
    pub fn track_playback_data(
        &self,
        part_id: PartId,
        instrument_id: &str,
    ) -> Result<&TrackPlaybackData, PlaybackError> {
        self.events
            .get(&TrackKey::new(part_id, instrument_id))
            .ok_or_else(|| PlaybackError::TrackNotFound {
                part_id,
                instrument_id: instrument_id.to_string(),
            })
    }

    /// Rendered data of the metronome track
    pub fn metronome_playback_data(&self) -> Result<&TrackPlaybackData, PlaybackError> {
        let key = TrackKey::metronome();
        self.events
            .get(&key)
            .ok_or(PlaybackError::TrackNotFound {
                part_id: key.part_id,
                instrument_id: key.instrument_id,
            })
    }

    /// Keys of every rendered track, in order
    pub fn track_keys(&self) -> Vec<TrackKey> {
        let mut keys: Vec<TrackKey> = self.events.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Subscribe to track creation and removal
    pub fn track_events(&self) -> broadcast::Receiver<TrackLifecycleEvent> {
        self.lifecycle.subscribe()
    }

    /// Performance context of one track, if it has been rendered
    pub fn performance_context(&self, key: &TrackKey) -> Option<&PerformanceContext> {
        self.contexts.get(key)
    }

    // --- point playback ---

    /// Publish the rendered notes of one item on its track's off stream.
    ///
    /// Rests, unknown tracks, and items with nothing rendered are ignored.
    pub fn trigger_events_for_item(&self, item: ItemRef) {
        let Some(shared) = self.score.as_ref() else {
            warn!(?item, "trigger without a loaded score");
            return;
        };
        let score = shared.read().unwrap_or_else(PoisonError::into_inner);
        let (track, tick) = (item.track(), item.tick());

        let Some(chord_rest) = score.element_at(track, tick) else {
            error!(track, tick, "trigger for an item that is not in the score");
            return;
        };
        if !chord_rest.is_playable() {
            return;
        }
        let notes: Vec<Note> = match item {
            ItemRef::ChordRest { .. } => chord_rest.notes().to_vec(),
            ItemRef::Note { index, .. } => match chord_rest.notes().get(index) {
                Some(note) => vec![*note],
                None => {
                    error!(track, tick, index, "trigger for a note that is not in the chord");
                    return;
                }
            },
        };

        let Some(part) = score.part_for_track(track) else {
            return;
        };
        let Some(instrument_id) = part.instrument_id(tick) else {
            return;
        };
        let key = TrackKey::new(part.id(), instrument_id);
        let Some(data) = self.events.get(&key) else {
            warn!(track = %key, "trigger for a track with no playback data");
            return;
        };
        let Some(segment) = score.repeat_list().segment_containing(tick) else {
            return;
        };
        let timestamp = score.timestamp_from_ticks(tick + segment.offset());
        let Some(events) = data.origin_events().get(timestamp) else {
            warn!(track = %key, timestamp, "trigger found no events");
            return;
        };

        let matches: PlaybackEventList = notes
            .iter()
            .filter_map(|note| {
                events
                    .iter()
                    .find(|event| event.pitch_level() == Some(note.pitch_level()))
                    .cloned()
            })
            .collect();
        if matches.is_empty() {
            return;
        }

        let slice: PlaybackEventsMap = BTreeMap::from([(timestamp, matches)]);
        data.send_off(slice);
    }
}

/// Track data for `key`, created on first use
fn track_entry<'a>(
    events: &'a mut HashMap<TrackKey, TrackPlaybackData>,
    lifecycle: &broadcast::Sender<TrackLifecycleEvent>,
    key: &TrackKey,
    capacity: usize,
) -> &'a mut TrackPlaybackData {
    events.entry(key.clone()).or_insert_with(|| {
        info!(track = %key, "track added");
        let _ = lifecycle.send(TrackLifecycleEvent::Added(key.clone()));
        TrackPlaybackData::new(capacity)
    })
}

/// A track expires when its part is gone or no longer holds its instrument
fn is_expired(score: &Score, key: &TrackKey) -> bool {
    if key.is_metronome() {
        return false;
    }
    match score.part_by_id(key.part_id) {
        Some(part) => !part.contains_instrument(&key.instrument_id),
        None => true,
    }
}
