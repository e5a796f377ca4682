// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Per-track playback data and change bookkeeping.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tokio::sync::broadcast;

use crate::events::{EventTimeline, PlaybackEventsMap, Timestamp};
use crate::score::PartId;

/// Part id reserved for the metronome track
pub const METRONOME_PART_ID: PartId = PartId(999);

/// Instrument id of the metronome track
pub const METRONOME_INSTRUMENT_ID: &str = "metronome";

/// Identity of a playback track: one instrument of one part
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackKey {
    pub part_id: PartId,
    pub instrument_id: String,
}

impl TrackKey {
    pub fn new(part_id: PartId, instrument_id: impl Into<String>) -> Self {
        Self {
            part_id,
            instrument_id: instrument_id.into(),
        }
    }

    /// Key of the metronome track
    pub fn metronome() -> Self {
        Self::new(METRONOME_PART_ID, METRONOME_INSTRUMENT_ID)
    }

    pub fn is_metronome(&self) -> bool {
        self.part_id == METRONOME_PART_ID && self.instrument_id == METRONOME_INSTRUMENT_ID
    }
}

impl fmt::Display for TrackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.part_id, self.instrument_id)
    }
}

/// Rendered events of one track and its output streams
#[derive(Debug)]
pub struct TrackPlaybackData {
    origin_events: EventTimeline,
    /// Slices changed by score updates
    main_stream: broadcast::Sender<PlaybackEventsMap>,
    /// One-shot slices from item triggers
    off_stream: broadcast::Sender<PlaybackEventsMap>,
}

impl TrackPlaybackData {
    /// Create empty track data with streams of the given capacity
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (main_stream, _) = broadcast::channel(capacity);
        let (off_stream, _) = broadcast::channel(capacity);
        Self {
            origin_events: EventTimeline::new(),
            main_stream,
            off_stream,
        }
    }

    /// Full rendered timeline
    pub fn origin_events(&self) -> &EventTimeline {
        &self.origin_events
    }

    pub(crate) fn origin_events_mut(&mut self) -> &mut EventTimeline {
        &mut self.origin_events
    }

    /// Subscribe to changed slices
    pub fn subscribe_main(&self) -> broadcast::Receiver<PlaybackEventsMap> {
        self.main_stream.subscribe()
    }

    /// Subscribe to triggered slices
    pub fn subscribe_off(&self) -> broadcast::Receiver<PlaybackEventsMap> {
        self.off_stream.subscribe()
    }

    /// Publish on the main stream; returns the number of receivers reached
    pub(crate) fn send_main(&self, slice: PlaybackEventsMap) -> usize {
        // No receivers is not an error
        self.main_stream.send(slice).unwrap_or(0)
    }

    /// Publish on the off stream; returns the number of receivers reached
    pub(crate) fn send_off(&self, slice: PlaybackEventsMap) -> usize {
        self.off_stream.send(slice).unwrap_or(0)
    }
}

/// Track creation and removal notices
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackLifecycleEvent {
    Added(TrackKey),
    Removed(TrackKey),
}

/// Dirty timestamps per track collected during one update pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackChangeSet {
    changes: BTreeMap<TrackKey, BTreeSet<Timestamp>>,
}

impl TrackChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `timestamp` dirty on `key`
    pub fn record(&mut self, key: TrackKey, timestamp: Timestamp) {
        self.changes.entry(key).or_default().insert(timestamp);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrackKey, &BTreeSet<Timestamp>)> {
        self.changes.iter()
    }

    /// Dirty timestamps of one track
    pub fn timestamps(&self, key: &TrackKey) -> Option<&BTreeSet<Timestamp>> {
        self.changes.get(key)
    }

    /// Tracks with changes
    pub fn keys(&self) -> impl Iterator<Item = &TrackKey> {
        self.changes.keys()
    }

    /// Number of tracks with changes
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PlaybackEvent, RestEvent};

    #[test]
    fn test_metronome_key() {
        let key = TrackKey::metronome();
        assert!(key.is_metronome());
        assert!(!TrackKey::new(PartId(999), "piano").is_metronome());
        assert_eq!(key.to_string(), "999/metronome");
    }

    #[test]
    fn test_send_without_receivers() {
        let data = TrackPlaybackData::new(4);
        assert_eq!(data.send_main(PlaybackEventsMap::new()), 0);
    }

    #[test]
    fn test_subscribers_receive_slices() {
        let data = TrackPlaybackData::new(4);
        let mut main = data.subscribe_main();
        let mut off = data.subscribe_off();

        let rest = PlaybackEvent::Rest(RestEvent {
            timestamp: 0,
            duration: 10,
        });
        let slice: PlaybackEventsMap = [(0, vec![rest])].into_iter().collect();
        assert_eq!(data.send_main(slice.clone()), 1);

        assert_eq!(main.try_recv().unwrap(), slice);
        assert!(off.try_recv().is_err());
    }

    #[test]
    fn test_change_set_deduplicates() {
        let mut changes = TrackChangeSet::new();
        let key = TrackKey::new(PartId(1), "flute");
        changes.record(key.clone(), 500);
        changes.record(key.clone(), 0);
        changes.record(key.clone(), 500);

        assert_eq!(changes.len(), 1);
        let stamps: Vec<_> = changes.timestamps(&key).unwrap().iter().copied().collect();
        assert_eq!(stamps, vec![0, 500]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let data = TrackPlaybackData::new(0);
        let mut rx = data.subscribe_main();
        data.send_main(PlaybackEventsMap::new());
        assert!(rx.try_recv().is_ok());
    }
}
