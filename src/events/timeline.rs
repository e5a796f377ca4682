// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Ordered event timeline and the write handle renderers use.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use super::{PlaybackEvent, PlaybackEventList, PlaybackEventsMap, Timestamp};

/// Timestamp-ordered events for one track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTimeline {
    events: BTreeMap<Timestamp, PlaybackEventList>,
}

impl EventTimeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Events at `timestamp`, if any
    pub fn get(&self, timestamp: Timestamp) -> Option<&[PlaybackEvent]> {
        self.events.get(&timestamp).map(Vec::as_slice)
    }

    /// Append an event at `timestamp`
    pub fn insert(&mut self, timestamp: Timestamp, event: PlaybackEvent) {
        self.events.entry(timestamp).or_default().push(event);
    }

    /// Remove every event at `timestamp`
    pub fn remove(&mut self, timestamp: Timestamp) -> Option<PlaybackEventList> {
        self.events.remove(&timestamp)
    }

    /// Remove every timestamp in `range`, returning the removed timestamps
    pub fn remove_range(&mut self, range: Range<Timestamp>) -> Vec<Timestamp> {
        if range.start >= range.end {
            return Vec::new();
        }
        let removed: Vec<Timestamp> = self.events.range(range).map(|(ts, _)| *ts).collect();
        for ts in &removed {
            self.events.remove(ts);
        }
        removed
    }

    /// Copy of the events at the given timestamps; absent timestamps map to an empty list
    pub fn slice<'a>(&self, timestamps: impl IntoIterator<Item = &'a Timestamp>) -> PlaybackEventsMap {
        timestamps
            .into_iter()
            .map(|ts| (*ts, self.events.get(ts).cloned().unwrap_or_default()))
            .collect()
    }

    /// Iterate in timestamp order
    pub fn iter(&self) -> impl Iterator<Item = (&Timestamp, &PlaybackEventList)> {
        self.events.iter()
    }

    /// All timestamps in order
    pub fn timestamps(&self) -> impl Iterator<Item = Timestamp> + '_ {
        self.events.keys().copied()
    }

    /// Number of distinct timestamps
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total number of events across all timestamps
    pub fn event_count(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }
}

/// Write access to a timeline for the duration of one update pass.
///
/// The first write to a timestamp within a pass replaces whatever the
/// timeline held there; later writes in the same pass append.
pub struct RenderTarget<'a> {
    timeline: &'a mut EventTimeline,
    written: &'a mut BTreeSet<Timestamp>,
}

impl<'a> RenderTarget<'a> {
    /// Wrap a timeline with the set of timestamps already written this pass
    pub fn new(timeline: &'a mut EventTimeline, written: &'a mut BTreeSet<Timestamp>) -> Self {
        Self { timeline, written }
    }

    /// Take ownership of `timestamp` for this pass, clearing stale events on first claim
    pub fn claim(&mut self, timestamp: Timestamp) {
        if self.written.insert(timestamp) {
            self.timeline.remove(timestamp);
        }
    }

    /// Write an event
    pub fn insert(&mut self, timestamp: Timestamp, event: PlaybackEvent) {
        self.claim(timestamp);
        self.timeline.insert(timestamp, event);
    }

    /// Read back what is currently at `timestamp`
    pub fn get(&self, timestamp: Timestamp) -> Option<&[PlaybackEvent]> {
        self.timeline.get(timestamp)
    }
}
