// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Score change notifications.

use tokio::sync::mpsc;

use crate::score::Score;

/// Region of the score touched by an edit; both ranges are half-open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreChangesRange {
    pub tick_from: i32,
    pub tick_to: i32,
    pub track_from: usize,
    pub track_to: usize,
}

impl ScoreChangesRange {
    pub fn new(tick_from: i32, tick_to: i32, track_from: usize, track_to: usize) -> Self {
        Self {
            tick_from,
            tick_to,
            track_from,
            track_to,
        }
    }

    /// Every tick and track of `score`
    pub fn full(score: &Score) -> Self {
        Self::new(0, score.end_tick(), 0, score.ntracks())
    }

    pub fn is_empty(&self) -> bool {
        self.tick_from >= self.tick_to || self.track_from >= self.track_to
    }
}

/// Sending half of the change channel, held by score editors
#[derive(Debug, Clone)]
pub struct ChangesSender(mpsc::UnboundedSender<ScoreChangesRange>);

impl ChangesSender {
    /// Report an edit; returns false once the model is gone
    pub fn notify(&self, tick_from: i32, tick_to: i32, track_from: usize, track_to: usize) -> bool {
        self.send(ScoreChangesRange::new(tick_from, tick_to, track_from, track_to))
    }

    pub fn send(&self, range: ScoreChangesRange) -> bool {
        self.0.send(range).is_ok()
    }
}

/// Receiving half of the change channel, owned by the playback model
pub type ChangesReceiver = mpsc::UnboundedReceiver<ScoreChangesRange>;

/// Create a connected sender and receiver
pub fn changes_channel() -> (ChangesSender, ChangesReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChangesSender(tx), rx)
}
