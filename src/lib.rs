// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! scoreplay: per-track playback events rendered from a score.
//!
//! A [`PlaybackModel`] renders every (part, instrument) track of a
//! [`Score`] into a timestamp-ordered event timeline, re-renders the
//! regions named by change notifications, and publishes the changed
//! slices on per-track broadcast streams.

pub mod articulation;
pub mod config;
pub mod error;
pub mod events;
pub mod playback;
pub mod render;
pub mod score;
pub mod timing;

pub use error::{PlaybackError, ScoreError};
pub use events::{PlaybackEvent, PlaybackEventsMap, Timestamp};
pub use playback::{
    changes_channel, shared_score, ChangesReceiver, ChangesSender, PlaybackModel, ScoreChangesRange, SharedScore,
    TrackKey, TrackLifecycleEvent, TrackPlaybackData,
};
pub use score::{ItemRef, Score};
