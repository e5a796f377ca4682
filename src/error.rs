// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error types for score editing and playback queries.

use thiserror::Error;

use crate::score::PartId;

/// Errors returned by playback lookups
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// No track has been rendered for this part/instrument pair
    #[error("no playback data for part {part_id}, instrument '{instrument_id}'")]
    TrackNotFound {
        part_id: PartId,
        instrument_id: String,
    },
}

/// Errors returned by score edits
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    #[error("no measure contains tick {0}")]
    NoMeasureAt(i32),

    #[error("track {0} is outside the score")]
    TrackOutOfRange(usize),

    #[error("part {0} not found")]
    PartNotFound(PartId),

    #[error("measure index {0} out of range")]
    MeasureOutOfRange(usize),

    #[error("invalid time signature: {0}")]
    InvalidTimeSignature(String),

    /// An element would extend past the end of its measure
    #[error("element at tick {tick} with length {ticks} does not fit in its measure")]
    PositionOutsideMeasure { tick: i32, ticks: i32 },
}
