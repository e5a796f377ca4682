// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Event rendering.
//!
//! A renderer turns one chord or rest, together with the performance
//! state in effect, into playback events written to a track timeline.
//! It also renders metronome clicks for a position.

pub mod nominal;

use crate::articulation::ArticulationsProfile;
use crate::events::{ArticulationType, DynamicLevel, RenderTarget};
use crate::score::{ChordRest, Score, SegmentPosition};

pub use nominal::NominalRenderer;

/// Performance state passed to the renderer for one item
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    /// Offset from nominal ticks to unrolled ticks for the current repeat pass
    pub tick_offset: i32,
    /// Dynamic level in effect
    pub dynamic_level: DynamicLevel,
    /// Persistent articulation in effect
    pub articulation: ArticulationType,
}

/// Trait for event renderer implementations
pub trait EventRenderer: Send + Sync {
    /// Render one chord or rest at `position` into `target`
    fn render(
        &self,
        score: &Score,
        position: &SegmentPosition,
        item: &ChordRest,
        context: &RenderContext,
        profile: &ArticulationsProfile,
        target: &mut RenderTarget<'_>,
    );

    /// Render metronome output for the position starting at `tick` and lasting `duration` ticks
    fn render_metronome(
        &self,
        score: &Score,
        tick: i32,
        duration: i32,
        tick_offset: i32,
        target: &mut RenderTarget<'_>,
    );
}
