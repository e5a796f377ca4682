// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Sticky performance state for one track.

use std::collections::BTreeMap;
use std::ops::Range;

use crate::events::{ArticulationType, DynamicLevel};
use crate::score::{AnnotationKind, PartId, Score, SegmentPosition};

/// Dynamic and technique markings seen so far on one track, by tick.
///
/// A marking stays in effect until the next marking of the same kind.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceContext {
    part_id: PartId,
    dynamics: BTreeMap<i32, DynamicLevel>,
    techniques: BTreeMap<i32, ArticulationType>,
}

impl PerformanceContext {
    pub fn new(part_id: PartId) -> Self {
        Self {
            part_id,
            dynamics: BTreeMap::new(),
            techniques: BTreeMap::new(),
        }
    }

    pub fn part_id(&self) -> PartId {
        self.part_id
    }

    /// Record the markings at `position` that belong to this part's staves.
    ///
    /// Markings no longer present at `tick` are forgotten.
    pub fn update(&mut self, score: &Score, position: &SegmentPosition, tick: i32) {
        let staves = score.staff_range_of_part(self.part_id).unwrap_or(0..0);

        let mut dynamic = None;
        let mut technique = None;
        for annotation in position.annotations() {
            if !staves.contains(&annotation.staff) {
                continue;
            }
            match annotation.kind {
                AnnotationKind::Dynamic(kind) => dynamic = Some(kind.level()),
                AnnotationKind::Technique(kind) => technique = Some(kind),
            }
        }

        match dynamic {
            Some(level) => self.dynamics.insert(tick, level),
            None => self.dynamics.remove(&tick),
        };
        match technique {
            Some(kind) => self.techniques.insert(tick, kind),
            None => self.techniques.remove(&tick),
        };
    }

    /// Dynamic in effect at `tick` (mezzo-forte before any marking)
    pub fn nominal_dynamic_level(&self, tick: i32) -> DynamicLevel {
        self.dynamics
            .range(..=tick)
            .next_back()
            .map(|(_, level)| *level)
            .unwrap_or_default()
    }

    /// Technique in effect at `tick`
    pub fn persistent_articulation_type(&self, tick: i32) -> ArticulationType {
        self.techniques
            .range(..=tick)
            .next_back()
            .map(|(_, kind)| *kind)
            .unwrap_or_default()
    }

    /// Forget the markings recorded in `ticks`
    pub fn clear_range(&mut self, ticks: Range<i32>) {
        self.dynamics.retain(|tick, _| !ticks.contains(tick));
        self.techniques.retain(|tick, _| !ticks.contains(tick));
    }
}
