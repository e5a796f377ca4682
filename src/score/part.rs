// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Parts and their instruments.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque part identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(pub u64);

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An instrument a part can play
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    /// Instrument identifier (e.g. "flute")
    pub id: String,
    /// Instrument family identifier (e.g. "flutes")
    pub family_id: String,
}

impl Instrument {
    pub fn new(id: impl Into<String>, family_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            family_id: family_id.into(),
        }
    }
}

/// A part: one or more staves played by a sequence of instruments
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    id: PartId,
    name: String,
    /// Number of staves (each staff has `VOICES` tracks)
    staves: usize,
    /// Instrument changes keyed by tick
    instruments: BTreeMap<i32, Instrument>,
}

impl Part {
    /// Create a part with no instruments
    pub fn new(id: PartId, name: impl Into<String>, staves: usize) -> Self {
        Self {
            id,
            name: name.into(),
            staves: staves.max(1),
            instruments: BTreeMap::new(),
        }
    }

    /// Add an instrument starting at `tick`
    pub fn with_instrument(mut self, tick: i32, instrument: Instrument) -> Self {
        self.set_instrument(tick, instrument);
        self
    }

    pub fn id(&self) -> PartId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn staves(&self) -> usize {
        self.staves
    }

    /// Instrument sounding at `tick`.
    ///
    /// Before the first instrument change the first instrument applies.
    pub fn instrument_at(&self, tick: i32) -> Option<&Instrument> {
        self.instruments
            .range(..=tick)
            .next_back()
            .or_else(|| self.instruments.iter().next())
            .map(|(_, instrument)| instrument)
    }

    /// Instrument id at `tick`
    pub fn instrument_id(&self, tick: i32) -> Option<&str> {
        self.instrument_at(tick).map(|i| i.id.as_str())
    }

    /// Instrument family id at `tick`
    pub fn family_id(&self, tick: i32) -> Option<&str> {
        self.instrument_at(tick).map(|i| i.family_id.as_str())
    }

    /// Whether any instrument change uses `instrument_id`
    pub fn contains_instrument(&self, instrument_id: &str) -> bool {
        self.instruments.values().any(|i| i.id == instrument_id)
    }

    /// Set the instrument from `tick` onward
    pub fn set_instrument(&mut self, tick: i32, instrument: Instrument) {
        self.instruments.insert(tick, instrument);
    }

    /// Remove every change to `instrument_id`; returns whether anything was removed
    pub fn remove_instrument(&mut self, instrument_id: &str) -> bool {
        let before = self.instruments.len();
        self.instruments.retain(|_, i| i.id != instrument_id);
        self.instruments.len() != before
    }

    /// Instrument changes in tick order
    pub fn instruments(&self) -> impl Iterator<Item = (i32, &Instrument)> {
        self.instruments.iter().map(|(tick, i)| (*tick, i))
    }
}
