// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Articulation profiles by instrument family.
//!
//! Instrument family identifiers are classified into one of four
//! articulation families through fixed membership tables. The profile
//! for a family comes from a [`ProfilesRepository`].

pub mod families;

use std::collections::HashMap;
use std::sync::Arc;

use crate::events::ArticulationType;

pub use families::{KEYBOARDS_FAMILY_SET, PERCUSSION_FAMILY_SET, STRINGS_FAMILY_SET, WINDS_FAMILY_SET};

/// Articulation family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArticulationFamily {
    Keyboards,
    Strings,
    Winds,
    Percussions,
}

impl ArticulationFamily {
    /// Classify an instrument family identifier
    pub fn from_family_id(family_id: &str) -> Option<Self> {
        let member = |set: &[&str]| set.iter().any(|id| *id == family_id);

        if member(KEYBOARDS_FAMILY_SET) {
            Some(ArticulationFamily::Keyboards)
        } else if member(STRINGS_FAMILY_SET) {
            Some(ArticulationFamily::Strings)
        } else if member(WINDS_FAMILY_SET) {
            Some(ArticulationFamily::Winds)
        } else if member(PERCUSSION_FAMILY_SET) {
            Some(ArticulationFamily::Percussions)
        } else {
            None
        }
    }
}

/// How one articulation shapes a note
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArticulationPattern {
    /// Fraction of the notated duration that sounds
    pub duration_factor: f64,
    /// Dynamic offset in level units
    pub dynamic_offset: i32,
}

impl Default for ArticulationPattern {
    fn default() -> Self {
        Self {
            duration_factor: 1.0,
            dynamic_offset: 0,
        }
    }
}

impl ArticulationPattern {
    pub fn new(duration_factor: f64, dynamic_offset: i32) -> Self {
        Self {
            duration_factor: duration_factor.max(0.0),
            dynamic_offset,
        }
    }
}

/// Articulation patterns for one family
#[derive(Debug, Clone, PartialEq)]
pub struct ArticulationsProfile {
    family: ArticulationFamily,
    patterns: HashMap<ArticulationType, ArticulationPattern>,
}

/// Shared handle to a profile
pub type ArticulationsProfilePtr = Arc<ArticulationsProfile>;

impl ArticulationsProfile {
    /// Create an empty profile
    pub fn new(family: ArticulationFamily) -> Self {
        Self {
            family,
            patterns: HashMap::new(),
        }
    }

    /// Add or replace a pattern
    pub fn with_pattern(mut self, articulation: ArticulationType, pattern: ArticulationPattern) -> Self {
        self.patterns.insert(articulation, pattern);
        self
    }

    pub fn family(&self) -> ArticulationFamily {
        self.family
    }

    /// Pattern for an articulation; unsupported articulations play unshaped
    pub fn pattern(&self, articulation: ArticulationType) -> ArticulationPattern {
        self.patterns.get(&articulation).copied().unwrap_or_default()
    }

    pub fn supports(&self, articulation: ArticulationType) -> bool {
        self.patterns.contains_key(&articulation)
    }
}

/// Source of default profiles per family
pub trait ProfilesRepository: Send + Sync {
    /// Default profile for a family, if one is available
    fn default_profile(&self, family: ArticulationFamily) -> Option<ArticulationsProfilePtr>;
}

/// Built-in profiles for every family
#[derive(Debug, Clone)]
pub struct DefaultProfilesRepository {
    profiles: HashMap<ArticulationFamily, ArticulationsProfilePtr>,
}

impl Default for DefaultProfilesRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultProfilesRepository {
    /// Create the repository with built-in profiles
    pub fn new() -> Self {
        let families = [
            ArticulationFamily::Keyboards,
            ArticulationFamily::Strings,
            ArticulationFamily::Winds,
            ArticulationFamily::Percussions,
        ];
        let profiles = families
            .into_iter()
            .map(|family| (family, Arc::new(Self::builtin_profile(family))))
            .collect();
        Self { profiles }
    }

    /// Repository without any profiles
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
        }
    }

    /// Override the profile of one family
    pub fn with_profile(mut self, profile: ArticulationsProfile) -> Self {
        self.profiles.insert(profile.family(), Arc::new(profile));
        self
    }

    fn builtin_profile(family: ArticulationFamily) -> ArticulationsProfile {
        use ArticulationType::*;

        let profile = ArticulationsProfile::new(family)
            .with_pattern(Standard, ArticulationPattern::default())
            .with_pattern(Accent, ArticulationPattern::new(1.0, 1250))
            .with_pattern(Marcato, ArticulationPattern::new(0.75, 1875));

        match family {
            ArticulationFamily::Percussions => profile
                .with_pattern(Staccato, ArticulationPattern::new(1.0, 0))
                .with_pattern(Mute, ArticulationPattern::new(0.5, -625)),
            ArticulationFamily::Keyboards => profile
                .with_pattern(Staccato, ArticulationPattern::new(0.5, 0))
                .with_pattern(Staccatissimo, ArticulationPattern::new(0.25, 0))
                .with_pattern(Tenuto, ArticulationPattern::new(1.0, 0))
                .with_pattern(Legato, ArticulationPattern::new(1.0, 0)),
            ArticulationFamily::Strings => profile
                .with_pattern(Staccato, ArticulationPattern::new(0.5, 0))
                .with_pattern(Staccatissimo, ArticulationPattern::new(0.25, 0))
                .with_pattern(Tenuto, ArticulationPattern::new(1.0, 0))
                .with_pattern(Legato, ArticulationPattern::new(1.0, 0))
                .with_pattern(Pizzicato, ArticulationPattern::new(0.3, 0))
                .with_pattern(Tremolo, ArticulationPattern::new(1.0, 0))
                .with_pattern(Mute, ArticulationPattern::new(1.0, -1250)),
            ArticulationFamily::Winds => profile
                .with_pattern(Staccato, ArticulationPattern::new(0.5, 0))
                .with_pattern(Staccatissimo, ArticulationPattern::new(0.25, 0))
                .with_pattern(Tenuto, ArticulationPattern::new(1.0, 0))
                .with_pattern(Legato, ArticulationPattern::new(1.0, 0))
                .with_pattern(Tremolo, ArticulationPattern::new(1.0, 0))
                .with_pattern(Mute, ArticulationPattern::new(1.0, -1250))
                .with_pattern(Open, ArticulationPattern::new(1.0, 0)),
        }
    }
}

impl ProfilesRepository for DefaultProfilesRepository {
    fn default_profile(&self, family: ArticulationFamily) -> Option<ArticulationsProfilePtr> {
        self.profiles.get(&family).cloned()
    }
}

/// Picks the articulation profile for an instrument family id
#[derive(Clone)]
pub struct ProfileSelector {
    repository: Arc<dyn ProfilesRepository>,
}

impl Default for ProfileSelector {
    fn default() -> Self {
        Self::new(Arc::new(DefaultProfilesRepository::new()))
    }
}

impl ProfileSelector {
    pub fn new(repository: Arc<dyn ProfilesRepository>) -> Self {
        Self { repository }
    }

    /// Profile for an instrument family id; `None` when unclassifiable or unavailable
    pub fn profile_by_instrument(&self, family_id: &str) -> Option<ArticulationsProfilePtr> {
        let family = ArticulationFamily::from_family_id(family_id)?;
        self.repository.default_profile(family)
    }
}
