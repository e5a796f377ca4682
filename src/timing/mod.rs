// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! Tick resolution, time signatures, and the tempo map used to turn
//! score ticks into playback timestamps.

pub mod tempo;

use std::fmt;
use std::str::FromStr;

pub use tempo::{TempoChange, TempoMap, DEFAULT_TEMPO};

use crate::error::ScoreError;

/// Ticks per quarter note
pub const DIVISION: i32 = 480;

/// Playback instant in microseconds from the start of the unrolled score
pub type Timestamp = i64;

/// Time signature of a measure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    /// Beats per measure
    pub numerator: u8,
    /// Beat unit (4 = quarter note)
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl TimeSignature {
    /// Create a time signature, rejecting zero or non power-of-two units
    pub fn new(numerator: u8, denominator: u8) -> Result<Self, ScoreError> {
        if numerator == 0 || denominator == 0 || !denominator.is_power_of_two() || denominator > 64 {
            return Err(ScoreError::InvalidTimeSignature(format!(
                "{}/{}",
                numerator, denominator
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Ticks per beat
    pub fn beat_ticks(&self) -> i32 {
        DIVISION * 4 / self.denominator as i32
    }

    /// Ticks per measure
    pub fn measure_ticks(&self) -> i32 {
        self.numerator as i32 * self.beat_ticks()
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl FromStr for TimeSignature {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScoreError::InvalidTimeSignature(s.to_string());
        let (num, den) = s.trim().split_once('/').ok_or_else(invalid)?;
        let num: u8 = num.trim().parse().map_err(|_| invalid())?;
        let den: u8 = den.trim().parse().map_err(|_| invalid())?;
        Self::new(num, den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_time() {
        let ts = TimeSignature::default();
        assert_eq!(ts.beat_ticks(), 480);
        assert_eq!(ts.measure_ticks(), 1920);
    }

    #[test]
    fn test_compound_time() {
        let ts = TimeSignature::new(6, 8).unwrap();
        assert_eq!(ts.beat_ticks(), 240);
        assert_eq!(ts.measure_ticks(), 1440);
    }

    #[test]
    fn test_parse_time_signature() {
        let ts: TimeSignature = "3/4".parse().unwrap();
        assert_eq!(ts, TimeSignature::new(3, 4).unwrap());
        assert_eq!(ts.to_string(), "3/4");

        assert!("4/0".parse::<TimeSignature>().is_err());
        assert!("4/3".parse::<TimeSignature>().is_err());
        assert!("four".parse::<TimeSignature>().is_err());
    }
}
