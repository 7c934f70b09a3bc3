//! Symbolic note durations — `4n`, `8t`, `1m`.
//!
//! Format: `<count><unit>`
//! - `n`: a 1/count fraction of a 4/4 measure (`4n` = quarter note)
//! - `t`: a triplet, two thirds of the matching `n` value
//! - `m`: count whole measures

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::event::beat::{Beat, DEFAULT_BEATS_PER_BAR, TICKS_PER_BEAT};

/// Duration applied to a bare note with no explicit prefix.
pub const DEFAULT_DURATION: NoteDuration = NoteDuration {
    count: 4,
    unit: DurationUnit::Note,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationUnit {
    Note,
    Triplet,
    Measure,
}

impl DurationUnit {
    fn suffix(self) -> char {
        match self {
            DurationUnit::Note => 'n',
            DurationUnit::Triplet => 't',
            DurationUnit::Measure => 'm',
        }
    }

    pub fn from_suffix(ch: char) -> Option<Self> {
        match ch {
            'n' => Some(DurationUnit::Note),
            't' => Some(DurationUnit::Triplet),
            'm' => Some(DurationUnit::Measure),
            _ => None,
        }
    }
}

/// A symbolic, tempo-independent duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct NoteDuration {
    count: u32,
    unit: DurationUnit,
}

impl NoteDuration {
    /// Returns `None` for a zero count.
    pub fn new(count: u32, unit: DurationUnit) -> Option<Self> {
        (count > 0).then_some(Self { count, unit })
    }

    pub fn count(self) -> u32 {
        self.count
    }

    pub fn unit(self) -> DurationUnit {
        self.unit
    }

    /// Length in musical ticks.
    pub fn to_beat(self) -> Beat {
        let measure = DEFAULT_BEATS_PER_BAR as u64 * TICKS_PER_BEAT;
        let count = self.count as u64;
        let ticks = match self.unit {
            DurationUnit::Note => measure / count,
            DurationUnit::Triplet => measure * 2 / (count * 3),
            DurationUnit::Measure => measure * count,
        };
        Beat::from_ticks(ticks)
    }

    /// Length in seconds at the given tempo.
    pub fn seconds(self, bpm: f64) -> f64 {
        self.to_beat().to_seconds(bpm)
    }
}

impl Default for NoteDuration {
    fn default() -> Self {
        DEFAULT_DURATION
    }
}

impl fmt::Display for NoteDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

/// Error returned when a string is not a valid duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDuration(pub String);

impl fmt::Display for InvalidDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid duration: '{}'", self.0)
    }
}

impl std::error::Error for InvalidDuration {}

impl FromStr for NoteDuration {
    type Err = InvalidDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidDuration(s.to_string());
        let unit = s
            .chars()
            .last()
            .and_then(DurationUnit::from_suffix)
            .ok_or_else(invalid)?;
        let digits = &s[..s.len() - 1];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let count: u32 = digits.parse().map_err(|_| invalid())?;
        NoteDuration::new(count, unit).ok_or_else(invalid)
    }
}

impl From<NoteDuration> for String {
    fn from(d: NoteDuration) -> Self {
        d.to_string()
    }
}

impl TryFrom<String> for NoteDuration {
    type Error = InvalidDuration;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn d(s: &str) -> NoteDuration {
        s.parse().unwrap()
    }

    #[test]
    fn quarter_note_is_one_beat() {
        assert_eq!(d("4n").to_beat(), Beat::from_beats(1));
    }

    #[test]
    fn whole_note_is_one_bar() {
        assert_eq!(d("1n").to_beat(), Beat::from_bars(1));
    }

    #[test]
    fn eighth_triplet() {
        assert_eq!(d("8t").to_beat().ticks(), 320);
    }

    #[test]
    fn measures() {
        assert_eq!(d("2m").to_beat(), Beat::from_bars(2));
    }

    #[test]
    fn seconds_follow_tempo() {
        assert_approx_eq!(d("4n").seconds(120.0), 0.5);
        assert_approx_eq!(d("1n").seconds(60.0), 4.0);
    }

    #[test]
    fn display_round_trip() {
        assert_eq!(d("16n").to_string(), "16n");
        assert_eq!(d("8t").to_string(), "8t");
    }

    #[test]
    fn default_is_quarter() {
        assert_eq!(NoteDuration::default().to_string(), "4n");
    }

    #[test]
    fn rejects_zero_count() {
        assert!("0n".parse::<NoteDuration>().is_err());
    }

    #[test]
    fn rejects_missing_digits_or_unit() {
        assert!("n".parse::<NoteDuration>().is_err());
        assert!("4".parse::<NoteDuration>().is_err());
        assert!("4x".parse::<NoteDuration>().is_err());
        assert!("".parse::<NoteDuration>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&d("8n")).unwrap();
        assert_eq!(json, "\"8n\"");
        let back: NoteDuration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d("8n"));
    }
}
