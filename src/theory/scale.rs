//! Named scale definitions.
//!
//! Each scale is an immutable, ordered set of semitone offsets from its
//! tonic. The number of offsets is the scale's degree count.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scale {
    #[default]
    Major,
    Minor,
    HarmonicMinor,
    MelodicMinor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
    Pentatonic,
    MinorPentatonic,
    Blues,
    WholeTone,
    Chromatic,
}

impl Scale {
    /// Every scale, in the order `vary` cycles through them.
    pub const ALL: [Scale; 14] = [
        Scale::Major,
        Scale::Minor,
        Scale::HarmonicMinor,
        Scale::MelodicMinor,
        Scale::Dorian,
        Scale::Phrygian,
        Scale::Lydian,
        Scale::Mixolydian,
        Scale::Locrian,
        Scale::Pentatonic,
        Scale::MinorPentatonic,
        Scale::Blues,
        Scale::WholeTone,
        Scale::Chromatic,
    ];

    /// Semitone offsets of each degree.
    pub fn degrees(self) -> &'static [i32] {
        match self {
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            Scale::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            Scale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Scale::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Scale::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            Scale::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Scale::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            Scale::Pentatonic => &[0, 2, 4, 7, 9],
            Scale::MinorPentatonic => &[0, 3, 5, 7, 10],
            Scale::Blues => &[0, 3, 5, 6, 7, 10],
            Scale::WholeTone => &[0, 2, 4, 6, 8, 10],
            Scale::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
        }
    }

    /// Number of degrees per octave.
    pub fn len(self) -> usize {
        self.degrees().len()
    }

    pub fn is_empty(self) -> bool {
        self.degrees().is_empty()
    }

    pub fn name(self) -> &'static str {
        match self {
            Scale::Major => "MAJOR",
            Scale::Minor => "MINOR",
            Scale::HarmonicMinor => "HARMONIC_MINOR",
            Scale::MelodicMinor => "MELODIC_MINOR",
            Scale::Dorian => "DORIAN",
            Scale::Phrygian => "PHRYGIAN",
            Scale::Lydian => "LYDIAN",
            Scale::Mixolydian => "MIXOLYDIAN",
            Scale::Locrian => "LOCRIAN",
            Scale::Pentatonic => "PENTATONIC",
            Scale::MinorPentatonic => "MINOR_PENTATONIC",
            Scale::Blues => "BLUES",
            Scale::WholeTone => "WHOLE_TONE",
            Scale::Chromatic => "CHROMATIC",
        }
    }

    /// Case-insensitive lookup; `-` and spaces are read as `_`.
    pub fn from_name(name: &str) -> Option<Scale> {
        let normalized = normalize_name(name);
        Scale::ALL.into_iter().find(|s| s.name() == normalized)
    }

    /// Position in [`Scale::ALL`].
    pub fn index(self) -> usize {
        Scale::ALL
            .iter()
            .position(|&s| s == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uppercase and unify separators so `harmonic-minor` matches `HARMONIC_MINOR`.
pub(crate) fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}
