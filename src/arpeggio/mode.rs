//! Play modes — the closed set of strategies a performer uses to voice a
//! chord.

use std::fmt;

use serde::Serialize;

use crate::theory::scale::normalize_name;

/// How a chord's pitches are turned into sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayMode {
    /// All pitches at once.
    #[default]
    Chord,
    Ascending,
    Descending,
    AscDesc,
    DescAsc,
    EvenAscOddAsc,
    EvenAscOddDesc,
    EvenDescOddAsc,
    EvenDescOddDesc,
    OddAscEvenAsc,
    OddAscEvenDesc,
    OddDescEvenAsc,
    OddDescEvenDesc,
    Random,
    /// Every chord member is decorated with the performer's current pattern.
    Pattern,
}

impl PlayMode {
    /// Every mode, in the order `vary` and numeric values index them.
    pub const ALL: [PlayMode; 15] = [
        PlayMode::Chord,
        PlayMode::Ascending,
        PlayMode::Descending,
        PlayMode::AscDesc,
        PlayMode::DescAsc,
        PlayMode::EvenAscOddAsc,
        PlayMode::EvenAscOddDesc,
        PlayMode::EvenDescOddAsc,
        PlayMode::EvenDescOddDesc,
        PlayMode::OddAscEvenAsc,
        PlayMode::OddAscEvenDesc,
        PlayMode::OddDescEvenAsc,
        PlayMode::OddDescEvenDesc,
        PlayMode::Random,
        PlayMode::Pattern,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PlayMode::Chord => "CHORD",
            PlayMode::Ascending => "ASCENDING",
            PlayMode::Descending => "DESCENDING",
            PlayMode::AscDesc => "ASC_DESC",
            PlayMode::DescAsc => "DESC_ASC",
            PlayMode::EvenAscOddAsc => "EVEN_ASC_ODD_ASC",
            PlayMode::EvenAscOddDesc => "EVEN_ASC_ODD_DESC",
            PlayMode::EvenDescOddAsc => "EVEN_DESC_ODD_ASC",
            PlayMode::EvenDescOddDesc => "EVEN_DESC_ODD_DESC",
            PlayMode::OddAscEvenAsc => "ODD_ASC_EVEN_ASC",
            PlayMode::OddAscEvenDesc => "ODD_ASC_EVEN_DESC",
            PlayMode::OddDescEvenAsc => "ODD_DESC_EVEN_ASC",
            PlayMode::OddDescEvenDesc => "ODD_DESC_EVEN_DESC",
            PlayMode::Random => "RANDOM",
            PlayMode::Pattern => "PATTERN",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<PlayMode> {
        let normalized = normalize_name(name);
        PlayMode::ALL.into_iter().find(|m| m.name() == normalized)
    }

    /// Lookup by position in [`PlayMode::ALL`].
    pub fn from_index(index: i64) -> Option<PlayMode> {
        usize::try_from(index)
            .ok()
            .and_then(|i| PlayMode::ALL.get(i).copied())
    }

    pub fn index(self) -> usize {
        PlayMode::ALL
            .iter()
            .position(|&m| m == self)
            .unwrap_or_default()
    }

    /// Whether a resolved chord in this mode is played as one simultaneous
    /// event rather than a sequence.
    pub fn is_simultaneous(self) -> bool {
        self == PlayMode::Chord
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
