//! Performer state — the mutable voice settings commands write into.
//!
//! One [`PerformerState`] lives for the duration of one part's performance.
//! [`resolve`] reads it to turn grade-relative notation into pitches.

pub mod resolve;

pub use resolve::resolve_event;

use crate::arpeggio::PlayMode;
use crate::event::types::GradeEvent;
use crate::theory::Scale;

/// Octave that places degree 0 of the scale on pitch 60.
pub const DEFAULT_OCTAVE: i32 = 5;
/// Default scale-step between chord members (a third).
pub const DEFAULT_GAP: i32 = 2;

/// The "player": every setting that shapes how a grade is voiced.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformerState {
    pub scale: Scale,
    /// Grade of the most recently resolved note.
    pub selected_grade: i32,
    /// Number of members stacked above the root (chord width).
    pub density: u32,
    pub inversion: u32,
    pub octave: i32,
    /// Scale degrees between consecutive chord members.
    pub gap: i32,
    /// Flat semitone transpose applied to every resolved pitch.
    pub tonality: i32,
    pub play_mode: PlayMode,
    pub shift_start: usize,
    pub shift_size: usize,
    pub shift_value: i32,
    /// Scale degrees per pattern step; `None` uses `gap`.
    pub pattern_gap: Option<i32>,
    pub current_pattern: Option<Vec<GradeEvent>>,
    default_octave: i32,
}

impl PerformerState {
    pub fn new() -> Self {
        Self::with_octave(DEFAULT_OCTAVE)
    }

    /// A fresh performer whose octave (and reset octave) is `octave`.
    pub fn with_octave(octave: i32) -> Self {
        Self {
            scale: Scale::default(),
            selected_grade: 0,
            density: 0,
            inversion: 0,
            octave,
            gap: DEFAULT_GAP,
            tonality: 0,
            play_mode: PlayMode::default(),
            shift_start: 0,
            shift_size: 0,
            shift_value: 0,
            pattern_gap: None,
            current_pattern: None,
            default_octave: octave,
        }
    }

    /// Restore every setting to its initial value (between songs).
    pub fn reset(&mut self) {
        *self = Self::with_octave(self.default_octave);
    }

    pub fn default_octave(&self) -> i32 {
        self.default_octave
    }
}

impl Default for PerformerState {
    fn default() -> Self {
        Self::new()
    }
}
