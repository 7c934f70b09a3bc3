//! Note event data model.
//!
//! A [`NoteEvent`] exists in two phases: grade-relative ([`GradeEvent`]),
//! straight out of the parser, and pitch-resolved ([`PitchEvent`]), after a
//! performer has applied scale, octave, chord and tonality. The phases share
//! a shape but are distinct types so one can never be played as the other.

use serde::Serialize;

use crate::dsl::duration::NoteDuration;

/// A scale degree relative to the performer's current scale and octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Grade(pub i32);

/// An absolute pitch number (12 per octave, 60 = middle C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Pitch(pub i32);

/// A note, rest, chord or arpeggio.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NoteEvent<T> {
    Note {
        duration: NoteDuration,
        value: T,
    },
    Rest {
        duration: NoteDuration,
    },
    Chord {
        duration: NoteDuration,
        children: Vec<NoteEvent<T>>,
    },
    Arpeggio {
        duration: NoteDuration,
        children: Vec<NoteEvent<T>>,
    },
}

/// Parse-time event: the numeric field is a [`Grade`].
pub type GradeEvent = NoteEvent<Grade>;

/// Generation-time event: the numeric field is a [`Pitch`].
pub type PitchEvent = NoteEvent<Pitch>;

impl<T: Copy> NoteEvent<T> {
    pub fn note(duration: NoteDuration, value: T) -> Self {
        NoteEvent::Note { duration, value }
    }

    pub fn rest(duration: NoteDuration) -> Self {
        NoteEvent::Rest { duration }
    }

    pub fn duration(&self) -> NoteDuration {
        match self {
            NoteEvent::Note { duration, .. }
            | NoteEvent::Rest { duration }
            | NoteEvent::Chord { duration, .. }
            | NoteEvent::Arpeggio { duration, .. } => *duration,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, NoteEvent::Rest { .. })
    }

    /// All leaf values in depth-first order.
    pub fn values(&self) -> Vec<T> {
        let mut out = Vec::new();
        self.collect_values(&mut out);
        out
    }

    fn collect_values(&self, out: &mut Vec<T>) {
        match self {
            NoteEvent::Note { value, .. } => out.push(*value),
            NoteEvent::Rest { .. } => {}
            NoteEvent::Chord { children, .. } | NoteEvent::Arpeggio { children, .. } => {
                for child in children {
                    child.collect_values(out);
                }
            }
        }
    }
}

impl PitchEvent {
    /// Leaf pitches as raw numbers, ready for an instrument.
    pub fn pitch_numbers(&self) -> Vec<i32> {
        self.values().into_iter().map(|p| p.0).collect()
    }
}
