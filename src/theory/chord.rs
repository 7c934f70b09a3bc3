//! Chord construction and voicing transforms.
//!
//! A performer turns one grade into a chord in a fixed order: build the
//! stack, invert it, shift a slice of it by octaves, then (in pattern mode)
//! decorate every member with a secondary pattern. Tonality is applied by
//! the caller after all of these, on the final pitches.

use crate::event::types::{GradeEvent, NoteEvent};

use super::grade::OctavedGrade;

/// Stack `density` further members above `root`, each `gap` scale degrees
/// above the previous one. Returns `density + 1` grades, root first.
pub fn build_chord(root: OctavedGrade, density: u32, gap: i32) -> Vec<OctavedGrade> {
    let mut chord = Vec::with_capacity(density as usize + 1);
    let mut current = root;
    chord.push(current);
    for _ in 0..density {
        current.add_grade(gap);
        chord.push(current);
    }
    chord
}

/// Rotate the chord `inversion` times: each step lifts the first member an
/// octave and moves it to the end.
pub fn apply_inversion(grades: &mut Vec<OctavedGrade>, inversion: u32) {
    if grades.len() < 2 {
        return;
    }
    for _ in 0..inversion {
        let lowest = grades.remove(0);
        grades.push(lowest.plus_octaves(1));
    }
}

/// Add `value` octaves to members in `[start, start + size)`; indices past
/// the end of the chord are ignored.
pub fn apply_shift(grades: &mut [OctavedGrade], start: usize, size: usize, value: i32) {
    if value == 0 {
        return;
    }
    let end = start.saturating_add(size).min(grades.len());
    if start >= end {
        return;
    }
    for g in &mut grades[start..end] {
        g.add_octaves(value);
    }
}

/// Replace every base grade with one decorated event per pattern element.
///
/// A pattern element with grade `k` becomes the base grade moved by
/// `k * gap` scale degrees, where `gap` is `pattern_gap` when set and
/// `base_gap` otherwise. Each decorated event takes the element's duration.
pub fn apply_decoration(
    grades: &[OctavedGrade],
    base_gap: i32,
    pattern: &[GradeEvent],
    pattern_gap: Option<i32>,
) -> Vec<NoteEvent<OctavedGrade>> {
    let gap = pattern_gap.unwrap_or(base_gap);
    grades
        .iter()
        .flat_map(|base| pattern.iter().map(move |element| decorate(*base, gap, element)))
        .collect()
}

fn decorate(base: OctavedGrade, gap: i32, element: &GradeEvent) -> NoteEvent<OctavedGrade> {
    let offset = |k: i32| {
        let mut g = base.plus_grades(k.saturating_mul(gap));
        g.duration = element.duration();
        g
    };
    match element {
        NoteEvent::Note { duration, value } => NoteEvent::Note {
            duration: *duration,
            value: offset(value.0),
        },
        NoteEvent::Rest { duration } => NoteEvent::Rest {
            duration: *duration,
        },
        NoteEvent::Chord { duration, children } => NoteEvent::Chord {
            duration: *duration,
            children: children.iter().map(|c| decorate(base, gap, c)).collect(),
        },
        NoteEvent::Arpeggio { duration, children } => NoteEvent::Arpeggio {
            duration: *duration,
            children: children.iter().map(|c| decorate(base, gap, c)).collect(),
        },
    }
}
