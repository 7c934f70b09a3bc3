//! Generation: grade-relative events → pitch-resolved events.
//!
//! Each grade is voiced in a fixed order: chord stack, inversion, octave
//! shift, pattern decoration, tonality, arpeggiation. Explicit chords and
//! arpeggios from the notation keep their written members and order.

use rand::Rng;

use crate::arpeggio::{arpeggiate, PlayMode};
use crate::dsl::duration::NoteDuration;
use crate::event::types::{GradeEvent, NoteEvent, Pitch, PitchEvent};
use crate::theory::{apply_decoration, apply_inversion, apply_shift, build_chord, OctavedGrade};

use super::PerformerState;

/// Resolve one parsed event against the performer's current settings.
///
/// Returns more than one event only in pattern mode, where a single grade
/// expands into its decorated sequence.
pub fn resolve_event<R: Rng + ?Sized>(
    event: &GradeEvent,
    performer: &mut PerformerState,
    rng: &mut R,
) -> Vec<PitchEvent> {
    match event {
        NoteEvent::Note { duration, value } => resolve_grade(value.0, *duration, performer, rng),
        NoteEvent::Rest { duration } => vec![PitchEvent::rest(*duration)],
        NoteEvent::Chord { duration, children } => vec![NoteEvent::Chord {
            duration: *duration,
            children: written_members(children, *duration, performer),
        }],
        NoteEvent::Arpeggio { duration, children } => vec![NoteEvent::Arpeggio {
            duration: *duration,
            children: written_members(children, *duration, performer),
        }],
    }
}

fn resolve_grade<R: Rng + ?Sized>(
    grade: i32,
    duration: NoteDuration,
    performer: &mut PerformerState,
    rng: &mut R,
) -> Vec<PitchEvent> {
    performer.selected_grade = grade;

    let root = OctavedGrade::new(performer.scale, grade, performer.octave, duration);
    let mut chord = build_chord(root, performer.density, performer.gap);
    apply_inversion(&mut chord, performer.inversion);
    apply_shift(
        &mut chord,
        performer.shift_start,
        performer.shift_size,
        performer.shift_value,
    );

    if performer.play_mode == PlayMode::Pattern {
        match performer.current_pattern.as_deref() {
            Some(pattern) if !pattern.is_empty() => {
                return apply_decoration(&chord, performer.gap, pattern, performer.pattern_gap)
                    .iter()
                    .map(|e| to_pitch_event(e, performer.tonality))
                    .collect();
            }
            _ => tracing::debug!("pattern mode without a pattern; playing chord members in order"),
        }
    }

    let tonality = performer.tonality;
    let pitches: Vec<Pitch> = chord
        .iter()
        .map(|g| Pitch(g.to_pitch().saturating_add(tonality)))
        .collect();

    if pitches.len() == 1 {
        return vec![PitchEvent::note(duration, pitches[0])];
    }

    let notes = |pitches: Vec<Pitch>| -> Vec<PitchEvent> {
        pitches
            .into_iter()
            .map(|p| PitchEvent::note(duration, p))
            .collect()
    };

    if performer.play_mode.is_simultaneous() {
        vec![NoteEvent::Chord {
            duration,
            children: notes(pitches),
        }]
    } else {
        vec![NoteEvent::Arpeggio {
            duration,
            children: notes(arpeggiate(&pitches, performer.play_mode, rng)),
        }]
    }
}

/// Members of an explicit chord or arpeggio: each grade becomes one pitch,
/// rests are dropped.
fn written_members(
    children: &[GradeEvent],
    duration: NoteDuration,
    performer: &PerformerState,
) -> Vec<PitchEvent> {
    children
        .iter()
        .flat_map(GradeEvent::values)
        .map(|grade| {
            let g = OctavedGrade::new(performer.scale, grade.0, performer.octave, duration);
            PitchEvent::note(duration, Pitch(g.to_pitch().saturating_add(performer.tonality)))
        })
        .collect()
}

fn to_pitch_event(event: &NoteEvent<OctavedGrade>, tonality: i32) -> PitchEvent {
    match event {
        NoteEvent::Note { duration, value } => {
            PitchEvent::note(*duration, Pitch(value.to_pitch().saturating_add(tonality)))
        }
        NoteEvent::Rest { duration } => PitchEvent::rest(*duration),
        NoteEvent::Chord { duration, children } => NoteEvent::Chord {
            duration: *duration,
            children: children.iter().map(|c| to_pitch_event(c, tonality)).collect(),
        },
        NoteEvent::Arpeggio { duration, children } => NoteEvent::Arpeggio {
            duration: *duration,
            children: children.iter().map(|c| to_pitch_event(c, tonality)).collect(),
        },
    }
}
