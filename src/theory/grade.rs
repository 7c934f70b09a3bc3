//! Scale degree + octave pairs.

use crate::dsl::duration::NoteDuration;

use super::scale::Scale;

/// Semitones per octave.
pub const OCTAVE: i32 = 12;

/// A scale degree normalized into `[0, N)` with the overflow carried into
/// `octave`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctavedGrade {
    scale: Scale,
    grade: i32,
    octave: i32,
    pub duration: NoteDuration,
}

impl OctavedGrade {
    /// Build from an arbitrary (possibly out-of-range) grade.
    pub fn new(scale: Scale, grade: i32, octave: i32, duration: NoteDuration) -> Self {
        let mut g = Self {
            scale,
            grade: 0,
            octave,
            duration,
        };
        g.add_grade(grade);
        g
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn grade(&self) -> i32 {
        self.grade
    }

    pub fn octave(&self) -> i32 {
        self.octave
    }

    /// Add `delta` scale degrees, carrying whole octaves.
    ///
    /// Uses floor division so that `grade` stays in `[0, N)` for negative
    /// deltas too: degree 0 minus 1 is the top degree of the octave below.
    pub fn add_grade(&mut self, delta: i32) -> &mut Self {
        let n = self.scale.len() as i32;
        let total = self.grade.saturating_add(delta);
        self.octave = self.octave.saturating_add(total.div_euclid(n));
        self.grade = total.rem_euclid(n);
        self
    }

    /// Return a copy moved by `delta` degrees.
    pub fn plus_grades(mut self, delta: i32) -> Self {
        self.add_grade(delta);
        self
    }

    pub fn add_octaves(&mut self, delta: i32) -> &mut Self {
        self.octave = self.octave.saturating_add(delta);
        self
    }

    /// Return a copy moved by `delta` octaves.
    pub fn plus_octaves(mut self, delta: i32) -> Self {
        self.add_octaves(delta);
        self
    }

    /// `scale[grade] + 12 * octave`, saturating at the `i32` bounds.
    pub fn to_pitch(&self) -> i32 {
        OCTAVE
            .saturating_mul(self.octave)
            .saturating_add(self.scale.degrees()[self.grade as usize])
    }
}
