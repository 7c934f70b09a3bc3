//! Scale/grade engine — degree normalization, degree→pitch, chords.

pub mod chord;
pub mod grade;
pub mod scale;

pub use chord::{apply_decoration, apply_inversion, apply_shift, build_chord};
pub use grade::{OctavedGrade, OCTAVE};
pub use scale::Scale;
