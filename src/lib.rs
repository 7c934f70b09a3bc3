//! Gradus — a grade-relative music notation engine.
//!
//! Notation is written in scale degrees, arranged into repeatable blocks
//! with commands and variables, flattened into pitched events and played
//! tick by tick against a clock.

pub mod arpeggio;
pub mod block;
pub mod command;
pub mod config;
pub mod dsl;
pub mod event;
pub mod instrument;
pub mod performance;
pub mod performer;
pub mod theory;

pub use block::{flatten, flatten_part, Flattened, Song};
pub use config::EngineConfig;
pub use dsl::{parse_notation, parse_program, CompileError};
pub use performance::Performance;
