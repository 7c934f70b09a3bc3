//! Commands and variables — live mutation of performer state.
//!
//! A [`Command`] owns exactly one performer setting. Its value is either a
//! literal or a variable reference; references are looked up in the
//! [`VariableStore`] every time the command executes, so rebinding a
//! variable changes the next execution without re-parsing anything.
//!
//! Bad values never stop playback: they fall back to a default and log a
//! warning.

pub mod operation;
pub mod variables;

pub use operation::Operation;
pub use variables::{SubscriptionId, Value, VariableStore};

use std::fmt;
use std::ops::RangeInclusive;

use tracing::warn;

use crate::arpeggio::PlayMode;
use crate::dsl::parse_notation;
use crate::event::types::GradeEvent;
use crate::performer::{PerformerState, DEFAULT_GAP};
use crate::theory::Scale;

/// The performer setting a command writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Octave,
    Scale,
    Gap,
    PlayMode,
    Inversion,
    Width,
    Key,
    ShiftStart,
    ShiftSize,
    ShiftValue,
    PatternGap,
    Pattern,
}

impl CommandKind {
    pub const ALL: [CommandKind; 12] = [
        CommandKind::Octave,
        CommandKind::Scale,
        CommandKind::Gap,
        CommandKind::PlayMode,
        CommandKind::Inversion,
        CommandKind::Width,
        CommandKind::Key,
        CommandKind::ShiftStart,
        CommandKind::ShiftSize,
        CommandKind::ShiftValue,
        CommandKind::PatternGap,
        CommandKind::Pattern,
    ];

    /// The keyword used in program text.
    pub fn keyword(self) -> &'static str {
        match self {
            CommandKind::Octave => "octave",
            CommandKind::Scale => "scale",
            CommandKind::Gap => "gap",
            CommandKind::PlayMode => "mode",
            CommandKind::Inversion => "inversion",
            CommandKind::Width => "width",
            CommandKind::Key => "key",
            CommandKind::ShiftStart => "shiftstart",
            CommandKind::ShiftSize => "shiftsize",
            CommandKind::ShiftValue => "shiftvalue",
            CommandKind::PatternGap => "patterngap",
            CommandKind::Pattern => "pattern",
        }
    }

    /// Accepted values for numeric settings; anything outside is clamped.
    pub fn range(self) -> RangeInclusive<i32> {
        match self {
            CommandKind::Octave | CommandKind::ShiftValue => -10..=10,
            CommandKind::Gap | CommandKind::PatternGap => -24..=24,
            CommandKind::Key => -48..=48,
            CommandKind::Inversion
            | CommandKind::Width
            | CommandKind::ShiftStart
            | CommandKind::ShiftSize => 0..=16,
            CommandKind::Scale | CommandKind::PlayMode | CommandKind::Pattern => i32::MIN..=i32::MAX,
        }
    }

    /// Keyword lookup, including the long-form aliases.
    pub fn from_keyword(word: &str) -> Option<CommandKind> {
        match word {
            "playmode" => Some(CommandKind::PlayMode),
            "density" => Some(CommandKind::Width),
            "tonality" => Some(CommandKind::Key),
            _ => CommandKind::ALL.into_iter().find(|k| k.keyword() == word),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Where a command's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandValue {
    Literal(Value),
    /// Name of a variable, read at execution time.
    Variable(String),
}

/// A fully coerced value, ready to be written into the performer.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    Octave(i32),
    Scale(Scale),
    Gap(i32),
    PlayMode(PlayMode),
    Inversion(u32),
    Width(u32),
    Key(i32),
    ShiftStart(usize),
    ShiftSize(usize),
    ShiftValue(i32),
    PatternGap(i32),
    /// Pattern text plus its parse, `None` when the text did not parse.
    Pattern(String, Option<Vec<GradeEvent>>),
}

/// A typed write to one performer setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub value: CommandValue,
}

impl Command {
    pub fn literal(kind: CommandKind, value: impl Into<Value>) -> Self {
        Self {
            kind,
            value: CommandValue::Literal(value.into()),
        }
    }

    pub fn bound(kind: CommandKind, variable: impl Into<String>) -> Self {
        Self {
            kind,
            value: CommandValue::Variable(variable.into()),
        }
    }

    /// Current raw value: the literal, or the variable's value right now.
    fn raw_value<'a>(&'a self, store: &'a VariableStore) -> Option<&'a Value> {
        match &self.value {
            CommandValue::Literal(v) => Some(v),
            CommandValue::Variable(name) => {
                let found = store.get(name);
                if found.is_none() {
                    warn!(command = %self.kind, variable = %name, "undefined variable; using default");
                }
                found
            }
        }
    }

    /// Coerce the current value to this command's setting type.
    pub fn resolve(&self, store: &VariableStore) -> Setting {
        let raw = self.raw_value(store);
        match self.kind {
            CommandKind::Octave => Setting::Octave(self.int(raw, crate::performer::DEFAULT_OCTAVE)),
            CommandKind::Scale => Setting::Scale(resolve_scale(raw)),
            CommandKind::Gap => Setting::Gap(self.int(raw, DEFAULT_GAP)),
            CommandKind::PlayMode => Setting::PlayMode(resolve_play_mode(raw)),
            CommandKind::Inversion => Setting::Inversion(self.non_negative(raw)),
            CommandKind::Width => Setting::Width(self.non_negative(raw)),
            CommandKind::Key => Setting::Key(self.int(raw, 0)),
            CommandKind::ShiftStart => Setting::ShiftStart(self.non_negative(raw) as usize),
            CommandKind::ShiftSize => Setting::ShiftSize(self.non_negative(raw) as usize),
            CommandKind::ShiftValue => Setting::ShiftValue(self.int(raw, 0)),
            CommandKind::PatternGap => Setting::PatternGap(self.int(raw, DEFAULT_GAP)),
            CommandKind::Pattern => {
                let text = raw.map(Value::to_string).unwrap_or_default();
                let parsed = match parse_notation(&text) {
                    Ok(events) => Some(events),
                    Err(e) => {
                        warn!(pattern = %text, error = %e, "malformed pattern; clearing");
                        None
                    }
                };
                Setting::Pattern(text, parsed)
            }
        }
    }

    /// Resolve and write the setting into `performer`.
    pub fn execute(&self, performer: &mut PerformerState, store: &VariableStore) {
        match self.resolve(store) {
            Setting::Octave(v) => performer.octave = v,
            Setting::Scale(v) => performer.scale = v,
            Setting::Gap(v) => performer.gap = v,
            Setting::PlayMode(v) => performer.play_mode = v,
            Setting::Inversion(v) => performer.inversion = v,
            Setting::Width(v) => performer.density = v,
            Setting::Key(v) => performer.tonality = v,
            Setting::ShiftStart(v) => performer.shift_start = v,
            Setting::ShiftSize(v) => performer.shift_size = v,
            Setting::ShiftValue(v) => performer.shift_value = v,
            Setting::PatternGap(v) => performer.pattern_gap = Some(v),
            Setting::Pattern(_, parsed) => performer.current_pattern = parsed,
        }
    }

    fn int(&self, raw: Option<&Value>, default: i32) -> i32 {
        let parsed = match raw {
            Some(Value::Number(n)) => Some(*n),
            Some(Value::Text(s)) => s.trim().parse::<i64>().ok(),
            None => return default,
        };
        let value = parsed.unwrap_or_else(|| {
            warn!(command = %self.kind, value = ?raw, "expected an integer; using default {default}");
            i64::from(default)
        });
        self.clamped(value)
    }

    fn clamped(&self, value: i64) -> i32 {
        let range = self.kind.range();
        let (min, max) = (*range.start(), *range.end());
        if let Ok(v) = i32::try_from(value) {
            if range.contains(&v) {
                return v;
            }
        }
        let clamped = value.clamp(i64::from(min), i64::from(max)) as i32;
        warn!(
            command = %self.kind,
            value,
            min,
            max,
            "value out of range; clamped to {clamped}"
        );
        clamped
    }

    fn non_negative(&self, raw: Option<&Value>) -> u32 {
        u32::try_from(self.int(raw, 0)).unwrap_or(0)
    }
}

fn resolve_scale(raw: Option<&Value>) -> Scale {
    match raw {
        Some(Value::Text(name)) => Scale::from_name(name).unwrap_or_else(|| {
            warn!(scale = %name, "unknown scale; using {}", Scale::default());
            Scale::default()
        }),
        Some(Value::Number(n)) => {
            warn!(value = n, "scale must be a name; using {}", Scale::default());
            Scale::default()
        }
        None => Scale::default(),
    }
}

fn resolve_play_mode(raw: Option<&Value>) -> PlayMode {
    let mode = match raw {
        Some(Value::Text(name)) => PlayMode::from_name(name)
            .or_else(|| name.trim().parse::<i64>().ok().and_then(PlayMode::from_index)),
        Some(Value::Number(n)) => PlayMode::from_index(*n),
        None => return PlayMode::default(),
    };
    mode.unwrap_or_else(|| {
        warn!(value = ?raw, "invalid play mode; using {}", PlayMode::default());
        PlayMode::default()
    })
}

/// One step of a block's body: a command or a variable operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Command(Command),
    Operation(Operation),
}

impl Action {
    pub fn execute(&self, performer: &mut PerformerState, store: &mut VariableStore) {
        match self {
            Action::Command(c) => c.execute(performer, store),
            Action::Operation(o) => o.execute(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(cmd: &Command, store: &VariableStore) -> PerformerState {
        let mut p = PerformerState::new();
        cmd.execute(&mut p, store);
        p
    }

    #[test]
    fn keywords_round_trip() {
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(CommandKind::from_keyword("density"), Some(CommandKind::Width));
        assert_eq!(CommandKind::from_keyword("volume"), None);
    }

    #[test]
    fn each_command_writes_its_field() {
        let store = VariableStore::new();
        assert_eq!(run(&Command::literal(CommandKind::Octave, 3), &store).octave, 3);
        assert_eq!(run(&Command::literal(CommandKind::Gap, 3), &store).gap, 3);
        assert_eq!(run(&Command::literal(CommandKind::Inversion, 1), &store).inversion, 1);
        assert_eq!(run(&Command::literal(CommandKind::Width, 2), &store).density, 2);
        assert_eq!(run(&Command::literal(CommandKind::Key, -3), &store).tonality, -3);
        assert_eq!(run(&Command::literal(CommandKind::ShiftStart, 1), &store).shift_start, 1);
        assert_eq!(run(&Command::literal(CommandKind::ShiftSize, 2), &store).shift_size, 2);
        assert_eq!(run(&Command::literal(CommandKind::ShiftValue, -1), &store).shift_value, -1);
        assert_eq!(
            run(&Command::literal(CommandKind::PatternGap, 1), &store).pattern_gap,
            Some(1)
        );
    }

    #[test]
    fn scale_is_case_insensitive() {
        let store = VariableStore::new();
        let p = run(&Command::literal(CommandKind::Scale, "dorian"), &store);
        assert_eq!(p.scale, Scale::Dorian);
    }

    #[test]
    fn unknown_scale_falls_back_to_major() {
        let store = VariableStore::new();
        let cmd = Command::literal(CommandKind::Scale, "klingon");
        assert_eq!(cmd.resolve(&store), Setting::Scale(Scale::Major));
    }

    #[test]
    fn play_mode_from_name_or_index() {
        let store = VariableStore::new();
        assert_eq!(
            Command::literal(CommandKind::PlayMode, "asc_desc").resolve(&store),
            Setting::PlayMode(PlayMode::AscDesc)
        );
        assert_eq!(
            Command::literal(CommandKind::PlayMode, 2).resolve(&store),
            Setting::PlayMode(PlayMode::Descending)
        );
        assert_eq!(
            Command::literal(CommandKind::PlayMode, 99).resolve(&store),
            Setting::PlayMode(PlayMode::Chord)
        );
    }

    #[test]
    fn bound_command_reads_the_store_at_execution() {
        let mut store = VariableStore::new();
        store.set("oct", 3.into());
        let cmd = Command::bound(CommandKind::Octave, "oct");
        assert_eq!(cmd.resolve(&store), Setting::Octave(3));
        store.set("oct", 6.into());
        assert_eq!(cmd.resolve(&store), Setting::Octave(6));
    }

    #[test]
    fn undefined_variable_uses_default() {
        let store = VariableStore::new();
        let cmd = Command::bound(CommandKind::Key, "missing");
        assert_eq!(cmd.resolve(&store), Setting::Key(0));
    }

    #[test]
    fn non_numeric_text_uses_default() {
        let store = VariableStore::new();
        let cmd = Command::literal(CommandKind::Gap, "wide");
        assert_eq!(cmd.resolve(&store), Setting::Gap(DEFAULT_GAP));
    }

    #[test]
    fn negative_width_clamps_to_zero() {
        let store = VariableStore::new();
        let cmd = Command::literal(CommandKind::Width, -2);
        assert_eq!(cmd.resolve(&store), Setting::Width(0));
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let store = VariableStore::from_declarations([("big", Value::Number(i64::MAX))]);
        assert_eq!(
            Command::literal(CommandKind::Octave, 2_000_000_000).resolve(&store),
            Setting::Octave(10)
        );
        assert_eq!(
            Command::literal(CommandKind::Octave, "-99").resolve(&store),
            Setting::Octave(-10)
        );
        assert_eq!(Command::bound(CommandKind::Width, "big").resolve(&store), Setting::Width(16));
        assert_eq!(Command::bound(CommandKind::Key, "big").resolve(&store), Setting::Key(48));
        assert_eq!(
            Command::literal(CommandKind::Inversion, 1_000_000).resolve(&store),
            Setting::Inversion(16)
        );
    }

    #[test]
    fn pattern_command_parses_its_text() {
        let store = VariableStore::new();
        let p = run(&Command::literal(CommandKind::Pattern, "8n:(0 1 2)"), &store);
        assert_eq!(p.current_pattern.map(|v| v.len()), Some(3));
    }

    #[test]
    fn malformed_pattern_clears_current_pattern() {
        let store = VariableStore::new();
        let mut p = PerformerState::new();
        Command::literal(CommandKind::Pattern, "8n:(0 1)").execute(&mut p, &store);
        assert!(p.current_pattern.is_some());
        Command::literal(CommandKind::Pattern, "(0 1)").execute(&mut p, &store);
        assert!(p.current_pattern.is_none());
    }

    #[test]
    fn action_dispatches_operations_to_the_store() {
        let mut store = VariableStore::new();
        let mut p = PerformerState::new();
        Action::Operation(Operation::assign("x", 4)).execute(&mut p, &mut store);
        Action::Command(Command::bound(CommandKind::Width, "x")).execute(&mut p, &mut store);
        assert_eq!(p.density, 4);
    }
}
