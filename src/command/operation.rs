//! Variable operations — vary and assign.

use tracing::{debug, warn};

use crate::arpeggio::PlayMode;
use crate::theory::Scale;

use super::variables::{Value, VariableStore};

/// A mutation of the shared variable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Step a number, or cycle a scale / play-mode name, by `step`.
    Vary { variable: String, step: i64 },
    /// Overwrite the variable.
    Assign { variable: String, value: Value },
}

impl Operation {
    pub fn vary(variable: impl Into<String>, step: i64) -> Self {
        Operation::Vary {
            variable: variable.into(),
            step,
        }
    }

    pub fn assign(variable: impl Into<String>, value: impl Into<Value>) -> Self {
        Operation::Assign {
            variable: variable.into(),
            value: value.into(),
        }
    }

    pub fn variable(&self) -> &str {
        match self {
            Operation::Vary { variable, .. } | Operation::Assign { variable, .. } => variable,
        }
    }

    pub fn execute(&self, store: &mut VariableStore) {
        match self {
            Operation::Vary { variable, step } => vary(store, variable, *step),
            Operation::Assign { variable, value } => store.set(variable, value.clone()),
        }
    }
}

fn vary(store: &mut VariableStore, name: &str, step: i64) {
    let next = match store.get(name) {
        None => {
            warn!(variable = %name, "cannot vary an undefined variable");
            return;
        }
        Some(Value::Number(n)) => Value::Number(n.saturating_add(step)),
        Some(Value::Text(s)) => match cycle_name(s, step) {
            Some(next) => Value::Text(next.to_string()),
            None => {
                warn!(variable = %name, value = %s, "value is neither a scale nor a play mode; not varied");
                return;
            }
        },
    };
    debug!(variable = %name, value = %next, "varied");
    store.set(name, next);
}

/// Advance a scale or play-mode name by `step` positions, wrapping both ways.
fn cycle_name(name: &str, step: i64) -> Option<&'static str> {
    if let Some(scale) = Scale::from_name(name) {
        let i = wrap(scale.index(), step, Scale::ALL.len());
        return Some(Scale::ALL[i].name());
    }
    if let Some(mode) = PlayMode::from_name(name) {
        let i = wrap(mode.index(), step, PlayMode::ALL.len());
        return Some(PlayMode::ALL[i].name());
    }
    None
}

fn wrap(index: usize, step: i64, len: usize) -> usize {
    let len = len as i64;
    ((index as i64 % len) + step.rem_euclid(len)).rem_euclid(len) as usize
}
