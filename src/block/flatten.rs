//! Block flattening — block tree + repeat counts → one ordered event list.

use rand::Rng;
use tracing::{debug, warn};

use crate::command::VariableStore;
use crate::event::types::PitchEvent;
use crate::performer::{resolve_event, PerformerState};

use super::{BlockArena, BlockId, Part, RepeatCount};

/// A part's events ready for the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened {
    pub events: Vec<PitchEvent>,
    /// The root block loops: the scheduler restarts at `loop_start` when
    /// the list ends.
    pub unbounded: bool,
    /// Index of the first event of the looping section; everything before
    /// it is the intro.
    pub loop_start: usize,
}

/// Flatten a part: its intro, if any, then one pass of its root block.
///
/// An unbounded root is flattened for a single pass and reported through
/// [`Flattened::unbounded`]; it is never expanded eagerly.
pub fn flatten_part<R: Rng + ?Sized>(
    arena: &BlockArena,
    part: &Part,
    performer: &mut PerformerState,
    store: &mut VariableStore,
    rng: &mut R,
) -> Flattened {
    let unbounded = arena
        .get(part.root)
        .is_some_and(|b| b.repeat.is_unbounded());
    let mut events = match part.intro {
        Some(intro) => flatten(arena, intro, performer, store, rng),
        None => Vec::new(),
    };
    let loop_start = if unbounded { events.len() } else { 0 };
    events.extend(flatten_loop_pass(arena, part, performer, store, rng));
    debug!(part = %part.name, events = events.len(), unbounded, loop_start, "flattened part");
    Flattened {
        events,
        unbounded,
        loop_start,
    }
}

/// One pass of a part's root block, without the intro.
pub fn flatten_loop_pass<R: Rng + ?Sized>(
    arena: &BlockArena,
    part: &Part,
    performer: &mut PerformerState,
    store: &mut VariableStore,
    rng: &mut R,
) -> Vec<PitchEvent> {
    flatten(arena, part.root, performer, store, rng)
}

/// Flatten `id` depth-first.
///
/// Each repetition runs the block's actions, emits its own notation, then
/// fully flattens every child in order, so children replay inside every
/// repetition of their parent. An unbounded block contributes one pass.
pub fn flatten<R: Rng + ?Sized>(
    arena: &BlockArena,
    id: BlockId,
    performer: &mut PerformerState,
    store: &mut VariableStore,
    rng: &mut R,
) -> Vec<PitchEvent> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    flatten_into(arena, id, performer, store, rng, &mut path, &mut out);
    out
}

fn flatten_into<R: Rng + ?Sized>(
    arena: &BlockArena,
    id: BlockId,
    performer: &mut PerformerState,
    store: &mut VariableStore,
    rng: &mut R,
    path: &mut Vec<BlockId>,
    out: &mut Vec<PitchEvent>,
) {
    let Some(block) = arena.get(id) else {
        warn!(block = id.0, "unknown block id; skipped");
        return;
    };
    if path.contains(&id) {
        warn!(block = %block.name, "block contains itself; cycle skipped");
        return;
    }

    let repetitions = match block.repeat {
        RepeatCount::Finite(n) => n,
        RepeatCount::Unbounded => {
            if !path.is_empty() {
                warn!(block = %block.name, "nested unbounded block plays once");
            }
            1
        }
    };

    path.push(id);
    for _ in 0..repetitions {
        for action in &block.actions {
            action.execute(performer, store);
        }
        for event in &block.notation {
            out.extend(resolve_event(event, performer, rng));
        }
        for &child in &block.children {
            flatten_into(arena, child, performer, store, rng, path, out);
        }
    }
    path.pop();
}
