//! Block model — repeatable blocks of notation and commands, arranged in a
//! tree and stored in an arena.
//!
//! A [`Song`] owns one [`BlockArena`]; every [`Part`] points at its root
//! block by [`BlockId`]. Blocks refer to their children by id too, so the
//! tree has no owning cycles.

pub mod flatten;

pub use flatten::{flatten, flatten_loop_pass, flatten_part, Flattened};

use serde::Serialize;

use crate::command::{Action, Command, Operation, Value, VariableStore};
use crate::event::types::GradeEvent;

/// Index of a block inside its [`BlockArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlockId(pub usize);

/// How many times a block plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RepeatCount {
    Finite(u32),
    /// Loops until the performance is stopped.
    Unbounded,
}

impl RepeatCount {
    /// Map the integer form: `-1` is unbounded, `1..` finite. Anything else
    /// is rejected.
    pub fn from_count(count: i64) -> Option<Self> {
        match count {
            -1 => Some(RepeatCount::Unbounded),
            n if n >= 1 => u32::try_from(n).ok().map(RepeatCount::Finite),
            _ => None,
        }
    }

    /// The integer form, `-1` for unbounded.
    pub fn as_count(self) -> i64 {
        match self {
            RepeatCount::Finite(n) => n as i64,
            RepeatCount::Unbounded => -1,
        }
    }

    pub fn is_unbounded(self) -> bool {
        self == RepeatCount::Unbounded
    }
}

impl Default for RepeatCount {
    fn default() -> Self {
        RepeatCount::Finite(1)
    }
}

/// One block: its own notation and actions, plus child blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub name: String,
    /// Source text of the block's notation, fragments joined by spaces.
    pub notation_text: String,
    /// The notation, parsed once and replayed under any performer state.
    pub notation: Vec<GradeEvent>,
    /// Commands and operations in source order.
    pub actions: Vec<Action>,
    pub repeat: RepeatCount,
    pub children: Vec<BlockId>,
}

impl Block {
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.actions.iter().filter_map(|a| match a {
            Action::Command(c) => Some(c),
            Action::Operation(_) => None,
        })
    }

    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.actions.iter().filter_map(|a| match a {
            Action::Operation(o) => Some(o),
            Action::Command(_) => None,
        })
    }
}

/// Owns every block of a song.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockArena {
    blocks: Vec<Block>,
}

impl BlockArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new block and return its id.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        notation_text: impl Into<String>,
        notation: Vec<GradeEvent>,
        actions: Vec<Action>,
        repeat: RepeatCount,
    ) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(Block {
            id,
            name: name.into(),
            notation_text: notation_text.into(),
            notation,
            actions,
            repeat,
            children: Vec::new(),
        });
        id
    }

    /// Append `child` to `parent`'s children. Returns `false` for unknown ids.
    pub fn add_child(&mut self, parent: BlockId, child: BlockId) -> bool {
        if child.0 >= self.blocks.len() || parent == child {
            return false;
        }
        match self.blocks.get_mut(parent.0) {
            Some(block) => {
                block.children.push(child);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0)
    }

    pub fn get_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}

/// One voice of a song: a root block and where it is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub root: BlockId,
    /// Played once before a looping root.
    pub intro: Option<BlockId>,
    pub instrument: Option<String>,
    pub channel: u8,
}

/// A compiled program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Song {
    pub blocks: BlockArena,
    pub parts: Vec<Part>,
    /// Declared variables with their initial values, in source order.
    pub variables: Vec<(String, Value)>,
}

impl Song {
    /// A fresh variable store holding the declared initial values.
    pub fn variable_store(&self) -> VariableStore {
        VariableStore::from_declarations(self.variables.iter().cloned())
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }
}
