//! Abstract Syntax Tree for gradus programs.
//!
//! Notation is parsed straight into [`GradeEvent`]s; only the program
//! structure around it (variables, parts, blocks) gets its own node types.

use crate::command::{CommandKind, Value};
use crate::event::types::GradeEvent;

use super::error::Position;

/// A complete program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub variables: Vec<VarDecl>,
    pub parts: Vec<PartDef>,
}

/// `$name = value` inside `vars { .. }`.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: String,
    pub value: Value,
    pub pos: Position,
}

/// A part definition with its routing and top-level blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct PartDef {
    pub name: String,
    pub instrument: Option<String>,
    pub channel: Option<i64>,
    pub blocks: Vec<BlockDef>,
    pub pos: Position,
}

/// A block definition.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockDef {
    pub name: String,
    /// Raw repeat count as written; `None` means play once, `-1` loops.
    pub repeat: Option<i64>,
    pub body: Vec<BodyItem>,
    pub pos: Position,
}

/// One item of a block body, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyItem {
    Command {
        kind: CommandKind,
        arg: Arg,
        pos: Position,
    },
    Vary {
        variable: String,
        step: i64,
        pos: Position,
    },
    Assign {
        variable: String,
        value: Value,
        pos: Position,
    },
    Notation {
        events: Vec<GradeEvent>,
        /// Source text of the notation run.
        text: String,
    },
    Block(BlockDef),
}

/// A command argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Value),
    Variable(String),
}
