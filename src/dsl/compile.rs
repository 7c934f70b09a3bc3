//! Program compiler — lowers a [`Program`] AST into a [`Song`].
//!
//! Blocks are moved into the song's arena, body items become ordered
//! [`Action`]s, and each part gets a single root block. When a part has a
//! looping top-level block, that block is the root and the blocks before it
//! form a one-pass intro.

use std::collections::HashSet;

use tracing::warn;

use crate::block::{BlockArena, BlockId, Part, RepeatCount, Song};
use crate::command::{Action, Command, Operation};

use super::ast::*;
use super::error::CompileError;

/// Highest channel number a part may be routed to.
pub const MAX_CHANNEL: i64 = 15;

/// Compile a Program AST into a Song.
pub fn compile_program(program: &Program) -> Result<Song, CompileError> {
    let mut declared = HashSet::new();
    let mut variables = Vec::new();
    for decl in &program.variables {
        if !declared.insert(decl.name.as_str()) {
            return Err(CompileError::semantic(
                format!("variable ${} is declared twice", decl.name),
                decl.pos,
            ));
        }
        variables.push((decl.name.clone(), decl.value.clone()));
    }

    let mut blocks = BlockArena::new();
    let mut parts = Vec::new();
    let mut part_names = HashSet::new();

    for def in &program.parts {
        if !part_names.insert(def.name.as_str()) {
            return Err(CompileError::semantic(
                format!("part '{}' is defined twice", def.name),
                def.pos,
            ));
        }

        let channel = match def.channel {
            None => 0,
            Some(c) if (0..=MAX_CHANNEL).contains(&c) => c as u8,
            Some(c) => {
                return Err(CompileError::semantic(
                    format!("channel {c} is out of range 0..={MAX_CHANNEL}"),
                    def.pos,
                ))
            }
        };

        let mut top = Vec::with_capacity(def.blocks.len());
        for block in &def.blocks {
            top.push(compile_block(&mut blocks, block, &declared)?);
        }
        let looping = top
            .iter()
            .position(|&id| blocks.get(id).is_some_and(|b| b.repeat.is_unbounded()));

        let (intro, root) = match (top.as_slice(), looping) {
            ([single], _) => (None, *single),
            (_, None) => (None, implicit_root(&mut blocks, &def.name, &top)),
            (_, Some(k)) => {
                for block in &def.blocks[k + 1..] {
                    warn!(part = %def.name, block = %block.name, "block follows a looping block and never plays");
                }
                let intro = (k > 0).then(|| implicit_root(&mut blocks, &def.name, &top[..k]));
                (intro, top[k])
            }
        };

        parts.push(Part {
            name: def.name.clone(),
            root,
            intro,
            instrument: def.instrument.clone(),
            channel,
        });
    }

    Ok(Song {
        blocks,
        parts,
        variables,
    })
}

/// A single-pass block named after the part, holding `children` in order.
fn implicit_root(arena: &mut BlockArena, part: &str, children: &[BlockId]) -> BlockId {
    let root = arena.insert(part.to_string(), "", Vec::new(), Vec::new(), RepeatCount::default());
    for &child in children {
        arena.add_child(root, child);
    }
    root
}

fn compile_block(
    arena: &mut BlockArena,
    def: &BlockDef,
    declared: &HashSet<&str>,
) -> Result<BlockId, CompileError> {
    let repeat = match def.repeat {
        None => RepeatCount::default(),
        Some(n) => RepeatCount::from_count(n).ok_or_else(|| {
            CompileError::semantic(
                format!("block '{}' has repeat {n}; use a positive count or -1 to loop", def.name),
                def.pos,
            )
            .expecting(["positive integer", "-1"])
        })?,
    };

    let mut actions = Vec::new();
    let mut notation = Vec::new();
    let mut fragments = Vec::new();
    let mut children = Vec::new();

    for item in &def.body {
        match item {
            BodyItem::Command { kind, arg, pos } => {
                let command = match arg {
                    Arg::Value(value) => Command::literal(*kind, value.clone()),
                    Arg::Variable(name) => {
                        check_declared(declared, name, pos.line);
                        Command::bound(*kind, name.clone())
                    }
                };
                actions.push(Action::Command(command));
            }
            BodyItem::Vary {
                variable,
                step,
                pos,
            } => {
                check_declared(declared, variable, pos.line);
                actions.push(Action::Operation(Operation::vary(variable.clone(), *step)));
            }
            BodyItem::Assign {
                variable, value, ..
            } => {
                actions.push(Action::Operation(Operation::assign(
                    variable.clone(),
                    value.clone(),
                )));
            }
            BodyItem::Notation { events, text } => {
                notation.extend(events.iter().cloned());
                fragments.push(text.as_str());
            }
            BodyItem::Block(child) => children.push(child),
        }
    }

    let id = arena.insert(def.name.clone(), fragments.join(" "), notation, actions, repeat);
    for child in children {
        let child_id = compile_block(arena, child, declared)?;
        arena.add_child(id, child_id);
    }
    Ok(id)
}

fn check_declared(declared: &HashSet<&str>, name: &str, line: usize) {
    if !declared.contains(name) {
        warn!(variable = %name, line, "variable is not declared in vars; it must be assigned before use");
    }
}
