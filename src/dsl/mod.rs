//! DSL compiler — notation and program text → tokens → AST → [`Song`].

pub mod ast;
pub mod compile;
pub mod duration;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use duration::{DurationUnit, NoteDuration, DEFAULT_DURATION};
pub use error::{CompileError, ErrorKind, Position};

use crate::block::Song;
use crate::event::types::GradeEvent;

use compile::compile_program;
use lexer::Lexer;
use parser::Parser;

/// The DSL compiler.
///
/// Parses source text through lexer → parser → AST, then lowers the AST
/// into a song.
pub struct Compiler;

impl Compiler {
    /// Parse program source into a Program AST.
    pub fn parse(source: &str) -> Result<Program, CompileError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(source, tokens);
        parser.parse_program()
    }

    /// Parse and compile program source into a Song.
    pub fn compile(source: &str) -> Result<Song, CompileError> {
        let program = Self::parse(source)?;
        compile_program(&program)
    }
}

/// Parse a notation fragment into grade-relative events.
///
/// Errors carry the input text so callers can show the offending line.
pub fn parse_notation(text: &str) -> Result<Vec<GradeEvent>, CompileError> {
    Lexer::new(text)
        .tokenize()
        .and_then(|tokens| Parser::new(text, tokens).parse_notation())
        .map_err(|e| e.with_input(text))
}

/// Parse and compile a full program.
pub fn parse_program(text: &str) -> Result<Song, CompileError> {
    Compiler::compile(text).map_err(|e| e.with_input(text))
}
