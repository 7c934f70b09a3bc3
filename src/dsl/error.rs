//! Error types for the notation and program compiler.

use std::fmt;

/// An error that occurred while lexing or parsing notation or program text.
///
/// Compilation is all-or-nothing: when one of these is returned, no partial
/// note list or song is handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub col: usize,
    /// Byte offset into the input where the error was detected.
    pub offset: usize,
    pub kind: ErrorKind,
    /// Human-readable descriptions of what would have been accepted here.
    pub expected: Vec<String>,
    /// The full input text, attached by the top-level entry points.
    pub input: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    SyntaxError,
    SemanticError,
}

impl CompileError {
    fn new(kind: ErrorKind, message: impl Into<String>, pos: Position) -> Self {
        Self {
            message: message.into(),
            line: pos.line,
            col: pos.col,
            offset: pos.offset,
            kind,
            expected: Vec::new(),
            input: None,
        }
    }

    pub fn lex(message: impl Into<String>, pos: Position) -> Self {
        Self::new(ErrorKind::LexError, message, pos)
    }

    pub fn syntax(message: impl Into<String>, pos: Position) -> Self {
        Self::new(ErrorKind::SyntaxError, message, pos)
    }

    pub fn semantic(message: impl Into<String>, pos: Position) -> Self {
        Self::new(ErrorKind::SemanticError, message, pos)
    }

    /// Attach the set of acceptable alternatives at the error position.
    pub fn expecting<I, S>(mut self, expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected = expected.into_iter().map(Into::into).collect();
        self
    }

    /// Attach the source text the error refers to.
    pub fn with_input(mut self, input: &str) -> Self {
        self.input = Some(input.to_string());
        self
    }

    /// The source line containing the error, if the input is attached.
    pub fn source_line(&self) -> Option<&str> {
        self.input
            .as_deref()
            .and_then(|input| input.lines().nth(self.line.saturating_sub(1)))
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}] {:?}: {}",
            self.line, self.col, self.kind, self.message
        )?;
        if !self.expected.is_empty() {
            write!(f, " (expected {})", self.expected.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// A location in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
    pub offset: usize,
}

impl Position {
    pub const START: Position = Position {
        line: 1,
        col: 1,
        offset: 0,
    };
}
