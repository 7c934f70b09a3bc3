//! Token types for the notation lexer.

use super::duration::NoteDuration;
use super::error::Position;

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
    /// Byte offset one past the last character of the token.
    pub end: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Vars,
    Part,
    Block,
    Repeat,
    Loop,
    Instrument,
    Channel,

    // Literals
    Ident(String),
    Integer(i64),
    Str(String),
    /// `$name`
    Var(String),
    /// `4n:`: a duration prefix, colon included.
    Duration(NoteDuration),

    // Delimiters
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LAngle,
    RAngle,
    Eq,
    PlusEq,
    MinusEq,

    Eof,
}

impl TokenKind {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Vars => "'vars'".into(),
            TokenKind::Part => "'part'".into(),
            TokenKind::Block => "'block'".into(),
            TokenKind::Repeat => "'repeat'".into(),
            TokenKind::Loop => "'loop'".into(),
            TokenKind::Instrument => "'instrument'".into(),
            TokenKind::Channel => "'channel'".into(),
            TokenKind::Ident(s) => format!("identifier '{s}'"),
            TokenKind::Integer(n) => format!("integer {n}"),
            TokenKind::Str(s) => format!("string \"{s}\""),
            TokenKind::Var(s) => format!("variable ${s}"),
            TokenKind::Duration(d) => format!("duration {d}:"),
            TokenKind::LBrace => "'{'".into(),
            TokenKind::RBrace => "'}'".into(),
            TokenKind::LParen => "'('".into(),
            TokenKind::RParen => "')'".into(),
            TokenKind::LBracket => "'['".into(),
            TokenKind::RBracket => "']'".into(),
            TokenKind::LAngle => "'<'".into(),
            TokenKind::RAngle => "'>'".into(),
            TokenKind::Eq => "'='".into(),
            TokenKind::PlusEq => "'+='".into(),
            TokenKind::MinusEq => "'-='".into(),
            TokenKind::Eof => "end of input".into(),
        }
    }
}
