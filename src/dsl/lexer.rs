//! Lexer for notation and program text.
//!
//! Converts source text into a stream of [`Token`]s. Notation fragments and
//! full programs share one token set; the parser decides which constructs
//! are legal where.

use super::duration::{DurationUnit, NoteDuration};
use super::error::{CompileError, Position};
use super::token::{Token, TokenKind};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    offset: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            offset: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia();

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    pos: self.position(),
                    end: self.offset,
                });
                break;
            }

            let ch = self.peek();
            let token = match ch {
                '{' => self.single_char(TokenKind::LBrace),
                '}' => self.single_char(TokenKind::RBrace),
                '(' => self.single_char(TokenKind::LParen),
                ')' => self.single_char(TokenKind::RParen),
                '[' => self.single_char(TokenKind::LBracket),
                ']' => self.single_char(TokenKind::RBracket),
                '<' => self.single_char(TokenKind::LAngle),
                '>' => self.single_char(TokenKind::RAngle),
                '=' => self.single_char(TokenKind::Eq),
                '"' => self.lex_string()?,
                '$' => self.lex_variable()?,
                '+' | '-' => self.lex_sign()?,
                '0'..='9' => self.lex_number_or_duration()?,
                'a'..='z' | 'A'..='Z' | '_' => self.lex_ident_or_keyword(),
                _ => {
                    return Err(CompileError::lex(
                        format!("unexpected character: '{ch}'"),
                        self.position(),
                    ));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            col: self.col,
            offset: self.offset,
        }
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// Skip whitespace (newlines included) and `//` line comments.
    fn skip_trivia(&mut self) {
        while !self.is_at_end() {
            let ch = self.peek();
            if ch.is_whitespace() {
                self.advance();
            } else if ch == '/' && self.peek_next() == Some('/') {
                while !self.is_at_end() && self.peek() != '\n' {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let pos = self.position();
        self.advance();
        Token {
            kind,
            pos,
            end: self.offset,
        }
    }

    fn lex_string(&mut self) -> Result<Token, CompileError> {
        let pos = self.position();
        self.advance(); // opening '"'
        let mut s = String::new();
        while !self.is_at_end() && self.peek() != '"' {
            s.push(self.advance());
        }
        if self.is_at_end() {
            return Err(CompileError::lex("unclosed string literal", pos).expecting(["'\"'"]));
        }
        self.advance(); // closing '"'
        Ok(Token {
            kind: TokenKind::Str(s),
            pos,
            end: self.offset,
        })
    }

    fn lex_variable(&mut self) -> Result<Token, CompileError> {
        let pos = self.position();
        self.advance(); // '$'
        let name = self.take_word();
        if name.is_empty() {
            return Err(CompileError::lex("expected variable name after '$'", pos)
                .expecting(["variable name"]));
        }
        Ok(Token {
            kind: TokenKind::Var(name),
            pos,
            end: self.offset,
        })
    }

    /// `+=`, `-=`, or a signed integer.
    fn lex_sign(&mut self) -> Result<Token, CompileError> {
        let pos = self.position();
        let sign = self.peek();
        match self.peek_next() {
            Some('=') => {
                self.advance();
                self.advance();
                let kind = if sign == '+' {
                    TokenKind::PlusEq
                } else {
                    TokenKind::MinusEq
                };
                Ok(Token {
                    kind,
                    pos,
                    end: self.offset,
                })
            }
            Some(c) if c.is_ascii_digit() => {
                self.advance();
                let digits = self.take_digits();
                let value = parse_integer(&digits, pos)?;
                if self.at_word_char() {
                    return Err(CompileError::lex(
                        "a signed number cannot carry a duration or suffix",
                        pos,
                    ));
                }
                let value = if sign == '-' { -value } else { value };
                Ok(Token {
                    kind: TokenKind::Integer(value),
                    pos,
                    end: self.offset,
                })
            }
            _ => Err(CompileError::lex(format!("unexpected '{sign}'"), pos)
                .expecting(["'='", "digit"])),
        }
    }

    /// An integer, or a duration prefix such as `8n:`.
    fn lex_number_or_duration(&mut self) -> Result<Token, CompileError> {
        let pos = self.position();
        let digits = self.take_digits();

        if !self.is_at_end() {
            if let Some(unit) = DurationUnit::from_suffix(self.peek()) {
                let followed_by_word = self
                    .peek_next()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
                if !followed_by_word {
                    self.advance(); // unit
                    if self.is_at_end() || self.peek() != ':' {
                        return Err(CompileError::lex(
                            format!("expected ':' after duration '{digits}{}'", self.chars[self.pos - 1]),
                            self.position(),
                        )
                        .expecting(["':'"]));
                    }
                    self.advance(); // ':'
                    let count = parse_integer(&digits, pos)?;
                    let duration = u32::try_from(count)
                        .ok()
                        .and_then(|c| NoteDuration::new(c, unit))
                        .ok_or_else(|| {
                            CompileError::lex(
                                format!("invalid duration count: {digits}"),
                                pos,
                            )
                        })?;
                    return Ok(Token {
                        kind: TokenKind::Duration(duration),
                        pos,
                        end: self.offset,
                    });
                }
            }
        }

        if self.at_word_char() {
            return Err(CompileError::lex(
                format!("unexpected character after number: '{}'", self.peek()),
                self.position(),
            )
            .expecting(["'n:'", "'t:'", "'m:'", "whitespace"]));
        }

        let value = parse_integer(&digits, pos)?;
        Ok(Token {
            kind: TokenKind::Integer(value),
            pos,
            end: self.offset,
        })
    }

    fn lex_ident_or_keyword(&mut self) -> Token {
        let pos = self.position();
        let s = self.take_word();

        let kind = match s.as_str() {
            "vars" => TokenKind::Vars,
            "part" => TokenKind::Part,
            "block" => TokenKind::Block,
            "repeat" => TokenKind::Repeat,
            "loop" => TokenKind::Loop,
            "instrument" => TokenKind::Instrument,
            "channel" => TokenKind::Channel,
            _ => TokenKind::Ident(s),
        };

        Token {
            kind,
            pos,
            end: self.offset,
        }
    }

    fn at_word_char(&self) -> bool {
        !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_')
    }

    fn take_word(&mut self) -> String {
        let mut s = String::new();
        while self.at_word_char() {
            s.push(self.advance());
        }
        s
    }

    fn take_digits(&mut self) -> String {
        let mut s = String::new();
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance());
        }
        s
    }
}

fn parse_integer(digits: &str, pos: Position) -> Result<i64, CompileError> {
    digits
        .parse()
        .map_err(|_| CompileError::lex(format!("invalid number: {digits}"), pos))
}
