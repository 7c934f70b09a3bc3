//! Parser for notation fragments and full programs.
//!
//! Recursive descent over the lexer's token stream. Notation is lowered
//! directly to [`GradeEvent`]s: groups are sugar for their children with an
//! inherited duration, so they never survive parsing.

use crate::command::{CommandKind, Value};
use crate::event::types::{Grade, GradeEvent, NoteEvent};

use super::ast::*;
use super::duration::{NoteDuration, DEFAULT_DURATION};
use super::error::{CompileError, Position};
use super::token::{Token, TokenKind};

const ITEM_START: [&str; 6] = ["duration", "grade", "'s'", "'('", "'['", "'<'"];

pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens,
            pos: 0,
        }
    }

    /// Parse a bare notation fragment such as `8n:0 2 4n:(1 s) [0 2 4]`.
    pub fn parse_notation(&mut self) -> Result<Vec<GradeEvent>, CompileError> {
        let mut events = Vec::new();
        while !self.is_at_end() {
            if !self.at_item_start() {
                return Err(self.unexpected().expecting(ITEM_START));
            }
            self.parse_item(None, &mut events)?;
        }
        Ok(events)
    }

    /// Parse a complete program.
    pub fn parse_program(&mut self) -> Result<Program, CompileError> {
        let mut variables = Vec::new();
        let mut parts = Vec::new();

        if self.check(TokenKind::Vars) {
            variables = self.parse_vars()?;
        }

        while !self.is_at_end() {
            if self.check(TokenKind::Part) {
                parts.push(self.parse_part()?);
            } else {
                let expected: &[&str] = if parts.is_empty() && variables.is_empty() {
                    &["'vars'", "'part'"]
                } else {
                    &["'part'"]
                };
                return Err(self.unexpected().expecting(expected.iter().copied()));
            }
        }

        if parts.is_empty() {
            return Err(CompileError::syntax("a program needs at least one part", self.peek().pos)
                .expecting(["'part'"]));
        }

        Ok(Program { variables, parts })
    }

    fn parse_vars(&mut self) -> Result<Vec<VarDecl>, CompileError> {
        self.expect(TokenKind::Vars)?;
        self.expect(TokenKind::LBrace)?;
        let mut decls = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let pos = self.peek().pos;
            let name = match &self.peek().kind {
                TokenKind::Var(name) => name.clone(),
                _ => return Err(self.unexpected().expecting(["variable", "'}'"])),
            };
            self.advance();
            self.expect(TokenKind::Eq)?;
            let value = self.expect_value()?;
            decls.push(VarDecl { name, value, pos });
        }
        self.expect(TokenKind::RBrace)?;
        Ok(decls)
    }

    fn parse_part(&mut self) -> Result<PartDef, CompileError> {
        let pos = self.expect(TokenKind::Part)?.pos;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LBrace)?;

        let mut instrument = None;
        let mut channel = None;
        let mut blocks = Vec::new();

        loop {
            match &self.peek().kind {
                TokenKind::Instrument => {
                    self.advance();
                    instrument = Some(match &self.peek().kind {
                        TokenKind::Ident(s) | TokenKind::Str(s) => {
                            let s = s.clone();
                            self.advance();
                            s
                        }
                        _ => return Err(self.unexpected().expecting(["instrument name"])),
                    });
                }
                TokenKind::Channel => {
                    self.advance();
                    channel = Some(self.expect_integer()?);
                }
                TokenKind::Block => blocks.push(self.parse_block()?),
                TokenKind::RBrace => break,
                _ => {
                    return Err(self
                        .unexpected()
                        .expecting(["'instrument'", "'channel'", "'block'", "'}'"]))
                }
            }
        }

        if blocks.is_empty() {
            return Err(CompileError::syntax(
                format!("part '{name}' has no blocks"),
                self.peek().pos,
            )
            .expecting(["'block'"]));
        }
        self.expect(TokenKind::RBrace)?;

        Ok(PartDef {
            name,
            instrument,
            channel,
            blocks,
            pos,
        })
    }

    fn parse_block(&mut self) -> Result<BlockDef, CompileError> {
        let pos = self.expect(TokenKind::Block)?.pos;
        let name = self.expect_ident()?;

        let repeat = match self.peek().kind {
            TokenKind::Repeat => {
                self.advance();
                Some(self.expect_integer()?)
            }
            TokenKind::Loop => {
                self.advance();
                Some(-1)
            }
            _ => None,
        };

        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.unexpected().expecting(["'}'"]));
            }
            self.parse_body_item(&mut body)?;
        }
        self.expect(TokenKind::RBrace)?;

        Ok(BlockDef {
            name,
            repeat,
            body,
            pos,
        })
    }

    fn parse_body_item(&mut self, body: &mut Vec<BodyItem>) -> Result<(), CompileError> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Block => {
                body.push(BodyItem::Block(self.parse_block()?));
            }
            TokenKind::Var(variable) => {
                self.advance();
                let item = match self.peek().kind {
                    TokenKind::PlusEq => {
                        self.advance();
                        BodyItem::Vary {
                            variable: variable.clone(),
                            step: self.expect_integer()?,
                            pos: token.pos,
                        }
                    }
                    TokenKind::MinusEq => {
                        self.advance();
                        BodyItem::Vary {
                            variable: variable.clone(),
                            step: -self.expect_integer()?,
                            pos: token.pos,
                        }
                    }
                    TokenKind::Eq => {
                        self.advance();
                        BodyItem::Assign {
                            variable: variable.clone(),
                            value: self.expect_value()?,
                            pos: token.pos,
                        }
                    }
                    _ => return Err(self.unexpected().expecting(["'+='", "'-='", "'='"])),
                };
                body.push(item);
            }
            TokenKind::Ident(word) if word != "s" => {
                let Some(kind) = CommandKind::from_keyword(word) else {
                    return Err(CompileError::syntax(format!("unknown command '{word}'"), token.pos)
                        .expecting(CommandKind::ALL.iter().map(|k| format!("'{}'", k.keyword()))));
                };
                self.advance();
                let arg = match &self.peek().kind {
                    TokenKind::Var(name) => Arg::Variable(name.clone()),
                    TokenKind::Integer(n) => Arg::Value(Value::Number(*n)),
                    TokenKind::Ident(s) | TokenKind::Str(s) => Arg::Value(Value::Text(s.clone())),
                    _ => {
                        return Err(self
                            .unexpected()
                            .expecting(["integer", "name", "string", "variable"]))
                    }
                };
                self.advance();
                body.push(BodyItem::Command {
                    kind,
                    arg,
                    pos: token.pos,
                });
            }
            _ if self.at_item_start() => {
                let start = token.pos.offset;
                let mut events = Vec::new();
                let mut end = start;
                while self.at_item_start() {
                    end = self.parse_item(None, &mut events)?;
                }
                let text = self.source.get(start..end).unwrap_or_default().to_string();
                body.push(BodyItem::Notation { events, text });
            }
            _ => {
                return Err(self.unexpected().expecting(
                    ["'block'", "command", "variable", "notation", "'}'"]
                        .into_iter()
                        .map(String::from),
                ))
            }
        }
        Ok(())
    }

    // --- Notation ---

    fn at_item_start(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Duration(_)
            | TokenKind::Integer(_)
            | TokenKind::LParen
            | TokenKind::LBracket
            | TokenKind::LAngle => true,
            TokenKind::Ident(s) => s == "s",
            _ => false,
        }
    }

    /// Parse one item into `out`. Returns the byte offset just past it.
    fn parse_item(
        &mut self,
        inherited: Option<NoteDuration>,
        out: &mut Vec<GradeEvent>,
    ) -> Result<usize, CompileError> {
        let explicit = match self.peek().kind {
            TokenKind::Duration(d) => {
                self.advance();
                Some(d)
            }
            _ => None,
        };
        let duration = explicit.or(inherited);

        let token = self.peek().clone();
        match &token.kind {
            TokenKind::Integer(n) => {
                self.advance();
                out.push(GradeEvent::note(
                    duration.unwrap_or(DEFAULT_DURATION),
                    Grade(to_grade(*n, token.pos)?),
                ));
                Ok(token.end)
            }
            TokenKind::Ident(s) if s == "s" => {
                self.advance();
                out.push(GradeEvent::rest(duration.unwrap_or(DEFAULT_DURATION)));
                Ok(token.end)
            }
            TokenKind::LParen => {
                let Some(d) = explicit else {
                    return Err(CompileError::syntax("a group needs a duration prefix", token.pos)
                        .expecting(["duration"]));
                };
                self.advance();
                while !self.check(TokenKind::RParen) {
                    if !self.at_item_start() {
                        return Err(self
                            .unexpected()
                            .expecting(ITEM_START.into_iter().chain(["')'"])));
                    }
                    self.parse_item(Some(d), out)?;
                }
                Ok(self.expect(TokenKind::RParen)?.end)
            }
            TokenKind::LBracket | TokenKind::LAngle => {
                let Some(d) = duration else {
                    return Err(CompileError::syntax(
                        "a chord or arpeggio needs a duration prefix",
                        token.pos,
                    )
                    .expecting(["duration"]));
                };
                let (close, close_desc) = if token.kind == TokenKind::LBracket {
                    (TokenKind::RBracket, "']'")
                } else {
                    (TokenKind::RAngle, "'>'")
                };
                self.advance();
                let mut children = Vec::new();
                loop {
                    let t = self.peek().clone();
                    match t.kind {
                        TokenKind::Integer(n) => {
                            self.advance();
                            children.push(GradeEvent::note(d, Grade(to_grade(n, t.pos)?)));
                        }
                        ref k if *k == close => break,
                        _ => return Err(self.unexpected().expecting(["grade", close_desc])),
                    }
                }
                if children.is_empty() {
                    return Err(CompileError::syntax("empty chord", token.pos).expecting(["grade"]));
                }
                let end = self.expect(close)?.end;
                out.push(if token.kind == TokenKind::LBracket {
                    NoteEvent::Chord {
                        duration: d,
                        children,
                    }
                } else {
                    NoteEvent::Arpeggio {
                        duration: d,
                        children,
                    }
                });
                Ok(end)
            }
            _ => {
                let err = self.unexpected();
                Err(if explicit.is_some() {
                    err.expecting(["grade", "'s'", "'('", "'['", "'<'"])
                } else {
                    err.expecting(ITEM_START)
                })
            }
        }
    }

    // --- Utility methods ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> &Token {
        let t = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len() || self.peek().kind == TokenKind::Eof
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end()
            && std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(&kind)
    }

    fn unexpected(&self) -> CompileError {
        let t = self.peek();
        CompileError::syntax(format!("unexpected {}", t.kind.describe()), t.pos)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token, CompileError> {
        if std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected().expecting([kind.describe()]))
        }
    }

    fn expect_ident(&mut self) -> Result<String, CompileError> {
        match &self.peek().kind {
            TokenKind::Ident(s) => {
                let val = s.clone();
                self.advance();
                Ok(val)
            }
            _ => Err(self.unexpected().expecting(["name"])),
        }
    }

    fn expect_integer(&mut self) -> Result<i64, CompileError> {
        match self.peek().kind {
            TokenKind::Integer(v) => {
                self.advance();
                Ok(v)
            }
            _ => Err(self.unexpected().expecting(["integer"])),
        }
    }

    fn expect_value(&mut self) -> Result<Value, CompileError> {
        let value = match &self.peek().kind {
            TokenKind::Integer(n) => Value::Number(*n),
            TokenKind::Ident(s) | TokenKind::Str(s) => Value::Text(s.clone()),
            _ => return Err(self.unexpected().expecting(["integer", "name", "string"])),
        };
        self.advance();
        Ok(value)
    }
}

fn to_grade(n: i64, pos: Position) -> Result<i32, CompileError> {
    i32::try_from(n).map_err(|_| CompileError::syntax(format!("grade {n} is out of range"), pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::error::ErrorKind;
    use crate::dsl::lexer::Lexer;

    fn notation(src: &str) -> Result<Vec<GradeEvent>, CompileError> {
        let tokens = Lexer::new(src).tokenize()?;
        Parser::new(src, tokens).parse_notation()
    }

    fn program(src: &str) -> Result<Program, CompileError> {
        let tokens = Lexer::new(src).tokenize()?;
        Parser::new(src, tokens).parse_program()
    }

    fn d(s: &str) -> NoteDuration {
        s.parse().unwrap()
    }

    #[test]
    fn bare_notes_default_to_quarter() {
        let events = notation("0 -3 s").unwrap();
        assert_eq!(
            events,
            vec![
                GradeEvent::note(d("4n"), Grade(0)),
                GradeEvent::note(d("4n"), Grade(-3)),
                GradeEvent::rest(d("4n")),
            ]
        );
    }

    #[test]
    fn group_children_inherit_duration() {
        let events = notation("8n:(0 2n:1 s) 3").unwrap();
        assert_eq!(
            events,
            vec![
                GradeEvent::note(d("8n"), Grade(0)),
                GradeEvent::note(d("2n"), Grade(1)),
                GradeEvent::rest(d("8n")),
                GradeEvent::note(d("4n"), Grade(3)),
            ]
        );
    }

    #[test]
    fn nested_group_needs_its_own_prefix() {
        let events = notation("8n:(0 16t:(1 2))").unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].duration(), d("16t"));
        assert!(notation("8n:(0 (1 2))").is_err());
    }

    #[test]
    fn group_without_duration_is_rejected() {
        let err = notation("(0 1)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::SyntaxError);
        assert_eq!(err.col, 1);
        assert!(err.expected.contains(&"duration".to_string()));
    }

    #[test]
    fn explicit_chord_and_arpeggio() {
        let events = notation("2n:[0 2 4] 4n:<4 0>").unwrap();
        assert!(matches!(&events[0], NoteEvent::Chord { children, .. } if children.len() == 3));
        assert!(matches!(&events[1], NoteEvent::Arpeggio { children, .. } if children.len() == 2));
        assert_eq!(events[1].values(), vec![Grade(4), Grade(0)]);
    }

    #[test]
    fn chord_rejects_rests_and_empty() {
        assert!(notation("4n:[0 s]").is_err());
        assert!(notation("4n:[]").is_err());
        assert!(notation("[0 2]").is_err());
    }

    #[test]
    fn unbalanced_group_reports_position() {
        let err = notation("4n:(0 1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::SyntaxError);
        assert!(err.expected.contains(&"')'".to_string()));
        assert_eq!(err.offset, 7);
    }

    #[test]
    fn duration_must_be_followed_by_an_item() {
        let err = notation("0 8n:").unwrap_err();
        assert!(err.message.contains("end of input"));
    }

    #[test]
    fn empty_notation_is_empty() {
        assert!(notation("  // nothing\n").unwrap().is_empty());
    }

    #[test]
    fn minimal_program() {
        let prog = program("part lead { block a { 0 1 2 } }").unwrap();
        assert!(prog.variables.is_empty());
        assert_eq!(prog.parts.len(), 1);
        let block = &prog.parts[0].blocks[0];
        assert_eq!(block.name, "a");
        assert_eq!(block.repeat, None);
        match &block.body[0] {
            BodyItem::Notation { events, text } => {
                assert_eq!(events.len(), 3);
                assert_eq!(text, "0 1 2");
            }
            other => panic!("expected notation, got {other:?}"),
        }
    }

    #[test]
    fn vars_and_part_routing() {
        let prog = program(
            r#"
            vars { $root = 2 $sc = MINOR $pat = "16n:(0 1)" }
            part bass {
                instrument pluck
                channel 3
                block main loop { octave 3 0 }
            }
            "#,
        )
        .unwrap();
        assert_eq!(prog.variables.len(), 3);
        assert_eq!(prog.variables[1].value, Value::Text("MINOR".into()));
        assert_eq!(prog.variables[2].value, Value::Text("16n:(0 1)".into()));
        let part = &prog.parts[0];
        assert_eq!(part.instrument.as_deref(), Some("pluck"));
        assert_eq!(part.channel, Some(3));
        assert_eq!(part.blocks[0].repeat, Some(-1));
    }

    #[test]
    fn body_keeps_source_order() {
        let prog = program(
            "part p { block b repeat 2 { $x += 1 key $x 0 1 mode DESCENDING 2 $x -= 3 $y = LYDIAN block c { 4 } } }",
        )
        .unwrap();
        let body = &prog.parts[0].blocks[0].body;
        assert!(matches!(&body[0], BodyItem::Vary { step: 1, .. }));
        assert!(matches!(
            &body[1],
            BodyItem::Command { kind: CommandKind::Key, arg: Arg::Variable(v), .. } if v == "x"
        ));
        assert!(matches!(&body[2], BodyItem::Notation { text, .. } if text == "0 1"));
        assert!(matches!(&body[3], BodyItem::Command { kind: CommandKind::PlayMode, .. }));
        assert!(matches!(&body[4], BodyItem::Notation { .. }));
        assert!(matches!(&body[5], BodyItem::Vary { step: -3, .. }));
        assert!(matches!(&body[6], BodyItem::Assign { .. }));
        assert!(matches!(&body[7], BodyItem::Block(b) if b.name == "c"));
    }

    #[test]
    fn repeat_minus_one_is_kept_raw() {
        let prog = program("part p { block b repeat -1 { 0 } }").unwrap();
        assert_eq!(prog.parts[0].blocks[0].repeat, Some(-1));
    }

    #[test]
    fn unknown_command_lists_commands() {
        let err = program("part p { block b { tempo 3 } }").unwrap_err();
        assert!(err.message.contains("unknown command 'tempo'"));
        assert!(err.expected.contains(&"'octave'".to_string()));
    }

    #[test]
    fn program_needs_a_part() {
        assert!(program("").is_err());
        assert!(program("vars { $x = 1 }").is_err());
        assert!(program("part p { }").is_err());
    }

    #[test]
    fn missing_brace_is_a_syntax_error() {
        let err = program("part p { block b { 0 1 }").unwrap_err();
        assert_eq!(err.kind, ErrorKind::SyntaxError);
        assert!(err.message.contains("end of input"));
    }
}
