// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::Error;
use crate::expr::ExprNode;
use crate::lexer::{tokenize, Spanned, Token};

/// Controls how liberally the grammar accepts chains of the same binary operator at one
/// nesting level.
///
/// `expr = term ('|' term)*; term = factor ('&' factor)*; factor = '!' factor | '(' expr ')' |
/// identifier`. [`ParseMode::Strict`] additionally requires that any level with more than one
/// operator use explicit parentheses to disambiguate the grouping; [`ParseMode::Permissive`]
/// accepts arbitrary-length chains.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ParseMode {
    /// Reject un-parenthesized chains of 3+ terms joined by the same operator.
    Strict,
    /// Accept arbitrary-length chains of the same operator without parentheses.
    Permissive,
}

struct Parser<'a> {
    input: &'a str,
    tokens: &'a [Spanned],
    pos: usize,
    mode: ParseMode,
}

pub(crate) fn parse(input: &str, mode: ParseMode) -> Result<ExprNode, Error> {
    let tokens = tokenize(input).map_err(|(position, message)| Error::ParseError {
        input: input.to_string(),
        position,
        message,
    })?;
    let mut parser = Parser {
        input,
        tokens: &tokens,
        pos: 0,
        mode,
    };
    let node = parser.parse_expr()?;
    if parser.pos != tokens.len() {
        let position = tokens[parser.pos].position;
        return Err(Error::ParseError {
            input: input.to_string(),
            position,
            message: "unexpected trailing input".to_string(),
        });
    }
    Ok(node)
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn error_here(&self, message: impl Into<String>) -> Error {
        let position = self
            .peek()
            .map(|s| s.position)
            .unwrap_or(self.input.len());
        Error::ParseError {
            input: self.input.to_string(),
            position,
            message: message.into(),
        }
    }

    fn parse_expr(&mut self) -> Result<ExprNode, Error> {
        let mut terms = vec![self.parse_term()?];
        let mut op_position = None;
        while let Some(Spanned {
            token: Token::Or,
            position,
        }) = self.peek()
        {
            op_position.get_or_insert(*position);
            self.pos += 1;
            terms.push(self.parse_term()?);
        }
        if terms.len() == 1 {
            return Ok(terms.pop().expect("non-empty"));
        }
        if self.mode == ParseMode::Strict && terms.len() > 2 {
            return Err(Error::AmbiguousChain {
                input: self.input.to_string(),
                position: op_position.unwrap_or(0),
                operator: "|",
            });
        }
        Ok(ExprNode::Any(terms))
    }

    fn parse_term(&mut self) -> Result<ExprNode, Error> {
        let mut factors = vec![self.parse_factor()?];
        let mut op_position = None;
        while let Some(Spanned {
            token: Token::And,
            position,
        }) = self.peek()
        {
            op_position.get_or_insert(*position);
            self.pos += 1;
            factors.push(self.parse_factor()?);
        }
        if factors.len() == 1 {
            return Ok(factors.pop().expect("non-empty"));
        }
        if self.mode == ParseMode::Strict && factors.len() > 2 {
            return Err(Error::AmbiguousChain {
                input: self.input.to_string(),
                position: op_position.unwrap_or(0),
                operator: "&",
            });
        }
        Ok(ExprNode::All(factors))
    }

    fn parse_factor(&mut self) -> Result<ExprNode, Error> {
        match self.peek().cloned() {
            Some(Spanned {
                token: Token::Not, ..
            }) => {
                self.pos += 1;
                let inner = self.parse_factor()?;
                Ok(ExprNode::Not(Box::new(inner)))
            }
            Some(Spanned {
                token: Token::LParen,
                ..
            }) => {
                self.pos += 1;
                let inner = self.parse_expr()?;
                match self.peek() {
                    Some(Spanned {
                        token: Token::RParen,
                        ..
                    }) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err(self.error_here("expected ')'")),
                }
            }
            Some(Spanned {
                token: Token::Ident(name),
                ..
            }) => {
                self.pos += 1;
                Ok(ExprNode::Ident(name))
            }
            Some(_) => Err(self.error_here("expected identifier, '!' or '('")),
            None => Err(self.error_here("unexpected end of expression")),
        }
    }
}
