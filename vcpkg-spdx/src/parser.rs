// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recursive-descent parser for the SPDX license expression grammar:
//!
//! ```text
//! expr       := and_expr (OR and_expr)*
//! and_expr   := simple (AND simple)*
//! simple     := '(' expr ')' | license-id ['+'] ['WITH' exception-id]
//! ```
//!
//! `AND` binds tighter than `OR`. Keywords (`AND`, `OR`, `WITH`) are matched case-insensitively,
//! as is SPDX's convention, while license and exception identifiers keep whatever casing the
//! caller wrote (canonicalization against known tables happens in [`crate::expr`]).

use crate::expr::SpdxNode;
use crate::Error;

#[derive(Clone, Debug, Eq, PartialEq)]
enum Token {
    LParen,
    RParen,
    Plus,
    And,
    Or,
    With,
    Ident(String),
}

struct Spanned {
    token: Token,
    position: usize,
}

fn tokenize(input: &str) -> Result<Vec<Spanned>, Error> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '(' => {
                tokens.push(Spanned {
                    token: Token::LParen,
                    position: i,
                });
                i += 1;
            }
            ')' => {
                tokens.push(Spanned {
                    token: Token::RParen,
                    position: i,
                });
                i += 1;
            }
            '+' => {
                tokens.push(Spanned {
                    token: Token::Plus,
                    position: i,
                });
                i += 1;
            }
            _ if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == ':' => {
                let start = i;
                while i < bytes.len() {
                    let c = bytes[i] as char;
                    if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == ':' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                let word = &input[start..i];
                let token = if word.eq_ignore_ascii_case("AND") {
                    Token::And
                } else if word.eq_ignore_ascii_case("OR") {
                    Token::Or
                } else if word.eq_ignore_ascii_case("WITH") {
                    Token::With
                } else {
                    Token::Ident(word.to_string())
                };
                tokens.push(Spanned {
                    token,
                    position: start,
                });
            }
            _ => {
                return Err(Error::UnexpectedToken {
                    position: i,
                    expected: "a license identifier, '(', ')' or '+'".to_string(),
                })
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|s| s.position)
            .unwrap_or_else(|| self.tokens.last().map(|s| s.position + 1).unwrap_or(0))
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).map(|s| s.token.clone());
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn parse_expr(&mut self) -> Result<SpdxNode, Error> {
        let mut terms = vec![self.parse_and_expr()?];
        while matches!(self.peek(), Some(Token::Or)) {
            self.bump();
            terms.push(self.parse_and_expr()?);
        }
        Ok(if terms.len() == 1 {
            terms.pop().unwrap()
        } else {
            SpdxNode::Or(terms)
        })
    }

    fn parse_and_expr(&mut self) -> Result<SpdxNode, Error> {
        let mut terms = vec![self.parse_simple()?];
        while matches!(self.peek(), Some(Token::And)) {
            self.bump();
            terms.push(self.parse_simple()?);
        }
        Ok(if terms.len() == 1 {
            terms.pop().unwrap()
        } else {
            SpdxNode::And(terms)
        })
    }

    fn parse_simple(&mut self) -> Result<SpdxNode, Error> {
        if matches!(self.peek(), Some(Token::LParen)) {
            let open_position = self.peek_position();
            self.bump();
            let inner = self.parse_expr()?;
            match self.bump() {
                Some(Token::RParen) => return Ok(inner),
                _ => return Err(Error::UnbalancedParens { position: open_position }),
            }
        }

        let id = match self.bump() {
            Some(Token::Ident(id)) => id,
            _ => {
                return Err(Error::UnexpectedToken {
                    position: self.peek_position(),
                    expected: "a license identifier".to_string(),
                })
            }
        };

        let or_later = if matches!(self.peek(), Some(Token::Plus)) {
            self.bump();
            true
        } else {
            false
        };

        let license = SpdxNode::License { id, or_later };

        if matches!(self.peek(), Some(Token::With)) {
            self.bump();
            let exception = match self.bump() {
                Some(Token::Ident(id)) => id,
                _ => {
                    return Err(Error::UnexpectedToken {
                        position: self.peek_position(),
                        expected: "an exception identifier".to_string(),
                    })
                }
            };
            return Ok(SpdxNode::WithException {
                license: Box::new(license),
                exception,
            });
        }

        Ok(license)
    }
}

pub(crate) fn parse(input: &str) -> Result<SpdxNode, Error> {
    if input.trim().is_empty() {
        return Err(Error::Empty);
    }
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(Error::Empty);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    if let Some(tok) = parser.tokens.get(parser.pos) {
        return match tok.token {
            Token::RParen => Err(Error::UnbalancedParens { position: tok.position }),
            Token::Plus => Err(Error::MisplacedPlus { position: tok.position }),
            _ => Err(Error::UnexpectedToken {
                position: tok.position,
                expected: "end of expression".to_string(),
            }),
        };
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_binds_tighter_than_or() {
        let node = parse("MIT OR Apache-2.0 AND BSD-3-Clause").unwrap();
        match node {
            SpdxNode::Or(terms) => {
                assert_eq!(terms.len(), 2);
                assert!(matches!(terms[0], SpdxNode::License { .. }));
                assert!(matches!(terms[1], SpdxNode::And(_)));
            }
            other => panic!("expected Or, got {:?}", other),
        }
    }

    #[test]
    fn parens_override_precedence() {
        let node = parse("(MIT OR Apache-2.0) AND BSD-3-Clause").unwrap();
        match node {
            SpdxNode::And(terms) => {
                assert_eq!(terms.len(), 2);
                assert!(matches!(terms[0], SpdxNode::Or(_)));
            }
            other => panic!("expected And, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(matches!(
            parse("(MIT AND Apache-2.0"),
            Err(Error::UnbalancedParens { .. })
        ));
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(matches!(
            parse("MIT)"),
            Err(Error::UnbalancedParens { .. })
        ));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(parse("   "), Err(Error::Empty)));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let node = parse("mit and apache-2.0").unwrap();
        assert!(matches!(node, SpdxNode::And(_)));
    }

    #[test]
    fn with_exception_parses() {
        let node = parse("GPL-2.0-only WITH Classpath-exception-2.0").unwrap();
        assert!(matches!(node, SpdxNode::WithException { .. }));
    }
}
