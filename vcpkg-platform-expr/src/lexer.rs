// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Spanned {
    pub(crate) token: Token,
    pub(crate) position: usize,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Spanned>, (usize, String)> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '&' => {
                tokens.push(Spanned {
                    token: Token::And,
                    position: i,
                });
                i += 1;
            }
            '|' => {
                tokens.push(Spanned {
                    token: Token::Or,
                    position: i,
                });
                i += 1;
            }
            '!' => {
                tokens.push(Spanned {
                    token: Token::Not,
                    position: i,
                });
                i += 1;
            }
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
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' => {
                let start = i;
                while i < bytes.len() {
                    let c = bytes[i] as char;
                    if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                        i += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Spanned {
                    token: Token::Ident(input[start..i].to_string()),
                    position: start,
                });
            }
            other => {
                return Err((i, format!("unexpected character '{}'", other)));
            }
        }
    }
    Ok(tokens)
}
