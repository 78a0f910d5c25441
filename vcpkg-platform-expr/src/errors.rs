// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors returned by `vcpkg-platform-expr`.

use std::{error, fmt};

/// An error that happened during platform-expression parsing.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The expression text could not be tokenized or did not match the grammar.
    ParseError {
        /// The original expression text.
        input: String,
        /// Byte offset into `input` where the error was detected.
        position: usize,
        /// A human-readable description of what went wrong.
        message: String,
    },
    /// Strict mode saw more than one occurrence of the same binary operator at a single
    /// nesting level without parentheses disambiguating the grouping.
    AmbiguousChain {
        /// The original expression text.
        input: String,
        /// Byte offset of the offending operator.
        position: usize,
        /// `"&"` or `"|"`.
        operator: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ParseError {
                input,
                position,
                message,
            } => write!(
                f,
                "failed to parse platform expression '{}' at position {}: {}",
                input, position, message
            ),
            Error::AmbiguousChain {
                input,
                position,
                operator,
            } => write!(
                f,
                "platform expression '{}' chains '{}' at position {} without parentheses; \
                 strict mode requires explicit grouping",
                input, operator, position
            ),
        }
    }
}

impl error::Error for Error {}
