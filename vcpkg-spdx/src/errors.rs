// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors returned by `vcpkg-spdx`.

use std::{error, fmt};

/// An error that occurred while parsing an SPDX license expression.
///
/// Unknown license/exception identifiers are *not* represented here: they're collected onto
/// [`crate::SpdxExpr::unknown_identifiers`] instead, since the grammar accepts them.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// The expression was empty.
    Empty,
    /// A token was expected but not found (or an unexpected token was found).
    UnexpectedToken {
        /// Byte offset into the original text.
        position: usize,
        /// What the parser expected to see.
        expected: String,
    },
    /// Parentheses were not balanced by the end of the expression.
    UnbalancedParens {
        /// Byte offset of the last opening paren that was never closed.
        position: usize,
    },
    /// A `+` appeared somewhere other than immediately after a license identifier, or appeared
    /// more than once for the same identifier.
    MisplacedPlus {
        /// Byte offset of the offending `+`.
        position: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Empty => write!(f, "license expression is empty"),
            Error::UnexpectedToken { position, expected } => {
                write!(f, "at position {}: expected {}", position, expected)
            }
            Error::UnbalancedParens { position } => {
                write!(f, "unbalanced '(' opened at position {}", position)
            }
            Error::MisplacedPlus { position } => write!(
                f,
                "'+' at position {} must immediately follow a single license identifier",
                position
            ),
        }
    }
}

impl error::Error for Error {}
