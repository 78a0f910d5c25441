// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::Error;
use crate::evaluator::evaluate_node;
use crate::parser::{parse, ParseMode};
use crate::vars::PlatformVars;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A parsed platform expression AST node.
///
/// `Any` corresponds to `|`, `All` to `&`, `Not` to a leading `!`. `Ident` is a leaf predicate
/// name looked up in the fixed rule table (see [`crate::vars`]).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExprNode {
    /// Matches if any child matches (`|`).
    Any(Vec<ExprNode>),
    /// Matches if every child matches (`&`).
    All(Vec<ExprNode>),
    /// Matches iff the child does not (`!`).
    Not(Box<ExprNode>),
    /// A leaf predicate name, e.g. `windows`, `arm`, `static`.
    Ident(String),
}

/// A parsed platform expression, as found in a manifest's `supports` or a dependency's
/// `platform` field.
///
/// The always-true sentinel (an empty expression string) is represented distinctly so that
/// [`PlatformExpr::is_empty`] can report it without an evaluation.
#[derive(Clone, Debug)]
pub struct PlatformExpr {
    original: Arc<str>,
    node: Option<Arc<ExprNode>>,
}

impl PlatformExpr {
    /// Parses `input` as a platform expression under the given [`ParseMode`].
    ///
    /// An empty (or all-whitespace) string parses to the always-true sentinel; see
    /// [`PlatformExpr::is_empty`].
    pub fn parse(input: &str, mode: ParseMode) -> Result<Self, Error> {
        if input.trim().is_empty() {
            return Ok(Self {
                original: Arc::from(input),
                node: None,
            });
        }
        let node = parse(input, mode)?;
        Ok(Self {
            original: Arc::from(input),
            node: Some(Arc::new(node)),
        })
    }

    /// Returns the always-true sentinel expression.
    pub fn always_true() -> Self {
        Self {
            original: Arc::from(""),
            node: None,
        }
    }

    /// True iff this is the always-true sentinel (an empty `supports`/`platform` expression).
    pub fn is_empty(&self) -> bool {
        self.node.is_none()
    }

    /// Returns the original source text this was parsed from.
    pub fn expression_str(&self) -> &str {
        &self.original
    }

    /// Evaluates this expression against the given variable map.
    ///
    /// The always-true sentinel always evaluates to `true`.
    pub fn evaluate(&self, vars: &PlatformVars) -> bool {
        match &self.node {
            None => true,
            Some(node) => evaluate_node(node, vars),
        }
    }

    /// Returns the root AST node, or `None` for the always-true sentinel.
    pub fn node(&self) -> Option<&ExprNode> {
        self.node.as_deref()
    }
}

impl PartialEq for PlatformExpr {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for PlatformExpr {}

impl fmt::Display for PlatformExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original)
    }
}

impl FromStr for PlatformExpr {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input, ParseMode::Strict)
    }
}
