// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::parser;
use crate::tables::{self, EXCEPTION_IDS, LICENSE_IDS};
use crate::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// A single node in a parsed SPDX license expression's abstract syntax tree.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SpdxNode {
    /// A bare license identifier, optionally suffixed with `+` (meaning "this version or any
    /// later version").
    License {
        /// The identifier as canonicalized against [`crate`]'s known-license table, or as
        /// written by the caller if it wasn't recognized.
        id: String,
        /// Whether the identifier was suffixed with `+`.
        or_later: bool,
    },
    /// `<license> WITH <exception>`.
    WithException {
        /// The license half. Always a [`SpdxNode::License`].
        license: Box<SpdxNode>,
        /// The exception identifier, canonicalized if recognized.
        exception: String,
    },
    /// A conjunction. Always has at least two children; children are never themselves `And`
    /// (nested `AND`s are flattened during parsing).
    And(Vec<SpdxNode>),
    /// A disjunction. Always has at least two children; children are never themselves `Or`.
    Or(Vec<SpdxNode>),
}

impl SpdxNode {
    fn render(&self, out: &mut String, parent_is_or: bool) {
        match self {
            SpdxNode::License { id, or_later } => {
                out.push_str(tables::canonicalize(LICENSE_IDS, id).unwrap_or(id));
                if *or_later {
                    out.push('+');
                }
            }
            SpdxNode::WithException { license, exception } => {
                license.render(out, parent_is_or);
                out.push_str(" WITH ");
                out.push_str(tables::canonicalize(EXCEPTION_IDS, exception).unwrap_or(exception));
            }
            SpdxNode::And(children) => {
                let needs_parens = parent_is_or;
                if needs_parens {
                    out.push('(');
                }
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" AND ");
                    }
                    child.render(out, false);
                }
                if needs_parens {
                    out.push(')');
                }
            }
            SpdxNode::Or(children) => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" OR ");
                    }
                    child.render(out, true);
                }
            }
        }
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            SpdxNode::License { id, .. } => out.push(id),
            SpdxNode::WithException { license, exception } => {
                license.collect_identifiers(out);
                out.push(exception);
            }
            SpdxNode::And(children) | SpdxNode::Or(children) => {
                for child in children {
                    child.collect_identifiers(out);
                }
            }
        }
    }
}

/// One top-level `AND` conjunct of a parsed expression, rendered back to text.
///
/// [`SpdxExpr::applicable_licenses`] splits a top-level conjunction into one entry per conjunct,
/// since each is independently "a license that applies" to the package (vcpkg's own license
/// field documentation describes `AND` this way: every term must be satisfied, so each is itself
/// an applicable license expression).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApplicableLicense {
    /// The conjunct, rendered as SPDX text.
    pub text: String,
    /// Whether `text` came from an `OR` subtree (and would need parenthesizing if it were spliced
    /// back into a larger `AND` expression).
    pub needs_parens: bool,
}

/// A parsed, canonicalized SPDX license expression.
#[derive(Clone, Debug)]
pub struct SpdxExpr {
    original: Arc<str>,
    root: Arc<SpdxNode>,
    unknown_identifiers: Arc<[String]>,
}

impl SpdxExpr {
    /// Parses `input` as an SPDX license expression.
    ///
    /// Never fails because of an unrecognized license or exception identifier -- only grammar
    /// violations are errors. Use [`SpdxExpr::unknown_identifiers`] to see what wasn't
    /// recognized.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let root = parser::parse(input)?;

        let mut idents = Vec::new();
        root.collect_identifiers(&mut idents);
        let mut unknown: Vec<String> = idents
            .into_iter()
            .filter(|ident| {
                tables::canonicalize(LICENSE_IDS, ident).is_none()
                    && tables::canonicalize(EXCEPTION_IDS, ident).is_none()
            })
            .map(|s| s.to_string())
            .collect();
        unknown.sort();
        unknown.dedup();

        Ok(SpdxExpr {
            original: Arc::from(input),
            root: Arc::new(root),
            unknown_identifiers: Arc::from(unknown),
        })
    }

    /// The original text this expression was parsed from.
    pub fn source(&self) -> &str {
        &self.original
    }

    /// The root of the parsed expression tree.
    pub fn node(&self) -> &SpdxNode {
        &self.root
    }

    /// Identifiers used in the expression that weren't found in this crate's known license or
    /// exception tables, sorted and deduplicated. Empty for a fully-recognized expression.
    pub fn unknown_identifiers(&self) -> &[String] {
        &self.unknown_identifiers
    }

    /// Renders the expression with canonical identifier casing and minimal parenthesization.
    ///
    /// `AND` binds tighter than `OR`, so only an `AND` subtree directly nested under `OR` is
    /// wrapped in parens; a top-level expression or one under another `AND`/`WITH` never is.
    pub fn to_canonical_string(&self) -> String {
        let mut out = String::new();
        self.root.render(&mut out, false);
        out
    }

    /// Splits a top-level `AND` conjunction into one [`ApplicableLicense`] per conjunct. A
    /// non-`AND` expression yields a single entry.
    pub fn applicable_licenses(&self) -> Vec<ApplicableLicense> {
        match &*self.root {
            SpdxNode::And(children) => children
                .iter()
                .map(|child| {
                    let mut text = String::new();
                    child.render(&mut text, false);
                    ApplicableLicense {
                        text,
                        needs_parens: matches!(child, SpdxNode::Or(_)),
                    }
                })
                .collect(),
            other => {
                let mut text = String::new();
                other.render(&mut text, false);
                vec![ApplicableLicense {
                    text,
                    needs_parens: false,
                }]
            }
        }
    }
}

impl PartialEq for SpdxExpr {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl Eq for SpdxExpr {}

impl fmt::Display for SpdxExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_canonical_string())
    }
}

impl FromStr for SpdxExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        SpdxExpr::parse(s)
    }
}
