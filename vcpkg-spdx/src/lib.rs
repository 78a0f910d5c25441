// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parse and canonicalize the SPDX license expressions embedded in vcpkg manifests' `license`
//! field.
//!
//! ```rust
//! use vcpkg_spdx::SpdxExpr;
//!
//! let expr = SpdxExpr::parse("(mit OR apache-2.0) AND BSD-3-Clause").unwrap();
//! assert_eq!(expr.to_canonical_string(), "(MIT OR Apache-2.0) AND BSD-3-Clause");
//!
//! let applicable: Vec<_> = expr.applicable_licenses().into_iter().map(|l| l.text).collect();
//! assert_eq!(applicable, vec!["MIT OR Apache-2.0", "BSD-3-Clause"]);
//! ```
//!
//! Unknown license and exception identifiers are accepted (SPDX allows `LicenseRef-` style
//! custom identifiers, and vcpkg's own list lags the SPDX license list); [`SpdxExpr::parse`]
//! never fails because of an unrecognized identifier, only because of a grammar violation. Use
//! [`SpdxExpr::unknown_identifiers`] to recover what wasn't recognized, for a caller that wants
//! to warn on it (as described in the module's design notes: strict parsing is a hard error,
//! lenient parsing reports unknowns as warnings -- this crate always parses leniently and lets
//! the caller decide how to treat [`SpdxExpr::unknown_identifiers`]).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod errors;
mod expr;
mod parser;
#[cfg(feature = "summaries")]
pub mod summaries;
mod tables;

pub use errors::Error;
pub use expr::{ApplicableLicense, SpdxExpr, SpdxNode};
