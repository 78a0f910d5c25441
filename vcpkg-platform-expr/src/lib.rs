// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Evaluate vcpkg manifest platform expressions against host/target triplet variables.
//!
//! A manifest's `supports` field and a dependency's `platform` field are small boolean
//! expressions over identifiers such as `windows`, `arm`, or `static` — resolved against a
//! [`PlatformVars`] map drawn from the dependent's triplet. This crate parses those expressions
//! and evaluates them.
//!
//! ```rust
//! use vcpkg_platform_expr::{ParseMode, PlatformExpr, PlatformVars};
//!
//! let expr = PlatformExpr::parse("windows & !arm", ParseMode::Strict).unwrap();
//! let vars = PlatformVars::new("Windows", "x64");
//! assert!(expr.evaluate(&vars));
//!
//! let vars = PlatformVars::new("Windows", "arm64");
//! assert!(!expr.evaluate(&vars));
//! ```
//!
//! ## Optional features
//!
//! * **`summaries`**: serde (de)serialization of [`PlatformExpr`] as its original string form.
//! * **`proptest1`**: property-based test generators for [`PlatformExpr`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![cfg_attr(doc_cfg, feature(doc_cfg, doc_auto_cfg))]

pub mod errors;
mod evaluator;
mod expr;
mod lexer;
mod parser;
#[cfg(feature = "proptest1")]
mod proptest_helpers;
#[cfg(feature = "summaries")]
pub mod summaries;
mod vars;

pub use errors::Error;
pub use expr::{ExprNode, PlatformExpr};
pub use parser::ParseMode;
pub use vars::PlatformVars;
