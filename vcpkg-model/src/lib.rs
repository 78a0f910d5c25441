// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parse and model vcpkg-style port and project manifests.
//!
//! `vcpkg-model` provides the data model a dependency-resolution planner builds on: manifest
//! parsing (`vcpkg.json` port and project files), version schemes and comparison, a layered
//! registry set with baseline and version-database lookups, an overlay-aware port file provider,
//! a status-database read view, and registry-set configuration parsing.
//!
//! # Optional features
//!
//! * `proptest1`: Support for [property-based testing](https://altsysrq.github.io/proptest-book/intro.html)
//!   of the identifier and version types.
//! * `summaries`: Serde support for writing out [`vcpkg_spdx::SpdxExpr`] and related types in
//!   TOML build summaries.
//!
//! # Examples
//!
//! Parse a port manifest and inspect its declared dependencies:
//!
//! ```
//! use vcpkg_model::manifest::parse_port_manifest;
//!
//! let value: serde_json::Value = serde_json::from_str(r#"{
//!     "name": "zlib",
//!     "version": "1.2.13",
//!     "dependencies": ["vcpkg-cmake"]
//! }"#).unwrap();
//! let scf = parse_port_manifest(&value, "zlib/vcpkg.json").unwrap();
//! assert_eq!(scf.core.name.as_deref(), Some("zlib"));
//! assert_eq!(scf.core.dependencies.len(), 1);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod errors;
pub mod identifiers;
pub mod manifest;
pub mod port_provider;
pub mod registry;
pub mod status_db;
pub mod version;

pub use errors::Error;

// Public re-exports for upstream crates used in the manifest/registry APIs. The no_inline ensures
// that they show up as re-exports in documentation rather than as opaque paths.
#[doc(no_inline)]
pub use serde_json::Value as JsonValue;
#[doc(no_inline)]
pub use vcpkg_platform_expr::PlatformExpr;
#[doc(no_inline)]
pub use vcpkg_spdx::SpdxExpr;
