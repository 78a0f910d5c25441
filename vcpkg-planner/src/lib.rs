// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Build install/remove plans from vcpkg port manifests, a registry set, and a status database.
//!
//! `vcpkg-planner` implements the two planning modes a manifest-driven install resolves through:
//! classic (unversioned) feature planning ([`classic::create_feature_install_plan`]), which seeds
//! its worklist straight from the status database and the caller's request, and versioned
//! (manifest-mode) planning ([`versioned::create_versioned_install_plan`]), which first pins a
//! single selected version per reachable package against a baseline and `version>=` constraints
//! before running the same feature traversal scoped to each package's selected manifest.
//!
//! Both modes emit an [`action::ActionPlan`]: a topologically sorted list of removes (always
//! ahead of installs) and installs, plus any already-satisfied user requests and any ports
//! excluded by an unsupported `supports` expression. [`format::format_plan`] partitions an
//! `ActionPlan` into the grouping a console report would show.
//!
//! # Examples
//!
//! ```
//! use vcpkg_model::identifiers::{FullPackageSpec, PackageName, PackageSpec, Triplet};
//! use vcpkg_model::port_provider::PortFileProvider;
//! use vcpkg_model::registry::RegistrySet;
//! use vcpkg_model::status_db::MemoryStatusDb;
//! use vcpkg_planner::action::UnsupportedPortAction;
//! use vcpkg_planner::var_provider::StaticVarProvider;
//!
//! let provider = PortFileProvider::new(vec![], RegistrySet { default: None, extra: vec![] });
//! let status_db = MemoryStatusDb::new();
//! let triplet = Triplet::new("x64-linux").unwrap();
//! let request: Vec<FullPackageSpec> = vec![]; // Plans nothing, never touches the provider.
//! let mut vars = StaticVarProvider::new();
//!
//! let plan = vcpkg_planner::classic::create_feature_install_plan(
//!     &provider,
//!     &mut vars,
//!     &request,
//!     &status_db,
//!     &triplet,
//!     UnsupportedPortAction::Warn,
//! )
//! .unwrap();
//! assert!(plan.install_actions.is_empty());
//! # let _ = PackageSpec::new(PackageName::new("unused").unwrap(), triplet);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod action;
pub mod classic;
pub mod cluster;
pub mod errors;
pub mod format;
pub mod manifest_source;
pub mod topo;
pub mod var_provider;
pub mod versioned;

pub use errors::PlanError;
