// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The output of a planning invocation: removes, already-installed packages, and new installs.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use vcpkg_model::identifiers::{FeatureSpec, PackageSpec, Triplet};
use vcpkg_model::port_provider::SourceControlFileAndLocation;
use vcpkg_platform_expr::PlatformExpr;

use crate::cluster::RequestType;

/// Whether an unsupported port (`supports` evaluating false) is a fatal error or a warning
/// recorded in [`ActionPlan::unsupported_features`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnsupportedPortAction {
    /// Record into `unsupported_features` and omit the action.
    Warn,
    /// Fail the planning invocation.
    Error,
}

/// A `version>=` constraint that the selected version did not satisfy (only ever produced by the
/// versioned planner; an override or a lower baseline can leave a constraint unmet).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VersionConstraintViolation {
    /// The package the constraint was declared against.
    pub constrained_package: PackageSpec,
    /// The minimum version text the constraint required.
    pub required_text: String,
    /// The version text that was actually selected.
    pub selected_text: String,
}

/// One package to be built and installed.
#[derive(Clone, Debug)]
pub struct InstallAction {
    /// The package/triplet being installed.
    pub package: PackageSpec,
    /// The resolved feature set, always including `"core"`.
    pub features: BTreeSet<String>,
    /// Per-feature resolved dependency edges.
    pub dependency_map: HashMap<String, HashSet<FeatureSpec>>,
    /// The flattened set of package/triplets this action depends on (the closure of
    /// `dependency_map`, minus self), in the order the topological sort discovered them.
    pub package_dependencies: Vec<PackageSpec>,
    /// The manifest and its source location.
    pub scfl: Arc<SourceControlFileAndLocation>,
    /// The host triplet this action's host-targeted edges resolved against.
    pub host_triplet: Triplet,
    /// Whether this action was named directly in the request or pulled in transitively.
    pub request_type: RequestType,
    /// Unsatisfied `version>=` constraints, recorded as warnings (versioned planner only).
    pub version_constraint_violations: Vec<VersionConstraintViolation>,
}

/// One package to be removed, ahead of a rebuild or because it's no longer reachable.
#[derive(Clone, Debug)]
pub struct RemoveAction {
    /// The package/triplet being removed.
    pub package: PackageSpec,
}

/// The complete output of a planning invocation.
#[derive(Clone, Debug, Default)]
pub struct ActionPlan {
    /// Packages to remove, topologically sorted over the reverse-dependency edge set. All
    /// removes precede all installs.
    pub remove_actions: Vec<RemoveAction>,
    /// User-requested packages that were already installed and require no action.
    pub already_installed: Vec<InstallAction>,
    /// Packages to install (or reinstall), topologically sorted over the install edge set.
    pub install_actions: Vec<InstallAction>,
    /// Features whose `supports` evaluated false under `UnsupportedPortAction::Warn`.
    pub unsupported_features: HashMap<FeatureSpec, PlatformExpr>,
}
