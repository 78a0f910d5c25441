// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The planner-internal cluster graph: one node per `(package, triplet)`, addressed by an arena
//! index rather than owning pointers, so that self-referential and cyclic dependency edges (a
//! port depending on itself on another triplet) are representable without reference cycles.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use vcpkg_model::identifiers::{FeatureSpec, PackageSpec};
use vcpkg_model::port_provider::SourceControlFileAndLocation;

/// An index into a [`ClusterArena`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ClusterId(u32);

/// Whether a cluster was pulled in transitively or named directly in the planner's request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RequestType {
    /// Pulled in only as someone else's dependency.
    Auto,
    /// Named directly in the planner's `request` argument.
    UserRequested,
}

/// What the status database recorded for this cluster before planning began.
pub struct InstalledState {
    /// Every feature (including `core`) presently installed.
    pub features_installed: HashSet<String>,
    /// The default-feature set recorded at install time.
    pub default_features_snapshot: HashSet<String>,
    /// Whether default features were requested at install time.
    pub defaults_requested: bool,
    /// Installed packages that depend on this one.
    pub reverse_deps: HashSet<PackageSpec>,
}

/// The in-progress install plan for a cluster being installed or reinstalled.
#[derive(Default)]
pub struct InstallInfo {
    /// Per-feature resolved dependency edges (`"core"` and named features only; `default` is
    /// always expanded before being recorded here).
    pub build_edges: HashMap<String, HashSet<FeatureSpec>>,
    /// Concrete feature names (`"core"` plus named features) already resolved for this cluster,
    /// used to avoid re-resolving a feature that's already in the worklist result.
    pub resolved: HashSet<String>,
    /// Minimum-version constraints collected from dependency edges, keyed by the constrained
    /// package. Only ever populated by the versioned planner.
    pub version_constraints: HashMap<PackageSpec, Vec<(String, vcpkg_model::version::VersionScheme)>>,
    /// Whether default features were requested for this install.
    pub defaults_requested: bool,
}

/// One node of the cluster graph: everything known about a `(package, triplet)` during planning.
pub struct Cluster {
    /// The package/triplet this cluster represents.
    pub package: PackageSpec,
    /// The loaded manifest, or the message explaining why it couldn't be loaded. `None` until the
    /// first feature request against this cluster forces the load.
    pub scfl: Option<Result<Arc<SourceControlFileAndLocation>, String>>,
    /// Populated from the status database if this package was already installed.
    pub installed: Option<InstalledState>,
    /// Populated once this cluster enters the install/reinstall worklist.
    pub install_info: Option<InstallInfo>,
    /// Whether this cluster was named directly in the request.
    pub request_type: RequestType,
}

/// An insertion-ordered arena of [`Cluster`]s, addressed by [`ClusterId`].
///
/// Insertion order is significant: §9's design notes call out that tie-breaking in the final
/// topological sort must fall back to first-seen order, not a name sort, to match the original
/// tool's output stability.
#[derive(Default)]
pub struct ClusterArena {
    clusters: Vec<Cluster>,
    index: HashMap<PackageSpec, ClusterId>,
}

impl ClusterId {
    /// The raw arena index, stable for the lifetime of the arena.
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl ClusterArena {
    /// Constructs an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing cluster id for `package`, if any.
    pub fn find(&self, package: &PackageSpec) -> Option<ClusterId> {
        self.index.get(package).copied()
    }

    /// Returns the id for `package`'s cluster, inserting a fresh one (via `make`) if this is the
    /// first time it's been seen.
    pub fn get_or_insert_with(&mut self, package: &PackageSpec, make: impl FnOnce() -> Cluster) -> ClusterId {
        if let Some(id) = self.index.get(package) {
            return *id;
        }
        let id = ClusterId(self.clusters.len() as u32);
        self.clusters.push(make());
        self.index.insert(package.clone(), id);
        id
    }

    /// Borrows the cluster at `id`.
    pub fn get(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id.0 as usize]
    }

    /// Mutably borrows the cluster at `id`.
    pub fn get_mut(&mut self, id: ClusterId) -> &mut Cluster {
        &mut self.clusters[id.0 as usize]
    }

    /// Iterates clusters in insertion order, paired with their id.
    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &Cluster)> {
        self.clusters
            .iter()
            .enumerate()
            .map(|(i, c)| (ClusterId(i as u32), c))
    }

    /// The number of clusters in the arena.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    /// True if the arena holds no clusters.
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}
