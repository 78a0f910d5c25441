// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only view over the installed-prefix status database, as consumed by the planner.

use crate::identifiers::{FeatureName, PackageSpec, CORE_FEATURE};
use std::collections::{HashMap, HashSet};

/// What the installed-prefix wants to do with a `(package, feature)` pair.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Want {
    /// The feature should be (or is being) installed.
    Install,
    /// The feature should be (or is being) removed.
    Purge,
}

/// The on-disk installation state of a `(package, feature)` pair.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InstallState {
    /// Installation started but did not complete.
    HalfInstalled,
    /// Fully installed.
    Installed,
    /// Not installed.
    NotInstalled,
}

/// One record of the status database, keyed by `(PackageSpec, FeatureName)`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusParagraph {
    /// The package/triplet this record describes.
    pub package: PackageSpec,
    /// The feature this record describes (including the `core` pseudo-feature).
    pub feature: String,
    /// What the installed-prefix wants for this pair.
    pub want: Want,
    /// Its current installation state.
    pub state: InstallState,
}

/// A view over an installed package's dependency edges, as recorded at install time.
pub struct InstalledPackageView {
    /// The package/triplet.
    pub package: PackageSpec,
    /// Its recorded dependencies.
    pub dependencies: Vec<PackageSpec>,
}

impl InstalledPackageView {
    /// The dependencies recorded for this installed package.
    pub fn dependencies(&self) -> &[PackageSpec] {
        &self.dependencies
    }
}

/// Read-only interface the planner uses to query the installed prefix.
///
/// Implementations must not mutate anything reachable through `&self`: a planning invocation
/// against an immutable snapshot must be safe to call repeatedly (vcpkg's `--dry-run`-style
/// check against a never-mutated `StatusDb`).
pub trait StatusDb {
    /// Finds the status record for `(package, "core")`, used as the existence check for
    /// "is this package installed at all".
    fn find_installed(&self, package: &PackageSpec) -> Option<&StatusParagraph>;

    /// The set of features currently installed for `package` (always including `core` if
    /// installed at all).
    fn installed_features(&self, package: &PackageSpec) -> HashSet<String>;

    /// The default-features snapshot recorded at install time, used to detect defaults drift.
    fn installed_default_snapshot(&self, package: &PackageSpec) -> HashSet<String>;

    /// True if the given feature is installed.
    fn is_installed(&self, package: &PackageSpec, feature: &str) -> bool;

    /// A view over an installed package's recorded dependency edges, if installed.
    fn get_installed_package_view(&self, package: &PackageSpec) -> Option<InstalledPackageView>;

    /// The reverse-dependency edges recorded for `package` (installed packages that depend on
    /// it), used to seed the reinstall cascade.
    fn reverse_deps(&self, package: &PackageSpec) -> HashSet<PackageSpec>;

    /// Every package currently installed, in first-seen order.
    fn installed_packages(&self) -> Vec<PackageSpec>;
}

/// A simple in-memory [`StatusDb`], used by tests and by callers that load the status file
/// eagerly rather than querying it lazily.
#[derive(Default)]
pub struct MemoryStatusDb {
    records: Vec<StatusParagraph>,
    default_snapshots: HashMap<PackageSpec, HashSet<String>>,
    dependencies: HashMap<PackageSpec, Vec<PackageSpec>>,
    insertion_order: Vec<PackageSpec>,
}

impl MemoryStatusDb {
    /// Constructs an empty status database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an installed package with the given installed features, default-features
    /// snapshot, and recorded dependencies.
    pub fn install(
        &mut self,
        package: PackageSpec,
        features: impl IntoIterator<Item = String>,
        default_snapshot: impl IntoIterator<Item = String>,
        dependencies: Vec<PackageSpec>,
    ) {
        if !self.insertion_order.contains(&package) {
            self.insertion_order.push(package.clone());
        }
        let mut feature_set: HashSet<String> = features.into_iter().collect();
        feature_set.insert(CORE_FEATURE.to_string());
        for feature in feature_set {
            self.records.push(StatusParagraph {
                package: package.clone(),
                feature,
                want: Want::Install,
                state: InstallState::Installed,
            });
        }
        self.default_snapshots
            .insert(package.clone(), default_snapshot.into_iter().collect());
        self.dependencies.insert(package, dependencies);
    }
}

impl StatusDb for MemoryStatusDb {
    fn find_installed(&self, package: &PackageSpec) -> Option<&StatusParagraph> {
        self.records
            .iter()
            .find(|r| &r.package == package && r.feature == CORE_FEATURE && r.state == InstallState::Installed)
    }

    fn installed_features(&self, package: &PackageSpec) -> HashSet<String> {
        self.records
            .iter()
            .filter(|r| &r.package == package && r.state == InstallState::Installed)
            .map(|r| r.feature.clone())
            .collect()
    }

    fn installed_default_snapshot(&self, package: &PackageSpec) -> HashSet<String> {
        self.default_snapshots.get(package).cloned().unwrap_or_default()
    }

    fn is_installed(&self, package: &PackageSpec, feature: &str) -> bool {
        self.records
            .iter()
            .any(|r| &r.package == package && r.feature == feature && r.state == InstallState::Installed)
    }

    fn get_installed_package_view(&self, package: &PackageSpec) -> Option<InstalledPackageView> {
        if self.find_installed(package).is_none() {
            return None;
        }
        Some(InstalledPackageView {
            package: package.clone(),
            dependencies: self.dependencies.get(package).cloned().unwrap_or_default(),
        })
    }

    fn reverse_deps(&self, package: &PackageSpec) -> HashSet<PackageSpec> {
        self.dependencies
            .iter()
            .filter(|(_, deps)| deps.contains(package))
            .map(|(dependent, _)| dependent.clone())
            .collect()
    }

    fn installed_packages(&self) -> Vec<PackageSpec> {
        self.insertion_order.clone()
    }
}

#[allow(dead_code)]
fn _feature_name_used(_: &FeatureName) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::{PackageName, Triplet};

    fn spec(name: &str) -> PackageSpec {
        PackageSpec::new(PackageName::new(name).unwrap(), Triplet::new("x64-linux").unwrap())
    }

    #[test]
    fn install_marks_core_and_features() {
        let mut db = MemoryStatusDb::new();
        db.install(spec("a"), vec!["a1".to_string()], vec!["a1".to_string()], vec![]);
        assert!(db.is_installed(&spec("a"), "core"));
        assert!(db.is_installed(&spec("a"), "a1"));
        assert!(!db.is_installed(&spec("a"), "a2"));
    }

    #[test]
    fn reverse_deps_are_derived_from_dependencies() {
        let mut db = MemoryStatusDb::new();
        db.install(spec("b"), vec![], vec![], vec![]);
        db.install(spec("a"), vec![], vec![], vec![spec("b")]);
        assert_eq!(db.reverse_deps(&spec("b")), [spec("a")].into_iter().collect());
    }
}
