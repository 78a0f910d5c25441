// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a project manifest's `dependencies` list into the top-level `request` the planner
//! takes, the way the real tool's manifest-mode install builds its request from `vcpkg.json`.
//!
//! This is a deliberate simplification: [`vcpkg_model::identifiers::FullPackageSpec`] only
//! distinguishes "no explicit features" (request defaults) from "an explicit feature list" (no
//! defaults unless named), while a manifest [`Dependency`] tracks `default_features` and
//! `features` independently. The planner's own feature traversal (`vcpkg_planner::classic`)
//! preserves that distinction faithfully for every edge *between* ports; only this top-level,
//! demonstration-only request-seeding step collapses "defaults plus an explicit feature list"
//! down to "an explicit feature list, no defaults" -- acceptable here because the CLI is a thin
//! harness (`SPEC_FULL.md` §A), not the planner itself.

use color_eyre::eyre::Result;
use vcpkg_model::identifiers::{FeatureName, FullPackageSpec, PackageName, PackageSpec, Triplet, CORE_FEATURE};
use vcpkg_model::manifest::Dependency;

/// Builds one [`FullPackageSpec`] per dependency, retargeting `host: true` edges to
/// `host_triplet`.
pub fn request_from_dependencies(
    deps: &[Dependency],
    target_triplet: &Triplet,
    host_triplet: &Triplet,
) -> Result<Vec<FullPackageSpec>> {
    deps.iter()
        .map(|dep| {
            let triplet = if dep.host { host_triplet.clone() } else { target_triplet.clone() };
            let package = PackageSpec::new(PackageName::new(dep.name.clone())?, triplet);
            let features = dep
                .features
                .iter()
                .filter(|f| f.as_str() != CORE_FEATURE)
                .map(|f| FeatureName::new(f.clone()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(FullPackageSpec::new(package, features))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use vcpkg_platform_expr::PlatformExpr;

    fn dep(name: &str, host: bool, features: &[&str]) -> Dependency {
        Dependency {
            name: name.to_string(),
            features: features.iter().map(|s| s.to_string()).collect(),
            default_features: true,
            host,
            platform: PlatformExpr::always_true(),
            constraint: None,
            extra_info: IndexMap::new(),
        }
    }

    #[test]
    fn host_dependency_targets_host_triplet() {
        let target = Triplet::new("x64-linux").unwrap();
        let host = Triplet::new("x64-windows").unwrap();
        let deps = vec![dep("cmake", true, &[])];
        let request = request_from_dependencies(&deps, &target, &host).unwrap();
        assert_eq!(request[0].package.triplet, host);
    }

    #[test]
    fn target_dependency_keeps_target_triplet() {
        let target = Triplet::new("x64-linux").unwrap();
        let host = Triplet::new("x64-windows").unwrap();
        let deps = vec![dep("zlib", false, &["ssl"])];
        let request = request_from_dependencies(&deps, &target, &host).unwrap();
        assert_eq!(request[0].package.triplet, target);
        assert_eq!(request[0].features[0].as_str(), "ssl");
    }
}
