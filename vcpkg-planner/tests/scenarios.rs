// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The concrete scenarios and quantified invariants from the classic planner's design section,
//! run against hand-built in-memory manifests rather than real port files.

use std::collections::HashMap;
use std::sync::Arc;

use vcpkg_model::identifiers::{
    FeatureName, FullPackageSpec, PackageName, PackageSpec, Triplet, CORE_FEATURE,
};
use vcpkg_model::manifest::{
    ConfigurationSource, CoreParagraph, Dependency, DefaultFeatureEntry, FeatureParagraph,
    SourceControlFile,
};
use vcpkg_model::port_provider::{PortSource, SourceControlFileAndLocation};
use vcpkg_model::status_db::MemoryStatusDb;
use vcpkg_model::version::{Version, VersionScheme};
use vcpkg_planner::action::UnsupportedPortAction;
use vcpkg_planner::cluster::RequestType;
use vcpkg_planner::manifest_source::ManifestSource;
use vcpkg_planner::var_provider::StaticVarProvider;
use vcpkg_platform_expr::PlatformExpr;

fn triplet(name: &str) -> Triplet {
    Triplet::new(name).unwrap()
}

fn spec(name: &str, triplet_name: &str) -> PackageSpec {
    PackageSpec::new(PackageName::new(name).unwrap(), triplet(triplet_name))
}

fn full(name: &str, triplet_name: &str, features: &[&str]) -> FullPackageSpec {
    FullPackageSpec::new(
        spec(name, triplet_name),
        features.iter().map(|f| FeatureName::new(*f).unwrap()).collect(),
    )
}

fn dep(name: &str) -> Dependency {
    dep_full(name, &[], true, false)
}

fn dep_full(name: &str, features: &[&str], default_features: bool, host: bool) -> Dependency {
    Dependency {
        name: name.to_string(),
        features: features.iter().map(|f| f.to_string()).collect(),
        default_features,
        host,
        platform: PlatformExpr::always_true(),
        constraint: None,
        extra_info: Default::default(),
    }
}

fn core(name: &str, deps: Vec<Dependency>, default_feature_names: &[&str]) -> CoreParagraph {
    CoreParagraph {
        name: Some(name.to_string()),
        version: Version::parse("1.0", VersionScheme::Relaxed, "test").unwrap(),
        version_scheme: VersionScheme::Relaxed,
        maintainers: vec![],
        description: vec![],
        summary: vec![],
        homepage: None,
        documentation: None,
        license: None,
        supports: PlatformExpr::always_true(),
        dependencies: deps,
        default_features: default_feature_names
            .iter()
            .map(|n| DefaultFeatureEntry {
                name: n.to_string(),
                platform: PlatformExpr::always_true(),
            })
            .collect(),
        overrides: vec![],
        builtin_baseline: None,
        configuration: None,
        configuration_source: ConfigurationSource::None,
    }
}

fn feature(name: &str, deps: Vec<Dependency>) -> FeatureParagraph {
    FeatureParagraph {
        name: name.to_string(),
        description: vec![],
        dependencies: deps,
        supports: PlatformExpr::always_true(),
        license: None,
    }
}

fn port(core_paragraph: CoreParagraph, features: Vec<FeatureParagraph>) -> SourceControlFile {
    SourceControlFile {
        core: core_paragraph,
        features,
        extra_info: Default::default(),
    }
}

/// A [`ManifestSource`] backed by a fixed map of hand-built manifests, standing in for a real
/// [`vcpkg_model::port_provider::PortFileProvider`] in these tests.
#[derive(Default)]
struct MapManifestSource(HashMap<String, SourceControlFile>);

impl MapManifestSource {
    fn insert(&mut self, name: &str, scf: SourceControlFile) -> &mut Self {
        self.0.insert(name.to_string(), scf);
        self
    }
}

impl ManifestSource for MapManifestSource {
    fn load(&self, name: &str) -> Result<Arc<SourceControlFileAndLocation>, String> {
        self.0
            .get(name)
            .cloned()
            .map(|scf| {
                Arc::new(SourceControlFileAndLocation {
                    scf,
                    source: PortSource::Registry,
                })
            })
            .ok_or_else(|| format!("no manifest registered for '{}'", name))
    }
}

fn install_names(actions: &[vcpkg_planner::action::InstallAction]) -> Vec<String> {
    actions.iter().map(|a| a.package.name.to_string()).collect()
}

/// S1 -- linear chain `a -> b -> c`, `c -> ∅`. Request `a`. Expected install order `c, b, a`.
#[test]
fn s1_linear_chain_installs_dependencies_first() {
    let mut ports = MapManifestSource::default();
    ports.insert("a", port(core("a", vec![dep("b")], &[]), vec![]));
    ports.insert("b", port(core("b", vec![dep("c")], &[]), vec![]));
    ports.insert("c", port(core("c", vec![], &[]), vec![]));

    let status_db = MemoryStatusDb::new();
    let mut vars = StaticVarProvider::new();
    let request = vec![full("a", "x64-linux", &[])];

    let plan = vcpkg_planner::classic::create_feature_install_plan(
        &ports,
        &mut vars,
        &request,
        &status_db,
        &triplet("x64-linux"),
        UnsupportedPortAction::Warn,
    )
    .unwrap();

    assert_eq!(install_names(&plan.install_actions), vec!["c", "b", "a"]);
    for action in &plan.install_actions {
        assert_eq!(action.features, ["core".to_string()].into_iter().collect());
    }
}

/// S2 -- `a` depends on `b[core]` (`default_features=false`, so the edge itself requests no
/// defaults); `b` declares defaults `[b1]` and features `{b0, b1}`. Request `a`. `b` is pulled in
/// only as a dependency (not separately user-requested), so its defaults are added regardless:
/// `{core, b1}`.
#[test]
fn s2_default_features_of_unrequested_dependency_are_added() {
    let mut ports = MapManifestSource::default();
    ports.insert(
        "a",
        port(core("a", vec![dep_full("b", &["core"], false, false)], &[]), vec![]),
    );
    ports.insert(
        "b",
        port(
            core("b", vec![], &["b1"]),
            vec![feature("b0", vec![]), feature("b1", vec![])],
        ),
    );

    let status_db = MemoryStatusDb::new();
    let mut vars = StaticVarProvider::new();
    let request = vec![full("a", "x64-linux", &[])];

    let plan = vcpkg_planner::classic::create_feature_install_plan(
        &ports,
        &mut vars,
        &request,
        &status_db,
        &triplet("x64-linux"),
        UnsupportedPortAction::Warn,
    )
    .unwrap();

    let b = plan
        .install_actions
        .iter()
        .find(|a| a.package.name.as_str() == "b")
        .unwrap();
    assert_eq!(b.features, ["core", "b1"].map(String::from).into_iter().collect());
    let a = plan
        .install_actions
        .iter()
        .find(|a| a.package.name.as_str() == "a")
        .unwrap();
    assert_eq!(a.features, [CORE_FEATURE.to_string()].into_iter().collect());
}

/// S3 -- defaults suppressed by an explicit user request. `FullPackageSpec`'s feature set models
/// "apply defaults" as the empty set (per §4.8 step 2); any nonempty explicit request -- here,
/// `b` named directly with feature `b0` -- therefore never seeds the synthetic `default` feature,
/// so `b1` (declared default) is never pulled in.
#[test]
fn s3_explicit_nonempty_request_suppresses_defaults() {
    let mut ports = MapManifestSource::default();
    ports.insert("a", port(core("a", vec![dep("b")], &[]), vec![]));
    ports.insert(
        "b",
        port(
            core("b", vec![], &["b1"]),
            vec![feature("b0", vec![]), feature("b1", vec![])],
        ),
    );

    let status_db = MemoryStatusDb::new();
    let mut vars = StaticVarProvider::new();
    let request = vec![full("a", "x64-linux", &[]), full("b", "x64-linux", &["b0"])];

    let plan = vcpkg_planner::classic::create_feature_install_plan(
        &ports,
        &mut vars,
        &request,
        &status_db,
        &triplet("x64-linux"),
        UnsupportedPortAction::Warn,
    )
    .unwrap();

    let b = plan
        .install_actions
        .iter()
        .find(|a| a.package.name.as_str() == "b")
        .unwrap();
    assert_eq!(b.features, ["core", "b0"].map(String::from).into_iter().collect());
    assert!(!b.features.contains("b1"));
    assert_eq!(b.request_type, RequestType::UserRequested);
}

/// S4 -- reinstall on new feature. `a`/`core` is installed; `a` declares feature `a1`; `c`
/// depends on `a[a1]`. Requesting `c` forces `a` to be rebuilt with `{core, a1}` ahead of `c`.
#[test]
fn s4_new_transitive_feature_forces_reinstall() {
    let mut ports = MapManifestSource::default();
    ports.insert("a", port(core("a", vec![], &[]), vec![feature("a1", vec![])]));
    ports.insert(
        "c",
        port(core("c", vec![dep_full("a", &["a1"], false, false)], &[]), vec![]),
    );

    let mut status_db = MemoryStatusDb::new();
    status_db.install(spec("a", "x64-linux"), vec![], vec![], vec![]);

    let mut vars = StaticVarProvider::new();
    let request = vec![full("c", "x64-linux", &[])];

    let plan = vcpkg_planner::classic::create_feature_install_plan(
        &ports,
        &mut vars,
        &request,
        &status_db,
        &triplet("x64-linux"),
        UnsupportedPortAction::Warn,
    )
    .unwrap();

    assert_eq!(
        plan.remove_actions.iter().map(|r| r.package.name.to_string()).collect::<Vec<_>>(),
        vec!["a"]
    );
    assert_eq!(install_names(&plan.install_actions), vec!["a", "c"]);
    let a = &plan.install_actions[0];
    assert_eq!(a.features, ["core", "a1"].map(String::from).into_iter().collect());
    let c = &plan.install_actions[1];
    assert_eq!(c.features, [CORE_FEATURE.to_string()].into_iter().collect());
}

/// S5 -- transitive feature-list propagation. `a`'s feature `0` depends on `b[0]`, `b`'s feature
/// `0` depends on `c[0]`, `c`'s feature `0` depends on nothing. Requesting `a`'s feature `0`
/// directly (the only feature `a` declares, so equivalent to requesting all of them) propagates
/// `0` through the whole chain.
#[test]
fn s5_feature_list_propagates_transitively() {
    let mut ports = MapManifestSource::default();
    ports.insert(
        "a",
        port(
            core("a", vec![], &[]),
            vec![feature("0", vec![dep_full("b", &["0"], false, false)])],
        ),
    );
    ports.insert(
        "b",
        port(
            core("b", vec![], &[]),
            vec![feature("0", vec![dep_full("c", &["0"], false, false)])],
        ),
    );
    ports.insert("c", port(core("c", vec![], &[]), vec![feature("0", vec![])]));

    let status_db = MemoryStatusDb::new();
    let mut vars = StaticVarProvider::new();
    let request = vec![full("a", "x64-linux", &["0"])];

    let plan = vcpkg_planner::classic::create_feature_install_plan(
        &ports,
        &mut vars,
        &request,
        &status_db,
        &triplet("x64-linux"),
        UnsupportedPortAction::Warn,
    )
    .unwrap();

    assert_eq!(install_names(&plan.install_actions), vec!["c", "b", "a"]);
    for action in &plan.install_actions {
        assert_eq!(action.features, ["core", "0"].map(String::from).into_iter().collect());
    }
}

/// S6 -- upgrading to a manifest with a new default pulls that default in. `a` is installed with
/// no features recorded; the new manifest declares features `{0,1,2}` with defaults `{0,1}`. This
/// is the same classic planner invocation as any other request -- an "upgrade" is just planning
/// against a newer manifest for an already-installed package.
#[test]
fn s6_upgrade_adds_a_new_default_but_not_unselected_features() {
    let mut ports = MapManifestSource::default();
    ports.insert(
        "a",
        port(
            core("a", vec![], &["0", "1"]),
            vec![feature("0", vec![]), feature("1", vec![]), feature("2", vec![])],
        ),
    );

    let mut status_db = MemoryStatusDb::new();
    status_db.install(spec("a", "x64-linux"), vec![], vec![], vec![]);

    let mut vars = StaticVarProvider::new();
    let request = vec![full("a", "x64-linux", &[])];

    let plan = vcpkg_planner::classic::create_feature_install_plan(
        &ports,
        &mut vars,
        &request,
        &status_db,
        &triplet("x64-linux"),
        UnsupportedPortAction::Warn,
    )
    .unwrap();

    assert_eq!(
        plan.remove_actions.iter().map(|r| r.package.name.to_string()).collect::<Vec<_>>(),
        vec!["a"]
    );
    assert_eq!(install_names(&plan.install_actions), vec!["a"]);
    assert_eq!(
        plan.install_actions[0].features,
        ["core", "0", "1"].map(String::from).into_iter().collect()
    );
    assert!(!plan.install_actions[0].features.contains("2"));
}

/// Invariant 6 -- topological soundness: every package a kept install action depends on appears
/// earlier among `install_actions ∪ already_installed`.
#[test]
fn invariant_topological_soundness_holds_for_a_dependency_chain() {
    let mut ports = MapManifestSource::default();
    ports.insert("a", port(core("a", vec![dep("b")], &[]), vec![]));
    ports.insert("b", port(core("b", vec![dep("c")], &[]), vec![]));
    ports.insert("c", port(core("c", vec![], &[]), vec![]));

    let status_db = MemoryStatusDb::new();
    let mut vars = StaticVarProvider::new();
    let request = vec![full("a", "x64-linux", &[])];

    let plan = vcpkg_planner::classic::create_feature_install_plan(
        &ports,
        &mut vars,
        &request,
        &status_db,
        &triplet("x64-linux"),
        UnsupportedPortAction::Warn,
    )
    .unwrap();

    for (i, action) in plan.install_actions.iter().enumerate() {
        for dependency in &action.package_dependencies {
            if *dependency == action.package {
                continue;
            }
            let earlier = plan.install_actions[..i].iter().any(|a| a.package == *dependency)
                || plan.already_installed.iter().any(|a| a.package == *dependency);
            assert!(earlier, "{} must appear before {}", dependency, action.package);
        }
    }
}

/// Invariant 7 -- a rebuilt cluster's remove and install actions both appear, and no cluster
/// appears in both `already_installed` and `install_actions`.
#[test]
fn invariant_remove_precedes_install_and_partitions_are_disjoint() {
    let mut ports = MapManifestSource::default();
    ports.insert("a", port(core("a", vec![], &[]), vec![feature("a1", vec![])]));
    ports.insert(
        "c",
        port(core("c", vec![dep_full("a", &["a1"], false, false)], &[]), vec![]),
    );

    let mut status_db = MemoryStatusDb::new();
    status_db.install(spec("a", "x64-linux"), vec![], vec![], vec![]);

    let mut vars = StaticVarProvider::new();
    let request = vec![full("c", "x64-linux", &[])];

    let plan = vcpkg_planner::classic::create_feature_install_plan(
        &ports,
        &mut vars,
        &request,
        &status_db,
        &triplet("x64-linux"),
        UnsupportedPortAction::Warn,
    )
    .unwrap();

    let removed: Vec<_> = plan.remove_actions.iter().map(|r| r.package.clone()).collect();
    let installed: Vec<_> = plan.install_actions.iter().map(|a| a.package.clone()).collect();
    assert!(removed.contains(&spec("a", "x64-linux")));
    assert!(installed.contains(&spec("a", "x64-linux")));
    for action in &plan.already_installed {
        assert!(!installed.contains(&action.package));
    }
}

/// Invariant 8 -- minimal reinstall: an installed package whose installed feature set already
/// covers the request, with a matching default-features snapshot, is left alone.
#[test]
fn invariant_minimal_reinstall_skips_already_satisfied_package() {
    let mut ports = MapManifestSource::default();
    ports.insert("a", port(core("a", vec![], &[]), vec![]));

    let mut status_db = MemoryStatusDb::new();
    status_db.install(spec("a", "x64-linux"), vec![], vec![], vec![]);

    let mut vars = StaticVarProvider::new();
    let request = vec![full("a", "x64-linux", &[])];

    let plan = vcpkg_planner::classic::create_feature_install_plan(
        &ports,
        &mut vars,
        &request,
        &status_db,
        &triplet("x64-linux"),
        UnsupportedPortAction::Warn,
    )
    .unwrap();

    assert!(plan.remove_actions.is_empty());
    assert!(plan.install_actions.is_empty());
    assert_eq!(install_names(&plan.already_installed), vec!["a"]);
}

/// Invariant 9 -- a `host=true` dependency installs on the host triplet regardless of the
/// dependent's own (target) triplet.
#[test]
fn invariant_host_dependency_targets_host_triplet() {
    let mut ports = MapManifestSource::default();
    ports.insert("a", port(core("a", vec![dep_full("tool", &[], true, true)], &[]), vec![]));
    ports.insert("tool", port(core("tool", vec![], &[]), vec![]));

    let status_db = MemoryStatusDb::new();
    let mut vars = StaticVarProvider::new();
    let request = vec![full("a", "x64-linux", &[])];

    let plan = vcpkg_planner::classic::create_feature_install_plan(
        &ports,
        &mut vars,
        &request,
        &status_db,
        &triplet("x64-windows"),
        UnsupportedPortAction::Warn,
    )
    .unwrap();

    let tool = plan
        .install_actions
        .iter()
        .find(|a| a.package.name.as_str() == "tool")
        .unwrap();
    assert_eq!(tool.package.triplet, triplet("x64-windows"));
    let a = plan
        .install_actions
        .iter()
        .find(|a| a.package.name.as_str() == "a")
        .unwrap();
    assert_eq!(a.package.triplet, triplet("x64-linux"));
}

/// `StatusDb` implementations must not be mutated by planning (documented on the trait itself):
/// running the same request twice against the same database produces the same plan.
#[test]
fn status_db_is_not_mutated_by_planning() {
    let mut ports = MapManifestSource::default();
    ports.insert("a", port(core("a", vec![dep("b")], &[]), vec![]));
    ports.insert("b", port(core("b", vec![], &[]), vec![]));

    let mut status_db = MemoryStatusDb::new();
    status_db.install(spec("b", "x64-linux"), vec![], vec![], vec![]);

    let request = vec![full("a", "x64-linux", &[])];

    let mut vars1 = StaticVarProvider::new();
    let first = vcpkg_planner::classic::create_feature_install_plan(
        &ports,
        &mut vars1,
        &request,
        &status_db,
        &triplet("x64-linux"),
        UnsupportedPortAction::Warn,
    )
    .unwrap();

    let mut vars2 = StaticVarProvider::new();
    let second = vcpkg_planner::classic::create_feature_install_plan(
        &ports,
        &mut vars2,
        &request,
        &status_db,
        &triplet("x64-linux"),
        UnsupportedPortAction::Warn,
    )
    .unwrap();

    assert_eq!(install_names(&first.install_actions), install_names(&second.install_actions));
    assert_eq!(first.remove_actions.len(), second.remove_actions.len());
}
