// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The versioned (manifest-mode) planner: resolves a single selected version per reachable
//! package against a registry set and baseline, then runs the classic feature traversal
//! (§4.8) scoped to each package's selected manifest.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::sync::Arc;

use vcpkg_model::identifiers::{FullPackageSpec, Triplet};
use vcpkg_model::manifest::{self, Dependency, SourceControlFile};
use vcpkg_model::port_provider::{PortFileProvider, PortSource, SourceControlFileAndLocation};
use vcpkg_model::registry::RegistrySet;
use vcpkg_model::status_db::StatusDb;
use vcpkg_model::version::{compare_within_scheme, Version, VersionScheme};

use crate::action::{ActionPlan, UnsupportedPortAction, VersionConstraintViolation};
use crate::classic;
use crate::errors::PlanError;
use crate::manifest_source::ManifestSource;
use crate::var_provider::PlatformVarProvider;

const MAX_FIXPOINT_ITERATIONS: usize = 64;

/// Builds an install/remove plan the way `vcpkg install --x-manifest` with `versions` enabled
/// does: `root` (the project's own `vcpkg.json`, parsed as a project manifest) supplies the
/// initial dependency set and any `overrides`, and every reachable package's version is pinned
/// by baseline, `version>=` constraints, or an override before features are ever resolved.
///
/// `target_triplet` is currently only used to shape `request` (callers pass `FullPackageSpec`s
/// already scoped to it); it's taken explicitly so a future multi-triplet caller has it in hand.
#[allow(clippy::too_many_arguments)]
pub fn create_versioned_install_plan(
    provider: &PortFileProvider,
    registry_set: &RegistrySet,
    var_provider: &mut dyn PlatformVarProvider,
    root: &SourceControlFile,
    request: &[FullPackageSpec],
    status_db: &dyn StatusDb,
    _target_triplet: &Triplet,
    host_triplet: &Triplet,
    unsupported_port_action: UnsupportedPortAction,
) -> Result<ActionPlan, PlanError> {
    let overrides = root
        .core
        .overrides
        .iter()
        .map(|o| (o.name.clone(), (o.version.clone(), o.version_scheme)))
        .collect();

    let mut selector = VersionSelector {
        registry_set,
        provider,
        overrides,
        constraints: HashMap::new(),
        selected: HashMap::new(),
        loaded_at: HashMap::new(),
        finalized: HashSet::new(),
        manifests: HashMap::new(),
    };
    selector.resolve(root)?;

    let source = ResolvedManifestSource {
        manifests: selector.manifests.clone(),
    };
    let mut plan = classic::create_feature_install_plan(
        &source,
        var_provider,
        request,
        status_db,
        host_triplet,
        unsupported_port_action,
    )?;

    attach_constraint_violations(&mut plan, &selector);
    Ok(plan)
}

/// Sources feature-traversal manifests from a map already resolved to each package's selected
/// version, instead of going through [`PortFileProvider`]'s registry-HEAD lookup.
struct ResolvedManifestSource {
    manifests: HashMap<String, Arc<SourceControlFileAndLocation>>,
}

impl ManifestSource for ResolvedManifestSource {
    fn load(&self, name: &str) -> Result<Arc<SourceControlFileAndLocation>, String> {
        self.manifests
            .get(name)
            .cloned()
            .ok_or_else(|| format!("'{}' was not reached by version resolution", name))
    }
}

/// Tracks, for every package name reachable from the root manifest, the version selected for it
/// and the manifest loaded at that version.
struct VersionSelector<'a> {
    registry_set: &'a RegistrySet,
    provider: &'a PortFileProvider,
    /// Root-manifest `overrides`: final, never advanced by a constraint.
    overrides: HashMap<String, (Version, VersionScheme)>,
    /// Collected `version>=` constraints, keyed by the constrained package name.
    constraints: HashMap<String, Vec<(String, u64)>>,
    /// The version (and its scheme) currently selected for each name.
    selected: HashMap<String, (Version, VersionScheme)>,
    /// The version the currently-cached manifest was loaded at, used to detect staleness after a
    /// constraint advances the selection.
    loaded_at: HashMap<String, Version>,
    /// Names whose selection is final (an override, or an overlay port) and must never be
    /// recomputed from the baseline/constraint machinery.
    finalized: HashSet<String>,
    manifests: HashMap<String, Arc<SourceControlFileAndLocation>>,
}

impl<'a> VersionSelector<'a> {
    /// Iterates steps 1-3: discover reachable names, select each one's version, load its
    /// manifest, and rescan for constraints and newly reachable names, until a full pass makes
    /// no further changes.
    fn resolve(&mut self, root: &SourceControlFile) -> Result<(), PlanError> {
        let mut reachable: HashSet<String> = HashSet::new();
        self.collect_from(root, &mut reachable);

        for _ in 0..MAX_FIXPOINT_ITERATIONS {
            let mut changed = false;

            let names: Vec<String> = reachable.iter().cloned().collect();
            for name in names {
                if self.ensure_version_selected(&name)? {
                    changed = true;
                }
            }

            let manifests_snapshot: Vec<Arc<SourceControlFileAndLocation>> =
                self.manifests.values().cloned().collect();
            for scfl in manifests_snapshot {
                let before = reachable.len();
                self.collect_from(&scfl.scf, &mut reachable);
                if reachable.len() != before {
                    changed = true;
                }
            }

            if !changed {
                return Ok(());
            }
        }
        Err(PlanError::VersionResolutionDidNotConverge)
    }

    /// Records every `version>=` constraint and dependency-name edge in `scf`'s core and feature
    /// paragraphs. Conservatively scans every feature paragraph's dependencies rather than only
    /// those features actually selected -- the selected feature set isn't known until the
    /// traversal in §4.8 runs, which in turn needs every candidate's version already settled.
    fn collect_from(&mut self, scf: &SourceControlFile, reachable: &mut HashSet<String>) {
        let mut deps: Vec<&Dependency> = scf.core.dependencies.iter().collect();
        for feature in &scf.features {
            deps.extend(feature.dependencies.iter());
        }
        for dep in deps {
            if let Some(constraint) = &dep.constraint {
                self.constraints
                    .entry(dep.name.clone())
                    .or_default()
                    .push((constraint.text.clone(), constraint.port_version));
            }
            reachable.insert(dep.name.clone());
        }
    }

    /// Ensures `name`'s selected version has a loaded manifest. Returns `true` if a (re)load
    /// happened this call. Overlay ports and root-manifest overrides are final and never
    /// reconsidered once loaded.
    fn ensure_version_selected(&mut self, name: &str) -> Result<bool, PlanError> {
        if self.finalized.contains(name) {
            return Ok(false);
        }

        if let Some(result) = self.provider.get_overlay_port(name) {
            let scfl = result.map_err(PlanError::from)?;
            self.finalized.insert(name.to_string());
            self.loaded_at.insert(name.to_string(), scfl.scf.core.version.clone());
            self.selected
                .insert(name.to_string(), (scfl.scf.core.version.clone(), scfl.scf.core.version_scheme));
            self.manifests.insert(name.to_string(), Arc::new(scfl));
            return Ok(true);
        }

        if let Some((version, _)) = self.overrides.get(name).cloned() {
            let scfl = load_at_version(self.registry_set, name, &version)?;
            let scheme = scfl.scf.core.version_scheme;
            self.finalized.insert(name.to_string());
            self.loaded_at.insert(name.to_string(), version.clone());
            self.selected.insert(name.to_string(), (version, scheme));
            self.manifests.insert(name.to_string(), Arc::new(scfl));
            return Ok(true);
        }

        let (version, scheme) = self.compute_selected_version(name)?;
        if self.loaded_at.get(name) == Some(&version) {
            return Ok(false);
        }
        let scfl = load_at_version(self.registry_set, name, &version)?;
        self.loaded_at.insert(name.to_string(), version.clone());
        self.selected.insert(name.to_string(), (version, scheme));
        self.manifests.insert(name.to_string(), Arc::new(scfl));
        Ok(true)
    }

    /// Step 2: the baseline version, advanced to the maximum of every in-scope `version>=`
    /// constraint, comparing in the scheme the registry's version database records for each
    /// candidate (never the manifest's own declaration, which would require loading it first).
    fn compute_selected_version(&self, name: &str) -> Result<(Version, VersionScheme), PlanError> {
        let entry = self.registry_set.get_port_entry(name).map_err(PlanError::from)?;
        let baseline = self
            .registry_set
            .baseline_for(name)
            .map_err(PlanError::from)?
            .ok_or_else(|| PlanError::PortLoadFailed {
                package: name.to_string(),
                message: "no baseline entry for this package".to_string(),
            })?;
        let baseline_entry = entry
            .port_versions
            .iter()
            .find(|v| v.version == baseline)
            .ok_or_else(|| PlanError::PortLoadFailed {
                package: name.to_string(),
                message: "baseline version is not enumerated in the version database".to_string(),
            })?;
        let scheme = baseline_entry.scheme;

        let mut best = baseline;
        if let Some(constraints) = self.constraints.get(name) {
            for (text, port_version) in constraints {
                let raw = if *port_version != 0 {
                    format!("{}#{}", text, port_version)
                } else {
                    text.clone()
                };
                let candidate = Version::parse(&raw, scheme, "version-constraint")?;
                if compare_within_scheme(&candidate, &best, scheme) == Ordering::Greater {
                    if !entry.port_versions.iter().any(|v| v.version == candidate) {
                        return Err(PlanError::UnsatisfiableVersionConstraint {
                            package: name.to_string(),
                            required_text: raw,
                        });
                    }
                    best = candidate;
                }
            }
        }
        Ok((best, scheme))
    }
}

fn load_at_version(
    registry_set: &RegistrySet,
    name: &str,
    version: &Version,
) -> Result<SourceControlFileAndLocation, PlanError> {
    let registry = registry_set.registry_for(name).ok_or_else(|| PlanError::PortLoadFailed {
        package: name.to_string(),
        message: "no registry claims this package and there is no default registry".to_string(),
    })?;
    let entry = registry.get_port_entry(name).map_err(PlanError::from)?;
    let locator = entry.get_path_to_version(version).map_err(PlanError::from)?;
    let path = registry.resolve_source_locator(locator).map_err(PlanError::from)?;
    let text = fs::read_to_string(&path).map_err(|err| PlanError::PortLoadFailed {
        package: name.to_string(),
        message: format!("reading '{}': {}", path.display(), err),
    })?;
    let value: serde_json::Value = serde_json::from_str(&text).map_err(|err| PlanError::PortLoadFailed {
        package: name.to_string(),
        message: format!("parsing '{}': {}", path.display(), err),
    })?;
    let scf = manifest::parse_port_manifest(&value, &path.display().to_string())?;
    Ok(SourceControlFileAndLocation {
        scf,
        source: PortSource::Registry,
    })
}

/// Step 5: for every install action, records a [`VersionConstraintViolation`] for each collected
/// constraint its own selected version doesn't meet. In practice this only fires for overridden
/// or overlaid packages -- baseline selection already advances to satisfy every known constraint
/// or fails fast during [`VersionSelector::resolve`].
fn attach_constraint_violations(plan: &mut ActionPlan, selector: &VersionSelector) {
    for action in &mut plan.install_actions {
        let name = action.package.name.as_str();
        let constraints = match selector.constraints.get(name) {
            Some(constraints) => constraints,
            None => continue,
        };
        let (selected_version, scheme) = match selector.selected.get(name) {
            Some(selected) => selected,
            None => continue,
        };
        for (text, port_version) in constraints {
            let raw = if *port_version != 0 {
                format!("{}#{}", text, port_version)
            } else {
                text.clone()
            };
            let required = match Version::parse(&raw, *scheme, "version-constraint") {
                Ok(required) => required,
                Err(_) => continue,
            };
            if compare_within_scheme(&required, selected_version, *scheme) == Ordering::Greater {
                action.version_constraint_violations.push(VersionConstraintViolation {
                    constrained_package: action.package.clone(),
                    required_text: raw,
                    selected_text: selected_version.to_raw_string(),
                });
            }
        }
    }
}
