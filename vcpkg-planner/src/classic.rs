// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The classic (unversioned) feature planner: seeds the worklist from the status database and
//! the caller's request, resolves dependency edges to a fixpoint, then emits a topologically
//! sorted [`ActionPlan`].

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use vcpkg_model::identifiers::{
    FeatureLabel, FeatureName, FeatureSpec, FullPackageSpec, PackageName, PackageSpec, Triplet,
    CORE_FEATURE,
};
use vcpkg_model::manifest::{Dependency, SourceControlFile};
use vcpkg_model::status_db::StatusDb;
use vcpkg_platform_expr::{PlatformExpr, PlatformVars};

use crate::action::{ActionPlan, InstallAction, RemoveAction, UnsupportedPortAction};
use crate::cluster::{Cluster, ClusterArena, ClusterId, InstallInfo, InstalledState, RequestType};
use crate::errors::PlanError;
use crate::manifest_source::ManifestSource;
use crate::topo;
use crate::var_provider::PlatformVarProvider;

/// Builds the install/remove plan that installs every feature seeded by `request`, starting from
/// the state recorded in `status_db`.
///
/// `host_triplet` is the triplet `host: true` dependency edges retarget to. `var_provider` is
/// queried (and batch-loaded) lazily: only clusters whose dependency resolution actually needs a
/// triplet variable defer into a batch, per §4.8 step 4.
pub fn create_feature_install_plan(
    provider: &dyn ManifestSource,
    var_provider: &mut dyn PlatformVarProvider,
    request: &[FullPackageSpec],
    status_db: &dyn StatusDb,
    host_triplet: &Triplet,
    unsupported_port_action: UnsupportedPortAction,
) -> Result<ActionPlan, PlanError> {
    let mut state = PlannerState::new(provider, status_db, host_triplet.clone(), unsupported_port_action);
    state.seed_from_status_db();

    for full_spec in request {
        let id = state.ensure_cluster(&full_spec.package)?;
        state.arena.get_mut(id).request_type = RequestType::UserRequested;
        for label in full_spec.seed_labels() {
            state
                .next_dependencies
                .push(FeatureSpec::new(full_spec.package.clone(), label));
        }
    }

    state.run(var_provider)?;
    state.build_action_plan()
}

struct PlannerState<'a> {
    arena: ClusterArena,
    provider: &'a dyn ManifestSource,
    status_db: &'a dyn StatusDb,
    host_triplet: Triplet,
    unsupported_port_action: UnsupportedPortAction,
    unsupported_features: HashMap<FeatureSpec, PlatformExpr>,
    next_dependencies: Vec<FeatureSpec>,
    qualified_dependencies: Vec<FeatureSpec>,
}

impl<'a> PlannerState<'a> {
    fn new(
        provider: &'a dyn ManifestSource,
        status_db: &'a dyn StatusDb,
        host_triplet: Triplet,
        unsupported_port_action: UnsupportedPortAction,
    ) -> Self {
        PlannerState {
            arena: ClusterArena::new(),
            provider,
            status_db,
            host_triplet,
            unsupported_port_action,
            unsupported_features: HashMap::new(),
            next_dependencies: Vec::new(),
            qualified_dependencies: Vec::new(),
        }
    }

    /// Step 1: seed one cluster per currently installed package, carrying over its recorded
    /// feature set, default-features snapshot, and reverse-dependency edges.
    fn seed_from_status_db(&mut self) {
        for package in self.status_db.installed_packages() {
            let features_installed = self.status_db.installed_features(&package);
            let default_features_snapshot = self.status_db.installed_default_snapshot(&package);
            let reverse_deps = self.status_db.reverse_deps(&package);
            self.arena.get_or_insert_with(&package, || Cluster {
                package: package.clone(),
                scfl: None,
                installed: Some(InstalledState {
                    features_installed,
                    default_features_snapshot,
                    defaults_requested: false,
                    reverse_deps,
                }),
                install_info: None,
                request_type: RequestType::Auto,
            });
        }
    }

    /// Returns the cluster for `package`, creating it (and loading its manifest) if this is the
    /// first time it's been referenced.
    fn ensure_cluster(&mut self, package: &PackageSpec) -> Result<ClusterId, PlanError> {
        let id = self
            .arena
            .get_or_insert_with(package, || Cluster {
                package: package.clone(),
                scfl: None,
                installed: None,
                install_info: None,
                request_type: RequestType::Auto,
            });
        if self.arena.get(id).scfl.is_none() {
            let loaded = self.provider.load(package.name.as_str());
            self.arena.get_mut(id).scfl = Some(loaded);
        }
        Ok(id)
    }

    fn scf_of(&self, id: ClusterId) -> Result<&SourceControlFile, PlanError> {
        match self.arena.get(id).scfl.as_ref().expect("loaded by ensure_cluster") {
            Ok(scfl) => Ok(&scfl.scf),
            Err(message) => Err(PlanError::PortLoadFailed {
                package: self.arena.get(id).package.name.to_string(),
                message: message.clone(),
            }),
        }
    }

    /// Steps 3-4: drains `next_dependencies`, batching any `FeatureSpec` whose resolution needs
    /// triplet variables that aren't loaded yet into `qualified_dependencies`, then loads that
    /// batch in one call before resuming.
    fn run(&mut self, var_provider: &mut dyn PlatformVarProvider) -> Result<(), PlanError> {
        loop {
            if let Some(spec) = self.next_dependencies.pop() {
                self.process(spec, var_provider)?;
                continue;
            }
            if self.qualified_dependencies.is_empty() {
                break;
            }
            let specs: Vec<PackageSpec> = self
                .qualified_dependencies
                .iter()
                .map(|s| s.package.clone())
                .collect();
            var_provider.load_dep_info_vars(&specs);
            self.next_dependencies.append(&mut self.qualified_dependencies);
        }
        Ok(())
    }

    fn process(&mut self, spec: FeatureSpec, var_provider: &dyn PlatformVarProvider) -> Result<(), PlanError> {
        let id = self.ensure_cluster(&spec.package)?;

        if spec.feature == FeatureLabel::All {
            let names = self.all_feature_names(id)?;
            for name in names {
                self.next_dependencies.push(FeatureSpec::new(
                    spec.package.clone(),
                    FeatureLabel::Named(FeatureName::new(name)?),
                ));
            }
            return Ok(());
        }

        let vars_loaded = var_provider.get_dep_info_vars(&spec.package).cloned();
        if vars_loaded.is_none() && self.needs_vars(id, &spec.feature)? {
            self.qualified_dependencies.push(spec);
            return Ok(());
        }
        let vars = vars_loaded.unwrap_or_else(|| PlatformVars::new("", ""));

        let supports = self.supports_expr(id, &spec.feature)?;
        if !supports.evaluate(&vars) {
            match self.unsupported_port_action {
                UnsupportedPortAction::Error => {
                    return Err(PlanError::UnsupportedPort {
                        package: spec.package.name.to_string(),
                        triplet: spec.package.triplet.to_string(),
                    })
                }
                UnsupportedPortAction::Warn => {
                    log::warn!(
                        "{} is not supported on {}, skipping",
                        spec.package.name,
                        spec.package.triplet
                    );
                    self.unsupported_features.insert(spec, supports);
                    return Ok(());
                }
            }
        }

        match &spec.feature {
            FeatureLabel::Default => self.process_default(id, &spec.package, &vars),
            FeatureLabel::Core => self.process_named(id, &spec.package, CORE_FEATURE, &vars),
            FeatureLabel::Named(name) => self.process_named(id, &spec.package, name.as_str(), &vars),
            FeatureLabel::All => unreachable!("handled above"),
        }
    }

    fn all_feature_names(&self, id: ClusterId) -> Result<Vec<String>, PlanError> {
        let scf = self.scf_of(id)?;
        Ok(scf.features.iter().map(|f| f.name.clone()).collect())
    }

    fn needs_vars(&self, id: ClusterId, label: &FeatureLabel) -> Result<bool, PlanError> {
        let scf = self.scf_of(id)?;
        let needs_for = |deps: &[Dependency], supports: &PlatformExpr| {
            !supports.is_empty() || deps.iter().any(|d| !d.platform.is_empty())
        };
        Ok(match label {
            FeatureLabel::Core => needs_for(&scf.core.dependencies, &scf.core.supports),
            FeatureLabel::Default => {
                scf.core.default_features.iter().any(|e| !e.platform.is_empty())
                    || !scf.core.supports.is_empty()
            }
            FeatureLabel::Named(name) => {
                let paragraph = scf
                    .features
                    .iter()
                    .find(|f| f.name == name.as_str())
                    .ok_or_else(|| PlanError::FeatureNotFound {
                        package: self.arena.get(id).package.name.to_string(),
                        feature: name.to_string(),
                    })?;
                needs_for(&paragraph.dependencies, &paragraph.supports)
            }
            FeatureLabel::All => false,
        })
    }

    fn supports_expr(&self, id: ClusterId, label: &FeatureLabel) -> Result<PlatformExpr, PlanError> {
        let scf = self.scf_of(id)?;
        Ok(match label {
            FeatureLabel::Core | FeatureLabel::Default => scf.core.supports.clone(),
            FeatureLabel::Named(name) => scf
                .features
                .iter()
                .find(|f| f.name == name.as_str())
                .ok_or_else(|| PlanError::FeatureNotFound {
                    package: self.arena.get(id).package.name.to_string(),
                    feature: name.to_string(),
                })?
                .supports
                .clone(),
            FeatureLabel::All => PlatformExpr::always_true(),
        })
    }

    /// `feature = "default"` is never itself recorded; it expands to the manifest's default
    /// feature list (filtered by each entry's platform expression) and those concrete features
    /// are queued instead.
    fn process_default(&mut self, id: ClusterId, package: &PackageSpec, vars: &PlatformVars) -> Result<(), PlanError> {
        let entries = self.default_feature_entries(id, vars)?;

        let has_install_info = self.arena.get(id).install_info.is_some();
        if !has_install_info {
            let has_installed = self.arena.get(id).installed.is_some();
            if !has_installed {
                self.arena.get_mut(id).install_info = Some(InstallInfo::default());
            } else {
                let satisfied = {
                    let installed = self.arena.get(id).installed.as_ref().unwrap();
                    let entries_set: HashSet<String> = entries.iter().cloned().collect();
                    entries.iter().all(|n| installed.features_installed.contains(n))
                        && installed.default_features_snapshot == entries_set
                };
                if satisfied {
                    return Ok(());
                }
                self.begin_reinstall(id)?;
            }
        }
        self.push_default_entries(id, package, entries)
    }

    fn default_feature_entries(&self, id: ClusterId, vars: &PlatformVars) -> Result<Vec<String>, PlanError> {
        let scf = self.scf_of(id)?;
        Ok(scf
            .core
            .default_features
            .iter()
            .filter(|e| e.platform.evaluate(vars))
            .map(|e| e.name.clone())
            .collect())
    }

    fn push_default_entries(
        &mut self,
        id: ClusterId,
        package: &PackageSpec,
        entries: Vec<String>,
    ) -> Result<(), PlanError> {
        self.arena.get_mut(id).install_info.as_mut().unwrap().defaults_requested = true;
        for name in entries {
            self.next_dependencies.push(FeatureSpec::new(
                package.clone(),
                FeatureLabel::Named(FeatureName::new(name)?),
            ));
        }
        Ok(())
    }

    /// §4.8 step 3: a cluster that is pulled in only as someone else's dependency (not named
    /// directly in the planner's `request`) gets its default features seeded unconditionally the
    /// first time `install_info` is created for it, regardless of which concrete feature
    /// triggered the install -- matching `create_install_info`'s unconditional default-feature
    /// seeding for non-`UserRequested` clusters. A no-op for `UserRequested` clusters, whose
    /// defaults (if any) only come from an explicit `default` label in `seed_labels`.
    fn seed_auto_defaults(
        &mut self,
        id: ClusterId,
        package: &PackageSpec,
        vars: &PlatformVars,
    ) -> Result<(), PlanError> {
        if self.arena.get(id).request_type != RequestType::Auto {
            return Ok(());
        }
        let entries = self.default_feature_entries(id, vars)?;
        self.push_default_entries(id, package, entries)
    }

    /// Resolves `"core"` or a concrete named feature: no-op if already resolved or already
    /// installed, otherwise starts (or continues) an install and records its dependency edges.
    fn process_named(
        &mut self,
        id: ClusterId,
        package: &PackageSpec,
        concrete_name: &str,
        vars: &PlatformVars,
    ) -> Result<(), PlanError> {
        let already_resolved = self
            .arena
            .get(id)
            .install_info
            .as_ref()
            .map_or(false, |info| info.resolved.contains(concrete_name));
        if already_resolved {
            return Ok(());
        }

        if self.arena.get(id).install_info.is_some() {
            return self.add_feature(id, package, concrete_name, vars);
        }

        if self.arena.get(id).installed.is_none() {
            self.arena.get_mut(id).install_info = Some(InstallInfo::default());
            self.seed_auto_defaults(id, package, vars)?;
            return self.add_feature(id, package, concrete_name, vars);
        }

        let already_installed = self
            .arena
            .get(id)
            .installed
            .as_ref()
            .unwrap()
            .features_installed
            .contains(concrete_name);
        if already_installed {
            return Ok(());
        }
        self.begin_reinstall(id)?;
        self.add_feature(id, package, concrete_name, vars)
    }

    /// Starts a reinstall: seeds `install_info` from the previously installed feature set so
    /// every already-installed feature gets re-resolved, and cascades the reinstall to every
    /// installed reverse dependent (invariant: minimal reinstall still reinstalls everything that
    /// transitively rebuilt against this cluster).
    fn begin_reinstall(&mut self, id: ClusterId) -> Result<(), PlanError> {
        let cluster = self.arena.get(id);
        if cluster.install_info.is_some() {
            return Ok(());
        }
        let package = cluster.package.clone();
        log::debug!("reinstalling {}", package);

        let installed_features: Vec<String> = cluster
            .installed
            .as_ref()
            .map(|s| s.features_installed.iter().cloned().collect())
            .unwrap_or_default();
        let reverse_deps: Vec<PackageSpec> = cluster
            .installed
            .as_ref()
            .map(|s| s.reverse_deps.iter().cloned().collect())
            .unwrap_or_default();

        self.arena.get_mut(id).install_info = Some(InstallInfo::default());

        for name in installed_features {
            self.next_dependencies
                .push(FeatureSpec::new(package.clone(), feature_label_from_name(&name)?));
        }

        for dependent in reverse_deps {
            let dependent_features: Vec<String> = match self.arena.find(&dependent) {
                Some(dep_id) => self.arena.get(dep_id).installed.as_ref().map_or(Vec::new(), |s| {
                    s.features_installed.iter().cloned().collect()
                }),
                None => Vec::new(),
            };
            for name in dependent_features {
                self.next_dependencies
                    .push(FeatureSpec::new(dependent.clone(), feature_label_from_name(&name)?));
            }
        }
        Ok(())
    }

    /// Resolves one concrete feature's dependency edges against `vars`, pushing each target onto
    /// the worklist and recording the edge in `install_info.build_edges`.
    fn add_feature(
        &mut self,
        id: ClusterId,
        package: &PackageSpec,
        concrete_name: &str,
        vars: &PlatformVars,
    ) -> Result<(), PlanError> {
        let scf = self.scf_of(id)?;
        let dependencies: Vec<Dependency> = if concrete_name == CORE_FEATURE {
            scf.core.dependencies.clone()
        } else {
            scf.features
                .iter()
                .find(|f| f.name == concrete_name)
                .ok_or_else(|| PlanError::FeatureNotFound {
                    package: package.name.to_string(),
                    feature: concrete_name.to_string(),
                })?
                .dependencies
                .clone()
        };

        let mut edges: HashSet<FeatureSpec> = HashSet::new();
        for dep in &dependencies {
            if !dep.platform.evaluate(vars) {
                continue;
            }
            let target_triplet = if dep.host {
                self.host_triplet.clone()
            } else {
                package.triplet.clone()
            };
            let target_package = PackageSpec::new(PackageName::new(dep.name.clone())?, target_triplet);

            let mut labels = vec![FeatureLabel::Core];
            if dep.default_features {
                labels.push(FeatureLabel::Default);
            }
            for name in &dep.features {
                if name == CORE_FEATURE {
                    continue;
                }
                labels.push(FeatureLabel::Named(FeatureName::new(name.clone())?));
            }

            for label in labels {
                let target = FeatureSpec::new(target_package.clone(), label);
                edges.insert(target.clone());
                self.next_dependencies.push(target);
            }
        }

        let cluster = self.arena.get_mut(id);
        let info = cluster.install_info.as_mut().expect("install_info set by caller");
        info.resolved.insert(concrete_name.to_string());
        info.build_edges
            .entry(concrete_name.to_string())
            .or_default()
            .extend(edges);
        Ok(())
    }

    /// Step 6: partitions clusters into removes, already-installed and installs, then
    /// topologically sorts each partition over its respective edge set.
    fn build_action_plan(&self) -> Result<ActionPlan, PlanError> {
        let mut remove_ids = Vec::new();
        let mut install_ids = Vec::new();
        let mut already_installed_ids = Vec::new();

        for (id, cluster) in self.arena.iter() {
            match (&cluster.installed, &cluster.install_info) {
                (Some(_), Some(_)) => {
                    remove_ids.push(id);
                    install_ids.push(id);
                }
                (None, Some(_)) => install_ids.push(id),
                (Some(_), None) if cluster.request_type == RequestType::UserRequested => {
                    already_installed_ids.push(id)
                }
                _ => {}
            }
        }

        let name_of = |id: ClusterId| self.arena.get(id).package.to_string();

        let remove_prereqs = |id: ClusterId| -> Vec<ClusterId> {
            self.arena
                .get(id)
                .installed
                .as_ref()
                .map(|s| {
                    s.reverse_deps
                        .iter()
                        .filter_map(|p| self.arena.find(p))
                        .collect()
                })
                .unwrap_or_default()
        };
        let remove_order = topo::topo_sort(&remove_ids, &remove_prereqs, &name_of)?;

        let install_prereqs = |id: ClusterId| -> Vec<ClusterId> {
            self.arena
                .get(id)
                .install_info
                .as_ref()
                .map(|info| {
                    info.build_edges
                        .values()
                        .flatten()
                        .filter_map(|fs| self.arena.find(&fs.package))
                        .filter(|dep_id| *dep_id != id)
                        .collect()
                })
                .unwrap_or_default()
        };
        let install_order = topo::topo_sort(&install_ids, &install_prereqs, &name_of)?;

        let remove_actions = remove_order
            .into_iter()
            .map(|id| RemoveAction {
                package: self.arena.get(id).package.clone(),
            })
            .collect();

        let install_actions = install_order
            .into_iter()
            .map(|id| self.build_install_action(id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut already_installed = already_installed_ids
            .into_iter()
            .map(|id| self.build_already_installed_action(id))
            .collect::<Vec<_>>();
        already_installed.sort_by(|a, b| {
            a.package
                .name
                .cmp(&b.package.name)
                .then_with(|| a.package.triplet.cmp(&b.package.triplet))
        });

        Ok(ActionPlan {
            remove_actions,
            already_installed,
            install_actions,
            unsupported_features: self.unsupported_features.clone(),
        })
    }

    fn build_install_action(&self, id: ClusterId) -> Result<InstallAction, PlanError> {
        let cluster = self.arena.get(id);
        let info = cluster.install_info.as_ref().expect("install_ids only holds install_info clusters");
        let scfl = match cluster.scfl.as_ref().expect("loaded by ensure_cluster") {
            Ok(scfl) => Arc::clone(scfl),
            Err(message) => {
                return Err(PlanError::PortLoadFailed {
                    package: cluster.package.name.to_string(),
                    message: message.clone(),
                })
            }
        };

        let features: BTreeSet<String> = info.resolved.clone().into_iter().collect();
        let mut package_dependencies: Vec<PackageSpec> = Vec::new();
        let mut seen = HashSet::new();
        for target in info.build_edges.values().flatten() {
            if target.package != cluster.package && seen.insert(target.package.clone()) {
                package_dependencies.push(target.package.clone());
            }
        }
        package_dependencies.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.triplet.cmp(&b.triplet)));

        Ok(InstallAction {
            package: cluster.package.clone(),
            features,
            dependency_map: info.build_edges.clone(),
            package_dependencies,
            scfl,
            host_triplet: self.host_triplet.clone(),
            request_type: cluster.request_type,
            version_constraint_violations: Vec::new(),
        })
    }

    fn build_already_installed_action(&self, id: ClusterId) -> InstallAction {
        let cluster = self.arena.get(id);
        let installed = cluster.installed.as_ref().expect("already_installed_ids only holds installed clusters");
        let scfl = cluster
            .scfl
            .as_ref()
            .and_then(|r| r.as_ref().ok())
            .cloned()
            .expect("already-installed requests were loaded via ensure_cluster");

        InstallAction {
            package: cluster.package.clone(),
            features: installed.features_installed.iter().cloned().collect(),
            dependency_map: HashMap::new(),
            package_dependencies: Vec::new(),
            scfl,
            host_triplet: self.host_triplet.clone(),
            request_type: cluster.request_type,
            version_constraint_violations: Vec::new(),
        }
    }
}

fn feature_label_from_name(name: &str) -> Result<FeatureLabel, PlanError> {
    if name == CORE_FEATURE {
        Ok(FeatureLabel::Core)
    } else {
        Ok(FeatureLabel::Named(FeatureName::new(name)?))
    }
}
