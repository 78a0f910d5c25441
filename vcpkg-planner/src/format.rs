// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable rendering of an [`ActionPlan`], partitioned the way console output groups
//! actions: excluded ports, already-installed requests, plain removes, rebuilds (a remove paired
//! with the reinstall that follows it), and fresh installs.

use std::collections::HashSet;
use std::fmt;

use vcpkg_model::identifiers::{PackageSpec, CORE_FEATURE};
use vcpkg_model::port_provider::PortSource;

use crate::action::{ActionPlan, InstallAction, RemoveAction};
use crate::cluster::RequestType;

/// One partitioned line of human-facing output.
#[derive(Clone, Debug)]
pub struct DisplayLine {
    /// `*` for a dependency pulled in automatically, ` ` for one named directly in the request.
    pub marker: char,
    /// `name:triplet`.
    pub spec_text: String,
    /// The resolved non-`core` feature list, rendered as `[a,b,c]`, or empty if only `core` was
    /// resolved.
    pub features_text: String,
    /// Where this port's manifest came from, if not the registry set.
    pub source_location: Option<String>,
}

impl fmt::Display for DisplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.marker, self.spec_text, self.features_text)?;
        if let Some(location) = &self.source_location {
            write!(f, " -- {}", location)?;
        }
        Ok(())
    }
}

/// An [`ActionPlan`] partitioned and sorted for display. The machine-facing `ActionPlan` itself
/// is unchanged; this is a read-only view built from it.
#[derive(Clone, Debug, Default)]
pub struct FormattedPlan {
    /// Ports excluded because `supports` evaluated false (`UnsupportedPortAction::Warn`).
    pub excluded: Vec<DisplayLine>,
    /// User-requested packages already satisfying the request; no action taken.
    pub already_installed: Vec<DisplayLine>,
    /// Packages removed with no corresponding reinstall in this plan.
    pub removes: Vec<DisplayLine>,
    /// `(remove, install)` pairs: a package being reinstalled.
    pub rebuilds: Vec<(DisplayLine, DisplayLine)>,
    /// Packages installed for the first time.
    pub new_installs: Vec<DisplayLine>,
}

impl FormattedPlan {
    /// A single `(name, triplet)`-sorted line list interleaving every already-installed,
    /// removed, rebuilt, and freshly installed action -- the flat single-column report the
    /// original console driver prints, as opposed to the grouped sections above.
    pub fn merged(&self) -> Vec<DisplayLine> {
        let mut lines: Vec<DisplayLine> = Vec::with_capacity(
            self.already_installed.len() + self.removes.len() + self.rebuilds.len() + self.new_installs.len(),
        );
        lines.extend(self.already_installed.iter().cloned());
        lines.extend(self.removes.iter().cloned());
        lines.extend(self.rebuilds.iter().map(|(_, install)| install.clone()));
        lines.extend(self.new_installs.iter().cloned());
        lines.sort_by(|a, b| a.spec_text.cmp(&b.spec_text));
        lines
    }
}

/// Partitions and sorts `plan` for display. Within each partition, lines are sorted by
/// `(name, triplet)`.
pub fn format_plan(plan: &ActionPlan) -> FormattedPlan {
    let mut excluded: Vec<DisplayLine> = plan
        .unsupported_features
        .keys()
        .map(|feature_spec| DisplayLine {
            marker: ' ',
            spec_text: feature_spec.package.to_string(),
            features_text: String::new(),
            source_location: None,
        })
        .collect();
    excluded.sort_by(|a, b| a.spec_text.cmp(&b.spec_text));
    excluded.dedup_by(|a, b| a.spec_text == b.spec_text);

    let mut already_installed: Vec<DisplayLine> =
        plan.already_installed.iter().map(install_line).collect();
    already_installed.sort_by(|a, b| a.spec_text.cmp(&b.spec_text));

    let installed_specs: HashSet<PackageSpec> =
        plan.install_actions.iter().map(|action| action.package.clone()).collect();
    let removed_specs: HashSet<PackageSpec> =
        plan.remove_actions.iter().map(|remove| remove.package.clone()).collect();

    let mut removes: Vec<DisplayLine> = plan
        .remove_actions
        .iter()
        .filter(|remove| !installed_specs.contains(&remove.package))
        .map(remove_line)
        .collect();
    removes.sort_by(|a, b| a.spec_text.cmp(&b.spec_text));

    let mut rebuilds: Vec<(DisplayLine, DisplayLine)> = Vec::new();
    let mut new_installs: Vec<DisplayLine> = Vec::new();
    for action in &plan.install_actions {
        if removed_specs.contains(&action.package) {
            let remove = plan
                .remove_actions
                .iter()
                .find(|remove| remove.package == action.package)
                .expect("install_actions and remove_actions agree on every rebuilt package");
            rebuilds.push((remove_line(remove), install_line(action)));
        } else {
            new_installs.push(install_line(action));
        }
    }
    rebuilds.sort_by(|a, b| a.1.spec_text.cmp(&b.1.spec_text));
    new_installs.sort_by(|a, b| a.spec_text.cmp(&b.spec_text));

    FormattedPlan {
        excluded,
        already_installed,
        removes,
        rebuilds,
        new_installs,
    }
}

fn install_line(action: &InstallAction) -> DisplayLine {
    let marker = match action.request_type {
        RequestType::UserRequested => ' ',
        RequestType::Auto => '*',
    };
    let extra_features: Vec<&str> = action
        .features
        .iter()
        .map(String::as_str)
        .filter(|feature| *feature != CORE_FEATURE)
        .collect();
    let features_text = if extra_features.is_empty() {
        String::new()
    } else {
        format!("[{}]", extra_features.join(","))
    };
    let source_location = match &action.scfl.source {
        PortSource::Overlay(path) => Some(path.display().to_string()),
        PortSource::Registry => None,
    };
    DisplayLine {
        marker,
        spec_text: action.package.to_string(),
        features_text,
        source_location,
    }
}

fn remove_line(remove: &RemoveAction) -> DisplayLine {
    DisplayLine {
        marker: ' ',
        spec_text: remove.package.to_string(),
        features_text: String::new(),
        source_location: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashMap};
    use std::path::PathBuf;
    use std::sync::Arc;
    use vcpkg_model::identifiers::{PackageName, Triplet};
    use vcpkg_model::manifest::{CoreParagraph, ConfigurationSource, SourceControlFile};
    use vcpkg_model::port_provider::SourceControlFileAndLocation;
    use vcpkg_model::version::{Version, VersionScheme};
    use vcpkg_platform_expr::PlatformExpr;

    fn spec(name: &str) -> PackageSpec {
        PackageSpec::new(PackageName::new(name).unwrap(), Triplet::new("x64-linux").unwrap())
    }

    fn dummy_action(name: &str, request_type: RequestType, overlay: Option<&str>) -> InstallAction {
        let scf = SourceControlFile {
            core: CoreParagraph {
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
                dependencies: vec![],
                default_features: vec![],
                overrides: vec![],
                builtin_baseline: None,
                configuration: None,
                configuration_source: ConfigurationSource::None,
            },
            features: vec![],
            extra_info: Default::default(),
        };
        let source = match overlay {
            Some(path) => PortSource::Overlay(PathBuf::from(path)),
            None => PortSource::Registry,
        };
        InstallAction {
            package: spec(name),
            features: BTreeSet::from([CORE_FEATURE.to_string(), "extra".to_string()]),
            dependency_map: HashMap::new(),
            package_dependencies: vec![],
            scfl: Arc::new(SourceControlFileAndLocation { scf, source }),
            host_triplet: Triplet::new("x64-linux").unwrap(),
            request_type,
            version_constraint_violations: vec![],
        }
    }

    #[test]
    fn fresh_install_is_marked_auto_with_feature_list() {
        let mut plan = ActionPlan::default();
        plan.install_actions.push(dummy_action("a", RequestType::Auto, None));
        let formatted = format_plan(&plan);
        assert_eq!(formatted.new_installs.len(), 1);
        assert_eq!(formatted.new_installs[0].marker, '*');
        assert!(formatted.new_installs[0].features_text.contains("extra"));
    }

    #[test]
    fn user_requested_install_has_space_marker() {
        let mut plan = ActionPlan::default();
        plan.install_actions.push(dummy_action("a", RequestType::UserRequested, None));
        let formatted = format_plan(&plan);
        assert_eq!(formatted.new_installs[0].marker, ' ');
    }

    #[test]
    fn overlay_source_is_surfaced() {
        let mut plan = ActionPlan::default();
        plan.install_actions
            .push(dummy_action("a", RequestType::Auto, Some("/overlays/a")));
        let formatted = format_plan(&plan);
        assert_eq!(formatted.new_installs[0].source_location.as_deref(), Some("/overlays/a"));
    }

    #[test]
    fn paired_remove_and_install_becomes_a_rebuild() {
        let mut plan = ActionPlan::default();
        plan.remove_actions.push(RemoveAction { package: spec("a") });
        plan.install_actions.push(dummy_action("a", RequestType::Auto, None));
        let formatted = format_plan(&plan);
        assert!(formatted.removes.is_empty());
        assert_eq!(formatted.rebuilds.len(), 1);
    }

    #[test]
    fn unpaired_remove_stays_a_plain_remove() {
        let mut plan = ActionPlan::default();
        plan.remove_actions.push(RemoveAction { package: spec("gone") });
        let formatted = format_plan(&plan);
        assert_eq!(formatted.removes.len(), 1);
        assert!(formatted.rebuilds.is_empty());
    }

    #[test]
    fn merged_interleaves_every_section_by_spec_text() {
        let mut plan = ActionPlan::default();
        plan.remove_actions.push(RemoveAction { package: spec("gone") });
        plan.install_actions.push(dummy_action("new", RequestType::Auto, None));
        plan.already_installed.push(dummy_action("present", RequestType::UserRequested, None));
        let formatted = format_plan(&plan);
        let merged = formatted.merged();
        let texts: Vec<&str> = merged.iter().map(|line| line.spec_text.as_str()).collect();
        let mut expected = texts.clone();
        expected.sort();
        assert_eq!(texts, expected);
        assert_eq!(merged.len(), 3);
    }
}
