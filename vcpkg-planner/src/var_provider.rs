// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supplies triplet (CMake-derived) platform variables to the planner, batched per §4.8 step 4.

use std::collections::HashMap;
use vcpkg_model::identifiers::PackageSpec;
use vcpkg_platform_expr::PlatformVars;

/// Loads and caches the platform variable map for a `PackageSpec`'s triplet.
///
/// The planner never reads triplet variables eagerly: it defers any `FeatureSpec` whose
/// resolution needs them into a qualified queue, then calls [`load_dep_info_vars`] once with the
/// full batch before resuming. Implementations are free to parallelize the batch internally; the
/// planner makes no assumption about how `specs` are fetched, only that every one of them has an
/// entry after `load_dep_info_vars` returns.
///
/// [`load_dep_info_vars`]: PlatformVarProvider::load_dep_info_vars
pub trait PlatformVarProvider {
    /// Loads (and caches) the variable map for every spec in `specs` that isn't already cached.
    fn load_dep_info_vars(&mut self, specs: &[PackageSpec]);

    /// Returns the cached variable map for `spec`, or `None` if it hasn't been loaded yet.
    fn get_dep_info_vars(&self, spec: &PackageSpec) -> Option<&PlatformVars>;
}

/// A [`PlatformVarProvider`] backed by a fixed, caller-supplied map -- the shape a test harness
/// or a triplet-file-driven implementation would use.
#[derive(Default)]
pub struct StaticVarProvider {
    vars: HashMap<PackageSpec, PlatformVars>,
}

impl StaticVarProvider {
    /// Constructs an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the variable map to serve for `spec`.
    pub fn insert(&mut self, spec: PackageSpec, vars: PlatformVars) -> &mut Self {
        self.vars.insert(spec, vars);
        self
    }
}

impl PlatformVarProvider for StaticVarProvider {
    fn load_dep_info_vars(&mut self, _specs: &[PackageSpec]) {
        // Everything this provider will ever know is supplied up front via `insert`; there is no
        // external fetch to perform.
    }

    fn get_dep_info_vars(&self, spec: &PackageSpec) -> Option<&PlatformVars> {
        self.vars.get(spec)
    }
}
