// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Where the feature-traversal worklist (shared by classic and versioned planning) gets a
//! package's manifest from.

use std::sync::Arc;
use vcpkg_model::port_provider::{PortFileProvider, SourceControlFileAndLocation};

/// Loads a named package's manifest. Classic planning sources this from an ordinary
/// [`PortFileProvider`] (overlay search path, then the registry set's unversioned HEAD);
/// versioned planning sources it from a map already resolved to each package's selected version.
pub trait ManifestSource {
    /// Loads (or returns the cached) manifest for `name`.
    fn load(&self, name: &str) -> Result<Arc<SourceControlFileAndLocation>, String>;
}

impl ManifestSource for PortFileProvider {
    fn load(&self, name: &str) -> Result<Arc<SourceControlFileAndLocation>, String> {
        self.get_port(name).map_err(|err| err.to_string())
    }
}
