// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Caches loaded port manifests behind an overlay search path, falling back to the registry set.

use crate::errors::Error;
use crate::manifest::{self, SourceControlFile};
use crate::registry::RegistrySet;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a loaded [`SourceControlFile`] came from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PortSource {
    /// An overlay directory, either the port directory itself or its parent.
    Overlay(PathBuf),
    /// The registry set's unversioned (HEAD) port directory.
    Registry,
}

/// A loaded manifest paired with where it was found.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceControlFileAndLocation {
    /// The parsed manifest.
    pub scf: SourceControlFile,
    /// Where it was loaded from.
    pub source: PortSource,
}

/// Locates and caches port manifests: overlay directories are searched first (in order), then
/// the registry set. A name found in two overlays is a hard error; a name found in both an
/// overlay and the registry set resolves silently to the overlay.
pub struct PortFileProvider {
    overlay_ports: Vec<PathBuf>,
    registry_set: RegistrySet,
    cache: RefCell<HashMap<String, Arc<SourceControlFileAndLocation>>>,
}

fn find_in_overlay(overlay: &Path, name: &str) -> Option<PathBuf> {
    let direct = overlay.join("vcpkg.json");
    if overlay.file_name().and_then(|n| n.to_str()) == Some(name) && direct.is_file() {
        return Some(direct);
    }
    let nested = overlay.join(name).join("vcpkg.json");
    if nested.is_file() {
        return Some(nested);
    }
    None
}

impl PortFileProvider {
    /// Constructs a provider over the given overlay search path and registry set.
    pub fn new(overlay_ports: Vec<PathBuf>, registry_set: RegistrySet) -> Self {
        PortFileProvider {
            overlay_ports,
            registry_set,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Loads (and caches) the manifest for `name`, searching overlays before the registry set.
    pub fn get_port(&self, name: &str) -> Result<Arc<SourceControlFileAndLocation>, Error> {
        if let Some(hit) = self.cache.borrow().get(name) {
            return Ok(Arc::clone(hit));
        }

        let mut overlay_hits: Vec<PathBuf> = Vec::new();
        for overlay in &self.overlay_ports {
            if let Some(path) = find_in_overlay(overlay, name) {
                overlay_hits.push(path);
            }
        }

        let result = match overlay_hits.as_slice() {
            [] => self.load_from_registry(name)?,
            [single] => self.load_manifest(single, PortSource::Overlay(single.clone()))?,
            [first, second, ..] => {
                return Err(Error::OverlayCollision {
                    name: name.to_string(),
                    paths: (first.display().to_string(), second.display().to_string()),
                })
            }
        };

        let result = Arc::new(result);
        self.cache.borrow_mut().insert(name.to_string(), Arc::clone(&result));
        Ok(result)
    }

    /// Like [`get_port`](Self::get_port), but only consults the overlay search path, never the
    /// registry set. Returns `None` if no overlay claims `name`, letting callers that do their
    /// own registry-backed version selection (versioned planning) fall through to it -- overlay
    /// ports are authoritative and bypass version selection entirely.
    pub fn get_overlay_port(&self, name: &str) -> Option<Result<Arc<SourceControlFileAndLocation>, Error>> {
        if let Some(hit) = self.cache.borrow().get(name) {
            if matches!(hit.source, PortSource::Overlay(_)) {
                return Some(Ok(Arc::clone(hit)));
            }
        }

        let mut overlay_hits: Vec<PathBuf> = Vec::new();
        for overlay in &self.overlay_ports {
            if let Some(path) = find_in_overlay(overlay, name) {
                overlay_hits.push(path);
            }
        }

        match overlay_hits.as_slice() {
            [] => None,
            [single] => Some(self.load_manifest(single, PortSource::Overlay(single.clone())).map(|loaded| {
                let result = Arc::new(loaded);
                self.cache.borrow_mut().insert(name.to_string(), Arc::clone(&result));
                result
            })),
            [first, second, ..] => Some(Err(Error::OverlayCollision {
                name: name.to_string(),
                paths: (first.display().to_string(), second.display().to_string()),
            })),
        }
    }

    fn load_from_registry(&self, name: &str) -> Result<SourceControlFileAndLocation, Error> {
        let registry = self
            .registry_set
            .registry_for(name)
            .ok_or_else(|| Error::PortNotFound { name: name.to_string() })?;
        let path = registry.port_manifest_path(name);
        self.load_manifest(&path, PortSource::Registry)
    }

    fn load_manifest(&self, path: &Path, source: PortSource) -> Result<SourceControlFileAndLocation, Error> {
        let text = fs::read_to_string(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                Error::PortNotFound {
                    name: path.display().to_string(),
                }
            } else {
                Error::ConfigIoError(err)
            }
        })?;
        let value: serde_json::Value = serde_json::from_str(&text).map_err(Error::ConfigParseError)?;
        let scf = manifest::parse_port_manifest(&value, &path.display().to_string())?;
        Ok(SourceControlFileAndLocation { scf, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_nested_layout_is_found() {
        let dir = std::env::temp_dir().join(format!(
            "vcpkg-model-test-{}-{}",
            std::process::id(),
            "overlay-nested"
        ));
        let port_dir = dir.join("zlib");
        fs::create_dir_all(&port_dir).unwrap();
        fs::write(port_dir.join("vcpkg.json"), r#"{"name":"zlib","version":"1.0"}"#).unwrap();

        let provider = PortFileProvider::new(
            vec![dir.clone()],
            RegistrySet {
                default: None,
                extra: vec![],
            },
        );
        let found = provider.get_port("zlib").unwrap();
        assert_eq!(found.scf.core.name.as_deref(), Some("zlib"));
        assert!(matches!(found.source, PortSource::Overlay(_)));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_port_is_not_found() {
        let provider = PortFileProvider::new(
            vec![],
            RegistrySet {
                default: None,
                extra: vec![],
            },
        );
        assert!(provider.get_port("does-not-exist").is_err());
    }
}
