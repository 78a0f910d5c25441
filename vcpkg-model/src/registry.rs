// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The registry set: a layered map from package name to a version database providing per-version
//! port source locations and a baseline (name -> version) snapshot.

use crate::errors::Error;
use crate::identifiers::is_git_sha;
use crate::version::{Version, VersionScheme};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a specific port version's source tree lives.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SourceLocator {
    /// A git tree SHA within the registry's backing repository.
    GitTree(String),
    /// A path relative to the registry root, always starting with `$/`.
    Path(String),
}

/// One enumerated version of a package within a registry's version database.
#[derive(Clone, Debug, PartialEq)]
pub struct VersionDbEntry {
    /// The version.
    pub version: Version,
    /// The version's scheme.
    pub scheme: VersionScheme,
    /// Where its source tree lives.
    pub location: SourceLocator,
}

/// A registry's view of one named package: every version it has ever published, and where to
/// find each one's sources.
#[derive(Clone, Debug, PartialEq)]
pub struct RegistryEntry {
    /// The package name this entry describes.
    pub name: String,
    /// Every enumerated version, in file order.
    pub port_versions: Vec<VersionDbEntry>,
}

impl RegistryEntry {
    /// Locates the source tree for `version`, or `NotFound`-style [`Error::RegistryLookupError`]
    /// if it isn't enumerated.
    pub fn get_path_to_version(&self, version: &Version) -> Result<&SourceLocator, Error> {
        self.port_versions
            .iter()
            .find(|entry| entry.version == *version)
            .map(|entry| &entry.location)
            .ok_or_else(|| Error::RegistryLookupError {
                name: self.name.clone(),
                message: format!("version '{}' is not enumerated in the version database", version),
            })
    }
}

fn parse_source_locator(obj: &serde_json::Map<String, Value>, origin: &str) -> Result<SourceLocator, Error> {
    match (obj.get("git-tree"), obj.get("path")) {
        (Some(Value::String(sha)), None) => Ok(SourceLocator::GitTree(sha.clone())),
        (None, Some(Value::String(path))) => {
            if !path.starts_with("$/") || path.contains('\\') || path.split('/').any(|seg| seg == "." || seg == "..") || path.contains("//") {
                return Err(Error::ManifestParseError {
                    origin: origin.to_string(),
                    path: Some("path".to_string()),
                    message: format!("invalid registry path '{}': must start with '$/', use '/' only, and contain no '.'/'..' segments", path),
                });
            }
            Ok(SourceLocator::Path(path.clone()))
        }
        _ => Err(Error::ManifestParseError {
            origin: origin.to_string(),
            path: None,
            message: "version database entry requires exactly one of 'git-tree' or 'path'".to_string(),
        }),
    }
}

fn version_scheme_and_text(obj: &serde_json::Map<String, Value>, origin: &str) -> Result<(String, VersionScheme), Error> {
    const KEYS: &[(&str, VersionScheme)] = &[
        ("version-string", VersionScheme::String),
        ("version", VersionScheme::Relaxed),
        ("version-semver", VersionScheme::Semver),
        ("version-date", VersionScheme::Date),
    ];
    let mut found = None;
    for (key, scheme) in KEYS {
        if let Some(Value::String(text)) = obj.get(*key) {
            if found.is_some() {
                return Err(Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: None,
                    message: "exactly one version field may be present".to_string(),
                });
            }
            found = Some((text.clone(), *scheme));
        }
    }
    found.ok_or_else(|| Error::ManifestParseError {
        origin: origin.to_string(),
        path: None,
        message: "version database entry requires a version field".to_string(),
    })
}

/// Parses a `versions/<x->/<name>.json` version database file.
pub fn parse_version_db_file(value: &Value, origin: &str, name: &str) -> Result<RegistryEntry, Error> {
    let obj = value.as_object().ok_or_else(|| Error::ManifestParseError {
        origin: origin.to_string(),
        path: None,
        message: "expected a JSON object".to_string(),
    })?;
    let versions = obj
        .get("versions")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some("versions".to_string()),
            message: "expected a 'versions' array".to_string(),
        })?;

    let mut port_versions = Vec::with_capacity(versions.len());
    for entry in versions {
        let entry_obj = entry.as_object().ok_or_else(|| Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some("versions[]".to_string()),
            message: "expected an object".to_string(),
        })?;
        let (text, scheme) = version_scheme_and_text(entry_obj, origin)?;
        let port_version = entry_obj.get("port-version").and_then(Value::as_u64).unwrap_or(0);
        let raw = if port_version != 0 {
            format!("{}#{}", text, port_version)
        } else {
            text
        };
        let version = Version::parse(&raw, scheme, origin)?;
        let location = parse_source_locator(entry_obj, origin)?;
        port_versions.push(VersionDbEntry {
            version,
            scheme,
            location,
        });
    }

    Ok(RegistryEntry {
        name: name.to_string(),
        port_versions,
    })
}

/// Parses a `versions/baseline.json` file and selects the sub-map for `baseline_id`.
pub fn parse_baseline_file(value: &Value, origin: &str, baseline_id: &str) -> Result<HashMap<String, Version>, Error> {
    let obj = value.as_object().ok_or_else(|| Error::ManifestParseError {
        origin: origin.to_string(),
        path: None,
        message: "expected a JSON object".to_string(),
    })?;
    let baseline_obj = obj
        .get(baseline_id)
        .and_then(Value::as_object)
        .ok_or_else(|| Error::RegistryLookupError {
            name: baseline_id.to_string(),
            message: "baseline not found in baseline file".to_string(),
        })?;

    let mut result = HashMap::with_capacity(baseline_obj.len());
    for (name, entry) in baseline_obj {
        let entry_obj = entry.as_object().ok_or_else(|| Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some(format!("{}.{}", baseline_id, name)),
            message: "expected an object".to_string(),
        })?;
        let (text, scheme) = version_scheme_and_text(entry_obj, origin)?;
        let port_version = entry_obj.get("port-version").and_then(Value::as_u64).unwrap_or(0);
        let raw = if port_version != 0 {
            format!("{}#{}", text, port_version)
        } else {
            text
        };
        result.insert(name.clone(), Version::parse(&raw, scheme, origin)?);
    }
    Ok(result)
}

/// The storage backing of a [`Registry`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RegistryKind {
    /// The builtin registry bundled with the tool (`ports/`, `versions/`).
    Builtin {
        /// The registry root (contains `ports/` and `versions/`).
        root: PathBuf,
    },
    /// A filesystem-backed registry at an arbitrary root.
    Filesystem {
        /// The registry root (contains `versions/`).
        root: PathBuf,
    },
    /// A git-backed registry, fetched into a local cache.
    Git {
        /// The clone URL.
        repository: String,
        /// The local cache directory it was fetched into.
        cache_root: PathBuf,
    },
}

/// One layer of a [`RegistrySet`]: a source of truth for a set of package names.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Registry {
    /// The storage backing.
    pub kind: RegistryKind,
    /// The package names this registry claims (empty for the default registry, which claims
    /// everything not claimed by an `extra` entry).
    pub packages: Vec<String>,
    /// The baseline identifier: a 40-character commit SHA for `Builtin`/`Git`, or an arbitrary
    /// identifier for `Filesystem`.
    pub baseline: String,
}

impl Registry {
    /// Constructs a registry, validating the baseline format for `Builtin`/`Git` kinds.
    pub fn new(kind: RegistryKind, packages: Vec<String>, baseline: String) -> Result<Self, Error> {
        let requires_sha = matches!(kind, RegistryKind::Builtin { .. } | RegistryKind::Git { .. });
        if requires_sha && !is_git_sha(&baseline) {
            return Err(Error::RegistryLookupError {
                name: baseline.clone(),
                message: format!(
                    "baseline '{}' must be exactly 40 lowercase hex characters",
                    baseline
                ),
            });
        }
        Ok(Registry {
            kind,
            packages,
            baseline,
        })
    }

    fn root(&self) -> &Path {
        match &self.kind {
            RegistryKind::Builtin { root } => root,
            RegistryKind::Filesystem { root } => root,
            RegistryKind::Git { cache_root, .. } => cache_root,
        }
    }

    /// Resolves a version database entry's [`SourceLocator`] to a loadable manifest path.
    ///
    /// `Path` locators resolve relative to the registry root. `GitTree` locators require
    /// checking out a tree from the registry's backing git repository, which this crate does not
    /// implement; they're rejected with [`Error::RegistryLookupError`].
    pub fn resolve_source_locator(&self, locator: &SourceLocator) -> Result<PathBuf, Error> {
        match locator {
            SourceLocator::Path(path) => {
                let relative = path.trim_start_matches("$/");
                Ok(self.root().join(relative).join("vcpkg.json"))
            }
            SourceLocator::GitTree(sha) => Err(Error::RegistryLookupError {
                name: sha.clone(),
                message: "git-tree version entries require a git object store, which this build does not provide".to_string(),
            }),
        }
    }

    /// Path to this registry's unversioned (HEAD) port manifest for `name`, used by the port
    /// file provider in classic (non-versioned) planning.
    pub fn port_manifest_path(&self, name: &str) -> PathBuf {
        self.root().join("ports").join(name).join("vcpkg.json")
    }

    fn versions_db_path(&self, name: &str) -> PathBuf {
        let first = name.chars().next().unwrap_or('_');
        self.root().join("versions").join(format!("{}-", first)).join(format!("{}.json", name))
    }

    fn read_json(path: &Path) -> Result<Option<Value>, Error> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let value = serde_json::from_str(&text).map_err(Error::ConfigParseError)?;
                Ok(Some(value))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::ConfigIoError(err)),
        }
    }

    /// Returns this registry's enumerated versions for `name`, or `RegistryLookupError` if there
    /// is no version database file for it.
    pub fn get_port_entry(&self, name: &str) -> Result<RegistryEntry, Error> {
        let path = self.versions_db_path(name);
        let origin = path.display().to_string();
        match Self::read_json(&path)? {
            Some(value) => parse_version_db_file(&value, &origin, name),
            None => Err(Error::RegistryLookupError {
                name: name.to_string(),
                message: format!("no version database file at '{}'", origin),
            }),
        }
    }

    /// Returns this registry's baseline version for `name`, or `None` if the baseline doesn't
    /// mention it.
    pub fn get_baseline_version(&self, name: &str) -> Result<Option<Version>, Error> {
        let path = self.root().join("versions").join("baseline.json");
        let origin = path.display().to_string();
        match Self::read_json(&path)? {
            Some(value) => {
                let map = parse_baseline_file(&value, &origin, &self.baseline)?;
                Ok(map.get(name).cloned())
            }
            None => Err(Error::RegistryLookupError {
                name: name.to_string(),
                message: format!("no baseline file at '{}'", origin),
            }),
        }
    }
}

/// A layered map from package name to registry: `lookup(name)` returns the first `extra` entry
/// whose `packages` contains `name`, else `default`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegistrySet {
    /// The fallback registry, used for any name not claimed by an `extra` entry.
    pub default: Option<Registry>,
    /// Package-specific registries, consulted in order; first match wins.
    pub extra: Vec<Registry>,
}

impl RegistrySet {
    /// Returns the registry responsible for `name`: the first `extra` entry claiming it, else
    /// `default`.
    pub fn registry_for(&self, name: &str) -> Option<&Registry> {
        self.extra
            .iter()
            .find(|registry| registry.packages.iter().any(|p| p == name))
            .or(self.default.as_ref())
    }

    /// `registry_for(name)?.get_baseline_version(name)`.
    pub fn baseline_for(&self, name: &str) -> Result<Option<Version>, Error> {
        match self.registry_for(name) {
            Some(registry) => registry.get_baseline_version(name),
            None => Ok(None),
        }
    }

    /// `registry_for(name)?.get_port_entry(name)`.
    pub fn get_port_entry(&self, name: &str) -> Result<RegistryEntry, Error> {
        self.registry_for(name)
            .ok_or_else(|| Error::RegistryLookupError {
                name: name.to_string(),
                message: "no registry claims this package and there is no default registry".to_string(),
            })?
            .get_port_entry(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_version_db_file() {
        let value = json!({
            "versions": [
                { "version": "1.2.3", "git-tree": "a".repeat(40) },
                { "version": "1.2.2", "port-version": 1, "path": "$/ports/zlib" },
            ]
        });
        let entry = parse_version_db_file(&value, "test", "zlib").unwrap();
        assert_eq!(entry.port_versions.len(), 2);
        assert_eq!(entry.port_versions[1].version.port_version(), 1);
    }

    #[test]
    fn rejects_path_outside_registry_root() {
        let value = json!({
            "versions": [
                { "version": "1.0", "path": "../escape" },
            ]
        });
        assert!(parse_version_db_file(&value, "test", "zlib").is_err());
    }

    #[test]
    fn builtin_registry_requires_full_sha_baseline() {
        let result = Registry::new(
            RegistryKind::Builtin { root: PathBuf::from("/vcpkg") },
            vec![],
            "not-a-sha".to_string(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn registry_for_prefers_extra_over_default() {
        let default = Registry::new(
            RegistryKind::Filesystem { root: PathBuf::from("/default") },
            vec![],
            "default".to_string(),
        )
        .unwrap();
        let extra = Registry::new(
            RegistryKind::Filesystem { root: PathBuf::from("/extra") },
            vec!["zlib".to_string()],
            "extra".to_string(),
        )
        .unwrap();
        let set = RegistrySet {
            default: Some(default),
            extra: vec![extra],
        };
        assert!(matches!(
            set.registry_for("zlib").unwrap().kind,
            RegistryKind::Filesystem { ref root } if root == Path::new("/extra")
        ));
        assert!(matches!(
            set.registry_for("other").unwrap().kind,
            RegistryKind::Filesystem { ref root } if root == Path::new("/default")
        ));
    }
}
