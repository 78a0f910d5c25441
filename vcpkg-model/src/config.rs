// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parses the registry-set configuration document (`vcpkg-configuration.json`) into a
//! [`RegistrySet`] plus the overlay search paths that feed a [`crate::port_provider::PortFileProvider`].

use crate::errors::Error;
use crate::registry::{Registry, RegistryKind, RegistrySet};
use serde_json::Value;
use std::path::PathBuf;

/// A parsed registry-set configuration: the layered [`RegistrySet`], plus the overlay port and
/// triplet search paths it declared. Paths are resolved relative to `base_dir`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Configuration {
    /// The layered registry set described by `default-registry`/`registries`.
    pub registry_set: RegistrySet,
    /// Overlay port directories, in declared order (highest priority first).
    pub overlay_ports: Vec<PathBuf>,
    /// Overlay triplet directories, in declared order.
    pub overlay_triplets: Vec<PathBuf>,
}

fn as_object<'a>(value: &'a Value, origin: &str, path: &str) -> Result<&'a serde_json::Map<String, Value>, Error> {
    value.as_object().ok_or_else(|| Error::ManifestParseError {
        origin: origin.to_string(),
        path: Some(path.to_string()),
        message: "expected a JSON object".to_string(),
    })
}

fn string_array(obj: &serde_json::Map<String, Value>, key: &str, origin: &str) -> Result<Vec<String>, Error> {
    match obj.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::ManifestParseError {
                        origin: origin.to_string(),
                        path: Some(key.to_string()),
                        message: "expected an array of strings".to_string(),
                    })
            })
            .collect(),
        Some(_) => Err(Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some(key.to_string()),
            message: "expected an array of strings".to_string(),
        }),
    }
}

fn parse_registry_entry(
    obj: &serde_json::Map<String, Value>,
    origin: &str,
    base_dir: &PathBuf,
) -> Result<Registry, Error> {
    let kind = obj
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some("kind".to_string()),
            message: "registry entry requires a 'kind' field".to_string(),
        })?;

    let baseline = obj
        .get("baseline")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let registry_kind = match kind {
        "builtin" => RegistryKind::Builtin {
            root: base_dir.clone(),
        },
        "filesystem" => {
            let path = obj
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::ManifestParseError {
                    origin: origin.to_string(),
                    path: Some("path".to_string()),
                    message: "a 'filesystem' registry requires a 'path' field".to_string(),
                })?;
            RegistryKind::Filesystem {
                root: base_dir.join(path),
            }
        }
        "git" => {
            let repository = obj
                .get("repository")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::ManifestParseError {
                    origin: origin.to_string(),
                    path: Some("repository".to_string()),
                    message: "a 'git' registry requires a 'repository' field".to_string(),
                })?
                .to_string();
            RegistryKind::Git {
                repository,
                cache_root: base_dir.join(".vcpkg-registries").join(sanitize_repo_name(&repository)),
            }
        }
        "artifact" => {
            return Err(Error::ManifestSemanticError {
                origin: origin.to_string(),
                path: Some("kind".to_string()),
                message: "artifact registries do not participate in port resolution".to_string(),
            })
        }
        other => {
            return Err(Error::ManifestParseError {
                origin: origin.to_string(),
                path: Some("kind".to_string()),
                message: format!("unknown registry kind '{}'", other),
            })
        }
    };

    let packages = string_array(obj, "packages", origin)?;
    Registry::new(registry_kind, packages, baseline)
}

fn sanitize_repo_name(repository: &str) -> String {
    repository
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Parses a `vcpkg-configuration.json` document into a [`Configuration`]. `base_dir` is the
/// directory the document was loaded from, used to resolve relative `path` entries and the
/// builtin registry's root.
pub fn parse_configuration(value: &Value, origin: &str, base_dir: &PathBuf) -> Result<Configuration, Error> {
    let obj = as_object(value, origin, "$")?;

    let default = match obj.get("default-registry") {
        Some(Value::Null) | None => None,
        Some(entry) => Some(parse_registry_entry(as_object(entry, origin, "default-registry")?, origin, base_dir)?),
    };

    let mut extra = Vec::new();
    if let Some(entries) = obj.get("registries") {
        let entries = entries.as_array().ok_or_else(|| Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some("registries".to_string()),
            message: "expected an array".to_string(),
        })?;
        for entry in entries {
            let entry_obj = as_object(entry, origin, "registries[]")?;
            match parse_registry_entry(entry_obj, origin, base_dir) {
                Ok(registry) => extra.push(registry),
                Err(Error::ManifestSemanticError { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
    }

    let overlay_ports = string_array(obj, "overlay-ports", origin)?
        .into_iter()
        .map(|p| base_dir.join(p))
        .collect();
    let overlay_triplets = string_array(obj, "overlay-triplets", origin)?
        .into_iter()
        .map(|p| base_dir.join(p))
        .collect();

    Ok(Configuration {
        registry_set: RegistrySet { default, extra },
        overlay_ports,
        overlay_triplets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_filesystem_registry_with_overlays() {
        let value = json!({
            "default-registry": { "kind": "builtin", "baseline": "a".repeat(40) },
            "registries": [
                { "kind": "filesystem", "path": "./custom-registry", "baseline": "my-baseline", "packages": ["zlib"] }
            ],
            "overlay-ports": ["./overlays/ports"],
            "overlay-triplets": ["./overlays/triplets"]
        });
        let base = PathBuf::from("/work");
        let config = parse_configuration(&value, "test", &base).unwrap();
        assert!(matches!(config.registry_set.default.as_ref().unwrap().kind, RegistryKind::Builtin { .. }));
        assert_eq!(config.registry_set.extra.len(), 1);
        assert_eq!(config.overlay_ports, vec![PathBuf::from("/work/overlays/ports")]);
        assert_eq!(config.overlay_triplets, vec![PathBuf::from("/work/overlays/triplets")]);
    }

    #[test]
    fn artifact_registries_are_skipped() {
        let value = json!({
            "registries": [
                { "kind": "artifact", "name": "microsoft", "location": "https://example.invalid" }
            ]
        });
        let base = PathBuf::from("/work");
        let config = parse_configuration(&value, "test", &base).unwrap();
        assert!(config.registry_set.extra.is_empty());
    }

    #[test]
    fn rejects_unknown_kind() {
        let value = json!({ "default-registry": { "kind": "bogus" } });
        let base = PathBuf::from("/work");
        assert!(parse_configuration(&value, "test", &base).is_err());
    }
}
