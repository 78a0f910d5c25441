// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port and project manifest model: parsing, validation, canonicalization and re-serialization.

mod suggest;

use crate::errors::Error;
use crate::identifiers::{is_package_name, CORE_FEATURE, DEFAULT_FEATURE};
use crate::version::{Version, VersionScheme};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use vcpkg_platform_expr::{ParseMode, PlatformExpr};
use vcpkg_spdx::SpdxExpr;

const DEPENDENCY_KEYS: &[&str] = &[
    "name",
    "host",
    "features",
    "default-features",
    "platform",
    "version>=",
    "port-version",
];

const VERSION_KEYS: &[(&str, VersionScheme)] = &[
    ("version-string", VersionScheme::String),
    ("version", VersionScheme::Relaxed),
    ("version-semver", VersionScheme::Semver),
    ("version-date", VersionScheme::Date),
];

/// Which of `configuration`/`vcpkg-configuration` a manifest's embedded configuration came from,
/// recorded for faithful round-trip.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigurationSource {
    /// No embedded configuration.
    None,
    /// The `configuration` key was used.
    Configuration,
    /// The `vcpkg-configuration` key was used.
    VcpkgConfiguration,
}

/// A minimum-version dependency constraint (`version>=`).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VersionConstraint {
    /// The minimum version's text (without the `#N` port-version suffix).
    pub text: String,
    /// The minimum port-version, if the constraint carried a `#N` suffix.
    pub port_version: u64,
}

/// One dependency entry: either a bare package name, or an object carrying features, platform
/// gating, and a version constraint.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Dependency {
    /// The depended-on package name.
    pub name: String,
    /// Normalized feature list: validated feature names, plus the literal `"core"` when
    /// `default_features` is `false`.
    pub features: Vec<String>,
    /// Whether default features are requested (`true` unless `default-features: false` was
    /// given).
    pub default_features: bool,
    /// Whether this edge retargets to the host triplet.
    pub host: bool,
    /// The platform expression gating this edge.
    pub platform: PlatformExpr,
    /// An optional minimum-version constraint.
    pub constraint: Option<VersionConstraint>,
    /// `$`-prefixed keys found on the dependency object, preserved verbatim.
    pub extra_info: IndexMap<String, Value>,
}

/// A root-manifest pin forcing a particular version of a named package.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Override {
    /// The package name being overridden.
    pub name: String,
    /// The forced version.
    pub version: Version,
    /// The version's scheme (may differ from the target port's own declared scheme).
    pub version_scheme: VersionScheme,
}

/// One entry of a manifest's `default-features` list: either a bare feature name, or `{name,
/// platform}`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DefaultFeatureEntry {
    /// The feature name.
    pub name: String,
    /// The platform expression gating this default feature (always-true if unspecified).
    pub platform: PlatformExpr,
}

/// `{ name, description[], dependencies[], supports, license }`.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureParagraph {
    /// The feature's name.
    pub name: String,
    /// The feature's description, always stored as the array-of-strings canonical form.
    pub description: Vec<String>,
    /// The feature's dependencies.
    pub dependencies: Vec<Dependency>,
    /// The platform expression gating this feature's availability.
    pub supports: PlatformExpr,
    /// An optional SPDX license expression specific to this feature.
    pub license: Option<SpdxExpr>,
}

/// The `core` paragraph of a [`SourceControlFile`]: identity, version, and manifest-wide fields.
#[derive(Clone, Debug, PartialEq)]
pub struct CoreParagraph {
    /// The package name. Absent only for project manifests.
    pub name: Option<String>,
    /// The declared version.
    pub version: Version,
    /// The version's scheme.
    pub version_scheme: VersionScheme,
    /// Maintainer strings.
    pub maintainers: Vec<String>,
    /// Description, always stored as the array-of-strings canonical form.
    pub description: Vec<String>,
    /// Summary, always stored as the array-of-strings canonical form.
    pub summary: Vec<String>,
    /// Homepage URL.
    pub homepage: Option<String>,
    /// Documentation URL.
    pub documentation: Option<String>,
    /// SPDX license expression.
    pub license: Option<SpdxExpr>,
    /// Platform expression gating the whole port.
    pub supports: PlatformExpr,
    /// Core dependencies.
    pub dependencies: Vec<Dependency>,
    /// Default feature list.
    pub default_features: Vec<DefaultFeatureEntry>,
    /// Version overrides.
    pub overrides: Vec<Override>,
    /// The git commit SHA used as this manifest's implicit baseline, if declared.
    pub builtin_baseline: Option<String>,
    /// The embedded registry-set configuration object, if any.
    pub configuration: Option<Value>,
    /// Which key the embedded configuration came from.
    pub configuration_source: ConfigurationSource,
}

/// A fully parsed port or project manifest.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceControlFile {
    /// The core paragraph.
    pub core: CoreParagraph,
    /// Feature paragraphs, sorted by name.
    pub features: Vec<FeatureParagraph>,
    /// `$`-prefixed top-level keys, sorted and preserved verbatim.
    pub extra_info: IndexMap<String, Value>,
}

fn as_object<'a>(value: &'a Value, origin: &str, path: &str) -> Result<&'a Map<String, Value>, Error> {
    value.as_object().ok_or_else(|| Error::ManifestParseError {
        origin: origin.to_string(),
        path: Some(path.to_string()),
        message: "expected a JSON object".to_string(),
    })
}

fn as_string(value: &Value, origin: &str, path: &str) -> Result<String, Error> {
    value
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some(path.to_string()),
            message: "expected a string".to_string(),
        })
}

fn as_bool(value: &Value, origin: &str, path: &str) -> Result<bool, Error> {
    value.as_bool().ok_or_else(|| Error::ManifestParseError {
        origin: origin.to_string(),
        path: Some(path.to_string()),
        message: "expected a boolean".to_string(),
    })
}

/// Parses either a bare string or an array of strings into the array-of-strings canonical form.
fn parse_string_or_array(value: &Value, origin: &str, path: &str) -> Result<Vec<String>, Error> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| as_string(item, origin, &format!("{}[{}]", path, i)))
            .collect(),
        _ => Err(Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some(path.to_string()),
            message: "expected a string or array of strings".to_string(),
        }),
    }
}

fn parse_feature_name(
    s: &str,
    origin: &str,
    path: &str,
    context: &str,
) -> Result<String, Error> {
    if s == CORE_FEATURE || s == DEFAULT_FEATURE {
        return Err(Error::ManifestSemanticError {
            origin: origin.to_string(),
            path: Some(path.to_string()),
            message: format!("'{}' is a reserved pseudo-feature and cannot appear {}", s, context),
        });
    }
    if !crate::identifiers::is_feature_name(s) {
        return Err(Error::ManifestSemanticError {
            origin: origin.to_string(),
            path: Some(path.to_string()),
            message: format!("'{}' is not a valid feature name", s),
        });
    }
    Ok(s.to_string())
}

fn split_extra_info(obj: &Map<String, Value>) -> IndexMap<String, Value> {
    let mut extra = IndexMap::new();
    for (k, v) in obj {
        if k.starts_with('$') {
            extra.insert(k.clone(), v.clone());
        }
    }
    extra.sort_keys();
    extra
}

fn parse_platform_field(
    obj: &Map<String, Value>,
    key: &str,
    origin: &str,
    path: &str,
) -> Result<PlatformExpr, Error> {
    match obj.get(key) {
        None => Ok(PlatformExpr::always_true()),
        Some(value) => {
            let text = as_string(value, origin, path)?;
            PlatformExpr::parse(&text, ParseMode::Strict).map_err(|source| Error::PlatformExprError {
                origin: format!("{} ({})", origin, path),
                source,
            })
        }
    }
}

fn parse_license_field(
    obj: &Map<String, Value>,
    key: &str,
    origin: &str,
    path: &str,
) -> Result<Option<SpdxExpr>, Error> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let text = as_string(value, origin, path)?;
            SpdxExpr::parse(&text)
                .map(Some)
                .map_err(|source| Error::LicenseParseError {
                    origin: format!("{} ({})", origin, path),
                    source,
                })
        }
    }
}

fn parse_version_fields(
    obj: &Map<String, Value>,
    origin: &str,
    path: &str,
    allow_missing: bool,
) -> Result<(Version, VersionScheme), Error> {
    let mut found: Option<(&str, VersionScheme)> = None;
    for (key, scheme) in VERSION_KEYS {
        if obj.contains_key(*key) {
            if found.is_some() {
                return Err(Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: Some(path.to_string()),
                    message: "exactly one version field may be present".to_string(),
                });
            }
            found = Some((key, *scheme));
        }
    }

    let port_version: Option<u64> = match obj.get("port-version") {
        None => None,
        Some(value) => Some(value.as_u64().ok_or_else(|| Error::ManifestSemanticError {
            origin: origin.to_string(),
            path: Some(format!("{}.port-version", path)),
            message: "port-version must be a non-negative integer".to_string(),
        })?),
    };

    match found {
        None => {
            if !allow_missing {
                return Err(Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: Some(path.to_string()),
                    message: "a version field is required".to_string(),
                });
            }
            if port_version.is_some() {
                return Err(Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: Some(format!("{}.port-version", path)),
                    message: "port-version requires a version field".to_string(),
                });
            }
            Ok((Version::parse("", VersionScheme::Missing, origin)?, VersionScheme::Missing))
        }
        Some((key, scheme)) => {
            let text = as_string(&obj[key], origin, &format!("{}.{}", path, key))?;
            if scheme == VersionScheme::String && text.contains('#') {
                return Err(Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: Some(format!("{}.{}", path, key)),
                    message: "version-string must not embed a '#N' port-version".to_string(),
                });
            }
            let has_embedded = text.contains('#');
            if has_embedded && port_version.is_some() {
                return Err(Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: Some(format!("{}.port-version", path)),
                    message: "an embedded '#N' port-version and a sibling port-version key are mutually exclusive".to_string(),
                });
            }
            let raw = match port_version {
                Some(pv) => format!("{}#{}", text, pv),
                None => text,
            };
            let version = Version::parse(&raw, scheme, origin)?;
            Ok((version, scheme))
        }
    }
}

fn parse_dependency(
    value: &Value,
    origin: &str,
    path: &str,
) -> Result<Dependency, Error> {
    match value {
        Value::String(name) => {
            if !is_package_name(name) {
                return Err(Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: Some(path.to_string()),
                    message: format!("'{}' is not a valid package name", name),
                });
            }
            Ok(Dependency {
                name: name.clone(),
                features: Vec::new(),
                default_features: true,
                host: false,
                platform: PlatformExpr::always_true(),
                constraint: None,
                extra_info: IndexMap::new(),
            })
        }
        Value::Object(obj) => {
            for key in obj.keys() {
                if key.starts_with('$') {
                    continue;
                }
                if !DEPENDENCY_KEYS.contains(&key.as_str()) {
                    let suggestion = suggest::suggest(key, DEPENDENCY_KEYS);
                    let message = match suggestion {
                        Some(hint) => format!("unrecognized dependency key '{}' ({})", key, hint),
                        None => format!("unrecognized dependency key '{}'", key),
                    };
                    return Err(Error::ManifestSemanticError {
                        origin: origin.to_string(),
                        path: Some(format!("{}.{}", path, key)),
                        message,
                    });
                }
            }

            let name = obj
                .get("name")
                .ok_or_else(|| Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: Some(path.to_string()),
                    message: "dependency object requires a 'name'".to_string(),
                })
                .and_then(|v| as_string(v, origin, &format!("{}.name", path)))?;
            if !is_package_name(&name) {
                return Err(Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: Some(format!("{}.name", path)),
                    message: format!("'{}' is not a valid package name", name),
                });
            }

            let host = match obj.get("host") {
                Some(v) => as_bool(v, origin, &format!("{}.host", path))?,
                None => false,
            };

            let mut features = Vec::new();
            if let Some(Value::Array(items)) = obj.get("features") {
                for (i, item) in items.iter().enumerate() {
                    let s = as_string(item, origin, &format!("{}.features[{}]", path, i))?;
                    features.push(parse_feature_name(
                        &s,
                        origin,
                        &format!("{}.features[{}]", path, i),
                        "in a dependency's feature list",
                    )?);
                }
            } else if obj.contains_key("features") {
                return Err(Error::ManifestParseError {
                    origin: origin.to_string(),
                    path: Some(format!("{}.features", path)),
                    message: "expected an array of feature names".to_string(),
                });
            }

            let default_features = match obj.get("default-features") {
                Some(v) => as_bool(v, origin, &format!("{}.default-features", path))?,
                None => true,
            };
            if !default_features && !features.iter().any(|f| f == CORE_FEATURE) {
                features.push(CORE_FEATURE.to_string());
            }

            let platform = parse_platform_field(obj, "platform", origin, &format!("{}.platform", path))?;

            if obj.contains_key("port-version") && !obj.contains_key("version>=") {
                return Err(Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: Some(format!("{}.port-version", path)),
                    message: "dependencies without a 'version>=' constraint must not carry a port-version".to_string(),
                });
            }

            let constraint = match obj.get("version>=") {
                None => None,
                Some(value) => {
                    let text = as_string(value, origin, &format!("{}.version>=", path))?;
                    let (text, port_version) = Version::split_port_version(&text).map_err(|message| {
                        Error::ManifestSemanticError {
                            origin: origin.to_string(),
                            path: Some(format!("{}.version>=", path)),
                            message,
                        }
                    })?;
                    if obj.contains_key("port-version") {
                        return Err(Error::ManifestSemanticError {
                            origin: origin.to_string(),
                            path: Some(format!("{}.port-version", path)),
                            message: "a sibling 'port-version' and an embedded '#N' minimum are mutually exclusive".to_string(),
                        });
                    }
                    Some(VersionConstraint {
                        text: text.to_string(),
                        port_version,
                    })
                }
            };

            Ok(Dependency {
                name,
                features,
                default_features,
                host,
                platform,
                constraint,
                extra_info: split_extra_info(obj),
            })
        }
        _ => Err(Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some(path.to_string()),
            message: "expected a string or object dependency entry".to_string(),
        }),
    }
}

fn parse_dependencies(value: Option<&Value>, origin: &str, path: &str) -> Result<Vec<Dependency>, Error> {
    match value {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_dependency(item, origin, &format!("{}[{}]", path, i)))
            .collect(),
        Some(_) => Err(Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some(path.to_string()),
            message: "expected an array of dependencies".to_string(),
        }),
    }
}

fn parse_default_feature_entry(value: &Value, origin: &str, path: &str) -> Result<DefaultFeatureEntry, Error> {
    match value {
        Value::String(s) => Ok(DefaultFeatureEntry {
            name: parse_feature_name(s, origin, path, "in the default-features list")?,
            platform: PlatformExpr::always_true(),
        }),
        Value::Object(obj) => {
            let name = obj
                .get("name")
                .ok_or_else(|| Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: Some(path.to_string()),
                    message: "default-features entry object requires a 'name'".to_string(),
                })
                .and_then(|v| as_string(v, origin, &format!("{}.name", path)))?;
            let name = parse_feature_name(&name, origin, &format!("{}.name", path), "in the default-features list")?;
            let platform = parse_platform_field(obj, "platform", origin, &format!("{}.platform", path))?;
            Ok(DefaultFeatureEntry { name, platform })
        }
        _ => Err(Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some(path.to_string()),
            message: "expected a string or {name, platform} object".to_string(),
        }),
    }
}

fn parse_default_features(value: Option<&Value>, origin: &str, path: &str) -> Result<Vec<DefaultFeatureEntry>, Error> {
    match value {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_default_feature_entry(item, origin, &format!("{}[{}]", path, i)))
            .collect(),
        Some(_) => Err(Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some(path.to_string()),
            message: "expected an array of default features".to_string(),
        }),
    }
}

fn parse_override(value: &Value, origin: &str, path: &str) -> Result<Override, Error> {
    let obj = as_object(value, origin, path)?;
    let name = obj
        .get("name")
        .ok_or_else(|| Error::ManifestSemanticError {
            origin: origin.to_string(),
            path: Some(path.to_string()),
            message: "override object requires a 'name'".to_string(),
        })
        .and_then(|v| as_string(v, origin, &format!("{}.name", path)))?;
    let (version, version_scheme) = parse_version_fields(obj, origin, path, false)?;
    Ok(Override {
        name,
        version,
        version_scheme,
    })
}

fn parse_overrides(value: Option<&Value>, origin: &str, path: &str) -> Result<Vec<Override>, Error> {
    match value {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| parse_override(item, origin, &format!("{}[{}]", path, i)))
            .collect(),
        Some(_) => Err(Error::ManifestParseError {
            origin: origin.to_string(),
            path: Some(path.to_string()),
            message: "expected an array of overrides".to_string(),
        }),
    }
}

fn parse_feature_paragraph(
    name: String,
    obj: &Map<String, Value>,
    origin: &str,
    path: &str,
) -> Result<FeatureParagraph, Error> {
    let name = parse_feature_name(&name, origin, path, "as a feature name")?;
    let description = obj
        .get("description")
        .ok_or_else(|| Error::ManifestSemanticError {
            origin: origin.to_string(),
            path: Some(format!("{}.description", path)),
            message: "feature paragraphs require a description".to_string(),
        })
        .and_then(|v| parse_string_or_array(v, origin, &format!("{}.description", path)))?;
    let dependencies = parse_dependencies(obj.get("dependencies"), origin, &format!("{}.dependencies", path))?;
    let supports = parse_platform_field(obj, "supports", origin, &format!("{}.supports", path))?;
    let license = parse_license_field(obj, "license", origin, &format!("{}.license", path))?;
    Ok(FeatureParagraph {
        name,
        description,
        dependencies,
        supports,
        license,
    })
}

fn parse_features(value: Option<&Value>, origin: &str, path: &str) -> Result<Vec<FeatureParagraph>, Error> {
    let mut features = match value {
        None => Vec::new(),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, v)| {
                let obj = as_object(v, origin, &format!("{}.{}", path, name))?;
                parse_feature_paragraph(name.clone(), obj, origin, &format!("{}.{}", path, name))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let obj = as_object(v, origin, &format!("{}[{}]", path, i))?;
                let name = obj
                    .get("name")
                    .ok_or_else(|| Error::ManifestSemanticError {
                        origin: origin.to_string(),
                        path: Some(format!("{}[{}]", path, i)),
                        message: "feature array entries require a 'name'".to_string(),
                    })
                    .and_then(|v| as_string(v, origin, &format!("{}[{}].name", path, i)))?;
                parse_feature_paragraph(name, obj, origin, &format!("{}[{}]", path, i))
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(Error::ManifestParseError {
                origin: origin.to_string(),
                path: Some(path.to_string()),
                message: "expected a features object or array".to_string(),
            })
        }
    };

    features.sort_by(|a, b| a.name.cmp(&b.name));
    for pair in features.windows(2) {
        if pair[0].name == pair[1].name {
            return Err(Error::ManifestSemanticError {
                origin: origin.to_string(),
                path: Some(path.to_string()),
                message: format!("duplicate feature name '{}'", pair[0].name),
            });
        }
    }
    Ok(features)
}

fn parse_configuration(
    obj: &Map<String, Value>,
    origin: &str,
) -> Result<(Option<Value>, ConfigurationSource), Error> {
    match (obj.get("configuration"), obj.get("vcpkg-configuration")) {
        (Some(_), Some(_)) => Err(Error::ManifestSemanticError {
            origin: origin.to_string(),
            path: Some("$.configuration".to_string()),
            message: "'configuration' and 'vcpkg-configuration' are mutually exclusive".to_string(),
        }),
        (Some(v), None) => Ok((Some(v.clone()), ConfigurationSource::Configuration)),
        (None, Some(v)) => Ok((Some(v.clone()), ConfigurationSource::VcpkgConfiguration)),
        (None, None) => Ok((None, ConfigurationSource::None)),
    }
}

fn parse_source_control_file(value: &Value, origin: &str, is_port: bool) -> Result<SourceControlFile, Error> {
    let obj = as_object(value, origin, "$")?;

    let name = match obj.get("name") {
        Some(v) => {
            let name = as_string(v, origin, "$.name")?;
            if !is_package_name(&name) {
                return Err(Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: Some("$.name".to_string()),
                    message: format!("'{}' is not a valid package name", name),
                });
            }
            Some(name)
        }
        None => {
            if is_port {
                return Err(Error::ManifestSemanticError {
                    origin: origin.to_string(),
                    path: Some("$.name".to_string()),
                    message: "port manifests require a 'name'".to_string(),
                });
            }
            None
        }
    };

    let (version, version_scheme) = parse_version_fields(obj, origin, "$", !is_port)?;
    if is_port && version_scheme == VersionScheme::Missing {
        return Err(Error::ManifestSemanticError {
            origin: origin.to_string(),
            path: Some("$".to_string()),
            message: "port manifests require a version".to_string(),
        });
    }

    let maintainers = match obj.get("maintainers") {
        None => Vec::new(),
        Some(v) => parse_string_or_array(v, origin, "$.maintainers")?,
    };
    let description = match obj.get("description") {
        None => Vec::new(),
        Some(v) => parse_string_or_array(v, origin, "$.description")?,
    };
    let summary = match obj.get("summary") {
        None => Vec::new(),
        Some(v) => parse_string_or_array(v, origin, "$.summary")?,
    };
    let homepage = obj.get("homepage").map(|v| as_string(v, origin, "$.homepage")).transpose()?;
    let documentation = obj
        .get("documentation")
        .map(|v| as_string(v, origin, "$.documentation"))
        .transpose()?;
    let license = parse_license_field(obj, "license", origin, "$.license")?;
    let supports = parse_platform_field(obj, "supports", origin, "$.supports")?;
    let dependencies = parse_dependencies(obj.get("dependencies"), origin, "$.dependencies")?;
    let default_features = parse_default_features(obj.get("default-features"), origin, "$.default-features")?;
    let overrides = parse_overrides(obj.get("overrides"), origin, "$.overrides")?;
    let builtin_baseline = obj
        .get("builtin-baseline")
        .map(|v| as_string(v, origin, "$.builtin-baseline"))
        .transpose()?;
    let (configuration, configuration_source) = parse_configuration(obj, origin)?;
    let features = parse_features(obj.get("features"), origin, "$.features")?;
    let extra_info = split_extra_info(obj);

    let mut scf = SourceControlFile {
        core: CoreParagraph {
            name,
            version,
            version_scheme,
            maintainers,
            description,
            summary,
            homepage,
            documentation,
            license,
            supports,
            dependencies,
            default_features,
            overrides,
            builtin_baseline,
            configuration,
            configuration_source,
        },
        features,
        extra_info,
    };
    scf.canonicalize();
    Ok(scf)
}

/// Parses a port manifest (`vcpkg.json` in a port directory): `name` is required, and exactly one
/// of the four version keys must be present (`Missing` scheme is rejected).
pub fn parse_port_manifest(value: &Value, origin: &str) -> Result<SourceControlFile, Error> {
    parse_source_control_file(value, origin, true)
}

/// Parses a project manifest (a top-level `vcpkg.json` consuming ports, not itself a port):
/// `name` is optional, and a missing version field yields the `Missing` scheme.
pub fn parse_project_manifest(value: &Value, origin: &str) -> Result<SourceControlFile, Error> {
    parse_source_control_file(value, origin, false)
}

impl SourceControlFile {
    /// Re-sorts dependencies, feature lists, feature paragraphs, and `extra_info` keys into the
    /// canonical order so that serialization is stable. Parsing already calls this; it's exposed
    /// so callers that mutate a parsed manifest in place can restore canonical order.
    pub fn canonicalize(&mut self) {
        canonicalize_dependencies(&mut self.core.dependencies);
        for feature in &mut self.features {
            canonicalize_dependencies(&mut feature.dependencies);
        }
        self.features.sort_by(|a, b| a.name.cmp(&b.name));
        self.extra_info.sort_keys();
    }

    /// Re-serializes this manifest to its canonical JSON form, in the field order fixed by the
    /// external interface: `$*`, `name`, the version fields, `maintainers`, `summary`,
    /// `description`, `homepage`, `documentation`, `license`, `dependencies`, `default-features`,
    /// `features`, `supports`, `overrides`, `builtin-baseline`, then the embedded configuration.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (k, v) in &self.extra_info {
            map.insert(k.clone(), v.clone());
        }
        if let Some(name) = &self.core.name {
            map.insert("name".to_string(), Value::String(name.clone()));
        }
        insert_version_fields(&mut map, &self.core.version, self.core.version_scheme);
        insert_string_list(&mut map, "maintainers", &self.core.maintainers);
        insert_string_list(&mut map, "summary", &self.core.summary);
        insert_string_list(&mut map, "description", &self.core.description);
        if let Some(homepage) = &self.core.homepage {
            map.insert("homepage".to_string(), Value::String(homepage.clone()));
        }
        if let Some(documentation) = &self.core.documentation {
            map.insert("documentation".to_string(), Value::String(documentation.clone()));
        }
        if let Some(license) = &self.core.license {
            map.insert("license".to_string(), Value::String(license.to_canonical_string()));
        }
        if !self.core.dependencies.is_empty() {
            map.insert(
                "dependencies".to_string(),
                Value::Array(self.core.dependencies.iter().map(dependency_to_json).collect()),
            );
        }
        if !self.core.default_features.is_empty() {
            map.insert(
                "default-features".to_string(),
                Value::Array(
                    self.core
                        .default_features
                        .iter()
                        .map(default_feature_to_json)
                        .collect(),
                ),
            );
        }
        if !self.features.is_empty() {
            map.insert(
                "features".to_string(),
                Value::Array(self.features.iter().map(feature_to_json).collect()),
            );
        }
        if !self.core.supports.is_empty() {
            map.insert(
                "supports".to_string(),
                Value::String(self.core.supports.expression_str().to_string()),
            );
        }
        if !self.core.overrides.is_empty() {
            map.insert(
                "overrides".to_string(),
                Value::Array(self.core.overrides.iter().map(override_to_json).collect()),
            );
        }
        if let Some(baseline) = &self.core.builtin_baseline {
            map.insert("builtin-baseline".to_string(), Value::String(baseline.clone()));
        }
        if let Some(configuration) = &self.core.configuration {
            let key = match self.core.configuration_source {
                ConfigurationSource::VcpkgConfiguration => "vcpkg-configuration",
                _ => "configuration",
            };
            map.insert(key.to_string(), configuration.clone());
        }
        Value::Object(map)
    }
}

fn insert_version_fields(map: &mut Map<String, Value>, version: &Version, scheme: VersionScheme) {
    if scheme == VersionScheme::Missing {
        return;
    }
    let key = match scheme {
        VersionScheme::String => "version-string",
        VersionScheme::Relaxed => "version",
        VersionScheme::Semver => "version-semver",
        VersionScheme::Date => "version-date",
        VersionScheme::Missing => unreachable!(),
    };
    map.insert(key.to_string(), Value::String(version.text().to_string()));
    if version.port_version() != 0 {
        map.insert("port-version".to_string(), Value::from(version.port_version()));
    }
}

fn insert_string_list(map: &mut Map<String, Value>, key: &str, values: &[String]) {
    if !values.is_empty() {
        map.insert(
            key.to_string(),
            Value::Array(values.iter().cloned().map(Value::String).collect()),
        );
    }
}

fn dependency_to_json(dep: &Dependency) -> Value {
    let is_shorthand = dep.features.is_empty()
        && dep.default_features
        && !dep.host
        && dep.platform.is_empty()
        && dep.constraint.is_none()
        && dep.extra_info.is_empty();
    if is_shorthand {
        return Value::String(dep.name.clone());
    }
    let mut map = Map::new();
    for (k, v) in &dep.extra_info {
        map.insert(k.clone(), v.clone());
    }
    map.insert("name".to_string(), Value::String(dep.name.clone()));
    if dep.host {
        map.insert("host".to_string(), Value::Bool(true));
    }
    let real_features: Vec<_> = dep.features.iter().filter(|f| f.as_str() != CORE_FEATURE).collect();
    if !real_features.is_empty() {
        map.insert(
            "features".to_string(),
            Value::Array(real_features.into_iter().cloned().map(Value::String).collect()),
        );
    }
    if !dep.default_features {
        map.insert("default-features".to_string(), Value::Bool(false));
    }
    if !dep.platform.is_empty() {
        map.insert(
            "platform".to_string(),
            Value::String(dep.platform.expression_str().to_string()),
        );
    }
    if let Some(constraint) = &dep.constraint {
        let text = if constraint.port_version != 0 {
            format!("{}#{}", constraint.text, constraint.port_version)
        } else {
            constraint.text.clone()
        };
        map.insert("version>=".to_string(), Value::String(text));
    }
    Value::Object(map)
}

fn default_feature_to_json(entry: &DefaultFeatureEntry) -> Value {
    if entry.platform.is_empty() {
        Value::String(entry.name.clone())
    } else {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(entry.name.clone()));
        map.insert(
            "platform".to_string(),
            Value::String(entry.platform.expression_str().to_string()),
        );
        Value::Object(map)
    }
}

fn override_to_json(over: &Override) -> Value {
    let mut map = Map::new();
    map.insert("name".to_string(), Value::String(over.name.clone()));
    insert_version_fields(&mut map, &over.version, over.version_scheme);
    Value::Object(map)
}

fn feature_to_json(feature: &FeatureParagraph) -> Value {
    let mut map = Map::new();
    map.insert("name".to_string(), Value::String(feature.name.clone()));
    insert_string_list(&mut map, "description", &feature.description);
    if !feature.dependencies.is_empty() {
        map.insert(
            "dependencies".to_string(),
            Value::Array(feature.dependencies.iter().map(dependency_to_json).collect()),
        );
    }
    if !feature.supports.is_empty() {
        map.insert(
            "supports".to_string(),
            Value::String(feature.supports.expression_str().to_string()),
        );
    }
    if let Some(license) = &feature.license {
        map.insert("license".to_string(), Value::String(license.to_canonical_string()));
    }
    Value::Object(map)
}

fn canonicalize_dependencies(deps: &mut [Dependency]) {
    for dep in deps.iter_mut() {
        dep.features.sort();
    }
    deps.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.platform.expression_str().cmp(b.platform.expression_str()))
            .then_with(|| a.features.len().cmp(&b.features.len()))
            .then_with(|| a.features.cmp(&b.features))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_minimal_port_manifest() {
        let value = json!({
            "name": "zlib",
            "version": "1.2.11",
        });
        let scf = parse_port_manifest(&value, "test").unwrap();
        assert_eq!(scf.core.name.as_deref(), Some("zlib"));
        assert_eq!(scf.core.version.text(), "1.2.11");
        assert_eq!(scf.core.version_scheme, VersionScheme::Relaxed);
    }

    #[test]
    fn port_manifest_requires_name() {
        let value = json!({ "version": "1.0" });
        assert!(parse_port_manifest(&value, "test").is_err());
    }

    #[test]
    fn project_manifest_allows_missing_version() {
        let value = json!({});
        let scf = parse_project_manifest(&value, "test").unwrap();
        assert_eq!(scf.core.version_scheme, VersionScheme::Missing);
    }

    #[test]
    fn rejects_two_version_fields() {
        let value = json!({
            "name": "zlib",
            "version": "1.0",
            "version-semver": "1.0.0",
        });
        assert!(parse_port_manifest(&value, "test").is_err());
    }

    #[test]
    fn dependency_shorthand_string_normalizes() {
        let value = json!({
            "name": "a",
            "version": "1.0",
            "dependencies": ["b"],
        });
        let scf = parse_port_manifest(&value, "test").unwrap();
        assert_eq!(scf.core.dependencies[0].name, "b");
        assert!(scf.core.dependencies[0].default_features);
    }

    #[test]
    fn default_features_false_synthesizes_core() {
        let value = json!({
            "name": "a",
            "version": "1.0",
            "dependencies": [{"name": "b", "default-features": false}],
        });
        let scf = parse_port_manifest(&value, "test").unwrap();
        assert_eq!(scf.core.dependencies[0].features, vec!["core".to_string()]);
    }

    #[test]
    fn rejects_unrecognized_dependency_key_with_suggestion() {
        let value = json!({
            "name": "a",
            "version": "1.0",
            "dependencies": [{"name": "b", "feature": ["x"]}],
        });
        let err = parse_port_manifest(&value, "test").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("did you mean"), "message was: {}", msg);
    }

    #[test]
    fn rejects_core_as_feature_name() {
        let value = json!({
            "name": "a",
            "version": "1.0",
            "dependencies": [{"name": "b", "features": ["core"]}],
        });
        assert!(parse_port_manifest(&value, "test").is_err());
    }

    #[test]
    fn duplicate_feature_names_rejected() {
        let value = json!({
            "name": "a",
            "version": "1.0",
            "features": [
                {"name": "x", "description": "one"},
                {"name": "x", "description": "two"},
            ],
        });
        assert!(parse_port_manifest(&value, "test").is_err());
    }

    #[test]
    fn description_bare_string_canonicalizes_to_array() {
        let value = json!({
            "name": "a",
            "version": "1.0",
            "description": "a single line",
        });
        let scf = parse_port_manifest(&value, "test").unwrap();
        assert_eq!(scf.core.description, vec!["a single line".to_string()]);
    }

    #[test]
    fn port_version_suffix_round_trips() {
        let value = json!({
            "name": "a",
            "version": "1.0",
            "port-version": 3,
        });
        let scf = parse_port_manifest(&value, "test").unwrap();
        assert_eq!(scf.core.version.port_version(), 3);
    }

    #[test]
    fn embedded_hash_and_sibling_port_version_conflict() {
        let value = json!({
            "name": "a",
            "version": "1.0#2",
            "port-version": 3,
        });
        assert!(parse_port_manifest(&value, "test").is_err());
    }

    #[test]
    fn both_configuration_keys_is_an_error() {
        let value = json!({
            "name": "a",
            "version": "1.0",
            "configuration": {},
            "vcpkg-configuration": {},
        });
        assert!(parse_port_manifest(&value, "test").is_err());
    }

    #[test]
    fn extra_dollar_keys_preserved() {
        let value = json!({
            "name": "a",
            "version": "1.0",
            "$comment": "hello",
        });
        let scf = parse_port_manifest(&value, "test").unwrap();
        assert_eq!(scf.extra_info.get("$comment").unwrap(), "hello");
    }

    #[test]
    fn dependencies_canonicalize_by_name_then_platform_then_features() {
        let value = json!({
            "name": "a",
            "version": "1.0",
            "dependencies": ["c", "b", {"name": "a-dep", "features": ["y", "x"]}],
        });
        let scf = parse_port_manifest(&value, "test").unwrap();
        let names: Vec<_> = scf.core.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a-dep", "b", "c"]);
        assert_eq!(scf.core.dependencies[0].features, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn round_trips_through_json() {
        let value = json!({
            "name": "a",
            "version": "1.0",
            "port-version": 2,
            "description": "a lib",
            "dependencies": ["b", {"name": "c", "host": true, "features": ["x"]}],
            "license": "MIT OR Apache-2.0",
        });
        let scf = parse_port_manifest(&value, "test").unwrap();
        let reserialized = scf.to_json();
        let reparsed = parse_port_manifest(&reserialized, "test").unwrap();
        assert_eq!(scf, reparsed);
    }
}
