// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contains types that describe errors `vcpkg-model` methods can return.

use std::{error, fmt, io};

/// Error type describing the sorts of errors `vcpkg-model` can return.
///
/// Every manifest-level variant carries `origin` (a caller-supplied string identifying which
/// file/source the error came from) and, where applicable, a JSON pointer (`path`) into the
/// document.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The name did not match the shared identifier grammar.
    InvalidPackageName {
        /// The rejected name.
        name: String,
    },
    /// The feature name did not match the shared identifier grammar, or was a reserved name.
    InvalidFeatureName {
        /// The rejected name.
        name: String,
    },
    /// The triplet string was empty.
    InvalidTriplet {
        /// The rejected triplet.
        name: String,
    },
    /// JSON syntax or schema violation while parsing a manifest.
    ManifestParseError {
        /// Where the manifest came from (file path or similar).
        origin: String,
        /// A `$.path.to.field`-style JSON pointer, when the error localizes to one field.
        path: Option<String>,
        /// A human-readable message.
        message: String,
    },
    /// Reserved-name use, mutually exclusive fields, or a feature-flag mismatch.
    ManifestSemanticError {
        /// Where the manifest came from.
        origin: String,
        /// A `$.path.to.field`-style JSON pointer.
        path: Option<String>,
        /// A human-readable message.
        message: String,
    },
    /// An SPDX grammar violation under strict parsing.
    LicenseParseError {
        /// Where the license expression came from.
        origin: String,
        /// The underlying SPDX parser error.
        source: vcpkg_spdx::Error,
    },
    /// A platform-expression grammar violation.
    PlatformExprError {
        /// Where the expression came from.
        origin: String,
        /// The underlying platform-expression parser error.
        source: vcpkg_platform_expr::Error,
    },
    /// A version string was malformed, or didn't match its declared scheme.
    VersionParseError {
        /// Where the version text came from.
        origin: String,
        /// The offending text.
        text: String,
        /// A human-readable message.
        message: String,
    },
    /// A package name was not found in any registry, its baseline was missing, or a requested
    /// version was not enumerated in its version database.
    RegistryLookupError {
        /// The package name that could not be resolved.
        name: String,
        /// A human-readable message.
        message: String,
    },
    /// A requested name resolved to no manifest.
    PortNotFound {
        /// The package name.
        name: String,
    },
    /// A dependency referenced a feature the port does not declare.
    FeatureNotFound {
        /// The package name.
        package: String,
        /// The missing feature.
        feature: String,
    },
    /// `supports` evaluated false and the unsupported-port action was `Error`.
    UnsupportedPort {
        /// The package name.
        package: String,
        /// The triplet it was unsupported on.
        triplet: String,
    },
    /// The install/remove graph's topological sort found a cycle.
    DependencyCycle {
        /// The packages participating in the cycle, in the order discovered.
        cycle: Vec<String>,
    },
    /// Two overlay port directories both claimed the same package name.
    OverlayCollision {
        /// The package name.
        name: String,
        /// The two colliding overlay paths.
        paths: (String, String),
    },
    /// I/O error reading a configuration file.
    #[doc(hidden)]
    ConfigIoError(io::Error),
    /// Error parsing a configuration file.
    #[doc(hidden)]
    ConfigParseError(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidPackageName { name } => write!(f, "invalid package name '{}'", name),
            Error::InvalidFeatureName { name } => write!(f, "invalid feature name '{}'", name),
            Error::InvalidTriplet { name } => write!(f, "invalid triplet '{}'", name),
            Error::ManifestParseError {
                origin,
                path,
                message,
            } => match path {
                Some(path) => write!(f, "{}: at {}: {}", origin, path, message),
                None => write!(f, "{}: {}", origin, message),
            },
            Error::ManifestSemanticError {
                origin,
                path,
                message,
            } => match path {
                Some(path) => write!(f, "{}: at {}: {}", origin, path, message),
                None => write!(f, "{}: {}", origin, message),
            },
            Error::LicenseParseError { origin, source } => {
                write!(f, "{}: invalid license expression: {}", origin, source)
            }
            Error::PlatformExprError { origin, source } => {
                write!(f, "{}: invalid platform expression: {}", origin, source)
            }
            Error::VersionParseError {
                origin,
                text,
                message,
            } => write!(f, "{}: invalid version '{}': {}", origin, text, message),
            Error::RegistryLookupError { name, message } => {
                write!(f, "registry lookup failed for '{}': {}", name, message)
            }
            Error::PortNotFound { name } => write!(f, "port not found: '{}'", name),
            Error::FeatureNotFound { package, feature } => write!(
                f,
                "package '{}' has no feature named '{}'",
                package, feature
            ),
            Error::UnsupportedPort { package, triplet } => write!(
                f,
                "package '{}' is not supported on triplet '{}'",
                package, triplet
            ),
            Error::DependencyCycle { cycle } => {
                write!(f, "dependency cycle detected: {}", cycle.join(" -> "))
            }
            Error::OverlayCollision { name, paths } => write!(
                f,
                "package '{}' found in two overlay paths: '{}' and '{}'",
                name, paths.0, paths.1
            ),
            Error::ConfigIoError(err) => write!(f, "error reading config file: {}", err),
            Error::ConfigParseError(err) => write!(f, "error parsing config file: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::LicenseParseError { source, .. } => Some(source),
            Error::PlatformExprError { source, .. } => Some(source),
            Error::ConfigIoError(err) => Some(err),
            Error::ConfigParseError(err) => Some(err),
            _ => None,
        }
    }
}
