// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contains types that describe errors `vcpkg-planner` methods can return.

use std::{error, fmt};

/// Error type describing the sorts of errors the planner can return.
///
/// All variants here are fatal to a planning invocation: the planner never returns a partial
/// `ActionPlan` alongside an error.
#[derive(Debug)]
#[non_exhaustive]
pub enum PlanError {
    /// An error from the underlying manifest/registry/port-provider layer (parse errors,
    /// registry lookup failures, overlay collisions, and so on).
    Model(vcpkg_model::Error),
    /// The install/remove graph's topological sort found a cycle.
    DependencyCycle {
        /// The packages participating in the cycle, in the order discovered.
        cycle: Vec<String>,
    },
    /// `supports` evaluated false under `UnsupportedPortAction::Error`.
    UnsupportedPort {
        /// The package name.
        package: String,
        /// The triplet it was unsupported on.
        triplet: String,
    },
    /// A dependency referenced a feature the target port does not declare.
    FeatureNotFound {
        /// The package name.
        package: String,
        /// The missing feature.
        feature: String,
    },
    /// A referenced port's manifest could not be loaded.
    PortLoadFailed {
        /// The package name.
        package: String,
        /// Why the load failed.
        message: String,
    },
    /// A `version>=` constraint named a version the registry's version database does not
    /// enumerate for that package.
    UnsatisfiableVersionConstraint {
        /// The constrained package name.
        package: String,
        /// The minimum version text the constraint required.
        required_text: String,
    },
    /// Versioned planning's fixpoint iteration did not stabilize within the iteration budget
    /// (almost certainly an override/constraint cycle oscillating between two versions).
    VersionResolutionDidNotConverge,
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::Model(err) => write!(f, "{}", err),
            PlanError::DependencyCycle { cycle } => {
                write!(f, "dependency cycle detected: {}", cycle.join(" -> "))
            }
            PlanError::UnsupportedPort { package, triplet } => write!(
                f,
                "package '{}' is not supported on triplet '{}'",
                package, triplet
            ),
            PlanError::FeatureNotFound { package, feature } => write!(
                f,
                "package '{}' has no feature named '{}'",
                package, feature
            ),
            PlanError::PortLoadFailed { package, message } => {
                write!(f, "could not load manifest for '{}': {}", package, message)
            }
            PlanError::UnsatisfiableVersionConstraint { package, required_text } => write!(
                f,
                "no enumerated version of '{}' satisfies the constraint '{}'",
                package, required_text
            ),
            PlanError::VersionResolutionDidNotConverge => {
                write!(f, "version selection did not converge within the iteration budget")
            }
        }
    }
}

impl error::Error for PlanError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            PlanError::Model(err) => Some(err),
            _ => None,
        }
    }
}

impl From<vcpkg_model::Error> for PlanError {
    fn from(err: vcpkg_model::Error) -> Self {
        PlanError::Model(err)
    }
}
