// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Package/feature identifiers, triplets, and the spec tuples built from them.

use crate::errors::Error;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Pseudo-feature denoting "base install only, no default features".
pub const CORE_FEATURE: &str = "core";
/// Pseudo-feature denoting "apply this port's default feature list".
pub const DEFAULT_FEATURE: &str = "default";
/// Wildcard feature expanding to every feature a manifest declares.
pub const ALL_FEATURES: &str = "*";

static RESERVED_PACKAGE_NAMES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "core", "default", "prn", "aux", "nul", "con", "com0", "com1", "com2", "com3", "com4",
        "com5", "com6", "com7", "com8", "com9", "lpt0", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5",
        "lpt6", "lpt7", "lpt8", "lpt9",
    ]
    .into_iter()
    .collect()
});

fn is_dash_separated_lowercase_alnum(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    s.split('-').all(|part| {
        !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
    })
}

/// True if `s` matches the shared identifier grammar: nonempty, lowercase `[a-z0-9]+(-[a-z0-9]+)*`.
pub fn is_identifier(s: &str) -> bool {
    is_dash_separated_lowercase_alnum(s)
}

/// True if `s` is a valid, non-reserved package name.
pub fn is_package_name(s: &str) -> bool {
    is_identifier(s) && !RESERVED_PACKAGE_NAMES.contains(s)
}

/// True if `s` is a valid, non-reserved feature name (`core`/`default` are reserved).
pub fn is_feature_name(s: &str) -> bool {
    is_identifier(s) && s != CORE_FEATURE && s != DEFAULT_FEATURE
}

/// True if `s` is exactly 40 lowercase hex characters (a git commit SHA).
pub fn is_git_sha(s: &str) -> bool {
    s.len() == 40 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// A validated package name.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PackageName(Arc<str>);

impl PackageName {
    /// Validates and constructs a `PackageName`.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if !is_package_name(&name) {
            return Err(Error::InvalidPackageName { name });
        }
        Ok(PackageName(Arc::from(name)))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated feature name. Never `core`, `default`, or `*` -- those are represented by
/// [`FeatureLabel`] instead when a position needs to admit them.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FeatureName(Arc<str>);

impl FeatureName {
    /// Validates and constructs a `FeatureName`.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if !is_feature_name(&name) {
            return Err(Error::InvalidFeatureName { name });
        }
        Ok(FeatureName(Arc::from(name)))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FeatureName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A feature reference in a dependency's feature list or a `FeatureSpec`: either a concrete
/// [`FeatureName`], or one of the pseudo-features `core`, `default`, `*`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum FeatureLabel {
    /// A concrete, named feature.
    Named(FeatureName),
    /// The `core` pseudo-feature.
    Core,
    /// The `default` pseudo-feature.
    Default,
    /// The `*` wildcard, expanding to every feature a manifest declares.
    All,
}

impl FeatureLabel {
    /// Parses a feature label, accepting `core`/`default`/`*` in addition to named features.
    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            CORE_FEATURE => Ok(FeatureLabel::Core),
            DEFAULT_FEATURE => Ok(FeatureLabel::Default),
            ALL_FEATURES => Ok(FeatureLabel::All),
            other => Ok(FeatureLabel::Named(FeatureName::new(other)?)),
        }
    }
}

impl fmt::Display for FeatureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureLabel::Named(name) => fmt::Display::fmt(name, f),
            FeatureLabel::Core => f.write_str(CORE_FEATURE),
            FeatureLabel::Default => f.write_str(DEFAULT_FEATURE),
            FeatureLabel::All => f.write_str(ALL_FEATURES),
        }
    }
}

/// An opaque, canonical triplet string, e.g. `x64-windows`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Triplet(Arc<str>);

impl Triplet {
    /// Wraps a triplet string. Triplet files are discovered externally (§4/out of scope); this
    /// type just needs the string to be nonempty.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidTriplet { name });
        }
        Ok(Triplet(Arc::from(name)))
    }

    /// Returns the triplet as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `(PackageName, Triplet)`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PackageSpec {
    /// The package name.
    pub name: PackageName,
    /// The triplet this spec targets.
    pub triplet: Triplet,
}

impl PackageSpec {
    /// Constructs a new `PackageSpec`.
    pub fn new(name: PackageName, triplet: Triplet) -> Self {
        PackageSpec { name, triplet }
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.triplet)
    }
}

/// `(PackageSpec, FeatureLabel)`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FeatureSpec {
    /// The package/triplet this feature spec refers to.
    pub package: PackageSpec,
    /// The feature label (possibly `core`, `default`, or `*`).
    pub feature: FeatureLabel,
}

impl FeatureSpec {
    /// Constructs a new `FeatureSpec`.
    pub fn new(package: PackageSpec, feature: FeatureLabel) -> Self {
        FeatureSpec { package, feature }
    }
}

impl fmt::Display for FeatureSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.package, self.feature)
    }
}

/// `(PackageSpec, set<FeatureName>)`. An empty feature set implies default-features.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FullPackageSpec {
    /// The package/triplet being requested.
    pub package: PackageSpec,
    /// The explicitly requested named features. Empty means "apply default features".
    pub features: Vec<FeatureName>,
}

impl FullPackageSpec {
    /// Constructs a new `FullPackageSpec`.
    pub fn new(package: PackageSpec, features: Vec<FeatureName>) -> Self {
        FullPackageSpec { package, features }
    }

    /// The seed feature labels for the planner's worklist: `core` is always implied, plus either
    /// the explicit feature list or the synthetic `default` feature when none was requested.
    pub fn seed_labels(&self) -> Vec<FeatureLabel> {
        let mut labels = vec![FeatureLabel::Core];
        if self.features.is_empty() {
            labels.push(FeatureLabel::Default);
        } else {
            labels.extend(self.features.iter().cloned().map(FeatureLabel::Named));
        }
        labels
    }
}
