// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parses the `name` / `name[feature,feature]` shorthand accepted on the command line into a
//! [`FullPackageSpec`].

use color_eyre::eyre::{bail, Result};
use vcpkg_model::identifiers::{FeatureName, FullPackageSpec, PackageName, PackageSpec, Triplet};

/// Parses one `name` or `name[feat1,feat2]` command-line token into a request entry scoped to
/// `triplet`. An empty feature list requests default features, matching `FullPackageSpec`'s own
/// "empty means default" convention.
pub fn parse_spec_arg(raw: &str, triplet: &Triplet) -> Result<FullPackageSpec> {
    let (name, features) = match raw.split_once('[') {
        None => (raw, Vec::new()),
        Some((name, rest)) => {
            let inner = match rest.strip_suffix(']') {
                Some(inner) => inner,
                None => bail!("'{}': expected a closing ']'", raw),
            };
            let features = if inner.is_empty() {
                Vec::new()
            } else {
                inner.split(',').map(str::trim).map(String::from).collect()
            };
            (name, features)
        }
    };

    let package = PackageSpec::new(PackageName::new(name)?, triplet.clone());
    let features = features
        .into_iter()
        .map(FeatureName::new)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FullPackageSpec::new(package, features))
}
