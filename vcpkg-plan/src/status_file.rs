// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loads a JSON snapshot of the installed-prefix status database into a [`MemoryStatusDb`].
//!
//! The real status database lives in the installed prefix as a set of per-feature control-file
//! style paragraphs (see `spec.md` §3, "Status database"); this demonstration harness accepts the
//! same information as a flat JSON array, one entry per installed package.

use std::path::Path;

use color_eyre::eyre::{Context, Result};
use serde::Deserialize;
use vcpkg_model::identifiers::{PackageName, PackageSpec, Triplet};
use vcpkg_model::status_db::MemoryStatusDb;

#[derive(Debug, Deserialize)]
struct SpecEntry {
    name: String,
    triplet: String,
}

#[derive(Debug, Deserialize)]
struct InstalledEntry {
    name: String,
    triplet: String,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default)]
    default_features: Vec<String>,
    #[serde(default)]
    dependencies: Vec<SpecEntry>,
}

fn to_package_spec(name: &str, triplet: &str) -> Result<PackageSpec> {
    Ok(PackageSpec::new(PackageName::new(name)?, Triplet::new(triplet)?))
}

/// Parses `text` (a JSON array of installed-package entries) into a [`MemoryStatusDb`].
pub fn parse_status_db(text: &str) -> Result<MemoryStatusDb> {
    let entries: Vec<InstalledEntry> =
        serde_json::from_str(text).context("parsing status-db JSON")?;

    let mut db = MemoryStatusDb::new();
    for entry in entries {
        let package = to_package_spec(&entry.name, &entry.triplet)?;
        let dependencies = entry
            .dependencies
            .iter()
            .map(|dep| to_package_spec(&dep.name, &dep.triplet))
            .collect::<Result<Vec<_>>>()?;
        db.install(package, entry.features, entry.default_features, dependencies);
    }
    Ok(db)
}

/// Reads and parses the status-db file at `path`.
pub fn load_status_db(path: &Path) -> Result<MemoryStatusDb> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading status-db file '{}'", path.display()))?;
    parse_status_db(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcpkg_model::status_db::StatusDb;

    #[test]
    fn parses_installed_entries_with_reverse_deps() {
        let text = r#"[
            {"name": "b", "triplet": "x64-linux", "features": [], "default_features": []},
            {"name": "a", "triplet": "x64-linux", "features": ["a1"], "default_features": ["a1"],
             "dependencies": [{"name": "b", "triplet": "x64-linux"}]}
        ]"#;
        let db = parse_status_db(text).unwrap();
        let a = PackageSpec::new(PackageName::new("a").unwrap(), Triplet::new("x64-linux").unwrap());
        let b = PackageSpec::new(PackageName::new("b").unwrap(), Triplet::new("x64-linux").unwrap());
        assert!(db.is_installed(&a, "a1"));
        assert_eq!(db.reverse_deps(&b), [a].into_iter().collect());
    }
}
