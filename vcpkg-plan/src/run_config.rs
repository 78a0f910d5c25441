// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A small TOML run-configuration for the `plan` subcommand, following the `cargo-hakari`
//! config-file pattern (`Hakari.toml`): a thin `serde`-decoded struct supplying defaults that
//! explicit command-line flags override.
//!
//! ```toml
//! manifest = "vcpkg.json"
//! ports-dir = "ports"
//! status-db = "status.json"
//! triplet = "x64-linux"
//! host-triplet = "x64-linux"
//! ```

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use serde::Deserialize;

/// Defaults for `plan`'s flags, loaded from a TOML file via `--config`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunConfig {
    /// Default for `--manifest`.
    pub manifest: Option<PathBuf>,
    /// Default for `--ports-dir`.
    pub ports_dir: Option<PathBuf>,
    /// Default for `--status-db`.
    pub status_db: Option<PathBuf>,
    /// Default for `--triplet`.
    pub triplet: Option<String>,
    /// Default for `--host-triplet`.
    pub host_triplet: Option<String>,
}

impl RunConfig {
    /// Reads and parses the run-configuration at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading run-configuration '{}'", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing run-configuration '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kebab_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vcpkg-plan.toml");
        std::fs::write(
            &path,
            r#"
            manifest = "vcpkg.json"
            ports-dir = "ports"
            triplet = "x64-linux"
            "#,
        )
        .unwrap();
        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.manifest, Some(PathBuf::from("vcpkg.json")));
        assert_eq!(config.ports_dir, Some(PathBuf::from("ports")));
        assert_eq!(config.triplet.as_deref(), Some("x64-linux"));
        assert_eq!(config.host_triplet, None);
    }
}
