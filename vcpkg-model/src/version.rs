// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Versions under four schemes, and port-version ordering.

use crate::errors::Error;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

/// The ordering rule attached to a version.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VersionScheme {
    /// Opaque equality only; no ordering.
    String,
    /// Dot-separated nonnegative decimal runs, compared lexicographically component-by-component.
    Relaxed,
    /// Strict semver 2.0, including pre-release precedence.
    Semver,
    /// `YYYY-MM-DD[.N.N...]`; compared as date, then relaxed tail.
    Date,
    /// Only legal for project manifests with no declared version.
    Missing,
}

impl fmt::Display for VersionScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VersionScheme::String => "string",
            VersionScheme::Relaxed => "relaxed",
            VersionScheme::Semver => "semver",
            VersionScheme::Date => "date",
            VersionScheme::Missing => "missing",
        };
        f.write_str(s)
    }
}

/// `(text, port_version)`. The text form `"text#N"` denotes port version `N`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Version {
    text: String,
    port_version: u64,
}

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}(\.\d+)*$").unwrap());

impl Version {
    /// Parses `"text"` or `"text#N"` into a `(text, port_version)` pair, without validating
    /// `text` against any scheme. `N < 0` or more than one `#` fail.
    pub(crate) fn split_port_version(raw: &str) -> Result<(&str, u64), String> {
        let mut parts = raw.split('#');
        let text = parts.next().unwrap_or("");
        match (parts.next(), parts.next()) {
            (None, _) => Ok((text, 0)),
            (Some(n), None) => {
                let n: u64 = n
                    .parse()
                    .map_err(|_| format!("invalid port-version suffix '#{}'", n))?;
                Ok((text, n))
            }
            (Some(_), Some(_)) => Err("version text contains more than one '#'".to_string()),
        }
    }

    /// Parses `text` (optionally carrying a `#N` port-version suffix) under `scheme`, validating
    /// the text against that scheme's grammar.
    pub fn parse(raw: &str, scheme: VersionScheme, origin: &str) -> Result<Self, Error> {
        let (text, port_version) =
            Self::split_port_version(raw).map_err(|message| Error::VersionParseError {
                origin: origin.to_string(),
                text: raw.to_string(),
                message,
            })?;

        match scheme {
            VersionScheme::String => {}
            VersionScheme::Relaxed => {
                validate_relaxed(text).map_err(|message| Error::VersionParseError {
                    origin: origin.to_string(),
                    text: raw.to_string(),
                    message,
                })?;
            }
            VersionScheme::Semver => {
                semver::Version::parse(text).map_err(|err| Error::VersionParseError {
                    origin: origin.to_string(),
                    text: raw.to_string(),
                    message: err.to_string(),
                })?;
            }
            VersionScheme::Date => {
                if !DATE_RE.is_match(text) {
                    return Err(Error::VersionParseError {
                        origin: origin.to_string(),
                        text: raw.to_string(),
                        message: "not a valid YYYY-MM-DD[.N...] date version".to_string(),
                    });
                }
            }
            VersionScheme::Missing => {
                if !text.is_empty() {
                    return Err(Error::VersionParseError {
                        origin: origin.to_string(),
                        text: raw.to_string(),
                        message: "the Missing scheme admits no version text".to_string(),
                    });
                }
            }
        }

        Ok(Version {
            text: text.to_string(),
            port_version,
        })
    }

    /// The version text, without the `#N` port-version suffix.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The port-version number (defaults to 0 if no `#N` suffix was present).
    pub fn port_version(&self) -> u64 {
        self.port_version
    }

    /// Renders back to `"text"` or `"text#N"` (omitting the suffix when `port_version == 0`).
    pub fn to_raw_string(&self) -> String {
        if self.port_version == 0 {
            self.text.clone()
        } else {
            format!("{}#{}", self.text, self.port_version)
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw_string())
    }
}

fn validate_relaxed(text: &str) -> Result<(), String> {
    if text.is_empty() {
        return Err("relaxed version text is empty".to_string());
    }
    for part in text.split('.') {
        if part.is_empty() {
            return Err("relaxed version has an empty dot-separated component".to_string());
        }
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("relaxed version component '{}' is not numeric", part));
        }
        if part.len() > 1 && part.starts_with('0') {
            return Err(format!(
                "relaxed version component '{}' has a leading zero",
                part
            ));
        }
        let value: u64 = part
            .parse()
            .map_err(|_| format!("relaxed version component '{}' does not fit", part))?;
        if value > i32::MAX as u64 {
            return Err(format!(
                "relaxed version component '{}' exceeds 2^31-1",
                part
            ));
        }
    }
    Ok(())
}

fn relaxed_components(text: &str) -> Vec<u64> {
    text.split('.')
        .map(|part| part.parse().unwrap_or(0))
        .collect()
}

fn compare_relaxed(a: &str, b: &str) -> Ordering {
    let a = relaxed_components(a);
    let b = relaxed_components(b);
    let len = a.len().max(b.len());
    for i in 0..len {
        let av = a.get(i).copied().unwrap_or(0);
        let bv = b.get(i).copied().unwrap_or(0);
        match av.cmp(&bv) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn compare_date(a: &str, b: &str) -> Ordering {
    let (a_date, a_rest) = a.split_at(10);
    let (b_date, b_rest) = b.split_at(10);
    match a_date.cmp(b_date) {
        Ordering::Equal => compare_relaxed(a_rest.trim_start_matches('.'), b_rest.trim_start_matches('.')),
        other => other,
    }
}

/// Compares `a` and `b`'s text per `scheme`, falling back to `port_version` when the text
/// compares equal. Cross-scheme comparison is undefined and must not be requested.
pub fn compare_within_scheme(a: &Version, b: &Version, scheme: VersionScheme) -> Ordering {
    let text_order = match scheme {
        VersionScheme::String => {
            if a.text == b.text {
                Ordering::Equal
            } else {
                // Opaque equality only; no ordering is defined beyond equal/not-equal. Treat
                // "not equal" as incomparable-but-total by falling back to a stable lexicographic
                // tiebreak, matching the original's `std::string::operator<`.
                a.text.cmp(&b.text)
            }
        }
        VersionScheme::Relaxed => compare_relaxed(&a.text, &b.text),
        VersionScheme::Semver => {
            let a_sv = semver::Version::parse(&a.text);
            let b_sv = semver::Version::parse(&b.text);
            match (a_sv, b_sv) {
                (Ok(a_sv), Ok(b_sv)) => a_sv.cmp(&b_sv),
                _ => a.text.cmp(&b.text),
            }
        }
        VersionScheme::Date => compare_date(&a.text, &b.text),
        VersionScheme::Missing => Ordering::Equal,
    };
    text_order.then_with(|| a.port_version.cmp(&b.port_version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_port_version_suffix() {
        let v = Version::parse("1.2.3#4", VersionScheme::Relaxed, "test").unwrap();
        assert_eq!(v.text(), "1.2.3");
        assert_eq!(v.port_version(), 4);
        assert_eq!(v.to_raw_string(), "1.2.3#4");
    }

    #[test]
    fn rejects_multiple_hashes() {
        assert!(Version::parse("1.2#3#4", VersionScheme::Relaxed, "test").is_err());
    }

    #[test]
    fn relaxed_rejects_leading_zero() {
        assert!(Version::parse("1.02", VersionScheme::Relaxed, "test").is_err());
    }

    #[test]
    fn relaxed_orders_by_numeric_component() {
        let a = Version::parse("1.9", VersionScheme::Relaxed, "test").unwrap();
        let b = Version::parse("1.10", VersionScheme::Relaxed, "test").unwrap();
        assert_eq!(compare_within_scheme(&a, &b, VersionScheme::Relaxed), Ordering::Less);
    }

    #[test]
    fn relaxed_trailing_zeros_equal() {
        let a = Version::parse("1.2", VersionScheme::Relaxed, "test").unwrap();
        let b = Version::parse("1.2.0", VersionScheme::Relaxed, "test").unwrap();
        assert_eq!(compare_within_scheme(&a, &b, VersionScheme::Relaxed), Ordering::Equal);
    }

    #[test]
    fn semver_orders_prerelease_below_release() {
        let a = Version::parse("1.0.0-alpha", VersionScheme::Semver, "test").unwrap();
        let b = Version::parse("1.0.0", VersionScheme::Semver, "test").unwrap();
        assert_eq!(compare_within_scheme(&a, &b, VersionScheme::Semver), Ordering::Less);
    }

    #[test]
    fn date_compares_date_then_relaxed_tail() {
        let a = Version::parse("2022-01-01.1", VersionScheme::Date, "test").unwrap();
        let b = Version::parse("2022-01-01.2", VersionScheme::Date, "test").unwrap();
        assert_eq!(compare_within_scheme(&a, &b, VersionScheme::Date), Ordering::Less);
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(Version::parse("2022-1-1", VersionScheme::Date, "test").is_err());
    }

    #[test]
    fn port_version_breaks_ties() {
        let a = Version::parse("1.0#1", VersionScheme::Relaxed, "test").unwrap();
        let b = Version::parse("1.0#2", VersionScheme::Relaxed, "test").unwrap();
        assert_eq!(compare_within_scheme(&a, &b, VersionScheme::Relaxed), Ordering::Less);
    }
}
