// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static tables of known SPDX license and exception identifiers, used to recover the canonical
//! casing of an identifier the parser accepted case-insensitively.
//!
//! This is not the full SPDX license list -- just the identifiers vcpkg's own tooling recognizes
//! plus the handful of exceptions it special-cases. Anything not in these tables still parses
//! fine; it's just reported back through [`crate::SpdxExpr::unknown_identifiers`].

pub(crate) const LICENSE_IDS: &[&str] = &[
    "0BSD",
    "Apache-2.0",
    "Artistic-2.0",
    "BSD-2-Clause",
    "BSD-3-Clause",
    "BSD-3-Clause-Clear",
    "BSL-1.0",
    "CC0-1.0",
    "EPL-2.0",
    "GPL-2.0-only",
    "GPL-2.0-or-later",
    "GPL-3.0-only",
    "GPL-3.0-or-later",
    "ISC",
    "LGPL-2.1-only",
    "LGPL-2.1-or-later",
    "LGPL-3.0-only",
    "LGPL-3.0-or-later",
    "MIT",
    "MPL-2.0",
    "NCSA",
    "OpenSSL",
    "PSF-2.0",
    "Python-2.0",
    "Unlicense",
    "WTFPL",
    "Zlib",
    "curl",
];

pub(crate) const EXCEPTION_IDS: &[&str] = &[
    "Autoconf-exception-3.0",
    "Classpath-exception-2.0",
    "Font-exception-2.0",
    "GCC-exception-3.1",
    "LLVM-exception",
];

/// Looks up `ident` case-insensitively in `table`, returning the canonically-cased entry.
pub(crate) fn canonicalize<'a>(table: &[&'a str], ident: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|known| known.eq_ignore_ascii_case(ident))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_case_insensitively() {
        assert_eq!(canonicalize(LICENSE_IDS, "mit"), Some("MIT"));
        assert_eq!(canonicalize(LICENSE_IDS, "APACHE-2.0"), Some("Apache-2.0"));
        assert_eq!(canonicalize(LICENSE_IDS, "not-a-license"), None);
    }

    #[test]
    fn exception_table_is_sorted_reasonably() {
        assert_eq!(canonicalize(EXCEPTION_IDS, "llvm-exception"), Some("LLVM-exception"));
    }
}
