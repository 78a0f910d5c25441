// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// The variable map a platform expression is evaluated against: the two CMake-derived values
/// vcpkg records for a triplet.
///
/// These mirror the triplet variables vcpkg's own `PlatformExpression` evaluator reads
/// (`VCPKG_CMAKE_SYSTEM_NAME`, `VCPKG_TARGET_ARCHITECTURE`). An empty `cmake_system_name` means
/// "desktop Windows", matching CMake's own convention of leaving `CMAKE_SYSTEM_NAME` unset there.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlatformVars {
    cmake_system_name: String,
    target_architecture: String,
}

impl PlatformVars {
    /// Creates a new variable map from the two raw CMake-style strings.
    pub fn new(cmake_system_name: impl Into<String>, target_architecture: impl Into<String>) -> Self {
        Self {
            cmake_system_name: cmake_system_name.into(),
            target_architecture: target_architecture.into(),
        }
    }

    /// The `VCPKG_CMAKE_SYSTEM_NAME` value (empty string for desktop Windows).
    pub fn cmake_system_name(&self) -> &str {
        &self.cmake_system_name
    }

    /// The `VCPKG_TARGET_ARCHITECTURE` value.
    pub fn target_architecture(&self) -> &str {
        &self.target_architecture
    }
}

/// Evaluates a single predicate identifier against a variable map, per the fixed rule table.
///
/// Returns `None` for identifiers this table does not know about; unknown identifiers are not a
/// parse error (the grammar accepts any identifier) but evaluate to `false`.
pub(crate) fn eval_predicate(name: &str, vars: &PlatformVars) -> bool {
    let system = vars.cmake_system_name.as_str();
    let arch = vars.target_architecture.as_str();
    match name {
        "windows" => matches!(system, "" | "Windows" | "WindowsStore" | "MinGW"),
        "mingw" => system == "MinGW",
        "uwp" => system == "WindowsStore",
        "linux" => system == "Linux",
        "osx" | "macos" => system == "Darwin",
        "ios" => system == "iOS",
        "tvos" => system == "tvOS",
        "visionos" => system == "visionOS",
        "watchos" => system == "watchOS",
        "android" => system == "Android",
        "freebsd" => system == "FreeBSD",
        "openbsd" => system == "OpenBSD",
        "emscripten" => system == "Emscripten",
        "wasm" => arch == "wasm32" || arch == "wasm64",
        "unix" => !matches!(system, "" | "Windows" | "WindowsStore" | "MinGW"),
        "x86" => arch == "x86",
        "x64" => arch == "x64" || arch == "amd64",
        "arm" => arch == "arm",
        "arm64" => arch == "arm64",
        "arm64ec" => arch == "arm64ec",
        "arm32" => arch == "arm",
        "s390x" => arch == "s390x",
        "ppc64le" => arch == "ppc64le",
        "mips64" => arch == "mips64",
        "riscv32" => arch == "riscv32",
        "riscv64" => arch == "riscv64",
        "loongarch32" => arch == "loongarch32",
        "loongarch64" => arch == "loongarch64",
        "native" => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_includes_empty_system_name() {
        let vars = PlatformVars::new("", "x64");
        assert!(eval_predicate("windows", &vars));
    }

    #[test]
    fn uwp_is_windows_store_only() {
        let vars = PlatformVars::new("WindowsStore", "arm64");
        assert!(eval_predicate("uwp", &vars));
        assert!(eval_predicate("windows", &vars));
        assert!(!eval_predicate("uwp", &PlatformVars::new("Windows", "x64")));
    }

    #[test]
    fn unix_excludes_mingw() {
        assert!(!eval_predicate("unix", &PlatformVars::new("MinGW", "x64")));
        assert!(eval_predicate("unix", &PlatformVars::new("Linux", "x64")));
    }

    #[test]
    fn unknown_predicate_is_false() {
        assert!(!eval_predicate("bogus", &PlatformVars::new("Linux", "x64")));
    }
}
