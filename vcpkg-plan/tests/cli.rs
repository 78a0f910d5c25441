// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use vcpkg_plan::{Args, Command, FormatArgs, PlanArgs, UnsupportedMode};

fn write_port(dir: &std::path::Path, name: &str, body: &str) {
    let port_dir = dir.join(name);
    std::fs::create_dir_all(&port_dir).unwrap();
    std::fs::write(port_dir.join("vcpkg.json"), body).unwrap();
}

#[test]
fn plan_installs_a_simple_overlay_port() {
    let dir = tempfile::tempdir().unwrap();
    write_port(
        dir.path(),
        "zlib",
        r#"{"name": "zlib", "version": "1.2.13"}"#,
    );

    let args = Args {
        command: Command::Plan(PlanArgs {
            config: None,
            manifest: None,
            ports_dir: Some(dir.path().to_path_buf()),
            status_db: None,
            triplet: "x64-linux".to_string(),
            host_triplet: None,
            unsupported: UnsupportedMode::Warn,
            specs: vec!["zlib".to_string()],
        }),
    };
    args.exec().unwrap();
}

#[test]
fn plan_resolves_a_dependency_chain() {
    let dir = tempfile::tempdir().unwrap();
    write_port(
        dir.path(),
        "zlib",
        r#"{"name": "zlib", "version": "1.2.13", "dependencies": ["vcpkg-cmake"]}"#,
    );
    write_port(
        dir.path(),
        "vcpkg-cmake",
        r#"{"name": "vcpkg-cmake", "version": "2023-05-04"}"#,
    );

    let args = Args {
        command: Command::Plan(PlanArgs {
            config: None,
            manifest: None,
            ports_dir: Some(dir.path().to_path_buf()),
            status_db: None,
            triplet: "x64-linux".to_string(),
            host_triplet: None,
            unsupported: UnsupportedMode::Warn,
            specs: vec!["zlib".to_string()],
        }),
    };
    args.exec().unwrap();
}

#[test]
fn plan_rejects_an_empty_request() {
    let args = Args {
        command: Command::Plan(PlanArgs {
            config: None,
            manifest: None,
            ports_dir: None,
            status_db: None,
            triplet: "x64-linux".to_string(),
            host_triplet: None,
            unsupported: UnsupportedMode::Warn,
            specs: vec![],
        }),
    };
    assert!(args.exec().is_err());
}

#[test]
fn format_prints_a_canonical_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("vcpkg.json");
    std::fs::write(
        &manifest,
        r#"{"version": "1.2.13", "name": "zlib", "description": "a compression library"}"#,
    )
    .unwrap();

    let args = Args {
        command: Command::Format(FormatArgs {
            manifest,
            project: false,
        }),
    };
    args.exec().unwrap();
}
