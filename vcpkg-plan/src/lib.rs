// Copyright (c) The cargo-guppy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A command-line demonstration harness for `vcpkg-model` and `vcpkg-planner`.
//!
//! `vcpkg-plan` is explicitly not the CLI described in `spec.md` §6 (that CLI's argument parser,
//! help text, and metrics collection are out of scope for the core); it's a thin wrapper that
//! exercises every module of the core end to end:
//!
//! * `plan` builds a classic (unversioned) feature install plan from a directory of port
//!   manifests and an optional installed-prefix status snapshot, and prints it the way a console
//!   report would.
//! * `format` parses a port or project manifest and prints its canonical JSON form, exercising
//!   the manifest parser's canonicalization and round-trip guarantees directly.
//!
//! # Configuration
//!
//! `plan` accepts a small TOML run-configuration via `--config` (see [`run_config::RunConfig`])
//! supplying defaults for flags left unset on the command line.

pub mod request;
pub mod run_config;
pub mod spec_arg;
pub mod status_file;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Context, Result};

use vcpkg_model::identifiers::Triplet;
use vcpkg_model::manifest::{parse_port_manifest, parse_project_manifest};
use vcpkg_model::port_provider::PortFileProvider;
use vcpkg_model::registry::RegistrySet;
use vcpkg_model::status_db::MemoryStatusDb;
use vcpkg_planner::action::{ActionPlan, UnsupportedPortAction};
use vcpkg_planner::format::format_plan;
use vcpkg_planner::var_provider::StaticVarProvider;

/// Build and print vcpkg-style install plans.
#[derive(Debug, Parser)]
#[clap(name = "vcpkg-plan", about = "Build and print vcpkg-style install plans")]
pub struct Args {
    /// The subcommand to run.
    #[clap(subcommand)]
    pub command: Command,
}

impl Args {
    /// Dispatches to the selected subcommand.
    pub fn exec(self) -> Result<()> {
        match self.command {
            Command::Plan(args) => run_plan(args),
            Command::Format(args) => run_format(args),
        }
    }
}

/// The `plan` and `format` subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a classic (unversioned) feature install plan and print it.
    Plan(PlanArgs),
    /// Parse a manifest and print its canonical JSON form.
    Format(FormatArgs),
}

/// Whether an unsupported `supports` expression aborts planning or is merely recorded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnsupportedMode {
    /// Record the port as excluded and continue (the default).
    Warn,
    /// Fail the planning invocation.
    Error,
}

impl FromStr for UnsupportedMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "warn" => Ok(UnsupportedMode::Warn),
            "error" => Ok(UnsupportedMode::Error),
            other => Err(format!("invalid value '{}': expected 'warn' or 'error'", other)),
        }
    }
}

impl From<UnsupportedMode> for UnsupportedPortAction {
    fn from(mode: UnsupportedMode) -> Self {
        match mode {
            UnsupportedMode::Warn => UnsupportedPortAction::Warn,
            UnsupportedMode::Error => UnsupportedPortAction::Error,
        }
    }
}

/// Arguments for `plan`.
#[derive(Debug, clap::Args)]
pub struct PlanArgs {
    /// A TOML run-configuration supplying defaults for the flags below.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// The project manifest (`vcpkg.json`) whose `dependencies` seed the request, in addition to
    /// any SPECS given directly.
    #[clap(long)]
    pub manifest: Option<PathBuf>,

    /// A directory of port subdirectories (each holding a `vcpkg.json`), searched as an overlay
    /// port path ahead of any registry.
    #[clap(long)]
    pub ports_dir: Option<PathBuf>,

    /// A JSON snapshot of the installed-prefix status database.
    #[clap(long)]
    pub status_db: Option<PathBuf>,

    /// The target triplet.
    #[clap(long, default_value = "x64-linux")]
    pub triplet: String,

    /// The host triplet (defaults to `--triplet`).
    #[clap(long)]
    pub host_triplet: Option<String>,

    /// Whether a `supports` expression evaluating false is a warning or a fatal error.
    #[clap(long, default_value = "warn")]
    pub unsupported: UnsupportedMode,

    /// Additional top-level requests, as `name` or `name[feature,feature]`.
    pub specs: Vec<String>,
}

/// Arguments for `format`.
#[derive(Debug, clap::Args)]
pub struct FormatArgs {
    /// The manifest file to parse.
    pub manifest: PathBuf,

    /// Parse `manifest` as a project manifest (name optional, `Missing` version scheme allowed)
    /// instead of a port manifest.
    #[clap(long)]
    pub project: bool,
}

fn run_plan(mut args: PlanArgs) -> Result<()> {
    if let Some(config_path) = args.config.take() {
        let config = run_config::RunConfig::load(&config_path)?;
        args.manifest = args.manifest.or(config.manifest);
        args.ports_dir = args.ports_dir.or(config.ports_dir);
        args.status_db = args.status_db.or(config.status_db);
        if let Some(triplet) = config.triplet {
            if args.triplet == "x64-linux" {
                args.triplet = triplet;
            }
        }
        args.host_triplet = args.host_triplet.or(config.host_triplet);
    }

    let target_triplet = Triplet::new(&args.triplet)?;
    let host_triplet = match &args.host_triplet {
        Some(triplet) => Triplet::new(triplet)?,
        None => target_triplet.clone(),
    };

    let overlay_ports = args.ports_dir.into_iter().collect::<Vec<_>>();
    let provider = PortFileProvider::new(overlay_ports, RegistrySet { default: None, extra: vec![] });

    let status_db = match &args.status_db {
        Some(path) => status_file::load_status_db(path)?,
        None => MemoryStatusDb::new(),
    };

    let mut request = Vec::new();
    if let Some(manifest_path) = &args.manifest {
        let text = std::fs::read_to_string(manifest_path)
            .with_context(|| format!("reading manifest '{}'", manifest_path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing manifest '{}' as JSON", manifest_path.display()))?;
        let scf = parse_project_manifest(&value, &manifest_path.display().to_string())?;
        request.extend(request::request_from_dependencies(
            &scf.core.dependencies,
            &target_triplet,
            &host_triplet,
        )?);
    }
    for raw in &args.specs {
        request.push(spec_arg::parse_spec_arg(raw, &target_triplet)?);
    }

    if request.is_empty() {
        bail!("nothing requested: pass --manifest and/or at least one SPEC argument");
    }

    let mut vars = StaticVarProvider::new();
    let plan = vcpkg_planner::classic::create_feature_install_plan(
        &provider,
        &mut vars,
        &request,
        &status_db,
        &host_triplet,
        args.unsupported.into(),
    )?;

    print_plan(&plan);
    Ok(())
}

fn print_plan(plan: &ActionPlan) {
    let formatted = format_plan(plan);

    if !formatted.excluded.is_empty() {
        println!("The following packages are not supported on this triplet and will be excluded:");
        for line in &formatted.excluded {
            println!("    {}", line);
        }
    }

    let merged = formatted.merged();
    if merged.is_empty() {
        println!("No changes. All requested packages are already installed.");
        return;
    }
    println!("The following packages will be built and installed:");
    for line in &merged {
        println!("    {}", line);
    }
}

fn run_format(args: FormatArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.manifest)
        .with_context(|| format!("reading manifest '{}'", args.manifest.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing manifest '{}' as JSON", args.manifest.display()))?;

    let origin = args.manifest.display().to_string();
    let mut scf = if args.project {
        parse_project_manifest(&value, &origin)?
    } else {
        parse_port_manifest(&value, &origin)?
    };
    scf.canonicalize();

    let canonical = serde_json::to_string_pretty(&scf.to_json())?;
    println!("{}", canonical);
    Ok(())
}
