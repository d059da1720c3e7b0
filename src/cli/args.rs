//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// asmgen - regenerate managed assemblies when a native binary changes.
#[derive(Debug, Parser)]
#[command(name = "asmgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default .asmgen/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides discovery from the current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Run flags accepted without the `run` subcommand
    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Regenerate output if needed (default if no command specified)
    Run(RunArgs),

    /// Show persisted state and whether the artifact changed
    Status(StatusArgs),

    /// Delete generated output so the next run starts over
    Clean(CleanArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Regenerate even if the tracked artifact is unchanged
    #[arg(long, env = "ASMGEN_FORCE_REGENERATION")]
    pub force_regeneration: bool,

    /// Skip the remote version lookup
    #[arg(long, env = "ASMGEN_OFFLINE")]
    pub offline: bool,

    /// Pin a package version (repeatable), e.g. --pin cpp2il=2022.1.0
    #[arg(long, value_name = "NAME=VERSION", value_parser = parse_pin)]
    pub pin: Vec<(String, String)>,
}

impl RunArgs {
    /// Pins keyed by package name; later pins win.
    pub fn pins(&self) -> BTreeMap<String, String> {
        self.pin.iter().cloned().collect()
    }

    /// Combine top-level flags with those given after `run`.
    ///
    /// Either side can enable a flag; pins from `other` come last and win.
    pub fn merged(&self, other: &RunArgs) -> RunArgs {
        RunArgs {
            force_regeneration: self.force_regeneration || other.force_regeneration,
            offline: self.offline || other.offline,
            pin: self.pin.iter().chain(&other.pin).cloned().collect(),
        }
    }
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `clean` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CleanArgs {
    /// Also remove installed packages
    #[arg(long)]
    pub packages: bool,
}

fn parse_pin(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, version)) if !name.trim().is_empty() && !version.trim().is_empty() => {
            Ok((name.trim().to_string(), version.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VERSION, got '{}'", value)),
    }
}
