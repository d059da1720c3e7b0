//! Status command implementation.
//!
//! The `asmgen status` command shows the persisted state and whether a run
//! would regenerate. Versions are compared against the local configuration
//! only; the remote version source is not contacted.

use std::collections::BTreeMap;

use console::style;
use serde::Serialize;

use crate::cli::args::StatusArgs;
use crate::config::AsmgenConfig;
use crate::error::{AsmgenError, Result};
use crate::state::{ContentHashGate, StateStore};
use crate::versions::{select_version, VersionInputs};

use super::dispatcher::{Command, CommandContext, CommandResult};

/// Snapshot shown by `asmgen status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub tracked_artifact: String,
    pub output_dir: String,
    pub input_hash: Option<String>,
    pub current_hash: Option<String>,
    pub hash_matches: bool,
    pub force_regeneration: bool,
    pub changed_packages: Vec<String>,
    pub up_to_date: bool,
    pub package_versions: BTreeMap<String, String>,
    pub stale_files: Vec<String>,
    pub last_success: Option<String>,
}

impl StatusReport {
    /// Gather the status of a project without changing anything.
    pub fn gather(config: &AsmgenConfig, context: &CommandContext) -> Result<Self> {
        let paths = config.resolve_paths(&context.project_root);
        let state = StateStore::load(&paths.state_file)?;

        let current_hash = match ContentHashGate::new(&paths.tracked_artifact).compute_hash() {
            Ok(hash) => Some(hash),
            Err(e @ AsmgenError::ArtifactUnreadable { .. }) => {
                tracing::warn!("{}", e);
                None
            }
            Err(e) => return Err(e),
        };

        let hash_matches = match (state.input_hash(), current_hash.as_deref()) {
            (Some(saved), Some(current)) => saved == current,
            _ => false,
        };
        let changed_packages = changed_packages(config, &state);
        let up_to_date =
            hash_matches && !config.force_regeneration && changed_packages.is_empty();

        Ok(Self {
            tracked_artifact: paths.tracked_artifact.display().to_string(),
            output_dir: paths.output_dir.display().to_string(),
            input_hash: state.input_hash().map(str::to_string),
            current_hash,
            hash_matches,
            force_regeneration: config.force_regeneration,
            changed_packages,
            up_to_date,
            package_versions: state.package_versions.clone(),
            stale_files: state.stale_files.clone(),
            last_success: state.last_success.map(|t| t.to_rfc3339()),
        })
    }

    fn print(&self) {
        println!("{}", style("asmgen status").bold());
        println!("  Artifact:  {}", self.tracked_artifact);
        println!("  Output:    {}", self.output_dir);
        println!(
            "  Hash:      {}",
            self.input_hash.as_deref().map(short_hash).unwrap_or("null")
        );

        let verdict = if self.up_to_date {
            style("up to date").green()
        } else if self.current_hash.is_none() {
            style("artifact unreadable").red()
        } else {
            style("regeneration needed").yellow()
        };
        println!("  State:     {}", verdict);
        if self.force_regeneration {
            println!("  Forced:    force_regeneration is set");
        }
        if !self.changed_packages.is_empty() {
            println!("  Changed:   {}", self.changed_packages.join(", "));
        }

        if let Some(when) = &self.last_success {
            println!("  Last run:  {}", when);
        }

        if !self.package_versions.is_empty() {
            println!();
            println!("{}", style("Packages").bold());
            for (name, version) in &self.package_versions {
                let version = if version.is_empty() { "null" } else { version.as_str() };
                println!("  {} {}", name, style(version).dim());
            }
        }

        if !self.stale_files.is_empty() {
            println!();
            println!("{}", style("Generated files").bold());
            for file in &self.stale_files {
                println!("  {}", file);
            }
        }
    }
}

/// Packages whose configured version differs from the one last saved.
fn changed_packages(config: &AsmgenConfig, state: &StateStore) -> Vec<String> {
    config
        .packages
        .iter()
        .filter(|spec| {
            let version = select_version(VersionInputs {
                forced: spec.forced_version.as_deref(),
                remote: None,
                default: spec.default_version.as_deref(),
                persisted: state.package_version(&spec.name),
            });
            state.saved_version(&spec.name) != Some(version.as_str())
        })
        .map(|spec| spec.name.clone())
        .collect()
}

fn short_hash(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}

/// The status command implementation.
pub struct StatusCommand {
    context: CommandContext,
    args: StatusArgs,
}

impl StatusCommand {
    /// Create a new status command.
    pub fn new(context: CommandContext, args: StatusArgs) -> Self {
        Self { context, args }
    }
}

impl Command for StatusCommand {
    fn execute(&self) -> Result<CommandResult> {
        let config = self.context.load_config()?;
        let report = StatusReport::gather(&config, &self.context)?;

        if self.args.json {
            let json =
                serde_json::to_string_pretty(&report).map_err(|e| AsmgenError::Other(e.into()))?;
            println!("{}", json);
        } else {
            report.print();
        }

        Ok(CommandResult::success())
    }
}
