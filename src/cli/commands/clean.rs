//! Clean command implementation.
//!
//! The `asmgen clean` command deletes the files asmgen placed in the output
//! directory and forgets the input hash so the next run regenerates.

use std::fs;

use crate::cli::args::CleanArgs;
use crate::error::Result;
use crate::pipeline::OutputMigrator;
use crate::state::StateStore;

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The clean command implementation.
pub struct CleanCommand {
    context: CommandContext,
    args: CleanArgs,
}

impl CleanCommand {
    /// Create a new clean command.
    pub fn new(context: CommandContext, args: CleanArgs) -> Self {
        Self { context, args }
    }
}

impl Command for CleanCommand {
    fn execute(&self) -> Result<CommandResult> {
        let config = self.context.load_config()?;
        let paths = config.resolve_paths(&self.context.project_root);
        let mut state = StateStore::load_or_fresh(&paths.state_file);

        let purged = OutputMigrator::new(&paths.output_dir, &paths.state_file)
            .purge_all(&mut state)?;

        if self.args.packages {
            if paths.work_dir.exists() {
                tracing::info!("Removing {}", paths.work_dir.display());
                fs::remove_dir_all(&paths.work_dir)?;
            }
            state.package_versions.clear();
        } else {
            for spec in &config.packages {
                let output = paths.work_dir.join(&spec.name).join(&spec.output);
                if output.exists() {
                    fs::remove_dir_all(&output)?;
                }
            }
        }

        state.reset_generation();
        state.save(&paths.state_file)?;

        tracing::info!("Removed {} generated file(s)", purged.len());
        Ok(CommandResult::success())
    }
}
