//! Run command implementation.
//!
//! The `asmgen run` command regenerates output when the tracked artifact or
//! a package version changed.

use crate::cli::args::RunArgs;
use crate::error::Result;
use crate::pipeline::{PipelineOrchestrator, RunOverrides, RunReport, RunState};

use super::dispatcher::{Command, CommandContext, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    context: CommandContext,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(context: CommandContext, args: RunArgs) -> Self {
        Self { context, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    fn overrides(&self) -> RunOverrides {
        RunOverrides {
            force_regeneration: self.args.force_regeneration,
            offline: self.args.offline,
            pins: self.args.pins(),
        }
    }
}

impl Command for RunCommand {
    fn execute(&self) -> Result<CommandResult> {
        let config = self.context.load_config()?;

        for name in self.args.pins().keys() {
            if config.package(name).is_none() {
                tracing::warn!("Ignoring pin for unknown package '{}'", name);
            }
        }

        let orchestrator =
            PipelineOrchestrator::from_config(&config, &self.context.project_root, &self.overrides());
        let report = orchestrator.run();
        log_summary(&report);

        if report.success() {
            Ok(CommandResult::success())
        } else {
            Ok(CommandResult::failure(report.exit_code()))
        }
    }
}

fn log_summary(report: &RunReport) {
    let elapsed = report.duration.as_secs_f64();

    match report.record.final_state() {
        RunState::UpToDate => {
            tracing::info!("Nothing to do ({:.1}s)", elapsed);
        }
        RunState::Succeeded => {
            let (moved, purged) = report
                .migration
                .as_ref()
                .map(|m| (m.moved.len(), m.purged.len()))
                .unwrap_or_default();
            tracing::info!(
                "Generated {} file(s), removed {} stale file(s) in {:.1}s",
                moved,
                purged,
                elapsed
            );
        }
        RunState::Failed(stage) => {
            tracing::error!(
                "Generation failed during {}: {}",
                stage,
                report.record.error.as_deref().unwrap_or("unknown error")
            );
        }
        other => tracing::debug!("Run ended in {:?}", other),
    }
}
