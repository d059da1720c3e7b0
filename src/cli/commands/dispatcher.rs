//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use std::path::{Path, PathBuf};

use crate::cli::args::{Cli, Commands};
use crate::config::{load_config, AsmgenConfig};
use crate::error::Result;

/// Trait for command implementations.
pub trait Command {
    /// Execute the command.
    fn execute(&self) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Where a command finds its project and config.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Project root; relative config paths resolve against it.
    pub project_root: PathBuf,
    /// Explicit config file, overriding `.asmgen/config.yml`.
    pub config_path: Option<PathBuf>,
}

impl CommandContext {
    /// Load and validate the project's config.
    pub fn load_config(&self) -> Result<AsmgenConfig> {
        load_config(&self.project_root, self.config_path.as_deref())
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    context: CommandContext,
}

impl CommandDispatcher {
    /// Create a new dispatcher for the given project root.
    pub fn new(project_root: PathBuf, config_path: Option<PathBuf>) -> Self {
        Self {
            context: CommandContext {
                project_root,
                config_path,
            },
        }
    }

    /// Get the project root path.
    pub fn project_root(&self) -> &Path {
        &self.context.project_root
    }

    /// Dispatch and execute a command.
    pub fn dispatch(&self, cli: &Cli) -> Result<CommandResult> {
        match &cli.command {
            Some(Commands::Run(args)) => {
                super::run::RunCommand::new(self.context.clone(), cli.run.merged(args)).execute()
            }
            Some(Commands::Status(args)) => {
                super::status::StatusCommand::new(self.context.clone(), args.clone()).execute()
            }
            Some(Commands::Clean(args)) => {
                super::clean::CleanCommand::new(self.context.clone(), args.clone()).execute()
            }
            None => super::run::RunCommand::new(self.context.clone(), cli.run.clone()).execute(),
        }
    }
}
