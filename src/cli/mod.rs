//! Command-line interface for asmgen.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations

pub mod args;
pub mod commands;

pub use args::{CleanArgs, Cli, Commands, RunArgs, StatusArgs};
pub use commands::{Command, CommandContext, CommandDispatcher, CommandResult};
