//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed by
//! [`CommandDispatcher`]; `asmgen` with no subcommand behaves like
//! `asmgen run`.

pub mod clean;
pub mod dispatcher;
pub mod run;
pub mod status;

pub use dispatcher::{Command, CommandContext, CommandDispatcher, CommandResult};
