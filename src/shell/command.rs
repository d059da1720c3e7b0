//! Shell command execution for package tools.

use crate::error::{AsmgenError, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: BTreeMap<String, String>,

    /// Capture stdout and stderr instead of inheriting them.
    pub capture: bool,
}

/// Execute a command through the platform shell.
///
/// A command that runs but exits non-zero is `Ok` with `success == false`;
/// `Err` means the shell itself could not be spawned.
pub fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();

    let (shell, flag) = shell();
    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(command);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    if options.capture {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }
    cmd.stdin(Stdio::null());

    tracing::debug!("Running: {}", command);
    let output = cmd.output().map_err(|e| {
        tracing::debug!("Failed to spawn shell for '{}': {}", command, e);
        AsmgenError::CommandFailed {
            command: command.to_string(),
            code: None,
        }
    })?;

    Ok(CommandResult {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        duration: start.elapsed(),
        success: output.status.success(),
    })
}

/// Execute a command and turn a non-zero exit into an error.
pub fn execute_checked(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    let result = execute(command, options)?;

    if result.success {
        Ok(result)
    } else {
        for line in result.stderr.lines() {
            tracing::warn!("  {}", line);
        }
        Err(AsmgenError::CommandFailed {
            command: command.to_string(),
            code: result.exit_code,
        })
    }
}

fn shell() -> (String, &'static str) {
    if cfg!(target_os = "windows") {
        (
            std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string()),
            "/C",
        )
    } else {
        ("/bin/sh".to_string(), "-c")
    }
}
