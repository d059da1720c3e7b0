//! asmgen CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use asmgen::cli::{Cli, CommandDispatcher};
use asmgen::config::find_project_root;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("asmgen=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("asmgen=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn project_root(cli: &Cli) -> PathBuf {
    if let Some(project) = &cli.project {
        return project.clone();
    }

    let cwd = std::env::current_dir().unwrap_or_default();
    find_project_root(&cwd).unwrap_or(cwd)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("asmgen starting with args: {:?}", cli);

    let dispatcher = CommandDispatcher::new(project_root(&cli), cli.config.clone());

    match dispatcher.dispatch(&cli) {
        Ok(result) => ExitCode::from(result.exit_code as u8),
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(1)
        }
    }
}
