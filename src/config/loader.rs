//! Configuration file discovery and loading.

use crate::config::schema::AsmgenConfig;
use crate::config::validator::validate;
use crate::error::{AsmgenError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-project directory holding config and state.
pub const CONFIG_DIR: &str = ".asmgen";

/// Default config path for a project root: `.asmgen/config.yml`
pub fn default_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR).join("config.yml")
}

/// Find the project root by walking up from `start`.
///
/// The first directory containing `.asmgen/` wins.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_DIR).is_dir() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load a single config file and parse it.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
pub fn load_config_file(path: &Path) -> Result<AsmgenConfig> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AsmgenError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            AsmgenError::Io(e)
        }
    })?;

    parse_config(&content, path)
}

/// Parse YAML content into an [`AsmgenConfig`].
///
/// `source_path` is only used for error reporting.
pub fn parse_config(content: &str, source_path: &Path) -> Result<AsmgenConfig> {
    serde_yaml::from_str(content).map_err(|e| AsmgenError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load and validate the config for a project.
///
/// Uses `explicit` when given, otherwise `.asmgen/config.yml` under the root.
pub fn load_config(project_root: &Path, explicit: Option<&Path>) -> Result<AsmgenConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_config_path(project_root));

    tracing::debug!("Loading config from {}", path.display());
    let config = load_config_file(&path)?;
    validate(&config)?;

    Ok(config)
}
