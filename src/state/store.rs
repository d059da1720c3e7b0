//! Persistent state storage.
//!
//! The state file records what the last successful generation looked like:
//! the hash of the tracked artifact, the version each package was run at,
//! and the manifest of files placed in the stable output directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{AsmgenError, Result};

/// Persisted state carried between pipeline runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateStore {
    /// Schema version for migration.
    pub version: u32,

    /// Hash of the tracked artifact at the last successful generation.
    #[serde(default)]
    pub input_hash: Option<String>,

    /// Version each package was last saved at.
    #[serde(default)]
    pub package_versions: BTreeMap<String, String>,

    /// Files this tool placed in the stable output directory.
    #[serde(default)]
    pub stale_files: Vec<String>,

    /// When the last successful generation finished.
    #[serde(default)]
    pub last_success: Option<DateTime<Utc>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    /// Current schema version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Create an empty state.
    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            input_hash: None,
            package_versions: BTreeMap::new(),
            stale_files: Vec::new(),
            last_success: None,
        }
    }

    /// Load state from disk.
    ///
    /// A missing file yields empty state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        serde_yaml::from_str(&content).map_err(|e| AsmgenError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Load state, starting over from empty state if the file is unreadable.
    ///
    /// Empty state has no input hash, so the next run always regenerates.
    pub fn load_or_fresh(path: &Path) -> Self {
        match Self::load(path) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Discarding unreadable state file: {}", e);
                Self::new()
            }
        }
    }

    /// Save state to disk using atomic write.
    ///
    /// Writes to a sibling temp file and renames it over the target so a
    /// crash mid-write never leaves a truncated state file behind.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let content =
            serde_yaml::to_string(self).map_err(|e| AsmgenError::ConfigValidationError {
                message: format!("Failed to serialize state: {}", e),
            })?;

        let temp_path = path.with_extension("yml.tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Get the persisted hash, treating an empty string as absent.
    pub fn input_hash(&self) -> Option<&str> {
        self.input_hash.as_deref().filter(|h| !h.is_empty())
    }

    /// Get the version a package was last saved at.
    pub fn package_version(&self, package: &str) -> Option<&str> {
        self.package_versions
            .get(package)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Get the exact saved version string, empty strings included.
    pub fn saved_version(&self, package: &str) -> Option<&str> {
        self.package_versions.get(package).map(String::as_str)
    }

    /// Record the version a package ran at.
    pub fn set_package_version(&mut self, package: &str, version: &str) {
        self.package_versions
            .insert(package.to_string(), version.to_string());
    }

    /// Commit the hash of a successful generation.
    pub fn commit_success(&mut self, input_hash: &str) {
        self.input_hash = Some(input_hash.to_string());
        self.last_success = Some(Utc::now());
    }

    /// Forget the hash and manifest so the next run regenerates from scratch.
    pub fn reset_generation(&mut self) {
        self.input_hash = None;
        self.stale_files.clear();
    }
}
