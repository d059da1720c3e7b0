//! Moving generated files into the stable output directory.
//!
//! The manifest in [`StateStore::stale_files`] lists every file this tool
//! placed in the target directory. It is the only thing consulted before
//! deleting from the target, so files written there by anyone else survive.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::{AsmgenError, Result};
use crate::state::StateStore;

/// What a migration did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Files moved into the target, in order.
    pub moved: Vec<String>,
    /// Previously placed files deleted because they were not produced again.
    pub purged: Vec<String>,
    /// Moved files that overwrote a same-named file.
    pub replaced: Vec<String>,
}

/// Moves a package's output into the stable directory and keeps the manifest.
#[derive(Debug, Clone)]
pub struct OutputMigrator {
    target_dir: PathBuf,
    state_file: PathBuf,
}

impl OutputMigrator {
    /// Create a migrator writing into `target_dir`.
    ///
    /// `state_file` receives manifest checkpoints during the migration.
    pub fn new(target_dir: impl Into<PathBuf>, state_file: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            state_file: state_file.into(),
        }
    }

    /// The stable output directory.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Migrate every top-level file in `source` into the target directory.
    ///
    /// Stale files from the previous manifest that are not produced again are
    /// deleted first and the reduced manifest is checkpointed. On success
    /// `state.stale_files` is exactly the produced names; the caller persists
    /// it. On failure the checkpointed manifest holds the remaining stale
    /// files plus everything moved so far.
    pub fn migrate(&self, source: &Path, state: &mut StateStore) -> Result<MigrationSummary> {
        let produced = list_files(source)?;
        let produced_set: BTreeSet<&str> = produced.iter().map(String::as_str).collect();
        let mut summary = MigrationSummary::default();

        fs::create_dir_all(&self.target_dir).map_err(|e| AsmgenError::MigrationFailure {
            file: self.target_dir.display().to_string(),
            message: e.to_string(),
        })?;

        let previous = std::mem::take(&mut state.stale_files);
        let mut manifest = Vec::new();
        for (i, name) in previous.iter().enumerate() {
            if !is_plain_file_name(name) {
                tracing::warn!("Ignoring manifest entry '{}': not a plain file name", name);
                continue;
            }
            if produced_set.contains(name.as_str()) {
                manifest.push(name.clone());
                continue;
            }

            let path = self.target_dir.join(name);
            if path.is_file() {
                tracing::info!("Deleting {}", name);
                if let Err(e) = fs::remove_file(&path) {
                    manifest.extend(
                        previous[i..]
                            .iter()
                            .filter(|n| is_plain_file_name(n))
                            .cloned(),
                    );
                    state.stale_files = manifest;
                    return Err(self.fail(state, name, e.to_string()));
                }
            }
            summary.purged.push(name.clone());
        }

        state.stale_files = manifest.clone();
        state
            .save(&self.state_file)
            .map_err(|e| AsmgenError::MigrationFailure {
                file: self.state_file.display().to_string(),
                message: e.to_string(),
            })?;

        for name in &produced {
            if !manifest.contains(name) {
                manifest.push(name.clone());
            }

            let target = self.target_dir.join(name);
            let existed = target.exists();
            if existed {
                if let Err(e) = fs::remove_file(&target) {
                    state.stale_files = manifest;
                    return Err(self.fail(state, name, e.to_string()));
                }
            }

            tracing::info!("Moving {}", name);
            if let Err(e) = move_file(&source.join(name), &target) {
                state.stale_files = manifest;
                return Err(self.fail(state, name, e.to_string()));
            }

            summary.moved.push(name.clone());
            if existed {
                summary.replaced.push(name.clone());
            }
        }

        state.stale_files = produced;
        Ok(summary)
    }

    /// Delete every manifest-listed file from the target and clear the manifest.
    pub fn purge_all(&self, state: &mut StateStore) -> Result<Vec<String>> {
        let mut purged = Vec::new();

        for name in std::mem::take(&mut state.stale_files) {
            if !is_plain_file_name(&name) {
                tracing::warn!("Ignoring manifest entry '{}': not a plain file name", name);
                continue;
            }

            let path = self.target_dir.join(&name);
            if path.is_file() {
                tracing::info!("Deleting {}", name);
                fs::remove_file(&path).map_err(|e| AsmgenError::MigrationFailure {
                    file: name.clone(),
                    message: e.to_string(),
                })?;
                purged.push(name);
            }
        }

        Ok(purged)
    }

    /// Checkpoint the partial manifest and build the error for `file`.
    fn fail(&self, state: &StateStore, file: &str, message: String) -> AsmgenError {
        if let Err(e) = state.save(&self.state_file) {
            tracing::error!("Failed to record partial manifest: {}", e);
        }
        AsmgenError::MigrationFailure {
            file: file.to_string(),
            message,
        }
    }
}

/// Sorted names of the regular files directly inside `dir`.
fn list_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => tracing::warn!("Skipping non UTF-8 output file {:?}", name),
        }
    }

    names.sort();
    Ok(names)
}

/// True when `name` is a single normal path component, such as `Game.dll`.
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(c)), None) => c.to_str() == Some(name),
        _ => false,
    }
}

/// Rename, falling back to copy and delete across filesystems.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}
