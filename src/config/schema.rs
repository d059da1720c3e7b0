//! Configuration schema definitions for asmgen.
//!
//! This module contains the struct definitions that map to
//! the `.asmgen/config.yml` file format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Root configuration structure for config.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AsmgenConfig {
    /// Native binary whose content hash gates regeneration.
    pub tracked_artifact: PathBuf,

    /// Stable directory that receives generated files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Base directory for package installs and transient output.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Persisted state file.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Regenerate even if the artifact is unchanged.
    #[serde(default, skip_serializing_if = "is_false")]
    pub force_regeneration: bool,

    /// Skip the remote version lookup.
    #[serde(default, skip_serializing_if = "is_false")]
    pub offline: bool,

    /// Remote endpoint recommending package versions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_source: Option<VersionSourceConfig>,

    /// Packages in setup order.
    #[serde(default)]
    pub packages: Vec<PackageSpec>,
}

impl Default for AsmgenConfig {
    fn default() -> Self {
        Self {
            tracked_artifact: PathBuf::new(),
            output_dir: default_output_dir(),
            work_dir: default_work_dir(),
            state_file: default_state_file(),
            force_regeneration: false,
            offline: false,
            version_source: None,
            packages: Vec::new(),
        }
    }
}

impl AsmgenConfig {
    /// Resolve relative paths against the project root.
    pub fn resolve_paths(&self, project_root: &Path) -> ResolvedPaths {
        let abs = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                project_root.join(p)
            }
        };

        ResolvedPaths {
            project_root: project_root.to_path_buf(),
            tracked_artifact: abs(&self.tracked_artifact),
            output_dir: abs(&self.output_dir),
            work_dir: abs(&self.work_dir),
            state_file: abs(&self.state_file),
        }
    }

    /// Find a package by name.
    pub fn package(&self, name: &str) -> Option<&PackageSpec> {
        self.packages.iter().find(|p| p.name == name)
    }
}

/// Config paths made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub project_root: PathBuf,
    pub tracked_artifact: PathBuf,
    pub output_dir: PathBuf,
    pub work_dir: PathBuf,
    pub state_file: PathBuf,
}

/// Remote version endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSourceConfig {
    /// URL returning the version manifest.
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Part a package plays in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageRole {
    /// Produces the dump the shim generator consumes.
    Dumper,
    /// Produces the files migrated into the stable directory.
    ShimGenerator,
    /// Only set up and versioned; never executed.
    Support,
}

impl std::fmt::Display for PackageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PackageRole::Dumper => "dumper",
            PackageRole::ShimGenerator => "shim_generator",
            PackageRole::Support => "support",
        };
        write!(f, "{}", s)
    }
}

/// One external tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageSpec {
    /// Unique package name; also the key in persisted state.
    pub name: String,

    /// Role in the pipeline.
    pub role: PackageRole,

    /// Version used when nothing better is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_version: Option<String>,

    /// Version pin that beats every other source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forced_version: Option<String>,

    /// Setup failure is logged instead of failing the run (support packages only).
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,

    /// Download performed during setup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch: Option<FetchSpec>,

    /// Command run in the destination after fetching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_command: Option<String>,

    /// Command performing the package's transformation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Output subdirectory under the destination.
    #[serde(default = "default_package_output")]
    pub output: PathBuf,

    /// Extra environment for setup and execute commands.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl PackageSpec {
    /// Create a package spec with defaults.
    pub fn new(name: &str, role: PackageRole) -> Self {
        Self {
            name: name.to_string(),
            role,
            default_version: None,
            forced_version: None,
            optional: false,
            fetch: None,
            setup_command: None,
            command: None,
            output: default_package_output(),
            env: BTreeMap::new(),
        }
    }
}

/// Download fetched during package setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSpec {
    /// Source URL; `${version}` is interpolated.
    pub url: String,

    /// File name inside the destination directory.
    pub file: String,

    /// Expected sha256 of the download, hex encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    /// Mark the file executable after download (unix only).
    #[serde(default, skip_serializing_if = "is_false")]
    pub executable: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("generated")
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".asmgen").join("packages")
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".asmgen").join("state.yml")
}

fn default_package_output() -> PathBuf {
    PathBuf::from("out")
}

fn default_timeout_secs() -> u64 {
    10
}

fn is_false(b: &bool) -> bool {
    !*b
}
