//! Package version resolution.
//!
//! A [`VersionResolver`] supplies an optional version hint per package. The
//! hint is only one input: [`select_version`] combines it with the pinned
//! version, the configured default and the previously persisted version.
//!
//! - [`RemoteVersionResolver`] - hints fetched once from an HTTP endpoint
//! - [`OfflineVersionResolver`] - never has a hint
//! - [`StaticVersionResolver`] - fixed hints, handy for tests

pub mod remote;

use std::collections::HashMap;

pub use remote::{RemoteVersionResolver, VersionManifest};

/// Supplies recommended package versions.
pub trait VersionResolver {
    /// Get the recommended version for a package, if known.
    fn resolve(&self, package: &str) -> Option<String>;
}

/// Resolver used in offline mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineVersionResolver;

impl VersionResolver for OfflineVersionResolver {
    fn resolve(&self, _package: &str) -> Option<String> {
        None
    }
}

/// Resolver backed by a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticVersionResolver {
    versions: HashMap<String, String>,
}

impl StaticVersionResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a version hint.
    pub fn with(mut self, package: &str, version: &str) -> Self {
        self.versions
            .insert(package.to_string(), version.to_string());
        self
    }
}

impl VersionResolver for StaticVersionResolver {
    fn resolve(&self, package: &str) -> Option<String> {
        self.versions.get(package).cloned()
    }
}

/// Inputs to version selection for one package.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionInputs<'a> {
    /// Version pinned by config or the command line.
    pub forced: Option<&'a str>,
    /// Hint from the resolver.
    pub remote: Option<&'a str>,
    /// Version configured as the local default.
    pub default: Option<&'a str>,
    /// Version persisted by the last successful run.
    pub persisted: Option<&'a str>,
}

/// Pick the version a package runs at.
///
/// Precedence: forced, remote, default, persisted. Empty strings are skipped.
/// Returns an empty string when nothing is known.
pub fn select_version(inputs: VersionInputs<'_>) -> String {
    [inputs.forced, inputs.remote, inputs.default, inputs.persisted]
        .into_iter()
        .flatten()
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}
