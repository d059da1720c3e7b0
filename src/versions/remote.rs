//! Remote version lookup.
//!
//! The remote endpoint returns a JSON document listing the recommended
//! version of each package:
//!
//! ```json
//! { "packages": { "cpp2il": "2022.1.0-pre-release.19", "il2cppinterop": "1.4.5" } }
//! ```
//!
//! The document is fetched once per run. Any failure is logged and the
//! resolver degrades to having no hints, so a fully offline machine still runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::VersionResolver;
use crate::error::{AsmgenError, Result};

/// Default timeout for the version lookup.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Document served by the version endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VersionManifest {
    /// Recommended version per package name.
    #[serde(default)]
    pub packages: HashMap<String, String>,
}

/// Resolver holding hints fetched from a remote endpoint.
#[derive(Debug, Clone, Default)]
pub struct RemoteVersionResolver {
    manifest: VersionManifest,
}

impl RemoteVersionResolver {
    /// Contact the endpoint, falling back to no hints on failure.
    pub fn contact(url: &str, timeout: Duration) -> Self {
        match fetch_manifest(url, timeout) {
            Ok(manifest) => {
                tracing::debug!(
                    "Fetched {} version hints from {}",
                    manifest.packages.len(),
                    url
                );
                Self { manifest }
            }
            Err(e) => {
                tracing::warn!("{}; using local default versions", e);
                Self::default()
            }
        }
    }

    /// Build a resolver from an already fetched manifest.
    pub fn from_manifest(manifest: VersionManifest) -> Self {
        Self { manifest }
    }

    /// Get the fetched manifest.
    pub fn manifest(&self) -> &VersionManifest {
        &self.manifest
    }
}

impl VersionResolver for RemoteVersionResolver {
    fn resolve(&self, package: &str) -> Option<String> {
        self.manifest
            .packages
            .get(package)
            .filter(|v| !v.is_empty())
            .cloned()
    }
}

/// Fetch and parse the version manifest.
pub fn fetch_manifest(url: &str, timeout: Duration) -> Result<VersionManifest> {
    let network = |message: String| AsmgenError::TransientNetworkFailure { message };

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("asmgen v", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(|e| network(format!("Failed to build HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| network(format!("Failed to contact {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(network(format!("HTTP {} fetching {}", response.status(), url)));
    }

    response
        .json::<VersionManifest>()
        .map_err(|e| network(format!("Failed to parse response from {}: {}", url, e)))
}
