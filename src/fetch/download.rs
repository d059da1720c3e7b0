//! HTTP downloads for package setup.
//!
//! Downloads land in a temporary sibling file and are only renamed over the
//! target after the checksum matches, so a failed download never damages an
//! existing install.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Downloads package files over HTTP/HTTPS.
pub struct Downloader {
    client: Client,
    timeout: Duration,
}

impl Downloader {
    /// Create a downloader with the default 5-minute timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(300))
    }

    /// Create a downloader with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("asmgen v", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, timeout })
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Download `url` to `target`, verifying `sha256` when given.
    pub fn download(
        &self,
        url: &str,
        target: &Path,
        sha256: Option<&str>,
        executable: bool,
    ) -> Result<()> {
        tracing::info!("Downloading {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to download {}", url))?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }

        let bytes = response
            .bytes()
            .with_context(|| format!("Failed to read body of {}", url))?;

        if let Some(expected) = sha256 {
            let actual = hex::encode(&Sha256::digest(&bytes)[..]);
            if !actual.eq_ignore_ascii_case(expected.trim()) {
                bail!(
                    "Checksum mismatch for {}: expected {}, got {}",
                    url,
                    expected,
                    actual
                );
            }
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let temp = temp_path(target);
        fs::write(&temp, &bytes).with_context(|| format!("Failed to write {}", temp.display()))?;

        if executable {
            make_executable(&temp)?;
        }

        fs::rename(&temp, target)
            .with_context(|| format!("Failed to move download to {}", target.display()))?;

        Ok(())
    }
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".download");
    target.with_file_name(name)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
