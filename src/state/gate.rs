//! Content-hash gate for the tracked artifact.
//!
//! The [`ContentHashGate`] hashes the tracked native binary and compares the
//! digest with the one persisted by the last successful generation. It never
//! writes anything; committing the new hash is the orchestrator's job once a
//! run has fully succeeded.

use sha2::{Digest, Sha512};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{AsmgenError, Result};

/// Why the gate asked for regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenerationReason {
    /// No hash was ever persisted.
    NoPreviousHash,
    /// The artifact's content changed.
    HashChanged,
    /// Regeneration was forced from the environment.
    Forced,
}

impl std::fmt::Display for RegenerationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RegenerationReason::NoPreviousHash => "no previous hash",
            RegenerationReason::HashChanged => "artifact changed",
            RegenerationReason::Forced => "forced",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of evaluating the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    /// Hash of the artifact as it is now.
    pub current_hash: String,
    /// Set when regeneration is required.
    pub reason: Option<RegenerationReason>,
}

impl GateDecision {
    /// Whether the gate requires regeneration.
    pub fn needs_regeneration(&self) -> bool {
        self.reason.is_some()
    }
}

/// Decides whether the tracked artifact requires regeneration.
#[derive(Debug, Clone)]
pub struct ContentHashGate {
    artifact: PathBuf,
}

impl ContentHashGate {
    /// Create a gate over the given artifact path.
    pub fn new(artifact: impl Into<PathBuf>) -> Self {
        Self {
            artifact: artifact.into(),
        }
    }

    /// Get the tracked artifact path.
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    /// Compute the SHA-512 of the artifact as lowercase hex.
    pub fn compute_hash(&self) -> Result<String> {
        hash_file(&self.artifact).map_err(|e| AsmgenError::ArtifactUnreadable {
            path: self.artifact.clone(),
            message: e.to_string(),
        })
    }

    /// Evaluate the gate against the persisted hash.
    ///
    /// An empty persisted hash counts as absent.
    pub fn evaluate(&self, persisted: Option<&str>, force: bool) -> Result<GateDecision> {
        let current_hash = self.compute_hash()?;

        tracing::debug!(
            "Last artifact hash: {}",
            persisted.filter(|h| !h.is_empty()).unwrap_or("null")
        );
        tracing::debug!("Current artifact hash: {}", current_hash);

        let reason = match persisted.filter(|h| !h.is_empty()) {
            None => Some(RegenerationReason::NoPreviousHash),
            Some(previous) if previous != current_hash => Some(RegenerationReason::HashChanged),
            Some(_) if force => Some(RegenerationReason::Forced),
            Some(_) => None,
        };

        Ok(GateDecision {
            current_hash,
            reason,
        })
    }
}

fn hash_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha512::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest = hasher.finalize();
    Ok(hex::encode(&digest[..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn artifact(temp: &TempDir, content: &[u8]) -> PathBuf {
        let path = temp.path().join("libil2cpp.so");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn empty_persisted_hash_always_regenerates() {
        let temp = TempDir::new().unwrap();
        let gate = ContentHashGate::new(artifact(&temp, b"binary"));

        let none = gate.evaluate(None, false).unwrap();
        let empty = gate.evaluate(Some(""), false).unwrap();

        assert_eq!(none.reason, Some(RegenerationReason::NoPreviousHash));
        assert_eq!(empty.reason, Some(RegenerationReason::NoPreviousHash));
    }

    #[test]
    fn matching_hash_is_up_to_date() {
        let temp = TempDir::new().unwrap();
        let gate = ContentHashGate::new(artifact(&temp, b"binary"));
        let hash = gate.compute_hash().unwrap();

        let decision = gate.evaluate(Some(&hash), false).unwrap();

        assert!(!decision.needs_regeneration());
        assert_eq!(decision.current_hash, hash);
    }

    #[test]
    fn changed_content_regenerates() {
        let temp = TempDir::new().unwrap();
        let path = artifact(&temp, b"first");
        let gate = ContentHashGate::new(&path);
        let old = gate.compute_hash().unwrap();

        fs::write(&path, b"second").unwrap();
        let decision = gate.evaluate(Some(&old), false).unwrap();

        assert_eq!(decision.reason, Some(RegenerationReason::HashChanged));
        assert_ne!(decision.current_hash, old);
    }

    #[test]
    fn force_overrides_matching_hash() {
        let temp = TempDir::new().unwrap();
        let gate = ContentHashGate::new(artifact(&temp, b"binary"));
        let hash = gate.compute_hash().unwrap();

        let decision = gate.evaluate(Some(&hash), true).unwrap();
        assert_eq!(decision.reason, Some(RegenerationReason::Forced));
    }

    #[test]
    fn hash_is_sha512_hex() {
        let temp = TempDir::new().unwrap();
        let gate = ContentHashGate::new(artifact(&temp, b""));

        let hash = gate.compute_hash().unwrap();

        assert_eq!(hash.len(), 128);
        assert!(hash.starts_with("cf83e1357eefb8bd"));
    }

    #[test]
    fn missing_artifact_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let gate = ContentHashGate::new(temp.path().join("missing.so"));

        let err = gate.evaluate(None, false).unwrap_err();
        assert!(matches!(err, AsmgenError::ArtifactUnreadable { .. }));
    }

    #[test]
    fn hashing_spans_multiple_read_chunks() {
        let temp = TempDir::new().unwrap();
        let mut big = vec![7u8; 200 * 1024];
        let path = artifact(&temp, &big);
        let gate = ContentHashGate::new(&path);
        let before = gate.compute_hash().unwrap();

        big[150 * 1024] = 8;
        fs::write(&path, &big).unwrap();

        assert_ne!(gate.compute_hash().unwrap(), before);
    }
}
