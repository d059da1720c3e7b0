//! Error types for asmgen operations.
//!
//! This module defines [`AsmgenError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `AsmgenError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `AsmgenError::Other`) for unexpected errors
//! - The pipeline never lets an error escape a run; it converts each one
//!   into a stage-tagged run record instead

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for asmgen operations.
#[derive(Debug, Error)]
pub enum AsmgenError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration or state file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A package could not become ready.
    #[error("Package '{package}' failed to set up: {message}")]
    SetupFailure { package: String, message: String },

    /// A package's transformation failed.
    #[error("Package '{package}' failed to execute: {message}")]
    ExecutionFailure { package: String, message: String },

    /// Version lookup failed; callers fall back to local defaults.
    #[error("Version lookup failed: {message}")]
    TransientNetworkFailure { message: String },

    /// The tracked artifact could not be read for hashing.
    #[error("Cannot read tracked artifact {path}: {message}")]
    ArtifactUnreadable { path: PathBuf, message: String },

    /// Moving generated output into the stable directory failed.
    #[error("Failed to migrate '{file}': {message}")]
    MigrationFailure { file: String, message: String },

    /// Shell command failed.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for asmgen operations.
pub type Result<T> = std::result::Result<T, AsmgenError>;
