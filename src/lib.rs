//! asmgen - incremental assembly generation.
//!
//! asmgen watches a native binary and, when its content changes, drives a
//! chain of external tools ("packages") that dump it and generate managed
//! shim assemblies, then moves the results into a stable output directory.
//! Runs against an unchanged binary are no-ops.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, parsing, and validation
//! - [`error`] - Error types and result aliases
//! - [`fetch`] - Package downloads
//! - [`packages`] - The package lifecycle and its command-driven implementation
//! - [`pipeline`] - Run orchestration and output migration
//! - [`shell`] - Shell command execution
//! - [`state`] - Persisted state and the content-hash gate
//! - [`versions`] - Package version resolution
//!
//! # Example
//!
//! ```
//! use asmgen::versions::{select_version, VersionInputs};
//!
//! let version = select_version(VersionInputs {
//!     forced: None,
//!     remote: Some("2022.1.0"),
//!     default: Some("2021.4.0"),
//!     persisted: None,
//! });
//! assert_eq!(version, "2022.1.0");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod packages;
pub mod pipeline;
pub mod shell;
pub mod state;
pub mod versions;

pub use error::{AsmgenError, Result};
