//! Configuration loading, parsing, and validation for asmgen.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Validation in [`validator`]
//! - Variable interpolation in [`interpolation`]
//!
//! # Example
//!
//! ```
//! use asmgen::config::{load_config, PackageRole};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".asmgen");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(
//!     dir.join("config.yml"),
//!     "tracked_artifact: libil2cpp.so\n\
//!      packages:\n\
//!      \x20 - { name: cpp2il, role: dumper, command: dump }\n\
//!      \x20 - { name: interop, role: shim_generator, command: gen }\n",
//! )
//! .unwrap();
//!
//! let config = load_config(temp.path(), None).unwrap();
//! assert_eq!(config.packages[1].role, PackageRole::ShimGenerator);
//! ```

pub mod interpolation;
pub mod loader;
pub mod schema;
pub mod validator;

pub use interpolation::{parse_interpolation, resolve_string, InterpolationContext, Segment};
pub use loader::{
    default_config_path, find_project_root, load_config, load_config_file, parse_config,
    CONFIG_DIR,
};
pub use schema::{
    AsmgenConfig, FetchSpec, PackageRole, PackageSpec, ResolvedPaths, VersionSourceConfig,
};
pub use validator::{validate, validate_config, ValidationError};
