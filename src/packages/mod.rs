//! External tool packages and their lifecycle.
//!
//! Every tool the pipeline drives implements [`Package`]:
//!
//! - [`Package::should_setup`] - has the version changed since the last save?
//! - [`Package::setup`] - make the tool present and usable
//! - [`Package::execute`] - run the transformation into the output directory
//! - [`Package::cleanup`] - drop transient output
//! - [`Package::save`] - record the version after a successful run
//!
//! [`CommandPackage`] is the config-driven implementation that downloads a
//! tool and runs it through the shell. [`PackageSet`] owns the packages for
//! one run in their declared order.

pub mod command;
pub mod set;

use std::path::{Path, PathBuf};

use crate::config::PackageRole;
use crate::error::Result;
use crate::state::StateStore;

pub use command::{CommandPackage, CommandPackageFactory};
pub use set::{PackageFactory, PackageSet};

/// Identity and locations of one package for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDescriptor {
    /// Package name; the key in persisted state.
    pub name: String,
    /// Directory the tool is installed into.
    pub destination: PathBuf,
    /// Directory the tool writes its results to.
    pub output: PathBuf,
    /// Version selected for this run; may be empty.
    pub version: String,
}

impl PackageDescriptor {
    /// Version for display, `null` when unknown.
    pub fn display_version(&self) -> &str {
        if self.version.is_empty() {
            "null"
        } else {
            &self.version
        }
    }
}

/// Inputs available to a package while executing.
#[derive(Debug, Clone, Copy)]
pub struct ExecuteContext<'a> {
    /// Project root the config was loaded from.
    pub project_root: &'a Path,
    /// Tracked native binary.
    pub artifact: &'a Path,
    /// Output directory of the dumper, once it has run.
    pub dump_output: Option<&'a Path>,
}

/// Lifecycle contract of an external tool.
pub trait Package {
    /// Name, locations and version.
    fn descriptor(&self) -> &PackageDescriptor;

    /// Role this package plays in the pipeline.
    fn role(&self) -> PackageRole;

    /// Whether a setup failure may be ignored.
    fn optional(&self) -> bool {
        false
    }

    /// True when the persisted version is absent or differs from ours.
    fn should_setup(&self, state: &StateStore) -> bool {
        let descriptor = self.descriptor();
        state.saved_version(&descriptor.name) != Some(descriptor.version.as_str())
    }

    /// Make the tool present and usable at its destination.
    ///
    /// `refresh` is set when [`Package::should_setup`] reported a version
    /// change; an already installed tool is left alone otherwise.
    fn setup(&mut self, refresh: bool) -> Result<()>;

    /// Run the tool, writing only under the output directory.
    fn execute(&mut self, ctx: &ExecuteContext<'_>) -> Result<()>;

    /// Remove transient output. Safe to call repeatedly and before setup.
    fn cleanup(&mut self);

    /// Record this package's version in the state.
    fn save(&self, state: &mut StateStore) {
        let descriptor = self.descriptor();
        state.set_package_version(&descriptor.name, &descriptor.version);
    }
}
