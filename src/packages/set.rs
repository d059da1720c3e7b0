//! The ordered collection of packages driven in one run.

use std::collections::BTreeMap;
use std::path::Path;

use super::{Package, PackageDescriptor};
use crate::config::{PackageRole, PackageSpec};
use crate::error::{AsmgenError, Result};
use crate::state::StateStore;
use crate::versions::{select_version, VersionInputs, VersionResolver};

/// Builds concrete packages from their config.
pub trait PackageFactory {
    /// Create the package for `spec` with its resolved descriptor.
    fn create(&self, spec: &PackageSpec, descriptor: PackageDescriptor) -> Box<dyn Package>;
}

/// Packages owned by the pipeline for the duration of one run.
///
/// Holds packages in declared order; setup walks them in that order.
pub struct PackageSet {
    packages: Vec<Box<dyn Package>>,
    dumper: usize,
    shim_generator: usize,
}

impl std::fmt::Debug for PackageSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.packages.iter().map(|p| p.descriptor()))
            .finish()
    }
}

impl PackageSet {
    /// Resolve each spec's version and instantiate it.
    ///
    /// `pins` override every other version source.
    pub fn build(
        specs: &[PackageSpec],
        work_dir: &Path,
        pins: &BTreeMap<String, String>,
        resolver: &dyn VersionResolver,
        state: &StateStore,
        factory: &dyn PackageFactory,
    ) -> Result<Self> {
        let mut packages = Vec::with_capacity(specs.len());

        for spec in specs {
            let remote = resolver.resolve(&spec.name);
            let version = select_version(VersionInputs {
                forced: pins
                    .get(&spec.name)
                    .map(String::as_str)
                    .or(spec.forced_version.as_deref()),
                remote: remote.as_deref(),
                default: spec.default_version.as_deref(),
                persisted: state.package_version(&spec.name),
            });

            let destination = work_dir.join(&spec.name);
            let descriptor = PackageDescriptor {
                name: spec.name.clone(),
                output: destination.join(&spec.output),
                destination,
                version,
            };

            packages.push(factory.create(spec, descriptor));
        }

        Self::from_packages(packages)
    }

    /// Wrap already constructed packages.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidationError` unless exactly one dumper and one
    /// shim generator are present.
    pub fn from_packages(packages: Vec<Box<dyn Package>>) -> Result<Self> {
        let find = |role: PackageRole| -> Result<usize> {
            let mut matches = packages
                .iter()
                .enumerate()
                .filter(|(_, p)| p.role() == role)
                .map(|(i, _)| i);
            match (matches.next(), matches.next()) {
                (Some(i), None) => Ok(i),
                _ => Err(AsmgenError::ConfigValidationError {
                    message: format!("Expected exactly one '{}' package", role),
                }),
            }
        };

        let dumper = find(PackageRole::Dumper)?;
        let shim_generator = find(PackageRole::ShimGenerator)?;

        Ok(Self {
            packages,
            dumper,
            shim_generator,
        })
    }

    /// Number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Packages in declared order.
    pub fn iter(&self) -> impl Iterator<Item = &Box<dyn Package>> {
        self.packages.iter()
    }

    /// Packages in declared order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Package>> {
        self.packages.iter_mut()
    }

    /// The dumping package.
    pub fn dumper(&self) -> &dyn Package {
        self.packages[self.dumper].as_ref()
    }

    /// The dumping package, mutably.
    pub fn dumper_mut(&mut self) -> &mut dyn Package {
        self.packages[self.dumper].as_mut()
    }

    /// The shim generating package.
    pub fn shim_generator(&self) -> &dyn Package {
        self.packages[self.shim_generator].as_ref()
    }

    /// The shim generating package, mutably.
    pub fn shim_generator_mut(&mut self) -> &mut dyn Package {
        self.packages[self.shim_generator].as_mut()
    }

    /// Clean up the dumper and the shim generator.
    pub fn cleanup_primary(&mut self) {
        self.dumper_mut().cleanup();
        self.shim_generator_mut().cleanup();
    }
}
