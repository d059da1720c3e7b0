//! Config-driven packages that download a tool and run it through the shell.
//!
//! Commands see the variables `name`, `version`, `destination`, `output`,
//! `project_root`, `artifact` and, for the shim generator, `dump_output`,
//! plus the process environment. Paths are inserted unquoted; see
//! [`crate::config::interpolation`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ExecuteContext, Package, PackageDescriptor, PackageFactory};
use crate::config::interpolation::{resolve_string, InterpolationContext};
use crate::config::{PackageRole, PackageSpec};
use crate::error::{AsmgenError, Result};
use crate::fetch::Downloader;
use crate::shell::{execute_checked, CommandOptions};

/// Marker file recording which version is installed in a destination.
pub const INSTALL_MARKER: &str = ".asmgen-installed";

/// A package whose setup and execution are shell commands and downloads.
#[derive(Debug, Clone)]
pub struct CommandPackage {
    spec: PackageSpec,
    descriptor: PackageDescriptor,
    project_root: PathBuf,
}

impl CommandPackage {
    /// Create a package from its spec and resolved descriptor.
    pub fn new(spec: PackageSpec, descriptor: PackageDescriptor, project_root: &Path) -> Self {
        Self {
            spec,
            descriptor,
            project_root: project_root.to_path_buf(),
        }
    }

    /// Path of the install marker.
    pub fn marker_path(&self) -> PathBuf {
        self.descriptor.destination.join(INSTALL_MARKER)
    }

    /// Whether this package's version is already installed.
    pub fn is_installed(&self) -> bool {
        fs::read_to_string(self.marker_path())
            .map(|v| v.trim() == self.descriptor.version)
            .unwrap_or(false)
    }

    fn context(&self, dump_output: Option<&Path>) -> InterpolationContext {
        let ctx = InterpolationContext::new()
            .with_env(std::env::vars().collect::<HashMap<_, _>>())
            .with_var("name", &self.descriptor.name)
            .with_var("version", &self.descriptor.version)
            .with_path("destination", &self.descriptor.destination)
            .with_path("output", &self.descriptor.output)
            .with_path("project_root", &self.project_root);

        match dump_output {
            Some(path) => ctx.with_path("dump_output", path),
            None => ctx,
        }
    }

    fn options(&self, cwd: &Path) -> CommandOptions {
        CommandOptions {
            cwd: Some(cwd.to_path_buf()),
            env: self.spec.env.clone(),
            capture: true,
        }
    }

    fn setup_failure(&self, message: impl std::fmt::Display) -> AsmgenError {
        AsmgenError::SetupFailure {
            package: self.descriptor.name.clone(),
            message: message.to_string(),
        }
    }

    fn execution_failure(&self, message: impl std::fmt::Display) -> AsmgenError {
        AsmgenError::ExecutionFailure {
            package: self.descriptor.name.clone(),
            message: message.to_string(),
        }
    }

    fn install(&self) -> Result<()> {
        let destination = &self.descriptor.destination;
        fs::create_dir_all(destination).map_err(|e| self.setup_failure(e))?;

        let ctx = self.context(None);

        if let Some(fetch) = &self.spec.fetch {
            let url = resolve_string(&fetch.url, &ctx).map_err(|e| self.setup_failure(e))?;
            let downloader = Downloader::new().map_err(|e| self.setup_failure(e))?;
            downloader
                .download(
                    &url,
                    &destination.join(&fetch.file),
                    fetch.sha256.as_deref(),
                    fetch.executable,
                )
                .map_err(|e| self.setup_failure(format!("{:#}", e)))?;
        }

        if let Some(command) = &self.spec.setup_command {
            let command = resolve_string(command, &ctx).map_err(|e| self.setup_failure(e))?;
            execute_checked(&command, &self.options(destination))
                .map_err(|e| self.setup_failure(e))?;
        }

        fs::write(self.marker_path(), &self.descriptor.version)
            .map_err(|e| self.setup_failure(e))?;

        Ok(())
    }
}

impl Package for CommandPackage {
    fn descriptor(&self) -> &PackageDescriptor {
        &self.descriptor
    }

    fn role(&self) -> PackageRole {
        self.spec.role
    }

    fn optional(&self) -> bool {
        self.spec.optional
    }

    fn setup(&mut self, refresh: bool) -> Result<()> {
        if !refresh && self.is_installed() {
            tracing::debug!("{} is already set up", self.descriptor.name);
            return Ok(());
        }

        tracing::info!(
            "Setting up {} {}",
            self.descriptor.name,
            self.descriptor.display_version()
        );
        self.install()
    }

    fn execute(&mut self, ctx: &ExecuteContext<'_>) -> Result<()> {
        let Some(command) = self.spec.command.as_deref() else {
            return Err(self.execution_failure("no command configured"));
        };

        fs::create_dir_all(&self.descriptor.output).map_err(|e| self.execution_failure(e))?;

        let interpolation = self
            .context(ctx.dump_output)
            .with_path("artifact", ctx.artifact)
            .with_path("project_root", ctx.project_root);
        let command =
            resolve_string(command, &interpolation).map_err(|e| self.execution_failure(e))?;

        tracing::info!("Executing {}...", self.descriptor.name);
        let result = execute_checked(&command, &self.options(&self.descriptor.destination))
            .map_err(|e| self.execution_failure(e))?;

        for line in result.stdout.lines() {
            tracing::debug!("[{}] {}", self.descriptor.name, line);
        }
        tracing::info!(
            "{} finished in {}ms",
            self.descriptor.name,
            result.duration.as_millis()
        );

        Ok(())
    }

    fn cleanup(&mut self) {
        let output = &self.descriptor.output;
        if !output.exists() {
            return;
        }

        if let Err(e) = fs::remove_dir_all(output) {
            tracing::warn!("Failed to clean {}: {}", output.display(), e);
        }
    }
}

/// Creates [`CommandPackage`]s for a project.
#[derive(Debug, Clone)]
pub struct CommandPackageFactory {
    project_root: PathBuf,
}

impl CommandPackageFactory {
    /// Create a factory for the given project root.
    pub fn new(project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
        }
    }
}

impl PackageFactory for CommandPackageFactory {
    fn create(&self, spec: &PackageSpec, descriptor: PackageDescriptor) -> Box<dyn Package> {
        Box::new(CommandPackage::new(
            spec.clone(),
            descriptor,
            &self.project_root,
        ))
    }
}
