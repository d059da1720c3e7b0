//! Configuration validation rules.
//!
//! This module validates configuration for correctness:
//! - A tracked artifact must be named
//! - Exactly one dumper and one shim generator
//! - Package names are unique and non-empty
//! - Executing packages have a command
//! - Only support packages may be optional
//! - Package names are plain file names and outputs stay inside the
//!   package destination

use crate::config::schema::{AsmgenConfig, PackageRole};
use crate::error::{AsmgenError, Result};
use crate::pipeline::migrate::is_plain_file_name;
use std::collections::HashSet;
use std::path::{Component, Path};

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Package name if error is package-specific
    pub package: Option<String>,
}

impl ValidationError {
    fn new(rule: &str, message: String, package: Option<&str>) -> Self {
        Self {
            rule: rule.to_string(),
            message,
            package: package.map(String::from),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &AsmgenConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.tracked_artifact.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "missing-artifact",
            "'tracked_artifact' must be set".to_string(),
            None,
        ));
    }

    errors.extend(validate_roles(config));
    errors.extend(validate_packages(config));

    errors
}

fn validate_roles(config: &AsmgenConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for role in [PackageRole::Dumper, PackageRole::ShimGenerator] {
        let count = config.packages.iter().filter(|p| p.role == role).count();
        if count != 1 {
            errors.push(ValidationError::new(
                "role-count",
                format!("Expected exactly one '{}' package, found {}", role, count),
                None,
            ));
        }
    }

    errors
}

fn validate_packages(config: &AsmgenConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for package in &config.packages {
        let name = package.name.as_str();

        if name.trim().is_empty() {
            errors.push(ValidationError::new(
                "empty-name",
                "Package names must not be empty".to_string(),
                None,
            ));
            continue;
        }

        if !is_plain_file_name(name) {
            errors.push(ValidationError::new(
                "invalid-name",
                format!("Package name '{}' must be a plain file name", name),
                Some(name),
            ));
            continue;
        }

        if !seen.insert(name) {
            errors.push(ValidationError::new(
                "duplicate-name",
                format!("Package '{}' is declared more than once", name),
                Some(name),
            ));
        }

        let executes = package.role != PackageRole::Support;
        if executes && package.command.as_deref().is_none_or(|c| c.trim().is_empty()) {
            errors.push(ValidationError::new(
                "missing-command",
                format!("Package '{}' ({}) must have a 'command'", name, package.role),
                Some(name),
            ));
        }

        if executes && package.optional {
            errors.push(ValidationError::new(
                "optional-executing-package",
                format!(
                    "Package '{}' ({}) cannot be optional; only support packages can",
                    name, package.role
                ),
                Some(name),
            ));
        }

        if !is_nested_relative(&package.output) {
            errors.push(ValidationError::new(
                "invalid-output",
                format!(
                    "Package '{}' output '{}' must be a subdirectory of its destination",
                    name,
                    package.output.display()
                ),
                Some(name),
            ));
        }
    }

    errors
}

/// Non-empty and made only of normal components: no root, `.` or `..`.
fn is_nested_relative(path: &Path) -> bool {
    let mut components = path.components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

/// Validate and return Result (for convenience).
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &AsmgenConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(AsmgenError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::PackageSpec;
    use std::path::PathBuf;

    fn executing(name: &str, role: PackageRole) -> PackageSpec {
        let mut spec = PackageSpec::new(name, role);
        spec.command = Some("true".to_string());
        spec
    }

    fn valid_config() -> AsmgenConfig {
        AsmgenConfig {
            tracked_artifact: PathBuf::from("libil2cpp.so"),
            packages: vec![
                executing("cpp2il", PackageRole::Dumper),
                executing("il2cppinterop", PackageRole::ShimGenerator),
                PackageSpec::new("unity_dependencies", PackageRole::Support),
            ],
            ..Default::default()
        }
    }

    fn rules(config: &AsmgenConfig) -> Vec<String> {
        validate_config(config).into_iter().map(|e| e.rule).collect()
    }

    #[test]
    fn valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn missing_artifact_is_reported() {
        let mut config = valid_config();
        config.tracked_artifact = PathBuf::new();
        assert_eq!(rules(&config), vec!["missing-artifact"]);
    }

    #[test]
    fn missing_shim_generator_is_reported() {
        let mut config = valid_config();
        config.packages.remove(1);
        assert_eq!(rules(&config), vec!["role-count"]);
    }

    #[test]
    fn two_dumpers_are_reported() {
        let mut config = valid_config();
        config.packages.push(executing("other", PackageRole::Dumper));
        assert_eq!(rules(&config), vec!["role-count"]);
    }

    #[test]
    fn duplicate_names_are_reported() {
        let mut config = valid_config();
        config
            .packages
            .push(PackageSpec::new("cpp2il", PackageRole::Support));
        let errors = validate_config(&config);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, "duplicate-name");
        assert_eq!(errors[0].package.as_deref(), Some("cpp2il"));
    }

    #[test]
    fn executing_package_needs_command() {
        let mut config = valid_config();
        config.packages[0].command = Some("   ".to_string());
        assert_eq!(rules(&config), vec!["missing-command"]);
    }

    #[test]
    fn only_support_packages_may_be_optional() {
        let mut config = valid_config();
        config.packages[1].optional = true;
        config.packages[2].optional = true;
        assert_eq!(rules(&config), vec!["optional-executing-package"]);
    }

    #[test]
    fn output_must_stay_below_destination() {
        for output in ["", ".", "..", "x/../..", "/abs", "./"] {
            let mut config = valid_config();
            config.packages[1].output = PathBuf::from(output);
            assert_eq!(rules(&config), vec!["invalid-output"], "output {:?}", output);
        }
    }

    #[test]
    fn nested_output_is_accepted() {
        let mut config = valid_config();
        config.packages[1].output = PathBuf::from("build/out");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn package_name_must_be_plain() {
        for name in ["a/b", "..", ".", "/abs"] {
            let mut config = valid_config();
            config
                .packages
                .push(PackageSpec::new(name, PackageRole::Support));
            let errors = validate_config(&config);

            assert_eq!(errors.len(), 1, "name {:?}", name);
            assert_eq!(errors[0].rule, "invalid-name");
            assert_eq!(errors[0].package.as_deref(), Some(name));
        }
    }

    #[test]
    fn collects_multiple_errors() {
        let config = AsmgenConfig::default();
        let errors = validate_config(&config);

        // missing artifact plus both role counts
        assert_eq!(errors.len(), 3);
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("tracked_artifact"));
    }
}
