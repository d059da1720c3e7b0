//! Variable interpolation for package commands.
//!
//! Commands and download URLs may reference `${variable}`; `$${text}` yields
//! a literal `${text}`.
//!
//! # Example
//!
//! ```yaml
//! command: '"${destination}/Cpp2IL" --game-path "${artifact}" --output-to "${output}"'
//! ```
//!
//! Values are substituted verbatim, without shell quoting. Path variables
//! such as `${destination}`, `${output}`, `${artifact}` and `${dump_output}`
//! contain the project root, so a command should wrap them in double quotes
//! to keep working when that root contains spaces.

use crate::error::{AsmgenError, Result};
use std::collections::HashMap;
use std::path::Path;

/// A segment of an interpolated string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Variable reference: ${name}
    Variable(String),
}

/// Split a string into literal and variable segments.
pub fn parse_interpolation(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        literal.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(escaped) = after.strip_prefix("${") {
            // $${...} stays literal, braces included
            let end = escaped.find('}').map_or(escaped.len(), |i| i + 1);
            literal.push_str("${");
            literal.push_str(&escaped[..end]);
            rest = &escaped[end..];
        } else if let Some(body) = after.strip_prefix('{') {
            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            let (name, remainder) = match body.find('}') {
                Some(i) => (&body[..i], &body[i + 1..]),
                None => (body, ""),
            };
            segments.push(Segment::Variable(name.to_string()));
            rest = remainder;
        } else if let Some(stripped) = after.strip_prefix('$') {
            literal.push('$');
            rest = stripped;
        } else {
            literal.push('$');
            rest = after;
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    segments
}

/// Values available to `${...}` references.
///
/// Pipeline variables win over environment variables.
#[derive(Debug, Default, Clone)]
pub struct InterpolationContext {
    /// Variables supplied by the pipeline (paths, versions).
    pub vars: HashMap<String, String>,

    /// Environment variables.
    pub env: HashMap<String, String>,
}

impl InterpolationContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pipeline variable.
    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.vars.insert(name.to_string(), value.into());
        self
    }

    /// Add a path-valued pipeline variable.
    pub fn with_path(self, name: &str, path: &Path) -> Self {
        self.with_var(name, path.display().to_string())
    }

    /// Use the given environment variables.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Resolve a variable name to its value.
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.vars
            .get(name)
            .or_else(|| self.env.get(name))
            .cloned()
    }
}

/// Resolve all variables in an interpolated string.
///
/// # Errors
///
/// Returns `ConfigValidationError` naming the first unknown variable.
pub fn resolve_string(input: &str, context: &InterpolationContext) -> Result<String> {
    let mut result = String::with_capacity(input.len());

    for segment in parse_interpolation(input) {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Variable(name) => {
                let value =
                    context
                        .resolve(&name)
                        .ok_or_else(|| AsmgenError::ConfigValidationError {
                            message: format!("Unresolved variable: ${{{}}}", name),
                        })?;
                result.push_str(&value);
            }
        }
    }

    Ok(result)
}
