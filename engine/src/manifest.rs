//! Module manifest parsing and validation.
//!
//! A rule module is a directory containing a `module.toml` manifest declaring
//! the module identity, its fact types, and its rules. The manifest layer
//! only guarantees a well-formed declaration set; rule conditions are
//! compiled later (see [`crate::compile`]), so a manifest that parses here
//! can still fail to produce a runnable container.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// File name addressed by module resolution.
pub const MANIFEST_FILE: &str = "module.toml";

/// A parsed module manifest: identity, fact declarations, rule definitions.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModuleManifest {
    pub module: ModuleMeta,
    #[serde(default)]
    pub facts: Vec<FactDecl>,
    #[serde(default)]
    pub rules: Vec<RuleDecl>,
}

/// Module identity.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModuleMeta {
    /// Module name (slug format: `[a-z0-9_-]+`).
    pub name: String,
    /// Package identity, dotted slug segments (e.g. `acme.claims`). Cached
    /// build artifacts are invalidated by this key.
    pub package: String,
}

/// One fact type the module's sessions accept.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FactDecl {
    pub name: String,
    pub fields: Vec<String>,
}

/// One rule definition.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RuleDecl {
    pub name: String,
    /// Condition source, e.g. `claim.amount < 500 && claim.region == 'EU'`.
    pub when: String,
    /// Outcome bindings applied to the session when the condition matches.
    pub then: BTreeMap<String, Value>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error("invalid manifest {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

impl ModuleManifest {
    /// Parse and validate manifest contents; `path` is used for error context
    /// only (the caller owns the read so it can fingerprint the source).
    pub fn parse(path: &Path, contents: &str) -> Result<Self, ManifestError> {
        let manifest: ModuleManifest = toml::from_str(contents).map_err(|source| {
            ManifestError::Parse {
                path: path.to_path_buf(),
                source: Box::new(source),
            }
        })?;
        manifest.validate().map_err(|message| ManifestError::Invalid {
            path: path.to_path_buf(),
            message,
        })?;
        Ok(manifest)
    }

    #[cfg(test)]
    pub fn parse_str(contents: &str) -> Result<Self, ManifestError> {
        Self::parse(Path::new("module.toml"), contents)
    }

    fn validate(&self) -> Result<(), String> {
        if !is_slug(&self.module.name) {
            return Err("module.name must be a non-empty [a-z0-9_-] slug".to_string());
        }
        validate_package(&self.module.package)?;

        let mut fact_names = Vec::new();
        for fact in &self.facts {
            if !is_slug(&fact.name) {
                return Err(format!("fact name {:?} must be a [a-z0-9_-] slug", fact.name));
            }
            if fact.fields.is_empty() {
                return Err(format!("fact {} must declare at least one field", fact.name));
            }
            let mut fields = fact.fields.clone();
            fields.sort();
            for pair in fields.windows(2) {
                if pair[0] == pair[1] {
                    return Err(format!("fact {} declares field {} twice", fact.name, pair[0]));
                }
            }
            for field in &fact.fields {
                if !is_slug(field) {
                    return Err(format!(
                        "fact {} field {:?} must be a [a-z0-9_-] slug",
                        fact.name, field
                    ));
                }
            }
            fact_names.push(fact.name.clone());
        }
        fact_names.sort();
        for pair in fact_names.windows(2) {
            if pair[0] == pair[1] {
                return Err(format!("duplicate fact type {}", pair[0]));
            }
        }

        let mut rule_names = Vec::new();
        for rule in &self.rules {
            if !is_slug(&rule.name) {
                return Err(format!("rule name {:?} must be a [a-z0-9_-] slug", rule.name));
            }
            if rule.when.trim().is_empty() {
                return Err(format!("rule {} has an empty condition", rule.name));
            }
            if rule.then.is_empty() {
                return Err(format!("rule {} must bind at least one outcome", rule.name));
            }
            for (binding, value) in &rule.then {
                if !is_slug(binding) {
                    return Err(format!(
                        "rule {} binding {:?} must be a [a-z0-9_-] slug",
                        rule.name, binding
                    ));
                }
                if !is_scalar(value) {
                    return Err(format!(
                        "rule {} binding {} must be a scalar value",
                        rule.name, binding
                    ));
                }
            }
            rule_names.push(rule.name.clone());
        }
        rule_names.sort();
        for pair in rule_names.windows(2) {
            if pair[0] == pair[1] {
                return Err(format!("duplicate rule {}", pair[0]));
            }
        }

        Ok(())
    }
}

fn validate_package(package: &str) -> Result<(), String> {
    if package.trim().is_empty() {
        return Err("module.package must be non-empty".to_string());
    }
    if !package.split('.').all(is_slug) {
        return Err("module.package must be dotted [a-z0-9_-] segments".to_string());
    }
    Ok(())
}

fn is_slug(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_')
}

/// Scalar check for outcome bindings and expectations.
pub fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}
