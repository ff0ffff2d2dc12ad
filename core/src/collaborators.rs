#![deny(missing_docs)]

//! # Configuration Collaborators
//!
//! The generators and dependencies configuration files are owned by other
//! subsystems; the loader only needs them loaded. Each is behind a trait so
//! callers can substitute their own source. The default implementations read
//! the files from the workspace root; a missing file yields an empty config.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::paths::AbsoluteFilePath;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use tracing::debug;

/// Generator configuration, opaque to the loader.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct GeneratorsConfiguration {
    /// The parsed file, or `null` when absent.
    pub raw: serde_json::Value,
}

/// Declared dependencies of a declarative workspace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DependenciesConfiguration {
    /// Dependency name to version or locator.
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
}

impl DependenciesConfiguration {
    /// True when `name` is a declared dependency.
    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }
}

/// Loads the generators configuration of a workspace.
pub trait GeneratorsConfigurationLoader: Send + Sync {
    /// Loads the configuration for the workspace at `root`.
    fn load(&self, root: &AbsoluteFilePath) -> Result<GeneratorsConfiguration, Diagnostic>;
}

/// Loads the dependencies configuration of a declarative workspace.
pub trait DependenciesConfigurationLoader: Send + Sync {
    /// Loads the configuration for the workspace at `root`.
    fn load(&self, root: &AbsoluteFilePath) -> Result<DependenciesConfiguration, Diagnostic>;
}

/// Reads `generators.yml` (or the configured name) from the workspace root.
#[derive(Debug, Clone)]
pub struct FileGeneratorsConfigurationLoader {
    /// File name under the workspace root.
    pub file_name: String,
}

/// Reads `dependencies.yml` (or the configured name) from the workspace root.
#[derive(Debug, Clone)]
pub struct FileDependenciesConfigurationLoader {
    /// File name under the workspace root.
    pub file_name: String,
}

fn config_error(file: &str, message: impl std::fmt::Display) -> Diagnostic {
    Diagnostic::error(DiagnosticKind::ConfigurationError, file, message.to_string())
}

/// Reads an optional config file. `Ok(None)` when it does not exist.
fn read_optional(root: &AbsoluteFilePath, file_name: &str) -> Result<Option<String>, Diagnostic> {
    let path = root.child(file_name);
    match std::fs::read_to_string(path.as_path()) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(file = file_name, "configuration file absent");
            Ok(None)
        }
        Err(e) => Err(config_error(file_name, format!("Failed to read file: {}", e))),
    }
}

impl GeneratorsConfigurationLoader for FileGeneratorsConfigurationLoader {
    fn load(&self, root: &AbsoluteFilePath) -> Result<GeneratorsConfiguration, Diagnostic> {
        let Some(text) = read_optional(root, &self.file_name)? else {
            return Ok(GeneratorsConfiguration::default());
        };
        let raw: serde_json::Value = serde_yaml::from_str(&text).map_err(|e| {
            config_error(&self.file_name, format!("Invalid generators configuration: {}", e))
        })?;
        Ok(GeneratorsConfiguration { raw })
    }
}

impl DependenciesConfigurationLoader for FileDependenciesConfigurationLoader {
    fn load(&self, root: &AbsoluteFilePath) -> Result<DependenciesConfiguration, Diagnostic> {
        let Some(text) = read_optional(root, &self.file_name)? else {
            return Ok(DependenciesConfiguration::default());
        };
        if text.trim().is_empty() {
            return Ok(DependenciesConfiguration::default());
        }
        serde_yaml::from_str(&text).map_err(|e| {
            config_error(&self.file_name, format!("Invalid dependencies configuration: {}", e))
        })
    }
}
