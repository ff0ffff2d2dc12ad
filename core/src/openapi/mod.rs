#![deny(missing_docs)]

//! # OpenAPI Workspaces
//!
//! The lighter load path for workspaces that hold a single OpenAPI document
//! instead of a declarative definition:
//!
//! - **shims**: loose deserialization layer over the document root.
//! - **normalization**: compatibility rewrites applied before `utoipa` parsing.
//! - **validation**: accumulating structural checks.
//!
//! Package markers and imports do not exist in this mode.

mod normalization;
mod shims;
mod validation;

use crate::config::LoaderOptions;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::discovery::list_files;
use crate::document::{load_documents, SourceReader};
use crate::paths::{AbsoluteFilePath, RelativeFilePath};
use serde::Serialize;
use serde_json::Value;
use shims::ShimOpenApi;
use tracing::debug;

/// A validated OpenAPI document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenApiDefinition {
    /// Absolute path of the document.
    pub absolute_filepath: AbsoluteFilePath,
    /// Document path relative to the OpenAPI directory.
    pub file: RelativeFilePath,
    /// Declared `openapi` or `swagger` version.
    pub spec_version: String,
    /// `info.title`.
    pub title: String,
    /// `info.version`.
    pub api_version: String,
    /// Path templates in document order.
    pub paths: Vec<String>,
    /// Schema names from `components.schemas` (or `definitions`), in document order.
    pub schemas: Vec<String>,
    /// The whole document as JSON.
    pub document: Value,
}

fn structural(file: &str, message: impl Into<String>) -> Vec<Diagnostic> {
    vec![Diagnostic::error(DiagnosticKind::StructuralError, file, message)]
}

/// Locates, parses and validates the single document under `directory`.
pub fn load_openapi_definition(
    directory: &AbsoluteFilePath,
    options: &LoaderOptions,
    reader: &dyn SourceReader,
) -> Result<OpenApiDefinition, Vec<Diagnostic>> {
    let mut files = list_files(directory.as_path(), &options.openapi_extensions).map_err(|e| {
        vec![Diagnostic::from_app_error(
            options.openapi_directory.as_str(),
            &e,
        )]
    })?;
    files.sort();

    let file = match files.as_slice() {
        [file] => file.clone(),
        [] => {
            return Err(structural(
                &options.openapi_directory,
                format!(
                    "no OpenAPI document found (expected one file with extension {})",
                    options.openapi_extensions.join(", ")
                ),
            ))
        }
        many => {
            let names: Vec<&str> = many.iter().map(RelativeFilePath::as_str).collect();
            return Err(structural(
                &options.openapi_directory,
                format!("found multiple OpenAPI documents: {}", names.join(", ")),
            ));
        }
    };
    debug!(file = %file, "loading OpenAPI document");

    let documents = load_documents(
        directory.as_path(),
        std::slice::from_ref(&file),
        reader,
        options.parse_threads,
    )
    .into_documents()?;
    let document = documents
        .get(&file)
        .map(|doc| doc.root.to_json())
        .unwrap_or(Value::Null);

    if !document.is_object() {
        return Err(structural(
            file.as_str(),
            "OpenAPI document must be a mapping at the top level",
        ));
    }
    let shim: ShimOpenApi = serde_json::from_value(document.clone())
        .map_err(|e| structural(file.as_str(), format!("Invalid OpenAPI document: {}", e)))?;

    let problems = validation::validate_openapi_document(&shim);
    if !problems.is_empty() {
        return Err(structural(file.as_str(), problems.join("\n")));
    }

    let info = shim.info.clone().unwrap_or_default();
    let schemas = if shim.is_oas3() {
        document
            .pointer("/components/schemas")
            .and_then(Value::as_object)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    } else {
        shim.definitions
            .as_ref()
            .map(|defs| defs.keys().cloned().collect())
            .unwrap_or_default()
    };

    Ok(OpenApiDefinition {
        absolute_filepath: file.to_absolute(directory),
        spec_version: shim.openapi.or(shim.swagger).unwrap_or_default(),
        title: info.title.unwrap_or_default(),
        api_version: info.version.unwrap_or_default(),
        paths: shim
            .paths
            .map(|p| p.items.into_keys().collect())
            .unwrap_or_default(),
        schemas,
        file,
        document,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DiskReader;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    const PETSTORE: &str = r#"
openapi: 3.0.3
info:
  title: Petstore
  version: "1.0.0"
paths:
  /pets:
    get:
      responses:
        "200":
          description: ok
  /pets/{petId}:
    get:
      responses:
        "200":
          description: ok
components:
  schemas:
    Pet:
      type: object
      properties:
        name:
          type: string
    Error:
      type: object
"#;

    fn load(files: &[(&str, &str)]) -> Result<OpenApiDefinition, Vec<Diagnostic>> {
        let dir = tempdir().unwrap();
        for (name, text) in files {
            fs::write(dir.path().join(name), text).unwrap();
        }
        let root = AbsoluteFilePath::of_existing_dir(dir.path()).unwrap();
        load_openapi_definition(&root, &LoaderOptions::default(), &DiskReader)
    }

    #[test]
    fn test_loads_document_ir() {
        let def = load(&[("openapi.yml", PETSTORE)]).unwrap();
        assert_eq!(def.file.as_str(), "openapi.yml");
        assert_eq!(def.spec_version, "3.0.3");
        assert_eq!(def.title, "Petstore");
        assert_eq!(def.api_version, "1.0.0");
        assert_eq!(def.paths, vec!["/pets", "/pets/{petId}"]);
        assert_eq!(def.schemas, vec!["Pet", "Error"]);
    }

    #[test]
    fn test_json_document() {
        let def = load(&[(
            "api.json",
            r#"{"swagger": "2.0", "info": {"title": "Old", "version": "1"}, "paths": {}}"#,
        )])
        .unwrap();
        assert_eq!(def.spec_version, "2.0");
        assert!(def.paths.is_empty());
    }

    #[test]
    fn test_unquoted_versions() {
        let def = load(&[(
            "openapi.yml",
            "openapi: 3.0\ninfo:\n  title: Pets\n  version: 1.5\npaths: {}\nwebhooks: {}\n",
        )])
        .unwrap();
        assert_eq!(def.spec_version, "3.0");
        assert_eq!(def.api_version, "1.5");

        let def = load(&[(
            "swagger.yml",
            "swagger: 2.0\ninfo:\n  title: Old\n  version: \"1\"\npaths: {}\ndefinitions:\n  Thing: {}\n",
        )])
        .unwrap();
        assert_eq!(def.spec_version, "2.0");
        assert_eq!(def.schemas, vec!["Thing"]);
    }

    #[test]
    fn test_requires_exactly_one_document() {
        let none = load(&[("notes.txt", "hello")]).unwrap_err();
        assert!(none[0].message.starts_with("no OpenAPI document found"));

        let many = load(&[("a.yml", PETSTORE), ("b.json", "{}")]).unwrap_err();
        assert_eq!(many[0].kind, DiagnosticKind::StructuralError);
        assert_eq!(many[0].message, "found multiple OpenAPI documents: a.yml, b.json");
    }

    #[test]
    fn test_problems_become_one_diagnostic() {
        let diags = load(&[(
            "openapi.yml",
            "openapi: 3.1.0\ninfo:\n  title: x\npaths:\n  /a:\n    get: {}\n",
        )])
        .unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].file, "openapi.yml");
        assert_eq!(diags[0].message.lines().count(), 2);
    }

    #[test]
    fn test_parse_errors_are_reported() {
        let diags = load(&[("openapi.yml", "openapi: [\n")]).unwrap_err();
        assert_eq!(diags[0].kind, DiagnosticKind::ParseError);
    }
}
