#![deny(missing_docs)]

//! # Structural Validation
//!
//! Classifies every parsed document by role and checks it against the shape that
//! role requires:
//!
//! - **root_file**: the single `api.yml` at the top of the definition directory.
//! - **package_marker**: `__package__.yml` overlays, at any depth.
//! - **definition_file**: every other file (types, errors, service).
//! - **type_reference**: the shared type reference grammar and scope checks.
//!
//! Each file is validated independently and all of its issues are folded into a
//! single diagnostic, so `K` malformed files yield exactly `K` diagnostics.

pub mod definition_file;
pub mod package_marker;
pub mod root_file;
pub mod type_reference;

use crate::config::LoaderOptions;
use crate::diagnostics::{sort_diagnostics, Diagnostic, DiagnosticKind};
use crate::document::{RawDocument, RawNode, StructuralIssue};
use crate::ir::{NamedDefinitionFile, PackageMarkerDeclaration, RootApiFile};
use crate::paths::RelativeFilePath;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::debug;

pub use type_reference::parse_type_reference;

/// Collects issues found while validating one file.
#[derive(Debug, Default)]
pub(crate) struct IssueCollector {
    issues: Vec<StructuralIssue>,
}

impl IssueCollector {
    pub fn push(&mut self, issue: StructuralIssue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = StructuralIssue>) {
        self.issues.extend(issues);
    }

    /// Keeps the value on success, records the issue otherwise.
    pub fn check<T>(&mut self, result: Result<T, StructuralIssue>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(issue) => {
                self.issues.push(issue);
                None
            }
        }
    }

    /// Folds the collected issues into one diagnostic for `file`.
    pub fn into_diagnostic(self, file: &RelativeFilePath) -> Option<Diagnostic> {
        if self.issues.is_empty() {
            return None;
        }
        let message = self
            .issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        Some(Diagnostic::error(
            DiagnosticKind::StructuralError,
            file.as_str(),
            message,
        ))
    }
}

/// Reports keys of `node` that are not in `allowed`.
pub(crate) fn reject_unknown_keys(node: &RawNode, allowed: &[&str], issues: &mut IssueCollector) {
    if let Ok(map) = node.as_mapping() {
        for (key, value) in map {
            if !allowed.contains(&key.as_str()) {
                issues.push(value.issue(format!(
                    "unknown field '{}' (expected one of: {})",
                    key,
                    allowed.join(", ")
                )));
            }
        }
    }
}

/// Reads an optional string field.
pub(crate) fn optional_string(
    node: &RawNode,
    key: &str,
    issues: &mut IssueCollector,
) -> Option<String> {
    let value = node.get(key)?;
    issues.check(value.as_str().map(str::to_string))
}

/// Reads the `imports` mapping of a root or definition file.
pub(crate) fn read_imports(node: &RawNode, issues: &mut IssueCollector) -> IndexMap<String, String> {
    let mut imports = IndexMap::new();
    let Some(raw) = node.get("imports") else {
        return imports;
    };
    let Some(map) = issues.check(raw.as_mapping()) else {
        return imports;
    };
    for (alias, path) in map {
        if !type_reference::is_identifier(alias) {
            issues.push(path.issue(format!("invalid import alias '{}'", alias)));
            continue;
        }
        if let Some(path) = issues.check(path.as_str()) {
            imports.insert(alias.clone(), path.to_string());
        }
    }
    imports
}

/// Successfully validated files, keyed deterministically.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralValidationResult {
    /// The root API file.
    pub root_api_file: RootApiFile,
    /// Named definition files by identifier.
    pub named_definition_files: BTreeMap<RelativeFilePath, NamedDefinitionFile>,
    /// Declared package markers by the directory they sit in.
    pub package_markers: BTreeMap<RelativeFilePath, PackageMarkerDeclaration>,
}

/// Validates the structure of every parsed document.
///
/// Fails when the root file is missing or duplicated, or when any file is
/// malformed; the failure lists one diagnostic per offending file.
pub fn validate_structure_of_files(
    documents: &BTreeMap<RelativeFilePath, RawDocument>,
    options: &LoaderOptions,
) -> Result<StructuralValidationResult, Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();
    let mut root_candidates = Vec::new();
    let mut named_definition_files = BTreeMap::new();
    let mut package_markers: BTreeMap<RelativeFilePath, PackageMarkerDeclaration> =
        BTreeMap::new();

    for (file, doc) in documents {
        if options.is_root_api_file(file) {
            root_candidates.push(doc);
        } else if options.is_package_marker(file) {
            debug!(file = %file, "validating package marker");
            match package_marker::validate_package_marker(doc) {
                Ok(marker) => {
                    let dir = file.dirname();
                    if let Some(existing) = package_markers.get(&dir) {
                        diagnostics.push(Diagnostic::error(
                            DiagnosticKind::StructuralError,
                            file.as_str(),
                            format!(
                                "directory '{}' already has a package marker '{}'",
                                dir, existing.file
                            ),
                        ));
                    } else {
                        package_markers.insert(dir, marker);
                    }
                }
                Err(diag) => diagnostics.push(diag),
            }
        } else {
            debug!(file = %file, "validating definition file");
            match definition_file::validate_definition_file(doc) {
                Ok(named) => {
                    named_definition_files.insert(file.clone(), named);
                }
                Err(diag) => diagnostics.push(diag),
            }
        }
    }

    let root_name = options.root_api_file_name();
    let root_api_file = match root_candidates.as_slice() {
        [] => {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::StructuralError,
                root_name.clone(),
                format!("missing root API file '{}'", root_name),
            ));
            None
        }
        [doc] => match root_file::validate_root_api_file(doc) {
            Ok(root) => Some(root),
            Err(diag) => {
                diagnostics.push(diag);
                None
            }
        },
        many => {
            let names: Vec<&str> = many.iter().map(|doc| doc.file.as_str()).collect();
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::StructuralError,
                root_name,
                format!("found multiple root API files: {}", names.join(", ")),
            ));
            None
        }
    };

    match root_api_file {
        Some(root_api_file) if diagnostics.is_empty() => Ok(StructuralValidationResult {
            root_api_file,
            named_definition_files,
            package_markers,
        }),
        _ => {
            sort_diagnostics(&mut diagnostics);
            Err(diagnostics)
        }
    }
}
