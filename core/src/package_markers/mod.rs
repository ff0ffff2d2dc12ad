#![deny(missing_docs)]

//! # Package Marker Processing
//!
//! Runs once structural validation has succeeded, in two stages:
//!
//! - **imports**: resolves every import to an [`ImportedDefinition`] edge, checks
//!   that imported names exist, rejects cycles and warns about unused imports.
//! - **compose**: folds `__package__.yml` overlays top-down into one effective
//!   marker per directory and checks exports and navigation.
//!
//! Within a stage, diagnostics from every check accumulate. Only errors fail a
//! stage; warnings travel with the result.

pub mod compose;
pub mod imports;

pub use compose::{check_package_markers, compose_package_markers, ComposedPackageMarker};
pub use imports::{
    check_imported_names, detect_cycles, find_unused_imports, resolve_imports, ImportedDefinition,
};

use crate::collaborators::DependenciesConfiguration;
use crate::config::LoaderOptions;
use crate::diagnostics::{has_errors, sort_diagnostics, Diagnostic};
use crate::paths::RelativeFilePath;
use crate::validation::StructuralValidationResult;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Output of package marker processing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedPackageMarkers {
    /// Effective marker per directory, keyed by directory.
    pub composed_markers: BTreeMap<RelativeFilePath, ComposedPackageMarker>,
    /// Resolved import edges, ordered by `(from, alias)`.
    pub imported_definitions: Vec<ImportedDefinition>,
    /// Warnings raised while processing.
    pub warnings: Vec<Diagnostic>,
}

/// A validated import graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedImports {
    /// Edges ordered by `(from, alias)`.
    pub imported_definitions: Vec<ImportedDefinition>,
    /// Unused import warnings.
    pub warnings: Vec<Diagnostic>,
}

fn finish_stage(mut diagnostics: Vec<Diagnostic>) -> Result<Vec<Diagnostic>, Vec<Diagnostic>> {
    sort_diagnostics(&mut diagnostics);
    if has_errors(&diagnostics) {
        return Err(diagnostics);
    }
    for diagnostic in &diagnostics {
        warn!(file = %diagnostic.file, kind = %diagnostic.kind, "{}", diagnostic.message);
    }
    Ok(diagnostics)
}

/// Resolves imports, checks imported names and rejects import cycles.
pub fn resolve_import_graph(
    validated: &StructuralValidationResult,
) -> Result<ResolvedImports, Vec<Diagnostic>> {
    let (imported_definitions, mut diagnostics) = resolve_imports(validated);
    diagnostics.extend(check_imported_names(validated, &imported_definitions));
    diagnostics.extend(detect_cycles(&imported_definitions));
    diagnostics.extend(find_unused_imports(validated, &imported_definitions));
    debug!(edges = imported_definitions.len(), "resolved imports");

    let warnings = finish_stage(diagnostics)?;
    Ok(ResolvedImports {
        imported_definitions,
        warnings,
    })
}

/// Composes package markers and checks their exports and navigation.
pub fn compose_markers(
    validated: &StructuralValidationResult,
    dependencies: &DependenciesConfiguration,
    options: &LoaderOptions,
) -> Result<BTreeMap<RelativeFilePath, ComposedPackageMarker>, Vec<Diagnostic>> {
    let composed_markers = compose_package_markers(
        &validated.package_markers,
        &validated.named_definition_files,
        options.list_merge_policy,
    );
    let diagnostics = check_package_markers(
        &validated.package_markers,
        &validated.named_definition_files,
        dependencies,
    );
    debug!(directories = composed_markers.len(), "composed package markers");

    finish_stage(diagnostics)?;
    Ok(composed_markers)
}

/// Builds the validated import graph, then composes package markers.
///
/// Import failures stop processing before markers are composed.
pub fn process_package_markers(
    validated: &StructuralValidationResult,
    dependencies: &DependenciesConfiguration,
    options: &LoaderOptions,
) -> Result<ProcessedPackageMarkers, Vec<Diagnostic>> {
    let imports = resolve_import_graph(validated)?;
    let composed_markers = compose_markers(validated, dependencies, options)?;
    Ok(ProcessedPackageMarkers {
        composed_markers,
        imported_definitions: imports.imported_definitions,
        warnings: imports.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticKind, Severity};
    use crate::document::{parse_document, RawDocument};
    use crate::validation::validate_structure_of_files;

    fn validated(files: &[(&str, &str)]) -> StructuralValidationResult {
        let documents: BTreeMap<RelativeFilePath, RawDocument> = files
            .iter()
            .map(|(name, text)| {
                let file = RelativeFilePath::parse(name).unwrap();
                (file.clone(), parse_document(file, text).unwrap())
            })
            .collect();
        validate_structure_of_files(&documents, &LoaderOptions::default()).unwrap()
    }

    #[test]
    fn test_processes_markers_and_imports() {
        let result = validated(&[
            ("api.yml", "name: demo\n"),
            ("__package__.yml", "display-name: Demo\n"),
            ("users/users.yml", "imports:\n  c: ../commons.yml\ntypes:\n  U: c.Id\n"),
            ("commons.yml", "types:\n  Id: string\n"),
        ]);
        let processed = process_package_markers(
            &result,
            &DependenciesConfiguration::default(),
            &LoaderOptions::default(),
        )
        .unwrap();

        assert_eq!(processed.imported_definitions.len(), 1);
        assert!(processed.warnings.is_empty());
        let marker = &processed.composed_markers[&RelativeFilePath::parse("users").unwrap()];
        assert_eq!(marker.display_name.as_deref(), Some("Demo"));
    }

    #[test]
    fn test_import_failures_stop_before_markers() {
        let result = validated(&[
            ("api.yml", "name: demo\n"),
            ("pkg/__package__.yml", "export: payments\n"),
            ("a.yml", "imports:\n  b: b.yml\n"),
            ("b.yml", "imports:\n  a: a.yml\n  gone: nowhere.yml\n"),
        ]);
        let diags = process_package_markers(
            &result,
            &DependenciesConfiguration::default(),
            &LoaderOptions::default(),
        )
        .unwrap_err();

        let summary: Vec<(&str, DiagnosticKind, Severity)> = diags
            .iter()
            .map(|d| (d.file.as_str(), d.kind, d.severity))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("a.yml", DiagnosticKind::CyclicImportError, Severity::Error),
                ("a.yml", DiagnosticKind::UnusedImport, Severity::Warning),
                ("b.yml", DiagnosticKind::DanglingImportError, Severity::Error),
                ("b.yml", DiagnosticKind::UnusedImport, Severity::Warning),
            ]
        );
    }

    #[test]
    fn test_marker_failures_after_clean_imports() {
        let result = validated(&[
            ("api.yml", "name: demo\n"),
            ("pkg/__package__.yml", "export: payments\n"),
            ("pkg/a.yml", "types:\n  A: string\n"),
        ]);
        let diags = process_package_markers(
            &result,
            &DependenciesConfiguration::default(),
            &LoaderOptions::default(),
        )
        .unwrap_err();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].file, "pkg/__package__.yml");
        assert_eq!(diags[0].kind, DiagnosticKind::ConfigurationError);
    }

    #[test]
    fn test_warnings_do_not_fail_processing() {
        let result = validated(&[
            ("api.yml", "name: demo\n"),
            ("a.yml", "imports:\n  b: b.yml\n"),
            ("b.yml", "types:\n  B: string\n"),
        ]);
        let processed = process_package_markers(
            &result,
            &DependenciesConfiguration::default(),
            &LoaderOptions::default(),
        )
        .unwrap();
        assert_eq!(processed.imported_definitions.len(), 1);
        assert_eq!(processed.warnings.len(), 1);
        assert_eq!(processed.warnings[0].kind, DiagnosticKind::UnusedImport);
    }
}
