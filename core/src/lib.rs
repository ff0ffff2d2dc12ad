#![deny(missing_docs)]

//! # Fern Loader Core
//!
//! Loads an API definition workspace from disk, validates it and resolves it
//! into a typed, cross-referenced representation. A workspace is either:
//!
//! - an **OpenAPI** workspace: one document under `openapi/`, or
//! - a **declarative** workspace: a tree of YAML files under `definition/`
//!   with a root `api.yml`, `__package__.yml` overlays and file imports.
//!
//! Problems are reported as [`Diagnostic`] values rather than panics, and the
//! output is deterministic for a given set of inputs.

/// Shared error types.
pub mod error;

/// Problem reports.
pub mod diagnostics;

/// Loader options.
pub mod config;

/// Validated relative and absolute paths.
pub mod paths;

/// Recursive file discovery.
pub mod discovery;

/// Reading and parsing YAML documents.
pub mod document;

/// Typed schemas for validated files.
pub mod ir;

/// Structural validation of parsed documents.
pub mod validation;

/// Package marker composition and import resolution.
pub mod package_markers;

/// Generator and dependency configuration collaborators.
pub mod collaborators;

/// OpenAPI workspaces.
pub mod openapi;

/// Workspace assembly.
pub mod workspace;

pub use collaborators::{
    DependenciesConfiguration, DependenciesConfigurationLoader, GeneratorsConfiguration,
    GeneratorsConfigurationLoader,
};
pub use config::{ListMergePolicy, LoaderOptions};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use discovery::list_files;
pub use document::{load_documents, parse_document, DiskReader, RawDocument, SourceReader};
pub use error::{AppError, AppResult};
pub use openapi::{load_openapi_definition, OpenApiDefinition};
pub use package_markers::{
    compose_markers, process_package_markers, resolve_import_graph, ComposedPackageMarker,
    ImportedDefinition, ProcessedPackageMarkers, ResolvedImports,
};
pub use paths::{AbsoluteFilePath, RelativeFilePath};
pub use validation::{validate_structure_of_files, StructuralValidationResult};
pub use workspace::{
    load_api_workspace, FernDefinition, LoadStage, Workspace, WorkspaceDefinition, WorkspaceKind,
    WorkspaceLoadResult, WorkspaceLoader,
};
