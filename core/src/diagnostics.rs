#![deny(missing_docs)]

//! # Diagnostics
//!
//! Structured reports of individual problems found while loading a workspace.
//! Every stage accumulates diagnostics across independent files; the caller
//! receives them in a deterministic order (file path, then discovery order
//! within the file).

use crate::error::AppError;
use derive_more::Display;
use serde::Serialize;
use std::fmt;

/// How severe a diagnostic is. Only errors fail a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    /// The workspace cannot be assembled.
    #[display("error")]
    Error,
    /// Reported to the caller but does not fail the load.
    #[display("warning")]
    Warning,
}

/// The category a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// A required directory is absent.
    DirectoryNotFound,
    /// File content could not be read or parsed.
    ParseError,
    /// A file has the wrong shape for its role.
    StructuralError,
    /// An import does not resolve to a validated definition file.
    DanglingImportError,
    /// The import graph contains a cycle.
    CyclicImportError,
    /// An import would escape the definition root or is malformed.
    InvalidPath,
    /// Generator or dependency configuration failed to load.
    ConfigurationError,
    /// An import is declared but never referenced.
    UnusedImport,
}

/// A line/column location inside a source file (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    /// Line number.
    pub line: usize,
    /// Column number.
    pub column: usize,
}

/// A single reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// File the problem belongs to, relative to the directory it was discovered in
    /// (or a workspace-level name such as `generators.yml`).
    pub file: String,
    /// Human readable description. Multi-issue reports use one line per issue.
    pub message: String,
    /// Severity.
    pub severity: Severity,
    /// Category.
    pub kind: DiagnosticKind,
    /// Location inside the file when the parser could provide it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    pub fn error(kind: DiagnosticKind, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
            severity: Severity::Error,
            kind,
            position: None,
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(
        kind: DiagnosticKind,
        file: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, file, message)
        }
    }

    /// Attaches a source position.
    pub fn with_position(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    /// Converts a fatal [`AppError`] into a diagnostic attributed to `file`.
    pub fn from_app_error(file: impl Into<String>, err: &AppError) -> Self {
        let kind = match err {
            AppError::DirectoryNotFound(_) => DiagnosticKind::DirectoryNotFound,
            AppError::InvalidPath { .. } => DiagnosticKind::InvalidPath,
            AppError::Io(_) | AppError::General(_) => DiagnosticKind::ParseError,
        };
        Self::error(kind, file, err.to_string())
    }

    /// Returns true for error-severity diagnostics.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(pos) = self.position {
            write!(f, ":{}:{}", pos.line, pos.column)?;
        }
        write!(f, ": {}[{}]: ", self.severity, self.kind)?;
        let mut lines = self.message.lines();
        if let Some(first) = lines.next() {
            write!(f, "{}", first)?;
        }
        for line in lines {
            write!(f, "\n    {}", line)?;
        }
        Ok(())
    }
}

/// Returns true if any diagnostic is an error.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Sorts diagnostics by file path. The sort is stable, so diagnostics for the same
/// file keep the order in which they were produced.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| a.file.cmp(&b.file));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_position_and_multiline() {
        let diag = Diagnostic::error(
            DiagnosticKind::StructuralError,
            "users.yml",
            "types.User: expected mapping\ntypes.Id: unknown type 'Foo'",
        )
        .with_position(Some(Position { line: 3, column: 5 }));

        assert_eq!(
            diag.to_string(),
            "users.yml:3:5: error[StructuralError]: types.User: expected mapping\n    types.Id: unknown type 'Foo'"
        );
    }

    #[test]
    fn test_sort_is_stable_within_file() {
        let mut diags = vec![
            Diagnostic::error(DiagnosticKind::ParseError, "b.yml", "first b"),
            Diagnostic::error(DiagnosticKind::ParseError, "a.yml", "only a"),
            Diagnostic::error(DiagnosticKind::ParseError, "b.yml", "second b"),
        ];
        sort_diagnostics(&mut diags);
        let messages: Vec<_> = diags.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["only a", "first b", "second b"]);
    }

    #[test]
    fn test_warnings_do_not_count_as_errors() {
        let diags = vec![Diagnostic::warning(
            DiagnosticKind::ConfigurationError,
            "generators.yml",
            "no generators configured",
        )];
        assert!(!has_errors(&diags));
    }

    #[test]
    fn test_from_app_error_maps_kind() {
        let err = AppError::invalid_path("../x.yml", "escapes the definition root");
        let diag = Diagnostic::from_app_error("a.yml", &err);
        assert_eq!(diag.kind, DiagnosticKind::InvalidPath);
    }
}
