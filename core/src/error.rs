//! # Error Handling
//!
//! Provides the unified `AppError` enum for failures that abort an operation outright.
//! Problems found inside individual definition files are reported as
//! [`Diagnostic`](crate::diagnostics::Diagnostic) values instead.

use derive_more::{Display, From};
use std::path::PathBuf;

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// A required directory (workspace root, definition or OpenAPI directory) is absent.
    #[from(ignore)]
    #[display("Directory not found: {}", _0.display())]
    DirectoryNotFound(PathBuf),

    /// A path is malformed or resolves outside of the definition root.
    #[from(ignore)]
    #[display("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path as written.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

impl AppError {
    /// Shorthand for building an [`AppError::InvalidPath`].
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<walkdir::Error> for AppError {
    fn from(err: walkdir::Error) -> Self {
        AppError::Io(err.into())
    }
}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;
