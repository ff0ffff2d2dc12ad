#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use derive_more::{Display, From};

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// IO Error wrapper.
    #[display("IO Error: {}", _0)]
    Io(std::io::Error),

    /// Serializing the load result failed.
    #[display("JSON Error: {}", _0)]
    Json(serde_json::Error),

    /// The log subscriber could not be installed.
    #[from(ignore)]
    #[display("Logging Error: {}", _0)]
    Logging(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for CliError {}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;
