#![deny(missing_docs)]

//! # Document Loader
//!
//! Reads and parses discovered files concurrently on a `rayon` pool. Each file is
//! parsed independently; a failure produces a diagnostic for that file only.
//! Results are collected into a map keyed by file identifier, so downstream stages
//! always observe them in lexicographic order regardless of completion order.

use crate::diagnostics::{Diagnostic, DiagnosticKind, Position};
use crate::document::node::{RawDocument, RawNode};
use crate::paths::RelativeFilePath;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Source of file contents. The default reads from disk.
pub trait SourceReader: Send + Sync {
    /// Reads a whole file as UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reads files with `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskReader;

impl SourceReader for DiskReader {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Outcome of reading and parsing one file.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedFile {
    /// The file parsed.
    ParsedOk(RawDocument),
    /// The file could not be read or parsed.
    ParseFailed(Diagnostic),
}

/// Per-file parse outcomes, ordered by file identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFiles {
    /// Outcomes keyed by file.
    pub files: BTreeMap<RelativeFilePath, ParsedFile>,
}

impl ParsedFiles {
    /// Splits into parsed documents, or every parse diagnostic when any file failed.
    pub fn into_documents(self) -> Result<BTreeMap<RelativeFilePath, RawDocument>, Vec<Diagnostic>> {
        let mut documents = BTreeMap::new();
        let mut diagnostics = Vec::new();
        for (file, parsed) in self.files {
            match parsed {
                ParsedFile::ParsedOk(doc) => {
                    documents.insert(file, doc);
                }
                ParsedFile::ParseFailed(diag) => diagnostics.push(diag),
            }
        }
        if diagnostics.is_empty() {
            Ok(documents)
        } else {
            Err(diagnostics)
        }
    }
}

/// Parses YAML text into a raw document. An empty file yields a null root.
pub fn parse_document(file: RelativeFilePath, contents: &str) -> Result<RawDocument, Diagnostic> {
    if contents.trim().is_empty() {
        return Ok(RawDocument {
            file,
            root: RawNode::from_yaml(serde_yaml::Value::Null, String::new()),
        });
    }

    match serde_yaml::from_str::<serde_yaml::Value>(contents) {
        Ok(value) => Ok(RawDocument {
            root: RawNode::from_yaml(value, String::new()),
            file,
        }),
        Err(e) => {
            let position = e.location().map(|loc| Position {
                line: loc.line(),
                column: loc.column(),
            });
            Err(Diagnostic::error(
                DiagnosticKind::ParseError,
                file.as_str(),
                format!("Failed to parse YAML: {}", e),
            )
            .with_position(position))
        }
    }
}

fn read_and_parse(root: &Path, file: &RelativeFilePath, reader: &dyn SourceReader) -> ParsedFile {
    let mut path = root.to_path_buf();
    for segment in file.segments() {
        path.push(segment);
    }

    let contents = match reader.read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            return ParsedFile::ParseFailed(Diagnostic::error(
                DiagnosticKind::ParseError,
                file.as_str(),
                format!("Failed to read file: {}", e),
            ))
        }
    };

    match parse_document(file.clone(), &contents) {
        Ok(doc) => {
            debug!(file = %file, "parsed file");
            ParsedFile::ParsedOk(doc)
        }
        Err(diag) => ParsedFile::ParseFailed(diag),
    }
}

/// Reads and parses `files` (relative to `root`) concurrently.
///
/// `threads` selects a dedicated pool size; `None` uses the global `rayon` pool.
pub fn load_documents(
    root: &Path,
    files: &[RelativeFilePath],
    reader: &dyn SourceReader,
    threads: Option<usize>,
) -> ParsedFiles {
    let parse_all = || -> Vec<(RelativeFilePath, ParsedFile)> {
        files
            .par_iter()
            .map(|file| (file.clone(), read_and_parse(root, file, reader)))
            .collect()
    };

    let outcomes = match threads {
        Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(parse_all),
            Err(e) => {
                warn!(error = %e, "failed to build parse pool, using the global pool");
                parse_all()
            }
        },
        None => parse_all(),
    };

    ParsedFiles {
        files: outcomes.into_iter().collect(),
    }
}
