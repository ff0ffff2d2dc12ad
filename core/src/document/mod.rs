#![deny(missing_docs)]

//! # Raw Documents
//!
//! - **node**: the closed `Scalar | Sequence | Mapping` value tree and its fallible projections.
//! - **loader**: concurrent read + parse of discovered files into raw documents.

pub mod loader;
pub mod node;

pub use loader::{
    load_documents, parse_document, DiskReader, ParsedFile, ParsedFiles, SourceReader,
};
pub use node::{NodeValue, RawDocument, RawNode, Scalar, StructuralIssue};
