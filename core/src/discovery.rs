#![deny(missing_docs)]

//! # File Discovery
//!
//! Recursively enumerates files under a root directory whose extension is in an
//! accepted set. The returned list follows directory-walk order and carries no
//! ordering guarantee; consumers sort before use.

use crate::error::{AppError, AppResult};
use crate::paths::RelativeFilePath;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Lists files under `root` with one of `extensions` (compared case-sensitively,
/// without the leading dot).
///
/// Fails with [`AppError::DirectoryNotFound`] only when `root` itself is missing.
/// An empty result is not an error.
pub fn list_files(root: &Path, extensions: &[String]) -> AppResult<Vec<RelativeFilePath>> {
    if !root.is_dir() {
        return Err(AppError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|accepted| accepted == ext));
        if !matches {
            continue;
        }

        let relative = path.strip_prefix(root).map_err(|_| {
            AppError::invalid_path(path.display().to_string(), "not under the walk root")
        })?;
        let file = RelativeFilePath::from_path(relative)?;
        debug!(file = %file, "discovered file");
        files.push(file);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn exts() -> Vec<String> {
        vec!["yml".to_string(), "yaml".to_string()]
    }

    #[test]
    fn test_lists_matching_files_recursively() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("api.yml"), "name: x").unwrap();
        fs::write(dir.path().join("a/one.yaml"), "").unwrap();
        fs::write(dir.path().join("a/b/two.yml"), "").unwrap();
        fs::write(dir.path().join("a/readme.md"), "").unwrap();

        let mut files: Vec<String> = list_files(dir.path(), &exts())
            .unwrap()
            .into_iter()
            .map(|f| f.as_str().to_string())
            .collect();
        files.sort();

        assert_eq!(files, vec!["a/b/two.yml", "a/one.yaml", "api.yml"]);
    }

    #[test]
    fn test_empty_directory_is_not_an_error() {
        let dir = tempdir().unwrap();
        assert!(list_files(dir.path(), &exts()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_root_fails() {
        let dir = tempdir().unwrap();
        let err = list_files(&dir.path().join("nope"), &exts()).unwrap_err();
        assert!(matches!(err, AppError::DirectoryNotFound(_)));
    }
}
