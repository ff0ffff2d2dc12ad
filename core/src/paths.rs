#![deny(missing_docs)]

//! # Path Identifiers
//!
//! Normalized path identifiers for files inside a definition root, and the pure
//! import resolver that maps an import string onto one of them.
//!
//! A [`RelativeFilePath`] never contains `.` or `..` segments, empty segments, or a
//! leading `/`. Anything that would need a `..` after normalization lies outside of
//! the root and is rejected with [`AppError::InvalidPath`].

use crate::error::{AppError, AppResult};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A `/`-separated path relative to a root directory. The empty path is the root itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct RelativeFilePath(String);

impl RelativeFilePath {
    /// The root directory.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses and normalizes a relative path string.
    pub fn parse(raw: &str) -> AppResult<Self> {
        Self::root().join(raw)
    }

    /// Builds an identifier from a filesystem path that is already relative to the root.
    pub fn from_path(path: &Path) -> AppResult<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        AppError::invalid_path(path.display().to_string(), "not valid UTF-8")
                    })?;
                    segments.push(part.to_string());
                }
                Component::CurDir => {}
                _ => {
                    return Err(AppError::invalid_path(
                        path.display().to_string(),
                        "expected a path relative to the definition root",
                    ))
                }
            }
        }
        Ok(Self(segments.join("/")))
    }

    /// The normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the root directory.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// The containing directory. The root's parent is the root.
    pub fn dirname(&self) -> RelativeFilePath {
        match self.0.rfind('/') {
            Some(idx) => Self(self.0[..idx].to_string()),
            None => Self::root(),
        }
    }

    /// The last segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// The file name without its final extension.
    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(0) | None => Some(name),
            Some(idx) => Some(&name[..idx]),
        }
    }

    /// The final extension, without the dot.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Joins a relative path onto this one, collapsing `.` and `..` segments.
    ///
    /// Fails with [`AppError::InvalidPath`] when the result would leave the root,
    /// when `relative` is absolute, or when it uses `\` separators.
    pub fn join(&self, relative: &str) -> AppResult<RelativeFilePath> {
        if relative.starts_with('/') {
            return Err(AppError::invalid_path(relative, "absolute paths are not allowed"));
        }
        if relative.contains('\\') {
            return Err(AppError::invalid_path(relative, "use '/' as the path separator"));
        }

        let mut stack: Vec<&str> = self.segments().collect();
        for segment in relative.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if stack.pop().is_none() {
                        return Err(AppError::invalid_path(
                            relative,
                            format!("escapes the definition root (resolved from '{}')", self),
                        ));
                    }
                }
                other => stack.push(other),
            }
        }
        Ok(Self(stack.join("/")))
    }

    /// Expresses this path relative to `dir`, using `..` segments where needed.
    ///
    /// `dir.join(&p.relative_from(&dir))` always yields `p` again.
    pub fn relative_from(&self, dir: &RelativeFilePath) -> String {
        let ours: Vec<&str> = self.segments().collect();
        let theirs: Vec<&str> = dir.segments().collect();
        let common = ours
            .iter()
            .zip(theirs.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut parts: Vec<&str> = Vec::new();
        parts.extend(std::iter::repeat("..").take(theirs.len() - common));
        parts.extend(ours[common..].iter().copied());
        parts.join("/")
    }

    /// Every directory from the root down to this directory, inclusive.
    pub fn ancestor_directories(&self) -> Vec<RelativeFilePath> {
        let mut out = vec![Self::root()];
        let mut current = String::new();
        for segment in self.segments() {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            out.push(Self(current.clone()));
        }
        out
    }

    /// Anchors this path under a filesystem root.
    pub fn to_absolute(&self, root: &AbsoluteFilePath) -> AbsoluteFilePath {
        let mut path = root.0.clone();
        for segment in self.segments() {
            path.push(segment);
        }
        AbsoluteFilePath(path)
    }
}

impl fmt::Display for RelativeFilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, ".")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// An absolute filesystem path produced by anchoring relative identifiers under a
/// canonical workspace root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AbsoluteFilePath(PathBuf);

impl AbsoluteFilePath {
    /// Canonicalizes an existing directory.
    pub fn of_existing_dir(path: &Path) -> AppResult<Self> {
        if !path.is_dir() {
            return Err(AppError::DirectoryNotFound(path.to_path_buf()));
        }
        Ok(Self(path.canonicalize()?))
    }

    /// Joins a single reserved name (e.g. `definition`) onto this path.
    pub fn child(&self, name: &str) -> AbsoluteFilePath {
        Self(self.0.join(name))
    }

    /// Borrow as a standard path.
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for AbsoluteFilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl Serialize for AbsoluteFilePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string_lossy())
    }
}

/// Resolves an import written in `referenced_in` to the identifier of the imported file.
///
/// The import is interpreted relative to the directory containing `referenced_in`.
pub fn resolve_import_path(
    referenced_in: &RelativeFilePath,
    import_path: &str,
) -> AppResult<RelativeFilePath> {
    let resolved = referenced_in.dirname().join(import_path)?;
    if resolved.is_root() {
        return Err(AppError::invalid_path(
            import_path,
            "does not name a file",
        ));
    }
    Ok(resolved)
}
