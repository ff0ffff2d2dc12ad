#![deny(missing_docs)]

//! # Loader Options
//!
//! Reserved names, extensions and policies used by the loading pipeline.
//! Defaults follow the standard workspace layout:
//!
//! ```text
//! <workspace>/
//!   generators.yml
//!   dependencies.yml
//!   definition/
//!     api.yml
//!     __package__.yml
//!     users.yml
//!   openapi/            (OpenAPI workspaces instead of `definition/`)
//!     openapi.yml
//! ```

use crate::paths::RelativeFilePath;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How list-valued package marker fields combine with inherited values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListMergePolicy {
    /// Inherited items first, then local items; duplicates keep their first occurrence.
    #[default]
    Concatenate,
    /// A locally declared list replaces the inherited one.
    Replace,
}

impl FromStr for ListMergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "concatenate" => Ok(Self::Concatenate),
            "replace" => Ok(Self::Replace),
            other => Err(format!(
                "unknown list merge policy '{}' (expected 'concatenate' or 'replace')",
                other
            )),
        }
    }
}

/// Options controlling the workspace loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoaderOptions {
    /// Subdirectory holding the declarative definition.
    pub definition_directory: String,
    /// Subdirectory whose presence switches the workspace to OpenAPI mode.
    pub openapi_directory: String,
    /// Extensions of declarative schema files.
    pub definition_extensions: Vec<String>,
    /// Extensions accepted for the OpenAPI document.
    pub openapi_extensions: Vec<String>,
    /// File stem of the root API file at the top of the definition directory.
    pub root_api_file_stem: String,
    /// File stem of package marker files, at any depth.
    pub package_marker_stem: String,
    /// Generators configuration file at the workspace root.
    pub generators_file: String,
    /// Dependencies configuration file at the workspace root.
    pub dependencies_file: String,
    /// Merge policy for list-valued package marker fields.
    pub list_merge_policy: ListMergePolicy,
    /// Worker threads for parsing; `None` uses the global pool.
    pub parse_threads: Option<usize>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            definition_directory: "definition".into(),
            openapi_directory: "openapi".into(),
            definition_extensions: vec!["yml".into(), "yaml".into()],
            openapi_extensions: vec!["yml".into(), "yaml".into(), "json".into()],
            root_api_file_stem: "api".into(),
            package_marker_stem: "__package__".into(),
            generators_file: "generators.yml".into(),
            dependencies_file: "dependencies.yml".into(),
            list_merge_policy: ListMergePolicy::default(),
            parse_threads: None,
        }
    }
}

impl LoaderOptions {
    /// The canonical root API file name used in messages (e.g. `api.yml`).
    pub fn root_api_file_name(&self) -> String {
        let ext = self
            .definition_extensions
            .first()
            .map(String::as_str)
            .unwrap_or("yml");
        format!("{}.{}", self.root_api_file_stem, ext)
    }

    /// True when `file` sits at the top of the definition directory with the root stem.
    pub fn is_root_api_file(&self, file: &RelativeFilePath) -> bool {
        file.dirname().is_root() && file.file_stem() == Some(self.root_api_file_stem.as_str())
    }

    /// True when `file` is a package marker at any depth.
    pub fn is_package_marker(&self, file: &RelativeFilePath) -> bool {
        file.file_stem() == Some(self.package_marker_stem.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = LoaderOptions::default();
        assert_eq!(opts.root_api_file_name(), "api.yml");
        assert_eq!(opts.list_merge_policy, ListMergePolicy::Concatenate);
    }

    #[test]
    fn test_role_detection() {
        let opts = LoaderOptions::default();
        let root = RelativeFilePath::parse("api.yml").unwrap();
        let nested_api = RelativeFilePath::parse("pkg/api.yml").unwrap();
        let marker = RelativeFilePath::parse("pkg/__package__.yaml").unwrap();

        assert!(opts.is_root_api_file(&root));
        assert!(!opts.is_root_api_file(&nested_api));
        assert!(opts.is_package_marker(&marker));
        assert!(!opts.is_package_marker(&root));
    }

    #[test]
    fn test_deserialize_partial_options() {
        let opts: LoaderOptions =
            serde_yaml::from_str("list-merge-policy: replace\nparse-threads: 2\n").unwrap();
        assert_eq!(opts.list_merge_policy, ListMergePolicy::Replace);
        assert_eq!(opts.parse_threads, Some(2));
        assert_eq!(opts.definition_directory, "definition");
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "replace".parse::<ListMergePolicy>().unwrap(),
            ListMergePolicy::Replace
        );
        assert!("merge".parse::<ListMergePolicy>().is_err());
    }
}
